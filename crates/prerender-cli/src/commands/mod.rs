//! Command implementations.

pub mod check;
pub mod scan;
pub mod transform;

pub use check::execute as check_execute;
pub use scan::execute as scan_execute;
pub use transform::execute as transform_execute;
