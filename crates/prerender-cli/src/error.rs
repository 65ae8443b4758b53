//! Error handling for the prerender-kit CLI.
//!
//! Library errors keep their `miette` diagnostics (codes and help text) when
//! they reach the terminal; everything else is rendered as a plain message.

use miette::Report;
use prerender_transform::{ConfigError, TransformError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Loading or validating configuration failed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The transform produced inconsistent edits
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Reading or writing a file failed
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Arguments that parse but do not make sense together
    #[error("{0}")]
    Usage(String),

    /// File is not UTF-8
    #[error("{} is not valid UTF-8", .0.display())]
    NotUtf8(PathBuf),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Attach a path to I/O errors
pub trait ResultExt<T> {
    fn with_path(self, path: &Path) -> Result<T>;
}

impl<T> ResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: &Path) -> Result<T> {
        self.map_err(|source| {
            if source.kind() == std::io::ErrorKind::InvalidData {
                CliError::NotUtf8(path.to_path_buf())
            } else {
                CliError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })
    }
}

/// Convert a CLI error into a miette report for display
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Config(e) => Report::new(e),
        CliError::Transform(e) => Report::new(e),
        other => miette::miette!("{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_carries_path() {
        let err = std::fs::read_to_string("/definitely/not/here.ts")
            .with_path(Path::new("/definitely/not/here.ts"))
            .unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.ts"));
    }

    #[test]
    fn test_config_error_keeps_diagnostic_code() {
        let err = CliError::from(ConfigError::EmptyField { field: "guard" });
        let report = cli_error_to_miette(err);
        let code = report.code().map(|code| code.to_string());
        assert_eq!(code.as_deref(), Some("prerender::config::empty_field"));
    }
}
