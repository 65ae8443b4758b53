//! Text overlay over the original source
//!
//! The transform never re-prints the AST. Instead every rewrite is recorded as
//! an edit against byte ranges of the original text and applied at the end,
//! which keeps formatting, comments and whitespace outside the edits intact
//! and lets the source map point every untouched byte back at itself.
//!
//! ```text
//! original:  f('key', async () => 1)
//!                     └──── edit ────┘
//! pieces:    "<guard> ? " + Original(handler) + " : <fallback>"
//! ```
//!
//! A replacement is a list of [`Piece`]s rather than a flat string so that the
//! original handler text embedded in it is still known to come from the
//! original file.

use crate::error::{Result, TransformError};
use std::ops::Range;

/// One part of a replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    /// New text with no counterpart in the original
    Inserted(String),
    /// A verbatim slice of the original text
    Original(Range<usize>),
}

/// Replacement of one original byte range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub pieces: Vec<Piece>,
}

/// Where a piece of output text comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Copied from the original, starting at this byte offset
    Original(usize),
    /// Generated; attributed to this original byte offset
    Inserted { anchor: usize },
}

/// A contiguous run of output text with a single origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'s> {
    pub text: &'s str,
    pub origin: Origin,
}

/// Ordered set of non-overlapping edits plus a prefix
#[derive(Debug, Clone)]
pub struct PatchBuffer<'a> {
    original: &'a str,
    prefix: String,
    /// Sorted by `range.start`, pairwise disjoint
    edits: Vec<Edit>,
}

impl<'a> PatchBuffer<'a> {
    pub fn new(original: &'a str) -> Self {
        Self {
            original,
            prefix: String::new(),
            edits: Vec::new(),
        }
    }

    pub fn original(&self) -> &'a str {
        self.original
    }

    /// Replace `range` with plain text
    pub fn overwrite(&mut self, range: Range<usize>, text: impl Into<String>) -> Result<()> {
        self.overwrite_with(range, vec![Piece::Inserted(text.into())])
    }

    /// Replace `range` with a list of pieces.
    ///
    /// Fails if the range is empty, out of bounds, not on a character
    /// boundary, or overlaps an existing edit. `Original` pieces must lie
    /// inside `range`.
    pub fn overwrite_with(&mut self, range: Range<usize>, pieces: Vec<Piece>) -> Result<()> {
        self.check_range(&range)?;
        for piece in &pieces {
            if let Piece::Original(inner) = piece {
                self.check_range(inner)?;
                if inner.start < range.start || inner.end > range.end {
                    return Err(TransformError::InvalidRange {
                        range: inner.clone(),
                        len: self.original.len(),
                    });
                }
            }
        }

        let index = self.edits.partition_point(|edit| edit.range.start < range.start);
        if let Some(prev) = index.checked_sub(1).and_then(|i| self.edits.get(i)) {
            if prev.range.end > range.start {
                return Err(TransformError::OverlappingEdit {
                    first: prev.range.clone(),
                    second: range,
                });
            }
        }
        if let Some(next) = self.edits.get(index) {
            if next.range.start < range.end {
                return Err(TransformError::OverlappingEdit {
                    first: next.range.clone(),
                    second: range,
                });
            }
        }

        self.edits.insert(index, Edit { range, pieces });
        Ok(())
    }

    /// Add text at offset zero, before anything already prepended
    pub fn prepend(&mut self, text: &str) {
        self.prefix.insert_str(0, text);
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn has_changes(&self) -> bool {
        !self.edits.is_empty() || !self.prefix.is_empty()
    }

    /// Output text split by origin, in output order
    pub fn segments(&self) -> Vec<Segment<'_>> {
        let mut segments = Vec::with_capacity(self.edits.len() * 4 + 2);
        if !self.prefix.is_empty() {
            segments.push(Segment {
                text: &self.prefix,
                origin: Origin::Inserted { anchor: 0 },
            });
        }

        let mut cursor = 0;
        for edit in &self.edits {
            if cursor < edit.range.start {
                segments.push(Segment {
                    text: &self.original[cursor..edit.range.start],
                    origin: Origin::Original(cursor),
                });
            }
            for piece in &edit.pieces {
                match piece {
                    Piece::Inserted(text) if !text.is_empty() => segments.push(Segment {
                        text,
                        origin: Origin::Inserted {
                            anchor: edit.range.start,
                        },
                    }),
                    Piece::Inserted(_) => {}
                    Piece::Original(range) if !range.is_empty() => segments.push(Segment {
                        text: &self.original[range.clone()],
                        origin: Origin::Original(range.start),
                    }),
                    Piece::Original(_) => {}
                }
            }
            cursor = edit.range.end;
        }
        if cursor < self.original.len() {
            segments.push(Segment {
                text: &self.original[cursor..],
                origin: Origin::Original(cursor),
            });
        }
        segments
    }

    /// Apply all edits and return the resulting text
    pub fn render(&self) -> String {
        let segments = self.segments();
        let len = segments.iter().map(|segment| segment.text.len()).sum();
        let mut out = String::with_capacity(len);
        for segment in segments {
            out.push_str(segment.text);
        }
        out
    }

    fn check_range(&self, range: &Range<usize>) -> Result<()> {
        let valid = range.start < range.end
            && range.end <= self.original.len()
            && self.original.is_char_boundary(range.start)
            && self.original.is_char_boundary(range.end);
        if valid {
            Ok(())
        } else {
            Err(TransformError::InvalidRange {
                range: range.clone(),
                len: self.original.len(),
            })
        }
    }
}
