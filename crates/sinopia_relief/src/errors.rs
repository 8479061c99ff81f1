//! Compile diagnostics.
//!
//! Nothing in the compiler throws: problems are collected into a
//! [`Diagnostics`] sink as warnings or tips and compilation carries on with a
//! best-effort result.

use serde::Serialize;
use sinopia_carton::String;

use crate::SourceRange;

/// A warning or tip raised while compiling a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{msg}")]
pub struct CompilerError {
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<u32>,
}

impl CompilerError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            start: None,
            end: None,
        }
    }
}

/// Collector for warnings and tips.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<CompilerError>,
    tips: Vec<CompilerError>,
    /// When set, ranges are kept and shifted by this offset.
    range_offset: Option<u32>,
    warned_once: bool,
}

impl Diagnostics {
    /// Diagnostics without source ranges.
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics that keep source ranges, shifted by `offset` bytes.
    ///
    /// Templates are parsed after trimming; the offset is the length of the
    /// leading whitespace so ranges point into the untrimmed input.
    pub fn with_source_range(offset: u32) -> Self {
        Self {
            range_offset: Some(offset),
            ..Self::default()
        }
    }

    pub fn keeps_ranges(&self) -> bool {
        self.range_offset.is_some()
    }

    pub fn warn(&mut self, msg: impl Into<String>, range: Option<SourceRange>) {
        let error = self.build(msg.into(), range);
        self.errors.push(error);
    }

    pub fn tip(&mut self, msg: impl Into<String>, range: Option<SourceRange>) {
        let error = self.build(msg.into(), range);
        self.tips.push(error);
    }

    /// Warn only the first time this is called on the collector.
    pub fn warn_once(&mut self, msg: impl Into<String>, range: Option<SourceRange>) {
        if !self.warned_once {
            self.warned_once = true;
            self.warn(msg, range);
        }
    }

    pub fn errors(&self) -> &[CompilerError] {
        &self.errors
    }

    pub fn tips(&self) -> &[CompilerError] {
        &self.tips
    }

    pub fn into_parts(self) -> (Vec<CompilerError>, Vec<CompilerError>) {
        (self.errors, self.tips)
    }

    fn build(&self, msg: String, range: Option<SourceRange>) -> CompilerError {
        let mut error = CompilerError::new(msg);
        if let (Some(offset), Some(range)) = (self.range_offset, range) {
            error.start = Some(range.start + offset);
            error.end = Some(range.end + offset);
        }
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_dropped_by_default() {
        let mut diag = Diagnostics::new();
        diag.warn("oops", Some(SourceRange::new(1, 4)));
        assert_eq!(diag.errors()[0], CompilerError::new("oops"));
    }

    #[test]
    fn test_ranges_shifted() {
        let mut diag = Diagnostics::with_source_range(3);
        diag.tip("hint", Some(SourceRange::new(1, 4)));
        let tip = &diag.tips()[0];
        assert_eq!((tip.start, tip.end), (Some(4), Some(7)));
        assert!(diag.errors().is_empty());
    }

    #[test]
    fn test_warn_once() {
        let mut diag = Diagnostics::new();
        diag.warn_once("first", None);
        diag.warn_once("second", None);
        assert_eq!(diag.errors().len(), 1);
        assert_eq!(diag.errors()[0].to_string(), "first");
    }
}
