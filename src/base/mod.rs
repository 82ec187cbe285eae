//! Foundation types for yamlgen.
//!
//! This module provides the primitives used throughout the generator:
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//! - [`LineCol`], [`LineIndex`] - Line/column conversion for diagnostics
//!
//! This module has NO dependencies on other yamlgen modules.

mod span;

pub use span::{LineCol, LineIndex};

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
