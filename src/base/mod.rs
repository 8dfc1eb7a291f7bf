//! Foundation types shared by the front end and the semantic model.
//!
//! - [`FileId`] - Interned file identifiers
//! - [`Occurrence`] - A (file, line, column) source position
//! - [`LineCol`], [`LineIndex`] - Byte offset to line/column conversion
//!
//! This module has NO dependencies on other transmogrify modules.

mod file_id;
mod span;

pub use file_id::FileId;
pub use span::{LineCol, LineIndex, Occurrence, TextRange, TextSize};

// Re-export text-size types for convenience
pub use text_size;
