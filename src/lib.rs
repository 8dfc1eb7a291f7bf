//! # transmogrify
//!
//! Symbol table construction and name/type resolution for a
//! pre-generics Java subset.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! project → WorkspaceLoader (files on disk into a host)
//!   ↓
//! ide     → AnalysisHost, goto-definition, find-references
//!   ↓
//! hir     → Symbol table, declaration/finishing/resolution passes
//!   ↓
//! syntax  → Lexer, parser and the arena syntax tree
//!   ↓
//! base    → Primitives (FileId, Occurrence, LineIndex)
//! ```

/// Foundation types: FileId, Occurrence, line/column conversion
pub mod base;

/// Semantic model: definitions, scopes, lookup and resolution
pub mod hir;

/// Queries over an analysed workspace
pub mod ide;

/// Workspace loading
pub mod project;

/// Java front end
pub mod syntax;

pub use base::{FileId, LineCol, LineIndex, Occurrence, TextRange, TextSize};
pub use hir::{DefId, SymbolTable};
pub use ide::AnalysisHost;
