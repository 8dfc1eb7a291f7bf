//! Query surface over an analysed set of compilation units.
//!
//! [`AnalysisHost`] owns the sources and runs the passes; the free
//! functions answer questions against a finished [`SymbolTable`].
//!
//! ```ignore
//! use transmogrify::ide::AnalysisHost;
//!
//! let mut host = AnalysisHost::new();
//! let file = host.set_file_content("src/A.java", "class A { int x; void m() { x = 1; } }");
//! host.analyze()?;
//! let target = host.goto_definition(file, 1, 29);
//! ```
//!
//! [`SymbolTable`]: crate::hir::SymbolTable

mod analysis;
mod goto;
mod references;

pub use analysis::AnalysisHost;
pub use goto::{GotoResult, goto_definition};
pub use references::{find_references, references_in_scope};
