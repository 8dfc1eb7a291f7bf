//! Loading workspaces from disk.

mod workspace_loader;

pub use workspace_loader::{LoadError, WorkspaceLoader};
