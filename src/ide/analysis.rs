//! AnalysisHost: owns the sources, their trees and the symbol table.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::base::FileId;
use crate::hir::{
    AnalysisConfig, ClassInfoProvider, DefId, Diagnostic, DiagnosticCollector, FileSet, Reference,
    Resolver, StaticClassProvider, SymbolTable, SymtabError, TableMaker,
};
use crate::syntax::{SyntaxTree, parse};

use super::goto::{GotoResult, goto_definition};
use super::references::find_references;

/// Drives analysis of a set of compilation units.
///
/// Every mutating operation takes `&mut self`, so passes over the shared
/// symbol table are serialised across files. Re-analysis starts from a
/// fresh table; definitions never outlive the analysis that made them.
pub struct AnalysisHost {
    files: FileSet,
    trees: IndexMap<FileId, SyntaxTree>,
    table: SymbolTable,
    provider: Arc<dyn ClassInfoProvider>,
    config: AnalysisConfig,
    diagnostics: DiagnosticCollector,
    dirty: bool,
}

impl Default for AnalysisHost {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisHost {
    /// A host backed by the bundled JDK subset.
    pub fn new() -> Self {
        Self::with_provider(Arc::new(StaticClassProvider::jdk()))
    }

    pub fn with_provider(provider: Arc<dyn ClassInfoProvider>) -> Self {
        let config = AnalysisConfig::default();
        Self {
            files: FileSet::new(),
            trees: IndexMap::new(),
            table: SymbolTable::with_provider(provider.clone()).with_config(config.clone()),
            provider,
            config,
            diagnostics: DiagnosticCollector::new(),
            dirty: false,
        }
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self.dirty = true;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Add or replace a compilation unit. Takes effect on the next
    /// [`analyze`](Self::analyze).
    pub fn set_file_content(&mut self, path: impl AsRef<Path>, text: impl Into<Arc<str>>) -> FileId {
        let file = self.files.file_id(path.as_ref());
        self.files.set_contents(file, text);
        self.dirty = true;
        file
    }

    pub fn files(&self) -> &FileSet {
        &self.files
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn tree(&self, file: FileId) -> Option<&SyntaxTree> {
        self.trees.get(&file)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.diagnostics()
    }

    pub fn diagnostics_for_file(&self, file: FileId) -> Vec<&Diagnostic> {
        self.diagnostics.diagnostics_for_file(file)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Parse every file and run the declaration, finishing and resolution
    /// passes over all of them.
    ///
    /// Files that fail to parse are reported and left out. A structural
    /// fault aborts the analysis and leaves the partial table in place.
    pub fn analyze(&mut self) -> Result<(), SymtabError> {
        self.diagnostics.clear();
        self.table = SymbolTable::with_provider(self.provider.clone()).with_config(self.config.clone());
        self.trees = self.parse_all();
        self.dirty = false;

        let result = self.run_passes();
        if let Err((file, fault)) = &result {
            self.diagnostics.scope_fault(*file, fault);
        }
        result.map_err(|(_, fault)| fault)
    }

    fn parse_all(&mut self) -> IndexMap<FileId, SyntaxTree> {
        let sources: Vec<_> = self
            .files
            .files()
            .into_iter()
            .filter_map(|file| self.files.contents(file).map(|text| (file, text)))
            .collect();

        let parsed: Vec<_> = sources
            .par_iter()
            .map(|(file, text)| (*file, parse(*file, text)))
            .collect();

        let mut trees = IndexMap::new();
        for (file, result) in parsed {
            match result {
                Ok(tree) => {
                    trees.insert(file, tree);
                }
                Err(err) => {
                    warn!(%file, error = %err, "skipping file that failed to parse");
                    self.diagnostics.syntax_error(file, &err);
                }
            }
        }
        trees
    }

    fn run_passes(&mut self) -> Result<(), (FileId, SymtabError)> {
        for (&file, tree) in self.trees.iter_mut() {
            let key = self
                .files
                .path(file)
                .and_then(|p| p.parent().map(|dir| dir.to_string_lossy().into_owned()))
                .unwrap_or_default();
            TableMaker::new(&mut self.table, tree)
                .with_package_key(key)
                .build()
                .map_err(|e| (file, e))?;
        }

        for (&file, tree) in self.trees.iter_mut() {
            TableMaker::new(&mut self.table, tree)
                .finish()
                .map_err(|e| (file, e))?;
        }

        for (&file, tree) in self.trees.iter_mut() {
            let unresolved = Resolver::new(&mut self.table, tree)
                .resolve_file()
                .map_err(|e| (file, e))?;
            for u in &unresolved {
                self.diagnostics.unresolved(tree, u);
            }
        }

        debug!(
            files = self.trees.len(),
            definitions = self.table.len(),
            warnings = self.diagnostics.warning_count(),
            "analysis complete"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// What the name at `line`:`column` (1-based) refers to.
    pub fn goto_definition(&self, file: FileId, line: u32, column: u32) -> Option<GotoResult> {
        goto_definition(&self.table, self.trees.get(&file)?, line, column)
    }

    /// Every recorded use of `def`, in position order.
    pub fn find_references(&self, def: DefId) -> Vec<Reference> {
        find_references(&self.table, def)
    }

    pub fn reference_count(&self, def: DefId) -> usize {
        self.table.reference_count(def)
    }
}
