//! The symbol table registry.
//!
//! Owns the definition arena, the base scope, the package registry and
//! the index from declaring syntax nodes to their definitions. All
//! definitions are created through the `define_*` operations, each of
//! which registers the declaration in its scope's namespace and indexes
//! its node in one step.
//!
//! Lookups along the scope chain live in [`lookup`](super::lookup), class
//! hierarchy queries in [`class_type`](super::class_type).

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use thiserror::Error;

use super::config::AnalysisConfig;
use super::definition::{
    ClassData, DefKind, Definition, Detail, MethodData, Namespace, PackageData, Reference,
    VariableData,
};
use super::external::{ClassInfoProvider, ExternalClasses, StaticClassProvider};
use super::types::TypeRef;
use super::DefId;
use crate::base::{FileId, Occurrence};
use crate::syntax::NodeRef;

/// Name of the base scope. Never part of a qualified name.
pub const BASE_SCOPE_NAME: &str = "~base~";

/// Violations of the scope structure. These are bugs in whoever drives
/// the table, not problems with the analysed source, and are never
/// swallowed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SymtabError {
    #[error("cannot {operation} in {scope} scope `{name}`")]
    UnsupportedOperation {
        operation: &'static str,
        scope: DefKind,
        name: SmolStr,
    },
    #[error("scope stack unbalanced: {open} scope(s) open at {at}")]
    UnbalancedScope { open: usize, at: &'static str },
    #[error("no scope recorded for node {node:?}")]
    MissingScope { node: NodeRef },
}

/// A declaration site: the syntax node and the position of its name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Site {
    pub node: NodeRef,
    pub occurrence: Occurrence,
}

impl Site {
    pub fn new(node: NodeRef, occurrence: Occurrence) -> Self {
        Self { node, occurrence }
    }
}

#[derive(Debug)]
pub struct SymbolTable {
    defs: Vec<Definition>,
    base: DefId,
    /// Fully qualified package name → package.
    packages: FxHashMap<SmolStr, DefId>,
    /// Directory key → package synthesised for files without a package
    /// declaration.
    implicit_packages: FxHashMap<SmolStr, DefId>,
    by_node: FxHashMap<NodeRef, DefId>,
    external: ExternalClasses,
    external_subclasses: FxHashMap<SmolStr, Vec<DefId>>,
    external_implementors: FxHashMap<SmolStr, Vec<DefId>>,
    config: AnalysisConfig,
    open_scopes: usize,
    current_file: Option<FileId>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// A table backed by the bundled JDK subset.
    pub fn new() -> Self {
        Self::with_provider(Arc::new(StaticClassProvider::jdk()))
    }

    pub fn with_provider(provider: Arc<dyn ClassInfoProvider>) -> Self {
        let base = DefId::new(0);
        Self {
            defs: vec![Definition::new(base, BASE_SCOPE_NAME, DefKind::Base, None)],
            base,
            packages: FxHashMap::default(),
            implicit_packages: FxHashMap::default(),
            by_node: FxHashMap::default(),
            external: ExternalClasses::new(provider),
            external_subclasses: FxHashMap::default(),
            external_implementors: FxHashMap::default(),
            config: AnalysisConfig::default(),
            open_scopes: 0,
            current_file: None,
        }
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    pub fn base(&self) -> DefId {
        self.base
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn external(&self) -> &ExternalClasses {
        &self.external
    }

    pub fn def(&self, id: DefId) -> &Definition {
        &self.defs[id.index()]
    }

    pub fn get(&self, id: DefId) -> Option<&Definition> {
        self.defs.get(id.index())
    }

    pub(crate) fn def_mut(&mut self, id: DefId) -> &mut Definition {
        &mut self.defs[id.index()]
    }

    pub(crate) fn class_mut(&mut self, id: DefId) -> Option<&mut ClassData> {
        self.def_mut(id).class_mut()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// All definitions in creation order. A definition is always created
    /// after its parent, so this is a pre-order from the base scope.
    pub fn iter(&self) -> impl Iterator<Item = &Definition> {
        self.defs.iter()
    }

    /// The definition declared by `node`, if any.
    pub fn definition_at(&self, node: NodeRef) -> Option<DefId> {
        self.by_node.get(&node).copied()
    }

    /// The scope created for `node`, if any.
    pub fn scope_for(&self, node: NodeRef) -> Option<DefId> {
        self.definition_at(node)
            .filter(|id| self.def(*id).kind().is_scope())
    }

    pub fn package(&self, qualified_name: &str) -> Option<DefId> {
        self.packages.get(qualified_name).copied()
    }

    pub fn implicit_packages(&self) -> impl Iterator<Item = DefId> + '_ {
        self.implicit_packages.values().copied()
    }

    pub fn external_subclasses(&self, class: &str) -> &[DefId] {
        self.external_subclasses.get(class).map_or(&[], Vec::as_slice)
    }

    pub fn external_implementors(&self, interface: &str) -> &[DefId] {
        self.external_implementors.get(interface).map_or(&[], Vec::as_slice)
    }

    // ------------------------------------------------------------------
    // Scope stack
    // ------------------------------------------------------------------

    pub fn begin_file(&mut self, file: FileId) {
        self.current_file = Some(file);
        self.open_scopes = 0;
    }

    /// Fails if the file left scopes open.
    pub fn end_file(&mut self) -> Result<(), SymtabError> {
        self.current_file = None;
        match std::mem::take(&mut self.open_scopes) {
            0 => Ok(()),
            open => Err(SymtabError::UnbalancedScope {
                open,
                at: "end of file",
            }),
        }
    }

    pub fn current_file(&self) -> Option<FileId> {
        self.current_file
    }

    pub fn push_scope(&mut self) {
        self.open_scopes += 1;
    }

    pub fn pop_scope(&mut self) -> Result<(), SymtabError> {
        self.open_scopes = self
            .open_scopes
            .checked_sub(1)
            .ok_or(SymtabError::UnbalancedScope { open: 0, at: "pop" })?;
        Ok(())
    }

    pub fn open_scopes(&self) -> usize {
        self.open_scopes
    }

    // ------------------------------------------------------------------
    // Definition
    // ------------------------------------------------------------------

    fn next_id(&self) -> DefId {
        DefId::new(self.defs.len() as u32)
    }

    pub(super) fn unsupported(&self, operation: &'static str, scope: DefId) -> SymtabError {
        let def = self.def(scope);
        SymtabError::UnsupportedOperation {
            operation,
            scope: def.kind(),
            name: SmolStr::new(def.name()),
        }
    }

    /// Register `def` in its parent's namespace and index its node.
    fn add_definition(&mut self, def: Definition) -> Result<DefId, SymtabError> {
        let id = def.id();
        let Some(parent) = def.parent() else {
            return Err(self.unsupported("add a parentless definition", self.base));
        };
        let parent_kind = self.def(parent).kind();
        let namespace = Namespace::of(def.kind());
        if !parent_kind.is_scope() {
            return Err(self.unsupported("add definitions", parent));
        }
        if namespace == Namespace::Packages && !parent_kind.can_hold_packages() {
            return Err(self.unsupported("add a package", parent));
        }
        if namespace == Namespace::Labels && !parent_kind.can_hold_labels() {
            return Err(self.unsupported("add a label", parent));
        }

        let name = SmolStr::new(def.name());
        if let Some(node) = def.node() {
            self.by_node.insert(node, id);
        }
        self.defs.push(def);
        if let Some(scope) = self.def_mut(parent).scope_mut() {
            scope.insert(namespace, &name, id);
        }
        Ok(id)
    }

    /// Find or create the package `name` under `parent`. The first
    /// definition of a package wins.
    pub fn define_package(&mut self, parent: DefId, name: &str) -> Result<DefId, SymtabError> {
        if let Some(existing) = self.def(parent).scope().and_then(|s| s.package(name)) {
            return Ok(existing);
        }
        let id = self.next_id();
        let def = Definition::new(id, name, DefKind::Package, Some(parent));
        self.add_definition(def)?;
        let qualified = SmolStr::new(self.qualified_name(id));
        self.packages.entry(qualified).or_insert(id);
        Ok(id)
    }

    /// Find or create the package chain named by a dotted path.
    pub fn define_package_path(&mut self, path: &str) -> Result<DefId, SymtabError> {
        path.split('.')
            .try_fold(self.base, |parent, segment| self.define_package(parent, segment))
    }

    /// The package for files without a package declaration, keyed by the
    /// directory they live in. It is not part of qualified names.
    pub fn implicit_package(&mut self, key: &str) -> DefId {
        if let Some(&id) = self.implicit_packages.get(key) {
            return id;
        }
        let id = self.next_id();
        let def = Definition::new(id, key, DefKind::Package, Some(self.base))
            .with_detail(Detail::Package(PackageData { implicit: true }));
        self.defs.push(def);
        self.implicit_packages.insert(SmolStr::new(key), id);
        id
    }

    /// Define a class or interface and its synthetic default constructor.
    pub fn define_class(
        &mut self,
        scope: DefId,
        name: &str,
        site: Site,
        data: ClassData,
    ) -> Result<DefId, SymtabError> {
        let id = self.next_id();
        let visibility = data.visibility;
        let def = Definition::new(id, name, DefKind::Class, Some(scope))
            .at(site.node, site.occurrence)
            .with_detail(Detail::Class(data));
        self.add_definition(def)?;

        let ctor_id = self.next_id();
        let ctor = Definition::new(ctor_id, name, DefKind::Method, Some(id)).with_detail(Detail::Method(
            MethodData {
                return_type: Some(TypeRef::Source(id)),
                visibility,
                is_constructor: true,
                is_default_constructor: true,
                ..MethodData::default()
            },
        ));
        self.add_definition(ctor)?;
        if let Some(class) = self.class_mut(id) {
            class.default_constructor = Some(ctor_id);
        }
        Ok(id)
    }

    /// Define an anonymous class created by `new T() { ... }` inside
    /// `scope`. It is named after the enclosing class with a per-class
    /// counter: `Outer$1`, `Outer$2`, ...
    pub fn define_anonymous_class(&mut self, scope: DefId, site: Site) -> Result<DefId, SymtabError> {
        let enclosing = self
            .enclosing_class(scope)
            .ok_or_else(|| self.unsupported("declare an anonymous class", scope))?;
        let (prefix, count) = {
            let def = self.def_mut(enclosing);
            let prefix = SmolStr::new(def.name());
            let class = def.class_mut().map(|c| {
                c.anonymous_count += 1;
                c.anonymous_count
            });
            (prefix, class.unwrap_or(1))
        };
        let name = format!("{prefix}${count}");
        let data = ClassData {
            is_anonymous: true,
            ..ClassData::default()
        };
        let id = self.next_id();
        let def = Definition::new(id, name, DefKind::Class, Some(scope))
            .at(site.node, site.occurrence)
            .with_detail(Detail::Class(data));
        self.add_definition(def)
    }

    /// Define a method or constructor of `class`. Adding a method named
    /// after the class withdraws the default constructor.
    pub fn define_method(
        &mut self,
        class: DefId,
        name: &str,
        site: Site,
        data: MethodData,
    ) -> Result<DefId, SymtabError> {
        if self.def(class).name() == name {
            let default = self.class_mut(class).and_then(|c| c.default_constructor.take());
            if let (Some(default), Some(scope)) = (default, self.def_mut(class).scope_mut()) {
                scope.remove_method(default);
            }
        }
        let id = self.next_id();
        let def = Definition::new(id, name, DefKind::Method, Some(class))
            .at(site.node, site.occurrence)
            .with_detail(Detail::Method(data));
        self.add_definition(def)
    }

    pub fn define_variable(
        &mut self,
        scope: DefId,
        name: &str,
        site: Site,
        data: VariableData,
    ) -> Result<DefId, SymtabError> {
        let id = self.next_id();
        let def = Definition::new(id, name, DefKind::Variable, Some(scope))
            .at(site.node, site.occurrence)
            .with_detail(Detail::Variable(data));
        self.add_definition(def)
    }

    /// Define a method parameter and append it to the parameter list.
    pub fn define_parameter(
        &mut self,
        method: DefId,
        name: &str,
        site: Site,
    ) -> Result<DefId, SymtabError> {
        let data = VariableData {
            assigned_at_declaration: true,
            ..VariableData::default()
        };
        let id = self.define_variable(method, name, site, data)?;
        match self.def_mut(method).method_mut() {
            Some(m) => m.parameters.push(id),
            None => return Err(self.unsupported("add a parameter", method)),
        }
        Ok(id)
    }

    pub fn define_block(&mut self, scope: DefId, name: &str, site: Site) -> Result<DefId, SymtabError> {
        let id = self.next_id();
        let def = Definition::new(id, name, DefKind::Block, Some(scope)).at(site.node, site.occurrence);
        self.add_definition(def)
    }

    pub fn define_label(&mut self, scope: DefId, name: &str, site: Site) -> Result<DefId, SymtabError> {
        let id = self.next_id();
        let def = Definition::new(id, name, DefKind::Label, Some(scope)).at(site.node, site.occurrence);
        self.add_definition(def)
    }

    /// Index an extra node (e.g. a package declaration) as denoting `id`.
    pub fn index_node(&mut self, node: NodeRef, id: DefId) {
        self.by_node.entry(node).or_insert(id);
    }

    // ------------------------------------------------------------------
    // Naming & structure
    // ------------------------------------------------------------------

    /// Dotted name from the outermost named scope down to `id`. The base
    /// scope and implicit packages contribute nothing.
    pub fn qualified_name(&self, id: DefId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            let def = self.def(cur);
            if def.kind() == DefKind::Base || def.is_implicit_package() {
                break;
            }
            segments.push(def.name());
            current = def.parent();
        }
        segments.reverse();
        segments.join(".")
    }

    /// The nearest class at or above `scope`.
    pub fn enclosing_class(&self, scope: DefId) -> Option<DefId> {
        self.enclosing(scope, DefKind::Class)
    }

    /// The nearest package at or above `scope`.
    pub fn enclosing_package(&self, scope: DefId) -> Option<DefId> {
        self.enclosing(scope, DefKind::Package)
    }

    pub fn enclosing_method(&self, scope: DefId) -> Option<DefId> {
        let mut current = Some(scope);
        while let Some(cur) = current {
            match self.def(cur).kind() {
                DefKind::Method => return Some(cur),
                DefKind::Class | DefKind::Package | DefKind::Base => return None,
                _ => current = self.def(cur).parent(),
            }
        }
        None
    }

    fn enclosing(&self, scope: DefId, kind: DefKind) -> Option<DefId> {
        let mut current = Some(scope);
        while let Some(cur) = current {
            let def = self.def(cur);
            if def.kind() == kind {
                return Some(cur);
            }
            current = def.parent();
        }
        None
    }

    // ------------------------------------------------------------------
    // References & hierarchy edges
    // ------------------------------------------------------------------

    /// Record that `node` at `occurrence` refers to `target`, on the
    /// target and on the scope the reference occurs in.
    pub fn add_reference(&mut self, target: DefId, node: NodeRef, occurrence: Occurrence, scope: DefId) {
        let reference = Reference {
            occurrence,
            node,
            target,
        };
        self.def_mut(target).add_reference(reference);
        if let Some(scope) = self.def_mut(scope).scope_mut() {
            scope.add_reference(reference);
        }
    }

    pub fn reference_count(&self, id: DefId) -> usize {
        self.def(id).reference_count()
    }

    pub(crate) fn add_subclass(&mut self, superclass: &TypeRef, class: DefId) {
        match superclass {
            TypeRef::Source(id) => {
                if let Some(data) = self.class_mut(*id) {
                    data.subclasses.push(class);
                }
            }
            TypeRef::External(name) => {
                self.external_subclasses.entry(name.clone()).or_default().push(class);
            }
            _ => {}
        }
    }

    pub(crate) fn add_implementor(&mut self, interface: &TypeRef, class: DefId) {
        match interface {
            TypeRef::Source(id) => {
                if let Some(data) = self.class_mut(*id) {
                    data.implementors.push(class);
                }
            }
            TypeRef::External(name) => {
                self.external_implementors.entry(name.clone()).or_default().push(class);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::NodeId;

    fn site(table: &SymbolTable, line: u32) -> Site {
        let file = FileId::new(0);
        let node = NodeRef::new(file, NodeId::new(table.len() as u32));
        Site::new(node, Occurrence::new(file, line, 1))
    }

    #[test]
    fn test_qualified_names() {
        let mut table = SymbolTable::new();
        let pkg = table.define_package_path("a.b").unwrap();
        let s = site(&table, 1);
        let class = table.define_class(pkg, "C", s, ClassData::default()).unwrap();
        assert_eq!(table.qualified_name(class), "a.b.C");
        assert_eq!(table.qualified_name(pkg), "a.b");
        assert_eq!(table.package("a.b"), Some(pkg));
    }

    #[test]
    fn test_implicit_package_is_transparent() {
        let mut table = SymbolTable::new();
        let pkg = table.implicit_package("/src");
        let s = site(&table, 1);
        let class = table.define_class(pkg, "A", s, ClassData::default()).unwrap();
        assert_eq!(table.qualified_name(class), "A");
        assert_eq!(table.implicit_package("/src"), pkg);
    }

    #[test]
    fn test_package_definition_is_idempotent() {
        let mut table = SymbolTable::new();
        let first = table.define_package_path("x.y").unwrap();
        let second = table.define_package_path("x.y").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_package_in_class_is_unsupported() {
        let mut table = SymbolTable::new();
        let pkg = table.define_package_path("p").unwrap();
        let s = site(&table, 1);
        let class = table.define_class(pkg, "A", s, ClassData::default()).unwrap();
        let err = table.define_package(class, "q").unwrap_err();
        assert!(matches!(
            err,
            SymtabError::UnsupportedOperation {
                scope: DefKind::Class,
                ..
            }
        ));
    }

    #[test]
    fn test_default_constructor_withdrawn_by_real_one() {
        let mut table = SymbolTable::new();
        let pkg = table.define_package_path("p").unwrap();
        let s = site(&table, 1);
        let class = table.define_class(pkg, "A", s, ClassData::default()).unwrap();
        let default = table.def(class).class().unwrap().default_constructor.unwrap();
        assert_eq!(table.def(class).scope().unwrap().methods().collect::<Vec<_>>(), vec![default]);

        let s = site(&table, 2);
        let ctor = table
            .define_method(class, "A", s, MethodData { is_constructor: true, ..MethodData::default() })
            .unwrap();
        assert_eq!(table.def(class).scope().unwrap().methods().collect::<Vec<_>>(), vec![ctor]);
        assert!(table.def(class).class().unwrap().default_constructor.is_none());
    }

    #[test]
    fn test_anonymous_class_names_count_per_enclosing_class() {
        let mut table = SymbolTable::new();
        let pkg = table.define_package_path("p").unwrap();
        let s = site(&table, 1);
        let a = table.define_class(pkg, "A", s, ClassData::default()).unwrap();
        let s = site(&table, 2);
        let first = table.define_anonymous_class(a, s).unwrap();
        let s = site(&table, 3);
        let second = table.define_anonymous_class(a, s).unwrap();
        assert_eq!(table.def(first).name(), "A$1");
        assert_eq!(table.def(second).name(), "A$2");
        assert_eq!(table.qualified_name(second), "p.A.A$2");
    }

    #[test]
    fn test_scope_stack_pairing() {
        let mut table = SymbolTable::new();
        table.begin_file(FileId::new(0));
        table.push_scope();
        table.push_scope();
        table.pop_scope().unwrap();
        assert!(matches!(table.end_file(), Err(SymtabError::UnbalancedScope { open: 1, .. })));
        assert!(table.pop_scope().is_err());
    }

    #[test]
    fn test_references_recorded_on_target_and_scope() {
        let mut table = SymbolTable::new();
        let pkg = table.define_package_path("p").unwrap();
        let s = site(&table, 1);
        let class = table.define_class(pkg, "A", s, ClassData::default()).unwrap();
        let s = site(&table, 2);
        let field = table.define_variable(class, "x", s, VariableData::default()).unwrap();
        let s = site(&table, 5);
        table.add_reference(field, s.node, s.occurrence, class);
        table.add_reference(field, s.node, s.occurrence, class);
        assert_eq!(table.reference_count(field), 1);
        assert_eq!(table.def(class).scope().unwrap().references().count(), 1);
    }
}
