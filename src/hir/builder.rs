//! First pass: declarations.
//!
//! [`TableMaker::build`] walks one file's tree depth first and creates a
//! definition for every package, class, method, field, local variable,
//! parameter, label and block scope it meets. Nothing is resolved here;
//! imports are parked on each top-level class for the finishing pass
//! ([`TableMaker::finish`](super::finish)).

use smol_str::SmolStr;
use tracing::{debug, trace};

use super::definition::{ClassData, MethodData, VariableData, Visibility};
use super::symbol_table::{Site, SymbolTable, SymtabError};
use super::DefId;
use crate::syntax::{NodeId, NodeRef, SyntaxKind, SyntaxTree};

/// Drives the declaration and finishing passes over one file.
pub struct TableMaker<'a> {
    pub(super) table: &'a mut SymbolTable,
    pub(super) tree: &'a mut SyntaxTree,
    package_key: SmolStr,
}

impl<'a> TableMaker<'a> {
    pub fn new(table: &'a mut SymbolTable, tree: &'a mut SyntaxTree) -> Self {
        Self {
            table,
            tree,
            package_key: SmolStr::default(),
        }
    }

    /// Key of the implicit package used when the file has no package
    /// declaration, usually the file's directory.
    pub fn with_package_key(mut self, key: impl Into<SmolStr>) -> Self {
        self.package_key = key.into();
        self
    }

    /// Create the file's declarations. Returns the file's package.
    #[tracing::instrument(skip(self), fields(file = %self.tree.file()))]
    pub fn build(&mut self) -> Result<DefId, SymtabError> {
        let file = self.tree.file();
        let root = self.tree.root().ok_or(SymtabError::MissingScope {
            node: NodeRef::new(file, NodeId::default()),
        })?;
        self.table.begin_file(file);

        let declared = self
            .tree
            .find_child(root, SyntaxKind::PackageDecl)
            .and_then(|decl| {
                let name = self.tree.first_child(decl)?;
                Some((decl, self.tree.dotted_name(name)?))
            });
        let package = match declared {
            Some((decl, name)) => {
                let id = self.table.define_package_path(&name)?;
                self.table.index_node(self.tree.node_ref(decl), id);
                id
            }
            None => self.table.implicit_package(&self.package_key),
        };
        self.table.index_node(self.tree.node_ref(root), package);

        self.table.push_scope();
        let children: Vec<NodeId> = self.tree.children(root).collect();
        let imports: Vec<NodeRef> = children
            .iter()
            .filter(|&&c| self.tree.kind(c) == SyntaxKind::Import)
            .map(|&c| self.tree.node_ref(c))
            .collect();
        for child in children {
            if self.tree.kind(child).is_type_decl() {
                let class = self.class_decl(child, package)?;
                if let Some(data) = self.table.class_mut(class) {
                    data.unprocessed_imports = imports.clone();
                }
            }
        }
        self.table.pop_scope()?;
        self.table.end_file()?;
        debug!(definitions = self.table.len(), "declarations built");
        Ok(package)
    }

    fn site(&self, node: NodeId, name: Option<NodeId>) -> Site {
        let at = name.unwrap_or(node);
        Site::new(self.tree.node_ref(node), self.tree.occurrence(at))
    }

    fn name_of(&self, node: NodeId) -> Option<(NodeId, SmolStr)> {
        let ident = self.tree.find_child(node, SyntaxKind::Ident)?;
        Some((ident, SmolStr::new(self.tree.text(ident))))
    }

    fn visibility(&self, node: NodeId) -> Visibility {
        match self.tree.find_child(node, SyntaxKind::Modifiers) {
            Some(mods) => Visibility::from_modifiers(self.tree.children(mods).map(|m| self.tree.text(m))),
            None => Visibility::Package,
        }
    }

    /// Open `scope` for the duration of `body`.
    fn enter(
        &mut self,
        scope: DefId,
        body: impl FnOnce(&mut Self) -> Result<(), SymtabError>,
    ) -> Result<(), SymtabError> {
        self.table.push_scope();
        trace!(scope = %self.table.def(scope).name(), depth = self.table.open_scopes(), "enter scope");
        body(self)?;
        self.table.pop_scope()
    }

    fn walk_children(&mut self, node: NodeId, scope: DefId) -> Result<(), SymtabError> {
        let children: Vec<NodeId> = self.tree.children(node).collect();
        for child in children {
            self.walk(child, scope)?;
        }
        Ok(())
    }

    fn class_decl(&mut self, node: NodeId, scope: DefId) -> Result<DefId, SymtabError> {
        let Some((ident, name)) = self.name_of(node) else {
            return Err(SymtabError::MissingScope {
                node: self.tree.node_ref(node),
            });
        };
        let data = ClassData {
            is_interface: self.tree.kind(node) == SyntaxKind::InterfaceDef,
            visibility: self.visibility(node),
            ..ClassData::default()
        };
        let site = self.site(node, Some(ident));
        let class = self.table.define_class(scope, &name, site, data)?;
        if let Some(body) = self.tree.find_child(node, SyntaxKind::ObjBlock) {
            self.enter(class, |this| this.walk_children(body, class))?;
        }
        Ok(class)
    }

    fn method_decl(&mut self, node: NodeId, class: DefId) -> Result<(), SymtabError> {
        let Some((ident, name)) = self.name_of(node) else {
            return Ok(());
        };
        let data = MethodData {
            visibility: self.visibility(node),
            is_constructor: self.tree.kind(node) == SyntaxKind::CtorDef,
            ..MethodData::default()
        };
        let site = self.site(node, Some(ident));
        let method = self.table.define_method(class, &name, site, data)?;
        self.enter(method, |this| {
            if let Some(params) = this.tree.find_child(node, SyntaxKind::Parameters) {
                let params: Vec<NodeId> = this.tree.children(params).collect();
                for param in params {
                    if let Some((ident, name)) = this.name_of(param) {
                        let site = this.site(param, Some(ident));
                        this.table.define_parameter(method, &name, site)?;
                    }
                }
            }
            match this.tree.find_child(node, SyntaxKind::Slist) {
                Some(body) => this.walk_children(body, method),
                None => Ok(()),
            }
        })
    }

    fn variable_decl(&mut self, node: NodeId, scope: DefId) -> Result<(), SymtabError> {
        let init = self.tree.find_child(node, SyntaxKind::VariableInit);
        if let Some((ident, name)) = self.name_of(node) {
            let data = VariableData {
                visibility: self.visibility(node),
                assigned_at_declaration: init.is_some(),
                ..VariableData::default()
            };
            let site = self.site(node, Some(ident));
            self.table.define_variable(scope, &name, site, data)?;
        }
        match init {
            Some(init) => self.walk_children(init, scope),
            None => Ok(()),
        }
    }

    fn walk(&mut self, node: NodeId, scope: DefId) -> Result<(), SymtabError> {
        let kind = self.tree.kind(node);
        match kind {
            SyntaxKind::ClassDef | SyntaxKind::InterfaceDef => self.class_decl(node, scope).map(drop),
            SyntaxKind::MethodDef | SyntaxKind::CtorDef => self.method_decl(node, scope),
            SyntaxKind::VariableDef => self.variable_decl(node, scope),
            SyntaxKind::Labeled => {
                if let Some((ident, name)) = self.name_of(node) {
                    let site = self.site(node, Some(ident));
                    self.table.define_label(scope, &name, site)?;
                }
                match self.tree.child(node, 1) {
                    Some(body) => self.walk(body, scope),
                    None => Ok(()),
                }
            }
            SyntaxKind::New => {
                let Some(body) = self.tree.find_child(node, SyntaxKind::ObjBlock) else {
                    return self.walk_children(node, scope);
                };
                if let Some(args) = self.tree.find_child(node, SyntaxKind::Arguments) {
                    self.walk_children(args, scope)?;
                }
                let site = self.site(node, None);
                let class = self.table.define_anonymous_class(scope, site)?;
                self.enter(class, |this| this.walk_children(body, class))
            }
            _ if kind.is_block_scope() || self.tree.is_nested_block(node) => {
                let site = self.site(node, None);
                let block = self.table.define_block(scope, block_name(kind), site)?;
                self.enter(block, |this| this.walk_children(node, block))
            }
            // Catch parameters belong to the finishing pass.
            SyntaxKind::Parameter | SyntaxKind::Type | SyntaxKind::Modifiers => Ok(()),
            _ => self.walk_children(node, scope),
        }
    }
}

fn block_name(kind: SyntaxKind) -> &'static str {
    match kind {
        SyntaxKind::For => "for",
        SyntaxKind::If => "if",
        SyntaxKind::Else => "else",
        SyntaxKind::While => "while",
        SyntaxKind::DoWhile => "do",
        SyntaxKind::Try => "try",
        SyntaxKind::Finally => "finally",
        SyntaxKind::Catch => "catch",
        SyntaxKind::Switch => "switch",
        SyntaxKind::Synchronized => "synchronized",
        SyntaxKind::StaticInit => "static",
        SyntaxKind::InstanceInit => "init",
        SyntaxKind::Assert => "assert",
        _ => "block",
    }
}
