//! Second pass: the declarations' own types.
//!
//! Runs after every file has been built. Definitions are visited in
//! creation order, which is a pre-order from the base scope, so a class
//! is finished before its members and nested classes see their outer
//! class's imports.
//!
//! - classes: imports, superclass, interfaces and the reverse edges
//! - methods: return type and thrown exceptions
//! - variables and parameters: declared type
//! - catch blocks: the caught exception's parameter

use smol_str::SmolStr;
use tracing::debug;

use super::builder::TableMaker;
use super::class_type::ClassHandle;
use super::definition::{DefKind, PackageRef, VariableData};
use super::external::simple_name;
use super::resolve::Resolver;
use super::symbol_table::{Site, SymtabError};
use super::types::{JAVA_LANG_OBJECT, TypeRef};
use super::DefId;
use crate::syntax::{NodeId, SyntaxKind};

impl TableMaker<'_> {
    /// Finish the definitions declared in this file.
    #[tracing::instrument(skip(self), fields(file = %self.tree.file()))]
    pub fn finish(&mut self) -> Result<(), SymtabError> {
        let file = self.tree.file();
        let mut index = 0;
        // Catch parameters are appended while walking.
        while index < self.table.len() {
            let id = DefId::new(index as u32);
            index += 1;
            let def = self.table.def(id);
            let Some(node) = def.node().filter(|n| n.file == file) else {
                continue;
            };
            match def.kind() {
                DefKind::Class => self.finish_class(id, node.node),
                DefKind::Method => self.finish_method(id, node.node),
                DefKind::Variable => self.finish_variable(id, node.node),
                DefKind::Block if self.tree.kind(node.node) == SyntaxKind::Catch => {
                    self.finish_catch(id, node.node)?
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Resolve a declared type without recording references.
    fn declared_type(&mut self, node: NodeId, scope: DefId) -> Option<TypeRef> {
        match Resolver::new(self.table, self.tree).resolve_type(node, scope, false) {
            Ok(ty) => Some(ty),
            Err(unresolved) => {
                debug!(text = %unresolved.text, "unresolved declared type");
                None
            }
        }
    }

    fn names_in(&self, node: NodeId, clause: SyntaxKind) -> Vec<NodeId> {
        self.tree
            .find_child(node, clause)
            .map(|c| self.tree.children(c).collect())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------

    fn finish_class(&mut self, class: DefId, node: NodeId) {
        let def = self.table.def(class);
        let top_level = def
            .parent()
            .is_some_and(|p| self.table.def(p).kind() == DefKind::Package);
        let Some(data) = def.class() else {
            return;
        };
        let (is_interface, is_anonymous) = (data.is_interface, data.is_anonymous);
        let parent = def.parent().unwrap_or(self.table.base());

        if top_level {
            self.auto_imports(class);
        }
        let imports = self
            .table
            .class_mut(class)
            .map(|c| std::mem::take(&mut c.unprocessed_imports))
            .unwrap_or_default();
        for import in imports {
            self.process_import(class, import.node);
        }

        let (superclass, interfaces) = if is_anonymous {
            self.anonymous_supertypes(node, parent)
        } else if is_interface {
            let interfaces = self
                .names_in(node, SyntaxKind::ExtendsClause)
                .into_iter()
                .filter_map(|name| self.declared_type(name, class))
                .collect();
            (None, interfaces)
        } else {
            let superclass = match self.names_in(node, SyntaxKind::ExtendsClause).first() {
                Some(&name) => self.declared_type(name, class),
                None if self.table.qualified_name(class) == JAVA_LANG_OBJECT => None,
                None => {
                    let default = self.table.config().default_superclass.clone();
                    self.table.lookup_class(class, &default)
                }
            };
            let interfaces = self
                .names_in(node, SyntaxKind::ImplementsClause)
                .into_iter()
                .filter_map(|name| self.declared_type(name, class))
                .collect();
            (superclass, interfaces)
        };

        if let Some(superclass) = &superclass {
            self.table.add_subclass(superclass, class);
        }
        for interface in &interfaces {
            self.table.add_implementor(interface, class);
        }
        if let Some(data) = self.table.class_mut(class) {
            data.superclass = superclass;
            data.interfaces = interfaces;
        }
    }

    /// `new T() { ... }` extends `T`, or implements it when `T` is an
    /// interface.
    fn anonymous_supertypes(&mut self, node: NodeId, scope: DefId) -> (Option<TypeRef>, Vec<TypeRef>) {
        let Some(created) = self
            .tree
            .first_child(node)
            .and_then(|ty| self.declared_type(ty, scope))
        else {
            return (None, Vec::new());
        };
        if self.table.is_interface(&created) {
            (Some(TypeRef::object()), vec![created])
        } else {
            (Some(created), Vec::new())
        }
    }

    fn auto_imports(&mut self, class: DefId) {
        let packages: Vec<PackageRef> = self
            .table
            .config()
            .auto_imports
            .iter()
            .filter_map(|p| self.table.lookup_package(p))
            .collect();
        if let Some(data) = self.table.class_mut(class) {
            for package in packages {
                if !data.imported_packages.contains(&package) {
                    data.imported_packages.push(package);
                }
            }
        }
    }

    /// `a.b.C` imports a class; `a.b.*` imports a package, or the inner
    /// classes of a class when `a.b` names one.
    fn process_import(&mut self, class: DefId, node: NodeId) {
        let Some(name) = self
            .tree
            .first_child(node)
            .and_then(|n| self.tree.dotted_name(n))
        else {
            return;
        };

        if let Some(prefix) = name.strip_suffix(".*") {
            if let Some(outer) = self.table.lookup_qualified_class(prefix) {
                let inner = self.inner_classes(&outer);
                if let Some(data) = self.table.class_mut(class) {
                    for (simple, ty) in inner {
                        data.imported_classes.entry(simple).or_insert(ty);
                    }
                }
            } else if let Some(package) = self.table.lookup_package(prefix) {
                if let Some(data) = self.table.class_mut(class) {
                    if !data.imported_packages.contains(&package) {
                        data.imported_packages.push(package);
                    }
                }
            } else {
                debug!(import = %name, "unknown import");
            }
            return;
        }

        match self.table.lookup_qualified_class(&name) {
            Some(ty) => {
                let simple = SmolStr::new(self.table.simple_type_name(&ty).unwrap_or_default());
                if let Some(data) = self.table.class_mut(class) {
                    data.imported_classes.entry(simple).or_insert(ty);
                }
            }
            None => debug!(import = %name, "unknown import"),
        }
    }

    fn inner_classes(&self, ty: &TypeRef) -> Vec<(SmolStr, TypeRef)> {
        match self.table.class_handle(ty) {
            Some(ClassHandle::Source(def)) => def
                .scope()
                .map(|s| {
                    s.classes()
                        .map(|(name, id)| (name.clone(), TypeRef::Source(id)))
                        .collect()
                })
                .unwrap_or_default(),
            Some(ClassHandle::External(info)) => info
                .inner_classes
                .iter()
                .map(|inner| (SmolStr::new(simple_name(inner)), TypeRef::external(inner.as_str())))
                .collect(),
            None => Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------

    fn finish_method(&mut self, method: DefId, node: NodeId) {
        let Some(is_constructor) = self.table.def(method).method().map(|m| m.is_constructor) else {
            return;
        };
        let return_type = if is_constructor {
            self.table.enclosing_class(method).map(TypeRef::Source)
        } else {
            self.tree
                .find_child(node, SyntaxKind::Type)
                .and_then(|ty| self.declared_type(ty, method))
        };
        let exceptions: Vec<TypeRef> = self
            .names_in(node, SyntaxKind::Throws)
            .into_iter()
            .filter_map(|name| self.declared_type(name, method))
            .collect();
        if let Some(data) = self.table.def_mut(method).method_mut() {
            data.return_type = return_type;
            data.exceptions = exceptions;
        }
    }

    fn finish_variable(&mut self, variable: DefId, node: NodeId) {
        let scope = self.table.def(variable).parent().unwrap_or(self.table.base());
        let ty = self
            .tree
            .find_child(node, SyntaxKind::Type)
            .and_then(|ty| self.declared_type(ty, scope));
        if let Some(data) = self.table.def_mut(variable).variable_mut() {
            data.ty = ty;
        }
    }

    /// Declare the caught exception inside the catch block. The variable
    /// is finished when the walk reaches it.
    fn finish_catch(&mut self, block: DefId, node: NodeId) -> Result<(), SymtabError> {
        let Some(param) = self.tree.find_child(node, SyntaxKind::Parameter) else {
            return Ok(());
        };
        let param_ref = self.tree.node_ref(param);
        if self.table.definition_at(param_ref).is_some() {
            return Ok(());
        }
        let Some(ident) = self.tree.find_child(param, SyntaxKind::Ident) else {
            return Ok(());
        };
        let name = SmolStr::new(self.tree.text(ident));
        let site = Site::new(param_ref, self.tree.occurrence(ident));
        let data = VariableData {
            assigned_at_declaration: true,
            ..VariableData::default()
        };
        self.table.define_variable(block, &name, site, data)?;
        Ok(())
    }
}
