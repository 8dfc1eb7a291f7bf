//! Name lookup along the scope chain.
//!
//! Each scope kind answers for its own namespaces and then defers to its
//! parent. Classes additionally consult their hierarchy and imports;
//! the base scope answers primitive type names and fully qualified
//! names.

use smol_str::SmolStr;

use super::class_type::{MethodRef, VarRef};
use super::definition::{DefKind, Definition, PackageRef};
use super::symbol_table::{SymbolTable, SymtabError};
use super::types::{Primitive, Signature, TypeRef};
use super::DefId;

impl SymbolTable {
    /// A variable, parameter or field visible from `scope`.
    pub fn lookup_variable(&self, scope: DefId, name: &str) -> Option<VarRef> {
        let mut current = Some(scope);
        while let Some(cur) = current {
            let def = self.def(cur);
            match def.kind() {
                DefKind::Block | DefKind::Method => {
                    if let Some(found) = def.scope().and_then(|s| s.variable(name)) {
                        return Some(VarRef::Source(found));
                    }
                }
                DefKind::Class => {
                    if let Some(found) = self.find_field(&TypeRef::Source(cur), name) {
                        return Some(found);
                    }
                }
                DefKind::Package | DefKind::Base => return None,
                DefKind::Variable | DefKind::Label => {}
            }
            current = def.parent();
        }
        None
    }

    /// A type named by a simple name, as seen from `scope`.
    pub fn lookup_class(&self, scope: DefId, name: &str) -> Option<TypeRef> {
        let def = self.def(scope);
        match def.kind() {
            DefKind::Block | DefKind::Method => def
                .scope()
                .and_then(|s| s.class(name))
                .map(TypeRef::Source)
                .or_else(|| self.lookup_class_in_parent(def, name)),
            DefKind::Class => self
                .find_inner_class(&TypeRef::Source(scope), name)
                .or_else(|| self.imported_class(def, name))
                .or_else(|| self.lookup_class_in_parent(def, name))
                .or_else(|| self.same_package_external(scope, name)),
            DefKind::Package => def
                .scope()
                .and_then(|s| s.class(name))
                .map(TypeRef::Source)
                .or_else(|| self.lookup_class_in_parent(def, name)),
            DefKind::Base => Primitive::from_name(name)
                .map(TypeRef::Primitive)
                .or_else(|| self.lookup_qualified_class(name)),
            DefKind::Variable | DefKind::Label => self.lookup_class_in_parent(def, name),
        }
    }

    fn lookup_class_in_parent(&self, def: &Definition, name: &str) -> Option<TypeRef> {
        def.parent().and_then(|parent| self.lookup_class(parent, name))
    }

    fn imported_class(&self, def: &Definition, name: &str) -> Option<TypeRef> {
        let class = def.class()?;
        if let Some(ty) = class.imported_classes.get(name) {
            return Some(ty.clone());
        }
        class.imported_packages.iter().find_map(|package| match package {
            PackageRef::Source(id) => self.def(*id).scope()?.class(name).map(TypeRef::Source),
            PackageRef::External(package) => self.external_class(&format!("{package}.{name}")),
        })
    }

    /// Classes of the enclosing package that only the provider knows.
    fn same_package_external(&self, scope: DefId, name: &str) -> Option<TypeRef> {
        let package = self.enclosing_package(scope)?;
        if self.def(package).is_implicit_package() {
            return None;
        }
        self.external_class(&format!("{}.{name}", self.qualified_name(package)))
    }

    /// A class by fully qualified name. Source declarations win over the
    /// provider. Inner classes may be written with `.` or `$`.
    pub fn lookup_qualified_class(&self, name: &str) -> Option<TypeRef> {
        self.source_class(name)
            .map(TypeRef::Source)
            .or_else(|| self.external_class(name))
    }

    fn source_class(&self, name: &str) -> Option<DefId> {
        let segments: Vec<&str> = name.split('.').collect();
        for split in (1..segments.len()).rev() {
            if let Some(package) = self.package(&segments[..split].join(".")) {
                if let Some(found) = self.class_path(package, &segments[split..]) {
                    return Some(found);
                }
            }
        }
        let mut implicit: Vec<DefId> = self.implicit_packages().collect();
        implicit.sort();
        implicit
            .into_iter()
            .find_map(|package| self.class_path(package, &segments))
    }

    fn class_path(&self, scope: DefId, path: &[&str]) -> Option<DefId> {
        path.iter()
            .try_fold(scope, |scope, segment| self.def(scope).scope()?.class(segment))
    }

    /// Ask the provider, turning trailing `.` separators into `$` until a
    /// class is found.
    fn external_class(&self, name: &str) -> Option<TypeRef> {
        let mut candidate = name.to_string();
        loop {
            if self.external().contains(&candidate) {
                return Some(TypeRef::external(candidate));
            }
            let dot = candidate.rfind('.')?;
            candidate.replace_range(dot..dot + 1, "$");
        }
    }

    pub fn lookup_package(&self, name: &str) -> Option<PackageRef> {
        if let Some(id) = self.package(name) {
            return Some(PackageRef::Source(id));
        }
        self.external()
            .is_package(name)
            .then(|| PackageRef::External(SmolStr::new(name)))
    }

    /// A method callable by simple name from `scope`: the innermost class
    /// that has a matching method wins.
    pub fn lookup_method(&self, scope: DefId, name: &str, arguments: &Signature) -> Option<MethodRef> {
        let mut current = Some(scope);
        while let Some(cur) = current {
            let def = self.def(cur);
            match def.kind() {
                DefKind::Class => {
                    if let Some(found) = self.find_method(&TypeRef::Source(cur), name, arguments) {
                        return Some(found);
                    }
                }
                DefKind::Package | DefKind::Base => return None,
                _ => {}
            }
            current = def.parent();
        }
        None
    }

    /// A label visible from `scope`. Labels do not cross class
    /// boundaries; asking a package or the base scope is a driver error.
    pub fn lookup_label(&self, scope: DefId, name: &str) -> Result<Option<DefId>, SymtabError> {
        let mut current = scope;
        loop {
            let def = self.def(current);
            match def.kind() {
                DefKind::Block | DefKind::Method => {
                    if let Some(found) = def.scope().and_then(|s| s.label(name)) {
                        return Ok(Some(found));
                    }
                }
                DefKind::Class => return Ok(def.scope().and_then(|s| s.label(name))),
                DefKind::Package | DefKind::Base => {
                    return Err(self.unsupported("look up a label", current));
                }
                DefKind::Variable | DefKind::Label => {}
            }
            match def.parent() {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{FileId, Occurrence};
    use crate::hir::definition::{ClassData, MethodData, VariableData};
    use crate::hir::symbol_table::Site;
    use crate::syntax::{NodeId, NodeRef};

    fn site(table: &SymbolTable, line: u32) -> Site {
        let file = FileId::new(0);
        let node = NodeRef::new(file, NodeId::new(table.len() as u32));
        Site::new(node, Occurrence::new(file, line, 1))
    }

    struct Fixture {
        table: SymbolTable,
        class: DefId,
        method: DefId,
    }

    /// `package p; class A { int x; void m(int y) { ... } }`
    fn fixture() -> Fixture {
        let mut table = SymbolTable::new();
        let pkg = table.define_package_path("p").unwrap();
        let s = site(&table, 1);
        let class = table.define_class(pkg, "A", s, ClassData::default()).unwrap();
        let s = site(&table, 2);
        let x = table.define_variable(class, "x", s, VariableData::default()).unwrap();
        table.def_mut(x).variable_mut().unwrap().ty = Some(TypeRef::Primitive(Primitive::Int));
        let s = site(&table, 3);
        let method = table.define_method(class, "m", s, MethodData::default()).unwrap();
        let s = site(&table, 3);
        table.define_parameter(method, "y", s).unwrap();
        Fixture { table, class, method }
    }

    #[test]
    fn test_locals_shadow_fields() {
        let Fixture { mut table, method, class } = fixture();
        let s = site(&table, 4);
        let block = table.define_block(method, "if", s).unwrap();
        let s = site(&table, 5);
        let local = table.define_variable(block, "x", s, VariableData::default()).unwrap();

        assert_eq!(table.lookup_variable(block, "x"), Some(VarRef::Source(local)));
        let field = table.def(class).scope().unwrap().variable("x").unwrap();
        assert_eq!(table.lookup_variable(method, "x"), Some(VarRef::Source(field)));
        assert!(matches!(table.lookup_variable(block, "y"), Some(VarRef::Source(_))));
        assert_eq!(table.lookup_variable(block, "z"), None);
    }

    #[test]
    fn test_fields_inherited_from_source_superclass() {
        let Fixture { mut table, class, .. } = fixture();
        let pkg = table.package("p").unwrap();
        let s = site(&table, 10);
        let sub = table.define_class(pkg, "B", s, ClassData::default()).unwrap();
        table.class_mut(sub).unwrap().superclass = Some(TypeRef::Source(class));
        assert!(table.lookup_variable(sub, "x").is_some());
    }

    #[test]
    fn test_class_lookup_order() {
        let Fixture { mut table, class, method } = fixture();
        assert_eq!(table.lookup_class(method, "A"), Some(TypeRef::Source(class)));
        assert_eq!(table.lookup_class(method, "int"), Some(TypeRef::Primitive(Primitive::Int)));
        // Not imported yet.
        assert_eq!(table.lookup_class(method, "String"), None);

        table
            .class_mut(class)
            .unwrap()
            .imported_packages
            .push(PackageRef::External(SmolStr::new("java.lang")));
        assert_eq!(table.lookup_class(method, "String"), Some(TypeRef::string()));
    }

    #[test]
    fn test_qualified_names_source_then_external() {
        let Fixture { mut table, class, .. } = fixture();
        let s = site(&table, 20);
        let inner = table.define_class(class, "In", s, ClassData::default()).unwrap();
        assert_eq!(table.lookup_qualified_class("p.A"), Some(TypeRef::Source(class)));
        assert_eq!(table.lookup_qualified_class("p.A.In"), Some(TypeRef::Source(inner)));
        assert_eq!(
            table.lookup_qualified_class("java.util.Map.Entry"),
            Some(TypeRef::external("java.util.Map$Entry"))
        );
        assert_eq!(table.lookup_qualified_class("p.Missing"), None);
    }

    #[test]
    fn test_default_package_classes_by_simple_name() {
        let mut table = SymbolTable::new();
        let pkg = table.implicit_package("/src");
        let s = site(&table, 1);
        let class = table.define_class(pkg, "Top", s, ClassData::default()).unwrap();
        assert_eq!(table.lookup_qualified_class("Top"), Some(TypeRef::Source(class)));
    }

    #[test]
    fn test_package_lookup() {
        let Fixture { table, .. } = fixture();
        assert!(matches!(table.lookup_package("p"), Some(PackageRef::Source(_))));
        assert_eq!(
            table.lookup_package("java.util"),
            Some(PackageRef::External(SmolStr::new("java.util")))
        );
        assert_eq!(table.lookup_package("nowhere"), None);
    }

    #[test]
    fn test_method_lookup_from_nested_block() {
        let Fixture { mut table, method, .. } = fixture();
        let s = site(&table, 4);
        let block = table.define_block(method, "while", s).unwrap();
        let args = Signature::from_iter([TypeRef::Primitive(Primitive::Int)]);
        assert_eq!(table.lookup_method(block, "m", &args), Some(MethodRef::Source(method)));
        // Inherited from java.lang.Object once the superclass is known.
        assert_eq!(table.lookup_method(block, "hashCode", &Signature::default()), None);
    }

    #[test]
    fn test_labels_stop_at_class_and_fail_in_package() {
        let Fixture { mut table, class, method } = fixture();
        let s = site(&table, 4);
        let label = table.define_label(method, "outer", s).unwrap();
        let s = site(&table, 5);
        let block = table.define_block(method, "for", s).unwrap();
        assert_eq!(table.lookup_label(block, "outer"), Ok(Some(label)));
        assert_eq!(table.lookup_label(class, "outer"), Ok(None));
        let pkg = table.package("p").unwrap();
        assert!(matches!(
            table.lookup_label(pkg, "outer"),
            Err(SymtabError::UnsupportedOperation { scope: DefKind::Package, .. })
        ));
    }
}
