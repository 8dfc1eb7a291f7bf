//! One view over source and external classes.
//!
//! [`ClassLike`] is implemented by source class [`Definition`]s and by
//! provider [`ClassInfo`] records; [`ClassHandle`] is the tagged union
//! the resolver works with. The hierarchy queries on [`SymbolTable`]
//! (compatibility, member lookup, overload selection) are written once
//! against it.

use std::cmp::Ordering;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use super::definition::{Definition, ExternalItem, Target};
use super::external::{ClassInfo, simple_name, type_from_name};
use super::symbol_table::SymbolTable;
use super::types::{JAVA_IO_SERIALIZABLE, JAVA_LANG_CLONEABLE, JAVA_LANG_OBJECT, Signature, TypeRef};
use super::DefId;

// ============================================================================
// MEMBER REFERENCES
// ============================================================================

/// A method or constructor found by lookup.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MethodRef {
    Source(DefId),
    External { class: SmolStr, index: usize },
    ExternalConstructor { class: SmolStr, index: usize },
    /// No-argument constructor of an external interface, used when an
    /// anonymous class implements it.
    InterfaceConstructor { class: SmolStr },
}

impl MethodRef {
    pub fn target(&self) -> Target {
        match self {
            MethodRef::Source(id) => Target::Source(*id),
            MethodRef::External { class, index } => Target::External(ExternalItem::Method {
                class: class.clone(),
                index: *index,
            }),
            MethodRef::ExternalConstructor { class, index } => {
                Target::External(ExternalItem::Constructor {
                    class: class.clone(),
                    index: *index,
                })
            }
            MethodRef::InterfaceConstructor { class } => {
                Target::External(ExternalItem::InterfaceConstructor(class.clone()))
            }
        }
    }
}

/// A variable or field found by lookup.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum VarRef {
    Source(DefId),
    ExternalField { class: SmolStr, name: SmolStr },
}

impl VarRef {
    pub fn target(&self) -> Target {
        match self {
            VarRef::Source(id) => Target::Source(*id),
            VarRef::ExternalField { class, name } => Target::External(ExternalItem::Field {
                class: class.clone(),
                name: name.clone(),
            }),
        }
    }
}

// ============================================================================
// CLASS CAPABILITY
// ============================================================================

pub trait ClassLike {
    fn simple_name(&self) -> &str;
    fn is_interface(&self) -> bool;
    /// Interfaces answer `java.lang.Object` so that its methods are found.
    fn superclass(&self) -> Option<TypeRef>;
    fn interfaces(&self) -> Vec<TypeRef>;
    /// A field declared directly in this class.
    fn field(&self, name: &str) -> Option<VarRef>;
    /// An inner class declared directly in this class.
    fn inner_class(&self, name: &str) -> Option<TypeRef>;
    fn methods_named(&self, name: &str) -> Vec<MethodRef>;
    fn constructors(&self) -> Vec<MethodRef>;
}

impl ClassLike for Definition {
    fn simple_name(&self) -> &str {
        self.name()
    }

    fn is_interface(&self) -> bool {
        Definition::is_interface(self)
    }

    fn superclass(&self) -> Option<TypeRef> {
        let class = self.class()?;
        if class.is_interface {
            return Some(TypeRef::object());
        }
        class.superclass.clone()
    }

    fn interfaces(&self) -> Vec<TypeRef> {
        self.class().map(|c| c.interfaces.clone()).unwrap_or_default()
    }

    fn field(&self, name: &str) -> Option<VarRef> {
        self.scope()?.variable(name).map(VarRef::Source)
    }

    fn inner_class(&self, name: &str) -> Option<TypeRef> {
        self.scope()?.class(name).map(TypeRef::Source)
    }

    fn methods_named(&self, name: &str) -> Vec<MethodRef> {
        self.scope()
            .map(|s| s.methods_named(name).map(MethodRef::Source).collect())
            .unwrap_or_default()
    }

    fn constructors(&self) -> Vec<MethodRef> {
        self.methods_named(self.name())
    }
}

impl ClassLike for ClassInfo {
    fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    fn is_interface(&self) -> bool {
        self.is_interface
    }

    fn superclass(&self) -> Option<TypeRef> {
        if self.name == JAVA_LANG_OBJECT {
            return None;
        }
        self.superclass_name().map(type_from_name)
    }

    fn interfaces(&self) -> Vec<TypeRef> {
        self.interfaces.iter().map(|i| type_from_name(i)).collect()
    }

    fn field(&self, name: &str) -> Option<VarRef> {
        self.fields.iter().find(|f| f.name == name).map(|f| VarRef::ExternalField {
            class: SmolStr::new(&self.name),
            name: SmolStr::new(&f.name),
        })
    }

    fn inner_class(&self, name: &str) -> Option<TypeRef> {
        self.inner_classes
            .iter()
            .find(|inner| simple_name(inner) == name)
            .map(|inner| TypeRef::external(inner.as_str()))
    }

    fn methods_named(&self, name: &str) -> Vec<MethodRef> {
        self.methods
            .iter()
            .enumerate()
            .filter(|(_, m)| m.name == name)
            .map(|(index, _)| MethodRef::External {
                class: SmolStr::new(&self.name),
                index,
            })
            .collect()
    }

    fn constructors(&self) -> Vec<MethodRef> {
        if self.is_interface {
            return vec![MethodRef::InterfaceConstructor {
                class: SmolStr::new(&self.name),
            }];
        }
        (0..self.constructors.len())
            .map(|index| MethodRef::ExternalConstructor {
                class: SmolStr::new(&self.name),
                index,
            })
            .collect()
    }
}

/// A class from either origin.
#[derive(Clone, Debug)]
pub enum ClassHandle<'a> {
    Source(&'a Definition),
    External(Arc<ClassInfo>),
}

macro_rules! delegate {
    ($self:ident, $class:ident => $body:expr) => {
        match $self {
            ClassHandle::Source($class) => $body,
            ClassHandle::External($class) => $body,
        }
    };
}

impl ClassLike for ClassHandle<'_> {
    fn simple_name(&self) -> &str {
        delegate!(self, c => ClassLike::simple_name(&**c))
    }

    fn is_interface(&self) -> bool {
        delegate!(self, c => ClassLike::is_interface(&**c))
    }

    fn superclass(&self) -> Option<TypeRef> {
        delegate!(self, c => c.superclass())
    }

    fn interfaces(&self) -> Vec<TypeRef> {
        delegate!(self, c => ClassLike::interfaces(&**c))
    }

    fn field(&self, name: &str) -> Option<VarRef> {
        delegate!(self, c => ClassLike::field(&**c, name))
    }

    fn inner_class(&self, name: &str) -> Option<TypeRef> {
        delegate!(self, c => c.inner_class(name))
    }

    fn methods_named(&self, name: &str) -> Vec<MethodRef> {
        delegate!(self, c => c.methods_named(name))
    }

    fn constructors(&self) -> Vec<MethodRef> {
        delegate!(self, c => ClassLike::constructors(&**c))
    }
}

// ============================================================================
// HIERARCHY QUERIES
// ============================================================================

impl SymbolTable {
    /// The class behind a type, if it is a known class.
    pub fn class_handle(&self, ty: &TypeRef) -> Option<ClassHandle<'_>> {
        match ty {
            TypeRef::Source(id) => {
                let def = self.get(*id)?;
                def.class().is_some().then_some(ClassHandle::Source(def))
            }
            TypeRef::External(name) => self.external().class(name).map(ClassHandle::External),
            _ => None,
        }
    }

    pub fn is_interface(&self, ty: &TypeRef) -> bool {
        self.class_handle(ty).is_some_and(|c| c.is_interface())
    }

    /// Simple name of a class type, as used for constructor lookup.
    pub fn simple_type_name(&self, ty: &TypeRef) -> Option<String> {
        self.class_handle(ty).map(|c| c.simple_name().to_string())
    }

    /// Whether a value of type `from` can be used where `to` is expected.
    pub fn is_compatible(&self, from: &TypeRef, to: &TypeRef) -> bool {
        if from == to {
            return true;
        }
        match (from, to) {
            (TypeRef::Null, _) | (_, TypeRef::Null) => true,
            (TypeRef::Primitive(a), TypeRef::Primitive(b)) => a.widens_to(*b),
            (TypeRef::Primitive(_), _) | (_, TypeRef::Primitive(_)) => false,
            (_, TypeRef::External(name)) if name == JAVA_LANG_OBJECT => true,
            (TypeRef::Array(a), TypeRef::Array(b)) => {
                if a.as_primitive().is_some() || b.as_primitive().is_some() {
                    a == b
                } else {
                    self.is_compatible(a, b)
                }
            }
            (TypeRef::Array(_), TypeRef::External(name)) => {
                name == JAVA_LANG_CLONEABLE || name == JAVA_IO_SERIALIZABLE
            }
            (TypeRef::Array(_), _) | (_, TypeRef::Array(_)) => false,
            _ => self.is_subtype(from, to, &mut FxHashSet::default()),
        }
    }

    fn is_subtype(&self, from: &TypeRef, to: &TypeRef, visited: &mut FxHashSet<TypeRef>) -> bool {
        if from == to {
            return true;
        }
        if !visited.insert(from.clone()) {
            return false;
        }
        let Some(class) = self.class_handle(from) else {
            return false;
        };
        let superclass = class.superclass();
        let interfaces = class.interfaces();
        superclass.is_some_and(|s| self.is_subtype(&s, to, visited))
            || interfaces.iter().any(|i| self.is_subtype(i, to, visited))
    }

    /// Arguments are compatible with parameters position by position.
    /// Unknown types on either side match anything.
    pub fn is_compatible_signature(&self, arguments: &Signature, parameters: &Signature) -> bool {
        arguments.len() == parameters.len()
            && arguments.iter().zip(parameters.iter()).all(|(a, p)| match (a, p) {
                (Some(a), Some(p)) => self.is_compatible(a, p),
                _ => true,
            })
    }

    pub fn signature_of(&self, method: &MethodRef) -> Signature {
        match method {
            MethodRef::Source(id) => {
                let params = self
                    .def(*id)
                    .method()
                    .map(|m| m.parameters.clone())
                    .unwrap_or_default();
                Signature::new(
                    params
                        .iter()
                        .map(|p| self.def(*p).variable().and_then(|v| v.ty.clone()))
                        .collect(),
                )
            }
            MethodRef::External { class, index } => self
                .external()
                .class(class)
                .and_then(|c| c.methods.get(*index).map(|m| m.parameter_types().into_iter().collect()))
                .unwrap_or_default(),
            MethodRef::ExternalConstructor { class, index } => self
                .external()
                .class(class)
                .and_then(|c| {
                    c.constructors
                        .get(*index)
                        .map(|m| m.parameter_types().into_iter().collect())
                })
                .unwrap_or_default(),
            MethodRef::InterfaceConstructor { .. } => Signature::default(),
        }
    }

    pub fn return_type_of(&self, method: &MethodRef) -> Option<TypeRef> {
        match method {
            MethodRef::Source(id) => self.def(*id).method().and_then(|m| m.return_type.clone()),
            MethodRef::External { class, index } => self
                .external()
                .class(class)
                .and_then(|c| c.methods.get(*index).map(|m| m.return_type())),
            MethodRef::ExternalConstructor { class, .. } | MethodRef::InterfaceConstructor { class } => {
                Some(TypeRef::External(class.clone()))
            }
        }
    }

    pub fn variable_type(&self, variable: &VarRef) -> Option<TypeRef> {
        match variable {
            VarRef::Source(id) => self.def(*id).variable().and_then(|v| v.ty.clone()),
            VarRef::ExternalField { class, name } => self
                .external()
                .class(class)
                .and_then(|c| c.fields.iter().find(|f| f.name == name.as_str()).map(|f| type_from_name(&f.ty))),
        }
    }

    /// A field of `ty`: own fields, then interfaces, then the superclass.
    pub fn find_field(&self, ty: &TypeRef, name: &str) -> Option<VarRef> {
        self.find_field_in(ty, name, &mut FxHashSet::default())
    }

    fn find_field_in(&self, ty: &TypeRef, name: &str, visited: &mut FxHashSet<TypeRef>) -> Option<VarRef> {
        if !visited.insert(ty.clone()) {
            return None;
        }
        let class = self.class_handle(ty)?;
        if let Some(field) = class.field(name) {
            return Some(field);
        }
        let superclass = class.superclass();
        let interfaces = class.interfaces();
        interfaces
            .iter()
            .find_map(|i| self.find_field_in(i, name, visited))
            .or_else(|| superclass.and_then(|s| self.find_field_in(&s, name, visited)))
    }

    /// An inner class of `ty`: own, then inherited.
    pub fn find_inner_class(&self, ty: &TypeRef, name: &str) -> Option<TypeRef> {
        self.find_inner_class_in(ty, name, &mut FxHashSet::default())
    }

    fn find_inner_class_in(&self, ty: &TypeRef, name: &str, visited: &mut FxHashSet<TypeRef>) -> Option<TypeRef> {
        if !visited.insert(ty.clone()) {
            return None;
        }
        let class = self.class_handle(ty)?;
        if let Some(inner) = class.inner_class(name) {
            return Some(inner);
        }
        let superclass = class.superclass();
        let interfaces = class.interfaces();
        superclass
            .and_then(|s| self.find_inner_class_in(&s, name, visited))
            .or_else(|| interfaces.iter().find_map(|i| self.find_inner_class_in(i, name, visited)))
    }

    /// A method of `ty` callable with `arguments`.
    ///
    /// A name equal to the class's simple name selects among its
    /// constructors. Otherwise: an exact signature match among declared
    /// methods, then the most specific compatible declared method, then
    /// the superclass, then the interfaces. Arrays answer for `Object`.
    pub fn find_method(&self, ty: &TypeRef, name: &str, arguments: &Signature) -> Option<MethodRef> {
        self.find_method_in(ty, name, arguments, &mut FxHashSet::default())
    }

    fn find_method_in(
        &self,
        ty: &TypeRef,
        name: &str,
        arguments: &Signature,
        visited: &mut FxHashSet<TypeRef>,
    ) -> Option<MethodRef> {
        if let TypeRef::Array(_) = ty {
            return self.find_method_in(&TypeRef::object(), name, arguments, visited);
        }
        if !visited.insert(ty.clone()) {
            return None;
        }
        let class = self.class_handle(ty)?;
        if class.simple_name() == name {
            return self.select_method(class.constructors(), arguments);
        }
        if let Some(found) = self.select_method(class.methods_named(name), arguments) {
            return Some(found);
        }
        let superclass = class.superclass();
        let interfaces = class.interfaces();
        superclass
            .and_then(|s| self.find_method_in(&s, name, arguments, visited))
            .or_else(|| {
                interfaces
                    .iter()
                    .find_map(|i| self.find_method_in(i, name, arguments, visited))
            })
    }

    /// Exact match first, then the most specific compatible candidate.
    /// Ties keep the earlier declaration.
    fn select_method(&self, candidates: Vec<MethodRef>, arguments: &Signature) -> Option<MethodRef> {
        let with_signatures: Vec<(MethodRef, Signature)> = candidates
            .into_iter()
            .map(|m| {
                let sig = self.signature_of(&m);
                (m, sig)
            })
            .collect();

        if let Some((exact, _)) = with_signatures.iter().find(|(_, sig)| sig == arguments) {
            return Some(exact.clone());
        }

        let mut best: Option<&(MethodRef, Signature)> = None;
        for candidate in with_signatures
            .iter()
            .filter(|(_, sig)| self.is_compatible_signature(arguments, sig))
        {
            best = match best {
                Some(current) if self.compare_signatures(&candidate.1, &current.1) != Ordering::Less => {
                    Some(current)
                }
                _ => Some(candidate),
            };
        }
        best.map(|(m, _)| m.clone())
    }

    /// One-round specificity: `a` sorts before `b` when `a`'s parameters
    /// are compatible with `b`'s but not the other way round. Unrelated
    /// or mutually compatible signatures compare equal.
    /// A primitive parameter counts as more specific than `Object` here,
    /// though a primitive argument is not compatible with `Object`.
    pub fn compare_signatures(&self, a: &Signature, b: &Signature) -> Ordering {
        let a_fits_b = self.narrower_signature(a, b);
        let b_fits_a = self.narrower_signature(b, a);
        match (a_fits_b, b_fits_a) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => Ordering::Equal,
        }
    }

    fn narrower_signature(&self, narrow: &Signature, wide: &Signature) -> bool {
        narrow.len() == wide.len()
            && narrow.iter().zip(wide.iter()).all(|(n, w)| match (n, w) {
                (Some(TypeRef::Primitive(_)), Some(TypeRef::External(name))) if name == JAVA_LANG_OBJECT => true,
                (Some(n), Some(w)) => self.is_compatible(n, w),
                _ => true,
            })
    }

    pub fn compare_specificity(&self, a: &MethodRef, b: &MethodRef) -> Ordering {
        self.compare_signatures(&self.signature_of(a), &self.signature_of(b))
    }
}
