//! Classes that are not declared in source.
//!
//! When a name cannot be found among source declarations, resolution asks
//! a [`ClassInfoProvider`] for the structure of the class: supertypes,
//! fields, methods, constructors and inner classes. A miss is a normal
//! outcome and is treated like an unresolved source name.
//!
//! Type names inside a [`ClassInfo`] are written as Java source names
//! (`int`, `java.lang.String`, `char[]`). Inner classes use `$`
//! (`java.util.Map$Entry`).

mod jdk;

#[cfg(feature = "interchange")]
mod interchange;

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::types::{JAVA_LANG_OBJECT, Primitive, TypeRef};

pub use jdk::StaticClassProvider;

#[cfg(feature = "interchange")]
pub use interchange::InterchangeError;

// ============================================================================
// PROVIDER
// ============================================================================

/// Source of structural information about compiled classes.
pub trait ClassInfoProvider: Send + Sync {
    /// Look up a class by fully qualified name.
    fn lookup(&self, name: &str) -> Option<ClassInfo>;

    /// Whether `name` is a known package.
    fn is_package(&self, name: &str) -> bool;
}

// ============================================================================
// CLASS INFO
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldInfo {
    pub name: String,
    pub ty: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodInfo {
    pub name: String,
    pub parameters: Vec<String>,
    pub return_type: String,
    #[cfg_attr(feature = "interchange", serde(default))]
    pub exceptions: Vec<String>,
}

impl MethodInfo {
    pub fn parameter_types(&self) -> Vec<TypeRef> {
        self.parameters.iter().map(|p| type_from_name(p)).collect()
    }

    pub fn return_type(&self) -> TypeRef {
        type_from_name(&self.return_type)
    }
}

/// Structure of one external class or interface.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassInfo {
    pub name: String,
    #[cfg_attr(feature = "interchange", serde(default))]
    pub is_interface: bool,
    #[cfg_attr(feature = "interchange", serde(default))]
    pub superclass: Option<String>,
    #[cfg_attr(feature = "interchange", serde(default))]
    pub interfaces: Vec<String>,
    #[cfg_attr(feature = "interchange", serde(default))]
    pub fields: Vec<FieldInfo>,
    #[cfg_attr(feature = "interchange", serde(default))]
    pub methods: Vec<MethodInfo>,
    #[cfg_attr(feature = "interchange", serde(default))]
    pub constructors: Vec<MethodInfo>,
    #[cfg_attr(feature = "interchange", serde(default))]
    pub inner_classes: Vec<String>,
}

impl ClassInfo {
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_interface: true,
            ..Self::default()
        }
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.fields.push(FieldInfo {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    pub fn method(self, name: &str, parameters: &[&str], return_type: &str) -> Self {
        self.method_throws(name, parameters, return_type, &[])
    }

    pub fn method_throws(
        mut self,
        name: &str,
        parameters: &[&str],
        return_type: &str,
        exceptions: &[&str],
    ) -> Self {
        self.methods.push(MethodInfo {
            name: name.to_string(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            return_type: return_type.to_string(),
            exceptions: exceptions.iter().map(|e| e.to_string()).collect(),
        });
        self
    }

    pub fn constructor(mut self, parameters: &[&str]) -> Self {
        self.constructors.push(MethodInfo {
            name: self.simple_name().to_string(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            return_type: self.name.clone(),
            exceptions: Vec::new(),
        });
        self
    }

    pub fn inner(mut self, name: impl Into<String>) -> Self {
        self.inner_classes.push(name.into());
        self
    }

    /// The name after the last `.` and `$`.
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    /// Interfaces report `java.lang.Object` as their superclass.
    pub fn superclass_name(&self) -> Option<&str> {
        if self.is_interface {
            return Some(JAVA_LANG_OBJECT);
        }
        self.superclass.as_deref()
    }
}

pub(crate) fn simple_name(name: &str) -> &str {
    let after_dot = name.rsplit('.').next().unwrap_or(name);
    after_dot.rsplit('$').next().unwrap_or(after_dot)
}

/// Turn a Java source type name into a [`TypeRef`].
pub fn type_from_name(name: &str) -> TypeRef {
    let name = name.trim();
    if let Some(component) = name.strip_suffix("[]") {
        return TypeRef::array_of(type_from_name(component));
    }
    match Primitive::from_name(name) {
        Some(primitive) => TypeRef::Primitive(primitive),
        None => TypeRef::external(name),
    }
}

// ============================================================================
// CACHE
// ============================================================================

/// Memoising front for a provider. Misses are cached too.
pub struct ExternalClasses {
    provider: Arc<dyn ClassInfoProvider>,
    cache: RwLock<FxHashMap<SmolStr, Option<Arc<ClassInfo>>>>,
}

impl ExternalClasses {
    pub fn new(provider: Arc<dyn ClassInfoProvider>) -> Self {
        Self {
            provider,
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// Look a class up, remembering misses as well as hits.
    pub fn class(&self, name: &str) -> Option<Arc<ClassInfo>> {
        if let Some(hit) = self.cache.read().get(name) {
            return hit.clone();
        }

        let found = self.provider.lookup(name).map(Arc::new);
        self.cache
            .write()
            .entry(SmolStr::new(name))
            .or_insert(found)
            .clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.class(name).is_some()
    }

    pub fn is_package(&self, name: &str) -> bool {
        self.provider.is_package(name)
    }

    pub fn provider(&self) -> &Arc<dyn ClassInfoProvider> {
        &self.provider
    }
}

impl fmt::Debug for ExternalClasses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalClasses")
            .field("cached", &self.cache.read().len())
            .finish()
    }
}
