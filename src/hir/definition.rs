//! Definitions and scopes.
//!
//! Every named entity (package, class, method, variable, label) and every
//! anonymous block is a [`Definition`] stored in the symbol table arena.
//! Definitions that can contain other declarations also carry a [`Scope`]
//! with separate namespaces for values, types, labels and packages.
//!
//! Behaviour that differs between scope kinds is driven by the capability
//! methods on [`DefKind`] rather than by separate types.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::types::{Primitive, TypeRef};
use super::DefId;
use crate::base::Occurrence;
use crate::syntax::NodeRef;

// ============================================================================
// KINDS
// ============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DefKind {
    /// The root scope; terminal point of every lookup chain.
    Base,
    Package,
    Class,
    Method,
    /// An anonymous statement scope (`for`, `if`, `try`, ...).
    Block,
    Variable,
    Label,
}

impl DefKind {
    pub fn is_scope(self) -> bool {
        matches!(
            self,
            DefKind::Base | DefKind::Package | DefKind::Class | DefKind::Method | DefKind::Block
        )
    }

    pub fn can_hold_packages(self) -> bool {
        matches!(self, DefKind::Base | DefKind::Package)
    }

    pub fn can_hold_labels(self) -> bool {
        matches!(self, DefKind::Method | DefKind::Block)
    }

    /// Whether a failed local lookup continues in the parent scope.
    pub fn delegates_to_parent(self) -> bool {
        self.is_scope() && self != DefKind::Base
    }

    pub fn display(self) -> &'static str {
        match self {
            DefKind::Base => "base",
            DefKind::Package => "package",
            DefKind::Class => "class",
            DefKind::Method => "method",
            DefKind::Block => "block",
            DefKind::Variable => "variable",
            DefKind::Label => "label",
        }
    }
}

impl fmt::Display for DefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Protected,
    Private,
    #[default]
    Package,
}

impl Visibility {
    pub fn from_modifiers<'a>(modifiers: impl IntoIterator<Item = &'a str>) -> Self {
        for modifier in modifiers {
            match modifier {
                "public" => return Visibility::Public,
                "protected" => return Visibility::Protected,
                "private" => return Visibility::Private,
                _ => {}
            }
        }
        Visibility::Package
    }
}

// ============================================================================
// BINDINGS & REFERENCES
// ============================================================================

/// A member of a class known only to the class-info provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExternalItem {
    Class(SmolStr),
    Method { class: SmolStr, index: usize },
    Constructor { class: SmolStr, index: usize },
    /// The implicit no-argument constructor of an interface, used by
    /// anonymous implementations.
    InterfaceConstructor(SmolStr),
    Field { class: SmolStr, name: SmolStr },
    /// The `length` of any array type.
    ArrayLength,
}

/// What a syntax node denotes after resolution.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    Source(DefId),
    External(ExternalItem),
    /// A package known only to the class-info provider.
    ExternalPackage(SmolStr),
    Primitive(Primitive),
    Unresolved,
}

impl Target {
    /// What a type name denotes; arrays denote their element type.
    pub fn of_type(ty: &TypeRef) -> Self {
        match ty {
            TypeRef::Source(id) => Target::Source(*id),
            TypeRef::External(name) => Target::External(ExternalItem::Class(name.clone())),
            TypeRef::Primitive(p) => Target::Primitive(*p),
            TypeRef::Array(component) => Target::of_type(component),
            TypeRef::Null => Target::Unresolved,
        }
    }

    pub fn as_source(&self) -> Option<DefId> {
        match self {
            Target::Source(id) => Some(*id),
            _ => None,
        }
    }
}

/// One occurrence of a name that resolved to `target`.
///
/// Equality and ordering consider only the occurrence, so a set of
/// references is sorted by (file, line, column) and a position recorded
/// twice collapses into one entry.
#[derive(Copy, Clone, Debug)]
pub struct Reference {
    pub occurrence: Occurrence,
    pub node: NodeRef,
    pub target: DefId,
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        self.occurrence == other.occurrence
    }
}

impl Eq for Reference {}

impl PartialOrd for Reference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Reference {
    fn cmp(&self, other: &Self) -> Ordering {
        self.occurrence.cmp(&other.occurrence)
    }
}

// ============================================================================
// SCOPE
// ============================================================================

/// Which namespace of a scope a definition lands in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Namespace {
    Values,
    Types,
    Labels,
    Packages,
    Methods,
    Blocks,
}

impl Namespace {
    pub fn of(kind: DefKind) -> Self {
        match kind {
            DefKind::Variable => Namespace::Values,
            DefKind::Class => Namespace::Types,
            DefKind::Label => Namespace::Labels,
            DefKind::Package | DefKind::Base => Namespace::Packages,
            DefKind::Method => Namespace::Methods,
            DefKind::Block => Namespace::Blocks,
        }
    }
}

/// The declarations owned by a scope.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    values: IndexMap<SmolStr, DefId>,
    types: IndexMap<SmolStr, DefId>,
    labels: IndexMap<SmolStr, DefId>,
    packages: IndexMap<SmolStr, DefId>,
    methods: Vec<(SmolStr, DefId)>,
    blocks: Vec<DefId>,
    references: BTreeSet<Reference>,
}

impl Scope {
    /// Insert into the namespace for `namespace`. Named namespaces keep
    /// the first definition of a name; returns the id that is now bound.
    pub(crate) fn insert(&mut self, namespace: Namespace, name: &SmolStr, id: DefId) -> DefId {
        let map = match namespace {
            Namespace::Values => &mut self.values,
            Namespace::Types => &mut self.types,
            Namespace::Labels => &mut self.labels,
            Namespace::Packages => &mut self.packages,
            Namespace::Methods => {
                self.methods.push((name.clone(), id));
                return id;
            }
            Namespace::Blocks => {
                self.blocks.push(id);
                return id;
            }
        };
        *map.entry(name.clone()).or_insert(id)
    }

    pub(crate) fn remove_method(&mut self, id: DefId) {
        self.methods.retain(|(_, m)| *m != id);
    }

    pub(crate) fn add_reference(&mut self, reference: Reference) {
        self.references.insert(reference);
    }

    pub fn variable(&self, name: &str) -> Option<DefId> {
        self.values.get(name).copied()
    }

    pub fn class(&self, name: &str) -> Option<DefId> {
        self.types.get(name).copied()
    }

    pub fn label(&self, name: &str) -> Option<DefId> {
        self.labels.get(name).copied()
    }

    pub fn package(&self, name: &str) -> Option<DefId> {
        self.packages.get(name).copied()
    }

    pub fn variables(&self) -> impl Iterator<Item = DefId> + '_ {
        self.values.values().copied()
    }

    pub fn classes(&self) -> impl Iterator<Item = (&SmolStr, DefId)> + '_ {
        self.types.iter().map(|(name, id)| (name, *id))
    }

    pub fn packages(&self) -> impl Iterator<Item = DefId> + '_ {
        self.packages.values().copied()
    }

    pub fn methods(&self) -> impl Iterator<Item = DefId> + '_ {
        self.methods.iter().map(|(_, id)| *id)
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = DefId> + 'a {
        self.methods
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, id)| *id)
    }

    pub fn blocks(&self) -> &[DefId] {
        &self.blocks
    }

    /// References created while resolving code inside this scope.
    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.references.iter()
    }
}

// ============================================================================
// KIND-SPECIFIC DATA
// ============================================================================

/// A package named in an import, from source or from the provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PackageRef {
    Source(DefId),
    External(SmolStr),
}

#[derive(Clone, Debug, Default)]
pub struct PackageData {
    /// Synthesised for files without a package declaration.
    pub implicit: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ClassData {
    pub is_interface: bool,
    pub is_anonymous: bool,
    pub visibility: Visibility,
    pub superclass: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub subclasses: Vec<DefId>,
    pub implementors: Vec<DefId>,
    /// Single-type imports and classes pulled in by `Outer.*`, keyed by
    /// simple name.
    pub imported_classes: IndexMap<SmolStr, TypeRef>,
    pub imported_packages: Vec<PackageRef>,
    /// `Import` nodes waiting for the finishing pass.
    pub unprocessed_imports: Vec<NodeRef>,
    pub default_constructor: Option<DefId>,
    pub(crate) anonymous_count: u32,
}

#[derive(Clone, Debug, Default)]
pub struct MethodData {
    pub return_type: Option<TypeRef>,
    pub parameters: Vec<DefId>,
    pub exceptions: Vec<TypeRef>,
    pub visibility: Visibility,
    pub is_constructor: bool,
    pub is_default_constructor: bool,
}

#[derive(Clone, Debug, Default)]
pub struct VariableData {
    pub ty: Option<TypeRef>,
    pub visibility: Visibility,
    pub assigned_at_declaration: bool,
}

#[derive(Clone, Debug, Default)]
pub enum Detail {
    #[default]
    None,
    Package(PackageData),
    Class(ClassData),
    Method(MethodData),
    Variable(VariableData),
}

// ============================================================================
// DEFINITION
// ============================================================================

#[derive(Clone, Debug)]
pub struct Definition {
    id: DefId,
    name: SmolStr,
    kind: DefKind,
    parent: Option<DefId>,
    occurrence: Option<Occurrence>,
    node: Option<NodeRef>,
    references: BTreeSet<Reference>,
    scope: Option<Scope>,
    detail: Detail,
}

impl Definition {
    pub(crate) fn new(id: DefId, name: impl Into<SmolStr>, kind: DefKind, parent: Option<DefId>) -> Self {
        let detail = match kind {
            DefKind::Package => Detail::Package(PackageData::default()),
            DefKind::Class => Detail::Class(ClassData::default()),
            DefKind::Method => Detail::Method(MethodData::default()),
            DefKind::Variable => Detail::Variable(VariableData::default()),
            _ => Detail::None,
        };
        Self {
            id,
            name: name.into(),
            kind,
            parent,
            occurrence: None,
            node: None,
            references: BTreeSet::new(),
            scope: kind.is_scope().then(Scope::default),
            detail,
        }
    }

    pub(crate) fn at(mut self, node: NodeRef, occurrence: Occurrence) -> Self {
        self.node = Some(node);
        self.occurrence = Some(occurrence);
        self
    }

    pub(crate) fn with_detail(mut self, detail: Detail) -> Self {
        self.detail = detail;
        self
    }

    pub fn id(&self) -> DefId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DefKind {
        self.kind
    }

    /// The owning scope; `None` only for the base scope.
    pub fn parent(&self) -> Option<DefId> {
        self.parent
    }

    /// Where the name is declared; `None` for synthesised definitions.
    pub fn occurrence(&self) -> Option<Occurrence> {
        self.occurrence
    }

    /// The declaring syntax node.
    pub fn node(&self) -> Option<NodeRef> {
        self.node
    }

    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.references.iter()
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    pub(crate) fn add_reference(&mut self, reference: Reference) {
        self.references.insert(reference);
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub(crate) fn scope_mut(&mut self) -> Option<&mut Scope> {
        self.scope.as_mut()
    }

    pub fn detail(&self) -> &Detail {
        &self.detail
    }

    pub fn package(&self) -> Option<&PackageData> {
        match &self.detail {
            Detail::Package(data) => Some(data),
            _ => None,
        }
    }

    pub fn class(&self) -> Option<&ClassData> {
        match &self.detail {
            Detail::Class(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn class_mut(&mut self) -> Option<&mut ClassData> {
        match &mut self.detail {
            Detail::Class(data) => Some(data),
            _ => None,
        }
    }

    pub fn method(&self) -> Option<&MethodData> {
        match &self.detail {
            Detail::Method(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn method_mut(&mut self) -> Option<&mut MethodData> {
        match &mut self.detail {
            Detail::Method(data) => Some(data),
            _ => None,
        }
    }

    pub fn variable(&self) -> Option<&VariableData> {
        match &self.detail {
            Detail::Variable(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn variable_mut(&mut self) -> Option<&mut VariableData> {
        match &mut self.detail {
            Detail::Variable(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_interface(&self) -> bool {
        self.class().is_some_and(|c| c.is_interface)
    }

    pub fn is_implicit_package(&self) -> bool {
        self.package().is_some_and(|p| p.implicit)
    }
}
