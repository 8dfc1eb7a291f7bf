//! Static types, primitive/literal tables and promotion rules.
//!
//! Everything here is immutable. Compatibility between reference types
//! needs the class hierarchy and lives in [`class_type`](super::class_type);
//! this module only knows about primitives.

use std::fmt;

use smol_str::SmolStr;

use super::DefId;
use crate::syntax::{NodeRef, SyntaxKind};

pub const JAVA_LANG_OBJECT: &str = "java.lang.Object";
pub const JAVA_LANG_STRING: &str = "java.lang.String";
pub const JAVA_LANG_CLASS: &str = "java.lang.Class";
pub const JAVA_LANG_CLONEABLE: &str = "java.lang.Cloneable";
pub const JAVA_IO_SERIALIZABLE: &str = "java.io.Serializable";

// ============================================================================
// PRIMITIVES
// ============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl Primitive {
    pub const ALL: [Primitive; 9] = [
        Primitive::Boolean,
        Primitive::Byte,
        Primitive::Char,
        Primitive::Short,
        Primitive::Int,
        Primitive::Long,
        Primitive::Float,
        Primitive::Double,
        Primitive::Void,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Void => "void",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Primitive::Boolean | Primitive::Void)
    }

    /// Widening primitive conversion, identity included.
    pub fn widens_to(self, target: Primitive) -> bool {
        use Primitive::*;
        if self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short | Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => target == Double,
            Boolean | Double | Void => false,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// TYPE REFERENCES
// ============================================================================

/// The static type of a declaration or expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A class or interface declared in source.
    Source(DefId),
    /// A class known only to the class-info provider, by qualified name.
    External(SmolStr),
    Primitive(Primitive),
    Array(Box<TypeRef>),
    /// The type of `null`; compatible with every type.
    Null,
}

impl TypeRef {
    pub fn external(name: impl Into<SmolStr>) -> Self {
        TypeRef::External(name.into())
    }

    pub fn object() -> Self {
        TypeRef::external(JAVA_LANG_OBJECT)
    }

    pub fn string() -> Self {
        TypeRef::external(JAVA_LANG_STRING)
    }

    pub fn array_of(component: TypeRef) -> Self {
        TypeRef::Array(Box::new(component))
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            TypeRef::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_primitive(&self, primitive: Primitive) -> bool {
        self.as_primitive() == Some(primitive)
    }

    pub fn is_external(&self, name: &str) -> bool {
        matches!(self, TypeRef::External(n) if n == name)
    }

    pub fn is_string(&self) -> bool {
        self.is_external(JAVA_LANG_STRING)
    }

    pub fn component(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Array(inner) => Some(inner),
            _ => None,
        }
    }

    /// Classes and interfaces, source or external.
    pub fn is_class(&self) -> bool {
        matches!(self, TypeRef::Source(_) | TypeRef::External(_))
    }
}

// ============================================================================
// UNRESOLVED
// ============================================================================

/// An expression that could not be resolved.
///
/// Carries the offending source text and node so that diagnostics can
/// point at it. Unresolved types are compatible with everything.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Unresolved {
    pub text: SmolStr,
    pub node: NodeRef,
}

impl Unresolved {
    pub fn new(text: impl Into<SmolStr>, node: NodeRef) -> Self {
        Self {
            text: text.into(),
            node,
        }
    }
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unresolved `{}`", self.text)
    }
}

/// Outcome of resolving one expression.
pub type Resolved = Result<TypeRef, Unresolved>;

// ============================================================================
// SIGNATURES
// ============================================================================

/// Parameter or argument types of a call. `None` stands for a type that
/// is not known (an unresolved argument) and matches any parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Signature(pub Vec<Option<TypeRef>>);

impl Signature {
    pub fn new(types: Vec<Option<TypeRef>>) -> Self {
        Self(types)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&TypeRef>> {
        self.0.iter().map(Option::as_ref)
    }
}

impl FromIterator<TypeRef> for Signature {
    fn from_iter<I: IntoIterator<Item = TypeRef>>(iter: I) -> Self {
        Self(iter.into_iter().map(Some).collect())
    }
}

// ============================================================================
// LITERALS & PROMOTION
// ============================================================================

/// Fixed token-to-type table for literals.
pub fn literal_type(kind: SyntaxKind) -> Option<TypeRef> {
    let ty = match kind {
        SyntaxKind::IntLit => TypeRef::Primitive(Primitive::Int),
        SyntaxKind::LongLit => TypeRef::Primitive(Primitive::Long),
        SyntaxKind::FloatLit => TypeRef::Primitive(Primitive::Float),
        SyntaxKind::DoubleLit => TypeRef::Primitive(Primitive::Double),
        SyntaxKind::CharLit => TypeRef::Primitive(Primitive::Char),
        SyntaxKind::TrueLit | SyntaxKind::FalseLit => TypeRef::Primitive(Primitive::Boolean),
        SyntaxKind::StringLit => TypeRef::string(),
        SyntaxKind::NullLit => TypeRef::Null,
        _ => return None,
    };
    Some(ty)
}

/// Result type of a binary arithmetic or bitwise operator.
///
/// A `String` on either side wins, then `boolean` on either side, then
/// the widest of double, float, long and int. Anything else yields the
/// left operand's type.
pub fn binary_promotion(left: &TypeRef, right: &TypeRef) -> TypeRef {
    if left.is_string() || right.is_string() {
        return TypeRef::string();
    }
    if left.is_primitive(Primitive::Boolean) || right.is_primitive(Primitive::Boolean) {
        return TypeRef::Primitive(Primitive::Boolean);
    }
    match (left.as_primitive(), right.as_primitive()) {
        (Some(l), Some(r)) if l.is_numeric() && r.is_numeric() => {
            let widest = [Primitive::Double, Primitive::Float, Primitive::Long]
                .into_iter()
                .find(|p| l == *p || r == *p)
                .unwrap_or(Primitive::Int);
            TypeRef::Primitive(widest)
        }
        _ => left.clone(),
    }
}

/// Unary numeric promotion: `byte`, `short` and `char` become `int`.
pub fn unary_promotion(operand: &TypeRef) -> TypeRef {
    match operand.as_primitive() {
        Some(Primitive::Byte | Primitive::Short | Primitive::Char) => TypeRef::Primitive(Primitive::Int),
        _ => operand.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prim(p: Primitive) -> TypeRef {
        TypeRef::Primitive(p)
    }

    #[test]
    fn test_primitive_names_round_trip() {
        for p in Primitive::ALL {
            assert_eq!(Primitive::from_name(p.name()), Some(p));
        }
        assert_eq!(Primitive::from_name("String"), None);
    }

    #[test]
    fn test_widening_table() {
        assert!(Primitive::Byte.widens_to(Primitive::Double));
        assert!(Primitive::Char.widens_to(Primitive::Int));
        assert!(!Primitive::Char.widens_to(Primitive::Short));
        assert!(!Primitive::Long.widens_to(Primitive::Int));
        assert!(!Primitive::Boolean.widens_to(Primitive::Int));
        assert!(Primitive::Boolean.widens_to(Primitive::Boolean));
    }

    #[test]
    fn test_int_plus_double_is_double() {
        assert_eq!(
            binary_promotion(&prim(Primitive::Int), &prim(Primitive::Double)),
            prim(Primitive::Double)
        );
    }

    #[test]
    fn test_string_wins_over_everything() {
        assert_eq!(
            binary_promotion(&prim(Primitive::Int), &TypeRef::string()),
            TypeRef::string()
        );
        assert_eq!(
            binary_promotion(&TypeRef::string(), &prim(Primitive::Boolean)),
            TypeRef::string()
        );
    }

    #[test]
    fn test_small_integers_promote_to_int() {
        assert_eq!(
            binary_promotion(&prim(Primitive::Byte), &prim(Primitive::Char)),
            prim(Primitive::Int)
        );
        assert_eq!(unary_promotion(&prim(Primitive::Short)), prim(Primitive::Int));
        assert_eq!(unary_promotion(&prim(Primitive::Long)), prim(Primitive::Long));
    }

    #[test]
    fn test_non_numeric_falls_back_to_left() {
        let object = TypeRef::object();
        assert_eq!(binary_promotion(&object, &prim(Primitive::Int)), object);
    }

    #[test]
    fn test_literal_table() {
        assert_eq!(literal_type(SyntaxKind::LongLit), Some(prim(Primitive::Long)));
        assert_eq!(literal_type(SyntaxKind::StringLit), Some(TypeRef::string()));
        assert_eq!(literal_type(SyntaxKind::NullLit), Some(TypeRef::Null));
        assert_eq!(literal_type(SyntaxKind::Ident), None);
    }
}
