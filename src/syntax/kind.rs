//! Node kinds of the Java syntax tree.

use std::fmt;

/// The kind of a [`SyntaxTree`](super::SyntaxTree) node.
///
/// Shapes (children in order, `?` optional, `*` repeated):
///
/// ```text
/// CompilationUnit   PackageDecl? Import* (ClassDef|InterfaceDef)*
/// PackageDecl       name
/// Import            name            (last segment may be Star)
/// ClassDef          Modifiers Ident ExtendsClause? ImplementsClause? ObjBlock
/// InterfaceDef      Modifiers Ident ExtendsClause? ObjBlock
/// VariableDef       Modifiers Type Ident VariableInit?
/// MethodDef         Modifiers Type Ident Parameters Throws? Slist?
/// CtorDef           Modifiers Ident Parameters Throws? Slist
/// Parameter         Modifiers Type Ident
/// Type              PrimitiveType | name | ArrayDeclarator
/// ArrayDeclarator   PrimitiveType | name | ArrayDeclarator
/// If                cond stmt Else?
/// For               ForInit ForCond ForIter stmt
/// Try               Slist Catch* Finally?
/// Catch             Parameter Slist
/// Switch            expr CaseGroup*
/// CaseGroup         (Case|Default)* Slist
/// Labeled           Ident stmt
/// MethodCall        callee Arguments
/// New               name Arguments ObjBlock?
/// NewArray          (PrimitiveType|name) Dim* ArrayInit?
/// Cast              Type expr
/// InstanceOf        expr Type
/// Ternary           cond expr expr
/// Dot               expr (Ident|ClassLit|This)
/// ```
///
/// A `name` is an `Ident` or a left-nested chain of `Dot` nodes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    // Declarations
    CompilationUnit,
    PackageDecl,
    Import,
    ClassDef,
    InterfaceDef,
    Modifiers,
    Modifier,
    ExtendsClause,
    ImplementsClause,
    ObjBlock,
    VariableDef,
    VariableInit,
    MethodDef,
    CtorDef,
    Parameters,
    Parameter,
    Throws,
    StaticInit,
    InstanceInit,
    Type,
    ArrayDeclarator,
    PrimitiveType,

    // Statements
    Slist,
    ExprStmt,
    If,
    Else,
    For,
    ForInit,
    ForCond,
    ForIter,
    While,
    DoWhile,
    Try,
    Catch,
    Finally,
    Switch,
    CaseGroup,
    Case,
    Default,
    Synchronized,
    Return,
    Throw,
    Break,
    Continue,
    Labeled,
    Assert,
    Empty,

    // Expressions
    Ident,
    Star,
    Dot,
    MethodCall,
    Arguments,
    SuperCtorCall,
    ThisCtorCall,
    New,
    NewArray,
    Dim,
    ArrayInit,
    Index,
    Cast,
    InstanceOf,
    Ternary,
    Assign,
    CompoundAssign,
    ShiftAssign,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
    LogAnd,
    LogOr,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    NotEq,
    UnaryMinus,
    UnaryPlus,
    LogNot,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    This,
    Super,
    ClassLit,

    // Literals
    IntLit,
    LongLit,
    FloatLit,
    DoubleLit,
    CharLit,
    StringLit,
    TrueLit,
    FalseLit,
    NullLit,
}

impl SyntaxKind {
    /// Kinds that open a block scope when entered.
    pub fn is_block_scope(self) -> bool {
        matches!(
            self,
            SyntaxKind::For
                | SyntaxKind::If
                | SyntaxKind::Else
                | SyntaxKind::While
                | SyntaxKind::DoWhile
                | SyntaxKind::Try
                | SyntaxKind::Finally
                | SyntaxKind::Catch
                | SyntaxKind::Switch
                | SyntaxKind::Synchronized
                | SyntaxKind::StaticInit
                | SyntaxKind::InstanceInit
                | SyntaxKind::Assert
        )
    }

    pub fn is_type_decl(self) -> bool {
        matches!(self, SyntaxKind::ClassDef | SyntaxKind::InterfaceDef)
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            SyntaxKind::IntLit
                | SyntaxKind::LongLit
                | SyntaxKind::FloatLit
                | SyntaxKind::DoubleLit
                | SyntaxKind::CharLit
                | SyntaxKind::StringLit
                | SyntaxKind::TrueLit
                | SyntaxKind::FalseLit
                | SyntaxKind::NullLit
        )
    }

    /// `+ - * / %`
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            SyntaxKind::Plus | SyntaxKind::Minus | SyntaxKind::Mul | SyntaxKind::Div | SyntaxKind::Mod
        )
    }

    pub fn is_shift(self) -> bool {
        matches!(self, SyntaxKind::Shl | SyntaxKind::Shr | SyntaxKind::UShr)
    }

    pub fn is_bitwise(self) -> bool {
        matches!(self, SyntaxKind::BitAnd | SyntaxKind::BitOr | SyntaxKind::BitXor)
    }

    /// Operators whose result is always `boolean`.
    pub fn is_boolean_operator(self) -> bool {
        matches!(
            self,
            SyntaxKind::LogAnd
                | SyntaxKind::LogOr
                | SyntaxKind::Lt
                | SyntaxKind::Gt
                | SyntaxKind::Le
                | SyntaxKind::Ge
                | SyntaxKind::EqEq
                | SyntaxKind::NotEq
                | SyntaxKind::LogNot
        )
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            SyntaxKind::Assign | SyntaxKind::CompoundAssign | SyntaxKind::ShiftAssign
        )
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
