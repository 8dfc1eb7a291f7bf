//! Semantic model: the symbol table and name/type resolution.
//!
//! Analysis of a set of compilation units runs in three passes, each of
//! which must complete for every file before the next begins:
//!
//! 1. [`TableMaker::build`] walks each tree and declares its packages,
//!    classes, methods, variables, blocks and labels.
//! 2. [`TableMaker::finish`] resolves declared types, imports and the
//!    class hierarchy. These need every file's declarations in place.
//! 3. [`Resolver::resolve_file`] binds every name in every expression to
//!    its definition, computes expression types and records references.
//!
//! Classes outside the analysed sources come from a
//! [`ClassInfoProvider`]; the bundled [`StaticClassProvider`] covers the
//! parts of the JDK a typical compilation unit touches.

mod builder;
mod class_type;
mod config;
mod definition;
mod diagnostics;
pub mod external;
mod finish;
mod ids;
mod lookup;
mod resolve;
mod source;
mod symbol_table;
pub mod types;

pub use builder::TableMaker;
pub use class_type::{ClassHandle, ClassLike, MethodRef, VarRef};
pub use config::AnalysisConfig;
pub use definition::{
    ClassData, DefKind, Definition, Detail, ExternalItem, MethodData, Namespace, PackageData,
    PackageRef, Reference, Scope, Target, VariableData, Visibility,
};
pub use diagnostics::{Diagnostic, DiagnosticCollector, Severity, codes};
pub use external::{ClassInfo, ClassInfoProvider, ExternalClasses, StaticClassProvider};
pub use ids::DefId;
pub use resolve::Resolver;
pub use source::FileSet;
pub use symbol_table::{BASE_SCOPE_NAME, Site, SymbolTable, SymtabError};
pub use types::{Primitive, Resolved, Signature, TypeRef, Unresolved};
