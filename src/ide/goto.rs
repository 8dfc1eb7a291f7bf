//! Go-to-definition: what the name under a position denotes.

use crate::base::Occurrence;
use crate::hir::{ExternalItem, SymbolTable, Target};
use crate::syntax::SyntaxTree;

/// The answer to a go-to-definition request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GotoResult {
    /// The bound target of the node found.
    pub target: Target,
    /// Fully qualified name of the target, when it has one.
    pub qualified_name: Option<String>,
    /// Where the target is declared, for source definitions.
    pub location: Option<Occurrence>,
}

/// Find the innermost node enclosing `line`:`column` that carries a
/// binding, walking outwards from the node under the position.
///
/// Unresolved nodes are reported as such; positions outside any bound
/// node give `None`.
pub fn goto_definition(table: &SymbolTable, tree: &SyntaxTree, line: u32, column: u32) -> Option<GotoResult> {
    let mut node = tree.node_at(line, column);
    while let Some(current) = node {
        if let Some(target) = tree.binding(current) {
            return Some(describe(table, target.clone()));
        }
        node = tree.parent(current);
    }
    None
}

fn describe(table: &SymbolTable, target: Target) -> GotoResult {
    let (qualified_name, location) = match &target {
        Target::Source(id) => (Some(table.qualified_name(*id)), table.def(*id).occurrence()),
        Target::External(item) => (Some(external_name(item)), None),
        Target::ExternalPackage(name) => (Some(name.to_string()), None),
        Target::Primitive(p) => (Some(p.name().to_string()), None),
        Target::Unresolved => (None, None),
    };
    GotoResult {
        target,
        qualified_name,
        location,
    }
}

fn external_name(item: &ExternalItem) -> String {
    match item {
        ExternalItem::Class(name) | ExternalItem::InterfaceConstructor(name) => name.to_string(),
        ExternalItem::Method { class, index } | ExternalItem::Constructor { class, index } => {
            format!("{class}#{index}")
        }
        ExternalItem::Field { class, name } => format!("{class}.{name}"),
        ExternalItem::ArrayLength => "length".to_string(),
    }
}
