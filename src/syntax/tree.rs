//! Arena-backed syntax tree with resolution slots.

use std::fmt;

use smol_str::SmolStr;

use super::SyntaxKind;
use crate::base::{FileId, Occurrence};
use crate::hir::{Target, TypeRef};

/// Index of a node inside its [`SyntaxTree`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Default)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// A node addressed across files.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
pub struct NodeRef {
    pub file: FileId,
    pub node: NodeId,
}

impl NodeRef {
    pub const fn new(file: FileId, node: NodeId) -> Self {
        Self { file, node }
    }
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: SyntaxKind,
    text: SmolStr,
    line: u32,
    column: u32,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

/// One parsed compilation unit.
///
/// Besides structure, every node carries three slots filled in by the
/// resolver: the [`Target`] it denotes, whether that resolution is
/// meaningful, and the static type of the expression it roots.
#[derive(Clone, Debug)]
pub struct SyntaxTree {
    file: FileId,
    nodes: Vec<NodeData>,
    root: Option<NodeId>,
    bindings: Vec<Option<Target>>,
    meaningful: Vec<bool>,
    types: Vec<Option<TypeRef>>,
}

impl SyntaxTree {
    pub fn new(file: FileId) -> Self {
        Self {
            file,
            nodes: Vec::new(),
            root: None,
            bindings: Vec::new(),
            meaningful: Vec::new(),
            types: Vec::new(),
        }
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    /// Allocate a node and link `children` under it in order.
    pub fn alloc(
        &mut self,
        kind: SyntaxKind,
        text: impl Into<SmolStr>,
        line: u32,
        column: u32,
        children: Vec<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            text: text.into(),
            line,
            column,
            parent: None,
            first_child: children.first().copied(),
            next_sibling: None,
        });
        self.bindings.push(None);
        self.meaningful.push(true);
        self.types.push(None);

        for pair in children.windows(2) {
            self.nodes[pair[0].index()].next_sibling = Some(pair[1]);
        }
        for child in children {
            self.nodes[child.index()].parent = Some(id);
        }
        id
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn kind(&self, node: NodeId) -> SyntaxKind {
        self.nodes[node.index()].kind
    }

    pub fn text(&self, node: NodeId) -> &str {
        &self.nodes[node.index()].text
    }

    pub fn line(&self, node: NodeId) -> u32 {
        self.nodes[node.index()].line
    }

    pub fn column(&self, node: NodeId) -> u32 {
        self.nodes[node.index()].column
    }

    pub fn occurrence(&self, node: NodeId) -> Occurrence {
        let data = &self.nodes[node.index()];
        Occurrence::new(self.file, data.line, data.column)
    }

    pub fn node_ref(&self, node: NodeId) -> NodeRef {
        NodeRef::new(self.file, node)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].parent
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].first_child
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.index()].next_sibling
    }

    pub fn children(&self, node: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.first_child(node),
        }
    }

    /// The `n`th child (0-based).
    pub fn child(&self, node: NodeId, n: usize) -> Option<NodeId> {
        self.children(node).nth(n)
    }

    /// First direct child of the given kind.
    pub fn find_child(&self, node: NodeId, kind: SyntaxKind) -> Option<NodeId> {
        self.children(node).find(|&c| self.kind(c) == kind)
    }

    /// A `{ ... }` written as a statement of another block. Method, loop
    /// and handler bodies are not nested blocks.
    pub fn is_nested_block(&self, node: NodeId) -> bool {
        self.kind(node) == SyntaxKind::Slist
            && self
                .parent(node)
                .is_some_and(|p| self.kind(p) == SyntaxKind::Slist)
    }

    /// All nodes of the subtree rooted at `node`, in pre-order.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            out.push(current);
            let kids: Vec<_> = self.children(current).collect();
            stack.extend(kids.into_iter().rev());
        }
        out
    }

    /// Flatten an `Ident`/`Dot`/`Star` chain into `a.b.c`.
    pub fn dotted_name(&self, node: NodeId) -> Option<String> {
        match self.kind(node) {
            SyntaxKind::Ident => Some(self.text(node).to_string()),
            SyntaxKind::Star => Some("*".to_string()),
            SyntaxKind::Dot => {
                let left = self.child(node, 0)?;
                let right = self.child(node, 1)?;
                let mut name = self.dotted_name(left)?;
                name.push('.');
                name.push_str(&self.dotted_name(right)?);
                Some(name)
            }
            _ => None,
        }
    }

    /// Best-effort source text for diagnostics.
    pub fn display_text(&self, node: NodeId) -> String {
        if let Some(name) = self.dotted_name(node) {
            return name;
        }
        let text = self.text(node);
        if text.is_empty() {
            self.kind(node).to_string()
        } else {
            text.to_string()
        }
    }

    /// First and last positions covered by the subtree.
    pub fn extent(&self, node: NodeId) -> (Occurrence, Occurrence) {
        let mut start = self.occurrence(node);
        let mut end = start;
        for id in self.descendants(node) {
            let data = &self.nodes[id.index()];
            if data.line == 0 {
                continue;
            }
            let first = Occurrence::new(self.file, data.line, data.column);
            let width = data.text.len().saturating_sub(1) as u32;
            let last = Occurrence::new(self.file, data.line, data.column + width);
            if start.line == 0 || first < start {
                start = first;
            }
            if last > end {
                end = last;
            }
        }
        (start, end)
    }

    /// Innermost node whose extent contains the position.
    pub fn node_at(&self, line: u32, column: u32) -> Option<NodeId> {
        let root = self.root?;
        self.enclosing_node(root, Occurrence::new(self.file, line, column))
    }

    fn enclosing_node(&self, node: NodeId, pos: Occurrence) -> Option<NodeId> {
        let (start, end) = self.extent(node);
        if pos < start || pos > end {
            return None;
        }
        self.children(node)
            .find_map(|child| self.enclosing_node(child, pos))
            .or(Some(node))
    }

    // ---------------------------------------------------------------
    // Resolution slots
    // ---------------------------------------------------------------

    pub fn binding(&self, node: NodeId) -> Option<&Target> {
        self.bindings[node.index()].as_ref()
    }

    /// Record what `node` denotes. Binding to [`Target::Unresolved`]
    /// also clears the meaningfulness flag.
    pub fn bind(&mut self, node: NodeId, target: Target) {
        let meaningful = !matches!(target, Target::Unresolved);
        self.bindings[node.index()] = Some(target);
        self.meaningful[node.index()] = meaningful;
    }

    pub fn clear_binding(&mut self, node: NodeId) {
        self.bindings[node.index()] = None;
        self.meaningful[node.index()] = true;
    }

    pub fn is_meaningful(&self, node: NodeId) -> bool {
        self.meaningful[node.index()]
    }

    pub fn set_meaningful(&mut self, node: NodeId, meaningful: bool) {
        self.meaningful[node.index()] = meaningful;
    }

    /// Mark every identifier under `node` as not meaningful.
    pub fn ignore_children(&mut self, node: NodeId) {
        for id in self.descendants(node) {
            if self.kind(id) == SyntaxKind::Ident {
                self.meaningful[id.index()] = false;
            }
        }
    }

    pub fn resolved_type(&self, node: NodeId) -> Option<&TypeRef> {
        self.types[node.index()].as_ref()
    }

    pub fn set_resolved_type(&mut self, node: NodeId, ty: TypeRef) {
        self.types[node.index()] = Some(ty);
    }
}

/// Iterator over the direct children of a node.
pub struct Children<'a> {
    tree: &'a SyntaxTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}
