//! Third pass: names and types in bodies.
//!
//! The [`Resolver`] walks one file after every file has been built and
//! finished. It binds each identifier node to the [`Target`] it denotes,
//! records a [`Reference`](super::Reference) for every use of a source
//! definition, and stores the static type of every expression it can
//! type on the tree.
//!
//! # Failure model
//!
//! Two kinds of failure are kept apart:
//!
//! - An expression that cannot be resolved yields `Err(Unresolved)`.
//!   The node is bound to [`Target::Unresolved`] (and so becomes not
//!   meaningful), the statement walker collects the value, and walking
//!   continues with the next statement.
//! - A broken scope structure (a block with no scope recorded for it) is
//!   a [`SymtabError`] and aborts the file.
//!
//! # Reference mode
//!
//! `reference = false` resolves without recording references. The
//! finishing pass uses it for declared types, which are not uses.

use tracing::debug;

use super::class_type::ClassLike;
use super::definition::{ExternalItem, PackageRef, Target};
use super::symbol_table::{SymbolTable, SymtabError};
use super::types::{
    JAVA_LANG_CLASS, Primitive, Resolved, Signature, TypeRef, Unresolved, binary_promotion,
    literal_type, unary_promotion,
};
use super::DefId;
use crate::syntax::{NodeId, SyntaxKind, SyntaxTree};

pub struct Resolver<'a> {
    table: &'a mut SymbolTable,
    tree: &'a mut SyntaxTree,
    unresolved: Vec<Unresolved>,
    fault: Option<SymtabError>,
}

impl<'a> Resolver<'a> {
    pub fn new(table: &'a mut SymbolTable, tree: &'a mut SyntaxTree) -> Self {
        Self {
            table,
            tree,
            unresolved: Vec::new(),
            fault: None,
        }
    }

    /// Resolve every body in the file. Returns the expressions that
    /// could not be resolved, in walking order.
    #[tracing::instrument(skip(self), fields(file = %self.tree.file()))]
    pub fn resolve_file(mut self) -> Result<Vec<Unresolved>, SymtabError> {
        let Some(root) = self.tree.root() else {
            return Ok(Vec::new());
        };
        let package = self.scope_of(root)?;
        let children: Vec<NodeId> = self.tree.children(root).collect();
        for child in children {
            match self.tree.kind(child) {
                SyntaxKind::PackageDecl => {
                    if let Some(name) = self.tree.first_child(child) {
                        self.bind_qualified(name, Target::Source(package), package, false);
                    }
                }
                SyntaxKind::Import => self.import(child, package),
                kind if kind.is_type_decl() => self.class_decl(child)?,
                _ => {}
            }
        }
        if let Some(fault) = self.fault.take() {
            return Err(fault);
        }
        debug!(unresolved = self.unresolved.len(), "bodies resolved");
        Ok(self.unresolved)
    }

    // ------------------------------------------------------------------
    // Bookkeeping
    // ------------------------------------------------------------------

    fn scope_of(&self, node: NodeId) -> Result<DefId, SymtabError> {
        let node = self.tree.node_ref(node);
        self.table
            .scope_for(node)
            .ok_or(SymtabError::MissingScope { node })
    }

    fn unresolved_at(&self, node: NodeId) -> Unresolved {
        Unresolved::new(self.tree.display_text(node), self.tree.node_ref(node))
    }

    /// Bind `node` as unresolved and describe it.
    fn fail(&mut self, node: NodeId) -> Unresolved {
        self.tree.bind(node, Target::Unresolved);
        self.unresolved_at(node)
    }

    fn record(&mut self, unresolved: Unresolved) {
        debug!(text = %unresolved.text, at = ?unresolved.node, "unresolved");
        self.unresolved.push(unresolved);
    }

    fn record_fault(&mut self, result: Result<(), SymtabError>) {
        if let Err(fault) = result {
            self.fault.get_or_insert(fault);
        }
    }

    /// Bind `node` to `target`, recording a reference for source targets.
    fn bind(&mut self, node: NodeId, target: Target, scope: DefId, reference: bool) {
        if reference {
            if let Target::Source(id) = target {
                let node_ref = self.tree.node_ref(node);
                let occurrence = self.tree.occurrence(node);
                self.table.add_reference(id, node_ref, occurrence, scope);
            }
        }
        self.tree.bind(node, target);
    }

    /// Bind a dotted name whose whole denotes `target`. Qualifiers are
    /// bound to the packages or outer classes they name.
    fn bind_qualified(&mut self, node: NodeId, target: Target, scope: DefId, reference: bool) {
        if self.tree.kind(node) != SyntaxKind::Dot {
            self.bind(node, target, scope, reference);
            return;
        }
        let (Some(left), Some(right)) = (self.tree.child(node, 0), self.tree.child(node, 1)) else {
            return;
        };
        self.tree.bind(node, target.clone());
        self.bind(right, target, scope, reference);

        let Some(prefix) = self.tree.dotted_name(left) else {
            return;
        };
        let qualifier = match self.table.lookup_qualified_class(&prefix) {
            Some(ty) => Target::of_type(&ty),
            None => match self.table.lookup_package(&prefix) {
                Some(PackageRef::Source(id)) => Target::Source(id),
                Some(PackageRef::External(name)) => Target::ExternalPackage(name),
                None => Target::Unresolved,
            },
        };
        self.bind_qualified(left, qualifier, scope, reference);
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn import(&mut self, node: NodeId, package: DefId) {
        let Some(name) = self.tree.first_child(node) else {
            return;
        };
        let Some(text) = self.tree.dotted_name(name) else {
            return;
        };
        if let Some(prefix) = text.strip_suffix(".*") {
            // The `*` itself denotes nothing.
            let Some(qualifier) = self.tree.child(name, 0) else {
                return;
            };
            let target = match self.table.lookup_qualified_class(prefix) {
                Some(ty) => Target::of_type(&ty),
                None => match self.table.lookup_package(prefix) {
                    Some(PackageRef::Source(id)) => Target::Source(id),
                    Some(PackageRef::External(name)) => Target::ExternalPackage(name),
                    None => {
                        let unresolved = self.fail(qualifier);
                        self.record(unresolved);
                        return;
                    }
                },
            };
            self.bind_qualified(qualifier, target, package, true);
        } else {
            match self.table.lookup_qualified_class(&text) {
                Some(ty) => self.bind_qualified(name, Target::of_type(&ty), package, true),
                None => {
                    let unresolved = self.fail(name);
                    self.record(unresolved);
                }
            }
        }
    }

    fn class_decl(&mut self, node: NodeId) -> Result<(), SymtabError> {
        let class = self.scope_of(node)?;
        if let Some(ident) = self.tree.find_child(node, SyntaxKind::Ident) {
            self.tree.bind(ident, Target::Source(class));
        }
        for clause in [SyntaxKind::ExtendsClause, SyntaxKind::ImplementsClause] {
            if let Some(clause) = self.tree.find_child(node, clause) {
                let names: Vec<NodeId> = self.tree.children(clause).collect();
                for name in names {
                    if let Err(unresolved) = self.resolve_type(name, class, true) {
                        self.record(unresolved);
                    }
                }
            }
        }
        match self.tree.find_child(node, SyntaxKind::ObjBlock) {
            Some(body) => self.class_body(body, class),
            None => Ok(()),
        }
    }

    fn class_body(&mut self, body: NodeId, class: DefId) -> Result<(), SymtabError> {
        let members: Vec<NodeId> = self.tree.children(body).collect();
        for member in members {
            match self.tree.kind(member) {
                SyntaxKind::ClassDef | SyntaxKind::InterfaceDef => self.class_decl(member)?,
                SyntaxKind::MethodDef | SyntaxKind::CtorDef => self.method_decl(member)?,
                SyntaxKind::VariableDef => self.variable_decl(member, class)?,
                _ => self.statement(member, class)?,
            }
        }
        Ok(())
    }

    fn declared_type(&mut self, node: NodeId, scope: DefId) {
        if let Some(ty) = self.tree.find_child(node, SyntaxKind::Type) {
            if let Err(unresolved) = self.resolve_type(ty, scope, true) {
                self.record(unresolved);
            }
        }
    }

    fn bind_declaration(&mut self, node: NodeId) {
        let declared = self.table.definition_at(self.tree.node_ref(node));
        if let (Some(id), Some(ident)) = (declared, self.tree.find_child(node, SyntaxKind::Ident)) {
            self.tree.bind(ident, Target::Source(id));
        }
    }

    fn method_decl(&mut self, node: NodeId) -> Result<(), SymtabError> {
        let method = self.scope_of(node)?;
        self.bind_declaration(node);
        self.declared_type(node, method);
        if let Some(params) = self.tree.find_child(node, SyntaxKind::Parameters) {
            let params: Vec<NodeId> = self.tree.children(params).collect();
            for param in params {
                self.bind_declaration(param);
                self.declared_type(param, method);
            }
        }
        if let Some(throws) = self.tree.find_child(node, SyntaxKind::Throws) {
            let names: Vec<NodeId> = self.tree.children(throws).collect();
            for name in names {
                if let Err(unresolved) = self.resolve_type(name, method, true) {
                    self.record(unresolved);
                }
            }
        }
        match self.tree.find_child(node, SyntaxKind::Slist) {
            Some(body) => self.statements(body, method),
            None => Ok(()),
        }
    }

    fn variable_decl(&mut self, node: NodeId, scope: DefId) -> Result<(), SymtabError> {
        self.bind_declaration(node);
        self.declared_type(node, scope);
        if let Some(init) = self.tree.find_child(node, SyntaxKind::VariableInit) {
            self.statements(init, scope)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn statements(&mut self, node: NodeId, scope: DefId) -> Result<(), SymtabError> {
        let children: Vec<NodeId> = self.tree.children(node).collect();
        for child in children {
            self.statement(child, scope)?;
        }
        Ok(())
    }

    fn statement(&mut self, node: NodeId, scope: DefId) -> Result<(), SymtabError> {
        let kind = self.tree.kind(node);
        match kind {
            SyntaxKind::VariableDef => self.variable_decl(node, scope),
            SyntaxKind::ClassDef | SyntaxKind::InterfaceDef => self.class_decl(node),
            SyntaxKind::Labeled => {
                if let Some(label) = self.tree.child(node, 0) {
                    let declared = self.table.definition_at(self.tree.node_ref(node));
                    if let Some(id) = declared {
                        self.tree.bind(label, Target::Source(id));
                    }
                }
                match self.tree.child(node, 1) {
                    Some(body) => self.statement(body, scope),
                    None => Ok(()),
                }
            }
            SyntaxKind::Break | SyntaxKind::Continue => {
                if let Some(label) = self.tree.first_child(node) {
                    let name = self.tree.text(label).to_string();
                    match self.table.lookup_label(scope, &name)? {
                        Some(id) => self.bind(label, Target::Source(id), scope, true),
                        None => {
                            let unresolved = self.fail(label);
                            self.record(unresolved);
                        }
                    }
                }
                Ok(())
            }
            SyntaxKind::SuperCtorCall | SyntaxKind::ThisCtorCall => {
                if let Err(unresolved) = self.constructor_call(node, scope) {
                    self.record(unresolved);
                }
                Ok(())
            }
            SyntaxKind::Catch => {
                let block = self.scope_of(node)?;
                if let Some(param) = self.tree.find_child(node, SyntaxKind::Parameter) {
                    self.bind_declaration(param);
                    self.declared_type(param, block);
                }
                match self.tree.find_child(node, SyntaxKind::Slist) {
                    Some(body) => self.statements(body, block),
                    None => Ok(()),
                }
            }
            SyntaxKind::Empty | SyntaxKind::Default => Ok(()),
            _ if kind.is_block_scope() || self.tree.is_nested_block(node) => {
                let block = self.scope_of(node)?;
                self.statements(node, block)
            }
            SyntaxKind::Slist
            | SyntaxKind::ExprStmt
            | SyntaxKind::Return
            | SyntaxKind::Throw
            | SyntaxKind::ForInit
            | SyntaxKind::ForCond
            | SyntaxKind::ForIter
            | SyntaxKind::CaseGroup
            | SyntaxKind::Case => self.statements(node, scope),
            _ => {
                if let Err(unresolved) = self.resolve_expression(node, scope, None, true) {
                    self.record(unresolved);
                }
                Ok(())
            }
        }
    }

    /// `this(...)` or `super(...)` at the start of a constructor.
    fn constructor_call(&mut self, node: NodeId, scope: DefId) -> Result<(), Unresolved> {
        let arguments = match self.tree.find_child(node, SyntaxKind::Arguments) {
            Some(args) => self.arguments(args, scope, true),
            None => Signature::default(),
        };
        let class = self
            .table
            .enclosing_class(scope)
            .ok_or_else(|| self.unresolved_at(node))?;
        let owner = if self.tree.kind(node) == SyntaxKind::ThisCtorCall {
            Some(TypeRef::Source(class))
        } else {
            self.superclass_of(class)
        };
        let Some(owner) = owner else {
            return Err(self.fail(node));
        };
        let found = self
            .table
            .simple_type_name(&owner)
            .and_then(|name| self.table.find_method(&owner, &name, &arguments));
        match found {
            Some(ctor) => {
                self.tree.bind(node, ctor.target());
                Ok(())
            }
            None => Err(self.fail(node)),
        }
    }

    fn superclass_of(&self, class: DefId) -> Option<TypeRef> {
        self.table
            .class_handle(&TypeRef::Source(class))
            .and_then(|c| c.superclass())
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    /// Resolve a declared type: a `Type` node, an array declarator, a
    /// primitive or a (possibly dotted) class name.
    pub fn resolve_type(&mut self, node: NodeId, scope: DefId, reference: bool) -> Resolved {
        let resolved = match self.tree.kind(node) {
            SyntaxKind::Type => match self.tree.first_child(node) {
                Some(inner) => self.resolve_type(inner, scope, reference),
                None => Err(self.fail(node)),
            },
            SyntaxKind::ArrayDeclarator => match self.tree.first_child(node) {
                Some(inner) => self.resolve_type(inner, scope, reference).map(TypeRef::array_of),
                None => Err(self.fail(node)),
            },
            SyntaxKind::PrimitiveType => match Primitive::from_name(self.tree.text(node)) {
                Some(primitive) => {
                    self.tree.bind(node, Target::Primitive(primitive));
                    Ok(TypeRef::Primitive(primitive))
                }
                None => Err(self.fail(node)),
            },
            SyntaxKind::Ident | SyntaxKind::Dot => self.type_name(node, scope, reference),
            _ => Err(self.fail(node)),
        };
        if let Ok(ty) = &resolved {
            self.tree.set_resolved_type(node, ty.clone());
        }
        resolved
    }

    fn type_name(&mut self, node: NodeId, scope: DefId, reference: bool) -> Resolved {
        if self.tree.kind(node) == SyntaxKind::Ident {
            let name = self.tree.text(node).to_string();
            return match self.table.lookup_class(scope, &name) {
                Some(ty) => {
                    self.bind(node, Target::of_type(&ty), scope, reference);
                    Ok(ty)
                }
                None => Err(self.fail(node)),
            };
        }

        if let Some(ty) = self
            .tree
            .dotted_name(node)
            .and_then(|name| self.table.lookup_qualified_class(&name))
        {
            self.bind_qualified(node, Target::of_type(&ty), scope, reference);
            return Ok(ty);
        }

        // `Outer.Inner` with `Outer` visible by simple name.
        let (Some(left), Some(right)) = (self.tree.child(node, 0), self.tree.child(node, 1)) else {
            return Err(self.fail(node));
        };
        let outer = self.type_name(left, scope, reference)?;
        let name = self.tree.text(right).to_string();
        match self.table.find_inner_class(&outer, &name) {
            Some(inner) => {
                let target = Target::of_type(&inner);
                self.tree.bind(node, target.clone());
                self.bind(right, target, scope, reference);
                Ok(inner)
            }
            None => Err(self.fail(right)),
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Resolve an expression, given the type of its receiver when it is
    /// the right-hand side of a `.`. The static type is recorded on the
    /// tree on success.
    pub fn resolve_expression(
        &mut self,
        node: NodeId,
        scope: DefId,
        context: Option<&TypeRef>,
        reference: bool,
    ) -> Resolved {
        let resolved = self.expression(node, scope, context, reference);
        if let Ok(ty) = &resolved {
            self.tree.set_resolved_type(node, ty.clone());
        }
        resolved
    }

    fn child_expression(&mut self, node: NodeId, n: usize, scope: DefId, reference: bool) -> Resolved {
        match self.tree.child(node, n) {
            Some(child) => self.resolve_expression(child, scope, None, reference),
            None => Err(self.fail(node)),
        }
    }

    /// Both operands of a binary node. The first failure wins; a second
    /// one is recorded directly.
    fn operands(&mut self, node: NodeId, scope: DefId, reference: bool) -> Result<(TypeRef, TypeRef), Unresolved> {
        let left = self.child_expression(node, 0, scope, reference);
        let right = self.child_expression(node, 1, scope, reference);
        match (left, right) {
            (Ok(left), Ok(right)) => Ok((left, right)),
            (Err(first), Ok(_)) | (Ok(_), Err(first)) => Err(first),
            (Err(first), Err(second)) => {
                self.record(second);
                Err(first)
            }
        }
    }

    fn expression(&mut self, node: NodeId, scope: DefId, context: Option<&TypeRef>, reference: bool) -> Resolved {
        let kind = self.tree.kind(node);
        if let Some(ty) = literal_type(kind) {
            return Ok(ty);
        }
        match kind {
            SyntaxKind::Ident => self.identifier(node, scope, context, reference),
            SyntaxKind::Dot => self.field_access(node, scope, reference),
            SyntaxKind::MethodCall => self.method_call(node, scope, reference),
            SyntaxKind::New => self.creation(node, scope, reference),
            SyntaxKind::NewArray => self.array_creation(node, scope, reference),
            SyntaxKind::ArrayInit => {
                self.array_items(node, scope, reference);
                Ok(TypeRef::Null)
            }
            SyntaxKind::Index => {
                let (array, _) = self.operands(node, scope, reference)?;
                match array.component() {
                    Some(component) => Ok(component.clone()),
                    None => Err(self.fail(node)),
                }
            }
            SyntaxKind::Cast => {
                let ty = match self.tree.first_child(node) {
                    Some(ty) => self.resolve_type(ty, scope, false)?,
                    None => return Err(self.fail(node)),
                };
                if let Err(unresolved) = self.child_expression(node, 1, scope, reference) {
                    self.record(unresolved);
                }
                Ok(ty)
            }
            SyntaxKind::InstanceOf => {
                let operand = self.child_expression(node, 0, scope, reference);
                let checked = match self.tree.child(node, 1) {
                    Some(ty) => self.resolve_type(ty, scope, reference).map(drop),
                    None => Err(self.fail(node)),
                };
                match (operand, checked) {
                    (Ok(_), Ok(())) => Ok(TypeRef::Primitive(Primitive::Boolean)),
                    (Err(first), Ok(())) | (Ok(_), Err(first)) => Err(first),
                    (Err(first), Err(second)) => {
                        self.record(second);
                        Err(first)
                    }
                }
            }
            SyntaxKind::Ternary => {
                if let Err(unresolved) = self.child_expression(node, 0, scope, reference) {
                    self.record(unresolved);
                }
                let then = self.child_expression(node, 1, scope, reference);
                let otherwise = self.child_expression(node, 2, scope, reference);
                match (then, otherwise) {
                    (Ok(a), Ok(b)) => Ok(if self.table.is_compatible(&a, &b) { b } else { a }),
                    (Err(first), Ok(_)) | (Ok(_), Err(first)) => Err(first),
                    (Err(first), Err(second)) => {
                        self.record(second);
                        Err(first)
                    }
                }
            }
            _ if kind.is_assignment() => self.operands(node, scope, reference).map(|(left, _)| left),
            SyntaxKind::PreInc | SyntaxKind::PreDec | SyntaxKind::PostInc | SyntaxKind::PostDec => {
                self.child_expression(node, 0, scope, reference)
            }
            SyntaxKind::UnaryMinus | SyntaxKind::UnaryPlus | SyntaxKind::BitNot => self
                .child_expression(node, 0, scope, reference)
                .map(|operand| unary_promotion(&operand)),
            SyntaxKind::LogNot => self
                .child_expression(node, 0, scope, reference)
                .map(|_| TypeRef::Primitive(Primitive::Boolean)),
            _ if kind.is_boolean_operator() => self
                .operands(node, scope, reference)
                .map(|_| TypeRef::Primitive(Primitive::Boolean)),
            _ if kind.is_shift() => self
                .operands(node, scope, reference)
                .map(|(left, _)| unary_promotion(&left)),
            _ if kind.is_arithmetic() || kind.is_bitwise() => self
                .operands(node, scope, reference)
                .map(|(left, right)| binary_promotion(&left, &right)),
            SyntaxKind::This => match self.table.enclosing_class(scope) {
                Some(class) => Ok(TypeRef::Source(class)),
                None => Err(self.fail(node)),
            },
            SyntaxKind::Super => {
                let superclass = self.table.enclosing_class(scope).and_then(|c| self.superclass_of(c));
                superclass.ok_or_else(|| self.fail(node))
            }
            SyntaxKind::PrimitiveType | SyntaxKind::Type | SyntaxKind::ArrayDeclarator => {
                self.resolve_type(node, scope, reference)
            }
            _ => Err(self.fail(node)),
        }
    }

    fn identifier(&mut self, node: NodeId, scope: DefId, context: Option<&TypeRef>, reference: bool) -> Resolved {
        let name = self.tree.text(node).to_string();
        let Some(context) = context else {
            if let Some(variable) = self.table.lookup_variable(scope, &name) {
                self.bind(node, variable.target(), scope, reference);
                return self
                    .table
                    .variable_type(&variable)
                    .ok_or_else(|| self.unresolved_at(node));
            }
            if let Some(ty) = self.table.lookup_class(scope, &name) {
                self.bind(node, Target::of_type(&ty), scope, reference);
                return Ok(ty);
            }
            return Err(self.fail(node));
        };

        if name == "length" && context.component().is_some() {
            self.bind(node, Target::External(ExternalItem::ArrayLength), scope, reference);
            return Ok(TypeRef::Primitive(Primitive::Int));
        }
        if let Some(field) = self.table.find_field(context, &name) {
            self.bind(node, field.target(), scope, reference);
            return self
                .table
                .variable_type(&field)
                .ok_or_else(|| self.unresolved_at(node));
        }
        if let Some(inner) = self.table.find_inner_class(context, &name) {
            self.bind(node, Target::of_type(&inner), scope, reference);
            return Ok(inner);
        }
        Err(self.fail(node))
    }

    /// `a.b`, `X.class`, `Outer.this`, or a qualified class name.
    fn field_access(&mut self, node: NodeId, scope: DefId, reference: bool) -> Resolved {
        let (Some(left), Some(right)) = (self.tree.child(node, 0), self.tree.child(node, 1)) else {
            return Err(self.fail(node));
        };
        match self.tree.kind(right) {
            SyntaxKind::ClassLit => {
                self.resolve_type(left, scope, reference)?;
                return Ok(TypeRef::external(JAVA_LANG_CLASS));
            }
            SyntaxKind::This => return self.resolve_type(left, scope, reference),
            _ => {}
        }

        match self.resolve_expression(left, scope, None, reference) {
            Ok(receiver) => {
                let ty = self.resolve_expression(right, scope, Some(&receiver), reference)?;
                if let Some(target) = self.tree.binding(right).cloned() {
                    self.tree.bind(node, target);
                }
                Ok(ty)
            }
            Err(first) => {
                let qualified = self
                    .tree
                    .dotted_name(node)
                    .and_then(|name| self.table.lookup_qualified_class(&name));
                match qualified {
                    Some(ty) => {
                        self.bind_qualified(node, Target::of_type(&ty), scope, reference);
                        Ok(ty)
                    }
                    None => Err(first),
                }
            }
        }
    }

    /// Argument types; an argument that fails is recorded and matches
    /// any parameter.
    fn arguments(&mut self, node: NodeId, scope: DefId, reference: bool) -> Signature {
        let args: Vec<NodeId> = self.tree.children(node).collect();
        let mut types = Vec::with_capacity(args.len());
        for arg in args {
            match self.resolve_expression(arg, scope, None, reference) {
                Ok(ty) => types.push(Some(ty)),
                Err(unresolved) => {
                    self.record(unresolved);
                    types.push(None);
                }
            }
        }
        Signature::new(types)
    }

    fn method_call(&mut self, node: NodeId, scope: DefId, reference: bool) -> Resolved {
        let Some(callee) = self.tree.first_child(node) else {
            return Err(self.fail(node));
        };
        let arguments = match self.tree.find_child(node, SyntaxKind::Arguments) {
            Some(args) => self.arguments(args, scope, reference),
            None => Signature::default(),
        };

        let (method, name_node) = match self.tree.kind(callee) {
            SyntaxKind::Ident => {
                let name = self.tree.text(callee).to_string();
                (self.table.lookup_method(scope, &name, &arguments), callee)
            }
            SyntaxKind::Dot => {
                let (Some(receiver), Some(name_node)) = (self.tree.child(callee, 0), self.tree.child(callee, 1)) else {
                    return Err(self.fail(callee));
                };
                let receiver = self.resolve_expression(receiver, scope, None, reference)?;
                let name = self.tree.text(name_node).to_string();
                (self.table.find_method(&receiver, &name, &arguments), name_node)
            }
            _ => return Err(self.fail(callee)),
        };

        let Some(method) = method else {
            return Err(self.fail(name_node));
        };
        let target = method.target();
        self.bind(name_node, target.clone(), scope, reference);
        if name_node != callee {
            self.tree.bind(callee, target.clone());
        }
        self.tree.bind(node, target);
        self.table
            .return_type_of(&method)
            .ok_or_else(|| self.unresolved_at(name_node))
    }

    fn creation(&mut self, node: NodeId, scope: DefId, reference: bool) -> Resolved {
        let Some(type_node) = self.tree.first_child(node) else {
            return Err(self.fail(node));
        };
        let arguments = match self.tree.find_child(node, SyntaxKind::Arguments) {
            Some(args) => self.arguments(args, scope, reference),
            None => Signature::default(),
        };
        let ty = self.resolve_type(type_node, scope, reference)?;

        let constructor = self
            .table
            .simple_type_name(&ty)
            .and_then(|name| self.table.find_method(&ty, &name, &arguments));
        match constructor {
            Some(ctor) => self.bind(node, ctor.target(), scope, reference),
            None => {
                let unresolved = self.fail(node);
                self.record(unresolved);
            }
        }

        let Some(body) = self.tree.find_child(node, SyntaxKind::ObjBlock) else {
            return Ok(ty);
        };
        match self.scope_of(node) {
            Ok(anonymous) => {
                let walked = self.class_body(body, anonymous);
                self.record_fault(walked);
                Ok(TypeRef::Source(anonymous))
            }
            Err(fault) => {
                self.record_fault(Err(fault));
                Ok(ty)
            }
        }
    }

    fn array_creation(&mut self, node: NodeId, scope: DefId, reference: bool) -> Resolved {
        let Some(element) = self.tree.first_child(node) else {
            return Err(self.fail(node));
        };
        let mut ty = self.resolve_type(element, scope, reference)?;
        let children: Vec<NodeId> = self.tree.children(node).skip(1).collect();
        for child in children {
            match self.tree.kind(child) {
                SyntaxKind::Dim => {
                    if let Some(size) = self.tree.first_child(child) {
                        if let Err(unresolved) = self.resolve_expression(size, scope, None, reference) {
                            self.record(unresolved);
                        }
                    }
                    ty = TypeRef::array_of(ty);
                }
                SyntaxKind::ArrayInit => self.array_items(child, scope, reference),
                _ => {}
            }
        }
        Ok(ty)
    }

    fn array_items(&mut self, node: NodeId, scope: DefId, reference: bool) {
        let items: Vec<NodeId> = self.tree.children(node).collect();
        for item in items {
            if let Err(unresolved) = self.resolve_expression(item, scope, None, reference) {
                self.record(unresolved);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::FileId;
    use crate::hir::builder::TableMaker;
    use crate::hir::definition::{DefKind, ExternalItem};
    use crate::syntax::parse;

    fn resolved(sources: &[&str]) -> (SymbolTable, Vec<SyntaxTree>, Vec<Unresolved>) {
        let mut table = SymbolTable::new();
        let mut trees: Vec<SyntaxTree> = sources
            .iter()
            .enumerate()
            .map(|(i, src)| parse(FileId::new(i as u32), src).unwrap())
            .collect();
        for tree in &mut trees {
            TableMaker::new(&mut table, tree).with_package_key("/src").build().unwrap();
        }
        for tree in &mut trees {
            TableMaker::new(&mut table, tree).finish().unwrap();
        }
        let mut unresolved = Vec::new();
        for tree in &mut trees {
            unresolved.extend(Resolver::new(&mut table, tree).resolve_file().unwrap());
        }
        (table, trees, unresolved)
    }

    fn nodes(tree: &SyntaxTree, kind: SyntaxKind, text: &str) -> Vec<NodeId> {
        tree.descendants(tree.root().unwrap())
            .into_iter()
            .filter(|&n| tree.kind(n) == kind && tree.text(n) == text)
            .collect()
    }

    fn first_of(tree: &SyntaxTree, kind: SyntaxKind) -> NodeId {
        tree.descendants(tree.root().unwrap())
            .into_iter()
            .find(|&n| tree.kind(n) == kind)
            .unwrap()
    }

    fn named(table: &SymbolTable, kind: DefKind, name: &str) -> DefId {
        table
            .iter()
            .find(|d| d.kind() == kind && d.name() == name)
            .unwrap()
            .id()
    }

    #[test]
    fn test_field_use_binds_to_field() {
        let (table, trees, unresolved) = resolved(&["class A { int x; void m() { x = 1; } }"]);
        let x = named(&table, DefKind::Variable, "x");
        let uses = nodes(&trees[0], SyntaxKind::Ident, "x");
        assert_eq!(trees[0].binding(uses[1]), Some(&Target::Source(x)));
        assert_eq!(table.reference_count(x), 1);
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_locals_shadow_fields() {
        let (table, trees, unresolved) =
            resolved(&["class A { int x; int m() { String x = null; return x.length(); } }"]);
        let tree = &trees[0];
        let field = named(&table, DefKind::Variable, "x");
        let receiver = *nodes(tree, SyntaxKind::Ident, "x").last().unwrap();
        let local = tree.binding(receiver).and_then(Target::as_source).unwrap();
        assert_ne!(local, field);
        assert_eq!(table.def(table.def(local).parent().unwrap()).name(), "m");

        let call = first_of(tree, SyntaxKind::MethodCall);
        assert_eq!(tree.resolved_type(call), Some(&TypeRef::Primitive(Primitive::Int)));
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_arithmetic_promotes_to_widest() {
        let (_, trees, _) = resolved(&["class A { void m() { int i = 1 + 2.0; } }"]);
        let plus = first_of(&trees[0], SyntaxKind::Plus);
        assert_eq!(trees[0].resolved_type(plus), Some(&TypeRef::Primitive(Primitive::Double)));
    }

    #[test]
    fn test_dotted_name_falls_through_to_qualified_class() {
        let (_, trees, unresolved) = resolved(&["class A { Object o = java.lang.String.valueOf(1); }"]);
        let tree = &trees[0];
        let class_name = tree
            .descendants(tree.root().unwrap())
            .into_iter()
            .find(|&n| tree.dotted_name(n).as_deref() == Some("java.lang.String"))
            .unwrap();
        assert_eq!(tree.resolved_type(class_name), Some(&TypeRef::string()));
        assert_eq!(
            tree.binding(class_name),
            Some(&Target::External(ExternalItem::Class("java.lang.String".into())))
        );
        let call = first_of(tree, SyntaxKind::MethodCall);
        assert_eq!(tree.resolved_type(call), Some(&TypeRef::string()));
        assert!(unresolved.is_empty(), "{unresolved:?}");
    }

    #[test]
    fn test_overloads_bind_to_distinct_external_methods() {
        let (_, trees, unresolved) =
            resolved(&["class A { void m() { System.out.println(1); System.out.println(\"s\"); } }"]);
        let tree = &trees[0];
        let targets: Vec<_> = nodes(tree, SyntaxKind::Ident, "println")
            .into_iter()
            .map(|n| tree.binding(n).cloned().unwrap())
            .collect();
        let [Target::External(ExternalItem::Method { class: a, index: i }), Target::External(ExternalItem::Method { class: b, index: j })] =
            targets.as_slice()
        else {
            panic!("expected external methods, got {targets:?}");
        };
        assert_eq!(a, "java.io.PrintStream");
        assert_eq!(b, "java.io.PrintStream");
        assert_ne!(i, j);
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_unresolved_expression_does_not_stop_the_walk() {
        let (table, trees, unresolved) = resolved(&["class A { int x; void m() { y = 1; x = 2; } }"]);
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].text, "y");
        let y = nodes(&trees[0], SyntaxKind::Ident, "y")[0];
        assert_eq!(trees[0].binding(y), Some(&Target::Unresolved));
        assert!(!trees[0].is_meaningful(y));
        assert_eq!(table.reference_count(named(&table, DefKind::Variable, "x")), 1);
    }

    #[test]
    fn test_missing_superclass_is_reported_not_fatal() {
        let (table, _, unresolved) = resolved(&["class A extends B { }"]);
        assert_eq!(table.def(named(&table, DefKind::Class, "A")).class().unwrap().superclass, None);
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].text, "B");
    }

    #[test]
    fn test_break_binds_to_label() {
        let (table, trees, unresolved) =
            resolved(&["class A { void m() { outer: while (true) { break outer; } } }"]);
        let label = named(&table, DefKind::Label, "outer");
        let uses = nodes(&trees[0], SyntaxKind::Ident, "outer");
        assert_eq!(trees[0].binding(*uses.last().unwrap()), Some(&Target::Source(label)));
        assert_eq!(table.reference_count(label), 1);
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_constructor_calls() {
        let (table, trees, unresolved) = resolved(&[
            "class A { A(int i) { } } class B extends A { B() { super(1); } Object make() { return new A(2); } }",
        ]);
        let tree = &trees[0];
        let a = named(&table, DefKind::Class, "A");
        let ctor = table.def(a).scope().unwrap().methods_named("A").next().unwrap();
        assert!(!table.def(ctor).method().unwrap().is_default_constructor);
        let super_call = first_of(tree, SyntaxKind::SuperCtorCall);
        assert_eq!(tree.binding(super_call), Some(&Target::Source(ctor)));
        let new = first_of(tree, SyntaxKind::New);
        assert_eq!(tree.binding(new), Some(&Target::Source(ctor)));
        assert_eq!(table.reference_count(ctor), 1);
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_anonymous_class_body_resolves_in_its_own_scope() {
        let (table, trees, unresolved) = resolved(&[
            "class A { void m() { Runnable r = new Runnable() { public void run() { int k = 0; k++; } }; } }",
        ]);
        let tree = &trees[0];
        let new = first_of(tree, SyntaxKind::New);
        assert_eq!(
            tree.binding(new),
            Some(&Target::External(ExternalItem::InterfaceConstructor("java.lang.Runnable".into())))
        );
        let anonymous = named(&table, DefKind::Class, "A$1");
        assert_eq!(tree.resolved_type(new), Some(&TypeRef::Source(anonymous)));
        let k = named(&table, DefKind::Variable, "k");
        assert_eq!(table.reference_count(k), 1);
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_arrays_casts_and_instanceof() {
        let (_, trees, unresolved) = resolved(&[
            "class A { Object o; boolean m(int[] a) { int n = a.length + a[0]; String s = (String) o; return this.o instanceof String; } }",
        ]);
        let tree = &trees[0];
        let plus = first_of(tree, SyntaxKind::Plus);
        assert_eq!(tree.resolved_type(plus), Some(&TypeRef::Primitive(Primitive::Int)));
        let cast = first_of(tree, SyntaxKind::Cast);
        assert_eq!(tree.resolved_type(cast), Some(&TypeRef::string()));
        let check = first_of(tree, SyntaxKind::InstanceOf);
        assert_eq!(tree.resolved_type(check), Some(&TypeRef::Primitive(Primitive::Boolean)));
        assert!(unresolved.is_empty(), "{unresolved:?}");

        let length = nodes(tree, SyntaxKind::Ident, "length")[0];
        assert_eq!(tree.binding(length), Some(&Target::External(ExternalItem::ArrayLength)));
    }

    #[test]
    fn test_cast_target_is_not_a_reference() {
        let (table, trees, unresolved) =
            resolved(&["class B { } class A { Object o; void m() { Object b = (B) o; } }"]);
        let b = named(&table, DefKind::Class, "B");
        let o = named(&table, DefKind::Variable, "o");
        assert_eq!(table.reference_count(b), 0);
        assert_eq!(table.reference_count(o), 1);

        let tree = &trees[0];
        let cast = first_of(tree, SyntaxKind::Cast);
        assert_eq!(tree.resolved_type(cast), Some(&TypeRef::Source(b)));
        assert!(unresolved.is_empty(), "{unresolved:?}");
    }

    #[test]
    fn test_sibling_blocks_keep_their_own_locals() {
        let (table, trees, unresolved) =
            resolved(&["class A { void m() { { int x = 1; x++; } { int x = 2; x++; } } }"]);
        let locals: Vec<DefId> = table
            .iter()
            .filter(|d| d.kind() == DefKind::Variable && d.name() == "x")
            .map(|d| d.id())
            .collect();
        assert_eq!(locals.len(), 2);
        assert_eq!(table.reference_count(locals[0]), 1);
        assert_eq!(table.reference_count(locals[1]), 1);

        let uses = nodes(&trees[0], SyntaxKind::Ident, "x");
        assert_eq!(trees[0].binding(uses[1]), Some(&Target::Source(locals[0])));
        assert_eq!(trees[0].binding(uses[3]), Some(&Target::Source(locals[1])));
        assert!(unresolved.is_empty(), "{unresolved:?}");
    }

    #[test]
    fn test_resolving_twice_binds_the_same_definition() {
        let (mut table, mut trees, _) = resolved(&["class A { int x; void m() { x = 1; } }"]);
        let m = named(&table, DefKind::Method, "m");
        let x = named(&table, DefKind::Variable, "x");
        let node = nodes(&trees[0], SyntaxKind::Ident, "x")[1];

        let mut resolver = Resolver::new(&mut table, &mut trees[0]);
        let first = resolver.resolve_expression(node, m, None, false);
        let second = resolver.resolve_expression(node, m, None, false);
        assert_eq!(first, second);
        assert_eq!(first, Ok(TypeRef::Primitive(Primitive::Int)));
        assert_eq!(trees[0].binding(node), Some(&Target::Source(x)));
        assert_eq!(table.reference_count(x), 1);
    }
}
