//! Recursive-descent parser for the pre-generics Java subset.
//!
//! Produces a [`SyntaxTree`] in the shapes documented on [`SyntaxKind`].
//! Parentheses are not represented in the tree.

use logos::Logos;
use thiserror::Error;

use super::lexer::Token;
use super::{NodeId, SyntaxKind, SyntaxTree};
use crate::base::{FileId, LineIndex, TextSize};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{line}:{column}: unrecognised input `{text}`")]
    Lex { line: u32, column: u32, text: String },
    #[error("{line}:{column}: expected {expected}, found `{found}`")]
    Unexpected {
        line: u32,
        column: u32,
        expected: &'static str,
        found: String,
    },
    #[error("unexpected end of input, expected {expected}")]
    Eof { expected: &'static str },
}

impl ParseError {
    /// Line and column of the offending input, if it was not end of input.
    pub fn position(&self) -> Option<(u32, u32)> {
        match self {
            ParseError::Lex { line, column, .. } | ParseError::Unexpected { line, column, .. } => {
                Some((*line, *column))
            }
            ParseError::Eof { .. } => None,
        }
    }
}

type PResult<T> = Result<T, ParseError>;

/// Parse one compilation unit.
pub fn parse(file: FileId, source: &str) -> PResult<SyntaxTree> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        tree: SyntaxTree::new(file),
    };
    let root = parser.compilation_unit()?;
    parser.tree.set_root(root);
    Ok(parser.tree)
}

#[derive(Clone, Debug)]
struct Lexeme<'s> {
    token: Token,
    text: &'s str,
    line: u32,
    column: u32,
}

fn tokenize(source: &str) -> PResult<Vec<Lexeme<'_>>> {
    let index = LineIndex::new(source);
    let mut lexer = Token::lexer(source);
    let mut out = Vec::new();
    while let Some(result) = lexer.next() {
        let pos = index.line_col(TextSize::from(lexer.span().start as u32));
        let (line, column) = (pos.line_one_indexed(), pos.col_one_indexed());
        match result {
            Ok(token) => out.push(Lexeme {
                token,
                text: lexer.slice(),
                line,
                column,
            }),
            Err(()) => {
                return Err(ParseError::Lex {
                    line,
                    column,
                    text: lexer.slice().to_string(),
                });
            }
        }
    }
    Ok(out)
}

struct Parser<'s> {
    tokens: Vec<Lexeme<'s>>,
    pos: usize,
    tree: SyntaxTree,
}

impl<'s> Parser<'s> {
    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    fn peek(&self) -> Option<Token> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<Token> {
        self.tokens.get(self.pos + n).map(|l| l.token)
    }

    fn at(&self, token: Token) -> bool {
        self.peek() == Some(token)
    }

    fn bump(&mut self) -> Lexeme<'s> {
        let lexeme = self.tokens[self.pos].clone();
        self.pos += 1;
        lexeme
    }

    fn eat(&mut self, token: Token) -> Option<Lexeme<'s>> {
        if self.at(token) { Some(self.bump()) } else { None }
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> PResult<Lexeme<'s>> {
        match self.tokens.get(self.pos) {
            Some(l) if l.token == token => Ok(self.bump()),
            Some(l) => Err(ParseError::Unexpected {
                line: l.line,
                column: l.column,
                expected,
                found: l.text.to_string(),
            }),
            None => Err(ParseError::Eof { expected }),
        }
    }

    fn unexpected<T>(&self, expected: &'static str) -> PResult<T> {
        match self.tokens.get(self.pos) {
            Some(l) => Err(ParseError::Unexpected {
                line: l.line,
                column: l.column,
                expected,
                found: l.text.to_string(),
            }),
            None => Err(ParseError::Eof { expected }),
        }
    }

    /// Position of the next token, or (0, 0) at end of input.
    fn here(&self) -> (u32, u32) {
        self.tokens
            .get(self.pos)
            .map(|l| (l.line, l.column))
            .unwrap_or((0, 0))
    }

    fn leaf(&mut self, kind: SyntaxKind, lexeme: &Lexeme<'_>) -> NodeId {
        self.tree.alloc(kind, lexeme.text, lexeme.line, lexeme.column, vec![])
    }

    fn node(&mut self, kind: SyntaxKind, at: &Lexeme<'_>, children: Vec<NodeId>) -> NodeId {
        self.tree.alloc(kind, at.text, at.line, at.column, children)
    }

    fn node_at(&mut self, kind: SyntaxKind, (line, column): (u32, u32), children: Vec<NodeId>) -> NodeId {
        self.tree.alloc(kind, "", line, column, children)
    }

    fn ident(&mut self) -> PResult<NodeId> {
        let lexeme = self.expect(Token::Ident, "identifier")?;
        Ok(self.leaf(SyntaxKind::Ident, &lexeme))
    }

    /// Re-allocate a subtree; declarators sharing one type need separate copies.
    fn copy_subtree(&mut self, node: NodeId) -> NodeId {
        let children: Vec<_> = self.tree.children(node).collect();
        let copies = children.into_iter().map(|c| self.copy_subtree(c)).collect();
        let kind = self.tree.kind(node);
        let text = self.tree.text(node).to_string();
        let (line, column) = (self.tree.line(node), self.tree.column(node));
        self.tree.alloc(kind, text, line, column, copies)
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn compilation_unit(&mut self) -> PResult<NodeId> {
        let mut children = Vec::new();
        if let Some(kw) = self.eat(Token::Package) {
            let name = self.name()?;
            self.expect(Token::Semi, "`;`")?;
            children.push(self.node(SyntaxKind::PackageDecl, &kw, vec![name]));
        }
        while let Some(kw) = self.eat(Token::Import) {
            let name = self.import_name()?;
            self.expect(Token::Semi, "`;`")?;
            children.push(self.node(SyntaxKind::Import, &kw, vec![name]));
        }
        while self.peek().is_some() {
            if self.eat(Token::Semi).is_some() {
                continue;
            }
            let modifiers = self.modifiers();
            children.push(self.type_decl(modifiers)?);
        }
        Ok(self.tree.alloc(SyntaxKind::CompilationUnit, "", 0, 0, children))
    }

    fn name(&mut self) -> PResult<NodeId> {
        let mut name = self.ident()?;
        while self.at(Token::Dot) && self.peek_at(1) == Some(Token::Ident) {
            let dot = self.bump();
            let right = self.ident()?;
            name = self.node(SyntaxKind::Dot, &dot, vec![name, right]);
        }
        Ok(name)
    }

    fn import_name(&mut self) -> PResult<NodeId> {
        let mut name = self.ident()?;
        while let Some(dot) = self.eat(Token::Dot) {
            let right = if let Some(star) = self.eat(Token::Star) {
                self.leaf(SyntaxKind::Star, &star)
            } else {
                self.ident()?
            };
            let is_star = self.tree.kind(right) == SyntaxKind::Star;
            name = self.node(SyntaxKind::Dot, &dot, vec![name, right]);
            if is_star {
                break;
            }
        }
        Ok(name)
    }

    fn modifiers(&mut self) -> NodeId {
        let start = self.here();
        let mut mods = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Modifier) => {}
                Some(Token::Synchronized) if self.peek_at(1) != Some(Token::LParen) => {}
                _ => break,
            }
            let lexeme = self.bump();
            mods.push(self.leaf(SyntaxKind::Modifier, &lexeme));
        }
        self.node_at(SyntaxKind::Modifiers, start, mods)
    }

    fn type_decl(&mut self, modifiers: NodeId) -> PResult<NodeId> {
        match self.peek() {
            Some(Token::Class) => self.class_decl(modifiers),
            Some(Token::Interface) => self.interface_decl(modifiers),
            _ => self.unexpected("`class` or `interface`"),
        }
    }

    fn class_decl(&mut self, modifiers: NodeId) -> PResult<NodeId> {
        let kw = self.expect(Token::Class, "`class`")?;
        let name = self.ident()?;
        let mut children = vec![modifiers, name];
        if let Some(ext) = self.eat(Token::Extends) {
            let superclass = self.name()?;
            children.push(self.node(SyntaxKind::ExtendsClause, &ext, vec![superclass]));
        }
        if let Some(imp) = self.eat(Token::Implements) {
            let names = self.name_list()?;
            children.push(self.node(SyntaxKind::ImplementsClause, &imp, names));
        }
        children.push(self.obj_block()?);
        Ok(self.node(SyntaxKind::ClassDef, &kw, children))
    }

    fn interface_decl(&mut self, modifiers: NodeId) -> PResult<NodeId> {
        let kw = self.expect(Token::Interface, "`interface`")?;
        let name = self.ident()?;
        let mut children = vec![modifiers, name];
        if let Some(ext) = self.eat(Token::Extends) {
            let names = self.name_list()?;
            children.push(self.node(SyntaxKind::ExtendsClause, &ext, names));
        }
        children.push(self.obj_block()?);
        Ok(self.node(SyntaxKind::InterfaceDef, &kw, children))
    }

    fn name_list(&mut self) -> PResult<Vec<NodeId>> {
        let mut names = vec![self.name()?];
        while self.eat(Token::Comma).is_some() {
            names.push(self.name()?);
        }
        Ok(names)
    }

    fn obj_block(&mut self) -> PResult<NodeId> {
        let open = self.expect(Token::LBrace, "`{`")?;
        let mut members = Vec::new();
        while !self.at(Token::RBrace) {
            if self.peek().is_none() {
                return self.unexpected("`}`");
            }
            self.member(&mut members)?;
        }
        self.bump();
        Ok(self.node(SyntaxKind::ObjBlock, &open, members))
    }

    fn member(&mut self, out: &mut Vec<NodeId>) -> PResult<()> {
        if self.eat(Token::Semi).is_some() {
            return Ok(());
        }
        if self.at(Token::Modifier)
            && self.tokens[self.pos].text == "static"
            && self.peek_at(1) == Some(Token::LBrace)
        {
            let kw = self.bump();
            let body = self.slist()?;
            out.push(self.node(SyntaxKind::StaticInit, &kw, vec![body]));
            return Ok(());
        }
        if self.at(Token::LBrace) {
            let start = self.here();
            let body = self.slist()?;
            out.push(self.node_at(SyntaxKind::InstanceInit, start, vec![body]));
            return Ok(());
        }

        let modifiers = self.modifiers();
        match self.peek() {
            Some(Token::Class) | Some(Token::Interface) => {
                out.push(self.type_decl(modifiers)?);
            }
            Some(Token::Ident) if self.peek_at(1) == Some(Token::LParen) => {
                let name = self.ident()?;
                let params = self.parameters()?;
                let mut children = vec![modifiers, name, params];
                if let Some(throws) = self.throws()? {
                    children.push(throws);
                }
                children.push(self.slist()?);
                let start = (self.tree.line(name), self.tree.column(name));
                out.push(self.node_at(SyntaxKind::CtorDef, start, children));
            }
            _ => {
                let start = self.here();
                let ty = self.type_()?;
                let name = self.ident()?;
                if self.at(Token::LParen) {
                    let params = self.parameters()?;
                    let ty = self.trailing_dims(ty);
                    let mut children = vec![modifiers, ty, name, params];
                    if let Some(throws) = self.throws()? {
                        children.push(throws);
                    }
                    if self.eat(Token::Semi).is_none() {
                        children.push(self.slist()?);
                    }
                    out.push(self.node_at(SyntaxKind::MethodDef, start, children));
                } else {
                    self.declarators(start, modifiers, ty, name, out)?;
                    self.expect(Token::Semi, "`;`")?;
                }
            }
        }
        Ok(())
    }

    /// `Type a = 1, b[], c`: one `VariableDef` per declarator.
    fn declarators(
        &mut self,
        start: (u32, u32),
        modifiers: NodeId,
        ty: NodeId,
        first_name: NodeId,
        out: &mut Vec<NodeId>,
    ) -> PResult<()> {
        let mut name = first_name;
        let mut shared = Some((modifiers, ty));
        loop {
            let (mods, base_ty) = match shared.take() {
                Some(pair) => pair,
                None => (self.copy_subtree(modifiers), self.copy_subtree(ty)),
            };
            let declared_ty = self.trailing_dims(base_ty);
            let mut children = vec![mods, declared_ty, name];
            if let Some(eq) = self.eat(Token::Assign) {
                let init = self.variable_initializer()?;
                children.push(self.node(SyntaxKind::VariableInit, &eq, vec![init]));
            }
            out.push(self.node_at(SyntaxKind::VariableDef, start, children));
            if self.eat(Token::Comma).is_none() {
                return Ok(());
            }
            name = self.ident()?;
        }
    }

    /// `int a[]` style dimensions after a declarator name.
    fn trailing_dims(&mut self, ty: NodeId) -> NodeId {
        let mut dims = 0;
        while self.at(Token::LBracket) && self.peek_at(1) == Some(Token::RBracket) {
            self.bump();
            self.bump();
            dims += 1;
        }
        if dims == 0 {
            return ty;
        }
        let pos = (self.tree.line(ty), self.tree.column(ty));
        let Some(mut inner) = self.tree.first_child(ty) else {
            return ty;
        };
        for _ in 0..dims {
            inner = self.node_at(SyntaxKind::ArrayDeclarator, pos, vec![inner]);
        }
        self.node_at(SyntaxKind::Type, pos, vec![inner])
    }

    fn variable_initializer(&mut self) -> PResult<NodeId> {
        if self.at(Token::LBrace) {
            self.array_init()
        } else {
            self.expression()
        }
    }

    fn type_(&mut self) -> PResult<NodeId> {
        let start = self.here();
        let mut base = match self.peek() {
            Some(Token::PrimitiveType) | Some(Token::Void) => {
                let lexeme = self.bump();
                self.leaf(SyntaxKind::PrimitiveType, &lexeme)
            }
            Some(Token::Ident) => self.name()?,
            _ => return self.unexpected("type"),
        };
        while self.at(Token::LBracket) && self.peek_at(1) == Some(Token::RBracket) {
            let open = self.bump();
            self.bump();
            base = self.node(SyntaxKind::ArrayDeclarator, &open, vec![base]);
        }
        Ok(self.node_at(SyntaxKind::Type, start, vec![base]))
    }

    fn parameters(&mut self) -> PResult<NodeId> {
        let open = self.expect(Token::LParen, "`(`")?;
        let mut params = Vec::new();
        if !self.at(Token::RParen) {
            loop {
                params.push(self.parameter()?);
                if self.eat(Token::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "`)`")?;
        Ok(self.node(SyntaxKind::Parameters, &open, params))
    }

    fn parameter(&mut self) -> PResult<NodeId> {
        let start = self.here();
        let modifiers = self.modifiers();
        let ty = self.type_()?;
        let name = self.ident()?;
        let ty = self.trailing_dims(ty);
        Ok(self.node_at(SyntaxKind::Parameter, start, vec![modifiers, ty, name]))
    }

    fn throws(&mut self) -> PResult<Option<NodeId>> {
        match self.eat(Token::Throws) {
            Some(kw) => {
                let names = self.name_list()?;
                Ok(Some(self.node(SyntaxKind::Throws, &kw, names)))
            }
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn slist(&mut self) -> PResult<NodeId> {
        let open = self.expect(Token::LBrace, "`{`")?;
        let mut statements = Vec::new();
        while !self.at(Token::RBrace) {
            if self.peek().is_none() {
                return self.unexpected("`}`");
            }
            self.block_statement(&mut statements)?;
        }
        self.bump();
        Ok(self.node(SyntaxKind::Slist, &open, statements))
    }

    fn block_statement(&mut self, out: &mut Vec<NodeId>) -> PResult<()> {
        if self.starts_local_class() {
            let modifiers = self.modifiers();
            out.push(self.type_decl(modifiers)?);
        } else if self.looks_like_local_decl() {
            self.local_variables(out)?;
            self.expect(Token::Semi, "`;`")?;
        } else {
            out.push(self.statement()?);
        }
        Ok(())
    }

    fn local_variables(&mut self, out: &mut Vec<NodeId>) -> PResult<()> {
        let start = self.here();
        let modifiers = self.modifiers();
        let ty = self.type_()?;
        let name = self.ident()?;
        self.declarators(start, modifiers, ty, name, out)
    }

    fn starts_local_class(&self) -> bool {
        let mut i = 0;
        while self.peek_at(i) == Some(Token::Modifier) {
            i += 1;
        }
        matches!(self.peek_at(i), Some(Token::Class) | Some(Token::Interface))
    }

    fn looks_like_local_decl(&self) -> bool {
        match self.peek() {
            Some(Token::Modifier) => true,
            Some(Token::PrimitiveType) => self.peek_at(1) != Some(Token::Dot),
            Some(Token::Ident) => {
                let mut i = 1;
                while self.peek_at(i) == Some(Token::Dot) && self.peek_at(i + 1) == Some(Token::Ident) {
                    i += 2;
                }
                while self.peek_at(i) == Some(Token::LBracket) && self.peek_at(i + 1) == Some(Token::RBracket) {
                    i += 2;
                }
                self.peek_at(i) == Some(Token::Ident)
            }
            _ => false,
        }
    }

    fn statement(&mut self) -> PResult<NodeId> {
        let Some(token) = self.peek() else {
            return self.unexpected("statement");
        };
        match token {
            Token::LBrace => self.slist(),
            Token::Semi => {
                let semi = self.bump();
                Ok(self.leaf(SyntaxKind::Empty, &semi))
            }
            Token::If => {
                let kw = self.bump();
                let cond = self.paren_expression()?;
                let then = self.statement()?;
                let mut children = vec![cond, then];
                if let Some(else_kw) = self.eat(Token::Else) {
                    let body = self.statement()?;
                    children.push(self.node(SyntaxKind::Else, &else_kw, vec![body]));
                }
                Ok(self.node(SyntaxKind::If, &kw, children))
            }
            Token::For => self.for_statement(),
            Token::While => {
                let kw = self.bump();
                let cond = self.paren_expression()?;
                let body = self.statement()?;
                Ok(self.node(SyntaxKind::While, &kw, vec![cond, body]))
            }
            Token::Do => {
                let kw = self.bump();
                let body = self.statement()?;
                self.expect(Token::While, "`while`")?;
                let cond = self.paren_expression()?;
                self.expect(Token::Semi, "`;`")?;
                Ok(self.node(SyntaxKind::DoWhile, &kw, vec![body, cond]))
            }
            Token::Try => self.try_statement(),
            Token::Switch => self.switch_statement(),
            Token::Synchronized => {
                let kw = self.bump();
                let lock = self.paren_expression()?;
                let body = self.slist()?;
                Ok(self.node(SyntaxKind::Synchronized, &kw, vec![lock, body]))
            }
            Token::Return => {
                let kw = self.bump();
                let mut children = Vec::new();
                if !self.at(Token::Semi) {
                    children.push(self.expression()?);
                }
                self.expect(Token::Semi, "`;`")?;
                Ok(self.node(SyntaxKind::Return, &kw, children))
            }
            Token::Throw => {
                let kw = self.bump();
                let thrown = self.expression()?;
                self.expect(Token::Semi, "`;`")?;
                Ok(self.node(SyntaxKind::Throw, &kw, vec![thrown]))
            }
            Token::Break | Token::Continue => {
                let kw = self.bump();
                let kind = if kw.token == Token::Break {
                    SyntaxKind::Break
                } else {
                    SyntaxKind::Continue
                };
                let mut children = Vec::new();
                if self.at(Token::Ident) {
                    children.push(self.ident()?);
                }
                self.expect(Token::Semi, "`;`")?;
                Ok(self.node(kind, &kw, children))
            }
            Token::Assert => {
                let kw = self.bump();
                let mut children = vec![self.expression()?];
                if self.eat(Token::Colon).is_some() {
                    children.push(self.expression()?);
                }
                self.expect(Token::Semi, "`;`")?;
                Ok(self.node(SyntaxKind::Assert, &kw, children))
            }
            Token::Ident if self.peek_at(1) == Some(Token::Colon) => {
                let label = self.ident()?;
                self.bump();
                let body = self.statement()?;
                let text = self.tree.text(label).to_string();
                let (line, column) = (self.tree.line(label), self.tree.column(label));
                Ok(self.tree.alloc(SyntaxKind::Labeled, text, line, column, vec![label, body]))
            }
            Token::This | Token::Super if self.peek_at(1) == Some(Token::LParen) => {
                let kw = self.bump();
                let kind = if kw.token == Token::This {
                    SyntaxKind::ThisCtorCall
                } else {
                    SyntaxKind::SuperCtorCall
                };
                let args = self.arguments()?;
                self.expect(Token::Semi, "`;`")?;
                Ok(self.node(kind, &kw, vec![args]))
            }
            _ => {
                let start = self.here();
                let expr = self.expression()?;
                self.expect(Token::Semi, "`;`")?;
                Ok(self.node_at(SyntaxKind::ExprStmt, start, vec![expr]))
            }
        }
    }

    fn paren_expression(&mut self) -> PResult<NodeId> {
        self.expect(Token::LParen, "`(`")?;
        let expr = self.expression()?;
        self.expect(Token::RParen, "`)`")?;
        Ok(expr)
    }

    fn for_statement(&mut self) -> PResult<NodeId> {
        let kw = self.bump();
        let open = self.expect(Token::LParen, "`(`")?;

        let mut init = Vec::new();
        if !self.at(Token::Semi) {
            if self.looks_like_local_decl() {
                self.local_variables(&mut init)?;
            } else {
                init = self.expression_list()?;
            }
        }
        let init = self.node(SyntaxKind::ForInit, &open, init);
        let semi = self.expect(Token::Semi, "`;`")?;

        let mut cond = Vec::new();
        if !self.at(Token::Semi) {
            cond.push(self.expression()?);
        }
        let cond = self.node(SyntaxKind::ForCond, &semi, cond);
        let semi = self.expect(Token::Semi, "`;`")?;

        let mut iter = Vec::new();
        if !self.at(Token::RParen) {
            iter = self.expression_list()?;
        }
        let iter = self.node(SyntaxKind::ForIter, &semi, iter);
        self.expect(Token::RParen, "`)`")?;

        let body = self.statement()?;
        Ok(self.node(SyntaxKind::For, &kw, vec![init, cond, iter, body]))
    }

    fn expression_list(&mut self) -> PResult<Vec<NodeId>> {
        let mut exprs = vec![self.expression()?];
        while self.eat(Token::Comma).is_some() {
            exprs.push(self.expression()?);
        }
        Ok(exprs)
    }

    fn try_statement(&mut self) -> PResult<NodeId> {
        let kw = self.bump();
        let mut children = vec![self.slist()?];
        while let Some(catch) = self.eat(Token::Catch) {
            self.expect(Token::LParen, "`(`")?;
            let param = self.parameter()?;
            self.expect(Token::RParen, "`)`")?;
            let body = self.slist()?;
            children.push(self.node(SyntaxKind::Catch, &catch, vec![param, body]));
        }
        if let Some(finally) = self.eat(Token::Finally) {
            let body = self.slist()?;
            children.push(self.node(SyntaxKind::Finally, &finally, vec![body]));
        }
        Ok(self.node(SyntaxKind::Try, &kw, children))
    }

    fn switch_statement(&mut self) -> PResult<NodeId> {
        let kw = self.bump();
        let selector = self.paren_expression()?;
        self.expect(Token::LBrace, "`{`")?;
        let mut children = vec![selector];
        while matches!(self.peek(), Some(Token::Case) | Some(Token::Default)) {
            let group_start = self.here();
            let mut group = Vec::new();
            while matches!(self.peek(), Some(Token::Case) | Some(Token::Default)) {
                let label = self.bump();
                if label.token == Token::Case {
                    let value = self.expression()?;
                    self.expect(Token::Colon, "`:`")?;
                    group.push(self.node(SyntaxKind::Case, &label, vec![value]));
                } else {
                    self.expect(Token::Colon, "`:`")?;
                    group.push(self.leaf(SyntaxKind::Default, &label));
                }
            }
            let body_start = self.here();
            let mut statements = Vec::new();
            while !matches!(
                self.peek(),
                Some(Token::Case) | Some(Token::Default) | Some(Token::RBrace) | None
            ) {
                self.block_statement(&mut statements)?;
            }
            group.push(self.node_at(SyntaxKind::Slist, body_start, statements));
            children.push(self.node_at(SyntaxKind::CaseGroup, group_start, group));
        }
        self.expect(Token::RBrace, "`}`")?;
        Ok(self.node(SyntaxKind::Switch, &kw, children))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expression(&mut self) -> PResult<NodeId> {
        let lhs = self.ternary()?;
        let kind = match self.peek() {
            Some(Token::Assign) => SyntaxKind::Assign,
            Some(Token::CompoundAssign) => SyntaxKind::CompoundAssign,
            Some(Token::ShiftAssign) => SyntaxKind::ShiftAssign,
            _ => return Ok(lhs),
        };
        let op = self.bump();
        let rhs = self.expression()?;
        Ok(self.node(kind, &op, vec![lhs, rhs]))
    }

    fn ternary(&mut self) -> PResult<NodeId> {
        let cond = self.binary(1)?;
        let Some(question) = self.eat(Token::Question) else {
            return Ok(cond);
        };
        let then = self.expression()?;
        self.expect(Token::Colon, "`:`")?;
        let otherwise = self.ternary()?;
        Ok(self.node(SyntaxKind::Ternary, &question, vec![cond, then, otherwise]))
    }

    fn binary(&mut self, min_prec: u8) -> PResult<NodeId> {
        let mut lhs = self.unary()?;
        loop {
            let Some(token) = self.peek() else { break };
            if token == Token::Instanceof {
                if INSTANCEOF_PREC < min_prec {
                    break;
                }
                let kw = self.bump();
                let ty = self.type_()?;
                lhs = self.node(SyntaxKind::InstanceOf, &kw, vec![lhs, ty]);
                continue;
            }
            let Some((kind, prec)) = binary_operator(token) else { break };
            if prec < min_prec {
                break;
            }
            let op = self.bump();
            let rhs = self.binary(prec + 1)?;
            lhs = self.node(kind, &op, vec![lhs, rhs]);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> PResult<NodeId> {
        let kind = match self.peek() {
            Some(Token::PlusPlus) => SyntaxKind::PreInc,
            Some(Token::MinusMinus) => SyntaxKind::PreDec,
            Some(Token::Minus) => SyntaxKind::UnaryMinus,
            Some(Token::Plus) => SyntaxKind::UnaryPlus,
            Some(Token::Bang) => SyntaxKind::LogNot,
            Some(Token::Tilde) => SyntaxKind::BitNot,
            Some(Token::LParen) if self.looks_like_cast() => {
                let open = self.bump();
                let ty = self.type_()?;
                self.expect(Token::RParen, "`)`")?;
                let operand = self.unary()?;
                return Ok(self.node(SyntaxKind::Cast, &open, vec![ty, operand]));
            }
            _ => {
                let primary = self.primary()?;
                return self.postfix(primary);
            }
        };
        let op = self.bump();
        let operand = self.unary()?;
        Ok(self.node(kind, &op, vec![operand]))
    }

    fn looks_like_cast(&self) -> bool {
        let mut i = 1;
        match self.peek_at(i) {
            Some(Token::PrimitiveType) => i += 1,
            Some(Token::Ident) => {
                i += 1;
                while self.peek_at(i) == Some(Token::Dot) && self.peek_at(i + 1) == Some(Token::Ident) {
                    i += 2;
                }
            }
            _ => return false,
        }
        let mut dims = false;
        while self.peek_at(i) == Some(Token::LBracket) && self.peek_at(i + 1) == Some(Token::RBracket) {
            i += 2;
            dims = true;
        }
        if self.peek_at(i) != Some(Token::RParen) {
            return false;
        }
        if self.peek_at(1) == Some(Token::PrimitiveType) || dims {
            return true;
        }
        matches!(
            self.peek_at(i + 1),
            Some(Token::Ident)
                | Some(Token::LParen)
                | Some(Token::This)
                | Some(Token::Super)
                | Some(Token::New)
                | Some(Token::Bang)
                | Some(Token::Tilde)
                | Some(Token::StringLit)
                | Some(Token::CharLit)
                | Some(Token::IntLit)
                | Some(Token::LongLit)
                | Some(Token::FloatLit)
                | Some(Token::DoubleLit)
                | Some(Token::True)
                | Some(Token::False)
                | Some(Token::Null)
        )
    }

    fn postfix(&mut self, mut expr: NodeId) -> PResult<NodeId> {
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    let dot = self.bump();
                    let right = match self.peek() {
                        Some(Token::Ident) => self.ident()?,
                        Some(Token::Class) => {
                            let kw = self.bump();
                            self.leaf(SyntaxKind::ClassLit, &kw)
                        }
                        Some(Token::This) => {
                            let kw = self.bump();
                            self.leaf(SyntaxKind::This, &kw)
                        }
                        _ => return self.unexpected("member name"),
                    };
                    let is_call = self.tree.kind(right) == SyntaxKind::Ident && self.at(Token::LParen);
                    expr = self.node(SyntaxKind::Dot, &dot, vec![expr, right]);
                    if is_call {
                        expr = self.call(expr)?;
                    }
                }
                Some(Token::LBracket) => {
                    let open = self.bump();
                    let index = self.expression()?;
                    self.expect(Token::RBracket, "`]`")?;
                    expr = self.node(SyntaxKind::Index, &open, vec![expr, index]);
                }
                Some(Token::PlusPlus) => {
                    let op = self.bump();
                    expr = self.node(SyntaxKind::PostInc, &op, vec![expr]);
                }
                Some(Token::MinusMinus) => {
                    let op = self.bump();
                    expr = self.node(SyntaxKind::PostDec, &op, vec![expr]);
                }
                _ => return Ok(expr),
            }
        }
    }

    fn call(&mut self, callee: NodeId) -> PResult<NodeId> {
        let args = self.arguments()?;
        let (line, column) = (self.tree.line(args), self.tree.column(args));
        Ok(self.tree.alloc(SyntaxKind::MethodCall, "(", line, column, vec![callee, args]))
    }

    fn arguments(&mut self) -> PResult<NodeId> {
        let open = self.expect(Token::LParen, "`(`")?;
        let mut args = Vec::new();
        if !self.at(Token::RParen) {
            args = self.expression_list()?;
        }
        self.expect(Token::RParen, "`)`")?;
        Ok(self.node(SyntaxKind::Arguments, &open, args))
    }

    fn array_init(&mut self) -> PResult<NodeId> {
        let open = self.expect(Token::LBrace, "`{`")?;
        let mut items = Vec::new();
        while !self.at(Token::RBrace) {
            items.push(self.variable_initializer()?);
            if self.eat(Token::Comma).is_none() {
                break;
            }
        }
        self.expect(Token::RBrace, "`}`")?;
        Ok(self.node(SyntaxKind::ArrayInit, &open, items))
    }

    fn primary(&mut self) -> PResult<NodeId> {
        let Some(token) = self.peek() else {
            return self.unexpected("expression");
        };
        let literal = match token {
            Token::IntLit => Some(SyntaxKind::IntLit),
            Token::LongLit => Some(SyntaxKind::LongLit),
            Token::FloatLit => Some(SyntaxKind::FloatLit),
            Token::DoubleLit => Some(SyntaxKind::DoubleLit),
            Token::CharLit => Some(SyntaxKind::CharLit),
            Token::StringLit => Some(SyntaxKind::StringLit),
            Token::True => Some(SyntaxKind::TrueLit),
            Token::False => Some(SyntaxKind::FalseLit),
            Token::Null => Some(SyntaxKind::NullLit),
            Token::This => Some(SyntaxKind::This),
            Token::Super => Some(SyntaxKind::Super),
            Token::PrimitiveType | Token::Void => Some(SyntaxKind::PrimitiveType),
            _ => None,
        };
        if let Some(kind) = literal {
            let lexeme = self.bump();
            return Ok(self.leaf(kind, &lexeme));
        }
        match token {
            Token::Ident => {
                let ident = self.ident()?;
                if self.at(Token::LParen) {
                    self.call(ident)
                } else {
                    Ok(ident)
                }
            }
            Token::LParen => self.paren_expression(),
            Token::New => self.creation(),
            _ => self.unexpected("expression"),
        }
    }

    fn creation(&mut self) -> PResult<NodeId> {
        let kw = self.bump();
        let ty = match self.peek() {
            Some(Token::PrimitiveType) => {
                let lexeme = self.bump();
                self.leaf(SyntaxKind::PrimitiveType, &lexeme)
            }
            _ => self.name()?,
        };

        if self.at(Token::LBracket) {
            let mut children = vec![ty];
            while let Some(open) = self.eat(Token::LBracket) {
                let mut size = Vec::new();
                if !self.at(Token::RBracket) {
                    size.push(self.expression()?);
                }
                self.expect(Token::RBracket, "`]`")?;
                children.push(self.node(SyntaxKind::Dim, &open, size));
            }
            if self.at(Token::LBrace) {
                children.push(self.array_init()?);
            }
            return Ok(self.node(SyntaxKind::NewArray, &kw, children));
        }

        let args = self.arguments()?;
        let mut children = vec![ty, args];
        if self.at(Token::LBrace) {
            children.push(self.obj_block()?);
        }
        Ok(self.node(SyntaxKind::New, &kw, children))
    }
}

const INSTANCEOF_PREC: u8 = 7;

fn binary_operator(token: Token) -> Option<(SyntaxKind, u8)> {
    let op = match token {
        Token::OrOr => (SyntaxKind::LogOr, 1),
        Token::AndAnd => (SyntaxKind::LogAnd, 2),
        Token::Or => (SyntaxKind::BitOr, 3),
        Token::Caret => (SyntaxKind::BitXor, 4),
        Token::And => (SyntaxKind::BitAnd, 5),
        Token::EqEq => (SyntaxKind::EqEq, 6),
        Token::NotEq => (SyntaxKind::NotEq, 6),
        Token::Lt => (SyntaxKind::Lt, 7),
        Token::Gt => (SyntaxKind::Gt, 7),
        Token::Le => (SyntaxKind::Le, 7),
        Token::Ge => (SyntaxKind::Ge, 7),
        Token::Shl => (SyntaxKind::Shl, 8),
        Token::Shr => (SyntaxKind::Shr, 8),
        Token::UShr => (SyntaxKind::UShr, 8),
        Token::Plus => (SyntaxKind::Plus, 9),
        Token::Minus => (SyntaxKind::Minus, 9),
        Token::Star => (SyntaxKind::Mul, 10),
        Token::Slash => (SyntaxKind::Div, 10),
        Token::Percent => (SyntaxKind::Mod, 10),
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> SyntaxTree {
        parse(FileId::new(0), src).expect("parse")
    }

    fn kinds_of(tree: &SyntaxTree, node: NodeId) -> Vec<SyntaxKind> {
        tree.children(node).map(|c| tree.kind(c)).collect()
    }

    fn first_method_body(tree: &SyntaxTree) -> NodeId {
        let root = tree.root().unwrap();
        let class = tree.find_child(root, SyntaxKind::ClassDef).unwrap();
        let block = tree.find_child(class, SyntaxKind::ObjBlock).unwrap();
        let method = tree.find_child(block, SyntaxKind::MethodDef).unwrap();
        tree.find_child(method, SyntaxKind::Slist).unwrap()
    }

    #[test]
    fn test_compilation_unit_shape() {
        let tree = parse_ok("package a.b; import java.util.*; import java.io.File; class A {}");
        let root = tree.root().unwrap();
        assert_eq!(
            kinds_of(&tree, root),
            vec![
                SyntaxKind::PackageDecl,
                SyntaxKind::Import,
                SyntaxKind::Import,
                SyntaxKind::ClassDef,
            ]
        );
        let import = tree.child(root, 1).unwrap();
        let name = tree.first_child(import).unwrap();
        assert_eq!(tree.dotted_name(name).as_deref(), Some("java.util.*"));
    }

    #[test]
    fn test_field_declarators_are_split() {
        let tree = parse_ok("class A { int a, b = 1, c[]; }");
        let root = tree.root().unwrap();
        let class = tree.find_child(root, SyntaxKind::ClassDef).unwrap();
        let block = tree.find_child(class, SyntaxKind::ObjBlock).unwrap();
        let vars: Vec<_> = tree.children(block).collect();
        assert_eq!(vars.len(), 3);
        assert!(vars.iter().all(|&v| tree.kind(v) == SyntaxKind::VariableDef));
        assert!(tree.find_child(vars[1], SyntaxKind::VariableInit).is_some());
        let c_type = tree.find_child(vars[2], SyntaxKind::Type).unwrap();
        assert_eq!(
            tree.kind(tree.first_child(c_type).unwrap()),
            SyntaxKind::ArrayDeclarator
        );
    }

    #[test]
    fn test_precedence() {
        let tree = parse_ok("class A { void m() { x = 1 + 2 * 3; } }");
        let body = first_method_body(&tree);
        let stmt = tree.first_child(body).unwrap();
        let assign = tree.first_child(stmt).unwrap();
        assert_eq!(tree.kind(assign), SyntaxKind::Assign);
        let sum = tree.child(assign, 1).unwrap();
        assert_eq!(tree.kind(sum), SyntaxKind::Plus);
        assert_eq!(tree.kind(tree.child(sum, 1).unwrap()), SyntaxKind::Mul);
    }

    #[test]
    fn test_cast_versus_parenthesised_expression() {
        let tree = parse_ok("class A { void m() { y = (String) o; z = (a) - b; } }");
        let body = first_method_body(&tree);
        let stmts: Vec<_> = tree.children(body).collect();
        let first = tree.child(tree.first_child(stmts[0]).unwrap(), 1).unwrap();
        assert_eq!(tree.kind(first), SyntaxKind::Cast);
        let second = tree.child(tree.first_child(stmts[1]).unwrap(), 1).unwrap();
        assert_eq!(tree.kind(second), SyntaxKind::Minus);
    }

    #[test]
    fn test_local_declaration_versus_expression() {
        let tree = parse_ok("class A { void m() { java.util.List l; a.b(); a = b; } }");
        let body = first_method_body(&tree);
        assert_eq!(
            kinds_of(&tree, body),
            vec![SyntaxKind::VariableDef, SyntaxKind::ExprStmt, SyntaxKind::ExprStmt]
        );
    }

    #[test]
    fn test_anonymous_class_creation() {
        let tree = parse_ok("class A { Object o = new Runnable() { public void run() {} }; }");
        let new = tree
            .descendants(tree.root().unwrap())
            .into_iter()
            .find(|&n| tree.kind(n) == SyntaxKind::New)
            .unwrap();
        assert_eq!(
            kinds_of(&tree, new),
            vec![SyntaxKind::Ident, SyntaxKind::Arguments, SyntaxKind::ObjBlock]
        );
    }

    #[test]
    fn test_statements() {
        let src = r#"
            class A {
                void m(int n) throws Exception {
                    outer: for (int i = 0; i < n; i++) { if (i > 2) break outer; else continue; }
                    try { m(1); } catch (Exception e) { throw e; } finally { n--; }
                    switch (n) { case 1: case 2: n = 0; break; default: n = 1; }
                    do { n++; } while (n < 10);
                    synchronized (this) { assert n > 0 : "positive"; }
                }
            }
        "#;
        let tree = parse_ok(src);
        let body = first_method_body(&tree);
        assert_eq!(
            kinds_of(&tree, body),
            vec![
                SyntaxKind::Labeled,
                SyntaxKind::Try,
                SyntaxKind::Switch,
                SyntaxKind::DoWhile,
                SyntaxKind::Synchronized,
            ]
        );
    }

    #[test]
    fn test_constructor_and_ctor_calls() {
        let tree = parse_ok("class A extends B { A() { super(1); } A(int x) { this(); } }");
        let root = tree.root().unwrap();
        let class = tree.find_child(root, SyntaxKind::ClassDef).unwrap();
        assert_eq!(
            kinds_of(&tree, class),
            vec![
                SyntaxKind::Modifiers,
                SyntaxKind::Ident,
                SyntaxKind::ExtendsClause,
                SyntaxKind::ObjBlock,
            ]
        );
        let block = tree.find_child(class, SyntaxKind::ObjBlock).unwrap();
        let ctors: Vec<_> = tree.children(block).collect();
        assert!(ctors.iter().all(|&c| tree.kind(c) == SyntaxKind::CtorDef));
        let body = tree.find_child(ctors[0], SyntaxKind::Slist).unwrap();
        assert_eq!(tree.kind(tree.first_child(body).unwrap()), SyntaxKind::SuperCtorCall);
    }

    #[test]
    fn test_positions_are_one_based() {
        let tree = parse_ok("class A {\n  int x;\n}");
        let root = tree.root().unwrap();
        let class = tree.find_child(root, SyntaxKind::ClassDef).unwrap();
        assert_eq!((tree.line(class), tree.column(class)), (1, 1));
        let name = tree.find_child(class, SyntaxKind::Ident).unwrap();
        assert_eq!((tree.line(name), tree.column(name)), (1, 7));
    }

    #[test]
    fn test_parse_error_reports_position() {
        let err = parse(FileId::new(0), "class A { int }").unwrap_err();
        assert!(matches!(err, ParseError::Unexpected { line: 1, .. }));
    }
}
