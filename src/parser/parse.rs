//! Recursive descent parser
//!
//! Tokens → [`Program`]. The grammar is the classic small-C shape:
//! declaration specifiers are gathered by keyword counting, declarators are
//! parsed inside-out (including parenthesized declarators like
//! `int (*y)[3]`), and expressions use one precedence level per function.
//!
//! The parser owns a [`ScopeChain`] because C cannot be parsed without one:
//! whether `t * p;` is a declaration or a multiplication depends on whether
//! `t` currently names a type. Typedef names and struct tags are resolved
//! here, against their own namespaces; ordinary identifiers are only
//! *recorded* here (their spelling hides any outer typedef of the same
//! spelling) and are resolved by the evaluator at run time.
//!
//! Frame slots are assigned as declarations are parsed: every local of a
//! function, however deeply nested its block, gets an index into the
//! function's [`FrameLayout`].

use crate::memory::frame::FrameLayout;
use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, SourceLocation, Token, TokenKind};
use crate::scope::ScopeChain;
use crate::types::{struct_layout, Specifiers, Ty, TyKind};
use std::fmt;
use std::mem;

/// Parser error type
#[derive(Debug)]
pub struct ParseError {
    pub message: String,
    pub loc: SourceLocation,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.loc, self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            loc: err.loc,
        }
    }
}

/// Recursive descent parser for the C subset.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    scopes: ScopeChain<()>,
    /// Slot types of the function currently being parsed, declaration order.
    locals: Vec<Ty>,
    /// Named parameters of the most recently parsed function declarator.
    last_params: Vec<(String, Ty)>,
    funcs: Vec<Function>,
    globals: Vec<GlobalDecl>,
    externs: Vec<String>,
    strings: Vec<Vec<u8>>,
}

impl Parser {
    pub fn new(source: &str) -> Result<Parser, ParseError> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Parser {
            tokens,
            pos: 0,
            scopes: ScopeChain::new(),
            locals: Vec::new(),
            last_params: Vec::new(),
            funcs: Vec::new(),
            globals: Vec::new(),
            externs: Vec::new(),
            strings: Vec::new(),
        })
    }

    /// Parse the whole translation unit.
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        while !self.check(&TokenKind::Eof) {
            self.top_level()?;
        }
        Ok(Program {
            funcs: mem::take(&mut self.funcs),
            globals: mem::take(&mut self.globals),
            externs: mem::take(&mut self.externs),
            strings: mem::take(&mut self.strings),
        })
    }

    // ----- top level -------------------------------------------------------

    fn top_level(&mut self) -> Result<(), ParseError> {
        let (base, is_typedef) = self.declspec()?;

        if is_typedef {
            return self.typedef_names(base);
        }
        // A bare specifier (`struct t { ... };`) declares only the tag.
        if self.consume(&TokenKind::Semicolon) {
            return Ok(());
        }

        let (name, ty) = self.declarator(base.clone())?;

        if let TyKind::Func(func) = &ty.kind {
            let ret_ty = func.ret.clone();
            self.scopes.declare_ordinary(&name, ());
            if self.check(&TokenKind::LBrace) {
                let params = mem::take(&mut self.last_params);
                return self.function(name, ret_ty, params);
            }
            self.externs.push(name);
            self.expect(&TokenKind::Semicolon, "';' after function declaration")?;
            return Ok(());
        }

        let mut decls = vec![(name, ty)];
        while self.consume(&TokenKind::Comma) {
            decls.push(self.declarator(base.clone())?);
        }
        self.expect(&TokenKind::Semicolon, "';' after global declaration")?;
        for (name, ty) in decls {
            self.scopes.declare_ordinary(&name, ());
            self.globals.push(GlobalDecl { name, ty });
        }
        Ok(())
    }

    fn typedef_names(&mut self, base: Ty) -> Result<(), ParseError> {
        loop {
            let (name, ty) = self.declarator(base.clone())?;
            self.scopes.declare_typedef(&name, ty);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Semicolon, "';' after typedef")?;
        Ok(())
    }

    fn function(
        &mut self,
        name: String,
        ret_ty: Ty,
        params: Vec<(String, Ty)>,
    ) -> Result<(), ParseError> {
        self.locals.clear();
        self.scopes.enter();

        let mut param_items = Vec::with_capacity(params.len());
        for (pname, pty) in params {
            let slot = self.locals.len();
            self.locals.push(pty.clone());
            self.scopes.declare_ordinary(&pname, ());
            param_items.push(Param {
                name: pname,
                ty: pty,
                slot,
            });
        }

        self.expect(&TokenKind::LBrace, "'{' before function body")?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            body.push(self.stmt()?);
        }
        self.expect(&TokenKind::RBrace, "'}' after function body")?;
        self.scopes.leave();

        let layout = FrameLayout::compute(&self.locals);
        self.funcs.push(Function {
            name,
            ret_ty,
            params: param_items,
            body,
            layout,
        });
        Ok(())
    }

    // ----- declarations ----------------------------------------------------

    /// Gather declaration specifiers. Returns the base type and whether the
    /// `typedef` keyword appeared (repeats of it are accepted).
    fn declspec(&mut self) -> Result<(Ty, bool), ParseError> {
        let mut spec = Specifiers::new();
        let mut is_typedef = false;

        loop {
            let kind = self.peek().kind.clone();
            match kind {
                TokenKind::KwTypedef => {
                    is_typedef = true;
                    self.advance();
                }
                TokenKind::KwVoid => {
                    spec.voids += 1;
                    self.advance();
                }
                TokenKind::KwBool => {
                    spec.bools += 1;
                    self.advance();
                }
                TokenKind::KwChar => {
                    spec.chars += 1;
                    self.advance();
                }
                TokenKind::KwShort => {
                    spec.shorts += 1;
                    self.advance();
                }
                TokenKind::KwInt => {
                    spec.ints += 1;
                    self.advance();
                }
                TokenKind::KwLong => {
                    spec.longs += 1;
                    self.advance();
                }
                TokenKind::KwStruct => {
                    if spec.user.is_some() || spec.saw_base_keyword() {
                        return Err(self.error("unexpected 'struct' in type specifiers"));
                    }
                    self.advance();
                    spec.user = Some(self.struct_specifier()?);
                }
                TokenKind::Ident(name)
                    if spec.user.is_none()
                        && !spec.saw_base_keyword()
                        && self.scopes.is_type_name(&name) =>
                {
                    let ty = self
                        .scopes
                        .resolve_typedef(&name)
                        .cloned()
                        .ok_or_else(|| self.error(format!("unknown type name '{}'", name)))?;
                    spec.user = Some(ty);
                    self.advance();
                }
                _ => break,
            }
        }

        let ty = spec.finish().map_err(|m| self.error(m))?;
        Ok((ty, is_typedef))
    }

    /// Struct specifier, after the `struct` keyword: optional tag, optional
    /// body. A body declares the tag in the current scope; a bare tag
    /// resolves through the tag namespace.
    fn struct_specifier(&mut self) -> Result<Ty, ParseError> {
        let tag = match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        };

        if self.consume(&TokenKind::LBrace) {
            let mut fields = Vec::new();
            while !self.check(&TokenKind::RBrace) {
                let (base, is_typedef) = self.declspec()?;
                if is_typedef {
                    return Err(self.error("typedef is not allowed in a struct member"));
                }
                loop {
                    let (name, ty) = self.declarator(base.clone())?;
                    fields.push((name, ty));
                    if !self.consume(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::Semicolon, "';' after struct member")?;
            }
            self.expect(&TokenKind::RBrace, "'}' after struct members")?;

            let ty = struct_layout(fields);
            if let Some(tag) = tag {
                self.scopes
                    .declare_tag(&tag, ty.clone())
                    .map_err(|m| self.error(m))?;
            }
            return Ok(ty);
        }

        let Some(tag) = tag else {
            return Err(self.error("expected a struct tag or member list"));
        };
        self.scopes
            .resolve_tag(&tag)
            .cloned()
            .ok_or_else(|| self.error(format!("unknown struct tag '{}'", tag)))
    }

    /// Declarator: `"*"* ("(" declarator ")" | ident) type-suffix`.
    ///
    /// A parenthesized declarator is parsed twice: once with a placeholder
    /// base to locate the closing paren, then for real with the suffixed
    /// base type, so `int (*y)[3]` comes out as pointer-to-array rather
    /// than array-of-pointer.
    fn declarator(&mut self, base: Ty) -> Result<(String, Ty), ParseError> {
        let mut ty = base;
        while self.consume(&TokenKind::Star) {
            ty = Ty::ptr_to(ty);
        }

        if self.consume(&TokenKind::LParen) {
            let start = self.pos;
            self.declarator(Ty::int())?; // placeholder pass
            self.expect(&TokenKind::RParen, "')' after declarator")?;
            let ty = self.type_suffix(ty)?;
            let end = self.pos;
            self.pos = start;
            let (name, ty) = self.declarator(ty)?;
            self.pos = end;
            return Ok((name, ty));
        }

        let name = self.expect_ident()?;

        if self.consume(&TokenKind::LParen) {
            // Function declarator. The subset has no function pointers, so
            // this can only appear at the top of a declarator.
            let (params, specified) = self.func_params()?;
            let param_tys = if specified {
                Some(params.iter().map(|(_, t)| t.clone()).collect())
            } else {
                None
            };
            self.last_params = params;
            return Ok((name, Ty::func(param_tys, ty)));
        }

        let ty = self.type_suffix(ty)?;
        Ok((name, ty))
    }

    /// Array suffixes: `[n]`, possibly repeated; `int x[2][3]` is an array
    /// of two arrays of three.
    fn type_suffix(&mut self, ty: Ty) -> Result<Ty, ParseError> {
        if self.consume(&TokenKind::LBracket) {
            let len = self.expect_num()?;
            if len < 0 {
                return Err(self.error("array length cannot be negative"));
            }
            self.expect(&TokenKind::RBracket, "']' after array length")?;
            let inner = self.type_suffix(ty)?;
            return Ok(Ty::array_of(inner, len as usize));
        }
        Ok(ty)
    }

    /// Parameter list after '('. `()` leaves the arity unspecified; `(void)`
    /// means zero parameters. Array parameters adjust to pointers.
    fn func_params(&mut self) -> Result<(Vec<(String, Ty)>, bool), ParseError> {
        if self.consume(&TokenKind::RParen) {
            return Ok((Vec::new(), false));
        }
        if self.check(&TokenKind::KwVoid) && self.peek_kind_at(1) == &TokenKind::RParen {
            self.advance();
            self.advance();
            return Ok((Vec::new(), true));
        }

        let mut params = Vec::new();
        loop {
            let (base, is_typedef) = self.declspec()?;
            if is_typedef {
                return Err(self.error("typedef is not allowed in a parameter list"));
            }
            let (name, ty) = self.declarator(base)?;
            params.push((name, ty.decay()));
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "')' after parameters")?;
        Ok((params, true))
    }

    /// Abstract declarator for `sizeof(type-name)`: a declarator with no
    /// identifier.
    fn abstract_declarator(&mut self, base: Ty) -> Result<Ty, ParseError> {
        let mut ty = base;
        while self.consume(&TokenKind::Star) {
            ty = Ty::ptr_to(ty);
        }

        if self.check(&TokenKind::LParen) {
            self.advance();
            let start = self.pos;
            self.abstract_declarator(Ty::int())?; // placeholder pass
            self.expect(&TokenKind::RParen, "')' in type name")?;
            let ty = self.type_suffix(ty)?;
            let end = self.pos;
            self.pos = start;
            let ty = self.abstract_declarator(ty)?;
            self.pos = end;
            return Ok(ty);
        }

        self.type_suffix(ty)
    }

    /// Local declaration statement. Typedefs and bare struct specifiers
    /// affect only the scope chain and produce no executable statement.
    fn declaration(&mut self) -> Result<Stmt, ParseError> {
        let (base, is_typedef) = self.declspec()?;

        if is_typedef {
            self.typedef_names(base)?;
            return Ok(Stmt::Empty);
        }
        if self.consume(&TokenKind::Semicolon) {
            return Ok(Stmt::Empty);
        }

        let mut items = Vec::new();
        loop {
            let (name, ty) = self.declarator(base.clone())?;
            if matches!(ty.kind, TyKind::Func(_)) {
                return Err(self.error("function declarations are not allowed inside a function"));
            }
            let slot = self.locals.len();
            self.locals.push(ty.clone());
            self.scopes.declare_ordinary(&name, ());
            let init = if self.consume(&TokenKind::Assign) {
                Some(self.assign_expr()?)
            } else {
                None
            };
            items.push(DeclItem {
                name,
                ty,
                slot,
                init,
            });
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Semicolon, "';' after declaration")?;
        Ok(Stmt::Decl(items))
    }

    // ----- statements ------------------------------------------------------

    fn stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek().kind {
            TokenKind::KwReturn => {
                self.advance();
                if self.consume(&TokenKind::Semicolon) {
                    return Ok(Stmt::Return(None));
                }
                let expr = self.expr()?;
                self.expect(&TokenKind::Semicolon, "';' after return value")?;
                Ok(Stmt::Return(Some(expr)))
            }
            TokenKind::KwIf => {
                self.advance();
                self.expect(&TokenKind::LParen, "'(' after 'if'")?;
                let cond = self.expr()?;
                self.expect(&TokenKind::RParen, "')' after condition")?;
                let then_branch = Box::new(self.stmt()?);
                let else_branch = if self.consume(&TokenKind::KwElse) {
                    Some(Box::new(self.stmt()?))
                } else {
                    None
                };
                Ok(Stmt::If {
                    cond,
                    then_branch,
                    else_branch,
                })
            }
            TokenKind::KwWhile => {
                self.advance();
                self.expect(&TokenKind::LParen, "'(' after 'while'")?;
                let cond = self.expr()?;
                self.expect(&TokenKind::RParen, "')' after condition")?;
                Ok(Stmt::While {
                    cond,
                    body: Box::new(self.stmt()?),
                })
            }
            TokenKind::KwFor => {
                self.advance();
                self.expect(&TokenKind::LParen, "'(' after 'for'")?;
                let init = if self.consume(&TokenKind::Semicolon) {
                    None
                } else {
                    let e = self.expr()?;
                    self.expect(&TokenKind::Semicolon, "';' after for initializer")?;
                    Some(e)
                };
                let cond = if self.consume(&TokenKind::Semicolon) {
                    None
                } else {
                    let e = self.expr()?;
                    self.expect(&TokenKind::Semicolon, "';' after for condition")?;
                    Some(e)
                };
                let step = if self.check(&TokenKind::RParen) {
                    None
                } else {
                    Some(self.expr()?)
                };
                self.expect(&TokenKind::RParen, "')' after for clauses")?;
                Ok(Stmt::For {
                    init,
                    cond,
                    step,
                    body: Box::new(self.stmt()?),
                })
            }
            TokenKind::LBrace => {
                self.advance();
                Ok(Stmt::Block(self.block_body()?))
            }
            TokenKind::Semicolon => {
                self.advance();
                Ok(Stmt::Empty)
            }
            _ if self.is_decl_start() => self.declaration(),
            _ => {
                let expr = self.expr()?;
                self.expect(&TokenKind::Semicolon, "';' after expression")?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    /// Statements up to a closing brace, in a fresh scope. The opening
    /// brace has already been consumed.
    fn block_body(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.scopes.enter();
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            stmts.push(self.stmt()?);
        }
        self.advance(); // '}'
        self.scopes.leave();
        Ok(stmts)
    }

    fn is_decl_start(&self) -> bool {
        match &self.peek().kind {
            TokenKind::KwInt
            | TokenKind::KwChar
            | TokenKind::KwShort
            | TokenKind::KwLong
            | TokenKind::KwVoid
            | TokenKind::KwBool
            | TokenKind::KwStruct
            | TokenKind::KwTypedef => true,
            TokenKind::Ident(name) => self.scopes.is_type_name(name),
            _ => false,
        }
    }

    // ----- expressions -----------------------------------------------------

    fn expr(&mut self) -> Result<Expr, ParseError> {
        self.assign_expr()
    }

    fn assign_expr(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.equality()?;
        if self.consume(&TokenKind::Assign) {
            let rhs = self.assign_expr()?;
            return Ok(Expr::Assign {
                target: Box::new(lhs),
                value: Box::new(rhs),
            });
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut node = self.relational()?;
        loop {
            let op = if self.consume(&TokenKind::EqEq) {
                BinOp::Eq
            } else if self.consume(&TokenKind::NotEq) {
                BinOp::Ne
            } else {
                return Ok(node);
            };
            node = Expr::Binary {
                op,
                lhs: Box::new(node),
                rhs: Box::new(self.relational()?),
            };
        }
    }

    fn relational(&mut self) -> Result<Expr, ParseError> {
        let mut node = self.add()?;
        loop {
            let op = if self.consume(&TokenKind::Lt) {
                BinOp::Lt
            } else if self.consume(&TokenKind::Le) {
                BinOp::Le
            } else if self.consume(&TokenKind::Gt) {
                BinOp::Gt
            } else if self.consume(&TokenKind::Ge) {
                BinOp::Ge
            } else {
                return Ok(node);
            };
            node = Expr::Binary {
                op,
                lhs: Box::new(node),
                rhs: Box::new(self.add()?),
            };
        }
    }

    fn add(&mut self) -> Result<Expr, ParseError> {
        let mut node = self.mul()?;
        loop {
            let op = if self.consume(&TokenKind::Plus) {
                BinOp::Add
            } else if self.consume(&TokenKind::Minus) {
                BinOp::Sub
            } else {
                return Ok(node);
            };
            node = Expr::Binary {
                op,
                lhs: Box::new(node),
                rhs: Box::new(self.mul()?),
            };
        }
    }

    fn mul(&mut self) -> Result<Expr, ParseError> {
        let mut node = self.unary()?;
        loop {
            let op = if self.consume(&TokenKind::Star) {
                BinOp::Mul
            } else if self.consume(&TokenKind::Slash) {
                BinOp::Div
            } else {
                return Ok(node);
            };
            node = Expr::Binary {
                op,
                lhs: Box::new(node),
                rhs: Box::new(self.unary()?),
            };
        }
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Plus => {
                self.advance();
                return self.unary();
            }
            TokenKind::Minus => UnOp::Neg,
            TokenKind::Star => UnOp::Deref,
            TokenKind::Amp => UnOp::Addr,
            TokenKind::KwSizeof => {
                self.advance();
                return self.sizeof_operand();
            }
            _ => return self.postfix(),
        };
        self.advance();
        Ok(Expr::Unary {
            op,
            operand: Box::new(self.unary()?),
        })
    }

    /// After `sizeof`: either a parenthesized type name or a unary
    /// expression (`sizeof x`, `sizeof **x`). The operand is never
    /// evaluated, only typed.
    fn sizeof_operand(&mut self) -> Result<Expr, ParseError> {
        if self.check(&TokenKind::LParen) && self.is_type_name_at(self.pos + 1) {
            self.advance();
            let (base, is_typedef) = self.declspec()?;
            if is_typedef {
                return Err(self.error("typedef is not allowed in a type name"));
            }
            let ty = self.abstract_declarator(base)?;
            self.expect(&TokenKind::RParen, "')' after type name")?;
            return Ok(Expr::SizeofType(ty));
        }
        Ok(Expr::SizeofExpr(Box::new(self.unary()?)))
    }

    fn is_type_name_at(&self, pos: usize) -> bool {
        match self.tokens.get(pos).map(|t| &t.kind) {
            Some(
                TokenKind::KwInt
                | TokenKind::KwChar
                | TokenKind::KwShort
                | TokenKind::KwLong
                | TokenKind::KwVoid
                | TokenKind::KwBool
                | TokenKind::KwStruct,
            ) => true,
            Some(TokenKind::Ident(name)) => self.scopes.is_type_name(name),
            _ => false,
        }
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut node = self.primary()?;
        loop {
            if self.consume(&TokenKind::LBracket) {
                // a[i] and i[a] are both *(a + i).
                let index = self.expr()?;
                self.expect(&TokenKind::RBracket, "']' after subscript")?;
                node = Expr::Unary {
                    op: UnOp::Deref,
                    operand: Box::new(Expr::Binary {
                        op: BinOp::Add,
                        lhs: Box::new(node),
                        rhs: Box::new(index),
                    }),
                };
            } else if self.consume(&TokenKind::Dot) {
                node = Expr::Member {
                    base: Box::new(node),
                    field: self.expect_ident()?,
                };
            } else if self.consume(&TokenKind::Arrow) {
                // p->f is (*p).f.
                node = Expr::Member {
                    base: Box::new(Expr::Unary {
                        op: UnOp::Deref,
                        operand: Box::new(node),
                    }),
                    field: self.expect_ident()?,
                };
            } else {
                return Ok(node);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let kind = self.peek().kind.clone();
        match kind {
            TokenKind::LParen => {
                self.advance();
                if self.consume(&TokenKind::LBrace) {
                    let stmts = self.block_body()?;
                    self.expect(&TokenKind::RParen, "')' after statement expression")?;
                    return Ok(Expr::StmtExpr(stmts));
                }
                let expr = self.expr()?;
                self.expect(&TokenKind::RParen, "')' after expression")?;
                Ok(expr)
            }
            TokenKind::Num(value) => {
                self.advance();
                Ok(Expr::Num(value))
            }
            TokenKind::Str(bytes) => {
                self.advance();
                let len = bytes.len();
                let id = self.strings.len();
                self.strings.push(bytes);
                Ok(Expr::Str { id, len })
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.consume(&TokenKind::LParen) {
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.assign_expr()?);
                            if !self.consume(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(&TokenKind::RParen, "')' after arguments")?;
                    return Ok(Expr::Call { name, args });
                }
                Ok(Expr::Ident(name))
            }
            _ => Err(self.error("expected an expression")),
        }
    }

    // ----- token helpers ---------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind_at(&self, offset: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn advance(&mut self) {
        if self.tokens[self.pos].kind != TokenKind::Eof {
            self.pos += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            return true;
        }
        false
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<(), ParseError> {
        if self.consume(kind) {
            return Ok(());
        }
        Err(self.error(format!("expected {}", what)))
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(self.error(format!("expected an identifier, found {:?}", other))),
        }
    }

    fn expect_num(&mut self) -> Result<i64, ParseError> {
        match self.peek().kind {
            TokenKind::Num(value) => {
                self.advance();
                Ok(value)
            }
            _ => Err(self.error("expected a number")),
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            loc: self.peek().loc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        Parser::new(source).unwrap().parse_program().unwrap()
    }

    #[test]
    fn parse_simple_function() {
        let program = parse("int main() { return 0; }");
        assert_eq!(program.funcs.len(), 1);
        assert_eq!(program.funcs[0].name, "main");
        assert_eq!(program.funcs[0].params.len(), 0);
        assert_eq!(program.funcs[0].body.len(), 1);
    }

    #[test]
    fn parse_globals_and_externs() {
        let program = parse("int printf();\nint g1;\nint g2[4];\nint main() { return 0; }");
        assert_eq!(program.externs, vec!["printf".to_string()]);
        assert_eq!(program.globals.len(), 2);
        assert_eq!(program.globals[1].ty.size(), 16);
    }

    #[test]
    fn parenthesized_declarator_binds_inside_out() {
        let program = parse("int main() { int *x[3]; int (*y)[3]; return 0; }");
        let Stmt::Decl(items) = &program.funcs[0].body[0] else {
            panic!("expected declaration");
        };
        assert_eq!(items[0].ty.size(), 24); // array of 3 pointers
        let Stmt::Decl(items) = &program.funcs[0].body[1] else {
            panic!("expected declaration");
        };
        assert_eq!(items[0].ty.size(), 8); // pointer to array
        assert!(items[0].ty.is_pointer());
    }

    #[test]
    fn subscript_desugars_to_deref_add() {
        let program = parse("int main() { int x[2]; x[1]; 1[x]; return 0; }");
        let Stmt::Expr(expr) = &program.funcs[0].body[1] else {
            panic!("expected expression statement");
        };
        assert!(matches!(
            expr,
            Expr::Unary {
                op: UnOp::Deref,
                ..
            }
        ));
    }

    #[test]
    fn typedef_name_shadowed_by_variable() {
        // After `t t = 1;`, the spelling t is an expression again.
        let program = parse("int main() { typedef int t; t t = 1; t; return 0; }");
        let body = &program.funcs[0].body;
        assert!(matches!(body[1], Stmt::Decl(_)));
        assert!(matches!(body[2], Stmt::Expr(Expr::Ident(_))));
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let result = Parser::new("int main() { struct nope x; return 0; }")
            .unwrap()
            .parse_program();
        assert!(result.is_err());
    }

    #[test]
    fn tag_redefinition_in_same_scope_is_an_error() {
        let result = Parser::new("int main() { struct t {int a;}; struct t {int a; int b;}; }")
            .unwrap()
            .parse_program();
        assert!(result.is_err());
    }

    #[test]
    fn sizeof_type_vs_expression() {
        let program = parse("int main() { int x; sizeof(int); sizeof(x); sizeof x; return 0; }");
        let body = &program.funcs[0].body;
        assert!(matches!(body[1], Stmt::Expr(Expr::SizeofType(_))));
        assert!(matches!(body[2], Stmt::Expr(Expr::SizeofExpr(_))));
        assert!(matches!(body[3], Stmt::Expr(Expr::SizeofExpr(_))));
    }

    #[test]
    fn slots_cover_nested_blocks() {
        let program = parse("int main() { int x; { int y; { int z; } } return 0; }");
        assert_eq!(program.funcs[0].layout.slot_count(), 3);
    }
}
