//! Recursive descent parser with precedence climbing for expressions.

use std::collections::HashSet;

use crate::ast::{BinaryOp, Decl, Expr, Field, File, Ident, ImportSpec, LetClause, UnaryOp};
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::token::{Span, Token, TokenKind};

/// Deepest nesting of expressions, fields and operator chains a source may
/// contain.
pub const MAX_DEPTH: usize = 256;

/// Parse `text` as a complete file.
pub fn parse_file(name: &str, text: &str) -> Result<File, ParseError> {
    let tokens = Lexer::new(name, text).tokenize()?;
    let mut parser = Parser::new(name, tokens);
    let (decls, imports) = parser.parse_file_body()?;
    let unresolved = unresolved_idents(&decls);
    Ok(File {
        name: name.to_string(),
        decls,
        imports,
        unresolved,
    })
}

/// Parse `text` as a single standalone expression.
pub fn parse_expr(name: &str, text: &str) -> Result<Expr, ParseError> {
    let tokens = Lexer::new(name, text).tokenize()?;
    let mut parser = Parser::new(name, tokens);
    parser.skip_newlines();
    let expr = parser.parse_expr()?;
    parser.skip_newlines();
    parser.expect_eof("end of expression")?;
    Ok(expr)
}

/// Whether `text` starts like a declaration (`label: ...`, `let x = ...` or
/// `import "..."`) rather than an expression.
///
/// Text that does not even tokenize is reported as not a declaration.
pub fn looks_like_declaration(text: &str) -> bool {
    let Ok(tokens) = Lexer::new("", text).tokenize() else {
        return false;
    };
    let mut significant = tokens.iter().filter(|t| t.kind != TokenKind::Newline);
    match significant.next().map(|t| &t.kind) {
        Some(TokenKind::Import) | Some(TokenKind::Let) => true,
        Some(TokenKind::Ident(_)) | Some(TokenKind::Str(_)) | Some(TokenKind::KindName(_)) => {
            matches!(significant.next().map(|t| &t.kind), Some(TokenKind::Colon))
        }
        _ => false,
    }
}

struct Parser<'a> {
    file: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(file: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            file,
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn current(&self) -> &Token {
        // The lexer guarantees a trailing Eof, so the last token is always valid.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_nth(&self, n: usize) -> &TokenKind {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)].kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline) {
            self.advance();
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let tok = self.current();
        ParseError::Unexpected {
            file: self.file.to_string(),
            found: tok.kind.to_string(),
            expected: expected.to_string(),
            span: tok.span,
        }
    }

    /// Go one level deeper. The caller steps back out once the nested part
    /// is parsed.
    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::TooDeep {
                file: self.file.to_string(),
                limit: MAX_DEPTH,
                span: self.current().span,
            });
        }
        Ok(())
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_eof(&mut self, expected: &str) -> Result<(), ParseError> {
        if matches!(self.peek_kind(), TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    // ── Declarations ──

    fn parse_file_body(&mut self) -> Result<(Vec<Decl>, Vec<ImportSpec>), ParseError> {
        let mut decls = Vec::new();
        let mut imports = Vec::new();
        loop {
            self.skip_separators();
            match self.peek_kind() {
                TokenKind::Eof => break,
                TokenKind::Import => imports.push(self.parse_import()?),
                _ => decls.push(self.parse_decl()?),
            }
            self.expect_separator(&TokenKind::Eof)?;
        }
        Ok((decls, imports))
    }

    fn parse_struct_body(&mut self) -> Result<Vec<Decl>, ParseError> {
        let mut decls = Vec::new();
        loop {
            self.skip_separators();
            if matches!(self.peek_kind(), TokenKind::RBrace) {
                self.advance();
                return Ok(decls);
            }
            if matches!(self.peek_kind(), TokenKind::Eof) {
                return Err(self.unexpected("'}'"));
            }
            decls.push(self.parse_decl()?);
            self.expect_separator(&TokenKind::RBrace)?;
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Comma) {
            self.advance();
        }
    }

    /// After a declaration: a newline, a comma, or the closing token.
    fn expect_separator(&mut self, close: &TokenKind) -> Result<(), ParseError> {
        match self.peek_kind() {
            TokenKind::Newline | TokenKind::Comma => Ok(()),
            kind if kind == close => Ok(()),
            _ => Err(self.unexpected("newline or ','")),
        }
    }

    fn parse_import(&mut self) -> Result<ImportSpec, ParseError> {
        let span = self.expect(&TokenKind::Import, "'import'")?.span;
        let alias = match self.peek_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Some(name)
            }
            _ => None,
        };
        match self.peek_kind().clone() {
            TokenKind::Str(path) => {
                self.advance();
                Ok(ImportSpec { alias, path, span })
            }
            _ => Err(self.unexpected("import path string")),
        }
    }

    fn parse_decl(&mut self) -> Result<Decl, ParseError> {
        match self.peek_kind() {
            TokenKind::Let => self.parse_let(),
            TokenKind::Import => Err(self.unexpected("declaration (imports belong at file level)")),
            _ => Ok(Decl::Field(self.parse_field()?)),
        }
    }

    fn parse_let(&mut self) -> Result<Decl, ParseError> {
        let span = self.expect(&TokenKind::Let, "'let'")?.span;
        let name = match self.peek_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                name
            }
            _ => return Err(self.unexpected("identifier")),
        };
        self.expect(&TokenKind::Assign, "'='")?;
        let value = self.parse_expr()?;
        Ok(Decl::Let(LetClause { name, value, span }))
    }

    fn parse_label(&mut self) -> Result<(String, Span), ParseError> {
        let tok = self.current().clone();
        let label = match tok.kind {
            TokenKind::Ident(name) | TokenKind::Str(name) => name,
            TokenKind::KindName(kind) => kind.to_string(),
            _ => return Err(self.unexpected("label")),
        };
        self.advance();
        Ok((label, tok.span))
    }

    /// `a: b: c: expr` nests each further label in its own struct.
    fn parse_field(&mut self) -> Result<Field, ParseError> {
        self.enter()?;
        let (label, span) = self.parse_label()?;
        self.expect(&TokenKind::Colon, "':'")?;

        let is_nested_label = matches!(
            self.peek_kind(),
            TokenKind::Ident(_) | TokenKind::Str(_) | TokenKind::KindName(_)
        ) && matches!(self.peek_nth(1), TokenKind::Colon);

        let value = if is_nested_label {
            Expr::Struct(vec![Decl::Field(self.parse_field()?)])
        } else {
            self.parse_expr()?
        };
        self.depth -= 1;
        Ok(Field { label, value, span })
    }

    // ── Expressions ──

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(1)
    }

    fn binary_op(&self) -> Option<BinaryOp> {
        let op = match self.peek_kind() {
            TokenKind::Amp => BinaryOp::Unify,
            TokenKind::OrOr => BinaryOp::Or,
            TokenKind::AndAnd => BinaryOp::And,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::NotEq,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Le => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Ge => BinaryOp::Ge,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            _ => return None,
        };
        Some(op)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        let outer = self.depth;
        while let Some(op) = self.binary_op() {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.enter()?;
            self.advance();
            self.skip_newlines();
            let rhs = self.parse_binary(prec + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        self.depth = outer;
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => {
                let expr = self.parse_postfix()?;
                self.depth -= 1;
                return Ok(expr);
            }
        };
        self.advance();
        let expr = self.parse_unary()?;
        self.depth -= 1;
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        let outer = self.depth;
        loop {
            if matches!(
                self.peek_kind(),
                TokenKind::Dot | TokenKind::LBracket | TokenKind::LParen
            ) {
                self.enter()?;
            }
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let (label, _) = self.parse_label()?;
                    expr = Expr::Selector {
                        expr: Box::new(expr),
                        label,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    self.skip_newlines();
                    let index = self.parse_expr()?;
                    self.skip_newlines();
                    self.expect(&TokenKind::RBracket, "']'")?;
                    expr = Expr::Index {
                        expr: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_list_items(&TokenKind::RParen, "')'")?;
                    expr = Expr::Call {
                        func: Box::new(expr),
                        args,
                    };
                }
                _ => {
                    self.depth = outer;
                    return Ok(expr);
                }
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let tok = self.current().clone();
        let expr = match tok.kind {
            TokenKind::Top => Expr::Top,
            TokenKind::Bottom(message) => Expr::Bottom(message),
            TokenKind::Null => Expr::Null,
            TokenKind::True => Expr::Bool(true),
            TokenKind::False => Expr::Bool(false),
            TokenKind::Int(n) => Expr::Int(n),
            TokenKind::Float(n) => Expr::Float(n),
            TokenKind::Str(s) => Expr::Str(s),
            TokenKind::KindName(k) => Expr::Kind(k),
            TokenKind::Ident(name) => Expr::Ident(Ident {
                name,
                span: tok.span,
            }),
            TokenKind::LParen => {
                self.advance();
                self.skip_newlines();
                let inner = self.parse_expr()?;
                self.skip_newlines();
                self.expect(&TokenKind::RParen, "')'")?;
                return Ok(inner);
            }
            TokenKind::LBrace => {
                self.advance();
                return Ok(Expr::Struct(self.parse_struct_body()?));
            }
            TokenKind::LBracket => {
                self.advance();
                let items = self.parse_list_items(&TokenKind::RBracket, "']'")?;
                return Ok(Expr::List(items));
            }
            _ => return Err(self.unexpected("expression")),
        };
        self.advance();
        Ok(expr)
    }

    /// Comma separated expressions up to `close`; newlines are insignificant.
    fn parse_list_items(&mut self, close: &TokenKind, expected: &str) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        loop {
            self.skip_newlines();
            if self.peek_kind() == close {
                self.advance();
                return Ok(items);
            }
            items.push(self.parse_expr()?);
            self.skip_newlines();
            match self.peek_kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                kind if kind == close => {}
                _ => return Err(self.unexpected(expected)),
            }
        }
    }
}

// ── Unresolved identifiers ──

/// Identifiers in `decls` not bound by any enclosing struct or `let`.
///
/// Each name is reported once, at its first occurrence.
fn unresolved_idents(decls: &[Decl]) -> Vec<Ident> {
    let mut scopes = Vec::new();
    let mut out = Vec::new();
    collect_decls(decls, &mut scopes, &mut out);
    out
}

/// Identifiers in a standalone expression not bound inside it.
pub fn expr_unresolved(expr: &Expr) -> Vec<Ident> {
    let mut scopes = Vec::new();
    let mut out = Vec::new();
    collect_expr(expr, &mut scopes, &mut out);
    out
}

fn scope_of(decls: &[Decl]) -> HashSet<String> {
    decls
        .iter()
        .map(|decl| match decl {
            Decl::Field(field) => field.label.clone(),
            Decl::Let(clause) => clause.name.clone(),
        })
        .collect()
}

fn collect_decls(decls: &[Decl], scopes: &mut Vec<HashSet<String>>, out: &mut Vec<Ident>) {
    scopes.push(scope_of(decls));
    for decl in decls {
        match decl {
            Decl::Field(field) => collect_expr(&field.value, scopes, out),
            Decl::Let(clause) => collect_expr(&clause.value, scopes, out),
        }
    }
    scopes.pop();
}

fn collect_expr(expr: &Expr, scopes: &mut Vec<HashSet<String>>, out: &mut Vec<Ident>) {
    match expr {
        Expr::Ident(ident) => {
            let bound = scopes.iter().any(|scope| scope.contains(&ident.name));
            if !bound && !out.iter().any(|seen| seen.name == ident.name) {
                out.push(ident.clone());
            }
        }
        Expr::Struct(decls) => collect_decls(decls, scopes, out),
        Expr::List(items) => {
            for item in items {
                collect_expr(item, scopes, out);
            }
        }
        Expr::Unary { expr, .. } | Expr::Selector { expr, .. } => collect_expr(expr, scopes, out),
        Expr::Binary { lhs, rhs, .. } => {
            collect_expr(lhs, scopes, out);
            collect_expr(rhs, scopes, out);
        }
        Expr::Index { expr, index } => {
            collect_expr(expr, scopes, out);
            collect_expr(index, scopes, out);
        }
        Expr::Call { func, args } => {
            collect_expr(func, scopes, out);
            for arg in args {
                collect_expr(arg, scopes, out);
            }
        }
        Expr::Top
        | Expr::Bottom(_)
        | Expr::Null
        | Expr::Bool(_)
        | Expr::Int(_)
        | Expr::Float(_)
        | Expr::Str(_)
        | Expr::Kind(_) => {}
    }
}
