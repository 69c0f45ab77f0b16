//! RX Parser
//!
//! This crate implements a hand-written recursive-descent parser for the RX
//! language. It takes a string input and produces an `rx_ast::Module`.
//! Lexing happens up front (`tokenizer::tokenize`); the parser walks the
//! token stream with single-token lookahead and stamps every expression
//! node with a fresh `NodeId`.

use anyhow::{anyhow, bail, Result};
use rx_ast::*;

pub mod tokenizer;

mod expr;
mod stmt;
mod types;

use tokenizer::{line_col, tokenize, Token, TokenKind};

/// Parse a string into an RX AST Module.
pub fn parse_module(input: &str) -> Result<Module> {
    let tokens = tokenize(input);
    let mut parser = Parser::new(input, tokens);
    parser.module()
}

/// Parser state: the token stream, a cursor, and the expression id counter.
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    next_id: NodeId,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        Parser {
            source,
            tokens,
            pos: 0,
            next_id: 0,
        }
    }

    // --- Token stream helpers ---

    pub(crate) fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    pub(crate) fn peek_token(&self) -> &Token {
        &self.tokens[self.pos]
    }

    pub(crate) fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// Consume the next token if it matches `kind`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the next token, failing with a positioned message if it does
    /// not match `kind`.
    pub(crate) fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token> {
        if self.peek() == kind {
            Ok(self.advance())
        } else {
            Err(self.error_here(&format!("expected {}", what)))
        }
    }

    /// Consume an identifier token.
    pub(crate) fn expect_ident(&mut self, what: &str) -> Result<Ident> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                let tok = self.advance();
                Ok(Ident {
                    name,
                    span: tok.span,
                })
            }
            _ => Err(self.error_here(&format!("expected {}", what))),
        }
    }

    pub(crate) fn fresh_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn mk_expr(&mut self, kind: ExprKind, span: Span) -> Expr {
        Expr {
            id: self.fresh_id(),
            kind,
            span,
        }
    }

    /// Span start of the next token.
    pub(crate) fn span_start(&self) -> usize {
        self.peek_token().span.start
    }

    /// Span end of the most recently consumed token.
    pub(crate) fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    pub(crate) fn error_here(&self, msg: &str) -> anyhow::Error {
        let tok = self.peek_token();
        let (line, col) = line_col(self.source, tok.span.start);
        let found = match &tok.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("`{}`", tok.text),
        };
        anyhow!("{}:{}: {}, found {}", line, col, msg, found)
    }

    // --- Items ---

    fn module(&mut self) -> Result<Module> {
        let start = self.span_start();
        let mut items = Vec::new();
        loop {
            match self.peek() {
                TokenKind::Eof => break,
                TokenKind::Fn => items.push(Item::Fn(self.fn_decl()?)),
                TokenKind::Struct => items.push(Item::Struct(self.struct_decl()?)),
                _ => bail!(self.error_here("expected `fn` or `struct` at top level")),
            }
        }
        Ok(Module {
            items,
            span: start..self.prev_end(),
        })
    }

    fn fn_decl(&mut self) -> Result<FnDecl> {
        let start = self.span_start();
        self.expect(&TokenKind::Fn, "`fn`")?;
        let ident = self.expect_ident("function name")?;
        self.expect(&TokenKind::LParen, "`(`")?;
        let mut params = Vec::new();
        while !self.eat(&TokenKind::RParen) {
            if !params.is_empty() {
                self.expect(&TokenKind::Comma, "`,` between parameters")?;
            }
            params.push(self.param()?);
        }
        let return_type = if self.eat(&TokenKind::Arrow) {
            Some(self.type_ref()?)
        } else {
            None
        };
        let body = self.block()?;
        Ok(FnDecl {
            ident,
            params,
            return_type,
            body,
            span: start..self.prev_end(),
        })
    }

    fn param(&mut self) -> Result<Param> {
        let start = self.span_start();
        let mutable = self.eat(&TokenKind::Mut);
        let ident = self.expect_ident("parameter name")?;
        self.expect(&TokenKind::Colon, "`:` after parameter name")?;
        let ty = self.type_ref()?;
        Ok(Param {
            ident,
            ty,
            mutable,
            span: start..self.prev_end(),
        })
    }

    fn struct_decl(&mut self) -> Result<StructDecl> {
        let start = self.span_start();
        self.expect(&TokenKind::Struct, "`struct`")?;
        let ident = self.expect_ident("struct name")?;
        self.expect(&TokenKind::LBrace, "`{`")?;
        let mut fields = Vec::new();
        while !self.eat(&TokenKind::RBrace) {
            if !fields.is_empty() {
                self.expect(&TokenKind::Comma, "`,` between fields")?;
                // allow a trailing comma before `}`
                if self.eat(&TokenKind::RBrace) {
                    break;
                }
            }
            let fstart = self.span_start();
            let fident = self.expect_ident("field name")?;
            self.expect(&TokenKind::Colon, "`:` after field name")?;
            let fty = self.type_ref()?;
            fields.push(FieldDecl {
                ident: fident,
                ty: fty,
                span: fstart..self.prev_end(),
            });
        }
        Ok(StructDecl {
            ident,
            fields,
            span: start..self.prev_end(),
        })
    }
}
