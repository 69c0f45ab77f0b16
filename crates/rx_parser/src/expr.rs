//! Expression parsing.
//!
//! Precedence, loosest to tightest: `||`, `&&`, comparisons, `+ -`,
//! `* / %`, unary (`- ! * & &mut`), postfix (call, index, field).

use anyhow::Result;
use rx_ast::*;

use crate::tokenizer::TokenKind;
use crate::Parser;

impl<'a> Parser<'a> {
    /// Parse an expression, struct literals allowed.
    pub(crate) fn expr(&mut self) -> Result<Expr> {
        self.or_expr(false)
    }

    /// Parse an expression in condition position, where a brace starts the
    /// statement body rather than a struct literal.
    pub(crate) fn expr_no_struct(&mut self) -> Result<Expr> {
        self.or_expr(true)
    }

    fn or_expr(&mut self, no_struct: bool) -> Result<Expr> {
        let start = self.span_start();
        let mut lhs = self.and_expr(no_struct)?;
        while self.eat(&TokenKind::OrOr) {
            let rhs = self.and_expr(no_struct)?;
            lhs = self.mk_binary(BinaryOp::Or, lhs, rhs, start);
        }
        Ok(lhs)
    }

    fn and_expr(&mut self, no_struct: bool) -> Result<Expr> {
        let start = self.span_start();
        let mut lhs = self.cmp_expr(no_struct)?;
        while self.eat(&TokenKind::AndAnd) {
            let rhs = self.cmp_expr(no_struct)?;
            lhs = self.mk_binary(BinaryOp::And, lhs, rhs, start);
        }
        Ok(lhs)
    }

    fn cmp_expr(&mut self, no_struct: bool) -> Result<Expr> {
        let start = self.span_start();
        let mut lhs = self.add_expr(no_struct)?;
        loop {
            let op = match self.peek() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::Ne,
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.add_expr(no_struct)?;
            lhs = self.mk_binary(op, lhs, rhs, start);
        }
        Ok(lhs)
    }

    fn add_expr(&mut self, no_struct: bool) -> Result<Expr> {
        let start = self.span_start();
        let mut lhs = self.mul_expr(no_struct)?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.mul_expr(no_struct)?;
            lhs = self.mk_binary(op, lhs, rhs, start);
        }
        Ok(lhs)
    }

    fn mul_expr(&mut self, no_struct: bool) -> Result<Expr> {
        let start = self.span_start();
        let mut lhs = self.unary_expr(no_struct)?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => break,
            };
            self.advance();
            let rhs = self.unary_expr(no_struct)?;
            lhs = self.mk_binary(op, lhs, rhs, start);
        }
        Ok(lhs)
    }

    fn unary_expr(&mut self, no_struct: bool) -> Result<Expr> {
        let start = self.span_start();
        match self.peek() {
            TokenKind::Minus => {
                self.advance();
                let inner = self.unary_expr(no_struct)?;
                let span = start..self.prev_end();
                Ok(self.mk_expr(
                    ExprKind::Unary(UnaryExpr {
                        op: UnaryOp::Neg,
                        expr: Box::new(inner),
                    }),
                    span,
                ))
            }
            TokenKind::Not => {
                self.advance();
                let inner = self.unary_expr(no_struct)?;
                let span = start..self.prev_end();
                Ok(self.mk_expr(
                    ExprKind::Unary(UnaryExpr {
                        op: UnaryOp::Not,
                        expr: Box::new(inner),
                    }),
                    span,
                ))
            }
            TokenKind::Star => {
                self.advance();
                let inner = self.unary_expr(no_struct)?;
                let span = start..self.prev_end();
                Ok(self.mk_expr(ExprKind::Deref(Box::new(inner)), span))
            }
            TokenKind::Amp => {
                self.advance();
                let mutable = self.eat(&TokenKind::Mut);
                let inner = self.unary_expr(no_struct)?;
                let span = start..self.prev_end();
                Ok(self.mk_expr(
                    ExprKind::Ref {
                        mutable,
                        expr: Box::new(inner),
                    },
                    span,
                ))
            }
            _ => self.postfix_expr(no_struct),
        }
    }

    fn postfix_expr(&mut self, no_struct: bool) -> Result<Expr> {
        let start = self.span_start();
        let mut expr = self.primary_expr(no_struct)?;
        loop {
            match self.peek() {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.expr()?;
                    self.expect(&TokenKind::RBracket, "`]`")?;
                    let span = start..self.prev_end();
                    expr = self.mk_expr(
                        ExprKind::Index(IndexExpr {
                            base: Box::new(expr),
                            index: Box::new(index),
                        }),
                        span,
                    );
                }
                TokenKind::Dot => {
                    self.advance();
                    let member = match self.peek().clone() {
                        TokenKind::Ident(name) => {
                            self.advance();
                            FieldMember::Named(name)
                        }
                        TokenKind::Int(n) if n >= 0 => {
                            self.advance();
                            FieldMember::Index(n as usize)
                        }
                        _ => return Err(self.error_here("expected a field name or tuple index")),
                    };
                    let span = start..self.prev_end();
                    expr = self.mk_expr(
                        ExprKind::Field(FieldExpr {
                            base: Box::new(expr),
                            member,
                        }),
                        span,
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn primary_expr(&mut self, no_struct: bool) -> Result<Expr> {
        let start = self.span_start();
        match self.peek().clone() {
            TokenKind::Int(n) => {
                self.advance();
                let span = start..self.prev_end();
                Ok(self.mk_expr(ExprKind::Int(n), span))
            }
            TokenKind::True => {
                self.advance();
                let span = start..self.prev_end();
                Ok(self.mk_expr(ExprKind::Bool(true), span))
            }
            TokenKind::False => {
                self.advance();
                let span = start..self.prev_end();
                Ok(self.mk_expr(ExprKind::Bool(false), span))
            }
            TokenKind::Str(s) => {
                self.advance();
                let span = start..self.prev_end();
                Ok(self.mk_expr(ExprKind::Str(s), span))
            }
            TokenKind::Exit => {
                // `exit(e)` is keyword-called like a builtin function
                let tok = self.advance();
                let callee = Ident {
                    name: "exit".to_string(),
                    span: tok.span,
                };
                self.expect(&TokenKind::LParen, "`(` after `exit`")?;
                let args = self.call_args()?;
                let span = start..self.prev_end();
                Ok(self.mk_expr(ExprKind::Call(CallExpr { callee, args }), span))
            }
            TokenKind::Ident(name) => {
                let tok = self.advance();
                let ident = Ident {
                    name: name.clone(),
                    span: tok.span,
                };
                if *self.peek() == TokenKind::LParen {
                    self.advance();
                    let args = self.call_args()?;
                    let span = start..self.prev_end();
                    Ok(self.mk_expr(ExprKind::Call(CallExpr { callee: ident, args }), span))
                } else if *self.peek() == TokenKind::LBrace && !no_struct {
                    self.struct_lit(ident, start)
                } else {
                    let span = start..self.prev_end();
                    Ok(self.mk_expr(ExprKind::Var(name), span))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let first = self.expr()?;
                if self.eat(&TokenKind::Comma) {
                    let mut elems = vec![first];
                    while *self.peek() != TokenKind::RParen {
                        elems.push(self.expr()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(&TokenKind::RParen, "`)`")?;
                    let span = start..self.prev_end();
                    Ok(self.mk_expr(ExprKind::Tuple(elems), span))
                } else {
                    self.expect(&TokenKind::RParen, "`)`")?;
                    Ok(first)
                }
            }
            TokenKind::LBracket => {
                self.advance();
                let first = self.expr()?;
                if self.eat(&TokenKind::Semi) {
                    let len = self.array_len()?;
                    self.expect(&TokenKind::RBracket, "`]`")?;
                    let span = start..self.prev_end();
                    Ok(self.mk_expr(
                        ExprKind::Repeat(RepeatExpr {
                            elem: Box::new(first),
                            len,
                        }),
                        span,
                    ))
                } else {
                    let mut elems = vec![first];
                    while self.eat(&TokenKind::Comma) {
                        if *self.peek() == TokenKind::RBracket {
                            break;
                        }
                        elems.push(self.expr()?);
                    }
                    self.expect(&TokenKind::RBracket, "`]`")?;
                    let span = start..self.prev_end();
                    Ok(self.mk_expr(ExprKind::Array(elems), span))
                }
            }
            _ => Err(self.error_here("expected an expression")),
        }
    }

    fn call_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.eat(&TokenKind::RParen) {
            if !args.is_empty() {
                self.expect(&TokenKind::Comma, "`,` between arguments")?;
            }
            args.push(self.expr()?);
        }
        Ok(args)
    }

    fn struct_lit(&mut self, name: Ident, start: usize) -> Result<Expr> {
        self.expect(&TokenKind::LBrace, "`{`")?;
        let mut fields = Vec::new();
        while !self.eat(&TokenKind::RBrace) {
            if !fields.is_empty() {
                self.expect(&TokenKind::Comma, "`,` between field initializers")?;
                if self.eat(&TokenKind::RBrace) {
                    break;
                }
            }
            let fident = self.expect_ident("field name")?;
            self.expect(&TokenKind::Colon, "`:` after field name")?;
            let value = self.expr()?;
            fields.push((fident, value));
        }
        let span = start..self.prev_end();
        Ok(self.mk_expr(ExprKind::StructLit(StructLitExpr { name, fields }), span))
    }

    fn mk_binary(&mut self, op: BinaryOp, left: Expr, right: Expr, start: usize) -> Expr {
        let span = start..self.prev_end();
        self.mk_expr(
            ExprKind::Binary(BinaryExpr {
                op,
                left: Box::new(left),
                right: Box::new(right),
            }),
            span,
        )
    }
}
