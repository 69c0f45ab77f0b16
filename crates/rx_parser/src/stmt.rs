//! Statement and block parsing.

use anyhow::Result;
use rx_ast::*;

use crate::tokenizer::TokenKind;
use crate::Parser;

impl<'a> Parser<'a> {
    /// Parse a `{ ... }` block. The last expression of a block may omit its
    /// semicolon, making it the block's trailing value.
    pub(crate) fn block(&mut self) -> Result<Block> {
        let start = self.span_start();
        self.expect(&TokenKind::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        let mut tail = None;
        loop {
            match self.peek() {
                TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Let
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Loop
                | TokenKind::LBrace => stmts.push(self.stmt()?),
                TokenKind::Semi => {
                    // stray empty statement
                    self.advance();
                }
                _ => {
                    let sstart = self.span_start();
                    let expr = self.expr()?;
                    if self.eat(&TokenKind::Eq) {
                        let value = self.expr()?;
                        self.expect(&TokenKind::Semi, "`;` after assignment")?;
                        stmts.push(Stmt::Assign(AssignStmt {
                            target: expr,
                            value,
                            span: sstart..self.prev_end(),
                        }));
                    } else if self.eat(&TokenKind::Semi) {
                        stmts.push(Stmt::Expr(ExprStmt {
                            expr,
                            span: sstart..self.prev_end(),
                        }));
                    } else if *self.peek() == TokenKind::RBrace {
                        self.advance();
                        tail = Some(expr);
                        break;
                    } else {
                        return Err(self.error_here("expected `;` after expression"));
                    }
                }
            }
        }
        Ok(Block {
            stmts,
            tail,
            span: start..self.prev_end(),
        })
    }

    pub(crate) fn stmt(&mut self) -> Result<Stmt> {
        match self.peek() {
            TokenKind::Let => self.let_stmt(),
            TokenKind::Return => self.return_stmt(),
            TokenKind::Break => {
                let tok = self.advance();
                self.expect(&TokenKind::Semi, "`;` after `break`")?;
                Ok(Stmt::Break(tok.span))
            }
            TokenKind::Continue => {
                let tok = self.advance();
                self.expect(&TokenKind::Semi, "`;` after `continue`")?;
                Ok(Stmt::Continue(tok.span))
            }
            TokenKind::If => self.if_stmt(),
            TokenKind::While => self.while_stmt(),
            TokenKind::Loop => self.loop_stmt(),
            TokenKind::LBrace => Ok(Stmt::Block(self.block()?)),
            _ => Err(self.error_here("expected a statement")),
        }
    }

    fn let_stmt(&mut self) -> Result<Stmt> {
        let start = self.span_start();
        self.expect(&TokenKind::Let, "`let`")?;
        let mutable = self.eat(&TokenKind::Mut);
        let ident = self.expect_ident("binding name")?;
        let ty = if self.eat(&TokenKind::Colon) {
            Some(self.type_ref()?)
        } else {
            None
        };
        self.expect(&TokenKind::Eq, "`=` in let binding")?;
        let init = self.expr()?;
        self.expect(&TokenKind::Semi, "`;` after let binding")?;
        Ok(Stmt::Let(LetStmt {
            ident,
            mutable,
            ty,
            init,
            span: start..self.prev_end(),
        }))
    }

    fn return_stmt(&mut self) -> Result<Stmt> {
        let start = self.span_start();
        self.expect(&TokenKind::Return, "`return`")?;
        let arg = if *self.peek() == TokenKind::Semi {
            None
        } else {
            Some(self.expr()?)
        };
        self.expect(&TokenKind::Semi, "`;` after return")?;
        Ok(Stmt::Return(ReturnStmt {
            arg,
            span: start..self.prev_end(),
        }))
    }

    fn if_stmt(&mut self) -> Result<Stmt> {
        let start = self.span_start();
        self.expect(&TokenKind::If, "`if`")?;
        // Struct literals are not allowed in condition position, so that
        // `if p { ... }` reads `p` as the condition, not `p { ... }`.
        let cond = self.expr_no_struct()?;
        let then_block = self.block()?;
        let else_branch = if self.eat(&TokenKind::Else) {
            if *self.peek() == TokenKind::If {
                Some(Box::new(self.if_stmt()?))
            } else {
                Some(Box::new(Stmt::Block(self.block()?)))
            }
        } else {
            None
        };
        Ok(Stmt::If(IfStmt {
            cond,
            then_block,
            else_branch,
            span: start..self.prev_end(),
        }))
    }

    fn while_stmt(&mut self) -> Result<Stmt> {
        let start = self.span_start();
        self.expect(&TokenKind::While, "`while`")?;
        let cond = self.expr_no_struct()?;
        let body = self.block()?;
        Ok(Stmt::While(WhileStmt {
            cond,
            body,
            span: start..self.prev_end(),
        }))
    }

    fn loop_stmt(&mut self) -> Result<Stmt> {
        let start = self.span_start();
        self.expect(&TokenKind::Loop, "`loop`")?;
        let body = self.block()?;
        Ok(Stmt::Loop(LoopStmt {
            body,
            span: start..self.prev_end(),
        }))
    }
}
