//! Type syntax parsing.

use anyhow::Result;
use rx_ast::TypeRef;

use crate::tokenizer::TokenKind;
use crate::Parser;

impl<'a> Parser<'a> {
    /// Parse a type: `i64`, `bool`, `&[mut] T`, `[T; N]`, `(T, ...)`, or a
    /// struct name.
    pub(crate) fn type_ref(&mut self) -> Result<TypeRef> {
        match self.peek().clone() {
            TokenKind::Amp => {
                self.advance();
                let mutable = self.eat(&TokenKind::Mut);
                let inner = self.type_ref()?;
                Ok(TypeRef::Ref {
                    mutable,
                    inner: Box::new(inner),
                })
            }
            TokenKind::LBracket => {
                self.advance();
                let elem = self.type_ref()?;
                self.expect(&TokenKind::Semi, "`;` in array type")?;
                let len = self.array_len()?;
                self.expect(&TokenKind::RBracket, "`]`")?;
                Ok(TypeRef::Array(Box::new(elem), len))
            }
            TokenKind::LParen => {
                self.advance();
                if self.eat(&TokenKind::RParen) {
                    return Ok(TypeRef::Unit);
                }
                let mut fields = vec![self.type_ref()?];
                while self.eat(&TokenKind::Comma) {
                    if *self.peek() == TokenKind::RParen {
                        break;
                    }
                    fields.push(self.type_ref()?);
                }
                self.expect(&TokenKind::RParen, "`)`")?;
                if fields.len() == 1 {
                    // `(T)` is just parenthesized T
                    Ok(fields.pop().unwrap())
                } else {
                    Ok(TypeRef::Tuple(fields))
                }
            }
            TokenKind::Ident(name) => {
                self.advance();
                match name.as_str() {
                    "i64" => Ok(TypeRef::I64),
                    "bool" => Ok(TypeRef::Bool),
                    _ => Ok(TypeRef::Named(name)),
                }
            }
            _ => Err(self.error_here("expected a type")),
        }
    }

    /// Parse a non-negative array length literal.
    pub(crate) fn array_len(&mut self) -> Result<usize> {
        match *self.peek() {
            TokenKind::Int(n) if n >= 0 => {
                self.advance();
                Ok(n as usize)
            }
            _ => Err(self.error_here("expected an array length literal")),
        }
    }
}
