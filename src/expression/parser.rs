use crate::expression::ast::{BinaryOp, Expr};
use crate::expression::error::FormulaError;
use crate::expression::lexer::{Token, TokenKind, lex};

/// Deepest nesting of groups, calls, conditionals and unary/power chains a formula may use.
pub(crate) const MAX_NESTING: usize = 256;

/// Parse a whole formula.
///
/// Precedence from loosest: `?:`, `||`, `&&`, `== !=`, `< <= > >=`, `+ -`, `* / %`, unary sign,
/// `^`. Binary operators are left-associative except `^` and `?:`.
pub(crate) fn parse_expr(src: &str) -> Result<Expr, FormulaError> {
    let mut p = Parser {
        tokens: lex(src)?,
        pos: 0,
        depth: 0,
    };
    let expr = p.conditional()?;
    match &p.peek().kind {
        TokenKind::End => Ok(expr),
        other => Err(FormulaError::new(p.peek().at, format!("unexpected {other:?} after formula"))),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

fn infix(kind: &TokenKind) -> Option<(BinaryOp, u8)> {
    Some(match kind {
        TokenKind::Or => (BinaryOp::Or, 1),
        TokenKind::And => (BinaryOp::And, 2),
        TokenKind::Eq => (BinaryOp::Eq, 3),
        TokenKind::Ne => (BinaryOp::Ne, 3),
        TokenKind::Lt => (BinaryOp::Lt, 4),
        TokenKind::Le => (BinaryOp::Le, 4),
        TokenKind::Gt => (BinaryOp::Gt, 4),
        TokenKind::Ge => (BinaryOp::Ge, 4),
        TokenKind::Plus => (BinaryOp::Add, 5),
        TokenKind::Minus => (BinaryOp::Sub, 5),
        TokenKind::Star => (BinaryOp::Mul, 6),
        TokenKind::Slash => (BinaryOp::Div, 6),
        TokenKind::Percent => (BinaryOp::Mod, 6),
        _ => return None,
    })
}

impl Parser {
    fn peek(&self) -> &Token {
        // `lex` always terminates the list with `End`.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn next(&mut self) -> Token {
        let t = self.peek().clone();
        self.pos += 1;
        t
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        let hit = &self.peek().kind == kind;
        if hit {
            self.pos += 1;
        }
        hit
    }

    fn require(&mut self, kind: TokenKind, what: &str) -> Result<(), FormulaError> {
        if self.eat(&kind) {
            Ok(())
        } else {
            Err(FormulaError::new(self.peek().at, format!("expected {what}")))
        }
    }

    /// Run `rule` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested(
        &mut self,
        rule: impl FnOnce(&mut Self) -> Result<Expr, FormulaError>,
    ) -> Result<Expr, FormulaError> {
        if self.depth >= MAX_NESTING {
            return Err(FormulaError::new(self.peek().at, "formula nests too deeply"));
        }
        self.depth += 1;
        let out = rule(self);
        self.depth -= 1;
        out
    }

    fn conditional(&mut self) -> Result<Expr, FormulaError> {
        self.nested(Self::conditional_inner)
    }

    fn conditional_inner(&mut self) -> Result<Expr, FormulaError> {
        let test = self.binary(1)?;
        if !self.eat(&TokenKind::Question) {
            return Ok(test);
        }
        let then = self.conditional()?;
        self.require(TokenKind::Colon, "':'")?;
        let other = self.conditional()?;
        Ok(Expr::Cond {
            test: Box::new(test),
            then: Box::new(then),
            other: Box::new(other),
        })
    }

    fn binary(&mut self, min_prec: u8) -> Result<Expr, FormulaError> {
        let mut left = self.unary()?;
        while let Some((op, prec)) = infix(&self.peek().kind) {
            if prec < min_prec {
                break;
            }
            self.pos += 1;
            let right = self.binary(prec + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        self.nested(Self::unary_inner)
    }

    fn unary_inner(&mut self) -> Result<Expr, FormulaError> {
        if self.eat(&TokenKind::Minus) {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        if self.eat(&TokenKind::Plus) {
            return self.unary();
        }
        let base = self.primary()?;
        if self.eat(&TokenKind::Caret) {
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(self.unary()?),
            });
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        let Token { kind, at } = self.next();
        match kind {
            TokenKind::Number(v) => Ok(Expr::Num(v)),
            TokenKind::Name(name) if self.eat(&TokenKind::Open) => Ok(Expr::Call {
                func: name,
                args: self.arguments()?,
                at,
            }),
            TokenKind::Name(name) => Ok(Expr::Name { name, at }),
            TokenKind::Open => {
                let inner = self.conditional()?;
                self.require(TokenKind::Close, "')'")?;
                Ok(inner)
            }
            TokenKind::End => Err(FormulaError::new(at, "formula ends early")),
            other => Err(FormulaError::new(at, format!("unexpected {other:?}"))),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, FormulaError> {
        let mut args = Vec::new();
        if self.eat(&TokenKind::Close) {
            return Ok(args);
        }
        loop {
            args.push(self.conditional()?);
            if self.eat(&TokenKind::Close) {
                return Ok(args);
            }
            self.require(TokenKind::Comma, "',' or ')'")?;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/parser.rs"]
mod tests;
