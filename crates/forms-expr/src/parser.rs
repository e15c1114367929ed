//! Recursive-descent parser for the formula language.
//!
//! Precedence, loosest first: `?:`, `||`, `&&`, `== !=`, `< <= > >=`,
//! `+ -`, `* / %`, unary `- !`, calls and primaries.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{EvalError, Limit};
use crate::lexer::{Spanned, Token, tokenize};

/// Default cap on parser recursion depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Parses a formula with the default depth cap.
pub fn parse(src: &str) -> Result<Expr, EvalError> {
    parse_with_depth(src, DEFAULT_MAX_DEPTH)
}

/// Parses a formula, failing with [`Limit::Depth`] past `max_depth` levels
/// of nesting.
pub fn parse_with_depth(src: &str, max_depth: usize) -> Result<Expr, EvalError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        max_depth,
    };
    let expr = parser.expression()?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        other => Err(EvalError::syntax(
            parser.position(),
            format!("unexpected {}", other.describe()),
        )),
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].token
    }

    fn position(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].position
    }

    fn advance(&mut self) -> Spanned {
        let t = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), EvalError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(EvalError::syntax(
                self.position(),
                format!("expected {}, found {}", what, self.peek().describe()),
            ))
        }
    }

    fn enter(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(EvalError::EvaluationLimitExceeded(Limit::Depth(self.max_depth)));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expression(&mut self) -> Result<Expr, EvalError> {
        self.enter()?;
        let result = self.conditional();
        self.leave();
        result
    }

    fn conditional(&mut self) -> Result<Expr, EvalError> {
        let cond = self.binary(0)?;
        if !self.eat(&Token::Question) {
            return Ok(cond);
        }
        let then = self.expression()?;
        self.expect(Token::Colon, "':'")?;
        let otherwise = self.expression()?;
        Ok(Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    /// Precedence climbing over the left-associative binary levels.
    ///
    /// Every fold deepens the left spine of the tree, so each one counts as
    /// a level of nesting until the whole chain is built.
    fn binary(&mut self, level: usize) -> Result<Expr, EvalError> {
        if level == LEVELS.len() {
            return self.unary();
        }
        let mut folds = 0;
        let result = self.fold_chain(level, &mut folds);
        self.depth -= folds;
        result
    }

    fn fold_chain(&mut self, level: usize, folds: &mut usize) -> Result<Expr, EvalError> {
        let mut lhs = self.binary(level + 1)?;
        while let Some(op) = match_level(level, self.peek()) {
            *folds += 1;
            self.enter()?;
            self.advance();
            let rhs = self.binary(level + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Neg,
            Token::Bang => UnaryOp::Not,
            _ => return self.primary(),
        };
        self.advance();
        self.enter()?;
        let operand = self.unary();
        self.leave();
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand?),
        })
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        let Spanned { token, position } = self.advance();
        match token {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                "null" => Ok(Expr::Null),
                _ if self.peek() == &Token::LParen => {
                    self.advance();
                    let args = self.arguments()?;
                    Ok(Expr::Call {
                        name,
                        args,
                        position,
                    })
                }
                _ => Ok(Expr::Ident { name, position }),
            },
            Token::LParen => {
                let inner = self.expression()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(EvalError::syntax(
                position,
                format!("unexpected {}", other.describe()),
            )),
        }
    }

    /// Parses `arg, arg, ... )` after the opening parenthesis.
    fn arguments(&mut self) -> Result<Vec<Expr>, EvalError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(Token::RParen, "',' or ')'")?;
            return Ok(args);
        }
    }
}

/// Binary precedence levels, loosest first.
const LEVELS: &[&[(Token, BinaryOp)]] = &[
    &[(Token::OrOr, BinaryOp::Or)],
    &[(Token::AndAnd, BinaryOp::And)],
    &[(Token::EqEq, BinaryOp::Eq), (Token::NotEq, BinaryOp::NotEq)],
    &[
        (Token::Lt, BinaryOp::Lt),
        (Token::Le, BinaryOp::Le),
        (Token::Gt, BinaryOp::Gt),
        (Token::Ge, BinaryOp::Ge),
    ],
    &[(Token::Plus, BinaryOp::Add), (Token::Minus, BinaryOp::Sub)],
    &[
        (Token::Star, BinaryOp::Mul),
        (Token::Slash, BinaryOp::Div),
        (Token::Percent, BinaryOp::Rem),
    ],
];

fn match_level(level: usize, token: &Token) -> Option<BinaryOp> {
    LEVELS[level]
        .iter()
        .find(|(t, _)| t == token)
        .map(|(_, op)| *op)
}
