//! Two-pass `if-feature` compiler.
//!
//! Pass 1 tokenizes and validates operator/operand balance and parentheses.
//! Pass 2 scans the tokens right to left, shunting operators through an
//! explicit stack so that the nesting depth is bounded by the input length
//! and not by recursion.

use thiserror::Error;

use super::{Opcode, set_opcode};
use crate::parser::{SyntaxError, split_qualified, whitespace_len};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IfFeatureError {
    #[error("{0}")]
    Syntax(#[from] SyntaxError),
    #[error("unbalanced parentheses at offset {0}")]
    Unbalanced(usize),
    #[error("missing operand at offset {0}")]
    MissingOperand(usize),
    #[error("unexpected {found} at offset {offset}")]
    Unexpected { offset: usize, found: &'static str },
    #[error("empty if-feature expression")]
    Empty,
    #[error("if-feature expressions beyond a single feature require YANG 1.1")]
    RequiresExtended,
}

/// Result of compiling one expression, borrowing feature names from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledExpr<'a> {
    pub packed: Vec<u8>,
    pub len: usize,
    /// `[prefix:]name` of each feature slot, in slot order.
    pub features: Vec<&'a str>,
}

impl CompiledExpr<'_> {
    pub fn opcode(&self, pos: usize) -> Opcode {
        super::get_opcode(&self.packed, pos)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    LParen,
    RParen,
    Not,
    And,
    Or,
    Feature(&'a str),
}

impl Token<'_> {
    fn describe(&self) -> &'static str {
        match self {
            Token::LParen => "'('",
            Token::RParen => "')'",
            Token::Not => "'not'",
            Token::And => "'and'",
            Token::Or => "'or'",
            Token::Feature(_) => "feature name",
        }
    }
}

/// Operator stack entries. The discriminants double as binding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum StackOp {
    Not = 0,
    And = 1,
    Or = 2,
    RParen = 3,
}

fn tokenize(text: &str) -> Result<Vec<(usize, Token<'_>)>, IfFeatureError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    loop {
        pos += whitespace_len(&text[pos..]);
        let Some(&b) = bytes.get(pos) else {
            break;
        };
        match b {
            b'(' => {
                tokens.push((pos, Token::LParen));
                pos += 1;
                continue;
            }
            b')' => {
                tokens.push((pos, Token::RParen));
                pos += 1;
                continue;
            }
            _ => {}
        }

        let start = pos;
        let len = bytes[start..]
            .iter()
            .take_while(|b| !b.is_ascii_whitespace() && **b != b'(' && **b != b')')
            .count();
        let word = &text[start..start + len];
        pos += len;

        // A keyword needs whitespace after it; "notify" is a feature name.
        let followed_by_space = bytes.get(pos).is_none_or(u8::is_ascii_whitespace);
        let keyword = match word {
            "not" if followed_by_space => Some(Token::Not),
            "and" if followed_by_space => Some(Token::And),
            "or" if followed_by_space => Some(Token::Or),
            _ => None,
        };
        match keyword {
            Some(token) => {
                if text[pos..].trim_start().is_empty() {
                    return Err(IfFeatureError::MissingOperand(text.len()));
                }
                tokens.push((start, token));
            }
            None => {
                split_qualified(word).map_err(|e| e.shifted(start))?;
                tokens.push((start, Token::Feature(word)));
            }
        }
    }
    Ok(tokens)
}

/// Pass 1: grammar check, returning the number of feature operands.
fn validate(text: &str, tokens: &[(usize, Token<'_>)]) -> Result<usize, IfFeatureError> {
    let mut depth = 0usize;
    let mut expect_operand = true;
    let mut operands = 0;
    for &(offset, token) in tokens {
        match (expect_operand, token) {
            (true, Token::LParen) => depth += 1,
            (true, Token::Not) => {}
            (true, Token::Feature(_)) => {
                operands += 1;
                expect_operand = false;
            }
            (false, Token::RParen) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(IfFeatureError::Unbalanced(offset))?;
            }
            (false, Token::And | Token::Or) => expect_operand = true,
            (_, found) => {
                return Err(IfFeatureError::Unexpected {
                    offset,
                    found: found.describe(),
                });
            }
        }
    }
    if tokens.is_empty() {
        return Err(IfFeatureError::Empty);
    }
    if expect_operand {
        return Err(IfFeatureError::MissingOperand(text.len()));
    }
    if depth != 0 {
        return Err(IfFeatureError::Unbalanced(text.len()));
    }
    Ok(operands)
}

/// Compile one `if-feature` argument.
///
/// `extended` allows the YANG 1.1 expression syntax; without it only a single
/// feature name is accepted.
pub fn compile(text: &str, extended: bool) -> Result<CompiledExpr<'_>, IfFeatureError> {
    let tokens = tokenize(text)?;
    let operands = validate(text, &tokens)?;
    if !extended && tokens.len() > 1 {
        return Err(IfFeatureError::RequiresExtended);
    }

    // Emitted right to left, reversed into prefix order at the end.
    let mut ops: Vec<Opcode> = Vec::with_capacity(tokens.len());
    let mut features: Vec<&str> = Vec::with_capacity(operands);
    let mut stack: Vec<StackOp> = Vec::with_capacity(tokens.len());

    fn emit(ops: &mut Vec<Opcode>, op: StackOp) {
        match op {
            StackOp::Not => ops.push(Opcode::Not),
            StackOp::And => ops.push(Opcode::And),
            StackOp::Or => ops.push(Opcode::Or),
            StackOp::RParen => {}
        }
    }

    for &(_, token) in tokens.iter().rev() {
        match token {
            Token::RParen => stack.push(StackOp::RParen),
            Token::LParen => {
                while let Some(op) = stack.pop() {
                    if op == StackOp::RParen {
                        break;
                    }
                    emit(&mut ops, op);
                }
            }
            Token::Not => {
                // A NOT on top of the stack is the directly following one.
                if stack.last() == Some(&StackOp::Not) {
                    stack.pop();
                } else {
                    stack.push(StackOp::Not);
                }
            }
            Token::And | Token::Or => {
                let this = if token == Token::And {
                    StackOp::And
                } else {
                    StackOp::Or
                };
                while let Some(&top) = stack.last() {
                    if top > this {
                        break;
                    }
                    stack.pop();
                    emit(&mut ops, top);
                }
                stack.push(this);
            }
            Token::Feature(name) => {
                ops.push(Opcode::Feature);
                features.push(name);
            }
        }
    }
    while let Some(op) = stack.pop() {
        emit(&mut ops, op);
    }

    ops.reverse();
    features.reverse();

    let mut packed = vec![0u8; ops.len().div_ceil(4)];
    for (pos, op) in ops.iter().enumerate() {
        set_opcode(&mut packed, pos, *op);
    }
    Ok(CompiledExpr {
        packed,
        len: ops.len(),
        features,
    })
}
