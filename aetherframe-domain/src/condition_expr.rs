// /////////////////////////////////////////////////////////////////////////////
// AetherFrame
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A small, safe expression grammar for `conditional` stages.
//!
//! `StageCondition::Conditional` stages carry a free-form string in the
//! pipeline catalogue, but nothing evaluates that string dynamically.
//! Instead it is parsed once, at pipeline construction, into a
//! [`ConditionExpr`] tree and evaluated by [`ConditionExpr::eval`] against
//! an [`EvalContext`] built from the running pipeline context and the
//! previous stage's result. The grammar only exposes the two fields the
//! executor actually carries forward — `risk_score` and `success` — so
//! there is no way to express an expression that reaches outside the
//! pipeline's own state.
//!
//! ```text
//! expr       := or_expr
//! or_expr    := and_expr ( "or" and_expr )*
//! and_expr   := unary ( "and" unary )*
//! unary      := "not" unary | atom
//! atom       := "(" expr ")" | comparison
//! comparison := ident op literal
//! ident      := "risk_score" | "success"
//! op         := ">=" | "<=" | ">" | "<" | "==" | "!="
//! literal    := float | "true" | "false"
//! ```

use std::fmt;

use serde::Serialize;

/// The value a `conditional` stage's expression is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalContext {
    pub risk_score: f64,
    pub success: bool,
}

/// A parsed boolean expression over [`EvalContext`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ConditionExpr {
    And(Box<ConditionExpr>, Box<ConditionExpr>),
    Or(Box<ConditionExpr>, Box<ConditionExpr>),
    Not(Box<ConditionExpr>),
    RiskScoreCmp(Cmp, f64),
    SuccessEquals(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Cmp {
    Ge,
    Le,
    Gt,
    Lt,
    Eq,
    Ne,
}

impl Cmp {
    fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Cmp::Ge => lhs >= rhs,
            Cmp::Le => lhs <= rhs,
            Cmp::Gt => lhs > rhs,
            Cmp::Lt => lhs < rhs,
            Cmp::Eq => (lhs - rhs).abs() < f64::EPSILON,
            Cmp::Ne => (lhs - rhs).abs() >= f64::EPSILON,
        }
    }
}

impl ConditionExpr {
    /// Evaluates the expression. Evaluation itself never fails once a
    /// `ConditionExpr` exists — rejection happens at [`parse`] time.
    pub fn eval(&self, ctx: &EvalContext) -> bool {
        match self {
            ConditionExpr::And(a, b) => a.eval(ctx) && b.eval(ctx),
            ConditionExpr::Or(a, b) => a.eval(ctx) || b.eval(ctx),
            ConditionExpr::Not(inner) => !inner.eval(ctx),
            ConditionExpr::RiskScoreCmp(cmp, rhs) => cmp.apply(ctx.risk_score, *rhs),
            ConditionExpr::SuccessEquals(expected) => ctx.success == *expected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected end of expression")]
    UnexpectedEof,
    #[error("unexpected token {0:?}")]
    UnexpectedToken(String),
    #[error("unknown identifier {0:?}, expected 'risk_score' or 'success'")]
    UnknownIdent(String),
    #[error("trailing input after expression: {0:?}")]
    TrailingInput(String),
}

/// Parses a `condition_expr` string into a [`ConditionExpr`].
///
/// Rejects anything outside the grammar at parse time, which is the only
/// point at which a malformed expression is an error — runtime evaluation
/// against a context missing an expected key is handled by `eval` always
/// returning a definite boolean, never failing.
pub fn parse(input: &str) -> Result<ConditionExpr, ParseError> {
    let tokens = tokenize(input);
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(ParseError::TrailingInput(parser.tokens[parser.pos..].join(" ")));
    }
    Ok(expr)
}

fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' | ')' => {
                tokens.push(c.to_string());
                chars.next();
            }
            '>' | '<' | '=' | '!' => {
                let mut op = String::new();
                op.push(c);
                chars.next();
                if chars.peek() == Some(&'=') {
                    op.push('=');
                    chars.next();
                }
                tokens.push(op);
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(word);
            }
        }
    }
    tokens
}

struct Parser<'a> {
    tokens: &'a [String],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn next(&mut self) -> Result<&'a str, ParseError> {
        let tok = self.tokens.get(self.pos).ok_or(ParseError::UnexpectedEof)?;
        self.pos += 1;
        Ok(tok)
    }

    fn parse_or(&mut self) -> Result<ConditionExpr, ParseError> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some("or") {
            self.pos += 1;
            let rhs = self.parse_and()?;
            lhs = ConditionExpr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<ConditionExpr, ParseError> {
        let mut lhs = self.parse_unary()?;
        while self.peek() == Some("and") {
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = ConditionExpr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<ConditionExpr, ParseError> {
        if self.peek() == Some("not") {
            self.pos += 1;
            let inner = self.parse_unary()?;
            return Ok(ConditionExpr::Not(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<ConditionExpr, ParseError> {
        if self.peek() == Some("(") {
            self.pos += 1;
            let inner = self.parse_or()?;
            match self.next()? {
                ")" => Ok(inner),
                other => Err(ParseError::UnexpectedToken(other.to_string())),
            }
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> Result<ConditionExpr, ParseError> {
        let ident = self.next()?.to_string();
        let op = self.next()?.to_string();
        let literal = self.next()?.to_string();

        match ident.as_str() {
            "risk_score" => {
                let cmp = parse_cmp(&op)?;
                let rhs: f64 = literal
                    .parse()
                    .map_err(|_| ParseError::UnexpectedToken(literal.clone()))?;
                Ok(ConditionExpr::RiskScoreCmp(cmp, rhs))
            }
            "success" => {
                let expected = match literal.as_str() {
                    "true" => true,
                    "false" => false,
                    other => return Err(ParseError::UnexpectedToken(other.to_string())),
                };
                match op.as_str() {
                    "==" => Ok(ConditionExpr::SuccessEquals(expected)),
                    "!=" => Ok(ConditionExpr::SuccessEquals(!expected)),
                    other => Err(ParseError::UnexpectedToken(other.to_string())),
                }
            }
            other => Err(ParseError::UnknownIdent(other.to_string())),
        }
    }
}

fn parse_cmp(op: &str) -> Result<Cmp, ParseError> {
    match op {
        ">=" => Ok(Cmp::Ge),
        "<=" => Ok(Cmp::Le),
        ">" => Ok(Cmp::Gt),
        "<" => Ok(Cmp::Lt),
        "==" => Ok(Cmp::Eq),
        "!=" => Ok(Cmp::Ne),
        other => Err(ParseError::UnexpectedToken(other.to_string())),
    }
}

impl fmt::Display for ConditionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionExpr::And(a, b) => write!(f, "({a} and {b})"),
            ConditionExpr::Or(a, b) => write!(f, "({a} or {b})"),
            ConditionExpr::Not(inner) => write!(f, "(not {inner})"),
            ConditionExpr::RiskScoreCmp(cmp, rhs) => {
                let op = match cmp {
                    Cmp::Ge => ">=",
                    Cmp::Le => "<=",
                    Cmp::Gt => ">",
                    Cmp::Lt => "<",
                    Cmp::Eq => "==",
                    Cmp::Ne => "!=",
                };
                write!(f, "risk_score {op} {rhs}")
            }
            ConditionExpr::SuccessEquals(expected) => write!(f, "success == {expected}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(risk_score: f64, success: bool) -> EvalContext {
        EvalContext { risk_score, success }
    }

    #[test]
    fn parses_simple_risk_score_comparison() {
        let expr = parse("risk_score >= 0.7").unwrap();
        assert!(expr.eval(&ctx(0.7, true)));
        assert!(!expr.eval(&ctx(0.5, true)));
    }

    #[test]
    fn parses_success_equality() {
        let expr = parse("success == true").unwrap();
        assert!(expr.eval(&ctx(0.0, true)));
        assert!(!expr.eval(&ctx(0.0, false)));
    }

    #[test]
    fn parses_and_or_not_with_parens() {
        let expr = parse("(risk_score >= 0.5 and success == true) or not (risk_score > 0.9)").unwrap();
        assert!(expr.eval(&ctx(0.6, true)));
        assert!(expr.eval(&ctx(0.1, false)));
        assert!(!expr.eval(&ctx(0.95, false)));
    }

    #[test]
    fn rejects_unknown_identifier() {
        assert!(matches!(
            parse("confidence >= 0.5"),
            Err(ParseError::UnknownIdent(_))
        ));
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(matches!(
            parse("success == true extra"),
            Err(ParseError::TrailingInput(_))
        ));
    }

    #[test]
    fn rejects_incomplete_expression() {
        assert!(matches!(parse("risk_score >="), Err(ParseError::UnexpectedEof)));
    }
}
