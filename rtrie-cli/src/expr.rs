//! A tiny set-algebra expression language over `rtrie` interval literals.
//!
//! Not part of the library — this is `rtrie-cli`'s own "exercise the library
//! from a shell" surface.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr   := term (('|' | '^') term)*
//! term   := unary (('&' | '-') unary)*
//! unary  := '~' unary | atom
//! atom   := IDENT | INTERVAL_LITERAL | '{' expr '}'
//! ```
//!
//! Interval literals already use `(`/`[` and `)`/`]`, so grouping uses
//! `{`/`}` instead of the usual parens to keep the two forms unambiguous
//! without lookahead.

use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashMap;

use rtrie::{format::parse_interval, IntervalSet};

#[derive(Debug, Clone)]
enum Token {
    Interval(rtrie::Interval),
    Ident(String),
    Op(char),
    Tilde,
    LBrace,
    RBrace,
}

fn tokenize(s: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = s.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '|' | '&' | '^' | '-' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            '~' => {
                tokens.push(Token::Tilde);
                i += 1;
            }
            '{' => {
                tokens.push(Token::LBrace);
                i += 1;
            }
            '}' => {
                tokens.push(Token::RBrace);
                i += 1;
            }
            '[' | '(' => {
                let close = chars[i..]
                    .iter()
                    .position(|&c| c == ')' || c == ']')
                    .map(|off| i + off)
                    .ok_or_else(|| anyhow!("unterminated interval literal starting at byte {i}"))?;
                let literal: String = chars[i..=close].iter().collect();
                let ival = parse_interval(&literal).with_context(|| format!("invalid interval literal `{literal}`"))?;
                tokens.push(Token::Interval(ival));
                i = close + 1;
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => bail!("unexpected character `{other}` in expression"),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    bindings: &'a HashMap<String, IntervalSet>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn expr(&mut self) -> Result<IntervalSet> {
        let mut lhs = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Op('|')) => {
                    self.bump();
                    lhs = lhs.union(&self.term()?);
                }
                Some(Token::Op('^')) => {
                    self.bump();
                    lhs = lhs.symmetric_difference(&self.term()?);
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn term(&mut self) -> Result<IntervalSet> {
        let mut lhs = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Op('&')) => {
                    self.bump();
                    lhs = lhs.intersection(&self.unary()?);
                }
                Some(Token::Op('-')) => {
                    self.bump();
                    lhs = lhs.difference(&self.unary()?);
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn unary(&mut self) -> Result<IntervalSet> {
        if matches!(self.peek(), Some(Token::Tilde)) {
            self.bump();
            return Ok(self.unary()?.complement());
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<IntervalSet> {
        match self.bump() {
            Some(Token::Interval(ival)) => Ok(ival.as_interval_set()),
            Some(Token::Ident(name)) => self
                .bindings
                .get(&name)
                .cloned()
                .ok_or_else(|| anyhow!("unbound name `{name}`")),
            Some(Token::LBrace) => {
                let inner = self.expr()?;
                match self.bump() {
                    Some(Token::RBrace) => Ok(inner),
                    _ => bail!("expected `}}` to close group"),
                }
            }
            other => bail!("unexpected token {other:?}, expected an interval, name, or `{{`"),
        }
    }
}

/// Evaluates `expr` against `bindings` (names already assigned earlier in a
/// script), returning the resulting [`IntervalSet`].
pub fn eval(expr: &str, bindings: &HashMap<String, IntervalSet>) -> Result<IntervalSet> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        bail!("empty expression");
    }
    let mut parser = Parser { tokens, pos: 0, bindings };
    let result = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        bail!("trailing input after a complete expression");
    }
    Ok(result)
}

#[cfg(test)]
mod test {
    use super::*;

    fn empty_bindings() -> HashMap<String, IntervalSet> {
        HashMap::new()
    }

    #[test]
    fn evaluates_union() {
        let set = eval("[0, 10) | [20, 30)", &empty_bindings()).unwrap();
        assert_eq!(set.total_len(), 20);
        assert_eq!(set.cardinality(), 2);
    }

    #[test]
    fn evaluates_intersection_with_grouping() {
        let set = eval("{[0, 10) | [20, 30)} & [5, 25)", &empty_bindings()).unwrap();
        assert_eq!(set.total_len(), 10);
        assert_eq!(set.cardinality(), 2);
    }

    #[test]
    fn evaluates_complement_and_difference() {
        let set = eval("~[0, 10) - [100, 200)", &empty_bindings()).unwrap();
        assert!(!set.is_empty());
        assert!(!set.iter().any(|s| matches!(s.lower, rtrie::Bound::Included(x) if (100..200).contains(&x))));
    }

    #[test]
    fn resolves_bound_names() {
        let mut bindings = empty_bindings();
        bindings.insert("a".to_string(), rtrie::Interval::closed(0, 10).as_interval_set());
        let set = eval("a | [20, 30)", &bindings).unwrap();
        assert_eq!(set.total_len(), 21);
        assert_eq!(set.cardinality(), 2);
    }

    #[test]
    fn rejects_unbound_name() {
        assert!(eval("missing", &empty_bindings()).is_err());
    }

    #[test]
    fn rejects_unterminated_literal() {
        assert!(eval("[0, 10", &empty_bindings()).is_err());
    }
}
