//! Restricted arithmetic for editable numeric cells (`=2*(3+4)`).
//!
//! Only numbers, `+ - * /`, unary sign, and parentheses are understood. The
//! grammar is evaluated directly while parsing:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := ('+' | '-') factor | '(' expr ')' | number
//! ```

use super::{parse_leading_float, parse_number, NumberFormat};

/// Evaluates `text` as an expression, or as a plain number when it contains
/// anything outside the arithmetic character set. Never fails: errors,
/// infinities, and NaN all come back as `0.0`.
pub fn evaluate_expression(text: &str, format: NumberFormat) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let body = trimmed.strip_prefix('=').unwrap_or(trimmed);
    if !is_arithmetic(body) {
        return parse_number(body, format);
    }
    let normalized = format.normalize(body);
    match Parser::new(&normalized).parse() {
        Some(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

fn is_arithmetic(text: &str) -> bool {
    !text.is_empty()
        && text.chars().all(|ch| {
            ch.is_ascii_digit() || ch.is_whitespace() || ".,+-*/()".contains(ch)
        })
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn parse(mut self) -> Option<f64> {
        let value = self.expr()?;
        self.skip_ws();
        if self.pos == self.src.len() {
            Some(value)
        } else {
            None
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while let Some(byte) = self.src.as_bytes().get(self.pos) {
            if byte.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn expr(&mut self) -> Option<f64> {
        let mut acc = self.term()?;
        while let Some(op @ (b'+' | b'-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            acc = if op == b'+' { acc + rhs } else { acc - rhs };
        }
        Some(acc)
    }

    fn term(&mut self) -> Option<f64> {
        let mut acc = self.factor()?;
        while let Some(op @ (b'*' | b'/')) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            acc = if op == b'*' { acc * rhs } else { acc / rhs };
        }
        Some(acc)
    }

    fn factor(&mut self) -> Option<f64> {
        match self.peek()? {
            b'+' => {
                self.pos += 1;
                self.factor()
            }
            b'-' => {
                self.pos += 1;
                self.factor().map(|value| -value)
            }
            b'(' => {
                self.pos += 1;
                let value = self.expr()?;
                if self.peek()? != b')' {
                    return None;
                }
                self.pos += 1;
                Some(value)
            }
            _ => self.number(),
        }
    }

    fn number(&mut self) -> Option<f64> {
        let rest = &self.src[self.pos..];
        let len = rest
            .bytes()
            .take_while(|byte| byte.is_ascii_digit() || *byte == b'.')
            .count();
        if len == 0 {
            return None;
        }
        let literal = &rest[..len];
        // `1.2.3` is not a number.
        if literal.matches('.').count() > 1 {
            return None;
        }
        self.pos += len;
        parse_leading_float(literal)
    }
}
