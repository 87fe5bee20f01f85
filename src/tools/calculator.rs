//! Arithmetic expression evaluator.

use async_trait::async_trait;

use super::{Tool, ToolContext};

/// Deepest nesting of parentheses, signs and exponents accepted.
const MAX_DEPTH: usize = 256;

/// Evaluate an arithmetic expression.
pub struct Calculator;

#[async_trait]
impl Tool for Calculator {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression such as (3 + 4) * 2 / 7. Supports + - * / % ^ and parentheses."
    }

    async fn execute(&self, _ctx: &ToolContext, input: &str) -> anyhow::Result<String> {
        let value = evaluate(input)?;
        Ok(format_number(value))
    }
}

/// Evaluate `expr`, returning an error for malformed input or division by zero.
pub fn evaluate(expr: &str) -> anyhow::Result<f64> {
    let mut parser = Parser {
        chars: expr.chars().filter(|c| !c.is_whitespace()).collect(),
        pos: 0,
        depth: 0,
    };
    if parser.chars.is_empty() {
        anyhow::bail!("Empty expression");
    }

    let value = parser.expr()?;
    if let Some(c) = parser.peek() {
        anyhow::bail!("Unexpected '{}' at position {}", c, parser.pos);
    }
    if !value.is_finite() {
        anyhow::bail!("Result is not a finite number");
    }
    Ok(value)
}

/// Integers print without a trailing `.0`.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    /// Run `f` one nesting level deeper.
    fn nested(&mut self, f: impl FnOnce(&mut Self) -> anyhow::Result<f64>) -> anyhow::Result<f64> {
        if self.depth >= MAX_DEPTH {
            anyhow::bail!("Expression nested too deeply");
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> anyhow::Result<f64> {
        let mut acc = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            acc = if op == '+' { acc + rhs } else { acc - rhs };
        }
        Ok(acc)
    }

    // term := power (('*' | '/' | '%') power)*
    fn term(&mut self) -> anyhow::Result<f64> {
        let mut acc = self.power()?;
        while let Some(op @ ('*' | '/' | '%')) = self.peek() {
            self.pos += 1;
            let rhs = self.power()?;
            acc = match op {
                '*' => acc * rhs,
                _ if rhs == 0.0 => anyhow::bail!("Division by zero"),
                '/' => acc / rhs,
                _ => acc % rhs,
            };
        }
        Ok(acc)
    }

    // power := unary ('^' power)?   (right associative)
    fn power(&mut self) -> anyhow::Result<f64> {
        let base = self.unary()?;
        if self.peek() == Some('^') {
            self.pos += 1;
            let exp = self.nested(Self::power)?;
            return Ok(base.powf(exp));
        }
        Ok(base)
    }

    fn unary(&mut self) -> anyhow::Result<f64> {
        match self.peek() {
            Some('-') => {
                self.pos += 1;
                Ok(-self.nested(Self::unary)?)
            }
            Some('+') => {
                self.pos += 1;
                self.nested(Self::unary)
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> anyhow::Result<f64> {
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let value = self.nested(Self::expr)?;
                match self.bump() {
                    Some(')') => Ok(value),
                    _ => anyhow::bail!("Missing closing parenthesis"),
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
                    self.pos += 1;
                }
                let literal: String = self.chars[start..self.pos].iter().collect();
                literal
                    .parse::<f64>()
                    .map_err(|_| anyhow::anyhow!("Invalid number '{}'", literal))
            }
            Some(c) => anyhow::bail!("Unexpected '{}' at position {}", c, self.pos),
            None => anyhow::bail!("Unexpected end of expression"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_and_parentheses() {
        assert_eq!(evaluate("2+2").unwrap(), 4.0);
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("2 ^ 3 ^ 2").unwrap(), 512.0);
        assert_eq!(evaluate("-3 + 10 % 4").unwrap(), -1.0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(evaluate("").is_err());
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("1 / 0").is_err());
        assert!(evaluate("two plus two").is_err());
        assert!(evaluate("1..2").is_err());
    }

    #[test]
    fn deep_nesting_is_an_error_not_a_crash() {
        let parens = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        let signs = format!("{}1", "-".repeat(200_000));
        let powers = format!("1{}", "^1".repeat(200_000));
        for expr in [parens, signs, powers] {
            let err = evaluate(&expr).unwrap_err();
            assert_eq!(err.to_string(), "Expression nested too deeply");
        }
    }

    #[test]
    fn moderate_nesting_still_evaluates() {
        let expr = format!("{}2{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(evaluate(&expr).unwrap(), 2.0);
        assert_eq!(evaluate(&format!("{}5", "-".repeat(100))).unwrap(), 5.0);
        assert_eq!(evaluate("--3").unwrap(), 3.0);
    }

    #[test]
    fn integers_format_without_fraction() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-7.0), "-7");
    }
}
