//! Calculator tool — evaluates mathematical expressions.
//!
//! Supports `+`, `-`, `*`, `/`, `%`, `^` (right-associative), parentheses,
//! and unary negation. Recursive descent over a peekable character
//! stream; no dependencies beyond std.

use async_trait::async_trait;
use reagent_core::error::ToolError;
use reagent_core::tool::{Tool, ToolOutput};
use std::iter::Peekable;
use std::str::Chars;

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate a mathematical expression. Supports +, -, *, /, %, ^, parentheses, and decimal numbers."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "The expression to evaluate, e.g. '(12 * 7) + 2^3'"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let expr = arguments["expression"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'expression' argument".into()))?;

        let value = evaluate(expr).map_err(|e| ToolError::execution("calculator", e))?;

        // Integers print without a trailing ".0".
        let formatted = if value.fract() == 0.0 && value.abs() < 1e15 {
            format!("{}", value as i64)
        } else {
            format!("{value}")
        };

        Ok(ToolOutput {
            content: formatted,
            data: Some(serde_json::json!({"result": value})),
        })
    }
}

/// Evaluate an expression string.
pub fn evaluate(expr: &str) -> Result<f64, String> {
    let mut cursor = Cursor::new(expr);
    let value = cursor.sum()?;
    cursor.skip_ws();
    match cursor.chars.peek() {
        None => Ok(value),
        Some(c) => Err(format!("unexpected character '{c}'")),
    }
}

/// Grammar:
///   sum     = product (('+' | '-') product)*
///   product = power (('*' | '/' | '%') power)*
///   power   = atom ('^' power)?            -- right-associative
///   atom    = '-' atom | NUMBER | '(' sum ')'
struct Cursor<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.chars.peek() == Some(&expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn sum(&mut self) -> Result<f64, String> {
        let mut value = self.product()?;
        loop {
            if self.eat('+') {
                value += self.product()?;
            } else if self.eat('-') {
                value -= self.product()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn product(&mut self) -> Result<f64, String> {
        let mut value = self.power()?;
        loop {
            if self.eat('*') {
                value *= self.power()?;
            } else if self.eat('/') {
                let divisor = self.power()?;
                if divisor == 0.0 {
                    return Err("division by zero".into());
                }
                value /= divisor;
            } else if self.eat('%') {
                let divisor = self.power()?;
                if divisor == 0.0 {
                    return Err("division by zero".into());
                }
                value %= divisor;
            } else {
                return Ok(value);
            }
        }
    }

    fn power(&mut self) -> Result<f64, String> {
        let base = self.atom()?;
        if self.eat('^') {
            let exponent = self.power()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, String> {
        self.skip_ws();
        if self.eat('-') {
            return Ok(-self.atom()?);
        }
        if self.eat('(') {
            let value = self.sum()?;
            if !self.eat(')') {
                return Err("expected closing parenthesis".into());
            }
            return Ok(value);
        }
        self.number()
    }

    fn number(&mut self) -> Result<f64, String> {
        let mut literal = String::new();
        while let Some(&c) = self.chars.peek() {
            if !c.is_ascii_digit() && c != '.' {
                break;
            }
            literal.push(c);
            self.chars.next();
        }
        if literal.is_empty() {
            return match self.chars.peek() {
                Some(c) => Err(format!("unexpected character '{c}'")),
                None => Err("unexpected end of expression".into()),
            };
        }
        literal
            .parse()
            .map_err(|_| format!("invalid number '{literal}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addition_and_subtraction() {
        assert_eq!(evaluate("2 + 3 - 1").unwrap(), 4.0);
    }

    #[test]
    fn precedence() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
    }

    #[test]
    fn modulo_and_power() {
        assert_eq!(evaluate("10 % 3").unwrap(), 1.0);
        assert_eq!(evaluate("2 ^ 10").unwrap(), 1024.0);
    }

    #[test]
    fn power_is_right_associative() {
        // 2^(3^2) = 512, not (2^3)^2 = 64
        assert_eq!(evaluate("2 ^ 3 ^ 2").unwrap(), 512.0);
    }

    #[test]
    fn unary_negation() {
        assert_eq!(evaluate("-5 + 3").unwrap(), -2.0);
        assert_eq!(evaluate("2 * -3").unwrap(), -6.0);
    }

    #[test]
    fn decimals() {
        assert!((evaluate("3.5 * 2").unwrap() - 7.0).abs() < 1e-10);
    }

    #[test]
    fn division_by_zero_rejected() {
        assert!(evaluate("1 / 0").is_err());
        assert!(evaluate("1 % 0").is_err());
    }

    #[test]
    fn dangling_operator_rejected() {
        assert!(evaluate("2 +").is_err());
    }

    #[test]
    fn trailing_garbage_rejected() {
        assert!(evaluate("2 + 3 what").is_err());
    }

    #[test]
    fn empty_expression_rejected() {
        assert!(evaluate("").is_err());
        assert!(evaluate("   ").is_err());
    }

    #[test]
    fn unclosed_paren_rejected() {
        assert!(evaluate("(1 + 2").is_err());
    }

    #[tokio::test]
    async fn tool_evaluates_expression() {
        let tool = CalculatorTool;
        let output = tool
            .execute(serde_json::json!({"expression": "12*7"}))
            .await
            .unwrap();
        assert_eq!(output.content, "84");
    }

    #[tokio::test]
    async fn tool_formats_decimals() {
        let tool = CalculatorTool;
        let output = tool
            .execute(serde_json::json!({"expression": "10 / 4"}))
            .await
            .unwrap();
        assert_eq!(output.content, "2.5");
    }

    #[tokio::test]
    async fn tool_reports_execution_failure() {
        let tool = CalculatorTool;
        let err = tool
            .execute(serde_json::json!({"expression": "1 / 0"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }

    #[tokio::test]
    async fn tool_missing_expression() {
        let tool = CalculatorTool;
        let err = tool.execute(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn tool_spec() {
        let spec = CalculatorTool.spec();
        assert_eq!(spec.name, "calculator");
        assert!(spec.parameters["required"]
            .as_array()
            .unwrap()
            .contains(&serde_json::json!("expression")));
    }
}
