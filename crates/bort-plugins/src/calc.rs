//! RPN calculator.
//!
//! `calc 1 2 + 3 *` prints the stack, top first. `hex` anywhere in the input
//! switches the output to hexadecimal; `help` lists the operators privately.

use std::f64::consts;

use bort_core::{Message, OutboxSender, Registry, RegistryResult};
use thiserror::Error;

/// Largest magnitude printed in hex mode.
const HEX_LIMIT: f64 = (1u64 << 53) as f64;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    /// Unknown token, stack underflow or a result that is not a number.
    #[error("calc: {0}: invalid input")]
    InvalidInput(String),

    #[error("empty stack")]
    EmptyStack,
}

/// What one input line evaluated to.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The final stack, bottom first.
    Stack { values: Vec<f64>, hex: bool },
    /// The operator list was requested.
    Help,
}

enum Op {
    Push(f64),
    Unary(fn(f64) -> f64),
    Binary(fn(f64, f64) -> f64),
    Reduce(fn(&[f64]) -> f64),
    Dup,
    Drop,
    Swap,
    Clear,
    Depth,
}

/// Operator names, as listed by `calc help`.
pub const OPERATORS: &[&str] = &[
    "!", "*", "+", "-", "/", "^", "abs", "acos", "asin", "atan", "atan2", "avg", "ceil", "clear",
    "cos", "depth", "drop", "dup", "e", "exp", "floor", "hypot", "inv", "ln", "log", "max", "min",
    "mod", "neg", "phi", "pi", "sin", "sqrt", "sum", "swap", "tan", "trunc",
];

fn lookup(token: &str) -> Option<Op> {
    let op = match token {
        "+" => Op::Binary(|a, b| a + b),
        "-" => Op::Binary(|a, b| a - b),
        "*" => Op::Binary(|a, b| a * b),
        "/" => Op::Binary(|a, b| a / b),
        "mod" => Op::Binary(|a, b| a % b),
        "^" => Op::Binary(f64::powf),
        "atan2" => Op::Binary(f64::atan2),
        "hypot" => Op::Binary(f64::hypot),
        "min" => Op::Binary(f64::min),
        "max" => Op::Binary(f64::max),
        "neg" => Op::Unary(|a| -a),
        "abs" => Op::Unary(f64::abs),
        "inv" => Op::Unary(f64::recip),
        "sqrt" => Op::Unary(f64::sqrt),
        "exp" => Op::Unary(f64::exp),
        "ln" => Op::Unary(f64::ln),
        "log" => Op::Unary(f64::log10),
        "sin" => Op::Unary(f64::sin),
        "cos" => Op::Unary(f64::cos),
        "tan" => Op::Unary(f64::tan),
        "asin" => Op::Unary(f64::asin),
        "acos" => Op::Unary(f64::acos),
        "atan" => Op::Unary(f64::atan),
        "floor" => Op::Unary(f64::floor),
        "ceil" => Op::Unary(f64::ceil),
        "trunc" => Op::Unary(f64::trunc),
        "!" => Op::Unary(factorial),
        "sum" => Op::Reduce(|xs| xs.iter().sum()),
        "avg" => Op::Reduce(|xs| xs.iter().sum::<f64>() / xs.len() as f64),
        "pi" => Op::Push(consts::PI),
        "e" => Op::Push(consts::E),
        "phi" => Op::Push(1.618_033_988_749_895),
        "dup" => Op::Dup,
        "drop" => Op::Drop,
        "swap" => Op::Swap,
        "clear" => Op::Clear,
        "depth" => Op::Depth,
        _ => return None,
    };
    Some(op)
}

fn factorial(n: f64) -> f64 {
    if n < 0.0 || n.fract() != 0.0 {
        return f64::NAN;
    }
    if n > 170.0 {
        return f64::INFINITY;
    }
    (1..=n as u64).fold(1.0, |acc, k| acc * k as f64)
}

fn parse_number(token: &str) -> Option<f64> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok()? as f64,
        None => digits.parse::<f64>().ok().filter(|v| v.is_finite())?,
    };
    Some(if negative { -value } else { value })
}

fn apply(stack: &mut Vec<f64>, token: &str, op: Op) -> Result<(), CalcError> {
    let invalid = || CalcError::InvalidInput(token.to_string());
    match op {
        Op::Push(value) => stack.push(value),
        Op::Unary(f) => {
            let a = stack.pop().ok_or_else(invalid)?;
            stack.push(f(a));
        }
        Op::Binary(f) => {
            if stack.len() < 2 {
                return Err(invalid());
            }
            let b = stack.pop().ok_or_else(invalid)?;
            let a = stack.pop().ok_or_else(invalid)?;
            stack.push(f(a, b));
        }
        Op::Reduce(f) => {
            if stack.is_empty() {
                return Err(invalid());
            }
            let value = f(stack);
            stack.clear();
            stack.push(value);
        }
        Op::Dup => {
            let top = *stack.last().ok_or_else(invalid)?;
            stack.push(top);
        }
        Op::Drop => {
            stack.pop().ok_or_else(invalid)?;
        }
        Op::Swap => {
            let len = stack.len();
            if len < 2 {
                return Err(invalid());
            }
            stack.swap(len - 1, len - 2);
        }
        Op::Clear => stack.clear(),
        Op::Depth => stack.push(stack.len() as f64),
    }

    match stack.last() {
        Some(top) if !top.is_finite() => Err(invalid()),
        _ => Ok(()),
    }
}

/// Evaluates one line of RPN input.
pub fn evaluate(input: &str) -> Result<Outcome, CalcError> {
    let mut stack = Vec::new();
    let mut hex = false;

    for token in input.split_whitespace() {
        match token {
            "help" => return Ok(Outcome::Help),
            "hex" => {
                hex = true;
                continue;
            }
            _ => {}
        }
        if let Some(value) = parse_number(token) {
            stack.push(value);
            continue;
        }
        let op = lookup(token).ok_or_else(|| CalcError::InvalidInput(token.to_string()))?;
        apply(&mut stack, token, op)?;
    }

    if stack.is_empty() {
        return Err(CalcError::EmptyStack);
    }
    Ok(Outcome::Stack { values: stack, hex })
}

fn format_value(value: f64, hex: bool) -> String {
    if !hex {
        return value.to_string();
    }
    if value.abs() >= HEX_LIMIT {
        return "overflow".to_string();
    }
    let int = value as i64;
    if int < 0 {
        format!("-{:#x}", int.unsigned_abs())
    } else {
        format!("{int:#x}")
    }
}

/// Renders a stack top first.
pub fn format_stack(values: &[f64], hex: bool) -> String {
    values
        .iter()
        .rev()
        .map(|&v| format_value(v, hex))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The reply to `calc help`.
pub fn help_text() -> String {
    let mut words: Vec<&str> = OPERATORS.iter().copied().chain(["help", "hex"]).collect();
    words.sort_unstable();
    words.join(" ")
}

/// Registers the `calc` command.
pub fn register(registry: &Registry, _outbox: OutboxSender) -> RegistryResult<()> {
    registry.register_command("calc", "RPN calculator", |msg: Message| async move {
        let reply = match evaluate(&msg.args)? {
            Outcome::Help => msg.reply_private(help_text()),
            Outcome::Stack { values, hex } => msg.reply(format_stack(&values, hex)),
        };
        Ok::<_, anyhow::Error>(reply)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bort_core::{Engine, MessageType, Outbox};
    use std::sync::Arc;

    fn eval(input: &str) -> String {
        match evaluate(input).unwrap() {
            Outcome::Stack { values, hex } => format_stack(&values, hex),
            Outcome::Help => "help".into(),
        }
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 2 + 3 *"), "9");
        assert_eq!(eval("7 2 /"), "3.5");
        assert_eq!(eval("2 10 ^"), "1024");
        assert_eq!(eval("7 3 mod"), "1");
        assert_eq!(eval("5 !"), "120");
        assert_eq!(eval("1 2 3 sum"), "6");
    }

    #[test]
    fn test_stack_is_printed_top_first() {
        assert_eq!(eval("1 2 3"), "3 2 1");
        assert_eq!(eval("1 2 swap"), "1 2");
        assert_eq!(eval("4 dup depth"), "2 4 4");
    }

    #[test]
    fn test_hex_output() {
        assert_eq!(eval("255 hex"), "0xff");
        assert_eq!(eval("hex 0x10 neg"), "-0x10");
        assert_eq!(eval("2 60 ^ hex"), "overflow");
    }

    #[test]
    fn test_errors() {
        assert_eq!(evaluate(""), Err(CalcError::EmptyStack));
        assert_eq!(evaluate("1 drop"), Err(CalcError::EmptyStack));
        assert_eq!(evaluate("1 +"), Err(CalcError::InvalidInput("+".into())));
        assert_eq!(evaluate("1 0 /"), Err(CalcError::InvalidInput("/".into())));
        assert_eq!(evaluate("2 frob"), Err(CalcError::InvalidInput("frob".into())));
        assert_eq!(evaluate("-1 sqrt"), Err(CalcError::InvalidInput("sqrt".into())));
    }

    #[test]
    fn test_every_operator_resolves() {
        for op in OPERATORS {
            assert!(lookup(op).is_some(), "{op} is listed but unknown");
        }
        assert!(help_text().starts_with("! * + - / ^ abs"));
    }

    #[tokio::test]
    async fn test_calc_command() {
        let registry = Arc::new(Registry::new());
        let outbox = Arc::new(Outbox::new(2));
        register(&registry, outbox.sender()).unwrap();
        let engine = Engine::new(registry, outbox);

        let mut msg = Message::new(MessageType::PRIV_MSG, "#bort", "");
        msg.nick = "alice".into();
        msg.command = Some("calc".into());

        msg.args = "6 7 *".into();
        let dispatch = engine.process(msg.clone()).await;
        assert_eq!(dispatch.replies[0].text, "42");
        assert_eq!(dispatch.replies[0].context, "#bort");

        msg.args = "help".into();
        let dispatch = engine.process(msg.clone()).await;
        assert_eq!(dispatch.replies[0].context, "alice");

        msg.args = "nope".into();
        let dispatch = engine.process(msg).await;
        assert!(dispatch.replies.is_empty());
        assert!(!dispatch.is_ok());
    }
}
