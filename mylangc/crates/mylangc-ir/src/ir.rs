//! The three-address-code instruction model.
//!
//! IR values are encoded as plain strings for uniformity: identifiers,
//! numeric literals, `"…"` for string literals, `True`/`False` for boolean
//! literals (matching the NASM backend's `True`/`False` data labels), and a
//! `!X` prefix as a textual marker meaning "branch when X is zero". Nothing
//! downstream parses these strings except the optimizer's pattern-matching
//! passes and the NASM generator.

use mylangc_ast::{BinOp, Type, UnOp};
use std::fmt;

/// A single three-address instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    Assign {
        target: String,
        value: String,
        ty: Option<Type>,
    },
    Print {
        value: String,
        ty: Option<Type>,
    },
    Return {
        value: Option<String>,
    },
    Label {
        label: String,
    },
    Goto {
        label: String,
    },
    IfGoto {
        condition: String,
        label: String,
    },
    Call {
        target: String,
        name: String,
        args: Vec<String>,
    },
    Binary {
        result: String,
        left: String,
        op: BinOp,
        right: String,
        ty: Option<Type>,
    },
    Unary {
        result: String,
        op: UnOp,
        operand: String,
    },
    FunctionStart {
        name: String,
        params: Vec<(String, Type)>,
    },
    FunctionEnd {
        name: String,
    },
}

fn unop_str(op: UnOp) -> &'static str {
    match op {
        UnOp::Not => "!",
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Assign { target, value, ty } => match ty {
                Some(t) => write!(f, "{target} = {value} (type={t})"),
                None => write!(f, "{target} = {value}"),
            },
            Instr::Print { value, ty } => match ty {
                Some(t) => write!(f, "print {value} (type={t})"),
                None => write!(f, "print {value}"),
            },
            Instr::Return { value } => match value {
                Some(v) => write!(f, "return {v}"),
                None => write!(f, "return"),
            },
            Instr::Label { label } => write!(f, "{label}:"),
            Instr::Goto { label } => write!(f, "goto {label}"),
            Instr::IfGoto { condition, label } => write!(f, "if {condition} goto {label}"),
            Instr::Call { target, name, args } => {
                write!(f, "{target} = call {name}({})", args.join(", "))
            }
            Instr::Binary {
                result,
                left,
                op,
                right,
                ..
            } => write!(f, "{result} = {left} {} {right}", op.as_str()),
            Instr::Unary {
                result,
                op,
                operand,
            } => write!(f, "{result} = {}{operand}", unop_str(*op)),
            Instr::FunctionStart { name, .. } => write!(f, "{name}:"),
            Instr::FunctionEnd { name } => write!(f, "; end {name}"),
        }
    }
}

/// `true` for IR temporaries: `t` followed by one or more digits.
pub fn is_temp(value: &str) -> bool {
    let Some(rest) = value.strip_prefix('t') else {
        return false;
    };
    !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
}
