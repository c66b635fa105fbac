//! Operator typing rules, kept as pure functions so they can be unit-tested
//! independently of scope/traversal state.

use crate::error::SemaError;
use mylangc_ast::{BinOp, Type};
use mylangc_util::Span;

/// Types a binary operator application. Does not touch scope; the caller
/// has already typed both operands.
pub fn check_binary_op(left: Type, op: BinOp, right: Type, span: Span) -> Result<Type, SemaError> {
    if op.is_arithmetic() {
        if !left.is_numeric() || !right.is_numeric() {
            return Err(SemaError::TypeMismatch {
                expected: Type::Int,
                found: if left.is_numeric() { right } else { left },
                span,
            });
        }
        return Ok(if left == Type::Float || right == Type::Float {
            Type::Float
        } else {
            Type::Int
        });
    }

    if op.is_comparison() {
        if left != right {
            return Err(SemaError::ComparisonTypeMismatch { left, right, span });
        }
        return Ok(Type::Bool);
    }

    if op.is_logical() {
        if left != Type::Bool {
            return Err(SemaError::TypeMismatch {
                expected: Type::Bool,
                found: left,
                span,
            });
        }
        if right != Type::Bool {
            return Err(SemaError::TypeMismatch {
                expected: Type::Bool,
                found: right,
                span,
            });
        }
        return Ok(Type::Bool);
    }

    Err(SemaError::UnknownOperator {
        op: op.as_str().to_string(),
        span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_promotes_to_float() {
        let ty = check_binary_op(Type::Int, BinOp::Add, Type::Float, Span::DUMMY).unwrap();
        assert_eq!(ty, Type::Float);
    }

    #[test]
    fn arithmetic_stays_int() {
        let ty = check_binary_op(Type::Int, BinOp::Mul, Type::Int, Span::DUMMY).unwrap();
        assert_eq!(ty, Type::Int);
    }

    #[test]
    fn comparison_requires_equal_types() {
        let err = check_binary_op(Type::Int, BinOp::Lt, Type::Float, Span::DUMMY).unwrap_err();
        assert!(matches!(err, SemaError::ComparisonTypeMismatch { .. }));
    }

    #[test]
    fn comparison_of_equal_types_yields_bool() {
        let ty = check_binary_op(Type::String, BinOp::Eq, Type::String, Span::DUMMY).unwrap();
        assert_eq!(ty, Type::Bool);
    }

    #[test]
    fn logical_requires_bool_operands() {
        let err = check_binary_op(Type::Int, BinOp::And, Type::Bool, Span::DUMMY).unwrap_err();
        assert!(matches!(err, SemaError::TypeMismatch { .. }));
    }
}
