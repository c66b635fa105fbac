//! The semantic analyzer: a single pre-order walk over the AST that
//! enforces scope/declaration/type rules and fills in every `ty`
//! field the parser left `None`.

use crate::error::{SemaError, SemaResult};
use crate::ops::check_binary_op;
use crate::scope::{Binding, FunctionSig, ScopeTree};
use mylangc_ast::{
    CallExpr, Expr, ForClause, ForStmt, MatchStmt, Program, Stmt, TryCatchStmt, Type, UnOp,
};
use mylangc_util::{Span, Symbol};

/// Sentinel key under which the enclosing function's return type is stored,
/// so `return` statements can be checked against it.
fn return_type_key() -> Symbol {
    Symbol::intern("__return_type__")
}

pub struct SemanticAnalyzer {
    scope: ScopeTree,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            scope: ScopeTree::new(),
        }
    }

    pub fn analyze_program(&mut self, program: &mut Program) -> SemaResult<()> {
        self.analyze_stmts(&mut program.statements)
    }

    fn analyze_stmts(&mut self, stmts: &mut [Stmt]) -> SemaResult<()> {
        for stmt in stmts {
            self.analyze_stmt(stmt)?;
        }
        Ok(())
    }

    fn analyze_stmt(&mut self, stmt: &mut Stmt) -> SemaResult<()> {
        match stmt {
            Stmt::VarDecl(decl) => {
                if self.scope.lookup_local(decl.name).is_some() {
                    return Err(SemaError::Redeclaration {
                        name: decl.name.as_str().to_string(),
                        span: decl.span,
                    });
                }
                let value_ty = self.analyze_expr(&mut decl.value)?;
                if value_ty != decl.declared_type {
                    return Err(SemaError::TypeMismatch {
                        expected: decl.declared_type,
                        found: value_ty,
                        span: decl.span,
                    });
                }
                self.scope
                    .define(decl.name, Binding::Variable(decl.declared_type));
                Ok(())
            }
            Stmt::Assign(assign) => {
                let var_ty = self.resolve_variable(assign.name, assign.span)?;
                let value_ty = self.analyze_expr(&mut assign.value)?;
                if value_ty != var_ty {
                    return Err(SemaError::TypeMismatch {
                        expected: var_ty,
                        found: value_ty,
                        span: assign.span,
                    });
                }
                Ok(())
            }
            Stmt::Print(print) => {
                self.analyze_expr(&mut print.expr)?;
                Ok(())
            }
            Stmt::Return(ret) => {
                // A bare `return` is permitted and not type-checked, per the
                // language's return rule; only a `return <value>` is checked
                // against the enclosing function's declared return type.
                let Some(value) = &mut ret.value else {
                    return Ok(());
                };
                match self.scope.lookup(return_type_key()).cloned() {
                    Some(Binding::ReturnType(expected)) => {
                        let value_ty = self.analyze_expr(value)?;
                        if value_ty != expected {
                            return Err(SemaError::TypeMismatch {
                                expected,
                                found: value_ty,
                                span: ret.span,
                            });
                        }
                    }
                    _ => {
                        // Outside any function; nothing to check a value against.
                        self.analyze_expr(value)?;
                    }
                }
                Ok(())
            }
            Stmt::If(if_stmt) => {
                let cond_ty = self.analyze_expr(&mut if_stmt.condition)?;
                self.require_bool(cond_ty, if_stmt.span)?;

                self.scope.enter_scope();
                self.analyze_stmts(&mut if_stmt.then_block.statements)?;
                self.scope.exit_scope();

                if let Some(else_block) = &mut if_stmt.else_block {
                    self.scope.enter_scope();
                    self.analyze_stmts(&mut else_block.statements)?;
                    self.scope.exit_scope();
                }
                Ok(())
            }
            Stmt::While(while_stmt) => {
                let cond_ty = self.analyze_expr(&mut while_stmt.condition)?;
                self.require_bool(cond_ty, while_stmt.span)?;

                self.scope.enter_scope();
                self.analyze_stmts(&mut while_stmt.body.statements)?;
                self.scope.exit_scope();
                Ok(())
            }
            Stmt::For(for_stmt) => self.analyze_for(for_stmt),
            Stmt::FunctionDecl(fdecl) => {
                if self.scope.lookup_local(fdecl.name).is_some() {
                    return Err(SemaError::Redeclaration {
                        name: fdecl.name.as_str().to_string(),
                        span: fdecl.span,
                    });
                }
                let sig = FunctionSig {
                    return_type: fdecl.return_type,
                    params: fdecl.params.clone(),
                };
                self.scope.define(fdecl.name, Binding::Function(sig));

                self.scope.enter_scope();
                self.scope
                    .define(return_type_key(), Binding::ReturnType(fdecl.return_type));
                for (pname, pty) in &fdecl.params {
                    if !self.scope.define(*pname, Binding::Variable(*pty)) {
                        return Err(SemaError::DuplicateParameter {
                            function: fdecl.name.as_str().to_string(),
                            name: pname.as_str().to_string(),
                            span: fdecl.span,
                        });
                    }
                }
                self.analyze_stmts(&mut fdecl.body.statements)?;
                self.scope.exit_scope();
                Ok(())
            }
            Stmt::ExprStmt(call) => {
                self.analyze_call(call)?;
                Ok(())
            }
            Stmt::TryCatch(tc) => self.analyze_try_catch(tc),
            Stmt::Match(match_stmt) => self.analyze_match(match_stmt),
        }
    }

    fn analyze_for(&mut self, for_stmt: &mut ForStmt) -> SemaResult<()> {
        // Init/condition/update and the body all share one scope.
        self.scope.enter_scope();

        if let Some(init) = &mut for_stmt.init {
            self.analyze_for_clause(init, for_stmt.span)?;
        }
        if let Some(condition) = &mut for_stmt.condition {
            let cond_ty = self.analyze_expr(condition)?;
            self.require_bool(cond_ty, for_stmt.span)?;
        }
        self.analyze_stmts(&mut for_stmt.body.statements)?;
        if let Some(update) = &mut for_stmt.update {
            self.analyze_for_clause(update, for_stmt.span)?;
        }

        self.scope.exit_scope();
        Ok(())
    }

    fn analyze_for_clause(
        &mut self,
        clause: &mut ForClause,
        span: Span,
    ) -> SemaResult<()> {
        match clause {
            ForClause::VarDecl {
                name,
                declared_type,
                value,
            } => {
                if self.scope.lookup_local(*name).is_some() {
                    return Err(SemaError::Redeclaration {
                        name: name.as_str().to_string(),
                        span,
                    });
                }
                let value_ty = self.analyze_expr(value)?;
                if value_ty != *declared_type {
                    return Err(SemaError::TypeMismatch {
                        expected: *declared_type,
                        found: value_ty,
                        span,
                    });
                }
                self.scope.define(*name, Binding::Variable(*declared_type));
                Ok(())
            }
            ForClause::Assign { name, value } => {
                let var_ty = self.resolve_variable(*name, span)?;
                let value_ty = self.analyze_expr(value)?;
                if value_ty != var_ty {
                    return Err(SemaError::TypeMismatch {
                        expected: var_ty,
                        found: value_ty,
                        span,
                    });
                }
                Ok(())
            }
        }
    }

    fn analyze_try_catch(&mut self, tc: &mut TryCatchStmt) -> SemaResult<()> {
        self.scope.enter_scope();
        self.analyze_stmts(&mut tc.try_block.statements)?;
        self.scope.exit_scope();

        self.scope.enter_scope();
        self.scope
            .define(tc.exception_name, Binding::Variable(Type::String));
        self.analyze_stmts(&mut tc.catch_block.statements)?;
        self.scope.exit_scope();
        Ok(())
    }

    fn analyze_match(&mut self, match_stmt: &mut MatchStmt) -> SemaResult<()> {
        let scrutinee_ty = self.analyze_expr(&mut match_stmt.expr)?;

        for case in &mut match_stmt.cases {
            self.scope.enter_scope();
            let case_ty = self.analyze_expr(&mut case.value)?;
            if case_ty != scrutinee_ty {
                self.scope.exit_scope();
                return Err(SemaError::TypeMismatch {
                    expected: scrutinee_ty,
                    found: case_ty,
                    span: case.value.span(),
                });
            }
            self.analyze_stmts(&mut case.body)?;
            self.scope.exit_scope();
        }

        if let Some(default) = &mut match_stmt.default {
            self.scope.enter_scope();
            self.analyze_stmts(&mut default.body)?;
            self.scope.exit_scope();
        }
        Ok(())
    }

    fn analyze_expr(&mut self, expr: &mut Expr) -> SemaResult<Type> {
        match expr {
            Expr::Literal(lit) => Ok(lit.ty()),
            Expr::Identifier(id) => {
                let ty = self.resolve_variable(id.name, id.span)?;
                id.ty = Some(ty);
                Ok(ty)
            }
            Expr::Binary(bin) => {
                let left_ty = self.analyze_expr(&mut bin.left)?;
                let right_ty = self.analyze_expr(&mut bin.right)?;
                let ty = check_binary_op(left_ty, bin.op, right_ty, bin.span)?;
                bin.ty = Some(ty);
                Ok(ty)
            }
            Expr::Unary(un) => {
                let operand_ty = self.analyze_expr(&mut un.operand)?;
                match un.op {
                    UnOp::Not => {
                        self.require_bool(operand_ty, un.span)?;
                        un.ty = Some(Type::Bool);
                        Ok(Type::Bool)
                    }
                }
            }
            Expr::Call(call) => self.analyze_call(call),
        }
    }

    fn analyze_call(&mut self, call: &mut CallExpr) -> SemaResult<Type> {
        let binding = self
            .scope
            .lookup(call.name)
            .cloned()
            .ok_or_else(|| SemaError::Undeclared {
                name: call.name.as_str().to_string(),
                span: call.span,
            })?;
        let sig = match binding {
            Binding::Function(sig) => sig,
            _ => {
                return Err(SemaError::Undeclared {
                    name: call.name.as_str().to_string(),
                    span: call.span,
                })
            }
        };

        if call.args.len() != sig.params.len() {
            return Err(SemaError::ArityMismatch {
                name: call.name.as_str().to_string(),
                expected: sig.params.len(),
                found: call.args.len(),
                span: call.span,
            });
        }

        for (arg, (_, param_ty)) in call.args.iter_mut().zip(sig.params.iter()) {
            let arg_ty = self.analyze_expr(arg)?;
            if arg_ty != *param_ty {
                return Err(SemaError::TypeMismatch {
                    expected: *param_ty,
                    found: arg_ty,
                    span: arg.span(),
                });
            }
        }

        call.ty = Some(sig.return_type);
        Ok(sig.return_type)
    }

    fn resolve_variable(&self, name: Symbol, span: Span) -> SemaResult<Type> {
        match self.scope.lookup(name) {
            Some(Binding::Variable(ty)) => Ok(*ty),
            _ => Err(SemaError::Undeclared {
                name: name.as_str().to_string(),
                span,
            }),
        }
    }

    fn require_bool(&self, ty: Type, span: Span) -> SemaResult<()> {
        if ty != Type::Bool {
            return Err(SemaError::TypeMismatch {
                expected: Type::Bool,
                found: ty,
                span,
            });
        }
        Ok(())
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze_src(src: &str) -> SemaResult<Program> {
        let mut program = mylangc_par::parse(src).expect("parse should succeed");
        SemanticAnalyzer::new().analyze_program(&mut program)?;
        Ok(program)
    }

    #[test]
    fn accepts_well_typed_var_decl() {
        assert!(analyze_src("let x: int = 1; print(x);").is_ok());
    }

    #[test]
    fn rejects_redeclaration_in_same_scope() {
        let err = analyze_src("let x: int = 1; let x: int = 2;").unwrap_err();
        assert!(matches!(err, SemaError::Redeclaration { .. }));
    }

    #[test]
    fn rejects_assignment_to_undeclared_name() {
        let err = analyze_src("x = 1;").unwrap_err();
        assert!(matches!(err, SemaError::Undeclared { .. }));
    }

    #[test]
    fn rejects_var_decl_type_mismatch() {
        let err = analyze_src("let x: int = true;").unwrap_err();
        assert!(matches!(err, SemaError::TypeMismatch { .. }));
    }

    #[test]
    fn block_scopes_do_not_leak_into_parent() {
        let err = analyze_src("if (true) { let x: int = 1; } x = 2;").unwrap_err();
        assert!(matches!(err, SemaError::Undeclared { .. }));
    }

    #[test]
    fn for_scope_is_shared_across_init_condition_and_body() {
        let program = analyze_src("for (let i: int = 0; i < 3; i = i + 1) { print(i); }");
        assert!(program.is_ok());
    }

    #[test]
    fn function_call_checks_arity() {
        let err =
            analyze_src("function add(a: int, b: int): int { return a + b; } add(1);")
                .unwrap_err();
        assert!(matches!(err, SemaError::ArityMismatch { .. }));
    }

    #[test]
    fn function_call_checks_argument_types() {
        let err = analyze_src(
            "function add(a: int, b: int): int { return a + b; } add(1, true);",
        )
        .unwrap_err();
        assert!(matches!(err, SemaError::TypeMismatch { .. }));
    }

    #[test]
    fn duplicate_parameter_names_are_rejected() {
        let err =
            analyze_src("function f(a: int, a: int): int { return a; }").unwrap_err();
        assert!(matches!(err, SemaError::DuplicateParameter { .. }));
    }

    #[test]
    fn return_type_is_checked_against_enclosing_function() {
        let err =
            analyze_src("function f(): int { return true; }").unwrap_err();
        assert!(matches!(err, SemaError::TypeMismatch { .. }));
    }

    #[test]
    fn match_case_values_must_match_scrutinee_type() {
        let err = analyze_src(
            "let x: int = 1; match x { case 1: print(x); default: print(x); } ",
        );
        assert!(err.is_ok());
        let err2 = analyze_src("let x: int = 1; match x { case true: print(x); }").unwrap_err();
        assert!(matches!(err2, SemaError::TypeMismatch { .. }));
    }

    #[test]
    fn try_catch_binds_exception_name_as_string() {
        assert!(analyze_src("try { print(1); } catch (e) { print(e); }").is_ok());
    }

    #[test]
    fn comparison_requires_equal_operand_types_not_promotion() {
        let err = analyze_src("let x: bool = 1 < 1.0;").unwrap_err();
        assert!(matches!(err, SemaError::ComparisonTypeMismatch { .. }));
    }

    #[test]
    fn bare_return_in_a_value_returning_function_is_permitted_and_untyped() {
        assert!(analyze_src("function f(): int { return; }").is_ok());
    }

    #[test]
    fn falling_off_the_end_of_a_function_body_is_permitted() {
        assert!(analyze_src("function f(): int { print(1); }").is_ok());
    }

    #[test]
    fn an_if_without_an_else_is_permitted_even_with_no_trailing_return() {
        assert!(analyze_src("function f(): int { if (true) { return 1; } }").is_ok());
    }

    #[test]
    fn a_match_without_a_default_is_permitted_even_with_no_trailing_return() {
        assert!(
            analyze_src("function f(): int { match 1 { case 1: return 1; } }").is_ok()
        );
    }

    #[test]
    fn annotates_binary_and_identifier_types_after_success() {
        let program = analyze_src("let a: int = 1; let b: int = a + 2; print(b);").unwrap();
        match &program.statements[1] {
            Stmt::VarDecl(decl) => match &decl.value {
                Expr::Binary(bin) => assert_eq!(bin.ty, Some(Type::Int)),
                other => panic!("expected binary expr, got {other:?}"),
            },
            other => panic!("expected var decl, got {other:?}"),
        }
    }
}
