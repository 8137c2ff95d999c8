//! Type inference and type error tests.
//!
//! Covers literal typing, numeric promotion, branch unification, function
//! application, assignment compatibility, list operations, and the
//! `when`/`unless` forms.

use sable_ast::{BinOp, Expr, PrefixOp};
use sable_typeck::{check_program, CheckError, Ty};

// ── Helpers ────────────────────────────────────────────────────────────

fn check(exprs: Vec<Expr>) -> Result<Ty, CheckError> {
    check_program(&Expr::Seq(exprs))
}

fn check_one(expr: Expr) -> Result<Ty, CheckError> {
    check_program(&expr)
}

// ── Literals & sequencing ──────────────────────────────────────────────

#[test]
fn test_literal_types() {
    assert_eq!(check_one(Expr::Int(1)), Ok(Ty::Int));
    assert_eq!(check_one(Expr::Float(1.5)), Ok(Ty::Float));
    assert_eq!(check_one(Expr::Bool(true)), Ok(Ty::Bool));
    assert_eq!(check_one(Expr::string("s")), Ok(Ty::Str));
    assert_eq!(check_one(Expr::Nil), Ok(Ty::Nil));
}

/// Quoted data and macro definitions are opaque to the checker.
#[test]
fn test_inert_forms() {
    assert_eq!(
        check_one(Expr::Quote(Box::new(Expr::symbol("whatever")))),
        Ok(Ty::Any)
    );
    assert_eq!(
        check_one(Expr::DefineMacro {
            name: "twice".into(),
            params: vec!["e".into()],
            body: Box::new(Expr::symbol("e")),
        }),
        Ok(Ty::Nil)
    );
    assert_eq!(
        check_one(Expr::Pair(Box::new(Expr::Int(1)), Box::new(Expr::Int(2)))),
        Ok(Ty::pair(Ty::Any, Ty::Any))
    );
}

/// A sequence types as its last expression; an empty sequence is `Nil`.
#[test]
fn test_sequence_types_as_last() {
    assert_eq!(
        check(vec![Expr::Int(1), Expr::string("s")]),
        Ok(Ty::Str)
    );
    assert_eq!(check(vec![]), Ok(Ty::Nil));
}

#[test]
fn test_undefined_symbol() {
    assert_eq!(
        check_one(Expr::symbol("ghost")),
        Err(CheckError::UndefinedSymbol {
            name: "ghost".into()
        })
    );
}

// ── Arithmetic & comparison ────────────────────────────────────────────

/// Int + Int stays Int; a Float operand promotes; `/` always divides to
/// Float.
#[test]
fn test_numeric_promotion() {
    assert_eq!(
        check_one(Expr::binary(BinOp::Add, Expr::Int(1), Expr::Int(2))),
        Ok(Ty::Int)
    );
    assert_eq!(
        check_one(Expr::binary(BinOp::Add, Expr::Int(1), Expr::Float(2.0))),
        Ok(Ty::Float)
    );
    assert_eq!(
        check_one(Expr::binary(BinOp::Div, Expr::Int(1), Expr::Int(2))),
        Ok(Ty::Float)
    );
}

/// The prefix call form promotes the same way as the operator form.
#[test]
fn test_operator_call_form() {
    assert_eq!(
        check_one(Expr::call("+", vec![Expr::Int(1), Expr::Int(2)])),
        Ok(Ty::Int)
    );
    assert_eq!(
        check_one(Expr::call("*", vec![Expr::Float(2.0), Expr::Int(3)])),
        Ok(Ty::Float)
    );
    assert_eq!(
        check_one(Expr::call("<", vec![Expr::Int(1), Expr::Int(2)])),
        Ok(Ty::Bool)
    );
}

#[test]
fn test_comparison_returns_bool() {
    assert_eq!(
        check_one(Expr::binary(BinOp::Lt, Expr::Int(1), Expr::Int(2))),
        Ok(Ty::Bool)
    );
    assert_eq!(
        check_one(Expr::binary(BinOp::Eq, Expr::string("a"), Expr::string("b"))),
        Ok(Ty::Bool)
    );
}

#[test]
fn test_non_numeric_operand_rejected() {
    assert_eq!(
        check_one(Expr::binary(BinOp::Add, Expr::string("a"), Expr::Int(1))),
        Err(CheckError::NonNumericOperand {
            op: "+".into(),
            found: Ty::Str,
        })
    );
}

#[test]
fn test_unary_negation() {
    assert_eq!(
        check_one(Expr::prefix(PrefixOp::Neg, Expr::Int(3))),
        Ok(Ty::Int)
    );
    assert_eq!(
        check_one(Expr::prefix(PrefixOp::Neg, Expr::Float(3.5))),
        Ok(Ty::Float)
    );
    assert_eq!(
        check_one(Expr::prefix(PrefixOp::Neg, Expr::string("s"))),
        Err(CheckError::NonNumericOperand {
            op: "-".into(),
            found: Ty::Str,
        })
    );
}

// ── Conditionals ───────────────────────────────────────────────────────

/// Keyword `if` unifies branches, promoting Int/Float mixes.
#[test]
fn test_if_branch_unification() {
    assert_eq!(
        check_one(Expr::if_expr(Expr::Bool(true), Expr::Int(1), Expr::Int(2))),
        Ok(Ty::Int)
    );
    assert_eq!(
        check_one(Expr::if_expr(
            Expr::Bool(true),
            Expr::Int(1),
            Expr::Float(2.0)
        )),
        Ok(Ty::Float)
    );
}

/// Keyword `if` is permissive: incompatible arms fall back to `Any`.
#[test]
fn test_if_incompatible_branches_fall_back_to_any() {
    assert_eq!(
        check_one(Expr::if_expr(
            Expr::Bool(true),
            Expr::Int(1),
            Expr::string("s")
        )),
        Ok(Ty::Any)
    );
}

#[test]
fn test_if_non_bool_condition_rejected() {
    assert_eq!(
        check_one(Expr::if_expr(Expr::Int(1), Expr::Int(1), Expr::Int(2))),
        Err(CheckError::NonBoolCondition {
            form: "if".into(),
            found: Ty::Int,
        })
    );
}

/// The ternary form is strict: incompatible arms are a hard error.
#[test]
fn test_ternary_branch_mismatch_rejected() {
    assert_eq!(
        check_one(Expr::ternary(
            Expr::Bool(true),
            Expr::Int(1),
            Expr::string("s")
        )),
        Err(CheckError::BranchMismatch {
            then_ty: Ty::Int,
            else_ty: Ty::Str,
        })
    );
}

/// A `Nil` arm unifies with a list arm, the common empty-list idiom.
#[test]
fn test_ternary_nil_unifies_with_list() {
    assert_eq!(
        check_one(Expr::ternary(
            Expr::Bool(true),
            Expr::List(vec![Expr::Int(1)]),
            Expr::Nil
        )),
        Ok(Ty::list(Ty::Int))
    );
}

#[test]
fn test_ternary_condition_must_be_bool() {
    assert_eq!(
        check_one(Expr::ternary(Expr::Int(0), Expr::Int(1), Expr::Int(2))),
        Err(CheckError::NonBoolCondition {
            form: "ternary".into(),
            found: Ty::Int,
        })
    );
}

// ── Functions ──────────────────────────────────────────────────────────

/// Lambda parameters type as `Any`; the body decides the return type.
#[test]
fn test_lambda_types_as_function() {
    assert_eq!(
        check_one(Expr::lambda(
            vec!["a", "b"],
            Expr::binary(BinOp::Add, Expr::symbol("a"), Expr::symbol("b"))
        )),
        Ok(Ty::func(vec![Ty::Any, Ty::Any], Ty::Float))
    );
}

#[test]
fn test_apply_returns_declared_type() {
    let result = check(vec![
        Expr::assign("f", Expr::lambda(vec!["a"], Expr::Bool(true))),
        Expr::call("f", vec![Expr::Int(1)]),
    ]);
    assert_eq!(result, Ok(Ty::Bool));
}

#[test]
fn test_arity_mismatch_rejected() {
    let result = check(vec![
        Expr::assign("f", Expr::lambda(vec!["a", "b"], Expr::Nil)),
        Expr::call("f", vec![Expr::Int(1)]),
    ]);
    assert_eq!(
        result,
        Err(CheckError::ArityMismatch {
            callee: "f".into(),
            expected: 2,
            found: 1,
        })
    );
}

#[test]
fn test_calling_non_function_rejected() {
    let result = check(vec![
        Expr::assign("x", Expr::Int(1)),
        Expr::call("x", vec![Expr::Int(2)]),
    ]);
    assert_eq!(result, Err(CheckError::NotCallable { ty: Ty::Int }));
}

/// A reference cannot be passed where a plain value is expected.
#[test]
fn test_ref_argument_to_value_param_rejected() {
    let result = check(vec![
        Expr::assign("x", Expr::Int(1)),
        Expr::binary(
            BinOp::Add,
            Expr::Int(1),
            Expr::prefix(PrefixOp::Ref, Expr::symbol("x")),
        ),
    ]);
    assert_eq!(
        result,
        Err(CheckError::RefArgToValueParam {
            callee: "+".into(),
            index: 1,
            found: Ty::reference(Ty::Int),
        })
    );
}

// ── Assignment ─────────────────────────────────────────────────────────

/// An Int may flow into an established Float binding, nothing else widens.
#[test]
fn test_assignment_widening() {
    assert_eq!(
        check(vec![
            Expr::assign("x", Expr::Float(1.5)),
            Expr::assign("x", Expr::Int(2)),
            Expr::symbol("x"),
        ]),
        Ok(Ty::Float)
    );
    assert_eq!(
        check(vec![
            Expr::assign("x", Expr::Int(1)),
            Expr::assign("x", Expr::string("s")),
        ]),
        Err(CheckError::AssignMismatch {
            name: "x".into(),
            expected: Ty::Int,
            found: Ty::Str,
        })
    );
}

/// Assignment itself evaluates to `Nil`.
#[test]
fn test_assignment_evaluates_to_nil() {
    assert_eq!(check_one(Expr::assign("x", Expr::Int(1))), Ok(Ty::Nil));
}

// ── References ─────────────────────────────────────────────────────────

#[test]
fn test_deref_of_reference() {
    let result = check(vec![
        Expr::assign("x", Expr::Int(1)),
        Expr::assign("r", Expr::prefix(PrefixOp::Ref, Expr::symbol("x"))),
        Expr::prefix(PrefixOp::Deref, Expr::symbol("r")),
    ]);
    assert_eq!(result, Ok(Ty::Int));
}

#[test]
fn test_deref_of_non_reference_rejected() {
    assert_eq!(
        check_one(Expr::prefix(PrefixOp::Deref, Expr::Int(1))),
        Err(CheckError::DerefNonRef { ty: Ty::Int })
    );
}

// ── Lists ──────────────────────────────────────────────────────────────

/// Homogeneous literals refine the element type; mixed fall back to Any.
#[test]
fn test_list_element_inference() {
    assert_eq!(
        check_one(Expr::List(vec![Expr::Int(1), Expr::Int(2)])),
        Ok(Ty::list(Ty::Int))
    );
    assert_eq!(
        check_one(Expr::List(vec![Expr::Int(1), Expr::string("s")])),
        Ok(Ty::list(Ty::Any))
    );
    assert_eq!(check_one(Expr::List(vec![])), Ok(Ty::list(Ty::Any)));
}

#[test]
fn test_indexing() {
    let xs = Expr::List(vec![Expr::Int(1), Expr::Int(2)]);
    assert_eq!(
        check_one(Expr::index(xs.clone(), Expr::Int(0))),
        Ok(Ty::Int)
    );
    assert_eq!(
        check_one(Expr::index(xs, Expr::Float(0.0))),
        Err(CheckError::IndexNotInt { found: Ty::Float })
    );
    assert_eq!(
        check_one(Expr::index(Expr::Int(1), Expr::Int(0))),
        Err(CheckError::IndexNonList { ty: Ty::Int })
    );
}

#[test]
fn test_slicing() {
    let xs = Expr::List(vec![Expr::Int(1), Expr::Int(2)]);
    assert_eq!(
        check_one(Expr::slice(xs.clone(), Some(Expr::Int(0)), None)),
        Ok(Ty::list(Ty::Int))
    );
    assert_eq!(
        check_one(Expr::slice(xs, None, Some(Expr::string("end")))),
        Err(CheckError::SliceBoundNotInt { found: Ty::Str })
    );
    assert_eq!(
        check_one(Expr::slice(Expr::Bool(true), None, None)),
        Err(CheckError::SliceNonList { ty: Ty::Bool })
    );
}

// ── Pairs ──────────────────────────────────────────────────────────────

#[test]
fn test_cons_car_cdr() {
    let pair = Expr::call("cons", vec![Expr::Int(1), Expr::Int(2)]);
    assert_eq!(check_one(pair.clone()), Ok(Ty::pair(Ty::Any, Ty::Any)));
    assert_eq!(check_one(Expr::call("car", vec![pair.clone()])), Ok(Ty::Any));
    assert_eq!(check_one(Expr::call("cdr", vec![pair])), Ok(Ty::Any));
}

#[test]
fn test_car_of_non_pair_rejected() {
    assert_eq!(
        check_one(Expr::call("car", vec![Expr::Int(1)])),
        Err(CheckError::ArgMismatch {
            callee: "car".into(),
            index: 0,
            expected: Ty::pair(Ty::Any, Ty::Any),
            found: Ty::Int,
        })
    );
}

/// `Nil` is accepted where a pair is expected, the empty-list idiom.
#[test]
fn test_car_accepts_nil() {
    assert_eq!(check_one(Expr::call("car", vec![Expr::Nil])), Ok(Ty::Any));
}

#[test]
fn test_predicates_return_bool() {
    assert_eq!(
        check_one(Expr::call("int?", vec![Expr::Int(1)])),
        Ok(Ty::Bool)
    );
    assert_eq!(
        check_one(Expr::call("nil?", vec![Expr::Nil])),
        Ok(Ty::Bool)
    );
}

// ── when / unless ──────────────────────────────────────────────────────

/// `when` types as its last body expression.
#[test]
fn test_when_types_as_body() {
    assert_eq!(
        check_one(Expr::call(
            "when",
            vec![Expr::Bool(true), Expr::Int(1), Expr::string("s")]
        )),
        Ok(Ty::Str)
    );
}

#[test]
fn test_unless_condition_must_be_bool() {
    assert_eq!(
        check_one(Expr::call("unless", vec![Expr::Int(1), Expr::Nil])),
        Err(CheckError::NonBoolCondition {
            form: "unless".into(),
            found: Ty::Int,
        })
    );
}

/// Special-form names are not bindings; outside call position they are
/// opaque rather than undefined.
#[test]
fn test_special_form_name_in_value_position() {
    assert_eq!(check_one(Expr::symbol("when")), Ok(Ty::Any));
    assert_eq!(check_one(Expr::symbol("swap")), Ok(Ty::Any));
}

#[test]
fn test_when_requires_condition() {
    assert_eq!(
        check_one(Expr::call("when", vec![])),
        Err(CheckError::ArityMismatch {
            callee: "when".into(),
            expected: 1,
            found: 0,
        })
    );
}
