//! Built-in signature registration.
//!
//! Registers the primitive signatures every Sable program can see:
//! type predicates, arithmetic and comparison operators, and the pair
//! primitives `cons`/`car`/`cdr`. Called once at checker construction;
//! the resulting table lives in the global scope and is never mutated
//! afterwards.

use crate::env::TypeEnv;
use crate::ty::Ty;

/// The names the checker gives special return-type treatment in call
/// position (numeric promotion; comparisons typing as `Bool`).
pub const ARITHMETIC_OPS: [&str; 4] = ["+", "-", "*", "/"];
pub const COMPARISON_OPS: [&str; 6] = ["=", "==", "<", ">", "<=", ">="];

/// Register all built-in signatures into the global type environment.
///
/// After this call the environment contains:
/// - Type predicates: `int? float? bool? string? symbol? pair? list?
///   nil? null?` -- all `(Any) -> Bool`
/// - Arithmetic: `+ - *` as `(Any, Any) -> Any` (the checker refines the
///   return type from the operand types); `/` as `(Any, Any) -> Float`
/// - Comparison: `= == < > <= >=` -- all `(Any, Any) -> Bool`
/// - Pair primitives: `cons`, `car`, `cdr`
///
/// All builtins are immutable bindings: they can be called and passed
/// around, never borrowed or reassigned.
pub fn register_builtins(env: &mut TypeEnv) {
    // ── Type predicates ─────────────────────────────────────────────

    for pred in [
        "int?", "float?", "bool?", "string?", "symbol?", "pair?", "list?", "nil?", "null?",
    ] {
        env.define(pred, Ty::func(vec![Ty::Any], Ty::Bool), false);
    }

    // ── Arithmetic ──────────────────────────────────────────────────
    //
    // Declared loose: the call-site promotion rules (Int,Int -> Int, any
    // Float -> Float, `/` always Float) live in the checking engine,
    // which also rejects non-numeric operands.
    for op in ["+", "-", "*"] {
        env.define(op, Ty::func(vec![Ty::Any, Ty::Any], Ty::Any), false);
    }
    env.define("/", Ty::func(vec![Ty::Any, Ty::Any], Ty::Float), false);

    // ── Comparison ──────────────────────────────────────────────────

    for op in COMPARISON_OPS {
        env.define(op, Ty::func(vec![Ty::Any, Ty::Any], Ty::Bool), false);
    }

    // ── Pair primitives ─────────────────────────────────────────────

    env.define(
        "cons",
        Ty::func(vec![Ty::Any, Ty::Any], Ty::pair(Ty::Any, Ty::Any)),
        false,
    );
    env.define(
        "car",
        Ty::func(vec![Ty::pair(Ty::Any, Ty::Any)], Ty::Any),
        false,
    );
    env.define(
        "cdr",
        Ty::func(vec![Ty::pair(Ty::Any, Ty::Any)], Ty::Any),
        false,
    );
}
