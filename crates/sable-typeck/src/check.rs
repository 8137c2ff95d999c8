//! The recursive type-and-ownership checking engine.
//!
//! One pass over the expression tree produces a type for every node while
//! enforcing ownership discipline: no use of a moved value, at most one
//! active borrow per binding, no mutation or move of a borrowed binding.
//!
//! The engine threads three environments through the traversal, extended
//! together for every new scope:
//! - [`TypeEnv`]: what type a binding has, and whether it is mutable
//! - [`BorrowEnv`]: whether a binding is legally accessible under borrow
//!   rules right now (static ledger)
//! - [`RuntimeEnv`]: what would happen to the binding's memory state if
//!   this tree were executed (runtime simulation)
//!
//! Checking is single-threaded, synchronous, and destructive: borrow and
//! runtime state is consumed as the traversal proceeds, so a tree cannot
//! be re-checked through the same `Checker`. Conditional branches are
//! checked against the same entry state without post-branch reconciliation;
//! a move inside one arm is visible while checking its sibling.

use sable_ast::{BinOp, Expr, PrefixOp};

use crate::borrow::{BorrowEnv, BorrowId};
use crate::builtins::register_builtins;
use crate::env::TypeEnv;
use crate::error::CheckError;
use crate::runtime::{AssignSource, MemoryState, RuntimeEnv};
use crate::ty::Ty;

/// Names handled as special forms in call position. They are not
/// bindings; a bare occurrence types as `Any`.
const SPECIAL_FORMS: [&str; 3] = ["when", "unless", "swap"];

/// The checking engine. Construct with [`Checker::new`], feed top-level
/// expressions to [`Checker::check`].
pub struct Checker {
    types: TypeEnv,
    borrows: BorrowEnv,
    runtime: RuntimeEnv,
}

impl Checker {
    /// A checker with fresh global environments, builtins pre-registered.
    pub fn new() -> Self {
        let mut types = TypeEnv::new();
        register_builtins(&mut types);
        Checker {
            types,
            borrows: BorrowEnv::new(),
            runtime: RuntimeEnv::new(),
        }
    }

    /// Infer the type of `expr`, enforcing type and ownership rules.
    ///
    /// Fail-fast: the first violation aborts the pass, and the checker's
    /// environments are left mid-flight -- build a fresh `Checker` rather
    /// than reusing one after an error.
    pub fn check(&mut self, expr: &Expr) -> Result<Ty, CheckError> {
        match expr {
            // ── Atoms ───────────────────────────────────────────────
            Expr::Int(_) => Ok(Ty::Int),
            Expr::Float(_) => Ok(Ty::Float),
            Expr::Bool(_) => Ok(Ty::Bool),
            Expr::Str(_) => Ok(Ty::Str),
            Expr::Nil => Ok(Ty::Nil),

            Expr::Symbol(name) => self.check_symbol(name),

            // Quoted data is structure, not code; its precise shape is not
            // tracked.
            Expr::Quote(_) => Ok(Ty::Any),
            Expr::Pair(_, _) => Ok(Ty::pair(Ty::Any, Ty::Any)),

            // Macro expansion ran before checking; the definition is inert.
            Expr::DefineMacro { .. } => Ok(Ty::Nil),

            // ── Control ─────────────────────────────────────────────
            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => self.check_if(cond, then_branch, else_branch),
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
            } => self.check_ternary(cond, then_expr, else_expr),
            Expr::Seq(exprs) => {
                let mut last = Ty::Nil;
                for e in exprs {
                    last = self.check(e)?;
                }
                Ok(last)
            }

            // ── Functions ───────────────────────────────────────────
            Expr::Lambda { params, body } => self.check_lambda(params, body),
            Expr::Apply { callee, args } => self.check_apply(callee, args),

            // ── Bindings & operators ────────────────────────────────
            Expr::Assign { target, value } => self.check_assign(target, value),
            Expr::Prefix { op, operand } => self.check_prefix(*op, operand),
            Expr::Binary { op, lhs, rhs } => self.check_binary(*op, lhs, rhs),

            // ── Lists ───────────────────────────────────────────────
            Expr::List(elems) => {
                let mut tys = Vec::with_capacity(elems.len());
                for e in elems {
                    tys.push(self.check(e)?);
                }
                let elem_ty = match tys.split_first() {
                    Some((first, rest)) if rest.iter().all(|t| t == first) => first.clone(),
                    // Empty or mixed literals fall back to List<Any>.
                    _ => Ty::Any,
                };
                Ok(Ty::list(elem_ty))
            }
            Expr::Index { seq, index } => self.check_index(seq, index),
            Expr::Slice { seq, start, end } => self.check_slice(seq, start, end),
        }
    }

    /// Explicitly end the most recent borrow of `name`: the ledger token is
    /// surrendered and the simulated value returns to `Valid`.
    pub fn release_borrow(&mut self, name: &str) -> Result<(), CheckError> {
        let token = self
            .borrows
            .state(name)
            .and_then(|s| s.latest_borrow())
            .ok_or_else(|| CheckError::NotBorrowed { name: name.into() })?;
        self.borrows
            .state_mut(name)
            .expect("state present: token was found")
            .remove_borrow(token, name)?;
        self.runtime.return_borrowed_value(name)
    }

    // ── Node rules ──────────────────────────────────────────────────

    fn check_symbol(&mut self, name: &str) -> Result<Ty, CheckError> {
        if SPECIAL_FORMS.contains(&name) {
            return Ok(Ty::Any);
        }
        let binding = self
            .types
            .lookup(name)
            .ok_or_else(|| CheckError::UndefinedSymbol { name: name.into() })?;
        let ty = binding.ty.clone();

        // Builtins never enter the runtime table; anything else must not
        // have been moved out. Reading while borrowed is permitted: the
        // owner may observe a value its exclusive borrow is loaned from.
        if let Ok(rt) = self.runtime.get_runtime_value(name) {
            if !rt.is_valid() {
                return Err(CheckError::UseOfMoved { name: name.into() });
            }
        }
        Ok(ty)
    }

    fn check_if(
        &mut self,
        cond: &Expr,
        then_branch: &Expr,
        else_branch: &Expr,
    ) -> Result<Ty, CheckError> {
        let cond_ty = self.check(cond)?;
        if !matches!(cond_ty, Ty::Bool | Ty::Any) {
            return Err(CheckError::NonBoolCondition {
                form: "if".into(),
                found: cond_ty,
            });
        }
        let then_ty = self.check(then_branch)?;
        let else_ty = self.check(else_branch)?;
        Ok(Self::unify_branches(then_ty, else_ty).unwrap_or(Ty::Any))
    }

    fn check_ternary(
        &mut self,
        cond: &Expr,
        then_expr: &Expr,
        else_expr: &Expr,
    ) -> Result<Ty, CheckError> {
        let cond_ty = self.check(cond)?;
        if cond_ty != Ty::Bool {
            return Err(CheckError::NonBoolCondition {
                form: "ternary".into(),
                found: cond_ty,
            });
        }
        let then_ty = self.check(then_expr)?;
        let else_ty = self.check(else_expr)?;
        Self::unify_branches(then_ty.clone(), else_ty.clone())
            .ok_or(CheckError::BranchMismatch { then_ty, else_ty })
    }

    /// Branch result unification: identical types pass through, an `Any`
    /// arm yields the other arm's type, an `Int`/`Float` mix promotes to
    /// `Float`, and `Nil` unifies with a `List`/`Pair` arm. `None` means
    /// the arms are incompatible -- the ternary form hard-errors on that,
    /// the keyword `if` form falls back to `Any`.
    fn unify_branches(then_ty: Ty, else_ty: Ty) -> Option<Ty> {
        match (then_ty, else_ty) {
            (t, e) if t == e => Some(t),
            (Ty::Any, e) => Some(e),
            (t, Ty::Any) => Some(t),
            (Ty::Int, Ty::Float) | (Ty::Float, Ty::Int) => Some(Ty::Float),
            (t @ (Ty::List(_) | Ty::Pair(_, _)), Ty::Nil) => Some(t),
            (Ty::Nil, e @ (Ty::List(_) | Ty::Pair(_, _))) => Some(e),
            _ => None,
        }
    }

    fn check_lambda(&mut self, params: &[String], body: &Expr) -> Result<Ty, CheckError> {
        self.types.push_scope();
        self.borrows.push_scope();
        self.runtime.push_scope();

        for param in params {
            // Parameters are immutable Any bindings; the call site decides
            // copy-vs-move, so the body starts from a placeholder value.
            self.types.define(param.clone(), Ty::Any, false);
            self.borrows.ensure_local(param);
            self.runtime.define(param, Expr::Nil)?;
        }

        let body_ty = match body {
            Expr::Seq(exprs) => {
                let mut last = Ty::Nil;
                for e in exprs {
                    last = self.check(e)?;
                }
                last
            }
            Expr::Nil => Ty::Nil,
            single => self.check(single)?,
        };

        // Parameter and local drop simulation, then the scopes unwind.
        self.runtime.exit_scope();
        self.borrows.pop_scope();
        self.types.pop_scope();

        Ok(Ty::func(vec![Ty::Any; params.len()], body_ty))
    }

    fn check_apply(&mut self, callee: &Expr, args: &[Expr]) -> Result<Ty, CheckError> {
        // Special forms keep their surface spelling through expansion.
        if let Some(name) = callee.as_symbol() {
            match name {
                "when" | "unless" => return self.check_conditional_form(name, args),
                "swap" => return self.check_swap(args),
                _ => {}
            }
        }

        let callee_ty = self.check(callee)?;
        let (param_tys, ret_ty) = match callee_ty {
            Ty::Func(params, ret) => (params, *ret),
            other => return Err(CheckError::NotCallable { ty: other }),
        };

        let mut arg_tys = Vec::with_capacity(args.len());
        for arg in args {
            arg_tys.push(self.check(arg)?);
        }

        let callee_name = match callee.as_symbol() {
            Some(name) => name.to_string(),
            None => callee.to_string(),
        };
        if arg_tys.len() != param_tys.len() {
            return Err(CheckError::ArityMismatch {
                callee: callee_name,
                expected: param_tys.len(),
                found: arg_tys.len(),
            });
        }

        self.check_arguments(&callee_name, &param_tys, args, &arg_tys)?;

        // Builtin operators get refined return types from their operands.
        if let Some(op) = callee.as_symbol() {
            if crate::builtins::ARITHMETIC_OPS.contains(&op) {
                return Self::numeric_result(op, &arg_tys);
            }
            if crate::builtins::COMPARISON_OPS.contains(&op) {
                return Ok(Ty::Bool);
            }
        }
        Ok(ret_ty)
    }

    /// The argument-passing protocol, shared by `Apply` and the binary
    /// operator form.
    ///
    /// A `Ref` parameter borrows its argument as part of the call: the
    /// argument must be a bare mutable variable that is neither borrowed
    /// nor moved, and the borrow lands immediately so aliasing between two
    /// arguments of one call is caught. A value parameter fed a bare
    /// variable of a non-copy type MOVES that variable; literals and
    /// computed expressions never move anything.
    fn check_arguments(
        &mut self,
        callee: &str,
        param_tys: &[Ty],
        args: &[Expr],
        arg_tys: &[Ty],
    ) -> Result<(), CheckError> {
        for (index, (param_ty, (arg, arg_ty))) in
            param_tys.iter().zip(args.iter().zip(arg_tys)).enumerate()
        {
            if let Ty::Ref(pointee) = param_ty {
                let name = arg.as_symbol().ok_or(CheckError::RefToTemporary)?;
                let binding = self
                    .types
                    .lookup(name)
                    .ok_or_else(|| CheckError::UndefinedSymbol { name: name.into() })?;
                if !binding.mutable {
                    return Err(CheckError::RefToImmutable { name: name.into() });
                }
                let arg_pointee = match arg_ty {
                    Ty::Ref(p) => p.as_ref(),
                    other => other,
                };
                if !arg_pointee.compatible(pointee) {
                    return Err(CheckError::ArgMismatch {
                        callee: callee.into(),
                        index,
                        expected: param_ty.clone(),
                        found: arg_ty.clone(),
                    });
                }
                self.take_borrow(name)?;
            } else {
                if let Ty::Ref(_) = arg_ty {
                    return Err(CheckError::RefArgToValueParam {
                        callee: callee.into(),
                        index,
                        found: arg_ty.clone(),
                    });
                }
                let widened = *param_ty == Ty::Float && *arg_ty == Ty::Int;
                let nil_as_seq =
                    *arg_ty == Ty::Nil && matches!(param_ty, Ty::List(_) | Ty::Pair(_, _));
                if !(arg_ty.compatible(param_ty) || widened || nil_as_seq) {
                    return Err(CheckError::ArgMismatch {
                        callee: callee.into(),
                        index,
                        expected: param_ty.clone(),
                        found: arg_ty.clone(),
                    });
                }
                if let Some(name) = arg.as_symbol() {
                    if !arg_ty.is_copy() {
                        // Passing a non-copy value by name consumes it.
                        self.move_binding(name)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn check_assign(&mut self, target: &str, value: &Expr) -> Result<Ty, CheckError> {
        let value_ty = self.check(value)?;
        let is_copyable = value_ty.is_copy();

        match self.types.lookup(target).map(|b| b.ty.clone()) {
            Some(target_ty) => {
                if self.borrows.state(target).is_some_and(|s| s.is_borrowed()) {
                    return Err(CheckError::AssignWhileBorrowed {
                        name: target.into(),
                    });
                }
                let widened = target_ty == Ty::Float && value_ty == Ty::Int;
                if !(value_ty.compatible(&target_ty) || widened) {
                    return Err(CheckError::AssignMismatch {
                        name: target.into(),
                        expected: target_ty,
                        found: value_ty,
                    });
                }
                self.assign_from(target, value, is_copyable)?;
                // The binding owns a fresh value again.
                if let Some(state) = self.borrows.state_mut(target) {
                    state.reset_moved();
                }
            }
            None => {
                self.types.define(target, value_ty, true);
                self.borrows.ensure_local(target);
                if value.as_symbol().is_some() {
                    self.assign_from(target, value, is_copyable)?;
                } else {
                    // A literal or computed result has no prior binding;
                    // define directly, nothing can be moved from.
                    self.runtime.define(target, value.clone())?;
                }
            }
        }
        Ok(Ty::Nil)
    }

    /// Route an assignment source through the runtime simulator, mirroring
    /// any move into the static ledger.
    fn assign_from(
        &mut self,
        target: &str,
        value: &Expr,
        is_copyable: bool,
    ) -> Result<(), CheckError> {
        match value.as_symbol() {
            Some(src) => {
                self.runtime.assign_value(
                    target,
                    AssignSource::Binding(src.to_string()),
                    is_copyable,
                )?;
                if !is_copyable {
                    self.mark_ledger_moved(src)?;
                }
                Ok(())
            }
            None => self
                .runtime
                .assign_value(target, AssignSource::Value(value.clone()), is_copyable),
        }
    }

    fn check_prefix(&mut self, op: PrefixOp, operand: &Expr) -> Result<Ty, CheckError> {
        match op {
            PrefixOp::Neg => {
                let ty = self.check(operand)?;
                if !ty.is_numeric() {
                    return Err(CheckError::NonNumericOperand {
                        op: "-".into(),
                        found: ty,
                    });
                }
                Ok(if ty == Ty::Any { Ty::Float } else { ty })
            }
            PrefixOp::Ref => {
                let operand_ty = self.check(operand)?;
                let name = operand.as_symbol().ok_or(CheckError::RefToTemporary)?;
                let binding = self
                    .types
                    .lookup(name)
                    .ok_or_else(|| CheckError::UndefinedSymbol { name: name.into() })?;
                if !binding.mutable {
                    return Err(CheckError::RefToImmutable { name: name.into() });
                }
                self.take_borrow(name)?;
                Ok(Ty::reference(operand_ty))
            }
            PrefixOp::Deref => {
                let ty = self.check(operand)?;
                match ty {
                    Ty::Ref(pointee) => Ok(*pointee),
                    other => Err(CheckError::DerefNonRef { ty: other }),
                }
            }
        }
    }

    fn check_binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> Result<Ty, CheckError> {
        let lhs_ty = self.check(lhs)?;
        let rhs_ty = self.check(rhs)?;

        let symbol = op.symbol();
        let param_tys = match self.types.lookup(symbol).map(|b| &b.ty) {
            Some(Ty::Func(params, _)) => params.clone(),
            _ => {
                return Err(CheckError::Internal(format!(
                    "binary operator `{}` has no builtin signature",
                    symbol
                )))
            }
        };
        if param_tys.len() != 2 {
            return Err(CheckError::Internal(format!(
                "binary operator `{}` registered with arity {}",
                symbol,
                param_tys.len()
            )));
        }

        let arg_tys = [lhs_ty, rhs_ty];
        let args = [lhs.clone(), rhs.clone()];
        self.check_arguments(symbol, &param_tys, &args, &arg_tys)?;

        if op.is_arithmetic() {
            Self::numeric_result(symbol, &arg_tys)
        } else {
            Ok(Ty::Bool)
        }
    }

    /// Numeric return-type promotion: `Int, Int -> Int`, any `Float`
    /// operand promotes to `Float`, `/` always returns `Float`, and an
    /// `Any` operand defaults the result to `Float`.
    fn numeric_result(op: &str, arg_tys: &[Ty]) -> Result<Ty, CheckError> {
        if let Some(bad) = arg_tys.iter().find(|t| !t.is_numeric()) {
            return Err(CheckError::NonNumericOperand {
                op: op.into(),
                found: bad.clone(),
            });
        }
        if op == "/" {
            return Ok(Ty::Float);
        }
        if arg_tys.iter().any(|t| *t == Ty::Float) {
            Ok(Ty::Float)
        } else if arg_tys.iter().all(|t| *t == Ty::Int) {
            Ok(Ty::Int)
        } else {
            Ok(Ty::Float)
        }
    }

    fn check_index(&mut self, seq: &Expr, index: &Expr) -> Result<Ty, CheckError> {
        let seq_ty = self.check(seq)?;
        let elem_ty = match seq_ty {
            Ty::List(elem) => *elem,
            other => return Err(CheckError::IndexNonList { ty: other }),
        };
        let index_ty = self.check(index)?;
        if index_ty != Ty::Int {
            return Err(CheckError::IndexNotInt { found: index_ty });
        }
        // Bounds are a runtime concern; the checker only fixes the types.
        Ok(elem_ty)
    }

    fn check_slice(
        &mut self,
        seq: &Expr,
        start: &Option<Box<Expr>>,
        end: &Option<Box<Expr>>,
    ) -> Result<Ty, CheckError> {
        let seq_ty = self.check(seq)?;
        if !matches!(seq_ty, Ty::List(_)) {
            return Err(CheckError::SliceNonList { ty: seq_ty });
        }
        for bound in [start, end].into_iter().flatten() {
            let bound_ty = self.check(bound)?;
            if bound_ty != Ty::Int {
                return Err(CheckError::SliceBoundNotInt { found: bound_ty });
            }
        }
        Ok(seq_ty)
    }

    // ── Special forms ───────────────────────────────────────────────

    /// `(when cond body...)` / `(unless cond body...)`: condition must be
    /// `Bool` (or `Any`); the result is the last body expression's type.
    fn check_conditional_form(&mut self, form: &str, args: &[Expr]) -> Result<Ty, CheckError> {
        let (cond, body) = args.split_first().ok_or_else(|| CheckError::ArityMismatch {
            callee: form.into(),
            expected: 1,
            found: 0,
        })?;
        let cond_ty = self.check(cond)?;
        if !matches!(cond_ty, Ty::Bool | Ty::Any) {
            return Err(CheckError::NonBoolCondition {
                form: form.into(),
                found: cond_ty,
            });
        }
        let mut last = Ty::Nil;
        for e in body {
            last = self.check(e)?;
        }
        Ok(last)
    }

    /// `(swap a b)`: both operands must be mutable places with compatible
    /// types, and neither may be borrowed or moved. The checker validates;
    /// the evaluator performs the exchange.
    fn check_swap(&mut self, args: &[Expr]) -> Result<Ty, CheckError> {
        if args.len() != 2 {
            return Err(CheckError::ArityMismatch {
                callee: "swap".into(),
                expected: 2,
                found: args.len(),
            });
        }
        for arg in args {
            let name = match arg.as_symbol() {
                Some(name) => name,
                None => {
                    return Err(CheckError::SwapNotAPlace {
                        operand: arg.to_string(),
                    })
                }
            };
            let mutable = self.types.lookup(name).is_some_and(|b| b.mutable);
            if !mutable {
                return Err(CheckError::SwapNotAPlace {
                    operand: name.into(),
                });
            }
        }

        // Symbol checks also reject moved operands.
        let left_ty = self.check(&args[0])?;
        let right_ty = self.check(&args[1])?;
        let int_float_mix = matches!(
            (&left_ty, &right_ty),
            (Ty::Int, Ty::Float) | (Ty::Float, Ty::Int)
        );
        if !(left_ty.compatible(&right_ty) || int_float_mix) {
            return Err(CheckError::SwapMismatch {
                left: left_ty,
                right: right_ty,
            });
        }

        for arg in args {
            let name = arg.as_symbol().expect("validated above");
            if self.borrows.state(name).is_some_and(|s| s.is_borrowed()) {
                return Err(CheckError::AssignWhileBorrowed { name: name.into() });
            }
            if let Ok(rt) = self.runtime.get_runtime_value(name) {
                if rt.state == MemoryState::Borrowed {
                    return Err(CheckError::AssignWhileBorrowed { name: name.into() });
                }
            }
        }
        Ok(Ty::Nil)
    }

    // ── Ownership plumbing ──────────────────────────────────────────

    /// Take an exclusive borrow of `name` in both trackers. The minted
    /// token is recorded in the ledger and surrendered on release.
    fn take_borrow(&mut self, name: &str) -> Result<BorrowId, CheckError> {
        if self.borrows.state(name).is_none() {
            self.borrows.ensure_local(name);
        }
        let token = self.borrows.mint_token();
        self.borrows
            .state_mut(name)
            .expect("state just ensured")
            .check_add_borrow(name)?;
        self.runtime.borrow_value(name)?;
        self.borrows
            .state_mut(name)
            .expect("state just ensured")
            .add_borrow(token);
        Ok(token)
    }

    /// Consume `name` in both trackers.
    fn move_binding(&mut self, name: &str) -> Result<(), CheckError> {
        self.runtime.move_value(name)?;
        self.mark_ledger_moved(name)
    }

    fn mark_ledger_moved(&mut self, name: &str) -> Result<(), CheckError> {
        if self.borrows.state(name).is_none() {
            self.borrows.ensure_local(name);
        }
        self.borrows
            .state_mut(name)
            .expect("state just ensured")
            .mark_as_moved(name)
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}
