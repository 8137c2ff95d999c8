//! Checker error types.
//!
//! All type and ownership violations surface as one [`CheckError`].
//! Checking is fail-fast: the first violation aborts the whole pass, so an
//! error is always about the first offending node in evaluation order.
//! Internal inconsistencies (malformed trees, unreachable shapes) use
//! [`CheckError::Internal`] rather than being silently swallowed.

use std::fmt;

use serde::Serialize;

use crate::ty::Ty;

/// A type or ownership error found while checking a Sable program.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum CheckError {
    /// A variable is used but not defined in any scope.
    UndefinedSymbol { name: String },
    /// A binding was read after its value had been moved out.
    UseOfMoved { name: String },
    /// Assignment value incompatible with the target's established type.
    AssignMismatch {
        name: String,
        expected: Ty,
        found: Ty,
    },
    /// Argument incompatible with the parameter type at `index` (0-based).
    ArgMismatch {
        callee: String,
        index: usize,
        expected: Ty,
        found: Ty,
    },
    /// A reference was passed where the callee expects a plain value.
    RefArgToValueParam {
        callee: String,
        index: usize,
        found: Ty,
    },
    /// Ternary branches produced incompatible types.
    BranchMismatch { then_ty: Ty, else_ty: Ty },
    /// A condition slot did not type as `Bool`.
    NonBoolCondition { form: String, found: Ty },
    /// A function was called with the wrong number of arguments.
    ArityMismatch {
        callee: String,
        expected: usize,
        found: usize,
    },
    /// A non-function value sat in operator position.
    NotCallable { ty: Ty },
    /// A second borrow was taken while one was still active.
    AlreadyBorrowed { name: String },
    /// A borrow was attempted on a moved-out binding.
    BorrowOfMoved { name: String },
    /// Assignment to a binding with an outstanding borrow.
    AssignWhileBorrowed { name: String },
    /// Move of a binding with an outstanding borrow.
    MoveWhileBorrowed { name: String },
    /// A borrow release was requested for a binding that is not borrowed.
    NotBorrowed { name: String },
    /// `&` applied to an expression that names no storage location.
    RefToTemporary,
    /// `&` applied to an immutable binding.
    RefToImmutable { name: String },
    /// `*` applied to a non-reference.
    DerefNonRef { ty: Ty },
    /// A name was defined twice in the same scope.
    DuplicateBinding { name: String },
    /// An arithmetic operator received a non-numeric operand.
    NonNumericOperand { op: String, found: Ty },
    /// Indexing applied to a non-list.
    IndexNonList { ty: Ty },
    /// Slicing applied to a non-list.
    SliceNonList { ty: Ty },
    /// The index expression did not type as `Int`.
    IndexNotInt { found: Ty },
    /// A slice bound did not type as `Int`.
    SliceBoundNotInt { found: Ty },
    /// `swap` requires a mutable place (bare variable) operand.
    SwapNotAPlace { operand: String },
    /// `swap` operands have incompatible types.
    SwapMismatch { left: Ty, right: Ty },
    /// Checker invariant violation. Always a bug, never user error.
    Internal(String),
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::UndefinedSymbol { name } => {
                write!(f, "undefined symbol `{}`", name)
            }
            CheckError::UseOfMoved { name } => {
                write!(f, "use of moved value `{}`", name)
            }
            CheckError::AssignMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "cannot assign `{}` to `{}`: expected `{}`",
                found, name, expected
            ),
            CheckError::ArgMismatch {
                callee,
                index,
                expected,
                found,
            } => write!(
                f,
                "argument {} of `{}`: expected `{}`, found `{}`",
                index + 1,
                callee,
                expected,
                found
            ),
            CheckError::RefArgToValueParam {
                callee,
                index,
                found,
            } => write!(
                f,
                "argument {} of `{}`: expected a value, found reference `{}`",
                index + 1,
                callee,
                found
            ),
            CheckError::BranchMismatch { then_ty, else_ty } => write!(
                f,
                "ternary branches have incompatible types: `{}` and `{}`",
                then_ty, else_ty
            ),
            CheckError::NonBoolCondition { form, found } => write!(
                f,
                "`{}` condition must be `Bool`, found `{}`",
                form, found
            ),
            CheckError::ArityMismatch {
                callee,
                expected,
                found,
            } => write!(
                f,
                "`{}` expects {} arguments, found {}",
                callee, expected, found
            ),
            CheckError::NotCallable { ty } => {
                write!(f, "`{}` is not callable", ty)
            }
            CheckError::AlreadyBorrowed { name } => {
                write!(f, "cannot borrow `{}`: already borrowed", name)
            }
            CheckError::BorrowOfMoved { name } => {
                write!(f, "cannot borrow `{}`: value has been moved", name)
            }
            CheckError::AssignWhileBorrowed { name } => {
                write!(f, "cannot assign to `{}` while it is borrowed", name)
            }
            CheckError::MoveWhileBorrowed { name } => {
                write!(f, "cannot move `{}` while it is borrowed", name)
            }
            CheckError::NotBorrowed { name } => {
                write!(f, "`{}` is not borrowed", name)
            }
            CheckError::RefToTemporary => {
                write!(f, "cannot take a reference to a temporary value")
            }
            CheckError::RefToImmutable { name } => {
                write!(f, "cannot take a reference to immutable binding `{}`", name)
            }
            CheckError::DerefNonRef { ty } => {
                write!(f, "cannot dereference non-reference type `{}`", ty)
            }
            CheckError::DuplicateBinding { name } => {
                write!(f, "`{}` is already defined in this scope", name)
            }
            CheckError::NonNumericOperand { op, found } => {
                write!(f, "operator `{}` expects numeric operands, found `{}`", op, found)
            }
            CheckError::IndexNonList { ty } => {
                write!(f, "cannot index non-list type `{}`", ty)
            }
            CheckError::SliceNonList { ty } => {
                write!(f, "cannot slice non-list type `{}`", ty)
            }
            CheckError::IndexNotInt { found } => {
                write!(f, "list index must be `Int`, found `{}`", found)
            }
            CheckError::SliceBoundNotInt { found } => {
                write!(f, "slice bound must be `Int`, found `{}`", found)
            }
            CheckError::SwapNotAPlace { operand } => {
                write!(f, "`swap` operand `{}` is not a mutable place", operand)
            }
            CheckError::SwapMismatch { left, right } => {
                write!(
                    f,
                    "`swap` operands have incompatible types: `{}` and `{}`",
                    left, right
                )
            }
            CheckError::Internal(detail) => {
                write!(f, "internal checker error: {}", detail)
            }
        }
    }
}

impl std::error::Error for CheckError {}
