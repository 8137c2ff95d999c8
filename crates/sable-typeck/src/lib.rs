//! Static type and ownership checking for the expression language.
//!
//! The checker walks a [`sable_ast::Expr`] tree once and either produces
//! the tree's type or the first [`CheckError`] it encounters. Alongside
//! ordinary type inference it enforces an affine ownership discipline:
//! non-copy values move when assigned from a variable or passed by name,
//! a binding supports at most one live borrow, and a borrowed binding can
//! be neither mutated nor moved until the borrow is released.
//!
//! ```
//! use sable_ast::Expr;
//! use sable_typeck::{check_program, CheckError, Ty};
//!
//! let program = Expr::Seq(vec![
//!     Expr::assign("xs", Expr::List(vec![Expr::Int(1), Expr::Int(2)])),
//!     Expr::assign("ys", Expr::symbol("xs")),
//!     Expr::symbol("xs"),
//! ]);
//! assert_eq!(
//!     check_program(&program),
//!     Err(CheckError::UseOfMoved { name: "xs".into() }),
//! );
//! ```

pub mod borrow;
pub mod builtins;
pub mod check;
pub mod env;
pub mod error;
pub mod runtime;
pub mod ty;

pub use check::Checker;
pub use error::CheckError;
pub use ty::Ty;

/// Check a whole program with fresh environments and registered builtins.
pub fn check_program(root: &sable_ast::Expr) -> Result<Ty, CheckError> {
    let mut checker = Checker::new();
    checker.check(root)
}
