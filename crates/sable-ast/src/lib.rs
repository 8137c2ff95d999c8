//! Sable expression-tree definitions.
//!
//! This crate defines the closed set of expression-tree node shapes the
//! Sable checker operates on. The tree is the output of the (external)
//! reader and macro expander: by the time a tree reaches the checker it
//! is fully macro-expanded and syntactically well-formed.
//!
//! The node set is deliberately a single sum type ([`expr::Expr`]) so that
//! every consumer dispatches with an exhaustive `match` -- adding a node
//! shape is a compile error at every traversal until handled.

pub mod expr;

pub use expr::{BinOp, Expr, PrefixOp};
