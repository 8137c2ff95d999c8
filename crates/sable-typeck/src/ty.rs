//! Type representation for the Sable type system.
//!
//! Defines the core `Ty` enum: the closed set of type values the checker
//! can infer. Types are plain structural values -- construction, comparison,
//! and display, nothing else. There are no inference variables: Sable types
//! are always concrete, with `Any` standing in where the checker cannot (or
//! chooses not to) be more precise.

use std::fmt;

use serde::Serialize;

/// A Sable type.
///
/// Equality is structural (derived), except that compatibility checks treat
/// [`Ty::Any`] as matching everything -- use [`Ty::compatible`] rather than
/// `==` when deciding whether two types may meet.
///
/// `Ref` carries no mutability flag: the language has exactly one reference
/// kind, always exclusive and mutable.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Ty {
    Int,
    Float,
    Bool,
    Str,
    /// The type of the empty list `()`.
    Nil,
    /// The type of quoted symbols.
    Symbol,
    /// The universally-compatible unknown.
    Any,
    /// A cons pair: `Pair<car, cdr>`.
    Pair(Box<Ty>, Box<Ty>),
    /// A homogeneous list: `List<elem>`.
    List(Box<Ty>),
    /// A function: `(params) -> ret`.
    Func(Vec<Ty>, Box<Ty>),
    /// The exclusive mutable reference: `&pointee`.
    Ref(Box<Ty>),
}

impl Ty {
    /// Create a `Pair<car, cdr>` type.
    pub fn pair(car: Ty, cdr: Ty) -> Ty {
        Ty::Pair(Box::new(car), Box::new(cdr))
    }

    /// Create a `List<elem>` type.
    pub fn list(elem: Ty) -> Ty {
        Ty::List(Box::new(elem))
    }

    /// Create a function type.
    pub fn func(params: Vec<Ty>, ret: Ty) -> Ty {
        Ty::Func(params, Box::new(ret))
    }

    /// Create a reference type.
    pub fn reference(pointee: Ty) -> Ty {
        Ty::Ref(Box::new(pointee))
    }

    /// Whether values of this type are duplicated rather than consumed on
    /// assignment and argument passing.
    ///
    /// This predicate is the single source of truth for every move-vs-copy
    /// decision in the checker.
    pub fn is_copy(&self) -> bool {
        matches!(
            self,
            Ty::Int | Ty::Float | Ty::Bool | Ty::Str | Ty::Nil | Ty::Symbol | Ty::Any
        )
    }

    /// Whether this type is acceptable to the numeric operators.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Ty::Int | Ty::Float | Ty::Any)
    }

    /// Structural compatibility with `Any` as a wildcard on either side.
    ///
    /// Compound types recurse: `List<Any>` is compatible with `List<Int>`,
    /// and `&Int` with `&Any`.
    pub fn compatible(&self, other: &Ty) -> bool {
        match (self, other) {
            (Ty::Any, _) | (_, Ty::Any) => true,
            (Ty::Pair(a1, d1), Ty::Pair(a2, d2)) => a1.compatible(a2) && d1.compatible(d2),
            (Ty::List(e1), Ty::List(e2)) => e1.compatible(e2),
            (Ty::Ref(p1), Ty::Ref(p2)) => p1.compatible(p2),
            (Ty::Func(p1, r1), Ty::Func(p2, r2)) => {
                p1.len() == p2.len()
                    && p1.iter().zip(p2).all(|(a, b)| a.compatible(b))
                    && r1.compatible(r2)
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Int => write!(f, "Int"),
            Ty::Float => write!(f, "Float"),
            Ty::Bool => write!(f, "Bool"),
            Ty::Str => write!(f, "String"),
            Ty::Nil => write!(f, "Nil"),
            Ty::Symbol => write!(f, "Symbol"),
            Ty::Any => write!(f, "Any"),
            Ty::Pair(car, cdr) => write!(f, "Pair<{}, {}>", car, cdr),
            Ty::List(elem) => write!(f, "List<{}>", elem),
            Ty::Func(params, ret) => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
            Ty::Ref(pointee) => write!(f, "&{}", pointee),
        }
    }
}
