//! The Sable expression tree.
//!
//! Nodes carry no source spans: the reader hands the checker a bare tree
//! and all diagnostics name bindings and types rather than locations.

use std::fmt;

use serde::Serialize;

/// A prefix operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum PrefixOp {
    /// Numeric negation: `-x`.
    Neg,
    /// Take the (exclusive, mutable) reference: `&x`.
    Ref,
    /// Dereference: `*p`.
    Deref,
}

impl PrefixOp {
    /// The operator's surface spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            PrefixOp::Neg => "-",
            PrefixOp::Ref => "&",
            PrefixOp::Deref => "*",
        }
    }
}

/// A binary operator.
///
/// Binary operators desugar to applications of the builtin signatures
/// registered under [`BinOp::symbol`]; the checker shares its
/// argument-passing protocol between the two forms.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl BinOp {
    /// The builtin-table name this operator resolves through.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
        }
    }

    /// True for `+ - * /`; the rest are comparisons and type as `Bool`.
    pub fn is_arithmetic(self) -> bool {
        matches!(self, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div)
    }
}

/// A Sable expression.
///
/// The closed node-shape set consumed by the checker:
/// - atoms: `Int`, `Float`, `Bool`, `Str`, `Nil`, `Symbol`
/// - control: `If`, `Ternary`, `Seq`
/// - functions: `Lambda`, `Apply`
/// - bindings: `Assign`
/// - operators: `Prefix`, `Binary`
/// - data: `List`, `Index`, `Slice`, `Quote`, `Pair`
/// - macros: `DefineMacro` (inert by checking time -- expansion already ran)
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    /// The empty-list sentinel `()`.
    Nil,
    /// A variable reference.
    Symbol(String),
    /// `(quote datum)` -- the datum is data, not code.
    Quote(Box<Expr>),
    /// `(if cond then else)`. An absent else arm is the `Nil` literal;
    /// the reader guarantees all three slots are present.
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// `cond ? then : else`.
    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    /// `(lambda (params...) body)`. The body is a single expression;
    /// multi-expression bodies arrive as a `Seq`.
    Lambda { params: Vec<String>, body: Box<Expr> },
    /// Function application.
    Apply { callee: Box<Expr>, args: Vec<Expr> },
    /// `target = value` -- defines on first sight, reassigns afterwards.
    Assign { target: String, value: Box<Expr> },
    /// `-x`, `&x`, `*p`.
    Prefix { op: PrefixOp, operand: Box<Expr> },
    /// `lhs op rhs`.
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `[a, b, c]`.
    List(Vec<Expr>),
    /// `seq[index]`.
    Index { seq: Box<Expr>, index: Box<Expr> },
    /// `seq[start:end]` with either bound optional.
    Slice {
        seq: Box<Expr>,
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
    },
    /// An expression sequence; the last expression's value is the result.
    Seq(Vec<Expr>),
    /// A macro definition. Checking runs post-expansion, so this is inert.
    DefineMacro {
        name: String,
        params: Vec<String>,
        body: Box<Expr>,
    },
    /// A dotted pair of quoted data.
    Pair(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn symbol(name: impl Into<String>) -> Expr {
        Expr::Symbol(name.into())
    }

    pub fn string(s: impl Into<String>) -> Expr {
        Expr::Str(s.into())
    }

    pub fn assign(target: impl Into<String>, value: Expr) -> Expr {
        Expr::Assign {
            target: target.into(),
            value: Box::new(value),
        }
    }

    pub fn if_expr(cond: Expr, then_branch: Expr, else_branch: Expr) -> Expr {
        Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    pub fn ternary(cond: Expr, then_expr: Expr, else_expr: Expr) -> Expr {
        Expr::Ternary {
            cond: Box::new(cond),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        }
    }

    pub fn lambda(params: Vec<&str>, body: Expr) -> Expr {
        Expr::Lambda {
            params: params.into_iter().map(String::from).collect(),
            body: Box::new(body),
        }
    }

    pub fn apply(callee: Expr, args: Vec<Expr>) -> Expr {
        Expr::Apply {
            callee: Box::new(callee),
            args,
        }
    }

    /// Apply a named function or special form.
    pub fn call(name: &str, args: Vec<Expr>) -> Expr {
        Expr::apply(Expr::symbol(name), args)
    }

    pub fn prefix(op: PrefixOp, operand: Expr) -> Expr {
        Expr::Prefix {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn index(seq: Expr, index: Expr) -> Expr {
        Expr::Index {
            seq: Box::new(seq),
            index: Box::new(index),
        }
    }

    pub fn slice(seq: Expr, start: Option<Expr>, end: Option<Expr>) -> Expr {
        Expr::Slice {
            seq: Box::new(seq),
            start: start.map(Box::new),
            end: end.map(Box::new),
        }
    }

    /// The symbol name, when this node is a bare variable reference.
    /// Bare symbols are the only expressions that name a storage location
    /// and can therefore be borrowed, swapped, or reassigned.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Expr::Symbol(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Expr {
    /// Compact s-expression rendering, used in diagnostics.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(v) => write!(f, "{}", v),
            Expr::Float(v) => write!(f, "{}", v),
            Expr::Bool(v) => write!(f, "{}", v),
            Expr::Str(s) => write!(f, "{:?}", s),
            Expr::Nil => write!(f, "()"),
            Expr::Symbol(name) => write!(f, "{}", name),
            Expr::Quote(datum) => write!(f, "'{}", datum),
            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => write!(f, "(if {} {} {})", cond, then_branch, else_branch),
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
            } => write!(f, "({} ? {} : {})", cond, then_expr, else_expr),
            Expr::Lambda { params, body } => {
                write!(f, "(lambda ({}) {})", params.join(" "), body)
            }
            Expr::Apply { callee, args } => {
                write!(f, "({}", callee)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Assign { target, value } => write!(f, "({} = {})", target, value),
            Expr::Prefix { op, operand } => write!(f, "({}{})", op.symbol(), operand),
            Expr::Binary { op, lhs, rhs } => {
                write!(f, "({} {} {})", lhs, op.symbol(), rhs)
            }
            Expr::List(elems) => {
                write!(f, "[")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "]")
            }
            Expr::Index { seq, index } => write!(f, "{}[{}]", seq, index),
            Expr::Slice { seq, start, end } => {
                write!(f, "{}[", seq)?;
                if let Some(s) = start {
                    write!(f, "{}", s)?;
                }
                write!(f, ":")?;
                if let Some(e) = end {
                    write!(f, "{}", e)?;
                }
                write!(f, "]")
            }
            Expr::Seq(exprs) => {
                write!(f, "(begin")?;
                for e in exprs {
                    write!(f, " {}", e)?;
                }
                write!(f, ")")
            }
            Expr::DefineMacro { name, params, body } => {
                write!(f, "(define-macro ({} {}) {})", name, params.join(" "), body)
            }
            Expr::Pair(car, cdr) => write!(f, "({} . {})", car, cdr),
        }
    }
}
