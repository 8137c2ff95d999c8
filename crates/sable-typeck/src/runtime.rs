//! The runtime-state simulator.
//!
//! A parallel, scope-nested store of simulated values tagged with a memory
//! state. It models what borrowing, moving, and scope exit would do to
//! values at execution time, so the checker can validate those effects
//! before the evaluator ever runs. Nothing here frees memory: "release" is
//! a state flip, and the whole structure is discarded after checking.

use rustc_hash::{FxHashMap, FxHashSet};

use sable_ast::Expr;

use crate::error::CheckError;

/// The simulated memory/ownership state of one value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum MemoryState {
    /// The value is live and owned.
    Valid,
    /// The value was moved out. Terminal until the binding is reassigned.
    Moved,
    /// The value is under an exclusive borrow.
    Borrowed,
}

/// A simulated value together with its memory state.
///
/// The borrow counter is 0 or 1: every borrow is exclusive, so `Borrowed`
/// implies a count of exactly 1.
#[derive(Clone, Debug)]
pub struct RuntimeValue {
    pub value: Expr,
    pub state: MemoryState,
    pub borrow_count: u8,
}

impl RuntimeValue {
    pub fn new(value: Expr) -> Self {
        RuntimeValue {
            value,
            state: MemoryState::Valid,
            borrow_count: 0,
        }
    }

    /// Whether the value has not been moved out.
    pub fn is_valid(&self) -> bool {
        self.state != MemoryState::Moved
    }

    /// Transition to `Moved`. The payload is replaced by the `Nil` sentinel:
    /// a moved slot holds nothing. `Moved` is terminal until reassignment,
    /// so moving twice is a use-of-moved error.
    pub fn mark_moved(&mut self, name: &str) -> Result<(), CheckError> {
        if self.state == MemoryState::Borrowed {
            return Err(CheckError::MoveWhileBorrowed { name: name.into() });
        }
        if self.state == MemoryState::Moved {
            return Err(CheckError::UseOfMoved { name: name.into() });
        }
        self.state = MemoryState::Moved;
        self.value = Expr::Nil;
        self.borrow_count = 0;
        Ok(())
    }

    /// Transition `Valid -> Borrowed`.
    pub fn borrow(&mut self, name: &str) -> Result<(), CheckError> {
        if !self.is_valid() {
            return Err(CheckError::BorrowOfMoved { name: name.into() });
        }
        if self.state == MemoryState::Borrowed {
            return Err(CheckError::AlreadyBorrowed { name: name.into() });
        }
        self.state = MemoryState::Borrowed;
        self.borrow_count = 1;
        Ok(())
    }

    /// Transition `Borrowed -> Valid`.
    pub fn return_borrow(&mut self, name: &str) -> Result<(), CheckError> {
        if self.state != MemoryState::Borrowed {
            return Err(CheckError::NotBorrowed { name: name.into() });
        }
        self.state = MemoryState::Valid;
        self.borrow_count = 0;
        Ok(())
    }
}

/// The source of an assignment: either another binding (may be moved from)
/// or a freshly computed value (nothing to move from).
pub enum AssignSource {
    Binding(String),
    Value(Expr),
}

/// One simulated scope frame.
#[derive(Default)]
struct Frame {
    values: FxHashMap<String, RuntimeValue>,
    /// Names defined in this frame -- the set released on scope exit.
    defined_here: FxHashSet<String>,
}

/// A chain of simulated scopes, created per checked scope in lock-step with
/// the type and borrow environments.
pub struct RuntimeEnv {
    frames: Vec<Frame>,
}

impl RuntimeEnv {
    pub fn new() -> Self {
        RuntimeEnv {
            frames: vec![Frame::default()],
        }
    }

    pub fn push_scope(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Define a new binding in the current scope.
    ///
    /// Shadowing across scopes is allowed; redefinition within one scope is
    /// not.
    pub fn define(&mut self, name: &str, value: Expr) -> Result<(), CheckError> {
        let frame = self.frames.last_mut().expect("frame stack never empty");
        if frame.values.contains_key(name) {
            return Err(CheckError::DuplicateBinding { name: name.into() });
        }
        frame.values.insert(name.to_string(), RuntimeValue::new(value));
        frame.defined_here.insert(name.to_string());
        Ok(())
    }

    /// Resolve a binding's runtime value through the scope chain.
    pub fn get_runtime_value(&self, name: &str) -> Result<&RuntimeValue, CheckError> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.values.get(name))
            .ok_or_else(|| CheckError::UndefinedSymbol { name: name.into() })
    }

    fn get_runtime_value_mut(&mut self, name: &str) -> Result<&mut RuntimeValue, CheckError> {
        self.frames
            .iter_mut()
            .rev()
            .find_map(|f| f.values.get_mut(name))
            .ok_or_else(|| CheckError::UndefinedSymbol { name: name.into() })
    }

    /// Read a binding's payload. Fails if the value has been moved out.
    pub fn get_value(&self, name: &str) -> Result<&Expr, CheckError> {
        let rt = self.get_runtime_value(name)?;
        if !rt.is_valid() {
            return Err(CheckError::UseOfMoved { name: name.into() });
        }
        Ok(&rt.value)
    }

    /// Overwrite a binding's payload in place. Fails if moved or borrowed.
    pub fn set_value(&mut self, name: &str, value: Expr) -> Result<(), CheckError> {
        let rt = self.get_runtime_value_mut(name)?;
        if !rt.is_valid() {
            return Err(CheckError::UseOfMoved { name: name.into() });
        }
        if rt.state == MemoryState::Borrowed {
            return Err(CheckError::AssignWhileBorrowed { name: name.into() });
        }
        rt.value = value;
        rt.state = MemoryState::Valid;
        Ok(())
    }

    /// The combined move-or-copy assignment operator.
    ///
    /// A copyable source is cloned into a fresh `Valid` value; a non-copyable
    /// source binding is read, marked `Moved`, and its payload rehomed. A
    /// live destination is marked `Moved` first (drop before overwrite). An
    /// undefined destination is defined locally; a destination found in an
    /// outer scope is overwritten in place -- a non-shadowing set through the
    /// scope chain.
    pub fn assign_value(
        &mut self,
        name: &str,
        source: AssignSource,
        is_copyable: bool,
    ) -> Result<(), CheckError> {
        let payload = match source {
            AssignSource::Binding(src) => {
                let rt = self.get_runtime_value_mut(&src)?;
                if !rt.is_valid() {
                    return Err(CheckError::UseOfMoved { name: src });
                }
                if rt.state == MemoryState::Borrowed {
                    return Err(CheckError::MoveWhileBorrowed { name: src });
                }
                if is_copyable {
                    rt.value.clone()
                } else {
                    let moved = rt.value.clone();
                    rt.mark_moved(&src)?;
                    moved
                }
            }
            // A temporary has no prior binding; nothing to move from.
            AssignSource::Value(expr) => expr,
        };

        for frame in self.frames.iter_mut().rev() {
            if let Some(existing) = frame.values.get_mut(name) {
                if existing.state == MemoryState::Borrowed {
                    return Err(CheckError::AssignWhileBorrowed { name: name.into() });
                }
                if existing.is_valid() {
                    // Drop simulation for the overwritten value.
                    existing.mark_moved(name)?;
                }
                *existing = RuntimeValue::new(payload);
                return Ok(());
            }
        }

        let frame = self.frames.last_mut().expect("frame stack never empty");
        frame.values.insert(name.to_string(), RuntimeValue::new(payload));
        frame.defined_here.insert(name.to_string());
        Ok(())
    }

    /// Transition a binding `Valid -> Borrowed`.
    pub fn borrow_value(&mut self, name: &str) -> Result<(), CheckError> {
        self.get_runtime_value_mut(name)?.borrow(name)
    }

    /// Transition a binding `Borrowed -> Valid`.
    pub fn return_borrowed_value(&mut self, name: &str) -> Result<(), CheckError> {
        self.get_runtime_value_mut(name)?.return_borrow(name)
    }

    /// Transition a binding `Valid -> Moved` directly.
    pub fn move_value(&mut self, name: &str) -> Result<(), CheckError> {
        self.get_runtime_value_mut(name)?.mark_moved(name)
    }

    /// Leave the current scope: every still-valid value defined in this
    /// frame transitions to `Moved` (drop simulation), then the frame is
    /// discarded. Values already `Moved` or `Borrowed` at exit are left
    /// alone -- a borrow outliving its scope is a checker bug elsewhere.
    ///
    /// # Panics
    ///
    /// Panics if called when only the global scope remains.
    pub fn exit_scope(&mut self) {
        assert!(self.frames.len() > 1, "cannot exit the global scope");
        let frame = self.frames.last_mut().expect("frame stack never empty");
        let names: Vec<String> = frame.defined_here.iter().cloned().collect();
        for name in names {
            if let Some(rt) = frame.values.get_mut(&name) {
                if rt.state == MemoryState::Valid {
                    rt.state = MemoryState::Moved;
                    rt.value = Expr::Nil;
                }
            }
        }
        self.frames.pop();
    }
}

impl Default for RuntimeEnv {
    fn default() -> Self {
        Self::new()
    }
}
