//! The static ownership ledger.
//!
//! Tracks, per binding and per scope, which bindings currently have an
//! active borrow and which have been moved from. This is pure compile-time
//! bookkeeping: it is created when checking a scope begins and discarded
//! when that scope's check completes.
//!
//! Because Sable has exactly one reference kind (exclusive and mutable),
//! "any borrow present" is equivalent to "exclusively borrowed". The ledger
//! therefore never needs reader/writer counts -- a single active-borrow list
//! whose length is 0 or 1 carries the whole discipline.
//!
//! Each borrow is a distinct [`BorrowId`] token minted when the borrow is
//! taken; releasing requires presenting the token, so a release always ends
//! the borrow that was actually taken rather than "a" matching borrow.

use rustc_hash::FxHashMap;

use crate::error::CheckError;

/// An opaque token identifying one taken borrow.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BorrowId(u32);

/// The borrowing and move status of one binding.
#[derive(Clone, Debug, Default)]
pub struct BorrowState {
    /// Active borrow tokens. Holds at most one element.
    borrows: Vec<BorrowId>,
    /// Whether the binding's value has been moved out.
    moved: bool,
}

impl BorrowState {
    /// Check whether taking a new borrow is legal right now.
    ///
    /// Fails if the binding has been moved from, or if any borrow is already
    /// active (every borrow is exclusive).
    pub fn check_add_borrow(&self, name: &str) -> Result<(), CheckError> {
        if self.moved {
            return Err(CheckError::BorrowOfMoved { name: name.into() });
        }
        if !self.borrows.is_empty() {
            return Err(CheckError::AlreadyBorrowed { name: name.into() });
        }
        Ok(())
    }

    /// Record a borrow. Callable only after [`check_add_borrow`] succeeded.
    ///
    /// [`check_add_borrow`]: BorrowState::check_add_borrow
    pub fn add_borrow(&mut self, id: BorrowId) {
        self.borrows.push(id);
    }

    /// Release the borrow identified by `id`.
    pub fn remove_borrow(&mut self, id: BorrowId, name: &str) -> Result<(), CheckError> {
        match self.borrows.iter().position(|b| *b == id) {
            Some(pos) => {
                self.borrows.remove(pos);
                Ok(())
            }
            None => Err(CheckError::NotBorrowed { name: name.into() }),
        }
    }

    /// Mark the binding as moved from. Fails while any borrow is active,
    /// and fails again once already moved: moved is terminal until
    /// [`BorrowState::reset_moved`].
    pub fn mark_as_moved(&mut self, name: &str) -> Result<(), CheckError> {
        if self.is_borrowed() {
            return Err(CheckError::MoveWhileBorrowed { name: name.into() });
        }
        if self.moved {
            return Err(CheckError::UseOfMoved { name: name.into() });
        }
        self.moved = true;
        Ok(())
    }

    /// Reassignment gives the binding a fresh value; the moved flag clears.
    pub fn reset_moved(&mut self) {
        self.moved = false;
    }

    /// Whether the binding still owns a value (has not been moved from).
    pub fn is_valid(&self) -> bool {
        !self.moved
    }

    /// Whether any borrow is active.
    pub fn is_borrowed(&self) -> bool {
        !self.borrows.is_empty()
    }

    /// The most recently taken live token, if any.
    pub fn latest_borrow(&self) -> Option<BorrowId> {
        self.borrows.last().copied()
    }
}

/// A chain of scopes, each holding `name -> BorrowState`.
///
/// Mirrors the type environment's nesting; states are created lazily the
/// first time a binding participates in borrow bookkeeping.
pub struct BorrowEnv {
    scopes: Vec<FxHashMap<String, BorrowState>>,
    next_token: u32,
}

impl BorrowEnv {
    pub fn new() -> Self {
        BorrowEnv {
            scopes: vec![FxHashMap::default()],
            next_token: 0,
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// # Panics
    ///
    /// Panics if called when only the global scope remains.
    pub fn pop_scope(&mut self) {
        assert!(self.scopes.len() > 1, "cannot pop the global scope");
        self.scopes.pop();
    }

    /// Mint a fresh borrow token.
    pub fn mint_token(&mut self) -> BorrowId {
        let id = BorrowId(self.next_token);
        self.next_token += 1;
        id
    }

    /// Get or create the state for `name` in the current scope.
    pub fn ensure_local(&mut self, name: &str) -> &mut BorrowState {
        self.scopes
            .last_mut()
            .expect("scope stack should never be empty")
            .entry(name.to_string())
            .or_default()
    }

    /// Resolve the state for `name`, innermost scope outward.
    pub fn state(&self, name: &str) -> Option<&BorrowState> {
        self.scopes.iter().rev().find_map(|s| s.get(name))
    }

    /// Mutable resolution, innermost scope outward.
    pub fn state_mut(&mut self, name: &str) -> Option<&mut BorrowState> {
        self.scopes.iter_mut().rev().find_map(|s| s.get_mut(name))
    }
}

impl Default for BorrowEnv {
    fn default() -> Self {
        Self::new()
    }
}
