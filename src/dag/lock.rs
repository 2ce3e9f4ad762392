// src/dag/lock.rs

//! Counting semaphore over a named shared resource.
//!
//! A `Lock` does not queue anybody. It only answers "is there a free slot?"
//! and keeps a counter; waiting for a slot is the scheduler's job (a node
//! simply stays pending until the next admission pass finds the lock
//! available).

use crate::errors::LockError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lock {
    capacity: usize,
    held: usize,
}

impl Lock {
    /// Create a lock with `capacity` concurrent slots.
    ///
    /// A capacity of zero is rejected when the scheduler is constructed.
    pub fn new(capacity: usize) -> Self {
        Self { capacity, held: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently held.
    pub fn held(&self) -> usize {
        self.held
    }

    /// Whether at least one slot is free.
    pub fn available(&self) -> bool {
        self.held < self.capacity
    }

    pub fn acquire(&mut self) -> Result<(), LockError> {
        if !self.available() {
            return Err(LockError::Exhausted {
                capacity: self.capacity,
            });
        }
        self.held += 1;
        Ok(())
    }

    pub fn release(&mut self) -> Result<(), LockError> {
        self.held = self.held.checked_sub(1).ok_or(LockError::NotHeld)?;
        Ok(())
    }
}
