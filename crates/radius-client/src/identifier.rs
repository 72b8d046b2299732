//! RADIUS identifier allocation
//!
//! The Identifier field is a single octet, so a client can have at most 256
//! requests outstanding towards one server. Leases are handed out from a
//! rotating cursor and returned when the [`IdentifierLease`] is dropped.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

struct PoolState {
    in_use: [bool; 256],
    cursor: u8,
}

/// Shared pool of the 256 RADIUS identifiers
#[derive(Clone)]
pub struct IdentifierPool {
    state: Arc<Mutex<PoolState>>,
}

impl IdentifierPool {
    pub fn new() -> Self {
        Self::starting_at(rand::random())
    }

    /// Pool whose first lease is `first` (if free)
    pub fn starting_at(first: u8) -> Self {
        IdentifierPool {
            state: Arc::new(Mutex::new(PoolState {
                in_use: [false; 256],
                cursor: first,
            })),
        }
    }

    /// Lease the next free identifier, or `None` if all 256 are outstanding
    pub fn acquire(&self) -> Option<IdentifierLease> {
        let mut state = self.lock();
        let start = state.cursor;
        for step in 0..=255u8 {
            let candidate = start.wrapping_add(step);
            if !state.in_use[candidate as usize] {
                state.in_use[candidate as usize] = true;
                state.cursor = candidate.wrapping_add(1);
                return Some(IdentifierLease {
                    identifier: candidate,
                    pool: self.clone(),
                });
            }
        }
        None
    }

    /// Number of identifiers currently leased
    pub fn outstanding(&self) -> usize {
        self.lock().in_use.iter().filter(|used| **used).count()
    }

    fn release(&self, identifier: u8) {
        self.lock().in_use[identifier as usize] = false;
    }

    // A panic while holding the lock cannot leave the bitmap inconsistent,
    // so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for IdentifierPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IdentifierPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifierPool")
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

/// An identifier reserved for one logical request
pub struct IdentifierLease {
    identifier: u8,
    pool: IdentifierPool,
}

impl IdentifierLease {
    pub fn identifier(&self) -> u8 {
        self.identifier
    }
}

impl Drop for IdentifierLease {
    fn drop(&mut self) {
        self.pool.release(self.identifier);
    }
}

impl fmt::Debug for IdentifierLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IdentifierLease").field(&self.identifier).finish()
    }
}
