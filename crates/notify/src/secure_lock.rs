//! Secure lock level and the first-restriction latch
//!
//! The first move from `Init` into `Restricted` forces USB data off even if
//! no disable command was ever written. The latch remembers that forced
//! disable so the matching unrestriction can undo it exactly once.

use protocol::{LockLevel, RoleState};
use serde::Serialize;
use tracing::info;

/// Lock level plus first-restriction latch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SecureLockController {
    level: LockLevel,
    first_restrict: bool,
}

/// What a lock write did, for the caller to act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockTransition {
    pub previous: LockLevel,
    pub current: LockLevel,
    /// Role to force through the controller, if any
    pub forced: Option<RoleState>,
}

impl SecureLockController {
    pub fn level(&self) -> LockLevel {
        self.level
    }

    pub fn first_restrict(&self) -> bool {
        self.first_restrict
    }

    /// Record a new level
    ///
    /// The caller invokes the lock-control hook between [`Self::set_level`]
    /// and [`Self::settle`].
    pub fn set_level(&mut self, level: LockLevel) -> LockLevel {
        info!(
            "secure_lock before = {} first_restrict = {}",
            self.level, self.first_restrict
        );
        std::mem::replace(&mut self.level, level)
    }

    /// Evaluate the one-shot side effects of the move `previous -> self.level`
    pub fn settle(&mut self, previous: LockLevel) -> LockTransition {
        let current = self.level;
        let forced = match (previous, current) {
            (LockLevel::Init, LockLevel::Restricted) => {
                self.first_restrict = true;
                Some(RoleState::None)
            }
            (LockLevel::Restricted, LockLevel::Unlocked | LockLevel::WorkLocked)
                if self.first_restrict =>
            {
                self.first_restrict = false;
                Some(RoleState::All)
            }
            _ => None,
        };
        info!("secure_lock after = {}", current);
        LockTransition {
            previous,
            current,
            forced,
        }
    }

    /// [`Self::set_level`] and [`Self::settle`] with no hook in between
    pub fn transition(&mut self, level: LockLevel) -> LockTransition {
        let previous = self.set_level(level);
        self.settle(previous)
    }
}
