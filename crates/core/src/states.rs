//! Slot lifecycle states.
//!
//! A slot is one allocatable unit inside a shared account. Its state drives
//! every allocation, release and swap decision, so transitions are expressed
//! as exhaustive-match methods: adding a state forces every call site to be
//! revisited at compile time.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The lifecycle state of a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotState {
    /// Free stock, ready to be sold.
    Available,

    /// Sold to a client with a live billing period.
    Occupied,

    /// Flagged for access-credential rotation (for example a suspected
    /// shared-PIN compromise). Requires manual revival.
    Quarantined,

    /// Withdrawn pending replacement because the underlying account is being
    /// swapped out.
    Warranty,

    /// Considered dead. Only a manual revival brings it back.
    Down,
}

/// A transition was requested from a state that does not permit it.
#[derive(Debug, Clone, Error)]
#[error("cannot {action} a slot that is {from}")]
pub struct TransitionError {
    from: SlotState,
    action: &'static str,
}

impl TransitionError {
    /// The state the slot was in when the transition was refused.
    #[must_use]
    pub const fn from_state(&self) -> SlotState {
        self.from
    }
}

impl SlotState {
    /// Sell the slot to a client.
    ///
    /// Only free stock can be claimed; claiming anything else is the
    /// double-allocation bug this method exists to prevent.
    ///
    /// # Errors
    ///
    /// Refused unless the slot is [`SlotState::Available`].
    pub const fn allocated(self) -> Result<Self, TransitionError> {
        match self {
            Self::Available => Ok(Self::Occupied),
            Self::Occupied | Self::Quarantined | Self::Warranty | Self::Down => {
                Err(TransitionError {
                    from: self,
                    action: "allocate",
                })
            }
        }
    }

    /// Return the slot to stock after its billing period ends or is deleted.
    ///
    /// # Errors
    ///
    /// Refused unless the slot is [`SlotState::Occupied`]; a slot parked in
    /// quarantine or warranty keeps that flag even when its period goes away.
    pub const fn released(self) -> Result<Self, TransitionError> {
        match self {
            Self::Occupied => Ok(Self::Available),
            Self::Available | Self::Quarantined | Self::Warranty | Self::Down => {
                Err(TransitionError {
                    from: self,
                    action: "release",
                })
            }
        }
    }

    /// Flag the slot for credential rotation.
    ///
    /// # Errors
    ///
    /// Refused unless the slot is [`SlotState::Available`] or
    /// [`SlotState::Occupied`].
    pub const fn quarantined(self) -> Result<Self, TransitionError> {
        match self {
            Self::Available | Self::Occupied => Ok(Self::Quarantined),
            Self::Quarantined | Self::Warranty | Self::Down => Err(TransitionError {
                from: self,
                action: "quarantine",
            }),
        }
    }

    /// Manually revive a parked slot back into stock.
    ///
    /// # Errors
    ///
    /// Refused unless the slot is [`SlotState::Quarantined`] or
    /// [`SlotState::Down`].
    pub const fn revived(self) -> Result<Self, TransitionError> {
        match self {
            Self::Quarantined | Self::Down => Ok(Self::Available),
            Self::Available | Self::Occupied | Self::Warranty => Err(TransitionError {
                from: self,
                action: "revive",
            }),
        }
    }

    /// Withdraw the slot pending replacement of its account.
    ///
    /// # Errors
    ///
    /// Refused unless the slot is [`SlotState::Occupied`],
    /// [`SlotState::Warranty`] or [`SlotState::Down`].
    pub const fn withdrawn(self) -> Result<Self, TransitionError> {
        match self {
            Self::Occupied | Self::Warranty | Self::Down => Ok(Self::Warranty),
            Self::Available | Self::Quarantined => Err(TransitionError {
                from: self,
                action: "withdraw",
            }),
        }
    }

    /// Manually flag the slot as dead. Permitted from any state.
    #[must_use]
    pub const fn marked_down(self) -> Self {
        Self::Down
    }

    /// Whether the slot is free stock.
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }

    /// Whether the slot is currently sold.
    #[must_use]
    pub const fn is_occupied(self) -> bool {
        matches!(self, Self::Occupied)
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Available => "AVAILABLE",
            Self::Occupied => "OCCUPIED",
            Self::Quarantined => "QUARANTINED",
            Self::Warranty => "WARRANTY",
            Self::Down => "DOWN",
        };

        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_claims_only_free_stock() {
        assert_eq!(SlotState::Available.allocated().ok(), Some(SlotState::Occupied));

        for state in [
            SlotState::Occupied,
            SlotState::Quarantined,
            SlotState::Warranty,
            SlotState::Down,
        ] {
            assert!(state.allocated().is_err(), "allocated {state} slot");
        }
    }

    #[test]
    fn release_frees_only_occupied_slots() {
        assert_eq!(SlotState::Occupied.released().ok(), Some(SlotState::Available));
        assert!(SlotState::Warranty.released().is_err(), "released a warranty slot");
        assert!(SlotState::Down.released().is_err(), "released a down slot");
    }

    #[test]
    fn quarantine_accepts_free_and_sold_slots() {
        assert_eq!(
            SlotState::Available.quarantined().ok(),
            Some(SlotState::Quarantined)
        );
        assert_eq!(
            SlotState::Occupied.quarantined().ok(),
            Some(SlotState::Quarantined)
        );
        assert!(
            SlotState::Warranty.quarantined().is_err(),
            "quarantined a warranty slot"
        );
    }

    #[test]
    fn revival_returns_parked_slots_to_stock() {
        assert_eq!(SlotState::Quarantined.revived().ok(), Some(SlotState::Available));
        assert_eq!(SlotState::Down.revived().ok(), Some(SlotState::Available));
        assert!(SlotState::Occupied.revived().is_err(), "revived an occupied slot");
    }

    #[test]
    fn warranty_withdrawal_is_idempotent() {
        assert_eq!(SlotState::Warranty.withdrawn().ok(), Some(SlotState::Warranty));
        assert_eq!(SlotState::Occupied.withdrawn().ok(), Some(SlotState::Warranty));
        assert!(SlotState::Available.withdrawn().is_err(), "withdrew free stock");
    }

    #[test]
    fn any_state_can_be_marked_down() {
        for state in [
            SlotState::Available,
            SlotState::Occupied,
            SlotState::Quarantined,
            SlotState::Warranty,
            SlotState::Down,
        ] {
            assert_eq!(state.marked_down(), SlotState::Down);
        }
    }

    #[test]
    fn transition_error_reports_origin_state() {
        let error = SlotState::Down
            .allocated()
            .expect_err("down slots are not sellable");

        assert_eq!(error.from_state(), SlotState::Down);
        assert_eq!(error.to_string(), "cannot allocate a slot that is DOWN");
    }
}
