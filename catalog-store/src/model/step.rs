//! The seven booking-workflow steps.

use serde::{Deserialize, Serialize};

/// A step in the seven-step booking workflow. Encoded as `u8` in storage
/// but never handled as a bare integer in handler code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Step {
    Intake = 1,
    DateConfirmation = 2,
    RoomAvailability = 3,
    OfferPreparation = 4,
    NegotiationClose = 5,
    TransitionCheckpoint = 6,
    EventConfirmation = 7,
}

impl Step {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Intake),
            2 => Some(Self::DateConfirmation),
            3 => Some(Self::RoomAvailability),
            4 => Some(Self::OfferPreparation),
            5 => Some(Self::NegotiationClose),
            6 => Some(Self::TransitionCheckpoint),
            7 => Some(Self::EventConfirmation),
            _ => None,
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_u8() {
        for step in [
            Step::Intake,
            Step::DateConfirmation,
            Step::RoomAvailability,
            Step::OfferPreparation,
            Step::NegotiationClose,
            Step::TransitionCheckpoint,
            Step::EventConfirmation,
        ] {
            assert_eq!(Step::from_u8(step.as_u8()), Some(step));
        }
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(Step::from_u8(0), None);
        assert_eq!(Step::from_u8(8), None);
    }
}
