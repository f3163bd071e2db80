//! # Pet Lifecycle Status
//!
//! The fixed enumeration of states a pet can occupy. Which transitions
//! between them are legal is decided by the transition table in
//! `petflow-lifecycle`; this module only names the states.
//!
//! ```text
//! new ──▶ in_quarantine ──▶ healthy ──▶ available ──▶ pending ──▶ adopted
//!               │              │            │            │
//!               └──────────────┴──▶ ill ◀───┘            └──▶ available
//!                                   │
//!                                   ▼
//!                          under_treatment ──▶ recovered ──▶ healthy
//! ```
//!
//! `deleted` is set only by the external deletion flow.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The lifecycle status of a pet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetStatus {
    /// Just registered; awaiting feeding setup.
    New,
    /// Isolated after intake until a staff health check.
    InQuarantine,
    /// Cleared by staff.
    Healthy,
    /// Identified as ill.
    Ill,
    /// Receiving treatment.
    UnderTreatment,
    /// Treatment completed.
    Recovered,
    /// Listed for adoption.
    Available,
    /// An adoption application is open.
    Pending,
    /// Adopted (terminal in the transition table).
    Adopted,
    /// Soft-deleted by the deletion flow; awaiting purge.
    Deleted,
}

impl PetStatus {
    /// Every status, in declaration order.
    pub const ALL: [PetStatus; 10] = [
        Self::New,
        Self::InQuarantine,
        Self::Healthy,
        Self::Ill,
        Self::UnderTreatment,
        Self::Recovered,
        Self::Available,
        Self::Pending,
        Self::Adopted,
        Self::Deleted,
    ];

    /// The wire name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InQuarantine => "in_quarantine",
            Self::Healthy => "healthy",
            Self::Ill => "ill",
            Self::UnderTreatment => "under_treatment",
            Self::Recovered => "recovered",
            Self::Available => "available",
            Self::Pending => "pending",
            Self::Adopted => "adopted",
            Self::Deleted => "deleted",
        }
    }

    /// Whether this status is owned by the deletion flow rather than the
    /// lifecycle core.
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}

impl std::fmt::Display for PetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PetStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serde_name() {
        for status in PetStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }

    #[test]
    fn parse_round_trips_every_status() {
        for status in PetStatus::ALL {
            let parsed: PetStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn parse_rejects_unknown_status() {
        let err = "sleeping".parse::<PetStatus>().unwrap_err();
        assert!(matches!(err, ValidationError::UnknownStatus(ref s) if s == "sleeping"));
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert!("Healthy".parse::<PetStatus>().is_err());
    }

    #[test]
    fn only_deleted_is_deleted() {
        let deleted: Vec<_> = PetStatus::ALL.iter().filter(|s| s.is_deleted()).collect();
        assert_eq!(deleted, vec![&PetStatus::Deleted]);
    }
}
