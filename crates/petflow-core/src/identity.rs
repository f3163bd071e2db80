//! # Identity Newtypes
//!
//! Pets are addressed by an opaque string identifier. Inbound triggers carry
//! whatever id the originating surface assigned, so the only format rule is
//! that the identifier is non-empty once surrounding whitespace is removed.
//! Identifiers minted by this workspace are UUID v4 strings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// A unique identifier for a pet tracked by the lifecycle core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PetId(String);

impl PetId {
    /// Create a pet identifier from a string, validating that it is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyPetId`] if the trimmed value is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyPetId);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Mint a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PetId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PetId> for String {
    fn from(id: PetId) -> Self {
        id.0
    }
}

impl std::str::FromStr for PetId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pet_id_trims_whitespace() {
        let id = PetId::new("  42 ").unwrap();
        assert_eq!(id.as_str(), "42");
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn pet_id_rejects_empty() {
        assert!(matches!(PetId::new(""), Err(ValidationError::EmptyPetId)));
        assert!(matches!(PetId::new("   "), Err(ValidationError::EmptyPetId)));
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = PetId::generate();
        let b = PetId::generate();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn pet_id_serializes_as_plain_string() {
        let id = PetId::new("pet-7").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"pet-7\"");
        let back: PetId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn pet_id_deserialization_rejects_blank() {
        let result: Result<PetId, _> = serde_json::from_str("\" \"");
        assert!(result.is_err());
    }

    proptest::proptest! {
        #[test]
        fn non_blank_ids_survive_parsing(s in "[a-zA-Z0-9_-]{1,32}") {
            let id: PetId = s.parse().unwrap();
            proptest::prop_assert_eq!(id.as_str(), s.as_str());
        }
    }
}
