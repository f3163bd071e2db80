//! # Pet Records
//!
//! The pet entity as held by the entity store. Only `status` is governed by
//! the lifecycle core; the descriptive fields belong to other collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::PetId;
use crate::status::PetStatus;

/// The species of a pet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    /// A dog.
    Dog,
    /// A cat.
    Cat,
    /// A bird.
    Bird,
    /// Anything else.
    Other,
}

impl Species {
    /// The wire name of this species.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dog => "dog",
            Self::Cat => "cat",
            Self::Bird => "bird",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Species {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dog" => Ok(Self::Dog),
            "cat" => Ok(Self::Cat),
            "bird" => Ok(Self::Bird),
            "other" => Ok(Self::Other),
            _ => Err(ValidationError::UnknownSpecies(s.to_string())),
        }
    }
}

/// Input for registering a new pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPet {
    /// Display name; trimmed on registration.
    pub name: String,
    /// Species.
    pub species: Species,
    /// Age in whole months.
    pub age_months: u32,
}

impl NewPet {
    /// Normalize and validate the registration input.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyPetName`] if the trimmed name is empty.
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyPetName);
        }
        Ok(Self { name, ..self })
    }
}

/// A pet tracked by the entity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    /// Immutable identifier.
    pub id: PetId,
    /// Display name.
    pub name: String,
    /// Species.
    pub species: Species,
    /// Age in whole months.
    pub age_months: u32,
    /// Current lifecycle status.
    pub status: PetStatus,
    /// When the pet was registered.
    pub created_at: DateTime<Utc>,
    /// When any field last changed.
    pub updated_at: DateTime<Utc>,
    /// When the pet was soft-deleted, if it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    /// When a soft-deleted pet becomes eligible for purge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purge_at: Option<DateTime<Utc>>,
}

impl Pet {
    /// Build a freshly registered pet in the `new` status.
    pub fn register(id: PetId, input: NewPet, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            species: input.species,
            age_months: input.age_months,
            status: PetStatus::New,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            purge_at: None,
        }
    }

    /// Whether a soft-deleted pet may be purged at `now`.
    pub fn is_purgeable(&self, now: DateTime<Utc>) -> bool {
        self.status.is_deleted() && self.purge_at.is_some_and(|at| at <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> NewPet {
        NewPet {
            name: name.to_string(),
            species: Species::Cat,
            age_months: 14,
        }
    }

    #[test]
    fn normalized_trims_name() {
        let pet = input("  Miso \n").normalized().unwrap();
        assert_eq!(pet.name, "Miso");
    }

    #[test]
    fn normalized_rejects_blank_name() {
        assert!(matches!(
            input("   ").normalized(),
            Err(ValidationError::EmptyPetName)
        ));
    }

    #[test]
    fn register_starts_in_new() {
        let now = Utc::now();
        let pet = Pet::register(PetId::generate(), input("Miso"), now);
        assert_eq!(pet.status, PetStatus::New);
        assert_eq!(pet.created_at, now);
        assert_eq!(pet.updated_at, now);
        assert!(pet.deleted_at.is_none());
    }

    #[test]
    fn purgeable_requires_deleted_and_elapsed() {
        let now = Utc::now();
        let mut pet = Pet::register(PetId::generate(), input("Miso"), now);
        pet.purge_at = Some(now - chrono::Duration::seconds(1));
        assert!(!pet.is_purgeable(now), "not deleted yet");

        pet.status = PetStatus::Deleted;
        assert!(pet.is_purgeable(now));

        pet.purge_at = Some(now + chrono::Duration::hours(1));
        assert!(!pet.is_purgeable(now));
    }

    #[test]
    fn species_parse() {
        assert_eq!("bird".parse::<Species>().unwrap(), Species::Bird);
        assert!(matches!(
            "lizard".parse::<Species>(),
            Err(ValidationError::UnknownSpecies(_))
        ));
    }

    #[test]
    fn pet_serializes_camel_case() {
        let pet = Pet::register(PetId::new("1").unwrap(), input("Miso"), Utc::now());
        let value = serde_json::to_value(&pet).unwrap();
        assert_eq!(value["ageMonths"], 14);
        assert_eq!(value["status"], "new");
        assert!(value.get("purgeAt").is_none());
    }
}
