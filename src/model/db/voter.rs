use std::ops::{Deref, DerefMut};

use chrono::NaiveDate;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{gender::Gender, password::verify_password, validation::age_on},
    mongodb::Id,
};

/// Core voter data, as stored in the database.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    /// Public voter ID, e.g. `ABC1234567`. Always upper case.
    pub voter_id: String,
    /// Argon2 encoded hash; the plaintext is never stored.
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub parent_spouse_name: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub place_of_birth: String,
    /// 12-digit national ID.
    pub aadhar_number: String,
    /// Tax ID, e.g. `ABCDE1234F`. Always upper case.
    pub pan_number: String,
    pub is_active: bool,
    /// Set exactly once, in the same transaction that records the vote.
    pub has_voted: bool,
    pub registration_date: DateTime,
    pub last_login: Option<DateTime>,
}

impl VoterCore {
    /// Check whether the given password is correct.
    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Age in whole years on the given day.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        age_on(self.date_of_birth, today)
    }
}

/// A voter without an ID.
pub type NewVoter = VoterCore;

/// A voter from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}

/// The voter fields that must be globally unique.
///
/// Each has its own named unique index, in the order that registration
/// checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueVoterField {
    VoterId,
    Email,
    AadharNumber,
    PanNumber,
}

impl UniqueVoterField {
    pub const ALL: [Self; 4] = [
        Self::VoterId,
        Self::Email,
        Self::AadharNumber,
        Self::PanNumber,
    ];

    /// The document key of this field.
    pub fn key(&self) -> &'static str {
        match self {
            Self::VoterId => "voter_id",
            Self::Email => "email",
            Self::AadharNumber => "aadhar_number",
            Self::PanNumber => "pan_number",
        }
    }

    pub fn index_name(&self) -> &'static str {
        match self {
            Self::VoterId => "voter_id_unique",
            Self::Email => "email_unique",
            Self::AadharNumber => "aadhar_number_unique",
            Self::PanNumber => "pan_number_unique",
        }
    }

    pub fn from_index_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.index_name() == name)
    }

    /// The value of this field on the given voter.
    pub fn value<'a>(&self, voter: &'a VoterCore) -> &'a str {
        match self {
            Self::VoterId => &voter.voter_id,
            Self::Email => &voter.email,
            Self::AadharNumber => &voter.aadhar_number,
            Self::PanNumber => &voter.pan_number,
        }
    }

    /// The message shown when registering a value that is already taken.
    pub fn already_registered(&self) -> &'static str {
        match self {
            Self::VoterId => "Voter ID already registered",
            Self::Email => "Email already registered",
            Self::AadharNumber => "Aadhar number already registered",
            Self::PanNumber => "PAN number already registered",
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;
    use crate::model::common::password::hash_password;

    pub const EXAMPLE_PASSWORD: &str = "ballot-box-42";

    impl VoterCore {
        pub fn example() -> Self {
            Self {
                voter_id: "ABC1234567".to_string(),
                password_hash: hash_password(EXAMPLE_PASSWORD).unwrap(),
                first_name: "Meenakshi".to_string(),
                last_name: "Iyer".to_string(),
                email: "meenakshi.iyer@example.com".to_string(),
                mobile: "9876543210".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
                gender: Gender::Female,
                parent_spouse_name: "Raghavan Iyer".to_string(),
                street_address: "12 Temple Street".to_string(),
                city: "Chennai".to_string(),
                state: "Tamil Nadu".to_string(),
                pincode: "600004".to_string(),
                place_of_birth: "Madurai".to_string(),
                aadhar_number: "123412341234".to_string(),
                pan_number: "ABCDE1234F".to_string(),
                is_active: true,
                has_voted: false,
                registration_date: DateTime::now(),
                last_login: None,
            }
        }

        /// A second voter sharing no unique fields with [`Self::example`].
        pub fn example2() -> Self {
            Self {
                voter_id: "XYZ7654321".to_string(),
                first_name: "Arjun".to_string(),
                last_name: "Mehta".to_string(),
                email: "arjun.mehta@example.com".to_string(),
                mobile: "8123456789".to_string(),
                gender: Gender::Male,
                aadhar_number: "987698769876".to_string(),
                pan_number: "PQRST6789Z".to_string(),
                ..Self::example()
            }
        }

        pub fn inactive_example() -> Self {
            Self {
                is_active: false,
                ..Self::example()
            }
        }
    }
}

#[cfg(test)]
pub use examples::EXAMPLE_PASSWORD;
