use std::{fmt::Display, str::FromStr};

use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};

/// Gender as recorded on the electoral roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
}

impl Gender {
    /// The single-letter code stored in the database.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Other => "O",
        }
    }
}

impl Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        };
        write!(f, "{label}")
    }
}

impl FromStr for Gender {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "M" => Ok(Self::Male),
            "F" => Ok(Self::Female),
            "O" => Ok(Self::Other),
            _ => Err(()),
        }
    }
}

impl From<Gender> for Bson {
    fn from(gender: Gender) -> Self {
        Bson::String(gender.code().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!("M".parse(), Ok(Gender::Male));
        assert_eq!("f".parse(), Ok(Gender::Female));
        assert_eq!(" O ".parse(), Ok(Gender::Other));
        assert_eq!("X".parse::<Gender>(), Err(()));
        assert_eq!("Male".parse::<Gender>(), Err(()));
    }

    #[test]
    fn bson_uses_code() {
        assert_eq!(Bson::from(Gender::Female), Bson::String("F".to_string()));
    }
}
