use std::{fmt::Display, ops::Deref, str::FromStr};

use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use serde::{Deserialize, Serialize};

/// A database record ID.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id(ObjectId);

impl Id {
    /// A filter document matching the record with this ID.
    pub fn as_doc(&self) -> Document {
        doc! { "_id": self.0 }
    }

    /// Extract the ID from the `inserted_id` of an insert result.
    ///
    /// Every collection in this crate uses server-generated `ObjectId`s, so
    /// anything else is a broken database.
    pub fn from_inserted(inserted_id: Bson) -> Option<Self> {
        inserted_id.as_object_id().map(Self)
    }
}

impl Deref for Id {
    type Target = ObjectId;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Id {
    type Err = mongodb::bson::oid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse::<ObjectId>()?))
    }
}

impl From<ObjectId> for Id {
    fn from(id: ObjectId) -> Self {
        Self(id)
    }
}

impl From<Id> for Bson {
    fn from(id: Id) -> Self {
        Bson::ObjectId(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_builds_filter() {
        let id: Id = "64b7f0c2a1b2c3d4e5f60718".parse().unwrap();
        assert_eq!(id.to_string(), "64b7f0c2a1b2c3d4e5f60718");
        assert_eq!(id.as_doc(), doc! { "_id": *id });
    }

    #[test]
    fn rejects_non_object_ids() {
        assert!("not-an-id".parse::<Id>().is_err());
        assert!(Id::from_inserted(Bson::Int32(3)).is_none());
    }
}
