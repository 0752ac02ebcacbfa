use std::ops::Deref;

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core vote data. Votes are never modified once recorded.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCore {
    /// The `_id` of the voter who cast this vote.
    pub voter: Id,
    pub timestamp: DateTime,
    pub is_valid: bool,
}

impl VoteCore {
    /// A valid vote by the given voter, timestamped now.
    pub fn new(voter: Id) -> Self {
        Self {
            voter,
            timestamp: DateTime::now(),
            is_valid: true,
        }
    }
}

/// A vote without an ID.
pub type NewVote = VoteCore;

/// A vote from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub vote: VoteCore,
}

impl Deref for Vote {
    type Target = VoteCore;

    fn deref(&self) -> &Self::Target {
        &self.vote
    }
}
