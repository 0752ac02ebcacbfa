use chrono::{Duration, Utc};
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::model::{api::auth::Rights, mongodb::Id};

/// Server-side login state. The client only ever holds the session's ID,
/// inside an encrypted cookie.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCore {
    pub rights: Rights,
    /// The `_id` of the admin or voter this session belongs to.
    pub user_id: Id,
    /// The database deletes the session some time after this.
    pub expire_at: DateTime,
}

impl SessionCore {
    pub fn new(rights: Rights, user_id: Id, ttl: Duration) -> Self {
        Self {
            rights,
            user_id,
            expire_at: DateTime::from_chrono(Utc::now() + ttl),
        }
    }
}

/// A session without an ID.
pub type NewSession = SessionCore;

/// A session from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub session: SessionCore,
}
