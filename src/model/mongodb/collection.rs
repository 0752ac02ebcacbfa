use std::{ops::Deref, time::Duration};

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{
    admin::{Admin, NewAdmin},
    session::{NewSession, Session},
    vote::{NewVote, Vote},
    voter::{NewVoter, UniqueVoterField, Voter},
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

// Admin collections
const ADMINS: &str = "admins";
impl MongoCollection for Admin {
    const NAME: &'static str = ADMINS;
}
impl MongoCollection for NewAdmin {
    const NAME: &'static str = ADMINS;
}

// Voter collections
const VOTERS: &str = "voters";
impl MongoCollection for Voter {
    const NAME: &'static str = VOTERS;
}
impl MongoCollection for NewVoter {
    const NAME: &'static str = VOTERS;
}

// Vote collections
const VOTES: &str = "votes";
impl MongoCollection for Vote {
    const NAME: &'static str = VOTES;
}
impl MongoCollection for NewVote {
    const NAME: &'static str = VOTES;
}

// Session collections
const SESSIONS: &str = "sessions";
impl MongoCollection for Session {
    const NAME: &'static str = SESSIONS;
}
impl MongoCollection for NewSession {
    const NAME: &'static str = SESSIONS;
}

/// Name of the unique index on the admin username.
const ADMIN_USERNAME_INDEX: &str = "username_unique";

/// Name of the unique index allowing one vote per voter.
pub const ONE_VOTE_PER_VOTER_INDEX: &str = "voter_unique";

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    // Voter collection: one named unique index per unique field, so that
    // duplicate key errors can be traced back to the field.
    let voters = Coll::<Voter>::from_db(db);
    for field in UniqueVoterField::ALL {
        let index = IndexModel::builder()
            .keys(doc! { field.key(): 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(field.index_name().to_string())
                    .build(),
            )
            .build();
        voters.create_index(index, None).await?;
    }

    // Admin collection.
    let admin_index = IndexModel::builder()
        .keys(doc! { "username": 1 })
        .options(
            IndexOptions::builder()
                .unique(true)
                .name(ADMIN_USERNAME_INDEX.to_string())
                .build(),
        )
        .build();
    Coll::<Admin>::from_db(db)
        .create_index(admin_index, None)
        .await?;

    // Vote collection.
    let vote_index = IndexModel::builder()
        .keys(doc! { "voter": 1 })
        .options(
            IndexOptions::builder()
                .unique(true)
                .name(ONE_VOTE_PER_VOTER_INDEX.to_string())
                .build(),
        )
        .build();
    Coll::<Vote>::from_db(db).create_index(vote_index, None).await?;

    // Session collection: the server deletes sessions once they expire.
    let session_index = IndexModel::builder()
        .keys(doc! { "expire_at": 1 })
        .options(
            IndexOptions::builder()
                .expire_after(Duration::from_secs(0))
                .build(),
        )
        .build();
    Coll::<Session>::from_db(db)
        .create_index(session_index, None)
        .await?;

    Ok(())
}
