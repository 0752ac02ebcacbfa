use mongodb::{bson::doc, error::Error as DbError};

use crate::error::{Error, Result};
use crate::model::{
    api::auth::AuthToken,
    db::voter::{UniqueVoterField, Voter},
    mongodb::{duplicate_key_index, Coll},
};

/// Return a Voter from the database via looking up their token ID.
pub async fn voter_by_token(token: &AuthToken<Voter>, voters: &Coll<Voter>) -> Result<Voter> {
    let voter_id = token.id();
    voters
        .find_one(voter_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Voter with ID {voter_id}")))
}

/// Find a voter by their public voter ID, in any case.
pub async fn voter_by_voter_id(voter_id: &str, voters: &Coll<Voter>) -> Result<Voter> {
    let voter_id = voter_id.trim().to_uppercase();
    voters
        .find_one(doc! { "voter_id": &voter_id }, None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Voter {voter_id}")))
}

/// Translate a failed voter write into a conflict naming the duplicated
/// field, if the store rejected it on a unique index.
pub fn voter_write_error(err: DbError) -> Error {
    match duplicate_key_index(&err) {
        Some(index) => {
            let message = UniqueVoterField::from_index_name(&index)
                .map(|field| field.already_registered())
                .unwrap_or("Voter already registered");
            Error::conflict(message)
        }
        None => err.into(),
    }
}
