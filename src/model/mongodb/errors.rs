//! For some reason, the mongodb crate doesn't provide error code constants.
//! This module fills in the gaps.

use mongodb::error::{Error as DbError, ErrorKind, WriteFailure, TRANSIENT_TRANSACTION_ERROR};

pub const DUPLICATE_KEY: i32 = 11000;

/// If the given error is a duplicate key write error, return the name of the
/// unique index that was violated.
///
/// The server reports the index inside the message, e.g.
/// `E11000 duplicate key error collection: evoting.voters index: email_unique dup key: ...`.
pub fn duplicate_key_index(err: &DbError) -> Option<String> {
    if let ErrorKind::Write(WriteFailure::WriteError(ref e)) = *err.kind {
        if e.code == DUPLICATE_KEY {
            return Some(index_from_message(&e.message).unwrap_or_default());
        }
    }
    None
}

/// Whether a transaction failed in a way that may succeed if run again,
/// such as a write conflict with a concurrent transaction.
pub fn is_transient_transaction_error(err: &DbError) -> bool {
    err.contains_label(TRANSIENT_TRANSACTION_ERROR)
}

fn index_from_message(message: &str) -> Option<String> {
    let (_, rest) = message.split_once("index: ")?;
    rest.split_whitespace().next().map(str::to_string)
}
