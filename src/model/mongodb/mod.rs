mod bson;
mod collection;
mod errors;

pub use bson::Id;
pub use collection::{ensure_indexes_exist, Coll, MongoCollection, ONE_VOTE_PER_VOTER_INDEX};
pub use errors::{duplicate_key_index, is_transient_transaction_error};
