use mongodb::bson::doc;
use rocket::{response::Redirect, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    logging::RequestId,
    model::{
        api::{auth::AuthToken, response::ApiResponse},
        db::{vote::NewVote, voter::Voter},
        mongodb::{
            duplicate_key_index, is_transient_transaction_error, Coll, Id,
            ONE_VOTE_PER_VOTER_INDEX,
        },
    },
    Config,
};

use super::pages;

const ALREADY_VOTED: &str = "You have already voted";
const VOTE_FAILED: &str = "Vote failed. Please try again.";

/// How many times the vote transaction is run when it keeps conflicting with
/// concurrent writes.
const MAX_VOTE_ATTEMPTS: u32 = 3;

pub fn routes() -> Vec<Route> {
    routes![cast_vote, cast_vote_logged_out]
}

#[post("/voter/vote")]
pub async fn cast_vote(
    token: AuthToken<Voter>,
    voters: Coll<Voter>,
    votes: Coll<NewVote>,
    db_client: &State<mongodb::Client>,
    config: &State<Config>,
    request_id: &RequestId,
) -> Json<ApiResponse> {
    let voter_id = token.id();
    let result = record_vote(voter_id, &voters, &votes, db_client, request_id).await;
    match result {
        Ok(_) => info!("{request_id} vote recorded for voter {voter_id}"),
        Err(ref err) => info!("{request_id} vote refused for voter {voter_id}: {err}"),
    }
    Json(ApiResponse::from_result(result, config.debug(), VOTE_FAILED))
}

#[post("/voter/vote", rank = 2)]
pub fn cast_vote_logged_out() -> Redirect {
    Redirect::to(uri!(pages::login))
}

/// Mark the voter as having voted and store their vote, atomically. A
/// transaction that loses a write conflict is run again, so a concurrent
/// second vote sees the first and is refused.
async fn record_vote(
    voter_id: Id,
    voters: &Coll<Voter>,
    votes: &Coll<NewVote>,
    db_client: &mongodb::Client,
    request_id: &RequestId,
) -> Result<ApiResponse> {
    let mut attempt = 1;
    loop {
        match try_record_vote(voter_id, voters, votes, db_client).await {
            Err(Error::Db(ref err))
                if is_transient_transaction_error(err) && attempt < MAX_VOTE_ATTEMPTS =>
            {
                debug!("{request_id} vote transaction conflicted on attempt {attempt}, retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}

async fn try_record_vote(
    voter_id: Id,
    voters: &Coll<Voter>,
    votes: &Coll<NewVote>,
    db_client: &mongodb::Client,
) -> Result<ApiResponse> {
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    // Only flips the flag of an active voter who has not yet voted.
    let filter = doc! {
        "_id": voter_id,
        "has_voted": false,
        "is_active": true,
    };
    let update = doc! {
        "$set": { "has_voted": true },
    };
    let result = voters
        .update_one_with_session(filter, update, None, &mut session)
        .await?;
    if result.modified_count == 0 {
        session.abort_transaction().await?;
        return Err(Error::conflict(ALREADY_VOTED));
    }

    if let Err(err) = votes
        .insert_one_with_session(NewVote::new(voter_id), None, &mut session)
        .await
    {
        session.abort_transaction().await?;
        return Err(match duplicate_key_index(&err) {
            Some(index) if index == ONE_VOTE_PER_VOTER_INDEX => Error::conflict(ALREADY_VOTED),
            _ => err.into(),
        });
    }

    session.commit_transaction().await?;
    Ok(ApiResponse::success("Vote recorded"))
}
