use std::collections::HashMap;

use chrono::Utc;
use mongodb::{bson::doc, options::FindOptions};
use rocket::{
    futures::TryStreamExt,
    http::Status,
    request::{FromRequest, Outcome},
    serde::json::Json,
    Request, Route,
};

use crate::{
    error::{Error, Result},
    logging::RequestId,
    model::{
        api::{
            auth::AuthToken,
            backoffice::{
                search_filter, VoteFilter, VoteSummary, VoterDetail, VoterFilter, VoterSummary,
                VoterUpdate, VOTE_SEARCH_FIELDS,
            },
            pagination::{Paginated, PaginationRequest},
        },
        db::{admin::Admin, vote::Vote, voter::Voter},
        mongodb::{Coll, Id},
    },
};

use super::common::{voter_by_voter_id, voter_write_error};

pub fn routes() -> Vec<Route> {
    routes![
        list_voters,
        get_voter,
        update_voter,
        list_votes,
        add_vote,
        replace_vote,
        modify_vote,
    ]
}

/// An admin session, required by every back office route. Unlike a bare
/// [`AuthToken`], a missing session fails the request with 401 rather than
/// forwarding it.
pub struct BackOffice(pub AuthToken<Admin>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for BackOffice {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match req.guard::<AuthToken<Admin>>().await {
            Outcome::Success(token) => Outcome::Success(Self(token)),
            Outcome::Failure(failure) => Outcome::Failure(failure),
            Outcome::Forward(()) => Outcome::Failure((
                Status::Unauthorized,
                Error::unauthorized("Admin session required"),
            )),
        }
    }
}

#[get("/backoffice/voters?<search>&<is_active>&<has_voted>&<gender>&<state>&<pagination..>")]
#[allow(clippy::too_many_arguments)]
pub async fn list_voters(
    _admin: BackOffice,
    search: Option<String>,
    is_active: Option<bool>,
    has_voted: Option<bool>,
    gender: Option<String>,
    state: Option<String>,
    pagination: PaginationRequest,
    voters: Coll<Voter>,
) -> Result<Json<Paginated<VoterSummary>>> {
    let filter = VoterFilter {
        search,
        is_active,
        has_voted,
        gender,
        state,
    }
    .to_doc()?;

    let options = FindOptions::builder()
        .sort(doc! { "registration_date": -1 })
        .skip(pagination.skip())
        .limit(i64::from(pagination.page_size()))
        .build();
    let today = Utc::now().date_naive();
    let items = voters
        .find(filter.clone(), options)
        .await?
        .map_ok(|voter| VoterSummary::from_voter(&voter, today))
        .try_collect::<Vec<_>>()
        .await?;
    let total = voters.count_documents(filter, None).await?;

    Ok(Json(pagination.to_paginated(total, items)))
}

#[get("/backoffice/voters/<voter_id>")]
pub async fn get_voter(
    _admin: BackOffice,
    voter_id: &str,
    voters: Coll<Voter>,
) -> Result<Json<VoterDetail>> {
    let voter = voter_by_voter_id(voter_id, &voters).await?;
    Ok(Json(voter.into()))
}

#[patch("/backoffice/voters/<voter_id>", data = "<update>", format = "json")]
pub async fn update_voter(
    _admin: BackOffice,
    voter_id: &str,
    update: Json<VoterUpdate>,
    voters: Coll<Voter>,
    request_id: &RequestId,
) -> Result<Json<VoterDetail>> {
    let voter = voter_by_voter_id(voter_id, &voters).await?;

    if let Some(set) = update.to_set_doc(Utc::now().date_naive())? {
        voters
            .update_one(voter.id.as_doc(), doc! { "$set": set }, None)
            .await
            .map_err(voter_write_error)?;
        info!("{request_id} voter {} updated", voter.voter_id);
    }

    let voter = voter_by_voter_id(&voter.voter_id, &voters).await?;
    Ok(Json(voter.into()))
}

#[get("/backoffice/votes?<search>&<is_valid>&<voted_from>&<voted_to>&<pagination..>")]
#[allow(clippy::too_many_arguments)]
pub async fn list_votes(
    _admin: BackOffice,
    search: Option<String>,
    is_valid: Option<bool>,
    voted_from: Option<String>,
    voted_to: Option<String>,
    pagination: PaginationRequest,
    votes: Coll<Vote>,
    voters: Coll<Voter>,
) -> Result<Json<Paginated<VoteSummary>>> {
    let mut filter = VoteFilter {
        is_valid,
        voted_from,
        voted_to,
    }
    .to_doc()?;
    if let Some(term) = search.filter(|term| !term.trim().is_empty()) {
        let matching = voters
            .find(search_filter(&term, &VOTE_SEARCH_FIELDS), None)
            .await?
            .map_ok(|voter| voter.id)
            .try_collect::<Vec<Id>>()
            .await?;
        filter.insert("voter", doc! { "$in": matching });
    }

    let options = FindOptions::builder()
        .sort(doc! { "timestamp": -1 })
        .skip(pagination.skip())
        .limit(i64::from(pagination.page_size()))
        .build();
    let page = votes
        .find(filter.clone(), options)
        .await?
        .try_collect::<Vec<_>>()
        .await?;
    let total = votes.count_documents(filter, None).await?;

    // Look up the voters behind this page in one query.
    let voter_ids = page.iter().map(|vote| vote.voter).collect::<Vec<_>>();
    let page_voters = voters
        .find(doc! { "_id": { "$in": voter_ids } }, None)
        .await?
        .map_ok(|voter| (voter.id, voter))
        .try_collect::<HashMap<_, _>>()
        .await?;
    let items = page
        .iter()
        .map(|vote| VoteSummary::from_vote(vote, page_voters.get(&vote.voter)))
        .collect();

    Ok(Json(pagination.to_paginated(total, items)))
}

#[post("/backoffice/votes")]
pub fn add_vote(_admin: BackOffice) -> Result<()> {
    Err(Error::forbidden("Votes cannot be added manually"))
}

#[put("/backoffice/votes/<_>")]
pub fn replace_vote(_admin: BackOffice) -> Result<()> {
    Err(Error::forbidden("Votes cannot be changed"))
}

#[patch("/backoffice/votes/<_>")]
pub fn modify_vote(_admin: BackOffice) -> Result<()> {
    Err(Error::forbidden("Votes cannot be changed"))
}

#[cfg(test)]
mod tests {
    use mongodb::{bson::DateTime, Database};
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
    };

    use chrono::NaiveDate;

    use crate::model::{
        common::gender::Gender,
        db::{vote::NewVote, voter::NewVoter},
    };

    use super::*;

    /// Insert both example voters, the second registered later, and a vote
    /// by the first.
    async fn insert_voters_and_vote(db: &Database) -> (Id, Id) {
        let voters = Coll::<NewVoter>::from_db(db);
        let first = NewVoter {
            registration_date: DateTime::from_millis(1_700_000_000_000),
            ..NewVoter::example()
        };
        let second = NewVoter {
            registration_date: DateTime::from_millis(1_700_000_600_000),
            ..NewVoter::example2()
        };
        let first = voters.insert_one(first, None).await.unwrap();
        let second = voters.insert_one(second, None).await.unwrap();
        let first = Id::from_inserted(first.inserted_id).unwrap();
        let second = Id::from_inserted(second.inserted_id).unwrap();

        Coll::<NewVote>::from_db(db)
            .insert_one(NewVote::new(first), None)
            .await
            .unwrap();
        (first, second)
    }

    async fn get_json<T: serde::de::DeserializeOwned + Send + 'static>(client: &Client, uri: &str) -> T {
        let response = client.get(uri.to_string()).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        response.into_json::<T>().await.unwrap()
    }

    #[backend_test(admin)]
    async fn list_voters_all(client: Client, db: Database) {
        insert_voters_and_vote(&db).await;

        let page: Paginated<VoterSummary> = get_json(&client, "/backoffice/voters").await;
        assert_eq!(page.pagination.total, 2);
        // Newest registration first.
        assert_eq!(page.items[0].voter_id, "XYZ7654321");
        assert_eq!(page.items[1].voter_id, "ABC1234567");
        assert!(page.items.iter().all(|voter| voter.is_adult));
    }

    #[backend_test(admin)]
    async fn list_voters_filtered(client: Client, db: Database) {
        insert_voters_and_vote(&db).await;

        // Search is case-insensitive and literal.
        let page: Paginated<VoterSummary> =
            get_json(&client, "/backoffice/voters?search=MEHTA").await;
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.items[0].full_name, "Arjun Mehta");

        let page: Paginated<VoterSummary> = get_json(&client, "/backoffice/voters?search=.*").await;
        assert_eq!(page.pagination.total, 0);

        let page: Paginated<VoterSummary> =
            get_json(&client, "/backoffice/voters?gender=F&is_active=true").await;
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.items[0].voter_id, "ABC1234567");

        // An unknown gender is refused rather than ignored.
        let response = client.get("/backoffice/voters?gender=X").dispatch().await;
        assert_eq!(Status::BadRequest, response.status());
    }

    #[backend_test(admin)]
    async fn list_voters_paginated(client: Client, db: Database) {
        insert_voters_and_vote(&db).await;

        let page: Paginated<VoterSummary> =
            get_json(&client, "/backoffice/voters?page_num=2&page_size=1").await;
        assert_eq!(page.pagination.total, 2);
        assert_eq!(page.pagination.page_num, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].voter_id, "ABC1234567");
    }

    #[backend_test(admin)]
    async fn voter_detail(client: Client, db: Database) {
        insert_voters_and_vote(&db).await;

        let detail: VoterDetail = get_json(&client, "/backoffice/voters/abc1234567").await;
        assert_eq!(detail.voter_id, "ABC1234567");
        assert_eq!(detail.city, "Chennai");

        let response = client.get("/backoffice/voters/ZZZ0000000").dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(admin)]
    async fn update_voter_fields(client: Client, db: Database, voters: Coll<Voter>) {
        insert_voters_and_vote(&db).await;

        let response = client
            .patch("/backoffice/voters/ABC1234567")
            .header(ContentType::JSON)
            .body(r#"{"city": "Coimbatore", "is_active": false}"#)
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let detail = response.into_json::<VoterDetail>().await.unwrap();
        assert_eq!(detail.city, "Coimbatore");
        assert!(!detail.is_active);

        let voter = voters
            .find_one(doc! { "voter_id": "ABC1234567" }, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(voter.city, "Coimbatore");
        assert!(!voter.is_active);
    }

    #[backend_test(admin)]
    async fn update_voter_birth_date_and_gender(client: Client, db: Database) {
        insert_voters_and_vote(&db).await;

        let response = client
            .patch("/backoffice/voters/ABC1234567")
            .header(ContentType::JSON)
            .body(r#"{"date_of_birth": "1988-11-05", "gender": "O"}"#)
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let detail = response.into_json::<VoterDetail>().await.unwrap();
        assert_eq!(detail.date_of_birth, NaiveDate::from_ymd_opt(1988, 11, 5).unwrap());
        assert_eq!(detail.gender, Gender::Other);

        let detail: VoterDetail = get_json(&client, "/backoffice/voters/ABC1234567").await;
        assert_eq!(detail.gender, Gender::Other);

        // A birth date making the voter underage is refused.
        let response = client
            .patch("/backoffice/voters/ABC1234567")
            .header(ContentType::JSON)
            .body(r#"{"date_of_birth": "2099-01-01"}"#)
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
    }

    #[backend_test(admin)]
    async fn update_voter_rejected(client: Client, db: Database) {
        insert_voters_and_vote(&db).await;

        // Identity fields are read-only.
        let response = client
            .patch("/backoffice/voters/ABC1234567")
            .header(ContentType::JSON)
            .body(r#"{"voter_id": "ZZZ0000000"}"#)
            .dispatch()
            .await;
        assert_eq!(Status::UnprocessableEntity, response.status());

        // Fields are validated.
        let response = client
            .patch("/backoffice/voters/ABC1234567")
            .header(ContentType::JSON)
            .body(r#"{"mobile": "12345"}"#)
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());

        // Emails stay unique.
        let response = client
            .patch("/backoffice/voters/ABC1234567")
            .header(ContentType::JSON)
            .body(r#"{"email": "arjun.mehta@example.com"}"#)
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());
    }

    #[backend_test(admin)]
    async fn list_votes_with_voters(client: Client, db: Database) {
        let (first, _) = insert_voters_and_vote(&db).await;

        let page: Paginated<VoteSummary> = get_json(&client, "/backoffice/votes").await;
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.items[0].voter_id, "ABC1234567");
        assert_eq!(page.items[0].voter_name, "Meenakshi Iyer");
        assert!(page.items[0].is_valid);

        let page: Paginated<VoteSummary> = get_json(&client, "/backoffice/votes?search=iyer").await;
        assert_eq!(page.pagination.total, 1);
        let page: Paginated<VoteSummary> =
            get_json(&client, "/backoffice/votes?search=mehta").await;
        assert_eq!(page.pagination.total, 0);
        let page: Paginated<VoteSummary> =
            get_json(&client, "/backoffice/votes?is_valid=false").await;
        assert_eq!(page.pagination.total, 0);

        // The vote was cast today.
        let today = Utc::now().date_naive();
        let uri = format!("/backoffice/votes?voted_from={today}&voted_to={today}");
        let page: Paginated<VoteSummary> = get_json(&client, &uri).await;
        assert_eq!(page.pagination.total, 1);
        let page: Paginated<VoteSummary> =
            get_json(&client, "/backoffice/votes?voted_to=2000-01-01").await;
        assert_eq!(page.pagination.total, 0);
        let page: Paginated<VoteSummary> =
            get_json(&client, "/backoffice/votes?voted_from=2000-01-01").await;
        assert_eq!(page.pagination.total, 1);
        let response = client.get("/backoffice/votes?voted_from=yesterday").dispatch().await;
        assert_eq!(Status::BadRequest, response.status());

        // A vote whose voter has gone is still listed.
        Coll::<NewVoter>::from_db(&db)
            .delete_one(first.as_doc(), None)
            .await
            .unwrap();
        let page: Paginated<VoteSummary> = get_json(&client, "/backoffice/votes").await;
        assert_eq!(page.items[0].voter_id, "");
    }

    #[backend_test(admin)]
    async fn votes_are_read_only(client: Client, db: Database) {
        insert_voters_and_vote(&db).await;
        let vote_id = Coll::<Vote>::from_db(&db)
            .find_one(None, None)
            .await
            .unwrap()
            .unwrap()
            .id;

        let response = client.post("/backoffice/votes").dispatch().await;
        assert_eq!(Status::Forbidden, response.status());
        let uri = format!("/backoffice/votes/{vote_id}");
        let response = client.put(uri.clone()).dispatch().await;
        assert_eq!(Status::Forbidden, response.status());
        let response = client.patch(uri).dispatch().await;
        assert_eq!(Status::Forbidden, response.status());

        let votes = Coll::<Vote>::from_db(&db);
        assert_eq!(votes.count_documents(None, None).await.unwrap(), 1);
    }

    #[backend_test]
    async fn backoffice_requires_admin(client: Client) {
        for uri in ["/backoffice/voters", "/backoffice/votes", "/backoffice/voters/ABC1234567"] {
            let response = client.get(uri).dispatch().await;
            assert_eq!(Status::Unauthorized, response.status());
        }
        let response = client.post("/backoffice/votes").dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    #[backend_test(voter)]
    async fn backoffice_refuses_voters(client: Client) {
        let response = client.get("/backoffice/voters").dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());
    }
}
