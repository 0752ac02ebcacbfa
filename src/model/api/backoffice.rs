//! Views over voter and vote records for the admin back office.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mongodb::bson::{doc, DateTime as BsonDateTime, Document, Regex as BsonRegex};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        common::{
            gender::Gender,
            validation::{self, MAX_LONG_TEXT_LENGTH, MAX_NAME_LENGTH, VOTING_AGE},
        },
        db::{vote::Vote, voter::Voter},
    },
};

/// Voter fields searched by the back office search box.
pub const VOTER_SEARCH_FIELDS: [&str; 7] = [
    "voter_id",
    "first_name",
    "last_name",
    "email",
    "mobile",
    "aadhar_number",
    "pan_number",
];

/// Voter fields searched when looking for a vote's voter.
pub const VOTE_SEARCH_FIELDS: [&str; 3] = ["voter_id", "first_name", "last_name"];

/// A case-insensitive substring search over the given fields. The term is
/// matched literally.
pub fn search_filter(term: &str, fields: &[&str]) -> Document {
    let pattern = regex::escape(term.trim());
    let clauses = fields
        .iter()
        .map(|field| {
            doc! {
                *field: BsonRegex {
                    pattern: pattern.clone(),
                    options: "i".to_string(),
                }
            }
        })
        .collect::<Vec<_>>();
    doc! { "$or": clauses }
}

/// Query filters for the voter list. Absent filters match everything.
#[derive(Debug, Default)]
pub struct VoterFilter {
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub has_voted: Option<bool>,
    pub gender: Option<String>,
    pub state: Option<String>,
}

impl VoterFilter {
    /// Build the query. An unrecognised gender is a bad request rather than
    /// a filter that silently matches everyone.
    pub fn to_doc(&self) -> Result<Document> {
        let mut filter = doc! {};
        if let Some(term) = self.search.as_deref().filter(|term| !term.trim().is_empty()) {
            for (key, value) in search_filter(term, &VOTER_SEARCH_FIELDS) {
                filter.insert(key, value);
            }
        }
        if let Some(is_active) = self.is_active {
            filter.insert("is_active", is_active);
        }
        if let Some(has_voted) = self.has_voted {
            filter.insert("has_voted", has_voted);
        }
        if let Some(gender) = self.gender.as_deref().filter(|g| !g.trim().is_empty()) {
            filter.insert("gender", validation::gender(gender.trim())?);
        }
        if let Some(state) = self.state.as_deref().filter(|state| !state.trim().is_empty()) {
            filter.insert("state", state.trim());
        }
        Ok(filter)
    }
}

/// Query filters on the votes themselves. The search over voter names is
/// resolved against the voters collection by the caller.
#[derive(Debug, Default)]
pub struct VoteFilter {
    pub is_valid: Option<bool>,
    /// First day included, `YYYY-MM-DD`.
    pub voted_from: Option<String>,
    /// Last day included, `YYYY-MM-DD`.
    pub voted_to: Option<String>,
}

impl VoteFilter {
    pub fn to_doc(&self) -> Result<Document> {
        let mut filter = doc! {};
        if let Some(is_valid) = self.is_valid {
            filter.insert("is_valid", is_valid);
        }

        // Whole UTC days: [start of `voted_from`, start of the day after `voted_to`).
        let mut timestamp = doc! {};
        if let Some(from) = non_blank(&self.voted_from) {
            timestamp.insert("$gte", start_of_day(parse_day(from)?));
        }
        if let Some(to) = non_blank(&self.voted_to) {
            let next_day = parse_day(to)?
                .succ_opt()
                .ok_or_else(|| Error::bad_request("Date is out of range"))?;
            timestamp.insert("$lt", start_of_day(next_day));
        }
        if !timestamp.is_empty() {
            filter.insert("timestamp", timestamp);
        }
        Ok(filter)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

fn parse_day(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| Error::bad_request("Dates must be in the format YYYY-MM-DD"))
}

fn start_of_day(day: NaiveDate) -> BsonDateTime {
    BsonDateTime::from_chrono(day.and_time(NaiveTime::MIN).and_utc())
}

/// One row of the voter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterSummary {
    pub voter_id: String,
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub age: u32,
    /// Whether the voter is at least of voting age today.
    pub is_adult: bool,
    pub is_active: bool,
    pub has_voted: bool,
}

impl VoterSummary {
    pub fn from_voter(voter: &Voter, today: NaiveDate) -> Self {
        let age = voter.age_on(today);
        Self {
            voter_id: voter.voter_id.clone(),
            full_name: voter.full_name(),
            email: voter.email.clone(),
            mobile: voter.mobile.clone(),
            age,
            is_adult: age >= VOTING_AGE,
            is_active: voter.is_active,
            has_voted: voter.has_voted,
        }
    }
}

/// Everything about a voter except the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterDetail {
    pub voter_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub parent_spouse_name: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub place_of_birth: String,
    pub aadhar_number: String,
    pub pan_number: String,
    pub is_active: bool,
    pub has_voted: bool,
    pub registration_date: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<Voter> for VoterDetail {
    fn from(voter: Voter) -> Self {
        let voter = voter.voter;
        Self {
            voter_id: voter.voter_id,
            first_name: voter.first_name,
            last_name: voter.last_name,
            email: voter.email,
            mobile: voter.mobile,
            date_of_birth: voter.date_of_birth,
            gender: voter.gender,
            parent_spouse_name: voter.parent_spouse_name,
            street_address: voter.street_address,
            city: voter.city,
            state: voter.state,
            pincode: voter.pincode,
            place_of_birth: voter.place_of_birth,
            aadhar_number: voter.aadhar_number,
            pan_number: voter.pan_number,
            is_active: voter.is_active,
            has_voted: voter.has_voted,
            registration_date: voter.registration_date.to_chrono(),
            last_login: voter.last_login.map(|login| login.to_chrono()),
        }
    }
}

/// Changes an admin may make to a voter. Identity fields (voter ID, national
/// ID, PAN), the voting flag and the timestamps cannot be changed.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoterUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub parent_spouse_name: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub place_of_birth: Option<String>,
    pub is_active: Option<bool>,
}

impl VoterUpdate {
    /// Validate each present field and build the `$set` document. Returns
    /// `None` if there is nothing to change. The date of birth must still
    /// give a voting age on `today`.
    pub fn to_set_doc(&self, today: NaiveDate) -> Result<Option<Document>> {
        let mut set = doc! {};
        if let Some(ref first_name) = self.first_name {
            set.insert(
                "first_name",
                validation::text("First name", first_name, Some(MAX_NAME_LENGTH))?,
            );
        }
        if let Some(ref last_name) = self.last_name {
            set.insert(
                "last_name",
                validation::text("Last name", last_name, Some(MAX_NAME_LENGTH))?,
            );
        }
        if let Some(ref email) = self.email {
            set.insert("email", validation::email(email)?);
        }
        if let Some(ref mobile) = self.mobile {
            set.insert("mobile", validation::mobile(mobile)?);
        }
        if let Some(ref name) = self.parent_spouse_name {
            set.insert(
                "parent_spouse_name",
                validation::text("Parent/spouse name", name, Some(MAX_LONG_TEXT_LENGTH))?,
            );
        }
        if let Some(ref street_address) = self.street_address {
            set.insert(
                "street_address",
                validation::text("Street address", street_address, None)?,
            );
        }
        if let Some(ref city) = self.city {
            set.insert("city", validation::text("City", city, Some(MAX_NAME_LENGTH))?);
        }
        if let Some(ref state) = self.state {
            set.insert("state", validation::text("State", state, Some(MAX_NAME_LENGTH))?);
        }
        if let Some(ref pincode) = self.pincode {
            set.insert("pincode", validation::pincode(pincode)?);
        }
        if let Some(ref dob) = self.date_of_birth {
            // Stored as text, the same way the voter record serialises it.
            let dob = validation::date_of_birth(dob, today)?;
            set.insert("date_of_birth", dob.format("%Y-%m-%d").to_string());
        }
        if let Some(ref gender) = self.gender {
            set.insert("gender", validation::gender(gender.trim())?);
        }
        if let Some(ref place) = self.place_of_birth {
            set.insert(
                "place_of_birth",
                validation::text("Place of birth", place, Some(MAX_LONG_TEXT_LENGTH))?,
            );
        }
        if let Some(is_active) = self.is_active {
            set.insert("is_active", is_active);
        }
        Ok((!set.is_empty()).then_some(set))
    }
}

/// One row of the vote list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSummary {
    pub id: String,
    pub voter_id: String,
    pub voter_name: String,
    pub timestamp: DateTime<Utc>,
    pub is_valid: bool,
}

impl VoteSummary {
    /// Describe a vote. `voter` is `None` if the voter record has gone.
    pub fn from_vote(vote: &Vote, voter: Option<&Voter>) -> Self {
        Self {
            id: vote.id.to_hex(),
            voter_id: voter
                .map(|voter| voter.voter_id.clone())
                .unwrap_or_default(),
            voter_name: voter.map(|voter| voter.full_name()).unwrap_or_default(),
            timestamp: vote.timestamp.to_chrono(),
            is_valid: vote.is_valid,
        }
    }
}
