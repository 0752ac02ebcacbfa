use rocket::{
    response::{content::RawHtml, Redirect},
    Route,
};

use crate::{
    error::Result,
    model::{
        api::auth::AuthToken,
        db::{admin::Admin, voter::Voter},
        mongodb::Coll,
    },
};

use super::common::voter_by_token;

const LANDING: &str = include_str!("../../pages/landing.html");
const LOGIN: &str = include_str!("../../pages/login.html");
const CONTACT: &str = include_str!("../../pages/contact.html");
const RESULTS: &str = include_str!("../../pages/results.html");
const ADMIN: &str = include_str!("../../pages/admin.html");
const VOTER: &str = include_str!("../../pages/voter.html");

pub fn routes() -> Vec<Route> {
    routes![
        landing,
        login,
        contact,
        results,
        admin_dashboard,
        admin_dashboard_logged_out,
        voter_dashboard,
        voter_dashboard_logged_out,
    ]
}

#[get("/")]
pub fn landing() -> RawHtml<&'static str> {
    RawHtml(LANDING)
}

#[get("/login")]
pub fn login() -> RawHtml<&'static str> {
    RawHtml(LOGIN)
}

#[get("/contact")]
pub fn contact() -> RawHtml<&'static str> {
    RawHtml(CONTACT)
}

#[get("/results")]
pub fn results() -> RawHtml<&'static str> {
    RawHtml(RESULTS)
}

#[get("/admin")]
pub fn admin_dashboard(_token: AuthToken<Admin>) -> RawHtml<&'static str> {
    RawHtml(ADMIN)
}

#[get("/admin", rank = 2)]
pub fn admin_dashboard_logged_out() -> Redirect {
    Redirect::to(uri!(login))
}

#[get("/voter")]
pub async fn voter_dashboard(
    token: AuthToken<Voter>,
    voters: Coll<Voter>,
) -> Result<RawHtml<String>> {
    let voter = voter_by_token(&token, &voters).await?;
    Ok(RawHtml(render_voter_dashboard(&voter)))
}

#[get("/voter", rank = 2)]
pub fn voter_dashboard_logged_out() -> Redirect {
    Redirect::to(uri!(login))
}

fn render_voter_dashboard(voter: &Voter) -> String {
    let (vote_status, vote_form_hidden) = if voter.has_voted {
        ("You have voted", "hidden")
    } else {
        ("You have not voted yet", "")
    };
    VOTER
        .replace("{{full_name}}", &escape_html(&voter.full_name()))
        .replace("{{voter_id}}", &escape_html(&voter.voter_id))
        .replace("{{email}}", &escape_html(&voter.email))
        .replace("{{city}}", &escape_html(&voter.city))
        .replace("{{state}}", &escape_html(&voter.state))
        .replace("{{vote_status}}", vote_status)
        .replace("{{vote_form_hidden}}", vote_form_hidden)
}

/// Escape text for interpolation into HTML element content or a quoted
/// attribute value.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
