use mongodb::bson::{doc, DateTime};
use rocket::{
    form::Form,
    http::CookieJar,
    response::Redirect,
    serde::json::Json,
    Route, State,
};

use crate::{
    error::{Error, Result},
    logging::RequestId,
    model::{
        api::{
            auth::{end_session, start_session, LoginRequest, Rights},
            registration::{RegistrationForm, ValidRegistration},
            response::ApiResponse,
        },
        db::{
            admin::{is_admin_identifier, Admin},
            session::{NewSession, Session},
            voter::{NewVoter, UniqueVoterField, Voter},
        },
        mongodb::Coll,
    },
    Config,
};

use super::{common::voter_write_error, pages};

const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";
const LOGIN_FAILED: &str = "Login failed. Please try again.";
const INVALID_METHOD: &str = "Invalid request method";
const ACCOUNT_INACTIVE: &str = "Account is inactive. Please contact support.";

pub fn routes() -> Vec<Route> {
    routes![
        register,
        register_wrong_method,
        do_login,
        do_login_wrong_method,
        logout
    ]
}

#[post("/register", data = "<form>")]
pub async fn register(
    form: Form<RegistrationForm>,
    voters: Coll<NewVoter>,
    config: &State<Config>,
    request_id: &RequestId,
) -> Json<ApiResponse> {
    let result = register_voter(form.into_inner(), &voters, request_id).await;
    Json(ApiResponse::from_result(
        result,
        config.debug(),
        REGISTRATION_FAILED,
    ))
}

async fn register_voter(
    form: RegistrationForm,
    voters: &Coll<NewVoter>,
    request_id: &RequestId,
) -> Result<ApiResponse> {
    let registration: ValidRegistration = form.try_into()?;

    // Friendly messages for the common case; the unique indexes still catch
    // concurrent registrations below.
    for field in UniqueVoterField::ALL {
        let taken = doc! { field.key(): field.value(registration.voter()) };
        if voters.count_documents(taken, None).await? > 0 {
            info!("{request_id} registration refused: {}", field.already_registered());
            return Err(Error::conflict(field.already_registered()));
        }
    }

    let voter = registration.into_new_voter()?;
    voters
        .insert_one(&voter, None)
        .await
        .map_err(voter_write_error)?;
    info!("{request_id} registered new voter {}", voter.voter_id);

    Ok(ApiResponse::success("Registration successful"))
}

#[get("/register")]
pub fn register_wrong_method() -> Json<ApiResponse> {
    Json(ApiResponse::failure(INVALID_METHOD))
}

#[post("/do_login", data = "<login>")]
#[allow(clippy::too_many_arguments)]
pub async fn do_login(
    login: Form<LoginRequest>,
    cookies: &CookieJar<'_>,
    admins: Coll<Admin>,
    voters: Coll<Voter>,
    sessions: Coll<NewSession>,
    config: &State<Config>,
    request_id: &RequestId,
) -> Json<ApiResponse> {
    let result = async {
        let (identifier, password) = login
            .credentials()
            .ok_or_else(|| Error::bad_request("Please fill all fields"))?;
        info!("{request_id} login attempt for {identifier}");

        // Admins are recognised purely by their identifier, and never fall
        // through to the voter table.
        let rights = if is_admin_identifier(&identifier) {
            let admin = authenticate_admin(&identifier, password, &admins).await?;
            start_session(&admin, cookies, &sessions, config).await?;
            Rights::Admin
        } else {
            let voter = authenticate_voter(&identifier, password, &voters).await?;
            start_session(&voter, cookies, &sessions, config).await?;
            Rights::Voter
        };
        info!("{request_id} {rights} login successful: {identifier}");

        Ok::<_, Error>(ApiResponse::success("Login successful").with_role(rights))
    }
    .await;

    if let Err(ref err) = result {
        info!("{request_id} login refused: {err}");
    }
    Json(ApiResponse::from_result(result, config.debug(), LOGIN_FAILED))
}

/// Check an admin's credentials. Usernames are stored lower case.
async fn authenticate_admin(
    identifier: &str,
    password: &str,
    admins: &Coll<Admin>,
) -> Result<Admin> {
    let admin = admins
        .find_one(doc! { "username": identifier.to_lowercase() }, None)
        .await?
        .ok_or_else(|| Error::not_found("Admin account"))?;
    if !admin.is_active {
        return Err(Error::forbidden(ACCOUNT_INACTIVE));
    }
    if !admin.verify_password(password) {
        return Err(Error::unauthorized("Invalid password"));
    }
    Ok(admin)
}

/// Check a voter's credentials and record the login time.
async fn authenticate_voter(
    voter_id: &str,
    password: &str,
    voters: &Coll<Voter>,
) -> Result<Voter> {
    let voter = voters
        .find_one(doc! { "voter_id": voter_id }, None)
        .await?
        .ok_or_else(|| Error::not_found("Voter ID"))?;
    // An inactive account is refused before the password is even checked.
    if !voter.is_active {
        return Err(Error::forbidden(ACCOUNT_INACTIVE));
    }
    if !voter.verify_password(password) {
        return Err(Error::unauthorized("Invalid password"));
    }

    voters
        .update_one(
            voter.id.as_doc(),
            doc! { "$set": { "last_login": DateTime::now() } },
            None,
        )
        .await?;
    Ok(voter)
}

#[get("/do_login")]
pub fn do_login_wrong_method() -> Json<ApiResponse> {
    Json(ApiResponse::failure(INVALID_METHOD))
}

#[get("/logout")]
pub async fn logout(cookies: &CookieJar<'_>, sessions: Coll<Session>) -> Result<Redirect> {
    end_session(cookies, &sessions).await?;
    Ok(Redirect::to(uri!(pages::landing)))
}
