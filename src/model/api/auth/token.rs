use std::marker::PhantomData;

use mongodb::{
    bson::{doc, DateTime},
    Database,
};
use rocket::{
    http::{Cookie, CookieJar, SameSite, Status},
    request::{FromRequest, Outcome},
    time::Duration,
    Request, State,
};

use crate::{
    config::Config,
    error::{Error, Result},
    model::{
        db::session::{NewSession, Session},
        mongodb::{Coll, Id},
    },
};

use super::user::User;

/// Private (encrypted) cookie holding the client's session ID.
pub const SESSION_COOKIE: &str = "session_id";

/// Proof that the request carries a live session for a `U` with the right
/// privileges. Routes taking this as a guard are forwarded when it is absent.
pub struct AuthToken<U> {
    /// The `_id` of the authenticated user.
    pub id: Id,
    pub session_id: Id,
    phantom: PhantomData<U>,
}

impl<U> AuthToken<U> {
    pub fn id(&self) -> Id {
        self.id
    }
}

/// Start a session for the given user and hand its ID to the client,
/// discarding whatever session the client held before.
pub async fn start_session<U: User>(
    user: &U,
    cookies: &CookieJar<'_>,
    sessions: &Coll<NewSession>,
    config: &Config,
) -> Result<()> {
    end_session(cookies, sessions).await?;

    let session = NewSession::new(U::RIGHTS, user.id(), config.session_ttl());
    let session_id = Id::from_inserted(sessions.insert_one(&session, None).await?.inserted_id)
        .ok_or_else(|| {
            Error::Status(
                Status::InternalServerError,
                "Session was stored without an ID".to_string(),
            )
        })?;

    let cookie = Cookie::build(SESSION_COOKIE, session_id.to_string())
        .max_age(Duration::seconds(config.session_ttl().num_seconds()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();
    cookies.add_private(cookie);
    Ok(())
}

/// Delete the client's session, if any, and clear its cookie.
pub async fn end_session<T>(cookies: &CookieJar<'_>, sessions: &Coll<T>) -> Result<()>
where
    T: Send + Sync,
{
    if let Some(cookie) = cookies.get_private(SESSION_COOKIE) {
        if let Ok(session_id) = cookie.value().parse::<Id>() {
            sessions.delete_one(session_id.as_doc(), None).await?;
        }
        cookies.remove_private(Cookie::named(SESSION_COOKIE));
    }
    Ok(())
}

#[rocket::async_trait]
impl<'r, U> FromRequest<'r> for AuthToken<U>
where
    U: User + Send + Sync,
{
    type Error = Error;

    /// Look up the session named by the cookie and check that it is live,
    /// carries the rights of `U`, and belongs to a user that still exists and
    /// is active.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Forward to any routes that do not require a session.
        let session_id = match req
            .cookies()
            .get_private(SESSION_COOKIE)
            .and_then(|cookie| cookie.value().parse::<Id>().ok())
        {
            Some(session_id) => session_id,
            None => return Outcome::Forward(()),
        };

        // Unwrap is safe as the `Database` is always managed.
        let db = req.guard::<&State<Database>>().await.unwrap();

        let live_session = doc! {
            "_id": session_id,
            "rights": U::RIGHTS,
            "expire_at": { "$gt": DateTime::now() },
        };
        let session = match Coll::<Session>::from_db(db)
            .find_one(live_session, None)
            .await
        {
            Ok(Some(session)) => session,
            Ok(None) => return Outcome::Forward(()),
            Err(e) => return Outcome::Failure((Status::InternalServerError, e.into())),
        };

        let active_user = doc! {
            "_id": session.session.user_id,
            "is_active": true,
        };
        match Coll::<U>::from_db(db)
            .count_documents(active_user, None)
            .await
        {
            Ok(0) => Outcome::Forward(()),
            Ok(_) => Outcome::Success(Self {
                id: session.session.user_id,
                session_id,
                phantom: PhantomData,
            }),
            Err(e) => Outcome::Failure((Status::InternalServerError, e.into())),
        }
    }
}

/// Convenience for tests: the rights a session cookie in `client` grants, if any.
#[cfg(test)]
pub async fn session_rights(
    client: &rocket::local::asynchronous::Client,
    db: &Database,
) -> Option<super::user::Rights> {
    let cookie = client.cookies().get_private(SESSION_COOKIE)?;
    let session_id = cookie.value().parse::<Id>().ok()?;
    Coll::<Session>::from_db(db)
        .find_one(session_id.as_doc(), None)
        .await
        .unwrap()
        .map(|session| session.session.rights)
}
