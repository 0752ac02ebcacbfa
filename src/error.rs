use argon2::Error as Argon2Error;
use mongodb::error::Error as DbError;
use rocket::{http::Status, response::Responder};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    /// An expected failure, with the status to respond with and a message
    /// that is safe to show to the client.
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Status(Status::BadRequest, message.into())
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::Status(Status::NotFound, format!("{what} not found"))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Status(Status::Conflict, message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Status(Status::Unauthorized, message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Status(Status::Forbidden, message.into())
    }

    /// Is this an internal failure rather than a problem with the request?
    pub fn is_internal(&self) -> bool {
        match self {
            Self::Db(_) | Self::Argon2(_) => true,
            Self::Status(status, _) => status.code >= 500,
        }
    }

    /// The message to show a client. Internal failures are replaced by
    /// `fallback` unless `debug` is set.
    pub fn client_message(&self, debug: bool, fallback: &str) -> String {
        if self.is_internal() && !debug {
            fallback.to_string()
        } else {
            self.to_string()
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        Err(match self {
            Self::Db(err) => {
                error!("Database error: {err}");
                Status::InternalServerError
            }
            Self::Argon2(err) => {
                error!("Password hashing error: {err}");
                Status::InternalServerError
            }
            Self::Status(status, message) => {
                debug!("{status}: {message}");
                status
            }
        })
    }
}
