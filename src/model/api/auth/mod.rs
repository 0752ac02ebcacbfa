mod login;
mod token;
mod user;

pub use login::LoginRequest;
pub use token::{end_session, start_session, AuthToken, SESSION_COOKIE};
pub use user::{Rights, User};

#[cfg(test)]
pub use token::session_rights;
