//! Types and rules shared by the DB and API representations.

pub mod gender;
pub mod password;
pub mod validation;
