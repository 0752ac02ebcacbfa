/// Login form, as posted by the login page. Both fields are optional so that
/// missing values get a friendly message instead of a form error.
#[derive(Debug, FromForm)]
pub struct LoginRequest {
    pub voter_id: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    /// The upper-cased identifier and the password, if both are present.
    pub fn credentials(&self) -> Option<(String, &str)> {
        let identifier = self.voter_id.as_deref()?.trim().to_uppercase();
        let password = self.password.as_deref()?;
        if identifier.is_empty() || password.is_empty() {
            return None;
        }
        Some((identifier, password))
    }
}

#[cfg(test)]
mod examples {
    use super::*;
    use crate::model::api::form_body;

    impl LoginRequest {
        pub fn new(identifier: &str, password: &str) -> Self {
            Self {
                voter_id: Some(identifier.to_string()),
                password: Some(password.to_string()),
            }
        }

        /// Form-encode this request for posting from a test client.
        pub fn to_body(&self) -> String {
            let mut fields = Vec::new();
            if let Some(ref voter_id) = self.voter_id {
                fields.push(("voter_id", voter_id.as_str()));
            }
            if let Some(ref password) = self.password {
                fields.push(("password", password.as_str()));
            }
            form_body(&fields)
        }
    }
}
