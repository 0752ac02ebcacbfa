use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::auth::Rights;

/// The JSON body answered by the registration, login and voting endpoints.
/// Failures are reported in-band rather than through the HTTP status.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl ApiResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            role: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            role: None,
        }
    }

    pub fn with_role(mut self, rights: Rights) -> Self {
        self.role = Some(rights.to_string());
        self
    }

    /// Turn the outcome of an operation into a response. Internal errors are
    /// logged and replaced by `fallback` unless `debug` is set.
    pub fn from_result(result: Result<Self>, debug: bool, fallback: &str) -> Self {
        match result {
            Ok(response) => response,
            Err(err) => {
                if err.is_internal() {
                    error!("{err}");
                }
                Self::failure(err.client_message(debug, fallback))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn role_is_omitted_unless_set() {
        let plain = serde_json::to_value(ApiResponse::failure("Invalid password")).unwrap();
        assert_eq!(
            plain,
            serde_json::json!({ "success": false, "message": "Invalid password" })
        );

        let with_role =
            serde_json::to_value(ApiResponse::success("Login successful").with_role(Rights::Voter))
                .unwrap();
        assert_eq!(
            with_role,
            serde_json::json!({ "success": true, "message": "Login successful", "role": "voter" })
        );
    }

    #[test]
    fn from_result_masks_internal_errors() {
        let internal = || Err(Error::Argon2(argon2::Error::DecodingFail));
        assert_eq!(
            ApiResponse::from_result(internal(), false, "Login failed. Please try again."),
            ApiResponse::failure("Login failed. Please try again.")
        );
        assert_eq!(
            ApiResponse::from_result(internal(), true, "Login failed. Please try again."),
            ApiResponse::failure(argon2::Error::DecodingFail.to_string())
        );
        assert_eq!(
            ApiResponse::from_result(
                Err(Error::not_found("Voter ID")),
                false,
                "Login failed. Please try again."
            ),
            ApiResponse::failure("Voter ID not found")
        );
    }
}
