use chrono::{NaiveDate, Utc};
use mongodb::bson::DateTime;

use crate::{
    error::{Error, Result},
    model::{
        common::{
            password::hash_password,
            validation::{self, MAX_LONG_TEXT_LENGTH, MAX_NAME_LENGTH},
        },
        db::voter::NewVoter,
    },
};

/// Raw registration form, as posted by the registration page. Field names
/// follow the page's input IDs. Every field is required, but they are
/// optional here so that a missing one gets a friendly message.
#[derive(Debug, Clone, Default, FromForm)]
pub struct RegistrationForm {
    #[field(name = "voterId")]
    pub voter_id: Option<String>,
    pub password: Option<String>,
    #[field(name = "firstName")]
    pub first_name: Option<String>,
    #[field(name = "lastName")]
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    #[field(name = "parentSpouseName")]
    pub parent_spouse_name: Option<String>,
    #[field(name = "streetAddress")]
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    #[field(name = "placeOfBirth")]
    pub place_of_birth: Option<String>,
    #[field(name = "aadharNumber")]
    pub aadhar_number: Option<String>,
    #[field(name = "panNumber")]
    pub pan_number: Option<String>,
}

/// Take a required field, treating blank as missing.
fn required(field: Option<String>) -> Result<String> {
    field
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| Error::bad_request("Please fill all required fields"))
}

/// A registration whose fields have all been validated and normalised, with
/// the password not yet hashed.
#[derive(Debug)]
pub struct ValidRegistration {
    voter: NewVoter,
    password: String,
}

impl ValidRegistration {
    /// The voter record to be stored, minus its password hash.
    pub fn voter(&self) -> &NewVoter {
        &self.voter
    }

    /// Hash the password to complete the voter record.
    pub fn into_new_voter(self) -> Result<NewVoter> {
        Ok(NewVoter {
            password_hash: hash_password(&self.password)?,
            ..self.voter
        })
    }
}

impl RegistrationForm {
    /// Validate and normalise every field. `today` decides the voter's age.
    pub fn validate(self, today: NaiveDate) -> Result<ValidRegistration> {
        // Check presence of everything before reporting any format problem.
        let voter_id = required(self.voter_id)?;
        let password = required(self.password)?;
        let first_name = required(self.first_name)?;
        let last_name = required(self.last_name)?;
        let email = required(self.email)?;
        let mobile = required(self.mobile)?;
        let dob = required(self.dob)?;
        let gender = required(self.gender)?;
        let parent_spouse_name = required(self.parent_spouse_name)?;
        let street_address = required(self.street_address)?;
        let city = required(self.city)?;
        let state = required(self.state)?;
        let pincode = required(self.pincode)?;
        let place_of_birth = required(self.place_of_birth)?;
        let aadhar_number = required(self.aadhar_number)?;
        let pan_number = required(self.pan_number)?;

        let voter_id = validation::voter_id(&voter_id)?;
        let password = validation::password(&password)?;
        let first_name = validation::text("First name", &first_name, Some(MAX_NAME_LENGTH))?;
        let last_name = validation::text("Last name", &last_name, Some(MAX_NAME_LENGTH))?;
        let email = validation::email(&email)?;
        let mobile = validation::mobile(&mobile)?;
        let date_of_birth = validation::date_of_birth(&dob, today)?;
        let gender = validation::gender(&gender)?;
        let parent_spouse_name = validation::text(
            "Parent/spouse name",
            &parent_spouse_name,
            Some(MAX_LONG_TEXT_LENGTH),
        )?;
        let street_address = validation::text("Street address", &street_address, None)?;
        let city = validation::text("City", &city, Some(MAX_NAME_LENGTH))?;
        let state = validation::text("State", &state, Some(MAX_NAME_LENGTH))?;
        let pincode = validation::pincode(&pincode)?;
        let place_of_birth =
            validation::text("Place of birth", &place_of_birth, Some(MAX_LONG_TEXT_LENGTH))?;
        let aadhar_number = validation::aadhar_number(&aadhar_number)?;
        let pan_number = validation::pan_number(&pan_number)?;

        let voter = NewVoter {
            voter_id,
            password_hash: String::new(),
            first_name,
            last_name,
            email,
            mobile,
            date_of_birth,
            gender,
            parent_spouse_name,
            street_address,
            city,
            state,
            pincode,
            place_of_birth,
            aadhar_number,
            pan_number,
            is_active: true,
            has_voted: false,
            registration_date: DateTime::now(),
            last_login: None,
        };
        Ok(ValidRegistration {
            voter,
            password: password.to_string(),
        })
    }
}

impl TryFrom<RegistrationForm> for ValidRegistration {
    type Error = Error;

    fn try_from(form: RegistrationForm) -> Result<Self> {
        form.validate(Utc::now().date_naive())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{common::gender::Gender, db::voter::EXAMPLE_PASSWORD};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn normalises_and_hashes() {
        let voter = RegistrationForm::example()
            .validate(today())
            .unwrap()
            .into_new_voter()
            .unwrap();
        assert_eq!(voter.voter_id, "ABC1234567");
        assert_eq!(voter.pan_number, "ABCDE1234F");
        assert_eq!(voter.email, "meenakshi.iyer@example.com");
        assert_eq!(voter.gender, Gender::Female);
        assert_ne!(voter.password_hash, EXAMPLE_PASSWORD);
        assert!(voter.verify_password(EXAMPLE_PASSWORD));
        assert!(voter.is_active);
        assert!(!voter.has_voted);
        assert_eq!(voter.last_login, None);
    }

    #[test]
    fn missing_field() {
        let form = RegistrationForm {
            pan_number: None,
            ..RegistrationForm::example()
        };
        let err = form.validate(today()).unwrap_err();
        assert_eq!(err.to_string(), "Please fill all required fields");
    }

    #[test]
    fn blank_field_counts_as_missing() {
        let form = RegistrationForm {
            city: Some("   ".to_string()),
            ..RegistrationForm::example()
        };
        let err = form.validate(today()).unwrap_err();
        assert_eq!(err.to_string(), "Please fill all required fields");
    }

    #[test]
    fn bad_format_is_reported() {
        let form = RegistrationForm {
            mobile: Some("1234567890".to_string()),
            ..RegistrationForm::example()
        };
        let err = form.validate(today()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Mobile number must be 10 digits and start with 6-9"
        );
    }

    #[test]
    fn underage_voter_is_rejected() {
        let form = RegistrationForm {
            dob: Some("2010-01-01".to_string()),
            ..RegistrationForm::example()
        };
        assert!(form.validate(today()).is_err());
    }

    #[test]
    fn test_form_body_skips_missing_fields() {
        let form = RegistrationForm {
            voter_id: Some("ABC1234567".to_string()),
            email: Some("a@b.co".to_string()),
            ..RegistrationForm::default()
        };
        assert_eq!(form.to_body(), "voterId=ABC1234567&email=a%40b.co");
    }
}
