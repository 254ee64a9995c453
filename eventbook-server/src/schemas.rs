use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize};
use validator::Validate;

use crate::errors::ServerError;

#[derive(Debug, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterSchema {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 64))]
    pub password: String,
}

#[derive(Debug, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginSchema {
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 64))]
    pub password: String,
}

#[derive(Debug, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateAccountSchema {
    #[validate(email)]
    pub email: Option<String>,
    /// Event ids to append to the account's joined events
    #[serde(default)]
    pub events: Vec<String>,
}

#[derive(Debug, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChangePasswordSchema {
    #[validate(length(min = 6, max = 64))]
    pub password: String,
}

#[derive(Debug, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewEventSchema {
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1, max = 256))]
    pub location: String,
    #[validate(length(min = 1, max = 64))]
    pub price: String,
    #[validate(range(min = 1))]
    pub max_people: i32,
    #[serde(default)]
    pub total_people: i32,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateEventSchema {
    #[validate(length(min = 1, max = 256))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 256))]
    pub location: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub price: Option<String>,
    #[validate(range(min = 1))]
    pub max_people: Option<i32>,
    #[validate(range(min = 0))]
    pub total_people: Option<i32>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewTicketSchema {
    #[validate(length(equal = 24))]
    pub event_id: String,
    #[validate(length(min = 1, max = 256))]
    pub assigned_to: String,
}

#[derive(Debug, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TicketFilterSchema {
    pub event_id: Option<String>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateTicketSchema {
    #[validate(length(min = 1, max = 256))]
    pub assigned_to: String,
}

#[derive(Debug, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewReportSchema {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 10))]
    pub report_text: String,
    #[validate(length(min = 1, max = 64))]
    pub category: String,
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|_| ServerError::Validation("JSON parse failed"))?;

        extracted_json
            .0
            .validate()
            .map_err(|_| ServerError::Validation("Request body is invalid"))?;

        Ok(Self(extracted_json.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_valid<T: Validate>(schema: &T) -> bool {
        schema.validate().is_ok()
    }

    #[test]
    fn register_requires_an_email_and_a_decent_password() {
        let good: RegisterSchema =
            serde_json::from_str(r#"{"email": "a@b.com", "password": "secret1"}"#).unwrap();
        assert!(is_valid(&good));

        let bad_email: RegisterSchema =
            serde_json::from_str(r#"{"email": "not-an-email", "password": "secret1"}"#).unwrap();
        assert!(!is_valid(&bad_email));

        let short_password: RegisterSchema =
            serde_json::from_str(r#"{"email": "a@b.com", "password": "abc"}"#).unwrap();
        assert!(!is_valid(&short_password));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<LoginSchema, _> = serde_json::from_str(
            r#"{"email": "a@b.com", "password": "secret1", "isAdmin": true}"#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn reports_need_at_least_ten_characters_of_text() {
        let short: NewReportSchema = serde_json::from_str(
            r#"{"email": "a@b.com", "reportText": "too short", "category": "Other"}"#,
        )
        .unwrap();
        assert!(!is_valid(&short));

        let long: NewReportSchema = serde_json::from_str(
            r#"{"email": "a@b.com", "reportText": "this one is long enough", "category": "Other"}"#,
        )
        .unwrap();
        assert!(is_valid(&long));
    }

    #[test]
    fn tickets_require_a_well_formed_event_id() {
        let good: NewTicketSchema = serde_json::from_str(
            r#"{"eventId": "507f1f77bcf86cd799439011", "assignedTo": "a@b.com"}"#,
        )
        .unwrap();
        assert!(is_valid(&good));

        let bad: NewTicketSchema =
            serde_json::from_str(r#"{"eventId": "123", "assignedTo": "a@b.com"}"#).unwrap();
        assert!(!is_valid(&bad));
    }

    #[test]
    fn event_updates_may_be_partial() {
        let partial: UpdateEventSchema =
            serde_json::from_str(r#"{"title": "New title"}"#).unwrap();
        assert!(is_valid(&partial));
        assert!(partial.description.is_none());

        let empty_title: UpdateEventSchema = serde_json::from_str(r#"{"title": ""}"#).unwrap();
        assert!(!is_valid(&empty_title));
    }
}
