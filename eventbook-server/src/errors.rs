use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use eventbook_core::{AuthError, DatabaseError};
use log::error;
use serde_json::json;
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Validation(&'static str),
    #[error(transparent)]
    Auth(AuthError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("{0}")]
    RateLimited(&'static str),
    #[error("Internal server error")]
    Internal(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Auth(e) => match e {
                AuthError::MissingHeader | AuthError::MissingToken | AuthError::InvalidToken => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::AccountNotFound => StatusCode::NOT_FOUND,
                AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
                AuthError::LockedOut => StatusCode::TOO_MANY_REQUESTS,
                AuthError::EmailTaken | AuthError::InvalidCredentials => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        // Internal detail goes to the log, never into the response body
        if let Self::Internal(detail) = &self {
            error!("Internal server error: {}", detail);
        }
        if let Self::Auth(AuthError::Db(e)) = &self {
            error!("Internal server error: {}", e);
        }

        let status = self.as_status_code();
        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<DatabaseError> for ServerError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound { resource, .. } => Self::NotFound(resource),
            DatabaseError::Conflict {
                resource,
                field,
                value,
            } => Self::Conflict {
                resource,
                field,
                value,
            },
            e => Self::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_message(error: ServerError) -> (StatusCode, String) {
        let response = error.into_response();
        let status = response.status();

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        (status, body["message"].as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn auth_errors_map_to_the_right_statuses() {
        let cases = [
            (
                AuthError::MissingHeader,
                StatusCode::UNAUTHORIZED,
                "No Authorization header provided",
            ),
            (
                AuthError::MissingToken,
                StatusCode::UNAUTHORIZED,
                "No token provided",
            ),
            (
                AuthError::InvalidToken,
                StatusCode::UNAUTHORIZED,
                "Invalid token",
            ),
            (
                AuthError::AccountNotFound,
                StatusCode::NOT_FOUND,
                "Account not found",
            ),
            (
                AuthError::Forbidden("User is not an admin"),
                StatusCode::FORBIDDEN,
                "User is not an admin",
            ),
            (
                AuthError::EmailTaken,
                StatusCode::BAD_REQUEST,
                "Email already exists",
            ),
            (
                AuthError::InvalidCredentials,
                StatusCode::BAD_REQUEST,
                "Invalid email or password",
            ),
            (
                AuthError::LockedOut,
                StatusCode::TOO_MANY_REQUESTS,
                "Too many failed attempts, please try again later",
            ),
        ];

        for (error, expected_status, expected_message) in cases {
            let (status, message) = body_message(ServerError::Auth(error)).await;
            assert_eq!(status, expected_status);
            assert_eq!(message, expected_message);
        }
    }

    #[tokio::test]
    async fn not_found_formats_the_resource() {
        let (status, message) =
            body_message(DatabaseError::NotFound {
                resource: "Event",
                identifier: "id",
            }
            .into())
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message, "Event not found");
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let (status, message) =
            body_message(ServerError::Internal("password hash exploded".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");
    }

    #[tokio::test]
    async fn rate_limits_carry_their_static_message() {
        let (status, message) = body_message(ServerError::RateLimited(
            "Too many requests from this IP, please try again after 15 minutes",
        ))
        .await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            message,
            "Too many requests from this IP, please try again after 15 minutes"
        );
    }
}
