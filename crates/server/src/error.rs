use async_graphql::{ErrorExtensions, Value};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub enum Error {
    // Auth Errors
    AuthFailTokenWrongFormat,
    AuthFailInvalidToken(String),
    AuthFailCtxNotInRequestExt,

    // Generic
    Internal(String),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    fn code(&self) -> &'static str {
        match self {
            Error::AuthFailTokenWrongFormat | Error::AuthFailInvalidToken(_) => "UNAUTHENTICATED",
            Error::AuthFailCtxNotInRequestExt | Error::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, error_message) = match self {
            Error::AuthFailTokenWrongFormat => (
                StatusCode::UNAUTHORIZED,
                "Auth header wrong format".to_string(),
            ),
            Error::AuthFailInvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg),
            Error::AuthFailCtxNotInRequestExt => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Auth context missing".to_string(),
            ),
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        // Same shape as a GraphQL execution error so clients handle both alike
        let body = Json(json!({
            "errors": [{
                "message": error_message,
                "extensions": { "code": code }
            }]
        }));

        (status, body).into_response()
    }
}

impl From<phonebook_core::Error> for Error {
    fn from(err: phonebook_core::Error) -> Self {
        match err {
            phonebook_core::Error::Authentication(msg) => Error::AuthFailInvalidToken(msg),
            other => Error::Internal(other.to_string()),
        }
    }
}

/// Converts a core error into a GraphQL error carrying an Apollo-style
/// `extensions.code`.
pub fn graphql_error(err: phonebook_core::Error) -> async_graphql::Error {
    use phonebook_core::Error as CoreError;

    match err {
        CoreError::Validation(validation) => {
            let invalid_args =
                Value::from_json(validation.invalid_args.clone()).unwrap_or(Value::Null);
            let invalid_fields = Value::List(
                validation
                    .invalid_fields()
                    .into_iter()
                    .map(Value::from)
                    .collect(),
            );
            async_graphql::Error::new(validation.to_string()).extend_with(|_, e| {
                e.set("code", "BAD_USER_INPUT");
                e.set("invalidArgs", invalid_args);
                e.set("invalidFields", invalid_fields);
            })
        }
        CoreError::UserInput(msg) => async_graphql::Error::new(msg)
            .extend_with(|_, e| e.set("code", "BAD_USER_INPUT")),
        CoreError::Authentication(msg) => async_graphql::Error::new(msg)
            .extend_with(|_, e| e.set("code", "UNAUTHENTICATED")),
        other => {
            error!("[Gateway] Request failed: {}", other);
            async_graphql::Error::new(other.to_string())
                .extend_with(|_, e| e.set("code", "INTERNAL_SERVER_ERROR"))
        }
    }
}
