use crate::error::{Error, Result};
use axum::{extract::FromRequestParts, http::request::Parts};
use phonebook_core::User;

/// Per-request context. Anonymous requests carry `current_user: None`.
#[derive(Clone, Debug, Default)]
pub struct Ctx {
    current_user: Option<User>,
}

impl Ctx {
    pub fn new(current_user: Option<User>) -> Self {
        Self { current_user }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }
}

impl<S> FromRequestParts<S> for Ctx
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<Ctx>()
            .cloned()
            .ok_or(Error::AuthFailCtxNotInRequestExt)
    }
}
