use crate::config::AppState;
use crate::ctx::Ctx;
use crate::error::{Error, Result};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Resolves the caller from the `Authorization` header and attaches a
/// [`Ctx`] to the request. A missing header is anonymous; a bearer token
/// that does not verify is rejected with 401.
pub async fn mw_resolve_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    debug!("MIDDLEWARE: resolve_user");

    // Only bearer headers are read; any other scheme is anonymous
    let auth_header = match req.headers().get(header::AUTHORIZATION) {
        Some(h) if is_bearer(h.as_bytes()) => Some(
            h.to_str()
                .map_err(|_| Error::AuthFailTokenWrongFormat)?
                .to_string(),
        ),
        _ => None,
    };

    let current_user = state
        .auth
        .resolve_current_user(auth_header.as_deref())
        .await?;

    if let Some(user) = &current_user {
        debug!("[Gateway] Request from {}", user.username);
    }

    req.extensions_mut().insert(Ctx::new(current_user));

    Ok(next.run(req).await)
}

fn is_bearer(value: &[u8]) -> bool {
    value
        .get(..7)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(b"bearer "))
}
