use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::auth::session;
use crate::error::AppError;
use crate::routes::AppState;

pub const SESSION_COOKIE: &str = "spendlog_session";

pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AppError::Unauthorized)?;

    let (_session, user) = session::validate_session(&state.db, &token)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
