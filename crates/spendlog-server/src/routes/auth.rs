use axum::{extract::State, response::IntoResponse, Extension, Json};
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{middleware::SESSION_COOKIE, password, session};
use crate::error::{AppError, AppResult};
use crate::models::{User, UserPublic};
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Json<serde_json::Value>> {
    // Validate input
    if body.email.is_empty() || !body.email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if body.name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    if body.phone.is_empty() {
        return Err(AppError::BadRequest("Phone is required".to_string()));
    }
    if body.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let password_hash = password::hash_password(&body.password)?;
    let user_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string();

    // Insert user
    let conn = state.db.get()?;
    let result = conn.execute(
        "INSERT INTO users (id, email, name, phone, password_hash, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![user_id, body.email, body.name, body.phone, password_hash, now, now],
    );

    match result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }
        Err(e) => return Err(AppError::Database(e)),
    }

    Ok(Json(serde_json::json!({
        "message": "User registered successfully"
    })))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let conn = state.db.get()?;

    let user_result = conn.query_row(
        "SELECT id, email, name, phone, password_hash, photo, birthdate, gender, created_at, updated_at FROM users WHERE email = ?1",
        rusqlite::params![body.email],
        |row| {
            Ok(User {
                id: row.get(0)?,
                email: row.get(1)?,
                name: row.get(2)?,
                phone: row.get(3)?,
                password_hash: row.get(4)?,
                photo: row.get(5)?,
                birthdate: row.get(6)?,
                gender: row.get(7)?,
                created_at: row.get(8)?,
                updated_at: row.get(9)?,
            })
        },
    );

    let user = match user_result {
        Ok(u) => u,
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            // Same response as a wrong password, so emails can't be probed
            return Err(AppError::BadRequest("Invalid credentials".to_string()));
        }
        Err(e) => return Err(AppError::Database(e)),
    };

    let valid = password::verify_password(&body.password, &user.password_hash)?;
    if !valid {
        return Err(AppError::BadRequest("Invalid credentials".to_string()));
    }

    let sess = session::create_session(&state.db, &user.id)?;
    let cookie = build_session_cookie(sess.token, state.config.secure_cookies);
    let user_public: UserPublic = user.into();

    Ok((
        jar.add(cookie),
        Json(serde_json::json!({
            "message": "Login successful",
            "user": user_public,
        })),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        session::delete_session(&state.db, cookie.value())?;
    }

    let removal = Cookie::build(SESSION_COOKIE)
        .path("/")
        .max_age(time::Duration::ZERO)
        .http_only(true)
        .build();

    Ok((
        jar.add(removal),
        Json(serde_json::json!({ "message": "Logged out" })),
    ))
}

pub async fn me(Extension(user): Extension<User>) -> Json<UserPublic> {
    Json(user.into())
}

fn build_session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .max_age(time::Duration::days(30))
        .http_only(true)
        .secure(secure)
        .same_site(axum_extra::extract::cookie::SameSite::Lax)
        .build()
}
