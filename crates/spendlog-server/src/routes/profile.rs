use axum::extract::{Multipart, State};
use axum::{Extension, Json};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::auth::middleware::SESSION_COOKIE;
use crate::auth::{password, session};
use crate::error::{AppError, AppResult};
use crate::models::{User, UserPublic};
use crate::routes::AppState;
use crate::services::photos;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub name: String,
    pub phone: String,
    pub photo: String,
    #[serde(rename = "totalExpenses")]
    pub total_expenses: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    #[serde(rename = "newEmail")]
    pub new_email: Option<String>,
    pub password: Option<String>,
}

/// Fields collected from the profile form. `None` means "leave unchanged".
#[derive(Debug, Default)]
struct ProfilePatch {
    name: Option<String>,
    phone: Option<String>,
    birthdate: Option<String>,
    gender: Option<String>,
    photo: Option<photos::SavedPhoto>,
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<ProfileResponse>> {
    let conn = state.db.get()?;
    let total: f64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM expenses WHERE user_id = ?1",
        rusqlite::params![user.id],
        |row| row.get(0),
    )?;

    Ok(Json(ProfileResponse {
        name: user.name,
        phone: user.phone,
        photo: user.photo.unwrap_or_else(|| photos::DEFAULT_PHOTO.to_string()),
        total_expenses: total,
    }))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    mut multipart: Multipart,
) -> AppResult<Json<serde_json::Value>> {
    let patch = read_patch(&state, &mut multipart).await?;
    let updated = apply_patch(&state, user, patch)?;

    Ok(Json(serde_json::json!({
        "message": "Profile updated successfully",
        "user": UserPublic::from(updated),
    })))
}

pub async fn update_account(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    jar: CookieJar,
    Json(body): Json<UpdateAccountRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let new_email = body.new_email.filter(|e| !e.is_empty());
    let new_password = body.password.filter(|p| !p.is_empty());
    if new_email.is_none() && new_password.is_none() {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }

    // Validate everything before the first write, so a 400 means nothing changed
    if let Some(email) = &new_email {
        if !email.contains('@') {
            return Err(AppError::BadRequest("Invalid email address".to_string()));
        }
    }
    if let Some(pw) = &new_password {
        if pw.len() < 8 {
            return Err(AppError::BadRequest(
                "Password must be at least 8 characters".to_string(),
            ));
        }
    }
    let new_hash = new_password.map(|pw| password::hash_password(&pw)).transpose()?;

    let now = chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string();
    let conn = state.db.get()?;

    if let Some(email) = new_email {
        let result = conn.execute(
            "UPDATE users SET email = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![email, now, user.id],
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
    }

    if let Some(hash) = new_hash {
        conn.execute(
            "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![hash, now, user.id],
        )?;

        // A password change revokes every other session for the account
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            session::delete_other_sessions(&state.db, &user.id, cookie.value())?;
        }
    }

    Ok(Json(serde_json::json!({
        "message": "Account updated successfully"
    })))
}

async fn read_patch(state: &AppState, multipart: &mut Multipart) -> AppResult<ProfilePatch> {
    let mut patch = ProfilePatch::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "name" => patch.name = text_field(field).await?,
            "phone" => patch.phone = text_field(field).await?,
            "birthdate" => patch.birthdate = text_field(field).await?,
            "gender" => patch.gender = text_field(field).await?,
            "photo" => {
                let original = field.file_name().unwrap_or("photo.bin").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read photo: {e}")))?;
                if !data.is_empty() {
                    patch.photo =
                        Some(photos::save_photo(&state.config.uploads_dir, &original, &data)?);
                }
            }
            // Identity comes from the session; stray fields (email included) are ignored
            _ => {}
        }
    }

    Ok(patch)
}

/// Empty strings from blank form inputs mean "unchanged".
async fn text_field(field: axum::extract::multipart::Field<'_>) -> AppResult<Option<String>> {
    let value = field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid form field: {e}")))?;
    Ok(if value.is_empty() { None } else { Some(value) })
}

fn apply_patch(state: &AppState, user: User, patch: ProfilePatch) -> AppResult<User> {
    let now = chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string();

    let updated = User {
        id: user.id,
        email: user.email,
        password_hash: user.password_hash,
        created_at: user.created_at,
        name: patch.name.unwrap_or(user.name),
        phone: patch.phone.unwrap_or(user.phone),
        birthdate: patch.birthdate.or(user.birthdate),
        gender: patch.gender.or(user.gender),
        photo: patch.photo.map(|p| p.public_path).or(user.photo),
        updated_at: now,
    };

    let conn = state.db.get()?;
    conn.execute(
        "UPDATE users SET name = ?1, phone = ?2, birthdate = ?3, gender = ?4, photo = ?5, updated_at = ?6 WHERE id = ?7",
        rusqlite::params![
            updated.name,
            updated.phone,
            updated.birthdate,
            updated.gender,
            updated.photo,
            updated.updated_at,
            updated.id
        ],
    )?;

    Ok(updated)
}
