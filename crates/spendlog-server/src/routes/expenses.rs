use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Expense, User};
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub amount: f64,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateExpenseRequest {
    pub amount: Option<f64>,
    pub description: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(body): Json<CreateExpenseRequest>,
) -> AppResult<Json<serde_json::Value>> {
    if !body.amount.is_finite() {
        return Err(AppError::BadRequest("Amount must be a finite number".to_string()));
    }
    if body.description.is_empty() {
        return Err(AppError::BadRequest("Description is required".to_string()));
    }

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string();

    let conn = state.db.get()?;
    conn.execute(
        "INSERT INTO expenses (id, user_id, amount, description, date) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![id, user.id, body.amount, body.description, now],
    )?;

    let expense = Expense {
        id,
        user_id: user.id.clone(),
        email: user.email,
        amount: body.amount,
        description: body.description,
        date: now,
        modified_date: None,
    };

    Ok(Json(serde_json::json!({
        "message": "Expense added successfully",
        "expense": expense,
    })))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<Vec<Expense>>> {
    let conn = state.db.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, user_id, amount, description, date, modified_date FROM expenses WHERE user_id = ?1 ORDER BY date DESC",
    )?;

    let email = user.email.clone();
    let rows = stmt.query_map(rusqlite::params![user.id], move |row| {
        Ok(Expense {
            id: row.get(0)?,
            user_id: row.get(1)?,
            email: email.clone(),
            amount: row.get(2)?,
            description: row.get(3)?,
            date: row.get(4)?,
            modified_date: row.get(5)?,
        })
    })?;

    let expenses: Result<Vec<_>, _> = rows.collect();
    Ok(Json(expenses?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    Json(body): Json<UpdateExpenseRequest>,
) -> AppResult<Json<serde_json::Value>> {
    validate_expense_id(&id)?;

    if let Some(amount) = body.amount {
        if !amount.is_finite() {
            return Err(AppError::BadRequest("Amount must be a finite number".to_string()));
        }
    }

    let conn = state.db.get()?;
    let (owner_id, current_amount, current_description, date): (String, f64, String, String) =
        conn.query_row(
            "SELECT user_id, amount, description, date FROM expenses WHERE id = ?1",
            rusqlite::params![id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound("Expense not found".into()),
            e => AppError::Database(e),
        })?;

    if owner_id != user.id {
        return Err(AppError::Forbidden);
    }

    let amount = body.amount.unwrap_or(current_amount);
    let description = body
        .description
        .filter(|d| !d.is_empty())
        .unwrap_or(current_description);
    let now = chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string();

    conn.execute(
        "UPDATE expenses SET amount = ?1, description = ?2, modified_date = ?3 WHERE id = ?4",
        rusqlite::params![amount, description, now, id],
    )?;

    let expense = Expense {
        id,
        user_id: owner_id,
        email: user.email,
        amount,
        description,
        date,
        modified_date: Some(now),
    };

    Ok(Json(serde_json::json!({
        "message": "Expense updated successfully",
        "expense": expense,
    })))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    validate_expense_id(&id)?;

    let conn = state.db.get()?;
    let owner_id: String = conn
        .query_row(
            "SELECT user_id FROM expenses WHERE id = ?1",
            rusqlite::params![id],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound("Expense not found".into()),
            e => AppError::Database(e),
        })?;

    if owner_id != user.id {
        return Err(AppError::Forbidden);
    }

    conn.execute("DELETE FROM expenses WHERE id = ?1", rusqlite::params![id])?;

    Ok(Json(serde_json::json!({
        "message": "Expense deleted successfully"
    })))
}

fn validate_expense_id(id: &str) -> AppResult<()> {
    Uuid::parse_str(id).map_err(|_| AppError::BadRequest("Invalid expense ID".to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::testing::{seed_user, test_state};

    async fn add(state: &AppState, user: &User, amount: f64, description: &str) -> String {
        let Json(value) = create(
            State(state.clone()),
            Extension(user.clone()),
            Json(CreateExpenseRequest {
                amount,
                description: description.to_string(),
            }),
        )
        .await
        .expect("create expense");
        value["expense"]["id"].as_str().expect("expense id").to_string()
    }

    #[tokio::test]
    async fn created_expense_shows_up_in_the_list() {
        let (_dir, state) = test_state();
        let user = seed_user(&state, "a@x.com");

        add(&state, &user, 20.0, "lunch").await;

        let Json(expenses) = list(State(state.clone()), Extension(user))
            .await
            .expect("list");
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].amount, 20.0);
        assert_eq!(expenses[0].description, "lunch");
        assert_eq!(expenses[0].email, "a@x.com");
        assert!(expenses[0].modified_date.is_none());
    }

    #[tokio::test]
    async fn list_only_returns_the_callers_expenses() {
        let (_dir, state) = test_state();
        let user = seed_user(&state, "a@x.com");
        let other = seed_user(&state, "b@x.com");

        add(&state, &user, 20.0, "lunch").await;
        add(&state, &other, 30.0, "bus").await;

        let Json(expenses) = list(State(state.clone()), Extension(user))
            .await
            .expect("list");
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].description, "lunch");
    }

    #[tokio::test]
    async fn create_requires_a_description() {
        let (_dir, state) = test_state();
        let user = seed_user(&state, "a@x.com");

        let err = create(
            State(state.clone()),
            Extension(user),
            Json(CreateExpenseRequest {
                amount: 5.0,
                description: String::new(),
            }),
        )
        .await
        .err()
        .expect("rejected");
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn malformed_id_is_a_bad_request() {
        let (_dir, state) = test_state();
        let user = seed_user(&state, "a@x.com");

        let err = delete(
            State(state.clone()),
            Extension(user),
            Path("not-a-uuid".to_string()),
        )
        .await
        .err()
        .expect("rejected");
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn updating_a_nonexistent_expense_is_not_found() {
        let (_dir, state) = test_state();
        let user = seed_user(&state, "a@x.com");

        let err = update(
            State(state.clone()),
            Extension(user),
            Path(Uuid::new_v4().to_string()),
            Json(UpdateExpenseRequest {
                amount: Some(1.0),
                description: None,
            }),
        )
        .await
        .err()
        .expect("rejected");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_replaces_fields_and_stamps_modified_date() {
        let (_dir, state) = test_state();
        let user = seed_user(&state, "a@x.com");
        let id = add(&state, &user, 20.0, "lunch").await;

        let Json(value) = update(
            State(state.clone()),
            Extension(user.clone()),
            Path(id.clone()),
            Json(UpdateExpenseRequest {
                amount: Some(25.5),
                description: None,
            }),
        )
        .await
        .expect("update");
        assert_eq!(value["expense"]["amount"], 25.5);
        assert_eq!(value["expense"]["description"], "lunch");
        assert!(value["expense"]["modifiedDate"].is_string());

        let Json(expenses) = list(State(state.clone()), Extension(user))
            .await
            .expect("list");
        assert_eq!(expenses[0].amount, 25.5);
        assert!(expenses[0].modified_date.is_some());
    }

    #[tokio::test]
    async fn delete_twice_is_ok_then_not_found() {
        let (_dir, state) = test_state();
        let user = seed_user(&state, "a@x.com");
        let id = add(&state, &user, 20.0, "lunch").await;

        delete(
            State(state.clone()),
            Extension(user.clone()),
            Path(id.clone()),
        )
        .await
        .expect("first delete");

        let err = delete(State(state.clone()), Extension(user), Path(id))
            .await
            .err()
            .expect("second delete rejected");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn cross_user_mutation_is_forbidden() {
        let (_dir, state) = test_state();
        let owner = seed_user(&state, "a@x.com");
        let intruder = seed_user(&state, "b@x.com");
        let id = add(&state, &owner, 20.0, "lunch").await;

        let err = update(
            State(state.clone()),
            Extension(intruder.clone()),
            Path(id.clone()),
            Json(UpdateExpenseRequest {
                amount: Some(0.0),
                description: Some("hijacked".to_string()),
            }),
        )
        .await
        .err()
        .expect("rejected");
        assert!(matches!(err, AppError::Forbidden));

        let err = delete(State(state.clone()), Extension(intruder), Path(id))
            .await
            .err()
            .expect("rejected");
        assert!(matches!(err, AppError::Forbidden));

        // Record is untouched
        let Json(expenses) = list(State(state.clone()), Extension(owner))
            .await
            .expect("list");
        assert_eq!(expenses[0].amount, 20.0);
        assert_eq!(expenses[0].description, "lunch");
    }
}
