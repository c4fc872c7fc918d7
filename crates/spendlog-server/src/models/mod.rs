use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub photo: Option<String>,
    pub birthdate: Option<String>,
    pub gender: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Shape returned to clients. Deliberately has no password field at all, so a
/// hash can never leak through serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub photo: Option<String>,
    pub birthdate: Option<String>,
    pub gender: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserPublic {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            phone: u.phone,
            photo: u.photo,
            birthdate: u.birthdate,
            gender: u.gender,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    #[serde(skip)]
    pub user_id: String,
    pub email: String,
    pub amount: f64,
    pub description: String,
    pub date: String,
    #[serde(rename = "modifiedDate", skip_serializing_if = "Option::is_none")]
    pub modified_date: Option<String>,
}
