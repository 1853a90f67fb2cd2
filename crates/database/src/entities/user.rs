use serde::{Deserialize, Serialize};

/// A registered account as seen by the user directory.
///
/// The internal `id` is the database row id and never leaves the process;
/// `public_id` is the stable identity other components address the user by.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
