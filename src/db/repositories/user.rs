use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, Set, Statement,
};
use serde::Serialize;

use crate::entities::users::{self, Role, UserStatus};

/// User data returned from the repository (without the stored password)
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub question: String,
    pub answer: String,
    pub role: Role,
    pub status: UserStatus,
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            question: model.question,
            answer: model.answer,
            role: model.role,
            status: model.status,
            notes: model.notes,
            created_at: model.created_at,
        }
    }
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user)
    }

    pub async fn list_all(&self) -> Result<Vec<users::Model>> {
        let users = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(users)
    }

    /// Credential lookup for login. This is the ONLY place in the codebase
    /// that builds SQL by string interpolation: the submitted username and
    /// the encoded password land in the statement verbatim, so crafted
    /// input rewrites the WHERE clause. Every other query goes through the
    /// query builder.
    pub async fn find_by_credentials_raw(
        &self,
        username: &str,
        encoded_password: &str,
    ) -> Result<Option<users::Model>> {
        let sql = format!(
            "SELECT * FROM users WHERE username='{username}' AND password='{encoded_password}'"
        );

        let backend = self.conn.get_database_backend();
        let row = self
            .conn
            .query_one(Statement::from_string(backend, sql))
            .await
            .context("Credential lookup query failed")?;

        match row {
            Some(row) => Ok(Some(users::Model::from_query_result(&row, "")?)),
            None => Ok(None),
        }
    }

    /// Build a user row straight from submitted form fields. Every field
    /// whose name matches a writable column is applied, including `role`
    /// and `status`; only `confirm_password` is dropped (it falls through
    /// the match). Callers validate username/password presence first.
    pub async fn create_from_fields(
        &self,
        fields: &HashMap<String, String>,
        enc_key: &str,
    ) -> Result<users::Model> {
        let mut active = users::ActiveModel {
            question: Set(String::new()),
            answer: Set(String::new()),
            role: Set(Role::Standard),
            status: Set(UserStatus::Enabled),
            notes: Set(None),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        for (field, value) in fields {
            match field.as_str() {
                "username" => active.username = Set(value.clone()),
                "password" => active.password = Set(xor_encode(value, enc_key)),
                "question" => active.question = Set(value.clone()),
                "answer" => active.answer = Set(value.clone()),
                "notes" => active.notes = Set(Some(value.clone())),
                "role" => {
                    if let Ok(n) = value.parse::<i32>()
                        && let Ok(role) = Role::try_from_value(&n)
                    {
                        active.role = Set(role);
                    }
                }
                "status" => {
                    if let Ok(n) = value.parse::<i32>()
                        && let Ok(status) = UserStatus::try_from_value(&n)
                    {
                        active.status = Set(status);
                    }
                }
                _ => {}
            }
        }

        let user = active
            .insert(&self.conn)
            .await
            .context("Failed to create user")?;

        Ok(user)
    }

    /// Replace the stored (encoded) password for a user.
    pub async fn update_password(&self, id: i32, new_password: &str, enc_key: &str) -> Result<()> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.password = Set(xor_encode(new_password, enc_key));
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Account-settings update: password, question and answer together.
    pub async fn update_profile(
        &self,
        id: i32,
        password: &str,
        question: &str,
        answer: &str,
        enc_key: &str,
    ) -> Result<users::Model> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for profile update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.password = Set(xor_encode(password, enc_key));
        active.question = Set(question.to_string());
        active.answer = Set(answer.to_string());
        let user = active.update(&self.conn).await?;

        Ok(user)
    }

    pub async fn update_notes(&self, id: i32, notes: &str) -> Result<()> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for notes update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.notes = Set(Some(notes.to_string()));
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn set_role(&self, id: i32, role: Role) -> Result<()> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for role change")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.role = Set(role);
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn set_status(&self, id: i32, status: UserStatus) -> Result<()> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for status change")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.status = Set(status);
        active.update(&self.conn).await?;

        Ok(())
    }
}

/// Reversible password encoding: XOR against a repeating key, hex output.
/// Anyone holding the key (it ships in the default config) can decode any
/// stored password.
#[must_use]
pub fn xor_encode(plaintext: &str, key: &str) -> String {
    plaintext.bytes().zip(key.bytes().cycle()).fold(
        String::with_capacity(plaintext.len() * 2),
        |mut acc, (b, k)| {
            use std::fmt::Write;
            let _ = write!(acc, "{:02x}", b ^ k);
            acc
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_encode_deterministic() {
        let a = xor_encode("CorrectHorse1", "sekrit");
        let b = xor_encode("CorrectHorse1", "sekrit");
        assert_eq!(a, b);
        assert_eq!(a.len(), "CorrectHorse1".len() * 2);
    }

    #[test]
    fn test_xor_encode_key_cycles() {
        // Identical plaintext bytes one key-length apart get identical output pairs.
        let encoded = xor_encode("aaaaaaaaaaaa", "sekrit");
        assert_eq!(encoded[..2], encoded[12..14]);
    }

    #[test]
    fn test_xor_encode_is_reversible() {
        let encoded = xor_encode("Password1", "sekrit");
        let bytes: Vec<u8> = (0..encoded.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&encoded[i..i + 2], 16).unwrap())
            .collect();
        let decoded: String = bytes
            .iter()
            .zip("sekrit".bytes().cycle())
            .map(|(b, k)| (b ^ k) as char)
            .collect();
        assert_eq!(decoded, "Password1");
    }

    #[test]
    fn test_xor_encode_empty_plaintext() {
        assert_eq!(xor_encode("", "sekrit"), "");
    }
}
