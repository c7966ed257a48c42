use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set};

use crate::entities::prelude::Users;
use crate::entities::{messages, users};

pub struct MessageRepository {
    conn: DatabaseConnection,
}

impl MessageRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(&self, user_id: i32, comment: &str) -> Result<messages::Model> {
        let message = messages::ActiveModel {
            user_id: Set(user_id),
            comment: Set(comment.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let message = message
            .insert(&self.conn)
            .await
            .context("Failed to create message")?;

        Ok(message)
    }

    /// Newest first, each message paired with its author row.
    pub async fn list_with_authors(
        &self,
        limit: u64,
    ) -> Result<Vec<(messages::Model, Option<users::Model>)>> {
        let rows = messages::Entity::find()
            .find_also_related(Users)
            .order_by_desc(messages::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list messages")?;

        Ok(rows)
    }

    /// Delete by id alone. The caller's identity is not consulted, so any
    /// authenticated user can remove any message.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = messages::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete message")?;

        Ok(result.rows_affected > 0)
    }
}
