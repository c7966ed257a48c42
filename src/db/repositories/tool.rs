use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    QueryOrder, Set, Statement,
};

use crate::entities::tools;

pub struct ToolRepository {
    conn: DatabaseConnection,
}

impl ToolRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_all(&self) -> Result<Vec<tools::Model>> {
        let tools = tools::Entity::find()
            .order_by_asc(tools::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list tools")?;

        Ok(tools)
    }

    pub async fn get(&self, id: i32) -> Result<Option<tools::Model>> {
        let tool = tools::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query tool by ID")?;

        Ok(tool)
    }

    /// Tool lookup by the raw, unparsed id string from the URL. Interpolated
    /// into the statement as-is; a crafted id can UNION in rows from other
    /// tables.
    pub async fn get_by_raw_id(&self, raw_id: &str) -> Result<Option<tools::Model>> {
        let sql = format!("SELECT * FROM tools WHERE id={raw_id}");

        let backend = self.conn.get_database_backend();
        let row = self
            .conn
            .query_one(Statement::from_string(backend, sql))
            .await
            .context("Tool lookup query failed")?;

        match row {
            Some(row) => Ok(Some(tools::Model::from_query_result(&row, "")?)),
            None => Ok(None),
        }
    }

    pub async fn add(&self, name: &str, path: &str, description: &str) -> Result<tools::Model> {
        let tool = tools::ActiveModel {
            name: Set(name.to_string()),
            path: Set(path.to_string()),
            description: Set(description.to_string()),
            ..Default::default()
        };

        let tool = tool
            .insert(&self.conn)
            .await
            .context("Failed to create tool")?;

        Ok(tool)
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = tools::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete tool")?;

        Ok(result.rows_affected > 0)
    }
}
