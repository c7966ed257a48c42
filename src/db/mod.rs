use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use crate::entities::users::{Role, UserStatus};
use crate::entities::{messages, scores, tools, users};

pub mod migrator;
pub mod repositories;

pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn message_repo(&self) -> repositories::message::MessageRepository {
        repositories::message::MessageRepository::new(self.conn.clone())
    }

    fn tool_repo(&self) -> repositories::tool::ToolRepository {
        repositories::tool::ToolRepository::new(self.conn.clone())
    }

    fn score_repo(&self) -> repositories::score::ScoreRepository {
        repositories::score::ScoreRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn list_users(&self) -> Result<Vec<users::Model>> {
        self.user_repo().list_all().await
    }

    pub async fn find_user_by_credentials_raw(
        &self,
        username: &str,
        encoded_password: &str,
    ) -> Result<Option<users::Model>> {
        self.user_repo()
            .find_by_credentials_raw(username, encoded_password)
            .await
    }

    pub async fn create_user_from_fields(
        &self,
        fields: &HashMap<String, String>,
        enc_key: &str,
    ) -> Result<users::Model> {
        self.user_repo().create_from_fields(fields, enc_key).await
    }

    pub async fn update_user_password(
        &self,
        id: i32,
        new_password: &str,
        enc_key: &str,
    ) -> Result<()> {
        self.user_repo()
            .update_password(id, new_password, enc_key)
            .await
    }

    pub async fn update_user_profile(
        &self,
        id: i32,
        password: &str,
        question: &str,
        answer: &str,
        enc_key: &str,
    ) -> Result<users::Model> {
        self.user_repo()
            .update_profile(id, password, question, answer, enc_key)
            .await
    }

    pub async fn update_user_notes(&self, id: i32, notes: &str) -> Result<()> {
        self.user_repo().update_notes(id, notes).await
    }

    pub async fn set_user_role(&self, id: i32, role: Role) -> Result<()> {
        self.user_repo().set_role(id, role).await
    }

    pub async fn set_user_status(&self, id: i32, status: UserStatus) -> Result<()> {
        self.user_repo().set_status(id, status).await
    }

    // ========== Messages ==========

    pub async fn add_message(&self, user_id: i32, comment: &str) -> Result<messages::Model> {
        self.message_repo().add(user_id, comment).await
    }

    pub async fn list_messages(
        &self,
        limit: u64,
    ) -> Result<Vec<(messages::Model, Option<users::Model>)>> {
        self.message_repo().list_with_authors(limit).await
    }

    pub async fn delete_message(&self, id: i32) -> Result<bool> {
        self.message_repo().delete(id).await
    }

    // ========== Tools ==========

    pub async fn list_tools(&self) -> Result<Vec<tools::Model>> {
        self.tool_repo().list_all().await
    }

    pub async fn get_tool(&self, id: i32) -> Result<Option<tools::Model>> {
        self.tool_repo().get(id).await
    }

    pub async fn get_tool_by_raw_id(&self, raw_id: &str) -> Result<Option<tools::Model>> {
        self.tool_repo().get_by_raw_id(raw_id).await
    }

    pub async fn add_tool(
        &self,
        name: &str,
        path: &str,
        description: &str,
    ) -> Result<tools::Model> {
        self.tool_repo().add(name, path, description).await
    }

    pub async fn remove_tool(&self, id: i32) -> Result<bool> {
        self.tool_repo().remove(id).await
    }

    // ========== Scores ==========

    pub async fn high_scores(&self) -> Result<Vec<scores::Model>> {
        self.score_repo().high_scores().await
    }

    pub async fn get_score_by_recid(&self, recid: i32) -> Result<Option<scores::Model>> {
        self.score_repo().get_by_recid(recid).await
    }

    pub async fn record_score(&self, player: &str, score: i64, recording: &str) -> Result<()> {
        self.score_repo().record(player, score, recording).await
    }
}
