use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::constants::limits::HIGH_SCORE_SLOTS;
use crate::entities::scores;

pub struct ScoreRepository {
    conn: DatabaseConnection,
}

impl ScoreRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Current board: rows holding a slot, in slot order.
    pub async fn high_scores(&self) -> Result<Vec<scores::Model>> {
        let scores = scores::Entity::find()
            .filter(scores::Column::Recid.is_not_null())
            .order_by_asc(scores::Column::Recid)
            .all(&self.conn)
            .await
            .context("Failed to list high scores")?;

        Ok(scores)
    }

    pub async fn get_by_recid(&self, recid: i32) -> Result<Option<scores::Model>> {
        let score = scores::Entity::find()
            .filter(scores::Column::Recid.eq(recid))
            .one(&self.conn)
            .await
            .context("Failed to query score by slot")?;

        Ok(score)
    }

    /// Insert a score, then rebuild the board: clear every slot and hand
    /// slots 0..10 to the current top scores. A score that falls off keeps
    /// its row but loses its slot, so its recording stops being reachable.
    pub async fn record(&self, player: &str, score: i64, recording: &str) -> Result<()> {
        let entry = scores::ActiveModel {
            player: Set(player.to_string()),
            score: Set(score),
            recording: Set(recording.to_string()),
            recid: Set(None),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };
        entry
            .insert(&self.conn)
            .await
            .context("Failed to insert score")?;

        scores::Entity::update_many()
            .col_expr(scores::Column::Recid, sea_orm::sea_query::Expr::value(sea_orm::Value::Int(None)))
            .exec(&self.conn)
            .await
            .context("Failed to clear score slots")?;

        let top = scores::Entity::find()
            .order_by_desc(scores::Column::Score)
            .order_by_asc(scores::Column::Id)
            .limit(HIGH_SCORE_SLOTS)
            .all(&self.conn)
            .await
            .context("Failed to select top scores")?;

        for (slot, row) in top.into_iter().enumerate() {
            let mut active: scores::ActiveModel = row.into();
            active.recid = Set(Some(slot as i32));
            active.update(&self.conn).await?;
        }

        Ok(())
    }
}
