use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "scores")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub player: String,

    pub score: i64,

    /// URL-encoded replay data in the snake client's wire format.
    pub recording: String,

    /// Slot 0-9 on the current high-score board, or NULL when the score
    /// fell off the board.
    pub recid: Option<i32>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
