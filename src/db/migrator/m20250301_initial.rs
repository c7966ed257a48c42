use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

use crate::constants::{DEFAULT_ENC_KEY, QUESTIONS, seed};
use crate::db::repositories::user::xor_encode;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Built-in tools seeded for the command runner.
const SEED_TOOLS: &[(&str, &str, &str)] = &[
    ("Dig", "dig", "DNS lookup utility."),
    ("Nslookup", "nslookup", "Query Internet name servers interactively."),
    ("Ping", "ping -c 4", "Send ICMP ECHO_REQUEST packets to network hosts."),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Messages)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Tools)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Scores)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Seed the built-in admin account. The password is encoded with the
        // DEFAULT key; a deployment that overrides pw_enc_key must reseed.
        let now = chrono::Utc::now().to_rfc3339();
        let encoded = xor_encode(seed::ADMIN_PASSWORD, DEFAULT_ENC_KEY);

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                crate::entities::users::Column::Username,
                crate::entities::users::Column::Password,
                crate::entities::users::Column::Question,
                crate::entities::users::Column::Answer,
                crate::entities::users::Column::Role,
                crate::entities::users::Column::Status,
                crate::entities::users::Column::CreatedAt,
            ])
            .values_panic([
                seed::ADMIN_USERNAME.into(),
                encoded.into(),
                QUESTIONS[0].into(),
                "DeLorean".into(),
                0i32.into(),
                1i32.into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        for (name, path, description) in SEED_TOOLS {
            let insert = sea_orm_migration::sea_query::Query::insert()
                .into_table(Tools)
                .columns([
                    crate::entities::tools::Column::Name,
                    crate::entities::tools::Column::Path,
                    crate::entities::tools::Column::Description,
                ])
                .values_panic([(*name).into(), (*path).into(), (*description).into()])
                .to_owned();

            manager.exec_stmt(insert).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Scores).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tools).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Messages).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
