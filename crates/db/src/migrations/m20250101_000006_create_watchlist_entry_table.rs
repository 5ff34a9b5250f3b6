//! Create `watchlist_entry` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WatchlistEntry::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WatchlistEntry::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WatchlistEntry::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(WatchlistEntry::MalId).integer().not_null())
                    .col(ColumnDef::new(WatchlistEntry::Title).string_len(255).not_null())
                    .col(ColumnDef::new(WatchlistEntry::ImageUrl).string_len(1024))
                    .col(ColumnDef::new(WatchlistEntry::Status).string_len(16))
                    .col(ColumnDef::new(WatchlistEntry::Rating).double())
                    .col(
                        ColumnDef::new(WatchlistEntry::IsFavorite)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(WatchlistEntry::TotalEpisodes).integer())
                    .col(
                        ColumnDef::new(WatchlistEntry::AddedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_watchlist_entry_user")
                            .from(WatchlistEntry::Table, WatchlistEntry::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one entry per (user, mal_id); target of the upserts
        manager
            .create_index(
                Index::create()
                    .name("idx_watchlist_entry_user_mal")
                    .table(WatchlistEntry::Table)
                    .col(WatchlistEntry::UserId)
                    .col(WatchlistEntry::MalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WatchlistEntry::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum WatchlistEntry {
    Table,
    Id,
    UserId,
    MalId,
    Title,
    ImageUrl,
    Status,
    Rating,
    IsFavorite,
    TotalEpisodes,
    AddedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
