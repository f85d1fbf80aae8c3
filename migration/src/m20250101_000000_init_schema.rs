use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create team table
        manager
            .create_table(
                Table::create()
                    .table(Team::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Team::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Team::Name).string_len(100).not_null().unique_key())
                    .col(ColumnDef::new(Team::Balance).big_integer().not_null().default(15000))
                    .to_owned(),
            )
            .await?;

        // Create round table
        manager
            .create_table(
                Table::create()
                    .table(Round::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Round::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Round::Position).string_len(10).not_null())
                    .col(ColumnDef::new(Round::IsActive).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Round::Status)
                            .string_len(50)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Round::StartTime)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Round::Duration).integer().not_null().default(300))
                    .to_owned(),
            )
            .await?;

        // Create player table
        manager
            .create_table(
                Table::create()
                    .table(Player::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Player::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Player::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Player::Position).string_len(10).not_null())
                    .col(ColumnDef::new(Player::TeamId).integer().null())
                    .col(ColumnDef::new(Player::RoundId).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_player_team_id")
                            .from(Player::Table, Player::TeamId)
                            .to(Team::Table, Team::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_player_round_id")
                            .from(Player::Table, Player::RoundId)
                            .to(Round::Table, Round::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Create bid table
        manager
            .create_table(
                Table::create()
                    .table(Bid::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bid::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bid::TeamId).integer().not_null())
                    .col(ColumnDef::new(Bid::PlayerId).integer().not_null())
                    .col(ColumnDef::new(Bid::RoundId).integer().not_null())
                    .col(ColumnDef::new(Bid::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Bid::IsHidden).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Bid::Timestamp)
                            .date_time()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(Bid::Amount).gte(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bid_team_id")
                            .from(Bid::Table, Bid::TeamId)
                            .to(Team::Table, Team::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bid_player_id")
                            .from(Bid::Table, Bid::PlayerId)
                            .to(Player::Table, Player::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bid_round_id")
                            .from(Bid::Table, Bid::RoundId)
                            .to(Round::Table, Round::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Create tiebreaker table
        manager
            .create_table(
                Table::create()
                    .table(Tiebreaker::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tiebreaker::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tiebreaker::RoundId).integer().null())
                    .col(ColumnDef::new(Tiebreaker::PlayerId).integer().not_null())
                    .col(ColumnDef::new(Tiebreaker::OriginalAmount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Tiebreaker::Resolved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tiebreaker_round_id")
                            .from(Tiebreaker::Table, Tiebreaker::RoundId)
                            .to(Round::Table, Round::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tiebreaker_player_id")
                            .from(Tiebreaker::Table, Tiebreaker::PlayerId)
                            .to(Player::Table, Player::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Create team_tiebreaker table
        manager
            .create_table(
                Table::create()
                    .table(TeamTiebreaker::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeamTiebreaker::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TeamTiebreaker::TiebreakerId).integer().not_null())
                    .col(ColumnDef::new(TeamTiebreaker::TeamId).integer().not_null())
                    .col(ColumnDef::new(TeamTiebreaker::NewAmount).big_integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_tiebreaker_tiebreaker_id")
                            .from(TeamTiebreaker::Table, TeamTiebreaker::TiebreakerId)
                            .to(Tiebreaker::Table, Tiebreaker::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_tiebreaker_team_id")
                            .from(TeamTiebreaker::Table, TeamTiebreaker::TeamId)
                            .to(Team::Table, Team::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order due to foreign key constraints
        manager
            .drop_table(Table::drop().table(TeamTiebreaker::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Tiebreaker::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Bid::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Player::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Round::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Team::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Team {
    Table,
    Id,
    Name,
    Balance,
}

#[derive(DeriveIden)]
enum Round {
    Table,
    Id,
    Position,
    IsActive,
    Status,
    StartTime,
    Duration,
}

#[derive(DeriveIden)]
enum Player {
    Table,
    Id,
    Name,
    Position,
    TeamId,
    RoundId,
}

#[derive(DeriveIden)]
enum Bid {
    Table,
    Id,
    TeamId,
    PlayerId,
    RoundId,
    Amount,
    IsHidden,
    Timestamp,
}

#[derive(DeriveIden)]
enum Tiebreaker {
    Table,
    Id,
    RoundId,
    PlayerId,
    OriginalAmount,
    Resolved,
}

#[derive(DeriveIden)]
enum TeamTiebreaker {
    Table,
    Id,
    TiebreakerId,
    TeamId,
    NewAmount,
}
