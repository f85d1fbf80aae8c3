//! Storage gateway
//!
//! Every query the maintenance operations issue lives here. Functions take
//! any [`ConnectionTrait`] so callers decide whether they run inside a
//! transaction. The bid classification is expressed as joins in SQL; the
//! round reset goes through the entity API.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, DbErr, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, Set, Statement,
};

use crate::dto::classification_report::{BidTotals, PreservedBid, PurgeReason, PurgeableBid};
use crate::dto::reset_report::{CascadeCounts, DependentRows, SequenceState};
use crate::entity::{bids, players, rounds, team_tiebreakers, tiebreakers};

/// Winning bid: the target player went to the bidding team.
/// Expects `bid b`, `round r` and `player p` in scope.
pub const PRESERVED_PREDICATE: &str =
    "r.is_active = false AND p.team_id IS NOT NULL AND p.team_id = b.team_id";

/// Losing bid on a finalized round: player unallocated or allocated elsewhere.
/// Expects `bid b`, `round r` and `player p` in scope.
pub const PURGEABLE_PREDICATE: &str =
    "r.is_active = false AND (p.team_id IS NULL OR p.team_id <> b.team_id)";

/// Position label of the throwaway row used to check the sequence restart
pub const SENTINEL_POSITION: &str = "GK";
pub const SENTINEL_STATUS: &str = "test";

#[derive(Debug, FromQueryResult)]
struct TotalsRow {
    total: i64,
    preserved: i64,
    purgeable: i64,
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    count: i64,
}

#[derive(Debug, FromQueryResult)]
struct PreservedRow {
    bid_id: i32,
    team_name: String,
    player_name: String,
    amount: i64,
    position: String,
    round_id: i32,
    timestamp: NaiveDateTime,
}

#[derive(Debug, FromQueryResult)]
struct PurgeableRow {
    bid_id: i32,
    team_name: Option<String>,
    player_name: String,
    amount: i64,
    position: String,
    round_id: i32,
    timestamp: NaiveDateTime,
    player_team_id: Option<i32>,
}

#[derive(Debug, FromQueryResult)]
struct SequenceNameRow {
    sequence_name: Option<String>,
}

#[derive(Debug, FromQueryResult)]
struct SequenceRow {
    last_value: i64,
    is_called: bool,
}

fn statement(sql: impl Into<String>) -> Statement {
    Statement::from_string(DbBackend::Postgres, sql)
}

fn missing_row(what: &str) -> DbErr {
    DbErr::RecordNotFound(format!("{what} query returned no row"))
}

/// Count inactive-round bids overall and per classification, in one round trip.
pub async fn inactive_bid_totals<C: ConnectionTrait>(conn: &C) -> Result<BidTotals, DbErr> {
    let sql = format!(
        r#"
        SELECT
            (SELECT COUNT(*)
               FROM bid b
               JOIN round r ON b.round_id = r.id
              WHERE r.is_active = false) AS total,
            (SELECT COUNT(*)
               FROM bid b
               JOIN round r ON b.round_id = r.id
               JOIN player p ON b.player_id = p.id
              WHERE {PRESERVED_PREDICATE}) AS preserved,
            (SELECT COUNT(*)
               FROM bid b
               JOIN round r ON b.round_id = r.id
               JOIN player p ON b.player_id = p.id
              WHERE {PURGEABLE_PREDICATE}) AS purgeable
        "#
    );

    let row = TotalsRow::find_by_statement(statement(sql))
        .one(conn)
        .await?
        .ok_or_else(|| missing_row("bid totals"))?;

    Ok(BidTotals {
        total: row.total,
        preserved: row.preserved,
        purgeable: row.purgeable,
    })
}

/// All winning bids on inactive rounds, by position, team name, then time.
pub async fn preserved_bids<C: ConnectionTrait>(conn: &C) -> Result<Vec<PreservedBid>, DbErr> {
    let sql = format!(
        r#"
        SELECT
            b.id AS bid_id,
            t.name AS team_name,
            p.name AS player_name,
            b.amount,
            r.position,
            r.id AS round_id,
            b.timestamp
        FROM bid b
        JOIN round r ON b.round_id = r.id
        JOIN player p ON b.player_id = p.id
        JOIN team t ON b.team_id = t.id
        WHERE {PRESERVED_PREDICATE}
        ORDER BY r.position, t.name, b.timestamp, b.id
        "#
    );

    let rows = PreservedRow::find_by_statement(statement(sql))
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| PreservedBid {
            bid_id: row.bid_id,
            team_name: row.team_name,
            player_name: row.player_name,
            amount: row.amount,
            position: row.position,
            round_id: row.round_id,
            timestamp: row.timestamp,
        })
        .collect())
}

/// Losing bids on inactive rounds, by position, round, then time.
/// `limit` of `None` returns every purgeable bid.
pub async fn purgeable_bids<C: ConnectionTrait>(
    conn: &C,
    limit: Option<u64>,
) -> Result<Vec<PurgeableBid>, DbErr> {
    let mut sql = format!(
        r#"
        SELECT
            b.id AS bid_id,
            t.name AS team_name,
            p.name AS player_name,
            b.amount,
            r.position,
            r.id AS round_id,
            b.timestamp,
            p.team_id AS player_team_id
        FROM bid b
        JOIN round r ON b.round_id = r.id
        JOIN player p ON b.player_id = p.id
        LEFT JOIN team t ON b.team_id = t.id
        WHERE {PURGEABLE_PREDICATE}
        ORDER BY r.position, r.id, b.timestamp, b.id
        "#
    );

    let stmt = match limit {
        Some(limit) => {
            sql.push_str(" LIMIT $1");
            Statement::from_sql_and_values(DbBackend::Postgres, sql, [(limit as i64).into()])
        }
        None => statement(sql),
    };

    let rows = PurgeableRow::find_by_statement(stmt).all(conn).await?;

    Ok(rows
        .into_iter()
        .map(|row| PurgeableBid {
            bid_id: row.bid_id,
            team_name: row.team_name,
            player_name: row.player_name,
            amount: row.amount,
            position: row.position,
            round_id: row.round_id,
            timestamp: row.timestamp,
            reason: PurgeReason::from_assigned_team(row.player_team_id),
        })
        .collect())
}

/// Count bids still matching the purgeable predicate
pub async fn count_purgeable<C: ConnectionTrait>(conn: &C) -> Result<i64, DbErr> {
    let sql = format!(
        r#"
        SELECT COUNT(*) AS count
        FROM bid b
        JOIN round r ON b.round_id = r.id
        JOIN player p ON b.player_id = p.id
        WHERE {PURGEABLE_PREDICATE}
        "#
    );

    let row = CountRow::find_by_statement(statement(sql))
        .one(conn)
        .await?
        .ok_or_else(|| missing_row("purgeable count"))?;

    Ok(row.count)
}

/// Delete every bid matching the purgeable predicate; returns rows deleted.
pub async fn delete_purgeable<C: ConnectionTrait>(conn: &C) -> Result<u64, DbErr> {
    let sql = format!(
        r#"
        DELETE FROM bid b
        USING round r, player p
        WHERE b.round_id = r.id
          AND b.player_id = p.id
          AND {PURGEABLE_PREDICATE}
        "#
    );

    let result = conn.execute(statement(sql)).await?;
    Ok(result.rows_affected())
}

pub async fn count_rounds<C: ConnectionTrait>(conn: &C) -> Result<u64, DbErr> {
    rounds::Entity::find().count(conn).await
}

/// Rows in player, bid and tiebreaker whose round reference is non-null.
pub async fn count_dependent_rows<C: ConnectionTrait>(conn: &C) -> Result<DependentRows, DbErr> {
    let player_refs = players::Entity::find()
        .filter(players::Column::RoundId.is_not_null())
        .count(conn)
        .await?;

    let bid_refs = bids::Entity::find()
        .filter(bids::Column::RoundId.is_not_null())
        .count(conn)
        .await?;

    let tiebreaker_refs = tiebreakers::Entity::find()
        .filter(tiebreakers::Column::RoundId.is_not_null())
        .count(conn)
        .await?;

    Ok(DependentRows(BTreeMap::from([
        ("bid".to_string(), bid_refs),
        ("player".to_string(), player_refs),
        ("tiebreaker".to_string(), tiebreaker_refs),
    ])))
}

/// Resolve the sequence behind `round.id`, as a (possibly qualified) name
pub async fn round_sequence_name<C: ConnectionTrait>(conn: &C) -> Result<Option<String>, DbErr> {
    let row = SequenceNameRow::find_by_statement(statement(
        "SELECT pg_get_serial_sequence('round', 'id') AS sequence_name",
    ))
    .one(conn)
    .await?;

    Ok(row.and_then(|row| row.sequence_name))
}

/// `sequence` must come from [`round_sequence_name`]; it is spliced into SQL.
pub async fn sequence_state<C: ConnectionTrait>(
    conn: &C,
    sequence: &str,
) -> Result<SequenceState, DbErr> {
    let row = SequenceRow::find_by_statement(statement(format!(
        "SELECT last_value, is_called FROM {sequence}"
    )))
    .one(conn)
    .await?
    .ok_or_else(|| missing_row("sequence state"))?;

    Ok(SequenceState {
        last_value: row.last_value,
        is_called: row.is_called,
    })
}

/// Next `nextval` on the sequence returns 1.
pub async fn restart_sequence<C: ConnectionTrait>(conn: &C, sequence: &str) -> Result<(), DbErr> {
    conn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT setval($1::regclass, 1, false)",
        [sequence.into()],
    ))
    .await?;
    Ok(())
}

/// Delete all rounds; fails on a foreign-key violation while dependents exist.
pub async fn delete_all_rounds<C: ConnectionTrait>(conn: &C) -> Result<u64, DbErr> {
    let result = rounds::Entity::delete_many().exec(conn).await?;
    Ok(result.rows_affected)
}

/// Clear every row that references a round so the rounds can go.
/// Tiebreaker entries go first, then tiebreakers, then bids; players only
/// lose their round reference.
pub async fn clear_round_dependents<C: ConnectionTrait>(conn: &C) -> Result<CascadeCounts, DbErr> {
    let round_bound_tiebreakers = Query::select()
        .column(tiebreakers::Column::Id)
        .from(tiebreakers::Entity)
        .and_where(tiebreakers::Column::RoundId.is_not_null())
        .to_owned();

    let team_tiebreakers_deleted = team_tiebreakers::Entity::delete_many()
        .filter(team_tiebreakers::Column::TiebreakerId.in_subquery(round_bound_tiebreakers))
        .exec(conn)
        .await?
        .rows_affected;

    let tiebreakers_deleted = tiebreakers::Entity::delete_many()
        .filter(tiebreakers::Column::RoundId.is_not_null())
        .exec(conn)
        .await?
        .rows_affected;

    let bids_deleted = bids::Entity::delete_many().exec(conn).await?.rows_affected;

    let players_detached = players::Entity::update_many()
        .col_expr(players::Column::RoundId, Expr::value(Option::<i32>::None))
        .filter(players::Column::RoundId.is_not_null())
        .exec(conn)
        .await?
        .rows_affected;

    Ok(CascadeCounts {
        team_tiebreakers_deleted,
        tiebreakers_deleted,
        bids_deleted,
        players_detached,
    })
}

/// Insert the sentinel round and return the identifier it was given
pub async fn insert_sentinel_round<C: ConnectionTrait>(conn: &C) -> Result<i32, DbErr> {
    let round = rounds::ActiveModel {
        position: Set(SENTINEL_POSITION.to_string()),
        status: Set(SENTINEL_STATUS.to_string()),
        ..Default::default()
    };

    let inserted = round.insert(conn).await?;
    Ok(inserted.id)
}

pub async fn delete_round<C: ConnectionTrait>(conn: &C, round_id: i32) -> Result<u64, DbErr> {
    let result = rounds::Entity::delete_by_id(round_id).exec(conn).await?;
    Ok(result.rows_affected)
}
