#![allow(dead_code)]

use std::env;
use std::sync::Once;

use auction_ops::entity::{bids, players, rounds, team_tiebreakers, teams, tiebreakers};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};
use tokio::sync::{Mutex, MutexGuard};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

// Every test truncates the whole schema, so they take turns.
static DB_LOCK: Mutex<()> = Mutex::const_new(());

pub fn init_tracing_for_tests() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx=warn"));
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .init();
    });
}

/// Loads .env, ensures a *_test database, inits tracing, connects, migrates
/// and empties every table.
pub async fn test_bootstrap() -> (MutexGuard<'static, ()>, DatabaseConnection) {
    let _ = dotenv::dotenv();
    let url = ensure_test_db(env::var("DATABASE_URL").ok());
    init_tracing_for_tests();

    let guard = DB_LOCK.lock().await;

    // Fresh connection per test: each #[tokio::test] owns its runtime.
    let db = Database::connect(&url).await.expect("DB connect failed");
    Migrator::up(&db, None).await.expect("Migrator::up failed");
    reset_schema(&db).await;
    info!("Test database ready");

    (guard, db)
}

pub fn ensure_test_db(database_url: Option<String>) -> String {
    let url = database_url.expect("DATABASE_URL is required for tests");
    assert!(
        url.contains("_test"),
        "Refusing to run unless DATABASE_URL points to a *_test database. Current: {}",
        auction_ops::bootstrap::redact_db_url(&url)
    );
    url
}

pub async fn reset_schema(db: &DatabaseConnection) {
    db.execute_unprepared(
        "TRUNCATE team_tiebreaker, tiebreaker, bid, player, round, team RESTART IDENTITY CASCADE",
    )
    .await
    .expect("truncate failed");
}

pub async fn seed_team(db: &DatabaseConnection, name: &str) -> teams::Model {
    teams::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert team")
}

pub async fn seed_round(db: &DatabaseConnection, position: &str, is_active: bool) -> rounds::Model {
    rounds::ActiveModel {
        position: Set(position.to_string()),
        is_active: Set(is_active),
        status: Set(if is_active { "active" } else { "completed" }.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert round")
}

pub async fn seed_player(
    db: &DatabaseConnection,
    name: &str,
    position: &str,
    team_id: Option<i32>,
    round_id: Option<i32>,
) -> players::Model {
    players::ActiveModel {
        name: Set(name.to_string()),
        position: Set(position.to_string()),
        team_id: Set(team_id),
        round_id: Set(round_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert player")
}

pub async fn seed_bid(
    db: &DatabaseConnection,
    team_id: i32,
    player_id: i32,
    round_id: i32,
    amount: i64,
) -> bids::Model {
    bids::ActiveModel {
        team_id: Set(team_id),
        player_id: Set(player_id),
        round_id: Set(round_id),
        amount: Set(amount),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert bid")
}

pub async fn seed_tiebreaker(
    db: &DatabaseConnection,
    round_id: i32,
    player_id: i32,
    team_ids: &[i32],
) -> tiebreakers::Model {
    let tiebreaker = tiebreakers::ActiveModel {
        round_id: Set(Some(round_id)),
        player_id: Set(player_id),
        original_amount: Set(100),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert tiebreaker");

    for team_id in team_ids {
        team_tiebreakers::ActiveModel {
            tiebreaker_id: Set(tiebreaker.id),
            team_id: Set(*team_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("insert team tiebreaker");
    }

    tiebreaker
}
