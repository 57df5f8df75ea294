mod common;

use islesim::db::{clear_save, load_save, migrate};
use islesim::flush::SaveGame;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;

async fn setup() -> (PgPool, ContainerAsync<Postgres>) {
    let container = Postgres::default().start().await.unwrap();
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();
    let pool = PgPoolOptions::new()
        .connect(&format!(
            "postgres://postgres:postgres@{}:{}/postgres",
            host, port
        ))
        .await
        .unwrap();
    (pool, container)
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

fn saved_ai_world() -> SaveGame {
    let mut ctx = common::ai_world(4);
    ctx.advance(600);
    SaveGame::capture(&ctx)
}

#[tokio::test]
#[ignore]
async fn load_populates_all_tables() {
    let (pool, _container) = setup().await;
    let save = saved_ai_world();

    migrate(&pool).await.unwrap();
    load_save(&pool, &save).await.unwrap();

    assert_eq!(count(&pool, "meta").await, 1);
    assert_eq!(count(&pool, "players").await, save.players.len() as i64);
    assert_eq!(count(&pool, "islands").await, save.islands.len() as i64);
    assert_eq!(count(&pool, "settlements").await, save.settlements.len() as i64);
    assert_eq!(count(&pool, "buildings").await, save.buildings.len() as i64);
    assert_eq!(count(&pool, "events").await, save.events.len() as i64);
    assert_eq!(count(&pool, "scheduled_calls").await, save.scheduled_calls.len() as i64);
    assert_eq!(count(&pool, "ai_settlement_manager").await, 1);
    assert_eq!(
        count(&pool, "ai_settlement_manager_build_queue").await,
        save.build_queue.len() as i64
    );
}

#[tokio::test]
#[ignore]
async fn loaded_data_matches_source_values() {
    let (pool, _container) = setup().await;
    let save = saved_ai_world();

    migrate(&pool).await.unwrap();
    load_save(&pool, &save).await.unwrap();

    let meta = sqlx::query("SELECT tick, next_id, config FROM meta")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(meta.get::<i64, _>("tick"), 600);
    assert_eq!(meta.get::<i64, _>("next_id") as u64, save.meta.next_id);
    let config: serde_json::Value = meta.get("config");
    assert_eq!(config["ticks_per_second"], 16);

    // Scheduled calls keep their firing order.
    let calls = sqlx::query("SELECT target, remaining_ticks FROM scheduled_calls ORDER BY position")
        .fetch_all(&pool)
        .await
        .unwrap();
    for (row, call) in calls.iter().zip(&save.scheduled_calls) {
        assert_eq!(row.get::<i64, _>("target") as u64, call.target);
        assert_eq!(row.get::<i64, _>("remaining_ticks") as u64, call.remaining_ticks);
    }

    let office = sqlx::query("SELECT kind, owner, settlement FROM buildings WHERE kind = 'branch_office'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(office.get::<Option<i64>, _>("owner").is_some());
    assert!(office.get::<Option<i64>, _>("settlement").is_some());

    let trees: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM buildings WHERE kind = 'nature' AND owner IS NULL")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(trees > 0);
}

#[tokio::test]
#[ignore]
async fn clear_allows_reloading() {
    let (pool, _container) = setup().await;
    let save = saved_ai_world();

    migrate(&pool).await.unwrap();
    load_save(&pool, &save).await.unwrap();
    clear_save(&pool).await.unwrap();
    assert_eq!(count(&pool, "buildings").await, 0);

    load_save(&pool, &save).await.unwrap();
    assert_eq!(count(&pool, "players").await, save.players.len() as i64);
}
