use sqlx::PgPool;

/// Tables of a save, children before parents.
const SAVE_TABLES: [&str; 12] = [
    "pending_commands",
    "ai_settlement_manager_build_queue",
    "ai_settlement_manager",
    "ai_players",
    "scheduled_calls",
    "events",
    "buildings",
    "ships",
    "settlements",
    "islands",
    "players",
    "meta",
];

/// Create the save tables and indexes if they do not exist yet.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(include_str!("../../sql/schema.sql"))
        .execute(pool)
        .await?;
    Ok(())
}

/// Empty every save table so a new save can be loaded into the same schema.
pub async fn clear_save(pool: &PgPool) -> Result<(), sqlx::Error> {
    let statement = format!("TRUNCATE {}", SAVE_TABLES.join(", "));
    sqlx::raw_sql(&statement).execute(pool).await?;
    Ok(())
}
