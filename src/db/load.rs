use serde::Serialize;
use sqlx::PgPool;

use crate::flush::SaveGame;

/// Load a whole `SaveGame` into Postgres using COPY FROM STDIN (text format).
///
/// Order respects FK constraints: players → islands → settlements → ships →
/// buildings → AI tables. Nested state (inventories, ground, producers) goes
/// into JSONB columns in its serde form.
pub async fn load_save(pool: &PgPool, save: &SaveGame) -> Result<(), sqlx::Error> {
    // Meta
    {
        let m = &save.meta;
        let buf = format!("{}\t{}\t{}\n", m.tick, m.next_id, escape(&json(&m.config)?));
        copy_in(pool, include_str!("../../sql/copy_meta.sql"), &buf).await?;
    }

    // Players
    {
        let mut buf = String::new();
        for p in &save.players {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\n",
                p.id,
                escape(&p.name),
                p.settler_level,
                p.is_ai,
                escape(&json(&p.wallet)?),
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_players.sql"), &buf).await?;
    }

    // Islands: ground and occupancy keep the tile-map encoding of the model.
    {
        let mut buf = String::new();
        for i in &save.islands {
            let value = serde_json::to_value(i).map_err(encode_err)?;
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\n",
                i.id,
                i.origin.0,
                i.origin.1,
                opt(i.source.as_deref().map(escape)),
                escape(&value["ground"].to_string()),
                escape(&value["occupancy"].to_string()),
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_islands.sql"), &buf).await?;
    }

    // Settlements
    {
        let mut buf = String::new();
        for s in &save.settlements {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                s.id,
                escape(&s.name),
                s.owner,
                s.island,
                s.tax_setting,
                escape(&json(&s.upgrade_permissions)?),
                escape(&json(&s.inventory)?),
                escape(&json(&s.tiles)?),
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_settlements.sql"), &buf).await?;
    }

    // Ships
    {
        let mut buf = String::new();
        for s in &save.ships {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\n",
                s.id,
                escape(&s.name),
                s.owner,
                escape(&json(&s.inventory)?),
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_ships.sql"), &buf).await?;
    }

    // Buildings
    {
        let mut buf = String::new();
        for b in &save.buildings {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                b.id,
                b.type_id.0,
                escape(&enum_str(&b.kind)?),
                b.island,
                opt(b.settlement),
                opt(b.owner),
                b.area.x,
                b.area.y,
                b.area.w,
                b.area.h,
                b.rotation,
                b.level,
                b.inhabitants,
                b.built_at,
                escape(&json(&b.inventory)?),
                escape(&json(&b.producers)?),
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_buildings.sql"), &buf).await?;
    }

    // Events
    {
        let mut buf = String::new();
        for ev in &save.events {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\n",
                ev.seq,
                ev.tick,
                escape(&enum_str(&ev.kind)?),
                ev.entity,
                escape(&ev.description),
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_events.sql"), &buf).await?;
    }

    // Scheduled calls, position = firing order
    {
        let mut buf = String::new();
        for (position, call) in save.scheduled_calls.iter().enumerate() {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\n",
                position,
                call.target,
                escape(&json(&call.callback)?),
                call.remaining_ticks,
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_scheduled_calls.sql"), &buf).await?;
    }

    // AI players
    {
        let mut buf = String::new();
        for p in &save.ai_players {
            buf.push_str(&format!("{}\t{}\n", p.player, escape(&json(&p.personality)?)));
        }
        copy_in(pool, include_str!("../../sql/copy_ai_players.sql"), &buf).await?;
    }

    // Settlement managers (before their queues due to FK)
    {
        let mut buf = String::new();
        for m in &save.managers {
            buf.push_str(&format!("{}\t{}\t{}\n", m.id, m.settlement, m.village_built));
        }
        copy_in(pool, include_str!("../../sql/copy_ai_settlement_manager.sql"), &buf).await?;
    }

    {
        let mut buf = String::new();
        for row in &save.build_queue {
            buf.push_str(&format!(
                "{}\t{}\t{}\n",
                row.manager,
                row.position,
                escape(&enum_str(&row.task)?),
            ));
        }
        copy_in(
            pool,
            include_str!("../../sql/copy_ai_settlement_manager_build_queue.sql"),
            &buf,
        )
        .await?;
    }

    // Pending commands
    {
        let mut buf = String::new();
        for c in &save.pending_commands {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\n",
                c.seq,
                c.execute_at,
                opt(c.issuer),
                escape(&json(&c.command)?),
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_pending_commands.sql"), &buf).await?;
    }

    Ok(())
}

/// Execute a COPY FROM STDIN with the given text-format payload.
async fn copy_in(pool: &PgPool, statement: &str, data: &str) -> Result<(), sqlx::Error> {
    if data.is_empty() {
        return Ok(());
    }
    let mut conn = pool.acquire().await?;
    let mut copy = conn.copy_in_raw(statement).await?;
    copy.send(data.as_bytes()).await?;
    copy.finish().await?;
    Ok(())
}

/// Escape a string for Postgres COPY text format.
/// Backslash must be escaped first, then the special whitespace characters.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Render an optional value as a COPY text value (`\N` for NULL).
fn opt<T: ToString>(v: Option<T>) -> String {
    match v {
        Some(v) => v.to_string(),
        None => "\\N".to_string(),
    }
}

fn encode_err(err: serde_json::Error) -> sqlx::Error {
    sqlx::Error::Encode(Box::new(err))
}

/// Serialize a value for a JSONB column.
fn json<T: Serialize>(val: &T) -> Result<String, sqlx::Error> {
    serde_json::to_string(val).map_err(encode_err)
}

/// Serialize a string-backed enum to its stored name.
fn enum_str<T: Serialize>(val: &T) -> Result<String, sqlx::Error> {
    match serde_json::to_value(val).map_err(encode_err)? {
        serde_json::Value::String(s) => Ok(s),
        other => Ok(other.to_string()),
    }
}
