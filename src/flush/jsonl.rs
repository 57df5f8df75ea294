use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::save::SaveGame;
use crate::model::BuildingRegistry;
use crate::sim::SimulationContext;

/// Write an iterator of serializable items to a JSONL file (one JSON object per line).
fn write_jsonl<T: Serialize>(path: &Path, items: impl Iterator<Item = T>) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, &item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Read every non-blank line of a JSONL file. A missing file is an empty table.
fn read_jsonl<T: DeserializeOwned>(path: &Path) -> io::Result<Vec<T>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };
    let mut rows = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(serde_json::from_str(&line)?);
    }
    Ok(rows)
}

/// Write a save of `ctx` to JSONL files in `output_dir`, one file per table.
///
/// Creates the output directory if it does not exist. Writes:
/// - `meta.jsonl`: clock, next id, config
/// - `players.jsonl`, `islands.jsonl`, `settlements.jsonl`, `ships.jsonl`,
///   `buildings.jsonl`, `events.jsonl`
/// - `scheduled_calls.jsonl`: pending calls in firing order
/// - `ai_players.jsonl`, `ai_settlement_manager.jsonl`,
///   `ai_settlement_manager_build_queue.jsonl`
/// - `pending_commands.jsonl`
pub fn save_to_jsonl(ctx: &SimulationContext, output_dir: &Path) -> io::Result<()> {
    write_save(&SaveGame::capture(ctx), output_dir)
}

pub fn write_save(save: &SaveGame, output_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(output_dir)?;
    let dir = output_dir;

    write_jsonl(&dir.join("meta.jsonl"), std::iter::once(&save.meta))?;
    write_jsonl(&dir.join("players.jsonl"), save.players.iter())?;
    write_jsonl(&dir.join("islands.jsonl"), save.islands.iter())?;
    write_jsonl(&dir.join("settlements.jsonl"), save.settlements.iter())?;
    write_jsonl(&dir.join("ships.jsonl"), save.ships.iter())?;
    write_jsonl(&dir.join("buildings.jsonl"), save.buildings.iter())?;
    write_jsonl(&dir.join("events.jsonl"), save.events.iter())?;
    write_jsonl(&dir.join("scheduled_calls.jsonl"), save.scheduled_calls.iter())?;
    write_jsonl(&dir.join("ai_players.jsonl"), save.ai_players.iter())?;
    write_jsonl(&dir.join("ai_settlement_manager.jsonl"), save.managers.iter())?;
    write_jsonl(
        &dir.join("ai_settlement_manager_build_queue.jsonl"),
        save.build_queue.iter(),
    )?;
    write_jsonl(&dir.join("pending_commands.jsonl"), save.pending_commands.iter())?;
    Ok(())
}

/// Read the tables written by [`write_save`]. `meta.jsonl` must hold
/// exactly one row; every other table may be absent.
pub fn read_save(dir: &Path) -> io::Result<SaveGame> {
    let mut meta = read_jsonl(&dir.join("meta.jsonl"))?;
    if meta.len() != 1 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("meta.jsonl holds {} rows, expected 1", meta.len()),
        ));
    }
    Ok(SaveGame {
        meta: meta.remove(0),
        players: read_jsonl(&dir.join("players.jsonl"))?,
        islands: read_jsonl(&dir.join("islands.jsonl"))?,
        settlements: read_jsonl(&dir.join("settlements.jsonl"))?,
        ships: read_jsonl(&dir.join("ships.jsonl"))?,
        buildings: read_jsonl(&dir.join("buildings.jsonl"))?,
        events: read_jsonl(&dir.join("events.jsonl"))?,
        scheduled_calls: read_jsonl(&dir.join("scheduled_calls.jsonl"))?,
        ai_players: read_jsonl(&dir.join("ai_players.jsonl"))?,
        managers: read_jsonl(&dir.join("ai_settlement_manager.jsonl"))?,
        build_queue: read_jsonl(&dir.join("ai_settlement_manager_build_queue.jsonl"))?,
        pending_commands: read_jsonl(&dir.join("pending_commands.jsonl"))?,
    })
}

/// Load a save written by [`save_to_jsonl`] into a running context.
pub fn load_from_jsonl(dir: &Path, registry: Arc<BuildingRegistry>) -> io::Result<SimulationContext> {
    read_save(dir)?.restore(registry).map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceId;
    use crate::scenario::Scenario;

    #[test]
    fn missing_tables_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Scenario::new().build();
        save_to_jsonl(&ctx, dir.path()).unwrap();
        fs::remove_file(dir.path().join("events.jsonl")).unwrap();

        let save = read_save(dir.path()).unwrap();
        assert!(save.events.is_empty());
        assert_eq!(save.meta.tick, 0);
    }

    #[test]
    fn missing_meta_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_save(dir.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn corrupt_line_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Scenario::new().build();
        save_to_jsonl(&ctx, dir.path()).unwrap();
        fs::write(dir.path().join("players.jsonl"), "{not json\n").unwrap();
        assert!(read_save(dir.path()).is_err());
    }

    #[test]
    fn one_row_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = Scenario::new();
        let ann = s.add_player("Ann", false);
        s.add_player("Bob", false);
        s.add_ship(ann, &[(ResourceId::BOARDS, 5)]);
        save_to_jsonl(&s.build(), dir.path()).unwrap();

        let players = fs::read_to_string(dir.path().join("players.jsonl")).unwrap();
        assert_eq!(players.lines().count(), 2);
        let ship: serde_json::Value = serde_json::from_str(
            fs::read_to_string(dir.path().join("ships.jsonl")).unwrap().trim(),
        )
        .unwrap();
        assert_eq!(ship["owner"], ann);
    }
}
