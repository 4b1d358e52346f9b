use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::model::World;

/// Write an iterator of serializable items to a JSONL file (one JSON object per line).
fn write_jsonl<T: Serialize>(path: &Path, items: impl Iterator<Item = T>) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, &item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Export the world's history to JSONL files in the given directory.
///
/// Creates the directory if it does not exist. Writes 3 files:
/// - `events.jsonl`: the event log in append order
/// - `characters.jsonl`: living characters, then the dead
/// - `cities.jsonl`: one City per line
pub fn flush_to_jsonl(world: &World, output_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(output_dir)?;

    write_jsonl(&output_dir.join("events.jsonl"), world.events.iter())?;
    write_jsonl(
        &output_dir.join("characters.jsonl"),
        world.characters.values().chain(world.dead.values()),
    )?;
    write_jsonl(&output_dir.join("cities.jsonl"), world.cities.values())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Event, EventKind};
    use crate::scenario::Scenario;

    #[test]
    fn writes_one_line_per_record() {
        let mut s = Scenario::new();
        s.add_kingdom("Shu");
        s.city("Jing");
        let mut world = s.build();
        world.log(EventKind::Capture, None, None, "Shu took Jing".to_string());
        world.log(EventKind::Battle, None, None, "A skirmish".to_string());

        let dir = tempfile::tempdir().unwrap();
        flush_to_jsonl(&world, dir.path()).unwrap();

        let events = fs::read_to_string(dir.path().join("events.jsonl")).unwrap();
        let parsed: Vec<Event> = events
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].kind, EventKind::Capture);

        let cities = fs::read_to_string(dir.path().join("cities.jsonl")).unwrap();
        assert_eq!(cities.lines().count(), 2);
        let characters = fs::read_to_string(dir.path().join("characters.jsonl")).unwrap();
        assert_eq!(characters.lines().count(), 1);
    }
}
