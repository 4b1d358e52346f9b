//! Versioned full-world snapshots.
//!
//! Version 0 files are a bare `World` object from before snapshots carried a
//! header; they load with the default config and seed 0.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::error::SnapshotError;
use crate::model::World;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub seed: u64,
    #[serde(default)]
    pub config: SimConfig,
    pub world: World,
}

impl Snapshot {
    pub fn capture(world: &World, config: &SimConfig, seed: u64) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            seed,
            config: config.clone(),
            world: world.clone(),
        }
    }

    /// Parse and migrate a snapshot document, then check its references.
    pub fn from_json_str(json: &str) -> Result<Self, SnapshotError> {
        let value: Value = serde_json::from_str(json)?;
        let version = match value.get("version") {
            Some(v) => v
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| SnapshotError::Invalid(format!("bad version field {v}")))?,
            None => 0,
        };
        let snapshot = match version {
            0 => {
                debug!("migrating headerless snapshot");
                Self {
                    version: SNAPSHOT_VERSION,
                    seed: 0,
                    config: SimConfig::default(),
                    world: serde_json::from_value(value)?,
                }
            }
            SNAPSHOT_VERSION => serde_json::from_value(value)?,
            found => {
                return Err(SnapshotError::UnsupportedVersion {
                    found,
                    supported: SNAPSHOT_VERSION,
                });
            }
        };
        validate(&snapshot.world)?;
        Ok(snapshot)
    }
}

pub fn save(snapshot: &Snapshot, path: &Path) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    info!(path = %path.display(), tick = snapshot.world.tick, "snapshot saved");
    Ok(())
}

pub fn load(path: &Path) -> Result<Snapshot, SnapshotError> {
    let json = fs::read_to_string(path)?;
    let snapshot = Snapshot::from_json_str(&json)?;
    info!(path = %path.display(), tick = snapshot.world.tick, "snapshot loaded");
    Ok(snapshot)
}

/// Membership and ownership must point at living characters, and no
/// character may serve two factions.
pub fn validate(world: &World) -> Result<(), SnapshotError> {
    let mut serving: BTreeMap<u64, u64> = BTreeMap::new();
    for faction in world.factions.values() {
        for &member in &faction.members {
            if !world.is_alive(member) {
                return Err(SnapshotError::Invalid(format!(
                    "faction {} lists missing member {member}",
                    faction.id
                )));
            }
            if let Some(other) = serving.insert(member, faction.id) {
                return Err(SnapshotError::Invalid(format!(
                    "character {member} belongs to factions {other} and {}",
                    faction.id
                )));
            }
        }
    }
    for city in world.cities.values() {
        if let Some(owner) = city.owner.filter(|&o| !world.is_alive(o)) {
            return Err(SnapshotError::Invalid(format!(
                "city {} is owned by missing character {owner}",
                city.id
            )));
        }
    }
    if let Some(player) = world.player_faction.filter(|p| !world.factions.contains_key(p)) {
        return Err(SnapshotError::Invalid(format!(
            "player faction {player} does not exist"
        )));
    }
    Ok(())
}
