//! Player-issued commands.
//!
//! External code queues `Command`s on the world; the command pass drains
//! them at the start of each tick. Each variant carries only the fields it
//! needs, and a command that fails validation is dropped whole.

use serde::{Deserialize, Serialize};

use super::character::{Role, Skill};
use super::city::{District, Improvement, UnitType};
use super::faction::Tech;
use super::movement::MissionKind;
use super::tactic::Tactic;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Attack {
        character: u64,
        city: u64,
        #[serde(default)]
        tactic: Option<Tactic>,
    },
    Move {
        character: u64,
        city: u64,
    },
    Recruit {
        city: u64,
        unit: UnitType,
        amount: u32,
    },
    Hire {
        city: u64,
        character: u64,
    },
    BuildDistrict {
        city: u64,
        district: District,
    },
    Improve {
        city: u64,
        improvement: Improvement,
    },
    Develop {
        city: u64,
    },
    Research {
        city: u64,
        tech: Tech,
    },
    Spy {
        character: u64,
        city: u64,
        mission: MissionKind,
    },
    ProposeAlliance {
        faction: u64,
    },
    BreakAlliance {
        faction: u64,
    },
    DemandTribute {
        faction: u64,
        amount: u32,
    },
    AcceptCeasefire {
        faction: u64,
    },
    SetRole {
        character: u64,
        role: Option<Role>,
    },
    Mentor {
        mentor: u64,
        student: u64,
        skill: Skill,
    },
    ResolveEventCard {
        choice: usize,
    },
}

impl Command {
    pub fn label(&self) -> &'static str {
        match self {
            Command::Attack { .. } => "attack",
            Command::Move { .. } => "move",
            Command::Recruit { .. } => "recruit",
            Command::Hire { .. } => "hire",
            Command::BuildDistrict { .. } => "build_district",
            Command::Improve { .. } => "improve",
            Command::Develop { .. } => "develop",
            Command::Research { .. } => "research",
            Command::Spy { .. } => "spy",
            Command::ProposeAlliance { .. } => "propose_alliance",
            Command::BreakAlliance { .. } => "break_alliance",
            Command::DemandTribute { .. } => "demand_tribute",
            Command::AcceptCeasefire { .. } => "accept_ceasefire",
            Command::SetRole { .. } => "set_role",
            Command::Mentor { .. } => "mentor",
            Command::ResolveEventCard { .. } => "resolve_event_card",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_json_shape() {
        let cmd = Command::Attack {
            character: 4,
            city: 9,
            tactic: Some(Tactic::Aggressive),
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "attack");
        assert_eq!(json["tactic"], "aggressive");
    }

    #[test]
    fn optional_tactic_may_be_omitted() {
        let cmd: Command =
            serde_json::from_str(r#"{"type": "attack", "character": 1, "city": 2}"#).unwrap();
        assert_eq!(
            cmd,
            Command::Attack {
                character: 1,
                city: 2,
                tactic: None
            }
        );
    }

    #[test]
    fn unknown_command_type_is_rejected() {
        assert!(serde_json::from_str::<Command>(r#"{"type": "teleport"}"#).is_err());
    }
}
