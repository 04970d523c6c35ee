use super::{RoomName, SlotKind};
use serde::{Deserialize, Serialize};

/// A physical room, hosting either theory or lab sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub name: RoomName,
    pub kind: SlotKind,
    #[serde(default = "default_capacity")]
    pub capacity: u32,
}

fn default_capacity() -> u32 {
    30
}
