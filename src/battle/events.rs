//! Event log: the discrete before/after record of every mutation
//!
//! Presentation layers animate from these instead of reading transient
//! state out of the engine.

use serde::{Deserialize, Serialize};

use crate::battle::record::VictoryKind;
use crate::combat::resolution::AttackReport;
use crate::core::types::{Side, Turn, UnitId};
use crate::spatial::grid::GridCoord;
use crate::walls::edge::WallEdge;

/// Equipment a forge can fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Equipment {
    Weapon,
    Armor,
}

/// Log entry for one mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub turn: Turn,
    pub kind: GameEventKind,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEventKind {
    UnitMoved {
        unit: UnitId,
        from: GridCoord,
        to: GridCoord,
    },
    UnitSpawned {
        unit: UnitId,
        side: Side,
        tile: GridCoord,
        points: i32,
    },
    UnitsMerged {
        mover: UnitId,
        target: UnitId,
        survivor_points: i32,
        remainder: Option<UnitId>,
    },
    AttackResolved {
        report: AttackReport,
    },
    UnitDestroyed {
        unit: UnitId,
    },
    WallBuilt {
        edge: WallEdge,
        side: Side,
    },
    WallDamaged {
        edge: WallEdge,
        remaining: i32,
    },
    WallDestroyed {
        edge: WallEdge,
    },
    BaseStruck {
        base_owner: Side,
        damage: i32,
        remaining: i32,
    },
    TileCaptured {
        tile: GridCoord,
        side: Side,
    },
    ForgeStarted {
        tile: GridCoord,
        side: Side,
    },
    ForgeCompleted {
        tile: GridCoord,
        side: Side,
    },
    Equipped {
        unit: UnitId,
        item: Equipment,
    },
    WoodConverted {
        side: Side,
        reserve_gained: i32,
    },
    IncomeCollected {
        side: Side,
        wood: i32,
        iron: i32,
    },
    ReserveGranted {
        side: Side,
        amount: i32,
    },
    TurnEnded {
        side: Side,
    },
    GameOver {
        winner: Side,
        victory: VictoryKind,
    },
}

/// Events produced by one intent or bookkeeping pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    pub events: Vec<GameEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: GameEventKind, description: String, turn: Turn) {
        tracing::trace!(turn, %description, "event");
        self.events.push(GameEvent {
            turn,
            kind,
            description,
        });
    }

    pub fn extend(&mut self, other: EventLog) {
        self.events.extend(other.events);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Did any event of this shape happen?
    pub fn any(&self, predicate: impl Fn(&GameEventKind) -> bool) -> bool {
        self.events.iter().any(|event| predicate(&event.kind))
    }

    pub fn into_events(self) -> Vec<GameEvent> {
        self.events
    }
}
