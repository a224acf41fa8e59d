//! Opposed test outcome
//!
//! The normalized shape every host resolver produces. Alternate host field
//! names never reach this type.

use crate::core::types::{ActorId, ItemId};
use serde::{Deserialize, Serialize};

/// Which side won the opposed test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    /// Parse a host winner label (trimmed, case-insensitive)
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "attacker" => Some(Side::Attacker),
            "defender" => Some(Side::Defender),
            _ => None,
        }
    }
}

/// Handle to the defending actor and, when the host reports it, the weapon used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenderRef {
    /// `None` when the host payload carried no resolvable defender
    pub actor: Option<ActorId>,
    pub weapon: Option<ItemId>,
}

/// Result of an opposed test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestOutcome {
    winner: Side,
    defender: DefenderRef,
    damage_from_defender: u32,
    suppressed: bool,
}

impl ContestOutcome {
    pub fn new(winner: Side, defender: DefenderRef, damage_from_defender: u32) -> Self {
        Self {
            winner,
            defender,
            damage_from_defender,
            suppressed: false,
        }
    }

    pub fn winner(&self) -> Side {
        self.winner
    }

    pub fn defender(&self) -> &DefenderRef {
        &self.defender
    }

    pub fn damage_from_defender(&self) -> u32 {
        self.damage_from_defender
    }

    /// Has the defender's damage been zeroed?
    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Zero the defender's damage contribution
    pub fn suppress_defender_damage(&mut self) {
        self.damage_from_defender = 0;
        self.suppressed = true;
    }

    /// Replace the defender's damage
    ///
    /// Ignored once the damage has been suppressed: a zeroed outcome stays zeroed.
    pub fn set_defender_damage(&mut self, damage: u32) {
        if self.suppressed {
            tracing::debug!(
                actor = ?self.defender.actor,
                damage,
                "ignoring damage update on suppressed outcome"
            );
            return;
        }
        self.damage_from_defender = damage;
    }
}
