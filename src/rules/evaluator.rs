//! Retaliation policy
//!
//! Decides whether a defender who won an opposed test may still deal damage.
//! Pure: never touches the outcome or the ledger. Counting a granted
//! retaliation is the caller's job, done once, after an `Allow`.

use crate::combat::{CapabilitySnapshot, ContestOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why retaliation was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DenyReason {
    NoTalent,
    NoQualifyingWeapon,
    UsageExhausted,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DenyReason::NoTalent => "no-talent",
            DenyReason::NoQualifyingWeapon => "no-qualifying-weapon",
            DenyReason::UsageExhausted => "usage-exhausted",
        };
        f.write_str(label)
    }
}

/// Evaluation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "lowercase")]
pub enum Verdict {
    Allow { rank: u32 },
    Deny { reason: DenyReason },
}

impl Verdict {
    pub fn is_allow(&self) -> bool {
        matches!(self, Verdict::Allow { .. })
    }
}

/// Round-scoped usage so far; absent outside an encounter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageWindow {
    pub granted: u32,
    pub rank: u32,
}

/// Evaluate the retaliation rule for a contest
///
/// Only meaningful for defender-won contests; skipping the others is the
/// caller's job. Total: every input yields a verdict.
/// Check order: talent, then weapon, then usage.
pub fn evaluate(
    _outcome: &ContestOutcome,
    snapshot: &CapabilitySnapshot,
    usage: Option<UsageWindow>,
) -> Verdict {
    if snapshot.retaliation_rank == 0 {
        return Verdict::Deny {
            reason: DenyReason::NoTalent,
        };
    }

    if !snapshot.weapon_has_fast_quality {
        return Verdict::Deny {
            reason: DenyReason::NoQualifyingWeapon,
        };
    }

    match usage {
        Some(window) if window.granted >= window.rank => Verdict::Deny {
            reason: DenyReason::UsageExhausted,
        },
        _ => Verdict::Allow {
            rank: snapshot.retaliation_rank,
        },
    }
}
