//! Round-scoped usage ledger
//!
//! Counts granted retaliations per actor for the current round only. Any
//! observed round that differs from the synchronized one wipes every count
//! before the read or write happens. Outside an encounter (no round) the
//! ledger is bypassed and usage is unlimited.

use crate::core::error::RiposteError;
use crate::core::types::{ActorId, Round};
use crate::rules::evaluator::UsageWindow;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-actor usage as the host persists it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageFlag {
    pub round: Option<Round>,
    pub count: u32,
}

#[derive(Debug, Default)]
pub struct RoundUsageLedger {
    current_round: Option<Round>,
    usage_by_actor: AHashMap<ActorId, u32>,
}

impl RoundUsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_round(&self) -> Option<Round> {
        self.current_round
    }

    /// Adopt `round`, clearing all usage if it changed. Idempotent within a round.
    pub fn sync(&mut self, round: Option<Round>) {
        if round != self.current_round {
            if !self.usage_by_actor.is_empty() {
                tracing::debug!(
                    from = ?self.current_round,
                    to = ?round,
                    cleared = self.usage_by_actor.len(),
                    "round changed, clearing riposte usage"
                );
            }
            self.usage_by_actor.clear();
            self.current_round = round;
        }
    }

    /// Retaliations granted to `actor` in `round`
    pub fn used(&mut self, actor: &ActorId, round: Option<Round>) -> u32 {
        self.sync(round);
        self.usage_by_actor.get(actor).copied().unwrap_or(0)
    }

    /// Record one granted retaliation. No-op outside an encounter.
    pub fn grant(&mut self, actor: &ActorId, round: Option<Round>) {
        self.sync(round);
        if self.current_round.is_none() {
            return;
        }
        let count = self.usage_by_actor.entry(actor.clone()).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Usage window for the evaluator, or `None` when no round applies
    pub fn usage_window(
        &mut self,
        actor: &ActorId,
        round: Option<Round>,
        rank: u32,
    ) -> Option<UsageWindow> {
        let granted = self.used(actor, round);
        self.current_round.map(|_| UsageWindow { granted, rank })
    }

    /// Export `actor`'s usage for persistence by the host
    pub fn usage_flag(&self, actor: &ActorId) -> Option<UsageFlag> {
        self.current_round.map(|round| UsageFlag {
            round: Some(round),
            count: self.usage_by_actor.get(actor).copied().unwrap_or(0),
        })
    }

    /// Import a flag previously written by the host; returns the resulting usage
    ///
    /// Flags for another round are stale and ignored. A flag that can't be read
    /// counts as zero usage.
    pub fn restore_flag(&mut self, actor: &ActorId, flag: &Value) -> u32 {
        let Some(current) = self.current_round else {
            return 0;
        };

        match parse_flag(flag) {
            Ok(None) => {}
            Ok(Some(stored)) if stored.round != Some(current) => {
                tracing::debug!(
                    %actor,
                    stored = ?stored.round,
                    current,
                    "ignoring stale usage flag"
                );
            }
            Ok(Some(stored)) => {
                self.usage_by_actor.insert(actor.clone(), stored.count);
            }
            Err(e) => {
                tracing::warn!(%actor, "{}, treating as zero usage", e);
                self.usage_by_actor.remove(actor);
            }
        }

        self.usage_by_actor.get(actor).copied().unwrap_or(0)
    }
}

fn parse_flag(flag: &Value) -> Result<Option<UsageFlag>, RiposteError> {
    let obj = match flag {
        Value::Null => return Ok(None),
        Value::Object(obj) => obj,
        other => {
            return Err(RiposteError::UsageStateCorrupt(format!(
                "expected object, got {}",
                other
            )))
        }
    };

    let round = match obj.get("round") {
        None | Some(Value::Null) => None,
        Some(v) => Some(
            v.as_u64()
                .and_then(|r| Round::try_from(r).ok())
                .ok_or_else(|| RiposteError::UsageStateCorrupt(format!("bad round {}", v)))?,
        ),
    };

    let count = match obj.get("count") {
        None | Some(Value::Null) => 0,
        Some(v) => v
            .as_u64()
            .and_then(|c| u32::try_from(c).ok())
            .ok_or_else(|| RiposteError::UsageStateCorrupt(format!("bad count {}", v)))?,
    };

    Ok(Some(UsageFlag { round, count }))
}
