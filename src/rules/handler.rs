//! Per-contest riposte handling
//!
//! Runs one opposed-test outcome start to finish: observe round, sync the
//! ledger, read usage, evaluate, grant if allowed, then apply the verdict to
//! the outcome. `handle` takes `&mut self`, so two outcomes can never
//! interleave their ledger read and write.

use crate::combat::{CapabilityRules, CapabilitySnapshot, ContestOutcome, Side};
use crate::core::config::RiposteConfig;
use crate::core::error::{Result, RiposteError};
use crate::core::types::{ActorId, Round};
use crate::host::payload::path;
use crate::host::resolver::ContestResolver;
use crate::rules::evaluator::{evaluate, DenyReason, Verdict};
use crate::rules::ledger::{RoundUsageLedger, UsageFlag};
use serde::Serialize;
use serde_json::Value;

/// Why a payload was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Payload isn't an opposed test this resolver understands
    Unresolved,
    AttackerWon,
    /// Defender deals no damage
    NothingToSuppress,
}

/// What happened to one contest
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum HandlerOutcome {
    Skipped {
        reason: SkipReason,
    },
    /// Defender damage zeroed
    Suppressed {
        outcome: ContestOutcome,
        reason: DenyReason,
    },
    /// Defender keeps its damage
    Retaliated {
        outcome: ContestOutcome,
        effect: String,
        rank: u32,
        /// Usage this round after the grant; `None` outside an encounter
        used: Option<u32>,
    },
}

/// Usage flag addressed by the scope and key the host stores it under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PersistedUsage<'a> {
    pub scope: &'a str,
    pub key: &'a str,
    pub flag: UsageFlag,
}

pub struct RiposteHandler {
    rules: CapabilityRules,
    effect_name: String,
    flag_scope: String,
    flag_key: String,
    ledger: RoundUsageLedger,
    resolver: Box<dyn ContestResolver>,
}

impl RiposteHandler {
    pub fn new(config: &RiposteConfig, resolver: Box<dyn ContestResolver>) -> Self {
        if let Err(e) = config.validate() {
            tracing::warn!("{}", e);
        }
        Self {
            rules: CapabilityRules::from_config(config),
            effect_name: config.effect_name.clone(),
            flag_scope: config.flag_scope.clone(),
            flag_key: config.flag_key.clone(),
            ledger: RoundUsageLedger::new(),
            resolver,
        }
    }

    pub fn ledger(&self) -> &RoundUsageLedger {
        &self.ledger
    }

    /// Mutable ledger access, e.g. to restore usage the host persisted
    pub fn ledger_mut(&mut self) -> &mut RoundUsageLedger {
        &mut self.ledger
    }

    /// `actor`'s usage for the host to persist; `None` outside an encounter
    pub fn persisted_flag(&self, actor: &ActorId) -> Option<PersistedUsage<'_>> {
        self.ledger.usage_flag(actor).map(|flag| PersistedUsage {
            scope: &self.flag_scope,
            key: &self.flag_key,
            flag,
        })
    }

    /// Restore `actor`'s usage from the host's flag document for that actor
    ///
    /// `flags` is the actor's whole flag object; only the configured scope and
    /// key are read. Returns the usage now recorded for `round`.
    pub fn restore_persisted(
        &mut self,
        actor: &ActorId,
        round: Option<Round>,
        flags: &Value,
    ) -> u32 {
        self.ledger.sync(round);
        match path(flags, &[&self.flag_scope, &self.flag_key]) {
            Some(flag) => self.ledger.restore_flag(actor, flag),
            None => self.ledger.used(actor, round),
        }
    }

    /// Handle one host payload observed during `round` (`None` outside an encounter)
    ///
    /// Only upstream data defects (e.g. a negative talent rank) are returned
    /// as errors; a defender that can't be resolved is simply denied.
    pub fn handle(&mut self, payload: &Value, round: Option<Round>) -> Result<HandlerOutcome> {
        self.ledger.sync(round);

        let Some(mut outcome) = self.resolver.resolve_contest_outcome(payload) else {
            return Ok(HandlerOutcome::Skipped {
                reason: SkipReason::Unresolved,
            });
        };
        if outcome.winner() != Side::Defender {
            return Ok(HandlerOutcome::Skipped {
                reason: SkipReason::AttackerWon,
            });
        }
        if outcome.damage_from_defender() == 0 {
            return Ok(HandlerOutcome::Skipped {
                reason: SkipReason::NothingToSuppress,
            });
        }

        let mut snapshot = match self
            .resolver
            .resolve_capability_snapshot(payload, &outcome, &self.rules)
        {
            Ok(snapshot) => snapshot,
            Err(e @ RiposteError::MissingCapabilityData(_)) => {
                tracing::warn!("{}, denying riposte", e);
                CapabilitySnapshot::default()
            }
            Err(e) => return Err(e),
        };

        let actor = outcome.defender().actor.clone();
        if actor.is_none() && snapshot != CapabilitySnapshot::default() {
            tracing::warn!("capabilities resolved without a defender actor, denying riposte");
            snapshot = CapabilitySnapshot::default();
        }
        let usage = actor
            .as_ref()
            .and_then(|a| self.ledger.usage_window(a, round, snapshot.retaliation_rank));

        let verdict = evaluate(&outcome, &snapshot, usage);
        tracing::debug!(
            actor = ?actor,
            ?round,
            ?snapshot,
            ?usage,
            ?verdict,
            "riposte evaluated"
        );

        match verdict {
            Verdict::Allow { rank } => {
                let used = match (&actor, round) {
                    (Some(a), Some(_)) => {
                        self.ledger.grant(a, round);
                        Some(self.ledger.used(a, round))
                    }
                    _ => None,
                };
                tracing::info!(
                    actor = ?actor,
                    rank,
                    ?used,
                    effect = %self.effect_name,
                    "riposte granted"
                );
                Ok(HandlerOutcome::Retaliated {
                    outcome,
                    effect: self.effect_name.clone(),
                    rank,
                    used,
                })
            }
            Verdict::Deny { reason } => {
                outcome.suppress_defender_damage();
                Ok(HandlerOutcome::Suppressed { outcome, reason })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::DefenderRef;
    use crate::host::resolver::OpposedHookResolver;
    use serde_json::json;

    /// Resolver that knows the defender's capabilities but not who they are
    struct AnonymousDefender;

    impl ContestResolver for AnonymousDefender {
        fn name(&self) -> &'static str {
            "anonymous"
        }

        fn resolve_contest_outcome(&self, _payload: &Value) -> Option<ContestOutcome> {
            Some(ContestOutcome::new(
                Side::Defender,
                DefenderRef {
                    actor: None,
                    weapon: None,
                },
                4,
            ))
        }

        fn resolve_capability_snapshot(
            &self,
            _payload: &Value,
            _outcome: &ContestOutcome,
            _rules: &CapabilityRules,
        ) -> Result<CapabilitySnapshot> {
            Ok(CapabilitySnapshot {
                retaliation_rank: 2,
                weapon_has_fast_quality: true,
            })
        }
    }

    fn handler() -> RiposteHandler {
        RiposteHandler::new(&RiposteConfig::default(), Box::new(OpposedHookResolver))
    }

    fn payload(winner: &str, damage: u32, rank: i64, quality: &str) -> Value {
        json!({
            "opposedTest": {
                "result": {"winner": winner},
                "defender": {"document": {
                    "id": "d1",
                    "items": [
                        {"type": "talent", "name": "Riposte", "system": {"advances": {"value": rank}}}
                    ]
                }},
                "defenderTest": {
                    "weapon": {"id": "w", "name": "Blade",
                               "system": {"qualities": {"value": [{"name": quality}]}}},
                    "result": {"damage": damage}
                }
            }
        })
    }

    #[test]
    fn test_attacker_win_skipped() {
        let mut h = handler();
        let result = h.handle(&payload("attacker", 5, 1, "Fast"), Some(1)).unwrap();
        assert_eq!(
            result,
            HandlerOutcome::Skipped {
                reason: SkipReason::AttackerWon
            }
        );
    }

    #[test]
    fn test_zero_damage_skipped_without_usage() {
        let mut h = handler();
        let result = h.handle(&payload("defender", 0, 1, "Fast"), Some(1)).unwrap();
        assert_eq!(
            result,
            HandlerOutcome::Skipped {
                reason: SkipReason::NothingToSuppress
            }
        );
        assert_eq!(h.ledger_mut().used(&ActorId::new("d1"), Some(1)), 0);
    }

    #[test]
    fn test_unresolved_payload_skipped() {
        let mut h = handler();
        let result = h.handle(&json!({"message": "hello"}), None).unwrap();
        assert_eq!(
            result,
            HandlerOutcome::Skipped {
                reason: SkipReason::Unresolved
            }
        );
    }

    #[test]
    fn test_slow_weapon_suppresses_damage() {
        let mut h = handler();
        match h.handle(&payload("defender", 5, 1, "Slow"), Some(1)).unwrap() {
            HandlerOutcome::Suppressed { outcome, reason } => {
                assert_eq!(reason, DenyReason::NoQualifyingWeapon);
                assert_eq!(outcome.damage_from_defender(), 0);
                assert!(outcome.is_suppressed());
            }
            other => panic!("expected suppression, got {:?}", other),
        }
    }

    #[test]
    fn test_grant_then_exhaust() {
        let mut h = handler();
        let first = h.handle(&payload("defender", 5, 1, "Fast"), Some(3)).unwrap();
        match first {
            HandlerOutcome::Retaliated { outcome, rank, used, effect } => {
                assert_eq!(rank, 1);
                assert_eq!(used, Some(1));
                assert_eq!(effect, "Riposte");
                assert_eq!(outcome.damage_from_defender(), 5);
            }
            other => panic!("expected riposte, got {:?}", other),
        }

        let second = h.handle(&payload("defender", 5, 1, "Fast"), Some(3)).unwrap();
        assert!(matches!(
            second,
            HandlerOutcome::Suppressed {
                reason: DenyReason::UsageExhausted,
                ..
            }
        ));
        assert_eq!(h.ledger_mut().used(&ActorId::new("d1"), Some(3)), 1);
    }

    #[test]
    fn test_missing_defender_fails_closed() {
        let mut h = handler();
        let p = json!({
            "opposedTest": {
                "result": {"winner": "defender", "damage": 6}
            }
        });
        match h.handle(&p, Some(1)).unwrap() {
            HandlerOutcome::Suppressed { outcome, reason } => {
                assert_eq!(reason, DenyReason::NoTalent);
                assert_eq!(outcome.damage_from_defender(), 0);
            }
            other => panic!("expected suppression, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_rank_is_reported() {
        let mut h = handler();
        let err = h.handle(&payload("defender", 5, -1, "Fast"), Some(1)).unwrap_err();
        assert!(matches!(err, RiposteError::InvalidRank { value: -1, .. }));
    }

    #[test]
    fn test_restored_usage_counts_toward_cap() {
        let mut h = handler();
        h.ledger_mut().sync(Some(2));
        h.ledger_mut()
            .restore_flag(&ActorId::new("d1"), &json!({"round": 2, "count": 1}));
        let result = h.handle(&payload("defender", 5, 1, "Fast"), Some(2)).unwrap();
        assert!(matches!(
            result,
            HandlerOutcome::Suppressed {
                reason: DenyReason::UsageExhausted,
                ..
            }
        ));
    }

    #[test]
    fn test_outcome_json_shape() {
        let mut h = handler();
        let result = h.handle(&payload("defender", 5, 2, "Fast"), None).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "retaliated");
        assert_eq!(json["rank"], 2);
        assert!(json["used"].is_null());
    }

    #[test]
    fn test_unknown_defender_denied_in_encounter() {
        let mut h = RiposteHandler::new(&RiposteConfig::default(), Box::new(AnonymousDefender));
        for _ in 0..3 {
            match h.handle(&json!({}), Some(1)).unwrap() {
                HandlerOutcome::Suppressed { outcome, reason } => {
                    assert_eq!(reason, DenyReason::NoTalent);
                    assert_eq!(outcome.damage_from_defender(), 0);
                }
                other => panic!("expected suppression, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_persisted_flag_uses_configured_scope_and_key() {
        let config = RiposteConfig {
            flag_scope: "house-rules".to_string(),
            flag_key: "ripostes".to_string(),
            ..RiposteConfig::default()
        };
        let mut h = RiposteHandler::new(&config, Box::new(OpposedHookResolver));
        let actor = ActorId::new("d1");

        assert!(h.persisted_flag(&actor).is_none());
        h.handle(&payload("defender", 5, 2, "Fast"), Some(4)).unwrap();

        let persisted = h.persisted_flag(&actor).unwrap();
        assert_eq!(persisted.scope, "house-rules");
        assert_eq!(persisted.key, "ripostes");
        assert_eq!(
            persisted.flag,
            UsageFlag {
                round: Some(4),
                count: 1
            }
        );
    }

    #[test]
    fn test_restore_persisted_reads_configured_scope_and_key() {
        let config = RiposteConfig {
            flag_scope: "house-rules".to_string(),
            flag_key: "ripostes".to_string(),
            ..RiposteConfig::default()
        };
        let mut h = RiposteHandler::new(&config, Box::new(OpposedHookResolver));
        let actor = ActorId::new("d1");

        let default_location = json!({"wfrp4e-riposte": {"uses": {"round": 2, "count": 1}}});
        assert_eq!(h.restore_persisted(&actor, Some(2), &default_location), 0);

        let configured = json!({"house-rules": {"ripostes": {"round": 2, "count": 1}}});
        assert_eq!(h.restore_persisted(&actor, Some(2), &configured), 1);

        let result = h.handle(&payload("defender", 5, 1, "Fast"), Some(2)).unwrap();
        assert!(matches!(
            result,
            HandlerOutcome::Suppressed {
                reason: DenyReason::UsageExhausted,
                ..
            }
        ));
    }

    #[test]
    fn test_fractional_damage_still_handled() {
        let mut h = handler();
        let mut p = payload("defender", 0, 1, "Slow");
        p["opposedTest"]["defenderTest"]["result"]["damage"] = json!(0.5);
        assert!(matches!(
            h.handle(&p, Some(1)).unwrap(),
            HandlerOutcome::Suppressed {
                reason: DenyReason::NoQualifyingWeapon,
                ..
            }
        ));
    }
}
