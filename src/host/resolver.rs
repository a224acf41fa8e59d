//! Host resolvers
//!
//! One resolver per host API shape. The host's capabilities are probed once
//! at startup and a single resolver is chosen; the rules never inspect raw
//! host payloads themselves.

use crate::combat::{
    CapabilityRules, CapabilitySnapshot, ContestOutcome, DefenderRef, Side, WeaponRecord,
};
use crate::core::error::{Result, RiposteError};
use crate::core::types::ItemId;
use crate::host::payload::{self, first_path, path};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Translates host-native payloads into the normalized contest shapes
pub trait ContestResolver {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Normalize the opposed test, or `None` when the payload isn't one
    fn resolve_contest_outcome(&self, payload: &Value) -> Option<ContestOutcome>;

    /// Resolve the defender's capabilities
    ///
    /// Returns `MissingCapabilityData` when the defender can't be found.
    fn resolve_capability_snapshot(
        &self,
        payload: &Value,
        outcome: &ContestOutcome,
        rules: &CapabilityRules,
    ) -> Result<CapabilitySnapshot>;
}

/// Payload handed to the opposed-test hook:
/// `{ opposedTest: { result, defender, defenderTest, ... }, actor? }`
#[derive(Debug, Default, Clone, Copy)]
pub struct OpposedHookResolver;

impl OpposedHookResolver {
    const DEFENDER_ACTOR: &'static [&'static [&'static str]] = &[
        &["opposedTest", "defender", "document"],
        &["opposedTest", "defender", "actor"],
        &["actor"],
    ];

    const DEFENDER_WEAPON: &'static [&'static [&'static str]] = &[
        &["opposedTest", "defenderTest", "weapon"],
        &["opposedTest", "defender", "weapon"],
        &["opposedTest", "defenderWeapon"],
    ];

    const DEFENDER_DAMAGE: &'static [&'static [&'static str]] = &[
        &["opposedTest", "defenderTest", "result", "damage"],
        &["opposedTest", "result", "damage"],
    ];

    fn weapon(payload: &Value) -> Option<WeaponRecord> {
        first_path(payload, Self::DEFENDER_WEAPON).and_then(payload::parse_weapon)
    }
}

impl ContestResolver for OpposedHookResolver {
    fn name(&self) -> &'static str {
        "opposed-hook"
    }

    fn resolve_contest_outcome(&self, payload: &Value) -> Option<ContestOutcome> {
        let test = path(payload, &["opposedTest"])?;
        let winner = path(test, &["result", "winner"])
            .and_then(Value::as_str)
            .and_then(Side::from_label)?;

        let actor = first_path(payload, Self::DEFENDER_ACTOR).and_then(payload::actor_id);
        let weapon = Self::weapon(payload).and_then(|w| w.id);
        let damage = payload::damage(first_path(payload, Self::DEFENDER_DAMAGE));

        Some(ContestOutcome::new(
            winner,
            DefenderRef { actor, weapon },
            damage,
        ))
    }

    fn resolve_capability_snapshot(
        &self,
        payload: &Value,
        _outcome: &ContestOutcome,
        rules: &CapabilityRules,
    ) -> Result<CapabilitySnapshot> {
        let actor = first_path(payload, Self::DEFENDER_ACTOR)
            .and_then(payload::parse_actor)
            .ok_or_else(|| {
                RiposteError::MissingCapabilityData("opposed test has no defender actor".into())
            })?;
        let explicit = Self::weapon(payload);
        CapabilitySnapshot::resolve(&actor, explicit.as_ref(), rules)
    }
}

/// Opposed-test chat message carrying its result in flags:
/// `{ flags: { opposed: { winner, damage, defender, weapon } } }`
#[derive(Debug, Default, Clone, Copy)]
pub struct MessageFlagResolver;

impl MessageFlagResolver {
    fn opposed(payload: &Value) -> Option<&Value> {
        path(payload, &["flags", "opposed"])
    }
}

impl ContestResolver for MessageFlagResolver {
    fn name(&self) -> &'static str {
        "message-flags"
    }

    fn resolve_contest_outcome(&self, payload: &Value) -> Option<ContestOutcome> {
        let opposed = Self::opposed(payload)?;
        let winner = path(opposed, &["winner"])
            .and_then(Value::as_str)
            .and_then(Side::from_label)?;

        let actor = path(opposed, &["defender"]).and_then(payload::actor_id);
        let weapon = path(opposed, &["weapon"])
            .and_then(Value::as_str)
            .map(ItemId::new);
        let damage = payload::damage(path(opposed, &["damage"]));

        Some(ContestOutcome::new(
            winner,
            DefenderRef { actor, weapon },
            damage,
        ))
    }

    fn resolve_capability_snapshot(
        &self,
        payload: &Value,
        outcome: &ContestOutcome,
        rules: &CapabilityRules,
    ) -> Result<CapabilitySnapshot> {
        let actor = Self::opposed(payload)
            .and_then(|o| path(o, &["defender"]))
            .and_then(payload::parse_actor)
            .ok_or_else(|| {
                RiposteError::MissingCapabilityData("message flags have no defender actor".into())
            })?;

        let explicit = outcome.defender().weapon.as_ref().and_then(|id| {
            let found = actor.weapon(id);
            if found.is_none() {
                tracing::debug!(
                    weapon = %id.0,
                    "defending weapon not carried, choosing from inventory"
                );
            }
            found
        });
        CapabilitySnapshot::resolve(&actor, explicit, rules)
    }
}

/// What the running host exposes, probed once at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostCapabilities {
    /// Host fires a hook with the opposed test after it resolves
    pub opposed_hook: bool,
    /// Host records opposed results in chat message flags
    pub message_flags: bool,
}

/// Pick the resolver for this host, preferring the explicit hook
pub fn select_resolver(caps: HostCapabilities) -> Option<Box<dyn ContestResolver>> {
    let resolver: Box<dyn ContestResolver> = if caps.opposed_hook {
        Box::new(OpposedHookResolver)
    } else if caps.message_flags {
        Box::new(MessageFlagResolver)
    } else {
        tracing::warn!("host exposes no opposed-test results, riposte rules disabled");
        return None;
    };
    tracing::info!(resolver = resolver.name(), "selected contest resolver");
    Some(resolver)
}
