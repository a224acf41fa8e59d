//! Defender capability snapshot
//!
//! Built fresh for every evaluation from the defender's talents and weapons.
//! Never persisted.

use crate::core::config::RiposteConfig;
use crate::core::error::{Result, RiposteError};
use crate::core::types::{ActorId, ItemId};
use serde::{Deserialize, Serialize};

/// Normalized alias set (trimmed, lowercase, blanks dropped)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMatcher {
    aliases: Vec<String>,
}

impl AliasMatcher {
    pub fn new<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = aliases
            .into_iter()
            .map(|a| normalize(a.as_ref()))
            .filter(|a| !a.is_empty())
            .collect();
        normalized.sort();
        normalized.dedup();
        Self { aliases: normalized }
    }

    /// Does `name` match any alias? An empty matcher never matches.
    pub fn matches(&self, name: &str) -> bool {
        let name = normalize(name);
        !name.is_empty() && self.aliases.iter().any(|a| *a == name)
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Talent and quality matchers derived from config
#[derive(Debug, Clone, Default)]
pub struct CapabilityRules {
    pub talents: AliasMatcher,
    pub qualities: AliasMatcher,
}

impl CapabilityRules {
    pub fn from_config(config: &RiposteConfig) -> Self {
        Self {
            talents: AliasMatcher::new(&config.talent_aliases),
            qualities: AliasMatcher::new(&config.quality_aliases),
        }
    }
}

/// A talent held by an actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalentRecord {
    pub name: String,
    /// Advances taken; `None` when the host doesn't record any
    pub advances: Option<i64>,
}

/// A weapon available to an actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponRecord {
    pub id: Option<ItemId>,
    pub name: String,
    pub qualities: Vec<String>,
}

impl WeaponRecord {
    pub fn has_quality(&self, matcher: &AliasMatcher) -> bool {
        self.qualities.iter().any(|q| matcher.matches(q))
    }
}

/// The defender as the host reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRecord {
    pub id: ActorId,
    pub talents: Vec<TalentRecord>,
    pub weapons: Vec<WeaponRecord>,
}

impl ActorRecord {
    pub fn weapon(&self, id: &ItemId) -> Option<&WeaponRecord> {
        self.weapons.iter().find(|w| w.id.as_ref() == Some(id))
    }
}

/// Defender's relevant state at evaluation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CapabilitySnapshot {
    /// 0 = no qualifying talent held, otherwise the highest qualifying rank
    pub retaliation_rank: u32,
    pub weapon_has_fast_quality: bool,
}

impl CapabilitySnapshot {
    /// Resolve a snapshot for `actor`, defending with `explicit` if the host named a weapon
    pub fn resolve(
        actor: &ActorRecord,
        explicit: Option<&WeaponRecord>,
        rules: &CapabilityRules,
    ) -> Result<Self> {
        let retaliation_rank = retaliation_rank(actor, &rules.talents)?;
        let weapon_has_fast_quality = select_weapon(explicit, &actor.weapons, &rules.qualities)
            .is_some_and(|w| w.has_quality(&rules.qualities));

        Ok(Self {
            retaliation_rank,
            weapon_has_fast_quality,
        })
    }
}

/// Highest rank among the actor's qualifying talents
///
/// A held talent is always at least rank 1, even with no recorded advances.
/// Negative advances are a data defect upstream and are reported, not coerced.
pub fn retaliation_rank(actor: &ActorRecord, talents: &AliasMatcher) -> Result<u32> {
    let mut best = 0;
    for talent in actor.talents.iter().filter(|t| talents.matches(&t.name)) {
        let rank = match talent.advances {
            Some(value) if value < 0 => {
                return Err(RiposteError::InvalidRank {
                    actor: actor.id.to_string(),
                    value,
                })
            }
            Some(value) => u32::try_from(value).unwrap_or(u32::MAX).max(1),
            None => 1,
        };
        best = best.max(rank);
    }
    Ok(best)
}

/// Pick the weapon the defender fought with
///
/// An explicit weapon always wins. Otherwise prefer one carrying the quality,
/// then any weapon at all.
pub fn select_weapon<'a>(
    explicit: Option<&'a WeaponRecord>,
    weapons: &'a [WeaponRecord],
    qualities: &AliasMatcher,
) -> Option<&'a WeaponRecord> {
    explicit
        .or_else(|| weapons.iter().find(|w| w.has_quality(qualities)))
        .or_else(|| weapons.first())
}
