//! Reading host documents out of loosely structured JSON
//!
//! Host versions disagree on where fields live (`system` vs `data.data`,
//! `advances.value` vs `advances`, quality lists as arrays or maps). Every
//! such alternative is handled here so nothing downstream sees them.

use crate::combat::{ActorRecord, TalentRecord, WeaponRecord};
use crate::core::types::{ActorId, ItemId};
use serde_json::Value;

/// Follow `keys` into `value`; nulls count as absent
pub fn path<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in keys {
        current = current.get(key)?;
    }
    (!current.is_null()).then_some(current)
}

/// First present value among several candidate paths
pub fn first_path<'a>(value: &'a Value, paths: &[&[&str]]) -> Option<&'a Value> {
    paths.iter().find_map(|p| path(value, p))
}

/// Read a number that may arrive as a JSON number or a numeric string
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Non-negative damage amount; absent or unreadable damage is zero
///
/// Fractions round up so any positive damage stays positive.
pub fn damage(value: Option<&Value>) -> u32 {
    value
        .and_then(|v| as_number(v).or_else(|| v.get("value").and_then(as_number)))
        .filter(|d| d.is_finite() && *d > 0.0)
        .map(|d| d.ceil().min(u32::MAX as f64) as u32)
        .unwrap_or(0)
}

fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| value.get(k).and_then(Value::as_str))
        .map(str::to_string)
}

/// The item's system data (`system` on current hosts, `data.data` on older ones)
fn item_system(item: &Value) -> Option<&Value> {
    first_path(item, &[&["system"], &["data", "data"]])
}

fn item_type(item: &Value) -> Option<String> {
    string_field(item, &["type"]).map(|t| t.trim().to_lowercase())
}

/// Identifier of an actor document
pub fn actor_id(actor: &Value) -> Option<ActorId> {
    string_field(actor, &["id", "_id"]).map(ActorId)
}

/// Parse an actor document with its embedded items
pub fn parse_actor(actor: &Value) -> Option<ActorRecord> {
    let id = actor_id(actor)?;
    let items = actor.get("items").and_then(Value::as_array);

    let mut talents = Vec::new();
    let mut weapons = Vec::new();
    for item in items.into_iter().flatten() {
        match item_type(item).as_deref() {
            Some("talent") => talents.extend(parse_talent(item)),
            Some("weapon") => weapons.extend(parse_weapon(item)),
            _ => {}
        }
    }

    Some(ActorRecord {
        id,
        talents,
        weapons,
    })
}

fn parse_talent(item: &Value) -> Option<TalentRecord> {
    let name = string_field(item, &["name"])?;
    let advances = item_system(item)
        .and_then(|sys| first_path(sys, &[&["advances", "value"], &["advances"], &["level"]]))
        .and_then(as_number)
        .map(|n| n.trunc() as i64);

    Some(TalentRecord { name, advances })
}

/// Parse a weapon document
pub fn parse_weapon(item: &Value) -> Option<WeaponRecord> {
    if !item.is_object() {
        return None;
    }

    let raw = item_system(item)
        .and_then(|sys| first_path(sys, &[&["qualities", "value"], &["qualities"]]));
    let entries: Vec<&Value> = match raw {
        Some(Value::Array(list)) => list.iter().collect(),
        Some(Value::Object(map)) => map.values().collect(),
        _ => Vec::new(),
    };
    let qualities = entries
        .into_iter()
        .filter_map(|q| match q {
            Value::String(s) => Some(s.clone()),
            other => string_field(other, &["name", "key"]),
        })
        .collect();

    Some(WeaponRecord {
        id: string_field(item, &["id", "_id"]).map(ItemId),
        name: string_field(item, &["name"]).unwrap_or_default(),
        qualities,
    })
}
