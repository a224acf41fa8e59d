//! Riposte - conditional retaliation rules for opposed tests

pub mod combat;
pub mod core;
pub mod host;
pub mod rules;
