pub mod capability;
pub mod contest;

pub use capability::{
    AliasMatcher, ActorRecord, CapabilityRules, CapabilitySnapshot, TalentRecord, WeaponRecord,
};
pub use contest::{ContestOutcome, DefenderRef, Side};
