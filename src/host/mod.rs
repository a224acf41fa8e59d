//! Host boundary: turns host-native payloads into contest outcomes and
//! capability snapshots

pub mod payload;
pub mod resolver;

pub use resolver::{
    select_resolver, ContestResolver, HostCapabilities, MessageFlagResolver, OpposedHookResolver,
};
