pub mod config;
pub mod error;
pub mod types;

pub use config::RiposteConfig;
pub use error::{Result, RiposteError};
pub use types::{ActorId, ItemId, Round};
