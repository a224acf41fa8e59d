//! Riposte rules: the retaliation policy, its round-scoped usage ledger,
//! and the handler that applies both to one contest at a time

pub mod evaluator;
pub mod handler;
pub mod ledger;

pub use evaluator::{evaluate, DenyReason, UsageWindow, Verdict};
pub use handler::{HandlerOutcome, PersistedUsage, RiposteHandler, SkipReason};
pub use ledger::{RoundUsageLedger, UsageFlag};
