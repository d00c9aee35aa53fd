//! Re-exports the persistent store definitions for the store types.
pub use pstor::*;
