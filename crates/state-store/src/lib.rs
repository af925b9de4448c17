//! Login state correlation
//!
//! Maps the opaque `state` value of an in-flight login to the pairing token
//! the desktop client supplied when it started the flow. Only desktop logins
//! are recorded; an unknown state means a standard browser login.
//!
//! Entry lifecycle:
//! 1. `/auth/start?desktop_token=..` inserts `state -> pairing token`
//! 2. `/auth/complete?state=..` takes the entry (lookup and removal are one step)
//! 3. Entries never completed expire after the TTL; the sweeper discards them
//! 4. At capacity the oldest entry is evicted to make room

pub mod store;
pub mod sweeper;

pub use store::{CorrelationStore, DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
pub use sweeper::{DEFAULT_SWEEP_INTERVAL, spawn_sweeper};
