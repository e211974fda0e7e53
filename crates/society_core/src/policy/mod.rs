//! Flat allocation and directory access rules.
//!
//! Pure decision code: no I/O, no session state. Callers pass the current
//! record set on every call and accept last-write-wins at the store.

pub mod access;
pub mod flat_registry;
