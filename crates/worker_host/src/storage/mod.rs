//! Persistent record-store contracts.

pub mod submissions;
