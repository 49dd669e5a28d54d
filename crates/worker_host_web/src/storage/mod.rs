//! Persistent record-store adapters.

pub mod indexed_db;
