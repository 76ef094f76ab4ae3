//! POINTWATCH: periodic wallet points tracker
//!
//! Library half of the tracker; `main.rs` wires these modules into the
//! polling loop and `tests/integration` drives them end to end.

pub mod config;
pub mod types;
pub mod signing;
pub mod source;
pub mod notify;
pub mod engine;
pub mod storage;
