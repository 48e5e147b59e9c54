//! History module for tinystatus.
//!
//! Keeps a bounded, newest-first series of up/down samples per service in a
//! JSON file.

mod models;
mod store;

pub use models::*;
pub use store::*;
