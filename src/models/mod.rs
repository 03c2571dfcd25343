//! Core data models for the meta engine.

mod battle;
mod card;
mod deck;
mod ids;
mod scope;
mod snapshot;

pub use battle::*;
pub use card::*;
pub use deck::*;
pub use ids::*;
pub use scope::*;
pub use snapshot::*;
