//! Demo command modules exercising the dispatch core end to end: scheduled
//! events backed by the document store, and a dice roller with a greedy
//! trailing parameter.

pub mod events;
pub mod roll;

pub use {events::EventsCommand, roll::RollCommand};
