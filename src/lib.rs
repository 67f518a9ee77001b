//! MTG Sim - a two-player trading card game rules engine
//!
//! A single-writer engine that owns each game's state outright, asks its
//! players for every decision through an async controller interface, and
//! plays out bot-vs-bot games in bulk for statistics.

pub mod cards;
pub mod core;
pub mod decks;
pub mod error;
pub mod game;
pub mod simulation;
pub mod zones;

pub use error::{MtgError, Result};
