//! Skirmish decision engine
//!
//! Per-turn tactical controller for three friendly units on a fixed
//! battlefield. The [`game::engine::Engine`] owns all cross-turn state and
//! turns one [`game::state::TurnInput`] into one action per unit; the
//! [`protocol`] module adapts it to the line-oriented referee protocol.

pub mod config;
pub mod game;
pub mod protocol;
pub mod util;
