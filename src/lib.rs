//! Team Snake Server - authoritative engine for team-based multiplayer snake
//!
//! Every connected player drives an independently simulated board; players on
//! the same team share a score pool, and cross-player events are relayed as
//! preference-gated notifications.

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod notify;
pub mod social;
pub mod store;
pub mod util;
pub mod ws;

#[cfg(test)]
mod testing;
