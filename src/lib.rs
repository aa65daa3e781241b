//! Food Buddy - cache-first recipe and recommendation resolution.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `cache` - Keys, TTLs, clock, records and the in-memory (Moka) layer
//! - `database` - sled (local) and MongoDB (remote) tiers behind one `Store` trait
//! - `generation` - Gemini behind a bounded retry loop
//! - `services` - Place (Goong) and image (Unsplash) lookup
//! - `resolvers` - Recipe, search and recommendation resolvers
//! - `app` - Shared state wiring everything together
//! - `cli` - Command-line surface

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod generation;
pub mod resolvers;
pub mod services;

#[cfg(test)]
mod testing;

pub use error::{NoResultsAvailable, RecipeUnavailable, SearchUnavailable};
