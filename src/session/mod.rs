//! Background music session.
//!
//! This module contains the session manager and its mute observers:
//! - `manager`: `AudioSession`, the single owner of the music player
//! - `listeners`: mute-state subscriptions for UI indicators
//!
//! # Lifecycle
//!
//! ```text
//!          start               load ok
//! Stopped ───────▶ Loading ─────────────▶ Playing ──pause──▶ Paused
//!    ▲              ▲    │                  │   ▲              │
//!    │              │    │ load/play fails  │   └────resume────┘
//!    │              │    ▼                  │
//!    │              └─ retry (2s) ◀─────────┘ stall (health check)
//!    │
//!    └──────── stop (from any state)
//! ```

pub mod listeners;
pub mod manager;

pub use listeners::{MuteListener, MuteSubscription};
pub use manager::AudioSession;
