//! Transfer and action engine for a cloud-drive client.
//!
//! The engine runs downloads through a bounded pool, uploads through a
//! sequential queue and every other drive operation through single-flight
//! guarded actions. All results reach display layers as [`events::Event`]s.

pub mod actions;
pub mod backend;
pub mod config;
pub mod control;
pub mod events;
pub mod failure;
pub mod guard;
pub mod jobs;
pub mod logging;
pub mod progress;
pub mod scheduler;
pub mod update;
pub mod url_model;
