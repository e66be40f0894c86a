//! Challenge session engine.
//!
//! One generic attempt state machine (`session`) drives four mini-games through
//! small adapters (`adapters`): quiz, ordering, fill-blank and sliding-tile
//! puzzle. Each attempt has a countdown (`timer`), an answer collector
//! (`answers`), a local scorer and a submission gate (`gate`) that lets the
//! result reach the REST backend (`backend`) at most once.
//!
//! The `challenge-engine` binary hosts attempts over WebSocket (`routes`,
//! `play`): one connection, one attempt.

pub mod adapters;
pub mod answers;
pub mod backend;
pub mod config;
pub mod domain;
pub mod gate;
pub mod play;
pub mod protocol;
pub mod routes;
pub mod session;
pub mod state;
pub mod telemetry;
pub mod timer;
