//! parley server.
//!
//! This crate wires the routing core to its surroundings:
//!
//! - **Listeners**: NATS subscriptions for package registration and user
//!   turns
//! - **Pipeline**: classification, context resolution, routing, dispatch and
//!   persistence of one turn
//! - **Persistence**: Postgres-backed turn history
//! - **Classifier**: NATS client for the classifier service

pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod listener;
pub mod pipeline;

#[cfg(test)]
mod testing;
