//! # Referee Link Library
//!
//! Serial link between a competition referee system and an onboard robot
//! controller.
//!
//! This library recovers framed, checksummed telemetry from a noisy serial
//! stream, publishes it as typed state for independent control subsystems,
//! and composes outbound operator-display packets under the protocol's
//! batching and refresh cadence rules.

pub mod config;
pub mod error;
pub mod link;
pub mod referee;
pub mod serial;
pub mod telemetry;
pub mod ui;
