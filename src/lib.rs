//! Event creation on third-party platforms through a remote browser-automation
//! gateway, with per-state retry, heuristic verification and social promotion.

pub mod adapters;
pub mod backoff;
pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod gateway;
pub mod heuristics;
pub mod report;
pub mod sanitize;
pub mod social;
pub mod state_machine;
pub mod ui;
pub mod workflow;

pub use error::EventPilotError;
