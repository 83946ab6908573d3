//! Support query routing core: classify a customer query, retrieve grounding FAQ
//! entries from a vector index, and synthesize a validated answer.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod telemetry;
