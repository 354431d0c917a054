//! In-process adapters that live inside the domain crate for convenience.
//!
//! These are meant for unit tests, local demos, and disabled telemetry. The
//! network-backed emitter lives in the `log-collector` crate.

pub mod recording_sink;
