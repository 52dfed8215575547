//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic and manages the runtime behavior:
//! - Throttle registry (bucket creation, suppression counting, draining)
//! - Flusher (the periodic background drain)
//! - Metrics (what the throttle did with incoming calls)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod flusher;
pub mod metrics;
pub mod ports;
pub mod registry;
