//! Service Layer
//!
//! Application service wiring configuration, the checksum oracle, the
//! fingerprint function and metrics behind the `ConservationApi` port.

pub mod runtime;

pub use runtime::ConservationRuntime;

