//! # Domain Module
//!
//! Core types: errors, invariants, value objects and the four entities
//! (domain, witness, projection, shard).

pub mod conservation_domain;
pub mod errors;
pub mod invariants;
pub mod projection;
pub mod shard;
pub mod value_objects;
pub mod witness;

pub use conservation_domain::*;
pub use errors::*;
pub use invariants::*;
pub use projection::*;
pub use shard::*;
pub use value_objects::*;
pub use witness::*;
