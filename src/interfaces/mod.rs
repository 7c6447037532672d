//! Inbound and outbound data-format adapters.
//!
//! Thin by design: each adapter deserializes or serializes a boundary shape
//! and delegates to the application layer.

pub mod csv;
pub mod queue;
