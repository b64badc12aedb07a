//! Flutter-facing bindings for the tier board engine.

pub mod api;
