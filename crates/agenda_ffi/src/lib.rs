//! Flutter-facing bindings for Agenda core.

pub mod api;
