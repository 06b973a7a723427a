//! Flutter-Rust bridge wrapper for vevent-core.
//!
//! This crate serves as a thin wrapper that re-exports `vevent-core` for
//! integration with the Flutter build system via Cargokit. The Dart-facing
//! surface lives in [`api`].

pub mod api;

pub use vevent_core::*;
