//! Vevent Core Library
//!
//! Core functionality for Vevent - nearby event discovery and hosting.
//! This crate owns the app state that the Flutter UI renders: where the user
//! is, and whether they are logged in.
//!
//! - [`location`]: permission handling, geocoding and the location picker
//! - [`auth`]: the email/password login flow
//! - [`platform`]: request/response bridge to host-provided services
//! - [`dispatch`]: completion mailboxes that keep state on the owner thread

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

mod api;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod location;
pub mod platform;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use api::{Screen, VeventCore};
