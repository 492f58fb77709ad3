//! Dashboard resources.
//!
//! Each submodule binds one resource family to fixed API paths: plain
//! request functions over [`ApiClient`](crate::api::ApiClient), its query
//! keys, and the cached [`GymClient`] methods and hooks built on them.

pub mod auth;
pub mod client;
pub mod documents;
pub mod locations;
pub mod members;
pub mod plans;
pub mod profile;
pub mod registration;
pub mod types;

pub use client::GymClient;
