//! Backend API layer: HTTP client and wire models.

pub mod client;
pub mod models;

pub use client::{AdminClient, ApiError};
