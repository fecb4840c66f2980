//! Maakhana survey — onboarding survey service for a meal subscription.

pub mod auth;
pub mod config;
pub mod error;
pub mod store;
pub mod survey;
