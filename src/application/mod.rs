//! Application services layer.

pub mod admin;
pub mod auth;
pub mod content;
pub mod error;
pub mod repos;
pub mod shaper;
