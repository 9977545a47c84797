//! Content API for the CRISPR project site.
//!
//! Layers mirror the request path: `infra::http` handlers call the services in
//! `application`, which talk to persistence only through the repository traits
//! in [`application::repos`]. `domain` holds the records and rules shared by all
//! of them.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
