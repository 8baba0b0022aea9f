//! Folio: page-schema and content editing backend
//!
//! A site is described by a page schema, a JSON tree whose nodes link content
//! items by id. This crate keeps the schema, the content items and the media
//! library consistent while an editor creates, deletes and saves them:
//!
//! - [`store`] persists single resources with backup and restore-on-failure
//! - [`gateway`] exposes authorized, typed operations over those resources
//! - [`schema`] edits the schema tree without mutating its input
//! - [`sync`] runs the multi-step workflows and reports their outcomes as events

pub mod auth;
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod media;
pub mod schema;
pub mod store;
pub mod sync;
