//! Core types and definitions for the CROSSFIRE combat core.
//!
//! This crate defines the vocabulary shared across all other crates:
//! components, item and firemode definitions, events, flags, constants,
//! configuration, errors and the [`trace::TraceService`] seam.
//! It has no dependency on the ECS or any runtime framework.

pub mod components;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod flags;
pub mod items;
pub mod trace;
pub mod types;

#[cfg(test)]
mod tests;
