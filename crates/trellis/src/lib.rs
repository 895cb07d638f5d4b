//! Trellis - cross-team initiative planning board core.
//!
//! This crate provides the invariant-carrying core of a planning board:
//! a [`graph::DependencyGraph`] that keeps the initiative "depends on"
//! edge set acyclic and answers blocked-state queries, and a rule engine
//! ([`rules::evaluate`]) that turns recorded initiative transitions into
//! todo suggestions. Board state lives behind the async
//! [`storage::BoardStorage`] trait; the shipped backend is in-memory.

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod config;
pub mod domain;
pub mod error;
pub mod graph;
pub mod id_generation;
pub mod rules;
pub mod storage;
