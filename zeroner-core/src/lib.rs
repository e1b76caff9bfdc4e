//! # zeroner-core
//!
//! Core types for the zeroner toolbox: the data model shared by every crate.
//!
//! This crate provides:
//! - **Spans**: `Span`, a scored, labelled half-open character interval
//! - **Relations**: `Relation`, `RelationSpan` (a directed edge between spans)
//! - **Type descriptors**: `Entity`, the open-set label fed to zero-shot backends
//!
//! Equality and hashing of spans are structural over `(label, start, end, score)`,
//! so spans can be used directly as map and set keys.

pub mod entity;
pub mod error;
pub mod relation;
pub mod span;

pub use entity::Entity;
pub use error::{Error, Result};
pub use relation::{Relation, RelationSpan};
pub use span::Span;
