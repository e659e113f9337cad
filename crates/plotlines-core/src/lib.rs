//! Plotlines Core Types and Definitions
//!
//! This crate provides the foundational types for Plotlines story graphs.
//! It includes:
//!
//! - **Geometry**: Immutable coordinate vectors ([`geometry::Coordinates`])
//! - **Identifiers**: Serial, UUID and named identifiers ([`identifier::Uid`])
//! - **Colors**: CSS color parsing into 8-bit triples ([`color::Rgb`])
//! - **Graph**: Nodes, edges and ports owned by an arena ([`graph::Graph`])
//! - **Records**: Plain-data entity forms with TOML support ([`record`] module)

pub mod color;
pub mod geometry;
pub mod graph;
pub mod identifier;
pub mod record;
pub mod style;

mod error;

pub use error::Error;
