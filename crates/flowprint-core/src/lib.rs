//! Flowprint Core Types and Definitions
//!
//! This crate provides the foundational types shared by Flowprint exporters
//! and hosts. It includes:
//!
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Points, sizes, bounds and pan/zoom transforms ([`geometry`] module)
//! - **Nodes**: Diagram node snapshots with renderer size defaults ([`node::Node`])
//! - **Styles**: Declared styles and cascade resolution ([`style`] module)
//! - **Scene**: The queryable rendered-diagram model ([`scene`] module)

pub mod color;
pub mod geometry;
pub mod node;
pub mod scene;
pub mod style;
