//! Shader graph requirement aggregation and node settings.
//!
//! - `graph`: slots, capability queries, node trait and the graph container
//! - `nodes`: PBR master and vertex input nodes, plus the type registry
//! - `render_state`: material options and per-pass render-state overrides
//! - `preamble`: pass skeleton emitted from a graph's requirements
//! - `dsl`: JSON graph documents
//! - `export`: shader export and logging for graph assets

pub mod dsl;
pub mod export;
pub mod graph;
pub mod nodes;
pub mod preamble;
pub mod render_state;
