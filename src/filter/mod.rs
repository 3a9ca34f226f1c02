//! # Filter-Graph Builder
//!
//! Typed construction of FFmpeg filter graphs. A graph is an ordered
//! sequence of stages with declared input/output labels, validated for
//! connectivity before being serialized to the `-filter_complex`
//! textual syntax — a stage can only read labels that an earlier stage
//! (or a declared source) produced, and no label is defined twice.
//!
//! The builders translate pipeline configuration (crop amounts,
//! orientation, slow-down factor, watermark placement, overlay
//! sources) into a graph plus the positional input list the command
//! line must match.

pub mod builders;
pub mod graph;

pub use builders::{
    build_assembly_concat_graph, build_edit_graph, build_multiply_graph, build_overlay_graph,
    watermark_target_height, Orientation, WatermarkCorner, WATERMARK_MAX_HEIGHT_PX,
};
pub use graph::{FilterGraph, FilterStage};
