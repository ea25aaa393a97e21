//! Graph representation, construction and coarsening

pub mod builder;
pub mod induction;
pub mod layered;

pub use builder::GraphBuilder;
pub use induction::induce;
pub use layered::{one_hot, LayeredGraph, TypeVector, TypedDiGraph};
