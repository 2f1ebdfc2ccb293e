//! Synthesis passes: resource allocation, scheduling and binding, and the
//! [Pipeline] that runs them in sequence.
pub mod allocate;
pub mod bind;
mod lp;
pub mod pipeline;
pub mod schedule;
pub mod traversal;

pub use pipeline::{
    strategy_help, AllocatorKind, BinderKind, Pipeline, PipelineConfig,
    SchedulerKind,
};
