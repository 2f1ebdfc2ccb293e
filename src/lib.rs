//! # hls
//!
//! Command line front end of the synthesis pipeline: reads a resource
//! library and a CDFG as JSON, runs allocation, scheduling and binding, and
//! writes the resulting plan. The passes themselves live in [`hls_opt`], the
//! data model in [`hls_ir`].
pub mod cmdline;
pub mod driver;
