pub mod cli;
pub mod config;
pub mod metrics_server;
pub mod observability;
pub mod optimizer;
pub mod pipeline;
pub mod presentation;
pub mod sinks;
pub mod sources;
pub mod transform;

pub use pipeline::{Envelope, ErrorPolicy, Pipeline, PipelineError, PipelineReport};
