pub mod config;
pub mod error;
pub mod pipeline;
pub mod process;
pub mod store;

pub use config::PipelineConfig;
pub use error::EtlError;
pub use pipeline::{run, RunSummary};
