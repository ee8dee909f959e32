pub mod artifact;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod pipeline;
pub mod postprocess;
pub mod segment;
pub mod translate;
pub mod util;
