pub mod cli;
pub mod config;
pub mod ctx;
pub mod error;
pub mod image;
pub mod io;
pub mod manifest;
pub mod mask;
pub mod panel;
pub mod patch;
pub mod pipeline;
pub mod preprocess;
