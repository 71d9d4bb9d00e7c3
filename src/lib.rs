//! `resource-bundler` command-line crate.
//!
//! Argument parsing, YAML configuration and the SOAP Metadata API client live here; every
//! build and deploy step is implemented in `resource-bundler-core`.

pub mod cli;
pub mod load_config;
pub mod metadata_client;

pub use metadata_client::MetadataClient;
