#![doc = "resource-bundler-core: build, packaging and deployment pipeline for platform static resources."]

//! This crate holds every piece of domain logic for resource-bundler. Network transport
//! for the remote Metadata API lives in the CLI crate behind the [`contract::Deployer`] trait.
//!
//! # Usage
//! Build a [`config::BuildConfig`] once at startup, then either call the individual steps
//! ([`pipeline::build_min`], [`resource::static_resource`], [`deploy::deploy_directory`])
//! or drive everything through [`tasks::TaskRunner`].

pub mod archive;
pub mod config;
pub mod contract;
pub mod deploy;
pub mod environment;
pub mod error;
pub mod fingerprint;
pub mod lint;
pub mod pipeline;
pub mod resource;
pub mod selector;
pub mod tasks;
pub mod transform;

pub use error::BuildError;
