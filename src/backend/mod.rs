// file: src/backend/mod.rs
// description: concrete pipeline factories
// reference: internal module structure

pub mod hub;

pub use hub::{HubPipelineFactory, HubPipelineHandle};
