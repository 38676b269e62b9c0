//! AI tool catalogue and resolution.
//!
//! Sits next to the cleaning engine: the engine never calls it, but both
//! share the process. Local models are the only process-wide mutable state
//! and live behind [`LazyResource`].

pub mod catalog;
pub mod lazy;
pub mod resolver;

pub use catalog::{Provider, ToolId, ToolKind};
pub use lazy::LazyResource;
pub use resolver::{
    ApiCredentials, KeySource, LoadedModel, ModelLoader, ToolError, ToolHandle, ToolResolver,
    UserKeys,
};
