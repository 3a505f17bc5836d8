//! Core MCP data model.
//!
//! This crate defines the wire-adjacent types shared by the client, server,
//! and transport crates: property schemas, tools, and content items. It has
//! no I/O of its own — transports and the dispatcher build on top of it.

mod content;
mod error;
mod property;
mod tool;

pub use content::{ContentItem, PropertyValue};
pub use error::TypesError;
pub use property::{PropertySpec, PropertyType};
pub use tool::{SchemaObject, Tool, ToolDescriptor, ToolHandler, ToolInvocation, ToolSink};
