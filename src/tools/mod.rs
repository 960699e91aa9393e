//! Pluggable tool system.
//!
//! Tools are async trait objects the model can invoke during the agentic loop.
//! Each tool publishes its own definition (name, description, JSON Schema) and
//! an async execute method. The registry validates arguments against the
//! schema before a handler ever sees them.

pub mod files;
pub mod schema;
pub mod selection;

use crate::error::{RegistryError, ToolError};
use crate::types::{ToolArguments, ToolDefinition};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

// ---------------------------------------------------------------------------
// Tool trait
// ---------------------------------------------------------------------------

/// A tool that can be invoked by the model.
///
/// Implement this trait to add custom tools and register instances with
/// [`ToolRegistry`] before creating the agent.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Definition published to the model; `name` must be unique per registry.
    fn definition(&self) -> ToolDefinition;

    /// Execute with schema-validated arguments and return text for the model.
    async fn execute(&self, arguments: &ToolArguments) -> Result<String, ToolError>;
}

// ---------------------------------------------------------------------------
// Tool registry
// ---------------------------------------------------------------------------

struct RegisteredTool {
    definition: ToolDefinition,
    handler: Arc<dyn Tool>,
}

/// Registry of available tools, in registration order.
///
/// Populated once at startup and read-only afterwards; the agent shares it
/// behind an `Arc` so parallel dispatch can read it concurrently.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool, rejecting duplicate names.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), RegistryError> {
        let definition = tool.definition();
        if self.has_tool(&definition.name) {
            return Err(RegistryError::DuplicateTool(definition.name));
        }
        self.tools.push(RegisteredTool {
            definition,
            handler: Arc::new(tool),
        });
        Ok(())
    }

    /// Tool definitions in registration order, for provider requests.
    pub fn describe_all(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition.clone()).collect()
    }

    /// Registered tool names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.definition.name.as_str()).collect()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.definition.name == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate `arguments` against the tool's schema and run it.
    ///
    /// Handler failures come back as [`ToolError::ExecutionFailed`] prefixed
    /// with the tool name so the model can tell which call failed.
    pub async fn invoke(&self, name: &str, arguments: &ToolArguments) -> Result<String, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.definition.name == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        schema::validate_arguments(&tool.definition.parameters, arguments)
            .map_err(|reason| ToolError::InvalidArguments(format!("{name}: {reason}")))?;

        debug!(tool = name, "invoking tool");
        tool.handler.execute(arguments).await.map_err(|err| match err {
            ToolError::UnknownTool(_) => err,
            ToolError::InvalidArguments(msg) => {
                ToolError::InvalidArguments(format!("{name}: {msg}"))
            }
            ToolError::ExecutionFailed(msg) => ToolError::ExecutionFailed(format!("{name}: {msg}")),
        })
    }
}
