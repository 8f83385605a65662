//! Closed, per-state tool registries.
//!
//! Each state owns a fixed set of tools described by [`ToolSpec`]s. A choice
//! coming back from the tool chooser is resolved here: unknown names are
//! rejected at the boundary, arguments are validated against the tool's
//! JSON Schema, then decoded into the state's typed [`ToolChoice`] enum.

use tracing::{debug, info};

use crate::error::ToolError;
use crate::llm::ToolDef;
use crate::tools::spec::ToolSpec;

/// A typed, closed set of tool choices for one state.
pub trait ToolChoice: Sized {
    /// The registry describing every variant.
    fn registry() -> ToolRegistry;

    /// Decode arguments that already passed schema validation.
    fn decode(name: &str, arguments: serde_json::Value) -> Result<Self, ToolError>;

    /// Name of the chosen tool.
    fn name(&self) -> &'static str;
}

/// The tools available in one state.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    state: &'static str,
    specs: Vec<ToolSpec>,
}

impl ToolRegistry {
    pub fn new(state: &'static str) -> Self {
        Self {
            state,
            specs: Vec::new(),
        }
    }

    /// Register a tool (builder pattern). Replaces a tool with the same name.
    pub fn with(mut self, spec: ToolSpec) -> Self {
        self.specs.retain(|s| s.name != spec.name);
        self.specs.push(spec);
        self
    }

    /// Name of the state this registry belongs to.
    pub fn state(&self) -> &'static str {
        self.state
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    /// Definitions for the LLM API.
    pub fn definitions(&self) -> Vec<ToolDef> {
        self.specs.iter().map(ToolSpec::to_tool_def).collect()
    }

    /// Check `arguments` against the schema of tool `name`.
    ///
    /// Missing arguments (`null`) are treated as an empty object. Returns
    /// the normalized arguments on success.
    pub fn validate(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let spec = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let arguments = match arguments {
            serde_json::Value::Null => serde_json::json!({}),
            other => other,
        };

        // A schema the validator cannot compile is skipped rather than
        // blocking every call to the tool.
        let validator = match jsonschema::validator_for(&spec.parameters) {
            Ok(v) => v,
            Err(e) => {
                debug!("Skipping validation for '{name}': bad schema: {e}");
                return Ok(arguments);
            }
        };

        let errors: Vec<String> = validator
            .iter_errors(&arguments)
            .map(|e| format!("  - {}: {e}", e.instance_path()))
            .collect();

        if errors.is_empty() {
            Ok(arguments)
        } else {
            Err(ToolError::InvalidArguments {
                tool: name.to_string(),
                details: errors.join("\n"),
            })
        }
    }

    /// Validate and decode a raw choice into the state's typed enum.
    pub fn resolve<T: ToolChoice>(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<T, ToolError> {
        let arguments = self.validate(name, arguments)?;
        let choice = T::decode(name, arguments)?;
        info!("[{}] tool choice: {}", self.state, choice.name());
        Ok(choice)
    }
}

/// Decode validated arguments into a typed struct.
pub fn decode_args<A: serde::de::DeserializeOwned>(
    name: &str,
    arguments: serde_json::Value,
) -> Result<A, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool: name.to_string(),
        details: format!("  - {e}"),
    })
}
