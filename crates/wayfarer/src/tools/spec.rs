//! Structured tool descriptions.
//!
//! A [`ToolSpec`] pairs a tool name with its purpose, optional usage
//! guidance, and the JSON Schema its arguments must satisfy. The schema is
//! derived from the typed argument struct so the two cannot diverge.

use crate::llm::ToolDef;

/// Description and argument schema of one tool.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    /// Tool name, unique within a registry.
    pub name: String,
    /// One-sentence imperative purpose.
    pub purpose: String,
    /// When the tool is the right choice.
    pub when_to_use: Option<String>,
    /// When another tool should be picked instead.
    pub when_not_to_use: Option<String>,
    /// JSON Schema for the arguments.
    pub parameters: serde_json::Value,
}

impl ToolSpec {
    /// A tool without arguments.
    pub fn new(name: impl Into<String>, purpose: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            purpose: purpose.into(),
            when_to_use: None,
            when_not_to_use: None,
            parameters: serde_json::json!({"type": "object", "properties": {}}),
        }
    }

    /// Derive the argument schema from a type implementing `schemars::JsonSchema`.
    pub fn parameters_for<T: schemars::JsonSchema>(mut self) -> Self {
        self.parameters = crate::json_schema_for::<T>();
        self
    }

    pub fn when_to_use(mut self, when: impl Into<String>) -> Self {
        self.when_to_use = Some(when.into());
        self
    }

    pub fn when_not_to_use(mut self, when_not: impl Into<String>) -> Self {
        self.when_not_to_use = Some(when_not.into());
        self
    }

    /// Full description string for the LLM.
    pub fn to_description(&self) -> String {
        let mut desc = format!("{}.", self.purpose.trim_end_matches('.'));
        if let Some(ref when) = self.when_to_use {
            desc.push_str(&format!("\nWhen to use: {when}"));
        }
        if let Some(ref when_not) = self.when_not_to_use {
            desc.push_str(&format!("\nWhen NOT to use: {when_not}"));
        }
        desc
    }

    pub fn to_tool_def(&self) -> ToolDef {
        ToolDef::new(
            self.name.clone(),
            self.to_description(),
            self.parameters.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Args {
        /// Where to go.
        directory: String,
    }

    #[test]
    fn description_includes_guidance() {
        let spec = ToolSpec::new("cd", "Change directory")
            .when_to_use("To look inside a subdirectory")
            .when_not_to_use("To read a file");
        let desc = spec.to_description();
        assert!(desc.starts_with("Change directory."));
        assert!(desc.contains("When to use: To look inside"));
        assert!(desc.contains("When NOT to use: To read a file"));
    }

    #[test]
    fn parameters_derived_from_type() {
        let spec = ToolSpec::new("cd", "Change directory").parameters_for::<Args>();
        assert_eq!(spec.parameters["type"], "object");
        assert!(
            spec.parameters["required"]
                .as_array()
                .unwrap()
                .contains(&"directory".into())
        );
        let def = spec.to_tool_def();
        assert_eq!(def.function.name, "cd");
    }

    #[test]
    fn no_argument_tool_has_empty_object_schema() {
        let spec = ToolSpec::new("ls", "List the current directory");
        assert_eq!(spec.parameters["properties"], serde_json::json!({}));
    }
}
