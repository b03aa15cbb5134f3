use crate::call::ToolName;
use crate::catalog;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use udc_policy::{RiskClassifier, RiskTier};

#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: ToolName,
    pub description: &'static str,
    pub schema: Value,
    pub risk: RiskTier,
}

/// Name-indexed catalog of the tools the server exposes.
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, ToolSpec>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Every built-in tool with its schema and risk tier.
    pub fn builtin() -> Self {
        let classifier = RiskClassifier::new();
        let mut registry = Self::new();
        for &name in ToolName::ALL {
            registry.register(ToolSpec {
                name,
                description: catalog::description(name),
                schema: catalog::schema(name),
                risk: classifier.tier(name.as_str()),
            });
        }
        registry
    }

    pub fn register(&mut self, spec: ToolSpec) -> &mut Self {
        self.tools.insert(spec.name.as_str(), spec);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.get(name)
    }

    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// Tool descriptors in the `tools/list` shape.
    pub fn schemas(&self) -> Vec<Value> {
        self.tools
            .values()
            .map(|spec| {
                json!({
                    "name": spec.name.as_str(),
                    "description": spec.description,
                    "inputSchema": spec.schema,
                })
            })
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
