//! Rendering against a [`FeatureManager`].

use std::collections::HashMap;

use featuregate_domain::{FeatureGateError, Featurable, FeaturableKey, Result};

use super::{Condition, Node, Template};
use crate::manager::FeatureManager;

/// Entities available to `@featurefor` by binding name.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    bindings: HashMap<String, FeaturableKey>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an entity under `name`, builder style.
    #[must_use]
    pub fn with<F: Featurable + ?Sized>(mut self, name: impl Into<String>, featurable: &F) -> Self {
        self.insert(name, featurable);
        self
    }

    pub fn insert<F: Featurable + ?Sized>(&mut self, name: impl Into<String>, featurable: &F) {
        self.bindings.insert(name.into(), featurable.featurable_key());
    }

    pub fn get(&self, name: &str) -> Option<&FeaturableKey> {
        self.bindings.get(name)
    }
}

impl Template {
    /// Render the template, keeping only blocks whose condition holds.
    ///
    /// Every distinct condition is resolved exactly once up front, including
    /// conditions nested inside blocks that end up hidden, so a misspelled
    /// feature anywhere in the template fails the render.
    ///
    /// # Errors
    /// `NotFound` for unknown features, `Validation` for a missing binding,
    /// or whatever the repository reports.
    pub async fn render(&self, manager: &FeatureManager, context: &RenderContext) -> Result<String> {
        let mut decisions: HashMap<&Condition, bool> = HashMap::new();

        for condition in self.conditions() {
            let enabled = match condition {
                Condition::Global(feature) => manager.is_enabled(feature).await?,
                Condition::For { feature, binding } => {
                    let key = context.get(binding).ok_or_else(|| {
                        FeatureGateError::Validation(format!(
                            "template binding `{binding}` is not in the render context"
                        ))
                    })?;
                    manager.is_enabled_for(feature, key).await?
                }
            };
            decisions.insert(condition, enabled);
        }

        let mut output = String::new();
        write_nodes(self.nodes(), &decisions, &mut output);
        Ok(output)
    }
}

fn write_nodes(nodes: &[Node], decisions: &HashMap<&Condition, bool>, output: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => output.push_str(text),
            Node::Block { condition, body } => {
                if decisions.get(condition).copied().unwrap_or(false) {
                    write_nodes(body, decisions, output);
                }
            }
        }
    }
}
