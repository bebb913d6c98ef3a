use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use thiserror::Error;

use super::node::{NodeId, ResourceDef};
use super::traits::Resource;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Unknown parent node id: {0}")]
    UnknownParent(NodeId),

    #[error("Duplicate resource name under the same parent: {0}")]
    DuplicateName(String),

    #[error("Resource name '{0}' collides with an ancestor capture group")]
    CaptureCollision(String),

    #[error("Invalid generated pattern for '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}

/// A registered resource node: definition, generated URL rules, and the
/// operation implementation.
pub struct ResourceNode {
    pub def: ResourceDef,
    pub item_pattern: String,
    pub collection_pattern: String,
    pub handler: Arc<dyn Resource>,
    route: Regex,
}

/// Immutable tree of resource definitions, built once at startup.
///
/// Both URL rules per node are generated and compiled here, at registration
/// time; request handling only runs the precompiled matchers.
#[derive(Default)]
pub struct Registry {
    nodes: Vec<ResourceNode>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        def: ResourceDef,
        handler: Arc<dyn Resource>,
    ) -> Result<NodeId, RegistryError> {
        if let Some(parent) = def.parent {
            if parent >= self.nodes.len() {
                return Err(RegistryError::UnknownParent(parent));
            }
        }

        let duplicate = self
            .nodes
            .iter()
            .any(|n| n.def.parent == def.parent && n.def.name == def.name);
        if duplicate {
            return Err(RegistryError::DuplicateName(def.name));
        }

        // A name reused along the ancestor chain would generate two capture
        // groups called `<name>_id` in one rule.
        let mut ancestor = def.parent;
        while let Some(nid) = ancestor {
            let node = &self.nodes[nid];
            if node.def.name == def.name {
                return Err(RegistryError::CaptureCollision(def.name));
            }
            ancestor = node.def.parent;
        }

        let prefix = match def.parent {
            Some(parent) => self.nodes[parent].item_pattern.clone(),
            None => "/".to_string(),
        };

        let item_pattern = def.item_pattern(&prefix);
        let collection_pattern = def.collection_pattern(&prefix);
        let route = Regex::new(&format!("^{}$", collection_pattern)).map_err(|source| {
            RegistryError::InvalidPattern {
                name: def.name.clone(),
                source,
            }
        })?;

        tracing::debug!(
            resource = %def.name,
            pattern = %collection_pattern,
            "registered resource route"
        );

        self.nodes.push(ResourceNode {
            def,
            item_pattern,
            collection_pattern,
            handler,
            route,
        });
        Ok(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> &ResourceNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.iter()
    }

    /// Match a request path against the registered rules, in registration
    /// order. Returns the node plus the named identifier captures present.
    pub fn match_path(&self, path: &str) -> Option<(NodeId, HashMap<String, String>)> {
        for (id, node) in self.nodes.iter().enumerate() {
            if let Some(caps) = node.route.captures(path) {
                let mut params = HashMap::new();
                for name in node.route.capture_names().flatten() {
                    if let Some(m) = caps.name(name) {
                        params.insert(name.to_string(), m.as_str().to_string());
                    }
                }
                return Some((id, params));
            }
        }
        None
    }

    /// Node ids from the root down to (and including) the given leaf.
    pub fn chain(&self, leaf: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut cursor = Some(leaf);
        while let Some(nid) = cursor {
            chain.push(nid);
            cursor = self.nodes[nid].def.parent;
        }
        chain.reverse();
        chain
    }
}
