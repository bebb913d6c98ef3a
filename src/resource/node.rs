/// Index of a registered node inside the [`Registry`](super::registry::Registry).
///
/// Parent links are indices rather than references: the tree of definitions is
/// immutable once built, and a parent must already be registered before any
/// child can point at it, which keeps the chain finite and acyclic by
/// construction.
pub type NodeId = usize;

/// Static definition of one resource type in the hierarchy.
#[derive(Debug, Clone)]
pub struct ResourceDef {
    pub name: String,
    pub plural: String,
    pub parent: Option<NodeId>,
}

impl ResourceDef {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let plural = format!("{}s", name);
        Self {
            name,
            plural,
            parent: None,
        }
    }

    /// Override the default `name + "s"` plural form
    pub fn plural(mut self, plural: impl Into<String>) -> Self {
        self.plural = plural.into();
        self
    }

    pub fn child_of(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// URL rule for one specific item: `<prefix><plural>/<name>_id capture/`.
    /// The prefix is the parent's item pattern, or `/` at the root. Children
    /// build their own patterns on top of this one, so the rule always ends
    /// with a slash.
    pub fn item_pattern(&self, prefix: &str) -> String {
        format!(
            r"{0}{1}/(?P<{2}_id>(?:\w|-)+)/",
            prefix, self.plural, self.name
        )
    }

    /// URL rule for the collection. The identifier capture is optional and the
    /// trailing slash is optional, so a single rule matches both the listing
    /// and a specific item; dispatch distinguishes by whether the capture is
    /// present.
    pub fn collection_pattern(&self, prefix: &str) -> String {
        format!(
            r"{0}{1}(?:/(?P<{2}_id>(?:\w|-)+))?/?",
            prefix, self.plural, self.name
        )
    }
}
