use std::collections::HashMap;

use serde_json::Value;

use crate::auth::Identity;
use crate::permissions::Permissions;

/// Per-request state handed to every resource operation.
///
/// Created when a request arrives, dropped when the response is written,
/// never shared across requests. The permission bitmask computed by the gate
/// is cached here rather than on the identity so a long-lived identity value
/// can never carry one request's grants into another.
#[derive(Debug)]
pub struct RequestContext {
    /// Identifier captures from the matched URL rule (`<name>_id` → value)
    pub path_params: HashMap<String, String>,
    /// Decoded query pairs, in declaration order
    pub query: Vec<(String, String)>,
    /// Parsed JSON request body, when one was sent
    pub body: Option<Value>,
    pub identity: Identity,
    /// Effective bitmask for this request, set by the permission gate
    pub permissions: Permissions,
}

impl RequestContext {
    pub fn new(identity: Identity) -> Self {
        Self {
            path_params: HashMap::new(),
            query: Vec::new(),
            body: None,
            identity,
            permissions: Permissions::NONE,
        }
    }
}
