use std::collections::HashMap;

use axum::http::Method;
use bitflags::bitflags;
use uuid::Uuid;

use crate::auth::Identity;

bitflags! {
    /// Capability set granted to an identity against a resource chain.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u8 {
        const READ = 1 << 0;
        const CREATE = 1 << 1;
        const UPDATE = 1 << 2;
        const DELETE = 1 << 3;
    }
}

impl Permissions {
    /// The empty set: no capability granted, and no capability required.
    pub const NONE: Permissions = Permissions::empty();

    /// Effective bitmask for an identity against a loaded resource chain,
    /// root-first. Grants accumulate: any node in the chain can widen access,
    /// none can revoke it.
    pub fn resolve<'a>(identity: &Identity, acls: impl IntoIterator<Item = &'a Acl>) -> Self {
        acls.into_iter()
            .fold(Permissions::NONE, |acc, acl| acc | acl.granted_to(identity))
    }
}

/// Required permission per HTTP method, as an explicit total mapping.
///
/// Totality is enforced by construction: every verb field must hold a value,
/// so an override cannot accidentally leave a method unmapped. Methods outside
/// the five verbs have no entry and dispatch as MethodNotAllowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodPermissions {
    pub get: Permissions,
    pub post: Permissions,
    pub put: Permissions,
    pub patch: Permissions,
    pub delete: Permissions,
}

impl Default for MethodPermissions {
    fn default() -> Self {
        Self {
            get: Permissions::READ,
            post: Permissions::CREATE,
            put: Permissions::UPDATE,
            patch: Permissions::UPDATE,
            delete: Permissions::DELETE,
        }
    }
}

impl MethodPermissions {
    /// Required permission for a method; None means the method is not part of
    /// the CRUD surface at all.
    pub fn required(&self, method: &Method) -> Option<Permissions> {
        if method == Method::GET {
            Some(self.get)
        } else if method == Method::POST {
            Some(self.post)
        } else if method == Method::PUT {
            Some(self.put)
        } else if method == Method::PATCH {
            Some(self.patch)
        } else if method == Method::DELETE {
            Some(self.delete)
        } else {
            None
        }
    }
}

/// Per-instance grants: public bits plus per-principal bits.
#[derive(Debug, Clone)]
pub struct Acl {
    pub public: Permissions,
    pub grants: HashMap<Uuid, Permissions>,
}

impl Default for Acl {
    fn default() -> Self {
        Self {
            public: Permissions::NONE,
            grants: HashMap::new(),
        }
    }
}

impl Acl {
    pub fn granted_to(&self, identity: &Identity) -> Permissions {
        let principal = identity
            .user_id
            .and_then(|uid| self.grants.get(&uid).copied())
            .unwrap_or(Permissions::NONE);
        self.public | principal
    }
}
