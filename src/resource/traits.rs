use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::dispatch::RequestContext;
use crate::error::ApiError;
use crate::permissions::{Acl, MethodPermissions};

/// A resource instance bound to an identifier captured from the URL.
#[derive(Debug, Clone)]
pub struct LoadedResource {
    pub id: String,
    /// Node name of the resource type this instance belongs to
    pub kind: String,
    pub attributes: Map<String, Value>,
    pub acl: Acl,
}

impl LoadedResource {
    /// Public wire format: `{id, type, attributes}`
    pub fn to_value(&self) -> Value {
        json!({
            "id": self.id,
            "type": self.kind,
            "attributes": self.attributes,
        })
    }
}

/// One page of listing results plus the total match count.
#[derive(Debug, Default)]
pub struct Selector {
    items: Vec<LoadedResource>,
    total: u64,
}

impl Selector {
    /// Slice a full result set down to one page. `page` is the 0-based offset
    /// the dispatcher hands to `list`; the total is taken before slicing.
    pub fn from_items(all: Vec<LoadedResource>, page: u64, per_page: u64) -> Self {
        let total = all.len() as u64;
        let start = (page * per_page) as usize;
        let items = all
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();
        Self { items, total }
    }

    pub fn items(&self) -> &[LoadedResource] {
        &self.items
    }

    pub fn count(&self) -> u64 {
        self.total
    }
}

/// Capability surface of one resource type.
///
/// Concrete resources override only the operations they support; everything
/// else inherits a default that fails with MethodNotAllowed. `load` is part of
/// the same surface: a resource that cannot be loaded by identifier cannot
/// serve item-level requests or act as an ancestor.
#[async_trait]
pub trait Resource: Send + Sync {
    async fn load(&self, _id: &str, _ctx: &RequestContext) -> Result<LoadedResource, ApiError> {
        Err(ApiError::method_not_allowed(
            "resource cannot be loaded by identifier",
        ))
    }

    async fn list(
        &self,
        _ctx: &RequestContext,
        _page: u64,
        _filter: &HashMap<String, String>,
    ) -> Result<Selector, ApiError> {
        Err(ApiError::method_not_allowed("listing is not supported"))
    }

    async fn read(&self, _ctx: &RequestContext, _item: &LoadedResource) -> Result<Value, ApiError> {
        Err(ApiError::method_not_allowed("read is not supported"))
    }

    async fn create(&self, _ctx: &RequestContext, _data: &Value) -> Result<Value, ApiError> {
        Err(ApiError::method_not_allowed("create is not supported"))
    }

    async fn replace(
        &self,
        _ctx: &RequestContext,
        _item: &LoadedResource,
        _data: &Value,
    ) -> Result<Value, ApiError> {
        Err(ApiError::method_not_allowed("replace is not supported"))
    }

    async fn update(
        &self,
        _ctx: &RequestContext,
        _item: &LoadedResource,
        _data: &Value,
    ) -> Result<Value, ApiError> {
        Err(ApiError::method_not_allowed("update is not supported"))
    }

    async fn delete(
        &self,
        _ctx: &RequestContext,
        _item: &LoadedResource,
    ) -> Result<(), ApiError> {
        Err(ApiError::method_not_allowed("delete is not supported"))
    }

    /// Required permission per verb; override to loosen or tighten a node
    fn method_permissions(&self) -> MethodPermissions {
        MethodPermissions::default()
    }

    fn page_size(&self) -> u64 {
        crate::config::config().api.page_size
    }
}
