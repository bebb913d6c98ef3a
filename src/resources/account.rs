use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::dispatch::RequestContext;
use crate::error::ApiError;
use crate::permissions::{MethodPermissions, Permissions};
use crate::resource::{LoadedResource, Resource, Selector};
use crate::store::{MemStore, StoredRecord};

use super::matches_filter;

/// Root of the demo hierarchy. Accounts are readable by anyone; mutations are
/// deliberately left at the trait default and answer 405.
pub struct AccountResource {
    store: Arc<MemStore>,
}

impl AccountResource {
    pub fn new(store: Arc<MemStore>) -> Self {
        Self { store }
    }

    fn loaded(id: &str, record: StoredRecord) -> LoadedResource {
        LoadedResource {
            id: id.to_string(),
            kind: "account".into(),
            attributes: record.attributes,
            acl: record.acl,
        }
    }
}

#[async_trait]
impl Resource for AccountResource {
    async fn load(&self, id: &str, _ctx: &RequestContext) -> Result<LoadedResource, ApiError> {
        let record = self
            .store
            .get("accounts", id)
            .await
            .ok_or_else(|| ApiError::not_found(format!("account '{}' not found", id)))?;
        Ok(Self::loaded(id, record))
    }

    async fn read(&self, _ctx: &RequestContext, item: &LoadedResource) -> Result<Value, ApiError> {
        Ok(item.to_value())
    }

    async fn list(
        &self,
        _ctx: &RequestContext,
        page: u64,
        filter: &HashMap<String, String>,
    ) -> Result<Selector, ApiError> {
        let items = self
            .store
            .scan("accounts")
            .await
            .into_iter()
            .filter(|(_, record)| matches_filter(&record.attributes, filter))
            .map(|(id, record)| Self::loaded(&id, record))
            .collect();
        Ok(Selector::from_items(items, page, self.page_size()))
    }

    /// The account directory is public; everything else keeps the canonical
    /// verb mapping.
    fn method_permissions(&self) -> MethodPermissions {
        MethodPermissions {
            get: Permissions::NONE,
            ..MethodPermissions::default()
        }
    }
}
