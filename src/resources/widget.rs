use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::dispatch::RequestContext;
use crate::error::ApiError;
use crate::permissions::Acl;
use crate::resource::{LoadedResource, Resource, Selector};
use crate::store::{MemStore, StoredRecord};

use super::matches_filter;

/// Widgets live under an account and support the full CRUD surface. Access is
/// granted through the ancestor chain: a widget carries no grants of its own,
/// so whoever holds bits on the owning account holds them here.
pub struct WidgetResource {
    store: Arc<MemStore>,
}

impl WidgetResource {
    pub fn new(store: Arc<MemStore>) -> Self {
        Self { store }
    }

    fn loaded(id: &str, record: StoredRecord) -> LoadedResource {
        LoadedResource {
            id: id.to_string(),
            kind: "widget".into(),
            attributes: record.attributes,
            acl: record.acl,
        }
    }
}

/// Owning account id captured from the URL. Widget rules always embed the
/// account segment, so a miss here is a routing bug, not client error.
fn account_id(ctx: &RequestContext) -> Result<&str, ApiError> {
    ctx.path_params
        .get("account_id")
        .map(String::as_str)
        .ok_or_else(|| ApiError::internal_server_error("missing account capture"))
}

/// Body fields become attributes verbatim, minus the envelope-level `id` and
/// `type` tags; the owning account is stamped from the URL.
fn attributes_from(data: &Value, account_id: &str) -> Map<String, Value> {
    let mut attributes = data.as_object().cloned().unwrap_or_default();
    attributes.remove("id");
    attributes.remove("type");
    attributes.insert("account_id".into(), json!(account_id));
    attributes
}

#[async_trait]
impl Resource for WidgetResource {
    async fn load(&self, id: &str, ctx: &RequestContext) -> Result<LoadedResource, ApiError> {
        let account_id = account_id(ctx)?;
        let record = self
            .store
            .get("widgets", id)
            .await
            .filter(|r| r.attributes.get("account_id").and_then(Value::as_str) == Some(account_id))
            .ok_or_else(|| {
                ApiError::not_found(format!(
                    "widget '{}' not found in account '{}'",
                    id, account_id
                ))
            })?;
        Ok(Self::loaded(id, record))
    }

    async fn read(&self, _ctx: &RequestContext, item: &LoadedResource) -> Result<Value, ApiError> {
        Ok(item.to_value())
    }

    async fn list(
        &self,
        ctx: &RequestContext,
        page: u64,
        filter: &HashMap<String, String>,
    ) -> Result<Selector, ApiError> {
        let account_id = account_id(ctx)?;
        let items = self
            .store
            .scan("widgets")
            .await
            .into_iter()
            .filter(|(_, record)| {
                record.attributes.get("account_id").and_then(Value::as_str) == Some(account_id)
            })
            .filter(|(_, record)| matches_filter(&record.attributes, filter))
            .map(|(id, record)| Self::loaded(&id, record))
            .collect();
        Ok(Selector::from_items(items, page, self.page_size()))
    }

    async fn create(&self, ctx: &RequestContext, data: &Value) -> Result<Value, ApiError> {
        let account_id = account_id(ctx)?;
        let id = Uuid::new_v4().to_string();
        let record = StoredRecord {
            attributes: attributes_from(data, account_id),
            acl: Acl::default(),
        };
        self.store.put("widgets", &id, record.clone()).await;
        tracing::debug!(widget = %id, account = %account_id, "widget created");
        Ok(Self::loaded(&id, record).to_value())
    }

    async fn replace(
        &self,
        ctx: &RequestContext,
        item: &LoadedResource,
        data: &Value,
    ) -> Result<Value, ApiError> {
        let account_id = account_id(ctx)?;
        let record = StoredRecord {
            attributes: attributes_from(data, account_id),
            acl: item.acl.clone(),
        };
        self.store.put("widgets", &item.id, record.clone()).await;
        Ok(Self::loaded(&item.id, record).to_value())
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        item: &LoadedResource,
        data: &Value,
    ) -> Result<Value, ApiError> {
        let account_id = account_id(ctx)?;
        let mut attributes = item.attributes.clone();
        for (key, value) in attributes_from(data, account_id) {
            attributes.insert(key, value);
        }
        let record = StoredRecord {
            attributes,
            acl: item.acl.clone(),
        };
        self.store.put("widgets", &item.id, record.clone()).await;
        Ok(Self::loaded(&item.id, record).to_value())
    }

    async fn delete(&self, _ctx: &RequestContext, item: &LoadedResource) -> Result<(), ApiError> {
        self.store.remove("widgets", &item.id).await;
        tracing::debug!(widget = %item.id, "widget deleted");
        Ok(())
    }
}
