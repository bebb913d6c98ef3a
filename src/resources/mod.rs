pub mod account;
pub mod widget;

pub use account::AccountResource;
pub use widget::WidgetResource;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::resource::{Registry, RegistryError, ResourceDef};
use crate::store::MemStore;

/// Wire the demo hierarchy: `accounts` at the root, `widgets` nested below.
pub fn build_registry(store: Arc<MemStore>) -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    let accounts = registry.register(
        ResourceDef::new("account"),
        Arc::new(AccountResource::new(store.clone())),
    )?;
    registry.register(
        ResourceDef::new("widget").child_of(accounts),
        Arc::new(WidgetResource::new(store)),
    )?;
    Ok(registry)
}

/// Attribute match for `filter[<field>]` values. String attributes compare
/// directly; everything else compares against its JSON rendering.
pub(crate) fn matches_filter(
    attributes: &Map<String, Value>,
    filter: &HashMap<String, String>,
) -> bool {
    filter.iter().all(|(field, expected)| {
        attributes.get(field).is_some_and(|value| match value {
            Value::String(s) => s == expected,
            other => other.to_string() == *expected,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;
    use crate::dispatch::RequestContext;
    use crate::permissions::Permissions;
    use crate::resource::Resource;
    use crate::store::{seed_demo, StoredRecord};
    use serde_json::json;

    fn widget_ctx(account_id: &str) -> RequestContext {
        let mut ctx = RequestContext::new(Identity::anonymous());
        ctx.path_params
            .insert("account_id".into(), account_id.into());
        ctx
    }

    async fn seeded_store() -> Arc<MemStore> {
        let store = Arc::new(MemStore::new());
        seed_demo(&store).await;
        store
    }

    #[test]
    fn filter_matches_strings_and_numbers() {
        let mut attributes = Map::new();
        attributes.insert("color".into(), json!("red"));
        attributes.insert("size".into(), json!(5));

        let mut filter = HashMap::new();
        filter.insert("color".to_string(), "red".to_string());
        filter.insert("size".to_string(), "5".to_string());
        assert!(matches_filter(&attributes, &filter));

        filter.insert("color".to_string(), "blue".to_string());
        assert!(!matches_filter(&attributes, &filter));

        let mut missing = HashMap::new();
        missing.insert("shape".to_string(), "round".to_string());
        assert!(!matches_filter(&attributes, &missing));
    }

    #[tokio::test]
    async fn widget_listing_is_scoped_to_the_account() {
        let store = seeded_store().await;
        // A widget in some other account must never leak into acme's listing
        let mut attributes = Map::new();
        attributes.insert("account_id".into(), json!("globex"));
        attributes.insert("color".into(), json!("red"));
        store
            .put(
                "widgets",
                "w-alien",
                StoredRecord {
                    attributes,
                    acl: Default::default(),
                },
            )
            .await;

        let widgets = WidgetResource::new(store);
        let ctx = widget_ctx("acme");

        let all = widgets.list(&ctx, 0, &HashMap::new()).await.unwrap();
        assert_eq!(all.count(), 3);

        let mut filter = HashMap::new();
        filter.insert("color".to_string(), "red".to_string());
        let red = widgets.list(&ctx, 0, &filter).await.unwrap();
        assert_eq!(red.count(), 2);
        assert!(red
            .items()
            .iter()
            .all(|w| w.attributes["color"] == "red"));
    }

    #[tokio::test]
    async fn widget_load_rejects_a_foreign_parent() {
        let store = seeded_store().await;
        let widgets = WidgetResource::new(store);

        let ctx = widget_ctx("globex");
        let err = widgets.load("w-anvil", &ctx).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");

        let ctx = widget_ctx("acme");
        let loaded = widgets.load("w-anvil", &ctx).await.unwrap();
        assert_eq!(loaded.kind, "widget");
    }

    #[tokio::test]
    async fn widget_create_strips_tags_and_stamps_the_account() {
        let store = seeded_store().await;
        let widgets = WidgetResource::new(store.clone());
        let ctx = widget_ctx("acme");

        let created = widgets
            .create(&ctx, &json!({"id": "spoofed", "type": "gadget", "name": "gear"}))
            .await
            .unwrap();

        let id = created["id"].as_str().unwrap();
        assert_ne!(id, "spoofed");
        assert_eq!(created["type"], "widget");
        assert_eq!(created["attributes"]["name"], "gear");
        assert_eq!(created["attributes"]["account_id"], "acme");
        assert!(created["attributes"].get("id").is_none());
        assert!(store.get("widgets", id).await.is_some());
    }

    #[test]
    fn account_reads_are_public_by_override() {
        let map = AccountResource::new(Arc::new(MemStore::new())).method_permissions();
        assert_eq!(map.get, Permissions::NONE);
        assert_eq!(map.delete, Permissions::DELETE);
    }
}
