use std::collections::{BTreeMap, HashMap};

use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::permissions::{Acl, Permissions};

/// One stored row: attributes plus the instance ACL.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub attributes: Map<String, Value>,
    pub acl: Acl,
}

type Table = BTreeMap<String, StoredRecord>;

/// In-memory backing store for the demo resources.
///
/// Tables are ordered maps so listings are deterministic. This is
/// collaborator-private state; the dispatcher itself never touches it.
#[derive(Default)]
pub struct MemStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, table: &str, id: &str) -> Option<StoredRecord> {
        self.tables
            .read()
            .await
            .get(table)
            .and_then(|t| t.get(id))
            .cloned()
    }

    pub async fn put(&self, table: &str, id: &str, record: StoredRecord) {
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .insert(id.to_string(), record);
    }

    pub async fn remove(&self, table: &str, id: &str) -> Option<StoredRecord> {
        self.tables
            .write()
            .await
            .get_mut(table)
            .and_then(|t| t.remove(id))
    }

    pub async fn scan(&self, table: &str) -> Vec<(String, StoredRecord)> {
        self.tables
            .read()
            .await
            .get(table)
            .map(|t| t.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }
}

/// Principal that owns the seeded demo data
pub const DEV_USER_ID: Uuid = Uuid::from_u128(0x7E11150000000000000000000000D07);

/// Seed a demo account plus a few widgets so the API is observable out of the
/// box. The dev principal holds full grants on the account; widgets carry no
/// grants of their own and inherit access through the ancestor chain.
pub async fn seed_demo(store: &MemStore) {
    let mut acl = Acl::default();
    acl.grants.insert(DEV_USER_ID, Permissions::all());

    let mut account = Map::new();
    account.insert("name".into(), json!("Acme Co"));
    store
        .put(
            "accounts",
            "acme",
            StoredRecord {
                attributes: account,
                acl,
            },
        )
        .await;

    let widgets = [
        ("w-anvil", "anvil", "red"),
        ("w-rocket", "rocket", "red"),
        ("w-magnet", "magnet", "blue"),
    ];
    for (id, name, color) in widgets {
        let mut attributes = Map::new();
        attributes.insert("name".into(), json!(name));
        attributes.insert("color".into(), json!(color));
        attributes.insert("account_id".into(), json!("acme"));
        store
            .put(
                "widgets",
                id,
                StoredRecord {
                    attributes,
                    acl: Acl::default(),
                },
            )
            .await;
    }

    tracing::info!("seeded demo account 'acme' with {} widgets", widgets.len());
}
