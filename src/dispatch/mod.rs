pub mod context;
pub mod query;

pub use context::RequestContext;

use std::sync::Arc;

use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::Method,
    response::{IntoResponse, Response},
    Extension,
};
use serde_json::{json, Value};
use url::form_urlencoded;

use crate::auth::Identity;
use crate::config;
use crate::error::ApiError;
use crate::middleware::Envelope;
use crate::permissions::Permissions;
use crate::resource::{LoadedResource, NodeId, Registry, ResourceNode};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

/// Catch-all HTTP entry point: match the path against the registry, build the
/// request context, and run the dispatcher.
pub async fn handle(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    request: Request,
) -> Response {
    match dispatch_request(state, identity, request).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn dispatch_request(
    state: AppState,
    identity: Identity,
    request: Request,
) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();

    let Some((node, path_params)) = state.registry.match_path(&path) else {
        return Err(ApiError::not_found(format!("no resource matches {}", path)));
    };

    let query: Vec<(String, String)> = parts
        .uri
        .query()
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();

    let bytes = to_bytes(body, config::config().api.max_request_size_bytes)
        .await
        .map_err(|e| ApiError::bad_request(format!("failed to read request body: {}", e)))?;
    let body = if bytes.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&bytes).map_err(|e| {
            ApiError::invalid_json(format!("request body is not valid JSON: {}", e))
        })?)
    };

    let mut ctx = RequestContext::new(identity);
    ctx.path_params = path_params;
    ctx.query = query;
    ctx.body = body;

    let mut dispatcher = Dispatcher::bind(&state.registry, node, ctx);
    dispatcher.prepare(&parts.method).await?;
    let envelope = dispatcher.dispatch(&parts.method).await?;
    Ok(envelope.into_response())
}

/// Binds one resource node to one request and walks it through the verb state
/// machine: ancestors loaded and permissions checked first, then exactly one
/// CRUD operation. A dispatcher lives for a single request.
pub struct Dispatcher<'a> {
    registry: &'a Registry,
    node: NodeId,
    ctx: RequestContext,
    /// Leaf instance, present only when the URL carried the leaf identifier
    current: Option<LoadedResource>,
}

impl<'a> Dispatcher<'a> {
    pub fn bind(registry: &'a Registry, node: NodeId, ctx: RequestContext) -> Self {
        Self {
            registry,
            node,
            ctx,
            current: None,
        }
    }

    fn leaf(&self) -> &ResourceNode {
        self.registry.node(self.node)
    }

    /// Ancestor loading and the permission gate. Must succeed before any verb
    /// handler runs; a failure here is terminal for the request.
    ///
    /// Every node on the root-to-leaf chain whose identifier was captured is
    /// loaded, top-down; nodes without a captured identifier are skipped. The
    /// effective bitmask is computed from the loaded chain only, so it can
    /// never depend on state that would only exist after a write.
    pub async fn prepare(&mut self, method: &Method) -> Result<(), ApiError> {
        let mut loaded = Vec::new();
        for nid in self.registry.chain(self.node) {
            let node = self.registry.node(nid);
            let key = format!("{}_id", node.def.name);
            if let Some(id) = self.ctx.path_params.get(&key).cloned() {
                loaded.push(node.handler.load(&id, &self.ctx).await?);
            }
        }

        let leaf_key = format!("{}_id", self.leaf().def.name);
        if self.ctx.path_params.contains_key(&leaf_key) {
            self.current = loaded.last().cloned();
        }

        let permissions =
            Permissions::resolve(&self.ctx.identity, loaded.iter().map(|r| &r.acl));
        self.ctx.permissions = permissions;

        let required = self
            .leaf()
            .handler
            .method_permissions()
            .required(method)
            .ok_or_else(|| {
                ApiError::method_not_allowed(format!("{} is not supported here", method))
            })?;

        tracing::debug!(
            resource = %self.leaf().def.name,
            ?required,
            effective = ?permissions,
            "permission gate"
        );

        if required != Permissions::NONE && (permissions & required).is_empty() {
            if self.ctx.identity.is_anonymous() {
                return Err(ApiError::unauthorized("authentication required"));
            }
            return Err(ApiError::forbidden(
                "insufficient permissions for this resource",
            ));
        }

        Ok(())
    }

    /// Route the verb to the resource operation. Assumes `prepare` succeeded.
    pub async fn dispatch(&self, method: &Method) -> Result<Envelope, ApiError> {
        let handler = &self.leaf().handler;

        if method == Method::GET {
            // Item read when the identifier was captured, listing otherwise
            if let Some(item) = &self.current {
                let data = handler.read(&self.ctx, item).await?;
                return Ok(Envelope::item(data));
            }

            let page = query::page(&self.ctx.query)?;
            let filter = query::parse_filter(&self.ctx.query);
            // Callers see 1-based pages; storage sees a 0-based offset
            let selector = handler.list(&self.ctx, page - 1, &filter).await?;
            let data = selector.items().iter().map(LoadedResource::to_value).collect();
            let meta = json!({
                "total": selector.count(),
                "perPage": handler.page_size(),
            });
            return Ok(Envelope::collection(data, meta));
        }

        if method == Method::POST {
            if self.current.is_some() {
                return Err(ApiError::validation_error(
                    "create is a collection-level operation; remove the item identifier",
                    None,
                ));
            }
            let data = self.body_data()?;
            let created = handler.create(&self.ctx, data).await?;
            return Ok(Envelope::created(created));
        }

        if method == Method::PUT {
            let item = self.current()?;
            let data = self.body_data()?;
            self.check_body_id(data, item)?;
            let replaced = handler.replace(&self.ctx, item, data).await?;
            return Ok(Envelope::item(replaced));
        }

        if method == Method::PATCH {
            let item = self.current()?;
            let data = self.body_data()?;
            self.check_body_id(data, item)?;
            self.check_body_type(data)?;
            let updated = handler.update(&self.ctx, item, data).await?;
            return Ok(Envelope::item(updated));
        }

        if method == Method::DELETE {
            let item = self.current()?;
            handler.delete(&self.ctx, item).await?;
            return Ok(Envelope::no_content());
        }

        // prepare() already rejects anything outside the verb map
        Err(ApiError::method_not_allowed(format!(
            "{} is not supported here",
            method
        )))
    }

    fn current(&self) -> Result<&LoadedResource, ApiError> {
        self.current.as_ref().ok_or_else(|| {
            ApiError::validation_error("this operation requires an item identifier", None)
        })
    }

    fn body_data(&self) -> Result<&Value, ApiError> {
        self.ctx
            .body
            .as_ref()
            .and_then(|body| body.get("data"))
            .filter(|data| data.is_object())
            .ok_or_else(|| {
                ApiError::validation_error("request body must contain a 'data' object", None)
            })
    }

    fn check_body_id(&self, data: &Value, item: &LoadedResource) -> Result<(), ApiError> {
        match data.get("id").and_then(Value::as_str) {
            Some(id) if id == item.id => Ok(()),
            Some(id) => Err(ApiError::validation_error(
                format!("body id '{}' does not match path id '{}'", id, item.id),
                None,
            )),
            None => Err(ApiError::validation_error(
                "body must declare the resource id",
                None,
            )),
        }
    }

    fn check_body_type(&self, data: &Value) -> Result<(), ApiError> {
        let expected = &self.leaf().def.name;
        match data.get("type").and_then(Value::as_str) {
            Some(kind) if kind == expected => Ok(()),
            Some(kind) => Err(ApiError::validation_error(
                format!("body type '{}' does not match resource '{}'", kind, expected),
                None,
            )),
            None => Err(ApiError::validation_error(
                "body must declare the resource type",
                None,
            )),
        }
    }
}
