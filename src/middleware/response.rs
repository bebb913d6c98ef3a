use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Map, Value};

/// Uniform success envelope: `{data}` for items, `{data, meta, links}` for
/// collections, an empty body for deletes.
#[derive(Debug)]
pub struct Envelope {
    pub data: Value,
    pub meta: Option<Value>,
    pub links: Option<Value>,
    pub status: StatusCode,
}

impl Envelope {
    /// Single-item response with default 200 status
    pub fn item(data: Value) -> Self {
        Self {
            data,
            meta: None,
            links: None,
            status: StatusCode::OK,
        }
    }

    /// Create a 201 Created response
    pub fn created(data: Value) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::item(data)
        }
    }

    /// Collection listing with pagination metadata
    pub fn collection(data: Vec<Value>, meta: Value) -> Self {
        Self {
            data: Value::Array(data),
            meta: Some(meta),
            links: Some(json!({})),
            status: StatusCode::OK,
        }
    }

    /// Create a 204 No Content response (empty body)
    pub fn no_content() -> Self {
        Self {
            data: Value::Null,
            meta: None,
            links: None,
            status: StatusCode::NO_CONTENT,
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        // For 204 No Content, return empty response
        if self.status == StatusCode::NO_CONTENT {
            return self.status.into_response();
        }

        let mut body = Map::new();
        body.insert("data".into(), self.data);
        if let Some(meta) = self.meta {
            body.insert("meta".into(), meta);
        }
        if let Some(links) = self.links {
            body.insert("links".into(), links);
        }

        (self.status, Json(Value::Object(body))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_envelope_carries_meta_and_links() {
        let env = Envelope::collection(vec![json!({"id": "a"})], json!({"total": 1}));
        assert_eq!(env.status, StatusCode::OK);
        assert_eq!(env.links, Some(json!({})));
        assert_eq!(env.data.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn no_content_has_no_body() {
        let env = Envelope::no_content();
        assert_eq!(env.status, StatusCode::NO_CONTENT);
        assert!(env.data.is_null());
    }
}
