use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::auth::{Claims, Identity};
use crate::config;
use crate::error::ApiError;

/// Identity resolution middleware.
///
/// A missing Authorization header resolves to the anonymous identity rather
/// than an error; whether anonymous access is acceptable is decided later by
/// the permission gate. A present-but-invalid bearer token is rejected here.
pub async fn identity_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, impl IntoResponse> {
    let identity = match bearer_token(&headers) {
        None => Identity::anonymous(),
        Some(token) => match validate_token(&token) {
            Ok(claims) => Identity::from(claims),
            Err(msg) => {
                let api_error = ApiError::unauthorized(msg);
                return Err((
                    StatusCode::from_u16(api_error.status_code())
                        .unwrap_or(StatusCode::UNAUTHORIZED),
                    Json(api_error.to_json()),
                ));
            }
        },
    };

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Extract the bearer token from the Authorization header, if any
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))?
        .to_str()
        .ok()?;

    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Validate JWT token and extract claims
fn validate_token(token: &str) -> Result<Claims, String> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err("JWT secret not configured".to_string());
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| format!("Invalid JWT token: {}", e))?;

    Ok(token_data.claims)
}
