mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn root_banner_and_health() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/", server.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["name"], "Trellis API");

    let res = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn unknown_paths_are_not_found() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    for path in ["/gadgets", "/accounts/acme/gadgets", "/accounts/a/b/widgets"] {
        let res = client
            .get(format!("{}{}", server.base_url, path))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "path: {}", path);
        let body = res.json::<serde_json::Value>().await?;
        assert_eq!(body["code"], "NOT_FOUND", "path: {}", path);
    }

    Ok(())
}

#[tokio::test]
async fn account_directory_is_readable_without_a_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/accounts", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    let data = body["data"].as_array().cloned().unwrap_or_default();
    assert!(
        data.iter().any(|a| a["id"] == "acme"),
        "missing seeded account: {}",
        body
    );
    assert_eq!(body["links"], serde_json::json!({}));

    Ok(())
}

#[tokio::test]
async fn item_urls_match_with_and_without_trailing_slash() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    for path in ["/accounts/acme", "/accounts/acme/"] {
        let res = client
            .get(format!("{}{}", server.base_url, path))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK, "path: {}", path);
        let body = res.json::<serde_json::Value>().await?;
        assert_eq!(body["data"]["id"], "acme", "path: {}", path);
        assert_eq!(body["data"]["type"], "account", "path: {}", path);
    }

    Ok(())
}
