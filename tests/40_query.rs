mod common;

use anyhow::Result;
use reqwest::StatusCode;

async fn list_widgets(query: &str) -> Result<(StatusCode, serde_json::Value)> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!(
            "{}/accounts/acme/widgets{}",
            server.base_url, query
        ))
        .header("Authorization", common::dev_bearer())
        .send()
        .await?;
    let status = res.status();
    let body = res.json::<serde_json::Value>().await?;
    Ok((status, body))
}

#[tokio::test]
async fn page_below_one_is_a_validation_error() -> Result<()> {
    for query in ["?page=0", "?page=-2"] {
        let (status, body) = list_widgets(query).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "query: {}", query);
        assert_eq!(body["code"], "VALIDATION_ERROR", "query: {}", query);
    }
    Ok(())
}

#[tokio::test]
async fn non_numeric_page_is_a_validation_error() -> Result<()> {
    let (status, body) = list_widgets("?page=abc").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn page_past_the_end_is_empty_but_keeps_the_total() -> Result<()> {
    // Three widgets seeded, well under one page
    let (status, body) = list_widgets("?page=2").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0), "body: {}", body);
    assert_eq!(body["meta"]["total"], 3, "body: {}", body);
    Ok(())
}

#[tokio::test]
async fn repeated_filter_keys_keep_the_last_value() -> Result<()> {
    let (status, body) =
        list_widgets("?filter%5Bcolor%5D=blue&filter%5Bcolor%5D=red").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 2, "body: {}", body);
    for widget in body["data"].as_array().cloned().unwrap_or_default() {
        assert_eq!(widget["attributes"]["color"], "red");
    }
    Ok(())
}

#[tokio::test]
async fn filters_on_an_unknown_field_match_nothing() -> Result<()> {
    let (status, body) = list_widgets("?filter%5Bshape%5D=round").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 0, "body: {}", body);
    Ok(())
}
