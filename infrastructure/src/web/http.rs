//! GET and POST requests

use std::time::Duration;

use dispatch_domain::tool::{Outcome, ToolCall};
use dispatch_domain::util::cap_with_marker;
use serde_json::Value;

use super::{MAX_BODY_BYTES, classify_error, read_capped};

/// Send a GET or POST and describe the response.
///
/// Non-2xx statuses are reported, not treated as failures; the caller sees
/// the status line and decides.
pub async fn request(
    client: &reqwest::Client,
    post: bool,
    url: reqwest::Url,
    call: &ToolCall,
    timeout: Duration,
    preview_chars: usize,
) -> Outcome {
    let url_text = url.to_string();
    let mut builder = if post {
        client.post(url)
    } else {
        client.get(url)
    };
    builder = builder.timeout(timeout);

    if let Some(headers) = call.get_object("headers") {
        for (name, value) in headers {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            builder = builder.header(name.as_str(), value);
        }
    }

    if post {
        if let Some(json) = call.get_object("json") {
            builder = builder.json(json);
        } else {
            match call.arguments.get("data") {
                Some(Value::Object(data)) => builder = builder.json(data),
                Some(Value::String(raw)) => builder = builder.body(raw.clone()),
                Some(other) => builder = builder.body(other.to_string()),
                None => {}
            }
        }
    }

    let response = match builder.send().await {
        Ok(r) => r,
        Err(e) => return classify_error(&e, &url_text, timeout),
    };

    let status = response.status();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let declared = response.content_length();
    let body = match read_capped(response, MAX_BODY_BYTES).await {
        Ok(b) => b,
        Err(e) => return classify_error(&e, &url_text, timeout),
    };
    let text = String::from_utf8_lossy(&body.bytes);
    let length = match (declared, body.truncated) {
        (Some(total), _) => format!("{} bytes", total),
        (None, false) => format!("{} bytes", body.bytes.len()),
        (None, true) => format!("more than {} bytes", body.bytes.len()),
    };

    Outcome::completed(format!(
        "Status: {} {}\nContent-Type: {}\nContent-Length: {}\n\n{}",
        status.as_u16(),
        status.canonical_reason().unwrap_or(""),
        content_type,
        length,
        cap_with_marker(&text, preview_chars, "... [truncated]")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn url(server: &mockito::Server, path: &str) -> reqwest::Url {
        reqwest::Url::parse(&format!("{}{}", server.url(), path)).unwrap()
    }

    #[tokio::test]
    async fn test_get_reports_status_and_preview() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/hello")
            .match_header("x-token", "abc")
            .with_status(200)
            .with_header("content-type", "text/plain")
            .with_body("hello world")
            .create_async()
            .await;

        let call = ToolCall::new("http_get").with_arg("headers", serde_json::json!({"x-token": "abc"}));
        let outcome = request(
            &reqwest::Client::new(),
            false,
            url(&server, "/hello"),
            &call,
            Duration::from_secs(5),
            500,
        )
        .await;

        mock.assert_async().await;
        assert_eq!(
            outcome.text(),
            "Status: 200 OK\nContent-Type: text/plain\nContent-Length: 11 bytes\n\nhello world"
        );
    }

    #[tokio::test]
    async fn test_preview_is_capped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/big")
            .with_body("x".repeat(2000))
            .create_async()
            .await;

        let outcome = request(
            &reqwest::Client::new(),
            false,
            url(&server, "/big"),
            &ToolCall::new("http_get"),
            Duration::from_secs(5),
            500,
        )
        .await;
        assert!(outcome.text().contains("Content-Length: 2000 bytes"));
        assert!(outcome.text().ends_with(&format!("{}... [truncated]", "x".repeat(500))));
    }

    #[tokio::test]
    async fn test_oversized_body_is_not_buffered_whole() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/huge")
            .with_body("z".repeat(MAX_BODY_BYTES * 2))
            .create_async()
            .await;

        let outcome = request(
            &reqwest::Client::new(),
            false,
            url(&server, "/huge"),
            &ToolCall::new("http_get"),
            Duration::from_secs(10),
            500,
        )
        .await;
        assert!(outcome.is_completed());
        assert!(outcome.text().starts_with("Status: 200 OK"));
        assert!(outcome.text().ends_with(&format!("{}... [truncated]", "z".repeat(500))));
    }

    #[tokio::test]
    async fn test_post_json_data() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/items")
            .match_body(Matcher::Json(serde_json::json!({"name": "widget"})))
            .with_status(201)
            .with_body("created")
            .create_async()
            .await;

        let call = ToolCall::new("http_post").with_arg("data", serde_json::json!({"name": "widget"}));
        let outcome = request(
            &reqwest::Client::new(),
            true,
            url(&server, "/items"),
            &call,
            Duration::from_secs(5),
            500,
        )
        .await;

        mock.assert_async().await;
        assert!(outcome.text().starts_with("Status: 201 Created"));
    }

    #[tokio::test]
    async fn test_post_raw_string_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/raw")
            .match_body("a=1&b=2")
            .with_body("ok")
            .create_async()
            .await;

        let call = ToolCall::new("http_post").with_arg("data", "a=1&b=2");
        request(
            &reqwest::Client::new(),
            true,
            url(&server, "/raw"),
            &call,
            Duration::from_secs(5),
            500,
        )
        .await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_reported_not_failed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body("nope")
            .create_async()
            .await;

        let outcome = request(
            &reqwest::Client::new(),
            false,
            url(&server, "/missing"),
            &ToolCall::new("http_get"),
            Duration::from_secs(5),
            500,
        )
        .await;
        assert!(outcome.is_completed());
        assert!(outcome.text().starts_with("Status: 404 Not Found"));
    }
}
