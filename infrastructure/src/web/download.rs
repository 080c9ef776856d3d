//! Streamed file download into the workspace

use std::path::Path;
use std::time::Duration;

use dispatch_domain::tool::{Outcome, ToolCall};
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{classify_error, timed_out};

const FALLBACK_NAME: &str = "download.bin";

/// Target file name: explicit argument, else the URL's last path segment.
pub fn target_name(call: &ToolCall, url: &reqwest::Url) -> String {
    if let Some(name) = call.first_string(&["filename", "file_name", "path", "destination"]) {
        return name.trim().to_string();
    }
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}

pub async fn download(
    client: &reqwest::Client,
    url: reqwest::Url,
    path: &Path,
    display_name: &str,
    timeout: Duration,
) -> Outcome {
    let url_text = url.to_string();
    match tokio::time::timeout(timeout, fetch_to_file(client, url, path, timeout)).await {
        Ok(Ok(bytes)) => {
            debug!(path = %path.display(), bytes, "Download complete");
            Outcome::completed(format!(
                "Downloaded {} to '{}' ({:.2} MB)",
                url_text,
                display_name,
                bytes as f64 / (1024.0 * 1024.0)
            ))
        }
        Ok(Err(outcome)) => {
            let _ = tokio::fs::remove_file(path).await;
            outcome
        }
        Err(_) => {
            let _ = tokio::fs::remove_file(path).await;
            timed_out(&url_text, timeout)
        }
    }
}

async fn fetch_to_file(
    client: &reqwest::Client,
    url: reqwest::Url,
    path: &Path,
    timeout: Duration,
) -> Result<u64, Outcome> {
    let url_text = url.to_string();
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| classify_error(&e, &url_text, timeout))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Outcome::execution_failure(format!("Failed to create directory: {}", e)))?;
    }
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| Outcome::execution_failure(format!("Failed to create file: {}", e)))?;

    let mut written = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| classify_error(&e, &url_text, timeout))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| Outcome::execution_failure(format!("Failed to write file: {}", e)))?;
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| Outcome::execution_failure(format!("Failed to write file: {}", e)))?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_name() {
        let url = reqwest::Url::parse("https://example.com/files/report.pdf?x=1").unwrap();
        assert_eq!(target_name(&ToolCall::new("download"), &url), "report.pdf");

        let call = ToolCall::new("download").with_arg("filename", "out/r.pdf");
        assert_eq!(target_name(&call, &url), "out/r.pdf");

        let bare = reqwest::Url::parse("https://example.com/").unwrap();
        assert_eq!(target_name(&ToolCall::new("download"), &bare), "download.bin");
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/data.bin")
            .with_body(vec![7u8; 4096])
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("data.bin");
        let url = reqwest::Url::parse(&format!("{}/data.bin", server.url())).unwrap();

        let outcome = download(
            &reqwest::Client::new(),
            url,
            &path,
            "sub/data.bin",
            Duration::from_secs(10),
        )
        .await;

        assert!(outcome.is_completed(), "{}", outcome.text());
        assert!(outcome.text().ends_with("to 'sub/data.bin' (0.00 MB)"));
        assert_eq!(std::fs::read(&path).unwrap().len(), 4096);
    }

    #[tokio::test]
    async fn test_download_http_error() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/gone").with_status(404).create_async().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone");
        let url = reqwest::Url::parse(&format!("{}/gone", server.url())).unwrap();

        let outcome = download(&reqwest::Client::new(), url, &path, "gone", Duration::from_secs(10)).await;
        assert_eq!(outcome.text(), "HTTP error: 404 Not Found");
        assert!(!path.exists());
    }
}
