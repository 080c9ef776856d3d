//! **Network resolver**: HTTP GET/POST, file download and page scraping
//!
//! | Action | Aliases | Result |
//! |--------|---------|--------|
//! | GET | `http_get`, `fetch_url`, `curl` | status, content-type, length, preview |
//! | POST | `http_post`, `post_request` | same as GET |
//! | Download | `download_file`, `wget` | saved path and size in MB |
//! | Scrape | `scrape_webpage`, `web_fetch`, `browse` | readable page text |
//!
//! One [`reqwest::Client`] is shared by every request. Selector-scoped
//! scraping needs the `html-parser` feature; without it pages are reduced
//! to text with a regex tag stripper.

mod download;
mod http;
mod scrape;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use dispatch_application::config::EngineSettings;
use dispatch_application::ports::file_capability::FileCapability;
use dispatch_application::ports::strategy::{ResolverStrategy, StrategyFault};
use dispatch_domain::tool::{NetworkAction, Outcome, ResolverOutcome, ToolCall};
use tracing::{debug, warn};

pub use scrape::html_to_text;

const URL_KEYS: &[&str] = &["url", "uri", "link", "address", "endpoint"];

/// Most of a GET/POST or scraped body ever held in memory.
pub(crate) const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Response body read up to a byte limit.
pub(crate) struct CappedBody {
    pub bytes: Vec<u8>,
    /// The server had more to send past the limit.
    pub truncated: bool,
}

/// Stream a response body, stopping once `limit` bytes are held.
pub(crate) async fn read_capped(
    response: reqwest::Response,
    limit: usize,
) -> Result<CappedBody, reqwest::Error> {
    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let room = limit - bytes.len();
        if chunk.len() > room {
            bytes.extend_from_slice(&chunk[..room]);
            return Ok(CappedBody {
                bytes,
                truncated: true,
            });
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(CappedBody {
        bytes,
        truncated: false,
    })
}

/// Turn a transport error into the failure text callers see.
pub(crate) fn classify_error(err: &reqwest::Error, url: &str, timeout: Duration) -> Outcome {
    if err.is_timeout() {
        return timed_out(url, timeout);
    }
    if err.is_connect() {
        return Outcome::execution_failure(format!("Connection error: {}", err));
    }
    if let Some(status) = err.status() {
        return Outcome::execution_failure(format!(
            "HTTP error: {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        ));
    }
    Outcome::execution_failure(format!("Request failed: {}", err))
}

pub(crate) fn timed_out(url: &str, timeout: Duration) -> Outcome {
    Outcome::timeout(format!(
        "Request timed out after {}s: {}",
        timeout.as_secs_f64().round() as u64,
        url
    ))
}

/// Accept only absolute http(s) URLs.
fn validate_url(raw: &str) -> Result<reqwest::Url, Outcome> {
    let url = reqwest::Url::parse(raw.trim())
        .map_err(|e| Outcome::invalid_argument(format!("Invalid URL '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Outcome::invalid_argument(format!(
            "Unsupported URL scheme '{}': only http and https are allowed",
            scheme
        ))),
    }
}

pub struct NetworkResolver {
    client: reqwest::Client,
    workspace_root: PathBuf,
    settings: EngineSettings,
    files: Option<Arc<dyn FileCapability>>,
}

impl NetworkResolver {
    pub fn new(
        workspace_root: impl Into<PathBuf>,
        settings: EngineSettings,
        files: Option<Arc<dyn FileCapability>>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(settings.network.user_agent.clone())
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to configure HTTP client, using defaults: {}", e);
                reqwest::Client::new()
            });
        Self {
            client,
            workspace_root: workspace_root.into(),
            settings,
            files,
        }
    }

    pub async fn run(&self, action: NetworkAction, call: &ToolCall) -> Outcome {
        let Some(raw_url) = call.first_string(URL_KEYS) else {
            return Outcome::invalid_argument("Missing required argument: url");
        };
        let url = match validate_url(raw_url) {
            Ok(url) => url,
            Err(outcome) => return outcome,
        };
        debug!(?action, url = %url, "Network action");

        match action {
            NetworkAction::Get | NetworkAction::Post => {
                let timeout = self.settings.request_timeout(call.get_f64("timeout"));
                http::request(
                    &self.client,
                    action == NetworkAction::Post,
                    url,
                    call,
                    timeout,
                    self.settings.network.preview_chars,
                )
                .await
            }
            NetworkAction::Download => {
                let target = download::target_name(call, &url);
                let path = match &self.files {
                    Some(files) => files.resolve_path(&target),
                    None => crate::files::confine_to_workspace(&self.workspace_root, &target),
                };
                match path {
                    Ok(path) => {
                        download::download(
                            &self.client,
                            url,
                            &path,
                            &target,
                            self.settings.network.download_timeout,
                        )
                        .await
                    }
                    Err(e) => Outcome::invalid_argument(e),
                }
            }
            NetworkAction::Scrape => {
                let timeout = self.settings.request_timeout(call.get_f64("timeout"));
                scrape::scrape(
                    &self.client,
                    url,
                    call.first_string(&["selector", "css_selector"]),
                    timeout,
                    self.settings.network.scrape_chars,
                )
                .await
            }
        }
    }
}

#[async_trait]
impl ResolverStrategy for NetworkResolver {
    fn name(&self) -> &'static str {
        "network"
    }

    fn applies(&self, call: &ToolCall) -> bool {
        NetworkAction::resolve(call).is_some()
    }

    async fn resolve(&self, call: &ToolCall) -> Result<ResolverOutcome, StrategyFault> {
        let action = NetworkAction::resolve(call)
            .ok_or_else(|| StrategyFault::apply(self.name(), "not a network action"))?;
        Ok(self.run(action, call).await.into())
    }
}
