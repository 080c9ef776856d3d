//! Page scraping: fetch, reduce HTML to readable text, cap the result

use std::time::Duration;

use dispatch_domain::tool::Outcome;
use dispatch_domain::util::cap_with_marker;

use super::{MAX_BODY_BYTES, classify_error, read_capped};

/// Tags whose entire subtree is dropped
const SKIP_TAGS: [&str; 4] = ["script", "style", "noscript", "svg"];

pub async fn scrape(
    client: &reqwest::Client,
    url: reqwest::Url,
    selector: Option<&str>,
    timeout: Duration,
    max_chars: usize,
) -> Outcome {
    let url_text = url.to_string();
    let response = match client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .and_then(|r| r.error_for_status())
    {
        Ok(r) => r,
        Err(e) => return classify_error(&e, &url_text, timeout),
    };

    let body = match read_capped(response, MAX_BODY_BYTES).await {
        Ok(b) => String::from_utf8_lossy(&b.bytes).into_owned(),
        Err(e) => return classify_error(&e, &url_text, timeout),
    };

    let text = match selector {
        Some(selector) => match select_text(&body, selector) {
            Ok(text) => text,
            Err(outcome) => return outcome,
        },
        None => html_to_text(&body),
    };

    if text.is_empty() {
        return Outcome::completed(format!("No readable text found at {}", url_text));
    }
    Outcome::completed(cap_with_marker(&text, max_chars, "... [truncated]"))
}

/// Extract readable text from HTML, stripping tags, scripts, and styles
#[cfg(feature = "html-parser")]
pub fn html_to_text(html: &str) -> String {
    use scraper::{Html, Selector};

    let document = Html::parse_document(html);
    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next());
    let parts = match body {
        Some(body) => collect_element_text(body),
        None => collect_element_text(document.root_element()),
    };
    clean_whitespace(&parts.join(" "))
}

/// Text of every element matching a CSS selector, one element per line.
#[cfg(feature = "html-parser")]
fn select_text(html: &str, selector: &str) -> Result<String, Outcome> {
    use scraper::{Html, Selector};

    let parsed = Selector::parse(selector).map_err(|e| {
        Outcome::invalid_argument(format!("Invalid CSS selector '{}': {}", selector, e))
    })?;
    let document = Html::parse_document(html);
    let blocks: Vec<String> = document
        .select(&parsed)
        .map(|element| clean_whitespace(&collect_element_text(element).join(" ")))
        .filter(|text| !text.is_empty())
        .collect();
    if blocks.is_empty() {
        return Err(Outcome::completed(format!(
            "No elements matched selector '{}'",
            selector
        )));
    }
    Ok(blocks.join("\n"))
}

#[cfg(feature = "html-parser")]
fn collect_element_text(element: scraper::ElementRef) -> Vec<String> {
    if SKIP_TAGS.contains(&element.value().name()) {
        return Vec::new();
    }

    let mut parts = Vec::new();
    for child in element.children() {
        match child.value() {
            scraper::Node::Text(text) => {
                let t = text.trim();
                if !t.is_empty() {
                    parts.push(t.to_string());
                }
            }
            scraper::Node::Element(_) => {
                if let Some(child_el) = scraper::ElementRef::wrap(child) {
                    parts.extend(collect_element_text(child_el));
                }
            }
            _ => {}
        }
    }
    parts
}

/// Regex fallback: drop skipped subtrees and tags, decode common entities.
#[cfg(not(feature = "html-parser"))]
pub fn html_to_text(html: &str) -> String {
    use regex::Regex;

    let mut text = html.to_string();
    for tag in SKIP_TAGS {
        if let Ok(block) = Regex::new(&format!(r"(?is)<{tag}\b.*?</{tag}\s*>")) {
            text = block.replace_all(&text, " ").into_owned();
        }
    }
    if let Ok(head) = Regex::new(r"(?is)<head\b.*?</head\s*>") {
        text = head.replace_all(&text, " ").into_owned();
    }
    if let Ok(tags) = Regex::new(r"(?s)<[^>]*>") {
        text = tags.replace_all(&text, " ").into_owned();
    }
    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    clean_whitespace(&decoded)
}

#[cfg(not(feature = "html-parser"))]
fn select_text(html: &str, selector: &str) -> Result<String, Outcome> {
    tracing::debug!(selector, "CSS selectors need the html-parser feature; using whole page");
    Ok(html_to_text(html))
}

/// Collapse runs of spaces and keep at most one blank line.
fn clean_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_whitespace = false;
    let mut newline_count = 0;

    for ch in text.chars() {
        if ch == '\n' {
            newline_count += 1;
            if newline_count <= 2 {
                result.push('\n');
            }
            prev_was_whitespace = true;
        } else if ch.is_whitespace() {
            if !prev_was_whitespace {
                result.push(' ');
            }
            prev_was_whitespace = true;
            newline_count = 0;
        } else {
            result.push(ch);
            prev_was_whitespace = false;
            newline_count = 0;
        }
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text_strips_script_and_style() {
        let html = r#"
        <html><head><title>T</title></head><body>
            <script>var x = 1;</script>
            <style>.foo { color: red; }</style>
            <h1>Hello</h1><p>Visible text</p>
            <noscript>No JS</noscript>
        </body></html>
        "#;
        let text = html_to_text(html);
        assert!(text.contains("Hello"));
        assert!(text.contains("Visible text"));
        assert!(!text.contains("var x = 1"));
        assert!(!text.contains("color: red"));
        assert!(!text.contains("No JS"));
    }

    #[test]
    fn test_clean_whitespace() {
        assert_eq!(clean_whitespace("  hello   world  "), "hello world");
        assert_eq!(clean_whitespace("a\n\n\n\nb"), "a\n\nb");
    }

    #[cfg(feature = "html-parser")]
    #[test]
    fn test_select_text_scopes_to_selector() {
        let html = "<body><nav>Menu</nav><article><p>One</p></article><article>Two</article></body>";
        assert_eq!(select_text(html, "article").unwrap(), "One\nTwo");
        assert_eq!(
            select_text(html, "table").unwrap_err().text(),
            "No elements matched selector 'table'"
        );
        assert!(select_text(html, "[[").unwrap_err().text().starts_with("Invalid CSS selector"));
    }

    #[tokio::test]
    async fn test_scrape_caps_output() {
        let mut server = mockito::Server::new_async().await;
        let page = format!("<html><body><p>{}</p></body></html>", "word ".repeat(1000));
        server
            .mock("GET", "/page")
            .with_header("content-type", "text/html")
            .with_body(page)
            .create_async()
            .await;

        let url = reqwest::Url::parse(&format!("{}/page", server.url())).unwrap();
        let outcome = scrape(&reqwest::Client::new(), url, None, Duration::from_secs(5), 2000).await;
        assert!(outcome.text().starts_with("word word"));
        assert!(outcome.text().ends_with("... [truncated]"));
        assert_eq!(outcome.text().chars().count(), 2000 + "... [truncated]".len());
    }

    #[tokio::test]
    async fn test_scrape_http_error() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/down").with_status(503).create_async().await;
        let url = reqwest::Url::parse(&format!("{}/down", server.url())).unwrap();
        let outcome = scrape(&reqwest::Client::new(), url, None, Duration::from_secs(5), 2000).await;
        assert_eq!(outcome.text(), "HTTP error: 503 Service Unavailable");
    }
}
