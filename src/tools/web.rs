//! Web access tools: search and fetch URLs.

use std::time::Duration;

use async_trait::async_trait;

use super::{Tool, ToolContext};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; ReactAgent/0.1)";
const MAX_RESULTS: usize = 5;
const MAX_PAGE_CHARS: usize = 20_000;

/// Search the web through DuckDuckGo's HTML endpoint.
pub struct WebSearch;

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information. The input is the search query. Returns result titles, snippets and URLs."
    }

    async fn execute(&self, ctx: &ToolContext, input: &str) -> anyhow::Result<String> {
        let query = input.trim();
        if query.is_empty() {
            anyhow::bail!("Missing search query");
        }

        let url = format!(
            "https://html.duckduckgo.com/html/?q={}",
            urlencoding::encode(query)
        );

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        let html = tokio::select! {
            _ = ctx.cancel.cancelled() => anyhow::bail!("Search cancelled"),
            res = async { Ok::<_, reqwest::Error>(client.get(&url).send().await?.text().await?) } => res?,
        };

        let results = extract_ddg_results(&html);

        if results.is_empty() {
            Ok(format!("No results found for: {}", query))
        } else {
            Ok(results.join("\n\n"))
        }
    }
}

/// Extract search results from DuckDuckGo HTML.
fn extract_ddg_results(html: &str) -> Vec<String> {
    let mut results = Vec::new();

    for chunk in html.split("class=\"result__body\"").skip(1) {
        if results.len() >= MAX_RESULTS {
            break;
        }

        let title = inner_text_after(chunk, "class=\"result__a\"").unwrap_or("");
        let snippet = inner_text_after(chunk, "class=\"result__snippet\"").unwrap_or("");
        let url = inner_text_after(chunk, "class=\"result__url\"")
            .map(str::trim)
            .unwrap_or("");

        if !title.is_empty() {
            results.push(format!(
                "{}\n{}\nURL: {}",
                html_decode(title),
                html_decode(snippet),
                url
            ));
        }
    }

    results
}

/// Text between the `>` closing the tag that carries `marker` and the next `<`.
fn inner_text_after<'a>(chunk: &'a str, marker: &str) -> Option<&'a str> {
    chunk
        .split(marker)
        .nth(1)
        .and_then(|s| s.split('>').nth(1))
        .and_then(|s| s.split('<').next())
}

/// Basic HTML entity decoding.
fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
}

/// Fetch the content of a URL.
pub struct FetchUrl;

#[async_trait]
impl Tool for FetchUrl {
    fn name(&self) -> &str {
        "fetch_url"
    }

    fn description(&self) -> &str {
        "Fetch an http(s) URL and return its text content. The input is the URL."
    }

    async fn execute(&self, ctx: &ToolContext, input: &str) -> anyhow::Result<String> {
        let url = parse_http_url(input)?;

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        let response = tokio::select! {
            _ = ctx.cancel.cancelled() => anyhow::bail!("Fetch cancelled"),
            res = client.get(url).send() => res?,
        };
        let status = response.status();

        if !status.is_success() {
            anyhow::bail!("HTTP error: {}", status);
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("text/html"));

        let body = response.text().await?;
        let text = if is_html {
            extract_text_from_html(&body)
        } else {
            body
        };

        if text.chars().count() > MAX_PAGE_CHARS {
            let head: String = text.chars().take(MAX_PAGE_CHARS).collect();
            Ok(format!(
                "{}... [content truncated, showing first {} chars]",
                head, MAX_PAGE_CHARS
            ))
        } else {
            Ok(text)
        }
    }
}

fn parse_http_url(input: &str) -> anyhow::Result<url::Url> {
    let raw = input.trim();
    let url = url::Url::parse(raw).map_err(|e| anyhow::anyhow!("Invalid URL '{}': {}", raw, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => anyhow::bail!("Unsupported URL scheme: {}", other),
    }
}

/// Extract readable text from HTML.
fn extract_text_from_html(html: &str) -> String {
    let text = strip_element(html, "<script", "</script>");
    let text = strip_element(&text, "<style", "</style>");

    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;

    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                result.push(' ');
            }
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    let result = result.split_whitespace().collect::<Vec<_>>().join(" ");
    html_decode(&result)
}

fn strip_element(html: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find(open) {
        out.push_str(&rest[..start]);
        match rest[start..].find(close) {
            Some(end) => rest = &rest[start + end + close.len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_text_drops_scripts_and_tags() {
        let html = "<html><head><style>p{}</style><script>var x = 1;</script></head>\
                    <body><p>Paris &amp; Lyon</p></body></html>";
        assert_eq!(extract_text_from_html(html), "Paris & Lyon");
    }

    #[test]
    fn ddg_results_are_extracted() {
        let html = r#"<div class="result__body"><a class="result__a" href="x">Paris</a>
            <a class="result__snippet">Capital of France</a>
            <a class="result__url"> en.wikipedia.org </a></div>"#;
        let results = extract_ddg_results(html);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0], "Paris\nCapital of France\nURL: en.wikipedia.org");
    }

    #[test]
    fn only_http_urls_are_fetched() {
        assert!(parse_http_url(" https://example.com/a ").is_ok());
        assert!(parse_http_url("file:///etc/passwd").is_err());
        assert!(parse_http_url("not a url").is_err());
    }
}
