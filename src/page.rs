use reqwest::Url;

use crate::{config, errors};

const PLATFORMS: &str = r"(?i)youtube\.com|vimeo\.com";

/// Fetch the page and collect every video URL on it, in document order.
pub async fn scan(url: &str) -> Result<Vec<String>, errors::ScanError> {
    let base = Url::parse(url).map_err(|e| errors::ScanError::InvalidUrl(format!("{url} ({e})")))?;
    let html = fetch(base.as_str()).await?;
    extract_video_urls(&html, &base)
}

pub async fn fetch(url: &str) -> Result<String, errors::ScanError> {
    log::info!("The URL: {url}");
    let resp = reqwest::Client::new()
        .get(url)
        .header(reqwest::header::USER_AGENT, config::USER_AGENT)
        .send()
        .await?
        .error_for_status()?;
    let html = resp.text().await?;
    log::debug!("Fetched {} bytes", html.len());
    Ok(html)
}

/// Video and nested source hits are joined against `base`; matching iframes are kept verbatim
/// and always come after them.
pub fn extract_video_urls(html: &str, base: &Url) -> Result<Vec<String>, errors::ScanError> {
    let document = scraper::Html::parse_document(html);
    let mut urls = Vec::new();

    // Get the attr src of video, then of the source tags under it
    let video = scraper::Selector::parse("video").map_err(|_| errors::ScanError::ParseFailed)?;
    let source = scraper::Selector::parse("source").map_err(|_| errors::ScanError::ParseFailed)?;
    for element in document.select(&video) {
        let nested = element
            .select(&source)
            .filter_map(|s| s.value().attr("src"));
        for src in element.value().attr("src").into_iter().chain(nested) {
            if src.is_empty() {
                continue;
            }
            match base.join(src) {
                Ok(joined) => urls.push(joined.to_string()),
                Err(e) => log::warn!("Unable to resolve video src {src}: {e}"),
            }
        }
    }

    // Get the attr src of iframe, only for known platforms
    let iframe = scraper::Selector::parse("iframe").map_err(|_| errors::ScanError::ParseFailed)?;
    let platforms = regex::Regex::new(PLATFORMS).map_err(|_| errors::ScanError::ParseFailed)?;
    urls.extend(
        document
            .select(&iframe)
            .filter_map(|x| x.value().attr("src"))
            .filter(|src| platforms.is_match(src))
            .map(str::to_owned),
    );

    log::info!("Parsed video URLs: {urls:?}");
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    const PAGE: &str = "https://example.com/articles/page.html";

    fn extract(body: &str) -> Vec<String> {
        let html = format!("<html><body>{body}</body></html>");
        extract_video_urls(&html, &Url::parse(PAGE).unwrap()).unwrap()
    }

    #[test]
    fn no_matching_elements() {
        assert!(extract("<p>nothing here</p><img src=\"a.png\">").is_empty());
    }

    #[test]
    fn video_src_is_joined() {
        assert_eq!(
            extract(r#"<video src="a.mp4"></video>"#),
            vec!["https://example.com/articles/a.mp4"]
        );
    }

    #[test]
    fn nested_source_is_joined() {
        assert_eq!(
            extract(r#"<video><source src="b.mp4" type="video/mp4"></video>"#),
            vec!["https://example.com/articles/b.mp4"]
        );
    }

    #[test]
    fn youtube_iframe_is_verbatim() {
        assert_eq!(
            extract(r#"<iframe src="https://www.youtube.com/embed/xyz"></iframe>"#),
            vec!["https://www.youtube.com/embed/xyz"]
        );
    }

    #[test]
    fn platform_match_ignores_case() {
        assert_eq!(
            extract(r#"<iframe src="//player.VIMEO.com/video/42"></iframe>"#),
            vec!["//player.VIMEO.com/video/42"]
        );
    }

    #[test]
    fn unknown_iframe_is_skipped() {
        assert!(extract(r#"<iframe src="https://example.com/ad"></iframe>"#).is_empty());
    }

    #[test]
    fn video_hits_come_before_iframes_without_dedup() {
        let urls = extract(concat!(
            r#"<iframe src="https://vimeo.com/1"></iframe>"#,
            r#"<video src="/clips/a.mp4"><source src="a.webm"><source src=""></video>"#,
            r#"<video src="/clips/a.mp4"></video>"#,
        ));
        assert_eq!(
            urls,
            vec![
                "https://example.com/clips/a.mp4",
                "https://example.com/articles/a.webm",
                "https://example.com/clips/a.mp4",
                "https://vimeo.com/1",
            ]
        );
    }

    #[test]
    fn source_outside_video_is_ignored() {
        assert!(extract(r#"<audio><source src="song.mp3"></audio>"#).is_empty());
    }

    /// Serve one canned response and hand back the raw request.
    async fn serve_once(response: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = stream.read(&mut buf).await.unwrap();
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });
        (format!("http://{addr}/watch/index.html"), handle)
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[tokio::test]
    async fn scan_fetches_with_browser_user_agent() {
        let (url, handle) =
            serve_once(http_response("200 OK", r#"<video src="clip.mp4"></video>"#)).await;
        let urls = scan(&url).await.unwrap();
        let request = handle.await.unwrap();
        assert!(request.to_lowercase().contains("user-agent: mozilla/5.0"));
        assert_eq!(urls, vec![url.replace("index.html", "clip.mp4")]);
    }

    #[tokio::test]
    async fn error_status_is_a_scan_failure() {
        let (url, handle) = serve_once(http_response("404 Not Found", "gone")).await;
        let result = scan(&url).await;
        handle.await.unwrap();
        assert!(matches!(result, Err(errors::ScanError::Request(_))));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_scan_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let result = scan(&format!("http://{addr}/")).await;
        assert!(matches!(result, Err(errors::ScanError::Request(_))));
    }

    #[tokio::test]
    async fn invalid_page_url() {
        assert!(matches!(
            scan("not a url").await,
            Err(errors::ScanError::InvalidUrl(_))
        ));
    }
}
