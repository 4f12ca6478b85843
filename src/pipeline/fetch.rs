use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::error::{ScrapeError, ScrapeResult};

/// Initial capacity of the body buffer.
pub const READ_BUFFER_SIZE: usize = 32 * 1024;

/// GET `url` and return the body as text. Anything but `200 OK` fails.
///
/// The body is read chunk by chunk and abandoned once it grows past
/// `max_body_bytes`.
pub async fn fetch_html(client: &Client, url: &Url, max_body_bytes: usize) -> ScrapeResult<String> {
    let mut response = client.get(url.clone()).send().await.map_err(|e| {
        tracing::warn!(error = ?e, url = %url, "Failed to fetch page");
        ScrapeError::Fetch(e)
    })?;

    let status = response.status();
    if status != StatusCode::OK {
        tracing::warn!(url = %url, status = status.as_u16(), "Page returned unexpected status");
        return Err(ScrapeError::UnexpectedStatus {
            code: status.as_u16(),
        });
    }

    ensure_html(response.headers())?;

    let mut body = Vec::with_capacity(READ_BUFFER_SIZE);
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > max_body_bytes {
            return Err(ScrapeError::ResponseTooLarge {
                limit: max_body_bytes,
            });
        }
        body.extend_from_slice(&chunk);
    }

    tracing::debug!(url = %url, bytes = body.len(), "Fetched page");
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Reject bodies whose declared media type cannot be HTML. A missing
/// `Content-Type` is accepted.
fn ensure_html(headers: &HeaderMap) -> ScrapeResult<()> {
    let Some(value) = headers.get(CONTENT_TYPE) else {
        return Ok(());
    };

    let content_type = value
        .to_str()
        .map_err(|_| ScrapeError::Parse("unreadable content-type header".into()))?;

    if is_markup(content_type) {
        Ok(())
    } else {
        Err(ScrapeError::Parse(format!(
            "response is not HTML (content-type: {content_type})"
        )))
    }
}

fn is_markup(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime.is_empty()
        || mime.starts_with("text/")
        || mime == "application/xhtml+xml"
        || mime == "application/xml"
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn page_url(server: &MockServer, path: &str) -> Url {
        Url::parse(&server.url(path)).unwrap()
    }

    #[test]
    fn accepts_html_and_text_types() {
        assert!(is_markup("text/html"));
        assert!(is_markup("text/html; charset=utf-8"));
        assert!(is_markup("TEXT/HTML"));
        assert!(is_markup("application/xhtml+xml"));
        assert!(is_markup("text/plain"));
    }

    #[test]
    fn rejects_binary_types() {
        assert!(!is_markup("image/png"));
        assert!(!is_markup("application/pdf"));
        assert!(!is_markup("application/json"));
    }

    #[tokio::test]
    async fn returns_body_on_200() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/page");
                then.status(200)
                    .header("content-type", "text/html; charset=utf-8")
                    .body("<html><title>Hi</title></html>");
            })
            .await;

        let html = fetch_html(&Client::new(), &page_url(&server, "/page"), 1024)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(html, "<html><title>Hi</title></html>");
    }

    #[tokio::test]
    async fn non_200_is_unexpected_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gone");
                then.status(404).body("not here");
            })
            .await;

        let err = fetch_html(&Client::new(), &page_url(&server, "/gone"), 1024)
            .await
            .unwrap_err();

        assert!(matches!(err, ScrapeError::UnexpectedStatus { code: 404 }));
    }

    #[tokio::test]
    async fn no_content_status_is_unexpected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/empty");
                then.status(204);
            })
            .await;

        let err = fetch_html(&Client::new(), &page_url(&server, "/empty"), 1024)
            .await
            .unwrap_err();

        assert!(matches!(err, ScrapeError::UnexpectedStatus { code: 204 }));
    }

    #[tokio::test]
    async fn binary_content_type_is_parse_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/logo.png");
                then.status(200)
                    .header("content-type", "image/png")
                    .body(vec![0x89, b'P', b'N', b'G']);
            })
            .await;

        let err = fetch_html(&Client::new(), &page_url(&server, "/logo.png"), 1024)
            .await
            .unwrap_err();

        assert!(matches!(err, ScrapeError::Parse(_)));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/big");
                then.status(200)
                    .header("content-type", "text/html")
                    .body("x".repeat(4096));
            })
            .await;

        let err = fetch_html(&Client::new(), &page_url(&server, "/big"), 100)
            .await
            .unwrap_err();

        assert!(matches!(err, ScrapeError::ResponseTooLarge { limit: 100 }));
    }

    #[tokio::test]
    async fn connection_failure_is_fetch_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
        let err = fetch_html(&Client::new(), &url, 1024).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Fetch(_)));
    }
}
