use std::time::Duration;

use {async_trait::async_trait, tracing::debug};

use tgbridge_channels::{BlobFetcher, Error};

/// Downloads images referenced by outbound messages over plain HTTP(S).
#[derive(Clone)]
pub struct HttpBlobFetcher {
    client: reqwest::Client,
}

impl HttpBlobFetcher {
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BlobFetcher for HttpBlobFetcher {
    async fn fetch(&self, url: &str) -> tgbridge_channels::Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::external(format!("failed to download {url}"), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::unavailable(format!(
                "failed to download {url}: HTTP {status}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::external(format!("failed to read body of {url}"), e))?;
        debug!(url, size = bytes.len(), "downloaded image");
        Ok(bytes.to_vec())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::test_support::MockTelegramApi};

    fn fetcher() -> HttpBlobFetcher {
        HttpBlobFetcher::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn downloads_bytes() {
        let mock = MockTelegramApi::start()
            .await
            .serve_file("images/cat.png", b"\x89PNG-bytes");

        let bytes = fetcher()
            .fetch(&format!("{}images/cat.png", mock.base_url()))
            .await
            .unwrap();
        assert_eq!(bytes, b"\x89PNG-bytes");
        mock.shutdown().await;
    }

    #[tokio::test]
    async fn non_success_status_is_unavailable() {
        let mock = MockTelegramApi::start().await;

        let err = fetcher()
            .fetch(&format!("{}images/missing.png", mock.base_url()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unavailable { .. }), "{err:?}");
        assert!(err.to_string().contains("404"));
        mock.shutdown().await;
    }

    #[tokio::test]
    async fn unreachable_host_is_an_error() {
        let err = fetcher()
            .fetch("http://127.0.0.1:1/never.png")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::External { .. }), "{err:?}");
    }
}
