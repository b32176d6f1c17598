//! Proxy-aware connection factory built on reqwest

use super::{HttpConnection, HttpConnectionFactory, HttpRequest, HttpResponse};
use crate::error::{FeedbackError, FeedbackResult};
use async_trait::async_trait;
use std::time::Duration;

/// Network settings applied to every connection the factory opens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    /// Explicit proxy URL, takes precedence over the environment
    pub proxy: Option<String>,
    /// Honor HTTP_PROXY / HTTPS_PROXY / NO_PROXY when no explicit proxy is set
    pub use_system_proxy: bool,
    /// Request timeout. No timeout is applied when unset.
    pub timeout_ms: Option<u64>,
    pub user_agent: String,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            proxy: None,
            use_system_proxy: true,
            timeout_ms: None,
            user_agent: format!("anonymous-feedback/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Opens reqwest-backed connections with the configured proxy setup
#[derive(Debug, Clone, Default)]
pub struct ProxyHttpConnectionFactory {
    settings: ProxySettings,
}

impl ProxyHttpConnectionFactory {
    pub fn new(settings: ProxySettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ProxySettings {
        &self.settings
    }

    fn build_client(&self) -> FeedbackResult<reqwest::Client> {
        let mut builder = reqwest::Client::builder().user_agent(self.settings.user_agent.clone());

        if let Some(timeout_ms) = self.settings.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }

        match &self.settings.proxy {
            Some(proxy_url) => {
                let proxy = reqwest::Proxy::all(proxy_url.as_str()).map_err(|e| {
                    FeedbackError::transport(format!("Invalid proxy {}: {}", proxy_url, e))
                })?;
                builder = builder.proxy(proxy);
            }
            None if !self.settings.use_system_proxy => {
                builder = builder.no_proxy();
            }
            None => {}
        }

        builder
            .build()
            .map_err(|e| FeedbackError::transport(format!("Failed to build HTTP client: {}", e)))
    }
}

impl HttpConnectionFactory for ProxyHttpConnectionFactory {
    fn open_connection(&self, url: &str) -> FeedbackResult<Box<dyn HttpConnection>> {
        let url = url::Url::parse(url)
            .map_err(|e| FeedbackError::transport(format!("Invalid URL {}: {}", url, e)))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(FeedbackError::transport(format!(
                    "Unsupported URL scheme: {}",
                    other
                )))
            }
        }

        let client = self.build_client()?;
        tracing::debug!(
            "Opened feedback connection to {} (proxy: {})",
            url,
            self.settings.proxy.as_deref().unwrap_or("system")
        );

        Ok(Box::new(ReqwestConnection { client, url }))
    }
}

struct ReqwestConnection {
    client: reqwest::Client,
    url: url::Url,
}

#[async_trait]
impl HttpConnection for ReqwestConnection {
    async fn send(&mut self, request: HttpRequest) -> FeedbackResult<HttpResponse> {
        let response = self
            .client
            .request(request.method, self.url.clone())
            .header(reqwest::header::CONTENT_TYPE, request.content_type)
            .body(request.body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ProxySettings::default();
        assert!(settings.proxy.is_none());
        assert!(settings.use_system_proxy);
        assert!(settings.timeout_ms.is_none());
        assert!(settings.user_agent.starts_with("anonymous-feedback/"));
    }

    #[test]
    fn test_open_connection_rejects_bad_url() {
        let factory = ProxyHttpConnectionFactory::default();
        let err = factory.open_connection("not a url").err().unwrap();
        assert!(err.is_transport());
    }

    #[test]
    fn test_open_connection_rejects_unsupported_scheme() {
        let factory = ProxyHttpConnectionFactory::default();
        let err = factory.open_connection("ftp://example.com/report").err().unwrap();
        assert!(err.to_string().contains("Unsupported URL scheme: ftp"));
    }

    #[test]
    fn test_open_connection_rejects_bad_proxy() {
        let factory = ProxyHttpConnectionFactory::new(ProxySettings {
            proxy: Some("::not a proxy::".to_string()),
            ..Default::default()
        });
        let err = factory.open_connection("http://example.com/report").err().unwrap();
        assert!(err.is_transport());
        assert!(err.to_string().contains("Invalid proxy"));
    }

    #[test]
    fn test_open_connection_with_explicit_proxy() {
        let factory = ProxyHttpConnectionFactory::new(ProxySettings {
            proxy: Some("http://127.0.0.1:3128".to_string()),
            use_system_proxy: false,
            timeout_ms: Some(5000),
            ..Default::default()
        });
        assert!(factory.open_connection("https://example.com/report").is_ok());
    }
}
