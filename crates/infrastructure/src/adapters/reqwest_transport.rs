//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port. It performs exactly one
//! network call per request; token handling and retries stay in the client.

use std::collections::BTreeMap;
use std::future::Future;

use practicum_application::ports::{
    HttpTransport, OutboundRequest, TransportError, TransportResponse,
};
use practicum_domain::HttpMethod;
use reqwest::{Client, Method};
use tracing::trace;
use url::Url;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("practicum-client/", env!("CARGO_PKG_VERSION"));

/// HTTP transport backed by `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with default settings.
    ///
    /// Default configuration:
    /// - Redirects: not followed
    /// - User-Agent: [`USER_AGENT`]
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { client })
    }

    /// Creates a transport over a preconfigured reqwest client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Parses the URL and appends the query parameters.
    fn build_url(request: &OutboundRequest) -> Result<Url, TransportError> {
        let mut url = Url::parse(&request.url)
            .map_err(|e| TransportError::InvalidUrl(format!("{e}: {}", request.url)))?;

        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &request.query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout { timeout_ms };
        }

        if error.is_connect() {
            let message = error.to_string();
            let lowered = message.to_lowercase();
            let host = error
                .url()
                .and_then(Url::host_str)
                .unwrap_or("unknown")
                .to_string();

            if lowered.contains("dns") || lowered.contains("resolve") {
                return TransportError::DnsError { host, message };
            }
            if lowered.contains("refused") {
                return TransportError::ConnectionRefused {
                    host,
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return TransportError::ConnectionFailed(message);
        }

        TransportError::Other(error.to_string())
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(
        &self,
        request: &OutboundRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send {
        let method = Self::to_reqwest_method(request.method);
        let url = Self::build_url(request);
        let headers = request.headers.clone();
        let body = request.body.clone();
        let timeout = request.timeout;
        let request_id = request.request_id;
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        async move {
            let mut builder = self.client.request(method, url?).timeout(timeout);

            for (name, value) in &headers {
                builder = builder.header(name, value);
            }
            if !headers
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case("accept"))
            {
                builder = builder.header("Accept", "application/json");
            }
            if let Some(body) = &body {
                builder = builder.json(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| Self::map_error(&e, timeout_ms))?;

            let status = response.status().as_u16();
            let headers: BTreeMap<String, String> = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        value.to_str().unwrap_or("<binary>").to_string(),
                    )
                })
                .collect();

            let body = response
                .bytes()
                .await
                .map_err(|e| Self::map_error(&e, timeout_ms))?
                .to_vec();

            trace!(%request_id, status, bytes = body.len(), "response received");

            Ok(TransportResponse {
                status,
                headers,
                body,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn request(url: &str, query: Vec<(String, String)>) -> OutboundRequest {
        OutboundRequest {
            request_id: Default::default(),
            method: HttpMethod::Get,
            url: url.to_string(),
            headers: Vec::new(),
            query,
            body: None,
            timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_to_reqwest_method() {
        assert_eq!(
            ReqwestTransport::to_reqwest_method(HttpMethod::Get),
            Method::GET
        );
        assert_eq!(
            ReqwestTransport::to_reqwest_method(HttpMethod::Patch),
            Method::PATCH
        );
        assert_eq!(
            ReqwestTransport::to_reqwest_method(HttpMethod::Delete),
            Method::DELETE
        );
    }

    #[test]
    fn test_build_url_appends_query() {
        let request = request(
            "http://localhost:3000/api/cases",
            vec![
                ("semester".to_string(), "2024 fall".to_string()),
                ("page".to_string(), "2".to_string()),
            ],
        );

        let url = ReqwestTransport::build_url(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/api/cases?semester=2024+fall&page=2"
        );
    }

    #[test]
    fn test_build_url_without_query_is_unchanged() {
        let request = request("http://localhost:3000/api/teams", Vec::new());
        let url = ReqwestTransport::build_url(&request).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/teams");
    }

    #[test]
    fn test_invalid_url() {
        let request = request("not a url", Vec::new());
        assert!(matches!(
            ReqwestTransport::build_url(&request),
            Err(TransportError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_client_creation() {
        assert!(ReqwestTransport::new().is_ok());
    }
}
