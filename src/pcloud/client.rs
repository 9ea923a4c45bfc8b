//! pCloud API HTTP client

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::error::GatewayError;
use super::models::*;
use super::request::{join_ids, Request, CLIENT_NAME};

/// Issues one named remote operation and decodes the response envelope
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Returns the full envelope when `result` is zero
    async fn call(&self, request: &Request) -> Result<Value, GatewayError>;

    /// Where `request` would be sent, with sensitive values elided
    fn display_url(&self, request: &Request) -> String;
}

/// Gateway speaking HTTP GET to a pCloud endpoint
pub struct HttpGateway {
    endpoint: Url,
    http_client: Client,
}

impl HttpGateway {
    /// Create a new gateway for `endpoint`
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("Invalid endpoint URL: {}", endpoint))?;

        let mut builder = Client::builder().user_agent(CLIENT_NAME);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            endpoint,
            http_client,
        })
    }

    fn map_transport_error(url: String, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::timeout(url)
        } else {
            GatewayError::transport(url, err.to_string())
        }
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn call(&self, request: &Request) -> Result<Value, GatewayError> {
        let shown = self.display_url(request);
        debug!("Calling {}", shown);

        let response = self
            .http_client
            .get(request.url(&self.endpoint))
            .send()
            .await
            .map_err(|e| Self::map_transport_error(shown.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::http(shown, status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Self::map_transport_error(shown.clone(), e))?;

        let payload: Value =
            serde_json::from_slice(&body).map_err(|_| GatewayError::decode(shown.clone()))?;

        check_envelope(&shown, payload)
    }

    fn display_url(&self, request: &Request) -> String {
        request.display_url(&self.endpoint)
    }
}

/// Turn a non-zero `result` into a protocol error
fn check_envelope(url: &str, payload: Value) -> Result<Value, GatewayError> {
    let envelope: Envelope = serde_json::from_value(payload.clone())
        .map_err(|_| GatewayError::decode(url.to_string()))?;

    if envelope.result != 0 {
        let message = envelope
            .error
            .unwrap_or_else(|| "unknown pCloud error".to_string());
        return Err(GatewayError::protocol(
            url.to_string(),
            envelope.result,
            message,
        ));
    }

    Ok(payload)
}

/// Typed pCloud operations on top of a [`Gateway`]
///
/// Holds the session token once the session manager has obtained one.
#[derive(Clone)]
pub struct PCloudClient {
    gateway: Arc<dyn Gateway>,
    auth: Option<String>,
}

impl PCloudClient {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            auth: None,
        }
    }

    /// Use `token` for all subsequent authenticated calls
    pub fn set_auth(&mut self, token: impl Into<String>) {
        self.auth = Some(token.into());
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    fn authed(&self, action: &'static str) -> Request {
        let request = Request::new(action);
        match &self.auth {
            Some(token) => request.secret("auth", token),
            None => request,
        }
    }

    async fn call_typed<T: DeserializeOwned>(&self, request: Request) -> Result<T, GatewayError> {
        let payload = self.gateway.call(&request).await?;
        serde_json::from_value(payload).map_err(|e| {
            debug!("Unexpected {} response shape: {}", request.action, e);
            GatewayError::decode(self.gateway.display_url(&request))
        })
    }

    /// Log in with username and password, returning a fresh session token
    pub async fn userinfo(&self, username: &str, password: &str) -> Result<UserInfo, GatewayError> {
        let request = Request::new("userinfo")
            .param("getauth", 1)
            .param("logout", 1)
            .param("username", username)
            .secret("password", password);
        self.call_typed(request).await
    }

    /// Recursive listing of the folder at `path`
    pub async fn list_folder(&self, path: &str) -> Result<FolderListing, GatewayError> {
        let request = self
            .authed("listfolder")
            .param("path", path)
            .param("recursive", 1);
        self.call_typed(request).await
    }

    /// All audio collections (playlists)
    pub async fn collection_list(&self) -> Result<Vec<Collection>, GatewayError> {
        let request = self.authed("collection_list").param("type", 1);
        let list: CollectionList = self.call_typed(request).await?;
        debug!("Found {} collections", list.collections.len());
        Ok(list.collections)
    }

    pub async fn collection_delete(&self, collection_id: u64) -> Result<(), GatewayError> {
        let request = self
            .authed("collection_delete")
            .param("collectionid", collection_id);
        self.gateway.call(&request).await?;
        Ok(())
    }

    /// Create a collection named `name` holding `file_ids`
    pub async fn collection_create(
        &self,
        name: &str,
        file_ids: &[u64],
    ) -> Result<Collection, GatewayError> {
        let mut request = self.authed("collection_create").param("name", name);
        if !file_ids.is_empty() {
            request = request.param("fileids", join_ids(file_ids));
        }
        let created: CollectionCreated = self.call_typed(request).await?;
        Ok(created.collection)
    }

    /// Append `file_ids` to the end of an existing collection
    pub async fn collection_link_files(
        &self,
        collection_id: u64,
        file_ids: &[u64],
    ) -> Result<(), GatewayError> {
        let request = self
            .authed("collection_linkfiles")
            .param("collectionid", collection_id)
            .param("fileids", join_ids(file_ids));
        self.gateway.call(&request).await?;
        Ok(())
    }

    pub async fn list_tokens(&self) -> Result<Vec<IssuedToken>, GatewayError> {
        let list: TokenList = self.call_typed(self.authed("listtokens")).await?;
        Ok(list.tokens)
    }

    pub async fn delete_token(&self, token_id: u64) -> Result<(), GatewayError> {
        let request = self.authed("deletetoken").param("tokenid", token_id);
        self.gateway.call(&request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcloud::error::GatewayErrorKind;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup(timeout: Option<Duration>) -> (MockServer, HttpGateway) {
        let server = MockServer::start().await;
        let gateway = HttpGateway::new(&server.uri(), timeout).unwrap();
        (server, gateway)
    }

    #[tokio::test]
    async fn test_success_returns_envelope() {
        let (server, gateway) = setup(None).await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(query_param("username", "me"))
            .and(query_param("password", "hunter2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": 0,
                "auth": "token-123"
            })))
            .mount(&server)
            .await;

        let client = PCloudClient::new(Arc::new(gateway));
        let info = client.userinfo("me", "hunter2").await.unwrap();
        assert_eq!(info.auth, "token-123");
    }

    #[tokio::test]
    async fn test_protocol_error_carries_provider_code() {
        let (server, gateway) = setup(None).await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": 2000,
                "error": "Log in failed."
            })))
            .mount(&server)
            .await;

        let client = PCloudClient::new(Arc::new(gateway));
        let err = client.userinfo("me", "hunter2").await.unwrap_err();
        assert_eq!(err.kind, GatewayErrorKind::Protocol);
        assert_eq!(err.code, 2000);
        assert_eq!(err.message, "Log in failed.");
        assert!(!err.url.contains("hunter2"));
        assert!(!err.to_string().contains("hunter2"));
    }

    #[tokio::test]
    async fn test_http_status_becomes_code() {
        let (server, gateway) = setup(None).await;
        Mock::given(method("GET"))
            .and(path("/collection_list"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = gateway
            .call(&Request::new("collection_list"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, GatewayErrorKind::Http);
        assert_eq!(err.code, 503);
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let (server, gateway) = setup(None).await;
        Mock::given(method("GET"))
            .and(path("/listtokens"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = gateway.call(&Request::new("listtokens")).await.unwrap_err();
        assert_eq!(err.kind, GatewayErrorKind::Decode);
        assert_eq!(err.code, -1);
    }

    #[tokio::test]
    async fn test_timeout_is_reported_as_timeout() {
        let (server, gateway) = setup(Some(Duration::from_millis(100))).await;
        Mock::given(method("GET"))
            .and(path("/listfolder"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"result": 0}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let err = gateway.call(&Request::new("listfolder")).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.code, -1);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Nothing listens on the port once the listener is dropped
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let gateway =
            HttpGateway::new(&format!("http://{}", addr), Some(Duration::from_secs(2))).unwrap();
        let err = gateway
            .call(&Request::new("userinfo").secret("password", "hunter2"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, GatewayErrorKind::Transport);
        assert_eq!(err.code, -1);
        assert!(!err.url.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_typed_decode_error_carries_redacted_url() {
        let (server, gateway) = setup(None).await;
        Mock::given(method("GET"))
            .and(path("/listtokens"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": 0,
                "tokens": "not-a-list"
            })))
            .mount(&server)
            .await;

        let mut client = PCloudClient::new(Arc::new(gateway));
        client.set_auth("secret-token");
        let err = client.list_tokens().await.unwrap_err();

        assert_eq!(err.kind, GatewayErrorKind::Decode);
        assert!(err.url.starts_with(&server.uri()));
        assert!(err.url.contains("/listtokens?"));
        assert!(err.url.contains("auth=*elided*"));
        assert!(!err.url.contains("secret-token"));
    }

    #[tokio::test]
    async fn test_auth_token_sent_and_elided() {
        let (server, gateway) = setup(None).await;
        Mock::given(method("GET"))
            .and(path("/collection_list"))
            .and(query_param("auth", "secret-token"))
            .and(query_param("type", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": 0,
                "collections": [{"id": 5, "name": "Road Trip", "type": 1}]
            })))
            .mount(&server)
            .await;

        let mut client = PCloudClient::new(Arc::new(gateway));
        client.set_auth("secret-token");
        let collections = client.collection_list().await.unwrap();
        assert_eq!(
            collections,
            vec![Collection {
                id: 5,
                name: "Road Trip".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_create_sends_comma_joined_ids() {
        let (server, gateway) = setup(None).await;
        Mock::given(method("GET"))
            .and(path("/collection_create"))
            .and(query_param("name", "Road Trip"))
            .and(query_param("fileids", "1,2,3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": 0,
                "collection": {"id": 42, "name": "Road Trip"}
            })))
            .mount(&server)
            .await;

        let client = PCloudClient::new(Arc::new(gateway));
        let created = client.collection_create("Road Trip", &[1, 2, 3]).await.unwrap();
        assert_eq!(created.id, 42);
    }
}
