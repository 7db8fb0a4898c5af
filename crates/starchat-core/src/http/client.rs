//! StarChat HTTP client
//!
//! A thin async wrapper around the StarChat REST API. Paths and request
//! bodies that differ between 4.x and 5.x are chosen from the client's
//! [`Dialect`].

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::http::error::HttpError;
use crate::http::retry::{execute_with_retry, RetryPolicy};
use crate::version::VersionTag;
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Server versions the client knows how to talk to
pub const SUPPORTED_SERVER_VERSIONS: [&str; 3] = ["4.1", "4.2", "5.1"];

/// Configuration for the StarChat client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme and host, e.g. `http://localhost`
    pub url: String,
    pub port: u16,
    /// Server version; selects paths and body spelling
    pub version: VersionTag,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Seconds to wait between polls while the server is busy
    pub patience_secs: u64,
    /// Maximum number of extra polls while the server is busy
    pub trials: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost".to_string(),
            port: 8888,
            version: VersionTag::new("5.1"),
            timeout_secs: 30,
            patience_secs: 5,
            trials: 5,
        }
    }
}

/// Result of uploading a decision table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// 4.x: states are posted one by one; `true` when the server answered 201
    PerState(BTreeMap<String, bool>),
    /// 5.x: the whole table is uploaded at once
    Bulk(bool),
}

impl UploadOutcome {
    /// Whether every part of the upload succeeded
    pub fn is_success(&self) -> bool {
        match self {
            UploadOutcome::PerState(states) => states.values().all(|loaded| *loaded),
            UploadOutcome::Bulk(loaded) => *loaded,
        }
    }
}

#[derive(Clone)]
struct Credentials {
    user: String,
    password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Client for a StarChat server
#[derive(Debug, Clone)]
pub struct StarChatClient {
    client: ReqwestClient,
    address: String,
    config: ClientConfig,
    dialect: Dialect,
    credentials: Option<Credentials>,
}

impl StarChatClient {
    /// Create a client; the connection is not checked here
    pub fn new(config: ClientConfig) -> Result<Self> {
        if !SUPPORTED_SERVER_VERSIONS.contains(&config.version.as_str()) {
            return Err(Error::unsupported_version(config.version.as_str()));
        }
        let dialect = config.version.dialect()?;

        let address = format!("{}:{}", config.url.trim_end_matches('/'), config.port);
        Url::parse(&address).map_err(|e| Error::Configuration {
            message: format!("Invalid StarChat address '{}': {}", address, e),
        })?;

        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Http {
                message: format!("Failed to create HTTP client: {}", e),
                status_code: None,
                source: Some(e.into()),
            })?;

        Ok(Self {
            client,
            address,
            config,
            dialect,
            credentials: None,
        })
    }

    /// Use HTTP basic authentication for every following request
    pub fn authenticate(&mut self, user: impl Into<String>, password: impl Into<String>) {
        self.credentials = Some(Credentials {
            user: user.into(),
            password: password.into(),
        });
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn version(&self) -> &VersionTag {
        &self.config.version
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Whether the server answers 200 on its base address
    pub async fn check_service(&self) -> bool {
        let url = match Url::parse(&self.address) {
            Ok(url) => url,
            Err(_) => return false,
        };
        match self.request(Method::GET, url).send().await {
            Ok(response) if response.status() == StatusCode::OK => true,
            Ok(response) => {
                log::info!(
                    "Something went wrong connecting to StarChat on {} (status {})",
                    self.address,
                    response.status()
                );
                false
            }
            Err(e) => {
                log::info!("Something went wrong connecting to StarChat on {}: {}", self.address, e);
                false
            }
        }
    }

    /// All indices, `starchat_system` ones included
    pub async fn get_indices(&self) -> Result<Value> {
        let response = self.send(Method::GET, "system_indices").await?;
        json_or_error(response).await
    }

    /// Whether `index_name` exists on the server
    pub async fn index_exists(&self, index_name: &str) -> Result<bool> {
        let response = self
            .send(Method::GET, &format!("{}/index_management", index_name))
            .await?;
        let body = json_or_error(response).await?;
        Ok(parse_index_check(&self.config.version, index_name, &body))
    }

    /// Delete an index, returning the server status
    pub async fn index_delete(&self, index_name: &str) -> Result<StatusCode> {
        let response = self
            .send(Method::DELETE, &format!("{}/index_management", index_name))
            .await?;
        Ok(response.status())
    }

    /// Create an index, returning the server status (200 on 4.x, 201 on 5.x)
    pub async fn index_create(&self, index_name: &str) -> Result<StatusCode> {
        let response = self
            .send(Method::POST, &format!("{}/index_management/create", index_name))
            .await?;
        Ok(response.status())
    }

    /// Post a single state document (4.x)
    pub async fn load_state(&self, index_name: &str, state_document: &Value) -> Result<StatusCode> {
        let url = self.endpoint(&format!("{}/decisiontable", index_name))?;
        let response = self
            .request(Method::POST, url)
            .json(state_document)
            .send()
            .await
            .map_err(HttpError::from_request_error)?;
        Ok(response.status())
    }

    /// Upload a decision-table document
    ///
    /// 4.x servers receive each hit's document separately and the outcome
    /// records which states were accepted. 5.x servers receive the whole
    /// document as a JSON file upload.
    #[tracing::instrument(skip(self, table), fields(version = %self.config.version))]
    pub async fn load_decision_table(&self, index_name: &str, table: &Value) -> Result<UploadOutcome> {
        match self.dialect {
            Dialect::V4 => self.load_states(index_name, table).await,
            Dialect::V5 => {
                let bytes = serde_json::to_vec(table)?;
                self.upload_table(index_name, bytes, "decision_table.json").await
            }
        }
    }

    /// Upload a decision table stored in a JSON file
    #[tracing::instrument(skip(self, path), fields(file = %path.as_ref().display()))]
    pub async fn load_decision_table_file(
        &self,
        index_name: &str,
        path: impl AsRef<Path>,
    ) -> Result<UploadOutcome> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        match self.dialect {
            Dialect::V4 => {
                let table: Value = serde_json::from_slice(&bytes)?;
                self.load_states(index_name, &table).await
            }
            Dialect::V5 => {
                let file_name = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("decision_table.json")
                    .to_string();
                self.upload_table(index_name, bytes, &file_name).await
            }
        }
    }

    async fn load_states(&self, index_name: &str, table: &Value) -> Result<UploadOutcome> {
        let hits = table
            .get("hits")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::missing_field("hits", table))?;

        let mut outcome = BTreeMap::new();
        for (index, hit) in hits.iter().enumerate() {
            let document = hit
                .get("document")
                .ok_or_else(|| Error::missing_field(format!("hits[{index}].document"), hit))?;
            let state = document
                .get("state")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::missing_field("state", document))?;

            let status = self.load_state(index_name, document).await?;
            let loaded = status == StatusCode::CREATED;
            if !loaded {
                log::warn!(
                    "Something went wrong loading state {} (StarChat returned status code {})",
                    state,
                    status.as_u16()
                );
            }
            outcome.insert(state.to_string(), loaded);
        }
        tracing::debug!(states = outcome.len(), "Uploaded decision table states");
        Ok(UploadOutcome::PerState(outcome))
    }

    async fn upload_table(&self, index_name: &str, bytes: Vec<u8>, file_name: &str) -> Result<UploadOutcome> {
        let url = self.endpoint(&format!("{}/decisiontable/upload/json", index_name))?;
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/json")
            .map_err(HttpError::from_request_error)?;
        let form = Form::new().part("json", part);

        let response = self
            .request(Method::POST, url)
            .multipart(form)
            .send()
            .await
            .map_err(HttpError::from_request_error)?;

        let loaded = response.status() == StatusCode::OK;
        if !loaded {
            log::warn!(
                "Something went wrong uploading the decision table to {} (StarChat returned status code {})",
                index_name,
                response.status().as_u16()
            );
        }
        Ok(UploadOutcome::Bulk(loaded))
    }

    /// The decision table currently loaded in an index
    pub async fn decision_table_dump(&self, index_name: &str) -> Result<Value> {
        let url = self.endpoint(&format!("{}/decisiontable", index_name))?;
        let response = self
            .request(Method::GET, url)
            .query(&[("dump", "true")])
            .send()
            .await
            .map_err(HttpError::from_request_error)?;
        json_or_error(response).await
    }

    /// Number of states loaded in an index
    ///
    /// The analyzer endpoint answers non-200 while the server is still busy,
    /// so the call is repeated every `patience_secs` for up to `trials` extra
    /// attempts. `None` means the server never became ready; an answer
    /// without the entry-count label is [`Error::MissingField`].
    pub async fn states_count(&self, index_name: &str) -> Result<Option<u64>> {
        let (path, label) = states_count_endpoint(self.dialect);
        let url = self.endpoint(&format!("{}/{}", index_name, path))?;
        let policy = RetryPolicy::patience(self.config.trials, self.config.patience_secs);

        let result = execute_with_retry(
            || {
                let request = self.request(Method::POST, url.clone());
                async move {
                    let response = request.send().await.map_err(HttpError::from_request_error)?;
                    if response.status() != StatusCode::OK {
                        return Err(HttpError::busy(response.status(), "StarChat is not ready yet"));
                    }
                    Ok(response)
                }
            },
            policy,
        )
        .await;

        match result {
            Ok(response) => {
                let body = json_or_error(response).await?;
                parse_states_count(label, &body).map(Some)
            }
            Err(error) if error.status_code.is_some() => {
                log::warn!(
                    "Something went wrong checking the number of entries in index \"{}\": {}",
                    index_name,
                    error
                );
                Ok(None)
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Ask the bot for its answer to `text`
    ///
    /// Any non-200 answer yields an empty list.
    pub async fn get_next_response(
        &self,
        index_name: &str,
        text: &str,
        conversation_id: &str,
        threshold: f64,
    ) -> Result<Value> {
        let url = self.endpoint(&format!("{}/get_next_response", index_name))?;
        let body = next_response_body(self.dialect, text, conversation_id, threshold);
        let response = self
            .request(Method::POST, url)
            .json(&body)
            .send()
            .await
            .map_err(HttpError::from_request_error)?;

        if response.status() == StatusCode::OK {
            json_or_error(response).await
        } else {
            tracing::debug!(status = response.status().as_u16(), "No response from StarChat");
            Ok(Value::Array(Vec::new()))
        }
    }

    /// Retrieve terms from the terms table
    pub async fn get_term(&self, index_name: &str, terms: &[String]) -> Result<Value> {
        self.post_json(&format!("{}/term/get", index_name), &json!({ "ids": terms }))
            .await
    }

    /// Index terms; each term follows the server's term schema
    pub async fn add_term(&self, index_name: &str, terms: &[Value]) -> Result<Value> {
        self.post_json(&format!("{}/term/index", index_name), &json!({ "terms": terms }))
            .await
    }

    /// Delete terms
    pub async fn delete_term(&self, index_name: &str, terms: &[String]) -> Result<Value> {
        self.post_json(&format!("{}/term/delete", index_name), &json!({ "ids": terms }))
            .await
    }

    /// Pairwise distances between terms
    pub async fn term_distance(&self, index_name: &str, terms: &[String]) -> Result<Value> {
        self.post_json(&format!("{}/term/distance", index_name), &json!({ "ids": terms }))
            .await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.endpoint(path)?;
        let response = self
            .request(Method::POST, url)
            .json(body)
            .send()
            .await
            .map_err(HttpError::from_request_error)?;
        json_or_error(response).await
    }

    async fn send(&self, method: Method, path: &str) -> Result<Response> {
        let url = self.endpoint(path)?;
        tracing::debug!(%method, %url, "StarChat request");
        let response = self
            .request(method, url)
            .send()
            .await
            .map_err(HttpError::from_request_error)?;
        Ok(response)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.credentials {
            Some(credentials) => builder.basic_auth(&credentials.user, Some(&credentials.password)),
            None => builder,
        }
    }

    /// Absolute URL for `path` below the server address
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let raw = format!("{}/{}", self.address, path.trim_start_matches('/'));
        Url::parse(&raw).map_err(|e| Error::Configuration {
            message: format!("Invalid StarChat endpoint '{}': {}", raw, e),
        })
    }
}

async fn json_or_error(response: Response) -> Result<Value> {
    if !response.status().is_success() {
        return Err(HttpError::from_response(response).await.into());
    }
    response.json::<Value>().await.map_err(|e| Error::Http {
        message: format!("Failed to parse response as JSON: {}", e),
        status_code: None,
        source: Some(e.into()),
    })
}

/// Interpret an `index_management` answer
///
/// 4.1 servers only report a message; later versions carry a `check` flag.
pub fn parse_index_check(version: &VersionTag, index_name: &str, body: &Value) -> bool {
    if version.as_str() == "4.1" {
        let expected = format!(
            "IndexCheck: state({0}.state, true) question({0}.question, true) term({0}.term, true)",
            index_name
        );
        body.get("message").and_then(Value::as_str) == Some(expected.as_str())
    } else {
        body.get("check").and_then(Value::as_bool).unwrap_or(false)
    }
}

/// Analyzer path and entry-count label per dialect
pub fn states_count_endpoint(dialect: Dialect) -> (&'static str, &'static str) {
    match dialect {
        Dialect::V4 => ("decisiontable_analyzer", "num_of_entries"),
        Dialect::V5 => ("decisiontable/analyzer", "numOfEntries"),
    }
}

/// Read the entry count from an analyzer answer
pub fn parse_states_count(label: &str, body: &Value) -> Result<u64> {
    body.get(label)
        .ok_or_else(|| Error::missing_field(label, body))?
        .as_u64()
        .ok_or_else(|| Error::invalid_field(label, "a non-negative integer"))
}

/// Request body for `get_next_response`
pub fn next_response_body(dialect: Dialect, text: &str, conversation_id: &str, threshold: f64) -> Value {
    match dialect {
        Dialect::V4 => json!({
            "conversation_id": conversation_id,
            "user_input": { "text": text },
            "values": { "return_value": "", "data": {} },
            "threshold": threshold
        }),
        Dialect::V5 => json!({
            "conversationId": conversation_id,
            "userInput": { "text": text },
            "values": { "returnValue": "", "data": {} },
            "threshold": threshold
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(version: &str) -> StarChatClient {
        StarChatClient::new(ClientConfig {
            version: VersionTag::new(version),
            ..ClientConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_supported_versions() {
        assert_eq!(client("4.1").dialect(), Dialect::V4);
        assert_eq!(client("4.2").dialect(), Dialect::V4);
        assert_eq!(client("5.1").dialect(), Dialect::V5);

        let err = StarChatClient::new(ClientConfig {
            version: VersionTag::new("5.0"),
            ..ClientConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_invalid_address() {
        let err = StarChatClient::new(ClientConfig {
            url: "not a url".to_string(),
            ..ClientConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_states_count_requires_label() {
        assert_eq!(
            parse_states_count("numOfEntries", &json!({"numOfEntries": 12})).unwrap(),
            12
        );

        let err = parse_states_count("numOfEntries", &json!({"num_of_entries": 12})).unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field, .. } if field == "numOfEntries"));

        let err = parse_states_count("num_of_entries", &json!({"num_of_entries": "12"})).unwrap_err();
        assert!(matches!(err, Error::InvalidField { .. }));
    }

    #[test]
    fn test_endpoints() {
        let client = client("5.1");
        assert_eq!(client.address(), "http://localhost:8888");
        assert_eq!(
            client.endpoint("index_english_0/decisiontable").unwrap().as_str(),
            "http://localhost:8888/index_english_0/decisiontable"
        );
        assert_eq!(
            client.endpoint("/system_indices").unwrap().as_str(),
            "http://localhost:8888/system_indices"
        );
    }

    #[test]
    fn test_credentials_are_not_printed() {
        let mut client = client("4.2");
        client.authenticate("admin", "adminp4ssw0rd");
        let debug = format!("{:?}", client);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("adminp4ssw0rd"));
    }

    #[test]
    fn test_parse_index_check() {
        let v41 = VersionTag::new("4.1");
        let message = json!({
            "message": "IndexCheck: state(idx.state, true) question(idx.question, true) term(idx.term, true)"
        });
        assert!(parse_index_check(&v41, "idx", &message));
        assert!(!parse_index_check(&v41, "other", &message));

        let v51 = VersionTag::new("5.1");
        assert!(parse_index_check(&v51, "idx", &json!({"check": true})));
        assert!(!parse_index_check(&v51, "idx", &json!({"check": false})));
        assert!(!parse_index_check(&v51, "idx", &json!({})));
    }

    #[test]
    fn test_states_count_endpoint() {
        assert_eq!(
            states_count_endpoint(Dialect::V4),
            ("decisiontable_analyzer", "num_of_entries")
        );
        assert_eq!(
            states_count_endpoint(Dialect::V5),
            ("decisiontable/analyzer", "numOfEntries")
        );
    }

    #[test]
    fn test_next_response_body() {
        let v4 = next_response_body(Dialect::V4, "hei", "42", 0.0);
        assert_eq!(v4["conversation_id"], json!("42"));
        assert_eq!(v4["user_input"]["text"], json!("hei"));
        assert_eq!(v4["values"]["return_value"], json!(""));

        let v5 = next_response_body(Dialect::V5, "hei", "42", 0.01);
        assert_eq!(v5["conversationId"], json!("42"));
        assert_eq!(v5["userInput"]["text"], json!("hei"));
        assert_eq!(v5["values"]["returnValue"], json!(""));
        assert_eq!(v5["threshold"], json!(0.01));
    }

    #[test]
    fn test_upload_outcome() {
        let mut states = BTreeMap::new();
        states.insert("greeting".to_string(), true);
        assert!(UploadOutcome::PerState(states.clone()).is_success());
        states.insert("bye".to_string(), false);
        assert!(!UploadOutcome::PerState(states).is_success());
        assert!(UploadOutcome::Bulk(true).is_success());
        assert!(!UploadOutcome::Bulk(false).is_success());
    }
}
