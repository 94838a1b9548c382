//! HTTP implementation of the archive ports
//!
//! | Port method | Verb | Path |
//! |---|---|---|
//! | `list_children` | GET | `/api/v1/WebRestoreTreeNode` |
//! | `create_size_job` | POST | `/api/v1/WebRestoreFileSizePolling` |
//! | `get_size_job` | GET | `/api/v1/WebRestoreFileSizePolling` |
//! | `submit_restore` | POST | `/api/v1/WebRestoreJob` |
//! | `get_restore_status` | GET | `/api/v1/WebRestoreJob/{job_id}` |
//! | `cancel_restore` | DELETE | `/api/v1/WebRestoreJob/{job_id}` |
//! | `stream_restore_result` | GET | `/api/v1/WebRestoreJobResult/{job_id}` |
//! | `submit_push_restore` | POST | `/api/v1/PushRestoreJob` |
//! | `connected_server_url` | GET | `/api/v1/connectedServerUrl` |
//! | `data_key_token` | POST | `/api/v1/DataKeyToken` |
//! | `create_restore_session` | POST | `/api/v1/WebRestoreSession` |

use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use restorekit_core::{ByteStream, DeviceConnectivity, RemoteTreeClient, RestoreSessionProvider};
use restorekit_domain::{
    ApiConfig, PushRestoreJobRequest, RestoreJobRequest, RestoreJobStatus, RestoreKitError,
    RestoreSession, Result, SessionSecret, SizeJob, SizeJobStatus, TreeNode,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::auth::AccessTokenProvider;
use super::errors::ApiError;
use crate::dispatch::{DispatchRequest, DispatchResponse, RequestExecutor};
use crate::errors::InfraError;
use crate::http::HttpClient;

const TREE_NODE_PATH: &str = "/api/v1/WebRestoreTreeNode";
const SIZE_POLLING_PATH: &str = "/api/v1/WebRestoreFileSizePolling";
const RESTORE_JOB_PATH: &str = "/api/v1/WebRestoreJob";
const RESTORE_RESULT_PATH: &str = "/api/v1/WebRestoreJobResult";
const PUSH_RESTORE_PATH: &str = "/api/v1/PushRestoreJob";
const CONNECTED_SERVER_PATH: &str = "/api/v1/connectedServerUrl";
const DATA_KEY_TOKEN_PATH: &str = "/api/v1/DataKeyToken";
const RESTORE_SESSION_PATH: &str = "/api/v1/WebRestoreSession";

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobIdData {
    job_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerUrlData {
    #[serde(default)]
    server_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataKeyTokenData {
    data_key_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionData {
    web_restore_session_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SizeJobBody<'a> {
    guid: &'a str,
    file_id: &'a str,
}

/// Storage service client implementing every archive port
#[derive(Clone)]
pub struct StorageApiClient {
    http: HttpClient,
    base_url: String,
    auth: Arc<dyn AccessTokenProvider>,
}

impl StorageApiClient {
    /// # Errors
    /// Returns `RestoreKitError::Config` when `base_url` is not an absolute
    /// URL.
    pub fn new(
        http: HttpClient,
        base_url: &str,
        auth: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self> {
        url::Url::parse(base_url).map_err(|e| RestoreKitError::from(InfraError::from(e)))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string(), auth })
    }

    /// Build the transport and client from the `api` configuration section.
    pub fn from_config(config: &ApiConfig, auth: Arc<dyn AccessTokenProvider>) -> Result<Self> {
        Self::new(HttpClient::from_config(config)?, &config.base_url, auth)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self.auth.access_token().await?;
        let url = format!("{}{}", self.base_url, path);
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    /// Authorized GET without a whole-response deadline; the caller owns
    /// the body and decides how long to keep reading it.
    async fn authorized_download(&self, path: &str) -> Result<RequestBuilder> {
        let token = self.auth.access_token().await?;
        let url = format!("{}{}", self.base_url, path);
        Ok(self.http.streaming_request(Method::GET, url).bearer_auth(token))
    }

    /// Send `builder` and turn non-success statuses into errors.
    async fn send_checked(&self, builder: RequestBuilder) -> Result<Response> {
        let response = self.http.send(builder).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &url, &body).into())
    }

    /// Like [`Self::send_checked`], but a rejected restore submission
    /// surfaces as `BadRestoreRequest` carrying the server's explanation.
    async fn send_restore_submission(&self, builder: RequestBuilder) -> Result<Response> {
        let response = self.http.send(builder).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        if matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY) {
            let reason = if body.is_empty() { status.to_string() } else { body };
            return Err(RestoreKitError::BadRestoreRequest(reason));
        }
        Err(ApiError::from_status(status, &url, &body).into())
    }

    async fn data<T: DeserializeOwned>(response: Response) -> Result<T> {
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| RestoreKitError::from(ApiError::Decode(e.to_string())))?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl RemoteTreeClient for StorageApiClient {
    #[instrument(skip(self, session), fields(device_guid = %session.device_guid))]
    async fn list_children(
        &self,
        session: &RestoreSession,
        node_id: Option<&str>,
        show_deleted: Option<bool>,
    ) -> Result<Vec<TreeNode>> {
        let mut query = vec![
            ("guid", session.device_guid.clone()),
            ("webRestoreSessionId", session.session_id.clone()),
        ];
        if let Some(node_id) = node_id {
            query.push(("fileId", node_id.to_string()));
        }
        if let Some(show_deleted) = show_deleted {
            query.push(("includeDeleted", show_deleted.to_string()));
        }

        let request = self.authorized(Method::GET, TREE_NODE_PATH).await?.query(&query);
        let nodes: Vec<TreeNode> = Self::data(self.send_checked(request).await?).await?;
        debug!(count = nodes.len(), "listed tree nodes");
        Ok(nodes)
    }

    #[instrument(skip(self))]
    async fn create_size_job(&self, device_guid: &str, file_id: &str) -> Result<SizeJob> {
        let request = self
            .authorized(Method::POST, SIZE_POLLING_PATH)
            .await?
            .json(&SizeJobBody { guid: device_guid, file_id });
        let created: JobIdData = Self::data(self.send_checked(request).await?).await?;
        debug!(job_id = %created.job_id, "size job created");
        Ok(SizeJob { job_id: created.job_id, file_id: file_id.to_string() })
    }

    #[instrument(skip(self))]
    async fn get_size_job(&self, job_id: &str, device_guid: &str) -> Result<SizeJobStatus> {
        let request = self
            .authorized(Method::GET, SIZE_POLLING_PATH)
            .await?
            .query(&[("jobId", job_id), ("guid", device_guid)]);
        Self::data(self.send_checked(request).await?).await
    }

    #[instrument(skip(self, request), fields(device_guid = %request.device_guid))]
    async fn submit_restore(&self, request: &RestoreJobRequest) -> Result<String> {
        let builder = self.authorized(Method::POST, RESTORE_JOB_PATH).await?.json(request);
        let created: JobIdData = Self::data(self.send_restore_submission(builder).await?).await?;
        info!(job_id = %created.job_id, "restore job accepted");
        Ok(created.job_id)
    }

    #[instrument(skip(self))]
    async fn get_restore_status(&self, job_id: &str) -> Result<RestoreJobStatus> {
        let path = format!("{RESTORE_JOB_PATH}/{job_id}");
        let request = self.authorized(Method::GET, &path).await?;
        Self::data(self.send_checked(request).await?).await
    }

    #[instrument(skip(self))]
    async fn stream_restore_result(&self, job_id: &str) -> Result<ByteStream> {
        let path = format!("{RESTORE_RESULT_PATH}/{job_id}");
        let request = self.authorized_download(&path).await?;
        let response = self.send_checked(request).await?;
        debug!(content_length = ?response.content_length(), "streaming restore result");
        Ok(response
            .bytes_stream()
            .map_err(|e| RestoreKitError::from(InfraError::from(e)))
            .boxed())
    }

    #[instrument(skip(self, request), fields(accepting_guid = %request.accepting_device_guid))]
    async fn submit_push_restore(&self, request: &PushRestoreJobRequest) -> Result<String> {
        let builder = self.authorized(Method::POST, PUSH_RESTORE_PATH).await?.json(request);
        let created: JobIdData = Self::data(self.send_restore_submission(builder).await?).await?;
        info!(job_id = %created.job_id, "push restore accepted");
        Ok(created.job_id)
    }

    #[instrument(skip(self))]
    async fn cancel_restore(&self, job_id: &str) -> Result<()> {
        let path = format!("{RESTORE_JOB_PATH}/{job_id}");
        let request = self.authorized(Method::DELETE, &path).await?;
        self.send_checked(request).await?;
        info!("restore job cancelled");
        Ok(())
    }
}

#[async_trait]
impl DeviceConnectivity for StorageApiClient {
    #[instrument(skip(self))]
    async fn connected_server_url(&self, device_guid: &str) -> Result<Option<String>> {
        let request = self
            .authorized(Method::GET, CONNECTED_SERVER_PATH)
            .await?
            .query(&[("guid", device_guid)]);
        let found: ServerUrlData = Self::data(self.send_checked(request).await?).await?;
        Ok(found.server_url.filter(|url| !url.is_empty()))
    }
}

#[async_trait]
impl RestoreSessionProvider for StorageApiClient {
    #[instrument(skip(self))]
    async fn data_key_token(&self, device_guid: &str) -> Result<String> {
        let request = self
            .authorized(Method::POST, DATA_KEY_TOKEN_PATH)
            .await?
            .json(&serde_json::json!({ "computerGuid": device_guid }));
        let token: DataKeyTokenData = Self::data(self.send_checked(request).await?).await?;
        Ok(token.data_key_token)
    }

    #[instrument(skip(self, secret), fields(secret_kind = secret.field_name()))]
    async fn create_restore_session(
        &self,
        device_guid: &str,
        secret: &SessionSecret,
    ) -> Result<String> {
        let mut body = serde_json::Map::new();
        body.insert("computerGuid".into(), device_guid.into());
        body.insert(secret.field_name().into(), secret.expose().into());

        let request = self.authorized(Method::POST, RESTORE_SESSION_PATH).await?.json(&body);
        let session: SessionData = Self::data(self.send_checked(request).await?).await?;
        info!("restore session opened");
        Ok(session.web_restore_session_id)
    }
}

#[async_trait]
impl RequestExecutor for StorageApiClient {
    async fn execute(&self, request: &DispatchRequest) -> Result<DispatchResponse> {
        let mut builder = self.authorized(request.method.clone(), &request.path).await?;
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = self.send_checked(builder).await?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| RestoreKitError::from(InfraError::from(e)))?;
        Ok(DispatchResponse { status, body })
    }
}
