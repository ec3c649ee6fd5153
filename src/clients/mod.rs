pub mod stats;

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

use crate::models::docker::{
    ContainerPorts, ContainerSummary, DockerStats, ImageSummary, LogTail, NetworkSummary,
    ResourceKind, SystemStats, VolumeSummary,
};

/// A backend call that did not succeed, normalized to one human-readable
/// message. Backend-supplied messages are preferred; transport failures and
/// messageless error statuses fall back to "Failed to {verb} {resource}".
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{message}")]
    Backend { status: u16, message: String },
    #[error("Failed to {verb} {resource}")]
    Request {
        verb: &'static str,
        resource: String,
    },
}

impl ClientError {
    /// Status to mirror back to the rendering layer. Transport failures have
    /// no backend status and surface as a bad gateway.
    pub fn http_status(&self) -> u16 {
        match self {
            ClientError::Backend { status, .. } => *status,
            ClientError::Request { .. } => 502,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusMessage {
    #[serde(default)]
    pub status: String,
}

/// Typed client for the backend resource API. Holds no state beyond the
/// connection pool; every caller sees fresh data. No retries: a failed call
/// surfaces immediately.
pub struct BackendClient {
    base_url: String,
    http: Client,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    // --- Containers ---

    pub async fn list_containers(&self) -> Result<Vec<ContainerSummary>, ClientError> {
        self.get_json("/api/containers", "list", "containers").await
    }

    pub async fn list_running_containers(&self) -> Result<Vec<ContainerSummary>, ClientError> {
        self.get_json("/api/containers/running", "list", "running containers")
            .await
    }

    pub async fn get_container(&self, id: &str) -> Result<serde_json::Value, ClientError> {
        self.get_json(&format!("/api/containers/{}/", id), "fetch", "container")
            .await
    }

    pub async fn start_container(&self, id: &str) -> Result<StatusMessage, ClientError> {
        self.post_json(&format!("/api/containers/{}/start/", id), "start", "container")
            .await
    }

    pub async fn stop_container(&self, id: &str) -> Result<StatusMessage, ClientError> {
        self.post_json(&format!("/api/containers/{}/stop/", id), "stop", "container")
            .await
    }

    pub async fn container_logs(&self, id: &str) -> Result<LogTail, ClientError> {
        self.get_json(&format!("/api/containers/{}/logs/", id), "fetch", "logs")
            .await
    }

    // --- Images ---

    pub async fn list_images(&self) -> Result<Vec<ImageSummary>, ClientError> {
        self.get_json("/api/images", "list", "images").await
    }

    // --- Networks ---

    pub async fn list_networks(&self) -> Result<Vec<NetworkSummary>, ClientError> {
        self.get_json("/api/networks", "list", "networks").await
    }

    pub async fn get_network(&self, id: &str) -> Result<serde_json::Value, ClientError> {
        self.get_json(&format!("/api/networks/{}/", id), "fetch", "network")
            .await
    }

    pub async fn disconnected_containers(&self, id: &str) -> Result<serde_json::Value, ClientError> {
        self.get_json(
            &format!("/api/networks/{}/disconnected/", id),
            "list",
            "disconnected containers",
        )
        .await
    }

    // --- Volumes ---

    pub async fn list_volumes(&self) -> Result<Vec<VolumeSummary>, ClientError> {
        self.get_json("/api/volumes", "list", "volumes").await
    }

    // --- Ports ---

    pub async fn list_ports(&self) -> Result<Vec<ContainerPorts>, ClientError> {
        self.get_json("/api/ports/", "list", "ports").await
    }

    // --- Stats ---

    pub async fn docker_stats(&self) -> Result<DockerStats, ClientError> {
        self.get_json("/api/stats", "fetch", "stats").await
    }

    pub async fn system_stats(&self) -> Result<SystemStats, ClientError> {
        self.get_json("/api/system/stats", "fetch", "system stats")
            .await
    }

    // --- Deletes ---

    pub async fn delete_resource(&self, kind: ResourceKind, id: &str) -> Result<(), ClientError> {
        self.delete(&kind.delete_path(id), kind.as_str()).await
    }

    // --- Plumbing ---

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        verb: &'static str,
        resource: &str,
    ) -> Result<T, ClientError> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|_| ClientError::Request {
                verb,
                resource: resource.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(Self::normalize(resp, verb, resource).await);
        }
        resp.json().await.map_err(|_| ClientError::Request {
            verb,
            resource: resource.to_string(),
        })
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        verb: &'static str,
        resource: &str,
    ) -> Result<T, ClientError> {
        let resp = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|_| ClientError::Request {
                verb,
                resource: resource.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(Self::normalize(resp, verb, resource).await);
        }
        resp.json().await.map_err(|_| ClientError::Request {
            verb,
            resource: resource.to_string(),
        })
    }

    async fn delete(&self, path: &str, resource: &str) -> Result<(), ClientError> {
        let resp = self
            .http
            .delete(format!("{}{}", self.base_url, path))
            .send()
            .await
            .map_err(|_| ClientError::Request {
                verb: "delete",
                resource: resource.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(Self::normalize(resp, "delete", resource).await);
        }
        Ok(())
    }

    async fn normalize(resp: reqwest::Response, verb: &'static str, resource: &str) -> ClientError {
        let status = resp.status();
        match resp.json::<ErrorBody>().await {
            Ok(body) if !body.error.is_empty() => ClientError::Backend {
                status: status.as_u16(),
                message: body.error,
            },
            _ => ClientError::Request {
                verb,
                resource: resource.to_string(),
            },
        }
    }
}
