use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// Mirrors of the backend API's JSON. Everything here is a read-only view model
// fetched fresh from the backend; the console keeps no resource state of its own.

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContainerSummary {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub state: ContainerState,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created: String,
    // Port map as the engine reports it; passed through untouched.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub ports: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerState {
    #[serde(default)]
    pub running: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ImageSummary {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub size: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub architecture: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub os: String,
    #[serde(default, rename = "inUse")]
    pub in_use: bool,
}

impl ImageSummary {
    pub fn display_name(&self) -> &str {
        self.tags.first().map(String::as_str).unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkSummary {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub driver: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipam: Option<Vec<IpamConfig>>,
    #[serde(default)]
    pub internal: bool,
    #[serde(default, rename = "inUse")]
    pub in_use: bool,
    #[serde(default)]
    pub containers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct IpamConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VolumeSummary {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub driver: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mountpoint: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default, rename = "inUse")]
    pub in_use: bool,
}

/// One container's published ports, as served by `/api/ports/`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPorts {
    #[serde(default)]
    pub container_id: String,
    #[serde(default)]
    pub container_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network_name: String,
    #[serde(default)]
    pub ports: HashMap<String, Option<Vec<PortBinding>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct PortBinding {
    #[serde(default)]
    pub host_ip: String,
    #[serde(default)]
    pub host_port: String,
}

/// Resource counts from `/api/stats`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DockerStats {
    #[serde(default)]
    pub containers: ContainerCounts,
    #[serde(default)]
    pub images: usize,
    #[serde(default)]
    pub networks: usize,
    #[serde(default)]
    pub volumes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContainerCounts {
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub running: usize,
    #[serde(default)]
    pub stopped: usize,
}

/// Host stats from `/api/system/stats`. The nested shapes are reported by the
/// backend and rendered verbatim, so they stay as JSON values past the top level.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SystemStats {
    #[serde(default)]
    pub cpu: Value,
    #[serde(default)]
    pub memory: Value,
    #[serde(default)]
    pub disk: Value,
    #[serde(default)]
    pub network: Value,
}

/// Log tail for one container, replaced wholesale on every fetch.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LogTail {
    #[serde(default)]
    pub logs: String,
    #[serde(default)]
    pub container: LogContainer,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LogContainer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
}

/// The four resource kinds the console manages. Each kind knows which row
/// actions it supports and how its delete path is spelled on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Container,
    Image,
    Network,
    Volume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    Logs,
    Delete,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Container => "container",
            ResourceKind::Image => "image",
            ResourceKind::Network => "network",
            ResourceKind::Volume => "volume",
        }
    }

    pub fn allowed_actions(&self) -> &'static [Action] {
        match self {
            ResourceKind::Container => &[Action::Start, Action::Stop, Action::Logs, Action::Delete],
            ResourceKind::Image | ResourceKind::Network | ResourceKind::Volume => &[Action::Delete],
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        self.allowed_actions().contains(&action)
    }

    /// Backend path for deleting one resource of this kind. Images, networks
    /// and volumes keep the trailing slash the backend routes expect.
    pub fn delete_path(&self, id: &str) -> String {
        match self {
            ResourceKind::Container => format!("/api/containers/{}/", id),
            ResourceKind::Image => format!("/api/images/{}/", id),
            ResourceKind::Network => format!("/api/networks/{}/", id),
            ResourceKind::Volume => format!("/api/volumes/{}/", id),
        }
    }
}
