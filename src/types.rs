//! Data model shared across components (spec.md §3).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{APP_ID_LABEL_KEY, APP_NAME_LABEL_KEY, DRIVER_LABEL_KEY, DRIVER_LABEL_VALUE};

/// Label-key → label-value mapping applied to every resource the core creates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selectors(BTreeMap<String, String>);

impl Selectors {
    /// Builds the reserved selector set for one app, folding in parsed custom labels.
    ///
    /// `custom` must not contain the reserved app-id key; callers run it through
    /// [`crate::labels::parse`] first, which enforces that.
    pub fn new(app_id: &str, app_name: &str, custom: BTreeMap<String, String>) -> Self {
        let mut map = custom;
        map.insert(DRIVER_LABEL_KEY.to_string(), DRIVER_LABEL_VALUE.to_string());
        map.insert(APP_ID_LABEL_KEY.to_string(), app_id.to_string());
        map.insert(APP_NAME_LABEL_KEY.to_string(), app_name.to_string());
        Self(map)
    }

    pub fn as_btree_map(&self) -> BTreeMap<String, String> {
        self.0.clone()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

/// The main submitted artifact, tagged by how the driver should obtain it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AppResource {
    Uploaded { name: String, blob_base64: String },
    ContainerLocal { path: String },
    Remote { uri: String },
}

/// The payload handed to the driver's submission endpoint (spec.md §3, §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub app: AppResource,
    pub main_class: String,
    pub args: Vec<String>,
    pub secret: String,
    pub properties: BTreeMap<String, String>,
    pub files_blob: Option<String>,
    pub jars_blob: Option<String>,
}

/// Opaque bundle produced by the SSL collaborator (spec.md §3).
///
/// `client_socket_ctx`/`client_trust_ctx` are left as an enum rather than a
/// fixed type because the core never inspects them; it only forwards them to
/// the `HttpClientFactory`.
#[derive(Debug, Clone, Default)]
pub struct SslBundle {
    pub enabled: bool,
    pub scheme: &'static str,
    pub secrets: Vec<k8s_openapi::api::core::v1::Secret>,
    pub volumes: Vec<k8s_openapi::api::core::v1::Volume>,
    pub volume_mounts: Vec<k8s_openapi::api::core::v1::VolumeMount>,
    pub env: Vec<k8s_openapi::api::core::v1::EnvVar>,
    pub client_trust_ctx: Option<ClientTrustContext>,
}

/// What the RPC client needs to validate the driver's certificate, if any.
#[derive(Debug, Clone)]
pub struct ClientTrustContext {
    pub ca_cert_pem: Vec<u8>,
}

impl SslBundle {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            scheme: "http",
            ..Default::default()
        }
    }
}
