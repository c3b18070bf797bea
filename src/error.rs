//! `SubmitError`, the single error type raised by the core (spec.md §7).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invalid master url {0:?}: must start with \"k8s://\"")]
    InvalidMasterUrl(String),

    #[error("malformed label token {0:?}: expected \"key=value\"")]
    MalformedLabel(String),

    #[error("reserved label key {0:?} may not be set explicitly")]
    ReservedLabel(String),

    #[error("ingress mode is enabled but no ingress base path was configured")]
    MissingIngressBasePath,

    #[error("local file {0:?} does not exist or is not a regular file")]
    LocalFileMissing(PathBuf),

    #[error(
        "pod {pod} in namespace {namespace} was not ready in {secs} seconds\n{diagnostics}",
        secs = timeout.as_secs()
    )]
    PodNotReady {
        pod: String,
        namespace: String,
        timeout: Duration,
        diagnostics: String,
    },

    #[error("service {0:?} was not ready within the driver-submit timeout")]
    ServiceNotReady(String),

    #[error("endpoints for {0:?} were not ready within the driver-submit timeout")]
    EndpointsNotReady(String),

    #[error("ingress {0:?} was not ready within the driver-submit timeout")]
    IngressNotReady(String),

    #[error("failed to collect pod diagnostics after readiness timeout")]
    DiagnosticFetchFailed(#[source] Box<SubmitError>),

    #[error("no reachable driver endpoints were discovered")]
    NoReachableNodes,

    #[error("submission rpc failed: {0}")]
    SubmissionRpcError(String),

    #[error("kubernetes api call failed")]
    ClusterApiError(#[from] kube::Error),

    #[error("watch on pod {0:?} closed before it reached a terminal phase")]
    ClusterWatchClosed(String),

    #[error("failed to build kubeconfig-derived client")]
    ClusterConfigError(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SubmitError {
    /// `true` for the pre-flight kinds of §7, which make no Kubernetes calls.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            SubmitError::InvalidMasterUrl(_)
                | SubmitError::MalformedLabel(_)
                | SubmitError::ReservedLabel(_)
                | SubmitError::MissingIngressBasePath
                | SubmitError::LocalFileMissing(_)
        )
    }
}
