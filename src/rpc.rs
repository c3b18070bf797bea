//! `SubmissionRpc` / `HttpClientFactory` (SPEC_FULL.md §11): the typed client
//! the core speaks to the driver's in-pod submission endpoint through
//! (spec.md §1 "Out of scope" — the endpoint itself, not this client shape).

use std::collections::HashSet;
use std::time::Duration;

use crate::error::SubmitError;
use crate::types::{ClientTrustContext, SubmissionRequest};

#[async_trait::async_trait]
pub trait SubmissionRpc: Send + Sync {
    async fn ping(&self) -> Result<(), SubmitError>;
    async fn submit_application(&self, request: &SubmissionRequest) -> Result<(), SubmitError>;
}

pub struct RpcClientParams {
    pub uris: HashSet<String>,
    pub max_retries_per_server: u32,
    pub trust_ctx: Option<ClientTrustContext>,
    pub connect_timeout: Duration,
}

pub trait HttpClientFactory: Send + Sync {
    fn build(&self, params: RpcClientParams) -> Result<Box<dyn SubmissionRpc>, SubmitError>;
}

pub struct ReqwestHttpClientFactory;

impl HttpClientFactory for ReqwestHttpClientFactory {
    fn build(&self, params: RpcClientParams) -> Result<Box<dyn SubmissionRpc>, SubmitError> {
        let mut builder = reqwest::Client::builder().timeout(params.connect_timeout);
        if let Some(trust) = &params.trust_ctx {
            let cert = reqwest::Certificate::from_pem(&trust.ca_cert_pem)
                .map_err(|e| SubmitError::SubmissionRpcError(e.to_string()))?;
            builder = builder.add_root_certificate(cert);
        }
        let client = builder
            .build()
            .map_err(|e| SubmitError::SubmissionRpcError(e.to_string()))?;

        Ok(Box::new(ReqwestSubmissionRpc {
            client,
            uris: params.uris.into_iter().collect(),
            max_retries_per_server: params.max_retries_per_server,
        }))
    }
}

struct ReqwestSubmissionRpc {
    client: reqwest::Client,
    uris: Vec<String>,
    max_retries_per_server: u32,
}

impl ReqwestSubmissionRpc {
    async fn round_robin<F, Fut>(&self, op: F) -> Result<(), SubmitError>
    where
        F: Fn(reqwest::Client, String) -> Fut,
        Fut: std::future::Future<Output = Result<(), SubmitError>>,
    {
        let mut last_err = SubmitError::SubmissionRpcError("no submission endpoints configured".to_string());
        for _ in 0..self.max_retries_per_server.max(1) {
            for uri in &self.uris {
                match op(self.client.clone(), uri.clone()).await {
                    Ok(()) => return Ok(()),
                    Err(err) => {
                        tracing::warn!(uri = %uri, error = %err, "submission rpc attempt failed");
                        last_err = err;
                    }
                }
            }
        }
        Err(last_err)
    }
}

#[async_trait::async_trait]
impl SubmissionRpc for ReqwestSubmissionRpc {
    async fn ping(&self) -> Result<(), SubmitError> {
        self.round_robin(|client, uri| async move {
            let response = client
                .get(format!("{uri}/v1/submissions/ping"))
                .send()
                .await
                .map_err(|e| SubmitError::SubmissionRpcError(e.to_string()))?;
            if response.status().is_success() {
                Ok(())
            } else {
                Err(SubmitError::SubmissionRpcError(format!("ping returned {}", response.status())))
            }
        })
        .await
    }

    async fn submit_application(&self, request: &SubmissionRequest) -> Result<(), SubmitError> {
        self.round_robin(|client, uri| async move {
            let response = client
                .post(format!("{uri}/v1/submissions/create"))
                .json(request)
                .send()
                .await
                .map_err(|e| SubmitError::SubmissionRpcError(e.to_string()))?;
            if response.status().is_success() {
                Ok(())
            } else {
                Err(SubmitError::SubmissionRpcError(format!("submit returned {}", response.status())))
            }
        })
        .await
    }
}
