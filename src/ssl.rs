//! `SslConfigurationProvider` collaborator (SPEC_FULL.md §11).
//!
//! The core treats this as opaque (spec.md §1): it supplies cert/key/trust
//! material as a set of driver-pod volumes/mounts/env plus a client trust
//! context, and the core never inspects the contents.

use crate::config::SubmitConfig;
use crate::error::SubmitError;
use crate::types::SslBundle;

pub trait SslConfigurationProvider: Send + Sync {
    fn prepare(&self, config: &SubmitConfig) -> Result<SslBundle, SubmitError>;
}

/// Default collaborator: TLS disabled, so the happy path runs without real
/// certificate material. Satisfies property 8 (scheme gating) trivially.
pub struct NoTlsSslProvider;

impl SslConfigurationProvider for NoTlsSslProvider {
    fn prepare(&self, _config: &SubmitConfig) -> Result<SslBundle, SubmitError> {
        Ok(SslBundle::disabled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_tls_provider_reports_disabled() {
        let bundle = NoTlsSslProvider.prepare(&SubmitConfig::default()).unwrap();
        assert!(!bundle.enabled);
        assert_eq!(bundle.scheme, "http");
        assert!(bundle.secrets.is_empty());
    }
}
