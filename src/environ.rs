use crate::{ApiInfo, EnvironConfig, Result};
use async_trait::async_trait;

/// Provider environment constructed from configuration.
#[async_trait]
pub trait Environ: Send + Sync {
    /// Configuration the environment was constructed from.
    fn config(&self) -> &EnvironConfig;

    /// Look up controller addresses and CA certificate.
    ///
    /// This usually needs a remote call to the provider, so it may be slow.
    /// Identity fields of the returned info are ignored.
    async fn state_info(&self) -> Result<ApiInfo>;
}

/// Constructs provider environments.
#[async_trait]
pub trait EnvironProvider: Send + Sync {
    async fn construct(&self, config: &EnvironConfig) -> Result<Box<dyn Environ>>;
}
