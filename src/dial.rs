use crate::{ApiInfo, Result};
use async_trait::async_trait;

/// Live controller API session.
#[async_trait]
pub trait ApiConnection: Send + 'static {
    /// Release the controller side session.
    async fn close(self) -> Result<()>;
}

/// Opens API connections; the only network facing primitive of the crate.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    type Conn: ApiConnection;

    /// Open a connection using the addresses and credentials from `info`.
    ///
    /// Connect timeouts and address retries are the dialer's business.
    async fn open(&self, info: &ApiInfo) -> Result<Self::Conn>;
}
