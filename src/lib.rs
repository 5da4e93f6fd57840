//! Connect to the controller API of a cluster environment.
//!
//! [`Connector`] opens an authenticated API connection for a named environment. There are two
//! possible sources of truth for the controller endpoint:
//!
//! - addresses, CA certificate and credentials cached in the environment record after the
//!   previous successful connection;
//! - the provider environment constructed from the environment configuration, which knows the
//!   actual addresses but usually needs a slow remote call to tell them.
//!
//! Both are tried concurrently. The provider is asked only after a short delay
//! ([`DEFAULT_PROVIDER_CONNECT_DELAY_SECONDS`] by default), so in the usual case the cached
//! endpoint wins and the provider is never hit. If the cache is stale, the provider wins, and its
//! endpoint is cached for the next time. Connection of the loser, if any, is closed.
//! When both fail, the error of the provider attempt is returned as the most current one.
//!
//! Storage, environments list, provider and the transport are plugged in via traits:
//! [`EnvironStore`], [`EnvironsSource`], [`EnvironProvider`] and [`Dialer`].
//!
//! ```no_run
//! # use ctrlplane_connect::*;
//! # use std::{sync::Arc, time::Duration};
//! # async fn example<D: Dialer>(provider: Arc<dyn EnvironProvider>, dialer: D) -> Result<()> {
//! let store = Arc::new(MemStore::new());
//! let connector = ConnectorBuilder::new(store, provider, dialer)
//!     .with_provider_delay(Duration::from_secs(1))
//!     .build();
//!
//! let conn = connector.connect("prod").await?;
//! // talk to the controller...
//! conn.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`LeadershipPinningApi`] is the controller side facade which lets machine agents pin and
//! unpin leadership of the applications running on their machines.
#![deny(unsafe_code)]

mod config;
mod connector;
mod dial;
mod environ;
mod error;
mod info;
mod leadership;
mod names;
mod stop;
mod store;
mod strategy;

pub use config::{Attrs, EnvironConfig, Environs, EnvironsSource};
pub use connector::{ApiConn, Connector, ConnectorBuilder, DEFAULT_PROVIDER_CONNECT_DELAY_SECONDS};
pub use dial::{ApiConnection, Dialer};
pub use environ::{Environ, EnvironProvider};
pub use error::{Error, StoreError};
pub use info::{ApiCredentials, ApiEndpoint, ApiInfo, EnvironInfo};
pub use leadership::{
    Authorizer, LeadershipMachine, LeadershipPinningApi, LeadershipPinningBackend,
    PinApplicationResult, PinApplicationsResults, Pinner, ServerError,
};
pub use names::{ADMIN_USER, Tag};
pub use store::{EnvironStore, MemStore};

/// Convenient alias for `Result`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Type to represent duration of time in seconds.
pub type DurationSeconds = u64;
