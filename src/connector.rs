use crate::{
    ApiConnection, ApiInfo, Dialer, DurationSeconds, Environ, EnvironInfo, EnvironProvider,
    EnvironStore, Environs, EnvironsSource, Error, Result,
    error::AttemptError,
    stop::StopSignal,
    strategy::{Strategy, prepare_api_info, spawn_cached_endpoint, spawn_provider_config},
};
use futures::future;
use std::{fmt, sync::Arc, time::Duration};
use tracing::{debug, info, warn};

/// Default delay before the provider configuration is used to connect,
/// while a cached endpoint is being tried.
pub const DEFAULT_PROVIDER_CONNECT_DELAY_SECONDS: DurationSeconds = 2;

/// Convenient builder of [`Connector`].
///
/// Store, provider and dialer are mandatory; the environments list source is optional.
pub struct ConnectorBuilder<D: Dialer> {
    store: Arc<dyn EnvironStore>,
    provider: Arc<dyn EnvironProvider>,
    dialer: D,
    environs: Option<Arc<dyn EnvironsSource>>,
    provider_delay: Duration,
}

impl<D: Dialer> ConnectorBuilder<D> {
    /// Create a builder with the default provider delay and without environments list.
    pub fn new(
        store: Arc<dyn EnvironStore>,
        provider: Arc<dyn EnvironProvider>,
        dialer: D,
    ) -> Self {
        Self {
            store,
            provider,
            dialer,
            environs: None,
            provider_delay: Duration::from_secs(DEFAULT_PROVIDER_CONNECT_DELAY_SECONDS),
        }
    }

    /// Use the environments list as a fallback configuration source
    /// and to resolve the default environment name.
    pub fn with_environs(mut self, environs: Arc<dyn EnvironsSource>) -> Self {
        self.environs = Some(environs);
        self
    }

    /// Set the delay before the provider configuration is used when a cached endpoint exists.
    pub fn with_provider_delay(mut self, delay: impl Into<Duration>) -> Self {
        self.provider_delay = delay.into();
        self
    }

    pub fn build(self) -> Connector<D> {
        Connector {
            store: self.store,
            provider: self.provider,
            dialer: Arc::new(self.dialer),
            environs: self.environs,
            provider_delay: self.provider_delay,
        }
    }
}

/// Connects to the controller API of named environments.
///
/// Each [`connect()`](Self::connect) races two sources of truth for the API endpoint:
/// the endpoint cached in the environment record, and the endpoint reported by the provider
/// environment built from configuration. The provider is asked only after a delay,
/// so in the usual case the cached endpoint wins and the provider is never hit.
/// The endpoint of the winner is cached for the next time.
pub struct Connector<D: Dialer> {
    store: Arc<dyn EnvironStore>,
    provider: Arc<dyn EnvironProvider>,
    dialer: Arc<D>,
    environs: Option<Arc<dyn EnvironsSource>>,
    provider_delay: Duration,
}

impl<D: Dialer> Connector<D> {
    /// Open an API connection to the named environment.
    ///
    /// Empty name means the default environment from the environments list.
    /// The returned connection is owned by the caller.
    pub async fn connect(&self, env_name: &str) -> Result<D::Conn> {
        let environs = self.read_environs().await?;
        let env_name = match &environs {
            Some(environs) => environs.resolve_name(env_name)?,
            None if env_name.is_empty() => return Err(Error::NoDefaultEnvironment),
            None => env_name.to_string(),
        };

        let record = match self.store.read_info(&env_name).await {
            Ok(record) => Some(record),
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(err.into()),
        };

        // fires on every return path below
        let stop = StopSignal::new();
        let mut pending = Vec::with_capacity(2);

        if let Some(info) = record.as_ref().and_then(EnvironInfo::cached_api_info) {
            info!(env = %env_name, "using cached API connection settings");
            pending.push(spawn_cached_endpoint(self.dialer.clone(), info, stop.listener()));
        } else {
            info!(env = %env_name, "no cached API connection settings found");
        }

        let config = record
            .as_ref()
            .and_then(EnvironInfo::bootstrap_config)
            .or_else(|| environs.as_ref().and_then(|environs| environs.config(&env_name)))
            .cloned();
        if let Some(attrs) = config {
            // don't make the provider wait for nothing
            let delay = if pending.is_empty() {
                Duration::ZERO
            } else {
                self.provider_delay
            };
            pending.push(spawn_provider_config(
                self.dialer.clone(),
                self.provider.clone(),
                attrs,
                delay,
                stop.listener(),
            ));
        }

        if pending.is_empty() {
            return Err(Error::NotFound(format!("environment {env_name:?}")));
        }

        let mut cached_err = None;
        let mut provider_err = None;
        let mut connected = None;

        while !pending.is_empty() {
            let receivers = pending.iter_mut().map(|attempt| &mut attempt.rx);
            let (result, index, _) = future::select_all(receivers).await;
            let strategy = pending.swap_remove(index).strategy;
            let outcome = result.unwrap_or_else(|_| {
                Err(AttemptError::Failed(Error::ConnectFailed(format!(
                    "{strategy} attempt terminated unexpectedly"
                ))))
            });

            match outcome {
                Ok(success) => {
                    connected = Some((strategy, success));
                    break;
                }
                Err(err) => {
                    debug!(%strategy, env = %env_name, "connection attempt failed");
                    match strategy {
                        Strategy::CachedEndpoint => cached_err = Some(err),
                        Strategy::ProviderConfig => provider_err = Some(err),
                    }
                }
            }
        }

        stop.stop();
        for attempt in pending {
            attempt.abandon().await;
        }

        if let Some((strategy, (conn, info))) = connected {
            info!(%strategy, env = %env_name, addrs = ?info.addrs, "connected to API");
            self.update_cache(&env_name, record, &info).await;
            return Ok(conn);
        }

        match (provider_err, cached_err) {
            (Some(provider_err), cached_err) => {
                // configuration lookup is the most current source of truth
                if let Some(cached_err) = cached_err.map(Error::from) {
                    warn!(env = %env_name, error = %cached_err, "discarding API open error");
                }
                Err(provider_err.into())
            }
            (None, Some(cached_err)) => Err(cached_err.into()),
            (None, None) => {
                unreachable!("every attempt failed without an error, looks like a BUG!")
            }
        }
    }

    /// Open an admin API connection to an environment the caller has constructed already.
    ///
    /// The cache isn't consulted or updated.
    pub async fn connect_environ(&self, environ: Box<dyn Environ>) -> Result<ApiConn<D::Conn>> {
        let info = prepare_api_info(environ.as_ref()).await?;

        info!(addrs = ?info.addrs, env = %environ.config().name(), "connecting to API addresses");
        let conn = self.dialer.open(&info).await?;

        Ok(ApiConn { environ, conn })
    }

    async fn read_environs(&self) -> Result<Option<Environs>> {
        let Some(source) = &self.environs else {
            return Ok(None);
        };

        match source.read_environs().await {
            Ok(environs) => Ok(Some(environs)),
            Err(err) if err.is_not_found() => {
                debug!(error = %err, "no environments list");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Remember the endpoint of a successful connection. Failure isn't fatal.
    async fn update_cache(&self, env_name: &str, record: Option<EnvironInfo>, info: &ApiInfo) {
        let mut record = record.unwrap_or_default();
        if let Err(err) = record.update_from(info) {
            warn!(env = %env_name, error = %err, "API connection settings aren't cacheable");
            return;
        }

        match self.store.write_info(env_name, &record).await {
            Ok(()) => info!(env = %env_name, "updated API connection settings cache"),
            Err(err) => {
                let err = Error::CacheWriteFailed(err);
                warn!(env = %env_name, error = %err, "API connection settings cache is stale");
            }
        }
    }
}

/// API connection together with the environment it was opened for.
pub struct ApiConn<C: ApiConnection> {
    pub environ: Box<dyn Environ>,
    pub conn: C,
}

impl<C: ApiConnection> ApiConn<C> {
    /// Close the connection; the environment is released as well.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await
    }
}

impl<C: ApiConnection + fmt::Debug> fmt::Debug for ApiConn<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConn")
            .field("environ", &self.environ.config().name())
            .field("conn", &self.conn)
            .finish()
    }
}
