use crate::{
    ApiConnection, ApiInfo, Attrs, Dialer, Environ, EnvironConfig, EnvironProvider, Error,
    error::AttemptError,
    names::{ADMIN_USER, Tag},
    stop::StopListener,
};
use std::{fmt, sync::Arc, time::Duration};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Result of a single connection attempt.
pub(crate) type Outcome<C> = Result<(C, ApiInfo), AttemptError>;

/// Source of truth an attempt uses to find the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Strategy {
    /// Addresses and credentials cached after the previous successful connection.
    CachedEndpoint,
    /// Addresses asked from the provider environment built from configuration.
    ProviderConfig,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::CachedEndpoint => f.write_str("cached-endpoint"),
            Strategy::ProviderConfig => f.write_str("provider-config"),
        }
    }
}

/// Receiving end of a running attempt.
///
/// Dropping it refuses any later delivery, and closes a connection
/// which has been delivered but not received yet.
pub(crate) struct PendingAttempt<C: ApiConnection> {
    pub(crate) strategy: Strategy,
    pub(crate) rx: oneshot::Receiver<Outcome<C>>,
}

impl<C: ApiConnection> PendingAttempt<C> {
    /// Refuse the result and discard it, if it has been delivered already.
    pub(crate) async fn abandon(mut self) {
        self.rx.close();
        if let Ok(outcome) = self.rx.try_recv() {
            discard(self.strategy, outcome).await;
        }
    }
}

impl<C: ApiConnection> Drop for PendingAttempt<C> {
    fn drop(&mut self) {
        self.rx.close();
        if let Ok(outcome) = self.rx.try_recv() {
            let strategy = self.strategy;
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(discard(strategy, outcome));
                }
                Err(_) => warn!(%strategy, "no runtime to close abandoned API connection"),
            }
        }
    }
}

/// Spawn an attempt to connect to cached addresses with cached credentials, right away.
pub(crate) fn spawn_cached_endpoint<D: Dialer>(
    dialer: Arc<D>,
    info: ApiInfo,
    stop: StopListener,
) -> PendingAttempt<D::Conn> {
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        info!(addrs = ?info.addrs, "connecting to API addresses");
        let result = dialer.open(&info).await;
        let outcome = match result {
            Ok(conn) => Ok((conn, info)),
            Err(err) => {
                info!(addrs = ?info.addrs, error = %err, "failed to connect to API addresses");
                Err(err.into())
            }
        };

        deliver(Strategy::CachedEndpoint, tx, &stop, outcome).await;
    });

    PendingAttempt {
        strategy: Strategy::CachedEndpoint,
        rx,
    }
}

/// Spawn an attempt to connect via the provider environment built from `attrs`.
///
/// Configuration is validated at once, but the provider isn't touched
/// until `delay` passes, and is never touched if the stop signal fires first.
pub(crate) fn spawn_provider_config<D: Dialer>(
    dialer: Arc<D>,
    provider: Arc<dyn EnvironProvider>,
    attrs: Attrs,
    delay: Duration,
    mut stop: StopListener,
) -> PendingAttempt<D::Conn> {
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let outcome =
            provider_connect(dialer.as_ref(), provider.as_ref(), attrs, delay, &mut stop).await;
        deliver(Strategy::ProviderConfig, tx, &stop, outcome).await;
    });

    PendingAttempt {
        strategy: Strategy::ProviderConfig,
        rx,
    }
}

async fn provider_connect<D: Dialer>(
    dialer: &D,
    provider: &dyn EnvironProvider,
    attrs: Attrs,
    delay: Duration,
    stop: &mut StopListener,
) -> Outcome<D::Conn> {
    let config = EnvironConfig::new(attrs)?;

    debug!(?delay, env = %config.name(), "waiting before connecting via provider");
    tokio::select! {
        biased;
        _ = stop.stopped() => {
            debug!(env = %config.name(), "provider connection aborted");
            return Err(AttemptError::Aborted);
        }
        _ = tokio::time::sleep(delay) => {}
    }

    let environ = provider.construct(&config).await?;
    let info = prepare_api_info(environ.as_ref()).await?;

    info!(addrs = ?info.addrs, env = %config.name(), "connecting to API addresses from provider");
    let conn = dialer.open(&info).await?;

    Ok((conn, info))
}

/// Build admin connection info for the environment.
///
/// Provider lookup goes first, so its failure isn't hidden behind a missing secret.
pub(crate) async fn prepare_api_info(environ: &dyn Environ) -> Result<ApiInfo, Error> {
    let info = environ.state_info().await?;

    let password = environ.config().admin_secret().to_string();
    if password.is_empty() {
        return Err(Error::Unauthorized("cannot connect without admin-secret".into()));
    }

    Ok(ApiInfo {
        tag: Tag::user(ADMIN_USER),
        password,
        ..info
    })
}

/// Hand the outcome over to the broker, or discard it if nobody waits for it anymore.
async fn deliver<C: ApiConnection>(
    strategy: Strategy,
    tx: oneshot::Sender<Outcome<C>>,
    stop: &StopListener,
    outcome: Outcome<C>,
) {
    if stop.is_stopped() {
        discard(strategy, outcome).await;
    } else if let Err(outcome) = tx.send(outcome) {
        discard(strategy, outcome).await;
    }
}

/// Dispose of an outcome nobody is going to use.
pub(crate) async fn discard<C: ApiConnection>(strategy: Strategy, outcome: Outcome<C>) {
    match outcome {
        Ok((conn, info)) => {
            debug!(%strategy, addrs = ?info.addrs, "closing stale API connection");
            if let Err(err) = conn.close().await {
                warn!(%strategy, error = %err, "cannot close stale API connection");
            }
        }
        Err(AttemptError::Aborted) => {}
        Err(AttemptError::Failed(err)) => {
            warn!(%strategy, error = %err, "discarding stale API open error");
        }
    }
}
