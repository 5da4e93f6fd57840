#![allow(dead_code)]

use async_trait::async_trait;
use ctrlplane_connect::{
    ApiConnection, ApiCredentials, ApiEndpoint, ApiInfo, Attrs, Connector, ConnectorBuilder, Dialer,
    Environ, EnvironConfig, EnvironInfo, EnvironProvider, EnvironStore, Environs, EnvironsSource,
    Error, MemStore, Result, StoreError, Tag,
};
use serde_json::json;
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

pub const ENV_NAME: &str = "prod";
pub const CACHED_ADDR: &str = "10.0.0.1:17070";
pub const PROVIDER_ADDR: &str = "10.0.0.2:17070";
pub const ADMIN_SECRET: &str = "s3cret";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Connection which counts its `close()` calls.
#[derive(Debug)]
pub struct FakeConn {
    pub addr: String,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl ApiConnection for FakeConn {
    async fn close(self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// How the fake dialer reacts on an address.
#[derive(Debug, Clone)]
pub struct Dial {
    pub delay: Duration,
    pub result: Result<()>,
}

impl Dial {
    pub fn ok(delay_secs: u64) -> Self {
        Self {
            delay: Duration::from_secs(delay_secs),
            result: Ok(()),
        }
    }

    pub fn fail(delay_secs: u64, err: Error) -> Self {
        Self {
            delay: Duration::from_secs(delay_secs),
            result: Err(err),
        }
    }
}

#[derive(Debug, Default)]
struct DialerState {
    behaviour: Mutex<HashMap<String, Dial>>,
    dialed: Mutex<Vec<ApiInfo>>,
    opened: Mutex<Vec<(String, Arc<AtomicUsize>)>>,
}

/// Dialer with scripted per-address behaviour, keyed by the first address.
#[derive(Debug, Clone, Default)]
pub struct FakeDialer {
    state: Arc<DialerState>,
}

impl FakeDialer {
    pub fn with(self, addr: &str, dial: Dial) -> Self {
        self.state.behaviour.lock().unwrap().insert(addr.to_string(), dial);
        self
    }

    /// Infos of every `open()` call, in call order.
    pub fn dialed(&self) -> Vec<ApiInfo> {
        self.state.dialed.lock().unwrap().clone()
    }

    pub fn dialed_addrs(&self) -> Vec<String> {
        self.dialed().into_iter().map(|info| info.addrs[0].clone()).collect()
    }

    /// Number of connections opened to `addr`.
    pub fn opened(&self, addr: &str) -> usize {
        self.state.opened.lock().unwrap().iter().filter(|(a, _)| a == addr).count()
    }

    /// Total number of `close()` calls on connections opened to `addr`.
    pub fn closed(&self, addr: &str) -> usize {
        self.state
            .opened
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| a == addr)
            .map(|(_, closed)| closed.load(Ordering::SeqCst))
            .sum()
    }
}

#[async_trait]
impl Dialer for FakeDialer {
    type Conn = FakeConn;

    async fn open(&self, info: &ApiInfo) -> Result<FakeConn> {
        let addr = info.addrs[0].clone();
        self.state.dialed.lock().unwrap().push(info.clone());

        let dial = self
            .state
            .behaviour
            .lock()
            .unwrap()
            .get(&addr)
            .cloned()
            .unwrap_or_else(|| Dial::fail(0, Error::ConnectFailed(format!("no route to {addr}"))));

        tokio::time::sleep(dial.delay).await;
        dial.result?;

        let closed = Arc::new(AtomicUsize::new(0));
        self.state.opened.lock().unwrap().push((addr.clone(), closed.clone()));
        Ok(FakeConn { addr, closed })
    }
}

struct FakeEnviron {
    config: EnvironConfig,
    addr: String,
}

#[async_trait]
impl Environ for FakeEnviron {
    fn config(&self) -> &EnvironConfig {
        &self.config
    }

    async fn state_info(&self) -> Result<ApiInfo> {
        Ok(ApiInfo {
            addrs: vec![self.addr.clone()],
            ca_cert: "provider-ca".into(),
            tag: Tag::user("nobody"),
            password: String::new(),
        })
    }
}

/// Environment built by the caller, reporting [`PROVIDER_ADDR`].
pub fn fake_environ(admin_secret: &str) -> Box<dyn Environ> {
    Box::new(FakeEnviron {
        config: EnvironConfig::new(config_attrs(admin_secret)).unwrap(),
        addr: PROVIDER_ADDR.to_string(),
    })
}

/// Provider whose environments report [`PROVIDER_ADDR`].
#[derive(Debug, Default)]
pub struct FakeProvider {
    pub constructed: AtomicUsize,
    pub fail: Option<Error>,
}

impl FakeProvider {
    pub fn failing(err: Error) -> Self {
        Self {
            fail: Some(err),
            ..Default::default()
        }
    }

    pub fn constructed(&self) -> usize {
        self.constructed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EnvironProvider for FakeProvider {
    async fn construct(&self, config: &EnvironConfig) -> Result<Box<dyn Environ>> {
        self.constructed.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.fail {
            return Err(err.clone());
        }

        Ok(Box::new(FakeEnviron {
            config: config.clone(),
            addr: PROVIDER_ADDR.to_string(),
        }))
    }
}

/// Store which fails on reads or writes.
#[derive(Debug, Default)]
pub struct BrokenStore {
    inner: MemStore,
    fail_reads: bool,
}

impl BrokenStore {
    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Default::default()
        }
    }

    pub fn failing_writes(info: EnvironInfo) -> Self {
        Self {
            inner: MemStore::with_info(ENV_NAME, info),
            fail_reads: false,
        }
    }
}

#[async_trait]
impl EnvironStore for BrokenStore {
    async fn read_info(&self, env_name: &str) -> Result<EnvironInfo, StoreError> {
        if self.fail_reads {
            Err(StoreError::Backend("permission denied".into()))
        } else {
            self.inner.read_info(env_name).await
        }
    }

    async fn write_info(&self, _env_name: &str, _info: &EnvironInfo) -> Result<(), StoreError> {
        Err(StoreError::Backend("read-only file system".into()))
    }
}

/// Environments list source which always fails with the same error.
#[derive(Debug)]
pub struct FailingSource(pub StoreError);

#[async_trait]
impl EnvironsSource for FailingSource {
    async fn read_environs(&self) -> Result<Environs, StoreError> {
        Err(self.0.clone())
    }
}

pub fn config_attrs(admin_secret: &str) -> Attrs {
    json!({
        "name": ENV_NAME,
        "type": "dummy",
        "admin-secret": admin_secret,
    })
    .as_object()
    .cloned()
    .unwrap()
}

/// Record with the endpoint cached at [`CACHED_ADDR`].
pub fn cached_record() -> EnvironInfo {
    EnvironInfo::new()
        .with_api_endpoint(ApiEndpoint {
            addresses: vec![CACHED_ADDR.to_string()],
            ca_cert: "cached-ca".into(),
        })
        .with_api_credentials(ApiCredentials {
            user: "bob".into(),
            password: "bob-pw".into(),
        })
}

pub fn environs(default: Option<&str>) -> Environs {
    Environs {
        default: default.map(String::from),
        configs: [(ENV_NAME.to_string(), config_attrs(ADMIN_SECRET))].into_iter().collect(),
    }
}

pub fn connector(
    store: Arc<dyn EnvironStore>,
    provider: Arc<FakeProvider>,
    dialer: FakeDialer,
) -> Connector<FakeDialer> {
    ConnectorBuilder::new(store, provider, dialer).build()
}
