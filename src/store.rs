use crate::{EnvironInfo, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Persistent storage of per-environment records.
#[async_trait]
pub trait EnvironStore: Send + Sync {
    /// Read the record of the named environment.
    ///
    /// Must return [`StoreError::NotFound`] if there is no record.
    async fn read_info(&self, env_name: &str) -> Result<EnvironInfo, StoreError>;

    /// Create or replace the record of the named environment.
    async fn write_info(&self, env_name: &str, info: &EnvironInfo) -> Result<(), StoreError>;
}

/// In-memory [`EnvironStore`].
#[derive(Debug, Default)]
pub struct MemStore {
    infos: RwLock<HashMap<String, EnvironInfo>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a single record.
    pub fn with_info(env_name: impl Into<String>, info: EnvironInfo) -> Self {
        Self {
            infos: RwLock::new(HashMap::from([(env_name.into(), info)])),
        }
    }
}

#[async_trait]
impl EnvironStore for MemStore {
    async fn read_info(&self, env_name: &str) -> Result<EnvironInfo, StoreError> {
        self.infos
            .read()
            .await
            .get(env_name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("environment {env_name:?}")))
    }

    async fn write_info(&self, env_name: &str, info: &EnvironInfo) -> Result<(), StoreError> {
        self.infos.write().await.insert(env_name.to_string(), info.clone());
        Ok(())
    }
}
