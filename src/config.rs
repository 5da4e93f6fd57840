use crate::{Error, Result, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw environment configuration attributes.
pub type Attrs = serde_json::Map<String, Value>;

const NAME_ATTR: &str = "name";
const TYPE_ATTR: &str = "type";
const ADMIN_SECRET_ATTR: &str = "admin-secret";

/// Validated environment configuration, ready to construct a provider environment from.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironConfig {
    attrs: Attrs,
}

impl EnvironConfig {
    /// Validate raw attributes: `name` and `type` must be non-empty strings.
    pub fn new(attrs: Attrs) -> Result<Self> {
        for key in [NAME_ATTR, TYPE_ATTR] {
            match attrs.get(key) {
                Some(Value::String(value)) if !value.is_empty() => {}
                Some(Value::String(_)) | None => {
                    let reason = format!("{key} attribute is missing or empty");
                    return Err(Error::InvalidConfig(reason));
                }
                Some(other) => {
                    let reason = format!("{key}: expected string, got {other}");
                    return Err(Error::InvalidConfig(reason));
                }
            }
        }

        Ok(Self { attrs })
    }

    pub fn name(&self) -> &str {
        self.str_attr(NAME_ATTR).unwrap_or_default()
    }

    pub fn provider_type(&self) -> &str {
        self.str_attr(TYPE_ATTR).unwrap_or_default()
    }

    /// Administrative secret, empty if it isn't configured.
    pub fn admin_secret(&self) -> &str {
        self.str_attr(ADMIN_SECRET_ATTR).unwrap_or_default()
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    fn str_attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }
}

/// Configured environments list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environs {
    /// Name of the environment to use when none is requested explicitly.
    pub default: Option<String>,
    /// Raw configuration attributes by environment name.
    pub configs: BTreeMap<String, Attrs>,
}

impl Environs {
    /// Raw configuration of the named environment.
    pub fn config(&self, name: &str) -> Option<&Attrs> {
        self.configs.get(name)
    }

    /// Resolve requested name: empty one means the default environment.
    pub(crate) fn resolve_name(&self, name: &str) -> Result<String> {
        if !name.is_empty() {
            return Ok(name.to_string());
        }

        match &self.default {
            Some(default) if !default.is_empty() => Ok(default.clone()),
            _ => Err(Error::NoDefaultEnvironment),
        }
    }
}

/// Source of the configured environments list.
#[async_trait]
pub trait EnvironsSource: Send + Sync {
    /// Read the list.
    ///
    /// [`StoreError::NotFound`] means there is no list at all, which isn't fatal for connecting.
    async fn read_environs(&self) -> Result<Environs, StoreError>;
}

#[async_trait]
impl EnvironsSource for Environs {
    async fn read_environs(&self) -> Result<Environs, StoreError> {
        Ok(self.clone())
    }
}
