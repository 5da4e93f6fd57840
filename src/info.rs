use crate::{Attrs, Error, Result, names::Tag};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything needed to open an API connection to the controller.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiInfo {
    /// Controller addresses in `host:port` form, in preference order.
    pub addrs: Vec<String>,
    /// PEM encoded CA certificate of the controller.
    pub ca_cert: String,
    /// Identity to authenticate as.
    pub tag: Tag,
    /// Secret of the identity.
    pub password: String,
}

impl ApiInfo {
    /// Info can be dialed only if there is at least one address.
    pub fn is_usable(&self) -> bool {
        !self.addrs.is_empty()
    }
}

impl fmt::Debug for ApiInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiInfo")
            .field("addrs", &self.addrs)
            .field("tag", &self.tag)
            .field("password", &"<hidden>")
            .finish_non_exhaustive()
    }
}

/// Cached controller endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApiEndpoint {
    pub addresses: Vec<String>,
    pub ca_cert: String,
}

/// Cached credentials.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCredentials {
    /// User name, without the `user-` tag prefix.
    pub user: String,
    pub password: String,
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("user", &self.user)
            .field("password", &"<hidden>")
            .finish()
    }
}

/// Persisted per-environment record: connection cache plus bootstrap configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EnvironInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_endpoint: Option<ApiEndpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_credentials: Option<ApiCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bootstrap_config: Option<Attrs>,
}

impl EnvironInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_endpoint(mut self, endpoint: ApiEndpoint) -> Self {
        self.api_endpoint = Some(endpoint);
        self
    }

    pub fn with_api_credentials(mut self, credentials: ApiCredentials) -> Self {
        self.api_credentials = Some(credentials);
        self
    }

    pub fn with_bootstrap_config(mut self, config: Attrs) -> Self {
        self.bootstrap_config = Some(config);
        self
    }

    pub fn api_endpoint(&self) -> Option<&ApiEndpoint> {
        self.api_endpoint.as_ref()
    }

    pub fn set_api_endpoint(&mut self, endpoint: ApiEndpoint) {
        self.api_endpoint = Some(endpoint);
    }

    pub fn api_credentials(&self) -> Option<&ApiCredentials> {
        self.api_credentials.as_ref()
    }

    pub fn set_api_credentials(&mut self, credentials: ApiCredentials) {
        self.api_credentials = Some(credentials);
    }

    /// Bootstrap configuration, if it's present and non-empty.
    pub fn bootstrap_config(&self) -> Option<&Attrs> {
        self.bootstrap_config.as_ref().filter(|cfg| !cfg.is_empty())
    }

    /// Connection info built from the cached endpoint and credentials.
    ///
    /// Returns `None` if there is no cached endpoint or it has no addresses.
    pub(crate) fn cached_api_info(&self) -> Option<ApiInfo> {
        let endpoint = self.api_endpoint.as_ref().filter(|e| !e.addresses.is_empty())?;
        let credentials = self.api_credentials.clone().unwrap_or_default();

        Some(ApiInfo {
            addrs: endpoint.addresses.clone(),
            ca_cert: endpoint.ca_cert.clone(),
            tag: Tag::user(credentials.user),
            password: credentials.password,
        })
    }

    /// Refresh the cache part of the record from the info of a successful connection.
    ///
    /// Only user credentials can be cached; the record is left intact otherwise.
    pub(crate) fn update_from(&mut self, info: &ApiInfo) -> Result<()> {
        let Tag::User(user) = &info.tag else {
            return Err(Error::InvalidTag(format!("{} (expected user tag)", info.tag)));
        };

        self.set_api_endpoint(ApiEndpoint {
            addresses: info.addrs.clone(),
            ca_cert: info.ca_cert.clone(),
        });
        self.set_api_credentials(ApiCredentials {
            user: user.clone(),
            password: info.password.clone(),
        });

        Ok(())
    }
}
