//! Leadership pinning facade for machine agents.
//!
//! A machine agent pins leadership of every application with units on its machine,
//! e.g. for the time of an upgrade, so leadership can't move while the agent is busy,
//! and unpins it afterwards.

use crate::{Error, Result, names::Tag};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Machine hosting application units.
pub trait LeadershipMachine {
    /// Names of the applications with units on the machine.
    fn application_names(&self) -> Result<Vec<String>>;
}

/// State lookups the facade needs.
pub trait LeadershipPinningBackend {
    fn machine(&self, id: &str) -> Result<Box<dyn LeadershipMachine>>;
}

/// Pins and unpins application leadership on behalf of an entity.
///
/// Both operations must be idempotent.
pub trait Pinner {
    fn pin_leadership(&self, application: &str, entity: &Tag) -> Result<()>;
    fn unpin_leadership(&self, application: &str, entity: &Tag) -> Result<()>;
}

/// Identity of the authenticated caller.
pub trait Authorizer {
    /// Is the caller a machine agent.
    fn auth_machine_agent(&self) -> bool;
    /// Tag of the caller.
    fn auth_tag(&self) -> Tag;
}

/// Error in the form it's returned to a remote caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    pub message: String,
}

impl From<&Error> for ServerError {
    fn from(value: &Error) -> Self {
        Self {
            message: value.to_string(),
        }
    }
}

/// Outcome of pinning or unpinning of a single application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PinApplicationResult {
    pub application_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ServerError>,
}

/// Bulk outcome of pinning or unpinning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinApplicationsResults {
    pub results: Vec<PinApplicationResult>,
}

/// Leadership pinning API for the authenticated machine agent.
pub struct LeadershipPinningApi<B, P, A> {
    backend: B,
    pinner: P,
    authorizer: A,
}

impl<B, P, A> LeadershipPinningApi<B, P, A>
where
    B: LeadershipPinningBackend,
    P: Pinner,
    A: Authorizer,
{
    pub fn new(backend: B, pinner: P, authorizer: A) -> Self {
        Self {
            backend,
            pinner,
            authorizer,
        }
    }

    /// Pin leadership of applications with units on the caller's machine.
    pub fn pin_machine_applications(&self) -> Result<PinApplicationsResults> {
        if !self.authorizer.auth_machine_agent() {
            return Err(Error::PermissionDenied);
        }
        self.machine_apps_op(|app, tag| self.pinner.pin_leadership(app, tag))
    }

    /// Unpin leadership of applications with units on the caller's machine.
    pub fn unpin_machine_applications(&self) -> Result<PinApplicationsResults> {
        if !self.authorizer.auth_machine_agent() {
            return Err(Error::PermissionDenied);
        }
        self.machine_apps_op(|app, tag| self.pinner.unpin_leadership(app, tag))
    }

    /// Apply `op` to every application on the caller's machine, collecting individual failures.
    /// The caller must be authorized already.
    fn machine_apps_op<F>(&self, op: F) -> Result<PinApplicationsResults>
    where
        F: Fn(&str, &Tag) -> Result<()>,
    {
        let tag = self.authorizer.auth_tag();
        let apps = self.backend.machine(tag.id())?.application_names()?;
        debug!(%tag, ?apps, "applying leadership pinning operation");

        let results = apps
            .iter()
            .map(|app| {
                let error = op(app.as_str(), &tag).err().map(|err| {
                    warn!(
                        %tag, application = %app, error = %err,
                        "leadership pinning operation failed"
                    );
                    ServerError::from(&err)
                });

                PinApplicationResult {
                    application_tag: Tag::application(app.as_str()).to_string(),
                    error,
                }
            })
            .collect();

        Ok(PinApplicationsResults { results })
    }
}
