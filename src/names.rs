use crate::Error;
use std::{fmt, str::FromStr};

const USER_TAG_PREFIX: &str = "user-";
const MACHINE_TAG_PREFIX: &str = "machine-";
const APPLICATION_TAG_PREFIX: &str = "application-";

/// Name of the administrative user used for connections derived from the provider configuration.
pub const ADMIN_USER: &str = "admin";

/// Entity tag in the `<kind>-<id>` string form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tag {
    User(String),
    Machine(String),
    Application(String),
}

impl Tag {
    pub fn user(name: impl Into<String>) -> Self {
        Tag::User(name.into())
    }

    pub fn machine(id: impl Into<String>) -> Self {
        Tag::Machine(id.into())
    }

    pub fn application(name: impl Into<String>) -> Self {
        Tag::Application(name.into())
    }

    /// Id part of the tag, without the kind prefix.
    pub fn id(&self) -> &str {
        match self {
            Tag::User(id) | Tag::Machine(id) | Tag::Application(id) => id,
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            Tag::User(_) => USER_TAG_PREFIX,
            Tag::Machine(_) => MACHINE_TAG_PREFIX,
            Tag::Application(_) => APPLICATION_TAG_PREFIX,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix(), self.id())
    }
}

impl FromStr for Tag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = if let Some(id) = s.strip_prefix(USER_TAG_PREFIX) {
            Tag::User(id.to_string())
        } else if let Some(id) = s.strip_prefix(MACHINE_TAG_PREFIX) {
            Tag::Machine(id.to_string())
        } else if let Some(id) = s.strip_prefix(APPLICATION_TAG_PREFIX) {
            Tag::Application(id.to_string())
        } else {
            return Err(Error::InvalidTag(s.to_string()));
        };

        if tag.id().is_empty() {
            Err(Error::InvalidTag(s.to_string()))
        } else {
            Ok(tag)
        }
    }
}
