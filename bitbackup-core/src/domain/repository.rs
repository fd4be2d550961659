//! Repository domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

const REDACTED_FALLBACK: &str = "<redacted>";

/// A repository as returned by the provider listing
///
/// The runner treats this as an opaque handle: it only needs a stable
/// identifier (`full_name`) and the clone links, which the provider client
/// resolves into a [`CloneEndpoint`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    /// Owner-qualified name, e.g. `team/project`
    pub full_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub links: RepositoryLinks,
}

impl RepositoryDescriptor {
    /// Creates a descriptor with a single HTTPS clone link
    pub fn new(full_name: impl Into<String>, https_clone_href: impl Into<String>) -> Self {
        let full_name = full_name.into();
        let name = full_name
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();

        Self {
            full_name,
            name,
            links: RepositoryLinks {
                clone: vec![CloneLink {
                    name: "https".to_string(),
                    href: https_clone_href.into(),
                }],
            },
        }
    }

    /// Stable identifier used in logs and object keys
    pub fn identifier(&self) -> &str {
        &self.full_name
    }

    /// Finds the clone link with the given protocol name (`https`, `ssh`)
    pub fn clone_link(&self, protocol: &str) -> Option<&CloneLink> {
        self.links.clone.iter().find(|link| link.name == protocol)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryLinks {
    #[serde(default)]
    pub clone: Vec<CloneLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneLink {
    pub name: String,
    pub href: String,
}

/// A clone URL that may carry embedded credentials
///
/// `Display` and `Debug` mask the password so the endpoint can be logged;
/// use [`CloneEndpoint::expose`] only when handing the URL to git.
#[derive(Clone, PartialEq, Eq)]
pub struct CloneEndpoint {
    url: String,
}

impl CloneEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Returns the raw URL, credentials included
    pub fn expose(&self) -> &str {
        &self.url
    }

    /// Last path segment of the URL, e.g. `project.git`
    pub fn basename(&self) -> &str {
        self.url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    /// The URL with any password in the user-info replaced by `***`
    ///
    /// Anything that does not parse as a URL (e.g. a local path) is returned
    /// unchanged.
    pub fn redacted(&self) -> String {
        match Url::parse(&self.url) {
            Ok(mut url) if url.password().is_some() => match url.set_password(Some("***")) {
                Ok(()) => url.to_string(),
                Err(()) => REDACTED_FALLBACK.to_string(),
            },
            _ => self.url.clone(),
        }
    }
}

impl fmt::Display for CloneEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for CloneEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CloneEndpoint").field(&self.redacted()).finish()
    }
}
