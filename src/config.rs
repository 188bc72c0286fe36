//! Member roster configuration.
//!
//! The roster lists who may submit and, optionally, the name each member is
//! shown under on leaderboards:
//!
//! ```toml
//! [[members]]
//! username = "warpedrufus"
//! display_name = "Rufus"
//!
//! [[members]]
//! username = "mark"
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::TrackerError;
use crate::names::DisplayNames;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Config {
    /// Reads the roster file, or returns an empty roster when none is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            info!("no roster configured, names shown as usernames");
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read roster {}", path.display()))?;
        let config = Self::from_toml_str(&raw)
            .with_context(|| format!("failed to parse roster {}", path.display()))?;
        info!(members = config.members.len(), "roster loaded");
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn display_names(&self) -> DisplayNames {
        self.members
            .iter()
            .filter_map(|member| {
                member
                    .display_name
                    .clone()
                    .map(|name| (member.username.clone(), name))
            })
            .collect()
    }

    pub fn roster(&self) -> Roster {
        Roster::new(self.members.iter().map(|member| member.username.clone()))
    }
}

/// Usernames allowed to submit. An empty roster admits everyone.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    usernames: HashSet<String>,
}

impl Roster {
    pub fn new(usernames: impl IntoIterator<Item = String>) -> Self {
        Self {
            usernames: usernames.into_iter().collect(),
        }
    }

    pub fn check(&self, subject: &str) -> Result<(), TrackerError> {
        if self.usernames.is_empty() {
            warn!(subject, "roster is empty, accepting submission");
            return Ok(());
        }
        if self.usernames.contains(subject) {
            Ok(())
        } else {
            Err(TrackerError::UnknownSubject(subject.to_string()))
        }
    }
}
