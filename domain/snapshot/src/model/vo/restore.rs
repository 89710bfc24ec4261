use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Which restore stages to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RestoreMode {
    /// Identity, roles and channels.
    #[default]
    Full,
    RolesOnly,
    ChannelsOnly,
    /// Identity only.
    Basic,
}

impl RestoreMode {
    pub fn runs_identity(&self) -> bool {
        matches!(self, RestoreMode::Full | RestoreMode::Basic)
    }

    pub fn runs_roles(&self) -> bool {
        matches!(self, RestoreMode::Full | RestoreMode::RolesOnly)
    }

    pub fn runs_channels(&self) -> bool {
        matches!(self, RestoreMode::Full | RestoreMode::ChannelsOnly)
    }
}

impl fmt::Display for RestoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RestoreMode::Full => "full",
            RestoreMode::RolesOnly => "rolesOnly",
            RestoreMode::ChannelsOnly => "channelsOnly",
            RestoreMode::Basic => "basic",
        };
        f.write_str(name)
    }
}

impl FromStr for RestoreMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "full" => Ok(RestoreMode::Full),
            "rolesonly" => Ok(RestoreMode::RolesOnly),
            "channelsonly" => Ok(RestoreMode::ChannelsOnly),
            "basic" => Ok(RestoreMode::Basic),
            _ => Err(format!(
                "unknown restore mode `{s}`, expected one of: full, rolesOnly, channelsOnly, basic"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestoreStage {
    Identity,
    Roles,
    Channels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityOperation {
    SetIdentity,
    FetchRoles,
    DeleteRole,
    CreateRole,
    FetchMembers,
    GrantRoles,
    FetchChannels,
    DeleteChannel,
    CreateCategory,
    CreateChannel,
}

/// One remote operation attempted during a restore stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityAttempt {
    pub operation: EntityOperation,
    /// Name or id of the entity the operation was about.
    pub target: String,
    /// `None` when the operation succeeded.
    pub error: Option<String>,
}

impl EntityAttempt {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything a stage tried, in order. Failed attempts don't stop the stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: RestoreStage,
    pub attempts: Vec<EntityAttempt>,
}

impl StageReport {
    pub fn new(stage: RestoreStage) -> Self {
        Self {
            stage,
            attempts: Vec::new(),
        }
    }

    pub fn record<T, E: fmt::Display>(
        &mut self,
        operation: EntityOperation,
        target: impl Into<String>,
        result: &Result<T, E>,
    ) {
        self.attempts.push(EntityAttempt {
            operation,
            target: target.into(),
            error: result.as_ref().err().map(|e| format!("{e:#}")),
        });
    }

    pub fn failures(&self) -> impl Iterator<Item = &EntityAttempt> {
        self.attempts.iter().filter(|el| !el.is_success())
    }

    pub fn succeeded(&self, operation: EntityOperation) -> usize {
        self.attempts
            .iter()
            .filter(|el| el.operation == operation && el.is_success())
            .count()
    }
}

/// Result of a restore that passed pre-flight.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RestoreOutcome {
    /// Tags (or ids) of captured members not present in the destination.
    pub missing_members: Vec<String>,
    pub stages: Vec<StageReport>,
}

impl RestoreOutcome {
    pub fn stage(&self, stage: RestoreStage) -> Option<&StageReport> {
        self.stages.iter().find(|el| el.stage == stage)
    }

    pub fn failed_attempts(&self) -> usize {
        self.stages.iter().map(|el| el.failures().count()).sum()
    }
}
