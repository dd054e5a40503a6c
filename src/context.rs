//! `github` and `runner` context, as exposed to actions through the environment.

use std::path::PathBuf;

use serde::Serialize;

use crate::env::{Environment, EnvReader};
use crate::errors::{Result, ToolkitError};

/// The `github` context (`GITHUB_*` variables plus the event payload).
#[derive(Debug, Clone, Default, Serialize)]
pub struct GithubContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graphql_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_file: Option<PathBuf>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_protected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_owner_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_attempt: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggering_actor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,
    /// Webhook payload read from `event_path`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<serde_json::Value>,
}

impl GithubContext {
    /// Load from `GITHUB_*` variables. The event payload is read when
    /// `GITHUB_EVENT_PATH` names an existing file.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Env`] for malformed numeric/boolean variables
    /// and a JSON error for an unparsable event payload.
    pub fn load<E: Environment + ?Sized>(env: &E) -> Result<Self> {
        let r = EnvReader::new(env, "GITHUB_");
        let event_path = r.get("EVENT_PATH").map(PathBuf::from);
        let event = match &event_path {
            Some(p) if p.is_file() => {
                let raw = std::fs::read_to_string(p)?;
                Some(serde_json::from_str(&raw)?)
            }
            Some(p) => {
                tracing::debug!(path = %p.display(), "event payload not found");
                None
            }
            None => None,
        };

        Ok(Self {
            action: r.get("ACTION"),
            action_path: r.get("ACTION_PATH").map(PathBuf::from),
            action_repository: r.get("ACTION_REPOSITORY"),
            actor: r.get("ACTOR"),
            actor_id: r.parse("ACTOR_ID")?,
            api_url: r.get("API_URL"),
            base_ref: r.get("BASE_REF"),
            env_file: r.get("ENV").map(PathBuf::from),
            event_name: r.get("EVENT_NAME"),
            event_path,
            graphql_url: r.get("GRAPHQL_URL"),
            head_ref: r.get("HEAD_REF"),
            job: r.get("JOB"),
            path_file: r.get("PATH").map(PathBuf::from),
            git_ref: r.get("REF"),
            ref_name: r.get("REF_NAME"),
            ref_protected: r.parse_bool("REF_PROTECTED")?,
            ref_type: r.get("REF_TYPE"),
            repository: r.get("REPOSITORY"),
            repository_id: r.parse("REPOSITORY_ID")?,
            repository_owner: r.get("REPOSITORY_OWNER"),
            repository_owner_id: r.parse("REPOSITORY_OWNER_ID")?,
            retention_days: r.parse("RETENTION_DAYS")?,
            run_id: r.parse("RUN_ID")?,
            run_number: r.parse("RUN_NUMBER")?,
            run_attempt: r.parse("RUN_ATTEMPT")?,
            server_url: r.get("SERVER_URL"),
            sha: r.get("SHA"),
            triggering_actor: r.get("TRIGGERING_ACTOR"),
            workflow: r.get("WORKFLOW"),
            workflow_ref: r.get("WORKFLOW_REF"),
            workflow_sha: r.get("WORKFLOW_SHA"),
            workspace: r.get("WORKSPACE").map(PathBuf::from),
            event,
        })
    }

    /// `(owner, name)` from `GITHUB_REPOSITORY`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Env`] when the repository is unset or not
    /// of the form `owner/name`.
    pub fn repo(&self) -> Result<(String, String)> {
        let full = self.repository.as_deref().ok_or_else(|| ToolkitError::Env {
            key: "GITHUB_REPOSITORY".into(),
            reason: "required but not set".into(),
        })?;
        match full.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok((owner.to_string(), name.to_string()))
            }
            _ => Err(ToolkitError::Env {
                key: "GITHUB_REPOSITORY".into(),
                reason: format!("expected 'owner/name', got '{full}'"),
            }),
        }
    }
}

/// The `runner` context.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunnerContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_cache: Option<PathBuf>,
    pub debug: bool,
}

impl RunnerContext {
    #[must_use]
    pub fn load<E: Environment + ?Sized>(env: &E) -> Self {
        let r = EnvReader::new(env, "RUNNER_");
        Self {
            name: r.get("NAME"),
            os: r.get("OS"),
            arch: r.get("ARCH"),
            temp: r.get("TEMP").map(PathBuf::from),
            tool_cache: r.get("TOOL_CACHE").map(PathBuf::from),
            debug: r.get("DEBUG").as_deref() == Some("1"),
        }
    }
}
