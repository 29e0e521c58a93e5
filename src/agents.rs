//! The agent catalog.
//!
//! Agents are created and listed through the backend; a chat is always held
//! with one agent. These calls refresh the session once on a 401.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::{read_envelope, Client};
use crate::config::AgentId;
use crate::protocol::{AgentLookup, AgentPage};
use crate::{Error, Result};

/// An agent as returned by the backend.
///
/// Fields the client does not model are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub agent_uuid: AgentId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of the create-agent request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAgent {
    pub name: String,
    pub description: String,
}

impl NewAgent {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

impl Client {
    /// List agents, one page at a time.
    ///
    /// A page with no agents comes back as an empty vector.
    pub async fn list_agents(&self, page: u64, page_size: u64) -> Result<Vec<Agent>> {
        if page_size == 0 {
            return Err(Error::InvalidInput("page size must be non-zero".into()));
        }
        let body = AgentPage { page, page_size };
        let path = self.config().endpoints().list_agents.clone();

        let response = self
            .send_authorized(&path, |http, url| http.post(url).json(&body))
            .await?;
        let envelope = read_envelope::<Vec<Agent>>(response).await?;
        let agents = envelope.data.unwrap_or_default();

        tracing::debug!(page, page_size, count = agents.len(), "listed agents");
        Ok(agents)
    }

    /// Fetch one agent.
    pub async fn get_agent(&self, id: &AgentId) -> Result<Agent> {
        if id.is_blank() {
            return Err(Error::InvalidInput("agent id must not be empty".into()));
        }
        let body = AgentLookup {
            agent_uuid: id.clone(),
        };
        let path = self.config().endpoints().get_agent.clone();

        let response = self
            .send_authorized(&path, |http, url| http.post(url).json(&body))
            .await?;
        read_envelope::<Agent>(response)
            .await?
            .data
            .ok_or_else(|| Error::UnexpectedResponse(format!("no data for agent {id}")))
    }

    /// Create an agent.
    ///
    /// Returns the server's confirmation message, if it sent one.
    pub async fn create_agent(&self, agent: &NewAgent) -> Result<Option<String>> {
        if agent.name.trim().is_empty() {
            return Err(Error::InvalidInput("agent name must not be empty".into()));
        }
        let path = self.config().endpoints().create_agent.clone();

        let response = self
            .send_authorized(&path, |http, url| http.post(url).json(agent))
            .await?;
        let envelope = read_envelope::<serde_json::Value>(response).await?;

        tracing::debug!(name = %agent.name, "created agent");
        Ok(envelope.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_decodes_backend_shape() {
        let json = r#"{
            "agent_uuid": "7d1e",
            "name": "Support",
            "description": "Answers tickets",
            "agent_config_uuid": {},
            "auth_uuid": "u-1",
            "created_at": "2025-10-24T09:30:00Z",
            "updated_at": "2025-10-24T10:00:00Z",
            "deleted_at": "0001-01-01T00:00:00Z"
        }"#;
        let agent: Agent = serde_json::from_str(json).unwrap();
        assert_eq!(agent.agent_uuid, AgentId::new("7d1e"));
        assert_eq!(agent.name, "Support");
        assert_eq!(agent.auth_uuid.as_deref(), Some("u-1"));
        assert_eq!(
            agent.created_at.unwrap().to_rfc3339(),
            "2025-10-24T09:30:00+00:00"
        );
    }

    #[test]
    fn agent_tolerates_missing_fields() {
        let agent: Agent = serde_json::from_str(r#"{"agent_uuid": "x"}"#).unwrap();
        assert!(agent.name.is_empty());
        assert!(agent.created_at.is_none());
    }

    #[test]
    fn new_agent_wire_shape() {
        let agent = NewAgent::new("Helper", "Helps");
        assert_eq!(
            serde_json::to_value(&agent).unwrap(),
            serde_json::json!({"name": "Helper", "description": "Helps"})
        );
    }
}
