use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Login,
    Logout,
    Create,
    Update,
    Delete,
    View,
    Export,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Login => "login",
            ActionType::Logout => "logout",
            ActionType::Create => "create",
            ActionType::Update => "update",
            ActionType::Delete => "delete",
            ActionType::View => "view",
            ActionType::Export => "export",
        }
    }
}

impl std::str::FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(ActionType::Login),
            "logout" => Ok(ActionType::Logout),
            "create" => Ok(ActionType::Create),
            "update" => Ok(ActionType::Update),
            "delete" => Ok(ActionType::Delete),
            "view" => Ok(ActionType::View),
            "export" => Ok(ActionType::Export),
            other => Err(format!("unknown action type: {}", other)),
        }
    }
}

/// A new audit-trail entry. The log is append-only: entries are never
/// updated or deleted by the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewActivityLog {
    pub username: String,
    pub action_type: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl NewActivityLog {
    pub fn new(username: impl Into<String>, action_type: ActionType) -> Self {
        Self {
            username: username.into(),
            action_type,
            resource_type: None,
            resource_id: None,
            description: None,
            ip_address: None,
            user_agent: None,
            metadata: None,
        }
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn ip_address(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }

    pub fn user_agent(mut self, ua: Option<String>) -> Self {
        self.user_agent = ua;
        self
    }
}
