use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Internal identifier of an account owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub Uuid);

impl OwnerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Subscriber,
    Merchant,
    Agent,
    /// An agent with float-assignment privileges and restricted transfer/withdraw rights.
    SuperAgent,
    /// Administrators never hold an account.
    Admin,
}

impl Role {
    /// True for both agents and super-agents.
    pub fn is_agent(&self) -> bool {
        matches!(self, Role::Agent | Role::SuperAgent)
    }

    pub fn holds_account(&self) -> bool {
        !matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Subscriber => "subscriber",
            Role::Merchant => "merchant",
            Role::Agent => "agent",
            Role::SuperAgent => "super_agent",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "subscriber" => Ok(Role::Subscriber),
            "merchant" => Ok(Role::Merchant),
            "agent" => Ok(Role::Agent),
            "super_agent" | "superagent" => Ok(Role::SuperAgent),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role `{other}`")),
        }
    }
}

/// A party to a movement: who they are and in which role they act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Customer {
    pub id: OwnerId,
    pub role: Role,
}

impl Customer {
    pub fn new(id: OwnerId, role: Role) -> Self {
        Self { id, role }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("agent".parse::<Role>(), Ok(Role::Agent));
        assert_eq!("Super-Agent".parse::<Role>(), Ok(Role::SuperAgent));
        assert_eq!(" subscriber ".parse::<Role>(), Ok(Role::Subscriber));
        assert!("teller".parse::<Role>().is_err());
    }

    #[test]
    fn test_super_agent_is_agent() {
        assert!(Role::SuperAgent.is_agent());
        assert!(Role::Agent.is_agent());
        assert!(!Role::Merchant.is_agent());
        assert!(!Role::Admin.holds_account());
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::SuperAgent).unwrap();
        assert_eq!(json, "\"super_agent\"");
    }
}
