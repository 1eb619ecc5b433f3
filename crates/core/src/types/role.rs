//! Customer roles and the ordering between them.

use serde::{Deserialize, Serialize};

/// Access level of a customer account.
///
/// Roles are strictly ordered: every agent can do what a subscriber can,
/// every admin can do what an agent can. Authorization checks compare
/// against the minimum role an action requires via [`Role::allows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "customer_role", rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular customer: catalogue, cart, checkout, own profile.
    #[default]
    Subscriber,
    /// Back-office staff: catalogue and order management.
    Agent,
    /// Full access, including user management and deletions.
    Admin,
}

impl Role {
    /// Whether this role satisfies the given minimum requirement.
    #[must_use]
    pub fn allows(self, required: Self) -> bool {
        self >= required
    }

    /// Human-readable label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Subscriber => "Subscriber",
            Self::Agent => "Agent",
            Self::Admin => "Administrator",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subscriber => write!(f, "subscriber"),
            Self::Agent => write!(f, "agent"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscriber" => Ok(Self::Subscriber),
            "agent" => Ok(Self::Agent),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Admin.allows(Role::Agent));
        assert!(Role::Admin.allows(Role::Subscriber));
        assert!(Role::Agent.allows(Role::Agent));
        assert!(!Role::Agent.allows(Role::Admin));
        assert!(!Role::Subscriber.allows(Role::Agent));
    }

    #[test]
    fn test_role_parse_roundtrip() {
        for role in [Role::Subscriber, Role::Agent, Role::Admin] {
            let parsed: Role = role.to_string().parse().expect("parse");
            assert_eq!(parsed, role);
        }
        assert!("manager".parse::<Role>().is_err());
    }
}
