//! Role-based capability checks
//!
//! Every state-mutating entry point that needs a privileged caller goes
//! through [`require_role`], consulting whatever [`RoleRegistry`] the host
//! wired in. [`RoleTable`] is the in-memory registry used by tests and
//! single-process hosts.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// May start quarters, run the global accrual and create special proposals.
    Founder,
    /// Compliance officer gating milestone fund releases.
    Prl,
    /// Administers identity checks for participants.
    KycAdmin,
    /// May migrate the treasury to a successor.
    Root,
}

/// Identity registry boundary. Answers role membership, nothing more.
pub trait RoleRegistry {
    fn has_role(&self, addr: &str, role: Role) -> bool;
}

/// Fail with `Unauthorized` unless `caller` holds `role`.
pub fn require_role(registry: &dyn RoleRegistry, caller: &str, role: Role) -> Result<()> {
    if registry.has_role(caller, role) {
        Ok(())
    } else {
        Err(CoreError::Unauthorized {
            caller: caller.to_string(),
            role,
        })
    }
}

/// In-memory role registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleTable {
    grants: HashMap<Address, HashSet<Role>>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, addr: &str, role: Role) {
        self.grants.entry(addr.to_string()).or_default().insert(role);
    }

    pub fn revoke(&mut self, addr: &str, role: Role) {
        if let Some(roles) = self.grants.get_mut(addr) {
            roles.remove(&role);
        }
    }
}

impl RoleRegistry for RoleTable {
    fn has_role(&self, addr: &str, role: Role) -> bool {
        self.grants.get(addr).is_some_and(|roles| roles.contains(&role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_and_revoke() {
        let mut table = RoleTable::new();
        table.grant("alice", Role::Founder);

        assert!(table.has_role("alice", Role::Founder));
        assert!(!table.has_role("alice", Role::Root));
        assert!(!table.has_role("bob", Role::Founder));

        table.revoke("alice", Role::Founder);
        assert!(!table.has_role("alice", Role::Founder));
    }

    #[test]
    fn test_require_role() {
        let mut table = RoleTable::new();
        table.grant("prl", Role::Prl);

        assert!(require_role(&table, "prl", Role::Prl).is_ok());
        assert_eq!(
            require_role(&table, "mallory", Role::Prl),
            Err(CoreError::Unauthorized {
                caller: "mallory".to_string(),
                role: Role::Prl,
            })
        );
    }
}
