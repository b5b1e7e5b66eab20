//! Token bank boundary
//!
//! Asset custody lives outside the engine; the engine only needs
//! approve-then-transfer semantics for locking stake and paying out rewards
//! and funding. [`MemoryBank`] is the in-memory implementation for tests and
//! single-process hosts; balances never go negative.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::Address;

/// Asset-transfer capability consumed by the engine.
pub trait TokenBank {
    fn balance_of(&self, owner: &str) -> u64;

    fn allowance(&self, owner: &str, spender: &str) -> u64;

    fn approve(&mut self, owner: &str, spender: &str, amount: u64);

    /// Pull previously approved tokens from `owner` into `spender`'s balance.
    fn transfer_from(&mut self, owner: &str, spender: &str, amount: u64) -> Result<()>;

    /// Move tokens between balances.
    fn transfer(&mut self, from: &str, to: &str, amount: u64) -> Result<()>;
}

/// In-memory token bank.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryBank {
    balances: HashMap<Address, u64>,
    /// owner -> spender -> remaining approval.
    allowances: HashMap<Address, HashMap<Address, u64>>,
}

impl MemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `owner` out of thin air. Host-side faucet; the engine itself
    /// never mints.
    pub fn mint(&mut self, owner: &str, amount: u64) {
        *self.balances.entry(owner.to_string()).or_default() += amount;
    }
}

impl TokenBank for MemoryBank {
    fn balance_of(&self, owner: &str) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &str, spender: &str) -> u64 {
        self.allowances
            .get(owner)
            .and_then(|per_spender| per_spender.get(spender))
            .copied()
            .unwrap_or(0)
    }

    fn approve(&mut self, owner: &str, spender: &str, amount: u64) {
        self.allowances
            .entry(owner.to_string())
            .or_default()
            .insert(spender.to_string(), amount);
    }

    fn transfer_from(&mut self, owner: &str, spender: &str, amount: u64) -> Result<()> {
        let approved = self.allowance(owner, spender);
        if approved < amount {
            return Err(CoreError::InsufficientAllowance {
                requested: amount,
                approved,
            });
        }
        self.transfer(owner, spender, amount)?;
        self.allowances
            .entry(owner.to_string())
            .or_default()
            .insert(spender.to_string(), approved - amount);
        Ok(())
    }

    fn transfer(&mut self, from: &str, to: &str, amount: u64) -> Result<()> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(CoreError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        *self.balances.entry(from.to_string()).or_default() -= amount;
        *self.balances.entry(to.to_string()).or_default() += amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer() {
        let mut bank = MemoryBank::new();
        bank.mint("alice", 100);

        bank.transfer("alice", "bob", 40).unwrap();
        assert_eq!(bank.balance_of("alice"), 60);
        assert_eq!(bank.balance_of("bob"), 40);

        let err = bank.transfer("alice", "bob", 61).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientBalance {
                requested: 61,
                available: 60,
            }
        );
    }

    #[test]
    fn test_approve_then_transfer_from() {
        let mut bank = MemoryBank::new();
        bank.mint("alice", 100);
        bank.approve("alice", "dao", 70);

        bank.transfer_from("alice", "dao", 50).unwrap();
        assert_eq!(bank.balance_of("dao"), 50);
        assert_eq!(bank.allowance("alice", "dao"), 20);

        let err = bank.transfer_from("alice", "dao", 30).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientAllowance {
                requested: 30,
                approved: 20,
            }
        );
    }
}
