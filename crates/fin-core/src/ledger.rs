//! Editable fixed-expense ledger owned by the caller.
//!
//! Items keep their insertion order for display; only the total reaches the
//! engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One named monthly fixed expense, e.g. rent or payroll.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpenseLineItem {
    pub name: String,
    pub monthly_amount: Decimal,
}

/// Errors produced when editing a ledger.
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("expense name must not be empty")]
    EmptyName,
    #[error("expense `{0}` already exists")]
    Duplicate(String),
    #[error("expense `{0}` not found")]
    NotFound(String),
    #[error("negative amount for expense `{name}`: {amount}")]
    NegativeAmount { name: String, amount: Decimal },
}

/// Ordered collection of uniquely named expense items.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<ExpenseLineItem>",
    into = "Vec<ExpenseLineItem>"
)]
pub struct ExpenseLedger {
    items: Vec<ExpenseLineItem>,
}

fn normalize(name: &str) -> Result<String, LedgerError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::EmptyName);
    }
    Ok(name.to_string())
}

fn check_amount(name: &str, amount: Decimal) -> Result<(), LedgerError> {
    if amount < Decimal::ZERO {
        return Err(LedgerError::NegativeAmount {
            name: name.to_string(),
            amount,
        });
    }
    Ok(())
}

impl ExpenseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from `(name, amount)` pairs, rejecting duplicates.
    pub fn from_items<I, S>(items: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: AsRef<str>,
    {
        let mut ledger = Self::new();
        for (name, amount) in items {
            ledger.add(name.as_ref(), amount)?;
        }
        Ok(ledger)
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.items.iter().position(|i| i.name == name)
    }

    /// Append a new item.
    pub fn add(&mut self, name: &str, amount: Decimal) -> Result<(), LedgerError> {
        let name = normalize(name)?;
        check_amount(&name, amount)?;
        if self.position(&name).is_some() {
            return Err(LedgerError::Duplicate(name));
        }
        self.items.push(ExpenseLineItem {
            name,
            monthly_amount: amount,
        });
        Ok(())
    }

    /// Change the amount of an existing item, keeping its position.
    pub fn update(&mut self, name: &str, amount: Decimal) -> Result<(), LedgerError> {
        let name = normalize(name)?;
        check_amount(&name, amount)?;
        let idx = self
            .position(&name)
            .ok_or_else(|| LedgerError::NotFound(name.clone()))?;
        self.items[idx].monthly_amount = amount;
        Ok(())
    }

    /// Update when present, append otherwise.
    pub fn upsert(&mut self, name: &str, amount: Decimal) -> Result<(), LedgerError> {
        if self.position(name).is_some() {
            self.update(name, amount)
        } else {
            self.add(name, amount)
        }
    }

    /// Remove an item and return it.
    pub fn remove(&mut self, name: &str) -> Result<ExpenseLineItem, LedgerError> {
        let idx = self
            .position(name)
            .ok_or_else(|| LedgerError::NotFound(name.trim().to_string()))?;
        Ok(self.items.remove(idx))
    }

    pub fn get(&self, name: &str) -> Option<Decimal> {
        self.position(name).map(|i| self.items[i].monthly_amount)
    }

    pub fn items(&self) -> &[ExpenseLineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all monthly amounts; the only figure the engine consumes.
    pub fn total(&self) -> Decimal {
        self.items.iter().map(|i| i.monthly_amount).sum()
    }
}

impl TryFrom<Vec<ExpenseLineItem>> for ExpenseLedger {
    type Error = LedgerError;

    fn try_from(items: Vec<ExpenseLineItem>) -> Result<Self, Self::Error> {
        let mut ledger = Self::new();
        for item in items {
            ledger.add(&item.name, item.monthly_amount)?;
        }
        Ok(ledger)
    }
}

impl From<ExpenseLedger> for Vec<ExpenseLineItem> {
    fn from(ledger: ExpenseLedger) -> Self {
        ledger.items
    }
}
