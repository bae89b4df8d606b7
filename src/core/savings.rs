use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::core::error::{LedgerError, LedgerResult};
use crate::core::transaction::Amount;

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: String,
    pub name: String,
    pub target: Amount,
    pub saved: Amount,
    #[serde(default)]
    pub deadline: Option<NaiveDate>
}

impl SavingsGoal {
    /// Fraction of the target saved so far, clamped to `[0, 1]`.
    pub fn progress(&self) -> Decimal {
        if self.target <= Decimal::ZERO {
            return Decimal::ONE;
        }
        self.saved.checked_div(self.target)
            .unwrap_or(Decimal::ONE)
            .clamp(Decimal::ZERO, Decimal::ONE)
    }

    pub fn remaining(&self) -> Amount {
        (self.target - self.saved).max(Decimal::ZERO)
    }
}

/// Savings goals, persisted separately from the account ledger.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct SavingsBook {
    pub goals: Vec<SavingsGoal>
}

impl SavingsBook {
    pub fn goal(&self, id: &str) -> Option<&SavingsGoal> {
        self.goals.iter().find(|goal| goal.id == id)
    }

    pub fn add_goal(&mut self, name: &str, target: Amount, deadline: Option<NaiveDate>) -> LedgerResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidName);
        }
        if target <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(target.to_string()));
        }
        let id = format!("goal-{}", &Uuid::new_v4().simple().to_string()[..8]);
        self.goals.push(SavingsGoal {
            id: id.clone(),
            name: name.to_owned(),
            target,
            saved: Decimal::ZERO,
            deadline
        });
        return Ok(id);
    }

    pub fn contribute(&mut self, id: &str, amount: Amount) -> LedgerResult<Amount> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount.to_string()));
        }
        let goal = self.goals.iter_mut()
            .find(|goal| goal.id == id)
            .ok_or_else(|| LedgerError::UnknownGoal(id.to_owned()))?;
        goal.saved = goal.saved.checked_add(amount).ok_or(LedgerError::AmountOverflow)?;
        return Ok(goal.saved);
    }
}
