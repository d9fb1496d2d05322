//! The module contains `Wallet` struct and its balance arithmetic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    LedgerError, Money, ResultLedger, TransactionKind,
    store::{Document, Fields},
};

/// A wallet.
///
/// A wallet is a representation of a real wallet, a bank account or anything
/// else where money are kept. Its balance fields are only ever changed by
/// reconciling transactions against it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    /// Document key assigned by the store.
    #[serde(skip)]
    pub id: String,
    /// Store revision this snapshot was read at.
    #[serde(skip)]
    pub revision: i64,
    #[serde(default)]
    pub name: String,
    /// Owner of the wallet.
    #[serde(default)]
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub amount: Money,
    #[serde(default)]
    pub total_income: Money,
    #[serde(default)]
    pub total_expenses: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

impl Wallet {
    /// Returns a copy of the wallet with `delta` applied to its balance fields.
    pub fn with_delta(&self, delta: WalletDelta) -> ResultLedger<Wallet> {
        let overflow = || LedgerError::Validation(format!("wallet \"{}\" balance overflow", self.id));

        Ok(Wallet {
            amount: self.amount.checked_add(delta.amount).ok_or_else(overflow)?,
            total_income: self
                .total_income
                .checked_add(delta.total_income)
                .ok_or_else(overflow)?,
            total_expenses: self
                .total_expenses
                .checked_add(delta.total_expenses)
                .ok_or_else(overflow)?,
            ..self.clone()
        })
    }

    /// The three balance fields, ready to be written back to the store.
    pub(crate) fn balance_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("amount".to_string(), Value::from(self.amount.cents()));
        fields.insert(
            "totalIncome".to_string(),
            Value::from(self.total_income.cents()),
        );
        fields.insert(
            "totalExpenses".to_string(),
            Value::from(self.total_expenses.cents()),
        );
        fields
    }
}

impl TryFrom<Document> for Wallet {
    type Error = LedgerError;

    fn try_from(document: Document) -> Result<Self, Self::Error> {
        let mut wallet: Wallet = serde_json::from_value(Value::Object(document.fields))?;
        wallet.id = document.key;
        wallet.revision = document.revision;
        Ok(wallet)
    }
}

/// Signed change to a wallet's balance fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalletDelta {
    pub amount: Money,
    pub total_income: Money,
    pub total_expenses: Money,
}

impl WalletDelta {
    /// The effect of a transaction of `kind` and `amount` on its wallet.
    ///
    /// - income: `+amount` to the balance and to `totalIncome`
    /// - expense: `-amount` to the balance, `+amount` to `totalExpenses`
    pub fn for_transaction(kind: TransactionKind, amount: Money) -> Self {
        match kind {
            TransactionKind::Income => Self {
                amount,
                total_income: amount,
                total_expenses: Money::ZERO,
            },
            TransactionKind::Expense => Self {
                amount: -amount,
                total_income: Money::ZERO,
                total_expenses: amount,
            },
        }
    }

    /// The delta that undoes `self`.
    pub fn inverse(self) -> Self {
        Self {
            amount: -self.amount,
            total_income: -self.total_income,
            total_expenses: -self.total_expenses,
        }
    }
}

/// Partial wallet used to create or update a wallet.
///
/// Without `id` a new wallet is created and `name` plus `uid` are required.
/// With `id` only the supplied descriptive fields are overwritten.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WalletPatch {
    pub id: Option<String>,
    pub name: Option<String>,
    pub uid: Option<String>,
    pub image: Option<String>,
    /// Starting balance of a new wallet. Ignored on update.
    pub opening_amount: Option<Money>,
}
