//! Transaction primitives.
//!
//! A `Transaction` is a single income or expense event that references
//! exactly one wallet at a time.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    LedgerError, Money, ResultLedger,
    store::{Document, Fields},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

/// A stored transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Document key assigned by the store.
    #[serde(skip)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Money,
    pub wallet_id: String,
    /// Reference to the uploaded receipt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl TryFrom<Document> for Transaction {
    type Error = LedgerError;

    fn try_from(document: Document) -> Result<Self, Self::Error> {
        let mut transaction: Transaction =
            serde_json::from_value(Value::Object(document.fields))?;
        transaction.id = document.key;
        Ok(transaction)
    }
}

/// Receipt attachment submitted along with a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl Receipt {
    /// Builds a receipt from a base64 encoded payload.
    pub fn from_base64(file_name: &str, encoded: &str) -> ResultLedger<Self> {
        let data = STANDARD
            .decode(encoded.trim())
            .map_err(|err| LedgerError::Validation(format!("invalid receipt payload: {err}")))?;
        Ok(Self {
            file_name: file_name.to_string(),
            data,
        })
    }
}

/// A create-or-edit request for a transaction.
///
/// Every field is optional on the wire; [`TransactionRequest::validate`]
/// enforces the ones reconciliation needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Key of the transaction to edit. `None` creates a new one.
    pub id: Option<String>,
    pub kind: Option<TransactionKind>,
    pub wallet_id: Option<String>,
    pub amount: Option<Money>,
    pub receipt: Option<Receipt>,
    pub uid: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// A request that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ValidRequest {
    pub id: Option<String>,
    pub kind: TransactionKind,
    pub wallet_id: String,
    pub amount: Money,
    pub receipt: Option<Receipt>,
    pub uid: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl TransactionRequest {
    pub(crate) fn validate(self) -> ResultLedger<ValidRequest> {
        let invalid = || LedgerError::Validation("Invalid transaction data!".to_string());

        let amount = self.amount.filter(|a| a.is_positive()).ok_or_else(invalid)?;
        let wallet_id = self
            .wallet_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(invalid)?;
        let kind = self.kind.ok_or_else(invalid)?;
        let id = self
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        Ok(ValidRequest {
            id,
            kind,
            wallet_id,
            amount,
            receipt: self.receipt,
            uid: self.uid,
            category: self.category,
            description: self.description,
            date: self.date,
        })
    }
}

impl ValidRequest {
    /// `true` when `previous` already has this request's wallet effect.
    pub fn same_financials(&self, previous: &Transaction) -> bool {
        previous.kind == self.kind
            && previous.amount == self.amount
            && previous.wallet_id == self.wallet_id
    }

    /// Fields to merge into the stored record. Absent optional fields are
    /// left out so they do not clobber stored values.
    pub fn record_fields(&self, image: Option<String>) -> Fields {
        let mut fields = Fields::new();
        fields.insert("type".to_string(), Value::from(self.kind.as_str()));
        fields.insert("amount".to_string(), Value::from(self.amount.cents()));
        fields.insert("walletId".to_string(), Value::from(self.wallet_id.as_str()));

        let optional = [
            ("image", image),
            ("uid", self.uid.clone()),
            ("category", self.category.clone()),
            ("description", self.description.clone()),
            ("date", self.date.map(|date| date.to_rfc3339())),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                fields.insert(name.to_string(), Value::from(value));
            }
        }
        fields
    }
}
