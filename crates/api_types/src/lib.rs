use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Body of every successful response.
#[derive(Debug, Serialize, Deserialize)]
pub struct Success<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Success<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Body of every declined request.
///
/// `kind` is one of `validation`, `not_found`, `insufficient_balance`,
/// `conflict` or `upstream`; `message` is meant to be shown to the user as is.
#[derive(Debug, Serialize, Deserialize)]
pub struct Failure {
    pub success: bool,
    pub kind: String,
    pub message: String,
}

/// Attachment sent inline with a request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    /// Standard base64 of the file content.
    pub data_base64: String,
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Income,
        Expense,
    }

    /// Create (no `id`) or edit (with `id`) a transaction.
    ///
    /// Fields are optional so that validation messages come from the engine.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpsert {
        pub id: Option<String>,
        #[serde(rename = "type")]
        pub kind: Option<TransactionKind>,
        pub wallet_id: Option<String>,
        /// Amount in minor units (cents).
        pub amount_minor: Option<i64>,
        pub receipt: Option<Attachment>,
        pub uid: Option<String>,
        pub category: Option<String>,
        pub description: Option<String>,
        pub date: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: String,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub amount_minor: i64,
        pub wallet_id: String,
        pub image: Option<String>,
        pub uid: Option<String>,
        pub category: Option<String>,
        pub description: Option<String>,
        pub date: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        pub limit: Option<usize>,
    }
}

pub mod wallet {
    use super::*;

    /// Create (no `id`) or update (with `id`) a wallet.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct WalletUpsert {
        pub id: Option<String>,
        pub name: Option<String>,
        pub uid: Option<String>,
        pub image: Option<String>,
        pub icon: Option<Attachment>,
        /// Starting balance in minor units; only used on creation.
        pub opening_amount_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletView {
        pub id: String,
        pub name: String,
        pub uid: String,
        pub image: Option<String>,
        pub amount_minor: i64,
        pub total_income_minor: i64,
        pub total_expenses_minor: i64,
        pub created: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletList {
        pub wallets: Vec<WalletView>,
        pub total_balance_minor: i64,
    }
}
