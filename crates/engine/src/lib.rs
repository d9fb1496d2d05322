//! Ledger engine of the expense tracker.
//!
//! The [`Engine`] keeps each wallet's `amount`, `totalIncome` and
//! `totalExpenses` consistent with the transactions that reference it, on
//! top of any [`DocumentStore`].

pub use error::{ErrorKind, LedgerError};
pub use money::Money;
pub use ops::{Engine, EngineBuilder};
pub use store::{Collection, Document, DocumentStore, Fields, SqliteStore};
pub use transactions::{Receipt, Transaction, TransactionKind, TransactionRequest};
pub use upload::{DirectoryUploader, DisabledUploader, ReceiptUploader};
pub use wallets::{Wallet, WalletDelta, WalletPatch};

mod error;
mod money;
mod ops;
mod store;
mod transactions;
mod upload;
mod wallets;

type ResultLedger<T> = Result<T, LedgerError>;
