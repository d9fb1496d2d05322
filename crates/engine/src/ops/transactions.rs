use crate::{
    Collection, ErrorKind, LedgerError, ResultLedger, Transaction, TransactionRequest,
    transactions::ValidRequest,
};

use super::{Engine, balances::Journal};

mod create;
mod update;

const RECEIPTS_FOLDER: &str = "transactions";

impl Engine {
    /// Creates or edits a transaction and reconciles the wallets it touches.
    ///
    /// - Without `id`, the target wallet receives the transaction's effect.
    /// - With `id`, the previous effect is reverted and the new one applied,
    ///   unless type, amount and wallet are all unchanged.
    ///
    /// Balance checks run before any write. Should a later step fail (a
    /// second wallet write, the receipt upload or the record write), the
    /// wallet changes already committed are reverted before the error is
    /// returned.
    pub async fn reconcile(&self, request: TransactionRequest) -> ResultLedger<Transaction> {
        let request = request.validate()?;
        let mut journal = Journal::default();

        match self.reconcile_validated(&request, &mut journal).await {
            Ok(transaction) => Ok(transaction),
            Err(err) => {
                if err.kind() == ErrorKind::Upstream {
                    tracing::warn!("reconciliation failed: {err}");
                } else {
                    tracing::info!("reconciliation declined: {err}");
                }
                if !journal.is_empty() {
                    self.compensate(journal).await;
                }
                Err(err)
            }
        }
    }

    async fn reconcile_validated(
        &self,
        request: &ValidRequest,
        journal: &mut Journal,
    ) -> ResultLedger<Transaction> {
        match request.id.as_deref() {
            Some(transaction_id) => {
                let previous = self.transaction(transaction_id).await?;
                if request.same_financials(&previous) {
                    tracing::debug!(
                        "transaction \"{transaction_id}\" keeps its wallet effect, no wallet changes"
                    );
                } else {
                    self.revert_and_reapply(&previous, request, journal).await?;
                }
            }
            None => self.apply_new_transaction(request, journal).await?,
        }

        let image = match &request.receipt {
            Some(receipt) => Some(self.uploader.upload(receipt, RECEIPTS_FOLDER).await?),
            None => None,
        };

        let key = match &request.id {
            Some(id) => id.clone(),
            None => self.store.new_key(Collection::Transactions),
        };
        let written = self
            .store
            .set(
                Collection::Transactions,
                &key,
                request.record_fields(image.clone()),
                true,
            )
            .await;
        match written {
            Ok(document) => Transaction::try_from(document),
            Err(err) => {
                if let Some(reference) = &image {
                    self.discard_upload(reference).await;
                }
                Err(err)
            }
        }
    }

    /// Return a transaction from the store.
    pub async fn transaction(&self, transaction_id: &str) -> ResultLedger<Transaction> {
        self.store
            .get(Collection::Transactions, transaction_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound("Transaction not found".to_string()))
            .and_then(Transaction::try_from)
    }

    /// The most recent `limit` transactions of `uid`, newest first.
    pub async fn transactions_for_user(
        &self,
        uid: &str,
        limit: usize,
    ) -> ResultLedger<Vec<Transaction>> {
        let mut transactions = self.query_transactions("uid", uid).await?;
        transactions.truncate(limit);
        Ok(transactions)
    }

    /// Transactions currently referencing `wallet_id`, newest first.
    pub async fn transactions_for_wallet(&self, wallet_id: &str) -> ResultLedger<Vec<Transaction>> {
        self.query_transactions("walletId", wallet_id).await
    }

    async fn query_transactions(&self, field: &str, value: &str) -> ResultLedger<Vec<Transaction>> {
        let mut transactions = self
            .store
            .query(Collection::Transactions, field, value)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect::<ResultLedger<Vec<_>>>()?;
        transactions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(transactions)
    }
}
