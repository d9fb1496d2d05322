use crate::{
    LedgerError, ResultLedger, Transaction, TransactionKind, WalletDelta,
    transactions::ValidRequest,
};

use super::super::{Engine, balances::Journal};

const NOT_ENOUGH_BALANCE: &str = "The selected wallet doesn't have enough balance";

impl Engine {
    /// Undoes `previous`'s effect on its wallet, then applies `request`'s
    /// effect on the destination wallet (which may be the same one).
    ///
    /// When the new transaction is an expense, the destination must cover it
    /// before anything is written: for the same wallet the balance after the
    /// reversal is checked, for another wallet its current balance.
    pub(super) async fn revert_and_reapply(
        &self,
        previous: &Transaction,
        request: &ValidRequest,
        journal: &mut Journal,
    ) -> ResultLedger<()> {
        let same_wallet = previous.wallet_id == request.wallet_id;
        let original = self.wallet(&previous.wallet_id).await?;
        let destination = if same_wallet {
            None
        } else {
            Some(self.wallet(&request.wallet_id).await?)
        };

        let reversal = WalletDelta::for_transaction(previous.kind, previous.amount).inverse();
        let reapply = WalletDelta::for_transaction(request.kind, request.amount);

        let guard = match request.kind {
            TransactionKind::Expense => {
                let available = match &destination {
                    None => original.with_delta(reversal)?.amount,
                    Some(destination) => destination.amount,
                };
                if available < request.amount {
                    return Err(LedgerError::InsufficientBalance(
                        NOT_ENOUGH_BALANCE.to_string(),
                    ));
                }
                Some(NOT_ENOUGH_BALANCE)
            }
            TransactionKind::Income => None,
        };

        let original = self
            .commit_journaled(original, reversal, None, journal)
            .await?;
        tracing::debug!(
            "reverted {} of {} on wallet \"{}\", balance now {}",
            previous.kind.as_str(),
            previous.amount,
            original.id,
            original.amount
        );

        // Fresh read: the destination may be the wallet just written.
        let destination = self.wallet(&request.wallet_id).await?;
        let destination = self
            .commit_journaled(destination, reapply, guard, journal)
            .await?;
        tracing::debug!(
            "reapplied {} of {} on wallet \"{}\", balance now {}",
            request.kind.as_str(),
            request.amount,
            destination.id,
            destination.amount
        );
        Ok(())
    }
}
