use crate::{
    LedgerError, ResultLedger, TransactionKind, WalletDelta, transactions::ValidRequest,
};

use super::super::{Engine, balances::Journal};

const INSUFFICIENT_BALANCE: &str = "Insufficient balance in wallet!";

impl Engine {
    /// Applies a new transaction's effect to its wallet.
    ///
    /// An expense larger than the wallet balance is refused before anything
    /// is written.
    pub(super) async fn apply_new_transaction(
        &self,
        request: &ValidRequest,
        journal: &mut Journal,
    ) -> ResultLedger<()> {
        let wallet = self.wallet(&request.wallet_id).await?;

        let guard = match request.kind {
            TransactionKind::Expense => {
                if wallet.amount < request.amount {
                    return Err(LedgerError::InsufficientBalance(
                        INSUFFICIENT_BALANCE.to_string(),
                    ));
                }
                Some(INSUFFICIENT_BALANCE)
            }
            TransactionKind::Income => None,
        };

        let delta = WalletDelta::for_transaction(request.kind, request.amount);
        let wallet = self.commit_journaled(wallet, delta, guard, journal).await?;
        tracing::debug!(
            "applied new {} of {} to wallet \"{}\", balance now {}",
            request.kind.as_str(),
            request.amount,
            wallet.id,
            wallet.amount
        );
        Ok(())
    }
}
