//! Wallet balance writes.
//!
//! Balance changes are never written blindly: the new values are computed
//! from a snapshot and written only if the wallet is still at the snapshot's
//! revision. A lost race re-reads the wallet and recomputes.

use std::time::Duration;

use uuid::Uuid;

use crate::{Collection, LedgerError, ResultLedger, Wallet, WalletDelta};

use super::Engine;

const RETRY_BASE_DELAY_MS: u64 = 4;
const RETRY_MAX_DELAY_MS: u64 = 200;

/// Delay before conflict retry `attempt` (1-based): exponential with full
/// jitter, so writers racing on one wallet spread out.
fn retry_delay(attempt: u32) -> Duration {
    let ceiling = RETRY_BASE_DELAY_MS
        .saturating_mul(1 << attempt.min(16))
        .min(RETRY_MAX_DELAY_MS);
    // v4 UUIDs carry 122 random bits; the low ones are enough for jitter.
    let jitter = (Uuid::new_v4().as_u128() as u64) % (ceiling + 1);
    Duration::from_millis(jitter.max(1))
}

/// Wallet deltas committed during one reconciliation, in commit order.
#[derive(Debug, Default)]
pub(super) struct Journal {
    entries: Vec<(String, WalletDelta)>,
}

impl Journal {
    fn record(&mut self, wallet_id: &str, delta: WalletDelta) {
        self.entries.push((wallet_id.to_string(), delta));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Engine {
    /// Applies `delta` to `wallet` with a conditional write.
    ///
    /// With `funds_guard` set, a result below zero is refused with that
    /// message instead of being written. The guard is evaluated again on every
    /// retry against the fresh snapshot.
    pub(super) async fn commit_delta(
        &self,
        mut wallet: Wallet,
        delta: WalletDelta,
        funds_guard: Option<&str>,
    ) -> ResultLedger<Wallet> {
        let mut attempt = 0;
        loop {
            let updated = wallet.with_delta(delta)?;
            if let Some(message) = funds_guard
                && updated.amount.is_negative()
            {
                return Err(LedgerError::InsufficientBalance(message.to_string()));
            }

            match self
                .store
                .update(
                    Collection::Wallets,
                    &wallet.id,
                    updated.balance_fields(),
                    Some(wallet.revision),
                )
                .await
            {
                Ok(document) => return Wallet::try_from(document),
                Err(LedgerError::Conflict(key)) if attempt < self.max_conflict_retries => {
                    attempt += 1;
                    let delay = retry_delay(attempt);
                    tracing::debug!(
                        "wallet \"{key}\" changed concurrently, retry {attempt} in {delay:?}"
                    );
                    tokio::time::sleep(delay).await;
                    wallet = self.wallet(&wallet.id).await?;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// [`commit_delta`](Self::commit_delta), remembering the delta so it can
    /// be undone if the reconciliation fails later on.
    pub(super) async fn commit_journaled(
        &self,
        wallet: Wallet,
        delta: WalletDelta,
        funds_guard: Option<&str>,
        journal: &mut Journal,
    ) -> ResultLedger<Wallet> {
        let wallet = self.commit_delta(wallet, delta, funds_guard).await?;
        journal.record(&wallet.id, delta);
        Ok(wallet)
    }

    /// Undoes every journaled delta, newest first.
    ///
    /// Failures are logged and do not stop the remaining reversals.
    pub(super) async fn compensate(&self, journal: Journal) {
        for (wallet_id, delta) in journal.entries.into_iter().rev() {
            match self.revert_delta(&wallet_id, delta).await {
                Ok(_) => tracing::warn!(
                    "reverted {delta:?} on wallet \"{wallet_id}\" after a failed reconciliation"
                ),
                Err(err) => tracing::error!(
                    "wallet \"{wallet_id}\" left inconsistent, could not revert {delta:?}: {err}"
                ),
            }
        }
    }

    async fn revert_delta(&self, wallet_id: &str, delta: WalletDelta) -> ResultLedger<Wallet> {
        let wallet = self.wallet(wallet_id).await?;
        self.commit_delta(wallet, delta.inverse(), None).await
    }
}
