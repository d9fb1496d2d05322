use chrono::Utc;
use serde_json::Value;

use crate::{
    Collection, Document, Fields, LedgerError, Money, Receipt, ResultLedger, Wallet,
    WalletPatch, store::to_fields,
};

use super::{Engine, normalize_optional_text};

const ICONS_FOLDER: &str = "wallets";

impl Engine {
    /// Return a wallet snapshot from the store.
    pub async fn wallet(&self, wallet_id: &str) -> ResultLedger<Wallet> {
        self.store
            .get(Collection::Wallets, wallet_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound("Wallet not found".to_string()))
            .and_then(Wallet::try_from)
    }

    /// Creates a wallet, or updates the descriptive fields of an existing one.
    ///
    /// A new wallet starts with zero totals and `opening_amount` (default 0)
    /// as its balance. `icon`, when given, is uploaded into the `wallets`
    /// folder and replaces `image`.
    pub async fn upsert_wallet(
        &self,
        patch: WalletPatch,
        icon: Option<Receipt>,
    ) -> ResultLedger<Wallet> {
        let name = normalize_optional_text(patch.name.as_deref());
        let image = normalize_optional_text(patch.image.as_deref());

        match patch.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            Some(wallet_id) => {
                let current = self.wallet(wallet_id).await?;
                let uploaded = match &icon {
                    Some(icon) => Some(self.uploader.upload(icon, ICONS_FOLDER).await?),
                    None => None,
                };
                let image = uploaded.clone().or(image);

                let mut fields = Fields::new();
                if let Some(name) = name {
                    fields.insert("name".to_string(), Value::from(name));
                }
                if let Some(image) = image {
                    fields.insert("image".to_string(), Value::from(image));
                }
                if fields.is_empty() {
                    return Err(LedgerError::Validation(
                        "provide at least one of name or image".to_string(),
                    ));
                }

                let written = self
                    .store
                    .update(Collection::Wallets, &current.id, fields, None)
                    .await;
                self.finish_icon_write(written, uploaded).await
            }
            None => {
                let name = name
                    .ok_or_else(|| LedgerError::Validation("Wallet name is required".to_string()))?;
                let uid = normalize_optional_text(patch.uid.as_deref())
                    .ok_or_else(|| LedgerError::Validation("Wallet owner is required".to_string()))?;
                let opening_amount = patch.opening_amount.unwrap_or(Money::ZERO);
                if opening_amount.is_negative() {
                    return Err(LedgerError::Validation(
                        "opening amount must be >= 0".to_string(),
                    ));
                }
                let uploaded = match &icon {
                    Some(icon) => Some(self.uploader.upload(icon, ICONS_FOLDER).await?),
                    None => None,
                };
                let image = uploaded.clone().or(image);

                let wallet = Wallet {
                    id: self.store.new_key(Collection::Wallets),
                    revision: 0,
                    name,
                    uid,
                    image,
                    amount: opening_amount,
                    total_income: Money::ZERO,
                    total_expenses: Money::ZERO,
                    created: Some(Utc::now()),
                };
                let written = self
                    .store
                    .set(Collection::Wallets, &wallet.id, to_fields(&wallet)?, false)
                    .await;
                let created = self.finish_icon_write(written, uploaded).await?;
                tracing::info!("created wallet \"{}\" for {}", created.id, created.uid);
                Ok(created)
            }
        }
    }

    /// Drops a freshly uploaded icon when the wallet write did not go through.
    async fn finish_icon_write(
        &self,
        written: ResultLedger<Document>,
        uploaded: Option<String>,
    ) -> ResultLedger<Wallet> {
        match written {
            Ok(document) => Wallet::try_from(document),
            Err(err) => {
                if let Some(reference) = &uploaded {
                    self.discard_upload(reference).await;
                }
                Err(err)
            }
        }
    }

    /// Wallets owned by `uid`, newest first.
    pub async fn wallets_for_user(&self, uid: &str) -> ResultLedger<Vec<Wallet>> {
        let mut wallets = self
            .store
            .query(Collection::Wallets, "uid", uid)
            .await?
            .into_iter()
            .map(Wallet::try_from)
            .collect::<ResultLedger<Vec<_>>>()?;
        wallets.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(wallets)
    }

    /// Sum of the balances of every wallet owned by `uid`.
    pub async fn total_balance(&self, uid: &str) -> ResultLedger<Money> {
        self.wallets_for_user(uid)
            .await?
            .iter()
            .try_fold(Money::ZERO, |total, wallet| total.checked_add(wallet.amount))
            .ok_or_else(|| LedgerError::Validation("total balance overflow".to_string()))
    }
}
