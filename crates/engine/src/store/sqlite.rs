//! SQLite-backed [`DocumentStore`] built on sea-orm.
//!
//! All documents live in a single `documents` table keyed by
//! `(collection, key)`; the body is the JSON object serialized as text.

use async_trait::async_trait;
use sea_orm::{
    ActiveValue, DatabaseConnection, DatabaseTransaction, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*, sea_query::Expr,
};
use serde_json::Value;

use crate::{LedgerError, ResultLedger};

use super::{Collection, Document, DocumentStore, Fields, merge_fields};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) mod documents {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "documents")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub collection: String,
        #[sea_orm(primary_key, auto_increment = false)]
        pub key: String,
        pub body: String,
        pub revision: i64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Clone, Debug)]
pub struct SqliteStore {
    database: DatabaseConnection,
}

impl SqliteStore {
    /// Wraps an already migrated connection.
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    async fn find<C: ConnectionTrait>(
        db: &C,
        collection: Collection,
        key: &str,
    ) -> ResultLedger<Option<documents::Model>> {
        let model =
            documents::Entity::find_by_id((collection.as_str().to_string(), key.to_string()))
                .one(db)
                .await?;
        Ok(model)
    }

    async fn insert(
        db_tx: &DatabaseTransaction,
        collection: Collection,
        key: &str,
        fields: Fields,
    ) -> ResultLedger<Document> {
        let active = documents::ActiveModel {
            collection: ActiveValue::Set(collection.as_str().to_string()),
            key: ActiveValue::Set(key.to_string()),
            body: ActiveValue::Set(encode_body(&fields)?),
            revision: ActiveValue::Set(1),
        };
        active.insert(db_tx).await?;

        Ok(Document {
            key: key.to_string(),
            revision: 1,
            fields,
        })
    }
}

fn encode_body(fields: &Fields) -> ResultLedger<String> {
    Ok(serde_json::to_string(fields)?)
}

fn decode_body(model: &documents::Model) -> ResultLedger<Fields> {
    match serde_json::from_str::<Value>(&model.body)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(LedgerError::Upstream(format!(
            "stored {} \"{}\" is not an object",
            model.collection, model.key
        ))),
    }
}

impl TryFrom<documents::Model> for Document {
    type Error = LedgerError;

    fn try_from(model: documents::Model) -> Result<Self, Self::Error> {
        let fields = decode_body(&model)?;
        Ok(Self {
            key: model.key,
            revision: model.revision,
            fields,
        })
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get(&self, collection: Collection, key: &str) -> ResultLedger<Option<Document>> {
        Self::find(&self.database, collection, key)
            .await?
            .map(Document::try_from)
            .transpose()
    }

    async fn set(
        &self,
        collection: Collection,
        key: &str,
        fields: Fields,
        merge: bool,
    ) -> ResultLedger<Document> {
        with_tx!(self, |db_tx| {
            match Self::find(&db_tx, collection, key).await? {
                Some(model) => {
                    let fields = if merge {
                        merge_fields(decode_body(&model)?, fields)
                    } else {
                        fields
                    };
                    let revision = model.revision + 1;
                    let active = documents::ActiveModel {
                        collection: ActiveValue::Set(model.collection),
                        key: ActiveValue::Set(model.key),
                        body: ActiveValue::Set(encode_body(&fields)?),
                        revision: ActiveValue::Set(revision),
                    };
                    active.update(&db_tx).await?;

                    Ok(Document {
                        key: key.to_string(),
                        revision,
                        fields,
                    })
                }
                None => Self::insert(&db_tx, collection, key, fields).await,
            }
        })
    }

    async fn update(
        &self,
        collection: Collection,
        key: &str,
        fields: Fields,
        expected_revision: Option<i64>,
    ) -> ResultLedger<Document> {
        with_tx!(self, |db_tx| {
            let model = Self::find(&db_tx, collection, key).await?.ok_or_else(|| {
                LedgerError::NotFound(format!("{} \"{key}\" not found", collection.as_str()))
            })?;
            if let Some(expected) = expected_revision
                && expected != model.revision
            {
                return Err(LedgerError::Conflict(key.to_string()));
            }

            let fields = merge_fields(decode_body(&model)?, fields);
            let revision = model.revision + 1;
            let result = documents::Entity::update_many()
                .col_expr(documents::Column::Body, Expr::value(encode_body(&fields)?))
                .col_expr(documents::Column::Revision, Expr::value(revision))
                .filter(documents::Column::Collection.eq(collection.as_str()))
                .filter(documents::Column::Key.eq(key))
                .filter(documents::Column::Revision.eq(model.revision))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(LedgerError::Conflict(key.to_string()));
            }

            Ok(Document {
                key: key.to_string(),
                revision,
                fields,
            })
        })
    }

    async fn query(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> ResultLedger<Vec<Document>> {
        let models = documents::Entity::find()
            .filter(documents::Column::Collection.eq(collection.as_str()))
            .filter(Expr::cust_with_values(
                "json_extract(body, ?) = ?",
                [format!("$.{field}"), value.to_string()],
            ))
            .order_by_asc(documents::Column::Key)
            .all(&self.database)
            .await?;

        models.into_iter().map(Document::try_from).collect()
    }
}
