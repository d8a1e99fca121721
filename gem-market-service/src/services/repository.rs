//! Persistence seam for marketplace records.
//!
//! Handlers talk to a [`Repository`] per collection. Production wires the
//! MongoDB implementation; tests and local runs can use the in-memory one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::FindOptions;
use mongodb::Collection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use service_core::error::AppError;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{Auction, Bid, Feedback, Gemstone, OnlinePayment, Payment, Ticket};
use crate::services::database::MongoDb;

/// A record stored in its own collection under a string `_id`.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;
}

/// Equality conditions on stored field names, combined with AND.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Document,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.conditions.insert(field, value.into());
        self
    }

    /// Add the condition only when a value is present.
    pub fn eq_opt<V: Into<Bson>>(self, field: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    pub fn into_document(self) -> Document {
        self.conditions
    }

    fn matches(&self, record: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }
}

#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn insert(&self, item: &T) -> Result<(), AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<T>, AppError>;

    /// Matching records, newest first.
    async fn find(&self, filter: Filter) -> Result<Vec<T>, AppError>;

    /// Overwrite the stored record with the same id. Returns `false` if it vanished.
    async fn replace(&self, item: &T) -> Result<bool, AppError>;

    async fn delete(&self, id: &str) -> Result<bool, AppError>;

    async fn delete_many(&self, filter: Filter) -> Result<u64, AppError>;
}

pub struct MongoRepository<T: Entity> {
    collection: Collection<T>,
}

impl<T: Entity> MongoRepository<T> {
    pub fn new(db: &MongoDb) -> Self {
        Self {
            collection: db.database().collection(T::COLLECTION),
        }
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for MongoRepository<T> {
    async fn insert(&self, item: &T) -> Result<(), AppError> {
        self.collection.insert_one(item, None).await.map_err(|e| {
            tracing::error!(collection = T::COLLECTION, id = item.id(), "Insert failed: {}", e);
            AppError::from(e)
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<T>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn find(&self, filter: Filter) -> Result<Vec<T>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self
            .collection
            .find(filter.into_document(), options)
            .await
            .map_err(AppError::from)?;

        Ok(cursor.try_collect().await?)
    }

    async fn replace(&self, item: &T) -> Result<bool, AppError> {
        let result = self
            .collection
            .replace_one(doc! { "_id": item.id() }, item, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_many(&self, filter: Filter) -> Result<u64, AppError> {
        let result = self
            .collection
            .delete_many(filter.into_document(), None)
            .await?;
        Ok(result.deleted_count)
    }
}

/// Process-local repository. Filters are evaluated against the BSON form of
/// each record, so field names match what MongoDB would see.
pub struct InMemoryRepository<T: Entity> {
    items: RwLock<Vec<T>>,
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    async fn insert(&self, item: &T) -> Result<(), AppError> {
        let mut items = self.items.write().await;
        if items.iter().any(|existing| existing.id() == item.id()) {
            return Err(AppError::conflict(format!(
                "Duplicate id {} in {}",
                item.id(),
                T::COLLECTION
            )));
        }
        items.push(item.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<T>, AppError> {
        let items = self.items.read().await;
        Ok(items.iter().find(|item| item.id() == id).cloned())
    }

    async fn find(&self, filter: Filter) -> Result<Vec<T>, AppError> {
        let items = self.items.read().await;
        let mut matched = Vec::new();
        for item in items.iter() {
            let record = mongodb::bson::to_document(item)?;
            if filter.matches(&record) {
                matched.push(item.clone());
            }
        }
        matched.sort_by_key(|item| std::cmp::Reverse(item.created_at()));
        Ok(matched)
    }

    async fn replace(&self, item: &T) -> Result<bool, AppError> {
        let mut items = self.items.write().await;
        match items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => {
                *existing = item.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| item.id() != id);
        Ok(items.len() < before)
    }

    async fn delete_many(&self, filter: Filter) -> Result<u64, AppError> {
        let mut items = self.items.write().await;
        let mut kept = Vec::with_capacity(items.len());
        let mut removed = 0u64;
        for item in items.iter() {
            let record = mongodb::bson::to_document(item)?;
            if filter.matches(&record) {
                removed += 1;
            } else {
                kept.push(item.clone());
            }
        }
        *items = kept;
        Ok(removed)
    }
}

/// One repository per collection, shared across handlers.
#[derive(Clone)]
pub struct Repositories {
    pub tickets: Arc<dyn Repository<Ticket>>,
    pub payments: Arc<dyn Repository<Payment>>,
    pub online_payments: Arc<dyn Repository<OnlinePayment>>,
    pub gemstones: Arc<dyn Repository<Gemstone>>,
    pub auctions: Arc<dyn Repository<Auction>>,
    pub bids: Arc<dyn Repository<Bid>>,
    pub feedbacks: Arc<dyn Repository<Feedback>>,
}

impl Repositories {
    pub fn mongo(db: &MongoDb) -> Self {
        Self {
            tickets: Arc::new(MongoRepository::<Ticket>::new(db)),
            payments: Arc::new(MongoRepository::<Payment>::new(db)),
            online_payments: Arc::new(MongoRepository::<OnlinePayment>::new(db)),
            gemstones: Arc::new(MongoRepository::<Gemstone>::new(db)),
            auctions: Arc::new(MongoRepository::<Auction>::new(db)),
            bids: Arc::new(MongoRepository::<Bid>::new(db)),
            feedbacks: Arc::new(MongoRepository::<Feedback>::new(db)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            tickets: Arc::new(InMemoryRepository::<Ticket>::new()),
            payments: Arc::new(InMemoryRepository::<Payment>::new()),
            online_payments: Arc::new(InMemoryRepository::<OnlinePayment>::new()),
            gemstones: Arc::new(InMemoryRepository::<Gemstone>::new()),
            auctions: Arc::new(InMemoryRepository::<Auction>::new()),
            bids: Arc::new(InMemoryRepository::<Bid>::new()),
            feedbacks: Arc::new(InMemoryRepository::<Feedback>::new()),
        }
    }
}
