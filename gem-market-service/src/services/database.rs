use mongodb::{
    bson::{doc, Document},
    options::IndexOptions,
    Client as MongoClient, Database, IndexModel,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for gem-market-service");

        let indexes: [(&str, Document, &str); 9] = [
            ("tickets", doc! { "email": 1, "created_at": -1 }, "ticket_owner_lookup"),
            ("tickets", doc! { "status": 1 }, "ticket_status_idx"),
            ("payments", doc! { "email": 1, "deleted_by_user": 1 }, "payment_owner_lookup"),
            ("payments", doc! { "status": 1 }, "payment_status_idx"),
            ("online_payments", doc! { "email": 1 }, "online_payment_owner_lookup"),
            ("gemstones", doc! { "is_auctioned": 1, "category": 1 }, "gemstone_listing_idx"),
            ("auctions", doc! { "gemstone_id": 1 }, "auction_gemstone_idx"),
            ("bids", doc! { "auction_id": 1, "amount": -1 }, "bid_auction_amount_idx"),
            ("feedbacks", doc! { "rating": 1 }, "feedback_rating_idx"),
        ];

        for (collection, keys, name) in indexes {
            let index = IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().name(name.to_string()).build())
                .build();

            self.db
                .collection::<Document>(collection)
                .create_index(index, None)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to create {} index on {}: {}", name, collection, e);
                    AppError::from(e)
                })?;
            tracing::info!("Created index {} on {}", name, collection);
        }

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
