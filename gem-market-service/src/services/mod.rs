pub mod admin_session;
pub mod database;
pub mod metrics;
pub mod otp;
pub mod repository;
pub mod storage;

pub use admin_session::AdminSessions;
pub use database::MongoDb;
pub use metrics::{get_metrics, init_metrics};
pub use otp::{LogOtpNotifier, OtpNotifier, RecordingOtpNotifier};
pub use repository::{Entity, Filter, InMemoryRepository, MongoRepository, Repositories, Repository};
pub use storage::{LocalStorage, Storage};
