pub mod card;
pub mod multipart;
pub mod validation;

pub use card::{validate_card, CardError, ValidatedCard};
pub use multipart::{MultipartForm, UploadedFile};
pub use validation::{ApiPath, ApiQuery, ValidatedJson};
