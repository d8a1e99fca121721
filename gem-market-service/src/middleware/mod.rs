pub mod requester;

pub use requester::{AdminOnly, Requester, ADMIN_SECRET_HEADER, USER_EMAIL_HEADER};
