// Search/pagination state engine and concurrent image upload orchestration
// for the real-estate listing client.

pub mod config;
pub mod draft;
pub mod editor;
pub mod error;
pub mod export;
pub mod filter_codec;
pub mod listing_api;
pub mod models;
pub mod notify;
pub mod pagination;
pub mod search;
pub mod showcase;
pub mod storage;
pub mod upload;

pub use config::Settings;
pub use error::{ClientError, ClientResult};
