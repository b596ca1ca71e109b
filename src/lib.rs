pub mod db;
pub mod export;
pub mod http;
pub mod ingest;
pub mod store;
