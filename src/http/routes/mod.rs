pub mod export;
pub mod students;
pub mod upload;
