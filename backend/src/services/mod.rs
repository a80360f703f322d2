pub mod acquire;
pub mod fetch;
pub mod storage;
