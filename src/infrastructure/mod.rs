pub mod keys;
pub mod router;
pub mod storage;
