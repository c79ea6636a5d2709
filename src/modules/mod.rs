//! Modules layer - clients for external services
//!
//! Currently the object storage that holds to-do attachments.

pub mod storage;
