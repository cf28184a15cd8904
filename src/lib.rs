// src/lib.rs

//! quakewatch library
//!
//! Polls the KOERI recent-earthquake bulletin, keeps a watermark of the newest
//! processed event, and mails rows that are new since the last run and match
//! the configured location and magnitude.

pub mod error;
pub mod mail;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod source;
pub mod storage;
