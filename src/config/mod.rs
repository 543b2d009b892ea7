// src/config/mod.rs
pub mod ai;
pub mod ingest;
