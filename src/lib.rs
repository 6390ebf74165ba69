// Ledgermark: benchmark sentence-embedding models on expense categorization
//
// This is the library root. Each module corresponds to a stage of the
// evaluation pipeline.

pub mod classify;
pub mod config;
pub mod dataset;
pub mod embedding;
pub mod hub;
pub mod metrics;
pub mod pipeline;
pub mod report;
