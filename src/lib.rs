#![doc(test(attr(deny(warnings))))]

//! APU Core prices construction-budget items from their resource analyses,
//! consolidates the resources a budget consumes, and keeps bank templates
//! and budget lines in step with the resource catalog.

pub mod catalog_sync;
pub mod cli;
pub mod config;
pub mod consolidation;
pub mod core;
pub mod errors;
pub mod number;
pub mod pricing;
pub mod project;
pub mod report;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("APU Core tracing initialized.");
    });
}
