//! L5: the cooperative orchestration tree that drives epoch and slot
//! processing to completion, per spec §4.5. Every region is a plain async
//! function; `tokio::select!`/`tokio::sync::watch` stand in for the typed
//! events a literal state-machine runtime would use (spec §9).

pub mod cleanup;
pub mod clock;
pub mod config;
pub mod context;
pub mod controllers;
pub mod epoch_creator;
pub mod epoch_orchestrator;
pub mod epoch_processor;
pub mod error;
pub mod slot_orchestrator;
pub mod slot_processor;

pub use config::OrchestrationConfig;
pub use context::Context;
pub use error::Error;

use slog::info;

/// Runs the full indexer until the executor's shutdown signal fires:
/// Epoch Creator and Epoch Orchestrator side by side (spec §4.5.1/§4.5.2),
/// plus the periodic committee cleanup sweep (spec §4.4 "Cleanup").
pub async fn run(ctx: Context) {
    info!(ctx.log, "orchestration starting");
    tokio::join!(
        epoch_creator::run(ctx.clone()),
        epoch_orchestrator::run(ctx.clone()),
        cleanup::run(ctx),
    );
}
