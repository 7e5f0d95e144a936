mod config;

use clap::{App, Arg};
use config::FileConfig;
use futures::StreamExt;
use indexer_http::{BeaconApiClient, ExecutionClient, PoolConfig, PoolPair, ReliableRequestClient};
use indexer_orchestration::{Context, OrchestrationConfig};
use indexer_store::Store;
use logging::LogFormat;
use sensitive_url::SensitiveUrl;
use slog::{crit, info, o};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use task_executor::{shutdown_channel, ShutdownReason, TaskExecutor};

fn main() {
    let matches = App::new("indexer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Ethereum beacon-chain reward and participation indexer")
        .arg(
            Arg::with_name("config")
                .long("config")
                .short("c")
                .value_name("FILE")
                .help("Path to the YAML config file")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Overrides the config file's log level")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("terminal or json; overrides the config file's log format")
                .takes_value(true),
        )
        .get_matches();

    let config_path = PathBuf::from(matches.value_of("config").expect("required"));
    let file_config = match FileConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to load config: {e}");
            std::process::exit(1);
        }
    };

    let level_str = matches
        .value_of("log-level")
        .map(str::to_string)
        .or_else(|| file_config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    let level = logging::parse_level(&level_str).unwrap_or(slog::Level::Info);

    let format_str = matches
        .value_of("log-format")
        .map(str::to_string)
        .or_else(|| file_config.log_format.clone())
        .unwrap_or_else(|| "terminal".to_string());
    let format = LogFormat::from_str(&format_str).unwrap_or(LogFormat::Terminal);

    let log = logging::root_logger(level, format);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    let (shutdown_handle, shutdown_signal, mut shutdown_events) = shutdown_channel();
    let executor = TaskExecutor::new(runtime.handle().clone(), shutdown_signal, log.clone());

    runtime.block_on(async move {
        let ctx = match build_context(file_config, executor.clone(), log.clone()) {
            Ok(ctx) => ctx,
            Err(e) => {
                crit!(log, "failed to initialize indexer"; "error" => e);
                shutdown_handle.fire(ShutdownReason::Failure);
                return;
            }
        };

        tokio::spawn(async move {
            indexer_orchestration::run(ctx).await;
        });

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!(log, "received interrupt, shutting down");
                shutdown_handle.fire(ShutdownReason::Requested);
            }
            reason = shutdown_events.next() => {
                info!(log, "shutting down"; "reason" => ?reason);
            }
        }
    });
}

fn build_context(
    file_config: FileConfig,
    executor: TaskExecutor,
    log: slog::Logger,
) -> Result<Context, String> {
    let store = Store::connect(
        &file_config.database_url,
        file_config.db_pool_size.unwrap_or(10),
        log.new(o!("component" => "store")),
    )
    .map_err(|e| format!("connecting to storage: {e:?}"))?;

    let archive_config = PoolConfig {
        base_url: SensitiveUrl::parse(&file_config.consensus.archive_url).map_err(|e| e.to_string())?,
        concurrency: file_config.consensus.archive_concurrency,
        retries: file_config.consensus.archive_retries,
        base_delay: file_config.base_delay(),
    };
    let full_config = PoolConfig {
        base_url: SensitiveUrl::parse(&file_config.consensus.full_url).map_err(|e| e.to_string())?,
        concurrency: file_config.consensus.full_concurrency,
        retries: file_config.consensus.full_retries,
        base_delay: file_config.base_delay(),
    };
    let rrc = ReliableRequestClient::new(PoolPair::new(archive_config, full_config), log.new(o!("component" => "beacon_api")));
    let beacon_api = Arc::new(BeaconApiClient::new(rrc, log.new(o!("component" => "beacon_api"))));

    let execution_url = SensitiveUrl::parse(&file_config.execution.url).map_err(|e| e.to_string())?;
    let execution_backup_url = file_config
        .execution
        .backup_url
        .as_deref()
        .map(SensitiveUrl::parse)
        .transpose()
        .map_err(|e| e.to_string())?;
    let execution = Arc::new(ExecutionClient::new(execution_url, execution_backup_url));

    let chain = file_config.chain.params();
    let beacon_time = beacon_time::BeaconTime::new(chain);

    let orchestration_config = OrchestrationConfig {
        chain,
        lookback_slot: file_config.lookback_slot(),
        delay_slots_to_head: file_config.consensus.delay_slots_to_head,
        max_unprocessed_epochs: file_config.max_unprocessed_epochs.unwrap_or(5),
        max_attestation_delay: file_config.max_attestation_delay.unwrap_or(32),
    };

    Ok(Context {
        beacon_api,
        execution,
        store,
        beacon_time,
        config: orchestration_config,
        executor,
        log: log.new(o!("component" => "orchestration")),
    })
}
