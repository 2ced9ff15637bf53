use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::{CandleSource, Config, EngineCommand, Report, ReportTemplate};
use engine::control::spawn_stdin_listener;
use engine::{
    OtcClient, OutcomeResolver, ReportDispatcher, Reporter, ScanSettings, Scheduler, SessionHandle,
};
use strategy::{StrategyEngine, StrategyFileConfig};
use telegram_ctrl::{start_bot, BotDeps, TelegramNotifier};

/// Time allowed for queued reports to go out after the scan loop ends.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().context("loading configuration")?;
    info!(
        assets = ?cfg.assets,
        mtg_steps = cfg.max_retry_steps,
        policy = %cfg.scan_policy,
        "CandleCall starting"
    );

    let strategy_file = match &cfg.strategy_config_path {
        Some(path) => StrategyFileConfig::load(path).context("loading strategy config")?,
        None => StrategyFileConfig::default(),
    }
    .with_override(cfg.strategies_override.as_deref());

    let mut strategies = StrategyEngine::from_config(&strategy_file);
    if let Some(seed) = cfg.rng_seed {
        strategies = strategies.with_seed(seed);
    }

    // ── Reporting ─────────────────────────────────────────────────────────────
    let bot = teloxide::Bot::new(&cfg.telegram_token);
    let notifier = Arc::new(TelegramNotifier::new(bot.clone(), cfg.telegram_chat_id));
    let template = ReportTemplate {
        bot_name: cfg.bot_name.clone(),
        tag: cfg.tag_user.clone(),
        offset: cfg.market_offset,
        max_retry_steps: cfg.max_retry_steps,
    };
    let (reporter, report_rx) = Reporter::channel(64);
    let dispatcher = tokio::spawn(ReportDispatcher::new(report_rx, notifier, template).run());

    // ── Core ──────────────────────────────────────────────────────────────────
    let source: Arc<dyn CandleSource> = Arc::new(
        OtcClient::new(&cfg.otc_api_url, cfg.market_offset).context("building OTC client")?,
    );
    let session = SessionHandle::new();
    let resolver = OutcomeResolver::new(
        source.clone(),
        session.clone(),
        reporter.clone(),
        cfg.poll,
        cfg.max_retry_steps,
    );

    let (command_tx, command_rx) = mpsc::channel::<EngineCommand>(16);
    let settings = ScanSettings {
        assets: cfg.assets.clone(),
        policy: cfg.scan_policy,
        fetch_count: cfg.fetch_count,
        max_cycles: cfg.scan_cycles,
    };
    let mut scheduler = Scheduler::new(
        settings,
        source,
        strategies,
        resolver,
        session.clone(),
        reporter.clone(),
        command_rx,
    );
    if let Some(seed) = cfg.rng_seed {
        scheduler = scheduler.with_seed(seed);
    }

    // ── Operator commands ─────────────────────────────────────────────────────
    spawn_stdin_listener(command_tx.clone());
    tokio::spawn(start_bot(
        bot,
        BotDeps {
            command_tx,
            allowed_user_ids: Arc::new(cfg.telegram_allowed_user_ids.clone()),
        },
    ));

    // ── Run until stop, cycle cap or Ctrl-C ───────────────────────────────────
    info!("All subsystems started. Type 'off' to stop, 'status' for a summary.");
    tokio::select! {
        exit = scheduler.run() => {
            info!(?exit, "Scheduler finished");
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "Ctrl-C listener failed");
            }
            info!("Shutdown signal received, abandoning in-flight polls");
            reporter.send(Report::Summary(session.summary().await));
        }
    }

    // Last sender gone: the dispatcher drains and exits.
    drop(reporter);
    match tokio::time::timeout(DRAIN_TIMEOUT, dispatcher).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "Report dispatcher panicked"),
        Err(_) => warn!("Timed out delivering final reports"),
    }

    let tally = session.tally().await;
    info!(wins = tally.wins, losses = tally.losses, "Exiting");
    Ok(())
}
