// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! guardian-daemon (guardiand)
//!
//! Privileged background process enforcing per-user screen-time curfews.
//! Owns the login-session event loop, the usage accounting and
//! enforcement state machine, and the filesystem/systemd side effects
//! (PAM time rules, systemd timers) those decisions require.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod admin_ipc;
mod env;
mod lifecycle;
mod notifier;
mod pam_writer;
mod protocol;
mod systemd_writer;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use guardian_adapters::{FilteringLoginSource, LoginSourceAdapter, LogindLoginSource, SystemTerminator};
use guardian_config::ConfigLoader;
use guardian_core::{Clock, Event, SystemClock, UsageDay};
use guardian_engine::{Enforcer, SessionTracker, ENFORCER_TICK_INTERVAL, SESSION_TICK_INTERVAL};
use guardian_storage::Storage;
use parking_lot::Mutex as SyncMutex;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::admin_ipc::{AdminCtx, BonusTable, EnforcerImpl};
use crate::lifecycle::LifecycleError;
use crate::notifier::NotifierImpl;
use crate::pam_writer::PamWriter;
use crate::systemd_writer::SystemdWriter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition.
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("guardiand {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("guardiand {}", env!("CARGO_PKG_VERSION"));
                println!("Guardian screen-time daemon — enforces per-user daily quotas and curfews.");
                println!();
                println!("USAGE:");
                println!("    guardiand");
                println!();
                println!("The daemon is normally started by systemd and should not be invoked");
                println!("directly. Administer it through `guardianctl`, which talks to its");
                println!("admin socket.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: guardiand [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config_path = guardian_config::resolve_path();
    let config_loader = match ConfigLoader::load(config_path.clone()) {
        Ok(loader) => Arc::new(loader),
        Err(e) => {
            eprintln!("error: failed to load config at {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };
    let snapshot = config_loader.current();

    let daemon_config = lifecycle::Config::load(snapshot.ipc_socket.clone())?;

    rotate_log_if_needed(&daemon_config.log_path);
    write_startup_marker(&daemon_config)?;
    let log_guard = setup_logging(&daemon_config)?;

    info!("starting guardian-daemon");

    let daemon_state = match lifecycle::startup(daemon_config.clone()) {
        Ok(state) => state,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&daemon_config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            eprintln!("guardiand is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            write_startup_error(&daemon_config, &e);
            error!("failed to start daemon: {e}");
            drop(log_guard);
            return Err(e.into());
        }
    };

    let storage = Storage::open_or_create(&snapshot.db_path).await?;
    let tracker = Arc::new(SessionTracker::new(SystemClock, storage.clone()));

    let notifier = NotifierImpl::connect_or_fallback().await;
    let terminator = SystemTerminator::new();
    let enforcer: Arc<EnforcerImpl> = Arc::new(Enforcer::new(SystemClock, notifier, terminator));

    let daemon_bin = std::env::current_exe().unwrap_or_else(|_| "/usr/sbin/guardiand".into());
    let pam_writer = Arc::new(PamWriter::new(env::pam_time_conf_path(), env::managed_group()));
    let systemd_writer = Arc::new(SystemdWriter::new(env::systemd_unit_dir(), daemon_bin));

    {
        let snapshot = config_loader.current();
        if let Err(e) = pam_writer.reconcile(&snapshot.policy) {
            error!(error = %e, "initial PAM reconciliation failed");
        }
        systemd_writer.reconcile(&snapshot.policy).await;
    }

    boot_catchup(&storage, &tracker, enforcer.as_ref(), &config_loader).await;

    let shutdown = Arc::new(Notify::new());
    let bonuses: BonusTable = Arc::new(SyncMutex::new(HashMap::new()));

    let admin_listener = admin_ipc::bind(&daemon_config.socket_path, &env::admin_group())?;
    let admin_ctx = Arc::new(AdminCtx {
        tracker: Arc::clone(&tracker),
        enforcer: Arc::clone(&enforcer),
        storage: storage.clone(),
        config_loader: Arc::clone(&config_loader),
        systemd_writer: Arc::clone(&systemd_writer),
        bonuses: Arc::clone(&bonuses),
        start_time: daemon_state.start_time,
    });
    let admin_shutdown = Arc::clone(&shutdown);
    let admin_task = tokio::spawn(admin_ipc::run(admin_listener, admin_ctx, admin_shutdown));

    {
        let writer = Arc::clone(&pam_writer);
        let systemd = Arc::clone(&systemd_writer);
        config_loader.subscribe(move |snapshot| {
            if let Err(e) = writer.reconcile(&snapshot.policy) {
                error!(error = %e, "PAM reconciliation on config reload failed");
            }
            let systemd = Arc::clone(&systemd);
            let policy = snapshot.policy.clone();
            tokio::spawn(async move { systemd.reconcile(&policy).await });
        });
    }
    let reload_shutdown = Arc::clone(&shutdown);
    let reload_loader = Arc::clone(&config_loader);
    let reload_task = tokio::spawn(async move { reload_loader.run_periodic(reload_shutdown).await });

    let (login_tx, mut login_rx) = tokio::sync::mpsc::channel::<Event>(256);
    let login_shutdown = Arc::new(Notify::new());
    let login_loader = Arc::clone(&config_loader);
    let login_source = FilteringLoginSource::new(LogindLoginSource::new(), move |username: &str| {
        login_loader.current().policy.is_managed(username)
    });
    let login_shutdown_task = Arc::clone(&login_shutdown);
    let login_task = tokio::spawn(async move { login_source.run(login_tx, login_shutdown_task).await });

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let mut session_ticker = tokio::time::interval(env::tick_interval_ms().unwrap_or(SESSION_TICK_INTERVAL));
    let mut enforcer_ticker = tokio::time::interval(env::tick_interval_ms().unwrap_or(ENFORCER_TICK_INTERVAL));

    println!("READY");
    info!(socket = %daemon_config.socket_path.display(), "daemon ready");

    loop {
        tokio::select! {
            event = login_rx.recv() => {
                match event {
                    Some(event) => {
                        let policy = config_loader.current().policy.clone();
                        let rolled_over_at = match &event {
                            Event::DayRolledOver { at } => Some(*at),
                            _ => None,
                        };
                        if let Err(e) = tracker.handle_event(event, policy.reset_time, policy.timezone).await {
                            error!(error = %e, "failed to apply login event");
                        }
                        if let Some(at) = rolled_over_at {
                            enforcer.on_day_rolled_over();
                            bonuses.lock().clear();
                            if let Err(e) = storage.record_reset(at).await {
                                error!(error = %e, "failed to persist day rollover reset");
                            }
                        }
                        tick_enforcer(&enforcer, &tracker, &config_loader, &bonuses).await;
                    }
                    None => {
                        warn!("login source channel closed, continuing on timers only");
                    }
                }
            }
            _ = session_ticker.tick() => {
                if let Err(e) = tracker.tick().await {
                    error!(error = %e, "session tracker tick failed");
                }
            }
            _ = enforcer_ticker.tick() => {
                tick_enforcer(&enforcer, &tracker, &config_loader, &bonuses).await;
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
        }
    }

    // Shutdown order: stop the login source, let the enforcer finish any
    // in-flight notification/termination, flush tracker state, then close
    // the admin socket. Each step is bounded so a stuck external command
    // never hangs the daemon's exit.
    login_shutdown.notify_waiters();
    let _ = tokio::time::timeout(Duration::from_secs(5), login_task).await;

    tick_enforcer(&enforcer, &tracker, &config_loader, &bonuses).await;

    if let Err(e) = tracker.flush_all().await {
        error!(error = %e, "failed to flush session state on shutdown");
    }

    shutdown.notify_waiters();
    let _ = tokio::time::timeout(Duration::from_secs(5), admin_task).await;
    let _ = std::fs::remove_file(&daemon_config.socket_path);
    reload_task.abort();

    daemon_state.cleanup_files();
    info!("guardian-daemon stopped");
    Ok(())
}

/// Applies the bonus table on top of `Policy` before handing it to the
/// enforcer, so a bonus grant takes effect on the very next tick without
/// threading a bonus parameter through `guardian-engine`.
async fn tick_enforcer(
    enforcer: &EnforcerImpl,
    tracker: &SessionTracker<SystemClock>,
    config_loader: &ConfigLoader,
    bonuses: &BonusTable,
) {
    let mut policy = config_loader.current().policy.clone();
    let bonuses = bonuses.lock().clone();
    for (username, user_policy) in policy.users.iter_mut() {
        if let Some(bonus) = bonuses.get(username.as_str()) {
            user_policy.daily_quota_seconds += bonus;
        }
    }
    enforcer.tick(tracker, &policy).await;
}

/// Detects a UsageDay reset missed while the daemon (or machine) was down
/// and synthesizes the same `DayRolledOver` handling a live tick would do,
/// so usage correctly starts fresh rather than carrying yesterday's total.
async fn boot_catchup(
    storage: &Storage,
    tracker: &SessionTracker<SystemClock>,
    enforcer: &EnforcerImpl,
    config_loader: &ConfigLoader,
) {
    let policy = config_loader.current().policy.clone();
    let now = SystemClock.now_wall();
    let current_day = UsageDay::containing(now, policy.reset_time, policy.timezone);

    let last_reset = match storage.last_reset_wall().await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "failed to read last reset timestamp, skipping boot catch-up");
            return;
        }
    };

    let missed = match last_reset {
        Some(last) => last < current_day.start,
        None => true,
    };
    if !missed {
        return;
    }

    info!("boot catch-up: applying missed UsageDay reset");
    if let Err(e) = tracker.handle_event(Event::DayRolledOver { at: now }, policy.reset_time, policy.timezone).await {
        error!(error = %e, "boot catch-up day rollover failed");
    }
    enforcer.on_day_rolled_over();
    if let Err(e) = storage.record_reset(now).await {
        error!(error = %e, "failed to persist boot catch-up reset");
    }
}

/// Maximum daemon log size before rotation.
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (guardiand.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `guardiand.log` → `.log.1` → `.log.2` → `.log.3`, deleting the
/// oldest. Best-effort: rotation failures are silently ignored so the
/// daemon still starts.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

/// Startup marker prefix written to the log before anything else, so an
/// administrator scanning the log can find where each run begins.
const STARTUP_MARKER_PREFIX: &str = "--- guardiand: starting (pid: ";

fn write_startup_marker(config: &lifecycle::Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&config.log_path)?;
    writeln!(file, "{}{}) ---\n", STARTUP_MARKER_PREFIX, std::process::id())?;
    Ok(())
}

fn write_startup_error(config: &lifecycle::Config, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new().create(true).append(true).open(&config.log_path) else {
        return;
    };
    let _ = writeln!(file, "ERROR failed to start daemon: {error}");
}

fn setup_logging(config: &lifecycle::Config) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config.log_path.file_name().ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
