//! face-pointer - hands-free pointer control
//!
//! Entry point for the engine binary.

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use face_pointer::config::{Config, ConfigOverrides, LoggingConfig};
use face_pointer::controller::PointerController;
use face_pointer::gesture::TriggerPolicy;
use face_pointer::input::{InputInjector, KeyState, LoggingInjector};
use face_pointer::keyboard::{HookManager, KeyEvent, ManualHookBackend, ManualHookHandle};
use face_pointer::tracker::replay::{RecordingReader, ReplayError, ReplayRecord};
use face_pointer::tracker::TrackerFrame;
use face_pointer::utils::format_user_error;

// Frames queued for the update thread before new ones are dropped
const FRAME_QUEUE_DEPTH: usize = 4;

/// Command-line arguments for face-pointer
#[derive(Parser, Debug)]
#[command(name = "face-pointer")]
#[command(version, about = "Hands-free pointer control engine", long_about = None)]
pub struct Args {
    /// Configuration file path (default: ~/.config/face-pointer/config.toml)
    #[arg(short, long, env = "FACE_POINTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Replay a JSON-lines tracker recording instead of reading frames from stdin
    #[arg(short, long)]
    pub replay: Option<PathBuf>,

    /// Keyboard device to grab (default: first full keyboard)
    #[arg(short, long, env = "FACE_POINTER_KEYBOARD")]
    pub keyboard: Option<PathBuf>,

    /// Log injected events instead of creating a uinput device
    #[arg(long)]
    pub dry_run: bool,

    /// Gesture trigger policy (toggle|hold)
    #[arg(long)]
    pub policy: Option<TriggerPolicy>,

    /// Gesture trigger threshold (0 to 1)
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Index of the gesture score that switches modes
    #[arg(long)]
    pub gesture_index: Option<usize>,

    /// Pointer sensitivity (1 to 50)
    #[arg(long)]
    pub sensitivity: Option<f64>,

    /// Disable pointer acceleration
    #[arg(long)]
    pub no_accel: bool,

    /// Interval between status log lines
    #[arg(long, default_value = "1000")]
    pub status_interval_ms: u64,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Write logs to file (in addition to stdout)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            policy: self.policy,
            threshold: self.threshold,
            gesture_index: self.gesture_index,
            sensitivity: self.sensitivity,
            no_accel: self.no_accel,
            keyboard: self.keyboard.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format_user_error(&e));
            return Err(e);
        }
    };

    // Held until exit so buffered file logs are flushed
    let _log_guard = init_logging(&args, &config.logging)?;

    info!("════════════════════════════════════════════════════════");
    info!("  face-pointer v{}", env!("CARGO_PKG_VERSION"));
    info!("  Built: {} {}", env!("BUILD_DATE"), env!("BUILD_TIME"));
    info!("  Commit: {}", env!("GIT_HASH"));
    info!("  Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
    info!("════════════════════════════════════════════════════════");
    debug!("Config: {:?}", config);

    if let Err(e) = run(&args, &config).await {
        eprintln!("{}", format_user_error(&e));
        return Err(e);
    }

    info!("face-pointer stopped");
    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let config = Config::load_or_default(args.config.as_deref())?.with_overrides(&args.overrides());
    config
        .validate()
        .context("Invalid value in config or command line")?;
    Ok(config)
}

async fn run(args: &Args, config: &Config) -> Result<()> {
    let dry_run_log = args.dry_run.then(|| Arc::new(LoggingInjector::new()));
    let injector: Arc<dyn InputInjector> = match &dry_run_log {
        Some(log) => {
            info!("Dry run: injected events are logged, not emitted");
            Arc::clone(log) as Arc<dyn InputInjector>
        }
        None => create_virtual_device(config)?,
    };

    let controller = Arc::new(PointerController::new(
        config.controller_options(),
        Arc::clone(&injector),
    ));
    let mut hook = HookManager::new(controller.hook_callback());

    let (frame_tx, frame_rx) = crossbeam_channel::bounded(FRAME_QUEUE_DEPTH);
    spawn_update_thread(Arc::clone(&controller), frame_rx)?;

    let mut source: Pin<Box<dyn Future<Output = ()> + Send>> = match &args.replay {
        Some(path) => {
            let records = read_recording(path)?;
            let (backend, handle) = ManualHookBackend::new();
            hook.install(Box::new(backend))
                .context("Failed to install replay key hook")?;
            info!("Replaying {} records from {}", records.len(), path.display());
            Box::pin(replay(records, frame_tx, handle))
        }
        None => {
            install_keyboard_hook(&mut hook, config, &injector, args.dry_run)?;
            let (done_tx, done_rx) = oneshot::channel();
            spawn_stdin_reader(frame_tx, done_tx)?;
            info!("Reading tracker frames from stdin");
            Box::pin(async move {
                let _ = done_rx.await;
            })
        }
    };

    controller.start_tracking();

    let mut status_tick =
        tokio::time::interval(Duration::from_millis(args.status_interval_ms.max(1)));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted, shutting down");
                break;
            }
            _ = &mut source => {
                info!("Tracker input finished");
                break;
            }
            _ = status_tick.tick() => log_status(&controller),
        }
    }

    let released = controller.stop_tracking();
    if !released.is_empty() {
        info!("Released held buttons on stop: {:?}", released);
    }
    hook.uninstall().context("Failed to uninstall key hook")?;
    log_status(&controller);

    if let Some(log) = dry_run_log {
        let (moves, buttons, keys) = log.counts();
        info!(
            "Dry run emitted {} moves, {} button and {} key transitions",
            moves, buttons, keys
        );
    }

    Ok(())
}

#[cfg(target_os = "linux")]
fn create_virtual_device(config: &Config) -> Result<Arc<dyn InputInjector>> {
    let device = face_pointer::platform::UinputInjector::new(&config.keyboard.virtual_device_name)
        .context("Failed to create uinput virtual device")?;
    Ok(Arc::new(device))
}

#[cfg(not(target_os = "linux"))]
fn create_virtual_device(_config: &Config) -> Result<Arc<dyn InputInjector>> {
    anyhow::bail!("Virtual input devices need Linux uinput; run with --dry-run")
}

#[cfg(target_os = "linux")]
fn install_keyboard_hook(
    hook: &mut HookManager,
    config: &Config,
    injector: &Arc<dyn InputInjector>,
    dry_run: bool,
) -> Result<()> {
    use face_pointer::platform::{find_keyboard, EvdevGrabHook};

    if dry_run {
        // Passed keys would only be logged, leaving the keyboard dead
        warn!("Dry run: keyboard hook not installed");
        return Ok(());
    }

    let path = match &config.keyboard.device {
        Some(path) => path.clone(),
        None => find_keyboard().context("Failed to find a keyboard to grab")?,
    };
    hook.install(Box::new(EvdevGrabHook::new(&path, Arc::clone(injector))))
        .with_context(|| format!("Failed to grab keyboard {}", path.display()))?;
    info!("Key hook installed on {}", path.display());
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn install_keyboard_hook(
    _hook: &mut HookManager,
    _config: &Config,
    _injector: &Arc<dyn InputInjector>,
    _dry_run: bool,
) -> Result<()> {
    warn!("No global key hook on this platform");
    Ok(())
}

fn spawn_update_thread(
    controller: Arc<PointerController>,
    frames: Receiver<TrackerFrame>,
) -> Result<()> {
    thread::Builder::new()
        .name("pointer-update".to_string())
        .spawn(move || {
            for frame in frames.iter() {
                let report = controller.update(&frame);
                trace!("Tick: mode={} outcome={:?}", report.mode, report.outcome);
            }
            debug!("Frame channel closed, update thread exiting");
        })
        .context("Failed to spawn update thread")?;
    Ok(())
}

/// Queue a frame without blocking. Returns false once the consumer is gone.
fn forward_frame(frames: &Sender<TrackerFrame>, frame: TrackerFrame) -> bool {
    match frames.try_send(frame) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            trace!("Update thread behind, dropping frame");
            true
        }
        Err(TrySendError::Disconnected(_)) => false,
    }
}

fn read_recording(path: &Path) -> Result<Vec<ReplayRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open recording {}", path.display()))?;
    RecordingReader::new(std::io::BufReader::new(file))
        .read_all()
        .with_context(|| format!("Failed to parse recording {}", path.display()))
}

fn offset(at: f64) -> Duration {
    Duration::try_from_secs_f64(at.max(0.0)).unwrap_or_default()
}

/// Pace frames to the update thread while a second thread delivers key
/// records through the hook, so both contexts run concurrently.
async fn replay(records: Vec<ReplayRecord>, frames: Sender<TrackerFrame>, hook: ManualHookHandle) {
    let mut frame_records = Vec::new();
    let mut key_records = Vec::new();
    for record in records {
        match record {
            ReplayRecord::Frame { at, frame } => frame_records.push((at, frame)),
            ReplayRecord::Key { at, keycode, state } => key_records.push((at, keycode, state)),
        }
    }

    let start = Instant::now();
    let (keys_done_tx, keys_done_rx) = oneshot::channel();
    if let Err(e) = spawn_key_replay(key_records, hook, start, keys_done_tx) {
        warn!("Key replay disabled: {:#}", e);
    }

    let frame_start = tokio::time::Instant::from_std(start);
    for (at, frame) in frame_records {
        tokio::time::sleep_until(frame_start + offset(at)).await;
        if !forward_frame(&frames, frame) {
            break;
        }
    }

    // Dropped sender (spawn failure) resolves immediately
    let _ = keys_done_rx.await;
}

fn spawn_key_replay(
    keys: Vec<(f64, u32, KeyState)>,
    hook: ManualHookHandle,
    start: Instant,
    done: oneshot::Sender<()>,
) -> Result<()> {
    thread::Builder::new()
        .name("replay-keys".to_string())
        .spawn(move || {
            for (at, keycode, state) in keys {
                let due = start + offset(at);
                if let Some(wait) = due.checked_duration_since(Instant::now()) {
                    thread::sleep(wait);
                }

                match hook.deliver(&KeyEvent::new(keycode, state)) {
                    Some(decision) => debug!("Replayed key {} {:?}: {:?}", keycode, state, decision),
                    None => {
                        debug!("Key hook removed, stopping key replay");
                        break;
                    }
                }
            }
            let _ = done.send(());
        })
        .context("Failed to spawn key replay thread")?;
    Ok(())
}

fn spawn_stdin_reader(frames: Sender<TrackerFrame>, done: oneshot::Sender<()>) -> Result<()> {
    thread::Builder::new()
        .name("tracker-stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for record in RecordingReader::new(stdin.lock()) {
                match record {
                    Ok(ReplayRecord::Frame { frame, .. }) => {
                        if !forward_frame(&frames, frame) {
                            break;
                        }
                    }
                    Ok(ReplayRecord::Key { keycode, .. }) => {
                        debug!("Ignoring key {} on stdin, keys come from the hook", keycode);
                    }
                    Err(ReplayError::Io(e)) => {
                        warn!("Failed to read stdin: {}", e);
                        break;
                    }
                    Err(e) => warn!("Skipping tracker record: {}", e),
                }
            }
            let _ = done.send(());
        })
        .context("Failed to spawn stdin reader")?;
    Ok(())
}

fn log_status(controller: &PointerController) {
    let status = controller.status();
    info!(
        "Status: tracking={} mode={} sensitivity={} held={:?}",
        status.tracking_active, status.mode, status.settings.sensitivity, status.held_buttons
    );
    if status.typing_warning {
        warn!("Typing detected while pointer mode is active");
    }
    if let Ok(json) = serde_json::to_string(&status) {
        debug!("Status: {}", json);
    }
}

fn init_logging(args: &Args, logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let log_level = match args.verbose {
        0 => logging.level.to_lowercase(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("face_pointer={level},warn", level = log_level))
    });

    // Non-blocking so the hook thread never waits on disk
    let (file_writer, guard) = match args.log_file.as_ref().or(logging.log_file.as_ref()) {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Log file path has no file name: {}", path.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let format = args.log_format.as_deref().unwrap_or(logging.format.as_str());
    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stdout),
                )
                .with(file_writer.map(|writer| {
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(writer)
                        .with_ansi(false)
                }))
                .init();
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(std::io::stdout),
                )
                .with(file_writer.map(|writer| {
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(writer)
                        .with_ansi(false)
                }))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stdout),
                )
                .with(file_writer.map(|writer| {
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(writer)
                        .with_ansi(false)
                }))
                .init();
        }
    }

    Ok(guard)
}
