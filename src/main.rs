use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use nui_scalar::config::Config;
use nui_scalar::engine::{Engine, LayerStore, RefreshTimer, RestoreOutcome, Session};
use nui_scalar::registry::YamlFileStore;
use nui_scalar::transport::{load_replay, replay, MemoryBus, Publisher, Transport};
use nui_scalar::web::{run_server, AppState};

#[derive(Parser)]
#[command(name = "nui-scalar")]
#[command(about = "Geolocated scalar telemetry plotting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file
    Validate { config: String },
    /// Run a session with the HTTP API
    Run { config: String },
    /// Feed a recorded message log through a session and print the map layers
    Replay { config: String, log: PathBuf },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => validate(&config),
        Commands::Run { config } => run(&config),
        Commands::Replay { config, log } => replay_log(&config, &log),
    }
}

fn load_config(path: &str) -> Option<Config> {
    match Config::from_file(path) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Config error: {}", e);
            None
        }
    }
}

fn validate(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    println!("Config is valid");
    println!("  origin channel: {}", config.transport.origin_channel);
    println!(
        "  position channels: {}",
        config.transport.position_channels.join(", ")
    );
    match &config.persistence.path {
        Some(p) => println!("  project store: {}", p.display()),
        None => println!("  project store: none (subscriptions are not saved)"),
    }
    for spec in &config.fields {
        println!(
            "  field {} @ {} Hz as '{}'",
            spec.key(),
            spec.sample_rate_hz,
            spec.display_name
        );
    }
    ExitCode::SUCCESS
}

struct Parts {
    bus: Arc<MemoryBus>,
    layers: Arc<LayerStore>,
    session: Arc<Session>,
}

/// Engine and session over an in-process bus, with saved and configured
/// fields registered.
fn build_session(config: &Config) -> Parts {
    let bus = Arc::new(MemoryBus::new());
    let layers = Arc::new(LayerStore::new());
    let engine = Arc::new(Engine::new(layers.clone()));

    if let Some(text) = &config.display.time_window {
        if let Err(e) = engine.set_time_limit(text) {
            log::warn!("Ignoring time window '{}': {}", text, e);
        }
    }

    let mut session = Session::new(engine, bus.clone(), config.session_options());
    if let Some(path) = &config.persistence.path {
        session = session.with_persistence(Arc::new(YamlFileStore::new(path.clone())));
    }

    match session.restore() {
        Ok(outcome) => report_failures("saved", &outcome),
        Err(e) => log::error!("Failed to restore subscriptions: {}", e),
    }
    report_failures("configured", &session.register_fields(&config.fields));

    Parts {
        bus,
        layers,
        session: Arc::new(session),
    }
}

fn report_failures(source: &str, outcome: &RestoreOutcome) {
    for (key, e) in &outcome.failed {
        log::warn!("Skipping {} field {}: {}", source, key, e);
    }
}

fn run(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(serve(config))
}

async fn serve(config: Config) -> ExitCode {
    let Parts {
        bus,
        layers,
        session,
    } = build_session(&config);
    let publisher: Publisher = bus.publisher();

    if let Err(e) = session.start() {
        eprintln!("Failed to start session: {}", e);
        return ExitCode::FAILURE;
    }
    let mut timer = RefreshTimer::start(session.engine().clone(), config.display.refresh_period);

    let state = AppState {
        session: session.clone(),
        layers,
        publisher: Some(publisher),
    };
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
        }
        log::info!("Shutting down");
    };

    let result = run_server(&config.web.bind, state, shutdown).await;

    let refreshes = timer.stop().await;
    session.stop();
    log::info!("Plot refreshed {} times", refreshes);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn replay_log(path: &str, log_path: &Path) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    let records = match load_replay(log_path) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Error reading {}: {}", log_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let Parts {
        bus,
        layers,
        session,
    } = build_session(&config);
    session.subscribe_sources();

    if let Err(e) = replay(&records, &bus.publisher()) {
        eprintln!("Replay failed: {}", e);
        return ExitCode::FAILURE;
    }
    loop {
        match bus.handle_timeout(Duration::ZERO) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                eprintln!("Delivery failed: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    let status = session.engine().status();
    println!(
        "Replayed {} messages: {} positions, {} fields",
        records.len(),
        status.positions,
        status.fields
    );
    match status.origin {
        Some(o) => println!("Origin: {:.6}, {:.6}", o.latitude_deg, o.longitude_deg),
        None => println!("Origin: not received"),
    }

    for layer in layers.layers() {
        println!("{} ({} points)", layer.name, layer.points.len());
        for point in &layer.points {
            let when = point
                .timestamp()
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| format!("{:.3}", point.time));
            println!(
                "  {}  {:.6}, {:.6}  {}",
                when,
                point.latitude,
                point.longitude,
                point.value.map(|v| v.to_string()).unwrap_or_default()
            );
        }
    }
    ExitCode::SUCCESS
}
