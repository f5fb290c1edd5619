use anyhow::Result;
use camwatch::{
    ActionResponse, CameraId, CameraServerApi, CamwatchConfig, Clock, HttpCameraClient,
    MonitorEvent, MonitorOrchestrator, Resolution, StatsView, SystemClock,
};
use clap::{Parser, Subcommand};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "camwatch")]
#[command(about = "Stream-health monitor and control client for a two-camera MJPEG server")]
#[command(version)]
#[command(long_about = "Watches the MJPEG stream of a two-camera streaming server, classifies \
its liveness as LIVE, DELAY, ERROR or OFFLINE, keeps a smoothed network quality score, and \
drives the server's camera and resolution controls.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "camwatch.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH", help = "Write logs to a daily-rotated file as well")]
    log_file: Option<String>,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Commands {
    /// Monitor stream health until interrupted (default)
    Watch {
        /// Enable keyboard controls
        #[arg(short, long)]
        interactive: bool,

        /// Stop after this many seconds
        #[arg(long, value_name = "SECS")]
        duration_secs: Option<u64>,
    },
    /// Switch the server to another camera
    Switch {
        /// Camera id (0 or 1)
        camera: i64,
    },
    /// Change the stream resolution
    Resolution {
        /// 640x480 or 1280x720
        resolution: String,
    },
    /// Print the server's stream statistics once
    Stats,
    /// Check whether the server reports an active camera
    Probe,
    /// Ask the server to shut down
    ShutdownServer,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config()?;
        return Ok(ExitCode::SUCCESS);
    }

    // Held until exit so buffered file logs are flushed
    let _log_guard = init_logging(&args)?;

    info!("Starting camwatch v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match CamwatchConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        return Ok(ExitCode::FAILURE);
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(ExitCode::SUCCESS);
    }

    let client = Arc::new(HttpCameraClient::new(&config.server)?);
    let json_output = args.log_format.as_deref() == Some("json");
    let command = args.command.clone().unwrap_or(Commands::Watch {
        interactive: false,
        duration_secs: None,
    });

    match command {
        Commands::Watch {
            interactive,
            duration_secs,
        } => run_watch(config, client, interactive, duration_secs, json_output).await,
        Commands::Switch { camera } => {
            let camera = CameraId::new(camera)?;
            let response = client.switch_camera(camera).await?;
            Ok(report_action(&format!("Switched to camera {}", camera), response))
        }
        Commands::Resolution { resolution } => {
            let resolution: Resolution = resolution.parse()?;
            let response = client.change_resolution(resolution).await?;
            Ok(report_action(
                &format!("Resolution set to {}", resolution),
                response,
            ))
        }
        Commands::Stats => {
            let stats = client.fetch_stats().await?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(ExitCode::SUCCESS);
            }

            let mut view = StatsView::default();
            view.apply(&stats, SystemClock::new().unix_time(), config.stats.freshness());
            println!("camera:     {}", stats.current_camera);
            println!("resolution: {}", stats.resolution);
            println!("codec:      {}", view.codec.as_deref().unwrap_or("-"));
            println!("quality:    {}", view.encoder_quality.as_deref().unwrap_or("-"));
            println!("clients:    {}", view.client_count.as_deref().unwrap_or("-"));
            println!("fps:        {}", view.fps);
            println!("frames:     {}", view.frame_count);
            println!("frame size: {}", view.frame_size);
            println!("status:     {}", view.activity);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Probe => {
            if client.probe_stream().await? {
                println!("✓ Stream active at {}", client.base_url());
                Ok(ExitCode::SUCCESS)
            } else {
                println!("✗ Stream inactive at {}", client.base_url());
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::ShutdownServer => {
            let response = client.shutdown_server().await?;
            Ok(report_action("Server shutting down", response))
        }
    }
}

async fn run_watch(
    config: CamwatchConfig,
    client: Arc<HttpCameraClient>,
    interactive: bool,
    duration_secs: Option<u64>,
    json_output: bool,
) -> Result<ExitCode> {
    let keyboard = interactive || config.system.keyboard;
    let mut orchestrator = MonitorOrchestrator::new(config, client, Arc::new(SystemClock::new()));
    orchestrator.set_keyboard_enabled(keyboard);

    if let Some(secs) = duration_secs {
        let events = orchestrator.events();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            if let Err(e) = events
                .publish(MonitorEvent::ShutdownRequested {
                    reason: format!("watch duration of {}s elapsed", secs),
                })
                .await
            {
                debug!("Shutdown event not delivered: {}", e);
            }
        });
    }

    let reason = orchestrator.run().await.map_err(|e| {
        error!("Monitor error during execution: {}", e);
        e
    })?;
    info!("Monitor stopped ({})", reason);

    let snapshot = orchestrator.snapshot();
    if json_output {
        println!("{}", serde_json::to_string(&snapshot)?);
    } else {
        println!("{}", snapshot.summary());
    }

    Ok(ExitCode::SUCCESS)
}

fn report_action(done: &str, response: ActionResponse) -> ExitCode {
    if response.success {
        println!("✓ {}", done);
        ExitCode::SUCCESS
    } else {
        eprintln!(
            "✗ Server declined: {}",
            response.message.as_deref().unwrap_or("no reason given")
        );
        ExitCode::FAILURE
    }
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{
        fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
    };

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    // Create environment filter
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("camwatch={}", log_level)));

    // Configure format based on options
    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![fmt_layer];
    let mut guard = None;

    if let Some(log_file) = &args.log_file {
        let path = Path::new(log_file);
        let directory = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Log file path '{}' has no file name", log_file))?;

        let appender = tracing_appender::rolling::daily(directory, file_name);
        let (writer, worker_guard) = tracing_appender::non_blocking(appender);
        layers.push(fmt::layer().with_writer(writer).with_ansi(false).boxed());
        guard = Some(worker_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Camwatch Configuration File");
    println!("# This is the default configuration with all available options.");
    println!("# Any key can be overridden with CAMWATCH__SECTION__KEY, e.g.");
    println!("# CAMWATCH__SERVER__BASE_URL=http://camera.local:8000");
    println!();
    println!("{}", CamwatchConfig::default().to_toml()?);
    Ok(())
}
