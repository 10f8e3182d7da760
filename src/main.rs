use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use ditherkit::api;
use ditherkit::models::{AppConfig, RenderOptionsDto};
use ditherkit::rendering::{decode_png, encode_png};
use ditherkit::server;
use ditherkit::services::ExportService;

#[derive(Parser)]
#[command(name = "ditherkit")]
#[command(about = "Ditherkit - limited-palette image rendering service")]
struct Cli {
    /// Configuration file (overrides CONFIG_FILE)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Render PNG files directly (no server needed)
    Render {
        /// Input PNG files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output PNG file, or a directory when several inputs are given
        #[arg(short, long)]
        output: PathBuf,

        /// Render options as JSON or YAML (same fields as the HTTP API)
        #[arg(long)]
        options: Option<PathBuf>,

        /// Reduce sources so the longer side is at most this many pixels
        #[arg(long)]
        long_edge: Option<usize>,

        /// Per-image timeout in seconds (default from config)
        #[arg(long)]
        timeout: Option<u64>,
    },
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ditherkit API",
        description = "Limited-palette image rendering with debounced preview and timed export",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(
        api::handle_render,
        api::handle_export,
        api::handle_post_preview,
        api::handle_get_preview,
        api::handle_batch,
    ),
    components(schemas(
        api::RenderRequest,
        api::RenderResponse,
        api::ErrorResponse,
        api::PreviewAccepted,
        api::PreviewResponse,
        api::BatchRequest,
        api::BatchSlot,
        api::BatchSlotState,
        api::BatchResponse,
        ditherkit::models::RenderOptionsDto,
        ditherkit::models::AccentDto,
        ditherkit::models::ColorDto,
    )),
    tags(
        (name = "Render", description = "One-shot, export and grid rendering"),
        (name = "Preview", description = "Debounced interactive preview")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .or_else(|| std::env::var("CONFIG_FILE").ok().map(PathBuf::from));

    match cli.command {
        Some(Commands::Render {
            inputs,
            output,
            options,
            long_edge,
            timeout,
        }) => {
            run_render_command(
                config_path.as_deref(),
                &inputs,
                &output,
                options.as_deref(),
                long_edge,
                timeout,
            )
            .await
        }
        Some(Commands::Serve) => run_server(config_path.as_deref()).await,
        None => {
            run_status_command(config_path.as_deref());
            Ok(())
        }
    }
}

fn load_options(path: Option<&Path>) -> anyhow::Result<RenderOptionsDto> {
    let Some(path) = path else {
        return Ok(RenderOptionsDto::default());
    };
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let dto = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(dto)
}

/// Render PNG files directly through the export path
async fn run_render_command(
    config_path: Option<&Path>,
    inputs: &[PathBuf],
    output: &Path,
    options_path: Option<&Path>,
    long_edge: Option<usize>,
    timeout: Option<u64>,
) -> anyhow::Result<()> {
    // Minimal logging for CLI
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ditherkit=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let config = AppConfig::load(config_path);
    let options = load_options(options_path)?
        .to_options()
        .map_err(|e| anyhow::anyhow!("Invalid options: {e}"))?;
    let timeout = timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.export.timeout());

    let mut slots = Vec::with_capacity(inputs.len());
    for input in inputs {
        let bytes = std::fs::read(input)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", input.display()))?;
        let image = decode_png(&bytes)
            .map_err(|e| anyhow::anyhow!("Failed to decode {}: {e}", input.display()))?;
        slots.push((input.display().to_string(), image));
    }

    let single = inputs.len() == 1;
    if !single {
        std::fs::create_dir_all(output)?;
    }

    let exporter = ExportService::new(timeout);
    let results = exporter.export_slots(slots, &options, long_edge).await;

    let mut failures = 0;
    for ((slot, result), input) in results.into_iter().zip(inputs) {
        let target = if single {
            output.to_path_buf()
        } else {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "output".to_string());
            output.join(format!("{stem}.png"))
        };

        match result {
            Ok(image) => {
                let png = encode_png(&image)?;
                std::fs::write(&target, &png)?;
                println!(
                    "Rendered {slot} -> {} ({}x{}, {} bytes)",
                    target.display(),
                    image.width(),
                    image.height(),
                    png.len()
                );
            }
            Err(e) => {
                failures += 1;
                eprintln!("Failed to render {slot}: {e}");
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} renders failed", inputs.len());
    }
    Ok(())
}

/// Display status and configuration information
fn run_status_command(config_path: Option<&Path>) {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let bind_addr = std::env::var("BIND_ADDR").ok();

    println!("Ditherkit v{VERSION}");
    println!("Limited-palette image rendering service\n");

    println!("Environment Variables:");
    println!(
        "  BIND_ADDR   = {}",
        bind_addr.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  CONFIG_FILE = {}",
        std::env::var("CONFIG_FILE")
            .ok()
            .as_deref()
            .unwrap_or("(not set)")
    );

    let config_source = match config_path {
        Some(path) if path.exists() => path.display().to_string(),
        Some(path) => format!("defaults ({} not found)", path.display()),
        None => "defaults".to_string(),
    };
    let config = match config_path {
        Some(path) if path.exists() => std::fs::read_to_string(path)
            .ok()
            .and_then(|content| AppConfig::from_yaml(&content).ok())
            .unwrap_or_default(),
        _ => AppConfig::default(),
    };

    println!("\nConfiguration: {config_source}");
    println!("  bind            {}", config.server.bind);
    println!("  preview         {} ms debounce, long edge {}", config.preview.debounce_ms, config.preview.long_edge);
    println!("  export timeout  {} s", config.export.timeout_secs);
    println!("  queue depth     {}", config.dispatcher.queue_depth);

    println!("\nCommands:");
    println!("  ditherkit serve    Start the HTTP server");
    println!("  ditherkit render   Render PNG files to disk");
    println!("\nRun 'ditherkit --help' for more details.");
}

/// Run the HTTP server
async fn run_server(config_path: Option<&Path>) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ditherkit=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load(config_path);
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| config.server.bind.clone());

    tracing::info!(
        config = ?config_path.map(|p| p.display().to_string()).unwrap_or_else(|| "defaults".to_string()),
        debounce_ms = config.preview.debounce_ms,
        preview_long_edge = config.preview.long_edge,
        export_timeout_secs = config.export.timeout_secs,
        "Configuration resolved"
    );

    let state = server::create_app_state(config);

    // OpenAPI documentation (production only)
    let app = server::build_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Ditherkit server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
