// Web server for label forge: form page, generation API and downloads
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use log::LevelFilter;

use label_forge::web::logger::setup_logging;
use label_forge::web::response_helpers::json_error;
use label_forge::web::retention::{spawn_sweeper, RetentionPolicy};
use label_forge::web::routes;
use label_forge::web::{
    AcceptAll, AppState, NonEmptyValidator, OpenAiClient, Pipeline, ScriptValidator, SharedState,
    WorkDirs,
};
use label_forge::{sys_debug, sys_info, sys_warn};
use label_forge_command::ToolRunner;
use label_forge_config::{load_api_key, AppConfig};

#[derive(Parser, Debug)]
#[command(name = "label_forge_web", about = "Generate Blender label/rescale scripts from uploads")]
struct Args {
    /// JSON config file; missing means defaults
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// JSON secrets file holding OPENAI_API_KEY
    #[arg(long, default_value = "secrets.json")]
    secrets: PathBuf,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Root for models/, labels/, scripts/ and output/
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// External tool command line, e.g. "blender"
    #[arg(long)]
    tool: Option<String>,

    /// Reject blank scripts from the completion service
    #[arg(long)]
    strict: bool,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(tool) = &self.tool {
            config.tool_command = Some(tool.clone());
        }
    }
}

async fn handle_request(
    req: Request<Body>,
    state: SharedState,
) -> std::result::Result<Response<Body>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    sys_debug!("{} {}", method, path);

    match (&method, path.as_str()) {
        (&Method::GET, "/") | (&Method::GET, "/index.html") => {
            routes::static_files::handle_index().await
        }
        (&Method::GET, "/health") => routes::health::handle().await,
        (&Method::GET, "/api/config") => routes::config::handle_get_config(state).await,
        (&Method::POST, "/api/label") => routes::generate::handle_label(req, state).await,
        (&Method::POST, "/api/rescale") => routes::generate::handle_rescale(req, state).await,
        (&Method::GET, p) if p.starts_with("/api/files/") => {
            routes::files::handle_download(p, state).await
        }
        (&Method::OPTIONS, _) => routes::static_files::handle_options().await,
        _ => Ok(json_error(StatusCode::NOT_FOUND, "Not found")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = AppConfig::load(&args.config)?;
    args.apply(&mut config);

    if let Err(e) = setup_logging(&config.log_dir, args.log_level) {
        eprintln!("Failed to set up logging: {e}");
    }

    let api_key = load_api_key(&args.secrets).context("completion API key is required")?;
    let runner = config
        .tool_command
        .as_deref()
        .map(ToolRunner::from_command_line)
        .transpose()?;
    match &runner {
        Some(r) => sys_info!("External tool: {}", r.program()),
        None => sys_warn!("No external tool configured; scripts will not be run on this server"),
    }

    let validator: Arc<dyn ScriptValidator> = if args.strict {
        Arc::new(NonEmptyValidator)
    } else {
        Arc::new(AcceptAll)
    };

    let dirs = WorkDirs::under(&config.data_dir);
    dirs.ensure()
        .with_context(|| format!("creating data directories under {}", config.data_dir.display()))?;

    if let Some(ttl) = config.retention_ttl() {
        let roots = dirs.all().iter().map(|p| p.to_path_buf()).collect();
        spawn_sweeper(RetentionPolicy::new(ttl), roots, config.sweep_interval());
        sys_info!("Retention: files older than {}s are swept", ttl.as_secs());
    }

    let client = Arc::new(OpenAiClient::from_config(&config, api_key));
    let pipeline = Pipeline::new(dirs, client, validator, runner);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.host, config.port))?;
    let state: SharedState = Arc::new(AppState { config, pipeline });

    let make_svc = make_service_fn(move |_conn| {
        let state = state.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| handle_request(req, state.clone())))
        }
    });

    let server = Server::bind(&addr).serve(make_svc);

    sys_info!("Label forge web server starting on http://{}", addr);
    sys_info!("  GET  /                    - Upload form");
    sys_info!("  GET  /health              - Health check");
    sys_info!("  GET  /api/config          - Effective configuration");
    sys_info!("  POST /api/label           - Generate an apply-label script");
    sys_info!("  POST /api/rescale         - Generate a rescale script");
    sys_info!("  GET  /api/files/{{area}}/{{name}} - Download scripts and outputs");

    server
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
