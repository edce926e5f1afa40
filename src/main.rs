use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;

use plotweaver::config::EngineConfig;
use plotweaver::core::context::{ContextCache, InMemoryProjectSource, RawProjectData};
use plotweaver::core::generation::GenerationOrchestrator;
use plotweaver::core::llm::{OpenAiCompatibleGateway, TextGenerationGateway, UnconfiguredGateway};
use plotweaver::core::plot::PlotGenerationRequest;

const USAGE: &str = "usage: plotweaver [--suggestions | --alternatives] <request.json> [project.json]";

enum Mode {
    Plot,
    Suggestions,
    Alternatives,
}

struct Args {
    mode: Mode,
    request: PathBuf,
    project: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut mode = Mode::Plot;
    let mut paths = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--suggestions" => mode = Mode::Suggestions,
            "--alternatives" => mode = Mode::Alternatives,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            flag if flag.starts_with('-') => bail!("unknown flag {flag}\n{USAGE}"),
            path => paths.push(PathBuf::from(path)),
        }
    }

    let mut paths = paths.into_iter();
    let Some(request) = paths.next() else {
        bail!(USAGE);
    };
    Ok(Args {
        mode,
        request,
        project: paths.next(),
    })
}

fn build_gateway(config: &EngineConfig) -> Result<Arc<dyn TextGenerationGateway>> {
    match config.gateway.api_key() {
        Some(key) => {
            let mut gateway = OpenAiCompatibleGateway::new(key, config.gateway.base_url.clone())
                .context("failed to build HTTP gateway")?;
            if let Some(max_tokens) = config.gateway.max_tokens {
                gateway = gateway.with_max_tokens(max_tokens);
            }
            Ok(Arc::new(gateway))
        }
        None => {
            log::warn!(
                "{} is not set; results will come from the template generator",
                config.gateway.api_key_env
            );
            Ok(Arc::new(UnconfiguredGateway))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = EngineConfig::load();
    // stdout carries the JSON result, so console logs go to stderr
    let _log_guard = if config.logging.file || config.logging.stdout {
        plotweaver::core::logging::init(&config.logging)
    } else {
        plotweaver::core::logging::init_stderr(&config.logging.filter);
        None
    };
    log::info!("{} v{} starting", plotweaver::NAME, plotweaver::VERSION);

    let args = parse_args()?;

    let raw_request = tokio::fs::read_to_string(&args.request)
        .await
        .with_context(|| format!("failed to read {}", args.request.display()))?;
    let request: PlotGenerationRequest =
        serde_json::from_str(&raw_request).context("invalid plot generation request")?;

    let source = match &args.project {
        Some(path) => InMemoryProjectSource::from_json_file(request.project_id(), path)
            .await
            .with_context(|| format!("failed to load project data from {}", path.display()))?,
        None => InMemoryProjectSource::new()
            .with_project(request.project_id(), RawProjectData::default()),
    };

    let orchestrator = GenerationOrchestrator::builder(build_gateway(&config)?)
        .source(Arc::new(source))
        .store(Arc::new(ContextCache::new(config.cache.clone())))
        .catalog(config.models.clone())
        .config(config.orchestrator_config())
        .build();

    let result = match args.mode {
        Mode::Plot => {
            let token = CancellationToken::new();
            let ctrl_c = token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c.cancel();
                }
            });
            orchestrator
                .generate_plot_with_cancellation(&request, token)
                .await?
        }
        Mode::Suggestions => orchestrator.generate_suggestions_only(&request).await,
        Mode::Alternatives => orchestrator.generate_alternatives_only(&request).await,
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
