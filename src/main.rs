//! Command-line front end for essay-scorer.
//!
//! ## Environment Variables
//!
//! - `OPENAI_API_KEY` — cloud credential when `--api-key` is not given
//! - `OLLAMA_HOST` — local model server address
//! - `LOG_FORMAT=json` — structured JSON logs (overrides the config file)
//! - `RUST_LOG=info` — log level filter

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use essay_scorer::config::{self, loader};
use essay_scorer::report::{render_chart, render_notice, render_report};
use essay_scorer::{
    init_tracing_with, AcademicLevel, EssayScorer, FeedbackRequest, LogFormat, ScorerConfig,
    ScorerError, ScoringMode,
};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "essay-scorer", version, about = "Automated essay scoring and feedback")]
struct Cli {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long, global = true, env = "ESSAY_SCORER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score an essay read from a file, or from stdin when no file is given
    Score(ScoreArgs),
    /// Print the configuration JSON Schema
    Schema,
    /// Serve the HTTP API
    #[cfg(feature = "web-api")]
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Debug, clap::Args)]
struct ScoreArgs {
    /// Essay file ("-" or omitted reads stdin)
    file: Option<PathBuf>,

    /// Academic level: "High School", "Undergraduate" or "Graduate"
    #[arg(short, long, default_value = "High School")]
    level: String,

    /// OpenAI API key (optional for cloud)
    #[arg(long)]
    api_key: Option<String>,

    /// Skip the local model and go straight to the cloud backend
    #[arg(long)]
    no_local: bool,

    /// Generate placeholder scores without contacting any model
    #[arg(long)]
    simulate: bool,

    /// Echo feedback to stderr as it streams in
    #[arg(long)]
    live: bool,

    /// Print the result as JSON instead of a text report
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match loader::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        config.observability.log_format = LogFormat::Json;
    }
    let _ = init_tracing_with(&config.observability.log_format);

    let outcome = match cli.command {
        Command::Score(args) => score(config, args).await,
        Command::Schema => schema(),
        #[cfg(feature = "web-api")]
        Command::Serve { host, port } => serve(config, host, port).await,
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn score(mut config: ScorerConfig, args: ScoreArgs) -> Result<ExitCode, ScorerError> {
    if args.simulate {
        config.resolver.mode = ScoringMode::Simulated;
    }
    let prefer_local = config.resolver.prefer_local && !args.no_local;

    let level: AcademicLevel = args.level.parse()?;
    let essay = read_essay(args.file.as_deref())?;
    let mut request = FeedbackRequest::new(essay, level);
    if let Some(key) = args.api_key {
        request = request.with_credential(key);
    }

    let scorer = EssayScorer::from_config(&config);
    info!(mode = ?scorer.mode(), providers = ?scorer.provider_names(), "scorer ready");
    eprintln!("Analyzing your essay... please wait.");

    let live = args.live && !args.json;
    let echo = move |fragment: &str| {
        if live {
            let mut err = std::io::stderr().lock();
            let _ = err.write_all(fragment.as_bytes());
            let _ = err.flush();
        }
    };

    let result = match scorer.submit_with(&request, prefer_local, &echo).await {
        Ok(r) => r,
        Err(ScorerError::InputInvalid(msg)) => {
            eprintln!("{msg}");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e),
    };
    if live {
        eprintln!();
    }

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| ScorerError::Other(format!("failed to encode result: {e}")))?;
        println!("{json}");
    } else if live {
        // Text already streamed; show the rest.
        if let Some(scores) = result.scores() {
            print!("{}", render_chart(scores));
        }
        for notice in result.notices() {
            println!("{}", render_notice(notice));
        }
    } else {
        print!("{}", render_report(&result));
    }

    Ok(if result.is_available() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

fn read_essay(file: Option<&std::path::Path>) -> Result<String, ScorerError> {
    match file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .map_err(|e| ScorerError::Other(format!("failed to read {}: {e}", path.display()))),
        _ => {
            let mut essay = String::new();
            std::io::stdin()
                .read_to_string(&mut essay)
                .map_err(|e| ScorerError::Other(format!("failed to read stdin: {e}")))?;
            Ok(essay)
        }
    }
}

fn schema() -> Result<ExitCode, ScorerError> {
    let schema = config::export_schema()
        .map_err(|e| ScorerError::Other(format!("schema export failed: {e}")))?;
    println!("{schema}");
    Ok(ExitCode::SUCCESS)
}

#[cfg(feature = "web-api")]
async fn serve(config: ScorerConfig, host: String, port: u16) -> Result<ExitCode, ScorerError> {
    use essay_scorer::web_api::{start_server, ServerConfig};
    use std::sync::Arc;

    let server = ServerConfig {
        host,
        port,
        prefer_local: config.resolver.prefer_local,
        ..ServerConfig::default()
    };
    let scorer = Arc::new(EssayScorer::from_config(&config));
    start_server(server, scorer)
        .await
        .map_err(|e| ScorerError::Other(format!("server error: {e}")))?;
    Ok(ExitCode::SUCCESS)
}
