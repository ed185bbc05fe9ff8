use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::EnvFilter;

use metasheet::config::{ConfigLoader, ResolvedConfig};
use metasheet::domain::StudyMetadata;
use metasheet::error::MetasheetError;
use metasheet::events::{EventEnvelope, EventHandler};
use metasheet::http;
use metasheet::service::Archiver;
use metasheet::store::{FsMetadataStore, FsWorkbookStore};
use metasheet::transpile::Transpiler;

#[derive(Parser)]
#[command(name = "metasheet")]
#[command(about = "Archive study metadata and serve it back as XLSX workbooks")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "run-rest", about = "Run the HTTP REST API")]
    RunRest,
    #[command(
        name = "consume-events",
        about = "Consume artifact events as JSON lines from stdin"
    )]
    ConsumeEvents,
    #[command(about = "Transpile a metadata JSON file to an XLSX file")]
    Transpile(TranspileArgs),
}

#[derive(Args)]
struct TranspileArgs {
    input: String,

    #[arg(short, long)]
    output: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<MetasheetError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &MetasheetError) -> u8 {
    match error {
        MetasheetError::MetadataNotFound(_)
        | MetasheetError::ConfigRead(_)
        | MetasheetError::ConfigParse(_)
        | MetasheetError::SheetNameTooLong { .. } => 2,
        MetasheetError::Storage(_) | MetasheetError::Server(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::RunRest => {
            let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
            runtime.block_on(run_rest(config))?;
        }
        Commands::ConsumeEvents => {
            let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
            runtime.block_on(consume_events(config))?;
        }
        Commands::Transpile(args) => run_transpile(&config, args)?,
    }
    Ok(())
}

fn build_archiver(config: &ResolvedConfig) -> Arc<Archiver> {
    let metadata_store = Arc::new(FsMetadataStore::new(config.data_dir.clone()));
    let workbook_store = Arc::new(FsWorkbookStore::new(config.data_dir.clone()));
    Arc::new(Archiver::new(
        metadata_store,
        workbook_store,
        Transpiler::new(config.sheet_names.clone()),
    ))
}

async fn run_rest(config: ResolvedConfig) -> Result<(), MetasheetError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|_| MetasheetError::Server(format!("invalid listen address {}:{}", config.host, config.port)))?;
    http::serve(addr, build_archiver(&config)).await
}

async fn consume_events(config: ResolvedConfig) -> Result<(), MetasheetError> {
    let handler = EventHandler::new(build_archiver(&config));
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|err| MetasheetError::Event(err.to_string()))?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let envelope: EventEnvelope = serde_json::from_str(line)
            .map_err(|err| MetasheetError::Event(err.to_string()))?;
        handler.dispatch(envelope).await?;
    }
    Ok(())
}

fn run_transpile(config: &ResolvedConfig, args: TranspileArgs) -> Result<(), MetasheetError> {
    let content = fs::read_to_string(&args.input)
        .map_err(|err| MetasheetError::Storage(err.to_string()))?;
    let metadata: StudyMetadata = serde_json::from_str(&content)
        .map_err(|err| MetasheetError::Serialization(err.to_string()))?;

    let bytes = Transpiler::new(config.sheet_names.clone()).transpile_to_bytes(&metadata)?;

    let output = args.output.map(std::path::PathBuf::from).unwrap_or_else(|| {
        Path::new(&args.input).with_extension("xlsx")
    });
    fs::write(&output, &bytes).map_err(|err| MetasheetError::Storage(err.to_string()))?;
    tracing::info!("wrote {}", output.display());
    Ok(())
}
