//! CLI `styleflow`: genera una guía de estilo para una categoría y tipo de
//! producto.
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use style_adapters::{CommandWorker, StubWorker};
use style_core::{ArtifactStore, CancellationToken, InMemoryArtifactStore, InMemoryKnowledgeSource, KnowledgeResolver,
                 KnowledgeSource, Worker};
use style_persistence::{build_pool_from_env, PgArtifactStore, PgKnowledgeSource, PoolProvider};
use styleflow_rust::{AppConfig, GeneratedGuide, GenerationRequest, RunMode, ServiceError, StyleGuideService};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "styleflow", version, about = "Generación de guías de estilo por categoría y tipo de producto")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ejecuta el workflow y publica el resultado.
    Generate(GenerateArgs),
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(long)]
    category: String,
    #[arg(long)]
    product_type: String,
    /// Campo a generar (repetible); sin valores se usan title, shortDesc y longDesc.
    #[arg(long = "field")]
    fields: Vec<String>,
    #[arg(long, value_enum)]
    mode: Option<RunMode>,
    #[arg(long)]
    max_iterations: Option<u32>,
    /// Comando del worker externo; sin él se usan los workers stub.
    #[arg(long)]
    worker_cmd: Option<String>,
    /// Conocimiento y artifacts en Postgres (`DATABASE_URL`).
    #[arg(long)]
    db: bool,
    /// Imprime la línea de tiempo reconstruida de cada run.
    #[arg(long)]
    trace: bool,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Generate(args) => match generate(args) {
            Ok(code) => code,
            Err(e) => {
                error!("{e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("styleflow=info,style_core=info"));
    // también captura los registros de `log` de los crates de librería
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn generate(args: GenerateArgs) -> Result<ExitCode> {
    let mut config = AppConfig::from_env().context("invalid STYLEFLOW_* configuration")?;
    if let Some(mode) = args.mode {
        config.run_mode = mode;
    }
    if let Some(n) = args.max_iterations {
        if n == 0 {
            bail!("--max-iterations must be >= 1");
        }
        config.max_iterations = n;
    }
    if args.worker_cmd.is_some() {
        config.worker_cmd = args.worker_cmd.clone();
    }

    let worker = build_worker(config.worker_cmd.as_deref(), config.worker_timeout)?;
    let (knowledge, artifacts) = build_stores(args.db)?;
    let mode = config.run_mode;
    let service = StyleGuideService::new(config, knowledge, worker, artifacts)?;

    let mut request = GenerationRequest::new(args.category, args.product_type);
    request.fields_needed = args.fields;
    match service.generate(&request, &CancellationToken::new()) {
        Ok(guides) => {
            print_guides(&service, mode, &guides, args.trace);
            Ok(ExitCode::SUCCESS)
        }
        Err(ServiceError::FieldsFailed { published, failures }) => {
            print_guides(&service, mode, &published, args.trace);
            for failure in &failures {
                eprintln!("{}: {}", failure.field, failure.error);
                if let ServiceError::Run(run) = &failure.error {
                    if args.trace {
                        print_timeline(&service, mode, run.run_id);
                    }
                }
            }
            Ok(ExitCode::from(2))
        }
        Err(ServiceError::Run(failure)) => {
            eprintln!("{failure}");
            if args.trace {
                print_timeline(&service, mode, failure.run_id);
            }
            Ok(ExitCode::from(2))
        }
        Err(e) => Err(e.into()),
    }
}

fn build_worker(cmd: Option<&str>, timeout: Duration) -> Result<Arc<dyn Worker>> {
    let Some(cmd) = cmd else {
        return Ok(Arc::new(StubWorker::new().critique_rounds(1)));
    };
    let mut parts = cmd.split_whitespace();
    let Some(program) = parts.next() else {
        bail!("empty worker command");
    };
    let worker = parts.fold(CommandWorker::new(program).timeout(timeout), |w, a| w.arg(a));
    Ok(Arc::new(worker))
}

fn build_stores(db: bool) -> Result<(KnowledgeResolver, Arc<dyn ArtifactStore>)> {
    if db {
        let pool = build_pool_from_env().context("cannot connect to DATABASE_URL")?;
        let provider = PoolProvider { pool };
        let source: Arc<dyn KnowledgeSource> = Arc::new(PgKnowledgeSource::new(provider.clone()));
        return Ok((KnowledgeResolver::new(source), Arc::new(PgArtifactStore::new(provider))));
    }
    Ok((KnowledgeResolver::new(Arc::new(sample_knowledge())), Arc::new(InMemoryArtifactStore::new())))
}

/// Filas de ejemplo para el modo sin base de datos.
fn sample_knowledge() -> InMemoryKnowledgeSource {
    let source = InMemoryKnowledgeSource::new();
    source.insert_baseline("Fashion", Some("ALL"), "Use sentence case in titles.\nLead with material and fit.");
    source.insert_baseline("Fashion", None, "Keep a friendly, concise tone.");
    source.insert_baseline("Electronics", None, "State specifications with units.");
    source.insert_legal("ALL", "Do not make unverifiable claims.");
    source.insert_legal("Electronics", "Mention required safety certifications.");
    source
}

fn print_guides(service: &StyleGuideService, mode: RunMode, guides: &[GeneratedGuide], trace: bool) {
    for guide in guides {
        if let Some(field) = &guide.field_name {
            println!("## {field}");
        }
        println!("{}\n", guide.body);
        if trace {
            print_timeline(service, mode, guide.run_id);
        }
    }
}

fn print_timeline(service: &StyleGuideService, mode: RunMode, run_id: uuid::Uuid) {
    let snapshot = service.snapshot(mode, run_id);
    println!("run {run_id} (completed={}, cancelled={})", snapshot.completed, snapshot.cancelled);
    for (idx, slot) in snapshot.stages.iter().enumerate() {
        println!("  {idx:>2} {:<26} {:?} calls={} review={}{}",
                 slot.stage_id,
                 slot.status,
                 slot.producer_calls,
                 slot.needs_review,
                 slot.error.as_deref().map(|e| format!(" error={e}")).unwrap_or_default());
    }
}
