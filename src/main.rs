use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use worklink::config::AppConfig;
use worklink::error::AppError;
use worklink::marketplace::{
    marketplace_router, ApplyOutcome, CatalogSeeder, InMemoryApplicationStore, InMemoryJobCatalog,
    Job, JobDraft, MarketplaceService, PayCadence, ProviderId, SearchQuery, UserId,
};
use worklink::telemetry;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Worklink Marketplace",
    about = "Run the worklink job marketplace service or walk its demo scenario",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk a seeker through the marketplace on the terminal
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
    /// Seed the catalog from a CSV export before serving
    #[arg(long)]
    seed_csv: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
struct DemoArgs {
    /// Seed the demo catalog from a CSV export instead of the built-in jobs
    #[arg(long)]
    seed_csv: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Demo(args) => run_demo(args),
    }
}

fn build_service() -> Arc<MarketplaceService<InMemoryJobCatalog, InMemoryApplicationStore>> {
    let catalog = Arc::new(InMemoryJobCatalog::default());
    let ledger = Arc::new(InMemoryApplicationStore::default());
    Arc::new(MarketplaceService::new(catalog, ledger))
}

/// A seed path given on the command line beats the configured one.
fn effective_seed(cli: Option<PathBuf>, configured: Option<PathBuf>) -> Option<PathBuf> {
    cli.or(configured)
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let service = build_service();
    if let Some(path) = effective_seed(args.seed_csv.take(), config.seed.file.take()) {
        let summary = CatalogSeeder::from_path(service.as_ref(), &path)?;
        info!(
            created = summary.created,
            skipped = summary.skipped,
            path = %path.display(),
            "seeded job catalog"
        );
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(marketplace_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "worklink marketplace ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

fn sample_drafts() -> Vec<JobDraft> {
    let skills = |names: &[&str]| -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    };
    vec![
        JobDraft {
            title: "Residential Plumbing Rounds".to_string(),
            provider: ProviderId("aqua-services".to_string()),
            description: "Weekly maintenance visits across three housing societies".to_string(),
            location: "Chennai".to_string(),
            skills: skills(&["Plumbing", "Pipe Fitting"]),
            pay_amount: 18_000,
            pay_cadence: PayCadence::Monthly,
            work_type: "Contract".to_string(),
            min_rating: 4.0,
        },
        JobDraft {
            title: "Office Deep Cleaning".to_string(),
            provider: ProviderId("shine-crew".to_string()),
            description: "Nightly cleaning for a two-floor office".to_string(),
            location: "Mumbai".to_string(),
            skills: skills(&["Cleaning"]),
            pay_amount: 15_000,
            pay_cadence: PayCadence::Monthly,
            work_type: "Part Time".to_string(),
            min_rating: 3.5,
        },
        JobDraft {
            title: "Evening Security Shift".to_string(),
            provider: ProviderId("guard-line".to_string()),
            description: "Gate duty from six to midnight".to_string(),
            location: "Chennai".to_string(),
            skills: skills(&["Security"]),
            pay_amount: 900,
            pay_cadence: PayCadence::Daily,
            work_type: "Shift".to_string(),
            min_rating: 4.2,
        },
    ]
}

fn job_line(job: &Job) -> String {
    format!(
        "- {} | {} | {} | {} {} | applicants {} | shortlisted {}",
        job.id,
        job.title,
        job.location,
        job.pay_amount,
        job.pay_cadence.label(),
        job.applicants,
        job.shortlisted
    )
}

fn run_demo(mut args: DemoArgs) -> Result<(), AppError> {
    let service = build_service();

    println!("Worklink marketplace demo");
    match args.seed_csv.take() {
        Some(path) => {
            let summary = CatalogSeeder::from_path(service.as_ref(), &path)?;
            println!(
                "Catalog source: CSV import ({} created, {} skipped)",
                summary.created, summary.skipped
            );
        }
        None => {
            for draft in sample_drafts() {
                service.create_job(draft)?;
            }
            println!("Catalog source: built-in sample postings");
        }
    }

    let seeker = UserId("asha".to_string());
    let rival = UserId("ravi".to_string());

    println!("\nOpen postings");
    for job in service.list_jobs()? {
        println!("{}", job_line(&job));
    }

    println!("\nSearch: location=chennai, min_pay=16000");
    let hits = service.search(SearchQuery {
        location: Some("chennai".to_string()),
        min_pay: Some("16000".to_string()),
        ..SearchQuery::default()
    })?;
    for job in &hits {
        println!("{}", job_line(job));
    }

    let Some(target) = hits.first().map(|job| job.id.clone()) else {
        println!("\nNo matching posting to apply against; demo ends early");
        return Ok(());
    };

    println!("\nApplications");
    for user in [&seeker, &rival] {
        match service.apply(&target, user)? {
            ApplyOutcome::Submitted(application) => {
                println!("- {} applied to {}", user, application.job_id)
            }
            ApplyOutcome::AlreadyApplied => println!("- {} had already applied", user),
            ApplyOutcome::JobUnavailable => println!("- {} found the posting closed", user),
        }
    }

    // Walk the first seeker to document verification, then drop the rival.
    service.advance_stage(&target, &seeker, 1)?;
    let advanced = service.advance_stage(&target, &seeker, 2)?;
    service.cancel(&target, &rival)?;

    println!("\nPipeline for {}", seeker);
    let view = advanced.to_view();
    println!(
        "Status: {} ({}% complete, current stage {})",
        view.status, view.progress_percent, view.current_stage
    );
    for stage in &view.stages {
        let mark = if stage.completed { "x" } else { " " };
        match stage.completed_on {
            Some(at) => println!("  [{mark}] {} ({})", stage.name, at.date_naive()),
            None => println!("  [{mark}] {}", stage.name),
        }
    }

    println!("\nCounters after withdrawal");
    let job = service.get_job(&target)?;
    println!("{}", job_line(&job));

    Ok(())
}
