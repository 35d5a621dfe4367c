use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use survey_brain::config::{LoggingSettings, Settings};
use survey_brain::core::{Recommender, Scorer};
use survey_brain::routes::{self, AppState};
use survey_brain::services::OpenAiAdvisor;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            init_logging(&LoggingSettings::default());
            return Err(startup_error("Configuration error", e));
        }
    };

    init_logging(&settings.logging);
    info!("Starting Survey Brain recommendation service...");

    let advisor = OpenAiAdvisor::new(
        settings.advisor.endpoint.clone(),
        settings.advisor.model.clone(),
        settings.advisor.temperature,
        settings.advisor.api_key.clone(),
        settings.advisor.timeout(),
    )
    .map_err(|e| startup_error("Failed to build advisor client", e))?;

    if settings.advisor.api_key.is_none() {
        tracing::warn!("No advisor credential configured; recommendation requests will fail until one is set");
    }
    info!("Advisor client initialized ({} via {})", settings.advisor.model, advisor.endpoint());

    let scorer = Scorer::default();
    info!("Scorer initialized with rules {}", scorer.rules().version);

    let policy = settings.recommendations.policy();
    info!("Returning {} recommendations per survey", policy.result_count);

    let app_state = AppState::new(Recommender::new(scorer, policy, Arc::new(advisor)));

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
