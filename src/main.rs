use actix_web::{middleware::Compress, web, App, HttpServer};
use actix_cors::Cors;
use anyhow::Context;
use utoipa::OpenApi; // bring trait into scope for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use mcq_quiz::openapi::ApiDoc;
use mcq_quiz::repo::Repo;
use mcq_quiz::{config, seed, AppState, Settings};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env automatically only in debug builds; deployments set variables externally.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    // Structured logging initialisation
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let settings = Settings::from_env()?;
    info!("Bootstrapping MCQ quiz server");

    let repo = build_repo(&settings).await?;
    if settings.seed_sample_questions {
        let n = seed::seed_if_empty(repo.as_ref()).await.context("seeding sample questions")?;
        info!("Seeded {n} sample questions");
    }

    let openapi = ApiDoc::openapi();
    let state = web::Data::new(AppState { repo });

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_header()
            .allowed_methods(["GET", "POST", "PUT", "OPTIONS"])
            .max_age(3600);

        let app = App::new()
            .wrap(TracingLogger::default())
            .wrap(Compress::default())
            .wrap(cors)
            .app_data(state.clone())
            .configure(config)
            .service(SwaggerUi::new("/docs/{_:.*}").url("/docs/openapi.json", openapi.clone()));

        #[cfg(feature = "embed-frontend")]
        let app = app.configure(mcq_quiz::frontend::config);

        app
    })
    .bind((settings.host.as_str(), settings.port))?;

    info!("Listening on http://{}:{}", settings.host, settings.port);

    server.run().await?;
    Ok(())
}

async fn build_repo(settings: &Settings) -> anyhow::Result<Arc<dyn Repo>> {
    #[cfg(feature = "postgres-store")]
    if let Some(url) = settings.database_url.as_deref() {
        return postgres_repo(url, settings.db_max_connections).await;
    }
    fallback_repo(settings)
}

#[cfg(feature = "postgres-store")]
async fn postgres_repo(url: &str, max_connections: u32) -> anyhow::Result<Arc<dyn Repo>> {
    use sqlx::postgres::PgPoolOptions;
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .context("connecting to Postgres")?;
    sqlx::migrate!("./migrations").run(&pool).await.context("running migrations")?;
    info!("Using Postgres repository backend");
    Ok(Arc::new(mcq_quiz::repo::pg::PgRepo::new(pool)))
}

#[cfg(feature = "inmem-store")]
fn fallback_repo(settings: &Settings) -> anyhow::Result<Arc<dyn Repo>> {
    use mcq_quiz::repo::inmem::InMemRepo;
    let repo = match &settings.data_dir {
        Some(dir) => {
            info!("Using in-memory repository backend (snapshot in {})", dir.display());
            InMemRepo::with_snapshot(dir.join("state.json"))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using a volatile in-memory repository");
            InMemRepo::new()
        }
    };
    Ok(Arc::new(repo))
}

#[cfg(not(feature = "inmem-store"))]
fn fallback_repo(_settings: &Settings) -> anyhow::Result<Arc<dyn Repo>> {
    anyhow::bail!("DATABASE_URL must be set when the in-memory store is disabled")
}
