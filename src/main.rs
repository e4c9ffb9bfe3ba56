use actix_cors::Cors;
use actix_web::{middleware::Compress, App, HttpServer};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi; // bring trait into scope for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use askboard::config::{BackendConfig, Config};
use askboard::openapi::ApiDoc;
use askboard::table::build_backend;
use askboard::{AppState, QuestionStore, SessionRegistry};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env automatically only in debug builds.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cfg = Config::from_env()?;
    info!("Bootstrapping askboard");
    match &cfg.backend {
        BackendConfig::InMem { data_dir } => info!(?data_dir, "Using in-memory question table"),
        BackendConfig::Sheets(s) => info!(spreadsheet = %s.spreadsheet_id, range = %s.range, "Using Google Sheets question table"),
    }
    if cfg.version_check {
        info!("Write version check enabled");
    }

    let backend = build_backend(&cfg.backend)?;
    let store = Arc::new(QuestionStore::new(backend).with_version_check(cfg.version_check));
    let sessions = Arc::new(SessionRegistry::new(store, cfg.refresh_every, cfg.session_ttl));

    // Periodically drop dashboards nobody is looking at any more.
    let pruner = sessions.clone();
    let ttl = cfg.session_ttl;
    actix_web::rt::spawn(async move {
        let mut tick = tokio::time::interval(ttl.max(std::time::Duration::from_secs(60)));
        loop {
            tick.tick().await;
            pruner.prune_idle();
        }
    });

    let openapi = ApiDoc::openapi();
    let state = AppState { sessions };
    let frontend_url = cfg.frontend_url.clone();

    let server = HttpServer::new(move || {
        let cors = {
            let mut c = Cors::default()
                // local dashboard dev servers
                .allowed_origin("http://localhost:5173")
                .allowed_origin("http://127.0.0.1:5173")
                .allowed_origin("http://localhost:8501")
                .allow_any_header()
                .allowed_methods(["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .max_age(3600);
            if let Some(front) = &frontend_url {
                c = c.allowed_origin(front);
            }
            c
        };

        App::new()
            .wrap(TracingLogger::default())
            .wrap(Compress::default())
            .wrap(cors)
            .app_data(actix_web::web::Data::new(state.clone()))
            .configure(askboard::config)
            .service(SwaggerUi::new("/docs/{_:.*}").url("/docs/openapi.json", openapi.clone()))
    })
    .bind(&cfg.bind)?;

    info!("Listening on http://{}", cfg.bind);

    server.run().await?;
    Ok(())
}
