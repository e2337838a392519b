mod aggregate;
mod config;
mod db;
mod error;
mod genres;
mod handlers;
mod models;
mod schedule;
mod state;

use axum::{
    Router,
    response::Html,
    routing::{get, post},
};
use config::Config;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use state::AppState;
use std::str::FromStr;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

async fn root_handler() -> Html<String> {
    tokio::fs::read_to_string("templates/home.html")
        .await
        .map(Html)
        .unwrap_or_else(|_| Html("<h1>Fyyur</h1><p>Venues, artists and shows.</p>".to_string()))
}

fn app(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .nest_service("/static", ServeDir::new("static"))
        .route("/venues", get(handlers::list_venue_areas))
        .route("/venues/search", post(handlers::search_venues))
        .route("/venues/create", post(handlers::create_venue_submission))
        .route(
            "/venues/{venue_id}",
            get(handlers::show_venue).delete(handlers::delete_venue),
        )
        .route(
            "/venues/{venue_id}/edit",
            get(handlers::edit_venue).post(handlers::edit_venue_submission),
        )
        .route("/artists", get(handlers::list_artists))
        .route("/artists/search", post(handlers::search_artists))
        .route("/artists/create", post(handlers::create_artist_submission))
        .route("/artists/{artist_id}", get(handlers::show_artist))
        .route(
            "/artists/{artist_id}/edit",
            get(handlers::edit_artist).post(handlers::edit_artist_submission),
        )
        .route("/shows", get(handlers::list_shows))
        .route("/shows/create", post(handlers::create_show_submission))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fyyur=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(connect_options)
        .await?;

    db::init_schema(&pool).await?;

    if config.seed_demo_data && db::seed_if_empty(&pool).await? {
        tracing::info!("database was empty, loaded the demo directory");
    }

    let app_state = AppState {
        pool,
        clock: state::local_now,
    };

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app(app_state)).await?;
    Ok(())
}
