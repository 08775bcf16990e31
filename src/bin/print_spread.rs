use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::EnvFilter;

use draconic_id::config::Config;
use draconic_id::database::SqliteProfileRepository;
use draconic_id::services::spread_service;

/// Prints the landing-globe selection for the configured parameters.
#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match SqlitePoolOptions::new().connect(&config.database_url).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("database connection failed: {}", e);
            std::process::exit(1);
        }
    };
    let repo = SqliteProfileRepository::new(pool);

    let landing = &config.landing;
    match spread_service::load_spread_profiles(
        &repo,
        landing.required_profile_id.as_deref(),
        landing.sample,
        landing.count,
    )
    .await
    {
        Ok(points) => match serde_json::to_string_pretty(&points) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("could not encode selection: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("spread selection failed: {}", e);
            std::process::exit(1);
        }
    }
}
