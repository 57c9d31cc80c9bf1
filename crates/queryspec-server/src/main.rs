use anyhow::Context;
use chrono::Utc;
use queryspec_core::WeatherForecast;
use queryspec_storage::seed::seed_forecasts;
use queryspec_storage::{InMemoryStore, PersistentStore, Repository};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod errors;
mod metrics;
mod params;

use app::{router, AppState};
use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::from_env();
    info!(?cfg, "starting");

    let store = open_store(&cfg).await?;
    let state = AppState::new(store, cfg.max_page_size, cfg.query_timeout);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("bind {}", cfg.bind_addr))?;
    info!("http listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn open_store(cfg: &Config) -> anyhow::Result<Arc<dyn Repository<WeatherForecast>>> {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let today = Utc::now().date_naive();
    let Some(dir) = &cfg.data_dir else {
        let rows = seed_forecasts(&mut rng, today, cfg.seed_per_summary);
        info!(rows = rows.len(), "seeded in-memory store");
        return Ok(Arc::new(InMemoryStore::from_rows(rows)));
    };

    match PersistentStore::<WeatherForecast>::open(dir) {
        Ok(store) => {
            if store.is_empty() && cfg.seed_per_summary > 0 {
                let rows = seed_forecasts(&mut rng, today, cfg.seed_per_summary);
                let n = rows.len();
                for row in rows {
                    store.create(row).await?;
                }
                store.compact()?;
                info!(rows = n, dir = %dir.display(), "seeded persistent store");
            }
            Ok(Arc::new(store))
        }
        Err(e) => {
            warn!("persistent open failed: {} - falling back to memory", e);
            let rows = seed_forecasts(&mut rng, today, cfg.seed_per_summary);
            Ok(Arc::new(InMemoryStore::from_rows(rows)))
        }
    }
}
