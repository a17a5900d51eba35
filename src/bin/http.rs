#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use ops_calendar::{
        EventStore, MemoryEventStore, SchedulingConfig, SystemClock, http_api,
    };
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let addr: SocketAddr = std::env::var("OPS_CALENDAR_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;
    let config = SchedulingConfig::from_env_path("OPS_CALENDAR_CONFIG")?;

    let store: Arc<dyn EventStore> = match std::env::var_os("OPS_CALENDAR_DB") {
        #[cfg(feature = "sqlite")]
        Some(path) => {
            tracing::info!(path = %path.to_string_lossy(), "using sqlite event store");
            Arc::new(ops_calendar::SqliteEventStore::new(path)?)
        }
        #[cfg(not(feature = "sqlite"))]
        Some(_) => return Err("OPS_CALENDAR_DB requires the `sqlite` feature".into()),
        None => {
            tracing::info!("using in-memory event store");
            Arc::new(MemoryEventStore::new())
        }
    };

    tracing::info!(%addr, "ops-calendar HTTP API listening");
    let state = http_api::AppState::new(store, Arc::new(SystemClock), config);
    http_api::serve(addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
