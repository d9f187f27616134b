use crate::cli::StorageBackend;
use anyhow::{Context, Result};
use rainforce_store::postgres::{PostgresConfig, PostgresStore};
use rainforce_store::{
    InfluenceAreaStore, MemoryInfluenceAreaStore, MemorySiteRegistry, MemoryStatisticsStore,
    SiteRegistry, StatisticsStore,
};
use std::sync::Arc;

/// Host, port and database of a connection URL, for error messages
fn describe_database_url(url: &str) -> (String, String, String) {
    let authority = url.split('@').nth(1).and_then(|s| s.split('/').next());

    let host = authority
        .and_then(|s| s.split(':').next())
        .unwrap_or("localhost")
        .to_string();
    let port = authority
        .and_then(|s| s.split(':').nth(1))
        .unwrap_or("5432")
        .to_string();
    let database = url
        .split('/')
        .next_back()
        .and_then(|s| s.split('?').next())
        .unwrap_or("rainforce")
        .to_string();

    (host, port, database)
}

/// Storage adapters backing one CLI invocation
pub struct Storage {
    pub registry: Arc<dyn SiteRegistry>,
    pub influence: Arc<dyn InfluenceAreaStore>,
    pub statistics: Arc<dyn StatisticsStore>,
}

impl Storage {
    pub async fn new(backend: StorageBackend) -> Result<Self> {
        match backend {
            StorageBackend::Memory => Ok(Self::new_memory()),
            StorageBackend::Postgres => Self::new_postgres().await,
        }
    }

    fn new_memory() -> Self {
        Self {
            registry: Arc::new(MemorySiteRegistry::new()),
            influence: Arc::new(MemoryInfluenceAreaStore::new()),
            statistics: Arc::new(MemoryStatisticsStore::new()),
        }
    }

    async fn new_postgres() -> Result<Self> {
        let config = PostgresConfig::from_env().context(
            "Failed to load PostgreSQL configuration. Set DATABASE_URL environment variable.",
        )?;

        let store = PostgresStore::connect(config.clone()).await.map_err(|e| {
            let (host, port, database) = describe_database_url(&config.database_url);
            anyhow::anyhow!(
                "Failed to connect to PostgreSQL\n\n\
                    Connection details:\n\
                      Host: {}\n\
                      Port: {}\n\
                      Database: {}\n\n\
                    Remediation:\n\
                      1. Ensure PostgreSQL is running\n\
                      2. Check DATABASE_URL environment variable\n\
                      3. Verify credentials and database exists\n\n\
                    Error: {}",
                host,
                port,
                database,
                e
            )
        })?;
        let store = Arc::new(store);

        Ok(Self { registry: store.clone(), influence: store.clone(), statistics: store })
    }
}
