/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// PostgreSQL connection string (`DATABASE_URL`, required).
    pub database_url: String,
    /// Broadcast buffer capacity for both buses
    /// (`EVENT_BUS_CAPACITY`, default: `1024`).
    pub event_bus_capacity: usize,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let event_bus_capacity: usize = std::env::var("EVENT_BUS_CAPACITY")
            .unwrap_or_else(|_| "1024".into())
            .parse()
            .map_err(|_| anyhow::anyhow!("EVENT_BUS_CAPACITY must be a valid usize"))?;

        Ok(Self {
            database_url,
            event_bus_capacity,
        })
    }
}
