use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Bolt URI of the backing graph store
    #[serde(default = "default_graph_uri")]
    pub graph_uri: String,

    /// Graph store username
    #[serde(default = "default_graph_user")]
    pub graph_user: String,

    /// Graph store password
    #[serde(default = "default_graph_password")]
    pub graph_password: String,
}

fn default_graph_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_graph_user() -> String {
    "neo4j".to_string()
}

fn default_graph_password() -> String {
    "neo4j".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
