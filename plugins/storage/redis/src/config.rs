use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};

// ════════════════════════════════════════════════════════════════
//  Configuration
// ════════════════════════════════════════════════════════════════

fn default_host() -> String {
    "localhost".into()
}

fn default_port() -> u16 {
    6379
}

fn default_connect_timeout_ms() -> u64 {
    3000
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Logical database selected right after connecting.
    #[serde(default)]
    pub database: u32,
    pub password: Option<String>,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: 0,
            password: None,
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl RedisConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn with_database(mut self, database: u32) -> Self {
        self.database = database;
        self
    }

    /// Client-side connection info; the client sends AUTH and SELECT itself.
    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: RedisConnectionInfo {
                db: i64::from(self.database),
                password: self.password.clone(),
                ..RedisConnectionInfo::default()
            },
        }
    }
}
