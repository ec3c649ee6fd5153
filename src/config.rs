use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    pub backend: BackendDef,
    pub auth: AuthDef,
    #[serde(default)]
    pub cookie_secure: bool,
    #[serde(default = "default_stats_interval")]
    pub stats_interval_secs: u64,
    #[serde(default = "default_log_interval")]
    pub log_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendDef {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthDef {
    pub admin_username: String,
    pub admin_password: String,
    pub session_secret: String,
}

fn default_listen_port() -> u16 {
    9090
}

fn default_stats_interval() -> u64 {
    5
}

fn default_log_interval() -> u64 {
    2
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| format!("reading config {}: {}", path.display(), e))?;
        let cfg: Config =
            serde_yaml::from_str(&data).map_err(|e| format!("parsing config: {}", e))?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.backend.base_url.is_empty() {
            return Err("backend.base_url must be configured".into());
        }
        if self.auth.admin_username.is_empty() || self.auth.admin_password.is_empty() {
            return Err("auth.admin_username and auth.admin_password must be configured".into());
        }
        if self.auth.session_secret.len() < 32 {
            return Err("auth.session_secret must be at least 32 bytes".into());
        }
        if self.stats_interval_secs == 0 || self.log_interval_secs == 0 {
            return Err("poll intervals must be at least 1 second".into());
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.listen_port)
    }

    pub fn backend_url(&self) -> &str {
        self.backend.base_url.trim_end_matches('/')
    }
}
