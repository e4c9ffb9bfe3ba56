use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub range: String,
    pub api_base: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub enum BackendConfig {
    InMem { data_dir: Option<PathBuf> },
    Sheets(SheetsConfig),
}

/// Process configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub backend: BackendConfig,
    pub bind: String,
    pub refresh_every: Duration,
    pub session_ttl: Duration,
    pub version_check: bool,
    pub frontend_url: Option<String>,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
fn secs_env(name: &str, default: u64) -> Duration {
    Duration::from_secs(var(name).and_then(|v| v.trim().parse().ok()).unwrap_or(default))
}
fn flag_env(name: &str) -> bool {
    var(name).map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = match var("ASKBOARD_BACKEND").as_deref().unwrap_or("inmem") {
            "inmem" => BackendConfig::InMem { data_dir: var("ASKBOARD_DATA_DIR").map(PathBuf::from) },
            "sheets" => BackendConfig::Sheets(SheetsConfig {
                spreadsheet_id: var("SHEETS_SPREADSHEET_ID").ok_or_else(|| {
                    anyhow::anyhow!("SHEETS_SPREADSHEET_ID must be set for the sheets backend")
                })?,
                range: var("SHEETS_RANGE").unwrap_or_else(|| "Sheet1".into()),
                api_base: var("SHEETS_API_BASE").unwrap_or_else(|| "https://sheets.googleapis.com".into()),
                token: var("SHEETS_TOKEN"),
                timeout: secs_env("SHEETS_TIMEOUT_SECS", 15),
            }),
            other => return Err(anyhow::anyhow!("unknown ASKBOARD_BACKEND '{other}' (expected inmem or sheets)")),
        };
        Ok(Self {
            backend,
            bind: var("ASKBOARD_BIND").unwrap_or_else(|| "0.0.0.0:8080".into()),
            refresh_every: secs_env("ASKBOARD_REFRESH_SECS", 30),
            session_ttl: secs_env("ASKBOARD_SESSION_TTL_SECS", 3600),
            version_check: flag_env("ASKBOARD_VERSION_CHECK"),
            frontend_url: var("FRONTEND_URL"),
        })
    }
}
