//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in each binary (or rely on lazy Once).
use std::str::FromStr;
use std::sync::Once;
use tracing::info;

static INIT: Once = Once::new();

/// Default port of the local catalog Postgres.
pub const DEFAULT_PG_PORT: u16 = 9876;

/// Load .env exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        if dotenv::dotenv().is_err() {
            // Fallback to the crate root when run from elsewhere
            let candidate = concat!(env!("CARGO_MANIFEST_DIR"), "/.env");
            let _ = dotenv::from_filename(candidate);
        }
    });
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env_opt(key)
        .and_then(|raw| raw.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Boolean flag; accepts 1/true/on/yes (case-insensitive) as true.
pub fn env_flag(key: &str, default: bool) -> bool {
    match env_opt(key) {
        Some(raw) => {
            let v = raw.trim().to_ascii_lowercase();
            matches!(v.as_str(), "1" | "true" | "on" | "yes")
        }
        None => default,
    }
}

/// Database URL: explicit DSN first, then composed from POSTGRES_* parts.
pub fn db_url() -> anyhow::Result<String> {
    for k in ["DATABASE_URL", "DB_URL"] {
        if let Some(v) = env_opt(k) {
            return Ok(v.trim().to_string());
        }
    }
    if let Some(dsn) = build_dsn_from_postgres_vars() {
        info!(target = "env", "using DSN composed from POSTGRES_* variables");
        return Ok(dsn);
    }
    Err(anyhow::anyhow!(
        "no database URL configured; set DATABASE_URL or POSTGRES_USER/POSTGRES_DB"
    ))
}

fn build_dsn_from_postgres_vars() -> Option<String> {
    let user = env_opt("POSTGRES_USER")?;
    let database = env_opt("POSTGRES_DB")?;
    let password = env_opt("POSTGRES_PASSWORD");
    let host = env_opt("POSTGRES_HOST").unwrap_or_else(|| "localhost".into());
    let port = env_parse("POSTGRES_PORT", DEFAULT_PG_PORT);

    // Build via `url::Url` so reserved characters in the password are encoded.
    let mut out = url::Url::parse("postgresql://localhost").ok()?;
    out.set_username(&user).ok()?;
    if let Some(pass) = password {
        out.set_password(Some(&pass)).ok()?;
    }
    out.set_host(Some(host.trim())).ok()?;
    out.set_port(Some(port)).ok()?;
    out.set_path(&format!("/{database}"));
    Some(out.to_string())
}

/// Redact credentials before a value reaches the logs.
pub fn redact_value(key: &str, val: &str) -> String {
    let k = key.to_ascii_uppercase();
    if k.contains("PASSWORD") || k.contains("SECRET") || k.contains("TOKEN") {
        return "***".to_string();
    }

    let val_trim = val.trim();
    if let Ok(mut u) = url::Url::parse(val_trim) {
        let scheme = u.scheme().to_ascii_lowercase();
        if scheme == "postgres" || scheme == "postgresql" {
            let _ = u.set_username("***");
            if u.password().is_some() {
                let _ = u.set_password(Some("***"));
            }
            return u.to_string();
        }
    }
    val_trim.to_string()
}

/// Log a consolidated, redacted snapshot of configuration keys.
pub fn log_config_snapshot(title: &str, keys: &[&str]) {
    let snapshot: Vec<(String, String)> = keys
        .iter()
        .map(|&k| {
            let v = env_opt(k).unwrap_or_default();
            (k.to_string(), redact_value(k, &v))
        })
        .collect();
    info!(target = "preflight", title, snapshot = ?snapshot, "configuration snapshot");
}
