//! Runtime configuration from the environment, optionally seeded from a `.env` file.

use std::path::Path;
use std::time::Duration;

pub const DEFAULT_AUTH_BASE_URL: &str = "https://api.authentication.husqvarnagroup.dev/v1";
pub const DEFAULT_API_BASE_URL: &str = "https://api.smart.gardena.dev/v2";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

pub const ENV_CLIENT_ID: &str = "GARDENA_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "GARDENA_CLIENT_SECRET";
pub const ENV_AUTH_BASE_URL: &str = "GARDENA_AUTH_BASE_URL";
pub const ENV_API_BASE_URL: &str = "GARDENA_API_BASE_URL";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "GARDENA_HTTP_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct Config {
    /// Application key from the Husqvarna developer portal; also sent as `X-Api-Key`.
    pub client_id: String,
    pub client_secret: String,
    pub auth_base_url: String,
    pub api_base_url: String,
    /// Upper bound for a whole HTTP exchange.
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let required = [ENV_CLIENT_ID, ENV_CLIENT_SECRET];
        let missing = required.iter().filter(|name| get(name).is_none()).copied().collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(format!(
                "Missing required environment variable(s): {}",
                missing.join(", ")
            ));
        }

        let http_timeout_secs = match get(ENV_HTTP_TIMEOUT_SECS) {
            Some(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| format!("{} must be a whole number of seconds", ENV_HTTP_TIMEOUT_SECS))?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Config {
            client_id: get(ENV_CLIENT_ID).unwrap_or_default(),
            client_secret: get(ENV_CLIENT_SECRET).unwrap_or_default(),
            auth_base_url: get(ENV_AUTH_BASE_URL).unwrap_or_else(|| DEFAULT_AUTH_BASE_URL.to_string()),
            api_base_url: get(ENV_API_BASE_URL).unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }
}

/// Load `KEY=VALUE` lines into the process environment. Variables that are
/// already set are left untouched.
pub fn load_env_file(path: &Path) -> Result<usize, String> {
    let contents = std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    let mut applied = 0;
    for (index, line) in contents.lines().enumerate() {
        let Some((key, value)) = parse_env_line(line).map_err(|e| format!("{}:{}: {}", path.display(), index + 1, e))?
        else {
            continue;
        };
        if std::env::var_os(&key).is_none() {
            // Mutating the process environment is unsafe once threads exist; this runs before any are spawned.
            unsafe {
                std::env::set_var(&key, value);
            }
            applied += 1;
        }
    }
    Ok(applied)
}

/// Parse one `.env` line. Blank lines and `#` comments yield `None`; an optional
/// `export ` prefix is accepted; values may be single- or double-quoted.
pub fn parse_env_line(line: &str) -> Result<Option<(String, String)>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
    let (key, raw) = line.split_once('=').ok_or_else(|| "missing '=' in assignment".to_string())?;
    let key = key.trim();
    if key.is_empty() {
        return Err("environment variable name cannot be empty".to_string());
    }
    if key.chars().any(char::is_whitespace) {
        return Err(format!("environment variable name contains whitespace: {}", key));
    }
    Ok(Some((key.to_string(), unquote(raw.trim())?)))
}

fn unquote(raw: &str) -> Result<String, String> {
    for quote in ['"', '\''] {
        if let Some(rest) = raw.strip_prefix(quote) {
            let end = rest
                .find(quote)
                .ok_or_else(|| format!("unterminated {} quoted value", quote))?;
            let trailing = rest[end + 1..].trim();
            if !trailing.is_empty() && !trailing.starts_with('#') {
                return Err("unexpected characters after closing quote".to_string());
            }
            let inner = &rest[..end];
            return Ok(if quote == '"' { inner.replace("\\n", "\n") } else { inner.to_string() });
        }
    }
    // unquoted: strip trailing comment
    Ok(raw.split(" #").next().unwrap_or_default().trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn reports_every_missing_variable() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(
            err,
            "Missing required environment variable(s): GARDENA_CLIENT_ID, GARDENA_CLIENT_SECRET"
        );
        let err = Config::from_lookup(lookup(&[(ENV_CLIENT_ID, "id"), (ENV_CLIENT_SECRET, "  ")])).unwrap_err();
        assert_eq!(err, "Missing required environment variable(s): GARDENA_CLIENT_SECRET");
    }

    #[test]
    fn applies_defaults() {
        let cfg = Config::from_lookup(lookup(&[(ENV_CLIENT_ID, "id"), (ENV_CLIENT_SECRET, "secret")])).expect("valid");
        assert_eq!(cfg.client_id, "id");
        assert_eq!(cfg.client_secret, "secret");
        assert_eq!(cfg.auth_base_url, DEFAULT_AUTH_BASE_URL);
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(cfg.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn honours_overrides_and_rejects_bad_timeout() {
        let cfg = Config::from_lookup(lookup(&[
            (ENV_CLIENT_ID, "id"),
            (ENV_CLIENT_SECRET, "secret"),
            (ENV_AUTH_BASE_URL, "http://localhost:9000/auth"),
            (ENV_HTTP_TIMEOUT_SECS, "5"),
        ]))
        .expect("valid");
        assert_eq!(cfg.auth_base_url, "http://localhost:9000/auth");
        assert_eq!(cfg.http_timeout, Duration::from_secs(5));

        let err = Config::from_lookup(lookup(&[
            (ENV_CLIENT_ID, "id"),
            (ENV_CLIENT_SECRET, "secret"),
            (ENV_HTTP_TIMEOUT_SECS, "soon"),
        ]))
        .unwrap_err();
        assert!(err.contains(ENV_HTTP_TIMEOUT_SECS));
    }

    #[test]
    fn parses_env_lines() {
        assert_eq!(parse_env_line("   "), Ok(None));
        assert_eq!(parse_env_line("# comment"), Ok(None));
        assert_eq!(parse_env_line("A=b"), Ok(Some(("A".into(), "b".into()))));
        assert_eq!(parse_env_line("export A = b # note"), Ok(Some(("A".into(), "b".into()))));
        assert_eq!(parse_env_line("A=\"x y\""), Ok(Some(("A".into(), "x y".into()))));
        assert_eq!(parse_env_line("A='#not a comment'"), Ok(Some(("A".into(), "#not a comment".into()))));
        assert_eq!(parse_env_line("A="), Ok(Some(("A".into(), String::new()))));
        assert!(parse_env_line("novalue").is_err());
        assert!(parse_env_line("=x").is_err());
        assert!(parse_env_line("A B=x").is_err());
        assert!(parse_env_line("A=\"open").is_err());
    }
}
