//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `UMOYO_WORK_DIR` and `UMOYO_LOG_LEVEL` env overrides.
//! The remote-provider API key comes from the `LLM_API_KEY` env var only —
//! it is never read from TOML.
//!
//! # Module layout
//!
//! - **types** — Public configuration structs consumed by the service
//!   (`Config`, `HttpConfig`, `LlmConfig`, etc.).
//! - **raw** — Raw TOML deserialization types (`RawConfig`, `RawLlm`, …).
//!   These mirror the file shape and use serde defaults; kept private.
//! - **load** — Loading logic: `merge_toml`, `load_raw_merged`, `load`,
//!   `load_from`, `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{expand_home, load, load_from};
pub use types::*;

#[cfg(test)]
impl Config {
    /// Safe `Config` for unit tests — no API key, unroutable LLM endpoint,
    /// in-repo work dir.
    pub fn test_default(work_dir: &std::path::Path) -> Self {
        Self {
            service_name: "test".into(),
            work_dir: work_dir.to_path_buf(),
            log_level: "info".into(),
            http: HttpConfig {
                bind: "127.0.0.1:0".into(),
                cors_any_origin: false,
            },
            storage: StorageConfig {
                db_path: "test.db".into(),
            },
            advisor: AdvisorConfig {
                default_location: "Malawi".into(),
            },
            llm: LlmConfig {
                api_url: "http://127.0.0.1:0/generate".into(),
                max_new_tokens: 16,
                temperature: 0.0,
                top_p: 1.0,
                timeout_seconds: 1,
            },
            llm_api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const MINIMAL_TOML: &str = r#"
[service]
name = "test-svc"
work_dir = "~/.umoyo"
log_level = "info"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parse_basic_config() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.service_name, "test-svc");
        assert_eq!(cfg.log_level, "info");
        // omitted sections fall back to serde defaults
        assert_eq!(cfg.http.bind, "127.0.0.1:8080");
        assert_eq!(cfg.storage.db_path, "umoyo.db");
        assert_eq!(cfg.advisor.default_location, "Malawi");
        assert_eq!(cfg.llm.max_new_tokens, 300);
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/.umoyo");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with(".umoyo"));
    }

    #[test]
    fn absolute_path_unchanged() {
        let p = expand_home("/absolute/path");
        assert_eq!(p, std::path::PathBuf::from("/absolute/path"));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(std::path::Path::new("/nonexistent/config.toml"), None, None);
        assert!(result.is_err());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn env_work_dir_override() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), Some("/tmp/test-override"), None).unwrap();
        assert_eq!(cfg.work_dir, std::path::PathBuf::from("/tmp/test-override"));
    }

    #[test]
    fn env_log_level_override() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), None, Some("debug")).unwrap();
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn db_file_resolves_relative_to_work_dir() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), Some("/srv/umoyo"), None).unwrap();
        assert_eq!(cfg.db_file(), std::path::PathBuf::from("/srv/umoyo/umoyo.db"));
    }

    #[test]
    fn db_file_absolute_path_unchanged() {
        let toml = r#"
[service]
name = "x"
work_dir = "/srv/umoyo"
log_level = "info"

[storage]
db_path = "/var/lib/umoyo/data.db"
"#;
        let f = write_toml(toml);
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(
            cfg.db_file(),
            std::path::PathBuf::from("/var/lib/umoyo/data.db")
        );
    }

    const BASE_TOML: &str = r#"
[service]
name = "base-svc"
work_dir = "~/.umoyo"
log_level = "info"

[llm]
api_url = "http://127.0.0.1:9000/generate"
temperature = 0.5
timeout_seconds = 30
"#;

    fn write_named(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let p = dir.path().join(name);
        std::fs::write(&p, content).unwrap();
        p
    }

    #[test]
    fn overlay_keeps_base_fields() {
        let dir = TempDir::new().unwrap();
        write_named(&dir, "base.toml", BASE_TOML);
        let overlay = r#"
[meta]
base = "base.toml"

[service]
log_level = "debug"
"#;
        let overlay_path = write_named(&dir, "overlay.toml", overlay);
        let cfg = load_from(&overlay_path, None, None).unwrap();
        assert_eq!(cfg.service_name, "base-svc");
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn overlay_wins_scalar() {
        let dir = TempDir::new().unwrap();
        write_named(&dir, "base.toml", BASE_TOML);
        let overlay = r#"
[meta]
base = "base.toml"

[llm]
temperature = 0.9
"#;
        let overlay_path = write_named(&dir, "overlay.toml", overlay);
        let cfg = load_from(&overlay_path, None, None).unwrap();
        assert_eq!(cfg.llm.temperature, 0.9);
        assert_eq!(cfg.llm.timeout_seconds, 30);
    }

    #[test]
    fn chained_bases() {
        let dir = TempDir::new().unwrap();
        write_named(&dir, "grandbase.toml", BASE_TOML);
        let middle = r#"
[meta]
base = "grandbase.toml"

[service]
name = "middle-svc"
"#;
        write_named(&dir, "middle.toml", middle);
        let top = r#"
[meta]
base = "middle.toml"

[service]
log_level = "warn"
"#;
        let top_path = write_named(&dir, "top.toml", top);
        let cfg = load_from(&top_path, None, None).unwrap();
        assert_eq!(cfg.service_name, "middle-svc");
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn missing_base_errors() {
        let dir = TempDir::new().unwrap();
        let overlay = r#"
[meta]
base = "nonexistent.toml"

[service]
name = "x"
work_dir = "~/.umoyo"
log_level = "info"
"#;
        let overlay_path = write_named(&dir, "overlay.toml", overlay);
        let result = load_from(&overlay_path, None, None);
        assert!(result.is_err());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("cannot read") || msg.contains("config error"));
    }

    #[test]
    fn cycle_detection() {
        let dir = TempDir::new().unwrap();
        let self_path = dir.path().join("self.toml");
        let content = format!("[meta]\nbase = \"{}\"\n\n{BASE_TOML}", self_path.display());
        std::fs::write(&self_path, content).unwrap();
        let result = load_from(&self_path, None, None);
        assert!(result.is_err());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("circular"));
    }
}
