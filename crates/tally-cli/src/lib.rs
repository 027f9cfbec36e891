use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tally_web::{AppState, HistoryStore, router};

#[derive(Debug, Clone)]
enum CliCommand {
    Serve {
        port: Option<u16>,
        db: Option<PathBuf>,
        config: Option<PathBuf>,
    },
    Eval {
        expression: String,
    },
}

/// Server configuration, loadable from an optional JSON file.
/// CLI flags override file values, file values override defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> PathBuf {
    PathBuf::from("tally.db")
}

fn default_history_limit() -> u32 {
    tally_web::DEFAULT_HISTORY_LIMIT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            db_path: default_db_path(),
            history_limit: default_history_limit(),
        }
    }
}

pub async fn run_from_env() -> Result<(), String> {
    run_from_args(env::args().skip(1).collect()).await
}

pub async fn run_from_args(args: Vec<String>) -> Result<(), String> {
    let command = parse_command(args)?;

    match command {
        CliCommand::Serve { port, db, config } => {
            let config = resolve_config(port, db, config)?;
            run_server(config).await
        }
        CliCommand::Eval { expression } => run_eval(&expression),
    }
}

fn parse_command(args: Vec<String>) -> Result<CliCommand, String> {
    if args.is_empty() {
        return Err(help_text());
    }

    let cmd = args[0].as_str();
    match cmd {
        "serve" => parse_serve(args),
        "eval" => parse_eval(args),
        "help" | "--help" | "-h" => Err(help_text()),
        _ => Err(format!("unknown command: {cmd}\n\n{}", help_text())),
    }
}

fn parse_serve(args: Vec<String>) -> Result<CliCommand, String> {
    let mut port: Option<u16> = None;
    let mut db: Option<PathBuf> = None;
    let mut config: Option<PathBuf> = None;

    let mut i = 1usize;
    while i < args.len() {
        let token = &args[i];
        match token.as_str() {
            "--port" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| "--port requires a value".to_string())?;
                port = Some(
                    value
                        .parse::<u16>()
                        .map_err(|_| format!("invalid port: {value}"))?,
                );
            }
            "--db" => {
                i += 1;
                db = Some(PathBuf::from(
                    args.get(i)
                        .ok_or_else(|| "--db requires a value".to_string())?,
                ));
            }
            "--config" => {
                i += 1;
                config = Some(PathBuf::from(
                    args.get(i)
                        .ok_or_else(|| "--config requires a value".to_string())?,
                ));
            }
            x if x.starts_with("--") => return Err(format!("unknown flag: {x}")),
            _ => return Err("serve does not accept positional args".to_string()),
        }
        i += 1;
    }

    Ok(CliCommand::Serve { port, db, config })
}

fn parse_eval(args: Vec<String>) -> Result<CliCommand, String> {
    // The shell splits "2 + 2" into pieces; stitch them back together.
    let expression = args[1..].join(" ");
    if expression.trim().is_empty() {
        return Err("eval requires EXPRESSION".to_string());
    }
    Ok(CliCommand::Eval { expression })
}

fn help_text() -> String {
    [
        "tally CLI",
        "",
        "Commands:",
        "  tally serve [--port 8080] [--db tally.db] [--config tally.json]",
        "  tally eval EXPRESSION",
    ]
    .join("\n")
}

fn resolve_config(
    port: Option<u16>,
    db: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<ServerConfig, String> {
    let mut config = match config_path {
        Some(path) => load_config(&path)?,
        None => {
            let default_path = PathBuf::from("tally.json");
            if default_path.is_file() {
                load_config(&default_path)?
            } else {
                ServerConfig::default()
            }
        }
    };

    if let Some(port) = port {
        config.port = port;
    }
    if let Some(db) = db {
        config.db_path = db;
    }
    Ok(config)
}

fn load_config(path: &Path) -> Result<ServerConfig, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str::<ServerConfig>(&content)
        .map_err(|e| format!("failed to parse {} as ServerConfig: {e}", path.display()))
}

async fn run_server(config: ServerConfig) -> Result<(), String> {
    let store = HistoryStore::open(&config.db_path)
        .map_err(|e| format!("failed to open {}: {e}", config.db_path.display()))?;
    let state = Arc::new(AppState {
        store,
        history_limit: config.history_limit,
    });
    let app = router(state);

    let host = format!("0.0.0.0:{}", config.port);
    println!("[serve] tally API");
    println!("[store] {}", config.db_path.display());
    println!("[serve] http://localhost:{}/api", config.port);

    let listener = tokio::net::TcpListener::bind(&host)
        .await
        .map_err(|e| format!("failed to bind {host}: {e}"))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| format!("server failed: {e}"))?;

    Ok(())
}

fn run_eval(expression: &str) -> Result<(), String> {
    if !tally_core::validate(expression) {
        return Err(format!("invalid expression: {expression}"));
    }
    let result = tally_core::evaluate(expression).map_err(|e| e.to_string())?;
    println!("{result}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(prefix: &str) -> PathBuf {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("{}-{}-{}", prefix, std::process::id(), ts));
        std::fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    fn string_args(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_serve_defaults_to_unset_flags() {
        let command = parse_command(string_args(&["serve"])).expect("serve should parse");
        match command {
            CliCommand::Serve { port, db, config } => {
                assert_eq!(port, None);
                assert_eq!(db, None);
                assert_eq!(config, None);
            }
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_serve_flags() {
        let command = parse_command(string_args(&[
            "serve", "--port", "3000", "--db", "calc.db",
        ]))
        .expect("serve should parse");
        match command {
            CliCommand::Serve { port, db, .. } => {
                assert_eq!(port, Some(3000));
                assert_eq!(db, Some(PathBuf::from("calc.db")));
            }
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_serve_rejects_bad_input() {
        assert!(parse_command(string_args(&["serve", "--port"])).is_err());
        assert!(parse_command(string_args(&["serve", "--port", "abc"])).is_err());
        assert!(parse_command(string_args(&["serve", "--verbose"])).is_err());
        assert!(parse_command(string_args(&["serve", "extra"])).is_err());
    }

    #[test]
    fn test_parse_eval_joins_split_expression() {
        let command =
            parse_command(string_args(&["eval", "2", "+", "2"])).expect("eval should parse");
        match command {
            CliCommand::Eval { expression } => assert_eq!(expression, "2 + 2"),
            other => panic!("expected eval, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_eval_requires_expression() {
        assert!(parse_command(string_args(&["eval"])).is_err());
    }

    #[test]
    fn test_unknown_command_mentions_help() {
        let err = parse_command(string_args(&["frobnicate"])).expect_err("must be rejected");
        assert!(err.contains("unknown command"));
        assert!(err.contains("tally serve"));
    }

    #[test]
    fn test_config_file_with_flag_overrides() {
        let dir = unique_temp_dir("tally-config");
        let path = dir.join("tally.json");
        std::fs::write(&path, r#"{"port": 9999, "db_path": "from-file.db"}"#)
            .expect("failed to write config");

        let config = resolve_config(Some(3000), None, Some(path)).expect("config should resolve");
        assert_eq!(config.port, 3000, "flag must beat the file");
        assert_eq!(config.db_path, PathBuf::from("from-file.db"));
        assert_eq!(
            config.history_limit,
            default_history_limit(),
            "unset fields fall back to defaults"
        );
    }

    #[test]
    fn test_config_file_rejects_garbage() {
        let dir = unique_temp_dir("tally-config");
        let path = dir.join("tally.json");
        std::fs::write(&path, "not json").expect("failed to write config");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_run_eval_accepts_valid_expression() {
        assert!(run_eval("2 + 2").is_ok());
        assert!(run_eval("(1 + 2) * 3").is_ok());
    }

    #[test]
    fn test_run_eval_rejects_invalid_expression() {
        assert!(run_eval("2 ++ 2").is_err());
        assert!(run_eval("10 / 0").is_err());
    }
}
