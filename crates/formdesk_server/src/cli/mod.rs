use clap::{Parser, Subcommand};
use formdesk_core::config::{ConfigOverrides, MessageBackend};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the task list and contact form (the default)
    ///
    /// Example: formdesk serve --bind 0.0.0.0:8080
    Serve {
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
        #[arg(long, value_name = "PATH")]
        tasks_path: Option<PathBuf>,
    },
    /// Print stored records
    ///
    /// Example: formdesk list tasks
    /// Example: formdesk list messages --json
    List {
        #[command(subcommand)]
        list: ListCommand,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListCommand {
    /// Tasks in insertion order
    Tasks,
    /// Contact messages, newest first
    Messages,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Bind,
    TasksPath,
    MessageBackend,
    RestUrl,
    RestTable,
    WriteDelayMs,
    LogLevel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let key =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match key.as_str() {
        "bind" => ConfigOverrideTarget::Bind,
        "tasks_path" => ConfigOverrideTarget::TasksPath,
        "message_backend" | "backend" => ConfigOverrideTarget::MessageBackend,
        "rest_url" => ConfigOverrideTarget::RestUrl,
        "rest_table" => ConfigOverrideTarget::RestTable,
        "write_delay_ms" => ConfigOverrideTarget::WriteDelayMs,
        "log_level" => ConfigOverrideTarget::LogLevel,
        "rest_api_key" => {
            return Err("rest.api_key cannot be set on the command line".to_string());
        }
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

/// Folds every `--config-override` into one set of overrides; later entries win.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry)?;
        match parsed.target {
            ConfigOverrideTarget::Bind => overrides.bind = Some(parsed.value),
            ConfigOverrideTarget::TasksPath => {
                overrides.tasks_path = Some(PathBuf::from(parsed.value))
            }
            ConfigOverrideTarget::MessageBackend => {
                let backend = MessageBackend::parse(&parsed.value)
                    .ok_or_else(|| format!("unknown message backend '{}'", parsed.value))?;
                overrides.message_backend = Some(backend);
            }
            ConfigOverrideTarget::RestUrl => overrides.rest_url = Some(parsed.value),
            ConfigOverrideTarget::RestTable => overrides.rest_table = Some(parsed.value),
            ConfigOverrideTarget::WriteDelayMs => {
                let delay = parsed
                    .value
                    .parse::<u64>()
                    .map_err(|_| format!("write_delay_ms must be a number, got '{}'", parsed.value))?;
                overrides.write_delay_ms = Some(delay);
            }
            ConfigOverrideTarget::LogLevel => overrides.log_level = Some(parsed.value),
        }
    }
    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Cli, Command, ConfigOverrideTarget, ListCommand, collect_config_overrides,
        parse_config_override,
    };
    use clap::Parser;
    use formdesk_core::config::MessageBackend;
    use std::path::PathBuf;

    #[test]
    fn parse_config_override_canonicalizes_field_names() {
        let parsed = parse_config_override(" Rest.URL = https://example.supabase.co ").unwrap();

        assert_eq!(parsed.target, ConfigOverrideTarget::RestUrl);
        assert_eq!(parsed.value, "https://example.supabase.co");
    }

    #[test]
    fn parse_config_override_rejects_unknown_fields() {
        let err = parse_config_override("theme=noir").unwrap_err();
        assert!(err.contains("unknown config field"));
    }

    #[test]
    fn parse_config_override_rejects_missing_equals() {
        let err = parse_config_override("bind").unwrap_err();
        assert!(err.contains("KEY=VALUE"));
    }

    #[test]
    fn parse_config_override_refuses_api_key() {
        let err = parse_config_override("rest.api_key=secret").unwrap_err();
        assert!(err.contains("api_key"));
    }

    #[test]
    fn collect_config_overrides_later_entries_win() {
        let raw = vec![
            "bind=127.0.0.1:4000".to_string(),
            "backend=supabase".to_string(),
            "write-delay-ms=250".to_string(),
            "bind=127.0.0.1:5000".to_string(),
            "tasks_path=/tmp/tasks.json".to_string(),
        ];

        let overrides = collect_config_overrides(&raw).unwrap();

        assert_eq!(overrides.bind.as_deref(), Some("127.0.0.1:5000"));
        assert_eq!(overrides.message_backend, Some(MessageBackend::Rest));
        assert_eq!(overrides.write_delay_ms, Some(250));
        assert_eq!(overrides.tasks_path, Some(PathBuf::from("/tmp/tasks.json")));
    }

    #[test]
    fn collect_config_overrides_validates_values() {
        let err = collect_config_overrides(&["write_delay_ms=soon".to_string()]).unwrap_err();
        assert!(err.contains("must be a number"));

        let err = collect_config_overrides(&["backend=sqlite".to_string()]).unwrap_err();
        assert!(err.contains("sqlite"));
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["formdesk"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn list_subcommand_parses() {
        let cli = Cli::try_parse_from(["formdesk", "list", "messages", "--json"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Some(Command::List { list }) => assert_eq!(list, ListCommand::Messages),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
