//! CLI command definitions

use clap::{Parser, ValueEnum};
use serde_json::json;
use std::path::PathBuf;

/// Output format for result envelopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One compact JSON envelope per line
    Json,
    /// Human-readable, colored output
    Pretty,
}

/// CLI arguments for tool-dispatch
#[derive(Parser, Debug)]
#[command(name = "tool-dispatch")]
#[command(author, version, about = "Resolve model tool calls against the local machine")]
#[command(long_about = r#"
tool-dispatch takes tool calls in the {"function": {"name", "arguments"}} wire
format, resolves each one to a concrete action (file operation, code
execution, calculator, system introspection, shell command or HTTP request)
and prints a result envelope.

With no CALL_JSON and no --name, one call per line is read from stdin and
the calls are resolved in order.

Configuration files are loaded from (in priority order):
1. TOOL_DISPATCH_* environment variables (__ separates sections)
2. --config <path>     Explicit config file
3. ./dispatch.toml     Project-level config
4. ~/.config/tool-dispatch/config.toml   Global config

Example:
  tool-dispatch '{"function": {"name": "calculator", "arguments": {"expression": "2 + 2 * 3"}}}'
  tool-dispatch --name run_command --args '{"command": "ls | head -3"}'
  cat calls.jsonl | tool-dispatch -o json
"#)]
pub struct Cli {
    /// A single tool call in wire format
    #[arg(value_name = "CALL_JSON", conflicts_with = "name")]
    pub call_json: Option<String>,

    /// Tool name (builds a call together with --args)
    #[arg(long, value_name = "TOOL")]
    pub name: Option<String>,

    /// Tool arguments as a JSON object string
    #[arg(long, value_name = "JSON", requires = "name")]
    pub args: Option<String>,

    /// Workspace directory file and process operations are confined to
    #[arg(short, long, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// The call given on the command line, in wire format.
    ///
    /// `None` means calls come from stdin. `--args` is passed through as a
    /// JSON-encoded string so the dispatcher decodes it like any model
    /// output.
    pub fn single_call(&self) -> Option<String> {
        if let Some(raw) = &self.call_json {
            return Some(raw.clone());
        }
        self.name.as_ref().map(|name| {
            json!({
                "function": {
                    "name": name,
                    "arguments": self.args.clone().unwrap_or_else(|| "{}".to_string()),
                }
            })
            .to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["tool-dispatch"]).unwrap();
        assert_eq!(cli.output, OutputFormat::Pretty);
        assert_eq!(cli.verbose, 0);
        assert!(cli.single_call().is_none());
    }

    #[test]
    fn test_positional_call() {
        let raw = r#"{"function": {"name": "calc", "arguments": {}}}"#;
        let cli = Cli::try_parse_from(["tool-dispatch", "-o", "json", raw]).unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.single_call().as_deref(), Some(raw));
    }

    #[test]
    fn test_name_and_args_build_wire_call() {
        let cli = Cli::try_parse_from([
            "tool-dispatch",
            "--name",
            "calculator",
            "--args",
            r#"{"expression": "1+1"}"#,
        ])
        .unwrap();
        let wire: serde_json::Value = serde_json::from_str(&cli.single_call().unwrap()).unwrap();
        assert_eq!(wire["function"]["name"], "calculator");
        assert_eq!(wire["function"]["arguments"], r#"{"expression": "1+1"}"#);
    }

    #[test]
    fn test_args_require_name() {
        assert!(Cli::try_parse_from(["tool-dispatch", "--args", "{}"]).is_err());
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::try_parse_from(["tool-dispatch", "-vvv", "-q"]).unwrap();
        assert_eq!(cli.verbose, 3);
        assert!(cli.quiet);
    }
}
