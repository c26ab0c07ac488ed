//! The `reconstruct` command.

use crate::{ExitCode, OutputOptions};
use anyhow::{Context, Result};
use blindql_config::{find_config, load_config, BlindqlConfig};
use blindql_probe::{ProbeSettings, Reconstructor, Wordlist};
use blindql_transport::HttpTransport;
use blindql_types::Schema;
use clap::Args;
use colored::Colorize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Default timeout in seconds for a single probe request.
const DEFAULT_TIMEOUT: u64 = 30;

/// Default connection timeout in seconds.
const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

/// Default number of retries after a failed request.
const DEFAULT_RETRIES: u32 = 1;

#[derive(Debug, Default, Args)]
pub struct ReconstructArgs {
    /// GraphQL endpoint URL (optional if the config file sets `endpoint`)
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Newline-delimited file of candidate field names
    #[arg(short, long, value_name = "FILE")]
    pub wordlist: Option<PathBuf>,

    /// HTTP headers to include in every request (can be specified multiple times)
    /// Format: "Header-Name: Header-Value"
    /// These are merged with headers from the config file (CLI takes precedence)
    #[arg(long = "header", short = 'H', value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Maximum number of probe requests in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Candidate names per root-level probe query
    #[arg(long)]
    pub bucket_size: Option<usize>,

    /// Maximum exploration depth below the root types
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Minimum spacing between requests, in milliseconds
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Request timeout in seconds (overrides config file)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Number of retries after a failed request (overrides config file)
    #[arg(long)]
    pub retries: Option<u32>,

    /// Output file path (writes to stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Everything a run needs, after merging CLI flags over the config file.
#[derive(Debug)]
struct RunSettings {
    endpoint: String,
    wordlist: Option<PathBuf>,
    headers: Vec<(String, String)>,
    timeout: u64,
    connect_timeout: u64,
    retries: u32,
    user_agent: Option<String>,
    probe: ProbeSettings,
}

impl RunSettings {
    fn transport(&self) -> HttpTransport {
        let mut transport = HttpTransport::new()
            .with_timeout(Duration::from_secs(self.timeout))
            .with_connect_timeout(Duration::from_secs(self.connect_timeout))
            .with_retries(self.retries)
            .with_headers(self.headers.iter().cloned());
        if let Some(user_agent) = &self.user_agent {
            transport = transport.with_user_agent(user_agent);
        }
        transport
    }
}

/// A loaded config file and the directory relative paths resolve against.
struct LoadedConfig {
    config: BlindqlConfig,
    base_dir: PathBuf,
}

/// Load the config file named by `--config`, or the nearest one found by
/// walking up from the current directory. No config file is not an error.
fn load_from_config(config_path: Option<PathBuf>) -> Result<Option<LoadedConfig>> {
    let config_path = match config_path {
        Some(path) => path,
        None => {
            let current_dir = std::env::current_dir()?;
            match find_config(&current_dir).context("Failed to search for config")? {
                Some(path) => path,
                None => return Ok(None),
            }
        }
    };

    let config = load_config(&config_path).context("Failed to load config")?;
    let base_dir = config_path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Ok(Some(LoadedConfig { config, base_dir }))
}

/// Parses a header string in "Name: Value" format.
fn parse_header(header: &str) -> Result<(String, String)> {
    let Some((name, value)) = header.split_once(':') else {
        anyhow::bail!("Invalid header format: '{header}'. Expected 'Header-Name: Header-Value'");
    };
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Header name cannot be empty");
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn require_positive(value: Option<usize>, flag: &str) -> Result<Option<usize>> {
    if value == Some(0) {
        anyhow::bail!("{flag} must be at least 1");
    }
    Ok(value)
}

/// Resolve run settings: CLI flags over config values over defaults.
fn resolve_settings(
    args: &ReconstructArgs,
    loaded: Option<&LoadedConfig>,
) -> Result<RunSettings> {
    let config = loaded.map(|l| &l.config);

    let endpoint = args
        .url
        .clone()
        .or_else(|| config.and_then(|c| c.endpoint.clone()))
        .context(
            "No endpoint given. Pass a URL argument or set `endpoint` in a blindql config file.",
        )?;
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        anyhow::bail!("Endpoint '{endpoint}' must be an http:// or https:// URL");
    }

    let wordlist = args.wordlist.clone().or_else(|| {
        let loaded = loaded?;
        let path = loaded.config.wordlist.as_ref()?;
        Some(if path.is_relative() {
            loaded.base_dir.join(path)
        } else {
            path.clone()
        })
    });

    let http = config.map(|c| c.http.clone()).unwrap_or_default();

    let mut headers: Vec<(String, String)> = http.headers.unwrap_or_default().into_iter().collect();
    headers.sort();
    let cli_headers = args
        .headers
        .iter()
        .map(|h| parse_header(h))
        .collect::<Result<Vec<_>>>()
        .context("Failed to parse headers")?;
    for (name, value) in cli_headers {
        headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        headers.push((name, value));
    }

    let mut tuning = config.map(|c| c.reconstruction.clone()).unwrap_or_default();
    if let Some(size) = require_positive(args.bucket_size, "--bucket-size")? {
        tuning.bucket_size = size;
    }
    if let Some(concurrency) = require_positive(args.concurrency, "--concurrency")? {
        tuning.concurrency = concurrency;
    }
    if let Some(depth) = args.max_depth {
        tuning.max_depth = depth;
    }
    if let Some(delay) = args.delay_ms {
        tuning.request_delay_ms = delay;
    }

    let probe = ProbeSettings::default()
        .with_bucket_size(tuning.bucket_size)
        .with_nested_bucket_size(tuning.effective_nested_bucket_size())
        .with_concurrency(tuning.concurrency)
        .with_max_depth(tuning.max_depth)
        .with_request_delay(Duration::from_millis(tuning.request_delay_ms))
        .with_shutdown_grace(Duration::from_secs(tuning.shutdown_grace_secs));

    Ok(RunSettings {
        endpoint,
        wordlist,
        headers,
        timeout: args
            .timeout
            .unwrap_or(http.timeout.unwrap_or(DEFAULT_TIMEOUT)),
        connect_timeout: http.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
        retries: args
            .retries
            .unwrap_or(http.retries.unwrap_or(DEFAULT_RETRIES)),
        user_agent: http.user_agent,
        probe,
    })
}

/// Writes `content` to `path`, or to stdout when no path is given.
fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    if let Some(path) = path {
        let mut content = content.to_string();
        if !content.ends_with('\n') {
            content.push('\n');
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write to {}", path.display()))?;
    } else {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(content.as_bytes())
            .context("Failed to write to stdout")?;
        if !content.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }
    Ok(())
}

fn print_summary(
    schema: &Schema,
    reconstructor: &Reconstructor,
    output: Option<&Path>,
    elapsed: Duration,
) {
    let stats = reconstructor.stats();
    let unexplored = schema.unexplored_types().len();

    if schema.partial {
        eprintln!(
            "{} Partial schema: {} types, {} fields",
            "⚠".yellow(),
            schema.type_count(),
            schema.total_field_count()
        );
    } else {
        eprintln!(
            "{} Reconstructed {} types, {} fields",
            "✓".green(),
            schema.type_count(),
            schema.total_field_count()
        );
    }
    if let Some(path) = output {
        eprintln!("  {} {}", "→".dimmed(), path.display().to_string().cyan());
    }
    eprintln!(
        "  {} {} of {} probes productive",
        "·".dimmed(),
        stats.successful,
        stats.total
    );
    if unexplored > 0 {
        eprintln!(
            "  {} {unexplored} types referenced but not explored",
            "·".dimmed()
        );
    }
    eprintln!("  {} {:.2}s", "⏱".dimmed(), elapsed.as_secs_f64());
}

/// Run the reconstruct command.
#[tracing::instrument(skip_all)]
pub async fn run(
    config_path: Option<PathBuf>,
    args: &ReconstructArgs,
    output_opts: OutputOptions,
) -> Result<()> {
    let start_time = std::time::Instant::now();

    let settings = match load_from_config(config_path)
        .and_then(|loaded| resolve_settings(args, loaded.as_ref()))
    {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {e:#}", "✗".red().bold());
            ExitCode::ConfigError.exit();
        }
    };
    tracing::info!(endpoint = %settings.endpoint, "Starting reconstruction");

    let wordlist = Wordlist::load_or_default(settings.wordlist.as_deref());

    let spinner = output_opts
        .show_progress
        .then(|| crate::progress::spinner(&format!("Probing {}...", settings.endpoint)));

    let mut reconstructor = Reconstructor::new(settings.transport())
        .with_settings(settings.probe.clone())
        .with_wordlist(wordlist);
    if let Some(pb) = &spinner {
        reconstructor = reconstructor.with_progress(crate::progress::reporter(pb));
    }
    let reconstructor = Arc::new(reconstructor);

    let mut run = reconstructor.spawn(settings.endpoint.clone());
    let schema = tokio::select! {
        result = &mut run => result.context("Reconstruction task failed")?,
        Ok(()) = tokio::signal::ctrl_c() => {
            if let Some(pb) = &spinner {
                pb.set_message("Cancelling, keeping what was found...");
            }
            reconstructor.cancel();
            run.await.context("Reconstruction task failed")?
        }
    };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let content = serde_json::to_string_pretty(&schema).context("Failed to serialize schema")?;
    if let Err(e) = write_output(args.output.as_deref(), &content) {
        eprintln!("{} {e:#}", "✗".red().bold());
        ExitCode::IoError.exit();
    }

    if output_opts.show_info {
        print_summary(
            &schema,
            &reconstructor,
            args.output.as_deref(),
            start_time.elapsed(),
        );
    }

    if schema.partial {
        ExitCode::SchemaError.exit();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(url: Option<&str>) -> ReconstructArgs {
        ReconstructArgs {
            url: url.map(str::to_string),
            ..ReconstructArgs::default()
        }
    }

    fn loaded(config: BlindqlConfig) -> LoadedConfig {
        LoadedConfig {
            config,
            base_dir: PathBuf::from("/work/project"),
        }
    }

    #[test]
    fn test_parse_header_valid() {
        let (name, value) = parse_header("Authorization: Bearer token").unwrap();
        assert_eq!(name, "Authorization");
        assert_eq!(value, "Bearer token");
    }

    #[test]
    fn test_parse_header_keeps_colons_in_value() {
        let (name, value) = parse_header("X-Forwarded-Host: api.example.com:8443").unwrap();
        assert_eq!(name, "X-Forwarded-Host");
        assert_eq!(value, "api.example.com:8443");
    }

    #[test]
    fn test_parse_header_rejects_malformed() {
        assert!(parse_header("InvalidHeader").is_err());
        assert!(parse_header("  : value").is_err());
    }

    #[test]
    fn test_resolve_settings_defaults() {
        let settings = resolve_settings(&args(Some("https://api.example.com/graphql")), None)
            .unwrap();

        assert_eq!(settings.endpoint, "https://api.example.com/graphql");
        assert_eq!(settings.timeout, DEFAULT_TIMEOUT);
        assert_eq!(settings.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(settings.retries, DEFAULT_RETRIES);
        assert_eq!(settings.probe, ProbeSettings::default());
        assert!(settings.wordlist.is_none());
        assert!(settings.headers.is_empty());
    }

    #[test]
    fn test_resolve_settings_requires_endpoint() {
        let err = resolve_settings(&args(None), None).unwrap_err();
        assert!(err.to_string().contains("No endpoint given"));
    }

    #[test]
    fn test_resolve_settings_rejects_non_http_url() {
        let err = resolve_settings(&args(Some("ftp://example.com")), None).unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn test_resolve_settings_endpoint_from_config() {
        let config = loaded(BlindqlConfig {
            endpoint: Some("https://config.example.com/graphql".to_string()),
            ..BlindqlConfig::default()
        });
        let settings = resolve_settings(&args(None), Some(&config)).unwrap();
        assert_eq!(settings.endpoint, "https://config.example.com/graphql");

        let settings =
            resolve_settings(&args(Some("http://localhost:4000/graphql")), Some(&config)).unwrap();
        assert_eq!(settings.endpoint, "http://localhost:4000/graphql");
    }

    #[test]
    fn test_cli_flags_override_config() {
        let mut config = BlindqlConfig {
            endpoint: Some("https://api.example.com/graphql".to_string()),
            ..BlindqlConfig::default()
        };
        config.http.timeout = Some(5);
        config.http.retries = Some(4);
        config.reconstruction.concurrency = 2;
        config.reconstruction.max_depth = 3;
        config.reconstruction.request_delay_ms = 250;

        let cli = ReconstructArgs {
            timeout: Some(60),
            concurrency: Some(16),
            bucket_size: Some(20),
            ..ReconstructArgs::default()
        };
        let settings = resolve_settings(&cli, Some(&loaded(config))).unwrap();

        assert_eq!(settings.timeout, 60);
        assert_eq!(settings.retries, 4);
        assert_eq!(settings.probe.concurrency, 16);
        assert_eq!(settings.probe.bucket_size, 20);
        assert_eq!(settings.probe.nested_bucket_size, 10);
        assert_eq!(settings.probe.max_depth, 3);
        assert_eq!(settings.probe.request_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_zero_flags_rejected() {
        let cli = ReconstructArgs {
            url: Some("https://api.example.com/graphql".to_string()),
            bucket_size: Some(0),
            ..ReconstructArgs::default()
        };
        let err = resolve_settings(&cli, None).unwrap_err();
        assert!(err.to_string().contains("--bucket-size"));

        let cli = ReconstructArgs {
            url: Some("https://api.example.com/graphql".to_string()),
            concurrency: Some(0),
            ..ReconstructArgs::default()
        };
        assert!(resolve_settings(&cli, None).is_err());
    }

    #[test]
    fn test_cli_headers_replace_config_headers_case_insensitively() {
        let mut config = BlindqlConfig::default();
        config.http.headers = Some(
            [
                ("Authorization".to_string(), "Bearer old".to_string()),
                ("X-Tenant".to_string(), "acme".to_string()),
            ]
            .into_iter()
            .collect(),
        );
        let cli = ReconstructArgs {
            url: Some("https://api.example.com/graphql".to_string()),
            headers: vec!["authorization: Bearer new".to_string()],
            ..ReconstructArgs::default()
        };

        let settings = resolve_settings(&cli, Some(&loaded(config))).unwrap();
        assert_eq!(
            settings.headers,
            vec![
                ("X-Tenant".to_string(), "acme".to_string()),
                ("authorization".to_string(), "Bearer new".to_string()),
            ]
        );
    }

    #[test]
    fn test_config_wordlist_resolves_against_config_dir() {
        let config = BlindqlConfig {
            endpoint: Some("https://api.example.com/graphql".to_string()),
            wordlist: Some(PathBuf::from("words.txt")),
            ..BlindqlConfig::default()
        };
        let settings = resolve_settings(&args(None), Some(&loaded(config))).unwrap();
        assert_eq!(
            settings.wordlist,
            Some(PathBuf::from("/work/project/words.txt"))
        );

        let cli = ReconstructArgs {
            wordlist: Some(PathBuf::from("mine.txt")),
            ..ReconstructArgs::default()
        };
        let config = BlindqlConfig {
            endpoint: Some("https://api.example.com/graphql".to_string()),
            wordlist: Some(PathBuf::from("words.txt")),
            ..BlindqlConfig::default()
        };
        let settings = resolve_settings(&cli, Some(&loaded(config))).unwrap();
        assert_eq!(settings.wordlist, Some(PathBuf::from("mine.txt")));
    }

    #[test]
    fn test_load_from_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".blindqlrc.yml");
        std::fs::write(
            &path,
            "endpoint: https://api.example.com/graphql\nreconstruction:\n  maxDepth: 2\n",
        )
        .unwrap();

        let loaded = load_from_config(Some(path)).unwrap().unwrap();
        assert_eq!(loaded.base_dir, dir.path());
        assert_eq!(loaded.config.reconstruction.max_depth, 2);
    }

    #[test]
    fn test_write_output_to_file_adds_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        write_output(Some(&path), "{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
    }

    #[test]
    fn test_write_output_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("schema.json");
        let err = write_output(Some(&path), "{}").unwrap_err();
        assert!(err.to_string().contains("Failed to write"));
    }
}
