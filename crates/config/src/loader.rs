use crate::{BlindqlConfig, ConfigError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file names to search for, in order of preference
pub const CONFIG_FILES: &[&str] = &[
    ".blindqlrc.yml",
    ".blindqlrc.yaml",
    ".blindqlrc.json",
    ".blindqlrc.toml",
    ".blindqlrc",
    "blindql.config.yml",
    "blindql.config.yaml",
    "blindql.config.json",
    "blindql.config.toml",
];

/// Find a config file by walking up the directory tree from the given start directory.
/// Returns the path to the config file if found.
#[tracing::instrument(fields(start = %start_dir.display()))]
pub fn find_config(start_dir: &Path) -> Result<Option<PathBuf>> {
    let mut current_dir = start_dir.to_path_buf();
    let mut checked_dirs = 0;

    loop {
        tracing::trace!(dir = %current_dir.display(), "Checking directory for config files");
        for file_name in CONFIG_FILES {
            let config_path = current_dir.join(file_name);
            if config_path.is_file() {
                tracing::info!(path = %config_path.display(), checked_dirs, "Found config file");
                return Ok(Some(config_path));
            }
        }

        checked_dirs += 1;
        if !current_dir.pop() {
            tracing::debug!(checked_dirs, "No config file found");
            break;
        }
    }

    Ok(None)
}

/// Load a config from the specified path.
/// Automatically detects the format based on file extension.
#[tracing::instrument(fields(path = %path.display()))]
pub fn load_config(path: &Path) -> Result<BlindqlConfig> {
    tracing::debug!("Reading config file");
    let contents = fs::read_to_string(path)?;
    let config = load_config_from_str(&contents, path)?;
    tracing::info!(
        endpoint = config.endpoint.as_deref().unwrap_or("<none>"),
        "Config loaded successfully"
    );
    Ok(config)
}

/// Load a config from a string.
/// The path is used for error messages and format detection.
#[tracing::instrument(skip(contents), fields(path = %path.display(), size = contents.len()))]
pub fn load_config_from_str(contents: &str, path: &Path) -> Result<BlindqlConfig> {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("");

    tracing::debug!(extension, file_name, "Detecting config format");

    let config = match extension {
        "yml" | "yaml" => parse_yaml(contents, path)?,
        "json" => parse_json(contents, path)?,
        "toml" => parse_toml(contents, path)?,
        "" if file_name == ".blindqlrc" => {
            // .blindqlrc without extension - try YAML first, then JSON
            tracing::trace!("Trying YAML then JSON for .blindqlrc");
            parse_yaml(contents, path).or_else(|_| parse_json(contents, path))?
        }
        _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    };

    tracing::debug!("Validating config");
    validate_config(&config, path)?;

    Ok(config)
}

fn parse_yaml(contents: &str, path: &Path) -> Result<BlindqlConfig> {
    serde_saphyr::from_str(contents).map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: format!("YAML parse error: {e}"),
    })
}

fn parse_json(contents: &str, path: &Path) -> Result<BlindqlConfig> {
    serde_json::from_str(contents).map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: format!("JSON parse error: {e}"),
    })
}

fn parse_toml(contents: &str, path: &Path) -> Result<BlindqlConfig> {
    toml::from_str(contents).map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: format!("TOML parse error: {e}"),
    })
}

/// Validate the loaded configuration
fn validate_config(config: &BlindqlConfig, path: &Path) -> Result<()> {
    let invalid = |message: String| ConfigError::Invalid {
        path: path.to_path_buf(),
        message,
    };

    if let Some(endpoint) = &config.endpoint {
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(invalid(format!(
                "Endpoint '{endpoint}' must be an http:// or https:// URL"
            )));
        }
    }

    if let Some(wordlist) = &config.wordlist {
        if wordlist.as_os_str().is_empty() {
            return Err(invalid("Wordlist path is empty".to_string()));
        }
    }

    let reconstruction = &config.reconstruction;
    if reconstruction.bucket_size == 0 {
        return Err(invalid("bucketSize must be at least 1".to_string()));
    }
    if reconstruction.nested_bucket_size == Some(0) {
        return Err(invalid("nestedBucketSize must be at least 1".to_string()));
    }
    if reconstruction.concurrency == 0 {
        return Err(invalid("concurrency must be at least 1".to_string()));
    }

    tracing::debug!("Config validation passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(suffix).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_yaml() {
        let yaml = r#"
endpoint: https://api.example.com/graphql
wordlist: words.txt
http:
  headers:
    Authorization: "Bearer token"
  timeout: 60
reconstruction:
  bucketSize: 16
  concurrency: 4
"#;
        let file = write_temp(".yml", yaml);
        let config = load_config(file.path()).unwrap();

        assert_eq!(
            config.endpoint.as_deref(),
            Some("https://api.example.com/graphql")
        );
        assert_eq!(config.wordlist, Some(PathBuf::from("words.txt")));
        assert_eq!(config.http.timeout, Some(60));
        assert_eq!(config.reconstruction.bucket_size, 16);
        assert_eq!(config.reconstruction.concurrency, 4);
        assert_eq!(config.reconstruction.max_depth, 10);
    }

    #[test]
    fn test_load_json() {
        let json = r#"{ "endpoint": "http://localhost:4000/graphql", "http": { "retries": 0 } }"#;
        let file = write_temp(".json", json);
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.http.retries, Some(0));
    }

    #[test]
    fn test_load_toml() {
        let toml = r#"
endpoint = "https://api.example.com/graphql"

[reconstruction]
maxDepth = 4
requestDelayMs = 0
"#;
        let file = write_temp(".toml", toml);
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.reconstruction.max_depth, 4);
        assert_eq!(config.reconstruction.request_delay_ms, 0);
    }

    #[test]
    fn test_unsupported_format() {
        let file = write_temp(".ini", "endpoint=x");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_validation_rejects_non_http_endpoint() {
        let file = write_temp(".yml", "endpoint: ftp://example.com/graphql\n");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_validation_rejects_zero_bucket_size() {
        let file = write_temp(".json", r#"{"reconstruction": {"bucketSize": 0}}"#);
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("bucketSize"));
    }

    #[test]
    fn test_validation_rejects_zero_concurrency() {
        let file = write_temp(".json", r#"{"reconstruction": {"concurrency": 0}}"#);
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_rc_file_without_extension_falls_back_to_json() {
        let path = Path::new(".blindqlrc");
        let config =
            load_config_from_str(r#"{"endpoint": "https://example.com/graphql"}"#, path).unwrap();
        assert_eq!(
            config.endpoint.as_deref(),
            Some("https://example.com/graphql")
        );
    }

    #[test]
    fn test_find_config_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join(".blindqlrc.yml");
        fs::write(&config_path, "endpoint: https://example.com/graphql").unwrap();

        let found = find_config(temp_dir.path()).unwrap();
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join(".blindqlrc.yml");
        fs::write(&config_path, "endpoint: https://example.com/graphql").unwrap();

        let sub_dir = temp_dir.path().join("subdir");
        fs::create_dir(&sub_dir).unwrap();

        let found = find_config(&sub_dir).unwrap();
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_config_file_priority() {
        let temp_dir = tempfile::tempdir().unwrap();

        fs::write(
            temp_dir.path().join(".blindqlrc.yml"),
            "endpoint: https://yml.example.com",
        )
        .unwrap();
        fs::write(
            temp_dir.path().join("blindql.config.json"),
            r#"{"endpoint": "https://json.example.com"}"#,
        )
        .unwrap();

        let found = find_config(temp_dir.path()).unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), ".blindqlrc.yml");
    }
}
