//! Run configuration file

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use wordstorm_core::{EngineConfig, RequestTemplate};
use wordstorm_transport::HttpTransportConfig;

use crate::output::OutputFormat;

/// What to fuzz
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    /// URL template
    pub url: Option<String>,

    /// HTTP method; `GET`, or `POST` when a body is set
    pub method: Option<String>,

    /// Body template
    pub body: Option<String>,

    /// `Name: value` header templates
    pub headers: Vec<String>,

    /// One word list per marker, in marker order
    pub wordlists: Vec<PathBuf>,
}

impl TargetConfig {
    /// Method that will be sent
    pub fn effective_method(&self) -> &str {
        match (&self.method, &self.body) {
            (Some(method), _) => method.as_str(),
            (None, Some(_)) => "POST",
            (None, None) => "GET",
        }
    }

    /// Build the request template
    pub fn template(&self) -> Result<RequestTemplate> {
        let url = self
            .url
            .as_deref()
            .context("a target URL is required (--url or [target] url)")?;

        let mut template =
            RequestTemplate::new(url).with_method(self.effective_method().to_uppercase());
        if let Some(body) = &self.body {
            template = template.with_body(body.as_str());
        }
        for header in &self.headers {
            if !header.contains(':') {
                anyhow::bail!("header {:?} is not in `Name: value` form", header);
            }
            template = template.with_header(header.as_str());
        }
        Ok(template)
    }
}

/// Where and how results are written
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Line format on stdout
    pub format: OutputFormat,
}

/// Everything a run needs, as loaded from TOML and overlaid by flags
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Target templates and word lists
    pub target: TargetConfig,

    /// Engine settings
    pub engine: EngineConfig,

    /// HTTP client settings
    pub transport: HttpTransportConfig,

    /// Output settings
    pub output: OutputConfig,
}

impl RunConfig {
    /// Load a TOML configuration file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {:?}", path))?;
        let config: RunConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML from config file {:?}", path))?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load `path` if given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Check everything that can be checked before the run starts
    pub fn validate(&self) -> Result<()> {
        self.engine
            .validate()
            .context("invalid [engine] configuration")?;
        self.target.template()?;
        if self.target.wordlists.is_empty() {
            anyhow::bail!("at least one word list is required (-w or [target] wordlists)");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wordstorm_core::{EnumerationMode, RuleKind};

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = config_file(
            r#"
[target]
url = "https://target/FUZZ"
headers = ["X-Api: FUZZ"]
wordlists = ["paths.txt", "keys.txt"]

[engine]
mode = "pitchfork"
concurrency = 12
rate_limit = 50
delay = { min_ms = 5, max_ms = 25 }
filters = [{ kind = "filter_code", start = 404, end = 404 }]

[transport]
proxy = "http://127.0.0.1:8080"
follow_redirects = true

[output]
format = "json"
"#,
        );

        let config = RunConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.target.wordlists.len(), 2);
        assert_eq!(config.engine.mode, EnumerationMode::Pitchfork);
        assert_eq!(config.engine.concurrency, 12);
        assert_eq!(config.engine.rate_limit, Some(50));
        assert_eq!(config.engine.filters.rules()[0].kind, RuleKind::FilterCode);
        assert_eq!(config.engine.timeout_ms, 10_000);
        assert!(config.transport.follow_redirects);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let file = config_file("[target]\nurll = \"http://t/FUZZ\"\n");
        assert!(RunConfig::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(RunConfig::load_from_file(Path::new("/nonexistent/wordstorm.toml")).is_err());
        assert!(RunConfig::load(None).is_ok());
    }

    #[test]
    fn test_method_defaults() {
        let mut target = TargetConfig {
            url: Some("http://t/FUZZ".into()),
            ..Default::default()
        };
        assert_eq!(target.effective_method(), "GET");

        target.body = Some("q=FUZZ".into());
        assert_eq!(target.effective_method(), "POST");
        assert_eq!(target.template().unwrap().method(), "POST");

        target.method = Some("put".into());
        assert_eq!(target.template().unwrap().method(), "PUT");
    }

    #[test]
    fn test_validate_requires_url_and_wordlists() {
        let mut config = RunConfig::default();
        assert!(config.validate().is_err());

        config.target.url = Some("http://t/FUZZ".into());
        assert!(config.validate().is_err());

        config.target.wordlists.push("words.txt".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_header_rejected() {
        let target = TargetConfig {
            url: Some("http://t/FUZZ".into()),
            headers: vec!["no separator".into()],
            ..Default::default()
        };
        assert!(target.template().is_err());
    }
}
