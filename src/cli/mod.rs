//! CLI argument parsing and command dispatch

use crate::config::RunConfig;
use crate::output::{OutputFormat, ResultPrinter};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use wordstorm_core::{
    DelayRange, EngineBuilder, EnumerationMode, FilterRange, FilterRule, FilterSet, RuleKind,
    WordlistRegistry,
};
use wordstorm_transport::HttpTransport;

#[derive(Parser, Debug)]
#[command(name = "wordstorm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum Commands {
    /// Fuzz a target
    Run(RunArgs),
    /// Validate a configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Flags for `run`; each one overrides the configuration file
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Path to a TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Target URL containing FUZZ markers
    #[arg(short, long)]
    pub url: Option<String>,

    /// Word list, one per marker in order (repeatable)
    #[arg(short, long = "wordlist")]
    pub wordlists: Vec<PathBuf>,

    /// HTTP method
    #[arg(short = 'X', long)]
    pub method: Option<String>,

    /// Request body template
    #[arg(short = 'd', long = "data")]
    pub body: Option<String>,

    /// Header template `Name: value` (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Enumeration mode: clusterbomb, pitchfork or singular
    #[arg(short, long)]
    pub mode: Option<EnumerationMode>,

    /// Maximum requests in flight
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Maximum requests per second
    #[arg(short, long)]
    pub rate: Option<u32>,

    /// Pause after each request in ms, `N` or `MIN-MAX`
    #[arg(short = 'p', long)]
    pub delay: Option<DelayRange>,

    /// Per-request timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Proxy URL
    #[arg(short = 'x', long)]
    pub proxy: Option<String>,

    /// Connection timeout in seconds
    #[arg(long)]
    pub connect_timeout: Option<u64>,

    /// Follow redirects
    #[arg(long)]
    pub follow_redirects: bool,

    /// Accept invalid TLS certificates
    #[arg(short = 'k', long)]
    pub insecure: bool,

    /// User agent
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Show only these status codes
    #[arg(long)]
    pub mc: Option<FilterRange>,

    /// Show only these body sizes
    #[arg(long)]
    pub ms: Option<FilterRange>,

    /// Show only these word counts
    #[arg(long)]
    pub mw: Option<FilterRange>,

    /// Show only these line counts
    #[arg(long)]
    pub ml: Option<FilterRange>,

    /// Show only these durations (ms)
    #[arg(long)]
    pub mt: Option<FilterRange>,

    /// Hide these status codes
    ///
    /// The default 200-399 status match still applies unless `--mc` or
    /// `--no-filter` is given, so codes outside it are already hidden.
    #[arg(long)]
    pub fc: Option<FilterRange>,

    /// Hide these body sizes
    #[arg(long)]
    pub fs: Option<FilterRange>,

    /// Hide these word counts
    #[arg(long)]
    pub fw: Option<FilterRange>,

    /// Hide these line counts
    #[arg(long)]
    pub fl: Option<FilterRange>,

    /// Hide these durations (ms)
    #[arg(long)]
    pub ft: Option<FilterRange>,

    /// Drop every configured rule, including the default status match
    #[arg(long)]
    pub no_filter: bool,

    /// Result line format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,
}

impl RunArgs {
    /// Load the configuration file, then apply flags on top
    pub fn resolve(&self) -> Result<RunConfig> {
        let mut config = RunConfig::load(self.config.as_deref())?;
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut RunConfig) {
        let target = &mut config.target;
        if let Some(url) = &self.url {
            target.url = Some(url.clone());
        }
        if !self.wordlists.is_empty() {
            target.wordlists = self.wordlists.clone();
        }
        if let Some(method) = &self.method {
            target.method = Some(method.clone());
        }
        if let Some(body) = &self.body {
            target.body = Some(body.clone());
        }
        if !self.headers.is_empty() {
            target.headers = self.headers.clone();
        }

        let engine = &mut config.engine;
        if let Some(mode) = self.mode {
            engine.mode = mode;
        }
        if let Some(concurrency) = self.concurrency {
            engine.concurrency = concurrency;
        }
        if let Some(rate) = self.rate {
            engine.rate_limit = Some(rate);
        }
        if let Some(delay) = self.delay {
            engine.delay = Some(delay);
        }
        if let Some(secs) = self.timeout {
            engine.timeout_ms = secs.saturating_mul(1_000);
        }
        if self.no_filter {
            engine.filters = FilterSet::disabled();
        }
        for (kind, range) in self.filter_flags() {
            if let Some(range) = range {
                engine.filters.set_rule(FilterRule::from_range(kind, range));
            }
        }

        let mut transport = std::mem::take(&mut config.transport);
        if let Some(proxy) = &self.proxy {
            transport = transport.with_proxy(proxy.as_str());
        }
        if let Some(secs) = self.connect_timeout {
            transport = transport.with_connect_timeout(Duration::from_secs(secs));
        }
        if self.follow_redirects {
            transport = transport.with_follow_redirects(true);
        }
        if self.insecure {
            transport = transport.with_insecure(true);
        }
        if let Some(agent) = &self.user_agent {
            transport = transport.with_user_agent(agent.as_str());
        }
        config.transport = transport;

        if let Some(format) = self.output {
            config.output.format = format;
        }
    }

    fn filter_flags(&self) -> [(RuleKind, Option<FilterRange>); 10] {
        [
            (RuleKind::MatchCode, self.mc),
            (RuleKind::MatchSize, self.ms),
            (RuleKind::MatchWords, self.mw),
            (RuleKind::MatchLines, self.ml),
            (RuleKind::MatchDuration, self.mt),
            (RuleKind::FilterCode, self.fc),
            (RuleKind::FilterSize, self.fs),
            (RuleKind::FilterWords, self.fw),
            (RuleKind::FilterLines, self.fl),
            (RuleKind::FilterDuration, self.ft),
        ]
    }
}

impl Cli {
    /// Dispatch the selected command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Run(args) => run(&args).await,
            Commands::Validate { config } => validate(config),
        }
    }
}

async fn run(args: &RunArgs) -> Result<()> {
    let config = args.resolve()?;
    config.validate()?;

    let template = config.target.template()?;
    let mut registry = WordlistRegistry::new();
    let sources: Vec<_> = config
        .target
        .wordlists
        .iter()
        .map(|path| registry.open_or_fallback(path))
        .collect();

    let transport =
        HttpTransport::new(&config.transport).context("Failed to build HTTP client")?;

    tracing::info!(
        url = template.url().raw(),
        method = template.method(),
        markers = template.marker_count(),
        wordlists = sources.len(),
        timeout = ?Duration::from_millis(config.engine.timeout_ms),
        "Target configured"
    );

    let engine = EngineBuilder::new()
        .config(config.engine.clone())
        .template(template)
        .word_sources(sources)
        .transport(Arc::new(transport))
        .build()?;

    let stdout = std::io::stdout();
    let mut printer = ResultPrinter::new(stdout.lock(), config.output.format);
    let summary = engine.run(|result| printer.print_or_log(result)).await?;

    if summary.errors > 0 {
        tracing::warn!(
            errors = summary.errors,
            completed = summary.completed,
            "Some requests failed"
        );
    }
    Ok(())
}

fn validate(path: PathBuf) -> Result<()> {
    let config = RunConfig::load_from_file(&path)?;
    config.validate()?;

    let mut registry = WordlistRegistry::new();
    for list in &config.target.wordlists {
        registry
            .open(list)
            .with_context(|| format!("word list {:?} is unusable", list))?;
    }

    println!("Configuration {} is valid", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_run(args: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(["wordstorm", "run"].iter().chain(args)).unwrap();
        match cli.command {
            Commands::Run(args) => args,
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_run_flags() {
        let args = parse_run(&[
            "-u",
            "http://t/FUZZ/FUZZ",
            "-w",
            "a.txt",
            "-w",
            "b.txt",
            "-m",
            "pitchfork",
            "-c",
            "8",
            "--rate",
            "20",
            "-p",
            "10-50",
            "-H",
            "Cookie: s=FUZZ",
            "--fc",
            "404",
            "--ms",
            "100-200",
            "-o",
            "json",
        ]);

        assert_eq!(args.wordlists.len(), 2);
        assert_eq!(args.mode, Some(EnumerationMode::Pitchfork));
        assert_eq!(args.delay, Some(DelayRange::between(10, 50)));
        assert_eq!(args.fc, Some(FilterRange { start: 404, end: 404 }));
        assert_eq!(args.output, Some(OutputFormat::Json));
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(Cli::try_parse_from(["wordstorm", "run", "-m", "havoc"]).is_err());
        assert!(Cli::try_parse_from(["wordstorm", "run", "--mc", "abc"]).is_err());
        assert!(Cli::try_parse_from(["wordstorm", "run", "-p", "x-y"]).is_err());
    }

    #[test]
    fn test_apply_overrides_config() {
        let args = parse_run(&[
            "-u",
            "http://t/FUZZ",
            "-w",
            "words.txt",
            "-d",
            "q=FUZZ",
            "-t",
            "3",
            "-x",
            "http://proxy:8080",
            "-k",
        ]);
        let mut config = RunConfig::default();
        args.apply(&mut config);

        assert_eq!(config.target.url.as_deref(), Some("http://t/FUZZ"));
        assert_eq!(config.target.effective_method(), "POST");
        assert_eq!(config.engine.timeout_ms, 3_000);
        assert_eq!(config.transport.proxy.as_deref(), Some("http://proxy:8080"));
        assert!(config.transport.insecure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_filter_flags_replace_same_kind() {
        let args = parse_run(&["--mc", "200-599", "--fs", "0"]);
        let mut config = RunConfig::default();
        args.apply(&mut config);

        let rules = config.engine.filters.rules();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0], FilterRule::new(RuleKind::MatchCode, 200, 599));
        assert_eq!(rules[1], FilterRule::new(RuleKind::FilterSize, 0, 0));
    }

    #[test]
    fn test_apply_transport_flags() {
        let args = parse_run(&[
            "--connect-timeout",
            "4",
            "--user-agent",
            "scanner/1.0",
            "--follow-redirects",
        ]);
        let mut config = RunConfig::default();
        args.apply(&mut config);

        assert_eq!(config.transport.connect_timeout_ms, 4_000);
        assert_eq!(config.transport.user_agent, "scanner/1.0");
        assert!(config.transport.follow_redirects);
        assert!(config.transport.proxy.is_none());
        assert!(!config.transport.insecure);
    }

    #[test]
    fn test_filter_flag_keeps_default_status_match() {
        let args = parse_run(&["--fc", "404"]);
        let mut config = RunConfig::default();
        args.apply(&mut config);

        let rules = config.engine.filters.rules();
        assert_eq!(rules.len(), 2);
        assert!(rules.contains(&FilterRule::new(RuleKind::MatchCode, 200, 399)));
        assert!(rules.contains(&FilterRule::new(RuleKind::FilterCode, 404, 404)));
    }

    #[test]
    fn test_no_filter_clears_defaults() {
        let args = parse_run(&["--no-filter"]);
        let mut config = RunConfig::default();
        args.apply(&mut config);
        assert!(config.engine.filters.is_empty());
    }

    #[test]
    fn test_parse_validate() {
        let cli = Cli::try_parse_from(["wordstorm", "-v", "validate", "--config", "w.toml"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Validate { .. }));
    }
}
