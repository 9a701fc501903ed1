//! Builder pattern for Engine construction

use crate::config::{EngineConfig, EnumerationMode};
use crate::enumerator::build_enumerator;
use crate::error::{EngineError, EngineResult};
use crate::request::RequestTemplate;
use crate::traits::{Enumerator, Transport};
use crate::wordlist::WordSource;

use super::executor::Engine;

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// Builder for creating Engine instances
///
/// # Example
/// ```ignore
/// let engine = EngineBuilder::new()
///     .config(EngineConfig::new(40))
///     .template(RequestTemplate::new("http://target/FUZZ"))
///     .word_source(registry.open_or_fallback("words.txt"))
///     .transport(Arc::new(transport))
///     .build()?;
///
/// let summary = engine.run(|result| println!("{}", result.url)).await?;
/// ```
#[derive(Default)]
pub struct EngineBuilder {
    config: Option<EngineConfig>,
    template: Option<RequestTemplate>,
    sources: Vec<WordSource>,
    enumerator: Option<Box<dyn Enumerator>>,
    transport: Option<Arc<dyn Transport>>,
    seed: Option<u64>,
}

impl EngineBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine configuration (defaults to [`EngineConfig::default`])
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the request template
    pub fn template(mut self, template: RequestTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Add the word source for the next marker position
    pub fn word_source(mut self, source: WordSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Add word sources in marker order
    pub fn word_sources(mut self, sources: impl IntoIterator<Item = WordSource>) -> Self {
        self.sources.extend(sources);
        self
    }

    /// Use a prepared enumerator instead of building one from word sources
    pub fn enumerator(mut self, enumerator: Box<dyn Enumerator>) -> Self {
        self.enumerator = Some(enumerator);
        self
    }

    /// Set the transport
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Seed the delay jitter generator
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the Engine
    ///
    /// # Errors
    /// Returns an error if a required field is missing, the configuration
    /// fails validation, no word source was given, or the number of word
    /// sources does not fit the template's markers.
    pub fn build(self) -> EngineResult<Engine> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| EngineError::config(e.to_string()))?;

        let template = self
            .template
            .ok_or_else(|| EngineError::missing_config("template"))?;
        let transport = self
            .transport
            .ok_or_else(|| EngineError::missing_config("transport"))?;

        let enumerator = match self.enumerator {
            Some(enumerator) => enumerator,
            None => {
                let sources = fit_sources(config.mode, template.marker_count(), self.sources)?;
                build_enumerator(config.mode, sources)?
            }
        };

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Engine::new(config, template, enumerator, transport, rng))
    }
}

/// Line word sources up with marker positions
///
/// A single source feeding several markers is repeated once per marker;
/// the copies share one buffer and advance independently.
fn fit_sources(
    mode: EnumerationMode,
    markers: usize,
    mut sources: Vec<WordSource>,
) -> EngineResult<Vec<WordSource>> {
    if sources.is_empty() {
        return Err(EngineError::no_word_sources());
    }
    if mode == EnumerationMode::Singular || markers == 0 {
        return Ok(sources);
    }

    if sources.len() == 1 && markers > 1 {
        let first = sources[0].clone();
        sources.resize(markers, first);
        tracing::debug!(
            markers,
            origin = sources[0].origin(),
            "Reusing single word list for every marker"
        );
        return Ok(sources);
    }

    if sources.len() != markers {
        return Err(EngineError::config(format!(
            "{} mode needs one word list per marker: template has {} markers, got {} word lists",
            mode,
            markers,
            sources.len()
        )));
    }

    Ok(sources)
}
