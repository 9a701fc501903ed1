//! Enumeration strategies over word sources
//!
//! Each strategy owns its cursors and hands out one tuple per admitted
//! request. Tuples are produced in a deterministic order and the
//! strategies never block.

use crate::config::EnumerationMode;
use crate::error::{EngineError, EngineResult};
use crate::traits::Enumerator;
use crate::wordlist::WordSource;

fn copy_current(sources: &[WordSource], dest: &mut Vec<String>) {
    dest.clear();
    dest.extend(sources.iter().map(|s| s.current().to_owned()));
}

/// Cartesian product of all sources, rightmost advancing fastest
#[derive(Debug, Clone)]
pub struct Clusterbomb {
    sources: Vec<WordSource>,
    total: u64,
    exhausted: bool,
}

impl Clusterbomb {
    /// Odometer over `sources`, starting at the first word of each
    pub fn new(sources: Vec<WordSource>) -> Self {
        let total = sources
            .iter()
            .fold(1u64, |acc, s| acc.saturating_mul(s.total() as u64));
        Self {
            exhausted: sources.is_empty(),
            sources,
            total,
        }
    }

    fn step(&mut self) {
        for source in self.sources.iter_mut().rev() {
            let carry = source.at_last();
            source.advance();
            if !carry {
                return;
            }
        }
        self.exhausted = true;
    }
}

impl Enumerator for Clusterbomb {
    fn mode(&self) -> EnumerationMode {
        EnumerationMode::Clusterbomb
    }

    fn total_count(&self) -> u64 {
        if self.sources.is_empty() {
            0
        } else {
            self.total
        }
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn next_into(&mut self, dest: &mut Vec<String>) -> bool {
        if self.exhausted {
            return false;
        }
        copy_current(&self.sources, dest);
        self.step();
        true
    }
}

/// All sources advance together; shorter ones wrap around
#[derive(Debug, Clone)]
pub struct Pitchfork {
    sources: Vec<WordSource>,
    longest: usize,
    exhausted: bool,
}

impl Pitchfork {
    /// Parallel iteration over `sources`
    pub fn new(sources: Vec<WordSource>) -> Self {
        let mut longest = 0;
        for (i, source) in sources.iter().enumerate() {
            if source.total() > sources[longest].total() {
                longest = i;
            }
        }
        Self {
            exhausted: sources.is_empty(),
            sources,
            longest,
        }
    }
}

impl Enumerator for Pitchfork {
    fn mode(&self) -> EnumerationMode {
        EnumerationMode::Pitchfork
    }

    fn total_count(&self) -> u64 {
        self.sources
            .get(self.longest)
            .map_or(0, |s| s.total() as u64)
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn next_into(&mut self, dest: &mut Vec<String>) -> bool {
        if self.exhausted {
            return false;
        }
        copy_current(&self.sources, dest);
        for source in &mut self.sources {
            source.advance();
        }
        if self.sources[self.longest].at_first() {
            self.exhausted = true;
        }
        true
    }
}

/// One source whose current word feeds every marker
#[derive(Debug, Clone)]
pub struct Singular {
    source: WordSource,
    exhausted: bool,
}

impl Singular {
    /// Walk `source` once
    pub fn new(source: WordSource) -> Self {
        Self {
            source,
            exhausted: false,
        }
    }
}

impl Enumerator for Singular {
    fn mode(&self) -> EnumerationMode {
        EnumerationMode::Singular
    }

    fn total_count(&self) -> u64 {
        self.source.total() as u64
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn next_into(&mut self, dest: &mut Vec<String>) -> bool {
        if self.exhausted {
            return false;
        }
        dest.clear();
        dest.push(self.source.current().to_owned());
        if self.source.at_last() {
            self.exhausted = true;
        }
        self.source.advance();
        true
    }
}

/// Build the strategy for `mode`
///
/// Singular uses only the first source; the rest are dropped.
pub fn build_enumerator(
    mode: EnumerationMode,
    sources: Vec<WordSource>,
) -> EngineResult<Box<dyn Enumerator>> {
    if sources.is_empty() {
        return Err(EngineError::no_word_sources());
    }

    Ok(match mode {
        EnumerationMode::Clusterbomb => Box::new(Clusterbomb::new(sources)),
        EnumerationMode::Pitchfork => Box::new(Pitchfork::new(sources)),
        EnumerationMode::Singular => {
            let first = sources
                .into_iter()
                .next()
                .ok_or_else(EngineError::no_word_sources)?;
            Box::new(Singular::new(first))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::collections::HashSet;

    fn drain(enumerator: &mut dyn Enumerator) -> Vec<Vec<String>> {
        let mut tuples = Vec::new();
        let mut tuple = Vec::new();
        while enumerator.next_into(&mut tuple) {
            tuples.push(tuple.clone());
            assert!(tuples.len() <= 10_000, "enumerator never exhausted");
        }
        tuples
    }

    fn joined(tuples: &[Vec<String>]) -> Vec<String> {
        tuples.iter().map(|t| t.join("/")).collect()
    }

    fn ab_xyz() -> Vec<WordSource> {
        vec![
            WordSource::from_words(["a", "b"]),
            WordSource::from_words(["x", "y", "z"]),
        ]
    }

    fn numbered(prefix: &str, n: usize) -> WordSource {
        WordSource::from_words((0..n).map(|i| format!("{prefix}{i}")))
    }

    #[test]
    fn test_clusterbomb_example_order() {
        let mut enumerator = Clusterbomb::new(ab_xyz());
        assert_eq!(enumerator.total_count(), 6);

        let tuples = drain(&mut enumerator);
        assert_eq!(
            joined(&tuples),
            vec!["a/x", "a/y", "a/z", "b/x", "b/y", "b/z"]
        );
        assert!(enumerator.is_exhausted());
    }

    #[test]
    fn test_clusterbomb_covers_product_exactly_once() {
        let sources = vec![numbered("p", 3), numbered("q", 4), numbered("r", 2)];
        let mut enumerator = Clusterbomb::new(sources);
        assert_eq!(enumerator.total_count(), 24);

        let tuples = drain(&mut enumerator);
        assert_eq!(tuples.len(), 24);
        let unique: HashSet<_> = tuples.iter().cloned().collect();
        assert_eq!(unique.len(), 24);
    }

    #[test]
    fn test_clusterbomb_single_source() {
        let mut enumerator = Clusterbomb::new(vec![numbered("w", 5)]);
        assert_eq!(drain(&mut enumerator).len(), 5);
    }

    #[test]
    fn test_pitchfork_example_order() {
        let mut enumerator = Pitchfork::new(ab_xyz());
        assert_eq!(enumerator.total_count(), 3);

        let tuples = drain(&mut enumerator);
        assert_eq!(joined(&tuples), vec!["a/x", "b/y", "a/z"]);
    }

    #[test]
    fn test_pitchfork_shorter_sources_cycle() {
        let sources = vec![numbered("s", 2), numbered("l", 6), numbered("m", 3)];
        let mut enumerator = Pitchfork::new(sources);
        let tuples = drain(&mut enumerator);

        assert_eq!(tuples.len(), 6);
        let short_firsts = tuples.iter().filter(|t| t[0] == "s0").count();
        let mid_firsts = tuples.iter().filter(|t| t[2] == "m0").count();
        assert_eq!(short_firsts, 3);
        assert_eq!(mid_firsts, 2);
        let longest: Vec<_> = tuples.iter().map(|t| t[1].as_str()).collect();
        assert_eq!(longest, vec!["l0", "l1", "l2", "l3", "l4", "l5"]);
    }

    #[test]
    fn test_pitchfork_longest_first_position() {
        let sources = vec![numbered("l", 4), numbered("s", 1)];
        let mut enumerator = Pitchfork::new(sources);
        let tuples = drain(&mut enumerator);
        assert_eq!(tuples.len(), 4);
        assert!(tuples.iter().all(|t| t[1] == "s0"));
    }

    #[test]
    fn test_singular_example() {
        let mut enumerator = Singular::new(WordSource::from_words(["a", "b"]));
        assert_eq!(enumerator.total_count(), 2);
        let tuples = drain(&mut enumerator);
        assert_eq!(tuples, vec![vec!["a".to_string()], vec!["b".to_string()]]);
    }

    #[test]
    fn test_singular_single_word() {
        let mut enumerator = Singular::new(WordSource::fallback());
        assert_eq!(drain(&mut enumerator).len(), 1);
    }

    #[test]
    fn test_exhausted_leaves_dest_untouched() {
        let mut enumerator = Singular::new(WordSource::from_words(["only"]));
        let mut tuple = Vec::new();
        assert!(enumerator.next_into(&mut tuple));
        assert!(!enumerator.next_into(&mut tuple));
        assert_eq!(tuple, vec!["only".to_string()]);
    }

    #[test]
    fn test_build_enumerator_modes() {
        for mode in EnumerationMode::all() {
            let enumerator = build_enumerator(*mode, ab_xyz()).unwrap();
            assert_eq!(enumerator.mode(), *mode);
        }
        let singular = build_enumerator(EnumerationMode::Singular, ab_xyz()).unwrap();
        assert_eq!(singular.total_count(), 2);
    }

    #[test]
    fn test_build_enumerator_requires_sources() {
        let err = build_enumerator(EnumerationMode::Clusterbomb, Vec::new())
            .err()
            .unwrap();
        assert_eq!(err.kind, ErrorKind::NoWordSources);
    }

    #[test]
    fn test_shared_buffer_sources_advance_independently() {
        let base = WordSource::from_words(["1", "2"]);
        let mut enumerator = Clusterbomb::new(vec![base.clone(), base]);
        let tuples = drain(&mut enumerator);
        assert_eq!(joined(&tuples), vec!["1/1", "1/2", "2/1", "2/2"]);
    }
}
