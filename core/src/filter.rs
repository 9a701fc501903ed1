//! Match/filter rules over response statistics
//!
//! `Filter*` rules hide a response whose statistic falls inside the range;
//! `Match*` rules hide a response whose statistic falls outside it. A
//! response is shown only if every rule lets it through.

use crate::response::ResponseStat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The response statistic a rule inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    /// HTTP status code
    Code,
    /// Body size in bytes
    Size,
    /// Whitespace-separated words in the body
    Words,
    /// Lines in the body
    Lines,
    /// Elapsed time in milliseconds
    Duration,
}

impl Statistic {
    fn read(self, stat: &ResponseStat) -> u64 {
        match self {
            Statistic::Code => u64::from(stat.code),
            Statistic::Size => stat.size_bytes,
            Statistic::Words => stat.word_count,
            Statistic::Lines => stat.line_count,
            Statistic::Duration => stat.duration_ms,
        }
    }
}

/// Rule kinds: a hiding (`Filter*`) or requiring (`Match*`) predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Hide status codes inside the range
    FilterCode,
    /// Hide body sizes inside the range
    FilterSize,
    /// Hide word counts inside the range
    FilterWords,
    /// Hide line counts inside the range
    FilterLines,
    /// Hide durations inside the range
    FilterDuration,
    /// Show only status codes inside the range
    MatchCode,
    /// Show only body sizes inside the range
    MatchSize,
    /// Show only word counts inside the range
    MatchWords,
    /// Show only line counts inside the range
    MatchLines,
    /// Show only durations inside the range
    MatchDuration,
}

impl RuleKind {
    /// Statistic inspected by this kind
    pub fn statistic(self) -> Statistic {
        match self {
            RuleKind::FilterCode | RuleKind::MatchCode => Statistic::Code,
            RuleKind::FilterSize | RuleKind::MatchSize => Statistic::Size,
            RuleKind::FilterWords | RuleKind::MatchWords => Statistic::Words,
            RuleKind::FilterLines | RuleKind::MatchLines => Statistic::Lines,
            RuleKind::FilterDuration | RuleKind::MatchDuration => Statistic::Duration,
        }
    }

    /// True for `Match*` kinds
    pub fn is_match(self) -> bool {
        matches!(
            self,
            RuleKind::MatchCode
                | RuleKind::MatchSize
                | RuleKind::MatchWords
                | RuleKind::MatchLines
                | RuleKind::MatchDuration
        )
    }
}

/// Inclusive numeric range parsed from `N` or `N-M`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterRange {
    /// Lower bound
    pub start: u64,
    /// Upper bound
    pub end: u64,
}

/// Range text could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleParseError {
    /// A bound is not a non-negative integer
    #[error("invalid number in range {0:?}")]
    InvalidNumber(String),

    /// Lower bound above upper bound
    #[error("range {0:?} is reversed")]
    Reversed(String),
}

impl FromStr for FilterRange {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let parse = |part: &str| {
            part.trim()
                .parse::<u64>()
                .map_err(|_| RuleParseError::InvalidNumber(text.to_string()))
        };

        let (start, end) = match text.split_once('-') {
            Some((lo, hi)) => (parse(lo)?, parse(hi)?),
            None => {
                let value = parse(text)?;
                (value, value)
            }
        };

        if start > end {
            return Err(RuleParseError::Reversed(text.to_string()));
        }
        Ok(Self { start, end })
    }
}

impl fmt::Display for FilterRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// A single range predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    /// Which statistic, and whether inside-range hides or shows
    pub kind: RuleKind,
    /// Inclusive lower bound
    pub start: u64,
    /// Inclusive upper bound
    pub end: u64,
}

impl FilterRule {
    /// Build a rule; bounds are swapped if given in reverse
    pub fn new(kind: RuleKind, start: u64, end: u64) -> Self {
        Self {
            kind,
            start: start.min(end),
            end: start.max(end),
        }
    }

    /// Build a rule from a parsed range
    pub fn from_range(kind: RuleKind, range: FilterRange) -> Self {
        Self::new(kind, range.start, range.end)
    }

    /// Parse `N` or `N-M` into a rule of the given kind
    pub fn parse(kind: RuleKind, text: &str) -> Result<Self, RuleParseError> {
        Ok(Self::from_range(kind, text.parse()?))
    }

    /// Whether this rule lets `stat` through
    pub fn passes(&self, stat: &ResponseStat) -> bool {
        let value = self.kind.statistic().read(stat);
        let inside = (self.start..=self.end).contains(&value);
        if self.kind.is_match() {
            inside
        } else {
            !inside
        }
    }
}

/// Evaluate `rules` as a logical AND; an empty list always passes
pub fn filter_pass(stat: &ResponseStat, rules: &[FilterRule]) -> bool {
    rules.iter().all(|rule| rule.passes(stat))
}

/// Ordered rule list applied to every completed response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    rules: Vec<FilterRule>,
}

impl Default for FilterSet {
    /// Show only 2xx and 3xx responses
    fn default() -> Self {
        Self {
            rules: vec![FilterRule::new(RuleKind::MatchCode, 200, 399)],
        }
    }
}

impl FilterSet {
    /// A set with the given rules
    pub fn new(rules: Vec<FilterRule>) -> Self {
        Self { rules }
    }

    /// No rules: every response is shown
    pub fn disabled() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule
    pub fn with_rule(mut self, rule: FilterRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Replace any rule of the same kind with `rule`
    pub fn set_rule(&mut self, rule: FilterRule) {
        self.rules.retain(|existing| existing.kind != rule.kind);
        self.rules.push(rule);
    }

    /// Whether `stat` should be reported
    pub fn passes(&self, stat: &ResponseStat) -> bool {
        filter_pass(stat, &self.rules)
    }

    /// Configured rules in evaluation order
    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    /// True if no rule is configured
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat_with_code(code: u16) -> ResponseStat {
        ResponseStat {
            code,
            ..Default::default()
        }
    }

    #[test]
    fn test_match_code_boundaries() {
        let rules = [FilterRule::new(RuleKind::MatchCode, 200, 399)];
        assert!(filter_pass(&stat_with_code(200), &rules));
        assert!(filter_pass(&stat_with_code(399), &rules));
        assert!(!filter_pass(&stat_with_code(400), &rules));
        assert!(!filter_pass(&stat_with_code(199), &rules));
    }

    #[test]
    fn test_empty_rules_always_pass() {
        assert!(filter_pass(&stat_with_code(500), &[]));
        assert!(filter_pass(&ResponseStat::default(), &[]));
        assert!(FilterSet::disabled().passes(&stat_with_code(404)));
    }

    #[test]
    fn test_filter_size_hides_inside_range() {
        let rule = FilterRule::new(RuleKind::FilterSize, 100, 200);
        let mut stat = stat_with_code(200);

        stat.size_bytes = 150;
        assert!(!rule.passes(&stat));

        stat.size_bytes = 201;
        assert!(rule.passes(&stat));
    }

    #[test]
    fn test_rules_combine_with_and() {
        let set = FilterSet::default().with_rule(FilterRule::new(RuleKind::FilterWords, 3, 3));
        let mut stat = stat_with_code(200);

        stat.word_count = 3;
        assert!(!set.passes(&stat));

        stat.word_count = 4;
        assert!(set.passes(&stat));

        stat.code = 404;
        assert!(!set.passes(&stat));
    }

    #[test]
    fn test_filter_and_match_on_same_statistic() {
        let set = FilterSet::new(vec![
            FilterRule::new(RuleKind::MatchLines, 1, 10),
            FilterRule::new(RuleKind::FilterLines, 5, 5),
        ]);
        let mut stat = stat_with_code(200);

        stat.line_count = 4;
        assert!(set.passes(&stat));
        stat.line_count = 5;
        assert!(!set.passes(&stat));
        stat.line_count = 11;
        assert!(!set.passes(&stat));
    }

    #[test]
    fn test_duration_rule() {
        let rule = FilterRule::new(RuleKind::MatchDuration, 0, 500);
        let mut stat = stat_with_code(200);
        stat.duration_ms = 499;
        assert!(rule.passes(&stat));
        stat.duration_ms = 1200;
        assert!(!rule.passes(&stat));
    }

    #[test]
    fn test_default_set() {
        let set = FilterSet::default();
        assert_eq!(set.rules().len(), 1);
        assert_eq!(set.rules()[0].kind, RuleKind::MatchCode);
        assert!(set.passes(&stat_with_code(301)));
        assert!(!set.passes(&stat_with_code(404)));
    }

    #[test]
    fn test_range_parsing() {
        assert_eq!(
            "404".parse::<FilterRange>().unwrap(),
            FilterRange { start: 404, end: 404 }
        );
        assert_eq!(
            " 200-299 ".parse::<FilterRange>().unwrap(),
            FilterRange { start: 200, end: 299 }
        );
        assert!(matches!(
            "abc".parse::<FilterRange>(),
            Err(RuleParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            "500-400".parse::<FilterRange>(),
            Err(RuleParseError::Reversed(_))
        ));
        assert_eq!(FilterRange { start: 1, end: 9 }.to_string(), "1-9");
    }

    #[test]
    fn test_set_rule_replaces_same_kind() {
        let mut set = FilterSet::default().with_rule(FilterRule::new(RuleKind::FilterSize, 0, 0));
        set.set_rule(FilterRule::new(RuleKind::MatchCode, 200, 599));

        assert_eq!(set.rules().len(), 2);
        assert_eq!(set.rules()[0].kind, RuleKind::FilterSize);
        assert!(set.passes(&ResponseStat {
            code: 500,
            size_bytes: 10,
            ..Default::default()
        }));
    }

    #[test]
    fn test_rule_new_orders_bounds() {
        let rule = FilterRule::new(RuleKind::MatchSize, 90, 10);
        assert_eq!((rule.start, rule.end), (10, 90));
    }

    #[test]
    fn test_filter_set_serialization() {
        let set = FilterSet::default();
        let json = serde_json::to_string(&set).unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("\"match_code\""));

        let back: FilterSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
