//! Data-driven channel grammars.
//!
//! A channel is described by a [`GrammarSpec`]: constants (local and anchor
//! currency, dedup identity policy, cross-rate marker), a noise keyword list,
//! and an ordered list of rules. Specs are plain serde values so new channels
//! can be added from a config file; [`ChannelGrammar::compile`] validates a
//! spec and compiles its patterns once per run.
//!
//! Rule patterns are regular expressions with named captures:
//!
//! | capture   | meaning                                              |
//! |-----------|------------------------------------------------------|
//! | `lead`    | leading indicator, a three-letter code or one flag   |
//! | `a`, `b`  | explicit currency codes                              |
//! | `flags`   | two flag glyphs, decoded in order (flag pair rules)  |
//! | `code`    | code printed next to a flag pair                     |
//! | `buy`     | buy price                                            |
//! | `sell`    | sell price                                           |
//! | `comment` | trailing free text                                   |
//!
//! Patterns may use the placeholders `{code}`, `{flag}`, `{price}` and
//! `{arrow}`, expanded by [`expand_template`].

use fx_common::{Currency, ParserError, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::noise::NoiseFilter;

/// Comment given to normalized cross-rate quotes unless overridden.
pub const DEFAULT_CROSS_RATE_MARKER: &str = "cross-rate";

/// One flag glyph: two regional-indicator symbols.
const FLAG_TEMPLATE: &str = r"(?:[\x{1F1E6}-\x{1F1FF}]{2})";
/// Price token: digits (Cyrillic `З` tolerated), optional `'` thousands groups
/// and an optional `.`/`,` decimal part.
const PRICE_TEMPLATE: &str = r"(?:[0-9Зз]+(?:['’][0-9]{3})*(?:[.,][0-9Зз]+)?)";
/// Optional trend arrow printed after a price.
const ARROW_TEMPLATE: &str = r"(?:\x{2B06}\x{FE0F}?|\x{2B07}\x{FE0F}?|[↑↓▲▼🔺🔻])?";

fn default_local() -> Currency {
    Currency::UAH
}

fn default_anchor() -> Currency {
    Currency::USD
}

fn default_marker() -> String {
    DEFAULT_CROSS_RATE_MARKER.to_string()
}

/// Serializable description of a channel grammar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarSpec {
    /// Channel name, also the prefix of its raw and parsed files.
    pub name: String,
    /// Currency implied when a line names only one side.
    #[serde(default = "default_local")]
    pub local_currency: Currency,
    /// Currency always placed second in a cross-rate pair.
    #[serde(default = "default_anchor")]
    pub anchor_currency: Currency,
    /// Whether the comment is part of the dedup identity (tiered offers).
    #[serde(default)]
    pub comment_in_key: bool,
    /// Whether cross-rate quotes keep their trailing text after the marker.
    #[serde(default)]
    pub preserve_cross_comment: bool,
    /// Comment given to cross-rate quotes.
    #[serde(default = "default_marker")]
    pub cross_rate_marker: String,
    /// Case-insensitive keywords that disqualify a line.
    #[serde(default)]
    pub noise: Vec<String>,
    /// Extraction rules in priority order.
    pub rules: Vec<RuleSpec>,
}

/// Serializable extraction rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleSpec {
    /// One or two codes, the missing side is the local currency.
    SimplePair {
        /// Pattern template.
        pattern: String,
        /// Lines matching this template are skipped by the rule.
        #[serde(default)]
        exclude: Option<String>,
    },
    /// Two explicit non-local codes.
    CrossRate {
        /// Pattern template.
        pattern: String,
        /// Lines matching this template are skipped by the rule.
        #[serde(default)]
        exclude: Option<String>,
    },
    /// Two flag glyphs decoded in order, with an optional code.
    FlagPair {
        /// Pattern template.
        pattern: String,
        /// Lines matching this template are skipped by the rule.
        #[serde(default)]
        exclude: Option<String>,
    },
}

impl RuleSpec {
    fn parts(&self) -> (&'static str, &str, Option<&str>) {
        match self {
            RuleSpec::SimplePair { pattern, exclude } => ("simple_pair", pattern.as_str(), exclude.as_deref()),
            RuleSpec::CrossRate { pattern, exclude } => ("cross_rate", pattern.as_str(), exclude.as_deref()),
            RuleSpec::FlagPair { pattern, exclude } => ("flag_pair", pattern.as_str(), exclude.as_deref()),
        }
    }
}

/// Compiled pattern of a rule plus its optional veto.
#[derive(Debug, Clone)]
pub struct Matcher {
    pattern: Regex,
    exclude: Option<Regex>,
}

impl Matcher {
    fn compile(pattern: &str, exclude: Option<&str>) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(&expand_template(pattern))?,
            exclude: exclude.map(|ex| Regex::new(&expand_template(ex))).transpose()?,
        })
    }

    /// Captures for `line`, unless the exclude pattern vetoes it.
    pub fn captures<'t>(&self, line: &'t str) -> Option<Captures<'t>> {
        if self.exclude.as_ref().is_some_and(|ex| ex.is_match(line)) {
            return None;
        }
        self.pattern.captures(line)
    }

    fn has_group(&self, name: &str) -> bool {
        self.pattern.capture_names().flatten().any(|n| n == name)
    }
}

/// Compiled extraction rule.
#[derive(Debug, Clone)]
pub enum Rule {
    /// See [`RuleSpec::SimplePair`].
    SimplePair(Matcher),
    /// See [`RuleSpec::CrossRate`].
    CrossRate(Matcher),
    /// See [`RuleSpec::FlagPair`].
    FlagPair(Matcher),
}

impl Rule {
    /// Compiles and validates a rule spec.
    pub fn compile(spec: &RuleSpec) -> Result<Self> {
        let (kind, pattern, exclude) = spec.parts();
        let matcher = Matcher::compile(pattern, exclude)?;

        let required: &[&str] = match spec {
            RuleSpec::SimplePair { .. } => &["buy", "sell"],
            RuleSpec::CrossRate { .. } => &["a", "b", "buy", "sell"],
            RuleSpec::FlagPair { .. } => &["flags", "buy", "sell"],
        };
        if let Some(missing) = required.iter().find(|g| !matcher.has_group(g)) {
            return Err(ParserError::Config(format!(
                "{} rule `{}` lacks the `{}` capture",
                kind, pattern, missing
            )));
        }
        if matches!(spec, RuleSpec::SimplePair { .. })
            && !["lead", "a", "b"].iter().any(|g| matcher.has_group(g))
        {
            return Err(ParserError::Config(format!(
                "simple_pair rule `{}` needs a `lead`, `a` or `b` capture",
                pattern
            )));
        }

        Ok(match spec {
            RuleSpec::SimplePair { .. } => Rule::SimplePair(matcher),
            RuleSpec::CrossRate { .. } => Rule::CrossRate(matcher),
            RuleSpec::FlagPair { .. } => Rule::FlagPair(matcher),
        })
    }

    /// The rule's matcher regardless of kind.
    pub fn matcher(&self) -> &Matcher {
        match self {
            Rule::SimplePair(m) | Rule::CrossRate(m) | Rule::FlagPair(m) => m,
        }
    }
}

/// Immutable, compiled grammar of one channel.
#[derive(Debug, Clone)]
pub struct ChannelGrammar {
    name: String,
    local_currency: Currency,
    anchor_currency: Currency,
    comment_in_key: bool,
    preserve_cross_comment: bool,
    cross_rate_marker: String,
    noise: NoiseFilter,
    rules: Vec<Rule>,
}

impl ChannelGrammar {
    /// Validates `spec` and compiles its rules.
    pub fn compile(spec: &GrammarSpec) -> Result<Self> {
        let name = spec.name.trim();
        if name.is_empty() {
            return Err(ParserError::Config("channel name is empty".to_string()));
        }
        if spec.local_currency == spec.anchor_currency {
            return Err(ParserError::Config(format!(
                "{}: anchor currency must differ from local currency {}",
                name, spec.local_currency
            )));
        }
        if spec.rules.is_empty() {
            return Err(ParserError::Config(format!("{}: no extraction rules", name)));
        }
        let rules = spec
            .rules
            .iter()
            .map(Rule::compile)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            local_currency: spec.local_currency,
            anchor_currency: spec.anchor_currency,
            comment_in_key: spec.comment_in_key,
            preserve_cross_comment: spec.preserve_cross_comment,
            cross_rate_marker: spec.cross_rate_marker.trim().to_string(),
            noise: NoiseFilter::new(&spec.noise),
            rules,
        })
    }

    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Currency implied for single-code lines.
    pub fn local_currency(&self) -> Currency {
        self.local_currency
    }

    /// Currency placed second in cross-rate pairs.
    pub fn anchor_currency(&self) -> Currency {
        self.anchor_currency
    }

    /// Whether the comment belongs to the dedup identity.
    pub fn comment_in_key(&self) -> bool {
        self.comment_in_key
    }

    /// Whether cross-rate quotes keep their trailing text.
    pub fn preserve_cross_comment(&self) -> bool {
        self.preserve_cross_comment
    }

    /// Comment given to cross-rate quotes.
    pub fn cross_rate_marker(&self) -> &str {
        &self.cross_rate_marker
    }

    /// Line filter applied before the rules.
    pub fn noise(&self) -> &NoiseFilter {
        &self.noise
    }

    /// Rules in priority order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// True if neither side of the pair is the local currency.
    pub fn is_cross(&self, a: Currency, b: Currency) -> bool {
        a != self.local_currency && b != self.local_currency
    }
}

/// Expands the `{code}`, `{flag}`, `{price}` and `{arrow}` placeholders.
pub fn expand_template(template: &str) -> String {
    template
        .replace("{code}", &format!("(?:{})", Currency::code_alternation()))
        .replace("{flag}", FLAG_TEMPLATE)
        .replace("{price}", PRICE_TEMPLATE)
        .replace("{arrow}", ARROW_TEMPLATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(rules: Vec<RuleSpec>) -> GrammarSpec {
        GrammarSpec {
            name: "TEST".to_string(),
            local_currency: Currency::UAH,
            anchor_currency: Currency::USD,
            comment_in_key: false,
            preserve_cross_comment: false,
            cross_rate_marker: default_marker(),
            noise: vec!["promo".to_string()],
            rules,
        }
    }

    fn simple(pattern: &str) -> RuleSpec {
        RuleSpec::SimplePair {
            pattern: pattern.to_string(),
            exclude: None,
        }
    }

    #[test]
    fn test_compiles_valid_grammar() {
        let grammar = ChannelGrammar::compile(&spec(vec![simple(
            r"(?P<a>{code})\s+(?P<buy>{price})/(?P<sell>{price})",
        )]))
        .unwrap();
        assert_eq!(grammar.name(), "TEST");
        assert_eq!(grammar.rules().len(), 1);
        assert_eq!(grammar.noise().len(), 1);
        assert!(grammar.is_cross(Currency::EUR, Currency::USD));
        assert!(!grammar.is_cross(Currency::EUR, Currency::UAH));
    }

    #[test]
    fn test_rejects_missing_captures() {
        let err = ChannelGrammar::compile(&spec(vec![RuleSpec::CrossRate {
            pattern: r"(?P<a>{code})/(?P<buy>{price})/(?P<sell>{price})".to_string(),
            exclude: None,
        }]))
        .unwrap_err();
        assert!(matches!(err, ParserError::Config(_)));

        let err = ChannelGrammar::compile(&spec(vec![simple(r"(?P<buy>{price})/(?P<sell>{price})")]))
            .unwrap_err();
        assert!(matches!(err, ParserError::Config(_)));
    }

    #[test]
    fn test_rejects_bad_regex() {
        let err = ChannelGrammar::compile(&spec(vec![simple(r"(?P<a>[A-Z")])).unwrap_err();
        assert!(matches!(err, ParserError::Pattern(_)));
    }

    #[test]
    fn test_rejects_anchor_equal_to_local() {
        let mut bad = spec(vec![simple(r"(?P<a>{code}) (?P<buy>{price})/(?P<sell>{price})")]);
        bad.anchor_currency = Currency::UAH;
        assert!(matches!(
            ChannelGrammar::compile(&bad),
            Err(ParserError::Config(_))
        ));
    }

    #[test]
    fn test_spec_from_json_applies_defaults() {
        let json = r#"{
            "name": "NEW_CHANNEL",
            "rules": [
                {"kind": "cross_rate", "pattern": "(?P<a>{code})/(?P<b>{code}) (?P<buy>{price})/(?P<sell>{price})"},
                {"kind": "simple_pair", "pattern": "(?P<lead>{code}) (?P<buy>{price})/(?P<sell>{price})", "exclude": "опт"}
            ]
        }"#;
        let spec: GrammarSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.local_currency, Currency::UAH);
        assert_eq!(spec.anchor_currency, Currency::USD);
        assert_eq!(spec.cross_rate_marker, DEFAULT_CROSS_RATE_MARKER);
        assert!(matches!(spec.rules[1], RuleSpec::SimplePair { exclude: Some(_), .. }));
        assert!(ChannelGrammar::compile(&spec).is_ok());
    }

    #[test]
    fn test_exclude_vetoes_line() {
        let rule = Rule::compile(&RuleSpec::SimplePair {
            pattern: r"(?P<lead>[A-Z]{3})\s+(?P<buy>{price})/(?P<sell>{price})".to_string(),
            exclude: Some(r"\b[A-Z]{3}\s*/\s*[A-Z]{3}\b".to_string()),
        })
        .unwrap();
        assert!(rule.matcher().captures("USD 41.50/41.80").is_some());
        assert!(rule.matcher().captures("EUR/USD 1.08/1.09").is_none());
    }

    #[test]
    fn test_price_template_accepts_decimal_commas() {
        let price = Regex::new(&format!("^{}$", expand_template("{price}"))).unwrap();
        for ok in ["41", "41.50", "1,165", "4З.10", "1'250.5"] {
            assert!(price.is_match(ok), "{}", ok);
        }
        assert!(!price.is_match("41.5.0"));
    }
}
