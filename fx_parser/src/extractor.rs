//! Grammar engine: turns block lines into quote candidates.
//!
//! Rules run as priority passes over a block. A line that yields a valid
//! candidate under one rule is consumed and skipped by every later rule; a
//! line that merely matched a pattern but failed validation stays available.
//! Noise lines never reach the rules.

use std::collections::HashSet;

use fx_common::Currency;
use fx_common::currency::{decode_flags, decode_indicator};
use regex::Captures;

use crate::grammar::{ChannelGrammar, Rule};
use crate::model::Candidate;

/// Candidates of one block, in rule-then-line order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockExtraction {
    /// Valid candidates.
    pub candidates: Vec<Candidate>,
    /// Lines removed by the noise filter.
    pub noise_lines: usize,
}

/// Applies the grammar's rules to a block's body lines.
pub fn extract_block(grammar: &ChannelGrammar, lines: &[&str]) -> BlockExtraction {
    let mut extraction = BlockExtraction::default();

    let prepared: Vec<Option<String>> = lines
        .iter()
        .map(|line| {
            if grammar.noise().is_noise(line) {
                extraction.noise_lines += 1;
                None
            } else {
                Some(clean_line(line))
            }
        })
        .collect();

    let mut consumed: HashSet<usize> = HashSet::new();
    for rule in grammar.rules() {
        for (idx, line) in prepared.iter().enumerate() {
            let Some(line) = line else { continue };
            if line.is_empty() || consumed.contains(&idx) {
                continue;
            }
            if let Some(candidate) = apply_rule(rule, line, grammar.local_currency()) {
                consumed.insert(idx);
                extraction.candidates.push(candidate);
            }
        }
    }
    extraction
}

/// Evaluates one rule against one cleaned line.
pub fn apply_rule(rule: &Rule, line: &str, local: Currency) -> Option<Candidate> {
    let caps = rule.matcher().captures(line)?;
    let (buy, sell) = prices(&caps)?;

    let (pair, low_confidence) = match rule {
        Rule::SimplePair(_) => {
            let a = match caps.name("a") {
                Some(m) => Some(Currency::from_code(m.as_str()).ok()?),
                None => match caps.name("lead") {
                    Some(m) => Some(decode_indicator(m.as_str())?),
                    None => None,
                },
            };
            let b = match caps.name("b") {
                Some(m) => Some(Currency::from_code(m.as_str()).ok()?),
                None => None,
            };
            (resolve_pair(a, b, local)?, false)
        }
        Rule::CrossRate(_) => {
            let a = Currency::from_code(caps.name("a")?.as_str()).ok()?;
            let b = Currency::from_code(caps.name("b")?.as_str()).ok()?;
            if a == local || b == local {
                return None;
            }
            (resolve_pair(Some(a), Some(b), local)?, false)
        }
        Rule::FlagPair(_) => {
            let flags = decode_flags(caps.name("flags")?.as_str());
            let (first, second) = match flags.as_slice() {
                [Some(first), Some(second), ..] => (*first, *second),
                _ => return None,
            };
            // A printed code that names neither flag is trusted less than the flags.
            let mismatch = caps
                .name("code")
                .map(|m| m.as_str().trim())
                .filter(|code| !code.is_empty())
                .is_some_and(|code| {
                    Currency::from_code(code).map_or(true, |c| c != first && c != second)
                });
            (resolve_pair(Some(first), Some(second), local)?, mismatch)
        }
    };

    Some(Candidate {
        currency_a: pair.0,
        currency_b: pair.1,
        buy,
        sell,
        comment: caps
            .name("comment")
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
        low_confidence,
    })
}

/// Fills in the local currency and orients local pairs as `(foreign, local)`.
///
/// Returns `None` for a self-pair or when no currency is known.
pub fn resolve_pair(
    a: Option<Currency>,
    b: Option<Currency>,
    local: Currency,
) -> Option<(Currency, Currency)> {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        (Some(one), None) | (None, Some(one)) => (one, local),
        (None, None) => return None,
    };
    if a == b {
        return None;
    }
    if a == local { Some((b, a)) } else { Some((a, b)) }
}

fn prices(caps: &Captures<'_>) -> Option<(f64, f64)> {
    let buy = normalize_price(caps.name("buy")?.as_str())?;
    let sell = normalize_price(caps.name("sell")?.as_str())?;
    Some((buy, sell))
}

/// Parses a price token as written in the channels.
///
/// `,` is a decimal separator; whitespace, `'`/`’` thousands separators, trend
/// arrows and emoji variation selectors are dropped; Cyrillic `З` reads as `3`.
/// When several dots remain only the last one is decimal. Zero, negative and
/// unparseable prices yield `None`.
pub fn normalize_price(raw: &str) -> Option<f64> {
    let mut digits = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '0'..='9' | '-' | '+' => digits.push(c),
            'З' | 'з' => digits.push('3'),
            ',' | '.' => digits.push('.'),
            '\'' | '’' | '_' | '\u{FE0F}' => {}
            '⬆' | '⬇' | '↑' | '↓' | '▲' | '▼' | '🔺' | '🔻' => {}
            c if c.is_whitespace() => {}
            _ => return None,
        }
    }
    if let Some(last_dot) = digits.rfind('.') {
        let (int_part, frac_part) = digits.split_at(last_dot);
        digits = format!("{}{}", int_part.replace('.', ""), frac_part);
    }
    let value: f64 = digits.parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Unifies the typographic variants messaging clients insert.
pub fn clean_line(line: &str) -> String {
    line.chars()
        .map(|c| match c {
            '–' | '—' | '‐' | '‑' => '-',
            '⁄' | '∕' => '/',
            '：' => ':',
            '\u{00A0}' | '\u{202F}' | '\u{2009}' => ' ',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{GrammarSpec, RuleSpec};

    fn grammar(rules: Vec<RuleSpec>, noise: &[&str]) -> ChannelGrammar {
        ChannelGrammar::compile(&GrammarSpec {
            name: "TEST".to_string(),
            local_currency: Currency::UAH,
            anchor_currency: Currency::USD,
            comment_in_key: false,
            preserve_cross_comment: false,
            cross_rate_marker: "cross-rate".to_string(),
            noise: noise.iter().map(|s| s.to_string()).collect(),
            rules,
        })
        .unwrap()
    }

    fn simple(pattern: &str) -> RuleSpec {
        RuleSpec::SimplePair {
            pattern: pattern.to_string(),
            exclude: None,
        }
    }

    fn cross(pattern: &str) -> RuleSpec {
        RuleSpec::CrossRate {
            pattern: pattern.to_string(),
            exclude: None,
        }
    }

    fn flag_pair(pattern: &str) -> RuleSpec {
        RuleSpec::FlagPair {
            pattern: pattern.to_string(),
            exclude: None,
        }
    }

    const LEAD: &str = r"(?P<lead>[A-Z]{3}|{flag})[:\s]*(?P<buy>{price})\s*/\s*(?P<sell>{price})(?P<comment>.*)$";
    const CROSS: &str = r"(?P<a>{code})\s*/\s*(?P<b>{code})\s+(?P<buy>{price})\s*/\s*(?P<sell>{price})";

    #[test]
    fn test_normalize_price() {
        assert_eq!(normalize_price("41.50"), Some(41.5));
        assert_eq!(normalize_price("42,13"), Some(42.13));
        assert_eq!(normalize_price(" 4З,1 "), Some(43.1));
        assert_eq!(normalize_price("1'250.5"), Some(1250.5));
        assert_eq!(normalize_price("1.250,50"), Some(1250.5));
        assert_eq!(normalize_price("41.80⬆️"), Some(41.8));
        assert_eq!(normalize_price("0.00"), None);
        assert_eq!(normalize_price("-1"), None);
        assert_eq!(normalize_price("abc"), None);
        assert_eq!(normalize_price(""), None);
    }

    #[test]
    fn test_clean_line() {
        assert_eq!(clean_line("  USD–UAH\u{00A0}42⁄43 "), "USD-UAH 42/43");
        assert_eq!(clean_line("EUR：44"), "EUR:44");
    }

    #[test]
    fn test_resolve_pair() {
        let uah = Currency::UAH;
        assert_eq!(resolve_pair(Some(Currency::USD), None, uah), Some((Currency::USD, uah)));
        assert_eq!(resolve_pair(None, Some(Currency::EUR), uah), Some((Currency::EUR, uah)));
        assert_eq!(resolve_pair(Some(uah), Some(Currency::USD), uah), Some((Currency::USD, uah)));
        assert_eq!(
            resolve_pair(Some(Currency::EUR), Some(Currency::USD), uah),
            Some((Currency::EUR, Currency::USD))
        );
        assert_eq!(resolve_pair(Some(uah), None, uah), None);
        assert_eq!(resolve_pair(Some(Currency::USD), Some(Currency::USD), uah), None);
        assert_eq!(resolve_pair(None, None, uah), None);
    }

    #[test]
    fn test_lead_code_implies_local() {
        let g = grammar(vec![simple(LEAD)], &[]);
        let c = apply_rule(&g.rules()[0], "USD 41.50/41.80", Currency::UAH).unwrap();
        assert_eq!((c.currency_a, c.currency_b), (Currency::USD, Currency::UAH));
        assert_eq!((c.buy, c.sell), (41.5, 41.8));
        assert_eq!(c.comment, "");
        assert!(!c.low_confidence);
    }

    #[test]
    fn test_lead_flag_is_decoded() {
        let g = grammar(vec![simple(LEAD)], &[]);
        let c = apply_rule(&g.rules()[0], "🇪🇺 44,10 / 44,60 від 1000€", Currency::UAH).unwrap();
        assert_eq!(c.currency_a, Currency::EUR);
        assert_eq!(c.comment, "від 1000€");
    }

    #[test]
    fn test_zero_price_discards_candidate() {
        let g = grammar(vec![simple(LEAD)], &[]);
        assert!(apply_rule(&g.rules()[0], "USD 0.00/41.80", Currency::UAH).is_none());
    }

    #[test]
    fn test_cross_rule_rejects_local_pairs() {
        let g = grammar(vec![cross(CROSS)], &[]);
        assert!(apply_rule(&g.rules()[0], "USD/UAH 41.50/41.80", Currency::UAH).is_none());
        let c = apply_rule(&g.rules()[0], "EUR/USD 1.0800/1.0850", Currency::UAH).unwrap();
        assert_eq!((c.currency_a, c.currency_b), (Currency::EUR, Currency::USD));
    }

    #[test]
    fn test_flag_pair_conflict_uses_flag_order() {
        let g = grammar(
            vec![flag_pair(
                r"(?P<flags>{flag}\s*/\s*{flag})\s*(?P<code>[A-Z]{3})?\s*[:\s-]*(?P<buy>{price})\s*/\s*(?P<sell>{price})",
            )],
            &[],
        );
        let rule = &g.rules()[0];

        let agreed = apply_rule(rule, "🇬🇧/🇺🇸USD: 1,335 / 1,345", Currency::UAH).unwrap();
        assert_eq!((agreed.currency_a, agreed.currency_b), (Currency::GBP, Currency::USD));
        assert!(!agreed.low_confidence);

        let conflict = apply_rule(rule, "🇬🇧/🇺🇸CHF: 1,335 / 1,345", Currency::UAH).unwrap();
        assert_eq!((conflict.currency_a, conflict.currency_b), (Currency::GBP, Currency::USD));
        assert!(conflict.low_confidence);

        let local = apply_rule(rule, "🇺🇸/🇺🇦USD: 42,13 / 42,18", Currency::UAH).unwrap();
        assert_eq!((local.currency_a, local.currency_b), (Currency::USD, Currency::UAH));
    }

    #[test]
    fn test_consumed_lines_skip_later_rules() {
        let g = grammar(vec![cross(CROSS), simple(LEAD)], &[]);
        let lines = ["EUR/USD 1.0800/1.0850", "USD 41.50/41.80"];
        let extraction = extract_block(&g, &lines);
        assert_eq!(extraction.candidates.len(), 2);
        assert_eq!(extraction.candidates[0].currency_b, Currency::USD);
        assert_eq!(extraction.candidates[1].currency_b, Currency::UAH);
    }

    #[test]
    fn test_noise_lines_never_match() {
        let g = grammar(vec![simple(LEAD)], &["🔥"]);
        let extraction = extract_block(&g, &["🔥 USD 40.00/40.10", "EUR 44.10/44.60"]);
        assert_eq!(extraction.noise_lines, 1);
        assert_eq!(extraction.candidates.len(), 1);
        assert_eq!(extraction.candidates[0].currency_a, Currency::EUR);
    }
}
