//! Built-in grammars of the channels the parser ships with.
//!
//! Every channel quotes against the hryvnia and anchors cross-rates on the
//! dollar. Additional channels are described in a JSON config file using the
//! same [`GrammarSpec`] shape.

use fx_common::{Currency, ParserError, Result};

use crate::grammar::{ChannelGrammar, DEFAULT_CROSS_RATE_MARKER, GrammarSpec, RuleSpec};

/// Hot-offer vocabulary shared by the retail exchange channels.
const HOT_OFFER_NOISE: &[&str] = &["🔥", "гаряч", "акці", "знижк", "прода", "hot", "promo"];

fn simple_pair(pattern: &str, exclude: Option<&str>) -> RuleSpec {
    RuleSpec::SimplePair {
        pattern: pattern.to_string(),
        exclude: exclude.map(str::to_string),
    }
}

fn cross_rate(pattern: &str) -> RuleSpec {
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

fn spec(name: &str, noise: &[&str], rules: Vec<RuleSpec>) -> GrammarSpec {
    GrammarSpec {
        name: name.to_string(),
        local_currency: Currency::UAH,
        anchor_currency: Currency::USD,
        comment_in_key: false,
        preserve_cross_comment: false,
        cross_rate_marker: DEFAULT_CROSS_RATE_MARKER.to_string(),
        noise: noise.iter().map(|s| s.to_string()).collect(),
        rules,
    }
}

/// `EUR/USD 1.16/1.17` crosses first, then `USD 41.50/41.80 comment` lines
/// led by a code or a flag.
fn garant_style(name: &str) -> GrammarSpec {
    spec(
        name,
        HOT_OFFER_NOISE,
        vec![
            cross_rate(
                r"(?i)(?:{flag})?\s*(?P<a>{code})\s*[/:\- ]\s*(?:{flag})?\s*(?P<b>{code}).*?(?P<buy>{price})\s*/\s*(?P<sell>{price})",
            ),
            simple_pair(
                r"(?:{flag}\s*)*(?P<a>{code})\s*[-\s]\s*(?P<b>{code})\s*(?P<buy>{price})\s*[/\\]\s*(?P<sell>{price})(?P<comment>.*)$",
                None,
            ),
            simple_pair(
                r"(?P<lead>[A-Z]{3}|{flag})[:\s]*(?P<buy>{price})\s*[/\\]\s*(?P<sell>{price})(?P<comment>.*)$",
                Some(r"\b[A-Z]{3}\s*/\s*[A-Z]{3}\b"),
            ),
        ],
    )
}

/// `USD-UAH 41.50/41.80 від 1000$`, tiered offers keyed by their comment.
fn kit_group() -> GrammarSpec {
    GrammarSpec {
        comment_in_key: true,
        preserve_cross_comment: true,
        ..spec(
            "KIT_GROUP",
            &[],
            vec![simple_pair(
                r"(?i)(?:{flag}\s*)*(?P<a>{code})[-\s](?P<b>{code})\s+(?P<buy>{price})\s*/\s*(?P<sell>{price})(?P<comment>.*)$",
                None,
            )],
        )
    }
}

/// `🇪🇺/🇺🇸EUR: 1,165 / 1,175` flag pairs, then plain `USD: 41,50 / 41,80`.
fn valuta_kiev() -> GrammarSpec {
    spec(
        "VALUTA_KIEV",
        &[
            "🔥", "спецкурс", "акці", "обмежен", "знижк", "promo", "продамо", "⚡", "usdt",
            "купуємо", "купимо", "💰", "%", "золото", "метал", "срібло",
        ],
        vec![
            flag_pair(
                r"(?i)(?P<flags>{flag}\s*/\s*{flag})\s*(?P<code>{code})?\s*[:\s-]*(?P<buy>{price})\s*/\s*(?P<sell>{price})",
            ),
            simple_pair(
                r"(?i)(?:{flag}\s*/\s*{flag}\s*)?(?P<a>{code})\s*[:\s-]*(?P<buy>{price})\s*/\s*(?P<sell>{price})",
                None,
            ),
        ],
    )
}

/// `🇺🇸USD🇺🇦UAH 41.50⬆️/41.80⬇️` with optional trend arrows.
fn change_kyiv() -> GrammarSpec {
    spec(
        "CHANGE_KYIV",
        &["🔥", "акці", "знижк", "promo", "продамо", "спецкурс"],
        vec![simple_pair(
            r"(?i)(?:{flag}+\s*)?(?P<a>{code})(?:\s*{flag}*)?\s*(?P<b>{code})\s*(?P<buy>{price}){arrow}\s*/\s*(?P<sell>{price}){arrow}",
            None,
        )],
    )
}

/// `EURUSD 1.16/1.17` crosses and `USDUAH 41.50/41.80` pairs.
fn uacoin() -> GrammarSpec {
    spec(
        "UACOIN",
        &["uacoin.com.ua", "usdtuah", "+380", "☎", "www.", ".com", ".ua"],
        vec![
            cross_rate(r"(?i)(?P<a>{code})(?P<b>{code})\s+(?P<buy>{price})/(?P<sell>{price})"),
            simple_pair(r"(?i)(?P<a>{code})UAH\s+(?P<buy>{price})/(?P<sell>{price})", None),
        ],
    )
}

/// `🇪🇺/🇺🇸 EUR-USD 1.165/1.175` swap table rows.
fn swaps() -> GrammarSpec {
    spec(
        "SWAPS",
        &[],
        vec![simple_pair(
            r"(?i)^\s*(?:{flag}\s*/\s*{flag}\s*)?(?P<a>[A-Z]{3})\s*[-/]\s*(?P<b>[A-Z]{3})[^\d\r\n]*?(?P<buy>{price})\s*/\s*(?P<sell>{price})",
            None,
        )],
    )
}

/// Specs of every built-in channel.
pub fn builtin_specs() -> Vec<GrammarSpec> {
    vec![
        garant_style("GARANT"),
        garant_style("MIRVALUTY"),
        kit_group(),
        valuta_kiev(),
        change_kyiv(),
        uacoin(),
        swaps(),
    ]
}

/// Compiled built-in grammar of `name`.
pub fn builtin(name: &str) -> Result<ChannelGrammar> {
    let spec = builtin_specs()
        .into_iter()
        .find(|s| s.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| ParserError::UnknownChannel(name.to_string()))?;
    ChannelGrammar::compile(&spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtins_compile() {
        for spec in builtin_specs() {
            let grammar = ChannelGrammar::compile(&spec).unwrap();
            assert_eq!(grammar.local_currency(), Currency::UAH);
            assert_eq!(grammar.anchor_currency(), Currency::USD);
        }
    }

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(builtin("garant").unwrap().name(), "GARANT");
        assert!(builtin("KIT_GROUP").unwrap().comment_in_key());
        assert!(matches!(builtin("NOPE"), Err(ParserError::UnknownChannel(_))));
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<String> = builtin_specs().into_iter().map(|s| s.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 7);
    }
}
