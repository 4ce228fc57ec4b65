//! Channel grammar configuration.
//!
//! Grammars come from a JSON file of the form `{ "channels": [GrammarSpec, ...] }`
//! or, without a file, from the built-in set. Every grammar is compiled up
//! front so a bad pattern fails the run before any channel is touched.
use fx_common::{ParserError, Result};
use fx_parser::channels::builtin_specs;
use fx_parser::{ChannelGrammar, GrammarSpec};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Contents of a grammar config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarConfig {
    /// One spec per channel.
    pub channels: Vec<GrammarSpec>,
}

impl GrammarConfig {
    /// Reads a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// The built-in channel grammars.
    pub fn builtin() -> Self {
        Self {
            channels: builtin_specs(),
        }
    }

    /// Compiles the grammars, restricted to `selected` when it is non-empty.
    ///
    /// Duplicate channel names and unknown selections are configuration errors.
    pub fn compile(&self, selected: &[String]) -> Result<Vec<ChannelGrammar>> {
        let mut names = HashSet::new();
        for spec in &self.channels {
            if !names.insert(spec.name.trim().to_uppercase()) {
                return Err(ParserError::Config(format!("duplicate channel {}", spec.name)));
            }
        }

        let wanted: Vec<String> = selected
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(unknown) = wanted.iter().find(|w| !names.contains(*w)) {
            return Err(ParserError::UnknownChannel(unknown.clone()));
        }

        self.channels
            .iter()
            .filter(|spec| wanted.is_empty() || wanted.contains(&spec.name.trim().to_uppercase()))
            .map(ChannelGrammar::compile)
            .collect()
    }
}

/// Loads `path` or falls back to the built-ins.
pub fn load(path: Option<&Path>) -> Result<GrammarConfig> {
    match path {
        Some(path) => GrammarConfig::from_file(path),
        None => Ok(GrammarConfig::builtin()),
    }
}
