use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Deserialize;

use lr0table::{GrammarConfig, ProductionRule};

// The on-disk shape:
//
//   { "grammar": { "<NT>": [ { "production": ["<sym>", …], "code": "<text>" }, … ], … },
//     "start-symbol": "<NT>",
//     "priorities": [ "<TERM>", … ],
//     "nonterminal-types": { "<NT>": "<type-name>", … },
//     "header-extras": [ "<line>", … ],
//     "verbose": <bool>,
//     "parser-name": "<identifier>" }

#[derive(Deserialize)]
struct RawConfig {
    grammar: BTreeMap<String, Vec<RawProduction>>,
    #[serde(rename = "start-symbol")]
    start_symbol: String,
    #[serde(default)]
    priorities: Vec<String>,
    /// Declaration order matters here: `field<k>` identifiers are handed
    /// out in the order types first appear in this object.
    #[serde(rename = "nonterminal-types", default)]
    nonterminal_types: IndexMap<String, String>,
    #[serde(rename = "header-extras", default)]
    header_extras: Vec<String>,
    #[serde(default)]
    verbose: bool,
    #[serde(rename = "parser-name")]
    parser_name: String,
}

#[derive(Deserialize)]
struct RawProduction {
    production: Vec<String>,
    #[serde(default)]
    code: String,
}

/// Parse a parser-generator JSON config into a [`GrammarConfig`].
pub fn parse_config(src: &str) -> Result<GrammarConfig, serde_json::Error> {
    let raw: RawConfig = serde_json::from_str(src)?;
    Ok(GrammarConfig {
        rules: raw
            .grammar
            .into_iter()
            .map(|(name, prods)| {
                let prods = prods
                    .into_iter()
                    .map(|p| ProductionRule {
                        terms: p.production,
                        action: p.code,
                    })
                    .collect();
                (name, prods)
            })
            .collect(),
        start_symbol: raw.start_symbol,
        priorities: raw.priorities,
        nonterminal_types: raw.nonterminal_types,
        header_extras: raw.header_extras,
        verbose: raw.verbose,
        name: raw.parser_name,
    })
}
