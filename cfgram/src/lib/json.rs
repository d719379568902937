use std::{error::Error, fmt};

use serde::{Deserialize, Serialize};

use crate::{Alphabet, Cfg, Production, Symbol};

// The wire shape:
//
//   { "start": "<utf8>",
//     "rules": [ { "name": "<utf8>",
//                  "production": [ { "type": "T"|"NT", "data": "<char>" }, … ] },
//                … ] }
//
// Each "data" field holds exactly one code point. The alphabet is supplied
// externally and never stored in the JSON.

#[derive(Deserialize, Serialize)]
struct JsonCfg {
    start: String,
    rules: Vec<JsonRule>,
}

#[derive(Deserialize, Serialize)]
struct JsonRule {
    name: String,
    production: Vec<JsonSymbol>,
}

#[derive(Deserialize, Serialize)]
#[serde(tag = "type", content = "data")]
enum JsonSymbol {
    #[serde(rename = "T")]
    Terminal(String),
    #[serde(rename = "NT")]
    Nonterminal(String),
}

/// The various different possible CFG JSON decoding errors.
#[derive(Debug)]
pub enum CfgJsonError {
    Json(serde_json::Error),
    /// A "start", "name", or "data" field did not hold exactly one code point.
    NotOneCodePoint(String),
    IllegalTerminal(char),
}

impl Error for CfgJsonError {}

impl fmt::Display for CfgJsonError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CfgJsonError::Json(e) => write!(f, "{}", e),
            CfgJsonError::NotOneCodePoint(s) => {
                write!(f, "Expected exactly one code point, got \"{}\"", s)
            }
            CfgJsonError::IllegalTerminal(ch) => write!(f, "Illegal terminal: {}", ch),
        }
    }
}

impl From<serde_json::Error> for CfgJsonError {
    fn from(e: serde_json::Error) -> Self {
        CfgJsonError::Json(e)
    }
}

fn single_char(s: &str) -> Result<char, CfgJsonError> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(CfgJsonError::NotOneCodePoint(s.to_string())),
    }
}

/// Decode a CFG from its JSON form over the given alphabet.
///
/// Terminals are validated against the alphabet; nonterminals are added to
/// the nonterminal set as they are encountered, on either side of a rule.
/// This is the canonical round-trip format, so it accepts exactly what
/// [`cfg_to_json`] emits.
pub fn cfg_from_json(src: &str, alphabet: &Alphabet) -> Result<Cfg, CfgJsonError> {
    let data: JsonCfg = serde_json::from_str(src)?;

    let mut cfg = Cfg {
        alphabet: alphabet.clone(),
        nonterminals: Default::default(),
        start: single_char(&data.start)?,
        productions: Vec::new(),
    };

    for rule in &data.rules {
        let lhs = single_char(&rule.name)?;
        let mut rhs = Vec::with_capacity(rule.production.len());
        for sym in &rule.production {
            match sym {
                JsonSymbol::Terminal(s) => {
                    let ch = single_char(s)?;
                    if !alphabet.contains(&ch) {
                        return Err(CfgJsonError::IllegalTerminal(ch));
                    }
                    rhs.push(Symbol::Terminal(ch));
                }
                JsonSymbol::Nonterminal(s) => {
                    let ch = single_char(s)?;
                    cfg.nonterminals.insert(ch);
                    rhs.push(Symbol::Nonterminal(ch));
                }
            }
        }
        cfg.nonterminals.insert(lhs);
        cfg.productions.push(Production::new(lhs, rhs));
    }

    Ok(cfg)
}

/// Encode a CFG as its JSON form. The alphabet is not stored.
pub fn cfg_to_json(cfg: &Cfg) -> serde_json::Value {
    let rules = cfg
        .productions
        .iter()
        .map(|prod| JsonRule {
            name: prod.lhs.to_string(),
            production: prod
                .rhs
                .iter()
                .map(|sym| match *sym {
                    Symbol::Terminal(ch) => JsonSymbol::Terminal(ch.to_string()),
                    Symbol::Nonterminal(ch) => JsonSymbol::Nonterminal(ch.to_string()),
                })
                .collect(),
        })
        .collect();
    serde_json::to_value(JsonCfg {
        start: cfg.start.to_string(),
        rules,
    })
    .expect("CFG JSON encoding is infallible")
}
