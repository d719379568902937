#![forbid(unsafe_code)]

mod config;
mod emit;

pub use crate::config::parse_config;
pub use crate::emit::emit;

use std::{error::Error, fmt};

use lr0table::{Grammar, GrammarError, StateGraph, StateTable};

/// The result of running the generator over a config: the two output texts
/// plus everything a front end needs for diagnostics.
pub struct Generated {
    /// The parser's name; output files are conventionally named
    /// `<name>Parser.h` and `<name>Parser.cpp`.
    pub name: String,
    pub header: String,
    pub source: String,
    /// Pretty-printed conflict warnings, if table construction hit any.
    pub conflicts: Option<String>,
    /// Pretty-printed configurating sets, for verbose output.
    pub states: String,
}

/// The various different possible generator errors.
#[derive(Debug)]
pub enum GenError {
    Config(serde_json::Error),
    Grammar(GrammarError),
}

impl Error for GenError {}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GenError::Config(e) => write!(f, "Invalid parser configuration: {}", e),
            GenError::Grammar(e) => write!(f, "{}", e),
        }
    }
}

impl From<serde_json::Error> for GenError {
    fn from(e: serde_json::Error) -> Self {
        GenError::Config(e)
    }
}

impl From<GrammarError> for GenError {
    fn from(e: GrammarError) -> Self {
        GenError::Grammar(e)
    }
}

/// Run the whole generator pipeline over a JSON config: parse, index,
/// build the configurating sets and action table, and emit the output
/// texts. Conflicts do not fail the build; they are returned for the
/// caller to warn about.
pub fn generate(config_src: &str) -> Result<Generated, GenError> {
    let config = parse_config(config_src)?;
    let grm = Grammar::new(config)?;
    let sg = StateGraph::build(&grm);
    let st = StateTable::new(&grm, &sg);

    let (header, source) = emit(&grm, &sg, &st);
    Ok(Generated {
        name: grm.name().to_string(),
        header,
        source,
        conflicts: st.conflicts().map(|c| c.pp(&grm)),
        states: sg.pp(&grm),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_generate_end_to_end() {
        let config = r##"{
            "grammar": {
                "E": [
                    { "production": ["E", "+", "E"], "code": "$$ = $1 + $3;" },
                    { "production": ["int"], "code": "$$ = std::stoi($1);" }
                ]
            },
            "start-symbol": "E",
            "priorities": ["+"],
            "nonterminal-types": { "E": "int" },
            "header-extras": ["#include <string>"],
            "verbose": false,
            "parser-name": "Calc"
        }"##;
        let generated = generate(config).unwrap();
        assert_eq!(generated.name, "Calc");
        assert!(!generated.header.contains("%%"));
        assert!(!generated.source.contains("%%"));
        assert!(generated.source.contains("reduce_E_from_E_+_E"));
        assert!(generated.source.contains("_parserArg0 = _parserArg1 + _parserArg3;"));
        // The ambiguous E + E grammar must have produced shift/reduce
        // warnings but still generated.
        assert!(generated.conflicts.is_some());
    }

    #[test]
    fn test_generate_reserved_name() {
        let config = r#"{
            "grammar": { "_parserInternalStart": [ { "production": ["a"], "code": "" } ] },
            "start-symbol": "_parserInternalStart",
            "nonterminal-types": { "_parserInternalStart": "int" },
            "parser-name": "Bad"
        }"#;
        match generate(config) {
            Err(GenError::Grammar(GrammarError::ReservedNameCollision)) => (),
            r => panic!("expected ReservedNameCollision, got {:?}", r.err()),
        }
    }
}
