#![forbid(unsafe_code)]

mod cfg;
mod json;
mod parse;
mod validate;

pub use crate::{
    cfg::{alphabet_from_str, alphabet_to_string, is_subset_of, Alphabet, Cfg, Production, Symbol},
    json::{cfg_from_json, cfg_to_json, CfgJsonError},
    parse::{parse, scan, CfgParseError, Token},
    validate::{validate, CfgValidationError},
};
