#![forbid(unsafe_code)]

mod dfa;
mod nfa;
mod regex;

pub use crate::{
    dfa::{Dfa, DfaState},
    nfa::Nfa,
    regex::{escape, is_special_char, Regex, RegexParseError},
};
