#![forbid(unsafe_code)]

mod cnf;
mod compose;
mod names;
mod obfuscate;
mod rename;
mod sample;

pub use crate::{
    cnf::to_cnf,
    compose::{intersect, singleton_cfg, union_of},
    obfuscate::{obfuscate, obfuscate_seeded, write_obfuscated, ObfuscateError},
    rename::silly_rename,
    sample::{seem_equivalent, Matcher, Sampler},
};
