use std::collections::BTreeSet;
use std::{error::Error, fmt, fs, io, path::Path};

use cfgram::{alphabet_to_string, cfg_to_json, validate, Cfg, CfgValidationError};
use rand::{rngs::StdRng, SeedableRng};
use redfa::{escape, Dfa, Nfa, Regex};

use crate::{intersect, seem_equivalent, silly_rename, singleton_cfg, to_cnf, union_of, Sampler};

/// How many distinct strings the obfuscator tries to carve out of the
/// grammar's language.
const NUM_STRINGS: usize = 10;
/// First length cutoff handed to the sampler.
const BASE_SIZE: usize = 5;
/// Guard bound on the size-escalation loop. A language whose strings all
/// evade the sampler up to here produces `SamplingExhaustion`; a finite
/// language that simply has fewer than [`NUM_STRINGS`] members proceeds with
/// whatever was collected.
const MAX_SIZE: usize = 64;

const DEFAULT_SEED: u64 = 0xDEADBEEF;

/// The various different possible obfuscation failures. `Invalid` and
/// `FuzzMismatch` indicate a bug in a transformation, not bad input.
#[derive(Debug)]
pub enum ObfuscateError {
    /// Could not sample enough strings from the grammar.
    SamplingExhaustion,
    /// The obfuscated grammar disagreed with the source on the contained
    /// string.
    FuzzMismatch(String),
    Invalid(CfgValidationError),
}

impl Error for ObfuscateError {}

impl fmt::Display for ObfuscateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ObfuscateError::SamplingExhaustion => {
                write!(f, "Could not sample enough strings from the grammar")
            }
            ObfuscateError::FuzzMismatch(s) => {
                write!(f, "Obfuscated grammar disagrees with its source on \"{}\"", s)
            }
            ObfuscateError::Invalid(e) => write!(f, "Produced an invalid grammar: {}", e),
        }
    }
}

impl From<CfgValidationError> for ObfuscateError {
    fn from(e: CfgValidationError) -> Self {
        ObfuscateError::Invalid(e)
    }
}

/// Obfuscate with the default seed. See [`obfuscate_seeded`].
pub fn obfuscate(cfg: &Cfg) -> Result<Cfg, ObfuscateError> {
    obfuscate_seeded(cfg, DEFAULT_SEED)
}

/// Structurally scramble a grammar without changing its language:
///
/// 1. Sample a set X of distinct strings from the grammar, escalating the
///    length cutoff from 5.
/// 2. Build a DFA for Σ* \ X by complementing the compiled `@ | esc(x)…`
///    pattern.
/// 3. Intersect the grammar with that DFA, masking its original structure.
/// 4. Union the result with the grammar generating exactly X; since
///    X ⊆ L(G), this restores L(G) precisely:
///    (L(G) \ X) ∪ X ∩ L(G) = L(G).
/// 5. Convert to weak CNF and rename every nonterminal.
///
/// Every intermediate grammar is validated, and the result is
/// fuzz-checked against the source; either failing is a hard error. The
/// result's nonterminal count expands substantially, which is the point.
pub fn obfuscate_seeded(cfg: &Cfg, seed: u64) -> Result<Cfg, ObfuscateError> {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut sampler = Sampler::new(cfg);
    let mut singletons: BTreeSet<String> = BTreeSet::new();
    for size in BASE_SIZE..=MAX_SIZE {
        if let Some(s) = sampler.sample(&mut rng, size) {
            singletons.insert(s);
            if singletons.len() == NUM_STRINGS {
                break;
            }
        }
    }
    if singletons.is_empty() {
        return Err(ObfuscateError::SamplingExhaustion);
    }

    let mut pattern = String::from("@");
    for s in &singletons {
        pattern.push_str(" | ");
        pattern.push_str(&escape(s));
    }
    let re = Regex::parse(&pattern).expect("escaped pattern always parses");
    let dfa = Dfa::subset_construct(&Nfa::from_regex(&re), &cfg.alphabet)
        .minimise()
        .complement();

    let all_but_singletons = intersect(cfg, &dfa);
    validate(&all_but_singletons)?;

    let merged = union_of(&all_but_singletons, &singleton_cfg(&singletons, &cfg.alphabet));
    validate(&merged)?;

    let normalised = to_cnf(&merged);
    validate(&normalised)?;

    let scrambled = silly_rename(&normalised);
    validate(&scrambled)?;

    if let Some(witness) = seem_equivalent(cfg, &scrambled, &mut rng) {
        return Err(ObfuscateError::FuzzMismatch(witness));
    }
    Ok(scrambled)
}

/// Write an obfuscated grammar to the file named by `part_name`, wrapped as
/// `{"alphabet": "<code points>", "cfg": <cfgJson>}`.
pub fn write_obfuscated<P: AsRef<Path>>(cfg: &Cfg, part_name: P) -> io::Result<()> {
    let object = serde_json::json!({
        "alphabet": alphabet_to_string(&cfg.alphabet),
        "cfg": cfg_to_json(cfg),
    });
    fs::write(part_name, object.to_string())
}
