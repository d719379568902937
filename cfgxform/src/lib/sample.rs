use std::collections::{BTreeMap, HashSet};

use cfgram::{Cfg, Symbol};
use rand::Rng;

use crate::to_cnf;

const MAX_SIZE: usize = 15;
const TESTS_PER_SIZE: usize = 1000;

/// Shared index of a weak-CNF normalisation, used by both the sampler and
/// the matcher. Nonterminals are interned to dense indices.
struct CnfIndex {
    start: usize,
    start_nullable: bool,
    nt_count: usize,
    /// Per nonterminal: the terminals `a` with a rule `A → a`.
    term_rules: Vec<Vec<char>>,
    /// All binary rules `(A, B, C)`.
    bin_rules: Vec<(usize, usize, usize)>,
    /// Per nonterminal: its binary rule bodies `(B, C)`.
    bin_by_lhs: Vec<Vec<(usize, usize)>>,
    /// Terminal → the nonterminals that derive it directly.
    term_index: BTreeMap<char, Vec<usize>>,
}

impl CnfIndex {
    fn new(cfg: &Cfg) -> CnfIndex {
        let cnf = to_cnf(cfg);
        let nt_idx: BTreeMap<char, usize> = cnf
            .nonterminals
            .iter()
            .enumerate()
            .map(|(i, &nt)| (nt, i))
            .collect();
        let nt_count = nt_idx.len();

        let mut idx = CnfIndex {
            start: nt_idx[&cnf.start],
            start_nullable: false,
            nt_count,
            term_rules: vec![Vec::new(); nt_count],
            bin_rules: Vec::new(),
            bin_by_lhs: vec![Vec::new(); nt_count],
            term_index: BTreeMap::new(),
        };
        for prod in &cnf.productions {
            let lhs = nt_idx[&prod.lhs];
            match prod.rhs.as_slice() {
                [] => idx.start_nullable = true,
                [Symbol::Terminal(ch)] => {
                    idx.term_rules[lhs].push(*ch);
                    idx.term_index.entry(*ch).or_default().push(lhs);
                }
                [Symbol::Nonterminal(b), Symbol::Nonterminal(c)] => {
                    let (b, c) = (nt_idx[b], nt_idx[c]);
                    idx.bin_rules.push((lhs, b, c));
                    idx.bin_by_lhs[lhs].push((b, c));
                }
                _ => unreachable!("to_cnf output is weak CNF"),
            }
        }
        idx
    }
}

/// A random string generator for a grammar.
///
/// `sample(rng, size)` treats `size` as a length cutoff and returns a random
/// string of the largest producible length not exceeding it, or `None` if no
/// length up to the cutoff is producible. Feasibility is driven by a
/// can-derive-length table over the weak-CNF form, extended lazily as larger
/// cutoffs are requested.
pub struct Sampler {
    idx: CnfIndex,
    /// `can[n][nt]`: does `nt` derive some string of exactly `n` terminals?
    can: Vec<Vec<bool>>,
}

impl Sampler {
    pub fn new(cfg: &Cfg) -> Sampler {
        Sampler {
            idx: CnfIndex::new(cfg),
            can: Vec::new(),
        }
    }

    fn ensure(&mut self, size: usize) {
        while self.can.len() <= size {
            let n = self.can.len();
            let mut row = vec![false; self.idx.nt_count];
            match n {
                0 => row[self.idx.start] = self.idx.start_nullable,
                1 => {
                    for (nt, ts) in self.idx.term_rules.iter().enumerate() {
                        row[nt] = !ts.is_empty();
                    }
                }
                _ => {
                    // Both halves of a binary rule derive at least one
                    // terminal, so this row only depends on earlier rows.
                    for &(a, b, c) in &self.idx.bin_rules {
                        if row[a] {
                            continue;
                        }
                        for k in 1..n {
                            if self.can[k][b] && self.can[n - k][c] {
                                row[a] = true;
                                break;
                            }
                        }
                    }
                }
            }
            self.can.push(row);
        }
    }

    /// Sample a string of the largest producible length ≤ `size`.
    pub fn sample<R: Rng>(&mut self, rng: &mut R, size: usize) -> Option<String> {
        self.ensure(size);
        let n = (0..=size).rev().find(|&n| self.can[n][self.idx.start])?;
        let mut out = String::new();
        self.emit(rng, self.idx.start, n, &mut out);
        Some(out)
    }

    fn emit<R: Rng>(&self, rng: &mut R, nt: usize, n: usize, out: &mut String) {
        if n == 0 {
            return;
        }
        if n == 1 {
            let ts = &self.idx.term_rules[nt];
            out.push(ts[rng.gen_range(0..ts.len())]);
            return;
        }
        let mut options: Vec<(usize, usize, usize)> = Vec::new();
        for &(b, c) in &self.idx.bin_by_lhs[nt] {
            for k in 1..n {
                if self.can[k][b] && self.can[n - k][c] {
                    options.push((b, c, k));
                }
            }
        }
        let (b, c, k) = options[rng.gen_range(0..options.len())];
        self.emit(rng, b, k, out);
        self.emit(rng, c, n - k, out);
    }
}

/// A membership predicate for a grammar: CYK over its weak-CNF form.
pub struct Matcher {
    idx: CnfIndex,
}

impl Matcher {
    pub fn new(cfg: &Cfg) -> Matcher {
        Matcher {
            idx: CnfIndex::new(cfg),
        }
    }

    pub fn matches(&self, input: &str) -> bool {
        let chars: Vec<char> = input.chars().collect();
        let n = chars.len();
        if n == 0 {
            return self.idx.start_nullable;
        }

        // table[l][i][nt]: nt derives chars[i..i+l].
        let mut table = vec![vec![vec![false; self.idx.nt_count]; n]; n + 1];
        for (i, ch) in chars.iter().enumerate() {
            if let Some(nts) = self.idx.term_index.get(ch) {
                for &nt in nts {
                    table[1][i][nt] = true;
                }
            }
        }
        for l in 2..=n {
            for i in 0..=n - l {
                for &(a, b, c) in &self.idx.bin_rules {
                    if table[l][i][a] {
                        continue;
                    }
                    for k in 1..l {
                        if table[k][i][b] && table[l - k][i + k][c] {
                            table[l][i][a] = true;
                            break;
                        }
                    }
                }
            }
        }
        table[n][0][self.idx.start]
    }
}

/// Differential membership fuzzing: for each size in `0..15`, run 1000
/// trials sampling from each grammar and asserting the other accepts.
/// Returns the first witness string the grammars disagree on, or `None` if
/// they seem equivalent. This is a probabilistic soundness check, not a
/// proof.
pub fn seem_equivalent<R: Rng>(a: &Cfg, b: &Cfg, rng: &mut R) -> Option<String> {
    let mut gen_a = Sampler::new(a);
    let mut gen_b = Sampler::new(b);
    let match_a = Matcher::new(a);
    let match_b = Matcher::new(b);

    // Membership is deterministic, so each distinct string only needs to be
    // checked once per direction.
    let mut checked_ab: HashSet<String> = HashSet::new();
    let mut checked_ba: HashSet<String> = HashSet::new();

    for size in 0..MAX_SIZE {
        for _ in 0..TESTS_PER_SIZE {
            // L(a) subset L(b)?
            if let Some(s) = gen_a.sample(rng, size) {
                if checked_ab.insert(s.clone()) && !match_b.matches(&s) {
                    return Some(s);
                }
            }
            // L(b) subset L(a)?
            if let Some(s) = gen_b.sample(rng, size) {
                if checked_ba.insert(s.clone()) && !match_a.matches(&s) {
                    return Some(s);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use cfgram::{alphabet_from_str, parse};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_sampler_a_star() {
        // At cutoff 3, the largest producible length is 3, so the sampler
        // must return "aaa".
        let cfg = parse("S → ε | a S", &alphabet_from_str("a")).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let mut sampler = Sampler::new(&cfg);
        assert_eq!(sampler.sample(&mut rng, 3), Some("aaa".to_string()));
        assert_eq!(sampler.sample(&mut rng, 0), Some(String::new()));
    }

    #[test]
    fn test_sampler_skips_unproducible_cutoffs() {
        // a^n b^n has no odd-length strings; cutoff 5 tops out at "aabb".
        let cfg = parse("S → a S b | ε", &alphabet_from_str("ab")).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let mut sampler = Sampler::new(&cfg);
        assert_eq!(sampler.sample(&mut rng, 5), Some("aabb".to_string()));
    }

    #[test]
    fn test_sampler_none_when_nothing_fits() {
        let cfg = parse("S → a b", &alphabet_from_str("ab")).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let mut sampler = Sampler::new(&cfg);
        assert_eq!(sampler.sample(&mut rng, 1), None);
        assert_eq!(sampler.sample(&mut rng, 2), Some("ab".to_string()));
    }

    #[test]
    fn test_matcher_a_star() {
        let cfg = parse("S → ε | a S", &alphabet_from_str("a")).unwrap();
        let m = Matcher::new(&cfg);
        assert!(m.matches(""));
        assert!(m.matches("aaaaa"));
        assert!(!m.matches("b"));
    }

    #[test]
    fn test_matcher_balanced() {
        let cfg = parse("S → a S b | ε", &alphabet_from_str("ab")).unwrap();
        let m = Matcher::new(&cfg);
        assert!(m.matches("ab"));
        assert!(m.matches("aaabbb"));
        assert!(!m.matches("aab"));
        assert!(!m.matches("ba"));
    }

    #[test]
    fn test_seem_equivalent_same_language() {
        let ab = alphabet_from_str("ab");
        let one = parse("S → a S b | ε", &ab).unwrap();
        // No terminating derivation at all: the first disagreement is the
        // empty string, which only `one` accepts.
        let two = parse("S → a T T → S b", &ab).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(seem_equivalent(&one, &two, &mut rng), Some(String::new()));

        let three = parse("S → T | ε T → a S b", &ab).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(seem_equivalent(&one, &three, &mut rng), None);
    }

    #[test]
    fn test_seem_equivalent_witness() {
        let ab = alphabet_from_str("ab");
        let one = parse("S → a", &ab).unwrap();
        let two = parse("S → a | b", &ab).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(seem_equivalent(&one, &two, &mut rng), Some("b".to_string()));
    }

    #[test]
    fn test_sampled_strings_match_back() {
        let cfg = parse("S → a S b | b a | ε", &alphabet_from_str("ab")).unwrap();
        let m = Matcher::new(&cfg);
        let mut rng = StdRng::seed_from_u64(3);
        let mut sampler = Sampler::new(&cfg);
        for size in 0..12 {
            if let Some(s) = sampler.sample(&mut rng, size) {
                assert!(m.matches(&s), "sampled {:?} not matched", s);
            }
        }
    }
}
