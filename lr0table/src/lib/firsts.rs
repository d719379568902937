use vob::Vob;

use crate::{Grammar, RIdx, Symbol, TIdx};

/// `Firsts` stores the nullable bit and FIRST set for every rule of a
/// grammar. For example, given the grammar:
///
/// ```text
///   S: A b;
///   A: a | ;
/// ```
///
/// the following assertions (and only them) hold:
///
/// ```text
///   firsts.is_set(S, a); firsts.is_set(S, b);
///   firsts.is_set(A, a); firsts.is_nullable(A);
/// ```
#[derive(Debug)]
pub struct Firsts {
    firsts: Vec<Vob>,
    nullable: Vob,
}

impl Firsts {
    /// Generates and returns the firsts set for the given grammar.
    pub fn new(grm: &Grammar) -> Self {
        let mut firsts = Firsts {
            firsts: vec![Vob::from_elem(false, grm.tokens_len()); grm.rules_len()],
            nullable: Vob::from_elem(false, grm.rules_len()),
        };

        // A rule is nullable iff one of its productions consists entirely
        // of nullable terms (vacuously true for an empty production).
        // Iterate until no rule's bit changes.
        loop {
            let mut changed = false;
            for pidx in grm.iter_pidxs() {
                let ridx = grm.prod_to_rule(pidx);
                if firsts.is_nullable(ridx) {
                    continue;
                }
                let all_nullable = grm.prod(pidx).iter().all(|sym| match *sym {
                    Symbol::Token(_) => false,
                    Symbol::Rule(s_ridx) => firsts.is_nullable(s_ridx),
                });
                if all_nullable {
                    firsts.nullable.set(usize::from(ridx), true);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        // FIRST: scan each production left to right. A token lands in the
        // rule's FIRST set and ends the scan; a rule contributes its own
        // FIRST set and only lets the scan continue if it is nullable.
        loop {
            let mut changed = false;
            for pidx in grm.iter_pidxs() {
                let ridx = grm.prod_to_rule(pidx);
                for sym in grm.prod(pidx) {
                    match *sym {
                        Symbol::Token(s_tidx) => {
                            if firsts.firsts[usize::from(ridx)].set(usize::from(s_tidx), true) {
                                changed = true;
                            }
                            break;
                        }
                        Symbol::Rule(s_ridx) => {
                            for tidx in grm.iter_tidxs() {
                                let bit = firsts.is_set(s_ridx, tidx);
                                if bit
                                    && firsts.firsts[usize::from(ridx)]
                                        .set(usize::from(tidx), true)
                                {
                                    changed = true;
                                }
                            }
                            if !firsts.is_nullable(s_ridx) {
                                break;
                            }
                        }
                    }
                }
            }
            if !changed {
                return firsts;
            }
        }
    }

    /// Returns true if token `tidx` is in the first set of rule `ridx`.
    pub fn is_set(&self, ridx: RIdx, tidx: TIdx) -> bool {
        self.firsts[usize::from(ridx)][usize::from(tidx)]
    }

    /// Get all the firsts for rule `ridx` as a bit vector over tokens.
    pub fn firsts(&self, ridx: RIdx) -> &Vob {
        &self.firsts[usize::from(ridx)]
    }

    /// Does rule `ridx` derive the empty string?
    pub fn is_nullable(&self, ridx: RIdx) -> bool {
        self.nullable[usize::from(ridx)]
    }
}

#[cfg(test)]
mod test {
    use super::Firsts;
    use crate::{test_utils::grammar, Grammar};

    fn has(grm: &Grammar, firsts: &Firsts, rule: &str, should_be: &[&str]) {
        let ridx = grm.rule_idx(rule).unwrap();
        for tidx in grm.iter_tidxs() {
            let name = grm.token_name(tidx);
            if should_be.contains(&name) {
                if !firsts.is_set(ridx, tidx) {
                    panic!("{} is not set in {}", name, rule);
                }
            } else if firsts.is_set(ridx, tidx) {
                panic!("{} is incorrectly set in {}", name, rule);
            }
        }
    }

    #[test]
    fn test_first() {
        let grm = grammar("C", &["C: c", "D: d", "E: D | C", "F: E"]);
        let firsts = Firsts::new(&grm);
        has(&grm, &firsts, "C", &["c"]);
        has(&grm, &firsts, "D", &["d"]);
        has(&grm, &firsts, "E", &["d", "c"]);
        has(&grm, &firsts, "F", &["d", "c"]);
        has(&grm, &firsts, crate::START_RULE, &["c"]);
    }

    #[test]
    fn test_first_no_subsequent_rules() {
        let grm = grammar("C", &["C: c", "D: d", "E: D C"]);
        let firsts = Firsts::new(&grm);
        has(&grm, &firsts, "E", &["d"]);
    }

    #[test]
    fn test_first_epsilon() {
        let grm = grammar("A", &["A: B a", "B: b |", "C: c |", "D: C"]);
        let firsts = Firsts::new(&grm);
        has(&grm, &firsts, "A", &["b", "a"]);
        has(&grm, &firsts, "C", &["c"]);
        has(&grm, &firsts, "D", &["c"]);
        assert!(!firsts.is_nullable(grm.rule_idx("A").unwrap()));
        assert!(firsts.is_nullable(grm.rule_idx("B").unwrap()));
        assert!(firsts.is_nullable(grm.rule_idx("C").unwrap()));
        assert!(firsts.is_nullable(grm.rule_idx("D").unwrap()));
    }

    #[test]
    fn test_first_nullable_prefix() {
        // FIRST(A) must see through the nullable B to the b of C.
        let grm = grammar("A", &["A: B C", "B: a |", "C: b"]);
        let firsts = Firsts::new(&grm);
        has(&grm, &firsts, "A", &["a", "b"]);
    }

    #[test]
    fn test_nullable_chain() {
        let grm = grammar("A", &["A: B C", "B: |", "C: B B"]);
        let firsts = Firsts::new(&grm);
        assert!(firsts.is_nullable(grm.rule_idx("A").unwrap()));
        assert!(firsts.is_nullable(grm.rule_idx("C").unwrap()));
        has(&grm, &firsts, "A", &[]);
    }
}
