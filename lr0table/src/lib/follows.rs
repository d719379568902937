use vob::Vob;

use crate::{Firsts, Grammar, RIdx, Symbol, TIdx};

/// `Follows` stores the FOLLOW set for every rule of a grammar: the tokens
/// (with EOF for the start rule) that can immediately follow the rule in
/// some sentential form.
#[derive(Debug)]
pub struct Follows {
    follows: Vec<Vob>,
}

impl Follows {
    /// Generates and returns the follows set for the given grammar.
    pub fn new(grm: &Grammar, firsts: &Firsts) -> Self {
        let mut follows = Follows {
            follows: vec![Vob::from_elem(false, grm.tokens_len()); grm.rules_len()],
        };
        // EOF follows the synthetic start rule.
        follows.follows[usize::from(grm.start_rule_idx())]
            .set(usize::from(grm.eof_token_idx()), true);

        // For each rule occurrence, scan the rest of its production: a
        // token is added and ends the scan; a rule contributes its FIRST
        // set and ends the scan unless it is nullable. A scan that falls
        // off the end pulls in the FOLLOW set of the production's own rule.
        loop {
            let mut changed = false;
            for pidx in grm.iter_pidxs() {
                let lhs = grm.prod_to_rule(pidx);
                let prod = grm.prod(pidx);
                for (i, sym) in prod.iter().enumerate() {
                    let a_ridx = match *sym {
                        Symbol::Rule(r) => r,
                        Symbol::Token(_) => continue,
                    };
                    let mut ran_off_end = true;
                    for sym in prod.iter().skip(i + 1) {
                        match *sym {
                            Symbol::Token(tidx) => {
                                if follows.follows[usize::from(a_ridx)]
                                    .set(usize::from(tidx), true)
                                {
                                    changed = true;
                                }
                                ran_off_end = false;
                                break;
                            }
                            Symbol::Rule(b_ridx) => {
                                if follows.follows[usize::from(a_ridx)].or(firsts.firsts(b_ridx)) {
                                    changed = true;
                                }
                                if !firsts.is_nullable(b_ridx) {
                                    ran_off_end = false;
                                    break;
                                }
                            }
                        }
                    }
                    if ran_off_end {
                        for tidx in grm.iter_tidxs() {
                            let bit = follows.is_set(lhs, tidx);
                            if bit
                                && follows.follows[usize::from(a_ridx)]
                                    .set(usize::from(tidx), true)
                            {
                                changed = true;
                            }
                        }
                    }
                }
            }
            if !changed {
                return follows;
            }
        }
    }

    /// Returns true if token `tidx` is in the follow set of rule `ridx`.
    pub fn is_set(&self, ridx: RIdx, tidx: TIdx) -> bool {
        self.follows[usize::from(ridx)][usize::from(tidx)]
    }

    /// Get all the follows for rule `ridx` as a bit vector over tokens.
    pub fn follows(&self, ridx: RIdx) -> &Vob {
        &self.follows[usize::from(ridx)]
    }
}

#[cfg(test)]
mod test {
    use super::Follows;
    use crate::{test_utils::grammar, Firsts, Grammar};

    fn has(grm: &Grammar, follows: &Follows, rule: &str, should_be: &[&str]) {
        let ridx = grm.rule_idx(rule).unwrap();
        for tidx in grm.iter_tidxs() {
            let name = grm.token_name(tidx);
            if should_be.contains(&name) {
                if !follows.is_set(ridx, tidx) {
                    panic!("{} is not set in {}", name, rule);
                }
            } else if follows.is_set(ridx, tidx) {
                panic!("{} is incorrectly set in {}", name, rule);
            }
        }
    }

    #[test]
    fn test_follow() {
        // Adapted from p2 of https://www.cs.uaf.edu/~cs331/notes/FirstFollow.pdf
        let grm = grammar(
            "E",
            &[
                "E: T E2",
                "E2: + T E2 |",
                "T: F T2",
                "T2: * F T2 |",
                "F: ( E ) | id",
            ],
        );
        let firsts = Firsts::new(&grm);
        let follows = Follows::new(&grm, &firsts);
        has(&grm, &follows, "E", &[")", "SCAN_EOF"]);
        has(&grm, &follows, "E2", &[")", "SCAN_EOF"]);
        has(&grm, &follows, "T", &["+", ")", "SCAN_EOF"]);
        has(&grm, &follows, "T2", &["+", ")", "SCAN_EOF"]);
        has(&grm, &follows, "F", &["+", "*", ")", "SCAN_EOF"]);
    }

    #[test]
    fn test_follow_start() {
        let grm = grammar("S", &["S: a S |"]);
        let firsts = Firsts::new(&grm);
        let follows = Follows::new(&grm, &firsts);
        has(&grm, &follows, crate::START_RULE, &["SCAN_EOF"]);
        has(&grm, &follows, "S", &["SCAN_EOF"]);
    }

    #[test]
    fn test_follow_nullable_gap() {
        // With B nullable, FIRST(C) reaches back across it into FOLLOW(A),
        // and C's follow scan runs off the end into FOLLOW(S).
        let grm = grammar("S", &["S: A B C d", "A: a", "B: b |", "C: c"]);
        let firsts = Firsts::new(&grm);
        let follows = Follows::new(&grm, &firsts);
        has(&grm, &follows, "A", &["b", "c"]);
        has(&grm, &follows, "B", &["c"]);
        has(&grm, &follows, "C", &["d"]);
    }

    #[test]
    fn test_follow_inherits_lhs() {
        let grm = grammar("S", &["S: A b", "A: a A |"]);
        let firsts = Firsts::new(&grm);
        let follows = Follows::new(&grm, &firsts);
        has(&grm, &follows, "A", &["b"]);
        has(&grm, &follows, "S", &["SCAN_EOF"]);
    }
}
