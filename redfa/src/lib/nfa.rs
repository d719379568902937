use std::collections::BTreeSet;

use crate::Regex;

pub(crate) type StateId = usize;

pub(crate) struct NfaState {
    pub(crate) accepting: bool,
    pub(crate) eps: Vec<StateId>,
    pub(crate) trans: Vec<(char, StateId)>,
}

/// A nondeterministic finite automaton with ε moves, built by Thompson
/// construction from a [`Regex`] over a fixed alphabet.
pub struct Nfa {
    pub(crate) start: StateId,
    pub(crate) states: Vec<NfaState>,
}

impl Nfa {
    pub fn from_regex(re: &Regex) -> Nfa {
        let mut nfa = Nfa {
            start: 0,
            states: Vec::new(),
        };
        let start = nfa.add_state(false);
        let end = nfa.add_state(true);
        nfa.start = start;
        nfa.compile(re, start, end);
        nfa
    }

    fn add_state(&mut self, accepting: bool) -> StateId {
        self.states.push(NfaState {
            accepting,
            eps: Vec::new(),
            trans: Vec::new(),
        });
        self.states.len() - 1
    }

    fn compile(&mut self, re: &Regex, start: StateId, end: StateId) {
        match re {
            Regex::Empty => self.states[start].eps.push(end),
            Regex::Void => (),
            Regex::Lit(ch) => self.states[start].trans.push((*ch, end)),
            Regex::Concat(parts) => {
                let mut cur = start;
                for part in parts.iter().take(parts.len() - 1) {
                    let next = self.add_state(false);
                    self.compile(part, cur, next);
                    cur = next;
                }
                self.compile(parts.last().expect("non-empty concat"), cur, end);
            }
            Regex::Alt(lhs, rhs) => {
                self.compile(lhs, start, end);
                self.compile(rhs, start, end);
            }
            Regex::Star(inner) => {
                let mid = self.add_state(false);
                self.states[start].eps.push(mid);
                self.compile(inner, mid, mid);
                self.states[mid].eps.push(end);
            }
        }
    }

    /// The ε-closure of a set of states.
    pub(crate) fn eps_closure(&self, states: &BTreeSet<StateId>) -> BTreeSet<StateId> {
        let mut result = states.clone();
        let mut todo: Vec<StateId> = states.iter().copied().collect();
        while let Some(id) = todo.pop() {
            for &next in &self.states[id].eps {
                if result.insert(next) {
                    todo.push(next);
                }
            }
        }
        result
    }

    /// The set of states reachable from `states` on `ch`, before ε-closure.
    pub(crate) fn moves(&self, states: &BTreeSet<StateId>, ch: char) -> BTreeSet<StateId> {
        let mut result = BTreeSet::new();
        for &id in states {
            for &(c, next) in &self.states[id].trans {
                if c == ch {
                    result.insert(next);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn nfa_accepts(nfa: &Nfa, input: &str) -> bool {
        let mut cur = nfa.eps_closure(&[nfa.start].into_iter().collect());
        for ch in input.chars() {
            cur = nfa.eps_closure(&nfa.moves(&cur, ch));
        }
        cur.iter().any(|&id| nfa.states[id].accepting)
    }

    #[test]
    fn test_literal_concat() {
        let nfa = Nfa::from_regex(&Regex::parse("ab").unwrap());
        assert!(nfa_accepts(&nfa, "ab"));
        assert!(!nfa_accepts(&nfa, "a"));
        assert!(!nfa_accepts(&nfa, "abb"));
    }

    #[test]
    fn test_void_matches_nothing() {
        let nfa = Nfa::from_regex(&Regex::parse("@").unwrap());
        assert!(!nfa_accepts(&nfa, ""));
        assert!(!nfa_accepts(&nfa, "a"));
    }

    #[test]
    fn test_void_is_alternation_identity() {
        let nfa = Nfa::from_regex(&Regex::parse("@|ab").unwrap());
        assert!(nfa_accepts(&nfa, "ab"));
        assert!(!nfa_accepts(&nfa, ""));
    }

    #[test]
    fn test_alt_and_star() {
        let nfa = Nfa::from_regex(&Regex::parse("(a|b)*c").unwrap());
        assert!(nfa_accepts(&nfa, "c"));
        assert!(nfa_accepts(&nfa, "abbac"));
        assert!(!nfa_accepts(&nfa, "abba"));
    }
}
