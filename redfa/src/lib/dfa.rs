use std::collections::{BTreeMap, BTreeSet, VecDeque};

use cfgram::Alphabet;

use crate::Nfa;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DfaState {
    pub accepting: bool,
    pub trans: BTreeMap<char, usize>,
}

/// A deterministic finite automaton, total over its alphabet: every state
/// has exactly one transition per alphabet symbol.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Dfa {
    pub start: usize,
    pub alphabet: Alphabet,
    pub states: Vec<DfaState>,
}

impl Dfa {
    /// Subset construction. State numbering is the BFS discovery order from
    /// the start subset, so it is deterministic. The empty subset acts as
    /// the sink state, making the result total over the alphabet.
    pub fn subset_construct(nfa: &Nfa, alphabet: &Alphabet) -> Dfa {
        let mut index: BTreeMap<BTreeSet<usize>, usize> = BTreeMap::new();
        let mut states = Vec::new();
        let mut todo = VecDeque::new();

        let start_set = nfa.eps_closure(&[nfa.start].into_iter().collect());
        index.insert(start_set.clone(), 0);
        states.push(DfaState {
            accepting: start_set.iter().any(|&id| nfa.states[id].accepting),
            trans: BTreeMap::new(),
        });
        todo.push_back(start_set);

        while let Some(cur) = todo.pop_front() {
            let cur_idx = index[&cur];
            for &ch in alphabet {
                let next = nfa.eps_closure(&nfa.moves(&cur, ch));
                let next_idx = match index.get(&next) {
                    Some(&i) => i,
                    None => {
                        let i = states.len();
                        index.insert(next.clone(), i);
                        states.push(DfaState {
                            accepting: next.iter().any(|&id| nfa.states[id].accepting),
                            trans: BTreeMap::new(),
                        });
                        todo.push_back(next);
                        i
                    }
                };
                states[cur_idx].trans.insert(ch, next_idx);
            }
        }

        Dfa {
            start: 0,
            alphabet: alphabet.clone(),
            states,
        }
    }

    /// Moore partition refinement. States are initially split by their
    /// accept flag, then repeatedly by the classes of their successors,
    /// until no class splits further.
    pub fn minimise(&self) -> Dfa {
        let mut class: Vec<usize> = self
            .states
            .iter()
            .map(|st| usize::from(st.accepting))
            .collect();

        loop {
            // A state's signature is its class plus the classes of all of
            // its successors, in alphabet order. New class ids are assigned
            // by first occurrence scanning states in index order.
            let mut sig_to_class: BTreeMap<(usize, Vec<usize>), usize> = BTreeMap::new();
            let mut next_class = Vec::with_capacity(self.states.len());
            for (i, st) in self.states.iter().enumerate() {
                let sig = (
                    class[i],
                    st.trans.values().map(|&t| class[t]).collect::<Vec<_>>(),
                );
                let n = sig_to_class.len();
                next_class.push(*sig_to_class.entry(sig).or_insert(n));
            }
            if next_class == class {
                break;
            }
            class = next_class;
        }

        let num_classes = class.iter().max().map_or(0, |&m| m + 1);
        let mut states = vec![None; num_classes];
        for (i, st) in self.states.iter().enumerate() {
            if states[class[i]].is_none() {
                states[class[i]] = Some(DfaState {
                    accepting: st.accepting,
                    trans: st.trans.iter().map(|(&ch, &t)| (ch, class[t])).collect(),
                });
            }
        }

        Dfa {
            start: class[self.start],
            alphabet: self.alphabet.clone(),
            states: states.into_iter().map(Option::unwrap).collect(),
        }
    }

    /// The complement automaton: every accept flag flipped, alphabet and
    /// transitions unchanged. Sound because the DFA is total.
    pub fn complement(mut self) -> Dfa {
        for st in &mut self.states {
            st.accepting = !st.accepting;
        }
        self
    }

    pub fn accepts(&self, input: &str) -> bool {
        let mut cur = self.start;
        for ch in input.chars() {
            match self.states[cur].trans.get(&ch) {
                Some(&next) => cur = next,
                None => return false,
            }
        }
        self.states[cur].accepting
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Regex;
    use cfgram::alphabet_from_str;

    fn dfa_for(pattern: &str, alphabet: &str) -> Dfa {
        let ab = alphabet_from_str(alphabet);
        let nfa = Nfa::from_regex(&Regex::parse(pattern).unwrap());
        Dfa::subset_construct(&nfa, &ab).minimise()
    }

    #[test]
    fn test_subset_construct_total() {
        let dfa = dfa_for("ab", "ab");
        for st in &dfa.states {
            assert_eq!(st.trans.len(), 2);
        }
        assert!(dfa.accepts("ab"));
        assert!(!dfa.accepts(""));
        assert!(!dfa.accepts("aba"));
    }

    #[test]
    fn test_minimise_collapses() {
        // a|b and (a|b) followed by nothing both need exactly 3 states:
        // start, accept, sink.
        let dfa = dfa_for("a|b", "ab");
        assert_eq!(dfa.states.len(), 3);
        assert!(dfa.accepts("a"));
        assert!(dfa.accepts("b"));
        assert!(!dfa.accepts("ab"));
    }

    #[test]
    fn test_complement_flips_accepts_only() {
        // A two-state DFA: q0 (accept) and q1. The complement must have q0
        // non-accepting, q1 accepting, and identical transitions.
        let dfa = Dfa {
            start: 0,
            alphabet: alphabet_from_str("a"),
            states: vec![
                DfaState {
                    accepting: true,
                    trans: [('a', 1)].into_iter().collect(),
                },
                DfaState {
                    accepting: false,
                    trans: [('a', 0)].into_iter().collect(),
                },
            ],
        };
        let comp = dfa.clone().complement();
        assert!(!comp.states[0].accepting);
        assert!(comp.states[1].accepting);
        assert_eq!(comp.states[0].trans, dfa.states[0].trans);
        assert_eq!(comp.states[1].trans, dfa.states[1].trans);
    }

    #[test]
    fn test_complement_of_listed_strings() {
        // The obfuscator's shape: complementing "@ | x₁ | x₂" yields a DFA
        // for everything over the alphabet except the listed strings.
        let ab = alphabet_from_str("ab");
        let nfa = Nfa::from_regex(&Regex::parse("@|ab|ba").unwrap());
        let comp = Dfa::subset_construct(&nfa, &ab).minimise().complement();
        assert!(!comp.accepts("ab"));
        assert!(!comp.accepts("ba"));
        assert!(comp.accepts(""));
        assert!(comp.accepts("aa"));
        assert!(comp.accepts("aba"));
    }
}
