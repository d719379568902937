use std::collections::{BTreeMap, BTreeSet, VecDeque};

use cfgram::{Alphabet, Cfg, Production, Symbol};
use redfa::Dfa;

use crate::{names::FreshNames, to_cnf};

/// A grammar generating exactly the given finite set of strings: one
/// nonterminal `S` and one production per string (an empty RHS for the empty
/// string). The set must be non-empty, or the result would declare a
/// nonterminal with no productions.
pub fn singleton_cfg(strings: &BTreeSet<String>, alphabet: &Alphabet) -> Cfg {
    let productions = strings
        .iter()
        .map(|s| Production::new('S', s.chars().map(Symbol::Terminal).collect()))
        .collect();
    Cfg {
        alphabet: alphabet.clone(),
        nonterminals: ['S'].into_iter().collect(),
        start: 'S',
        productions,
    }
}

/// A grammar for L(a) ∪ L(b). Nonterminals of `b` that collide with `a`'s
/// are renamed apart; a fresh start gets one unit production per operand.
pub fn union_of(a: &Cfg, b: &Cfg) -> Cfg {
    let mut alphabet = a.alphabet.clone();
    alphabet.extend(b.alphabet.iter().copied());

    let mut names = FreshNames::new(a);
    names.reserve(b);
    let renamed: BTreeMap<char, char> = b
        .nonterminals
        .iter()
        .filter(|nt| a.nonterminals.contains(nt))
        .map(|&nt| (nt, names.fresh()))
        .collect();
    let map_b = |ch: char| renamed.get(&ch).copied().unwrap_or(ch);

    let start = names.fresh();
    let mut productions = vec![
        Production::new(start, vec![Symbol::Nonterminal(a.start)]),
        Production::new(start, vec![Symbol::Nonterminal(map_b(b.start))]),
    ];
    productions.extend(a.productions.iter().cloned());
    productions.extend(b.productions.iter().map(|prod| {
        Production::new(
            map_b(prod.lhs),
            prod.rhs
                .iter()
                .map(|sym| match *sym {
                    Symbol::Terminal(ch) => Symbol::Terminal(ch),
                    Symbol::Nonterminal(ch) => Symbol::Nonterminal(map_b(ch)),
                })
                .collect(),
        )
    }));

    let mut nonterminals: BTreeSet<char> = a.nonterminals.clone();
    nonterminals.extend(b.nonterminals.iter().map(|&nt| map_b(nt)));
    nonterminals.insert(start);

    Cfg {
        alphabet,
        nonterminals,
        start,
        productions,
    }
}

/// A grammar for L(cfg) ∩ L(dfa), over `cfg`'s alphabet.
///
/// This is the Bar-Hillel product, taken over a weak-CNF normalisation of
/// the grammar so that only two production shapes need product rules:
/// `A → a` becomes `(p,A,δ(p,a)) → a`, and `A → B C` becomes
/// `(p,A,r) → (p,B,q) (q,C,r)`. Triples are materialised bottom-up from the
/// productive side and named with fresh code points, so the blow-up stays
/// proportional to what can actually derive something. The empty
/// intersection comes out as the self-productive `S → S` encoding.
pub fn intersect(cfg: &Cfg, dfa: &Dfa) -> Cfg {
    let norm = to_cnf(cfg);
    let has_epsilon = norm
        .productions
        .iter()
        .any(|p| p.lhs == norm.start && p.rhs.is_empty());

    let mut term_rules: Vec<(char, char)> = Vec::new();
    let mut bin_rules: Vec<(char, char, char)> = Vec::new();
    for prod in &norm.productions {
        match prod.rhs.as_slice() {
            [Symbol::Terminal(ch)] => term_rules.push((prod.lhs, *ch)),
            [Symbol::Nonterminal(b), Symbol::Nonterminal(c)] => {
                bin_rules.push((prod.lhs, *b, *c))
            }
            [] => (),
            _ => unreachable!("to_cnf output is weak CNF"),
        }
    }

    // Productive triples: (A, p, q) is productive iff A derives some string
    // that drives the DFA from p to q. Fixed point from the terminal rules
    // upward.
    let mut productive: BTreeMap<char, BTreeMap<usize, BTreeSet<usize>>> = BTreeMap::new();
    for &(nt, ch) in &term_rules {
        for (p, st) in dfa.states.iter().enumerate() {
            if let Some(&q) = st.trans.get(&ch) {
                productive.entry(nt).or_default().entry(p).or_default().insert(q);
            }
        }
    }
    loop {
        let mut changed = false;
        for &(a_nt, b_nt, c_nt) in &bin_rules {
            let mut additions: Vec<(usize, usize)> = Vec::new();
            if let (Some(bp), Some(cp)) = (productive.get(&b_nt), productive.get(&c_nt)) {
                for (&p, qs) in bp {
                    for q in qs {
                        if let Some(rs) = cp.get(q) {
                            additions.extend(rs.iter().map(|&r| (p, r)));
                        }
                    }
                }
            }
            let entry = productive.entry(a_nt).or_default();
            for (p, r) in additions {
                if entry.entry(p).or_default().insert(r) {
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }

    let is_productive = |productive: &BTreeMap<char, BTreeMap<usize, BTreeSet<usize>>>,
                         nt: char,
                         p: usize,
                         q: usize| {
        productive
            .get(&nt)
            .and_then(|m| m.get(&p))
            .map_or(false, |qs| qs.contains(&q))
    };

    // Name and emit the reachable productive triples, breadth-first from
    // the accepting start candidates.
    let mut names = FreshNames::new(&norm);
    let start = names.fresh();
    let mut name_of: BTreeMap<(char, usize, usize), char> = BTreeMap::new();
    let mut todo: VecDeque<(char, usize, usize)> = VecDeque::new();
    let mut productions: Vec<Production> = Vec::new();

    fn name_for(
        triple: (char, usize, usize),
        names: &mut FreshNames,
        name_of: &mut BTreeMap<(char, usize, usize), char>,
        todo: &mut VecDeque<(char, usize, usize)>,
    ) -> char {
        if let Some(&ch) = name_of.get(&triple) {
            return ch;
        }
        let ch = names.fresh();
        name_of.insert(triple, ch);
        todo.push_back(triple);
        ch
    }

    for (f, st) in dfa.states.iter().enumerate() {
        if st.accepting && is_productive(&productive, norm.start, dfa.start, f) {
            let nt = name_for((norm.start, dfa.start, f), &mut names, &mut name_of, &mut todo);
            productions.push(Production::new(start, vec![Symbol::Nonterminal(nt)]));
        }
    }
    if has_epsilon && dfa.states[dfa.start].accepting {
        productions.push(Production::new(start, Vec::new()));
    }

    while let Some((a_nt, p, r)) = todo.pop_front() {
        let lhs = name_of[&(a_nt, p, r)];
        for &(t_nt, ch) in &term_rules {
            if t_nt == a_nt && dfa.states[p].trans.get(&ch) == Some(&r) {
                productions.push(Production::new(lhs, vec![Symbol::Terminal(ch)]));
            }
        }
        for &(b_a, b_nt, c_nt) in &bin_rules {
            if b_a != a_nt {
                continue;
            }
            let qs: Vec<usize> = productive
                .get(&b_nt)
                .and_then(|m| m.get(&p))
                .map_or_else(Vec::new, |qs| qs.iter().copied().collect());
            for q in qs {
                if is_productive(&productive, c_nt, q, r) {
                    let bn = name_for((b_nt, p, q), &mut names, &mut name_of, &mut todo);
                    let cn = name_for((c_nt, q, r), &mut names, &mut name_of, &mut todo);
                    productions.push(Production::new(
                        lhs,
                        vec![Symbol::Nonterminal(bn), Symbol::Nonterminal(cn)],
                    ));
                }
            }
        }
    }

    if productions.is_empty() {
        productions.push(Production::new(start, vec![Symbol::Nonterminal(start)]));
    }

    let mut nonterminals: BTreeSet<char> = name_of.values().copied().collect();
    nonterminals.insert(start);

    Cfg {
        alphabet: cfg.alphabet.clone(),
        nonterminals,
        start,
        productions,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use cfgram::{alphabet_from_str, parse, validate};
    use redfa::{Nfa, Regex};

    #[test]
    fn test_singleton() {
        let strings: BTreeSet<String> = ["ab".to_string(), String::new()].into_iter().collect();
        let cfg = singleton_cfg(&strings, &alphabet_from_str("ab"));
        assert_eq!(validate(&cfg), Ok(()));
        assert_eq!(cfg.productions.len(), 2);
        assert!(cfg.productions.iter().any(|p| p.rhs.is_empty()));
    }

    #[test]
    fn test_union_renames_collisions() {
        let ab = alphabet_from_str("ab");
        let a = parse("S → a", &ab).unwrap();
        let b = parse("S → b", &ab).unwrap();
        let u = union_of(&a, &b);
        assert_eq!(validate(&u), Ok(()));
        let m = crate::Matcher::new(&u);
        assert!(m.matches("a"));
        assert!(m.matches("b"));
        assert!(!m.matches("ab"));
        assert!(!m.matches(""));
    }

    fn dfa_for(pattern: &str, alphabet: &str) -> Dfa {
        let ab = alphabet_from_str(alphabet);
        let nfa = Nfa::from_regex(&Regex::parse(pattern).unwrap());
        Dfa::subset_construct(&nfa, &ab).minimise()
    }

    #[test]
    fn test_intersect_with_complement() {
        // a* intersected with the complement of {aa} is a* minus "aa".
        let cfg = parse("S → a S | ε", &alphabet_from_str("a")).unwrap();
        let dfa = dfa_for("@|aa", "a").complement();
        let isect = intersect(&cfg, &dfa);
        assert_eq!(validate(&isect), Ok(()));
        let m = crate::Matcher::new(&isect);
        assert!(m.matches(""));
        assert!(m.matches("a"));
        assert!(!m.matches("aa"));
        assert!(m.matches("aaa"));
        assert!(m.matches("aaaaaa"));
    }

    #[test]
    fn test_intersect_empty() {
        // a+ intersected with the empty language: the ∅ encoding validates
        // and matches nothing.
        let cfg = parse("S → a S | a", &alphabet_from_str("a")).unwrap();
        let dfa = dfa_for("@", "a");
        let isect = intersect(&cfg, &dfa);
        assert_eq!(validate(&isect), Ok(()));
        let m = crate::Matcher::new(&isect);
        assert!(!m.matches(""));
        assert!(!m.matches("a"));
    }

    #[test]
    fn test_intersect_keeps_epsilon() {
        let cfg = parse("S → a S | ε", &alphabet_from_str("a")).unwrap();
        // The complement of {a} contains ε.
        let dfa = dfa_for("@|a", "a").complement();
        let isect = intersect(&cfg, &dfa);
        assert_eq!(validate(&isect), Ok(()));
        let m = crate::Matcher::new(&isect);
        assert!(m.matches(""));
        assert!(!m.matches("a"));
        assert!(m.matches("aa"));
    }
}
