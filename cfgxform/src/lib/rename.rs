use std::collections::{BTreeMap, BTreeSet};

use cfgram::{Cfg, Production, Symbol};

/// First code point handed out by [`silly_rename`].
const RENAME_BASE: u32 = 0x1F300;

/// Rewrite every nonterminal to a fresh code point drawn sequentially from a
/// high Unicode base, assigned in first-encounter order scanning productions
/// (LHS first, then RHS symbols). The mapping is an injection, so the
/// language is preserved exactly; alphabet and terminals are untouched.
pub fn silly_rename(cfg: &Cfg) -> Cfg {
    let mut replacements: BTreeMap<char, char> = BTreeMap::new();
    let mut nonterminals: BTreeSet<char> = BTreeSet::new();
    let mut next = RENAME_BASE;

    fn name_for(
        ch: char,
        replacements: &mut BTreeMap<char, char>,
        nonterminals: &mut BTreeSet<char>,
        next: &mut u32,
    ) -> char {
        if let Some(&fresh) = replacements.get(&ch) {
            return fresh;
        }
        let fresh = loop {
            let cand = char::from_u32(*next);
            *next += 1;
            if let Some(c) = cand {
                break c;
            }
        };
        replacements.insert(ch, fresh);
        nonterminals.insert(fresh);
        fresh
    }

    let productions = cfg
        .productions
        .iter()
        .map(|prod| {
            let lhs = name_for(prod.lhs, &mut replacements, &mut nonterminals, &mut next);
            let rhs = prod
                .rhs
                .iter()
                .map(|sym| match *sym {
                    Symbol::Terminal(ch) => Symbol::Terminal(ch),
                    Symbol::Nonterminal(ch) => Symbol::Nonterminal(name_for(
                        ch,
                        &mut replacements,
                        &mut nonterminals,
                        &mut next,
                    )),
                })
                .collect();
            Production::new(lhs, rhs)
        })
        .collect();

    let start = name_for(cfg.start, &mut replacements, &mut nonterminals, &mut next);

    Cfg {
        alphabet: cfg.alphabet.clone(),
        nonterminals,
        start,
        productions,
    }
}
