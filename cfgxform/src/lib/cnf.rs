use std::collections::{BTreeMap, BTreeSet};

use cfgram::{Cfg, Production, Symbol};

use crate::names::FreshNames;

/// Convert a grammar to weak Chomsky Normal Form: every production is
/// `A → B C` or `A → a`, except that the (fresh, never-referenced) start
/// nonterminal may carry `start → ε` when the language contains the empty
/// string. Intermediate rule naming is unconstrained; fresh nonterminals are
/// drawn sequentially from the private use area.
///
/// The empty language comes out as `start → start start`, which satisfies
/// the validator and derives nothing.
pub fn to_cnf(cfg: &Cfg) -> Cfg {
    let mut names = FreshNames::new(cfg);

    // A fresh start rule keeps the real start symbol off every RHS, so the
    // epsilon elimination below can safely park `start → ε` on it.
    let start = names.fresh();
    let mut prods: Vec<Production> = Vec::with_capacity(cfg.productions.len() + 1);
    prods.push(Production::new(start, vec![Symbol::Nonterminal(cfg.start)]));
    prods.extend(cfg.productions.iter().cloned());

    // TERM: terminals in multi-symbol productions move behind fresh
    // single-terminal nonterminals, one per distinct terminal.
    let mut term_nts: BTreeMap<char, char> = BTreeMap::new();
    for prod in &mut prods {
        if prod.rhs.len() < 2 {
            continue;
        }
        for sym in &mut prod.rhs {
            if let Symbol::Terminal(ch) = *sym {
                let nt = *term_nts.entry(ch).or_insert_with(|| names.fresh());
                *sym = Symbol::Nonterminal(nt);
            }
        }
    }
    for (&ch, &nt) in &term_nts {
        prods.push(Production::new(nt, vec![Symbol::Terminal(ch)]));
    }

    // BIN: right-factor long productions into two-symbol chains.
    let mut binned = Vec::with_capacity(prods.len());
    for prod in prods {
        if prod.rhs.len() <= 2 {
            binned.push(prod);
            continue;
        }
        let n = prod.rhs.len();
        let mut lhs = prod.lhs;
        for i in 0..n - 2 {
            let rest = names.fresh();
            binned.push(Production::new(
                lhs,
                vec![prod.rhs[i], Symbol::Nonterminal(rest)],
            ));
            lhs = rest;
        }
        binned.push(Production::new(lhs, vec![prod.rhs[n - 2], prod.rhs[n - 1]]));
    }

    // DEL: eliminate epsilon productions. RHS length is at most two here,
    // so the nullable-omission variants per production are a fixed handful.
    let nullable = nullable_set(&binned);
    let mut deled: Vec<Production> = Vec::new();
    for prod in &binned {
        let mut variants: Vec<Vec<Symbol>> = vec![Vec::new()];
        for sym in &prod.rhs {
            let omittable = matches!(sym, Symbol::Nonterminal(nt) if nullable.contains(nt));
            let mut next = Vec::with_capacity(variants.len() * 2);
            for v in &variants {
                let mut with = v.clone();
                with.push(*sym);
                next.push(with);
                if omittable {
                    next.push(v.clone());
                }
            }
            variants = next;
        }
        for v in variants {
            if !v.is_empty() {
                deled.push(Production::new(prod.lhs, v));
            }
        }
    }
    if nullable.contains(&start) {
        deled.push(Production::new(start, Vec::new()));
    }

    // UNIT: replace unit chains by the non-unit productions of everything
    // reachable through them.
    let mut by_lhs: BTreeMap<char, Vec<&Production>> = BTreeMap::new();
    for prod in &deled {
        by_lhs.entry(prod.lhs).or_default().push(prod);
    }
    let mut unit_free: Vec<Production> = Vec::new();
    let mut seen: BTreeSet<(char, Vec<Symbol>)> = BTreeSet::new();
    let mut lhs_order: Vec<char> = Vec::new();
    for prod in &deled {
        if !lhs_order.contains(&prod.lhs) {
            lhs_order.push(prod.lhs);
        }
    }
    for &lhs in &lhs_order {
        for target in unit_closure(lhs, &by_lhs) {
            for &prod in by_lhs.get(&target).map_or(&[][..], |v| &v[..]) {
                if unit_target(prod).is_some() {
                    continue;
                }
                if seen.insert((lhs, prod.rhs.clone())) {
                    unit_free.push(Production::new(lhs, prod.rhs.clone()));
                }
            }
        }
    }

    // Drop nonterminals that derive nothing or are unreachable from the
    // start, then rebuild the declared set from what is left.
    let productive = productive_set(&unit_free);
    let reachable = reachable_set(start, &unit_free, &productive);
    let mut productions: Vec<Production> = unit_free
        .into_iter()
        .filter(|p| {
            reachable.contains(&p.lhs)
                && p.rhs.iter().all(|sym| match sym {
                    Symbol::Terminal(_) => true,
                    Symbol::Nonterminal(nt) => productive.contains(nt),
                })
        })
        .collect();
    if productions.is_empty() {
        productions.push(Production::new(
            start,
            vec![Symbol::Nonterminal(start), Symbol::Nonterminal(start)],
        ));
    }

    Cfg {
        alphabet: cfg.alphabet.clone(),
        nonterminals: productions.iter().map(|p| p.lhs).collect(),
        start,
        productions,
    }
}

fn unit_target(prod: &Production) -> Option<char> {
    match prod.rhs.as_slice() {
        [Symbol::Nonterminal(nt)] => Some(*nt),
        _ => None,
    }
}

/// Every nonterminal reachable from `from` through unit productions,
/// including `from` itself, in discovery order.
fn unit_closure(from: char, by_lhs: &BTreeMap<char, Vec<&Production>>) -> Vec<char> {
    let mut order = vec![from];
    let mut i = 0;
    while i < order.len() {
        let cur = order[i];
        i += 1;
        for &prod in by_lhs.get(&cur).map_or(&[][..], |v| &v[..]) {
            if let Some(nt) = unit_target(prod) {
                if !order.contains(&nt) {
                    order.push(nt);
                }
            }
        }
    }
    order
}

fn nullable_set(prods: &[Production]) -> BTreeSet<char> {
    let mut nullable = BTreeSet::new();
    loop {
        let mut changed = false;
        for prod in prods {
            if nullable.contains(&prod.lhs) {
                continue;
            }
            let all_nullable = prod.rhs.iter().all(|sym| match sym {
                Symbol::Terminal(_) => false,
                Symbol::Nonterminal(nt) => nullable.contains(nt),
            });
            if all_nullable {
                nullable.insert(prod.lhs);
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}

fn productive_set(prods: &[Production]) -> BTreeSet<char> {
    let mut productive = BTreeSet::new();
    loop {
        let mut changed = false;
        for prod in prods {
            if productive.contains(&prod.lhs) {
                continue;
            }
            let ok = prod.rhs.iter().all(|sym| match sym {
                Symbol::Terminal(_) => true,
                Symbol::Nonterminal(nt) => productive.contains(nt),
            });
            if ok {
                productive.insert(prod.lhs);
                changed = true;
            }
        }
        if !changed {
            return productive;
        }
    }
}

fn reachable_set(
    start: char,
    prods: &[Production],
    productive: &BTreeSet<char>,
) -> BTreeSet<char> {
    let mut reachable = BTreeSet::new();
    reachable.insert(start);
    loop {
        let mut changed = false;
        for prod in prods {
            if !reachable.contains(&prod.lhs) {
                continue;
            }
            // Only walk through productions that survive the productivity
            // filter, or we would keep dead branches alive.
            if !prod.rhs.iter().all(|sym| match sym {
                Symbol::Terminal(_) => true,
                Symbol::Nonterminal(nt) => productive.contains(nt),
            }) {
                continue;
            }
            for sym in &prod.rhs {
                if let Symbol::Nonterminal(nt) = sym {
                    if reachable.insert(*nt) {
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            return reachable;
        }
    }
}
