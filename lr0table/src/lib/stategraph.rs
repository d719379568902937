use std::collections::hash_map::HashMap;
use std::collections::BTreeMap;
use std::hash::BuildHasherDefault;

use fnv::FnvHasher;

use crate::{Grammar, Itemset, SIdx, StIdx, Symbol};

/// The canonical collection of LR(0) configurating sets, plus the
/// transition edges between them.
#[derive(Debug)]
pub struct StateGraph {
    /// Closed configurating sets, indexed by discovery order.
    states: Vec<Itemset>,
    /// For each state, a map from symbols to successor states.
    edges: Vec<BTreeMap<Symbol, StIdx>>,
}

impl StateGraph {
    /// Build the canonical collection for `grm`, seeded with the closure of
    /// `_parserInternalStart → . σ`. States are explored with a depth-first
    /// worklist and numbered in insertion order; duplicates are detected by
    /// itemset equality.
    pub fn build(grm: &Grammar) -> StateGraph {
        let mut seed = Itemset::new();
        seed.add(grm.start_prod(), SIdx(0));
        let state0 = seed.close(grm);

        let mut states = vec![state0.clone()];
        let mut edges: Vec<BTreeMap<Symbol, StIdx>> = vec![BTreeMap::new()];
        let mut seen: HashMap<Itemset, StIdx, BuildHasherDefault<FnvHasher>> =
            HashMap::with_hasher(BuildHasherDefault::default());
        seen.insert(state0, StIdx(0));

        let mut todo = vec![StIdx(0)];
        while let Some(stidx) = todo.pop() {
            for sym in states[usize::from(stidx)].next_symbols(grm) {
                let succ = states[usize::from(stidx)].goto(grm, sym).close(grm);
                let succ_idx = match seen.get(&succ) {
                    Some(&i) => i,
                    None => {
                        let i = StIdx::from(states.len());
                        states.push(succ.clone());
                        edges.push(BTreeMap::new());
                        seen.insert(succ, i);
                        todo.push(i);
                        i
                    }
                };
                edges[usize::from(stidx)].insert(sym, succ_idx);
            }
        }

        StateGraph { states, edges }
    }

    /// How many states does this `StateGraph` contain?
    pub fn all_states_len(&self) -> usize {
        self.states.len()
    }

    /// Return the itemset for closed state `stidx`. Panics if `stidx`
    /// doesn't exist.
    pub fn closed_state(&self, stidx: StIdx) -> &Itemset {
        &self.states[usize::from(stidx)]
    }

    /// Return an iterator over all closed states, in index order.
    pub fn iter_closed_states(&self) -> impl Iterator<Item = &Itemset> {
        self.states.iter()
    }

    /// Return the state reached from `stidx` over `sym`, if any.
    pub fn edge(&self, stidx: StIdx, sym: Symbol) -> Option<StIdx> {
        self.edges
            .get(usize::from(stidx))
            .and_then(|edges| edges.get(&sym))
            .copied()
    }

    /// Return the edges of state `stidx`. Panics if `stidx` doesn't exist.
    pub fn edges(&self, stidx: StIdx) -> &BTreeMap<Symbol, StIdx> {
        &self.edges[usize::from(stidx)]
    }

    /// The state every parse starts in.
    pub fn start_state(&self) -> StIdx {
        StIdx(0)
    }

    /// Return a pretty-printed version of the states and their edges.
    pub fn pp(&self, grm: &Grammar) -> String {
        let fmt_sym = |sym: Symbol| match sym {
            Symbol::Rule(ridx) => grm.rule_name(ridx).to_string(),
            Symbol::Token(tidx) => format!("'{}'", grm.token_name(tidx)),
        };

        let mut o = String::new();
        for (stidx, state) in self.states.iter().enumerate() {
            o.push_str(&format!("State {}:\n", stidx));
            for &(pidx, dot) in &state.items {
                o.push_str(&format!(
                    "    [{} ->",
                    grm.rule_name(grm.prod_to_rule(pidx))
                ));
                for (i, sym) in grm.prod(pidx).iter().enumerate() {
                    if i == usize::from(dot) {
                        o.push_str(" .");
                    }
                    o.push_str(&format!(" {}", fmt_sym(*sym)));
                }
                if usize::from(dot) == grm.prod(pidx).len() {
                    o.push_str(" .");
                }
                o.push_str("]\n");
            }
            for (&sym, &succ) in &self.edges[stidx] {
                o.push_str(&format!("    {} -> {}\n", fmt_sym(sym), usize::from(succ)));
            }
        }
        o
    }
}
