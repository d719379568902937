use std::collections::BTreeMap;

use crate::{Firsts, Follows, Grammar, PIdx, StIdx, StateGraph, Symbol, TIdx};

/// A parse action for one state/symbol cell.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    /// Shift (or, over a rule symbol, goto) state X.
    Shift(StIdx),
    /// Reduce production X.
    Reduce(PIdx),
    /// Accept the input.
    Halt,
}

/// Conflicts found, and automatically resolved, during table construction.
/// They are warnings, not errors: reduce/reduce resolves first-writer-wins,
/// shift/reduce by production priority (with shift winning ties).
#[derive(Debug, Default)]
pub struct Conflicts {
    reduce_reduce: Vec<(PIdx, PIdx, StIdx)>,
    shift_reduce: Vec<(TIdx, PIdx, StIdx)>,
}

impl Conflicts {
    /// Return an iterator over all reduce/reduce conflicts, as (winning
    /// production, losing production, state) triples.
    pub fn rr_conflicts(&self) -> impl Iterator<Item = &(PIdx, PIdx, StIdx)> {
        self.reduce_reduce.iter()
    }

    /// Return an iterator over all shift/reduce conflicts, as (token,
    /// reduce production, state) triples.
    pub fn sr_conflicts(&self) -> impl Iterator<Item = &(TIdx, PIdx, StIdx)> {
        self.shift_reduce.iter()
    }

    /// How many reduce/reduce conflicts are there?
    pub fn rr_len(&self) -> usize {
        self.reduce_reduce.len()
    }

    /// How many shift/reduce conflicts are there?
    pub fn sr_len(&self) -> usize {
        self.shift_reduce.len()
    }

    /// Returns a pretty-printed version of the conflicts.
    pub fn pp(&self, grm: &Grammar) -> String {
        let mut s = String::new();
        for (pidx, r_pidx, stidx) in self.rr_conflicts() {
            s.push_str(&format!(
                "Reduce/reduce conflict in state {}: Reduce({}) / Reduce({})\n",
                usize::from(*stidx),
                grm.pp_prod(*pidx),
                grm.pp_prod(*r_pidx)
            ));
        }
        for (tidx, pidx, stidx) in self.sr_conflicts() {
            s.push_str(&format!(
                "Shift/reduce conflict in state {}: Shift(\"{}\") / Reduce({})\n",
                usize::from(*stidx),
                grm.token_name(*tidx),
                grm.pp_prod(*pidx)
            ));
        }
        s
    }
}

/// The action table of a grammar: one symbol → action map per state.
pub struct StateTable {
    actions: Vec<BTreeMap<Symbol, Action>>,
    conflicts: Option<Conflicts>,
}

impl StateTable {
    pub fn new(grm: &Grammar, sg: &StateGraph) -> StateTable {
        let firsts = Firsts::new(grm);
        let follows = Follows::new(grm, &firsts);

        let mut conflicts = Conflicts::default();
        let mut actions = Vec::with_capacity(sg.all_states_len());

        for (st_i, state) in sg.iter_closed_states().enumerate() {
            let stidx = StIdx::from(st_i);
            let mut acts: BTreeMap<Symbol, Action> = BTreeMap::new();
            // Which production claimed each cell, for conflict reporting
            // and priority comparison.
            let mut owners: BTreeMap<Symbol, PIdx> = BTreeMap::new();

            // Reduce entries: completed items of ordinary rules claim every
            // token in their rule's FOLLOW set. First writer wins.
            for &(pidx, dot) in &state.items {
                if dot != grm.prod_len(pidx) {
                    continue;
                }
                let ridx = grm.prod_to_rule(pidx);
                if ridx == grm.start_rule_idx() {
                    continue;
                }
                for tidx in grm.iter_tidxs() {
                    if !follows.is_set(ridx, tidx) {
                        continue;
                    }
                    let sym = Symbol::Token(tidx);
                    if let Some(&owner) = owners.get(&sym) {
                        conflicts.reduce_reduce.push((owner, pidx, stidx));
                    } else {
                        acts.insert(sym, Action::Reduce(pidx));
                        owners.insert(sym, pidx);
                    }
                }
            }

            // Halt entries: completed items of the synthetic start rule,
            // over its FOLLOW set (EOF). Same first-writer-wins policy.
            for &(pidx, dot) in &state.items {
                if dot != grm.prod_len(pidx) || grm.prod_to_rule(pidx) != grm.start_rule_idx() {
                    continue;
                }
                for tidx in grm.iter_tidxs() {
                    if !follows.is_set(grm.start_rule_idx(), tidx) {
                        continue;
                    }
                    let sym = Symbol::Token(tidx);
                    if let Some(&owner) = owners.get(&sym) {
                        conflicts.reduce_reduce.push((owner, pidx, stidx));
                    } else {
                        acts.insert(sym, Action::Halt);
                        owners.insert(sym, pidx);
                    }
                }
            }

            // Shift entries: items with the dot before a symbol shift to
            // that symbol's successor state. A cell already claimed by a
            // reduce is overwritten iff the claimant's priority number is
            // >= the shift production's (smaller number = binds tighter),
            // so a terminal declared earlier in the priority list makes its
            // shifts beat reduces.
            for &(pidx, dot) in &state.items {
                if dot == grm.prod_len(pidx) {
                    continue;
                }
                let sym = grm.prod(pidx)[usize::from(dot)];
                let target = sg
                    .edge(stidx, sym)
                    .expect("stategraph has an edge for every shift item");
                match acts.get(&sym) {
                    None => {
                        acts.insert(sym, Action::Shift(target));
                        owners.insert(sym, pidx);
                    }
                    Some(Action::Shift(prev)) => {
                        debug_assert_eq!(*prev, target);
                        owners.insert(sym, pidx);
                    }
                    Some(_) => {
                        let owner = owners[&sym];
                        if let Symbol::Token(tidx) = sym {
                            conflicts.shift_reduce.push((tidx, owner, stidx));
                        }
                        if grm.prod_priority(owner) >= grm.prod_priority(pidx) {
                            acts.insert(sym, Action::Shift(target));
                            owners.insert(sym, pidx);
                        }
                    }
                }
            }

            actions.push(acts);
        }

        let conflicts = if conflicts.rr_len() == 0 && conflicts.sr_len() == 0 {
            None
        } else {
            Some(conflicts)
        };
        StateTable { actions, conflicts }
    }

    /// Return the action for `stidx` and `sym`, if any.
    pub fn action(&self, stidx: StIdx, sym: Symbol) -> Option<Action> {
        self.actions
            .get(usize::from(stidx))
            .and_then(|acts| acts.get(&sym))
            .copied()
    }

    /// All actions of state `stidx`, in symbol order.
    pub fn state_actions(&self, stidx: StIdx) -> &BTreeMap<Symbol, Action> {
        &self.actions[usize::from(stidx)]
    }

    /// How many states does the table cover?
    pub fn states_len(&self) -> usize {
        self.actions.len()
    }

    /// Return all conflicts or `None` if there aren't any.
    pub fn conflicts(&self) -> Option<&Conflicts> {
        self.conflicts.as_ref()
    }
}
