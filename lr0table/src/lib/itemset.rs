use std::collections::BTreeSet;

use vob::Vob;

use crate::{Grammar, PIdx, SIdx, Symbol};

/// An LR(0) item: a production with a dot position in `0..=prod_len`.
/// Items order lexicographically by production then dot, so itemsets
/// iterate deterministically.
pub type Item = (PIdx, SIdx);

/// A set of LR(0) items. Two itemsets are equal iff they contain exactly
/// the same items, which is what the canonical collection deduplicates on.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Itemset {
    pub items: BTreeSet<Item>,
}

impl Itemset {
    /// Create a blank itemset.
    pub fn new() -> Self {
        Itemset {
            items: BTreeSet::new(),
        }
    }

    /// Add the item `(pidx, dot)`. Returns true if this changed the set.
    pub fn add(&mut self, pidx: PIdx, dot: SIdx) -> bool {
        self.items.insert((pidx, dot))
    }

    /// Create a new itemset which is a closed version of `self`: any item
    /// with its dot before a rule pulls in that rule's productions at dot
    /// zero, recursively.
    pub fn close(&self, grm: &Grammar) -> Itemset {
        let mut new_is = self.clone();

        // Every item added during closure has its dot at zero, so the todo
        // list for those needs only one bit per production. The seed items
        // are walked first, then the bitfield is drained until nothing new
        // appears.
        let mut zero_todos = Vob::from_elem(false, grm.prods_len());
        let mut seed = self.items.iter().copied();
        loop {
            let (pidx, dot) = match seed.next() {
                Some(item) => item,
                None => match zero_todos.iter_set_bits(..).next() {
                    Some(i) => {
                        zero_todos.set(i, false);
                        (PIdx::from(i), SIdx(0))
                    }
                    None => break,
                },
            };
            let prod = grm.prod(pidx);
            if usize::from(dot) == prod.len() {
                continue;
            }
            if let Symbol::Rule(ridx) = prod[usize::from(dot)] {
                for &ref_pidx in grm.rule_to_prods(ridx) {
                    if new_is.add(ref_pidx, SIdx(0)) {
                        zero_todos.set(usize::from(ref_pidx), true);
                    }
                }
            }
        }
        new_is
    }

    /// Create a new (unclosed) itemset by advancing the dot of every item
    /// that sits before `sym`.
    pub fn goto(&self, grm: &Grammar, sym: Symbol) -> Itemset {
        let mut new_is = Itemset::new();
        for &(pidx, dot) in &self.items {
            let prod = grm.prod(pidx);
            if usize::from(dot) < prod.len() && prod[usize::from(dot)] == sym {
                new_is.add(pidx, SIdx(dot.0 + 1));
            }
        }
        new_is
    }

    /// The symbols that appear immediately after a dot, in symbol order.
    pub fn next_symbols(&self, grm: &Grammar) -> BTreeSet<Symbol> {
        let mut syms = BTreeSet::new();
        for &(pidx, dot) in &self.items {
            let prod = grm.prod(pidx);
            if usize::from(dot) < prod.len() {
                syms.insert(prod[usize::from(dot)]);
            }
        }
        syms
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::grammar;

    pub(crate) fn item_exists(grm: &Grammar, is: &Itemset, rule: &str, prod_off: usize, dot: usize) {
        let pidx = grm.rule_to_prods(grm.rule_idx(rule).unwrap())[prod_off];
        assert!(
            is.items.contains(&(pidx, SIdx::from(dot))),
            "no item for production {} of {} with dot {}",
            prod_off,
            rule,
            dot
        );
    }

    #[test]
    fn test_closure() {
        let grm = grammar("S", &["S: A b | c", "A: a |"]);
        let mut is = Itemset::new();
        is.add(grm.start_prod(), SIdx(0));
        let cls = is.close(&grm);
        // _parserInternalStart → . S pulls in S's productions, and S → . A b
        // pulls in A's.
        assert_eq!(cls.items.len(), 5);
        item_exists(&grm, &cls, crate::START_RULE, 0, 0);
        item_exists(&grm, &cls, "S", 0, 0);
        item_exists(&grm, &cls, "S", 1, 0);
        item_exists(&grm, &cls, "A", 0, 0);
        item_exists(&grm, &cls, "A", 1, 0);
    }

    #[test]
    fn test_goto() {
        let grm = grammar("S", &["S: a S | a"]);
        let mut is = Itemset::new();
        is.add(grm.start_prod(), SIdx(0));
        let cls = is.close(&grm);

        let a = Symbol::Token(grm.token_idx("a").unwrap());
        let after_a = cls.goto(&grm, a).close(&grm);
        item_exists(&grm, &after_a, "S", 0, 1);
        item_exists(&grm, &after_a, "S", 1, 1);
        // Closure re-adds S's productions for the dot before S.
        item_exists(&grm, &after_a, "S", 0, 0);
        item_exists(&grm, &after_a, "S", 1, 0);
        assert_eq!(after_a.items.len(), 4);

        let s = Symbol::Rule(grm.rule_idx("S").unwrap());
        let after_s = after_a.goto(&grm, s);
        assert_eq!(after_s.items.len(), 1);
        item_exists(&grm, &after_s, "S", 0, 2);
    }

    #[test]
    fn test_next_symbols_ordered() {
        let grm = grammar("S", &["S: a S | b A", "A: c"]);
        let mut is = Itemset::new();
        is.add(grm.start_prod(), SIdx(0));
        let cls = is.close(&grm);
        let syms: Vec<Symbol> = cls.next_symbols(&grm).into_iter().collect();
        // Rules sort before tokens, then by index.
        assert_eq!(
            syms,
            vec![
                Symbol::Rule(grm.rule_idx("S").unwrap()),
                Symbol::Token(grm.token_idx("a").unwrap()),
                Symbol::Token(grm.token_idx("b").unwrap()),
            ]
        );
    }
}
