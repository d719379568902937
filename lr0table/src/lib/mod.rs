#![forbid(unsafe_code)]

mod firsts;
mod follows;
mod grammar;
mod itemset;
mod stategraph;
mod statetable;
#[cfg(test)]
mod test_utils;

pub use crate::{
    firsts::Firsts,
    follows::Follows,
    grammar::{Grammar, GrammarConfig, GrammarError, ProductionRule, EOF_TOKEN, START_RULE},
    itemset::{Item, Itemset},
    stategraph::StateGraph,
    statetable::{Action, Conflicts, StateTable},
};

// This macro generates a struct which exposes a u32 API for a particular
// kind of index, so that rule, token, production, symbol, and state indices
// cannot be confused for one another.
macro_rules! IdxNewtype {
    ($(#[$attr:meta])* $n: ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub struct $n(pub u32);

        impl From<$n> for usize {
            fn from(i: $n) -> usize {
                i.0 as usize
            }
        }

        impl From<usize> for $n {
            fn from(i: usize) -> $n {
                debug_assert!(i <= u32::MAX as usize);
                $n(i as u32)
            }
        }
    };
}

IdxNewtype!(
    /// A type specifically for rule (nonterminal) indices.
    RIdx
);
IdxNewtype!(
    /// A type specifically for token indices.
    TIdx
);
IdxNewtype!(
    /// A type specifically for production indices (e.g. a rule `E: A | B;`
    /// has two productions for the single rule `E`).
    PIdx
);
IdxNewtype!(
    /// A type specifically for symbol (dot position) indices within a
    /// production.
    SIdx
);
IdxNewtype!(
    /// A type specifically for state table indices.
    StIdx
);

/// A grammar symbol as stored in indexed productions.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Symbol {
    Rule(RIdx),
    Token(TIdx),
}
