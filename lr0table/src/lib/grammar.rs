use std::collections::{BTreeMap, BTreeSet};
use std::{error::Error, fmt};

use indexmap::IndexMap;

use crate::{PIdx, RIdx, SIdx, Symbol, TIdx};

/// Name of the synthetic start rule injected into every grammar. A user
/// rule with this name is a hard error.
pub const START_RULE: &str = "_parserInternalStart";

/// Name of the end-of-input token. It is always part of the token set and
/// seeds the FOLLOW set of the synthetic start rule.
pub const EOF_TOKEN: &str = "SCAN_EOF";

/// One alternative of a rule: a sequence of term names plus the
/// semantic-action text to run when the production is reduced.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProductionRule {
    pub terms: Vec<String>,
    pub action: String,
}

/// The declarative description a [`Grammar`] is built from. Rules live in a
/// `BTreeMap` so every build of the same description indexes rules in the
/// same (name-sorted) order. `nonterminal_types` keeps declaration order,
/// which the `field<k>` assignment below depends on.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GrammarConfig {
    pub rules: BTreeMap<String, Vec<ProductionRule>>,
    pub start_symbol: String,
    /// Terminal names in priority order; earlier = binds tighter.
    pub priorities: Vec<String>,
    pub nonterminal_types: IndexMap<String, String>,
    pub header_extras: Vec<String>,
    pub verbose: bool,
    pub name: String,
}

/// The various different possible grammar construction errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GrammarError {
    /// The user declared a rule with the reserved name [`START_RULE`].
    ReservedNameCollision,
    /// The declared start symbol has no productions.
    StartSymbolHasNoProductions(String),
    /// No result type is associated with the start symbol.
    MissingStartType,
}

impl Error for GrammarError {}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GrammarError::ReservedNameCollision => {
                write!(f, "The nonterminal name {} is reserved", START_RULE)
            }
            GrammarError::StartSymbolHasNoProductions(name) => {
                write!(f, "Start symbol '{}' has no productions", name)
            }
            GrammarError::MissingStartType => {
                write!(f, "No type associated with start symbol")
            }
        }
    }
}

/// An indexed grammar, ready for table construction. Rules, tokens, and
/// productions are interned into dense `RIdx`/`TIdx`/`PIdx` ranges; all
/// iteration is in index order, which is fixed by the (sorted) rule map and
/// token set, so everything downstream is reproducible.
pub struct Grammar {
    rule_names: Vec<String>,
    token_names: Vec<String>,
    eof_token_idx: TIdx,
    prods: Vec<Vec<Symbol>>,
    /// A mapping from rules to their productions; production indices are in
    /// grammar-wide declaration order.
    rules_prods: Vec<Vec<PIdx>>,
    prods_rules: Vec<RIdx>,
    /// Per-production semantic-action text.
    actions: Vec<String>,
    /// Per-production priority: the position in `priorities` of the
    /// leftmost prioritised terminal, or `priorities_len` if none matches.
    prod_priorities: Vec<usize>,
    priorities_len: usize,
    start_rule: RIdx,
    start_prod: PIdx,
    /// Result type per rule name (in declaration order), including the
    /// injected start rule.
    nonterminal_types: IndexMap<String, String>,
    /// Type name → synthetic `field<k>` identifier, `k` in insertion order.
    type_to_field: IndexMap<String, String>,
    header_extras: Vec<String>,
    verbose: bool,
    name: String,
}

impl Grammar {
    pub fn new(config: GrammarConfig) -> Result<Grammar, GrammarError> {
        if config.rules.contains_key(START_RULE) {
            return Err(GrammarError::ReservedNameCollision);
        }
        if !config.rules.contains_key(&config.start_symbol) {
            return Err(GrammarError::StartSymbolHasNoProductions(
                config.start_symbol.clone(),
            ));
        }

        let mut rules = config.rules;
        rules.insert(
            START_RULE.to_string(),
            vec![ProductionRule {
                terms: vec![config.start_symbol.clone()],
                action: String::new(),
            }],
        );

        let rule_names: Vec<String> = rules.keys().cloned().collect();
        let rule_map: BTreeMap<&str, RIdx> = rule_names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), RIdx::from(i)))
            .collect();

        // Every term that is not a rule name is a token. The EOF token is
        // always present, whether or not any production mentions it.
        let mut token_set: BTreeSet<&str> = rules
            .values()
            .flatten()
            .flat_map(|pr| pr.terms.iter())
            .map(|t| t.as_str())
            .filter(|t| !rule_map.contains_key(t))
            .collect();
        token_set.insert(EOF_TOKEN);
        let token_names: Vec<String> = token_set.iter().map(|t| t.to_string()).collect();
        let token_map: BTreeMap<&str, TIdx> = token_names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), TIdx::from(i)))
            .collect();
        let eof_token_idx = token_map[EOF_TOKEN];

        let mut prods = Vec::new();
        let mut rules_prods: Vec<Vec<PIdx>> = vec![Vec::new(); rule_names.len()];
        let mut prods_rules = Vec::new();
        let mut actions = Vec::new();
        let mut prod_priorities = Vec::new();
        for (name, prod_rules) in &rules {
            let ridx = rule_map[name.as_str()];
            for pr in prod_rules {
                let symbols = pr
                    .terms
                    .iter()
                    .map(|t| match rule_map.get(t.as_str()) {
                        Some(&ridx) => Symbol::Rule(ridx),
                        None => Symbol::Token(token_map[t.as_str()]),
                    })
                    .collect::<Vec<_>>();
                let priority = pr
                    .terms
                    .iter()
                    .filter(|t| !rule_map.contains_key(t.as_str()))
                    .find_map(|t| config.priorities.iter().position(|p| p == t))
                    .unwrap_or(config.priorities.len());
                rules_prods[usize::from(ridx)].push(PIdx::from(prods.len()));
                prods_rules.push(ridx);
                prods.push(symbols);
                actions.push(pr.action.clone());
                prod_priorities.push(priority);
            }
        }

        let start_rule = rule_map[START_RULE];
        let start_prod = rules_prods[usize::from(start_rule)][0];

        let mut nonterminal_types = config.nonterminal_types;
        let start_type = match nonterminal_types.get(&config.start_symbol) {
            Some(t) => t.clone(),
            None => return Err(GrammarError::MissingStartType),
        };
        nonterminal_types.insert(START_RULE.to_string(), start_type);

        // field<k> numbers follow the order types are first declared in, so
        // the (order-preserving) map must be walked as written, not sorted.
        let mut type_to_field = IndexMap::new();
        for ty in nonterminal_types.values() {
            if !type_to_field.contains_key(ty) {
                let field = format!("field{}", type_to_field.len());
                type_to_field.insert(ty.clone(), field);
            }
        }

        Ok(Grammar {
            rule_names,
            token_names,
            eof_token_idx,
            prods,
            rules_prods,
            prods_rules,
            actions,
            prod_priorities,
            priorities_len: config.priorities.len(),
            start_rule,
            start_prod,
            nonterminal_types,
            type_to_field,
            header_extras: config.header_extras,
            verbose: config.verbose,
            name: config.name,
        })
    }

    /// How many rules does this grammar have?
    pub fn rules_len(&self) -> usize {
        self.rule_names.len()
    }

    /// Return an iterator over all this grammar's rule indices, in order.
    pub fn iter_ridxs(&self) -> impl Iterator<Item = RIdx> {
        (0..self.rule_names.len()).map(RIdx::from)
    }

    /// The name of rule `ridx`. Panics if `ridx` doesn't exist.
    pub fn rule_name(&self, ridx: RIdx) -> &str {
        &self.rule_names[usize::from(ridx)]
    }

    pub fn rule_idx(&self, name: &str) -> Option<RIdx> {
        self.rule_names
            .iter()
            .position(|n| n == name)
            .map(RIdx::from)
    }

    /// The production indices of rule `ridx`, in declaration order.
    pub fn rule_to_prods(&self, ridx: RIdx) -> &[PIdx] {
        &self.rules_prods[usize::from(ridx)]
    }

    /// How many tokens does this grammar have (including EOF)?
    pub fn tokens_len(&self) -> usize {
        self.token_names.len()
    }

    pub fn iter_tidxs(&self) -> impl Iterator<Item = TIdx> {
        (0..self.token_names.len()).map(TIdx::from)
    }

    pub fn token_name(&self, tidx: TIdx) -> &str {
        &self.token_names[usize::from(tidx)]
    }

    pub fn token_idx(&self, name: &str) -> Option<TIdx> {
        self.token_names
            .iter()
            .position(|n| n == name)
            .map(TIdx::from)
    }

    pub fn eof_token_idx(&self) -> TIdx {
        self.eof_token_idx
    }

    /// How many productions does this grammar have?
    pub fn prods_len(&self) -> usize {
        self.prods.len()
    }

    pub fn iter_pidxs(&self) -> impl Iterator<Item = PIdx> {
        (0..self.prods.len()).map(PIdx::from)
    }

    /// The symbols of production `pidx`. Panics if `pidx` doesn't exist.
    pub fn prod(&self, pidx: PIdx) -> &[Symbol] {
        &self.prods[usize::from(pidx)]
    }

    /// How many symbols does production `pidx` have?
    pub fn prod_len(&self, pidx: PIdx) -> SIdx {
        SIdx::from(self.prods[usize::from(pidx)].len())
    }

    /// The rule production `pidx` belongs to.
    pub fn prod_to_rule(&self, pidx: PIdx) -> RIdx {
        self.prods_rules[usize::from(pidx)]
    }

    /// The semantic-action text of production `pidx`.
    pub fn action(&self, pidx: PIdx) -> &str {
        &self.actions[usize::from(pidx)]
    }

    /// The priority of production `pidx`: the position in the priority list
    /// of its leftmost prioritised terminal. Smaller binds tighter;
    /// [`Grammar::priorities_len`] means "no priority".
    pub fn prod_priority(&self, pidx: PIdx) -> usize {
        self.prod_priorities[usize::from(pidx)]
    }

    pub fn priorities_len(&self) -> usize {
        self.priorities_len
    }

    /// The index of the synthetic start rule.
    pub fn start_rule_idx(&self) -> RIdx {
        self.start_rule
    }

    /// The sole production of the synthetic start rule.
    pub fn start_prod(&self) -> PIdx {
        self.start_prod
    }

    /// The result type of rule `name`, if one was declared.
    pub fn nonterminal_type(&self, name: &str) -> Option<&str> {
        self.nonterminal_types.get(name).map(|s| s.as_str())
    }

    /// Type name → synthetic field identifier, in first-seen order.
    pub fn type_to_field(&self) -> &IndexMap<String, String> {
        &self.type_to_field
    }

    /// The `field<k>` identifier for rule `name`'s type. Panics if the rule
    /// has no declared type.
    pub fn field_name(&self, name: &str) -> &str {
        &self.type_to_field[&self.nonterminal_types[name]]
    }

    pub fn header_extras(&self) -> &[String] {
        &self.header_extras
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pretty-print production `pidx` as `R -> a b c`.
    pub fn pp_prod(&self, pidx: PIdx) -> String {
        let mut s = format!("{} ->", self.rule_name(self.prod_to_rule(pidx)));
        for sym in self.prod(pidx) {
            match *sym {
                Symbol::Rule(ridx) => s.push_str(&format!(" {}", self.rule_name(ridx))),
                Symbol::Token(tidx) => s.push_str(&format!(" '{}'", self.token_name(tidx))),
            }
        }
        s
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::grammar_config;

    #[test]
    fn test_indexing() {
        let grm = Grammar::new(grammar_config(
            "S",
            &["S: a S | b"],
            &[],
            &[("S", "int")],
        ))
        .unwrap();
        // Rules sort by name; the synthetic start sorts after uppercase
        // user rules.
        assert_eq!(grm.rule_name(RIdx(0)), "S");
        assert_eq!(grm.rule_name(RIdx(1)), START_RULE);
        assert_eq!(grm.start_rule_idx(), RIdx(1));
        assert_eq!(grm.rules_len(), 2);
        // Tokens: "SCAN_EOF", "a", "b" in sorted order.
        assert_eq!(grm.token_name(TIdx(0)), EOF_TOKEN);
        assert_eq!(grm.token_idx("a"), Some(TIdx(1)));
        assert_eq!(grm.eof_token_idx(), TIdx(0));
        // The injected production is _parserInternalStart → S.
        let sp = grm.start_prod();
        assert_eq!(grm.prod(sp), &[Symbol::Rule(RIdx(0))]);
        assert_eq!(grm.prod_to_rule(sp), RIdx(1));
    }

    #[test]
    fn test_reserved_name() {
        let cfg = grammar_config(
            START_RULE,
            &["_parserInternalStart: a"],
            &[],
            &[("_parserInternalStart", "int")],
        );
        assert_eq!(
            Grammar::new(cfg).map(|_| ()),
            Err(GrammarError::ReservedNameCollision)
        );
    }

    #[test]
    fn test_missing_start_type() {
        let cfg = grammar_config("S", &["S: a"], &[], &[]);
        assert_eq!(
            Grammar::new(cfg).map(|_| ()),
            Err(GrammarError::MissingStartType)
        );
    }

    #[test]
    fn test_unknown_start_symbol() {
        let cfg = grammar_config("T", &["S: a"], &[], &[("T", "int")]);
        assert_eq!(
            Grammar::new(cfg).map(|_| ()),
            Err(GrammarError::StartSymbolHasNoProductions("T".to_string()))
        );
    }

    #[test]
    fn test_priorities() {
        let grm = Grammar::new(grammar_config(
            "E",
            &["E: E + E | E * E | id"],
            &["*", "+"],
            &[("E", "int")],
        ))
        .unwrap();
        let prods = grm.rule_to_prods(grm.rule_idx("E").unwrap());
        // E + E: leftmost prioritised terminal is '+', position 1.
        assert_eq!(grm.prod_priority(prods[0]), 1);
        // E * E: '*', position 0 — binds tighter.
        assert_eq!(grm.prod_priority(prods[1]), 0);
        // id: unprioritised, so lowest.
        assert_eq!(grm.prod_priority(prods[2]), 2);
        assert_eq!(grm.priorities_len(), 2);
    }

    #[test]
    fn test_type_to_field_insertion_order() {
        let grm = Grammar::new(grammar_config(
            "A",
            &["A: B c", "B: d"],
            &[],
            &[("A", "TypeOne"), ("B", "TypeTwo")],
        ))
        .unwrap();
        let fields: Vec<(&str, &str)> = grm
            .type_to_field()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(fields, vec![("TypeOne", "field0"), ("TypeTwo", "field1")]);
        assert_eq!(grm.field_name(START_RULE), "field0");
    }

    #[test]
    fn test_type_to_field_declaration_order_not_name_order() {
        // Z's type is declared first, so it gets field0 even though A sorts
        // before Z.
        let grm = Grammar::new(grammar_config(
            "Z",
            &["Z: a A", "A: b"],
            &[],
            &[("Z", "string"), ("A", "int")],
        ))
        .unwrap();
        let fields: Vec<(&str, &str)> = grm
            .type_to_field()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(fields, vec![("string", "field0"), ("int", "field1")]);
        assert_eq!(grm.field_name("Z"), "field0");
        assert_eq!(grm.field_name("A"), "field1");
        assert_eq!(grm.field_name(START_RULE), "field0");
    }
}
