use std::collections::BTreeMap;

use crate::{Grammar, GrammarConfig, ProductionRule};

/// Build a [`GrammarConfig`] from a compact rule syntax: each entry is
/// `"Name: t1 t2 | t3"`, with alternatives separated by `|` and terms by
/// whitespace. Semantic actions are left empty.
pub(crate) fn grammar_config(
    start: &str,
    rules: &[&str],
    priorities: &[&str],
    types: &[(&str, &str)],
) -> GrammarConfig {
    let mut rule_map: BTreeMap<String, Vec<ProductionRule>> = BTreeMap::new();
    for rule in rules {
        let (name, alts) = rule.split_once(':').expect("rule needs a ':'");
        let prods = alts
            .split('|')
            .map(|alt| ProductionRule {
                terms: alt.split_whitespace().map(str::to_string).collect(),
                action: String::new(),
            })
            .collect();
        rule_map.insert(name.trim().to_string(), prods);
    }
    GrammarConfig {
        rules: rule_map,
        start_symbol: start.to_string(),
        priorities: priorities.iter().map(|p| p.to_string()).collect(),
        nonterminal_types: types
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        header_extras: Vec::new(),
        verbose: false,
        name: "Test".to_string(),
    }
}

pub(crate) fn grammar(start: &str, rules: &[&str]) -> Grammar {
    let types = [(start, "int")];
    Grammar::new(grammar_config(start, rules, &[], &types)).unwrap()
}
