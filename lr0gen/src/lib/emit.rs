use std::collections::{BTreeMap, BTreeSet};

use lr0table::{Action, Grammar, PIdx, StateGraph, StateTable, Symbol, START_RULE};

const HEADER_TEMPLATE: &str = include_str!("../../res/Parser.h.template");
const SOURCE_TEMPLATE: &str = include_str!("../../res/Parser.cpp.template");

/// Placeholder type for nonterminals without a declared result type.
const UNUSED_TYPE: &str = "_unused_";

/// Produce the generated header and source texts by substituting the fixed
/// `%% Tag %%` markers in the two template files. The templates themselves
/// are opaque blobs; nothing here parses them.
pub fn emit(grm: &Grammar, sg: &StateGraph, st: &StateTable) -> (String, String) {
    let reducing = reducing_prods(grm, sg);

    let subst = |template: &str| {
        template
            .replace("%% Nonterminals %%", &nonterminals(grm))
            .replace("%% Aux Entries %%", &aux_entries(grm))
            .replace("%% Action Table %%", &action_table(grm, st))
            .replace("%% Reduce Prototypes %%", &reduce_prototypes(grm, &reducing))
            .replace("%% Reduce Thunks %%", &reduce_thunks(grm, &reducing))
            .replace("%% Reduce Functions %%", &reduce_functions(grm, &reducing))
            .replace("%% Parser Return %%", type_for(grm, START_RULE))
            .replace("%% Header Extras %%", &header_extras(grm))
            .replace("%% Verbose %%", if grm.verbose() { "true" } else { "false" })
            .replace("%% Return Field %%", grm.field_name(START_RULE))
            .replace("%% Parser Name %%", grm.name())
    };
    (subst(HEADER_TEMPLATE), subst(SOURCE_TEMPLATE))
}

/// Every production that is a reduce item in some configurating set, i.e.
/// needs a reduce function and thunk emitted.
fn reducing_prods(grm: &Grammar, sg: &StateGraph) -> BTreeSet<PIdx> {
    let mut prods = BTreeSet::new();
    for state in sg.iter_closed_states() {
        for &(pidx, dot) in &state.items {
            if dot == grm.prod_len(pidx) && grm.prod_to_rule(pidx) != grm.start_rule_idx() {
                prods.insert(pidx);
            }
        }
    }
    prods
}

fn term_name(grm: &Grammar, sym: Symbol) -> &str {
    match sym {
        Symbol::Rule(ridx) => grm.rule_name(ridx),
        Symbol::Token(tidx) => grm.token_name(tidx),
    }
}

fn type_for<'a>(grm: &'a Grammar, rule_name: &str) -> &'a str {
    grm.nonterminal_type(rule_name).unwrap_or(UNUSED_TYPE)
}

/// The name of the function operating on the arguments of a reduce item,
/// keyed on the production's LHS and RHS.
fn reduce_fn_name(grm: &Grammar, pidx: PIdx) -> String {
    let mut name = format!("reduce_{}_from", grm.rule_name(grm.prod_to_rule(pidx)));
    for &sym in grm.prod(pidx) {
        name.push('_');
        name.push_str(term_name(grm, sym));
    }
    name
}

fn reduce_thunk_name(grm: &Grammar, pidx: PIdx) -> String {
    reduce_fn_name(grm, pidx) + "__thunk"
}

/// The semantic-action text with the positional placeholders substituted:
/// `$$` first, then the remaining `$K` occurrences.
fn code_for(grm: &Grammar, pidx: PIdx) -> String {
    grm.action(pidx)
        .replace("$$", "_parserArg0")
        .replace('$', "_parserArg")
}

fn code_uses_argument(grm: &Grammar, pidx: PIdx, index: usize) -> bool {
    code_for(grm, pidx).contains(&format!("_parserArg{}", index))
}

/// The signature of a reduce function. Arguments the semantic action never
/// mentions are left unnamed.
fn reduce_fn_signature(grm: &Grammar, pidx: PIdx) -> String {
    let lhs = grm.rule_name(grm.prod_to_rule(pidx));
    let mut sig = format!("{} {}(", type_for(grm, lhs), reduce_fn_name(grm, pidx));
    let prod = grm.prod(pidx);
    for (i, &sym) in prod.iter().enumerate() {
        match sym {
            Symbol::Rule(ridx) => sig.push_str(type_for(grm, grm.rule_name(ridx))),
            Symbol::Token(_) => sig.push_str("const std::string&"),
        }
        if code_uses_argument(grm, pidx, i + 1) {
            sig.push_str(&format!(" _parserArg{}", i + 1));
        }
        if i + 1 != prod.len() {
            sig.push_str(", ");
        }
    }
    sig.push(')');
    sig
}

/// The thunk bridging the untyped parse stack to the typed reduce
/// function.
fn reduce_thunk_for(grm: &Grammar, pidx: PIdx) -> String {
    let lhs = grm.rule_name(grm.prod_to_rule(pidx));
    let lhs_typed = grm.nonterminal_type(lhs).is_some();
    let prod = grm.prod(pidx);

    let mut out = format!("  AuxData {}(", reduce_thunk_name(grm, pidx));
    for (i, &sym) in prod.iter().enumerate() {
        out.push_str("StackData");
        // The argument gets a name only if it will be read below: the LHS
        // must carry a type, and a nonterminal argument must too.
        let used = match sym {
            Symbol::Rule(ridx) => grm.nonterminal_type(grm.rule_name(ridx)).is_some(),
            Symbol::Token(_) => true,
        };
        if lhs_typed && used {
            out.push_str(&format!(" a{}", i));
        }
        if i + 1 != prod.len() {
            out.push_str(", ");
        }
    }
    out.push_str(") {\n");

    if !lhs_typed {
        out.push_str("    return {};\n");
    } else {
        out.push_str("    AuxData result;\n");
        out.push_str(&format!(
            "    result.{} = {}(",
            grm.field_name(lhs),
            reduce_fn_name(grm, pidx)
        ));
        for (i, &sym) in prod.iter().enumerate() {
            match sym {
                Symbol::Rule(ridx) => {
                    let name = grm.rule_name(ridx);
                    if grm.nonterminal_type(name).is_some() {
                        out.push_str(&format!("a{}.data.{}", i, grm.field_name(name)));
                    } else {
                        out.push_str("{}");
                    }
                }
                Symbol::Token(_) => out.push_str(&format!("a{}.token.data", i)),
            }
            if i + 1 != prod.len() {
                out.push_str(", ");
            }
        }
        out.push_str(");\n    return result;\n");
    }
    out.push_str("  }\n");
    out
}

fn reduce_action_for(grm: &Grammar, pidx: PIdx) -> String {
    format!(
        "new ReduceActionN<{}>(Nonterminal::{}, {})",
        grm.prod(pidx).len(),
        grm.rule_name(grm.prod_to_rule(pidx)),
        reduce_thunk_name(grm, pidx)
    )
}

fn action_table(grm: &Grammar, st: &StateTable) -> String {
    let mut out = String::new();
    for st_i in 0..st.states_len() {
        // Cells sort by symbol name, whichever kind of symbol they hold.
        let mut cells: BTreeMap<&str, (bool, String)> = BTreeMap::new();
        for (&sym, &action) in st.state_actions(lr0table::StIdx::from(st_i)) {
            let rendered = match action {
                Action::Shift(target) => format!("new ShiftAction{{{}}}", usize::from(target)),
                Action::Reduce(pidx) => reduce_action_for(grm, pidx),
                Action::Halt => "new HaltAction()".to_string(),
            };
            cells.insert(
                term_name(grm, sym),
                (matches!(sym, Symbol::Rule(_)), rendered),
            );
        }
        out.push_str("{\n");
        for (name, (is_rule, action)) in cells {
            let kind = if is_rule { "Nonterminal" } else { "TokenType" };
            out.push_str(&format!("  {{    {}::{}, {} }},\n", kind, name, action));
        }
        out.push_str("},\n");
    }
    out
}

fn reduce_prototypes(grm: &Grammar, reducing: &BTreeSet<PIdx>) -> String {
    let sigs: BTreeSet<String> = reducing
        .iter()
        .filter(|&&pidx| {
            grm.nonterminal_type(grm.rule_name(grm.prod_to_rule(pidx)))
                .is_some()
        })
        .map(|&pidx| reduce_fn_signature(grm, pidx))
        .collect();
    let mut out = String::new();
    for sig in sigs {
        out.push_str(&format!("  {};\n", sig));
    }
    out
}

fn reduce_thunks(grm: &Grammar, reducing: &BTreeSet<PIdx>) -> String {
    let thunks: BTreeSet<String> = reducing
        .iter()
        .map(|&pidx| reduce_thunk_for(grm, pidx))
        .collect();
    let mut out = String::new();
    for thunk in thunks {
        out.push_str(&thunk);
        out.push('\n');
    }
    out
}

fn reduce_functions(grm: &Grammar, reducing: &BTreeSet<PIdx>) -> String {
    // Keyed by signature so a production reachable from several states is
    // emitted once.
    let mut fns: BTreeMap<String, PIdx> = BTreeMap::new();
    for &pidx in reducing {
        if grm
            .nonterminal_type(grm.rule_name(grm.prod_to_rule(pidx)))
            .is_some()
        {
            fns.insert(reduce_fn_signature(grm, pidx), pidx);
        }
    }
    let mut out = String::new();
    for (sig, pidx) in fns {
        let lhs = grm.rule_name(grm.prod_to_rule(pidx));
        out.push_str(&format!("  {} {{\n", sig));
        out.push_str(&format!("    {} _parserArg0;\n", type_for(grm, lhs)));
        out.push_str(&format!("    {}\n", code_for(grm, pidx)));
        out.push_str("    return _parserArg0;\n  }\n\n");
    }
    out
}

fn nonterminals(grm: &Grammar) -> String {
    let mut out = String::new();
    for ridx in grm.iter_ridxs() {
        out.push_str(&format!("    {},\n", grm.rule_name(ridx)));
    }
    out
}

fn aux_entries(grm: &Grammar) -> String {
    let mut out = String::new();
    for (ty, field) in grm.type_to_field() {
        out.push_str(&format!("    {} {};\n", ty, field));
    }
    out
}

fn header_extras(grm: &Grammar) -> String {
    let mut out = String::new();
    for line in grm.header_extras() {
        out.push_str(line);
        out.push('\n');
    }
    out
}
