use std::{error::Error, fmt};

use std::collections::BTreeSet;

use crate::{Cfg, Symbol};

/// Structural invariant violations. These are design-level assertions: no
/// transformation in this workspace may produce a grammar that trips one, so
/// a triggered variant indicates a bug in a transform rather than bad user
/// input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CfgValidationError {
    StartNotDeclared(char),
    TerminalNotInAlphabet(char),
    UndeclaredNonterminal(char),
    UndeclaredLhs(char),
    /// A declared nonterminal is not the LHS of any production.
    UnproductiveNonterminal(char),
}

impl Error for CfgValidationError {}

impl fmt::Display for CfgValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CfgValidationError::StartNotDeclared(ch) => {
                write!(f, "Start symbol '{}' is not a declared nonterminal", ch)
            }
            CfgValidationError::TerminalNotInAlphabet(ch) => {
                write!(f, "Terminal '{}' is not in the alphabet", ch)
            }
            CfgValidationError::UndeclaredNonterminal(ch) => {
                write!(f, "Nonterminal '{}' is used but never declared", ch)
            }
            CfgValidationError::UndeclaredLhs(ch) => {
                write!(f, "Production LHS '{}' is not a declared nonterminal", ch)
            }
            CfgValidationError::UnproductiveNonterminal(ch) => {
                write!(f, "Nonterminal '{}' has no productions", ch)
            }
        }
    }
}

/// Check a grammar's structural invariants: the start symbol is declared,
/// every production terminal lies in the alphabet, every RHS nonterminal is
/// declared, and the set of LHS symbols equals the declared nonterminal set
/// exactly.
pub fn validate(cfg: &Cfg) -> Result<(), CfgValidationError> {
    if !cfg.nonterminals.contains(&cfg.start) {
        return Err(CfgValidationError::StartNotDeclared(cfg.start));
    }

    let mut producers = BTreeSet::new();
    for prod in &cfg.productions {
        if !cfg.nonterminals.contains(&prod.lhs) {
            return Err(CfgValidationError::UndeclaredLhs(prod.lhs));
        }
        producers.insert(prod.lhs);
        for sym in &prod.rhs {
            match *sym {
                Symbol::Terminal(ch) => {
                    if !cfg.alphabet.contains(&ch) {
                        return Err(CfgValidationError::TerminalNotInAlphabet(ch));
                    }
                }
                Symbol::Nonterminal(ch) => {
                    if !cfg.nonterminals.contains(&ch) {
                        return Err(CfgValidationError::UndeclaredNonterminal(ch));
                    }
                }
            }
        }
    }

    if let Some(&ch) = cfg.nonterminals.difference(&producers).next() {
        return Err(CfgValidationError::UnproductiveNonterminal(ch));
    }
    Ok(())
}
