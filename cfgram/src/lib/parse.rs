use std::{error::Error, fmt};

use crate::{Alphabet, Cfg, Production, Symbol};

/// Token classes produced by the grammar scanner.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Token {
    Nonterminal(char),
    Terminal(char),
    Arrow,
    Bar,
    Epsilon,
    Eof,
}

/// The various different possible grammar parsing errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CfgParseError {
    UnexpectedEof,
    UnexpectedToken,
    TerminalNotInAlphabet(char),
    ExpectedNonterminal,
    ExpectedArrow,
    NoProductions,
}

impl Error for CfgParseError {}

impl fmt::Display for CfgParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CfgParseError::UnexpectedEof => write!(f, "Unexpected end of input found"),
            CfgParseError::UnexpectedToken => write!(f, "Unexpected token"),
            CfgParseError::TerminalNotInAlphabet(ch) => {
                write!(f, "Character '{}' is not in alphabet", ch)
            }
            CfgParseError::ExpectedNonterminal => write!(f, "Expected a nonterminal"),
            CfgParseError::ExpectedArrow => write!(f, "Expected an arrow"),
            CfgParseError::NoProductions => write!(f, "No productions found"),
        }
    }
}

/// Tokenise grammar source text. Uppercase alphabetic code points are
/// nonterminals, `→` (or `->`) is an arrow, `|` a bar, `ε` epsilon;
/// whitespace separates tokens; every other code point is a terminal. A
/// trailing `Eof` token is always appended.
pub fn scan(src: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = src.chars().peekable();
    while let Some(ch) = chars.next() {
        let tok = match ch {
            c if c.is_whitespace() => continue,
            '→' => Token::Arrow,
            '-' if chars.peek() == Some(&'>') => {
                chars.next();
                Token::Arrow
            }
            '|' => Token::Bar,
            'ε' => Token::Epsilon,
            c if c.is_uppercase() => Token::Nonterminal(c),
            c => Token::Terminal(c),
        };
        tokens.push(tok);
    }
    tokens.push(Token::Eof);
    tokens
}

/// Parse grammar source text into a [`Cfg`] over the given alphabet.
///
/// The first LHS encountered becomes the start symbol. Every LHS nonterminal
/// is added to the nonterminal set; nonterminals that only occur on an RHS
/// are not, and the validator rejects the grammar unless they appear as an
/// LHS elsewhere.
pub fn parse(src: &str, alphabet: &Alphabet) -> Result<Cfg, CfgParseError> {
    CfgParser {
        tokens: scan(src),
        pos: 0,
        alphabet,
    }
    .parse_grammar()
}

// Hand-written recursive descent over this grammar:
//
//   Grammar        → VariableDecl+
//   VariableDecl   → Nonterminal "→" ProductionList
//   ProductionList → Production ( "|" Production )*
//   Production     → ε | Symbol+
//   Symbol         → Terminal | Nonterminal
//
// Two tokens of lookahead are needed in exactly one place: symbol
// accumulation inside a production stops when the lookahead is BAR, EOF, or
// NONTERMINAL followed by ARROW, the latter marking the start of the next
// variable declaration.
struct CfgParser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    alphabet: &'a Alphabet,
}

impl<'a> CfgParser<'a> {
    fn peek(&self, off: usize) -> Result<Token, CfgParseError> {
        self.tokens
            .get(self.pos + off)
            .copied()
            .ok_or(CfgParseError::UnexpectedEof)
    }

    fn next(&mut self) -> Result<Token, CfgParseError> {
        let tok = self.peek(0)?;
        self.pos += 1;
        Ok(tok)
    }

    fn parse_grammar(mut self) -> Result<Cfg, CfgParseError> {
        if self.peek(0)? == Token::Eof {
            return Err(CfgParseError::NoProductions);
        }

        let mut cfg = Cfg {
            alphabet: self.alphabet.clone(),
            nonterminals: Default::default(),
            start: '\0',
            productions: Vec::new(),
        };

        loop {
            let (nt, prods) = self.parse_variable_decl()?;
            cfg.nonterminals.insert(nt);
            if cfg.start == '\0' {
                cfg.start = nt;
            }
            cfg.productions.extend(prods);
            if self.peek(0)? == Token::Eof {
                break;
            }
        }
        Ok(cfg)
    }

    fn parse_variable_decl(&mut self) -> Result<(char, Vec<Production>), CfgParseError> {
        let nt = match self.next()? {
            Token::Nonterminal(ch) => ch,
            _ => return Err(CfgParseError::ExpectedNonterminal),
        };
        if self.next()? != Token::Arrow {
            return Err(CfgParseError::ExpectedArrow);
        }
        Ok((nt, self.parse_production_list(nt)?))
    }

    fn parse_production_list(&mut self, nt: char) -> Result<Vec<Production>, CfgParseError> {
        let mut prods = Vec::new();
        loop {
            prods.push(self.parse_production(nt)?);
            if self.peek(0)? != Token::Bar {
                break;
            }
            self.next()?;
        }
        Ok(prods)
    }

    fn parse_production(&mut self, nt: char) -> Result<Production, CfgParseError> {
        if self.peek(0)? == Token::Epsilon {
            self.next()?;
            return Ok(Production::new(nt, Vec::new()));
        }

        let mut rhs = Vec::new();
        loop {
            match self.peek(0)? {
                Token::Bar | Token::Eof => break,
                Token::Nonterminal(_) if self.peek(1)? == Token::Arrow => break,
                _ => (),
            }
            match self.next()? {
                Token::Terminal(ch) => {
                    if !self.alphabet.contains(&ch) {
                        return Err(CfgParseError::TerminalNotInAlphabet(ch));
                    }
                    rhs.push(Symbol::Terminal(ch));
                }
                Token::Nonterminal(ch) => rhs.push(Symbol::Nonterminal(ch)),
                _ => return Err(CfgParseError::UnexpectedToken),
            }
        }
        Ok(Production::new(nt, rhs))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::alphabet_from_str;

    #[test]
    fn test_scan() {
        assert_eq!(
            scan("S → a | ε"),
            vec![
                Token::Nonterminal('S'),
                Token::Arrow,
                Token::Terminal('a'),
                Token::Bar,
                Token::Epsilon,
                Token::Eof
            ]
        );
        assert_eq!(scan("S -> a")[1], Token::Arrow);
    }

    #[test]
    fn test_parse_basic() {
        let cfg = parse("S → a S b | ε", &alphabet_from_str("ab")).unwrap();
        assert_eq!(cfg.start, 'S');
        assert_eq!(cfg.productions.len(), 2);
        assert_eq!(
            cfg.productions[0].rhs,
            vec![
                Symbol::Terminal('a'),
                Symbol::Nonterminal('S'),
                Symbol::Terminal('b')
            ]
        );
        assert!(cfg.productions[1].rhs.is_empty());
    }

    #[test]
    fn test_parse_two_decls_needs_lookahead() {
        // Without two-token lookahead the "A" here would be swallowed into
        // the production for S.
        let cfg = parse("S → a A A → b", &alphabet_from_str("ab")).unwrap();
        assert_eq!(cfg.productions.len(), 2);
        assert_eq!(
            cfg.productions[0].rhs,
            vec![Symbol::Terminal('a'), Symbol::Nonterminal('A')]
        );
        assert_eq!(cfg.productions[1].lhs, 'A');
        assert_eq!(cfg.start, 'S');
        assert!(cfg.nonterminals.contains(&'A'));
    }

    #[test]
    fn test_parse_errors() {
        let ab = alphabet_from_str("ab");
        assert_eq!(parse("", &ab), Err(CfgParseError::NoProductions));
        assert_eq!(
            parse("S → c", &ab),
            Err(CfgParseError::TerminalNotInAlphabet('c'))
        );
        assert_eq!(parse("a → b", &ab), Err(CfgParseError::ExpectedNonterminal));
        assert_eq!(parse("S b", &ab), Err(CfgParseError::ExpectedArrow));
        assert_eq!(parse("S → a ε", &ab), Err(CfgParseError::UnexpectedToken));
    }

    #[test]
    fn test_empty_production_without_epsilon() {
        // "S →" followed by nothing is treated as an epsilon production,
        // the same as "S → ε".
        let cfg = parse("S →", &alphabet_from_str("a")).unwrap();
        assert_eq!(cfg.productions.len(), 1);
        assert!(cfg.productions[0].rhs.is_empty());
    }

    #[test]
    fn test_rhs_nonterminals_not_declared() {
        let cfg = parse("S → A", &alphabet_from_str("a")).unwrap();
        assert!(!cfg.nonterminals.contains(&'A'));
    }
}
