//! Restricted declarative parser for dependency specification documents
//!
//! The upstream DEPS format is a Python file, historically loaded by
//! executing it. This parser accepts only the declarative subset bisection
//! needs and rejects everything else with
//! [`BisectError::UnsupportedSpec`]: no expression evaluation, no side
//! effects, no external references.
//!
//! Accepted grammar:
//!
//! ```text
//! document   := assignment*
//! assignment := ("vars" | "deps" | "deps_os") "=" dict
//! vars dict  := "{" (STRING ":" STRING ","?)* "}"
//! deps dict  := "{" (STRING ":" pin ","?)* "}"
//! os dict    := "{" (STRING ":" deps-dict ","?)* "}"
//! pin        := term ("+" term)*
//! term       := STRING | "Var" "(" STRING ")"
//! ```
//!
//! `#` starts a comment running to end of line. String literals may be
//! single- or double-quoted. `Var("name")` is substituted with the value of
//! `vars["name"]` after the whole document has been parsed, so `vars` may
//! appear anywhere in the document.

use crate::error::{BisectError, Result};
use std::collections::{BTreeMap, HashMap};
use std::iter::Peekable;
use std::str::Chars;

/// A parsed dependency document with all `Var` substitutions applied
///
/// `deps_os` keys are held in a BTreeMap so downstream merging is
/// deterministic regardless of how the document orders them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedDeps {
    /// dependency-path -> pin string
    pub deps: HashMap<String, String>,
    /// OS name -> (dependency-path -> pin string)
    pub deps_os: BTreeMap<String, HashMap<String, String>>,
}

/// One term of a pin expression before variable substitution
#[derive(Debug, Clone)]
enum Term {
    Literal(String),
    Var(String),
}

type PinExpr = Vec<Term>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
    LBrace,
    RBrace,
    LParen,
    RParen,
    Colon,
    Comma,
    Plus,
    Eq,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("identifier '{name}'"),
            Token::Str(_) => "string literal".to_string(),
            Token::LBrace => "'{'".to_string(),
            Token::RBrace => "'}'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Colon => "':'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Plus => "'+'".to_string(),
            Token::Eq => "'='".to_string(),
        }
    }
}

struct Scanner<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn skip_trivia(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '#' {
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn string_literal(&mut self, quote: char) -> Result<Token> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(Token::Str(value)),
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(c @ ('\\' | '\'' | '"')) => value.push(c),
                    Some(c) => {
                        return Err(unsupported(
                            self.line,
                            format!("unsupported escape '\\{c}' in string literal"),
                        ));
                    }
                    None => {
                        return Err(unsupported(self.line, "unterminated string literal"));
                    }
                },
                Some('\n') | None => {
                    return Err(unsupported(self.line, "unterminated string literal"));
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_trivia();
        let Some(&c) = self.chars.peek() else {
            return Ok(None);
        };

        let token = match c {
            '{' => {
                self.bump();
                Token::LBrace
            }
            '}' => {
                self.bump();
                Token::RBrace
            }
            '(' => {
                self.bump();
                Token::LParen
            }
            ')' => {
                self.bump();
                Token::RParen
            }
            ':' => {
                self.bump();
                Token::Colon
            }
            ',' => {
                self.bump();
                Token::Comma
            }
            '+' => {
                self.bump();
                Token::Plus
            }
            '=' => {
                self.bump();
                Token::Eq
            }
            '\'' | '"' => {
                self.bump();
                return self.string_literal(c).map(Some);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&c) = self.chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                Token::Ident(name)
            }
            other => {
                return Err(unsupported(
                    self.line,
                    format!("unexpected character '{other}'"),
                ));
            }
        };
        Ok(Some(token))
    }
}

fn unsupported(line: usize, msg: impl std::fmt::Display) -> BisectError {
    BisectError::UnsupportedSpec(format!("line {line}: {msg}"))
}

struct Parser<'a> {
    scanner: Scanner<'a>,
    lookahead: Option<Token>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            scanner: Scanner::new(source),
            lookahead: None,
        }
    }

    fn line(&self) -> usize {
        self.scanner.line
    }

    fn peek(&mut self) -> Result<Option<&Token>> {
        if self.lookahead.is_none() {
            self.lookahead = self.scanner.next_token()?;
        }
        Ok(self.lookahead.as_ref())
    }

    fn next(&mut self) -> Result<Option<Token>> {
        self.peek()?;
        Ok(self.lookahead.take())
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next()? {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(unsupported(
                self.line(),
                format!("expected {}, found {}", expected.describe(), token.describe()),
            )),
            None => Err(unsupported(
                self.line(),
                format!("expected {}, found end of document", expected.describe()),
            )),
        }
    }

    fn expect_string(&mut self) -> Result<String> {
        match self.next()? {
            Some(Token::Str(value)) => Ok(value),
            Some(token) => Err(unsupported(
                self.line(),
                format!("expected string literal, found {}", token.describe()),
            )),
            None => Err(unsupported(
                self.line(),
                "expected string literal, found end of document",
            )),
        }
    }

    /// document := assignment*
    fn document(&mut self) -> Result<Document> {
        let mut doc = Document::default();
        while let Some(token) = self.next()? {
            let Token::Ident(name) = token else {
                return Err(unsupported(
                    self.line(),
                    format!("expected a top-level assignment, found {}", token.describe()),
                ));
            };
            self.expect(Token::Eq)?;
            match name.as_str() {
                "vars" => {
                    let vars = self.string_dict()?;
                    if doc.vars.replace(vars).is_some() {
                        return Err(unsupported(self.line(), "duplicate 'vars' assignment"));
                    }
                }
                "deps" => {
                    let deps = self.pin_dict()?;
                    if doc.deps.replace(deps).is_some() {
                        return Err(unsupported(self.line(), "duplicate 'deps' assignment"));
                    }
                }
                "deps_os" => {
                    let deps_os = self.os_dict()?;
                    if doc.deps_os.replace(deps_os).is_some() {
                        return Err(unsupported(self.line(), "duplicate 'deps_os' assignment"));
                    }
                }
                other => {
                    return Err(unsupported(
                        self.line(),
                        format!("unsupported top-level assignment '{other}'"),
                    ));
                }
            }
        }
        Ok(doc)
    }

    /// Parse `{ STRING: <value>, ... }` with the value rule supplied by the
    /// caller; trailing commas are accepted.
    fn dict<V>(&mut self, mut value: impl FnMut(&mut Self) -> Result<V>) -> Result<Vec<(String, V)>> {
        self.expect(Token::LBrace)?;
        let mut entries = Vec::new();
        loop {
            if self.peek()?.is_none() {
                return Err(unsupported(self.line(), "unterminated dictionary"));
            }
            if matches!(self.peek()?, Some(Token::RBrace)) {
                self.next()?;
                return Ok(entries);
            }

            let key = self.expect_string()?;
            self.expect(Token::Colon)?;
            entries.push((key, value(self)?));

            match self.next()? {
                Some(Token::Comma) => continue,
                Some(Token::RBrace) => return Ok(entries),
                Some(token) => {
                    return Err(unsupported(
                        self.line(),
                        format!("expected ',' or '}}', found {}", token.describe()),
                    ));
                }
                None => return Err(unsupported(self.line(), "unterminated dictionary")),
            }
        }
    }

    fn string_dict(&mut self) -> Result<HashMap<String, String>> {
        let entries = self.dict(|parser| parser.expect_string())?;
        Ok(entries.into_iter().collect())
    }

    fn pin_dict(&mut self) -> Result<Vec<(String, PinExpr)>> {
        self.dict(|parser| parser.pin_expr())
    }

    fn os_dict(&mut self) -> Result<Vec<(String, Vec<(String, PinExpr)>)>> {
        self.dict(|parser| parser.pin_dict())
    }

    /// pin := term ("+" term)*
    fn pin_expr(&mut self) -> Result<PinExpr> {
        let mut terms = vec![self.term()?];
        while matches!(self.peek()?, Some(Token::Plus)) {
            self.next()?;
            terms.push(self.term()?);
        }
        Ok(terms)
    }

    /// term := STRING | "Var" "(" STRING ")"
    fn term(&mut self) -> Result<Term> {
        match self.next()? {
            Some(Token::Str(value)) => Ok(Term::Literal(value)),
            Some(Token::Ident(name)) if name == "Var" => {
                self.expect(Token::LParen)?;
                let var = self.expect_string()?;
                self.expect(Token::RParen)?;
                Ok(Term::Var(var))
            }
            Some(Token::Ident(name)) => Err(unsupported(
                self.line(),
                format!("unsupported call or reference '{name}' (only Var(..) is recognized)"),
            )),
            Some(token) => Err(unsupported(
                self.line(),
                format!("expected string literal or Var(..), found {}", token.describe()),
            )),
            None => Err(unsupported(
                self.line(),
                "expected string literal or Var(..), found end of document",
            )),
        }
    }
}

#[derive(Default)]
struct Document {
    vars: Option<HashMap<String, String>>,
    deps: Option<Vec<(String, PinExpr)>>,
    deps_os: Option<Vec<(String, Vec<(String, PinExpr)>)>>,
}

fn substitute(expr: &PinExpr, vars: &HashMap<String, String>) -> Result<String> {
    let mut out = String::new();
    for term in expr {
        match term {
            Term::Literal(value) => out.push_str(value),
            Term::Var(name) => match vars.get(name) {
                Some(value) => out.push_str(value),
                None => {
                    return Err(BisectError::UnsupportedSpec(format!(
                        "undefined variable '{name}' in pin expression"
                    )));
                }
            },
        }
    }
    Ok(out)
}

/// Parse a dependency document and apply all `Var` substitutions
pub fn parse(source: &str) -> Result<ResolvedDeps> {
    let document = Parser::new(source).document()?;
    let vars = document.vars.unwrap_or_default();

    let mut resolved = ResolvedDeps::default();
    for (path, expr) in document.deps.unwrap_or_default() {
        resolved.deps.insert(path, substitute(&expr, &vars)?);
    }
    for (os, entries) in document.deps_os.unwrap_or_default() {
        let overlay = resolved.deps_os.entry(os).or_default();
        for (path, expr) in entries {
            overlay.insert(path, substitute(&expr, &vars)?);
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_deps() {
        let resolved = parse(
            r#"
            deps = {
                "src/v8": "https://example.com/v8/v8.git@c092edb",
            }
            "#,
        )
        .unwrap();
        assert_eq!(
            resolved.deps.get("src/v8").unwrap(),
            "https://example.com/v8/v8.git@c092edb"
        );
        assert!(resolved.deps_os.is_empty());
    }

    #[test]
    fn test_parse_var_substitution_and_concatenation() {
        let resolved = parse(
            r#"
            vars = {
                "chromium_git": "https://example.com",
            }
            deps = {
                "src/v8": Var("chromium_git") + "/v8/v8.git" + "@" + "c092edb",
            }
            "#,
        )
        .unwrap();
        assert_eq!(
            resolved.deps.get("src/v8").unwrap(),
            "https://example.com/v8/v8.git@c092edb"
        );
    }

    #[test]
    fn test_vars_may_follow_deps() {
        let resolved = parse(
            r#"
            deps = {
                "src/a": Var("base") + "@aaa",
            }
            vars = {
                "base": "https://example.com/a",
            }
            "#,
        )
        .unwrap();
        assert_eq!(resolved.deps.get("src/a").unwrap(), "https://example.com/a@aaa");
    }

    #[test]
    fn test_parse_deps_os() {
        let resolved = parse(
            r#"
            deps = {
                "src/a": "https://example.com/a@aaa",
            }
            deps_os = {
                "win": {
                    "src/b": "https://example.com/b@bbb",
                },
                "unix": {},
            }
            "#,
        )
        .unwrap();
        assert_eq!(resolved.deps_os.len(), 2);
        assert_eq!(
            resolved.deps_os["win"].get("src/b").unwrap(),
            "https://example.com/b@bbb"
        );
        assert!(resolved.deps_os["unix"].is_empty());
    }

    #[test]
    fn test_comments_and_single_quotes() {
        let resolved = parse(
            "# header comment\n\
             deps = {\n\
                 'src/a': 'https://example.com/a@aaa', # pinned for the holidays\n\
             }\n",
        )
        .unwrap();
        assert_eq!(resolved.deps.get("src/a").unwrap(), "https://example.com/a@aaa");
    }

    #[test]
    fn test_empty_document() {
        let resolved = parse("").unwrap();
        assert!(resolved.deps.is_empty());
        assert!(resolved.deps_os.is_empty());
    }

    #[test]
    fn test_rejects_unknown_top_level_assignment() {
        let err = parse("hooks = {}").unwrap_err();
        assert!(matches!(err, BisectError::UnsupportedSpec(msg) if msg.contains("hooks")));
    }

    #[test]
    fn test_rejects_arbitrary_code() {
        let err = parse("import os\nos.system('true')").unwrap_err();
        assert!(matches!(err, BisectError::UnsupportedSpec(_)));
    }

    #[test]
    fn test_rejects_unknown_call() {
        let err = parse(r#"deps = {"src/a": Str("x")}"#).unwrap_err();
        assert!(matches!(err, BisectError::UnsupportedSpec(msg) if msg.contains("Str")));
    }

    #[test]
    fn test_rejects_undefined_variable() {
        let err = parse(r#"deps = {"src/a": Var("nope") + "@aaa"}"#).unwrap_err();
        assert!(matches!(err, BisectError::UnsupportedSpec(msg) if msg.contains("nope")));
    }

    #[test]
    fn test_rejects_var_inside_vars() {
        let err = parse(
            r#"
            vars = {
                "a": Var("b"),
            }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, BisectError::UnsupportedSpec(_)));
    }

    #[test]
    fn test_rejects_non_dict_assignment() {
        let err = parse(r#"deps = "not a dict""#).unwrap_err();
        assert!(matches!(err, BisectError::UnsupportedSpec(_)));
    }

    #[test]
    fn test_rejects_duplicate_assignment() {
        let err = parse("deps = {}\ndeps = {}").unwrap_err();
        assert!(matches!(err, BisectError::UnsupportedSpec(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_rejects_unterminated_string() {
        let err = parse("deps = {\"src/a\": \"https://example.com/a@aaa\n}").unwrap_err();
        assert!(matches!(err, BisectError::UnsupportedSpec(msg) if msg.contains("unterminated")));
    }

    #[test]
    fn test_error_reports_line_number() {
        let err = parse("\n\nhooks = {}").unwrap_err();
        assert!(matches!(err, BisectError::UnsupportedSpec(msg) if msg.starts_with("line 3:")));
    }
}
