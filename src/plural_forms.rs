//! Gettext `Plural-Forms` handling.
//!
//! Provides the default plural rule for common languages and a parser and
//! evaluator for the C-like `plural=` expression language.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{error::Error, language::Language};

lazy_static! {
    static ref PLURAL_FORMS_REGEX: Regex =
        Regex::new(r"nplurals\s*=\s*(\d+)\s*;\s*plural\s*=\s*([^;]+);?").unwrap();

    /// Static mapping from language code → default `Plural-Forms` value.
    /// Looked up by full code (`pt_BR`) first, then by the bare language.
    static ref DEFAULT_RULES: BTreeMap<&'static str, &'static str> = {
        let mut m: BTreeMap<&'static str, &'static str> = BTreeMap::new();

        for code in ["ja", "zh", "ko", "th", "vi", "id", "ms", "km", "lo", "my", "yue", "ka"] {
            m.insert(code, "nplurals=1; plural=0;");
        }

        for code in [
            "en", "de", "nl", "sv", "da", "nb", "nn", "no", "fi", "et", "hi", "bn", "gu", "ta",
            "te", "kn", "ml", "mr", "it", "es", "pt", "el", "eu", "gl", "af", "sw", "ur", "tr",
            "hu", "bg", "ca", "eo", "fy", "he", "fa", "az", "sq", "nl_BE", "is",
        ] {
            m.insert(code, "nplurals=2; plural=(n != 1);");
        }

        for code in ["fr", "pt_BR", "oc", "hy", "kab", "ln", "fil", "tl"] {
            m.insert(code, "nplurals=2; plural=(n > 1);");
        }

        for code in ["ru", "uk", "be", "sr", "hr", "bs", "sh"] {
            m.insert(
                code,
                "nplurals=3; plural=(n%10==1 && n%100!=11 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2);",
            );
        }

        m.insert(
            "pl",
            "nplurals=3; plural=(n==1 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2);",
        );

        for code in ["cs", "sk"] {
            m.insert(code, "nplurals=3; plural=(n==1) ? 0 : (n>=2 && n<=4) ? 1 : 2;");
        }

        m.insert(
            "sl",
            "nplurals=4; plural=(n%100==1 ? 0 : n%100==2 ? 1 : n%100==3 || n%100==4 ? 2 : 3);",
        );
        m.insert(
            "lt",
            "nplurals=3; plural=(n%10==1 && n%100!=11 ? 0 : n%10>=2 && (n%100<10 || n%100>=20) ? 1 : 2);",
        );
        m.insert(
            "lv",
            "nplurals=3; plural=(n%10==1 && n%100!=11 ? 0 : n != 0 ? 1 : 2);",
        );
        m.insert(
            "ga",
            "nplurals=5; plural=(n==1 ? 0 : n==2 ? 1 : n>=3 && n<=6 ? 2 : n>=7 && n<=10 ? 3 : 4);",
        );
        m.insert(
            "ro",
            "nplurals=3; plural=(n==1 ? 0 : (n==0 || (n%100 > 0 && n%100 < 20)) ? 1 : 2);",
        );
        m.insert(
            "ar",
            "nplurals=6; plural=(n==0 ? 0 : n==1 ? 1 : n==2 ? 2 : n%100>=3 && n%100<=10 ? 3 : n%100>=11 ? 4 : 5);",
        );

        m
    };
}

/// Highest `n` checked when verifying that an expression stays within
/// `nplurals`.
const BOUNDS_CHECK_LIMIT: u64 = 1000;

/// Returns the default `Plural-Forms` header value for a language, if known.
pub fn default_plural_forms(lang: &Language) -> Option<&'static str> {
    let code = lang.code();
    DEFAULT_RULES
        .get(code.as_str())
        .or_else(|| DEFAULT_RULES.get(lang.lang()))
        .copied()
}

/// Number of plural forms a language requires by default.
pub fn default_nplurals(lang: &Language) -> Option<usize> {
    default_plural_forms(lang)
        .and_then(|s| PluralForms::parse(s).ok())
        .map(|p| p.nplurals)
}

/// A parsed `Plural-Forms` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluralForms {
    pub nplurals: usize,
    pub expr: PluralFormsExpr,
}

impl PluralForms {
    /// Parses `nplurals=N; plural=EXPR;`.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let caps = PLURAL_FORMS_REGEX
            .captures(s)
            .ok_or_else(|| Error::InvalidPluralForms(format!("malformed header value `{s}`")))?;
        let nplurals: usize = caps[1]
            .parse()
            .map_err(|_| Error::InvalidPluralForms(format!("bad nplurals in `{s}`")))?;
        if nplurals == 0 {
            return Err(Error::InvalidPluralForms("nplurals must be positive".into()));
        }
        let expr = PluralFormsExpr::parse(caps[2].trim())?;
        Ok(PluralForms { nplurals, expr })
    }

    /// Plural form index for `n`, clamped to the valid range.
    pub fn form_for(&self, n: u64) -> usize {
        let idx = self.expr.evaluate(n).unwrap_or(0) as usize;
        idx.min(self.nplurals - 1)
    }

    /// Checks that `plural(n)` is defined and below `nplurals` for small `n`.
    pub fn check_bounds(&self) -> Result<(), String> {
        for n in 0..=BOUNDS_CHECK_LIMIT {
            match self.expr.evaluate(n) {
                Some(idx) if (idx as usize) < self.nplurals => {}
                Some(idx) => {
                    return Err(format!(
                        "plural form {idx} for n={n} is out of range (nplurals={})",
                        self.nplurals
                    ));
                }
                None => return Err(format!("division by zero for n={n}")),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    N,
    Num(u64),
    Not(Box<Node>),
    Binary(BinOp, Box<Node>, Box<Node>),
    Cond(Box<Node>, Box<Node>, Box<Node>),
}

/// A parsed `plural=` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluralFormsExpr {
    root: Node,
}

impl PluralFormsExpr {
    pub fn parse(s: &str) -> Result<Self, Error> {
        let tokens = tokenize(s)?;
        let mut parser = ExprParser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let root = parser.conditional()?;
        if parser.pos != parser.tokens.len() {
            return Err(Error::InvalidPluralForms(format!(
                "unexpected trailing input in `{s}`"
            )));
        }
        Ok(PluralFormsExpr { root })
    }

    /// Evaluates the expression; `None` on division by zero.
    pub fn evaluate(&self, n: u64) -> Option<u64> {
        eval(&self.root, n)
    }
}

fn eval(node: &Node, n: u64) -> Option<u64> {
    let v = match node {
        Node::N => n,
        Node::Num(v) => *v,
        Node::Not(inner) => (eval(inner, n)? == 0) as u64,
        Node::Cond(c, a, b) => {
            if eval(c, n)? != 0 {
                eval(a, n)?
            } else {
                eval(b, n)?
            }
        }
        Node::Binary(op, l, r) => {
            let l = eval(l, n)?;
            // short-circuit like C
            match op {
                BinOp::Or if l != 0 => return Some(1),
                BinOp::And if l == 0 => return Some(0),
                _ => {}
            }
            let r = eval(r, n)?;
            match op {
                BinOp::Or | BinOp::And => (r != 0) as u64,
                BinOp::Eq => (l == r) as u64,
                BinOp::Ne => (l != r) as u64,
                BinOp::Lt => (l < r) as u64,
                BinOp::Le => (l <= r) as u64,
                BinOp::Gt => (l > r) as u64,
                BinOp::Ge => (l >= r) as u64,
                BinOp::Add => l.wrapping_add(r),
                BinOp::Sub => l.wrapping_sub(r),
                BinOp::Mul => l.wrapping_mul(r),
                BinOp::Div => l.checked_div(r)?,
                BinOp::Mod => l.checked_rem(r)?,
            }
        }
    };
    Some(v)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    N,
    Num(u64),
    Op(&'static str),
    LParen,
    RParen,
    Question,
    Colon,
}

fn tokenize(s: &str) -> Result<Vec<Token>, Error> {
    const OPERATORS: [&str; 15] = [
        "||", "&&", "==", "!=", "<=", ">=", "<", ">", "+", "-", "*", "/", "%", "!", "=",
    ];

    let mut tokens = Vec::new();
    let mut rest = s;
    'outer: while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
            continue;
        }
        if c.is_ascii_digit() {
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            let v = rest[..end]
                .parse()
                .map_err(|_| Error::InvalidPluralForms(format!("number too large in `{s}`")))?;
            tokens.push(Token::Num(v));
            rest = &rest[end..];
            continue;
        }
        let simple = match c {
            'n' => Some(Token::N),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '?' => Some(Token::Question),
            ':' => Some(Token::Colon),
            _ => None,
        };
        if let Some(token) = simple {
            tokens.push(token);
            rest = &rest[1..];
            continue;
        }
        for op in OPERATORS {
            // a lone `=` is never valid
            if op != "=" && rest.starts_with(op) {
                tokens.push(Token::Op(op));
                rest = &rest[op.len()..];
                continue 'outer;
            }
        }
        return Err(Error::InvalidPluralForms(format!(
            "unexpected character `{c}` in `{s}`"
        )));
    }
    Ok(tokens)
}

/// Deepest nesting of parentheses, `!` and `?:` accepted in an expression.
const MAX_NESTING: usize = 64;

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl ExprParser {
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T, Error>) -> Result<T, Error> {
        if self.depth == MAX_NESTING {
            return Err(Error::InvalidPluralForms(format!(
                "expression nested deeper than {MAX_NESTING} levels"
            )));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn expect(&mut self, token: Token) -> Result<(), Error> {
        if self.peek() == Some(&token) {
            self.pos += 1;
            Ok(())
        } else {
            Err(Error::InvalidPluralForms(format!(
                "expected {token:?} at token {}",
                self.pos
            )))
        }
    }

    fn conditional(&mut self) -> Result<Node, Error> {
        let cond = self.binary(0)?;
        if self.peek() == Some(&Token::Question) {
            self.pos += 1;
            let a = self.nested(Self::conditional)?;
            self.expect(Token::Colon)?;
            let b = self.nested(Self::conditional)?;
            return Ok(Node::Cond(Box::new(cond), Box::new(a), Box::new(b)));
        }
        Ok(cond)
    }

    fn binary(&mut self, level: usize) -> Result<Node, Error> {
        const LEVELS: [&[(&str, BinOp)]; 6] = [
            &[("||", BinOp::Or)],
            &[("&&", BinOp::And)],
            &[("==", BinOp::Eq), ("!=", BinOp::Ne)],
            &[
                ("<", BinOp::Lt),
                ("<=", BinOp::Le),
                (">", BinOp::Gt),
                (">=", BinOp::Ge),
            ],
            &[("+", BinOp::Add), ("-", BinOp::Sub)],
            &[("*", BinOp::Mul), ("/", BinOp::Div), ("%", BinOp::Mod)],
        ];

        if level == LEVELS.len() {
            return self.unary();
        }

        let mut lhs = self.binary(level + 1)?;
        loop {
            let op = match self.peek() {
                Some(Token::Op(sym)) => LEVELS[level]
                    .iter()
                    .find(|(s, _)| s == sym)
                    .map(|(_, op)| *op),
                _ => None,
            };
            let Some(op) = op else { break };
            self.pos += 1;
            let rhs = self.binary(level + 1)?;
            lhs = Node::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Node, Error> {
        match self.peek().cloned() {
            Some(Token::Op("!")) => {
                self.pos += 1;
                Ok(Node::Not(Box::new(self.nested(Self::unary)?)))
            }
            Some(Token::N) => {
                self.pos += 1;
                Ok(Node::N)
            }
            Some(Token::Num(v)) => {
                self.pos += 1;
                Ok(Node::Num(v))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.nested(Self::conditional)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            other => Err(Error::InvalidPluralForms(format!(
                "unexpected token {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lang(s: &str) -> Language {
        Language::try_parse(s).unwrap()
    }

    #[test]
    fn test_default_nplurals() {
        assert_eq!(default_nplurals(&lang("en")), Some(2));
        assert_eq!(default_nplurals(&lang("de_DE")), Some(2));
        assert_eq!(default_nplurals(&lang("ja")), Some(1));
        assert_eq!(default_nplurals(&lang("ru")), Some(3));
        assert_eq!(default_nplurals(&lang("ar")), Some(6));
        assert_eq!(default_nplurals(&lang("xx")), None);
    }

    #[test]
    fn test_pt_br_prefers_full_code() {
        assert_eq!(
            default_plural_forms(&lang("pt_BR")),
            Some("nplurals=2; plural=(n > 1);")
        );
        assert_eq!(
            default_plural_forms(&lang("pt_PT")),
            Some("nplurals=2; plural=(n != 1);")
        );
    }

    #[test]
    fn test_russian_rule() {
        let pf = PluralForms::parse(default_plural_forms(&lang("ru")).unwrap()).unwrap();
        assert_eq!(pf.nplurals, 3);
        assert_eq!(pf.form_for(1), 0);
        assert_eq!(pf.form_for(21), 0);
        assert_eq!(pf.form_for(11), 2);
        assert_eq!(pf.form_for(3), 1);
        assert_eq!(pf.form_for(25), 2);
    }

    #[test]
    fn test_czech_unparenthesized_ternary() {
        let pf = PluralForms::parse("nplurals=3; plural=(n==1) ? 0 : (n>=2 && n<=4) ? 1 : 2;")
            .unwrap();
        assert_eq!(pf.form_for(1), 0);
        assert_eq!(pf.form_for(4), 1);
        assert_eq!(pf.form_for(5), 2);
    }

    #[test]
    fn test_boolean_expression_result() {
        let pf = PluralForms::parse("nplurals=2; plural=n != 1;").unwrap();
        assert_eq!(pf.form_for(1), 0);
        assert_eq!(pf.form_for(0), 1);
    }

    #[test]
    fn test_malformed_values() {
        assert!(PluralForms::parse("nplurals=INTEGER; plural=EXPRESSION;").is_err());
        assert!(PluralForms::parse("nplurals=2; plural=(n != 1;").is_err());
        assert!(PluralForms::parse("nplurals=0; plural=0;").is_err());
        assert!(PluralForms::parse("nplurals=2; plural=n = 1;").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}n{}", "(".repeat(10_000), ")".repeat(10_000));
        let err = PluralFormsExpr::parse(&deep).unwrap_err();
        assert!(err.to_string().contains("nested deeper"), "{err}");
        assert!(PluralFormsExpr::parse(&"!".repeat(10_000)).is_err());

        let fine = format!("{}n != 1{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert!(PluralFormsExpr::parse(&fine).is_ok());

        let header = format!("nplurals=2; plural={}n{};", "(".repeat(5_000), ")".repeat(5_000));
        assert!(PluralForms::parse(&header).is_err());
    }

    #[test]
    fn test_check_bounds() {
        let ok = PluralForms::parse("nplurals=2; plural=(n != 1);").unwrap();
        assert!(ok.check_bounds().is_ok());

        let too_many = PluralForms::parse("nplurals=2; plural=n%3;").unwrap();
        let err = too_many.check_bounds().unwrap_err();
        assert!(err.contains("out of range"));

        let div = PluralForms::parse("nplurals=2; plural=1/n;").unwrap();
        assert!(div.check_bounds().unwrap_err().contains("division by zero"));
    }

    #[test]
    fn test_every_default_rule_is_valid() {
        for rule in DEFAULT_RULES.values() {
            let pf = PluralForms::parse(rule).unwrap();
            assert!(pf.check_bounds().is_ok(), "{rule}");
        }
    }

    proptest! {
        #[test]
        fn polish_rule_always_in_range(n in 0u64..1_000_000) {
            let pf = PluralForms::parse(default_plural_forms(&lang("pl")).unwrap()).unwrap();
            prop_assert!(pf.expr.evaluate(n).unwrap() < 3);
        }
    }
}
