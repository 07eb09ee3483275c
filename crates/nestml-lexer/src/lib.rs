// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Lexical analysis for NESTML.
//!
//! This crate tokenizes NESTML source with logos.
//!
//! # Design
//!
//! - `Token`: keywords, operators, literals and identifiers
//! - Comments (`#`, `//`, `/* */`) and whitespace are stripped during lexing
//! - [`tokenize`] pairs each token with its byte range and 1-based line;
//!   the parser needs the line to decide whether a number and a following
//!   name form a quantity literal (`10 mV`)
//! - Identifiers may end in primes (`g_ex'`), naming a derivative
//!
//! # Examples
//!
//! ```
//! # use nestml_lexer::*;
//! let tokens = tokenize("V_m mV = -70 mV").unwrap();
//! assert_eq!(tokens[0].token, Token::Ident("V_m".into()));
//! assert_eq!(tokens.len(), 6);
//! ```

use logos::Logos;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

/// NESTML token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")] // Skip whitespace
#[logos(skip r"#[^\n]*")] // Skip # comments
#[logos(skip r"//[^\n]*")] // Skip // comments
#[logos(skip r"/\*([^*]|\*[^/])*\*/")] // Skip /* */ comments
pub enum Token {
    // === Keywords ===

    // Entities and blocks
    #[token("neuron")]
    Neuron,
    #[token("component")]
    Component,
    #[token("state")]
    State,
    #[token("parameters")]
    Parameters,
    #[token("internals")]
    Internals,
    #[token("equations")]
    Equations,
    #[token("input")]
    Input,
    #[token("output")]
    Output,
    #[token("update")]
    Update,
    #[token("function")]
    Function,
    #[token("end")]
    End,

    // Declarations
    #[token("alias")]
    Alias,
    #[token("shape")]
    Shape,

    // Control flow
    #[token("if")]
    If,
    #[token("elif")]
    Elif,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("step")]
    Step,
    #[token("while")]
    While,
    #[token("return")]
    Return,

    // Logic
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Primitive types
    #[token("real")]
    Real,
    #[token("integer")]
    Integer,
    #[token("boolean")]
    Boolean,
    #[token("string")]
    StringType,
    #[token("void")]
    Void,

    // Input ports
    #[token("spike")]
    Spike,
    #[token("current")]
    Current,
    #[token("inhibitory")]
    Inhibitory,
    #[token("excitatory")]
    Excitatory,

    // === Operators ===
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("**")]
    StarStar,
    #[token("==")]
    EqEq,
    #[token("!=")]
    #[token("<>")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("=")]
    Eq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("<-")]
    LeftArrow,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("...")]
    Ellipsis,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // === Literals ===
    /// Integer literal. Overflow becomes a lex error.
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    IntLit(i64),

    /// Float literal (`3.5`, `.5`, `1e-3`, `2.5E+2`).
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    FloatLit(f64),

    /// String literal with escapes resolved.
    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len() - 1]).map(|s| Rc::from(s.as_str()))
    })]
    StringLit(Rc<str>),

    /// Identifier, including trailing derivative primes and `°C`.
    #[regex(r"[a-zA-Z_°][a-zA-Z0-9_]*'*", |lex| Rc::from(lex.slice()))]
    Ident(Rc<str>),
}

/// Unescape string literal content.
fn unescape_string(s: &str) -> Option<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next()? {
                'n' => result.push('\n'),
                'r' => result.push('\r'),
                't' => result.push('\t'),
                '\\' => result.push('\\'),
                '"' => result.push('"'),
                '\'' => result.push('\''),
                _ => return None,
            }
        } else {
            result.push(c);
        }
    }
    Some(result)
}

impl Token {
    /// Source text of fixed tokens; `None` for literals and identifiers.
    pub fn fixed_text(&self) -> Option<&'static str> {
        let text = match self {
            Token::Neuron => "neuron",
            Token::Component => "component",
            Token::State => "state",
            Token::Parameters => "parameters",
            Token::Internals => "internals",
            Token::Equations => "equations",
            Token::Input => "input",
            Token::Output => "output",
            Token::Update => "update",
            Token::Function => "function",
            Token::End => "end",
            Token::Alias => "alias",
            Token::Shape => "shape",
            Token::If => "if",
            Token::Elif => "elif",
            Token::Else => "else",
            Token::For => "for",
            Token::In => "in",
            Token::Step => "step",
            Token::While => "while",
            Token::Return => "return",
            Token::And => "and",
            Token::Or => "or",
            Token::Not => "not",
            Token::True => "true",
            Token::False => "false",
            Token::Real => "real",
            Token::Integer => "integer",
            Token::Boolean => "boolean",
            Token::StringType => "string",
            Token::Void => "void",
            Token::Spike => "spike",
            Token::Current => "current",
            Token::Inhibitory => "inhibitory",
            Token::Excitatory => "excitatory",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::StarStar => "**",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::Eq => "=",
            Token::PlusEq => "+=",
            Token::MinusEq => "-=",
            Token::StarEq => "*=",
            Token::SlashEq => "/=",
            Token::LeftArrow => "<-",
            Token::Question => "?",
            Token::Colon => ":",
            Token::Comma => ",",
            Token::Ellipsis => "...",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::IntLit(_) | Token::FloatLit(_) | Token::StringLit(_) | Token::Ident(_) => {
                return None
            }
        };
        Some(text)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::IntLit(n) => write!(f, "{}", n),
            Token::FloatLit(x) => write!(f, "{}", x),
            Token::StringLit(s) => write!(f, "\"{}\"", s),
            Token::Ident(id) => write!(f, "{}", id),
            other => f.write_str(other.fixed_text().unwrap_or("?")),
        }
    }
}

/// A token with its byte range and 1-based start line.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub range: Range<usize>,
    pub line: u32,
}

/// Text that does not form a token.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub range: Range<usize>,
    pub line: u32,
    pub text: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized input `{}` on line {}", self.text, self.line)
    }
}

impl std::error::Error for LexError {}

/// Tokenize a whole source file.
///
/// Stops at the first unrecognized input.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, LexError> {
    let mut out = Vec::new();
    let mut lexer = Token::lexer(source);
    let mut line = 1u32;
    let mut cursor = 0usize;

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        line += count_newlines(&source[cursor..range.start]);
        cursor = range.start;
        match result {
            Ok(token) => out.push(SpannedToken {
                token,
                range: range.clone(),
                line,
            }),
            Err(()) => {
                return Err(LexError {
                    text: source[range.clone()].to_string(),
                    range,
                    line,
                })
            }
        }
    }
    Ok(out)
}

fn count_newlines(text: &str) -> u32 {
    text.bytes().filter(|&b| b == b'\n').count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Token::lexer(source)
            .filter_map(|result| result.ok())
            .collect()
    }

    fn ident(s: &str) -> Token {
        Token::Ident(Rc::from(s))
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            lex("neuron component state end alias shape"),
            vec![
                Token::Neuron,
                Token::Component,
                Token::State,
                Token::End,
                Token::Alias,
                Token::Shape
            ]
        );
    }

    #[test]
    fn test_identifiers_with_primes() {
        assert_eq!(
            lex("V_m g_ex' g_in'' °C"),
            vec![ident("V_m"), ident("g_ex'"), ident("g_in''"), ident("°C")]
        );
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        assert_eq!(lex("endpoint states"), vec![ident("endpoint"), ident("states")]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            lex("42 3.5 .5 1e-3"),
            vec![
                Token::IntLit(42),
                Token::FloatLit(3.5),
                Token::FloatLit(0.5),
                Token::FloatLit(1e-3)
            ]
        );
    }

    #[test]
    fn test_range_is_not_float() {
        assert_eq!(
            lex("0...10"),
            vec![Token::IntLit(0), Token::Ellipsis, Token::IntLit(10)]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            lex("** * <- <= < != += ?"),
            vec![
                Token::StarStar,
                Token::Star,
                Token::LeftArrow,
                Token::LtEq,
                Token::Lt,
                Token::NotEq,
                Token::PlusEq,
                Token::Question
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        let source = "x # hash\ny // slash\n/* block\n ** */ z";
        assert_eq!(lex(source), vec![ident("x"), ident("y"), ident("z")]);
    }

    #[test]
    fn test_plain_block_comments() {
        assert_eq!(lex("/* a */ x"), vec![ident("x")]);
        assert_eq!(tokenize("/* a */ x").unwrap().len(), 1);

        let source = "/*\n * Name: iaf\n *\n * Description\n */\nneuron n:\nend";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens[0].token, Token::Neuron);
        assert_eq!(tokens[0].line, 6);
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            lex(r#""a\"b""#),
            vec![Token::StringLit(Rc::from("a\"b"))]
        );
    }

    #[test]
    fn test_tokenize_tracks_lines() {
        let tokens = tokenize("a\n/* x\n y */ b\n\nc").unwrap();
        let lines: Vec<u32> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 3, 5]);
    }

    #[test]
    fn test_tokenize_error() {
        let err = tokenize("x = 1\ny = $").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.text, "$");
    }

    #[test]
    fn test_display() {
        assert_eq!(Token::StarStar.to_string(), "**");
        assert_eq!(ident("tau").to_string(), "tau");
        assert_eq!(Token::StringType.to_string(), "string");
    }
}
