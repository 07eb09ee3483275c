//! Token stream wrapper for the hand-written parser.

use nestml_ast::foundation::{NodeId, NodeIdGen, Span};
use nestml_lexer::{SpannedToken, Token};

/// Token stream with lookahead, position tracking and node-id allocation.
///
/// Each token carries its byte range and line, so spans built from the
/// stream point at real source locations.
pub struct TokenStream<'src> {
    tokens: &'src [SpannedToken],
    pos: usize,
    file_id: u16,
    ids: NodeIdGen,
}

impl<'src> TokenStream<'src> {
    pub fn new(tokens: &'src [SpannedToken], file_id: u16) -> Self {
        Self {
            tokens,
            pos: 0,
            file_id,
            ids: NodeIdGen::new(),
        }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&'src Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Peek at the nth token ahead without consuming.
    pub fn peek_nth(&self, n: usize) -> Option<&'src Token> {
        self.tokens.get(self.pos + n).map(|t| &t.token)
    }

    /// Line of the current token, if any.
    pub fn peek_line(&self) -> Option<u32> {
        self.tokens.get(self.pos).map(|t| t.line)
    }

    /// Line of the last consumed token.
    pub fn previous_line(&self) -> Option<u32> {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.line)
    }

    /// Advance to the next token and return the current one.
    pub fn advance(&mut self) -> Option<&'src Token> {
        let token = self.tokens.get(self.pos).map(|t| &t.token);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if the current token matches the expected token kind.
    pub fn check(&self, expected: &Token) -> bool {
        matches!(
            self.peek(),
            Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected)
        )
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Expect a specific token and advance if it matches.
    pub fn expect(&mut self, expected: Token) -> Result<Span, super::ParseError> {
        if self.check(&expected) {
            let start = self.pos;
            self.advance();
            Ok(self.span_from(start))
        } else {
            Err(super::ParseError::expected_token(
                expected,
                self.peek().cloned(),
                self.current_span(),
            ))
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn current_pos(&self) -> usize {
        self.pos
    }

    /// Span from the token at `start` to the last consumed token.
    pub fn span_from(&self, start: usize) -> Span {
        let Some(first) = self.tokens.get(start) else {
            return self.current_span();
        };
        let end_byte = match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(last) if self.pos > start => last.range.end,
            _ => first.range.start,
        };
        Span::new(
            self.file_id,
            first.range.start as u32,
            end_byte as u32,
            first.line,
        )
    }

    /// Span of the current token; at EOF, an empty span after the last token.
    pub fn current_span(&self) -> Span {
        if let Some(t) = self.tokens.get(self.pos) {
            Span::new(
                self.file_id,
                t.range.start as u32,
                t.range.end as u32,
                t.line,
            )
        } else if let Some(t) = self.tokens.last() {
            Span::new(self.file_id, t.range.end as u32, t.range.end as u32, t.line)
        } else {
            Span::zero(self.file_id)
        }
    }

    /// Skip to the next `neuron`/`component` keyword for error recovery.
    pub fn synchronize(&mut self) {
        while !self.at_end() {
            match self.peek() {
                Some(Token::Neuron) | Some(Token::Component) => break,
                _ => {
                    self.advance();
                }
            }
        }
    }

    pub fn file_id(&self) -> u16 {
        self.file_id
    }

    pub fn fresh_id(&mut self) -> NodeId {
        self.ids.fresh()
    }

    pub fn node_count(&self) -> u32 {
        self.ids.count()
    }
}
