use crate::error::{Diagnostic, DiagnosticKind};
use crate::ident::Ident;
use crate::span::Span;
use crate::token::{Token, TokenWithSpan};

/// Cursor over the lexed tokens. Always ends on [`Token::Eof`], which is never
/// consumed.
pub(crate) struct DeTokParser {
    tokens: Vec<TokenWithSpan>,
    index: usize,
    /// End of the last consumed token.
    end: usize,
}

impl DeTokParser {
    pub(crate) fn new(mut tokens: Vec<TokenWithSpan>) -> Self {
        if !matches!(tokens.last(), Some(TokenWithSpan { token: Token::Eof, .. })) {
            let end = tokens.last().map_or(0, |token| token.span.end);
            tokens.push(TokenWithSpan { span: Span::new(end, end), token: Token::Eof });
        }
        DeTokParser { tokens, index: 0, end: 0 }
    }

    pub(crate) fn peek_span(&self) -> Span {
        self.tokens[self.index].span
    }

    pub(crate) fn peek_token(&self) -> Token {
        self.tokens[self.index].token
    }

    /// Looks `offset` tokens past the current one.
    pub(crate) fn peek_token_at(&self, offset: usize) -> Token {
        self.tokens.get(self.index + offset).map_or(Token::Eof, |token| token.token)
    }

    pub(crate) fn skip_token(&mut self) {
        if self.peek_token() != Token::Eof {
            self.end = self.tokens[self.index].span.end;
            self.index += 1;
        }
    }

    /// Index of the current token, to tell whether error recovery made progress.
    pub(crate) fn position(&self) -> usize {
        self.index
    }

    pub(crate) fn end(&self) -> usize {
        self.end
    }

    pub(crate) fn token_end(&self) -> usize {
        self.peek_span().end
    }

    pub(crate) fn error(&self, message: String) -> Diagnostic {
        Diagnostic::new(DiagnosticKind::SyntaxError, self.peek_span(), message)
    }

    pub(crate) fn accept_token(&mut self, token: Token) -> bool {
        if self.peek_token() != token {
            return false;
        }
        self.skip_token();
        true
    }

    pub(crate) fn expect_token(&mut self, expected: Token) -> Result<(), Diagnostic> {
        let actual = self.peek_token();
        if actual != expected {
            return Err(self.error(format!("expected `{}`, unexpected token `{}`", expected, actual)));
        }
        self.skip_token();
        Ok(())
    }

    pub(crate) fn parse_ident(&mut self) -> Result<Ident, Diagnostic> {
        match self.peek_token() {
            Token::Ident(ident) => {
                self.skip_token();
                Ok(ident)
            }
            token => Err(self.error(format!("expected identifier, unexpected token `{}`", token))),
        }
    }

    /// Error recovery: skips past the next `;`, or up to the `}` that closes the
    /// current block. Braced groups met on the way are skipped whole. Returns
    /// whether anything was consumed.
    pub(crate) fn skip_to_sync(&mut self) -> bool {
        let start = self.index;
        let mut depth = 0usize;
        loop {
            match self.peek_token() {
                Token::Eof => break,
                Token::Semi if depth == 0 => {
                    self.skip_token();
                    break;
                }
                Token::LeftBrace => {
                    depth += 1;
                    self.skip_token();
                }
                Token::RightBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    self.skip_token();
                    if depth == 0 {
                        break;
                    }
                }
                _ => self.skip_token(),
            }
        }
        self.index != start
    }

    pub(crate) fn begin_span(&self) -> SpanTracker {
        SpanTracker { start: self.peek_span().start }
    }
}

pub(crate) struct SpanTracker {
    start: usize,
}

impl SpanTracker {
    /// Span from the tracked start to the end of the last consumed token.
    pub(crate) fn end(&self, parser: &DeTokParser) -> Span {
        Span::new(self.start, parser.end().max(self.start))
    }

    /// Span from the tracked start through the current token.
    pub(crate) fn error(&self, parser: &DeTokParser, kind: DiagnosticKind, message: String) -> Diagnostic {
        Diagnostic::new(kind, Span::new(self.start, parser.token_end().max(self.start)), message)
    }
}
