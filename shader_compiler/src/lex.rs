use crate::error::{Diagnostic, DiagnosticKind};
use crate::ident::Ident;
use crate::lit::Lit;
use crate::op::BinaryOpType;
use crate::span::Span;
use crate::token::{Token, TokenWithSpan};
use crate::ty::Type;

/// Every operator and punctuation symbol, longest first, so the first match is the
/// maximal munch.
const SYMBOLS: [&str; 45] = [
    "<<=", ">>=", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "^^", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=",
    "++", "--", "+", "-", "*", "/", "%", "=", "<", ">", "!", "~", "&", "|", "^", "?", ":", ".", ",", ";", "(", ")",
    "{", "}", "[", "]",
];

/// Turns program text into tokens. Errors are yielded in place of the offending
/// token and lexing carries on after them; the last item is always [`Token::Eof`].
/// A malformed number is followed by a `0` literal standing in for it, so the
/// parser does not report the gap as well.
pub(crate) fn lex(code: &str) -> Lex {
    Lex { code, index: 0, is_done: false, placeholder: None }
}

pub(crate) struct Lex<'a> {
    code: &'a str,
    index: usize,
    is_done: bool,
    placeholder: Option<TokenWithSpan>,
}

impl<'a> Lex<'a> {
    fn rest(&self) -> &'a str {
        &self.code[self.index..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.rest().chars().nth(offset)
    }

    fn skip_char(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.index += ch.len_utf8();
        }
    }

    fn error(&self, start: usize, message: String) -> Diagnostic {
        Diagnostic::new(DiagnosticKind::LexError, Span::new(start, self.index.max(start + 1)), message)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), Diagnostic> {
        loop {
            match (self.peek_char(), self.peek_char_at(1)) {
                (Some(ch), _) if ch.is_whitespace() => self.skip_char(),
                (Some('/'), Some('/')) => {
                    while !matches!(self.peek_char(), None | Some('\n')) {
                        self.skip_char();
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.index;
                    match self.rest()[2..].find("*/") {
                        Some(end) => self.index += 2 + end + 2,
                        None => {
                            self.index = self.code.len();
                            return Err(self.error(start, String::from("unterminated block comment")));
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_token_with_span(&mut self) -> Result<TokenWithSpan, Diagnostic> {
        self.skip_whitespace_and_comments()?;
        let start = self.index;
        let token = self.read_token()?;
        Ok(TokenWithSpan { span: Span::new(start, self.index), token })
    }

    fn read_token(&mut self) -> Result<Token, Diagnostic> {
        let start = self.index;
        let ch = match self.peek_char() {
            Some(ch) => ch,
            None => return Ok(Token::Eof),
        };
        if ch.is_ascii_alphabetic() || ch == '_' {
            return Ok(self.read_word());
        }
        if ch.is_ascii_digit() || (ch == '.' && self.peek_char_at(1).map_or(false, |ch| ch.is_ascii_digit())) {
            return self.read_number().map_err(|diagnostic| {
                let span = Span::new(start, self.index);
                self.placeholder = Some(TokenWithSpan { span, token: Token::Lit(Lit::Int(0)) });
                diagnostic
            });
        }
        if let Some(symbol) = SYMBOLS.iter().find(|symbol| self.rest().starts_with(*symbol)) {
            self.index += symbol.len();
            if let Some(op) = BinaryOpType::for_symbol(symbol) {
                return Ok(Token::BinOp(op));
            }
            if let Some(token) = Token::punct(symbol) {
                return Ok(token);
            }
        }
        self.skip_char();
        Err(self.error(start, format!("unexpected character `{}`", ch)))
    }

    fn read_word(&mut self) -> Token {
        let start = self.index;
        while self.peek_char().map_or(false, |ch| ch.is_ascii_alphanumeric() || ch == '_') {
            self.skip_char();
        }
        let word = &self.code[start..self.index];
        if let Some(token) = Token::keyword(word) {
            return token;
        }
        match Type::from_token(word) {
            Ok(ty) => Token::Type(ty),
            Err(_) => Token::Ident(Ident::new(word)),
        }
    }

    fn skip_digits(&mut self, radix: u32) {
        while self.peek_char().map_or(false, |ch| ch.is_digit(radix)) {
            self.skip_char();
        }
    }

    fn read_number(&mut self) -> Result<Token, Diagnostic> {
        let start = self.index;
        if self.rest().starts_with("0x") || self.rest().starts_with("0X") {
            self.index += 2;
            self.skip_digits(16);
            let digits = &self.code[start + 2..self.index];
            self.check_no_suffix(start)?;
            return match i32::from_str_radix(digits, 16) {
                Ok(value) => Ok(Token::Lit(Lit::Int(value))),
                Err(_) => Err(self.error(start, format!("invalid hexadecimal literal `{}`", &self.code[start..self.index]))),
            };
        }

        let mut is_float = false;
        self.skip_digits(10);
        if self.peek_char() == Some('.') {
            is_float = true;
            self.skip_char();
            self.skip_digits(10);
        }
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            let has_sign = matches!(self.peek_char_at(1), Some('+') | Some('-'));
            let digit_offset = if has_sign { 2 } else { 1 };
            if self.peek_char_at(digit_offset).map_or(false, |ch| ch.is_ascii_digit()) {
                is_float = true;
                self.index += digit_offset;
                self.skip_digits(10);
            }
        }
        let end = self.index;
        if matches!(self.peek_char(), Some('f') | Some('F')) {
            is_float = true;
            self.skip_char();
        }
        self.check_no_suffix(start)?;

        let text = &self.code[start..end];
        if is_float {
            match text.parse::<f32>() {
                Ok(value) if value.is_finite() => Ok(Token::Lit(Lit::Float(value))),
                _ => Err(self.error(start, format!("invalid float literal `{}`", text))),
            }
        } else {
            match text.parse::<i32>() {
                Ok(value) => Ok(Token::Lit(Lit::Int(value))),
                Err(_) => Err(self.error(start, format!("integer literal `{}` is out of range", text))),
            }
        }
    }

    fn check_no_suffix(&mut self, start: usize) -> Result<(), Diagnostic> {
        if self.peek_char().map_or(false, |ch| ch.is_ascii_alphanumeric() || ch == '_') {
            while self.peek_char().map_or(false, |ch| ch.is_ascii_alphanumeric() || ch == '_') {
                self.skip_char();
            }
            return Err(self.error(start, format!("invalid numeric literal `{}`", &self.code[start..self.index])));
        }
        Ok(())
    }
}

impl<'a> Iterator for Lex<'a> {
    type Item = Result<TokenWithSpan, Diagnostic>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_done {
            return None;
        }
        if let Some(placeholder) = self.placeholder.take() {
            return Some(Ok(placeholder));
        }
        let result = self.read_token_with_span();
        if let Ok(TokenWithSpan { token: Token::Eof, .. }) = result {
            self.is_done = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(code: &str) -> Vec<Token> {
        lex(code).map(|result| result.unwrap().token).collect()
    }

    #[test]
    fn test_maximal_munch() {
        let a = Token::Ident(Ident::new("a"));
        let b = Token::Ident(Ident::new("b"));
        assert_eq!(tokens("a <<= b"), vec![a, Token::BinOp(BinaryOpType::ShlAssign), b, Token::Eof]);
        assert_eq!(tokens("a<=b"), vec![a, Token::BinOp(BinaryOpType::Le), b, Token::Eof]);
        assert_eq!(tokens("a^^b"), vec![a, Token::BinOp(BinaryOpType::Xor), b, Token::Eof]);
        assert_eq!(tokens("a---b"), vec![a, Token::Dec, Token::BinOp(BinaryOpType::Sub), b, Token::Eof]);
    }

    #[test]
    fn test_keywords_types_and_literals() {
        assert_eq!(
            tokens("param float4 c = 1.5; const int n = 0x1F; bool t = true;"),
            vec![
                Token::Param,
                Token::Type(Type::FLOAT4),
                Token::Ident(Ident::new("c")),
                Token::BinOp(BinaryOpType::Assign),
                Token::Lit(Lit::Float(1.5)),
                Token::Semi,
                Token::Const,
                Token::Type(Type::INT),
                Token::Ident(Ident::new("n")),
                Token::BinOp(BinaryOpType::Assign),
                Token::Lit(Lit::Int(31)),
                Token::Semi,
                Token::Type(Type::BOOL),
                Token::Ident(Ident::new("t")),
                Token::BinOp(BinaryOpType::Assign),
                Token::Lit(Lit::Bool(true)),
                Token::Semi,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_float_forms() {
        assert_eq!(
            tokens("1. .5 1e3 2.5e-1 3f 7"),
            vec![
                Token::Lit(Lit::Float(1.0)),
                Token::Lit(Lit::Float(0.5)),
                Token::Lit(Lit::Float(1000.0)),
                Token::Lit(Lit::Float(0.25)),
                Token::Lit(Lit::Float(3.0)),
                Token::Lit(Lit::Int(7)),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_swizzle_after_number_is_not_a_float() {
        assert_eq!(
            tokens("v.xy"),
            vec![Token::Ident(Ident::new("v")), Token::Dot, Token::Ident(Ident::new("xy")), Token::Eof]
        );
    }

    #[test]
    fn test_comments_and_spans() {
        let result: Vec<TokenWithSpan> = lex("// hi\n/* block */ x").map(Result::unwrap).collect();
        assert_eq!(result[0].token, Token::Ident(Ident::new("x")));
        assert_eq!(result[0].span, Span::new(18, 19));
    }

    #[test]
    fn test_errors_do_not_stop_lexing() {
        let results: Vec<_> = lex("a @ b 12abc 99999999999").collect();
        let errors: Vec<&Diagnostic> = results.iter().filter_map(|result| result.as_ref().err()).collect();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|error| error.kind == DiagnosticKind::LexError));
        assert_eq!(errors[0].span, Span::new(2, 3));
        let placeholders = results.iter().filter(|result| matches!(result, Ok(TokenWithSpan { token: Token::Lit(Lit::Int(0)), .. })));
        assert_eq!(placeholders.count(), 2);
        assert!(matches!(results.last(), Some(Ok(TokenWithSpan { token: Token::Eof, .. }))));
    }

    #[test]
    fn test_unterminated_comment() {
        let results: Vec<_> = lex("x /* never closed").collect();
        assert!(results[1].is_err());
        assert!(matches!(results[2], Ok(TokenWithSpan { token: Token::Eof, .. })));
    }
}
