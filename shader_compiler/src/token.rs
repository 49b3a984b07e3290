use crate::ident::Ident;
use crate::lit::Lit;
use crate::op::BinaryOpType;
use crate::span::Span;
use crate::ty::Type;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Token {
    Eof,
    Ident(Ident),
    Type(Type),
    Lit(Lit),
    BinOp(BinaryOpType),

    Not,
    Tilde,
    Inc,
    Dec,
    Question,
    Colon,
    Dot,
    Comma,
    Semi,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,

    Const,
    Param,
    Lowp,
    Mediump,
    Highp,
    If,
    Else,
    For,
    While,
    Do,
    Return,
    Break,
    Continue,
    Discard,
}

impl Token {
    pub(crate) fn keyword(string: &str) -> Option<Token> {
        Some(match string {
            "const" => Token::Const,
            "param" => Token::Param,
            "lowp" => Token::Lowp,
            "mediump" => Token::Mediump,
            "highp" => Token::Highp,
            "if" => Token::If,
            "else" => Token::Else,
            "for" => Token::For,
            "while" => Token::While,
            "do" => Token::Do,
            "return" => Token::Return,
            "break" => Token::Break,
            "continue" => Token::Continue,
            "discard" => Token::Discard,
            "true" => Token::Lit(Lit::Bool(true)),
            "false" => Token::Lit(Lit::Bool(false)),
            _ => return None,
        })
    }

    /// Punctuation that is not a binary operator.
    pub(crate) fn punct(symbol: &str) -> Option<Token> {
        Some(match symbol {
            "!" => Token::Not,
            "~" => Token::Tilde,
            "++" => Token::Inc,
            "--" => Token::Dec,
            "?" => Token::Question,
            ":" => Token::Colon,
            "." => Token::Dot,
            "," => Token::Comma,
            ";" => Token::Semi,
            "(" => Token::LeftParen,
            ")" => Token::RightParen,
            "{" => Token::LeftBrace,
            "}" => Token::RightBrace,
            "[" => Token::LeftBracket,
            "]" => Token::RightBracket,
            _ => return None,
        })
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Eof => write!(f, "<eof>"),
            Token::Ident(ident) => write!(f, "{}", ident),
            Token::Type(ty) => write!(f, "{}", ty),
            Token::Lit(lit) => write!(f, "{}", lit),
            Token::BinOp(op) => write!(f, "{}", op),
            Token::Not => write!(f, "!"),
            Token::Tilde => write!(f, "~"),
            Token::Inc => write!(f, "++"),
            Token::Dec => write!(f, "--"),
            Token::Question => write!(f, "?"),
            Token::Colon => write!(f, ":"),
            Token::Dot => write!(f, "."),
            Token::Comma => write!(f, ","),
            Token::Semi => write!(f, ";"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Const => write!(f, "const"),
            Token::Param => write!(f, "param"),
            Token::Lowp => write!(f, "lowp"),
            Token::Mediump => write!(f, "mediump"),
            Token::Highp => write!(f, "highp"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::For => write!(f, "for"),
            Token::While => write!(f, "while"),
            Token::Do => write!(f, "do"),
            Token::Return => write!(f, "return"),
            Token::Break => write!(f, "break"),
            Token::Continue => write!(f, "continue"),
            Token::Discard => write!(f, "discard"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TokenWithSpan {
    pub(crate) span: Span,
    pub(crate) token: Token,
}
