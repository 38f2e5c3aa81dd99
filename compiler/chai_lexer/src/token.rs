//! Token types produced by the lexer.

use chai_ir::{Name, NumberLit, Span};
use std::fmt;

/// A token with its span in the source.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {}", self.kind, self.span)
    }
}

/// Token kinds.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TokenKind {
    // === Literals ===
    /// Numeric literal, already typed by its suffix: `42`, `42u`, `1.5f`
    Number(NumberLit),
    /// String literal (interned, escapes processed)
    String(Name),
    /// Char literal: `'a'`
    Char(char),

    // === Identifiers ===
    /// Identifier or backtick-quoted operator name (`` `+` ``)
    Ident(Name),

    // === Keywords ===
    Var,
    Auto,
    Global,
    Def,
    Fun,
    Class,
    Attr,
    Return,
    If,
    Else,
    While,
    For,
    Break,
    Continue,
    Try,
    Catch,
    Finally,
    Throw,
    True,
    False,
    Use,
    EvalFile,

    // === Delimiters ===
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    DoubleColon,
    Dot,
    Question,

    // === Operators ===
    Eq,
    ColonEq,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Shl,
    Shr,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Tilde,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Caret,
    PlusPlus,
    MinusMinus,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,
    ShlEq,
    ShrEq,

    // === Special ===
    /// Unrecognized input; the parser reports it.
    Error,
    Eof,
}

impl TokenKind {
    /// Human-readable description for parse errors.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Number(_) => "number",
            TokenKind::String(_) => "string",
            TokenKind::Char(_) => "character",
            TokenKind::Ident(_) => "identifier",
            TokenKind::Var => "`var`",
            TokenKind::Auto => "`auto`",
            TokenKind::Global => "`global`",
            TokenKind::Def => "`def`",
            TokenKind::Fun => "`fun`",
            TokenKind::Class => "`class`",
            TokenKind::Attr => "`attr`",
            TokenKind::Return => "`return`",
            TokenKind::If => "`if`",
            TokenKind::Else => "`else`",
            TokenKind::While => "`while`",
            TokenKind::For => "`for`",
            TokenKind::Break => "`break`",
            TokenKind::Continue => "`continue`",
            TokenKind::Try => "`try`",
            TokenKind::Catch => "`catch`",
            TokenKind::Finally => "`finally`",
            TokenKind::Throw => "`throw`",
            TokenKind::True => "`true`",
            TokenKind::False => "`false`",
            TokenKind::Use => "`use`",
            TokenKind::EvalFile => "`eval_file`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Comma => "`,`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Colon => "`:`",
            TokenKind::DoubleColon => "`::`",
            TokenKind::Dot => "`.`",
            TokenKind::Question => "`?`",
            TokenKind::Eq => "`=`",
            TokenKind::ColonEq => "`:=`",
            TokenKind::EqEq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Lt => "`<`",
            TokenKind::LtEq => "`<=`",
            TokenKind::Gt => "`>`",
            TokenKind::GtEq => "`>=`",
            TokenKind::Shl => "`<<`",
            TokenKind::Shr => "`>>`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::Bang => "`!`",
            TokenKind::Tilde => "`~`",
            TokenKind::Amp => "`&`",
            TokenKind::AmpAmp => "`&&`",
            TokenKind::Pipe => "`|`",
            TokenKind::PipePipe => "`||`",
            TokenKind::Caret => "`^`",
            TokenKind::PlusPlus => "`++`",
            TokenKind::MinusMinus => "`--`",
            TokenKind::PlusEq => "`+=`",
            TokenKind::MinusEq => "`-=`",
            TokenKind::StarEq => "`*=`",
            TokenKind::SlashEq => "`/=`",
            TokenKind::PercentEq => "`%=`",
            TokenKind::AmpEq => "`&=`",
            TokenKind::PipeEq => "`|=`",
            TokenKind::CaretEq => "`^=`",
            TokenKind::ShlEq => "`<<=`",
            TokenKind::ShrEq => "`>>=`",
            TokenKind::Error => "invalid token",
            TokenKind::Eof => "end of input",
        }
    }
}

/// Lexed token stream, always terminated by a single `Eof` token.
#[derive(Clone, Debug, Default)]
pub struct TokenList {
    pub tokens: Vec<Token>,
}

impl TokenList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token at `index`, or the trailing `Eof` when past the end.
    #[inline]
    pub fn get(&self, index: usize) -> Token {
        match self.tokens.get(index) {
            Some(token) => *token,
            None => self
                .tokens
                .last()
                .copied()
                .unwrap_or(Token::new(TokenKind::Eof, Span::point(0))),
        }
    }
}
