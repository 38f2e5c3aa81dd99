//! Lexer for Chai scripts using logos, with string interning.
//!
//! Whitespace, newlines and comments are skipped; statement boundaries are
//! decided by the parser. Identifiers and string literals are interned into
//! the engine's [`StringInterner`]. Invalid input becomes a
//! [`TokenKind::Error`] token so the parser can report it with a span.

mod literal;
mod raw_token;
mod token;

use chai_ir::{Span, StringInterner};
use logos::Logos;

use literal::{unescape_char, unescape_string};
use raw_token::RawToken;
pub use token::{Token, TokenKind, TokenList};

/// Lex `source` into a token list terminated by `Eof`.
pub fn lex(source: &str, interner: &StringInterner) -> TokenList {
    let mut result = TokenList::new();
    let mut logos = RawToken::lexer(source);

    while let Some(token_result) = logos.next() {
        let span = Span::from_range(logos.span());
        let slice = logos.slice();

        let kind = match token_result {
            Ok(RawToken::Comment | RawToken::Shebang) => continue,
            Ok(raw) => convert_token(raw, slice, interner),
            Err(()) => TokenKind::Error,
        };
        result.tokens.push(Token::new(kind, span));
    }

    result.tokens.push(Token::new(
        TokenKind::Eof,
        Span::from_range(source.len()..source.len()),
    ));
    result
}

/// Convert a raw token to a `TokenKind`, interning strings.
fn convert_token(raw: RawToken, slice: &str, interner: &StringInterner) -> TokenKind {
    match raw {
        RawToken::Int(lit) | RawToken::Float(lit) => TokenKind::Number(lit),
        RawToken::String => {
            let content = &slice[1..slice.len() - 1];
            TokenKind::String(interner.intern(&unescape_string(content)))
        }
        RawToken::Char => TokenKind::Char(unescape_char(&slice[1..slice.len() - 1])),
        RawToken::QuotedIdent => TokenKind::Ident(interner.intern(&slice[1..slice.len() - 1])),
        RawToken::Ident => TokenKind::Ident(interner.intern(slice)),

        RawToken::Var => TokenKind::Var,
        RawToken::Auto => TokenKind::Auto,
        RawToken::Global => TokenKind::Global,
        RawToken::Def => TokenKind::Def,
        RawToken::Fun => TokenKind::Fun,
        RawToken::Class => TokenKind::Class,
        RawToken::Attr => TokenKind::Attr,
        RawToken::Return => TokenKind::Return,
        RawToken::If => TokenKind::If,
        RawToken::Else => TokenKind::Else,
        RawToken::While => TokenKind::While,
        RawToken::For => TokenKind::For,
        RawToken::Break => TokenKind::Break,
        RawToken::Continue => TokenKind::Continue,
        RawToken::Try => TokenKind::Try,
        RawToken::Catch => TokenKind::Catch,
        RawToken::Finally => TokenKind::Finally,
        RawToken::Throw => TokenKind::Throw,
        RawToken::True => TokenKind::True,
        RawToken::False => TokenKind::False,
        RawToken::Use => TokenKind::Use,
        RawToken::EvalFile => TokenKind::EvalFile,

        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::LBracket => TokenKind::LBracket,
        RawToken::RBracket => TokenKind::RBracket,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Semicolon => TokenKind::Semicolon,
        RawToken::DoubleColon => TokenKind::DoubleColon,
        RawToken::ColonEq => TokenKind::ColonEq,
        RawToken::Colon => TokenKind::Colon,
        RawToken::Dot => TokenKind::Dot,
        RawToken::Question => TokenKind::Question,

        RawToken::EqEq => TokenKind::EqEq,
        RawToken::Eq => TokenKind::Eq,
        RawToken::NotEq => TokenKind::NotEq,
        RawToken::ShlEq => TokenKind::ShlEq,
        RawToken::Shl => TokenKind::Shl,
        RawToken::LtEq => TokenKind::LtEq,
        RawToken::Lt => TokenKind::Lt,
        RawToken::ShrEq => TokenKind::ShrEq,
        RawToken::Shr => TokenKind::Shr,
        RawToken::GtEq => TokenKind::GtEq,
        RawToken::Gt => TokenKind::Gt,
        RawToken::PlusPlus => TokenKind::PlusPlus,
        RawToken::PlusEq => TokenKind::PlusEq,
        RawToken::Plus => TokenKind::Plus,
        RawToken::MinusMinus => TokenKind::MinusMinus,
        RawToken::MinusEq => TokenKind::MinusEq,
        RawToken::Minus => TokenKind::Minus,
        RawToken::StarEq => TokenKind::StarEq,
        RawToken::Star => TokenKind::Star,
        RawToken::SlashEq => TokenKind::SlashEq,
        RawToken::Slash => TokenKind::Slash,
        RawToken::PercentEq => TokenKind::PercentEq,
        RawToken::Percent => TokenKind::Percent,
        RawToken::Bang => TokenKind::Bang,
        RawToken::Tilde => TokenKind::Tilde,
        RawToken::AmpAmp => TokenKind::AmpAmp,
        RawToken::AmpEq => TokenKind::AmpEq,
        RawToken::Amp => TokenKind::Amp,
        RawToken::PipePipe => TokenKind::PipePipe,
        RawToken::PipeEq => TokenKind::PipeEq,
        RawToken::Pipe => TokenKind::Pipe,
        RawToken::CaretEq => TokenKind::CaretEq,
        RawToken::Caret => TokenKind::Caret,

        // Skipped in `lex` before conversion.
        RawToken::Comment | RawToken::Shebang => TokenKind::Error,
    }
}
