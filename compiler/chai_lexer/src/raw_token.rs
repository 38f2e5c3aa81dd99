//! Raw token definition.
//!
//! `RawToken` is the logos-derived tokenizer output before string interning
//! and conversion into [`TokenKind`](crate::TokenKind).

use chai_ir::NumberLit;
use logos::Logos;

use crate::literal::{parse_float_literal, parse_int_literal};

/// Raw token from logos (before interning).
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub(crate) enum RawToken {
    #[regex(r"//[^\n]*")]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    Comment,

    // Shebang line of an executable script.
    #[regex(r"#![^\n]*")]
    Shebang,

    #[token("var")]
    Var,
    #[token("auto")]
    Auto,
    #[token("global")]
    Global,
    #[token("def")]
    Def,
    #[token("fun")]
    Fun,
    #[token("class")]
    Class,
    #[token("attr")]
    Attr,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("finally")]
    Finally,
    #[token("throw")]
    Throw,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("use")]
    Use,
    #[token("eval_file")]
    EvalFile,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("::")]
    DoubleColon,
    #[token(":=")]
    ColonEq,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("?")]
    Question,

    #[token("==")]
    EqEq,
    #[token("=")]
    Eq,
    #[token("!=")]
    NotEq,
    #[token("<<=")]
    ShlEq,
    #[token("<<")]
    Shl,
    #[token("<=")]
    LtEq,
    #[token("<")]
    Lt,
    #[token(">>=")]
    ShrEq,
    #[token(">>")]
    Shr,
    #[token(">=")]
    GtEq,
    #[token(">")]
    Gt,
    #[token("++")]
    PlusPlus,
    #[token("+=")]
    PlusEq,
    #[token("+")]
    Plus,
    #[token("--")]
    MinusMinus,
    #[token("-=")]
    MinusEq,
    #[token("-")]
    Minus,
    #[token("*=")]
    StarEq,
    #[token("*")]
    Star,
    #[token("/=")]
    SlashEq,
    #[token("/")]
    Slash,
    #[token("%=")]
    PercentEq,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("&&")]
    AmpAmp,
    #[token("&=")]
    AmpEq,
    #[token("&")]
    Amp,
    #[token("||")]
    PipePipe,
    #[token("|=")]
    PipeEq,
    #[token("|")]
    Pipe,
    #[token("^=")]
    CaretEq,
    #[token("^")]
    Caret,

    // Integers: decimal, hex, binary, with optional `u`/`l`/`ll` suffixes.
    #[regex(r"(0[xX][0-9a-fA-F]+|0[bB][01]+|[0-9]+)[uUlL]*", |lex| parse_int_literal(lex.slice()))]
    Int(NumberLit),

    // Floats: `1.5`, `1e10`, `2.5e-3f`.
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?[fFlL]?", |lex| parse_float_literal(lex.slice()))]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+[fFlL]?", |lex| parse_float_literal(lex.slice()))]
    Float(NumberLit),

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    #[regex(r"'([^'\\]|\\.)'")]
    Char,

    // Backtick-quoted names let scripts define operator overloads: def `+`(a, b)
    #[regex(r"`[^`\n]+`")]
    QuotedIdent,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}
