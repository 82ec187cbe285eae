//! Logos-based lexer for the C header subset
//!
//! Fast tokenization using the logos crate. Comments are kept as tokens
//! because annotations live in them; preprocessor lines are kept so the
//! parser's pre-pass can record object-like macros.

use logos::Logos;
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

/// A token with its kind, text, and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: SmolStr,
    pub range: TextRange,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<SmolStr>, range: TextRange) -> Self {
        Self {
            kind,
            text: text.into(),
            range,
        }
    }
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let kind = match self.inner.next()? {
            Ok(token) => token.into(),
            Err(()) => TokenKind::Error,
        };
        let span = self.inner.span();
        let range = TextRange::new(
            TextSize::new(span.start as u32),
            TextSize::new(span.end as u32),
        );
        Some(Token::new(kind, self.inner.slice(), range))
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).collect()
}

/// Logos token enum - maps to TokenKind
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"/\*([^*]|\*[^/])*\*/")]
    BlockComment,

    /// A whole preprocessor line (`#include`, `#define`, guards, ...)
    #[regex(r"#[^\n]*")]
    HashLine,

    // =========================================================================
    // KEYWORDS (tokens take priority over the identifier regex)
    // =========================================================================
    #[token("struct")]
    StructKw,

    #[token("union")]
    UnionKw,

    #[token("enum")]
    EnumKw,

    #[token("typedef")]
    TypedefKw,

    #[token("const")]
    ConstKw,

    #[token("volatile")]
    VolatileKw,

    #[token("extern")]
    ExternKw,

    #[token("static")]
    StaticKw,

    #[token("inline")]
    InlineKw,

    #[token("unsigned")]
    UnsignedKw,

    #[token("signed")]
    SignedKw,

    #[token("char")]
    CharKw,

    #[token("short")]
    ShortKw,

    #[token("int")]
    IntKw,

    #[token("long")]
    LongKw,

    #[token("float")]
    FloatKw,

    #[token("double")]
    DoubleKw,

    #[token("void")]
    VoidKw,

    #[token("_Bool")]
    #[token("bool")]
    BoolKw,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    #[regex(r"(0[xX][0-9a-fA-F]+|[0-9]+)[uUlL]*")]
    Integer,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    #[token("*")]
    Star,

    #[token("=")]
    Eq,

    #[token("-")]
    Minus,

    #[token("+")]
    Plus,
}

/// Token kinds of the C header subset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Whitespace,
    LineComment,
    BlockComment,
    HashLine,
    StructKw,
    UnionKw,
    EnumKw,
    TypedefKw,
    ConstKw,
    VolatileKw,
    ExternKw,
    StaticKw,
    InlineKw,
    UnsignedKw,
    SignedKw,
    CharKw,
    ShortKw,
    IntKw,
    LongKw,
    FloatKw,
    DoubleKw,
    VoidKw,
    BoolKw,
    Ident,
    Integer,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Star,
    Eq,
    Minus,
    Plus,
    /// Anything the lexer cannot recognize
    Error,
}

impl From<LogosToken> for TokenKind {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::Whitespace => TokenKind::Whitespace,
            LogosToken::LineComment => TokenKind::LineComment,
            LogosToken::BlockComment => TokenKind::BlockComment,
            LogosToken::HashLine => TokenKind::HashLine,
            LogosToken::StructKw => TokenKind::StructKw,
            LogosToken::UnionKw => TokenKind::UnionKw,
            LogosToken::EnumKw => TokenKind::EnumKw,
            LogosToken::TypedefKw => TokenKind::TypedefKw,
            LogosToken::ConstKw => TokenKind::ConstKw,
            LogosToken::VolatileKw => TokenKind::VolatileKw,
            LogosToken::ExternKw => TokenKind::ExternKw,
            LogosToken::StaticKw => TokenKind::StaticKw,
            LogosToken::InlineKw => TokenKind::InlineKw,
            LogosToken::UnsignedKw => TokenKind::UnsignedKw,
            LogosToken::SignedKw => TokenKind::SignedKw,
            LogosToken::CharKw => TokenKind::CharKw,
            LogosToken::ShortKw => TokenKind::ShortKw,
            LogosToken::IntKw => TokenKind::IntKw,
            LogosToken::LongKw => TokenKind::LongKw,
            LogosToken::FloatKw => TokenKind::FloatKw,
            LogosToken::DoubleKw => TokenKind::DoubleKw,
            LogosToken::VoidKw => TokenKind::VoidKw,
            LogosToken::BoolKw => TokenKind::BoolKw,
            LogosToken::Ident => TokenKind::Ident,
            LogosToken::Integer => TokenKind::Integer,
            LogosToken::LBrace => TokenKind::LBrace,
            LogosToken::RBrace => TokenKind::RBrace,
            LogosToken::LParen => TokenKind::LParen,
            LogosToken::RParen => TokenKind::RParen,
            LogosToken::LBracket => TokenKind::LBracket,
            LogosToken::RBracket => TokenKind::RBracket,
            LogosToken::Semicolon => TokenKind::Semicolon,
            LogosToken::Comma => TokenKind::Comma,
            LogosToken::Star => TokenKind::Star,
            LogosToken::Eq => TokenKind::Eq,
            LogosToken::Minus => TokenKind::Minus,
            LogosToken::Plus => TokenKind::Plus,
        }
    }
}

impl TokenKind {
    /// Whitespace, comments, and preprocessor lines
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::LineComment
                | TokenKind::BlockComment
                | TokenKind::HashLine
        )
    }

    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment)
    }

    /// Human-readable name for error messages
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Whitespace => "whitespace",
            TokenKind::LineComment | TokenKind::BlockComment => "comment",
            TokenKind::HashLine => "preprocessor line",
            TokenKind::StructKw => "'struct'",
            TokenKind::UnionKw => "'union'",
            TokenKind::EnumKw => "'enum'",
            TokenKind::TypedefKw => "'typedef'",
            TokenKind::ConstKw => "'const'",
            TokenKind::VolatileKw => "'volatile'",
            TokenKind::ExternKw => "'extern'",
            TokenKind::StaticKw => "'static'",
            TokenKind::InlineKw => "'inline'",
            TokenKind::UnsignedKw => "'unsigned'",
            TokenKind::SignedKw => "'signed'",
            TokenKind::CharKw => "'char'",
            TokenKind::ShortKw => "'short'",
            TokenKind::IntKw => "'int'",
            TokenKind::LongKw => "'long'",
            TokenKind::FloatKw => "'float'",
            TokenKind::DoubleKw => "'double'",
            TokenKind::VoidKw => "'void'",
            TokenKind::BoolKw => "'_Bool'",
            TokenKind::Ident => "identifier",
            TokenKind::Integer => "integer",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Star => "'*'",
            TokenKind::Eq => "'='",
            TokenKind::Minus => "'-'",
            TokenKind::Plus => "'+'",
            TokenKind::Error => "invalid token",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !matches!(k, TokenKind::Whitespace))
            .collect()
    }

    #[test]
    fn lexes_struct_declaration() {
        assert_eq!(
            kinds("struct person { char* name; };"),
            vec![
                TokenKind::StructKw,
                TokenKind::Ident,
                TokenKind::LBrace,
                TokenKind::CharKw,
                TokenKind::Star,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::RBrace,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn keywords_beat_identifiers_only_on_exact_match() {
        assert_eq!(kinds("structure"), vec![TokenKind::Ident]);
        assert_eq!(kinds("struct"), vec![TokenKind::StructKw]);
    }

    #[test]
    fn comments_are_single_tokens() {
        assert_eq!(
            kinds("//!string\nchar* s;"),
            vec![
                TokenKind::LineComment,
                TokenKind::CharKw,
                TokenKind::Star,
                TokenKind::Ident,
                TokenKind::Semicolon,
            ]
        );
        assert_eq!(kinds("/*!repr male */")[0], TokenKind::BlockComment);
    }

    #[test]
    fn preprocessor_lines_are_single_tokens() {
        let tokens = tokenize("#include <stddef.h>\n#define FOO 1\nint x;");
        assert_eq!(tokens[0].kind, TokenKind::HashLine);
        assert_eq!(tokens[0].text, "#include <stddef.h>");
        assert_eq!(tokens[2].kind, TokenKind::HashLine);
        assert_eq!(tokens[2].text, "#define FOO 1");
    }

    #[test]
    fn bool_spellings_collapse() {
        assert_eq!(kinds("bool b;")[0], TokenKind::BoolKw);
        assert_eq!(kinds("_Bool c;")[0], TokenKind::BoolKw);
    }

    #[test]
    fn tokens_carry_ranges() {
        let tokens = tokenize("int x;");
        assert_eq!(tokens[0].range, TextRange::new(0.into(), 3.into()));
        assert_eq!(tokens[2].range, TextRange::new(4.into(), 5.into()));
    }
}
