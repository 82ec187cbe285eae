//! Recursive descent parser for the C header subset
//!
//! Builds a flat [`Header`] from tokens. The parser fails fast: the first
//! syntax error aborts the run, matching the generator's overall error
//! policy. Doc comments are attached during a pre-pass that also records
//! object-like macros from `#define` lines and applies them as single-token
//! substitutions.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use text_size::TextRange;

use crate::base::LineIndex;
use crate::errors::Error;

use super::ast::{
    Decl, DocComment, EnumConstant, EnumDecl, FieldDecl, FunctionDecl, Header, PrimKind,
    RecordDecl, RecordKeyword, TagId, TagKeyword, TypeExpr, TypedefDecl,
};
use super::lexer::{tokenize, Token, TokenKind};
use super::ParseOptions;

/// Parse a header file into its AST.
pub fn parse(source: &str, options: &ParseOptions) -> Result<Header, Error> {
    let stream = TokenStream::prepare(source, options);
    let mut parser = Parser::new(stream);
    parser.parse_header()?;
    Ok(parser.header)
}

// =============================================================================
// Pre-pass: trivia stripping, doc attachment, macro substitution
// =============================================================================

/// Significant tokens plus the doc comment attached to each
struct TokenStream {
    tokens: Vec<Token>,
    docs: Vec<Option<DocComment>>,
}

impl TokenStream {
    fn prepare(source: &str, options: &ParseOptions) -> Self {
        let line_index = LineIndex::new(source);
        let mut macros: FxHashMap<SmolStr, MacroBody> = FxHashMap::default();
        for (name, value) in &options.defines {
            let body = match value {
                None => MacroBody::Empty,
                Some(text) => match single_token(text) {
                    Some(token) => MacroBody::Token(token),
                    None => continue,
                },
            };
            macros.insert(name.clone(), body);
        }

        let mut tokens = Vec::new();
        let mut docs = Vec::new();
        let mut pending: Option<(DocComment, u32)> = None;

        for raw in tokenize(source) {
            match raw.kind {
                TokenKind::Whitespace => {}
                TokenKind::LineComment | TokenKind::BlockComment => {
                    let end_line = line_index.line(raw.range.end());
                    pending = Some((
                        DocComment {
                            text: raw.text.clone(),
                            range: raw.range,
                        },
                        end_line,
                    ));
                }
                TokenKind::HashLine => {
                    record_define(&raw.text, &mut macros);
                }
                _ => {
                    let token = expand_macro(raw, &macros);
                    let Some(mut token) = token else { continue };
                    // Identifiers that survive substitution may still have
                    // changed kind (e.g. a macro expanding to an integer).
                    if token.kind == TokenKind::Ident {
                        token = reclassify(token);
                    }
                    let line = line_index.line(token.range.start());
                    let doc = match pending.take() {
                        Some((comment, comment_line)) if line <= comment_line + 1 => Some(comment),
                        _ => None,
                    };
                    tokens.push(token);
                    docs.push(doc);
                }
            }
        }
        Self { tokens, docs }
    }
}

#[derive(Clone)]
enum MacroBody {
    Empty,
    Token(Token),
}

/// Record `#define NAME` / `#define NAME TOKEN` into the macro table.
///
/// Function-like macros and multi-token bodies are outside the supported
/// subset and are ignored; uses of such names surface later as unknown
/// types.
fn record_define(line: &str, macros: &mut FxHashMap<SmolStr, MacroBody>) {
    let rest = line.trim_start_matches('#').trim_start();
    let Some(rest) = rest.strip_prefix("define") else {
        return;
    };
    if !rest.starts_with([' ', '\t']) {
        return;
    }
    let rest = rest.trim_start();
    let name_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if name_len == 0 {
        return;
    }
    // `#define F(x)` is function-like when the paren is adjacent.
    if rest[name_len..].starts_with('(') {
        return;
    }
    let name = SmolStr::new(&rest[..name_len]);
    let body_text = rest[name_len..].trim();
    let body = if body_text.is_empty() {
        MacroBody::Empty
    } else {
        match single_token(body_text) {
            Some(token) => MacroBody::Token(token),
            None => return,
        }
    };
    macros.insert(name, body);
}

/// Lex a macro body; accept it only when it is exactly one token.
fn single_token(text: &str) -> Option<Token> {
    let mut significant = tokenize(text)
        .into_iter()
        .filter(|t| !t.kind.is_trivia())
        .collect::<Vec<_>>();
    if significant.len() == 1 {
        significant.pop()
    } else {
        None
    }
}

/// Substitute a token through the macro table. Returns `None` when the
/// token expands to nothing (an empty macro body).
fn expand_macro(token: Token, macros: &FxHashMap<SmolStr, MacroBody>) -> Option<Token> {
    let mut current = token;
    for _ in 0..16 {
        if current.kind != TokenKind::Ident {
            return Some(current);
        }
        match macros.get(&current.text) {
            None => return Some(current),
            Some(MacroBody::Empty) => return None,
            Some(MacroBody::Token(body)) => {
                current = Token::new(body.kind, body.text.clone(), current.range);
            }
        }
    }
    Some(current)
}

/// An identifier produced by substitution may spell a keyword.
fn reclassify(token: Token) -> Token {
    let kind = match token.text.as_str() {
        "struct" => TokenKind::StructKw,
        "union" => TokenKind::UnionKw,
        "enum" => TokenKind::EnumKw,
        "unsigned" => TokenKind::UnsignedKw,
        "signed" => TokenKind::SignedKw,
        "char" => TokenKind::CharKw,
        "short" => TokenKind::ShortKw,
        "int" => TokenKind::IntKw,
        "long" => TokenKind::LongKw,
        "float" => TokenKind::FloatKw,
        "double" => TokenKind::DoubleKw,
        "void" => TokenKind::VoidKw,
        "_Bool" | "bool" => TokenKind::BoolKw,
        _ => return token,
    };
    Token::new(kind, token.text.clone(), token.range)
}

// =============================================================================
// Parser
// =============================================================================

struct Parser {
    tokens: Vec<Token>,
    docs: Vec<Option<DocComment>>,
    pos: usize,
    header: Header,
}

impl Parser {
    fn new(stream: TokenStream) -> Self {
        Self {
            tokens: stream.tokens,
            docs: stream.docs,
            pos: 0,
            header: Header::default(),
        }
    }

    // -------------------------------------------------------------------------
    // Token access
    // -------------------------------------------------------------------------

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn nth_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.nth_kind(0) == Some(kind)
    }

    fn current_range(&self) -> TextRange {
        match self.tokens.get(self.pos) {
            Some(token) => token.range,
            None => self
                .tokens
                .last()
                .map(|t| TextRange::empty(t.range.end()))
                .unwrap_or_else(|| TextRange::empty(0.into())),
        }
    }

    fn doc_here(&self) -> Option<DocComment> {
        self.docs.get(self.pos).cloned().flatten()
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Error> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.error(format!(
                "expected {}, found {}",
                kind.describe(),
                self.describe_current()
            )))
        }
    }

    fn describe_current(&self) -> &'static str {
        match self.nth_kind(0) {
            Some(kind) => kind.describe(),
            None => "end of file",
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Syntax {
            message: message.into(),
            range: self.current_range(),
        }
    }

    // -------------------------------------------------------------------------
    // Top level
    // -------------------------------------------------------------------------

    fn parse_header(&mut self) -> Result<(), Error> {
        while !self.at_end() {
            self.parse_top_item()?;
        }
        Ok(())
    }

    fn parse_top_item(&mut self) -> Result<(), Error> {
        match self.nth_kind(0) {
            Some(TokenKind::TypedefKw) => self.parse_typedef(),
            Some(TokenKind::StructKw | TokenKind::UnionKw | TokenKind::EnumKw) => {
                if self.at_tag_definition() {
                    let range = self.current_range();
                    self.parse_base_type(true)?;
                    if self.at(TokenKind::Semicolon) {
                        self.bump();
                        Ok(())
                    } else {
                        self.finish_unsupported_variable(range)
                    }
                } else if self.nth_kind(1) == Some(TokenKind::Ident)
                    && self.nth_kind(2) == Some(TokenKind::Semicolon)
                {
                    // forward declaration; the definition is elsewhere
                    self.bump();
                    self.bump();
                    self.bump();
                    Ok(())
                } else {
                    self.parse_function_or_variable()
                }
            }
            Some(
                TokenKind::ExternKw
                | TokenKind::StaticKw
                | TokenKind::InlineKw
                | TokenKind::VolatileKw,
            ) => {
                self.bump();
                Ok(())
            }
            Some(TokenKind::Semicolon) => {
                self.bump();
                Ok(())
            }
            Some(TokenKind::Error) => Err(self.error("invalid token")),
            Some(_) => self.parse_function_or_variable(),
            None => Ok(()),
        }
    }

    /// True when the cursor sits on `struct|union|enum [name] {`
    fn at_tag_definition(&self) -> bool {
        matches!(
            (self.nth_kind(1), self.nth_kind(2)),
            (Some(TokenKind::LBrace), _) | (Some(TokenKind::Ident), Some(TokenKind::LBrace))
        )
    }

    fn finish_unsupported_variable(&mut self, range: TextRange) -> Result<(), Error> {
        while !self.at_end() && !self.at(TokenKind::Semicolon) {
            self.bump();
        }
        self.expect(TokenKind::Semicolon)?;
        self.header.decls.push(Decl::Unsupported {
            what: "variable declaration",
            range,
        });
        Ok(())
    }

    fn parse_function_or_variable(&mut self) -> Result<(), Error> {
        let start = self.current_range();
        self.parse_base_type(false)?;
        while self.at(TokenKind::Star) || self.at(TokenKind::ConstKw) {
            self.bump();
        }
        let name = self.expect(TokenKind::Ident)?;
        if self.at(TokenKind::LParen) {
            self.skip_parens()?;
            self.expect(TokenKind::Semicolon)?;
            self.header.decls.push(Decl::Function(FunctionDecl {
                name: name.text,
                range: name.range,
            }));
            Ok(())
        } else {
            self.finish_unsupported_variable(start)
        }
    }

    fn skip_parens(&mut self) -> Result<(), Error> {
        self.expect(TokenKind::LParen)?;
        let mut depth = 1usize;
        while depth > 0 {
            if self.at_end() {
                return Err(self.error("unexpected end of file in parameter list"));
            }
            match self.bump().kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Typedefs
    // -------------------------------------------------------------------------

    fn parse_typedef(&mut self) -> Result<(), Error> {
        let doc = self.doc_here();
        let start = self.current_range();
        self.expect(TokenKind::TypedefKw)?;
        let mut underlying = self.parse_base_type(true)?;
        while self.at(TokenKind::Star) {
            self.bump();
            underlying = TypeExpr::Pointer(Box::new(underlying));
        }
        let name = self.expect(TokenKind::Ident)?;
        self.expect(TokenKind::Semicolon)?;
        let range = TextRange::new(start.start(), name.range.end());
        // A comment above `typedef struct {...} name;` documents the inline
        // definition as much as the alias, the way a compiler front-end
        // attaches the raw comment to both cursors.
        self.share_doc_with_inline_definition(&underlying, &doc);
        self.header
            .typedefs
            .entry(name.text.clone())
            .or_insert_with(|| underlying.clone());
        self.header.decls.push(Decl::Typedef(TypedefDecl {
            name: name.text,
            underlying,
            doc,
            range,
        }));
        Ok(())
    }

    fn share_doc_with_inline_definition(&mut self, underlying: &TypeExpr, doc: &Option<DocComment>) {
        if doc.is_none() {
            return;
        }
        let mut ty = underlying;
        while let TypeExpr::Pointer(inner) = ty {
            ty = inner;
        }
        match ty {
            TypeExpr::InlineRecord(id) if self.header.records[*id].doc.is_none() => {
                self.header.records[*id].doc = doc.clone();
            }
            TypeExpr::InlineEnum(id) if self.header.enums[*id].doc.is_none() => {
                self.header.enums[*id].doc = doc.clone();
            }
            _ => {}
        }
    }

    // -------------------------------------------------------------------------
    // Types
    // -------------------------------------------------------------------------

    /// Parse a base type (no declarator `*`s).
    ///
    /// `top_level` controls whether an inline tag definition is also pushed
    /// as a top-level declaration, mirroring how a compiler front-end
    /// reports `typedef struct X {...}` as the definition followed by the
    /// alias.
    fn parse_base_type(&mut self, top_level: bool) -> Result<TypeExpr, Error> {
        while self.at(TokenKind::ConstKw) || self.at(TokenKind::VolatileKw) {
            self.bump();
        }
        let ty = match self.nth_kind(0) {
            Some(TokenKind::StructKw | TokenKind::UnionKw) => {
                let keyword = if self.at(TokenKind::StructKw) {
                    RecordKeyword::Struct
                } else {
                    RecordKeyword::Union
                };
                if self.at_tag_definition() {
                    let id = self.parse_record_definition(keyword, top_level)?;
                    TypeExpr::InlineRecord(id)
                } else {
                    let tag_keyword = if keyword == RecordKeyword::Struct {
                        TagKeyword::Struct
                    } else {
                        TagKeyword::Union
                    };
                    self.bump();
                    let name = self.expect(TokenKind::Ident)?;
                    TypeExpr::Tag(tag_keyword, name.text)
                }
            }
            Some(TokenKind::EnumKw) => {
                if self.at_tag_definition() {
                    let id = self.parse_enum_definition(top_level)?;
                    TypeExpr::InlineEnum(id)
                } else {
                    self.bump();
                    let name = self.expect(TokenKind::Ident)?;
                    TypeExpr::Tag(TagKeyword::Enum, name.text)
                }
            }
            Some(
                TokenKind::UnsignedKw
                | TokenKind::SignedKw
                | TokenKind::CharKw
                | TokenKind::ShortKw
                | TokenKind::IntKw
                | TokenKind::LongKw
                | TokenKind::FloatKw
                | TokenKind::DoubleKw
                | TokenKind::VoidKw
                | TokenKind::BoolKw,
            ) => TypeExpr::Prim(self.parse_prim_combo()?),
            Some(TokenKind::Ident) => {
                let name = self.bump();
                TypeExpr::Named(name.text)
            }
            _ => {
                return Err(self.error(format!(
                    "expected a type, found {}",
                    self.describe_current()
                )))
            }
        };
        while self.at(TokenKind::ConstKw) || self.at(TokenKind::VolatileKw) {
            self.bump();
        }
        Ok(ty)
    }

    /// Parse a multi-keyword arithmetic type (`unsigned long long int`, ...)
    fn parse_prim_combo(&mut self) -> Result<PrimKind, Error> {
        let range = self.current_range();
        let mut unsigned = false;
        let mut signed = false;
        let mut longs = 0usize;
        let mut base: Option<TokenKind> = None;
        loop {
            match self.nth_kind(0) {
                Some(TokenKind::UnsignedKw) => {
                    unsigned = true;
                    self.bump();
                }
                Some(TokenKind::SignedKw) => {
                    signed = true;
                    self.bump();
                }
                Some(TokenKind::LongKw) => {
                    longs += 1;
                    self.bump();
                }
                Some(
                    kind @ (TokenKind::CharKw
                    | TokenKind::ShortKw
                    | TokenKind::IntKw
                    | TokenKind::FloatKw
                    | TokenKind::DoubleKw
                    | TokenKind::VoidKw
                    | TokenKind::BoolKw),
                ) => {
                    if base.is_some() && base != Some(TokenKind::IntKw) && kind != TokenKind::IntKw
                    {
                        return Err(self.error("invalid type specifier combination"));
                    }
                    if base.is_none() || kind != TokenKind::IntKw {
                        base = Some(kind);
                    }
                    self.bump();
                }
                _ => break,
            }
        }
        let invalid =
            || Error::Syntax {
                message: "invalid type specifier combination".into(),
                range,
            };
        let kind = match (base, longs) {
            (Some(TokenKind::BoolKw), 0) if !unsigned && !signed => PrimKind::Bool,
            (Some(TokenKind::VoidKw), 0) if !unsigned && !signed => PrimKind::Void,
            (Some(TokenKind::FloatKw), 0) if !unsigned && !signed => PrimKind::Float,
            (Some(TokenKind::DoubleKw), 0) if !unsigned && !signed => PrimKind::Double,
            (Some(TokenKind::DoubleKw), 1) if !unsigned && !signed => PrimKind::LongDouble,
            (Some(TokenKind::CharKw), 0) => {
                if unsigned {
                    PrimKind::UChar
                } else if signed {
                    PrimKind::SChar
                } else {
                    PrimKind::Char
                }
            }
            (Some(TokenKind::ShortKw), 0) => {
                if unsigned {
                    PrimKind::UShort
                } else {
                    PrimKind::Short
                }
            }
            (Some(TokenKind::IntKw) | None, 0) => {
                if unsigned {
                    PrimKind::UInt
                } else {
                    PrimKind::Int
                }
            }
            (Some(TokenKind::IntKw) | None, 1) => {
                if unsigned {
                    PrimKind::ULong
                } else {
                    PrimKind::Long
                }
            }
            (Some(TokenKind::IntKw) | None, 2) => {
                if unsigned {
                    PrimKind::ULongLong
                } else {
                    PrimKind::LongLong
                }
            }
            _ => return Err(invalid()),
        };
        Ok(kind)
    }

    // -------------------------------------------------------------------------
    // Records
    // -------------------------------------------------------------------------

    fn parse_record_definition(
        &mut self,
        keyword: RecordKeyword,
        top_level: bool,
    ) -> Result<usize, Error> {
        let doc = self.doc_here();
        let start = self.current_range();
        self.bump(); // struct / union
        let name = if self.at(TokenKind::Ident) {
            Some(self.bump().text)
        } else {
            None
        };
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) {
            if self.at_end() {
                return Err(self.error("unexpected end of file in record body"));
            }
            self.parse_field(&mut fields)?;
        }
        let end = self.expect(TokenKind::RBrace)?;
        let id = self.header.records.len();
        self.header.records.push(RecordDecl {
            keyword,
            name: name.clone(),
            fields,
            doc,
            range: TextRange::new(start.start(), end.range.end()),
        });
        if top_level {
            if let Some(name) = &name {
                self.header
                    .tags
                    .entry(name.clone())
                    .or_insert(TagId::Record(id));
            }
            self.header.decls.push(Decl::Record(id));
        }
        Ok(id)
    }

    fn parse_field(&mut self, fields: &mut Vec<FieldDecl>) -> Result<(), Error> {
        let doc = self.doc_here();
        let start = self.current_range();
        let base = self.parse_base_type(false)?;

        // anonymous member: `union { ... };`
        if self.at(TokenKind::Semicolon) {
            match base {
                TypeExpr::InlineRecord(_) | TypeExpr::InlineEnum(_) => {
                    let end = self.bump();
                    fields.push(FieldDecl {
                        name: None,
                        ty: base,
                        doc,
                        range: TextRange::new(start.start(), end.range.end()),
                    });
                    return Ok(());
                }
                _ => return Err(self.error("expected field name")),
            }
        }

        loop {
            let mut ty = base.clone();
            while self.at(TokenKind::Star) {
                self.bump();
                ty = TypeExpr::Pointer(Box::new(ty));
                while self.at(TokenKind::ConstKw) {
                    self.bump();
                }
            }
            let name = self.expect(TokenKind::Ident)?;
            if self.at(TokenKind::LBracket) {
                return Err(self.error("array fields are not supported"));
            }
            fields.push(FieldDecl {
                name: Some(name.text),
                ty,
                doc: doc.clone(),
                range: TextRange::new(start.start(), name.range.end()),
            });
            if self.at(TokenKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Enums
    // -------------------------------------------------------------------------

    fn parse_enum_definition(&mut self, top_level: bool) -> Result<usize, Error> {
        let doc = self.doc_here();
        let start = self.current_range();
        self.expect(TokenKind::EnumKw)?;
        let name = if self.at(TokenKind::Ident) {
            Some(self.bump().text)
        } else {
            None
        };
        self.expect(TokenKind::LBrace)?;
        let mut constants = Vec::new();
        while !self.at(TokenKind::RBrace) {
            let doc = self.doc_here();
            let name = self.expect(TokenKind::Ident)?;
            if self.at(TokenKind::Eq) {
                self.bump();
                self.parse_enum_initializer()?;
            }
            constants.push(EnumConstant {
                name: name.text,
                doc,
                range: name.range,
            });
            if self.at(TokenKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        let end = self.expect(TokenKind::RBrace)?;
        let id = self.header.enums.len();
        self.header.enums.push(EnumDecl {
            name: name.clone(),
            constants,
            doc,
            range: TextRange::new(start.start(), end.range.end()),
        });
        if top_level {
            if let Some(name) = &name {
                self.header.tags.entry(name.clone()).or_insert(TagId::Enum(id));
            }
            self.header.decls.push(Decl::Enum(id));
        }
        Ok(id)
    }

    /// Constant expressions are restricted to `[-+]? (integer | identifier)`.
    fn parse_enum_initializer(&mut self) -> Result<(), Error> {
        if self.at(TokenKind::Minus) || self.at(TokenKind::Plus) {
            self.bump();
        }
        match self.nth_kind(0) {
            Some(TokenKind::Integer | TokenKind::Ident) => {
                self.bump();
                Ok(())
            }
            _ => Err(self.error("unsupported enum constant initializer")),
        }
    }
}
