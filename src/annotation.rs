//! Annotation extraction from doc comments
//!
//! A declaration's doc comment carries at most one annotation: the first
//! non-whitespace octet after the comment opener must be `!`, followed by a
//! keyword from a closed set. Only `repr` takes a parameter; keywords that
//! take none silently ignore trailing text.

use smol_str::SmolStr;
use text_size::TextRange;

use crate::errors::Error;
use crate::frontend::ast::DocComment;

/// Known annotation keywords, plus implicit absence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    None,
    String,
    List,
    Tagged,
    Repr,
    Optional,
    OptionalString,
    Ignored,
    Custom,
    Default,
}

impl AnnotationKind {
    pub fn name(self) -> &'static str {
        match self {
            AnnotationKind::None => "",
            AnnotationKind::String => "string",
            AnnotationKind::List => "list",
            AnnotationKind::Tagged => "tagged",
            AnnotationKind::Repr => "repr",
            AnnotationKind::Optional => "optional",
            AnnotationKind::OptionalString => "optional_string",
            AnnotationKind::Ignored => "ignored",
            AnnotationKind::Custom => "custom",
            AnnotationKind::Default => "default",
        }
    }
}

/// The closed keyword set, with whether each keyword takes a parameter
const KEYWORDS: &[(AnnotationKind, bool)] = &[
    (AnnotationKind::String, false),
    (AnnotationKind::List, false),
    (AnnotationKind::Tagged, false),
    (AnnotationKind::Repr, true),
    (AnnotationKind::Optional, false),
    (AnnotationKind::OptionalString, false),
    (AnnotationKind::Ignored, false),
    (AnnotationKind::Custom, false),
    (AnnotationKind::Default, false),
];

/// An annotation on a type, field, or enum constant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub kind: AnnotationKind,
    /// Parameter of the annotation, if the keyword supports one
    pub param: Option<SmolStr>,
}

impl Annotation {
    pub fn none() -> Self {
        Self {
            kind: AnnotationKind::None,
            param: None,
        }
    }
}

/// Extract the annotation from the doc comment attached to a declaration.
///
/// Absence of a comment, or a comment that does not open with `!`, yields
/// [`AnnotationKind::None`]. An unknown keyword or a missing required
/// parameter is an error at the comment's location.
pub fn parse(doc: Option<&DocComment>) -> Result<Annotation, Error> {
    let Some(doc) = doc else {
        return Ok(Annotation::none());
    };
    let Some(body) = annotation_body(doc) else {
        return Ok(Annotation::none());
    };

    for &(kind, has_param) in KEYWORDS {
        let name = kind.name();
        if let Some(rest) = body.strip_prefix(name) {
            let terminated = rest.is_empty() || rest.starts_with([' ', '\t', '\r', '\n']);
            if !terminated {
                continue;
            }
            if !has_param {
                return Ok(Annotation { kind, param: None });
            }
            let rest = rest.trim_start_matches([' ', '\t']);
            let param_len = rest
                .find([' ', '\t', '\r', '\n'])
                .unwrap_or(rest.len());
            if param_len == 0 {
                return Err(Error::Annotation {
                    message: format!("'!{}' requires a parameter", name),
                    range: doc.range,
                });
            }
            return Ok(Annotation {
                kind,
                param: Some(SmolStr::new(&rest[..param_len])),
            });
        }
    }

    let word_len = body
        .find([' ', '\t', '\r', '\n'])
        .unwrap_or(body.len());
    Err(Error::Annotation {
        message: format!("unknown annotation: \"{}\"", &body[..word_len]),
        range: doc.range,
    })
}

/// Strip the comment opener/closer and return the text after a leading `!`.
fn annotation_body(doc: &DocComment) -> Option<&str> {
    let text = doc.text.as_str();
    let inner = if let Some(rest) = text.strip_prefix("//") {
        rest
    } else if let Some(rest) = text.strip_prefix("/*") {
        rest.strip_suffix("*/").unwrap_or(rest)
    } else {
        return None;
    };
    inner.trim_start_matches([' ', '\t']).strip_prefix('!')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn doc(text: &str) -> DocComment {
        DocComment {
            text: SmolStr::new(text),
            range: TextRange::empty(0.into()),
        }
    }

    #[rstest]
    #[case("//!string", AnnotationKind::String)]
    #[case("//!list", AnnotationKind::List)]
    #[case("//!tagged", AnnotationKind::Tagged)]
    #[case("//!optional", AnnotationKind::Optional)]
    #[case("//!optional_string", AnnotationKind::OptionalString)]
    #[case("//!ignored", AnnotationKind::Ignored)]
    #[case("//!custom", AnnotationKind::Custom)]
    #[case("//!default", AnnotationKind::Default)]
    fn recognizes_keywords(#[case] text: &str, #[case] expected: AnnotationKind) {
        let annotation = parse(Some(&doc(text))).unwrap();
        assert_eq!(annotation.kind, expected);
        assert_eq!(annotation.param, None);
    }

    #[test]
    fn missing_comment_is_no_annotation() {
        assert_eq!(parse(None).unwrap(), Annotation::none());
    }

    #[test]
    fn plain_comment_is_no_annotation() {
        assert_eq!(parse(Some(&doc("// a note"))).unwrap(), Annotation::none());
    }

    #[test]
    fn repr_takes_a_parameter() {
        let annotation = parse(Some(&doc("//!repr male"))).unwrap();
        assert_eq!(annotation.kind, AnnotationKind::Repr);
        assert_eq!(annotation.param.as_deref(), Some("male"));
    }

    #[test]
    fn repr_without_parameter_is_an_error() {
        assert!(matches!(
            parse(Some(&doc("//!repr"))),
            Err(Error::Annotation { .. })
        ));
        assert!(matches!(
            parse(Some(&doc("//!repr   "))),
            Err(Error::Annotation { .. })
        ));
    }

    #[test]
    fn unknown_keyword_is_an_error() {
        let err = parse(Some(&doc("//!wibble rest"))).unwrap_err();
        assert!(err.to_string().contains("unknown annotation: \"wibble\""));
    }

    #[test]
    fn prefix_of_a_keyword_does_not_match() {
        // `optional_string` must not be taken as `optional` + junk
        let annotation = parse(Some(&doc("//!optional_string"))).unwrap();
        assert_eq!(annotation.kind, AnnotationKind::OptionalString);
        // an actual prefix with a non-terminator continuation is unknown
        assert!(parse(Some(&doc("//!stringy"))).is_err());
    }

    #[test]
    fn parameterless_keywords_ignore_trailing_text() {
        let annotation = parse(Some(&doc("//!ignored because reasons"))).unwrap();
        assert_eq!(annotation.kind, AnnotationKind::Ignored);
        assert_eq!(annotation.param, None);
    }

    #[test]
    fn block_comments_are_supported() {
        let annotation = parse(Some(&doc("/*!repr male */"))).unwrap();
        assert_eq!(annotation.kind, AnnotationKind::Repr);
        assert_eq!(annotation.param.as_deref(), Some("male"));
        let closed = parse(Some(&doc("/*!custom*/"))).unwrap();
        assert_eq!(closed.kind, AnnotationKind::Custom);
    }

    #[test]
    fn whitespace_before_bang_is_tolerated() {
        let annotation = parse(Some(&doc("// !list"))).unwrap();
        assert_eq!(annotation.kind, AnnotationKind::List);
    }
}
