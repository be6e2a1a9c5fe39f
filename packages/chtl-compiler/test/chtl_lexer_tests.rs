//! Integration coverage for the CHTL lexer (spec §4.2).

use chtl_compiler::chtl::lex;
use chtl_compiler::chtl::token::TokenKind;
use chtl_compiler::config::Configuration;

fn kinds(source: &str) -> Vec<TokenKind> {
    let config = Configuration::default();
    lex(source, "t.chtl", &config)
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .filter(|k| !matches!(k, TokenKind::Eof))
        .collect()
}

#[test]
fn bracket_and_at_keywords_are_recognized() {
    let tokens = kinds("[Template] @Style Box {}");
    assert_eq!(tokens[0], TokenKind::BracketKeyword("Template".to_string()));
    assert_eq!(tokens[1], TokenKind::AtKeyword("Style".to_string()));
    assert_eq!(tokens[2], TokenKind::Identifier("Box".to_string()));
    assert_eq!(tokens[3], TokenKind::LBrace);
    assert_eq!(tokens[4], TokenKind::RBrace);
}

#[test]
fn numbers_capture_a_trailing_known_unit() {
    let tokens = kinds("10px");
    match &tokens[0] {
        TokenKind::Number { value, unit, .. } => {
            assert_eq!(*value, 10.0);
            assert_eq!(unit.as_deref(), Some("px"));
        }
        other => panic!("expected a number token, got {other:?}"),
    }
}

#[test]
fn negative_numbers_without_a_unit_parse_as_unitless() {
    let tokens = kinds("-4");
    match &tokens[0] {
        TokenKind::Number { value, unit, .. } => {
            assert_eq!(*value, -4.0);
            assert_eq!(*unit, None);
        }
        other => panic!("expected a number token, got {other:?}"),
    }
}

#[test]
fn quoted_strings_and_bare_words_both_lex() {
    // The lexer never emits `UnquotedLiteral` itself — `bare-value` lexes as
    // a plain identifier; accepting it as a value is the parser's job.
    let tokens = kinds(r#""hello" bare-value"#);
    assert_eq!(tokens[0], TokenKind::String("hello".to_string()));
    assert_eq!(tokens[1], TokenKind::Identifier("bare-value".to_string()));
}

#[test]
fn hash_before_an_identifier_is_an_id_selector_prefix() {
    let tokens = kinds("#box");
    assert_eq!(tokens[0], TokenKind::Hash);
    assert_eq!(tokens[1], TokenKind::Identifier("box".to_string()));
}

#[test]
fn bare_hash_opens_a_generator_comment_to_end_of_line() {
    let tokens = kinds("# a note\ndiv");
    assert_eq!(tokens[0], TokenKind::GeneratorComment("a note".to_string()));
    assert_eq!(tokens[1], TokenKind::Identifier("div".to_string()));
}

#[test]
fn line_and_block_comments_are_tokenized_not_dropped() {
    let tokens = kinds("// line\n/* block */ div");
    assert!(matches!(tokens[0], TokenKind::Comment(_)));
    assert!(matches!(tokens[1], TokenKind::Comment(_)));
    assert_eq!(tokens[2], TokenKind::Identifier("div".to_string()));
}

#[test]
fn keyword_rebinding_changes_which_spelling_the_lexer_sees_as_plain_identifiers() {
    // The lexer itself only recognizes fixed punctuation/bracket/at-keyword
    // shapes; `KEYWORD_*` rebindings are consumed by the parser via the same
    // `Configuration`, so `extends` here simply lexes as an identifier no
    // matter what it's rebound to.
    let mut config = Configuration::default();
    config.set("KEYWORD_INHERIT", "extends");
    let tokens: Vec<_> = lex("extends", "t.chtl", &config)
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .filter(|k| !matches!(k, TokenKind::Eof))
        .collect();
    assert_eq!(tokens[0], TokenKind::Identifier("extends".to_string()));
}

#[test]
fn unterminated_string_is_a_syntax_error() {
    let config = Configuration::default();
    assert!(lex("\"unterminated", "t.chtl", &config).is_err());
}
