use super::*;

fn kinds(src: &str) -> Vec<TokenKind> {
    lex(src).unwrap().into_iter().map(|t| t.kind).collect()
}

#[test]
fn lexes_names_numbers_and_operators() {
    assert_eq!(
        kinds("x + 2.5e1*Sin(_PI)^2"),
        vec![
            TokenKind::Name("x".to_owned()),
            TokenKind::Plus,
            TokenKind::Number(25.0),
            TokenKind::Star,
            TokenKind::Name("sin".to_owned()),
            TokenKind::Open,
            TokenKind::Name("_pi".to_owned()),
            TokenKind::Close,
            TokenKind::Caret,
            TokenKind::Number(2.0),
            TokenKind::End,
        ]
    );
}

#[test]
fn lexes_two_char_operators_and_conditionals() {
    assert_eq!(
        kinds(".5>=y&&x!=1 ? t : 0"),
        vec![
            TokenKind::Number(0.5),
            TokenKind::Ge,
            TokenKind::Name("y".to_owned()),
            TokenKind::And,
            TokenKind::Name("x".to_owned()),
            TokenKind::Ne,
            TokenKind::Number(1.0),
            TokenKind::Question,
            TokenKind::Name("t".to_owned()),
            TokenKind::Colon,
            TokenKind::Number(0.0),
            TokenKind::End,
        ]
    );
    assert_eq!(kinds("a<b")[1], TokenKind::Lt);
}

#[test]
fn tokens_carry_offsets() {
    let tokens = lex("  x ==\t3").unwrap();
    let offsets: Vec<usize> = tokens.iter().map(|t| t.at).collect();
    assert_eq!(offsets, vec![2, 4, 7, 8]);
}

#[test]
fn rejects_malformed_input() {
    assert_eq!(lex("1e+").unwrap_err().at, 3);
    assert!(lex("1.2.3").is_err());

    let err = lex("x # y").unwrap_err();
    assert_eq!(err.at, 2);
    assert!(err.reason.contains('#'));

    // Single `=`, `&` and `|` are not operators.
    assert!(lex("x = 1").is_err());
    assert!(lex("x & 1").is_err());
}
