use chumsky::prelude::*;
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Token {
    Ident(String),
    True,
    False,
    /// Kept as text so the token stays `Eq + Hash`; converted to f64 by the parser
    Number(String),
    Text(String),
    Not,
    And,
    Or,
    CmpEq,
    CmpNeq,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "{}", name),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Number(raw) => write!(f, "{}", raw),
            Token::Text(s) => write!(f, "'{}'", s),
            Token::Not => write!(f, "!"),
            Token::And => write!(f, "&&"),
            Token::Or => write!(f, "||"),
            Token::CmpEq => write!(f, "=="),
            Token::CmpNeq => write!(f, "!="),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

pub(crate) fn lexer() -> impl Parser<char, Vec<(Token, Range<usize>)>, Error = Simple<char>> {
    let number = text::int::<char, Simple<char>>(10)
        .then(just('.').ignore_then(text::digits(10)).or_not())
        .map(|(int_part, frac)| match frac {
            Some(frac) => Token::Number(format!("{}.{}", int_part, frac)),
            None => Token::Number(int_part),
        });

    let single_quoted = just('\'')
        .ignore_then(filter(|c: &char| *c != '\'').repeated().collect::<String>())
        .then_ignore(just('\''));
    let double_quoted = just('"')
        .ignore_then(filter(|c: &char| *c != '"').repeated().collect::<String>())
        .then_ignore(just('"'));
    let string = single_quoted.or(double_quoted).map(Token::Text);

    let word = text::ident::<char, Simple<char>>().map(|raw: String| match raw.as_str() {
        "true" => Token::True,
        "false" => Token::False,
        _ => Token::Ident(raw),
    });

    // "!=" must be tried before "!"
    let op = choice::<_, Simple<char>>((
        just("&&").to(Token::And),
        just("||").to(Token::Or),
        just("==").to(Token::CmpEq),
        just("!=").to(Token::CmpNeq),
        just("!").to(Token::Not),
        just("(").to(Token::LParen),
        just(")").to(Token::RParen),
    ));

    choice::<_, Simple<char>>((number, string, word, op))
        .map_with_span(|tok, span| (tok, span))
        .padded()
        .repeated()
        .then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        lexer()
            .parse(source)
            .unwrap()
            .into_iter()
            .map(|(tok, _)| tok)
            .collect()
    }

    #[test]
    fn test_operators_and_words() {
        assert_eq!(
            kinds("!a && (b||c) != true"),
            vec![
                Token::Not,
                Token::Ident("a".to_string()),
                Token::And,
                Token::LParen,
                Token::Ident("b".to_string()),
                Token::Or,
                Token::Ident("c".to_string()),
                Token::RParen,
                Token::CmpNeq,
                Token::True,
            ]
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            kinds("3.5 'web' \"app\""),
            vec![
                Token::Number("3.5".to_string()),
                Token::Text("web".to_string()),
                Token::Text("app".to_string()),
            ]
        );
    }

    #[test]
    fn test_rejects_single_ampersand() {
        assert!(lexer().parse("a & b").is_err());
    }
}
