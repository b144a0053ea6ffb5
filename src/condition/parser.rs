use chumsky::prelude::*;
use chumsky::Stream;

use super::lexer::{lexer, Token};
use super::{CmpOp, Expr};
use crate::errors::ExpressionError;

/// Parses a condition into an expression tree.
///
/// Precedence, loosest first: `||`, `&&`, `==`/`!=`, `!`.
pub(crate) fn parse_expr(source: &str) -> Result<Expr, ExpressionError> {
    let (tokens, lex_errs) = lexer().parse_recovery(source);
    if let Some(err) = lex_errs.into_iter().next() {
        return Err(to_expression_error(source, err));
    }

    let tokens = tokens.unwrap_or_default();
    let eoi = source.chars().count();
    let stream = Stream::from_iter(eoi..eoi + 1, tokens.into_iter());

    expr_parser().parse(stream).map_err(|errs| match errs.into_iter().next() {
        Some(err) => to_expression_error(source, err),
        None => ExpressionError::Parse {
            source_text: source.to_string(),
            message: "empty condition".to_string(),
            start: 0,
            end: 0,
        },
    })
}

fn expr_parser() -> impl Parser<Token, Expr, Error = Simple<Token>> {
    recursive(|expr| {
        let value = select! {
            Token::Ident(name) => Expr::Var(name),
            Token::True => Expr::Bool(true),
            Token::False => Expr::Bool(false),
            Token::Text(s) => Expr::Text(s),
        };
        let number = select! { Token::Number(raw) => raw }.try_map(|raw: String, span| {
            raw.parse::<f64>()
                .map(Expr::Number)
                .map_err(|_| Simple::custom(span, format!("invalid number literal {}", raw)))
        });

        let atom = choice::<_, Simple<Token>>((
            value,
            number,
            expr.delimited_by(just(Token::LParen), just(Token::RParen)),
        ));

        let unary = just(Token::Not)
            .repeated()
            .then(atom)
            .foldr(|_not, operand| Expr::Not(Box::new(operand)))
            .boxed();

        let cmp_op = choice::<_, Simple<Token>>((
            just(Token::CmpEq).to(CmpOp::Eq),
            just(Token::CmpNeq).to(CmpOp::Ne),
        ));
        let comparison = unary
            .clone()
            .then(cmp_op.then(unary).repeated())
            .foldl(|lhs, (op, rhs)| Expr::Compare(op, Box::new(lhs), Box::new(rhs)))
            .boxed();

        let and = comparison
            .clone()
            .then(just(Token::And).ignore_then(comparison).repeated())
            .foldl(|lhs, rhs| Expr::And(Box::new(lhs), Box::new(rhs)))
            .boxed();

        and.clone()
            .then(just(Token::Or).ignore_then(and).repeated())
            .foldl(|lhs, rhs| Expr::Or(Box::new(lhs), Box::new(rhs)))
    })
    .then_ignore(end())
}

fn to_expression_error<T>(source: &str, err: Simple<T>) -> ExpressionError
where
    T: std::fmt::Display + std::hash::Hash + Eq,
{
    let span = err.span();
    ExpressionError::Parse {
        source_text: source.to_string(),
        message: err.to_string(),
        start: span.start,
        end: span.end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Box<Expr> {
        Box::new(Expr::Var(name.to_string()))
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = parse_expr("a || b && c").unwrap();
        assert_eq!(
            expr,
            Expr::Or(var("a"), Box::new(Expr::And(var("b"), var("c"))))
        );
    }

    #[test]
    fn test_not_and_parens() {
        let expr = parse_expr("!(a || b)").unwrap();
        assert_eq!(expr, Expr::Not(Box::new(Expr::Or(var("a"), var("b")))));

        let expr = parse_expr("!!a").unwrap();
        assert_eq!(expr, Expr::Not(Box::new(Expr::Not(var("a")))));
    }

    #[test]
    fn test_comparison() {
        let expr = parse_expr("a == false").unwrap();
        assert_eq!(
            expr,
            Expr::Compare(CmpOp::Eq, var("a"), Box::new(Expr::Bool(false)))
        );
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "a &&", "(a || b", "a b", "&& a", "a & b"] {
            let err = parse_expr(bad).unwrap_err();
            assert!(
                matches!(err, ExpressionError::Parse { .. }),
                "expected parse error for {:?}, got {:?}",
                bad,
                err
            );
        }
    }
}
