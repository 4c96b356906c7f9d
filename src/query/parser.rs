use super::{
    expr::{Expr, Literal, Operand},
    lexer::{Spanned, Token, tokenize},
};
use crate::error::{Result, SelectorError};

/// Parse a predicate expression string.
///
/// See the crate documentation for the accepted syntax.
pub fn parse(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
    };
    let node = parser.parse_or()?;
    let end = parser.peek();
    if end.token != Token::Eof {
        return Err(parser.error(end.offset, "unexpected trailing input"));
    }
    parser.predicate_of(node, 0)
}

/// Intermediate parse result: parenthesized groups may hold values or predicates.
enum Node {
    Predicate(Expr),
    Value(Operand),
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, position: usize, message: impl Into<String>) -> SelectorError {
        SelectorError::Parse {
            expr: self.input.to_string(),
            position,
            message: message.into(),
        }
    }

    fn peek(&self) -> &Spanned {
        // the token stream always ends with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_second(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)].token
    }

    fn advance(&mut self) -> Spanned {
        let spanned = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        spanned
    }

    /// `in [...]` or `not in [...]` follows.
    fn at_membership(&self) -> bool {
        self.is_keyword("in")
            || (self.is_keyword("not") && matches!(self.peek_second(), Token::Ident(name) if name == "in"))
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.peek().token, Token::Ident(name) if name == keyword)
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<()> {
        let next = self.advance();
        if next.token == expected {
            Ok(())
        } else {
            Err(self.error(next.offset, format!("expected {what}")))
        }
    }

    fn predicate_of(&self, node: Node, offset: usize) -> Result<Expr> {
        match node {
            Node::Predicate(expr) => Ok(expr),
            Node::Value(Operand::Column(name)) => Ok(Expr::Column(name)),
            Node::Value(Operand::Literal(Literal::Bool(true))) => Ok(Expr::True),
            Node::Value(Operand::Literal(Literal::Bool(false))) => Ok(Expr::False),
            Node::Value(Operand::Literal(other)) => Err(self.error(
                offset,
                format!("expected a predicate, found literal {other}"),
            )),
        }
    }

    fn parse_or(&mut self) -> Result<Node> {
        let offset = self.peek().offset;
        let first = self.parse_and()?;
        if !(self.peek().token == Token::Pipe || self.is_keyword("or")) {
            return Ok(first);
        }
        let mut parts = vec![self.predicate_of(first, offset)?];
        while self.peek().token == Token::Pipe || self.is_keyword("or") {
            self.advance();
            let offset = self.peek().offset;
            let next = self.parse_and()?;
            parts.push(self.predicate_of(next, offset)?);
        }
        Ok(Node::Predicate(Expr::Or(parts)))
    }

    fn parse_and(&mut self) -> Result<Node> {
        let offset = self.peek().offset;
        let first = self.parse_unary()?;
        if !(self.peek().token == Token::Amp || self.is_keyword("and")) {
            return Ok(first);
        }
        let mut parts = vec![self.predicate_of(first, offset)?];
        while self.peek().token == Token::Amp || self.is_keyword("and") {
            self.advance();
            let offset = self.peek().offset;
            let next = self.parse_unary()?;
            parts.push(self.predicate_of(next, offset)?);
        }
        Ok(Node::Predicate(Expr::And(parts)))
    }

    fn parse_unary(&mut self) -> Result<Node> {
        if self.peek().token == Token::Tilde || self.is_keyword("not") {
            self.advance();
            let offset = self.peek().offset;
            let inner = self.parse_unary()?;
            let inner = self.predicate_of(inner, offset)?;
            return Ok(Node::Predicate(Expr::not(inner)));
        }
        self.parse_compare()
    }

    fn parse_compare(&mut self) -> Result<Node> {
        let offset = self.peek().offset;
        let first = self.parse_operand()?;

        if self.at_membership() {
            let negated = self.is_keyword("not");
            if negated {
                self.advance();
            }
            self.advance();
            let Node::Value(Operand::Column(column)) = first else {
                return Err(self.error(offset, "membership test requires a column on the left"));
            };
            let values = self.parse_list()?;
            return Ok(Node::Predicate(Expr::InList {
                column,
                values,
                negated,
            }));
        }

        let Token::Cmp(_) = self.peek().token else {
            return Ok(first);
        };
        let mut left = self.operand_of(first, offset)?;
        let mut comparisons = Vec::new();
        while let Token::Cmp(op) = self.peek().token {
            self.advance();
            let offset = self.peek().offset;
            let right = self.parse_operand()?;
            let right = self.operand_of(right, offset)?;
            comparisons.push(Expr::Cmp {
                left,
                op,
                right: right.clone(),
            });
            left = right;
        }
        // `a < b < c` means `(a < b) & (b < c)`
        if comparisons.len() == 1 {
            Ok(Node::Predicate(comparisons.remove(0)))
        } else {
            Ok(Node::Predicate(Expr::And(comparisons)))
        }
    }

    fn operand_of(&self, node: Node, offset: usize) -> Result<Operand> {
        match node {
            Node::Value(operand) => Ok(operand),
            Node::Predicate(_) => Err(self.error(offset, "expected a column or literal")),
        }
    }

    fn parse_list(&mut self) -> Result<Vec<Literal>> {
        self.expect(Token::LBracket, "'['")?;
        let mut values = Vec::new();
        if self.peek().token == Token::RBracket {
            self.advance();
            return Ok(values);
        }
        loop {
            let next = self.advance();
            match self.literal(&next.token) {
                Some(value) => values.push(value),
                None => return Err(self.error(next.offset, "expected a literal")),
            }
            let separator = self.advance();
            match separator.token {
                Token::Comma => continue,
                Token::RBracket => return Ok(values),
                _ => return Err(self.error(separator.offset, "expected ',' or ']'")),
            }
        }
    }

    fn literal(&self, token: &Token) -> Option<Literal> {
        match token {
            Token::Int(v) => Some(Literal::Int(*v)),
            Token::Float(v) => Some(Literal::Float(*v)),
            Token::Str(v) => Some(Literal::Str(v.clone())),
            Token::Ident(name) if name == "True" || name == "true" => Some(Literal::Bool(true)),
            Token::Ident(name) if name == "False" || name == "false" => Some(Literal::Bool(false)),
            _ => None,
        }
    }

    fn parse_operand(&mut self) -> Result<Node> {
        let next = self.advance();
        if let Some(value) = self.literal(&next.token) {
            return Ok(Node::Value(Operand::Literal(value)));
        }
        match next.token {
            Token::LParen => {
                let inner = self.parse_or()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::Quoted(name) => Ok(Node::Value(Operand::Column(name))),
            Token::Ident(name) if self.peek().token == Token::LParen => {
                let negated = match name.as_str() {
                    "isnull" | "isna" => false,
                    "notnull" | "notna" => true,
                    _ => return Err(self.error(next.offset, format!("unknown function '{name}'"))),
                };
                self.advance();
                let arg = self.advance();
                let column = match arg.token {
                    Token::Ident(column) | Token::Quoted(column) => column,
                    _ => return Err(self.error(arg.offset, "expected a column name")),
                };
                self.expect(Token::RParen, "')'")?;
                Ok(Node::Predicate(Expr::IsNull { column, negated }))
            }
            Token::Ident(name) if matches!(name.as_str(), "and" | "or" | "not" | "in") => {
                Err(self.error(next.offset, format!("unexpected keyword '{name}'")))
            }
            Token::Ident(name) => Ok(Node::Value(Operand::Column(name))),
            Token::Eof => Err(self.error(next.offset, "unexpected end of expression")),
            _ => Err(self.error(next.offset, "expected a column, literal or '('")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::CmpOp;

    #[test]
    fn parses_folded_conjunction() {
        let expr = parse("((`a` >= 5) & (`a` < 6))").unwrap();
        assert_eq!(
            expr,
            Expr::and(vec![Expr::gt_eq("a", 5), Expr::lt("a", 6)])
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let expr = parse("a == 1 | b == 2 & c == 3").unwrap();
        assert_eq!(
            expr,
            Expr::or(vec![
                Expr::eq("a", 1),
                Expr::and(vec![Expr::eq("b", 2), Expr::eq("c", 3)]),
            ])
        );
    }

    #[test]
    fn parses_negation_and_keywords() {
        assert_eq!(
            parse("~(a == 1)").unwrap(),
            Expr::not(Expr::eq("a", 1))
        );
        assert_eq!(
            parse("not a == 1 and b").unwrap(),
            Expr::and(vec![Expr::not(Expr::eq("a", 1)), Expr::Column("b".to_string())])
        );
    }

    #[test]
    fn parses_chained_comparison() {
        assert_eq!(
            parse("1 < a <= 3").unwrap(),
            Expr::and(vec![
                Expr::Cmp {
                    left: Operand::literal(1),
                    op: CmpOp::Lt,
                    right: Operand::column("a"),
                },
                Expr::cmp("a", CmpOp::LtEq, 3),
            ])
        );
    }

    #[test]
    fn parses_membership_and_null_checks() {
        assert_eq!(
            parse("`kind` not in ['x', 'y']").unwrap(),
            Expr::InList {
                column: "kind".to_string(),
                values: vec!["x".into(), "y".into()],
                negated: true,
            }
        );
        assert_eq!(parse("notnull(`b c`)").unwrap(), Expr::is_not_null("b c"));
        assert_eq!(parse("isna(b)").unwrap(), Expr::is_null("b"));
    }

    #[test]
    fn display_round_trips() {
        let source = "((`sepal.length` < 5) | (`sepal.length` >= 6.5)) & kind in ['a', 'b']";
        let expr = parse(source).unwrap();
        assert_eq!(parse(&expr.to_string()).unwrap(), expr);
    }

    #[test]
    fn rejects_malformed_input() {
        for input in ["", "a ==", "(a == 1", "a == 1)", "5", "foo(a)", "a in 3", "(a == 1) > 2"] {
            assert!(
                matches!(parse(input), Err(SelectorError::Parse { .. })),
                "expected parse error for {input:?}"
            );
        }
    }
}
