//! Recursive-descent parser producing the evaluator's syntax tree.

use crate::error::{ExprError, Result};
use crate::lexer::{tokenize, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Name(String),
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Map(Vec<(Expr, Expr)>),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call {
        target: String,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `name = expr`
    Assign(String, Expr),
    /// An expression evaluated for effect; its value is discarded.
    Expr(Expr),
}

/// Parse a single expression; trailing input is an error.
pub fn parse_expression(src: &str) -> Result<Expr> {
    let mut parser = Parser::new(tokenize(src)?);
    parser.skip_separators();
    let expr = parser.expression()?;
    parser.skip_separators();
    parser.expect_end()?;
    Ok(expr)
}

/// Parse a sequence of statements separated by newlines or semicolons.
pub fn parse_program(src: &str) -> Result<Vec<Stmt>> {
    let mut parser = Parser::new(tokenize(src)?);
    let mut stmts = Vec::new();
    loop {
        parser.skip_separators();
        if parser.at_end() {
            return Ok(stmts);
        }
        stmts.push(parser.statement()?);
        if !parser.at_end() && !parser.eat_separator() {
            return Err(parser.unexpected("newline or ';'"));
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek2(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_separator(&mut self) -> bool {
        matches!(self.peek(), Some(Token::Newline) | Some(Token::Semi)) && {
            self.pos += 1;
            true
        }
    }

    fn skip_separators(&mut self) {
        while self.eat_separator() {}
    }

    fn expect(&mut self, token: &Token, wanted: &str) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(wanted))
        }
    }

    fn expect_end(&self) -> Result<()> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.unexpected("end of input"))
        }
    }

    fn unexpected(&self, wanted: &str) -> ExprError {
        match self.peek() {
            Some(token) => {
                ExprError::syntax(format!("expected {wanted}, found {}", token.describe()))
            }
            None => ExprError::syntax(format!("expected {wanted}, found end of input")),
        }
    }

    fn statement(&mut self) -> Result<Stmt> {
        if let (Some(Token::Ident(name)), Some(Token::Eq)) = (self.peek(), self.peek2()) {
            let name = name.clone();
            self.pos += 2;
            let value = self.expression()?;
            return Ok(Stmt::Assign(name, value));
        }
        Ok(Stmt::Expr(self.expression()?))
    }

    fn expression(&mut self) -> Result<Expr> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> Result<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Int(i)) => Ok(Expr::Int(i)),
            Some(Token::Float(x)) => Ok(Expr::Float(x)),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::Ident(name)) => self.name_or_call(name),
            Some(Token::LParen) => self.group_or_tuple(),
            Some(Token::LBracket) => self.list(),
            Some(Token::LBrace) => self.map(),
            Some(other) => Err(ExprError::syntax(format!(
                "expected expression, found {}",
                other.describe()
            ))),
            None => Err(ExprError::syntax(
                "expected expression, found end of input",
            )),
        }
    }

    fn name_or_call(&mut self, name: String) -> Result<Expr> {
        match name.as_str() {
            "None" => return Ok(Expr::None),
            "True" => return Ok(Expr::Bool(true)),
            "False" => return Ok(Expr::Bool(false)),
            _ => {}
        }

        if !self.eat(&Token::LParen) {
            return Ok(Expr::Name(name));
        }

        let mut args = Vec::new();
        let mut kwargs: Vec<(String, Expr)> = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                if let (Some(Token::Ident(kw)), Some(Token::Eq)) = (self.peek(), self.peek2()) {
                    let kw = kw.clone();
                    self.pos += 2;
                    kwargs.push((kw, self.expression()?));
                } else {
                    if !kwargs.is_empty() {
                        return Err(ExprError::syntax(
                            "positional argument follows keyword argument",
                        ));
                    }
                    args.push(self.expression()?);
                }
                if self.eat(&Token::RParen) {
                    break;
                }
                self.expect(&Token::Comma, "',' or ')'")?;
            }
        }

        Ok(Expr::Call {
            target: name,
            args,
            kwargs,
        })
    }

    fn group_or_tuple(&mut self) -> Result<Expr> {
        if self.eat(&Token::RParen) {
            return Ok(Expr::Tuple(Vec::new()));
        }

        let first = self.expression()?;
        if self.eat(&Token::RParen) {
            // Plain grouping.
            return Ok(first);
        }

        self.expect(&Token::Comma, "',' or ')'")?;
        let mut items = vec![first];
        if !self.eat(&Token::RParen) {
            loop {
                items.push(self.expression()?);
                if self.eat(&Token::RParen) {
                    break;
                }
                self.expect(&Token::Comma, "',' or ')'")?;
                // Trailing comma.
                if self.eat(&Token::RParen) {
                    break;
                }
            }
        }
        Ok(Expr::Tuple(items))
    }

    fn list(&mut self) -> Result<Expr> {
        let mut items = Vec::new();
        if !self.eat(&Token::RBracket) {
            loop {
                items.push(self.expression()?);
                if self.eat(&Token::RBracket) {
                    break;
                }
                self.expect(&Token::Comma, "',' or ']'")?;
                if self.eat(&Token::RBracket) {
                    break;
                }
            }
        }
        Ok(Expr::List(items))
    }

    fn map(&mut self) -> Result<Expr> {
        let mut entries = Vec::new();
        if !self.eat(&Token::RBrace) {
            loop {
                let key = self.expression()?;
                self.expect(&Token::Colon, "':'")?;
                let value = self.expression()?;
                entries.push((key, value));
                if self.eat(&Token::RBrace) {
                    break;
                }
                self.expect(&Token::Comma, "',' or '}'")?;
                if self.eat(&Token::RBrace) {
                    break;
                }
            }
        }
        Ok(Expr::Map(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_binds_multiplication_tighter() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinOp::Add,
                Box::new(Expr::Int(1)),
                Box::new(Expr::Binary(
                    BinOp::Mul,
                    Box::new(Expr::Int(2)),
                    Box::new(Expr::Int(3)),
                )),
            )
        );
    }

    #[test]
    fn grouping_overrides_precedence() {
        let expr = parse_expression("(1 + 2) * 3").unwrap();
        assert!(matches!(expr, Expr::Binary(BinOp::Mul, _, _)));
    }

    #[test]
    fn unary_minus_nests() {
        assert_eq!(
            parse_expression("--3").unwrap(),
            Expr::Neg(Box::new(Expr::Neg(Box::new(Expr::Int(3)))))
        );
    }

    #[test]
    fn tuple_needs_comma_or_emptiness() {
        assert_eq!(parse_expression("(1)").unwrap(), Expr::Int(1));
        assert_eq!(
            parse_expression("(1,)").unwrap(),
            Expr::Tuple(vec![Expr::Int(1)])
        );
        assert_eq!(parse_expression("()").unwrap(), Expr::Tuple(vec![]));
        assert_eq!(
            parse_expression("(1, 2)").unwrap(),
            Expr::Tuple(vec![Expr::Int(1), Expr::Int(2)])
        );
    }

    #[test]
    fn list_and_map_literals() {
        assert_eq!(
            parse_expression("[1, 2,]").unwrap(),
            Expr::List(vec![Expr::Int(1), Expr::Int(2)])
        );
        assert_eq!(
            parse_expression("{\"a\": 1}").unwrap(),
            Expr::Map(vec![(Expr::Str("a".to_string()), Expr::Int(1))])
        );
        assert_eq!(parse_expression("{}").unwrap(), Expr::Map(vec![]));
    }

    #[test]
    fn keywords_parse_as_literals() {
        assert_eq!(parse_expression("None").unwrap(), Expr::None);
        assert_eq!(parse_expression("True").unwrap(), Expr::Bool(true));
        assert_eq!(parse_expression("False").unwrap(), Expr::Bool(false));
    }

    #[test]
    fn calls_split_positional_and_keyword_arguments() {
        let expr = parse_expression("plot(1, color=\"red\")").unwrap();
        assert_eq!(
            expr,
            Expr::Call {
                target: "plot".to_string(),
                args: vec![Expr::Int(1)],
                kwargs: vec![("color".to_string(), Expr::Str("red".to_string()))],
            }
        );
    }

    #[test]
    fn positional_after_keyword_rejected() {
        assert!(matches!(
            parse_expression("f(a=1, 2)"),
            Err(ExprError::Syntax(_))
        ));
    }

    #[test]
    fn trailing_tokens_rejected() {
        assert!(matches!(
            parse_expression("1 2"),
            Err(ExprError::Syntax(_))
        ));
    }

    #[test]
    fn program_splits_on_newlines_and_semicolons() {
        let stmts = parse_program("x = 1\ny = 2; y + x\n").unwrap();
        assert_eq!(
            stmts,
            vec![
                Stmt::Assign("x".to_string(), Expr::Int(1)),
                Stmt::Assign("y".to_string(), Expr::Int(2)),
                Stmt::Expr(Expr::Binary(
                    BinOp::Add,
                    Box::new(Expr::Name("y".to_string())),
                    Box::new(Expr::Name("x".to_string())),
                )),
            ]
        );
    }

    #[test]
    fn empty_program_is_fine() {
        assert_eq!(parse_program("  \n # nothing\n").unwrap(), vec![]);
    }

    #[test]
    fn multiline_literal_spans_statements() {
        let stmts = parse_program("x = [1,\n 2]\nx").unwrap();
        assert_eq!(stmts.len(), 2);
    }
}
