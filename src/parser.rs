//! Recursive-descent parser over [`crate::lexer`] tokens, producing an
//! [`crate::ast::Query`].
//!
//! Grammar (lowest to highest precedence):
//! `or` < `and` < `not` (prefix) < comparison (`= <> is [not] < <= > >= like`)
//! < `||` < `+ -` < `* / %` < unary prefix (`+ - not`) < `^` (right-assoc)
//! < postfix (`.access`, `.call(args)`) < primary.
//!
//! `base.name(args)` desugars into `Call("name", [positional(base), ...args])`
//! so pipeline syntax and ordinary calls share one AST shape; a bare `.name`
//! with no parens stays `Access(base, "name")`.

use crate::ast::{Ast, AstKind, BinaryOp, FuncArg, Literal, Param, Query, Signature, TypeName, UnaryOp};
use crate::error::{Error, Result, Span, WithErrorInfo};
use crate::lexer::{lex, Token, TokenKind};

pub fn parse(source: &str) -> Result<Query> {
    let tokens = lex(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let query = parser.parse_query()?;
    parser.expect_eof()?;
    Ok(query)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn peek_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn is_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), TokenKind::Keyword(k) if *k == kw)
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.is_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &TokenKind, what: &str) -> Result<Span> {
        if self.peek() == expected {
            Ok(self.advance().span)
        } else {
            Err(Error::simple(format!("expected {what}"))
                .with_span(Some(self.peek_span())))
        }
    }

    fn expect_eof(&mut self) -> Result<()> {
        if matches!(self.peek(), TokenKind::Eof) {
            Ok(())
        } else {
            Err(Error::simple("unexpected trailing input").with_span(Some(self.peek_span())))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span)> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                let span = self.advance().span;
                Ok((name, span))
            }
            _ => Err(Error::simple("expected an identifier").with_span(Some(self.peek_span()))),
        }
    }

    /// Like `expect_ident`, but also accepts the handful of keywords that
    /// double as builtin method names after a `.` — `.as(...)`,
    /// `.between(...)`, `.in(...)` — none of which are ambiguous in this
    /// position: `expr as Type` (no dot) and infix `between`/`in` are parsed
    /// elsewhere, so a keyword immediately following `.` can only mean the
    /// corresponding builtin call.
    fn expect_member_name(&mut self) -> Result<(String, Span)> {
        if let TokenKind::Keyword(kw @ ("as" | "between" | "in")) = self.peek() {
            let kw = kw.to_string();
            let span = self.advance().span;
            return Ok((kw, span));
        }
        self.expect_ident()
    }

    // ---- top level -----------------------------------------------------

    fn parse_query(&mut self) -> Result<Query> {
        let mut lets = Vec::new();
        while self.is_keyword("let") {
            lets.push(self.parse_let()?);
            self.eat_keyword_semi();
        }
        let body = self.parse_expr()?;
        Ok(Query { lets, body })
    }

    fn eat_keyword_semi(&mut self) {
        if matches!(self.peek(), TokenKind::Semi) {
            self.advance();
        }
    }

    fn parse_let(&mut self) -> Result<crate::ast::LetEntry> {
        self.advance(); // `let`
        let (name, _) = self.expect_ident()?;

        let signature = if matches!(self.peek(), TokenKind::LParen) {
            self.advance();
            let mut params = Vec::new();
            if !matches!(self.peek(), TokenKind::RParen) {
                loop {
                    let (pname, _) = self.expect_ident()?;
                    let default = if matches!(self.peek(), TokenKind::Eq) {
                        self.advance();
                        Some(self.parse_expr()?)
                    } else {
                        None
                    };
                    params.push(Param {
                        name: pname,
                        default,
                    });
                    if matches!(self.peek(), TokenKind::Comma) {
                        self.advance();
                        continue;
                    }
                    break;
                }
            }
            self.expect(&TokenKind::RParen, "`)` to close let parameter list")?;
            Some(Signature { params })
        } else {
            None
        };

        self.expect(&TokenKind::Eq, "`=` in let binding")?;
        let body = self.parse_expr()?;
        Ok(crate::ast::LetEntry {
            name,
            signature,
            body: Box::new(body),
        })
    }

    // ---- expression precedence ladder -----------------------------------

    fn parse_expr(&mut self) -> Result<Ast> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Ast> {
        let mut lhs = self.parse_and()?;
        while self.is_keyword("or") {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Ast> {
        let mut lhs = self.parse_not()?;
        while self.is_keyword("and") {
            self.advance();
            let rhs = self.parse_not()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Ast> {
        if self.is_keyword("not") {
            let start = self.peek_span();
            self.advance();
            let operand = self.parse_not()?;
            let span = Span::new(start.start, operand.span.end);
            return Ok(Ast::new(AstKind::Unary(UnaryOp::Not, Box::new(operand)), span));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Ast> {
        let lhs = self.parse_concat()?;
        let op = match self.peek() {
            TokenKind::Eq => Some(BinaryOp::Eq),
            TokenKind::Ne => Some(BinaryOp::Ne),
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::Le => Some(BinaryOp::Le),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::Ge => Some(BinaryOp::Ge),
            TokenKind::Keyword("like") => Some(BinaryOp::Like),
            TokenKind::Keyword("is") => {
                self.advance();
                let negated = self.eat_keyword("not");
                let rhs = self.parse_concat()?;
                let op = if negated { BinaryOp::IsNot } else { BinaryOp::Is };
                return Ok(binary(op, lhs, rhs));
            }
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let rhs = self.parse_concat()?;
            return Ok(binary(op, lhs, rhs));
        }
        Ok(lhs)
    }

    fn parse_concat(&mut self) -> Result<Ast> {
        let mut lhs = self.parse_additive()?;
        while matches!(self.peek(), TokenKind::Pipe2) {
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = binary(BinaryOp::Concat, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Ast> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Ast> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Ast> {
        let start = self.peek_span();
        let op = match self.peek() {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            let span = Span::new(start.start, operand.span.end);
            return Ok(Ast::new(AstKind::Unary(op, Box::new(operand)), span));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Ast> {
        let base = self.parse_postfix()?;
        if matches!(self.peek(), TokenKind::Caret) {
            self.advance();
            let exponent = self.parse_unary()?; // right-associative
            let span = Span::new(base.span.start, exponent.span.end);
            return Ok(Ast::new(
                AstKind::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)),
                span,
            ));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> Result<Ast> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let (name, name_span) = self.expect_member_name()?;
                    if matches!(self.peek(), TokenKind::LParen) {
                        let args = self.parse_arg_list()?;
                        let mut all_args = Vec::with_capacity(args.len() + 1);
                        all_args.push(FuncArg::positional(expr.clone()));
                        all_args.extend(args);
                        let span = Span::new(expr.span.start, self.tokens[self.pos - 1].span.end);
                        expr = Ast::new(AstKind::Call(name, all_args), span);
                    } else {
                        let span = Span::new(expr.span.start, name_span.end);
                        expr = Ast::new(AstKind::Access(Box::new(expr), name), span);
                    }
                }
                TokenKind::Keyword("as") => {
                    self.advance();
                    let type_name = self.parse_type_name()?;
                    let span = Span::new(expr.span.start, self.tokens[self.pos - 1].span.end);
                    expr = Ast::new(AstKind::Cast(Box::new(expr), type_name), span);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_arg_list(&mut self) -> Result<Vec<FuncArg>> {
        self.advance(); // `(`
        let mut args = Vec::new();
        if !matches!(self.peek(), TokenKind::RParen) {
            loop {
                args.push(self.parse_func_arg()?);
                if matches!(self.peek(), TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(&TokenKind::RParen, "`)` to close argument list")?;
        Ok(args)
    }

    /// `name: expr` for a named argument, otherwise a bare positional `expr`.
    /// Disambiguated with one token of lookahead since plain identifiers are
    /// valid expressions too.
    fn parse_func_arg(&mut self) -> Result<FuncArg> {
        if let TokenKind::Ident(name) = self.peek().clone() {
            if matches!(self.tokens.get(self.pos + 1).map(|t| &t.kind), Some(TokenKind::Colon)) {
                self.advance(); // ident
                self.advance(); // colon
                let value = self.parse_expr()?;
                return Ok(FuncArg::named(name, value));
            }
        }
        Ok(FuncArg::positional(self.parse_expr()?))
    }

    fn parse_type_name(&mut self) -> Result<TypeName> {
        let (name, _) = self.expect_ident()?;
        let mut args = Vec::new();
        if matches!(self.peek(), TokenKind::LParen) {
            self.advance();
            if !matches!(self.peek(), TokenKind::RParen) {
                loop {
                    match self.peek().clone() {
                        TokenKind::Int(n) => {
                            self.advance();
                            args.push(n);
                        }
                        _ => {
                            return Err(Error::simple("expected an integer type argument")
                                .with_span(Some(self.peek_span())))
                        }
                    }
                    if matches!(self.peek(), TokenKind::Comma) {
                        self.advance();
                        continue;
                    }
                    break;
                }
            }
            self.expect(&TokenKind::RParen, "`)` to close type arguments")?;
        }
        Ok(TypeName { name, args })
    }

    fn parse_primary(&mut self) -> Result<Ast> {
        let start = self.peek_span();
        match self.peek().clone() {
            TokenKind::Int(n) => {
                self.advance();
                Ok(Ast::new(AstKind::Literal(Literal::Integer(n)), start))
            }
            TokenKind::Decimal(text) => {
                self.advance();
                Ok(Ast::new(AstKind::Literal(Literal::Decimal(text)), start))
            }
            TokenKind::Str(text) => {
                self.advance();
                Ok(Ast::new(AstKind::Literal(Literal::String(text)), start))
            }
            TokenKind::Keyword("true") => {
                self.advance();
                Ok(Ast::new(AstKind::Literal(Literal::Bool(true)), start))
            }
            TokenKind::Keyword("false") => {
                self.advance();
                Ok(Ast::new(AstKind::Literal(Literal::Bool(false)), start))
            }
            TokenKind::Keyword("null") => {
                self.advance();
                Ok(Ast::new(AstKind::Literal(Literal::Null), start))
            }
            TokenKind::Keyword("cast") => {
                self.advance();
                self.expect(&TokenKind::LParen, "`(` after `cast`")?;
                let expr = self.parse_expr()?;
                self.eat_keyword("as")
                    .then_some(())
                    .ok_or_else(|| Error::simple("expected `as` in `cast(...)`").with_span(Some(self.peek_span())))?;
                let type_name = self.parse_type_name()?;
                let end = self.expect(&TokenKind::RParen, "`)` to close `cast(...)`")?;
                Ok(Ast::new(
                    AstKind::Cast(Box::new(expr), type_name),
                    Span::new(start.start, end.end),
                ))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "`)` to close parenthesized expression")?;
                Ok(inner)
            }
            TokenKind::LBrace => self.parse_tuple(),
            TokenKind::Ident(name) => {
                self.advance();
                if matches!(self.peek(), TokenKind::LParen) {
                    let args = self.parse_arg_list()?;
                    let span = Span::new(start.start, self.tokens[self.pos - 1].span.end);
                    Ok(Ast::new(AstKind::Call(name, args), span))
                } else {
                    Ok(Ast::new(AstKind::Ident(name), start))
                }
            }
            _ => Err(Error::simple("expected an expression").with_span(Some(start))),
        }
    }

    fn parse_tuple(&mut self) -> Result<Ast> {
        let start = self.peek_span();
        self.advance(); // `{`
        let mut entries = Vec::new();
        if !matches!(self.peek(), TokenKind::RBrace) {
            loop {
                entries.push(self.parse_func_arg()?);
                if matches!(self.peek(), TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        let end = self.expect(&TokenKind::RBrace, "`}` to close tuple")?;
        Ok(Ast::new(AstKind::Tuple(entries), Span::new(start.start, end.end)))
    }
}

fn binary(op: BinaryOp, lhs: Ast, rhs: Ast) -> Ast {
    let span = Span::new(lhs.span.start, rhs.span.end);
    Ast::new(AstKind::Binary(op, Box::new(lhs), Box::new(rhs)), span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalar_arithmetic() {
        let query = parse("1 + 2 * 3").unwrap();
        assert!(query.lets.is_empty());
        match query.body.kind {
            AstKind::Binary(BinaryOp::Add, _, _) => {}
            other => panic!("expected addition at the top, got {other:?}"),
        }
    }

    #[test]
    fn pipeline_call_desugars_with_base_prepended() {
        let query = parse("region.filter(r_name = 'EUROPE')").unwrap();
        match query.body.kind {
            AstKind::Call(name, args) => {
                assert_eq!(name, "filter");
                assert_eq!(args.len(), 2);
                assert!(matches!(args[0].value.kind, AstKind::Ident(ref n) if n == "region"));
            }
            other => panic!("expected a Call node, got {other:?}"),
        }
    }

    #[test]
    fn bare_dotted_access_stays_access() {
        let query = parse("r.r_name").unwrap();
        match query.body.kind {
            AstKind::Access(base, name) => {
                assert_eq!(name, "r_name");
                assert!(matches!(base.kind, AstKind::Ident(ref n) if n == "r"));
            }
            other => panic!("expected Access, got {other:?}"),
        }
    }

    #[test]
    fn cast_syntax_builds_cast_node() {
        let query = parse("cast(1 as text)").unwrap();
        match query.body.kind {
            AstKind::Cast(_, type_name) => assert_eq!(type_name.name, "text"),
            other => panic!("expected Cast, got {other:?}"),
        }
    }

    #[test]
    fn tuple_supports_named_entries() {
        let query = parse("{o_orderstatus, n: count()}").unwrap();
        match query.body.kind {
            AstKind::Tuple(entries) => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[1].name.as_deref(), Some("n"));
            }
            other => panic!("expected Tuple, got {other:?}"),
        }
    }

    #[test]
    fn let_with_signature_and_default() {
        let query = parse("let double(x, y = 2) = x * y\n double(21)").unwrap();
        assert_eq!(query.lets.len(), 1);
        let sig = query.lets[0].signature.as_ref().unwrap();
        assert_eq!(sig.params[0].name, "x");
        assert_eq!(sig.params[1].name, "y");
        assert!(sig.params[1].default.is_some());
    }

    #[test]
    fn power_is_right_associative() {
        // 2 ^ 3 ^ 2 should parse as 2 ^ (3 ^ 2), not (2 ^ 3) ^ 2.
        let query = parse("2 ^ 3 ^ 2").unwrap();
        match query.body.kind {
            AstKind::Binary(BinaryOp::Pow, lhs, rhs) => {
                assert!(matches!(lhs.kind, AstKind::Literal(Literal::Integer(2))));
                assert!(matches!(rhs.kind, AstKind::Binary(BinaryOp::Pow, _, _)));
            }
            other => panic!("expected Pow, got {other:?}"),
        }
    }

    #[test]
    fn is_not_parses_to_is_not() {
        let query = parse("a is not null").unwrap();
        match query.body.kind {
            AstKind::Binary(BinaryOp::IsNot, _, _) => {}
            other => panic!("expected IsNot, got {other:?}"),
        }
    }
}
