//! Recursive-descent parser.
//!
//! Expressions climb a precedence ladder (assignment lowest, postfix chains
//! highest). Additive and multiplicative levels recurse on their own level
//! for the right operand, producing right-leaning trees: `1 - 2 - 3`
//! evaluates as `1 - (2 - 3)`. Comparison levels are left-associative;
//! assignment restarts the ladder on its right side.

use crate::{
    error::{CodeLoc, Exception},
    expressions::{Ast, BinOp, Expr, NodeId, UnOp},
    lex::{Token, TokenKind},
};

/// Parses a token stream (as produced by the lexer, ending with the end
/// sentinel) into an AST rooted at the program statement list.
pub(crate) fn parse(tokens: &[Token]) -> Result<Ast, Exception> {
    if tokens.is_empty() {
        let mut ast = Ast::new();
        let root = ast.push(
            CodeLoc::new(1, 0),
            Expr::StatementList {
                statements: Vec::new(),
                own_scope: false,
            },
        );
        ast.set_root(root);
        return Ok(ast);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        ast: Ast::new(),
    };
    let root_location = tokens[0].location;
    let mut statements = Vec::new();
    while !parser.at(TokenKind::End) {
        statements.push(parser.parse_statement()?);
    }
    // Globals live in the outermost scope, so the root has no scope of its own.
    let root = parser.ast.push(
        root_location,
        Expr::StatementList {
            statements,
            own_scope: false,
        },
    );
    parser.ast.set_root(root);
    Ok(parser.ast)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    ast: Ast,
}

impl Parser<'_> {
    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// Never advances past the end sentinel.
    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    /// Consumes a token of the given kind, or fails with the offending
    /// token's location.
    fn expect(&mut self, kind: TokenKind) -> Result<CodeLoc, Exception> {
        let token = self.current();
        if token.kind == kind {
            let location = token.location;
            self.advance();
            Ok(location)
        } else {
            Err(Exception::parse(
                token.location,
                format!("expected {kind}, found {}", token.kind),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, CodeLoc), Exception> {
        let token = self.current();
        if token.kind == TokenKind::Ident {
            let name = token.text.clone();
            let location = token.location;
            self.advance();
            Ok((name, location))
        } else {
            Err(Exception::parse(
                token.location,
                format!("expected identifier, found {}", token.kind),
            ))
        }
    }

    // ---- statements ----

    fn parse_statement(&mut self) -> Result<NodeId, Exception> {
        if self.at(TokenKind::LBrace) {
            return self.parse_block();
        }
        self.parse_single_statement()
    }

    /// `{ statement* }` with its own scope.
    fn parse_block(&mut self) -> Result<NodeId, Exception> {
        let location = self.expect(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while !self.at(TokenKind::RBrace) {
            if self.at(TokenKind::End) {
                return Err(Exception::parse(
                    self.current().location,
                    "unexpected end of input inside block",
                ));
            }
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(self.ast.push(
            location,
            Expr::StatementList {
                statements,
                own_scope: true,
            },
        ))
    }

    fn parse_single_statement(&mut self) -> Result<NodeId, Exception> {
        match self.current().kind {
            TokenKind::Print => {
                let location = self.expect(TokenKind::Print)?;
                let value = self.parse_expression()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(self.ast.push(location, Expr::Print(value)))
            }
            // `if` as a statement takes no trailing semicolon.
            TokenKind::If => self.parse_if(),
            TokenKind::While => {
                let location = self.expect(TokenKind::While)?;
                let cond = self.parse_expression()?;
                let body = self.parse_block()?;
                Ok(self.ast.push(location, Expr::While { cond, body }))
            }
            TokenKind::For => {
                let location = self.expect(TokenKind::For)?;
                let init = self.parse_expression()?;
                self.expect(TokenKind::Semicolon)?;
                let cond = self.parse_expression()?;
                self.expect(TokenKind::Semicolon)?;
                // The post expression is followed directly by the block.
                let post = self.parse_expression()?;
                let body = self.parse_block()?;
                Ok(self.ast.push(location, Expr::For { init, cond, post, body }))
            }
            TokenKind::Return => {
                let location = self.expect(TokenKind::Return)?;
                let value = if self.at(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.expect(TokenKind::Semicolon)?;
                Ok(self.ast.push(location, Expr::Return(value)))
            }
            _ => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(expr)
            }
        }
    }

    // ---- expressions, lowest precedence first ----

    /// Level 6: assignment, right-associative.
    fn parse_expression(&mut self) -> Result<NodeId, Exception> {
        let left = self.parse_comparison()?;
        if self.at(TokenKind::Assign) {
            let location = self.current().location;
            self.advance();
            let value = self.parse_expression()?;
            return Ok(self.ast.push(location, Expr::Assign { target: left, value }));
        }
        Ok(left)
    }

    /// Level 5: `<` and `>`.
    fn parse_comparison(&mut self) -> Result<NodeId, Exception> {
        let mut left = self.parse_equality()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Less => BinOp::Less,
                TokenKind::Greater => BinOp::Greater,
                _ => break,
            };
            let location = self.current().location;
            self.advance();
            let right = self.parse_equality()?;
            left = self.ast.push(location, Expr::BinOp { op, left, right });
        }
        Ok(left)
    }

    /// Level 4: `==`, `!=`, `<=`, `>=`, grouped together.
    fn parse_equality(&mut self) -> Result<NodeId, Exception> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Eq => BinOp::Eq,
                TokenKind::NotEq => BinOp::NotEq,
                TokenKind::LessEq => BinOp::LessEq,
                TokenKind::GreaterEq => BinOp::GreaterEq,
                _ => break,
            };
            let location = self.current().location;
            self.advance();
            let right = self.parse_additive()?;
            left = self.ast.push(location, Expr::BinOp { op, left, right });
        }
        Ok(left)
    }

    /// Level 3: `+` and `-`, recursing on the same level for the right
    /// operand (right-leaning trees).
    fn parse_additive(&mut self) -> Result<NodeId, Exception> {
        let left = self.parse_multiplicative()?;
        let op = match self.current().kind {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            _ => return Ok(left),
        };
        let location = self.current().location;
        self.advance();
        let right = self.parse_additive()?;
        Ok(self.ast.push(location, Expr::BinOp { op, left, right }))
    }

    /// Level 2: `*` and `/`, same right recursion as level 3.
    fn parse_multiplicative(&mut self) -> Result<NodeId, Exception> {
        let left = self.parse_unary()?;
        let op = match self.current().kind {
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            _ => return Ok(left),
        };
        let location = self.current().location;
        self.advance();
        let right = self.parse_multiplicative()?;
        Ok(self.ast.push(location, Expr::BinOp { op, left, right }))
    }

    /// Level 1: prefix `+`, `-`, `!`.
    fn parse_unary(&mut self) -> Result<NodeId, Exception> {
        let op = match self.current().kind {
            TokenKind::Minus => UnOp::Neg,
            TokenKind::Plus => UnOp::Plus,
            TokenKind::Not => UnOp::Not,
            _ => return self.parse_postfix(),
        };
        let location = self.current().location;
        self.advance();
        let operand = self.parse_postfix()?;
        Ok(self.ast.push(location, Expr::UnOp { op, operand }))
    }

    /// Level 0: an atom followed by any chain of calls, indexings, and
    /// member accesses. Each application wraps the previous expression, so
    /// `a.b[c](d)` parses to `Call(Index(Member(a, b), c), [d])`.
    fn parse_postfix(&mut self) -> Result<NodeId, Exception> {
        let mut left = self.parse_atom()?;
        loop {
            match self.current().kind {
                TokenKind::LParen => {
                    let location = self.current().location;
                    self.advance();
                    let args = self.parse_call_args()?;
                    left = self.ast.push(location, Expr::Call { callee: left, args });
                }
                TokenKind::LBracket => {
                    let location = self.current().location;
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket)?;
                    left = self.ast.push(location, Expr::Index { array: left, index });
                }
                TokenKind::Dot => {
                    self.advance();
                    let (name, location) = self.expect_ident()?;
                    left = self.ast.push(location, Expr::Member { object: left, name });
                }
                _ => break,
            }
        }
        Ok(left)
    }

    /// Comma-separated arguments up to `)`, optional trailing comma.
    fn parse_call_args(&mut self) -> Result<Vec<NodeId>, Exception> {
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if self.at(TokenKind::Comma) {
                    self.advance();
                    if self.at(TokenKind::RParen) {
                        break;
                    }
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_atom(&mut self) -> Result<NodeId, Exception> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                Ok(self.ast.push(token.location, Expr::Number(token.number)))
            }
            TokenKind::Str => {
                self.advance();
                Ok(self.ast.push(token.location, Expr::Str(token.text)))
            }
            TokenKind::Ident => {
                self.advance();
                Ok(self.ast.push(token.location, Expr::Ident(token.text)))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBrace => self.parse_table_maker(),
            TokenKind::Array => self.parse_array_maker(),
            TokenKind::If => self.parse_if(),
            TokenKind::Fn => self.parse_fn_literal(),
            other => Err(Exception::parse(
                token.location,
                format!("unexpected {other} in expression"),
            )),
        }
    }

    /// `{ identifier = expr; ... }` — each member requires its trailing
    /// semicolon; a duplicate member name overwrites the earlier entry.
    fn parse_table_maker(&mut self) -> Result<NodeId, Exception> {
        let location = self.expect(TokenKind::LBrace)?;
        let mut members: Vec<(String, NodeId)> = Vec::new();
        while !self.at(TokenKind::RBrace) {
            if !self.at(TokenKind::Ident) {
                return Err(Exception::parse(
                    self.current().location,
                    format!(
                        "expected an identifier for a table member, found {}",
                        self.current().kind
                    ),
                ));
            }
            let (name, _) = self.expect_ident()?;
            self.expect(TokenKind::Assign)?;
            let value = self.parse_expression()?;
            self.expect(TokenKind::Semicolon)?;
            match members.iter_mut().find(|(existing, _)| *existing == name) {
                Some(entry) => entry.1 = value,
                None => members.push((name, value)),
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(self.ast.push(location, Expr::TableMaker { members }))
    }

    /// `array{ expr, ... }` with optional trailing comma.
    fn parse_array_maker(&mut self) -> Result<NodeId, Exception> {
        let location = self.expect(TokenKind::Array)?;
        self.expect(TokenKind::LBrace)?;
        let mut elements = Vec::new();
        if !self.at(TokenKind::RBrace) {
            loop {
                elements.push(self.parse_expression()?);
                if self.at(TokenKind::Comma) {
                    self.advance();
                    if self.at(TokenKind::RBrace) {
                        break;
                    }
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(self.ast.push(location, Expr::ArrayMaker { elements }))
    }

    /// `if expr block (else block)?` — identical as statement and as
    /// expression atom.
    fn parse_if(&mut self) -> Result<NodeId, Exception> {
        let location = self.expect(TokenKind::If)?;
        let cond = self.parse_expression()?;
        let then = self.parse_block()?;
        let or_else = if self.at(TokenKind::Else) {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(self.ast.push(location, Expr::If { cond, then, or_else }))
    }

    /// `fn ( params? ) block` — registered in the function table at the
    /// `fn` token, so ids run outer-first.
    fn parse_fn_literal(&mut self) -> Result<NodeId, Exception> {
        let location = self.expect(TokenKind::Fn)?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if self.at(TokenKind::Ident) {
            loop {
                let (name, _) = self.expect_ident()?;
                params.push(name);
                if self.at(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        let fn_id = self.ast.declare_function(params);
        let body = self.parse_block()?;
        self.ast.set_function_body(fn_id, body);
        // The activation scope substitutes for the block scope.
        if let Expr::StatementList { own_scope, .. } = &mut self.ast.get_mut(body).expr {
            *own_scope = false;
        }
        Ok(self.ast.push(location, Expr::FnDecl(fn_id)))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{error::ErrorKind, lex::tokenize};

    fn parse_code(code: &str) -> Ast {
        parse(&tokenize(code).unwrap()).unwrap()
    }

    fn parse_err(code: &str) -> Exception {
        parse(&tokenize(code).unwrap()).unwrap_err()
    }

    /// Finds the single node matching the predicate.
    fn find_node<'a>(ast: &'a Ast, pred: impl Fn(&Expr) -> bool) -> &'a Expr {
        let mut matches = ast.nodes().iter().filter(|n| pred(&n.expr)).map(|n| &n.expr);
        let found = matches.next().expect("no matching node");
        assert!(matches.next().is_none(), "more than one matching node");
        found
    }

    #[test]
    fn postfix_chain_wraps_left_to_right() {
        let ast = parse_code("a.b[c](d);");
        // Outermost postfix application is the call.
        let Expr::Call { callee, args } = find_node(&ast, |e| matches!(e, Expr::Call { .. })) else {
            unreachable!()
        };
        assert_eq!(args.len(), 1);
        let Expr::Index { array, .. } = &ast.get(*callee).expr else {
            panic!("callee should be an indexing");
        };
        let Expr::Member { object, name } = &ast.get(*array).expr else {
            panic!("indexed expression should be a member access");
        };
        assert_eq!(name, "b");
        assert_eq!(ast.get(*object).expr, Expr::Ident("a".to_owned()));
    }

    #[test]
    fn additive_level_is_right_leaning() {
        let ast = parse_code("x = 1 - 2 - 3;");
        let Expr::Assign { value, .. } = find_node(&ast, |e| matches!(e, Expr::Assign { .. })) else {
            unreachable!()
        };
        // 1 - (2 - 3)
        let Expr::BinOp { op: BinOp::Sub, left, right } = &ast.get(*value).expr else {
            panic!("expected subtraction at the top");
        };
        assert_eq!(ast.get(*left).expr, Expr::Number(1.0));
        assert!(matches!(
            &ast.get(*right).expr,
            Expr::BinOp { op: BinOp::Sub, .. }
        ));
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let ast = parse_code("print 1 + 2 * 3;");
        let Expr::BinOp { op: BinOp::Add, left, right } =
            find_node(&ast, |e| matches!(e, Expr::BinOp { op: BinOp::Add, .. }))
        else {
            unreachable!()
        };
        assert_eq!(ast.get(*left).expr, Expr::Number(1.0));
        assert!(matches!(
            &ast.get(*right).expr,
            Expr::BinOp { op: BinOp::Mul, .. }
        ));
    }

    #[test]
    fn function_ids_run_outer_first() {
        let ast = parse_code("f = fn(a) { g = fn() { return 1; }; }; h = fn() {};");
        assert_eq!(ast.function_count(), 3);
        // First registered literal is the outer `fn(a)`.
        let outer = ast.function(crate::function::FnId::from_raw(0)).unwrap();
        assert_eq!(outer.params, vec!["a".to_owned()]);
        let inner = ast.function(crate::function::FnId::from_raw(1)).unwrap();
        assert!(inner.params.is_empty());
    }

    #[test]
    fn function_body_scope_is_disabled() {
        let ast = parse_code("f = fn() { 1; };");
        let function = ast.function(crate::function::FnId::from_raw(0)).unwrap();
        let Expr::StatementList { own_scope, .. } = &ast.get(function.body).expr else {
            panic!("function body should be a statement list");
        };
        assert!(!own_scope);
    }

    #[test]
    fn program_root_has_no_own_scope() {
        let ast = parse_code("x = 1;");
        let Expr::StatementList { own_scope, .. } = &ast.get(ast.root()).expr else {
            panic!("root should be a statement list");
        };
        assert!(!own_scope);
    }

    #[test]
    fn if_is_valid_in_both_positions() {
        // Statement position: no semicolon. Expression position: atom.
        parse_code("if 1 { x = 2; }");
        parse_code("y = if 1 { 2; } else { 3; };");
    }

    #[test]
    fn for_post_expression_is_not_terminated() {
        let ast = parse_code("for i = 0; i < 3; i = i + 1 { print i; }");
        assert!(matches!(
            find_node(&ast, |e| matches!(e, Expr::For { .. })),
            Expr::For { .. }
        ));
    }

    #[test]
    fn table_maker_members_keep_source_order() {
        let ast = parse_code("t = { x = 1; y = 2; x = 3; };");
        let Expr::TableMaker { members } = find_node(&ast, |e| matches!(e, Expr::TableMaker { .. }))
        else {
            unreachable!()
        };
        let names: Vec<&str> = members.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["x", "y"]);
        // The duplicate overwrote the first entry's initializer.
        let Expr::Number(n) = &ast.get(members[0].1).expr else {
            panic!("expected a number initializer");
        };
        assert_eq!(*n, 3.0);
    }

    #[test]
    fn missing_semicolon_reports_the_offending_token() {
        let err = parse_err("print 1\nx = 2;");
        assert_eq!(err.kind, ErrorKind::Parse);
        assert_eq!(err.location.line, 2);
    }

    #[test]
    fn stray_closing_brace_is_rejected() {
        let err = parse_err("x = 1; }");
        assert_eq!(err.kind, ErrorKind::Parse);
    }

    #[test]
    fn else_requires_a_block() {
        let err = parse_err("if 1 { 1; } else print 2;");
        assert_eq!(err.kind, ErrorKind::Parse);
    }

    #[test]
    fn table_member_requires_identifier() {
        let err = parse_err("t = { 1 = 2; };");
        assert_eq!(err.kind, ErrorKind::Parse);
    }

    /// Lexing the token stream's own rendering reproduces a structurally
    /// identical AST.
    #[test]
    fn render_and_reparse_round_trips() {
        let code = "g = array{ 1, 2 }; f = fn(n) { if n <= 1 { return 1; } return n * f(n - 1); }; print f(5);";
        let tokens = tokenize(code).unwrap();
        let rendered: Vec<String> = tokens.iter().map(ToString::to_string).collect();
        let reparsed = parse(&tokenize(&rendered.join(" ")).unwrap()).unwrap();
        let original = parse(&tokens).unwrap();
        assert_eq!(original.nodes().len(), reparsed.nodes().len());
        for (a, b) in original.nodes().iter().zip(reparsed.nodes()) {
            assert_eq!(a.expr, b.expr);
        }
    }
}
