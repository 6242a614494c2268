//! Parser for the Basil Scripting Language
//!
//! This module implements a recursive descent parser with operator precedence
//! climbing to convert a stream of tokens into an Abstract Syntax Tree.
//!
//! ## Grammar
//!
//! ```text
//! statements := NEWLINE* statement ( NEWLINE+ statement )*
//! statement  := 'RETURN' expression?
//!             | 'CONTINUE' | 'BREAK'
//!             | expression
//! expression := 'VAR' IDENT '=' expression
//!             | comparison ( ('AND'|'OR') comparison )*
//! comparison := 'NOT' comparison
//!             | arithmetic ( ('=='|'!='|'<'|'>'|'<='|'>=') arithmetic )*
//! arithmetic := term ( ('+'|'-') term )*
//! term       := power ( ('*'|'/') power )*
//! power      := factor ( '^' power )*          ; right-associative
//! factor     := ('+'|'-') factor | call
//! call       := atom ( '(' arglist? ')' )?
//! atom       := INT | FLOAT | STRING | IDENT
//!             | '(' expression ')'
//!             | list_expr
//!             | if_expr | for_expr | while_expr | func_def
//! ```
//!
//! Unary `+`/`-` sit between `^` and `call`, so a sign binds tighter than a
//! power on its left operand (`-2 ^ 2` is `(-2) ^ 2`) while `^` itself stays
//! right-associative (`2 ^ 3 ^ 2` is `2 ^ (3 ^ 2)`).
//!
//! ## Speculative parsing
//!
//! `statements` keeps accepting statements as long as it can; each attempt
//! runs against a saved token index that is restored when the attempt fails.
//! This is how block bodies know to stop in front of `END`/`ELIF`/`ELSE`
//! without those keywords appearing in the statement grammar. The same
//! checkpoint trick lets `RETURN` take an optional expression.
//!
//! ## Block vs one-line forms
//!
//! `IF`, `FOR`, `WHILE` and `FUN` each have two shapes. A newline directly
//! after `THEN` (or after a `FUN` parameter list) opens a nested statement
//! block terminated by `END`; block bodies evaluate to `null`. Otherwise the
//! body is a single inline statement or expression whose value is the value
//! of the whole form.

use crate::ast::{BinaryOp, ElseCase, IfCase, Node, UnaryOp};
use crate::error::SyntaxError;
use crate::token::{Keyword, Position, Token, TokenKind};
use crate::value::Number;
use std::rc::Rc;

type ParseResult<T> = Result<T, SyntaxError>;

/// Recursive descent parser over the lexer's token stream.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    /// Creates a parser for a token stream; the stream must be terminated by
    /// an `Eof` token, which `Lexer::make_tokens` guarantees.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    /// Parses the complete token stream into the program's root node.
    ///
    /// # Returns
    /// * `Ok(Node)` - a `List` node holding the top-level statements
    /// * `Err(SyntaxError)` - the first syntax error encountered
    pub fn parse(mut self) -> ParseResult<Node> {
        let node = self.statements()?;

        if self.current_tok().kind != TokenKind::Eof {
            return Err(self.error_here("Expected operator token"));
        }

        Ok(node)
    }

    /// Parses a newline-separated statement list into a `List` node.
    ///
    /// After each statement, at least one `NEWLINE` is required before the
    /// next one. Further statements are consumed speculatively: when an
    /// attempt fails the token index is rewound and the list ends, leaving
    /// the offending token (typically `END`, `ELIF` or `ELSE`) for the
    /// caller.
    fn statements(&mut self) -> ParseResult<Node> {
        let pos_start = self.current_tok().pos_start.clone();
        let mut statements = Vec::new();

        self.skip_newlines();
        statements.push(self.statement()?);

        loop {
            let mut newline_count = 0;
            while self.current_tok().kind == TokenKind::Newline {
                self.advance();
                newline_count += 1;
            }
            if newline_count == 0 {
                break;
            }

            let checkpoint = self.current;
            match self.statement() {
                Ok(statement) => statements.push(statement),
                Err(_) => {
                    self.current = checkpoint;
                    break;
                }
            }
        }

        let pos_end = self.current_tok().pos_end.clone();
        Ok(Node::List {
            elements: statements,
            pos_start,
            pos_end,
        })
    }

    /// Parses one statement: `RETURN expr?`, `CONTINUE`, `BREAK`, or an
    /// expression.
    fn statement(&mut self) -> ParseResult<Node> {
        let tok = self.current_tok().clone();

        if tok.is_keyword(Keyword::Return) {
            self.advance();

            // The return value is optional; rewind if no expression follows.
            let checkpoint = self.current;
            let value = match self.expression() {
                Ok(expr) => Some(Box::new(expr)),
                Err(_) => {
                    self.current = checkpoint;
                    None
                }
            };

            let pos_end = match &value {
                Some(expr) => expr.pos_end().clone(),
                None => tok.pos_end.clone(),
            };
            return Ok(Node::Return {
                value,
                pos_start: tok.pos_start,
                pos_end,
            });
        }

        if tok.is_keyword(Keyword::Continue) {
            self.advance();
            return Ok(Node::Continue {
                pos_start: tok.pos_start,
                pos_end: tok.pos_end,
            });
        }

        if tok.is_keyword(Keyword::Break) {
            self.advance();
            return Ok(Node::Break {
                pos_start: tok.pos_start,
                pos_end: tok.pos_end,
            });
        }

        self.expression()
    }

    /// Parses an expression: a `VAR` binding or an `AND`/`OR` chain.
    fn expression(&mut self) -> ParseResult<Node> {
        if self.current_tok().is_keyword(Keyword::Var) {
            let pos_start = self.current_tok().pos_start.clone();
            self.advance();

            let name = match &self.current_tok().kind {
                TokenKind::Identifier(name) => name.clone(),
                _ => return Err(self.error_here("Identifier expected")),
            };
            self.advance();

            if self.current_tok().kind != TokenKind::Eq {
                return Err(self.error_here("'=' expected"));
            }
            self.advance();

            let value = self.expression()?;
            let pos_end = value.pos_end().clone();
            return Ok(Node::VarAssign {
                name,
                value: Box::new(value),
                pos_start,
                pos_end,
            });
        }

        self.bin_op(Self::comparison_expression, logic_op, Self::comparison_expression)
    }

    /// Parses `NOT comparison` or a comparison-operator chain.
    fn comparison_expression(&mut self) -> ParseResult<Node> {
        if self.current_tok().is_keyword(Keyword::Not) {
            let pos_start = self.current_tok().pos_start.clone();
            self.advance();

            let operand = self.comparison_expression()?;
            let pos_end = operand.pos_end().clone();
            return Ok(Node::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                pos_start,
                pos_end,
            });
        }

        self.bin_op(
            Self::arithmetic_expression,
            comparison_op,
            Self::arithmetic_expression,
        )
    }

    fn arithmetic_expression(&mut self) -> ParseResult<Node> {
        self.bin_op(Self::term, arithmetic_op, Self::term)
    }

    fn term(&mut self) -> ParseResult<Node> {
        self.bin_op(Self::power, term_op, Self::power)
    }

    /// `^` is right-associative: the right production re-enters `power`.
    fn power(&mut self) -> ParseResult<Node> {
        self.bin_op(Self::factor, pow_op, Self::power)
    }

    /// Parses prefix `+`/`-`, which bind tighter than `^` on the left.
    fn factor(&mut self) -> ParseResult<Node> {
        let tok = self.current_tok().clone();

        let op = match tok.kind {
            TokenKind::Plus => Some(UnaryOp::Pos),
            TokenKind::Minus => Some(UnaryOp::Neg),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let operand = self.factor()?;
            let pos_end = operand.pos_end().clone();
            return Ok(Node::Unary {
                op,
                operand: Box::new(operand),
                pos_start: tok.pos_start,
                pos_end,
            });
        }

        self.call()
    }

    /// Parses an atom followed by an optional argument list.
    fn call(&mut self) -> ParseResult<Node> {
        let atom = self.atom()?;

        if self.current_tok().kind != TokenKind::LParen {
            return Ok(atom);
        }
        self.advance(); // consume '('

        let mut args = Vec::new();
        if self.current_tok().kind != TokenKind::RParen {
            args.push(self.expression()?);
            while self.current_tok().kind == TokenKind::Comma {
                self.advance();
                args.push(self.expression()?);
            }
            if self.current_tok().kind != TokenKind::RParen {
                return Err(self.error_here("Expected ',' or ')'"));
            }
        }
        let pos_end = self.current_tok().pos_end.clone();
        self.advance(); // consume ')'

        let pos_start = atom.pos_start().clone();
        Ok(Node::Call {
            callee: Box::new(atom),
            args,
            pos_start,
            pos_end,
        })
    }

    fn atom(&mut self) -> ParseResult<Node> {
        let tok = self.current_tok().clone();

        match tok.kind {
            TokenKind::Int(value) => {
                self.advance();
                Ok(Node::Number {
                    value: Number::Int(value),
                    pos_start: tok.pos_start,
                    pos_end: tok.pos_end,
                })
            }
            TokenKind::Float(value) => {
                self.advance();
                Ok(Node::Number {
                    value: Number::Float(value),
                    pos_start: tok.pos_start,
                    pos_end: tok.pos_end,
                })
            }
            TokenKind::Str(value) => {
                self.advance();
                Ok(Node::Str {
                    value,
                    pos_start: tok.pos_start,
                    pos_end: tok.pos_end,
                })
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Node::VarAccess {
                    name,
                    pos_start: tok.pos_start,
                    pos_end: tok.pos_end,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expression = self.expression()?;
                if self.current_tok().kind != TokenKind::RParen {
                    return Err(self.error_here("Expected ')'"));
                }
                self.advance();
                Ok(expression)
            }
            TokenKind::LSquare => self.list_expression(),
            TokenKind::Keyword(Keyword::If) => self.if_expression(),
            TokenKind::Keyword(Keyword::For) => self.for_expression(),
            TokenKind::Keyword(Keyword::While) => self.while_expression(),
            TokenKind::Keyword(Keyword::Fun) => self.function_definition(),
            _ => Err(self.error_here(
                "Expected int, float, identifier, '+', '-', '(', '[', 'IF', 'FOR', 'WHILE' or 'FUN'",
            )),
        }
    }

    /// Parses a list literal: `[a, b, c]` (possibly empty).
    fn list_expression(&mut self) -> ParseResult<Node> {
        let pos_start = self.current_tok().pos_start.clone();
        self.advance(); // consume '['

        let mut elements = Vec::new();
        if self.current_tok().kind != TokenKind::RSquare {
            elements.push(self.expression()?);
            while self.current_tok().kind == TokenKind::Comma {
                self.advance();
                elements.push(self.expression()?);
            }
            if self.current_tok().kind != TokenKind::RSquare {
                return Err(self.error_here("Expected ',' or ']'"));
            }
        }
        let pos_end = self.current_tok().pos_end.clone();
        self.advance(); // consume ']'

        Ok(Node::List {
            elements,
            pos_start,
            pos_end,
        })
    }

    /// Parses a full `IF`/`ELIF`/`ELSE` chain.
    fn if_expression(&mut self) -> ParseResult<Node> {
        let pos_start = self.current_tok().pos_start.clone();
        let (cases, else_case) = self.parse_if_cases(Keyword::If)?;

        let pos_end = match &else_case {
            Some(else_case) => else_case.body.pos_end().clone(),
            None => cases
                .last()
                .map(|case| case.body.pos_end().clone())
                .unwrap_or_else(|| pos_start.clone()),
        };

        Ok(Node::If {
            cases,
            else_case: else_case.map(Box::new),
            pos_start,
            pos_end,
        })
    }

    /// Parses one `IF` or `ELIF` arm and whatever chain follows it.
    ///
    /// In block form a single `END` closes the whole chain, consumed by
    /// whichever arm comes last; one-line arms flow straight into the next
    /// `ELIF`/`ELSE` without a terminator.
    fn parse_if_cases(
        &mut self,
        keyword: Keyword,
    ) -> ParseResult<(Vec<IfCase>, Option<ElseCase>)> {
        let mut cases = Vec::new();

        self.expect_keyword(keyword)?;
        let condition = self.expression()?;
        self.expect_keyword(Keyword::Then)?;

        if self.current_tok().kind == TokenKind::Newline {
            self.advance();
            let body = self.statements()?;
            cases.push(IfCase {
                condition,
                body,
                returns_unit: true,
            });

            if self.current_tok().is_keyword(Keyword::End) {
                self.advance();
                return Ok((cases, None));
            }

            if !self.current_tok().is_keyword(Keyword::Elif)
                && !self.current_tok().is_keyword(Keyword::Else)
            {
                return Err(self.error_here("Expected 'END'"));
            }

            let (more_cases, else_case) = self.elif_or_else()?;
            cases.extend(more_cases);
            Ok((cases, else_case))
        } else {
            let body = self.statement()?;
            cases.push(IfCase {
                condition,
                body,
                returns_unit: false,
            });

            let (more_cases, else_case) = self.elif_or_else()?;
            cases.extend(more_cases);
            Ok((cases, else_case))
        }
    }

    fn elif_or_else(&mut self) -> ParseResult<(Vec<IfCase>, Option<ElseCase>)> {
        if self.current_tok().is_keyword(Keyword::Elif) {
            return self.parse_if_cases(Keyword::Elif);
        }
        Ok((Vec::new(), self.else_case()?))
    }

    /// Parses an optional trailing `ELSE`; the block form requires `END`.
    fn else_case(&mut self) -> ParseResult<Option<ElseCase>> {
        if !self.current_tok().is_keyword(Keyword::Else) {
            return Ok(None);
        }
        self.advance(); // consume 'ELSE'

        if self.current_tok().kind == TokenKind::Newline {
            self.advance();
            let body = self.statements()?;
            self.expect_keyword(Keyword::End)?;
            Ok(Some(ElseCase {
                body,
                returns_unit: true,
            }))
        } else {
            let body = self.statement()?;
            Ok(Some(ElseCase {
                body,
                returns_unit: false,
            }))
        }
    }

    /// Parses `FOR var = start TO end [STEP step] THEN body`.
    fn for_expression(&mut self) -> ParseResult<Node> {
        let pos_start = self.current_tok().pos_start.clone();
        self.expect_keyword(Keyword::For)?;

        let var_name = match &self.current_tok().kind {
            TokenKind::Identifier(name) => name.clone(),
            _ => return Err(self.error_here("Expected identifier")),
        };
        self.advance();

        if self.current_tok().kind != TokenKind::Eq {
            return Err(self.error_here("Expected '='"));
        }
        self.advance();

        let start = self.expression()?;
        self.expect_keyword(Keyword::To)?;
        let end = self.expression()?;

        let step = if self.current_tok().is_keyword(Keyword::Step) {
            self.advance();
            Some(Box::new(self.expression()?))
        } else {
            None
        };

        self.expect_keyword(Keyword::Then)?;

        if self.current_tok().kind == TokenKind::Newline {
            self.advance();
            let body = self.statements()?;
            self.expect_keyword(Keyword::End)?;
            let pos_end = self.previous_end();
            return Ok(Node::For {
                var_name,
                start: Box::new(start),
                end: Box::new(end),
                step,
                body: Box::new(body),
                returns_unit: true,
                pos_start,
                pos_end,
            });
        }

        let body = self.expression()?;
        let pos_end = body.pos_end().clone();
        Ok(Node::For {
            var_name,
            start: Box::new(start),
            end: Box::new(end),
            step,
            body: Box::new(body),
            returns_unit: false,
            pos_start,
            pos_end,
        })
    }

    /// Parses `WHILE condition THEN body`.
    fn while_expression(&mut self) -> ParseResult<Node> {
        let pos_start = self.current_tok().pos_start.clone();
        self.expect_keyword(Keyword::While)?;

        let condition = self.expression()?;
        self.expect_keyword(Keyword::Then)?;

        if self.current_tok().kind == TokenKind::Newline {
            self.advance();
            let body = self.statements()?;
            self.expect_keyword(Keyword::End)?;
            let pos_end = self.previous_end();
            return Ok(Node::While {
                condition: Box::new(condition),
                body: Box::new(body),
                returns_unit: true,
                pos_start,
                pos_end,
            });
        }

        let body = self.statement()?;
        let pos_end = body.pos_end().clone();
        Ok(Node::While {
            condition: Box::new(condition),
            body: Box::new(body),
            returns_unit: false,
            pos_start,
            pos_end,
        })
    }

    /// Parses a function definition, named or anonymous, in either the
    /// one-line `->` form or the block form closed by `END`.
    fn function_definition(&mut self) -> ParseResult<Node> {
        let pos_start = self.current_tok().pos_start.clone();
        self.expect_keyword(Keyword::Fun)?;

        let name = match &self.current_tok().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                if self.current_tok().kind != TokenKind::LParen {
                    return Err(self.error_here("Expected '('"));
                }
                Some(name)
            }
            _ => {
                if self.current_tok().kind != TokenKind::LParen {
                    return Err(self.error_here("Expected identifier or '('"));
                }
                None
            }
        };
        self.advance(); // consume '('

        let mut params = Vec::new();
        if let TokenKind::Identifier(param) = &self.current_tok().kind {
            params.push(param.clone());
            self.advance();

            while self.current_tok().kind == TokenKind::Comma {
                self.advance();
                match &self.current_tok().kind {
                    TokenKind::Identifier(param) => {
                        params.push(param.clone());
                        self.advance();
                    }
                    _ => return Err(self.error_here("Expected identifier")),
                }
            }
            if self.current_tok().kind != TokenKind::RParen {
                return Err(self.error_here("Expected ',' or ')'"));
            }
        } else if self.current_tok().kind != TokenKind::RParen {
            return Err(self.error_here("Expected identifier or ')'"));
        }
        self.advance(); // consume ')'

        if self.current_tok().kind == TokenKind::Arrow {
            self.advance();
            let body = self.expression()?;
            let pos_end = body.pos_end().clone();
            return Ok(Node::FunctionDef {
                name,
                params,
                body: Rc::new(body),
                auto_return: true,
                pos_start,
                pos_end,
            });
        }

        if self.current_tok().kind != TokenKind::Newline {
            return Err(self.error_here("Expected '->' or new line"));
        }
        self.advance();

        let body = self.statements()?;
        self.expect_keyword(Keyword::End)?;
        let pos_end = self.previous_end();

        Ok(Node::FunctionDef {
            name,
            params,
            body: Rc::new(body),
            auto_return: false,
            pos_start,
            pos_end,
        })
    }

    /// Builds a left-associative operator chain.
    ///
    /// Parses `func_left`, then as long as `ops` recognises the current token
    /// keeps consuming the operator and a `func_right` operand. Passing a
    /// right production that re-enters the same level turns the chain
    /// right-associative, which is how `^` is handled.
    fn bin_op(
        &mut self,
        func_left: fn(&mut Self) -> ParseResult<Node>,
        ops: fn(&TokenKind) -> Option<BinaryOp>,
        func_right: fn(&mut Self) -> ParseResult<Node>,
    ) -> ParseResult<Node> {
        let mut node = func_left(self)?;

        while let Some(op) = ops(&self.current_tok().kind) {
            self.advance();
            let rhs = func_right(self)?;
            let pos_start = node.pos_start().clone();
            let pos_end = rhs.pos_end().clone();
            node = Node::Binary {
                op,
                lhs: Box::new(node),
                rhs: Box::new(rhs),
                pos_start,
                pos_end,
            };
        }

        Ok(node)
    }

    fn current_tok(&self) -> &Token {
        // The stream is Eof-terminated, so the index never runs off the end.
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.current < self.tokens.len() - 1 {
            self.current += 1;
        }
    }

    fn skip_newlines(&mut self) {
        while self.current_tok().kind == TokenKind::Newline {
            self.advance();
        }
    }

    /// End position of the most recently consumed token.
    fn previous_end(&self) -> Position {
        self.tokens[self.current.saturating_sub(1)].pos_end.clone()
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> ParseResult<()> {
        if !self.current_tok().is_keyword(keyword) {
            return Err(self.error_here(format!("Expected '{}'", keyword)));
        }
        self.advance();
        Ok(())
    }

    fn error_here(&self, details: impl Into<String>) -> SyntaxError {
        let tok = self.current_tok();
        SyntaxError::new(tok.pos_start.clone(), tok.pos_end.clone(), details.into())
    }
}

fn logic_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Keyword(Keyword::And) => Some(BinaryOp::And),
        TokenKind::Keyword(Keyword::Or) => Some(BinaryOp::Or),
        _ => None,
    }
}

fn comparison_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Ee => Some(BinaryOp::Eq),
        TokenKind::Ne => Some(BinaryOp::Ne),
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::Lte => Some(BinaryOp::Lte),
        TokenKind::Gte => Some(BinaryOp::Gte),
        _ => None,
    }
}

fn arithmetic_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        _ => None,
    }
}

fn term_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Mul => Some(BinaryOp::Mul),
        TokenKind::Div => Some(BinaryOp::Div),
        _ => None,
    }
}

fn pow_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Pow => Some(BinaryOp::Pow),
        _ => None,
    }
}
