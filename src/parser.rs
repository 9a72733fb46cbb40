use crate::{
    ast::*,
    error::CompileError,
    scanner::{Scanner, Token, TokenType},
};

/// Parse a whole program. All syntax errors are collected; any error
/// suppresses the resulting AST.
pub fn parse(source: &str) -> Result<Program, Vec<CompileError>> {
    let mut parser = Parser::new(source);
    parser.advance();
    let mut body = Vec::new();
    parser.skip_newlines();
    while !parser.check(TokenType::Eof) {
        if let Some(stmt) = parser.declaration() {
            body.push(stmt);
        }
        parser.skip_newlines();
    }
    if parser.errors.is_empty() {
        Ok(Program { body })
    } else {
        Err(parser.errors)
    }
}

struct Parser<'a> {
    scanner: Scanner<'a>,
    current: Token<'a>,
    previous: Token<'a>,
    errors: Vec<CompileError>,
    panic_mode: bool,
}

impl<'a> Parser<'a> {
    fn new(code: &'a str) -> Parser<'a> {
        let placeholder = Token {
            kind: TokenType::Eof,
            lexeme: "",
            line: 1,
        };
        Parser {
            scanner: Scanner::new(code),
            current: placeholder,
            previous: placeholder,
            errors: Vec::new(),
            panic_mode: false,
        }
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let stmt = if self.matches(TokenType::Ao) {
            self.var_declaration()
        } else if self.matches(TokenType::Kian) {
            if self.check(TokenType::Identifier) || self.check(TokenType::Async) {
                self.fun_declaration()
            } else {
                // An anonymous function in statement position.
                let expr = self.function_expression(false);
                let line = expr.line();
                self.end_of_statement();
                Some(Stmt::Expression { expr, line })
            }
        } else if self.matches(TokenType::Klum) {
            self.class_declaration()
        } else {
            self.statement()
        };

        if self.panic_mode {
            self.synchronize();
        }
        stmt
    }

    fn statement(&mut self) -> Option<Stmt> {
        if self.matches(TokenType::Da) {
            self.print_statement()
        } else if self.matches(TokenType::Tha) {
            self.if_statement()
        } else if self.matches(TokenType::Wonn) {
            self.while_statement()
        } else if self.matches(TokenType::Samrap) {
            self.for_statement()
        } else if self.matches(TokenType::Cheek) {
            self.switch_statement()
        } else if self.matches(TokenType::Kuun) {
            self.return_statement()
        } else if self.matches(TokenType::Yut) {
            let line = self.previous.line;
            self.end_of_statement();
            Some(Stmt::Break { line })
        } else if self.matches(TokenType::Tor) {
            let line = self.previous.line;
            self.end_of_statement();
            Some(Stmt::Continue { line })
        } else if self.matches(TokenType::Long) {
            self.try_statement()
        } else {
            self.expression_statement()
        }
    }

    fn var_declaration(&mut self) -> Option<Stmt> {
        self.consume(TokenType::Identifier, "Expect variable name.");
        let name = self.previous.lexeme.to_owned();
        let line = self.previous.line;
        let initializer = if self.matches(TokenType::Equal) {
            Some(self.expression())
        } else {
            None
        };
        self.end_of_statement();
        Some(Stmt::Var {
            name,
            initializer,
            line,
        })
    }

    fn fun_declaration(&mut self) -> Option<Stmt> {
        let is_async = self.matches(TokenType::Async);
        self.consume(TokenType::Identifier, "Expect function name.");
        let name = self.previous.lexeme.to_owned();
        let line = self.previous.line;
        let (params, body) = self.function_rest();
        Some(Stmt::Function(FunctionDecl {
            name,
            params,
            body,
            is_async,
            line,
        }))
    }

    fn class_declaration(&mut self) -> Option<Stmt> {
        self.consume(TokenType::Identifier, "Expect class name.");
        let name = self.previous.lexeme.to_owned();
        let line = self.previous.line;
        self.expect_newline();

        let mut properties = Vec::new();
        let mut methods = Vec::new();
        self.skip_newlines();
        loop {
            if self.matches(TokenType::Kian) {
                let is_async = self.matches(TokenType::Async);
                self.consume(TokenType::Identifier, "Expect method name.");
                let method_name = self.previous.lexeme.to_owned();
                let method_line = self.previous.line;
                let (params, body) = self.function_rest();
                methods.push(FunctionDecl {
                    name: method_name,
                    params,
                    body,
                    is_async,
                    line: method_line,
                });
            } else if self.matches(TokenType::Ao) {
                self.consume(TokenType::Identifier, "Expect property name.");
                let property = self.previous.lexeme.to_owned();
                let default = if self.matches(TokenType::Equal) {
                    Some(self.expression())
                } else {
                    None
                };
                self.end_of_statement();
                properties.push((property, default));
            } else {
                break;
            }
            self.skip_newlines();
        }
        self.consume(TokenType::Job, "Expect 'job' after class body.");
        Some(Stmt::Class(ClassDecl {
            name,
            properties,
            methods,
            line,
        }))
    }

    /// Parameter list and body, shared by declarations, methods and
    /// anonymous functions. The opening '(' has not been consumed yet.
    fn function_rest(&mut self) -> (Vec<String>, Vec<Stmt>) {
        let mut params = Vec::new();
        self.consume(TokenType::LeftParen, "Expect '(' after function name.");
        if !self.check(TokenType::RightParen) {
            loop {
                self.consume(TokenType::Identifier, "Expect parameter name.");
                params.push(self.previous.lexeme.to_owned());
                if !self.matches(TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenType::RightParen, "Expect ')' after parameters.");
        self.expect_newline();
        let body = self.block_until(&[TokenType::Job]);
        self.consume(TokenType::Job, "Expect 'job' after function body.");
        (params, body)
    }

    fn print_statement(&mut self) -> Option<Stmt> {
        let line = self.previous.line;
        let mut args = vec![self.expression()];
        while self.matches(TokenType::Comma) {
            args.push(self.expression());
        }
        self.end_of_statement();
        Some(Stmt::Print { args, line })
    }

    fn if_statement(&mut self) -> Option<Stmt> {
        let line = self.previous.line;
        let condition = self.expression();
        self.expect_newline();
        let then_branch = self.block_until(&[TokenType::Uen, TokenType::Job]);
        let else_branch = if self.matches(TokenType::Uen) {
            if self.matches(TokenType::Tha) {
                // Chained else-if; the innermost branch owns the 'job'.
                Some(Box::new(self.if_statement()?))
            } else {
                self.expect_newline();
                let body = self.block_until(&[TokenType::Job]);
                self.consume(TokenType::Job, "Expect 'job' after 'uen' block.");
                Some(Box::new(Stmt::Block(body)))
            }
        } else {
            self.consume(TokenType::Job, "Expect 'job' after 'tha' block.");
            None
        };
        Some(Stmt::If(IfStmt {
            condition,
            then_branch,
            else_branch,
            line,
        }))
    }

    fn while_statement(&mut self) -> Option<Stmt> {
        let line = self.previous.line;
        let condition = self.expression();
        self.expect_newline();
        let body = self.block_until(&[TokenType::Job]);
        self.consume(TokenType::Job, "Expect 'job' after 'wonn' body.");
        Some(Stmt::While(WhileStmt {
            condition,
            body,
            line,
        }))
    }

    fn for_statement(&mut self) -> Option<Stmt> {
        let line = self.previous.line;
        self.consume(TokenType::Identifier, "Expect loop variable name.");
        let variable = self.previous.lexeme.to_owned();
        self.consume(TokenType::Equal, "Expect '=' after loop variable.");
        let start = self.expression();
        self.consume(TokenType::Thueng, "Expect 'thueng' after loop start.");
        let end = self.expression();
        let step = if self.matches(TokenType::Kao) {
            Some(self.expression())
        } else {
            None
        };
        self.expect_newline();
        let body = self.block_until(&[TokenType::Job]);
        self.consume(TokenType::Job, "Expect 'job' after 'samrap' body.");
        Some(Stmt::For(ForStmt {
            variable,
            start,
            end,
            step,
            body,
            line,
        }))
    }

    fn switch_statement(&mut self) -> Option<Stmt> {
        let line = self.previous.line;
        let discriminant = self.expression();
        self.expect_newline();
        self.skip_newlines();

        let mut cases = Vec::new();
        let mut default = None;
        loop {
            if self.matches(TokenType::Karani) {
                let case_line = self.previous.line;
                let value = self.expression();
                self.consume(TokenType::Colon, "Expect ':' after case value.");
                let body = self.case_body();
                cases.push(SwitchCase {
                    value,
                    body,
                    line: case_line,
                });
            } else if self.matches(TokenType::Pokati) {
                self.consume(TokenType::Colon, "Expect ':' after 'pokati'.");
                default = Some(self.case_body());
            } else {
                break;
            }
        }
        self.consume(TokenType::Job, "Expect 'job' after 'cheek' cases.");
        Some(Stmt::Switch(SwitchStmt {
            discriminant,
            cases,
            default,
            line,
        }))
    }

    fn case_body(&mut self) -> Vec<Stmt> {
        if self.check(TokenType::Newline) {
            self.skip_newlines();
            self.block_until(&[TokenType::Karani, TokenType::Pokati, TokenType::Job])
        } else {
            let mut body = Vec::new();
            if let Some(stmt) = self.declaration() {
                body.push(stmt);
            }
            self.skip_newlines();
            body
        }
    }

    fn return_statement(&mut self) -> Option<Stmt> {
        let line = self.previous.line;
        let value = if self.check(TokenType::Newline) || self.at_block_end() {
            None
        } else {
            Some(self.expression())
        };
        self.end_of_statement();
        Some(Stmt::Return { value, line })
    }

    fn try_statement(&mut self) -> Option<Stmt> {
        let line = self.previous.line;
        self.expect_newline();
        let body = self.block_until(&[TokenType::Jap, TokenType::Job]);
        let mut catch_name = None;
        let mut catch_body = Vec::new();
        if self.matches(TokenType::Jap) {
            if self.matches(TokenType::Identifier) {
                catch_name = Some(self.previous.lexeme.to_owned());
            }
            self.expect_newline();
            catch_body = self.block_until(&[TokenType::Job]);
        }
        self.consume(TokenType::Job, "Expect 'job' after 'long' block.");
        Some(Stmt::Try(TryStmt {
            body,
            catch_name,
            catch_body,
            line,
        }))
    }

    fn expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.expression();
        let line = expr.line();
        self.end_of_statement();
        match expr {
            Expr::Assign { target, value, line } => Some(Stmt::Assign {
                target: *target,
                value: *value,
                line,
            }),
            expr => Some(Stmt::Expression { expr, line }),
        }
    }

    fn block_until(&mut self, terminators: &[TokenType]) -> Vec<Stmt> {
        let mut body = Vec::new();
        self.skip_newlines();
        while !self.check(TokenType::Eof) && !terminators.iter().any(|t| self.check(*t)) {
            if let Some(stmt) = self.declaration() {
                body.push(stmt);
            }
            self.skip_newlines();
        }
        body
    }

    // Expressions, loosest binding first.

    fn expression(&mut self) -> Expr {
        self.assignment()
    }

    fn assignment(&mut self) -> Expr {
        let expr = self.ternary();
        if self.matches(TokenType::Equal) {
            let line = self.previous.line;
            let value = self.assignment();
            match expr {
                Expr::Variable { .. } | Expr::Member { .. } | Expr::Index { .. } => {
                    return Expr::Assign {
                        target: Box::new(expr),
                        value: Box::new(value),
                        line,
                    };
                }
                _ => self.error("Invalid assignment target."),
            }
        }
        expr
    }

    fn ternary(&mut self) -> Expr {
        let condition = self.logic_or();
        if self.matches(TokenType::Question) {
            let line = self.previous.line;
            let then_branch = self.expression();
            self.consume(TokenType::Colon, "Expect ':' in ternary expression.");
            let else_branch = self.ternary();
            return Expr::Ternary {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
                line,
            };
        }
        condition
    }

    fn logic_or(&mut self) -> Expr {
        let mut expr = self.logic_and();
        while self.matches(TokenType::PipePipe) {
            let line = self.previous.line;
            let right = self.logic_and();
            expr = Expr::Logical {
                left: Box::new(expr),
                op: LogicalOp::Or,
                right: Box::new(right),
                line,
            };
        }
        expr
    }

    fn logic_and(&mut self) -> Expr {
        let mut expr = self.bit_or();
        while self.matches(TokenType::AmpAmp) {
            let line = self.previous.line;
            let right = self.bit_or();
            expr = Expr::Logical {
                left: Box::new(expr),
                op: LogicalOp::And,
                right: Box::new(right),
                line,
            };
        }
        expr
    }

    fn bit_or(&mut self) -> Expr {
        let mut expr = self.bit_xor();
        while self.matches(TokenType::Pipe) {
            let line = self.previous.line;
            let right = self.bit_xor();
            expr = self.binary(expr, BinaryOp::BitOr, right, line);
        }
        expr
    }

    fn bit_xor(&mut self) -> Expr {
        let mut expr = self.bit_and();
        while self.matches(TokenType::Caret) {
            let line = self.previous.line;
            let right = self.bit_and();
            expr = self.binary(expr, BinaryOp::BitXor, right, line);
        }
        expr
    }

    fn bit_and(&mut self) -> Expr {
        let mut expr = self.equality();
        while self.matches(TokenType::Amp) {
            let line = self.previous.line;
            let right = self.equality();
            expr = self.binary(expr, BinaryOp::BitAnd, right, line);
        }
        expr
    }

    fn equality(&mut self) -> Expr {
        let mut expr = self.comparison();
        loop {
            let op = if self.matches(TokenType::EqualEqual) {
                BinaryOp::Equal
            } else if self.matches(TokenType::BangEqual) {
                BinaryOp::NotEqual
            } else {
                break;
            };
            let line = self.previous.line;
            let right = self.comparison();
            expr = self.binary(expr, op, right, line);
        }
        expr
    }

    fn comparison(&mut self) -> Expr {
        let mut expr = self.shift();
        loop {
            let op = if self.matches(TokenType::Less) {
                BinaryOp::Less
            } else if self.matches(TokenType::LessEqual) {
                BinaryOp::LessEqual
            } else if self.matches(TokenType::Greater) {
                BinaryOp::Greater
            } else if self.matches(TokenType::GreaterEqual) {
                BinaryOp::GreaterEqual
            } else {
                break;
            };
            let line = self.previous.line;
            let right = self.shift();
            expr = self.binary(expr, op, right, line);
        }
        expr
    }

    fn shift(&mut self) -> Expr {
        let mut expr = self.term();
        loop {
            let op = if self.matches(TokenType::LessLess) {
                BinaryOp::ShiftLeft
            } else if self.matches(TokenType::GreaterGreater) {
                BinaryOp::ShiftRight
            } else {
                break;
            };
            let line = self.previous.line;
            let right = self.term();
            expr = self.binary(expr, op, right, line);
        }
        expr
    }

    fn term(&mut self) -> Expr {
        let mut expr = self.factor();
        loop {
            let op = if self.matches(TokenType::Plus) {
                BinaryOp::Add
            } else if self.matches(TokenType::Minus) {
                BinaryOp::Subtract
            } else {
                break;
            };
            let line = self.previous.line;
            let right = self.factor();
            expr = self.binary(expr, op, right, line);
        }
        expr
    }

    fn factor(&mut self) -> Expr {
        let mut expr = self.power();
        loop {
            let op = if self.matches(TokenType::Star) {
                BinaryOp::Multiply
            } else if self.matches(TokenType::Slash) {
                BinaryOp::Divide
            } else if self.matches(TokenType::Percent) {
                BinaryOp::Modulo
            } else {
                break;
            };
            let line = self.previous.line;
            let right = self.power();
            expr = self.binary(expr, op, right, line);
        }
        expr
    }

    fn power(&mut self) -> Expr {
        let left = self.unary();
        if self.matches(TokenType::StarStar) {
            let line = self.previous.line;
            let right = self.power();
            return self.binary(left, BinaryOp::Power, right, line);
        }
        left
    }

    fn unary(&mut self) -> Expr {
        let op = if self.matches(TokenType::Bang) {
            UnaryOp::Not
        } else if self.matches(TokenType::Minus) {
            UnaryOp::Negate
        } else if self.matches(TokenType::Tilde) {
            UnaryOp::BitNot
        } else if self.matches(TokenType::Ror) {
            let line = self.previous.line;
            let inner = self.unary();
            return Expr::Await {
                inner: Box::new(inner),
                line,
            };
        } else {
            return self.call();
        };
        let line = self.previous.line;
        let operand = self.unary();
        Expr::Unary {
            op,
            operand: Box::new(operand),
            line,
        }
    }

    fn call(&mut self) -> Expr {
        let mut expr = self.primary();
        loop {
            if self.matches(TokenType::LeftParen) {
                let line = self.previous.line;
                let args = self.argument_list();
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    line,
                };
            } else if self.matches(TokenType::Dot) {
                self.consume(TokenType::Identifier, "Expect property name after '.'.");
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: self.previous.lexeme.to_owned(),
                    line: self.previous.line,
                };
            } else if self.matches(TokenType::LeftBracket) {
                let line = self.previous.line;
                let index = self.expression();
                self.consume(TokenType::RightBracket, "Expect ']' after index.");
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                    line,
                };
            } else {
                break;
            }
        }
        expr
    }

    fn argument_list(&mut self) -> Vec<Expr> {
        let mut args = Vec::new();
        if !self.check(TokenType::RightParen) {
            loop {
                if self.matches(TokenType::DotDotDot) {
                    let line = self.previous.line;
                    let inner = self.expression();
                    args.push(Expr::Spread {
                        inner: Box::new(inner),
                        line,
                    });
                } else {
                    args.push(self.expression());
                }
                if args.len() > 255 {
                    self.error("Cannot have more than 255 arguments.");
                }
                if !self.matches(TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenType::RightParen, "Expect ')' after arguments.");
        args
    }

    fn primary(&mut self) -> Expr {
        if self.matches(TokenType::Number) {
            let line = self.previous.line;
            let value = match self.previous.lexeme.parse() {
                Ok(value) => value,
                Err(_) => {
                    self.error("Invalid number literal.");
                    0.0
                }
            };
            return Expr::Literal {
                value: Literal::Number(value),
                line,
            };
        }
        if self.matches(TokenType::String) {
            let lexeme = self.previous.lexeme;
            return Expr::Literal {
                value: Literal::String(lexeme[1..lexeme.len() - 1].to_owned()),
                line: self.previous.line,
            };
        }
        if self.matches(TokenType::Jing) {
            return Expr::Literal {
                value: Literal::Bool(true),
                line: self.previous.line,
            };
        }
        if self.matches(TokenType::Tej) {
            return Expr::Literal {
                value: Literal::Bool(false),
                line: self.previous.line,
            };
        }
        if self.matches(TokenType::Wang) {
            return Expr::Literal {
                value: Literal::Nil,
                line: self.previous.line,
            };
        }
        if self.matches(TokenType::Identifier) {
            return Expr::Variable {
                name: self.previous.lexeme.to_owned(),
                line: self.previous.line,
            };
        }
        if self.matches(TokenType::Ni) {
            return Expr::This {
                line: self.previous.line,
            };
        }
        if self.matches(TokenType::LeftParen) {
            let expr = self.expression();
            self.consume(TokenType::RightParen, "Expect ')' after expression.");
            return expr;
        }
        if self.matches(TokenType::LeftBracket) {
            return self.array_literal();
        }
        if self.matches(TokenType::LeftBrace) {
            return self.object_literal();
        }
        if self.matches(TokenType::Kian) {
            let is_async = self.matches(TokenType::Async);
            return self.function_expression(is_async);
        }
        if self.matches(TokenType::Mai) {
            return self.new_expression();
        }

        self.error_at_current("Expect expression.");
        // Consume the offending token so parsing always makes progress.
        if !self.check(TokenType::Eof) {
            self.advance();
        }
        Expr::Literal {
            value: Literal::Nil,
            line: self.previous.line,
        }
    }

    fn array_literal(&mut self) -> Expr {
        let line = self.previous.line;
        let mut elements = Vec::new();
        if !self.check(TokenType::RightBracket) {
            loop {
                if self.matches(TokenType::DotDotDot) {
                    let spread_line = self.previous.line;
                    let inner = self.expression();
                    elements.push(Expr::Spread {
                        inner: Box::new(inner),
                        line: spread_line,
                    });
                } else {
                    elements.push(self.expression());
                }
                if !self.matches(TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenType::RightBracket, "Expect ']' after array elements.");
        Expr::Array { elements, line }
    }

    fn object_literal(&mut self) -> Expr {
        let line = self.previous.line;
        let mut entries = Vec::new();
        if !self.check(TokenType::RightBrace) {
            loop {
                let key = if self.matches(TokenType::Identifier) {
                    ObjectKey::Literal(self.previous.lexeme.to_owned())
                } else if self.matches(TokenType::String) {
                    let lexeme = self.previous.lexeme;
                    ObjectKey::Literal(lexeme[1..lexeme.len() - 1].to_owned())
                } else if self.matches(TokenType::Number) {
                    ObjectKey::Literal(self.previous.lexeme.to_owned())
                } else if self.matches(TokenType::LeftBracket) {
                    let expr = self.expression();
                    self.consume(TokenType::RightBracket, "Expect ']' after computed key.");
                    ObjectKey::Computed(expr)
                } else {
                    self.error_at_current("Expect object key.");
                    break;
                };
                self.consume(TokenType::Colon, "Expect ':' after object key.");
                let value = self.expression();
                entries.push((key, value));
                if !self.matches(TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenType::RightBrace, "Expect '}' after object entries.");
        Expr::Object { entries, line }
    }

    fn function_expression(&mut self, is_async: bool) -> Expr {
        let line = self.previous.line;
        let (params, body) = self.function_rest();
        Expr::Function(FunctionDecl {
            name: String::new(),
            params,
            body,
            is_async,
            line,
        })
    }

    fn new_expression(&mut self) -> Expr {
        let line = self.previous.line;
        self.consume(TokenType::Identifier, "Expect class name after 'mai'.");
        let mut callee = Expr::Variable {
            name: self.previous.lexeme.to_owned(),
            line: self.previous.line,
        };
        loop {
            if self.matches(TokenType::Dot) {
                self.consume(TokenType::Identifier, "Expect property name after '.'.");
                callee = Expr::Member {
                    object: Box::new(callee),
                    property: self.previous.lexeme.to_owned(),
                    line: self.previous.line,
                };
            } else if self.matches(TokenType::LeftBracket) {
                let index_line = self.previous.line;
                let index = self.expression();
                self.consume(TokenType::RightBracket, "Expect ']' after index.");
                callee = Expr::Index {
                    object: Box::new(callee),
                    index: Box::new(index),
                    line: index_line,
                };
            } else {
                break;
            }
        }
        self.consume(TokenType::LeftParen, "Expect '(' after 'mai' target.");
        let args = self.argument_list();
        Expr::New {
            callee: Box::new(callee),
            args,
            line,
        }
    }

    fn binary(&mut self, left: Expr, op: BinaryOp, right: Expr, line: usize) -> Expr {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
            line,
        }
    }

    // Token plumbing.

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.scan_token();
            if self.current.kind == TokenType::Error {
                let message = self.current.lexeme.to_owned();
                self.error_at_current(&message);
            } else {
                break;
            }
        }
    }

    fn consume(&mut self, expected: TokenType, msg: &str) {
        if self.current.kind == expected {
            self.advance();
            return;
        }
        self.error_at_current(msg);
    }

    fn matches(&mut self, kind: TokenType) -> bool {
        if !self.check(kind) {
            false
        } else {
            self.advance();
            true
        }
    }

    fn check(&self, kind: TokenType) -> bool {
        self.current.kind == kind
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenType::Newline) {
            self.advance();
        }
    }

    fn expect_newline(&mut self) {
        if self.check(TokenType::Newline) {
            self.skip_newlines();
        } else if !self.check(TokenType::Eof) {
            self.error_at_current("Expect newline.");
        }
    }

    fn at_block_end(&self) -> bool {
        matches!(
            self.current.kind,
            TokenType::Eof
                | TokenType::Job
                | TokenType::Uen
                | TokenType::Karani
                | TokenType::Pokati
                | TokenType::Jap
        )
    }

    fn end_of_statement(&mut self) {
        if self.check(TokenType::Newline) {
            self.skip_newlines();
        } else if !self.at_block_end() {
            self.error_at_current("Expect newline after statement.");
        }
    }

    fn error_at_current(&mut self, msg: &str) {
        let token = self.current;
        self.error_at(token, msg);
    }

    fn error(&mut self, msg: &str) {
        let token = self.previous;
        self.error_at(token, msg);
    }

    fn error_at(&mut self, token: Token, msg: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        let location = match token.kind {
            TokenType::Eof => " at end".to_owned(),
            TokenType::Newline => " at end of line".to_owned(),
            _ => format!(" at '{}'", token.lexeme),
        };
        self.errors
            .push(CompileError::new(token.line, format!("{}: {}", location.trim_start(), msg)));
    }

    fn synchronize(&mut self) {
        self.panic_mode = false;
        while self.current.kind != TokenType::Eof {
            if self.previous.kind == TokenType::Newline {
                return;
            }
            match self.current.kind {
                TokenType::Ao
                | TokenType::Kian
                | TokenType::Klum
                | TokenType::Tha
                | TokenType::Wonn
                | TokenType::Samrap
                | TokenType::Cheek
                | TokenType::Da
                | TokenType::Kuun
                | TokenType::Job => return,
                _ => (),
            }
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_variable_declaration_and_print() {
        let program = parse("ao x = 10\nda x + 5\n").unwrap();
        assert_eq!(program.body.len(), 2);
        match &program.body[0] {
            Stmt::Var { name, initializer, .. } => {
                assert_eq!(name, "x");
                assert!(initializer.is_some());
            }
            other => panic!("expected var declaration, got {:?}", other),
        }
        match &program.body[1] {
            Stmt::Print { args, .. } => assert_eq!(args.len(), 1),
            other => panic!("expected print, got {:?}", other),
        }
    }

    #[test]
    fn parses_class_with_initializer_and_method() {
        let source = "klum Box\n  kian sang(v)\n    ni.v = v\n  job\n  kian get()\n    kuun ni.v\n  job\njob\n";
        let program = parse(source).unwrap();
        match &program.body[0] {
            Stmt::Class(decl) => {
                assert_eq!(decl.name, "Box");
                assert_eq!(decl.methods.len(), 2);
                assert_eq!(decl.methods[0].name, "sang");
                assert_eq!(decl.methods[0].params, vec!["v".to_owned()]);
            }
            other => panic!("expected class declaration, got {:?}", other),
        }
    }

    #[test]
    fn parses_chained_else_if() {
        let source = "tha x < 1\n  da 1\nuen tha x < 2\n  da 2\nuen\n  da 3\njob\n";
        let program = parse(source).unwrap();
        match &program.body[0] {
            Stmt::If(stmt) => match stmt.else_branch.as_deref() {
                Some(Stmt::If(inner)) => assert!(inner.else_branch.is_some()),
                other => panic!("expected chained if, got {:?}", other),
            },
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn parses_switch_with_inline_cases() {
        let source = "cheek x\n  karani 1: da \"one\"\n  karani 2: da \"two\"\n  pokati: da \"other\"\njob\n";
        let program = parse(source).unwrap();
        match &program.body[0] {
            Stmt::Switch(stmt) => {
                assert_eq!(stmt.cases.len(), 2);
                assert!(stmt.default.is_some());
            }
            other => panic!("expected switch, got {:?}", other),
        }
    }

    #[test]
    fn parses_counted_for_with_step() {
        let program = parse("samrap i = 0 thueng 10 kao 2\n  da i\njob\n").unwrap();
        match &program.body[0] {
            Stmt::For(stmt) => {
                assert_eq!(stmt.variable, "i");
                assert!(stmt.step.is_some());
            }
            other => panic!("expected for, got {:?}", other),
        }
    }

    #[test]
    fn assignment_statement_keeps_target_shape() {
        let program = parse("x = 1\no.p = 2\na[0] = 3\n").unwrap();
        assert_eq!(program.body.len(), 3);
        for stmt in &program.body {
            assert!(matches!(stmt, Stmt::Assign { .. }));
        }
    }

    #[test]
    fn parses_collections_and_ternary() {
        let program = parse("ao a = [1, 2, 3]\nao o = {x: 1, \"y\": 2, [1 + 2]: 3}\nao t = a ? 1 : 2\n")
            .unwrap();
        assert_eq!(program.body.len(), 3);
    }

    #[test]
    fn reports_invalid_assignment_target() {
        let errors = parse("1 = 2\n").unwrap_err();
        assert!(errors[0].message.contains("Invalid assignment target."));
    }

    #[test]
    fn collects_errors_from_multiple_statements() {
        let errors = parse("ao = 1\nda )\n").unwrap_err();
        assert!(errors.len() >= 2);
    }

    #[test]
    fn parses_anonymous_function_and_new() {
        let program = parse("ao f = kian (x)\n  kuun x\njob\nao b = mai Box(7)\n").unwrap();
        assert_eq!(program.body.len(), 2);
        match &program.body[1] {
            Stmt::Var { initializer: Some(Expr::New { args, .. }), .. } => {
                assert_eq!(args.len(), 1)
            }
            other => panic!("expected new expression, got {:?}", other),
        }
    }
}
