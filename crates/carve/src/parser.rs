//! Recursive-descent parser from tokens to the AST.
//!
//! Precedence, low to high: `or`, `and`, comparison, `not`, `step`, `to`,
//! additive, multiplicative, unary, member access. `to` and `step` do not
//! chain, and `step` demands something range-shaped on its left.
//!
//! A leading identifier is a command unless the token after it forces an
//! expression reading: a tight call paren, a block argument brace, a
//! member dot, or an infix operator.

use carve_geom::Color;

use crate::{
    ast::{Block, Definition, Expression, ExpressionKind, Identifier, Program, Statement, StatementKind},
    errors::{ParserError, ProgramError},
    lexer::{tokenize, InfixOp, Keyword, PrefixOp, Token, TokenKind},
};

/// Parses a source file into a [`Program`].
pub fn parse(source: &str) -> Result<Program, ProgramError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let statements = parser.statements_until(&TokenKind::Eof)?;
    Ok(Program {
        source: source.to_owned(),
        statements,
    })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_linebreaks(&mut self) {
        while self.peek_kind() == &TokenKind::Linebreak {
            self.advance();
        }
    }

    fn unexpected(&self, expected: Option<&str>) -> ParserError {
        ParserError::unexpected_token(self.peek().clone(), expected)
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<Token, ParserError> {
        if self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(Some(expected)))
        }
    }

    fn expect_identifier(&mut self, expected: &str) -> Result<Identifier, ParserError> {
        if let TokenKind::Identifier(name) = self.peek_kind() {
            let name = name.clone();
            let token = self.advance();
            Ok(Identifier { name, range: token.range })
        } else {
            Err(self.unexpected(Some(expected)))
        }
    }

    /// After a statement or expression, the next token must close the
    /// line. An identifier here usually means a misspelled operator.
    fn expect_end_of_statement(&self) -> Result<(), ParserError> {
        match self.peek_kind() {
            TokenKind::Linebreak | TokenKind::RBrace | TokenKind::Eof => Ok(()),
            TokenKind::Identifier(_) => Err(self.unexpected(Some("operator"))),
            _ => Err(self.unexpected(Some("end of line"))),
        }
    }

    fn statements_until(&mut self, end: &TokenKind) -> Result<Vec<Statement>, ParserError> {
        let mut statements = Vec::new();
        loop {
            self.skip_linebreaks();
            if self.peek_kind() == end {
                return Ok(statements);
            }
            if self.peek_kind() == &TokenKind::Eof {
                // A missing closing brace surfaces here.
                return Err(self.unexpected(Some("closing brace")));
            }
            let statement = self.statement()?;
            self.expect_end_of_statement()?;
            statements.push(statement);
        }
    }

    fn statement(&mut self) -> Result<Statement, ParserError> {
        match self.peek_kind().clone() {
            TokenKind::Keyword(Keyword::Define) => self.define_statement(),
            TokenKind::Keyword(Keyword::For) => self.for_statement(),
            TokenKind::Keyword(Keyword::If) => self.if_statement(),
            TokenKind::Keyword(Keyword::Import) => {
                let start = self.advance().range.start;
                let path = self.expression(true)?;
                let range = start..path.range.end;
                Ok(Statement {
                    kind: StatementKind::Import(path),
                    range,
                })
            }
            TokenKind::Keyword(Keyword::Else) => Err(self.unexpected(Some("statement"))),
            TokenKind::Identifier(name) => {
                if name == "option"
                    && matches!(self.peek_at(1), TokenKind::Identifier(_))
                {
                    return self.option_statement();
                }
                match self.peek_at(1) {
                    // These force an expression reading of the line.
                    TokenKind::LBrace
                    | TokenKind::Dot
                    | TokenKind::Call
                    | TokenKind::Subscript
                    | TokenKind::Infix(_) => self.expression_statement(),
                    _ => self.command_statement(),
                }
            }
            TokenKind::Number(_)
            | TokenKind::String(_)
            | TokenKind::HexColor(_)
            | TokenKind::LParen
            | TokenKind::Prefix(_) => self.expression_statement(),
            _ => Err(self.unexpected(Some("statement"))),
        }
    }

    fn define_statement(&mut self) -> Result<Statement, ParserError> {
        let start = self.advance().range.start;
        let name = self.expect_identifier("identifier")?;
        let definition = match self.peek_kind() {
            TokenKind::Call => {
                self.advance();
                let mut parameters = Vec::new();
                while !self.eat(&TokenKind::RParen) {
                    parameters.push(self.expect_identifier("parameter name")?);
                }
                let body = self.block()?;
                Definition::Function { parameters, body }
            }
            TokenKind::LBrace => Definition::Block(self.block()?),
            TokenKind::Linebreak | TokenKind::Eof => {
                return Err(self.unexpected(Some("expression")));
            }
            _ => Definition::Expression(self.expression(true)?),
        };
        let end = match &definition {
            Definition::Expression(expr) => expr.range.end,
            Definition::Function { body, .. } | Definition::Block(body) => body.range.end,
        };
        Ok(Statement {
            kind: StatementKind::Define { name, definition },
            range: start..end,
        })
    }

    fn option_statement(&mut self) -> Result<Statement, ParserError> {
        let start = self.advance().range.start;
        let name = self.expect_identifier("identifier")?;
        let default = self.expression(true)?;
        let range = start..default.range.end;
        Ok(Statement {
            kind: StatementKind::Option { name, default },
            range,
        })
    }

    fn for_statement(&mut self) -> Result<Statement, ParserError> {
        let start = self.advance().range.start;
        let variable = if matches!(self.peek_kind(), TokenKind::Identifier(_))
            && self.peek_at(1) == &TokenKind::Infix(InfixOp::In)
        {
            let identifier = self.expect_identifier("identifier")?;
            self.advance();
            Some(identifier)
        } else {
            None
        };
        let sequence = self.expression(false)?;
        if matches!(self.peek_kind(), TokenKind::Identifier(_)) {
            return Err(self.unexpected(Some("operator")));
        }
        if self.peek_kind() != &TokenKind::LBrace {
            return Err(self.unexpected(Some("loop body")));
        }
        let body = self.block()?;
        let range = start..body.range.end;
        Ok(Statement {
            kind: StatementKind::ForLoop {
                variable,
                sequence,
                body,
            },
            range,
        })
    }

    fn if_statement(&mut self) -> Result<Statement, ParserError> {
        let start = self.advance().range.start;
        let condition = self.expression(false)?;
        if matches!(self.peek_kind(), TokenKind::Identifier(_)) {
            return Err(self.unexpected(Some("operator")));
        }
        if self.peek_kind() != &TokenKind::LBrace {
            return Err(self.unexpected(Some("if body")));
        }
        let body = self.block()?;
        let mut end = body.range.end;

        // An else clause may sit after a linebreak; back up if it is not
        // there.
        let checkpoint = self.pos;
        self.skip_linebreaks();
        let else_body = if self.peek_kind() == &TokenKind::Keyword(Keyword::Else) {
            self.advance();
            let else_body = match self.peek_kind() {
                TokenKind::LBrace => self.block()?,
                TokenKind::Keyword(Keyword::If) => {
                    let nested = self.if_statement()?;
                    let range = nested.range.clone();
                    Block {
                        statements: vec![nested],
                        range,
                    }
                }
                _ => return Err(self.unexpected(Some("else body"))),
            };
            end = else_body.range.end;
            Some(else_body)
        } else {
            self.pos = checkpoint;
            None
        };
        Ok(Statement {
            kind: StatementKind::IfElse {
                condition,
                body,
                else_body,
            },
            range: start..end,
        })
    }

    fn command_statement(&mut self) -> Result<Statement, ParserError> {
        let name = self.expect_identifier("identifier")?;
        let start = name.range.start;
        let argument = if matches!(
            self.peek_kind(),
            TokenKind::Linebreak | TokenKind::RBrace | TokenKind::Eof
        ) {
            None
        } else {
            Some(self.expression_list_inline()?)
        };
        let end = argument.as_ref().map_or(name.range.end, |a| a.range.end);
        Ok(Statement {
            kind: StatementKind::Command { name, argument },
            range: start..end,
        })
    }

    fn expression_statement(&mut self) -> Result<Statement, ParserError> {
        let expression = self.expression(true)?;
        let range = expression.range.clone();
        Ok(Statement {
            kind: StatementKind::Expression(expression),
            range,
        })
    }

    /// The rest of the line as a juxtaposed expression list; more than one
    /// element becomes a tuple.
    fn expression_list_inline(&mut self) -> Result<Expression, ParserError> {
        let mut elements = vec![self.expression(true)?];
        while !matches!(
            self.peek_kind(),
            TokenKind::Linebreak | TokenKind::RBrace | TokenKind::RParen | TokenKind::Eof
        ) {
            elements.push(self.expression(true)?);
        }
        Ok(tuple_or_single(elements))
    }

    // --- expression precedence ladder ---

    fn expression(&mut self, blocks: bool) -> Result<Expression, ParserError> {
        self.or_expression(blocks)
    }

    fn or_expression(&mut self, blocks: bool) -> Result<Expression, ParserError> {
        let mut lhs = self.and_expression(blocks)?;
        while self.peek_kind() == &TokenKind::Infix(InfixOp::Or) {
            self.advance();
            let rhs = self.and_expression(blocks)?;
            lhs = infix(lhs, InfixOp::Or, rhs);
        }
        Ok(lhs)
    }

    fn and_expression(&mut self, blocks: bool) -> Result<Expression, ParserError> {
        let mut lhs = self.comparison(blocks)?;
        while self.peek_kind() == &TokenKind::Infix(InfixOp::And) {
            self.advance();
            let rhs = self.comparison(blocks)?;
            lhs = infix(lhs, InfixOp::And, rhs);
        }
        Ok(lhs)
    }

    fn comparison(&mut self, blocks: bool) -> Result<Expression, ParserError> {
        let mut lhs = self.not_expression(blocks)?;
        while let TokenKind::Infix(
            op @ (InfixOp::Equal
            | InfixOp::NotEqual
            | InfixOp::Less
            | InfixOp::LessEqual
            | InfixOp::Greater
            | InfixOp::GreaterEqual),
        ) = self.peek_kind()
        {
            let op = *op;
            self.advance();
            let rhs = self.not_expression(blocks)?;
            lhs = infix(lhs, op, rhs);
        }
        Ok(lhs)
    }

    fn not_expression(&mut self, blocks: bool) -> Result<Expression, ParserError> {
        // `not x` is a prefix here; `not(x)` stays a call of the stdlib
        // function.
        if let TokenKind::Identifier(name) = self.peek_kind()
            && name == "not"
            && self.peek_at(1) != &TokenKind::Call
        {
            let start = self.advance().range.start;
            let operand = self.not_expression(blocks)?;
            let range = start..operand.range.end;
            return Ok(Expression {
                kind: ExpressionKind::Prefix {
                    op: PrefixOp::Not,
                    operand: Box::new(operand),
                },
                range,
            });
        }
        self.step_expression(blocks)
    }

    fn step_expression(&mut self, blocks: bool) -> Result<Expression, ParserError> {
        let lhs = self.range_expression(blocks)?;
        if self.peek_kind() != &TokenKind::Infix(InfixOp::Step) {
            return Ok(lhs);
        }
        // Step needs something range-shaped on its left; a literal number
        // or similar can never be a range.
        if !matches!(
            lhs.kind,
            ExpressionKind::Infix { op: InfixOp::To, .. }
                | ExpressionKind::Identifier(_)
                | ExpressionKind::Member { .. }
                | ExpressionKind::SubExpression(_)
                | ExpressionKind::Tuple(_)
        ) {
            return Err(self.unexpected(Some("'to' expression before 'step'")));
        }
        self.advance();
        let rhs = self.range_expression(blocks)?;
        let stepped = infix(lhs, InfixOp::Step, rhs);
        // A second step in the same range expression does not chain.
        if self.peek_kind() == &TokenKind::Infix(InfixOp::Step) {
            return Err(self.unexpected(Some("end of range expression")));
        }
        Ok(stepped)
    }

    fn range_expression(&mut self, blocks: bool) -> Result<Expression, ParserError> {
        let lhs = self.sum(blocks)?;
        if self.peek_kind() != &TokenKind::Infix(InfixOp::To) {
            return Ok(lhs);
        }
        self.advance();
        let rhs = self.sum(blocks)?;
        let range = infix(lhs, InfixOp::To, rhs);
        if self.peek_kind() == &TokenKind::Infix(InfixOp::To) {
            return Err(self.unexpected(Some("end of range expression")));
        }
        Ok(range)
    }

    fn sum(&mut self, blocks: bool) -> Result<Expression, ParserError> {
        let mut lhs = self.term(blocks)?;
        while let TokenKind::Infix(op @ (InfixOp::Add | InfixOp::Subtract)) = self.peek_kind() {
            let op = *op;
            self.advance();
            let rhs = self.term(blocks)?;
            lhs = infix(lhs, op, rhs);
        }
        Ok(lhs)
    }

    fn term(&mut self, blocks: bool) -> Result<Expression, ParserError> {
        let mut lhs = self.unary(blocks)?;
        while let TokenKind::Infix(op @ (InfixOp::Multiply | InfixOp::Divide | InfixOp::Modulo)) = self.peek_kind() {
            let op = *op;
            self.advance();
            let rhs = self.unary(blocks)?;
            lhs = infix(lhs, op, rhs);
        }
        Ok(lhs)
    }

    fn unary(&mut self, blocks: bool) -> Result<Expression, ParserError> {
        let op = match self.peek_kind() {
            TokenKind::Prefix(op) => Some(*op),
            // `(-5)` lexes the minus as infix; in operand position it is
            // unary all the same.
            TokenKind::Infix(InfixOp::Add) => Some(PrefixOp::Plus),
            TokenKind::Infix(InfixOp::Subtract) => Some(PrefixOp::Minus),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.advance().range.start;
            let operand = self.unary(blocks)?;
            let range = start..operand.range.end;
            return Ok(Expression {
                kind: ExpressionKind::Prefix {
                    op,
                    operand: Box::new(operand),
                },
                range,
            });
        }
        self.postfix(blocks)
    }

    fn postfix(&mut self, blocks: bool) -> Result<Expression, ParserError> {
        let mut expression = self.atom(blocks)?;
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let member = self.expect_identifier("member name")?;
                    let range = expression.range.start..member.range.end;
                    expression = Expression {
                        kind: ExpressionKind::Member {
                            receiver: Box::new(expression),
                            member,
                        },
                        range,
                    };
                }
                // The data model has no subscript expression; report the
                // token rather than silently skipping it.
                TokenKind::Subscript => return Err(self.unexpected(None)),
                _ => return Ok(expression),
            }
        }
    }

    fn atom(&mut self, blocks: bool) -> Result<Expression, ParserError> {
        match self.peek_kind().clone() {
            TokenKind::Number(value) => {
                let range = self.advance().range;
                Ok(Expression {
                    kind: ExpressionKind::Number(value),
                    range,
                })
            }
            TokenKind::String(value) => {
                let range = self.advance().range;
                Ok(Expression {
                    kind: ExpressionKind::String(value),
                    range,
                })
            }
            TokenKind::HexColor(digits) => {
                let color = Color::from_hex_digits(&digits).ok_or_else(|| self.unexpected(Some("color")))?;
                let range = self.advance().range;
                Ok(Expression {
                    kind: ExpressionKind::Color(color),
                    range,
                })
            }
            TokenKind::Identifier(name) => {
                let token = self.advance();
                let identifier = Expression {
                    kind: ExpressionKind::Identifier(name.clone()),
                    range: token.range.clone(),
                };
                match self.peek_kind() {
                    TokenKind::Call => {
                        self.advance();
                        let mut elements = vec![identifier];
                        loop {
                            self.skip_linebreaks();
                            if self.peek_kind() == &TokenKind::RParen {
                                break;
                            }
                            if self.peek_kind() == &TokenKind::Eof {
                                return Err(self.unexpected(Some("closing paren")));
                            }
                            elements.push(self.expression(true)?);
                        }
                        let close = self.advance();
                        Ok(Expression {
                            kind: ExpressionKind::Tuple(elements),
                            range: token.range.start..close.range.end,
                        })
                    }
                    TokenKind::LBrace if blocks => {
                        let block = self.block()?;
                        let range = token.range.start..block.range.end;
                        Ok(Expression {
                            kind: ExpressionKind::Block {
                                name: Identifier {
                                    name,
                                    range: token.range,
                                },
                                block,
                            },
                            range,
                        })
                    }
                    _ => Ok(identifier),
                }
            }
            TokenKind::LParen => {
                let open = self.advance();
                let mut elements = Vec::new();
                loop {
                    self.skip_linebreaks();
                    if self.peek_kind() == &TokenKind::RParen {
                        break;
                    }
                    if self.peek_kind() == &TokenKind::Eof {
                        return Err(self.unexpected(Some("closing paren")));
                    }
                    elements.push(self.expression(true)?);
                }
                let close = self.advance();
                let range = open.range.start..close.range.end;
                if elements.len() == 1 {
                    let inner = elements.remove(0);
                    Ok(Expression {
                        kind: ExpressionKind::SubExpression(Box::new(inner)),
                        range,
                    })
                } else {
                    Ok(Expression {
                        kind: ExpressionKind::Tuple(elements),
                        range,
                    })
                }
            }
            _ => Err(self.unexpected(Some("expression"))),
        }
    }

    fn block(&mut self) -> Result<Block, ParserError> {
        let open = self.expect(&TokenKind::LBrace, "opening brace")?;
        let statements = self.statements_until(&TokenKind::RBrace)?;
        let close = self.advance();
        Ok(Block {
            statements,
            range: open.range.start..close.range.end,
        })
    }
}

fn infix(lhs: Expression, op: InfixOp, rhs: Expression) -> Expression {
    let range = lhs.range.start..rhs.range.end;
    Expression {
        kind: ExpressionKind::Infix {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        },
        range,
    }
}

fn tuple_or_single(mut elements: Vec<Expression>) -> Expression {
    if elements.len() == 1 {
        return elements.remove(0);
    }
    let range = elements
        .first()
        .map_or(0..0, |first| first.range.start..elements.last().map_or(first.range.end, |l| l.range.end));
    Expression {
        kind: ExpressionKind::Tuple(elements),
        range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(source: &str) -> Statement {
        let program = parse(source).expect("parse failed");
        assert_eq!(program.statements.len(), 1, "expected one statement in {source:?}");
        program.statements.into_iter().next().expect("statement")
    }

    #[test]
    fn precedence_of_sum_and_product() {
        let statement = parse_one("print 1 + 2 * 3");
        let StatementKind::Command { argument: Some(arg), .. } = statement.kind else {
            panic!("expected command");
        };
        let ExpressionKind::Infix { op: InfixOp::Add, rhs, .. } = arg.kind else {
            panic!("expected + at the top: {arg:?}");
        };
        assert!(matches!(rhs.kind, ExpressionKind::Infix { op: InfixOp::Multiply, .. }));
    }

    #[test]
    fn parenthesised_expression_overrides_precedence() {
        let statement = parse_one("print (1 + 2) * 3");
        let StatementKind::Command { argument: Some(arg), .. } = statement.kind else {
            panic!("expected command");
        };
        assert!(matches!(arg.kind, ExpressionKind::Infix { op: InfixOp::Multiply, .. }));
    }

    #[test]
    fn block_argument_is_an_expression_statement() {
        let statement = parse_one("cube { size 2 }");
        let StatementKind::Expression(expr) = statement.kind else {
            panic!("expected expression statement");
        };
        assert!(matches!(expr.kind, ExpressionKind::Block { .. }));
    }

    #[test]
    fn command_with_identifier_argument() {
        let statement = parse_one("color red");
        let StatementKind::Command { name, argument } = statement.kind else {
            panic!("expected command");
        };
        assert_eq!(name.name, "color");
        assert!(matches!(argument, Some(Expression { kind: ExpressionKind::Identifier(n), .. }) if n == "red"));
    }

    #[test]
    fn tight_call_lowers_to_headed_tuple() {
        let statement = parse_one("f(1 2)");
        let StatementKind::Expression(expr) = statement.kind else {
            panic!("expected expression statement");
        };
        let ExpressionKind::Tuple(elements) = expr.kind else {
            panic!("expected tuple");
        };
        assert_eq!(elements.len(), 3);
        assert!(matches!(&elements[0].kind, ExpressionKind::Identifier(n) if n == "f"));
    }

    #[test]
    fn for_loop_with_variable_and_step() {
        let statement = parse_one("for i in 1 to 3 step 0.5 {\nprint i\n}");
        let StatementKind::ForLoop { variable, sequence, body } = statement.kind else {
            panic!("expected for loop");
        };
        assert_eq!(variable.expect("variable").name, "i");
        assert!(matches!(sequence.kind, ExpressionKind::Infix { op: InfixOp::Step, .. }));
        assert_eq!(body.statements.len(), 1);
    }

    #[test]
    fn for_loop_without_variable() {
        let statement = parse_one("for 1 to 3 { cube }");
        assert!(matches!(
            statement.kind,
            StatementKind::ForLoop { variable: None, .. }
        ));
    }

    #[test]
    fn step_does_not_chain() {
        assert!(parse("for i in 1 to 9 step 2 step 3 { cube }").is_err());
    }

    #[test]
    fn step_requires_a_range() {
        assert!(parse("for i in 5 step 2 { cube }").is_err());
    }

    #[test]
    fn else_if_chain() {
        let statement = parse_one("if a {\ncube\n} else if b {\nsphere\n}");
        let StatementKind::IfElse { else_body: Some(else_body), .. } = statement.kind else {
            panic!("expected else body");
        };
        assert!(matches!(
            else_body.statements[0].kind,
            StatementKind::IfElse { .. }
        ));
    }

    #[test]
    fn if_condition_does_not_eat_body_as_block_argument() {
        let statement = parse_one("if flag { cube }");
        let StatementKind::IfElse { condition, .. } = statement.kind else {
            panic!("expected if");
        };
        assert!(matches!(condition.kind, ExpressionKind::Identifier(n) if n == "flag"));
    }

    #[test]
    fn define_function_and_block_and_expression() {
        assert!(matches!(
            parse_one("define f(x y) { x }").kind,
            StatementKind::Define { definition: Definition::Function { .. }, .. }
        ));
        assert!(matches!(
            parse_one("define b { cube }").kind,
            StatementKind::Define { definition: Definition::Block(_), .. }
        ));
        assert!(matches!(
            parse_one("define x 1 + 2").kind,
            StatementKind::Define { definition: Definition::Expression(_), .. }
        ));
    }

    #[test]
    fn misspelled_operator_suggests_operator() {
        let error = parse("for i in 1 too 5 { cube }").expect_err("expected error");
        let ProgramError::Parser(error) = error else {
            panic!("expected parser error");
        };
        assert_eq!(error.suggestion().as_deref(), Some("to"));
    }

    #[test]
    fn missing_brace_reports_expected() {
        let error = parse("group {\ncube\n").expect_err("expected error");
        assert!(error.message().contains("closing brace"), "{}", error.message());
    }

    #[test]
    fn member_access_chains() {
        let statement = parse_one("print foo.bounds.size");
        let StatementKind::Command { argument: Some(arg), .. } = statement.kind else {
            panic!("expected command");
        };
        let ExpressionKind::Member { receiver, member } = arg.kind else {
            panic!("expected member");
        };
        assert_eq!(member.name, "size");
        assert!(matches!(receiver.kind, ExpressionKind::Member { .. }));
    }

    #[test]
    fn subscript_token_is_rejected() {
        assert!(parse("print foo[1]").is_err());
    }

    #[test]
    fn statement_ranges_do_not_overlap() {
        let program = parse("cube\nsphere\nprint 1 + 2\n").expect("parse failed");
        let mut last_end = 0;
        for statement in &program.statements {
            assert!(statement.range.start >= last_end);
            last_end = statement.range.end;
        }
    }

    #[test]
    fn option_statement_parses() {
        let program = parse("define wheel {\noption size 1\ncube\n}").expect("parse failed");
        let StatementKind::Define { definition: Definition::Block(body), .. } = &program.statements[0].kind else {
            panic!("expected block define");
        };
        assert!(matches!(body.statements[0].kind, StatementKind::Option { .. }));
    }

    #[test]
    fn parse_is_deterministic() {
        let a = parse("cube { size 2 }\nsphere\n").expect("parse failed");
        let b = parse("cube { size 2 }\nsphere\n").expect("parse failed");
        assert_eq!(a, b);
    }
}
