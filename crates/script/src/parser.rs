//! Script Parser
//!
//! Recursive-descent parser producing the AST the evaluator walks. The
//! language is deliberately small: let/assignment, if/else, while, for-in,
//! return, and expressions with the usual precedence ladder.

use crate::error::{ScriptError, ScriptResult};
use crate::lexer::{tokenize, SpannedToken, Token};

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Binary operators, excluding the short-circuiting pair which gets its
/// own node so evaluation order is explicit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

/// Expression nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    Ident(String),
    List(Vec<Expr>),
    Map(Vec<(String, Expr)>),
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Member {
        target: Box<Expr>,
        name: String,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Or {
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// Statement nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let {
        name: String,
        value: Expr,
    },
    Assign {
        target: Expr,
        value: Expr,
    },
    If {
        cond: Expr,
        then_block: Vec<Stmt>,
        else_block: Option<Vec<Stmt>>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    For {
        var: String,
        iter: Expr,
        body: Vec<Stmt>,
    },
    Return(Option<Expr>),
    Expr(Expr),
}

/// Parse a whole script into a statement list.
pub fn parse(source: &str) -> ScriptResult<Vec<Stmt>> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let mut stmts = Vec::new();
    while !parser.at_end() {
        stmts.push(parser.statement()?);
    }
    Ok(stmts)
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos.min(self.tokens.len().saturating_sub(1)))
            .map(|t| t.line)
            .unwrap_or(0)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|t| t.token.clone());
        self.pos += 1;
        token
    }

    fn check(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, context: &str) -> ScriptResult<()> {
        match self.peek() {
            Some(found) if *found == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(ScriptError::parse(format!(
                "line {}: expected {} {context}, found {}",
                self.line(),
                expected.describe(),
                found.describe()
            ))),
            None => Err(ScriptError::parse(format!(
                "unexpected end of script: expected {} {context}",
                expected.describe()
            ))),
        }
    }

    fn expect_ident(&mut self, context: &str) -> ScriptResult<String> {
        match self.advance() {
            Some(Token::Ident(name)) => Ok(name),
            Some(other) => Err(ScriptError::parse(format!(
                "line {}: expected identifier {context}, found {}",
                self.line(),
                other.describe()
            ))),
            None => Err(ScriptError::parse(format!(
                "unexpected end of script: expected identifier {context}"
            ))),
        }
    }

    // -- Statements ------------------------------------------------------

    fn statement(&mut self) -> ScriptResult<Stmt> {
        match self.peek() {
            Some(Token::Let) => {
                self.pos += 1;
                let name = self.expect_ident("after 'let'")?;
                self.expect(Token::Assign, "after variable name")?;
                let value = self.expression()?;
                self.expect(Token::Semi, "after let statement")?;
                Ok(Stmt::Let { name, value })
            }
            Some(Token::If) => {
                self.pos += 1;
                self.if_statement()
            }
            Some(Token::While) => {
                self.pos += 1;
                let cond = self.expression()?;
                let body = self.block()?;
                Ok(Stmt::While { cond, body })
            }
            Some(Token::For) => {
                self.pos += 1;
                let var = self.expect_ident("after 'for'")?;
                self.expect(Token::In, "after loop variable")?;
                let iter = self.expression()?;
                let body = self.block()?;
                Ok(Stmt::For { var, iter, body })
            }
            Some(Token::Return) => {
                self.pos += 1;
                if self.check(&Token::Semi) {
                    return Ok(Stmt::Return(None));
                }
                let value = self.expression()?;
                self.expect(Token::Semi, "after return value")?;
                Ok(Stmt::Return(Some(value)))
            }
            _ => {
                let expr = self.expression()?;
                if self.check(&Token::Assign) {
                    if !matches!(expr, Expr::Ident(_) | Expr::Index { .. } | Expr::Member { .. }) {
                        return Err(ScriptError::parse(format!(
                            "line {}: invalid assignment target",
                            self.line()
                        )));
                    }
                    let value = self.expression()?;
                    self.expect(Token::Semi, "after assignment")?;
                    return Ok(Stmt::Assign {
                        target: expr,
                        value,
                    });
                }
                self.expect(Token::Semi, "after expression")?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn if_statement(&mut self) -> ScriptResult<Stmt> {
        let cond = self.expression()?;
        let then_block = self.block()?;
        let else_block = if self.check(&Token::Else) {
            if self.peek() == Some(&Token::If) {
                self.pos += 1;
                Some(vec![self.if_statement()?])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_block,
            else_block,
        })
    }

    fn block(&mut self) -> ScriptResult<Vec<Stmt>> {
        self.expect(Token::LBrace, "to open a block")?;
        let mut stmts = Vec::new();
        while self.peek() != Some(&Token::RBrace) {
            if self.at_end() {
                return Err(ScriptError::parse(
                    "unexpected end of script: unclosed block".to_string(),
                ));
            }
            stmts.push(self.statement()?);
        }
        self.pos += 1; // consume '}'
        Ok(stmts)
    }

    // -- Expressions (precedence ladder) ---------------------------------

    fn expression(&mut self) -> ScriptResult<Expr> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> ScriptResult<Expr> {
        let mut left = self.and_expr()?;
        while self.check(&Token::OrOr) {
            let right = self.and_expr()?;
            left = Expr::Or {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> ScriptResult<Expr> {
        let mut left = self.equality()?;
        while self.check(&Token::AndAnd) {
            let right = self.equality()?;
            left = Expr::And {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn equality(&mut self) -> ScriptResult<Expr> {
        let mut left = self.comparison()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::NotEq,
                _ => break,
            };
            self.pos += 1;
            let right = self.comparison()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn comparison(&mut self) -> ScriptResult<Expr> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::LtEq) => BinaryOp::LtEq,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::GtEq) => BinaryOp::GtEq,
                _ => break,
            };
            self.pos += 1;
            let right = self.term()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn term(&mut self) -> ScriptResult<Expr> {
        let mut left = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.factor()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn factor(&mut self) -> ScriptResult<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => break,
            };
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> ScriptResult<Expr> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                let expr = self.unary()?;
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    expr: Box::new(expr),
                })
            }
            Some(Token::Not) => {
                self.pos += 1;
                let expr = self.unary()?;
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    expr: Box::new(expr),
                })
            }
            _ => self.postfix(),
        }
    }

    /// Calls, member access, and indexing bind tightest and chain left.
    fn postfix(&mut self) -> ScriptResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                Some(Token::LParen) => {
                    self.pos += 1;
                    let mut args = Vec::new();
                    if self.peek() != Some(&Token::RParen) {
                        loop {
                            args.push(self.expression()?);
                            if !self.check(&Token::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(Token::RParen, "to close the argument list")?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                Some(Token::Dot) => {
                    self.pos += 1;
                    let name = self.expect_ident("after '.'")?;
                    expr = Expr::Member {
                        target: Box::new(expr),
                        name,
                    };
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.expression()?;
                    self.expect(Token::RBracket, "to close the index")?;
                    expr = Expr::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> ScriptResult<Expr> {
        match self.advance() {
            Some(Token::Null) => Ok(Expr::Null),
            Some(Token::True) => Ok(Expr::Bool(true)),
            Some(Token::False) => Ok(Expr::Bool(false)),
            Some(Token::Num(n)) => Ok(Expr::Num(n)),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::Ident(name)) => Ok(Expr::Ident(name)),
            Some(Token::LParen) => {
                let expr = self.expression()?;
                self.expect(Token::RParen, "to close the group")?;
                Ok(expr)
            }
            Some(Token::LBracket) => {
                let mut items = Vec::new();
                if self.peek() != Some(&Token::RBracket) {
                    loop {
                        items.push(self.expression()?);
                        if !self.check(&Token::Comma) {
                            break;
                        }
                    }
                }
                self.expect(Token::RBracket, "to close the list")?;
                Ok(Expr::List(items))
            }
            Some(Token::LBrace) => {
                let mut entries = Vec::new();
                if self.peek() != Some(&Token::RBrace) {
                    loop {
                        let key = match self.advance() {
                            Some(Token::Ident(name)) => name,
                            Some(Token::Str(s)) => s,
                            other => {
                                return Err(ScriptError::parse(format!(
                                    "line {}: expected map key, found {}",
                                    self.line(),
                                    other
                                        .map(|t| t.describe())
                                        .unwrap_or_else(|| "end of script".to_string())
                                )))
                            }
                        };
                        self.expect(Token::Colon, "after map key")?;
                        entries.push((key, self.expression()?));
                        if !self.check(&Token::Comma) {
                            break;
                        }
                    }
                }
                self.expect(Token::RBrace, "to close the map")?;
                Ok(Expr::Map(entries))
            }
            Some(other) => Err(ScriptError::parse(format!(
                "line {}: unexpected {}",
                self.line(),
                other.describe()
            ))),
            None => Err(ScriptError::parse(
                "unexpected end of script".to_string(),
            )),
        }
    }
}
