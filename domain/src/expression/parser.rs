//! Tokenizer and recursive-descent parser for restricted arithmetic.
//!
//! Grammar (Python precedence):
//!
//! ```text
//! expr  := term (('+' | '-') term)*
//! term  := unary (('*' | '/') unary)*
//! unary := '-' unary | power
//! power := atom ('**' unary)?
//! atom  := NUMBER | '(' expr ')'
//! ```

use super::CalculationError;
use super::number::Number;

const MAX_DEPTH: usize = 100;
const MAX_OPERATORS: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Parsed expression tree. Only arithmetic nodes exist.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(Number),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Number),
    Plus,
    Minus,
    Star,
    Slash,
    Power,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Plus => "+".to_string(),
            Token::Minus => "-".to_string(),
            Token::Star => "*".to_string(),
            Token::Slash => "/".to_string(),
            Token::Power => "**".to_string(),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalculationError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let (number, next) = read_number(&chars, i)?;
                tokens.push(Token::Number(number));
                i = next;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Power);
                i += 2;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                return Err(CalculationError::Unsupported(
                    "floor division '//'".to_string(),
                ));
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                let mut lookahead = i;
                while lookahead < chars.len() && chars[lookahead].is_whitespace() {
                    lookahead += 1;
                }
                return Err(CalculationError::Unsupported(
                    if chars.get(lookahead) == Some(&'(') {
                        format!("function call '{}(...)'", name)
                    } else {
                        format!("name '{}'", name)
                    },
                ));
            }
            '\'' | '"' => {
                return Err(CalculationError::Unsupported("string literal".to_string()));
            }
            '<' | '>' | '=' | '!' => {
                return Err(CalculationError::Unsupported("comparison".to_string()));
            }
            '[' | ']' => {
                return Err(CalculationError::Unsupported("subscript".to_string()));
            }
            '%' => {
                return Err(CalculationError::Unsupported("operator '%'".to_string()));
            }
            other => {
                return Err(CalculationError::Unsupported(format!(
                    "character '{}'",
                    other
                )));
            }
        }
    }

    Ok(tokens)
}

fn read_number(chars: &[char], start: usize) -> Result<(Number, usize), CalculationError> {
    let mut i = start;
    let mut is_float = false;

    let digits = |i: &mut usize| {
        while *i < chars.len() && (chars[*i].is_ascii_digit() || chars[*i] == '_') {
            *i += 1;
        }
    };

    digits(&mut i);
    if i < chars.len() && chars[i] == '.' {
        is_float = true;
        i += 1;
        digits(&mut i);
    }
    if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
        let mut j = i + 1;
        if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
            j += 1;
        }
        if j < chars.len() && chars[j].is_ascii_digit() {
            is_float = true;
            i = j;
            digits(&mut i);
        }
    }

    let literal: String = chars[start..i].iter().filter(|c| **c != '_').collect();
    if literal == "." {
        return Err(CalculationError::Syntax("unexpected '.'".to_string()));
    }

    let number = if is_float {
        literal
            .parse::<f64>()
            .map(Number::Float)
            .map_err(|_| CalculationError::Syntax(format!("invalid number '{}'", literal)))?
    } else {
        match literal.parse::<i64>() {
            Ok(value) => Number::Int(value),
            Err(_) => literal
                .parse::<f64>()
                .map(Number::Float)
                .map_err(|_| CalculationError::Syntax(format!("invalid number '{}'", literal)))?,
        }
    };
    Ok((number, i))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    operators: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn enter(&mut self) -> Result<(), CalculationError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalculationError::TooDeep);
        }
        Ok(())
    }

    /// Binary chains grow the tree without recursing, so they are counted here.
    fn count_operator(&mut self) -> Result<(), CalculationError> {
        self.operators += 1;
        if self.operators > MAX_OPERATORS {
            return Err(CalculationError::TooLong);
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Expr, CalculationError> {
        let mut lhs = self.term()?;
        while let Some(op) = match self.peek() {
            Some(Token::Plus) => Some(BinaryOp::Add),
            Some(Token::Minus) => Some(BinaryOp::Sub),
            _ => None,
        } {
            self.pos += 1;
            self.count_operator()?;
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, CalculationError> {
        let mut lhs = self.unary()?;
        while let Some(op) = match self.peek() {
            Some(Token::Star) => Some(BinaryOp::Mul),
            Some(Token::Slash) => Some(BinaryOp::Div),
            _ => None,
        } {
            self.pos += 1;
            self.count_operator()?;
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, CalculationError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                self.enter()?;
                let operand = self.unary()?;
                self.depth -= 1;
                Ok(Expr::Neg(Box::new(operand)))
            }
            Some(Token::Plus) => Err(CalculationError::Unsupported("unary '+'".to_string())),
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, CalculationError> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::Power) {
            self.pos += 1;
            self.enter()?;
            self.count_operator()?;
            let exponent = self.unary()?;
            self.depth -= 1;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, CalculationError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::LParen) => {
                self.enter()?;
                let inner = self.expr()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(other) => Err(CalculationError::Syntax(format!(
                        "expected ')' but found '{}'",
                        other.describe()
                    ))),
                    None => Err(CalculationError::Syntax("unclosed '('".to_string())),
                }
            }
            Some(other) => Err(CalculationError::Syntax(format!(
                "unexpected '{}'",
                other.describe()
            ))),
            None => Err(CalculationError::Syntax(
                "unexpected end of expression".to_string(),
            )),
        }
    }
}

/// Parse an expression into an [`Expr`] tree.
pub fn parse(input: &str) -> Result<Expr, CalculationError> {
    if input.trim().is_empty() {
        return Err(CalculationError::Empty);
    }
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        operators: 0,
    };
    let expr = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(CalculationError::Syntax(format!(
            "unexpected '{}'",
            token.describe()
        )));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i64) -> Box<Expr> {
        Box::new(Expr::Number(Number::Int(i)))
    }

    #[test]
    fn test_precedence() {
        let expr = parse("2 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                lhs: int(2),
                rhs: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    lhs: int(2),
                    rhs: int(3),
                }),
            }
        );
    }

    #[test]
    fn test_power_binds_tighter_than_unary_minus() {
        let expr = parse("-2 ** 2").unwrap();
        assert_eq!(
            expr,
            Expr::Neg(Box::new(Expr::Binary {
                op: BinaryOp::Pow,
                lhs: int(2),
                rhs: int(2),
            }))
        );
    }

    #[test]
    fn test_number_literals() {
        assert_eq!(parse("1_000").unwrap(), Expr::Number(Number::Int(1000)));
        assert_eq!(parse("1.5e3").unwrap(), Expr::Number(Number::Float(1500.0)));
        assert_eq!(parse(".5").unwrap(), Expr::Number(Number::Float(0.5)));
    }

    #[test]
    fn test_rejects_names_and_calls() {
        assert_eq!(
            parse("x + 1"),
            Err(CalculationError::Unsupported("name 'x'".to_string()))
        );
        assert_eq!(
            parse("__import__('os')"),
            Err(CalculationError::Unsupported(
                "function call '__import__(...)'".to_string()
            ))
        );
    }

    #[test]
    fn test_rejects_other_node_kinds() {
        assert!(matches!(parse("'a'"), Err(CalculationError::Unsupported(_))));
        assert!(matches!(parse("1 < 2"), Err(CalculationError::Unsupported(_))));
        assert!(matches!(parse("[1][0]"), Err(CalculationError::Unsupported(_))));
        assert!(matches!(parse("7 % 2"), Err(CalculationError::Unsupported(_))));
        assert!(matches!(parse("7 // 2"), Err(CalculationError::Unsupported(_))));
        assert!(matches!(parse("+1"), Err(CalculationError::Unsupported(_))));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(parse("2 +"), Err(CalculationError::Syntax(_))));
        assert!(matches!(parse("(1 + 2"), Err(CalculationError::Syntax(_))));
        assert!(matches!(parse("1 2"), Err(CalculationError::Syntax(_))));
        assert_eq!(parse("   "), Err(CalculationError::Empty));
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        assert_eq!(parse(&deep), Err(CalculationError::TooDeep));
    }

    #[test]
    fn test_operator_limit() {
        let long_sum = format!("{}1", "1+".repeat(200_000));
        assert_eq!(parse(&long_sum), Err(CalculationError::TooLong));

        let long_product = format!("{}2", "2*".repeat(5_000));
        assert_eq!(parse(&long_product), Err(CalculationError::TooLong));

        let within = format!("{}1", "1+".repeat(MAX_OPERATORS));
        assert!(parse(&within).is_ok());
    }
}
