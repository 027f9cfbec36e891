use std::iter::Peekable;
use std::str::Chars;

use crate::error::EvalError;
use crate::expr::Expr;

#[derive(Debug, PartialEq, Clone)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

/// Parse expression text into a typed [`Expr`] tree.
///
/// Grammar (left-associative, `*`/`/` bind tighter than `+`/`-`):
///
/// ```text
/// expr    := term (('+' | '-') term)*
/// term    := factor (('*' | '/') factor)*
/// factor  := '-' primary | primary
/// primary := NUMBER | '(' expr ')'
/// ```
///
/// A factor takes at most one unary minus, so `-(-2)` parses and `--2`
/// does not. Every structural failure maps to
/// [`EvalError::InvalidFormat`].
pub fn parse(input: &str) -> Result<Expr, EvalError> {
    let mut tokens = Tokenizer::new(input);
    let expr = parse_expr(&mut tokens)?;
    if tokens.next_token()?.is_some() {
        return Err(EvalError::InvalidFormat);
    }
    Ok(expr)
}

fn parse_expr(tokens: &mut Tokenizer<'_>) -> Result<Expr, EvalError> {
    let mut left = parse_term(tokens)?;
    while let Some(token) = tokens.peek_token()? {
        match token {
            Token::Plus => {
                tokens.next_token()?;
                let right = parse_term(tokens)?;
                left = Expr::Add(Box::new(left), Box::new(right));
            }
            Token::Minus => {
                tokens.next_token()?;
                let right = parse_term(tokens)?;
                left = Expr::Sub(Box::new(left), Box::new(right));
            }
            _ => break,
        }
    }
    Ok(left)
}

fn parse_term(tokens: &mut Tokenizer<'_>) -> Result<Expr, EvalError> {
    let mut left = parse_factor(tokens)?;
    while let Some(token) = tokens.peek_token()? {
        match token {
            Token::Star => {
                tokens.next_token()?;
                let right = parse_factor(tokens)?;
                left = Expr::Mul(Box::new(left), Box::new(right));
            }
            Token::Slash => {
                tokens.next_token()?;
                let right = parse_factor(tokens)?;
                left = Expr::Div(Box::new(left), Box::new(right));
            }
            _ => break,
        }
    }
    Ok(left)
}

fn parse_factor(tokens: &mut Tokenizer<'_>) -> Result<Expr, EvalError> {
    if matches!(tokens.peek_token()?, Some(Token::Minus)) {
        tokens.next_token()?;
        let inner = parse_primary(tokens)?;
        return Ok(Expr::Neg(Box::new(inner)));
    }
    parse_primary(tokens)
}

fn parse_primary(tokens: &mut Tokenizer<'_>) -> Result<Expr, EvalError> {
    match tokens.next_token()? {
        Some(Token::Number(n)) => Ok(Expr::Number(n)),
        Some(Token::LParen) => {
            let inner = parse_expr(tokens)?;
            match tokens.next_token()? {
                Some(Token::RParen) => Ok(inner),
                _ => Err(EvalError::InvalidFormat),
            }
        }
        _ => Err(EvalError::InvalidFormat),
    }
}

struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    peeked: Option<Token>,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            peeked: None,
        }
    }

    fn peek_token(&mut self) -> Result<Option<Token>, EvalError> {
        if self.peeked.is_none() {
            self.peeked = self.next_token_inner()?;
        }
        Ok(self.peeked.clone())
    }

    fn next_token(&mut self) -> Result<Option<Token>, EvalError> {
        if let Some(t) = self.peeked.take() {
            return Ok(Some(t));
        }
        self.next_token_inner()
    }

    fn next_token_inner(&mut self) -> Result<Option<Token>, EvalError> {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
                continue;
            }
            break;
        }

        let c = match self.chars.next() {
            Some(c) => c,
            None => return Ok(None),
        };

        match c {
            '+' => Ok(Some(Token::Plus)),
            '-' => Ok(Some(Token::Minus)),
            '*' => Ok(Some(Token::Star)),
            '/' => Ok(Some(Token::Slash)),
            '(' => Ok(Some(Token::LParen)),
            ')' => Ok(Some(Token::RParen)),
            _ if c.is_ascii_digit() || c == '.' => {
                let mut s = c.to_string();
                let mut dots = usize::from(c == '.');
                while let Some(&nc) = self.chars.peek() {
                    if nc.is_ascii_digit() {
                        s.push(self.chars.next().unwrap());
                    } else if nc == '.' {
                        dots += 1;
                        if dots > 1 {
                            return Err(EvalError::InvalidFormat);
                        }
                        s.push(self.chars.next().unwrap());
                    } else {
                        break;
                    }
                }
                // A literal needs at least one digit; "." alone is not one.
                if !s.chars().any(|ch| ch.is_ascii_digit()) {
                    return Err(EvalError::InvalidFormat);
                }
                let n = s.parse::<f64>().map_err(|_| EvalError::InvalidFormat)?;
                Ok(Some(Token::Number(n)))
            }
            _ => Err(EvalError::InvalidFormat),
        }
    }
}
