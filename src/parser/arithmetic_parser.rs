//! Arithmetic expression parsing for $(( )) and (( )).
//!
//! A precedence climber over a small token stream. Power and assignment
//! are right-associative, everything else left-associative. Numbers may
//! be decimal, hex (0x), octal (leading 0), or base#digits with base
//! 2..=64.

use crate::ast::types::{ArithAssignOp, ArithBinaryOp, ArithExpr, ArithUnaryOp};
use crate::parser::types::ParseException;

#[derive(Debug, Clone, PartialEq)]
enum AToken {
    Num(i64),
    Ident(String),
    /// $name or ${name}
    Dollar(String),
    /// $(cmd) — the raw command text
    CmdSubst(String),
    Op(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
}

/// Parse an arithmetic expression string into an AST.
pub fn parse_arithmetic(input: &str) -> Result<ArithExpr, ParseException> {
    let tokens = lex_arithmetic(input)?;
    if tokens.is_empty() {
        return Err(ParseException::new("arithmetic: empty expression", 0, 0));
    }
    let mut parser = ArithParser { tokens, pos: 0 };
    let expr = parser.parse_comma()?;
    if parser.pos < parser.tokens.len() {
        return Err(ParseException::new(
            format!("arithmetic: unexpected token after expression in `{}'", input),
            0,
            0,
        ));
    }
    Ok(expr)
}

fn lex_arithmetic(input: &str) -> Result<Vec<AToken>, ParseException> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            let (value, next) = lex_number(&chars, i)?;
            tokens.push(AToken::Num(value));
            i = next;
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let mut j = i;
            while j < chars.len() && (chars[j].is_ascii_alphanumeric() || chars[j] == '_') {
                j += 1;
            }
            // base#digits where the "base" happens to be spelled out is not
            // a thing; but name# would be caught below as an error op
            tokens.push(AToken::Ident(chars[i..j].iter().collect()));
            i = j;
            continue;
        }

        if c == '$' {
            // Nested command substitution: capture the balanced body
            if chars.get(i + 1) == Some(&'(') {
                let mut depth = 0usize;
                let mut j = i + 1;
                while j < chars.len() {
                    match chars[j] {
                        '(' => depth += 1,
                        ')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    j += 1;
                }
                if j >= chars.len() {
                    return Err(ParseException::new("arithmetic: missing `)'", 0, 0));
                }
                let body: String = chars[i + 2..j].iter().collect();
                tokens.push(AToken::CmdSubst(body));
                i = j + 1;
                continue;
            }

            let mut j = i + 1;
            let name = if chars.get(j) == Some(&'{') {
                j += 1;
                let start = j;
                while j < chars.len() && chars[j] != '}' {
                    j += 1;
                }
                if j >= chars.len() {
                    return Err(ParseException::new("arithmetic: missing `}'", 0, 0));
                }
                let name: String = chars[start..j].iter().collect();
                j += 1;
                name
            } else {
                let start = j;
                while j < chars.len() && (chars[j].is_ascii_alphanumeric() || chars[j] == '_') {
                    j += 1;
                }
                chars[start..j].iter().collect()
            };
            if name.is_empty() {
                // Special parameters: $# $? $$ $!
                match chars.get(j) {
                    Some(&c) if matches!(c, '#' | '?' | '$' | '!') => {
                        tokens.push(AToken::Dollar(c.to_string()));
                        i = j + 1;
                        continue;
                    }
                    _ => {
                        return Err(ParseException::new("arithmetic: bad `$' expansion", 0, 0));
                    }
                }
            }
            tokens.push(AToken::Dollar(name));
            i = j;
            continue;
        }

        match c {
            '(' => {
                tokens.push(AToken::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(AToken::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(AToken::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(AToken::RBracket);
                i += 1;
            }
            _ => {
                let (op, len) = lex_operator(&chars, i)?;
                tokens.push(AToken::Op(op));
                i += len;
            }
        }
    }

    Ok(tokens)
}

fn lex_number(chars: &[char], start: usize) -> Result<(i64, usize), ParseException> {
    let mut j = start;
    while j < chars.len() && (chars[j].is_ascii_alphanumeric() || chars[j] == '#') {
        j += 1;
    }
    let text: String = chars[start..j].iter().collect();

    // base#digits
    if let Some(hash) = text.find('#') {
        let base: u32 = text[..hash]
            .parse()
            .map_err(|_| ParseException::new(format!("arithmetic: invalid base in `{}'", text), 0, 0))?;
        if !(2..=64).contains(&base) {
            return Err(ParseException::new(
                format!("arithmetic: invalid arithmetic base: {}", base),
                0,
                0,
            ));
        }
        let digits = &text[hash + 1..];
        if digits.is_empty() {
            return Err(ParseException::new(format!("arithmetic: invalid number `{}'", text), 0, 0));
        }
        let mut value: i64 = 0;
        for c in digits.chars() {
            let d = digit_value(c, base).ok_or_else(|| {
                ParseException::new(
                    format!("arithmetic: value too great for base (error token is \"{}\")", text),
                    0,
                    0,
                )
            })?;
            value = value.wrapping_mul(base as i64).wrapping_add(d as i64);
        }
        return Ok((value, j));
    }

    if text.starts_with("0x") || text.starts_with("0X") {
        let value = i64::from_str_radix(&text[2..], 16)
            .map_err(|_| ParseException::new(format!("arithmetic: invalid number `{}'", text), 0, 0))?;
        return Ok((value, j));
    }

    if text.len() > 1 && text.starts_with('0') {
        let value = i64::from_str_radix(&text[1..], 8)
            .map_err(|_| ParseException::new(format!("arithmetic: invalid octal number `{}'", text), 0, 0))?;
        return Ok((value, j));
    }

    let value = text
        .parse::<i64>()
        .map_err(|_| ParseException::new(format!("arithmetic: invalid number `{}'", text), 0, 0))?;
    Ok((value, j))
}

/// Digit value for base#digits literals: 0-9, a-z (10-35), A-Z (36-61),
/// @ (62), _ (63). Below base 37, letters are case-insensitive.
fn digit_value(c: char, base: u32) -> Option<u32> {
    let v = match c {
        '0'..='9' => c as u32 - '0' as u32,
        'a'..='z' => c as u32 - 'a' as u32 + 10,
        'A'..='Z' => {
            if base <= 36 {
                c as u32 - 'A' as u32 + 10
            } else {
                c as u32 - 'A' as u32 + 36
            }
        }
        '@' => 62,
        '_' => 63,
        _ => return None,
    };
    if v < base {
        Some(v)
    } else {
        None
    }
}

const MULTI_OPS: &[&str] = &[
    "<<=", ">>=", "**", "++", "--", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "+=", "-=",
    "*=", "/=", "%=", "&=", "|=", "^=",
];

const SINGLE_OPS: &[char] = &['+', '-', '*', '/', '%', '<', '>', '!', '~', '&', '|', '^', '?', ':', '=', ','];

fn lex_operator(chars: &[char], i: usize) -> Result<(String, usize), ParseException> {
    for op in MULTI_OPS {
        let op_chars: Vec<char> = op.chars().collect();
        if chars.len() - i >= op_chars.len() && chars[i..i + op_chars.len()] == op_chars[..] {
            return Ok((op.to_string(), op_chars.len()));
        }
    }
    let c = chars[i];
    if SINGLE_OPS.contains(&c) {
        return Ok((c.to_string(), 1));
    }
    Err(ParseException::new(format!("arithmetic: unexpected character `{}'", c), 0, 0))
}

struct ArithParser {
    tokens: Vec<AToken>,
    pos: usize,
}

impl ArithParser {
    fn peek(&self) -> Option<&AToken> {
        self.tokens.get(self.pos)
    }

    fn peek_op(&self) -> Option<&str> {
        match self.peek() {
            Some(AToken::Op(op)) => Some(op.as_str()),
            _ => None,
        }
    }

    fn bump(&mut self) -> Option<AToken> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.peek_op() == Some(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_comma(&mut self) -> Result<ArithExpr, ParseException> {
        let mut left = self.parse_assignment()?;
        while self.eat_op(",") {
            let right = self.parse_assignment()?;
            left = ArithExpr::Binary {
                op: ArithBinaryOp::Comma,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_assignment(&mut self) -> Result<ArithExpr, ParseException> {
        let left = self.parse_ternary()?;

        let assign_op = match self.peek_op() {
            Some("=") => Some(ArithAssignOp::Assign),
            Some("+=") => Some(ArithAssignOp::Add),
            Some("-=") => Some(ArithAssignOp::Sub),
            Some("*=") => Some(ArithAssignOp::Mul),
            Some("/=") => Some(ArithAssignOp::Div),
            Some("%=") => Some(ArithAssignOp::Mod),
            Some("<<=") => Some(ArithAssignOp::LShift),
            Some(">>=") => Some(ArithAssignOp::RShift),
            Some("&=") => Some(ArithAssignOp::And),
            Some("|=") => Some(ArithAssignOp::Or),
            Some("^=") => Some(ArithAssignOp::Xor),
            _ => None,
        };

        if let Some(op) = assign_op {
            let (variable, subscript) = match left {
                ArithExpr::Variable(name) => (name, None),
                ArithExpr::ArrayElement { array, index } => (array, Some(index)),
                _ => {
                    return Err(ParseException::new(
                        "arithmetic: attempted assignment to non-variable",
                        0,
                        0,
                    ));
                }
            };
            self.bump();
            // Right-associative: a = b = c
            let value = self.parse_assignment()?;
            return Ok(ArithExpr::Assignment {
                op,
                variable,
                subscript,
                value: Box::new(value),
            });
        }

        Ok(left)
    }

    fn parse_ternary(&mut self) -> Result<ArithExpr, ParseException> {
        let condition = self.parse_binary(0)?;
        if self.eat_op("?") {
            let consequent = self.parse_assignment()?;
            if !self.eat_op(":") {
                return Err(ParseException::new("arithmetic: expected `:' in ternary", 0, 0));
            }
            let alternate = self.parse_assignment()?;
            return Ok(ArithExpr::Ternary {
                condition: Box::new(condition),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            });
        }
        Ok(condition)
    }

    /// Binary operators by precedence level, lowest first.
    fn parse_binary(&mut self, level: usize) -> Result<ArithExpr, ParseException> {
        const LEVELS: &[&[(&str, ArithBinaryOp)]] = &[
            &[("||", ArithBinaryOp::LogOr)],
            &[("&&", ArithBinaryOp::LogAnd)],
            &[("|", ArithBinaryOp::BitOr)],
            &[("^", ArithBinaryOp::BitXor)],
            &[("&", ArithBinaryOp::BitAnd)],
            &[("==", ArithBinaryOp::Eq), ("!=", ArithBinaryOp::Ne)],
            &[
                ("<=", ArithBinaryOp::Le),
                (">=", ArithBinaryOp::Ge),
                ("<", ArithBinaryOp::Lt),
                (">", ArithBinaryOp::Gt),
            ],
            &[("<<", ArithBinaryOp::LShift), (">>", ArithBinaryOp::RShift)],
            &[("+", ArithBinaryOp::Add), ("-", ArithBinaryOp::Sub)],
            &[
                ("*", ArithBinaryOp::Mul),
                ("/", ArithBinaryOp::Div),
                ("%", ArithBinaryOp::Mod),
            ],
        ];

        if level >= LEVELS.len() {
            return self.parse_power();
        }

        let mut left = self.parse_binary(level + 1)?;
        'outer: loop {
            for (text, op) in LEVELS[level] {
                if self.peek_op() == Some(text) {
                    self.bump();
                    let right = self.parse_binary(level + 1)?;
                    left = ArithExpr::Binary {
                        op: *op,
                        left: Box::new(left),
                        right: Box::new(right),
                    };
                    continue 'outer;
                }
            }
            break;
        }
        Ok(left)
    }

    /// ** binds tighter than * and is right-associative.
    fn parse_power(&mut self) -> Result<ArithExpr, ParseException> {
        let base = self.parse_unary()?;
        if self.eat_op("**") {
            let exponent = self.parse_power()?;
            return Ok(ArithExpr::Binary {
                op: ArithBinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<ArithExpr, ParseException> {
        let op = match self.peek_op() {
            Some("!") => Some(ArithUnaryOp::Not),
            Some("~") => Some(ArithUnaryOp::BitNot),
            Some("-") => Some(ArithUnaryOp::Neg),
            Some("+") => Some(ArithUnaryOp::Pos),
            Some("++") => Some(ArithUnaryOp::Inc),
            Some("--") => Some(ArithUnaryOp::Dec),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let operand = self.parse_unary()?;
            return Ok(ArithExpr::Unary { op, operand: Box::new(operand), prefix: true });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<ArithExpr, ParseException> {
        let mut expr = self.parse_primary()?;
        loop {
            let op = match self.peek_op() {
                Some("++") => ArithUnaryOp::Inc,
                Some("--") => ArithUnaryOp::Dec,
                _ => break,
            };
            // Postfix only applies to assignable operands
            if !matches!(expr, ArithExpr::Variable(_) | ArithExpr::ArrayElement { .. }) {
                break;
            }
            self.bump();
            expr = ArithExpr::Unary { op, operand: Box::new(expr), prefix: false };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<ArithExpr, ParseException> {
        match self.bump() {
            Some(AToken::Num(n)) => Ok(ArithExpr::Number(n)),
            Some(AToken::Dollar(name)) => Ok(ArithExpr::Variable(name)),
            Some(AToken::CmdSubst(body)) => {
                let script = crate::parser::parse(&body)?;
                Ok(ArithExpr::CommandSubst(script))
            }
            Some(AToken::Ident(name)) => {
                if self.peek() == Some(&AToken::LBracket) {
                    self.bump();
                    let index = self.parse_comma()?;
                    if self.bump() != Some(AToken::RBracket) {
                        return Err(ParseException::new("arithmetic: expected `]'", 0, 0));
                    }
                    return Ok(ArithExpr::ArrayElement { array: name, index: Box::new(index) });
                }
                Ok(ArithExpr::Variable(name))
            }
            Some(AToken::LParen) => {
                let inner = self.parse_comma()?;
                if self.bump() != Some(AToken::RParen) {
                    return Err(ParseException::new("arithmetic: expected `)'", 0, 0));
                }
                Ok(ArithExpr::Group(Box::new(inner)))
            }
            other => Err(ParseException::new(
                format!("arithmetic: unexpected token {:?}", other),
                0,
                0,
            )),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
