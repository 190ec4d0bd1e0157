//! Conditional expression parsing for [[ ]].
//!
//! Small precedence climber: || lowest, then &&, then !, grouping with
//! ( ), unary file/string predicates, and binary comparisons. Operand
//! positions are ordinary words.

use crate::ast::types::{CondBinaryOp, CondExpr, CondUnaryOp, WordNode};
use crate::parser::lexer::TokenType;
use crate::parser::parser::Parser;
use crate::parser::types::ParseException;
use crate::parser::word_parser::parse_word;

fn unary_op_for(value: &str) -> Option<CondUnaryOp> {
    match value {
        "-e" | "-a" => Some(CondUnaryOp::Exists),
        "-f" => Some(CondUnaryOp::IsFile),
        "-d" => Some(CondUnaryOp::IsDirectory),
        "-h" | "-L" => Some(CondUnaryOp::IsSymlink),
        "-r" => Some(CondUnaryOp::IsReadable),
        "-w" => Some(CondUnaryOp::IsWritable),
        "-x" => Some(CondUnaryOp::IsExecutable),
        "-s" => Some(CondUnaryOp::NonEmptyFile),
        "-z" => Some(CondUnaryOp::IsZero),
        "-n" => Some(CondUnaryOp::IsNonZero),
        "-v" => Some(CondUnaryOp::IsSetVar),
        "-t" => Some(CondUnaryOp::IsTty),
        _ => None,
    }
}

fn binary_op_for(value: &str) -> Option<CondBinaryOp> {
    match value {
        "=" | "==" => Some(CondBinaryOp::Eq),
        "!=" => Some(CondBinaryOp::Ne),
        "=~" => Some(CondBinaryOp::Match),
        "-eq" => Some(CondBinaryOp::NumEq),
        "-ne" => Some(CondBinaryOp::NumNe),
        "-lt" => Some(CondBinaryOp::NumLt),
        "-le" => Some(CondBinaryOp::NumLe),
        "-gt" => Some(CondBinaryOp::NumGt),
        "-ge" => Some(CondBinaryOp::NumGe),
        "-nt" => Some(CondBinaryOp::Nt),
        "-ot" => Some(CondBinaryOp::Ot),
        "-ef" => Some(CondBinaryOp::Ef),
        _ => None,
    }
}

impl Parser {
    pub(crate) fn parse_cond_expression(&mut self) -> Result<CondExpr, ParseException> {
        self.parse_cond_or()
    }

    fn parse_cond_or(&mut self) -> Result<CondExpr, ParseException> {
        let mut left = self.parse_cond_and()?;
        while self.current_type() == TokenType::OrOr {
            self.advance();
            self.skip_newlines();
            let right = self.parse_cond_and()?;
            left = CondExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_cond_and(&mut self) -> Result<CondExpr, ParseException> {
        let mut left = self.parse_cond_not()?;
        while self.current_type() == TokenType::AndAnd {
            self.advance();
            self.skip_newlines();
            let right = self.parse_cond_not()?;
            left = CondExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_cond_not(&mut self) -> Result<CondExpr, ParseException> {
        if self.current_type() == TokenType::Bang {
            self.advance();
            let operand = self.parse_cond_not()?;
            return Ok(CondExpr::Not(Box::new(operand)));
        }
        if self.current_type() == TokenType::LParen {
            self.advance();
            self.skip_newlines();
            let inner = self.parse_cond_or()?;
            self.skip_newlines();
            self.expect(TokenType::RParen)?;
            return Ok(CondExpr::Group(Box::new(inner)));
        }
        self.parse_cond_primary()
    }

    fn parse_cond_primary(&mut self) -> Result<CondExpr, ParseException> {
        if !self.at_word() {
            return Err(self.error(format!(
                "conditional expression: unexpected token `{}'",
                self.current().value
            )));
        }

        // Unary predicate: -f word, -z word, ...
        if let Some(op) = unary_op_for(&self.current().value) {
            if self.peek_is_cond_operand() {
                self.advance();
                let operand = self.parse_cond_operand()?;
                return Ok(CondExpr::Unary { op, operand });
            }
        }

        let left = self.parse_cond_operand()?;

        // Binary comparison, including the lexicographic < and >
        let op = match self.current_type() {
            TokenType::Less => Some(CondBinaryOp::Lt),
            TokenType::Great => Some(CondBinaryOp::Gt),
            _ => {
                if self.at_word() {
                    binary_op_for(&self.current().value)
                } else {
                    None
                }
            }
        };

        if let Some(op) = op {
            self.advance();
            let right = if op == CondBinaryOp::Match {
                self.parse_regex_operand()?
            } else {
                self.parse_cond_operand()?
            };
            return Ok(CondExpr::Binary { op, left, right });
        }

        Ok(CondExpr::Word(left))
    }

    fn peek_is_cond_operand(&self) -> bool {
        matches!(
            self.peek_type(1),
            TokenType::Word | TokenType::Name | TokenType::Number | TokenType::AssignmentWord
        ) || self.peek_type(1).is_reserved()
    }

    fn parse_cond_operand(&mut self) -> Result<WordNode, ParseException> {
        if !self.at_word() {
            return Err(self.error(format!(
                "conditional expression: expected operand, found `{}'",
                self.current().value
            )));
        }
        self.parse_word_token()
    }

    /// The right side of =~ may span several tokens (an unquoted regex
    /// containing parens); join adjacent tokens back together.
    fn parse_regex_operand(&mut self) -> Result<WordNode, ParseException> {
        let mut text = String::new();
        let mut last_end: Option<usize> = None;

        loop {
            match self.current_type() {
                TokenType::DBrackEnd
                | TokenType::AndAnd
                | TokenType::OrOr
                | TokenType::Newline
                | TokenType::Eof => break,
                _ => {}
            }
            let token = self.advance();
            if let Some(end) = last_end {
                if token.start > end {
                    text.push(' ');
                }
            }
            last_end = Some(token.end);
            text.push_str(&token.raw_value);
        }

        if text.is_empty() {
            return Err(self.error("conditional expression: expected regex after `=~'"));
        }
        parse_word(&text)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::{CommandNode, CompoundCommandNode};
    use crate::parser::parse;

    fn cond(source: &str) -> CondExpr {
        let script = parse(source).unwrap();
        match script.statements.into_iter().next().unwrap().pipelines.remove(0).commands.remove(0)
        {
            CommandNode::Compound(CompoundCommandNode::Conditional(n)) => n.expression,
            other => panic!("expected conditional, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_predicates() {
        assert!(matches!(
            cond("[[ -z $x ]]"),
            CondExpr::Unary { op: CondUnaryOp::IsZero, .. }
        ));
        assert!(matches!(
            cond("[[ -f /etc/passwd ]]"),
            CondExpr::Unary { op: CondUnaryOp::IsFile, .. }
        ));
        assert!(matches!(
            cond("[[ -d /tmp ]]"),
            CondExpr::Unary { op: CondUnaryOp::IsDirectory, .. }
        ));
    }

    #[test]
    fn test_binary_string_comparison() {
        assert!(matches!(
            cond("[[ $a == $b ]]"),
            CondExpr::Binary { op: CondBinaryOp::Eq, .. }
        ));
        assert!(matches!(
            cond("[[ $a != $b ]]"),
            CondExpr::Binary { op: CondBinaryOp::Ne, .. }
        ));
        assert!(matches!(
            cond("[[ a < b ]]"),
            CondExpr::Binary { op: CondBinaryOp::Lt, .. }
        ));
    }

    #[test]
    fn test_binary_numeric_comparison() {
        assert!(matches!(
            cond("[[ 1 -lt 2 ]]"),
            CondExpr::Binary { op: CondBinaryOp::NumLt, .. }
        ));
        assert!(matches!(
            cond("[[ $x -ge 0 ]]"),
            CondExpr::Binary { op: CondBinaryOp::NumGe, .. }
        ));
    }

    #[test]
    fn test_regex_match() {
        assert!(matches!(
            cond("[[ $x =~ ^ab+c$ ]]"),
            CondExpr::Binary { op: CondBinaryOp::Match, .. }
        ));
    }

    #[test]
    fn test_regex_with_parens() {
        match cond("[[ $x =~ ^a(b)+$ ]]") {
            CondExpr::Binary { op: CondBinaryOp::Match, right, .. } => {
                // The parens survived into the regex word
                assert!(!right.parts.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_negation_and_grouping() {
        assert!(matches!(cond("[[ ! -e /nope ]]"), CondExpr::Not(_)));
        assert!(matches!(
            cond("[[ ( -n $a || -n $b ) && -n $c ]]"),
            CondExpr::And(_, _)
        ));
    }

    #[test]
    fn test_and_or_precedence() {
        // a || b && c parses as a || (b && c)
        match cond("[[ -n $a || -n $b && -n $c ]]") {
            CondExpr::Or(_, right) => assert!(matches!(*right, CondExpr::And(_, _))),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bare_word() {
        assert!(matches!(cond("[[ $x ]]"), CondExpr::Word(_)));
    }
}
