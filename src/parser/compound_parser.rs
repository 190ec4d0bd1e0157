//! Compound command parsing: if, loops, case, subshell, group,
//! arithmetic command, and function definitions.

use crate::ast::types::*;
use crate::parser::lexer::TokenType;
use crate::parser::parser::Parser;
use crate::parser::types::ParseException;

impl Parser {
    pub(crate) fn parse_if(&mut self) -> Result<CompoundCommandNode, ParseException> {
        self.expect(TokenType::If)?;

        let mut clauses = Vec::new();
        let condition = self.parse_statement_list(&[TokenType::Then])?;
        self.expect(TokenType::Then)?;
        let body = self.parse_statement_list(&[
            TokenType::Elif,
            TokenType::Else,
            TokenType::Fi,
        ])?;
        clauses.push(IfClause { condition, body });

        let mut else_body = None;
        loop {
            match self.current_type() {
                TokenType::Elif => {
                    self.advance();
                    let condition = self.parse_statement_list(&[TokenType::Then])?;
                    self.expect(TokenType::Then)?;
                    let body = self.parse_statement_list(&[
                        TokenType::Elif,
                        TokenType::Else,
                        TokenType::Fi,
                    ])?;
                    clauses.push(IfClause { condition, body });
                }
                TokenType::Else => {
                    self.advance();
                    else_body = Some(self.parse_statement_list(&[TokenType::Fi])?);
                    self.expect(TokenType::Fi)?;
                    break;
                }
                TokenType::Fi => {
                    self.advance();
                    break;
                }
                _ => {
                    return Err(self.error(format!(
                        "expected `elif', `else' or `fi', found `{}'",
                        self.current().value
                    )));
                }
            }
        }

        let redirections = self.parse_trailing_redirections()?;
        Ok(CompoundCommandNode::If(IfNode { clauses, else_body, redirections }))
    }

    pub(crate) fn parse_while(&mut self) -> Result<CompoundCommandNode, ParseException> {
        self.expect(TokenType::While)?;
        let condition = self.parse_statement_list(&[TokenType::Do])?;
        self.expect(TokenType::Do)?;
        let body = self.parse_statement_list(&[TokenType::Done])?;
        self.expect(TokenType::Done)?;
        let redirections = self.parse_trailing_redirections()?;
        Ok(CompoundCommandNode::While(WhileNode { condition, body, redirections }))
    }

    pub(crate) fn parse_until(&mut self) -> Result<CompoundCommandNode, ParseException> {
        self.expect(TokenType::Until)?;
        let condition = self.parse_statement_list(&[TokenType::Do])?;
        self.expect(TokenType::Do)?;
        let body = self.parse_statement_list(&[TokenType::Done])?;
        self.expect(TokenType::Done)?;
        let redirections = self.parse_trailing_redirections()?;
        Ok(CompoundCommandNode::Until(UntilNode { condition, body, redirections }))
    }

    pub(crate) fn parse_for(&mut self) -> Result<CompoundCommandNode, ParseException> {
        self.expect(TokenType::For)?;

        // for (( init; cond; update ))
        if self.current_type() == TokenType::DParenStart {
            return self.parse_c_style_for();
        }

        let var_token = self.advance();
        if !matches!(var_token.token_type, TokenType::Name | TokenType::Word) {
            return Err(ParseException::at_token(
                format!("expected loop variable, found `{}'", var_token.value),
                &var_token,
            ));
        }
        let variable = var_token.value;

        // Optional `in word...`; without it, iterate "$@"
        self.skip_newlines_and_semicolons_before_in();
        let words = if self.eat(TokenType::In) {
            let mut list = Vec::new();
            while self.at_word() {
                self.check_iterations()?;
                list.push(self.parse_word_token()?);
            }
            Some(list)
        } else {
            None
        };

        self.expect_do()?;
        let body = self.parse_statement_list(&[TokenType::Done])?;
        self.expect(TokenType::Done)?;
        let redirections = self.parse_trailing_redirections()?;

        Ok(CompoundCommandNode::For(ForNode { variable, words, body, redirections }))
    }

    fn parse_c_style_for(&mut self) -> Result<CompoundCommandNode, ParseException> {
        self.expect(TokenType::DParenStart)?;
        let inner_token = self.advance();
        let inner = inner_token.value.clone();
        self.expect(TokenType::DParenEnd)?;

        let sections: Vec<&str> = inner.split(';').collect();
        if sections.len() != 3 {
            return Err(ParseException::at_token(
                "expected `((init; condition; update))'",
                &inner_token,
            ));
        }

        let parse_section = |text: &str| -> Result<Option<ArithExpr>, ParseException> {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(crate::parser::arithmetic_parser::parse_arithmetic(trimmed)?))
            }
        };

        let init = parse_section(sections[0])?;
        let condition = parse_section(sections[1])?;
        let update = parse_section(sections[2])?;

        self.expect_do()?;
        let body = self.parse_statement_list(&[TokenType::Done])?;
        self.expect(TokenType::Done)?;
        let redirections = self.parse_trailing_redirections()?;

        Ok(CompoundCommandNode::CStyleFor(CStyleForNode {
            init,
            condition,
            update,
            body,
            redirections,
        }))
    }

    /// Consume the separators before `do` and the `do` itself.
    fn expect_do(&mut self) -> Result<(), ParseException> {
        while matches!(
            self.current_type(),
            TokenType::Semicolon | TokenType::Newline | TokenType::Comment
        ) {
            self.advance();
        }
        self.expect(TokenType::Do)?;
        Ok(())
    }

    fn skip_newlines_and_semicolons_before_in(&mut self) {
        while matches!(self.current_type(), TokenType::Newline | TokenType::Comment) {
            self.advance();
        }
    }

    pub(crate) fn parse_case(&mut self) -> Result<CompoundCommandNode, ParseException> {
        self.expect(TokenType::Case)?;
        if !self.at_word() {
            return Err(self.error("expected word after `case'"));
        }
        let word = self.parse_word_token()?;
        self.skip_newlines();
        self.expect(TokenType::In)?;

        let mut items = Vec::new();
        loop {
            self.check_iterations()?;
            self.skip_newlines();
            if self.eat(TokenType::Esac) {
                break;
            }
            if self.current_type() == TokenType::Eof {
                return Err(self.error("unexpected EOF looking for `esac'"));
            }

            self.eat(TokenType::LParen);
            let mut patterns = Vec::new();
            loop {
                if !self.at_word() {
                    return Err(self.error(format!(
                        "expected case pattern, found `{}'",
                        self.current().value
                    )));
                }
                patterns.push(self.parse_word_token()?);
                if !self.eat(TokenType::Pipe) {
                    break;
                }
            }
            self.expect(TokenType::RParen)?;

            let body = self.parse_statement_list(&[
                TokenType::DSemi,
                TokenType::SemiAnd,
                TokenType::SemiSemiAnd,
                TokenType::Esac,
            ])?;

            let terminator = match self.current_type() {
                TokenType::DSemi => {
                    self.advance();
                    CaseTerminator::Break
                }
                TokenType::SemiAnd => {
                    self.advance();
                    CaseTerminator::FallThrough
                }
                TokenType::SemiSemiAnd => {
                    self.advance();
                    CaseTerminator::Continue
                }
                // Last item may omit the terminator before esac
                _ => CaseTerminator::Break,
            };

            items.push(CaseItemNode { patterns, body, terminator });
        }

        let redirections = self.parse_trailing_redirections()?;
        Ok(CompoundCommandNode::Case(CaseNode { word, items, redirections }))
    }

    pub(crate) fn parse_subshell(&mut self) -> Result<CompoundCommandNode, ParseException> {
        self.expect(TokenType::LParen)?;
        let body = self.parse_statement_list(&[TokenType::RParen])?;
        self.expect(TokenType::RParen)?;
        let redirections = self.parse_trailing_redirections()?;
        Ok(CompoundCommandNode::Subshell(SubshellNode { body, redirections }))
    }

    pub(crate) fn parse_group(&mut self) -> Result<CompoundCommandNode, ParseException> {
        self.expect(TokenType::LBrace)?;
        let body = self.parse_statement_list(&[TokenType::RBrace])?;
        self.expect(TokenType::RBrace)?;
        let redirections = self.parse_trailing_redirections()?;
        Ok(CompoundCommandNode::Group(GroupNode { body, redirections }))
    }

    pub(crate) fn parse_arithmetic_command(
        &mut self,
    ) -> Result<CompoundCommandNode, ParseException> {
        self.expect(TokenType::DParenStart)?;
        let inner_token = self.advance();
        let inner = inner_token.value.trim().to_string();
        self.expect(TokenType::DParenEnd)?;

        let expression = if inner.is_empty() {
            ArithExpr::Number(0)
        } else {
            crate::parser::arithmetic_parser::parse_arithmetic(&inner)?
        };

        let redirections = self.parse_trailing_redirections()?;
        Ok(CompoundCommandNode::Arithmetic(ArithmeticCommandNode { expression, redirections }))
    }

    pub(crate) fn parse_conditional_command(
        &mut self,
    ) -> Result<CompoundCommandNode, ParseException> {
        self.expect(TokenType::DBrackStart)?;
        let expression = self.parse_cond_expression()?;
        self.expect(TokenType::DBrackEnd)?;
        let redirections = self.parse_trailing_redirections()?;
        Ok(CompoundCommandNode::Conditional(ConditionalCommandNode { expression, redirections }))
    }

    pub(crate) fn parse_function_def(&mut self) -> Result<CommandNode, ParseException> {
        let name = if self.eat(TokenType::Function) {
            let token = self.advance();
            if !matches!(token.token_type, TokenType::Name | TokenType::Word) {
                return Err(ParseException::at_token(
                    format!("expected function name, found `{}'", token.value),
                    &token,
                ));
            }
            // Parens are optional with the function keyword
            if self.current_type() == TokenType::LParen {
                self.advance();
                self.expect(TokenType::RParen)?;
            }
            token.value
        } else {
            let token = self.advance();
            self.expect(TokenType::LParen)?;
            self.expect(TokenType::RParen)?;
            token.value
        };

        self.skip_newlines();

        let body = match self.parse_command()? {
            CommandNode::Compound(compound) => compound,
            _ => {
                return Err(self.error(format!(
                    "syntax error: function `{}' requires a compound body",
                    name
                )));
            }
        };

        Ok(CommandNode::FunctionDef(FunctionDefNode {
            name,
            body: Box::new(body),
            redirections: Vec::new(),
        }))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn first_compound(source: &str) -> CompoundCommandNode {
        let script = parse(source).unwrap();
        match script.statements.into_iter().next().unwrap().pipelines.remove(0).commands.remove(0)
        {
            CommandNode::Compound(c) => c,
            other => panic!("expected compound, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_if_else() {
        let node = first_compound("if true; then echo a; else echo b; fi");
        match node {
            CompoundCommandNode::If(n) => {
                assert_eq!(n.clauses.len(), 1);
                assert!(n.else_body.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_if_elif_chain() {
        let node = first_compound("if a; then echo 1; elif b; then echo 2; elif c; then echo 3; fi");
        match node {
            CompoundCommandNode::If(n) => {
                assert_eq!(n.clauses.len(), 3);
                assert!(n.else_body.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_while() {
        let node = first_compound("while true; do echo x; done");
        assert!(matches!(node, CompoundCommandNode::While(_)));
    }

    #[test]
    fn test_parse_until() {
        let node = first_compound("until false; do echo x; done");
        assert!(matches!(node, CompoundCommandNode::Until(_)));
    }

    #[test]
    fn test_parse_for_in() {
        let node = first_compound("for i in a b c; do echo $i; done");
        match node {
            CompoundCommandNode::For(n) => {
                assert_eq!(n.variable, "i");
                assert_eq!(n.words.as_ref().unwrap().len(), 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_for_without_in() {
        let node = first_compound("for arg; do echo $arg; done");
        match node {
            CompoundCommandNode::For(n) => assert!(n.words.is_none()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_c_style_for() {
        let node = first_compound("for ((i=0; i<3; i++)); do echo $i; done");
        match node {
            CompoundCommandNode::CStyleFor(n) => {
                assert!(n.init.is_some());
                assert!(n.condition.is_some());
                assert!(n.update.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_c_style_for_empty_sections() {
        let node = first_compound("for ((;;)); do break; done");
        match node {
            CompoundCommandNode::CStyleFor(n) => {
                assert!(n.init.is_none());
                assert!(n.condition.is_none());
                assert!(n.update.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_case() {
        let node = first_compound("case $x in a) echo a;; b|c) echo bc;; *) echo other;; esac");
        match node {
            CompoundCommandNode::Case(n) => {
                assert_eq!(n.items.len(), 3);
                assert_eq!(n.items[1].patterns.len(), 2);
                assert_eq!(n.items[0].terminator, CaseTerminator::Break);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_case_fallthrough_terminators() {
        let node = first_compound("case x in a) echo a;& b) echo b;;& c) echo c;; esac");
        match node {
            CompoundCommandNode::Case(n) => {
                assert_eq!(n.items[0].terminator, CaseTerminator::FallThrough);
                assert_eq!(n.items[1].terminator, CaseTerminator::Continue);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_subshell_and_group() {
        assert!(matches!(first_compound("(echo a; echo b)"), CompoundCommandNode::Subshell(_)));
        assert!(matches!(first_compound("{ echo a; echo b; }"), CompoundCommandNode::Group(_)));
    }

    #[test]
    fn test_parse_arithmetic_command() {
        let node = first_compound("((x + 1))");
        assert!(matches!(node, CompoundCommandNode::Arithmetic(_)));
    }

    #[test]
    fn test_parse_conditional_command() {
        let node = first_compound("[[ -n $x ]]");
        assert!(matches!(node, CompoundCommandNode::Conditional(_)));
    }

    #[test]
    fn test_group_with_redirection() {
        let node = first_compound("{ echo a; } > out.txt");
        match node {
            CompoundCommandNode::Group(n) => assert_eq!(n.redirections.len(), 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_nested_loops() {
        let node = first_compound("for i in 1 2; do for j in a b; do echo $i$j; done; done");
        match node {
            CompoundCommandNode::For(n) => {
                assert_eq!(n.body.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_if_errors() {
        assert!(parse("if true; then echo a").is_err());
        assert!(parse("while true; do echo a").is_err());
    }
}
