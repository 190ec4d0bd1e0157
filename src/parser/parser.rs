//! Recursive-descent parser.
//!
//! Consumes the token stream and produces a `ScriptNode`. Statements,
//! pipelines, simple commands and redirections live here; compound
//! commands and `[[ ]]` expressions are in their own modules. Here-doc
//! bodies are attached in a post-pass once the whole script is parsed,
//! matching bodies to redirections in registration order.

use crate::ast::types::*;
use crate::parser::lexer::{tokenize, Token, TokenType};
use crate::parser::types::{
    is_redirection_after_number, is_redirection_token, ParseException, MAX_INPUT_SIZE,
    MAX_PARSE_ITERATIONS,
};
use crate::parser::word_parser::{parse_heredoc_body, parse_word};

/// Parse a source string into a script AST.
pub fn parse(source: &str) -> Result<ScriptNode, ParseException> {
    if source.len() > MAX_INPUT_SIZE {
        return Err(ParseException::new("input too large", 1, 1));
    }
    let tokens = tokenize(source)
        .map_err(|e| ParseException::new(e.message.clone(), e.line, e.column))?;
    if tokens.len() > crate::parser::types::MAX_TOKENS {
        return Err(ParseException::new("too many tokens", 1, 1));
    }
    let mut parser = Parser::new(tokens);
    parser.parse_script()
}

/// Parser state: a cursor over the token stream plus the queue of
/// here-doc bodies awaiting attachment.
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    pub(crate) iterations: usize,
    pub(crate) heredoc_bodies: Vec<String>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, iterations: 0, heredoc_bodies: Vec::new() }
    }

    // -------------------------------------------------------------------------
    // Token helpers
    // -------------------------------------------------------------------------

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn current_type(&self) -> TokenType {
        self.current().token_type
    }

    pub(crate) fn peek_type(&self, offset: usize) -> TokenType {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.token_type)
            .unwrap_or(TokenType::Eof)
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        // Collect here-doc bodies as they stream past
        while self.current_type() == TokenType::HeredocContent {
            let body = self.current().value.clone();
            self.heredoc_bodies.push(body);
            if self.pos < self.tokens.len() - 1 {
                self.pos += 1;
            } else {
                break;
            }
        }
        token
    }

    pub(crate) fn expect(&mut self, token_type: TokenType) -> Result<Token, ParseException> {
        if self.current_type() == token_type {
            Ok(self.advance())
        } else {
            Err(self.error(format!(
                "expected `{}' but found `{}'",
                token_type.as_str(),
                self.current().value
            )))
        }
    }

    pub(crate) fn eat(&mut self, token_type: TokenType) -> bool {
        if self.current_type() == token_type {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> ParseException {
        ParseException::at_token(message, self.current())
    }

    pub(crate) fn check_iterations(&mut self) -> Result<(), ParseException> {
        self.iterations += 1;
        if self.iterations > MAX_PARSE_ITERATIONS {
            return Err(self.error("parser iteration limit exceeded"));
        }
        Ok(())
    }

    /// Skip newlines and comments (draining any here-doc bodies).
    pub(crate) fn skip_newlines(&mut self) {
        while matches!(self.current_type(), TokenType::Newline | TokenType::Comment) {
            self.advance();
        }
    }

    /// Check whether the current word-like token is usable as a word.
    pub(crate) fn at_word(&self) -> bool {
        let t = self.current_type();
        matches!(
            t,
            TokenType::Word
                | TokenType::Name
                | TokenType::Number
                | TokenType::AssignmentWord
        ) || t.is_reserved()
    }

    /// Parse the current token as a word.
    pub(crate) fn parse_word_token(&mut self) -> Result<WordNode, ParseException> {
        let token = self.advance();
        parse_word(&token.raw_value)
    }

    // -------------------------------------------------------------------------
    // Script & statements
    // -------------------------------------------------------------------------

    pub fn parse_script(&mut self) -> Result<ScriptNode, ParseException> {
        let statements = self.parse_statement_list(&[])?;
        if self.current_type() != TokenType::Eof {
            return Err(self.error(format!(
                "syntax error near unexpected token `{}'",
                self.current().value
            )));
        }
        let mut script = ScriptNode { statements };
        let bodies = std::mem::take(&mut self.heredoc_bodies);
        attach_heredoc_bodies(&mut script, bodies)?;
        Ok(script)
    }

    /// Parse statements until EOF or one of the stop token types.
    pub(crate) fn parse_statement_list(
        &mut self,
        stop: &[TokenType],
    ) -> Result<Vec<StatementNode>, ParseException> {
        let mut statements = Vec::new();

        loop {
            self.check_iterations()?;
            self.skip_newlines();

            let t = self.current_type();
            if t == TokenType::Eof || stop.contains(&t) {
                break;
            }
            // Case terminators end a body even when not listed explicitly
            if matches!(t, TokenType::DSemi | TokenType::SemiAnd | TokenType::SemiSemiAnd)
                && !stop.is_empty()
            {
                break;
            }

            let mut statement = self.parse_statement()?;

            // Statement separator: ; & or newline
            match self.current_type() {
                TokenType::Semicolon => {
                    self.advance();
                }
                TokenType::Amp => {
                    self.advance();
                    statement.background = true;
                }
                TokenType::Newline | TokenType::Comment => {
                    self.advance();
                }
                _ => {
                    statements.push(statement);
                    break;
                }
            }
            statements.push(statement);
        }

        Ok(statements)
    }

    /// Parse one statement: pipelines joined by && / ||.
    pub fn parse_statement(&mut self) -> Result<StatementNode, ParseException> {
        let mut pipelines = vec![self.parse_pipeline()?];
        let mut operators = Vec::new();

        loop {
            self.check_iterations()?;
            let op = match self.current_type() {
                TokenType::AndAnd => StatementOperator::And,
                TokenType::OrOr => StatementOperator::Or,
                _ => break,
            };
            self.advance();
            self.skip_newlines();
            operators.push(op);
            pipelines.push(self.parse_pipeline()?);
        }

        Ok(StatementNode { pipelines, operators, background: false })
    }

    /// Parse a pipeline: [!] command (| command)*.
    pub fn parse_pipeline(&mut self) -> Result<PipelineNode, ParseException> {
        let mut negated = false;
        while self.current_type() == TokenType::Bang {
            self.advance();
            negated = !negated;
        }

        let mut commands = vec![self.parse_command()?];

        loop {
            self.check_iterations()?;
            let pipe_stderr = match self.current_type() {
                TokenType::Pipe => false,
                TokenType::PipeAmp => true,
                _ => break,
            };
            if pipe_stderr {
                // |& folds into 2>&1 on the left command
                push_redirection(
                    commands.last_mut().unwrap(),
                    RedirectionNode {
                        fd: Some(2),
                        operator: RedirectionOperator::GreatAnd,
                        target: RedirectionTarget::Word(WordNode::literal("1")),
                    },
                );
            }
            self.advance();
            self.skip_newlines();
            commands.push(self.parse_command()?);
        }

        Ok(PipelineNode { commands, negated })
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    pub fn parse_command(&mut self) -> Result<CommandNode, ParseException> {
        match self.current_type() {
            TokenType::If => self.parse_if().map(CommandNode::Compound),
            TokenType::While => self.parse_while().map(CommandNode::Compound),
            TokenType::Until => self.parse_until().map(CommandNode::Compound),
            TokenType::For => self.parse_for().map(CommandNode::Compound),
            TokenType::Case => self.parse_case().map(CommandNode::Compound),
            TokenType::LParen => self.parse_subshell().map(CommandNode::Compound),
            TokenType::LBrace => self.parse_group().map(CommandNode::Compound),
            TokenType::DParenStart => self.parse_arithmetic_command().map(CommandNode::Compound),
            TokenType::DBrackStart => self.parse_conditional_command().map(CommandNode::Compound),
            TokenType::Function => self.parse_function_def(),
            TokenType::Then
            | TokenType::Else
            | TokenType::Elif
            | TokenType::Fi
            | TokenType::Do
            | TokenType::Done
            | TokenType::Esac => {
                Err(self.error(format!(
                    "syntax error near unexpected token `{}'",
                    self.current().value
                )))
            }
            _ => {
                // name () { ... } function definition
                if matches!(self.current_type(), TokenType::Name | TokenType::Word)
                    && self.peek_type(1) == TokenType::LParen
                    && self.peek_type(2) == TokenType::RParen
                {
                    return self.parse_function_def();
                }
                self.parse_simple_command().map(CommandNode::Simple)
            }
        }
    }

    /// Parse a simple command: assignments, name, args, redirections.
    pub fn parse_simple_command(&mut self) -> Result<SimpleCommandNode, ParseException> {
        let mut assignments = Vec::new();
        let mut name: Option<WordNode> = None;
        let mut args = Vec::new();
        let mut redirections = Vec::new();

        loop {
            self.check_iterations()?;
            let t = self.current_type();

            // A bare number binds as an fd only directly before a redirection
            if t == TokenType::Number && is_redirection_after_number(self.peek_type(1)) {
                redirections.push(self.parse_redirection()?);
                continue;
            }

            if is_redirection_token(t) {
                redirections.push(self.parse_redirection()?);
                continue;
            }

            if t == TokenType::AssignmentWord && name.is_none() {
                assignments.push(self.parse_assignment()?);
                continue;
            }

            if self.at_word() {
                let word = self.parse_word_token()?;
                if name.is_none() {
                    name = Some(word);
                } else {
                    args.push(word);
                }
                continue;
            }

            break;
        }

        if assignments.is_empty() && name.is_none() && redirections.is_empty() {
            return Err(self.error(format!(
                "syntax error near unexpected token `{}'",
                self.current().value
            )));
        }

        Ok(SimpleCommandNode { assignments, name, args, redirections })
    }

    /// Parse an assignment word, including `name=(a b c)` array literals.
    pub(crate) fn parse_assignment(&mut self) -> Result<AssignmentNode, ParseException> {
        let token = self.advance();
        let raw = &token.raw_value;

        let (name, subscript, append, eq) = split_assignment(raw)
            .ok_or_else(|| ParseException::at_token("invalid assignment", &token))?;
        let rhs = &raw[eq + 1..];

        // Array literal: `name=` immediately followed by ( ... )
        if rhs.is_empty() && self.current_type() == TokenType::LParen {
            self.advance();
            let mut elements = Vec::new();
            loop {
                self.check_iterations()?;
                self.skip_newlines();
                if self.current_type() == TokenType::RParen {
                    self.advance();
                    break;
                }
                if self.current_type() == TokenType::Eof {
                    return Err(self.error("unexpected EOF in array assignment"));
                }
                if !self.at_word() {
                    return Err(self.error(format!(
                        "syntax error near unexpected token `{}' in array assignment",
                        self.current().value
                    )));
                }
                elements.push(self.parse_word_token()?);
            }
            return Ok(AssignmentNode {
                name,
                subscript,
                value: None,
                append,
                array: Some(elements),
            });
        }

        let value = if rhs.is_empty() { WordNode::new(vec![]) } else { parse_word(rhs)? };
        Ok(AssignmentNode { name, subscript, value: Some(value), append, array: None })
    }

    // -------------------------------------------------------------------------
    // Redirections
    // -------------------------------------------------------------------------

    pub(crate) fn parse_redirection(&mut self) -> Result<RedirectionNode, ParseException> {
        let fd = if self.current_type() == TokenType::Number
            && is_redirection_after_number(self.peek_type(1))
        {
            let token = self.advance();
            Some(token.value.parse::<i32>().map_err(|_| {
                ParseException::at_token("invalid file descriptor", &token)
            })?)
        } else {
            None
        };

        let op_token = self.advance();
        let operator = match op_token.token_type {
            TokenType::Less => RedirectionOperator::Less,
            TokenType::Great => RedirectionOperator::Great,
            TokenType::DGreat => RedirectionOperator::DGreat,
            TokenType::LessAnd => RedirectionOperator::LessAnd,
            TokenType::GreatAnd => RedirectionOperator::GreatAnd,
            TokenType::LessGreat => RedirectionOperator::LessGreat,
            TokenType::Clobber => RedirectionOperator::Clobber,
            TokenType::AndGreat => RedirectionOperator::AndGreat,
            TokenType::AndDGreat => RedirectionOperator::AndDGreat,
            TokenType::TLess => RedirectionOperator::TLess,
            TokenType::DLess => RedirectionOperator::DLess,
            TokenType::DLessDash => RedirectionOperator::DLessDash,
            _ => {
                return Err(ParseException::at_token(
                    format!("expected redirection operator, found `{}'", op_token.value),
                    &op_token,
                ));
            }
        };

        // Here-doc: the delimiter word follows; the body arrives later
        if matches!(operator, RedirectionOperator::DLess | RedirectionOperator::DLessDash) {
            if !self.at_word() {
                return Err(self.error("expected here-document delimiter"));
            }
            let delim_token = self.advance();
            let quoted = delim_token.raw_value != delim_token.value;
            return Ok(RedirectionNode {
                fd,
                operator,
                target: RedirectionTarget::HereDoc(HereDocNode {
                    delimiter: delim_token.value,
                    content: None,
                    strip_tabs: operator == RedirectionOperator::DLessDash,
                    quoted,
                }),
            });
        }

        if !self.at_word() {
            return Err(self.error(format!(
                "syntax error near unexpected token `{}'",
                self.current().value
            )));
        }
        let target = self.parse_word_token()?;
        Ok(RedirectionNode { fd, operator, target: RedirectionTarget::Word(target) })
    }

    /// Parse redirections trailing a compound command.
    pub(crate) fn parse_trailing_redirections(
        &mut self,
    ) -> Result<Vec<RedirectionNode>, ParseException> {
        let mut redirections = Vec::new();
        loop {
            let t = self.current_type();
            if t == TokenType::Number && is_redirection_after_number(self.peek_type(1)) {
                redirections.push(self.parse_redirection()?);
            } else if is_redirection_token(t) {
                redirections.push(self.parse_redirection()?);
            } else {
                break;
            }
        }
        Ok(redirections)
    }
}

/// Split an assignment word's raw text into (name, subscript, append, eq_index).
pub(crate) fn split_assignment(raw: &str) -> Option<(String, Option<String>, bool, usize)> {
    let chars: Vec<char> = raw.chars().collect();
    let mut i = 0;
    match chars.first() {
        Some(c) if c.is_ascii_alphabetic() || *c == '_' => i += 1,
        _ => return None,
    }
    while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
        i += 1;
    }
    let name: String = chars[..i].iter().collect();

    let mut subscript = None;
    if chars.get(i) == Some(&'[') {
        let mut depth = 0;
        let sub_start = i + 1;
        while i < chars.len() {
            match chars[i] {
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        if depth != 0 {
            return None;
        }
        subscript = Some(chars[sub_start..i].iter().collect());
        i += 1;
    }

    let append = chars.get(i) == Some(&'+');
    if append {
        i += 1;
    }
    if chars.get(i) != Some(&'=') {
        return None;
    }

    // eq byte index for slicing the RHS
    let eq_byte = raw.char_indices().nth(i).map(|(b, _)| b)?;
    Some((name, subscript, append, eq_byte))
}

fn push_redirection(command: &mut CommandNode, redirection: RedirectionNode) {
    match command {
        CommandNode::Simple(c) => c.redirections.push(redirection),
        CommandNode::FunctionDef(c) => c.redirections.push(redirection),
        CommandNode::Compound(c) => match c {
            CompoundCommandNode::If(n) => n.redirections.push(redirection),
            CompoundCommandNode::For(n) => n.redirections.push(redirection),
            CompoundCommandNode::CStyleFor(n) => n.redirections.push(redirection),
            CompoundCommandNode::While(n) => n.redirections.push(redirection),
            CompoundCommandNode::Until(n) => n.redirections.push(redirection),
            CompoundCommandNode::Case(n) => n.redirections.push(redirection),
            CompoundCommandNode::Subshell(n) => n.redirections.push(redirection),
            CompoundCommandNode::Group(n) => n.redirections.push(redirection),
            CompoundCommandNode::Arithmetic(n) => n.redirections.push(redirection),
            CompoundCommandNode::Conditional(n) => n.redirections.push(redirection),
        },
    }
}

// =============================================================================
// HERE-DOC ATTACHMENT
// =============================================================================

/// Fill empty here-doc contents with the collected bodies, matching them
/// in source (registration) order via a pre-order walk.
fn attach_heredoc_bodies(
    script: &mut ScriptNode,
    bodies: Vec<String>,
) -> Result<(), ParseException> {
    let mut queue = bodies.into_iter();
    attach_in_statements(&mut script.statements, &mut queue)
}

fn attach_in_statements(
    statements: &mut [StatementNode],
    queue: &mut std::vec::IntoIter<String>,
) -> Result<(), ParseException> {
    for statement in statements {
        for pipeline in &mut statement.pipelines {
            for command in &mut pipeline.commands {
                attach_in_command(command, queue)?;
            }
        }
    }
    Ok(())
}

fn attach_in_command(
    command: &mut CommandNode,
    queue: &mut std::vec::IntoIter<String>,
) -> Result<(), ParseException> {
    match command {
        CommandNode::Simple(c) => attach_in_redirections(&mut c.redirections, queue)?,
        CommandNode::FunctionDef(c) => {
            attach_in_compound(&mut c.body, queue)?;
            attach_in_redirections(&mut c.redirections, queue)?;
        }
        CommandNode::Compound(c) => attach_in_compound(c, queue)?,
    }
    Ok(())
}

fn attach_in_compound(
    compound: &mut CompoundCommandNode,
    queue: &mut std::vec::IntoIter<String>,
) -> Result<(), ParseException> {
    match compound {
        CompoundCommandNode::If(n) => {
            for clause in &mut n.clauses {
                attach_in_statements(&mut clause.condition, queue)?;
                attach_in_statements(&mut clause.body, queue)?;
            }
            if let Some(body) = &mut n.else_body {
                attach_in_statements(body, queue)?;
            }
            attach_in_redirections(&mut n.redirections, queue)?;
        }
        CompoundCommandNode::For(n) => {
            attach_in_statements(&mut n.body, queue)?;
            attach_in_redirections(&mut n.redirections, queue)?;
        }
        CompoundCommandNode::CStyleFor(n) => {
            attach_in_statements(&mut n.body, queue)?;
            attach_in_redirections(&mut n.redirections, queue)?;
        }
        CompoundCommandNode::While(n) => {
            attach_in_statements(&mut n.condition, queue)?;
            attach_in_statements(&mut n.body, queue)?;
            attach_in_redirections(&mut n.redirections, queue)?;
        }
        CompoundCommandNode::Until(n) => {
            attach_in_statements(&mut n.condition, queue)?;
            attach_in_statements(&mut n.body, queue)?;
            attach_in_redirections(&mut n.redirections, queue)?;
        }
        CompoundCommandNode::Case(n) => {
            for item in &mut n.items {
                attach_in_statements(&mut item.body, queue)?;
            }
            attach_in_redirections(&mut n.redirections, queue)?;
        }
        CompoundCommandNode::Subshell(n) => {
            attach_in_statements(&mut n.body, queue)?;
            attach_in_redirections(&mut n.redirections, queue)?;
        }
        CompoundCommandNode::Group(n) => {
            attach_in_statements(&mut n.body, queue)?;
            attach_in_redirections(&mut n.redirections, queue)?;
        }
        CompoundCommandNode::Arithmetic(n) => {
            attach_in_redirections(&mut n.redirections, queue)?;
        }
        CompoundCommandNode::Conditional(n) => {
            attach_in_redirections(&mut n.redirections, queue)?;
        }
    }
    Ok(())
}

fn attach_in_redirections(
    redirections: &mut [RedirectionNode],
    queue: &mut std::vec::IntoIter<String>,
) -> Result<(), ParseException> {
    for redirection in redirections {
        if let RedirectionTarget::HereDoc(heredoc) = &mut redirection.target {
            if heredoc.content.is_none() {
                let body = queue.next().unwrap_or_default();
                let word = if heredoc.quoted {
                    WordNode::new(vec![WordPart::Literal(body)])
                } else {
                    parse_heredoc_body(&body)?
                };
                heredoc.content = Some(word);
            }
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(source: &str) -> StatementNode {
        let script = parse(source).unwrap();
        assert_eq!(script.statements.len(), 1, "expected one statement in {:?}", source);
        script.statements.into_iter().next().unwrap()
    }

    fn simple(cmd: &CommandNode) -> &SimpleCommandNode {
        match cmd {
            CommandNode::Simple(c) => c,
            other => panic!("expected simple command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_command() {
        let stmt = parse_one("echo hello world");
        let cmd = simple(&stmt.pipelines[0].commands[0]);
        assert_eq!(cmd.name, Some(WordNode::literal("echo")));
        assert_eq!(cmd.args.len(), 2);
    }

    #[test]
    fn test_parse_and_or_chain() {
        let stmt = parse_one("a && b || c");
        assert_eq!(stmt.pipelines.len(), 3);
        assert_eq!(stmt.operators, vec![StatementOperator::And, StatementOperator::Or]);
    }

    #[test]
    fn test_parse_pipeline() {
        let stmt = parse_one("a | b | c");
        assert_eq!(stmt.pipelines[0].commands.len(), 3);
    }

    #[test]
    fn test_parse_negated_pipeline() {
        let stmt = parse_one("! true");
        assert!(stmt.pipelines[0].negated);
    }

    #[test]
    fn test_pipe_amp_folds_stderr() {
        let stmt = parse_one("a |& b");
        let cmd = simple(&stmt.pipelines[0].commands[0]);
        assert_eq!(cmd.redirections.len(), 1);
        assert_eq!(cmd.redirections[0].fd, Some(2));
        assert_eq!(cmd.redirections[0].operator, RedirectionOperator::GreatAnd);
    }

    #[test]
    fn test_parse_background() {
        let script = parse("sleep 5 &").unwrap();
        assert!(script.statements[0].background);
    }

    #[test]
    fn test_parse_assignments() {
        let stmt = parse_one("FOO=bar BAZ=qux cmd");
        let cmd = simple(&stmt.pipelines[0].commands[0]);
        assert_eq!(cmd.assignments.len(), 2);
        assert_eq!(cmd.assignments[0].name, "FOO");
        assert!(!cmd.assignments[0].append);
    }

    #[test]
    fn test_parse_assignment_only() {
        let stmt = parse_one("X=1");
        let cmd = simple(&stmt.pipelines[0].commands[0]);
        assert!(cmd.name.is_none());
        assert_eq!(cmd.assignments.len(), 1);
    }

    #[test]
    fn test_parse_append_assignment() {
        let stmt = parse_one("X+=more");
        let cmd = simple(&stmt.pipelines[0].commands[0]);
        assert!(cmd.assignments[0].append);
    }

    #[test]
    fn test_parse_array_assignment() {
        let stmt = parse_one("arr=(a b c)");
        let cmd = simple(&stmt.pipelines[0].commands[0]);
        let array = cmd.assignments[0].array.as_ref().unwrap();
        assert_eq!(array.len(), 3);
    }

    #[test]
    fn test_parse_subscript_assignment() {
        let stmt = parse_one("arr[2]=x");
        let cmd = simple(&stmt.pipelines[0].commands[0]);
        assert_eq!(cmd.assignments[0].subscript.as_deref(), Some("2"));
    }

    #[test]
    fn test_assignment_after_name_is_argument() {
        let stmt = parse_one("env FOO=bar cmd");
        let cmd = simple(&stmt.pipelines[0].commands[0]);
        assert!(cmd.assignments.is_empty());
        assert_eq!(cmd.args.len(), 2);
    }

    #[test]
    fn test_parse_redirections() {
        let stmt = parse_one("cmd > out.txt 2>&1 < in.txt");
        let cmd = simple(&stmt.pipelines[0].commands[0]);
        assert_eq!(cmd.redirections.len(), 3);
        assert_eq!(cmd.redirections[0].operator, RedirectionOperator::Great);
        assert_eq!(cmd.redirections[1].fd, Some(2));
        assert_eq!(cmd.redirections[2].operator, RedirectionOperator::Less);
    }

    #[test]
    fn test_number_without_redirection_is_word() {
        let stmt = parse_one("echo 2");
        let cmd = simple(&stmt.pipelines[0].commands[0]);
        assert_eq!(cmd.args.len(), 1);
        assert!(cmd.redirections.is_empty());
    }

    #[test]
    fn test_parse_heredoc() {
        let script = parse("cat <<EOF\nhello $USER\nEOF\n").unwrap();
        let cmd = match &script.statements[0].pipelines[0].commands[0] {
            CommandNode::Simple(c) => c,
            other => panic!("unexpected {:?}", other),
        };
        match &cmd.redirections[0].target {
            RedirectionTarget::HereDoc(h) => {
                assert_eq!(h.delimiter, "EOF");
                assert!(!h.quoted);
                let content = h.content.as_ref().unwrap();
                assert!(content
                    .parts
                    .iter()
                    .any(|p| matches!(p, WordPart::ParameterExpansion(_))));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_quoted_heredoc_is_literal() {
        let script = parse("cat <<'EOF'\nhello $USER\nEOF\n").unwrap();
        let cmd = match &script.statements[0].pipelines[0].commands[0] {
            CommandNode::Simple(c) => c,
            other => panic!("unexpected {:?}", other),
        };
        match &cmd.redirections[0].target {
            RedirectionTarget::HereDoc(h) => {
                assert!(h.quoted);
                assert_eq!(
                    h.content.as_ref().unwrap().parts,
                    vec![WordPart::Literal("hello $USER\n".to_string())]
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_function_def() {
        let stmt = parse_one("greet() { echo hi; }");
        match &stmt.pipelines[0].commands[0] {
            CommandNode::FunctionDef(f) => {
                assert_eq!(f.name, "greet");
                assert!(matches!(*f.body, CompoundCommandNode::Group(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_function_keyword() {
        let stmt = parse_one("function greet { echo hi; }");
        assert!(matches!(stmt.pipelines[0].commands[0], CommandNode::FunctionDef(_)));
    }

    #[test]
    fn test_multiple_statements() {
        let script = parse("echo a; echo b\necho c").unwrap();
        assert_eq!(script.statements.len(), 3);
    }

    #[test]
    fn test_misplaced_token_errors() {
        assert!(parse("do echo; done").is_err());
        assert!(parse("fi").is_err());
        assert!(parse(")").is_err());
    }

    #[test]
    fn test_reserved_word_as_argument() {
        let stmt = parse_one("echo for done");
        let cmd = simple(&stmt.pipelines[0].commands[0]);
        assert_eq!(cmd.args.len(), 2);
    }

    #[test]
    fn test_comments_are_skipped() {
        let script = parse("# leading comment\necho hi # trailing\n").unwrap();
        assert_eq!(script.statements.len(), 1);
    }

    #[test]
    fn test_split_assignment() {
        let (name, sub, append, eq) = split_assignment("FOO=bar").unwrap();
        assert_eq!(name, "FOO");
        assert!(sub.is_none());
        assert!(!append);
        assert_eq!(eq, 3);

        let (name, sub, append, _) = split_assignment("a[i+1]+=x").unwrap();
        assert_eq!(name, "a");
        assert_eq!(sub.as_deref(), Some("i+1"));
        assert!(append);
    }
}
