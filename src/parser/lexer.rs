//! Lexer for shell scripts.
//!
//! Tokenizes input into a flat token stream for the parser:
//! - operators and delimiters (longest match first)
//! - words, with quote tracking and balanced `$()`, `$(())`, `${}` and
//!   backtick spans carried through uninterpreted
//! - comments and newlines
//! - here-document bodies, collected after the newline that follows the
//!   redirection that registered them

use std::collections::HashMap;

/// Token types produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Eof,

    // Separators
    Newline,
    Semicolon,
    Amp, // &

    // Operators
    Pipe,    // |
    PipeAmp, // |&
    AndAnd,  // &&
    OrOr,    // ||
    Bang,    // !

    // Redirections
    Less,      // <
    Great,     // >
    DLess,     // <<
    DGreat,    // >>
    LessAnd,   // <&
    GreatAnd,  // >&
    LessGreat, // <>
    DLessDash, // <<-
    Clobber,   // >|
    TLess,     // <<<
    AndGreat,  // &>
    AndDGreat, // &>>

    // Grouping
    LParen, // (
    RParen, // )
    LBrace, // {
    RBrace, // }

    // Case terminators
    DSemi,       // ;;
    SemiAnd,     // ;&
    SemiSemiAnd, // ;;&

    // Compound commands
    DBrackStart, // [[
    DBrackEnd,   // ]]
    DParenStart, // ((
    DParenEnd,   // ))

    // Reserved words
    If,
    Then,
    Else,
    Elif,
    Fi,
    For,
    While,
    Until,
    Do,
    Done,
    Case,
    Esac,
    In,
    Function,
    Select,
    Time,
    Coproc,

    // Content
    Word,
    Name,
    Number,
    AssignmentWord,
    Comment,
    HeredocContent,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eof => "EOF",
            Self::Newline => "NEWLINE",
            Self::Semicolon => ";",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::PipeAmp => "|&",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::Bang => "!",
            Self::Less => "<",
            Self::Great => ">",
            Self::DLess => "<<",
            Self::DGreat => ">>",
            Self::LessAnd => "<&",
            Self::GreatAnd => ">&",
            Self::LessGreat => "<>",
            Self::DLessDash => "<<-",
            Self::Clobber => ">|",
            Self::TLess => "<<<",
            Self::AndGreat => "&>",
            Self::AndDGreat => "&>>",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::DSemi => ";;",
            Self::SemiAnd => ";&",
            Self::SemiSemiAnd => ";;&",
            Self::DBrackStart => "[[",
            Self::DBrackEnd => "]]",
            Self::DParenStart => "((",
            Self::DParenEnd => "))",
            Self::If => "if",
            Self::Then => "then",
            Self::Else => "else",
            Self::Elif => "elif",
            Self::Fi => "fi",
            Self::For => "for",
            Self::While => "while",
            Self::Until => "until",
            Self::Do => "do",
            Self::Done => "done",
            Self::Case => "case",
            Self::Esac => "esac",
            Self::In => "in",
            Self::Function => "function",
            Self::Select => "select",
            Self::Time => "time",
            Self::Coproc => "coproc",
            Self::Word => "WORD",
            Self::Name => "NAME",
            Self::Number => "NUMBER",
            Self::AssignmentWord => "ASSIGNMENT_WORD",
            Self::Comment => "COMMENT",
            Self::HeredocContent => "HEREDOC_CONTENT",
        }
    }

    /// Reserved words double as ordinary words at argument positions.
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            Self::If
                | Self::Then
                | Self::Else
                | Self::Elif
                | Self::Fi
                | Self::For
                | Self::While
                | Self::Until
                | Self::Do
                | Self::Done
                | Self::Case
                | Self::Esac
                | Self::In
                | Self::Function
                | Self::Select
                | Self::Time
                | Self::Coproc
        )
    }
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    /// Canonical value (quotes stripped, line continuations removed)
    pub value: String,
    /// Exact source substring; word parsing starts from this
    pub raw_value: String,
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
    /// Word begins with a double quote
    pub quoted: bool,
    /// Word begins with a single quote
    pub single_quoted: bool,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        value: impl Into<String>,
        start: usize,
        end: usize,
        line: usize,
        column: usize,
    ) -> Self {
        let value = value.into();
        Self {
            token_type,
            raw_value: value.clone(),
            value,
            start,
            end,
            line,
            column,
            quoted: false,
            single_quoted: false,
        }
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw_value = raw.into();
        self
    }

    pub fn with_quotes(mut self, quoted: bool, single_quoted: bool) -> Self {
        self.quoted = quoted;
        self.single_quoted = single_quoted;
        self
    }
}

/// Error raised on unterminated quotes or corrupt here-docs.
#[derive(Debug, Clone)]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for LexerError {}

impl LexerError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self { message: message.into(), line, column }
    }
}

/// A here-doc redirection waiting for its body.
#[derive(Debug, Clone)]
struct PendingHeredoc {
    delimiter: String,
    strip_tabs: bool,
}

lazy_static::lazy_static! {
    static ref RESERVED_WORDS: HashMap<&'static str, TokenType> = {
        let mut m = HashMap::new();
        m.insert("if", TokenType::If);
        m.insert("then", TokenType::Then);
        m.insert("else", TokenType::Else);
        m.insert("elif", TokenType::Elif);
        m.insert("fi", TokenType::Fi);
        m.insert("for", TokenType::For);
        m.insert("while", TokenType::While);
        m.insert("until", TokenType::Until);
        m.insert("do", TokenType::Do);
        m.insert("done", TokenType::Done);
        m.insert("case", TokenType::Case);
        m.insert("esac", TokenType::Esac);
        m.insert("in", TokenType::In);
        m.insert("function", TokenType::Function);
        m.insert("select", TokenType::Select);
        m.insert("time", TokenType::Time);
        m.insert("coproc", TokenType::Coproc);
        m
    };

    static ref SINGLE_CHAR_OPS: HashMap<char, TokenType> = {
        let mut m = HashMap::new();
        m.insert('|', TokenType::Pipe);
        m.insert('&', TokenType::Amp);
        m.insert(';', TokenType::Semicolon);
        m.insert('(', TokenType::LParen);
        m.insert(')', TokenType::RParen);
        m.insert('<', TokenType::Less);
        m.insert('>', TokenType::Great);
        m
    };
}

const THREE_CHAR_OPS: &[(&str, TokenType)] = &[
    (";;&", TokenType::SemiSemiAnd),
    ("<<<", TokenType::TLess),
    ("&>>", TokenType::AndDGreat),
];

const TWO_CHAR_OPS: &[(&str, TokenType)] = &[
    ("&&", TokenType::AndAnd),
    ("||", TokenType::OrOr),
    (";;", TokenType::DSemi),
    (";&", TokenType::SemiAnd),
    ("|&", TokenType::PipeAmp),
    (">>", TokenType::DGreat),
    ("<&", TokenType::LessAnd),
    (">&", TokenType::GreatAnd),
    ("<>", TokenType::LessGreat),
    (">|", TokenType::Clobber),
    ("&>", TokenType::AndGreat),
];

/// Check if a string is a valid variable name.
pub fn is_valid_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Characters that terminate an unquoted word.
fn is_word_boundary(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | ';' | '&' | '|' | '(' | ')' | '<' | '>')
}

/// Find the '=' of an assignment word: a valid name, an optional balanced
/// `[subscript]`, an optional `+`, then `=`, all before any quoting.
/// Returns (name_end, subscript, append, eq_index).
fn scan_assignment_lhs(s: &str) -> Option<(usize, Option<String>, bool, usize)> {
    let chars: Vec<char> = s.chars().collect();
    let mut i = 0;
    match chars.first() {
        Some(c) if c.is_ascii_alphabetic() || *c == '_' => i += 1,
        _ => return None,
    }
    while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
        i += 1;
    }
    let name_end = i;
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
        i += 1; // past ]
    }
    let append = chars.get(i) == Some(&'+');
    if append {
        i += 1;
    }
    if chars.get(i) == Some(&'=') {
        Some((name_end, subscript, append, i))
    } else {
        None
    }
}

/// Lexer state: a forward cursor over the input characters.
pub struct Lexer {
    input: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    pending_heredocs: Vec<PendingHeredoc>,
}

/// Tokenize a source string.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexerError> {
    Lexer::new(input).tokenize()
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            pending_heredocs: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexerError> {
        let len = self.input.len();

        while self.pos < len {
            // Pending here-doc bodies are consumed right after a newline
            if !self.pending_heredocs.is_empty()
                && self.tokens.last().map(|t| t.token_type) == Some(TokenType::Newline)
            {
                self.read_heredoc_content()?;
                continue;
            }

            self.skip_whitespace();
            if self.pos >= len {
                break;
            }

            if let Some(token) = self.next_token()? {
                self.tokens.push(token);
            }
        }

        if !self.pending_heredocs.is_empty() {
            let delim = self.pending_heredocs[0].delimiter.clone();
            return Err(LexerError::new(
                format!("here-document delimited by end-of-file (wanted `{}')", delim),
                self.line,
                self.column,
            ));
        }

        self.tokens.push(Token::new(
            TokenType::Eof,
            "",
            self.pos,
            self.pos,
            self.line,
            self.column,
        ));

        Ok(self.tokens)
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn bump(&mut self) {
        if let Some(c) = self.current() {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current() {
            match c {
                ' ' | '\t' => self.bump(),
                '\\' if self.peek(1) == Some('\n') => {
                    // Line continuation
                    self.bump();
                    self.bump();
                }
                _ => break,
            }
        }
    }

    fn op_token(
        &mut self,
        token_type: TokenType,
        text: &str,
        start: usize,
        line: usize,
        column: usize,
    ) -> Token {
        for _ in 0..text.chars().count() {
            self.bump();
        }
        Token::new(token_type, text, start, self.pos, line, column)
    }

    fn next_token(&mut self) -> Result<Option<Token>, LexerError> {
        let start = self.pos;
        let line = self.line;
        let column = self.column;

        let c0 = match self.current() {
            Some(c) => c,
            None => return Ok(None),
        };
        let c1 = self.peek(1);
        let c2 = self.peek(2);

        if c0 == '#' {
            return Ok(Some(self.read_comment(start, line, column)));
        }

        if c0 == '\n' {
            self.bump();
            return Ok(Some(Token::new(TokenType::Newline, "\n", start, self.pos, line, column)));
        }

        // Here-doc operators register their delimiter by lookahead
        if c0 == '<' && c1 == Some('<') && c2 == Some('-') {
            let token = self.op_token(TokenType::DLessDash, "<<-", start, line, column);
            self.register_heredoc(true);
            return Ok(Some(token));
        }

        for (op, token_type) in THREE_CHAR_OPS {
            let chars: Vec<char> = op.chars().collect();
            if c0 == chars[0] && c1 == Some(chars[1]) && c2 == Some(chars[2]) {
                return Ok(Some(self.op_token(*token_type, op, start, line, column)));
            }
        }

        if c0 == '<' && c1 == Some('<') {
            let token = self.op_token(TokenType::DLess, "<<", start, line, column);
            self.register_heredoc(false);
            return Ok(Some(token));
        }

        // (( opens an arithmetic command: consume the balanced span and
        // emit the inner text as a single word between (( and )).
        if c0 == '(' && c1 == Some('(') {
            return self.read_arithmetic_span(start, line, column).map(Some);
        }

        if c0 == '[' && c1 == Some('[') && c2.map_or(true, is_word_boundary) {
            return Ok(Some(self.op_token(TokenType::DBrackStart, "[[", start, line, column)));
        }
        if c0 == ']' && c1 == Some(']') && c2.map_or(true, is_word_boundary) {
            return Ok(Some(self.op_token(TokenType::DBrackEnd, "]]", start, line, column)));
        }

        for (op, token_type) in TWO_CHAR_OPS {
            let chars: Vec<char> = op.chars().collect();
            if c0 == chars[0] && c1 == Some(chars[1]) {
                return Ok(Some(self.op_token(*token_type, op, start, line, column)));
            }
        }

        // Process substitution <(cmd) / >(cmd) is part of a word
        if (c0 == '<' || c0 == '>') && c1 == Some('(') {
            return self.read_word(start, line, column).map(Some);
        }

        if let Some(&token_type) = SINGLE_CHAR_OPS.get(&c0) {
            let text = c0.to_string();
            return Ok(Some(self.op_token(token_type, &text, start, line, column)));
        }

        if c0 == '{' {
            // { begins a group only when followed by whitespace; otherwise
            // it is a word ({}, {a,b}, {1..5}, {literal})
            match c1 {
                Some(' ') | Some('\t') | Some('\n') | None => {
                    return Ok(Some(self.op_token(TokenType::LBrace, "{", start, line, column)));
                }
                _ => return self.read_word(start, line, column).map(Some),
            }
        }

        if c0 == '}' {
            let next_is_word = c1.map_or(false, |c| !is_word_boundary(c));
            if next_is_word {
                return self.read_word(start, line, column).map(Some);
            }
            return Ok(Some(self.op_token(TokenType::RBrace, "}", start, line, column)));
        }

        if c0 == '!' {
            // ! is the bang operator only when not part of != or a word
            if c1 == Some('=') || c1.map_or(false, |c| !is_word_boundary(c) && c != '(') {
                return self.read_word(start, line, column).map(Some);
            }
            return Ok(Some(self.op_token(TokenType::Bang, "!", start, line, column)));
        }

        self.read_word(start, line, column).map(Some)
    }

    fn read_comment(&mut self, start: usize, line: usize, column: usize) -> Token {
        while let Some(c) = self.current() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
        let value: String = self.input[start..self.pos].iter().collect();
        Token::new(TokenType::Comment, value, start, self.pos, line, column)
    }

    /// Consume `(( ... ))` and emit DParenStart + inner word + DParenEnd.
    /// The inner text is handed to the arithmetic parser untouched.
    fn read_arithmetic_span(
        &mut self,
        start: usize,
        line: usize,
        column: usize,
    ) -> Result<Token, LexerError> {
        self.bump();
        self.bump();
        let token = Token::new(TokenType::DParenStart, "((", start, start + 2, line, column);

        let inner_start = self.pos;
        let inner_line = self.line;
        let inner_column = self.column;
        let mut depth: usize = 2;
        let mut in_single = false;
        let mut in_double = false;
        let mut inner_end = self.pos;

        while let Some(c) = self.current() {
            if in_single {
                if c == '\'' {
                    in_single = false;
                }
                self.bump();
                continue;
            }
            if in_double {
                if c == '\\' {
                    self.bump();
                    self.bump();
                    continue;
                }
                if c == '"' {
                    in_double = false;
                }
                self.bump();
                continue;
            }
            match c {
                '\'' => in_single = true,
                '"' => in_double = true,
                '\\' => {
                    self.bump();
                }
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 1 {
                        inner_end = self.pos;
                    }
                    if depth == 0 {
                        self.bump();
                        let inner: String = self.input[inner_start..inner_end].iter().collect();
                        self.tokens.push(token);
                        self.tokens.push(Token::new(
                            TokenType::Word,
                            inner,
                            inner_start,
                            inner_end,
                            inner_line,
                            inner_column,
                        ));
                        let end_token = Token::new(
                            TokenType::DParenEnd,
                            "))",
                            inner_end,
                            self.pos,
                            self.line,
                            self.column,
                        );
                        return Ok(end_token);
                    }
                }
                _ => {}
            }
            self.bump();
        }

        Err(LexerError::new("unexpected EOF while looking for matching `))'", line, column))
    }

    /// Record a pending here-doc by scanning ahead for the delimiter that
    /// follows the << / <<- operator (without consuming it).
    fn register_heredoc(&mut self, strip_tabs: bool) {
        let mut pos = self.pos;
        while matches!(self.input.get(pos), Some(' ') | Some('\t')) {
            pos += 1;
        }
        let mut delimiter = String::new();
        let mut quote: Option<char> = None;
        while let Some(&c) = self.input.get(pos) {
            match quote {
                Some(q) => {
                    if c == q {
                        quote = None;
                    } else {
                        delimiter.push(c);
                    }
                }
                None => {
                    if c == '\'' || c == '"' {
                        quote = Some(c);
                    } else if c == '\\' {
                        if let Some(&next) = self.input.get(pos + 1) {
                            delimiter.push(next);
                            pos += 1;
                        }
                    } else if is_word_boundary(c) {
                        break;
                    } else {
                        delimiter.push(c);
                    }
                }
            }
            pos += 1;
        }
        if !delimiter.is_empty() {
            self.pending_heredocs.push(PendingHeredoc { delimiter, strip_tabs });
        }
    }

    /// Read pending here-doc bodies, in registration order, starting at the
    /// line after the newline token just emitted.
    fn read_heredoc_content(&mut self) -> Result<(), LexerError> {
        let pending: Vec<PendingHeredoc> = self.pending_heredocs.drain(..).collect();

        for heredoc in pending {
            let start = self.pos;
            let start_line = self.line;
            let start_column = self.column;
            let mut content = String::new();
            let mut found = false;

            while self.pos < self.input.len() {
                // Collect one line
                let line_start = self.pos;
                while self.pos < self.input.len() && self.input[self.pos] != '\n' {
                    self.bump();
                }
                let mut text: String = self.input[line_start..self.pos].iter().collect();
                let has_newline = self.pos < self.input.len();
                if has_newline {
                    self.bump();
                }

                if heredoc.strip_tabs {
                    text = text.trim_start_matches('\t').to_string();
                }

                if text == heredoc.delimiter {
                    found = true;
                    break;
                }

                content.push_str(&text);
                content.push('\n');
            }

            if !found {
                return Err(LexerError::new(
                    format!(
                        "here-document at line {} delimited by end-of-file (wanted `{}')",
                        start_line, heredoc.delimiter
                    ),
                    self.line,
                    self.column,
                ));
            }

            self.tokens.push(Token::new(
                TokenType::HeredocContent,
                content,
                start,
                self.pos,
                start_line,
                start_column,
            ));
        }

        Ok(())
    }

    /// Read a word token, spanning quotes and balanced expansion constructs.
    fn read_word(&mut self, start: usize, line: usize, column: usize) -> Result<Token, LexerError> {
        let first = self.current();
        let quoted = first == Some('"');
        let single_quoted = first == Some('\'');

        while let Some(c) = self.current() {
            if is_word_boundary(c) {
                // <(cmd) and >(cmd) continue the word
                if !((c == '<' || c == '>') && self.peek(1) == Some('(')) {
                    break;
                }
                self.bump();
                self.span_dollar_paren()?;
                continue;
            }
            match c {
                '\'' => self.span_single_quote()?,
                '"' => self.span_double_quote()?,
                '\\' => {
                    self.bump();
                    self.bump();
                }
                '`' => self.span_backtick()?,
                '$' => {
                    self.bump();
                    match self.current() {
                        Some('\'') => self.span_single_quote()?,
                        Some('"') => self.span_double_quote()?,
                        Some('(') => {
                            if self.peek(1) == Some('(') {
                                self.span_dollar_dparen()?;
                            } else {
                                self.span_dollar_paren()?;
                            }
                        }
                        Some('{') => self.span_dollar_brace()?,
                        _ => {}
                    }
                }
                _ => self.bump(),
            }
        }

        let raw: String = self.input[start..self.pos].iter().collect();
        let value = strip_quotes(&raw);

        // Classify: reserved word, assignment, number, name, word
        let token_type = if !quoted && !single_quoted {
            if raw == value && RESERVED_WORDS.contains_key(value.as_str()) {
                RESERVED_WORDS[value.as_str()]
            } else if scan_assignment_lhs(&raw).is_some() {
                TokenType::AssignmentWord
            } else if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
                TokenType::Number
            } else if is_valid_name(&raw) {
                TokenType::Name
            } else {
                TokenType::Word
            }
        } else {
            TokenType::Word
        };

        Ok(Token::new(token_type, value, start, self.pos, line, column)
            .with_raw(raw)
            .with_quotes(quoted, single_quoted))
    }

    fn span_single_quote(&mut self) -> Result<(), LexerError> {
        let line = self.line;
        let column = self.column;
        self.bump(); // opening '
        while let Some(c) = self.current() {
            self.bump();
            if c == '\'' {
                return Ok(());
            }
        }
        Err(LexerError::new("unexpected EOF while looking for matching `''", line, column))
    }

    fn span_double_quote(&mut self) -> Result<(), LexerError> {
        let line = self.line;
        let column = self.column;
        self.bump(); // opening "
        while let Some(c) = self.current() {
            match c {
                '"' => {
                    self.bump();
                    return Ok(());
                }
                '\\' => {
                    self.bump();
                    self.bump();
                }
                '`' => self.span_backtick()?,
                '$' => {
                    self.bump();
                    match self.current() {
                        Some('(') => {
                            if self.peek(1) == Some('(') {
                                self.span_dollar_dparen()?;
                            } else {
                                self.span_dollar_paren()?;
                            }
                        }
                        Some('{') => self.span_dollar_brace()?,
                        _ => {}
                    }
                }
                _ => self.bump(),
            }
        }
        Err(LexerError::new("unexpected EOF while looking for matching `\"'", line, column))
    }

    fn span_backtick(&mut self) -> Result<(), LexerError> {
        let line = self.line;
        let column = self.column;
        self.bump(); // opening `
        while let Some(c) = self.current() {
            match c {
                '`' => {
                    self.bump();
                    return Ok(());
                }
                '\\' => {
                    self.bump();
                    self.bump();
                }
                _ => self.bump(),
            }
        }
        Err(LexerError::new("unexpected EOF while looking for matching ``'", line, column))
    }

    /// Span $( ... ) with nested parens, quotes, and substitutions.
    fn span_dollar_paren(&mut self) -> Result<(), LexerError> {
        let line = self.line;
        let column = self.column;
        self.bump(); // (
        let mut depth = 1usize;
        while let Some(c) = self.current() {
            match c {
                '(' => {
                    depth += 1;
                    self.bump();
                }
                ')' => {
                    depth -= 1;
                    self.bump();
                    if depth == 0 {
                        return Ok(());
                    }
                }
                '\'' => self.span_single_quote()?,
                '"' => self.span_double_quote()?,
                '`' => self.span_backtick()?,
                '\\' => {
                    self.bump();
                    self.bump();
                }
                '#' => {
                    // Comment inside command substitution runs to end of line
                    while let Some(c) = self.current() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => self.bump(),
            }
        }
        Err(LexerError::new("unexpected EOF while looking for matching `)'", line, column))
    }

    /// Span $(( ... )) counting paren pairs so $((x+(y))) stays together.
    fn span_dollar_dparen(&mut self) -> Result<(), LexerError> {
        let line = self.line;
        let column = self.column;
        self.bump(); // (
        self.bump(); // (
        let mut depth = 2usize;
        while let Some(c) = self.current() {
            match c {
                '(' => {
                    depth += 1;
                    self.bump();
                }
                ')' => {
                    depth -= 1;
                    self.bump();
                    if depth == 0 {
                        return Ok(());
                    }
                }
                '\'' => self.span_single_quote()?,
                '"' => self.span_double_quote()?,
                '\\' => {
                    self.bump();
                    self.bump();
                }
                _ => self.bump(),
            }
        }
        Err(LexerError::new("unexpected EOF while looking for matching `))'", line, column))
    }

    /// Span ${ ... } with nested braces.
    fn span_dollar_brace(&mut self) -> Result<(), LexerError> {
        let line = self.line;
        let column = self.column;
        self.bump(); // {
        let mut depth = 1usize;
        while let Some(c) = self.current() {
            match c {
                '{' => {
                    depth += 1;
                    self.bump();
                }
                '}' => {
                    depth -= 1;
                    self.bump();
                    if depth == 0 {
                        return Ok(());
                    }
                }
                '\'' => self.span_single_quote()?,
                '"' => self.span_double_quote()?,
                '`' => self.span_backtick()?,
                '\\' => {
                    self.bump();
                    self.bump();
                }
                '$' => {
                    self.bump();
                    if self.current() == Some('(') {
                        if self.peek(1) == Some('(') {
                            self.span_dollar_dparen()?;
                        } else {
                            self.span_dollar_paren()?;
                        }
                    }
                }
                _ => self.bump(),
            }
        }
        Err(LexerError::new("unexpected EOF while looking for matching `}'", line, column))
    }
}

/// Produce the canonical (quote-stripped) value of a word's raw text.
/// Expansion constructs are carried through verbatim; only quoting
/// characters that act as quoting are removed.
pub fn strip_quotes(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\'' => {
                i += 1;
                while i < chars.len() && chars[i] != '\'' {
                    out.push(chars[i]);
                    i += 1;
                }
                i += 1; // closing '
            }
            '"' => {
                i += 1;
                while i < chars.len() && chars[i] != '"' {
                    if chars[i] == '\\'
                        && i + 1 < chars.len()
                        && matches!(chars[i + 1], '$' | '`' | '"' | '\\' | '\n')
                    {
                        i += 1;
                        if chars[i] != '\n' {
                            out.push(chars[i]);
                        }
                        i += 1;
                    } else {
                        out.push(chars[i]);
                        i += 1;
                    }
                }
                i += 1; // closing "
            }
            '\\' => {
                if i + 1 < chars.len() {
                    if chars[i + 1] != '\n' {
                        out.push(chars[i + 1]);
                    }
                    i += 2;
                } else {
                    i += 1;
                }
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenType> {
        tokenize(input).unwrap().iter().map(|t| t.token_type).collect()
    }

    #[test]
    fn test_simple_command() {
        let tokens = tokenize("echo hello world").unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].token_type, TokenType::Name);
        assert_eq!(tokens[0].value, "echo");
        assert_eq!(tokens[1].value, "hello");
        assert_eq!(tokens[2].value, "world");
        assert_eq!(tokens[3].token_type, TokenType::Eof);
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(
            kinds("a && b || c"),
            vec![
                TokenType::Name,
                TokenType::AndAnd,
                TokenType::Name,
                TokenType::OrOr,
                TokenType::Name,
                TokenType::Eof,
            ]
        );
        assert_eq!(kinds(";;&")[0], TokenType::SemiSemiAnd);
        assert_eq!(kinds("&>>f")[0], TokenType::AndDGreat);
        assert_eq!(kinds("<<<x")[0], TokenType::TLess);
    }

    #[test]
    fn test_redirection_operators() {
        let tokens = tokenize("cmd 2>&1 >out <in").unwrap();
        let types: Vec<TokenType> = tokens.iter().map(|t| t.token_type).collect();
        assert_eq!(
            types,
            vec![
                TokenType::Name,
                TokenType::Number,
                TokenType::GreatAnd,
                TokenType::Number,
                TokenType::Great,
                TokenType::Name,
                TokenType::Less,
                TokenType::Name,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_quoted_words() {
        let tokens = tokenize("echo 'single quoted' \"double $x\"").unwrap();
        assert_eq!(tokens[1].value, "single quoted");
        assert!(tokens[1].single_quoted);
        assert_eq!(tokens[2].value, "double $x");
        assert!(tokens[2].quoted);
    }

    #[test]
    fn test_raw_value_preserves_source() {
        let tokens = tokenize("x='a b'").unwrap();
        assert_eq!(tokens[0].token_type, TokenType::AssignmentWord);
        assert_eq!(tokens[0].raw_value, "x='a b'");
    }

    #[test]
    fn test_assignment_word_forms() {
        assert_eq!(kinds("FOO=bar")[0], TokenType::AssignmentWord);
        assert_eq!(kinds("FOO+=bar")[0], TokenType::AssignmentWord);
        assert_eq!(kinds("arr[2]=x")[0], TokenType::AssignmentWord);
        // = inside a quoted word is not an assignment
        assert_eq!(kinds("'FOO=bar'")[0], TokenType::Word);
        // invalid LHS
        assert_eq!(kinds("1FOO=bar")[0], TokenType::Word);
    }

    #[test]
    fn test_reserved_words() {
        assert_eq!(kinds("if")[0], TokenType::If);
        assert_eq!(kinds("done")[0], TokenType::Done);
        // quoted reserved words are plain words
        assert_eq!(kinds("'if'")[0], TokenType::Word);
    }

    #[test]
    fn test_comment() {
        let tokens = tokenize("echo hi # trailing comment").unwrap();
        let comment = tokens.iter().find(|t| t.token_type == TokenType::Comment).unwrap();
        assert_eq!(comment.value, "# trailing comment");
    }

    #[test]
    fn test_command_substitution_spans_word() {
        let tokens = tokenize("echo $(ls -l | wc)").unwrap();
        assert_eq!(tokens[1].raw_value, "$(ls -l | wc)");
        assert_eq!(tokens[1].token_type, TokenType::Word);
    }

    #[test]
    fn test_nested_command_substitution() {
        let tokens = tokenize("echo $(echo $(echo x))").unwrap();
        assert_eq!(tokens[1].raw_value, "$(echo $(echo x))");
    }

    #[test]
    fn test_arithmetic_expansion_stays_in_word() {
        let tokens = tokenize("echo $((x+(y)*2))").unwrap();
        assert_eq!(tokens[1].raw_value, "$((x+(y)*2))");
    }

    #[test]
    fn test_arithmetic_command_span() {
        let tokens = tokenize("((x = 1 + 2))").unwrap();
        assert_eq!(tokens[0].token_type, TokenType::DParenStart);
        assert_eq!(tokens[1].token_type, TokenType::Word);
        assert_eq!(tokens[1].value, "x = 1 + 2");
        assert_eq!(tokens[2].token_type, TokenType::DParenEnd);
    }

    #[test]
    fn test_parameter_expansion_braces() {
        let tokens = tokenize("echo ${VAR:-default value}").unwrap();
        assert_eq!(tokens[1].raw_value, "${VAR:-default value}");
    }

    #[test]
    fn test_backtick_span() {
        let tokens = tokenize("echo `date +%s`").unwrap();
        assert_eq!(tokens[1].raw_value, "`date +%s`");
    }

    #[test]
    fn test_heredoc_basic() {
        let tokens = tokenize("cat <<EOF\nline one\nline two\nEOF\n").unwrap();
        let content = tokens
            .iter()
            .find(|t| t.token_type == TokenType::HeredocContent)
            .unwrap();
        assert_eq!(content.value, "line one\nline two\n");
    }

    #[test]
    fn test_heredoc_strip_tabs() {
        let tokens = tokenize("cat <<-EOF\n\tindented\n\tEOF\n").unwrap();
        let content = tokens
            .iter()
            .find(|t| t.token_type == TokenType::HeredocContent)
            .unwrap();
        assert_eq!(content.value, "indented\n");
    }

    #[test]
    fn test_heredoc_quoted_delimiter() {
        let tokens = tokenize("cat <<'EOF'\n$HOME\nEOF\n").unwrap();
        let delim = &tokens[2];
        assert_eq!(delim.value, "EOF");
        assert!(delim.single_quoted);
    }

    #[test]
    fn test_heredoc_multiple_pending() {
        let tokens = tokenize("cat <<A <<B\nfirst\nA\nsecond\nB\n").unwrap();
        let contents: Vec<&Token> = tokens
            .iter()
            .filter(|t| t.token_type == TokenType::HeredocContent)
            .collect();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].value, "first\n");
        assert_eq!(contents[1].value, "second\n");
    }

    #[test]
    fn test_heredoc_missing_delimiter_errors() {
        let err = tokenize("cat <<EOF\nno end\n").unwrap_err();
        assert!(err.message.contains("EOF"));
    }

    #[test]
    fn test_unterminated_quote_errors() {
        assert!(tokenize("echo 'oops").is_err());
        assert!(tokenize("echo \"oops").is_err());
    }

    #[test]
    fn test_line_continuation() {
        let tokens = tokenize("echo a \\\n  b").unwrap();
        let words: Vec<&str> = tokens
            .iter()
            .filter(|t| matches!(t.token_type, TokenType::Name | TokenType::Word))
            .map(|t| t.value.as_str())
            .collect();
        assert_eq!(words, vec!["echo", "a", "b"]);
    }

    #[test]
    fn test_bang_and_word() {
        assert_eq!(kinds("! true")[0], TokenType::Bang);
        assert_eq!(kinds("!= x")[0], TokenType::Word);
    }

    #[test]
    fn test_brace_group_vs_brace_word() {
        assert_eq!(kinds("{ echo; }")[0], TokenType::LBrace);
        let tokens = tokenize("echo {a,b}c").unwrap();
        assert_eq!(tokens[1].token_type, TokenType::Word);
        assert_eq!(tokens[1].value, "{a,b}c");
    }

    #[test]
    fn test_double_bracket_tokens() {
        assert_eq!(
            kinds("[[ -z $x ]]"),
            vec![
                TokenType::DBrackStart,
                TokenType::Word,
                TokenType::Word,
                TokenType::DBrackEnd,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_line_and_column_tracking() {
        let tokens = tokenize("echo a\necho b").unwrap();
        let second_echo = &tokens[3];
        assert_eq!(second_echo.line, 2);
        assert_eq!(second_echo.column, 1);
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("'a b'"), "a b");
        assert_eq!(strip_quotes("\"a $x\""), "a $x");
        assert_eq!(strip_quotes("a\\ b"), "a b");
        assert_eq!(strip_quotes("\"\\$x\""), "$x");
        assert_eq!(strip_quotes("pre'mid'post"), "premidpost");
    }

    #[test]
    fn test_pipe_amp() {
        assert_eq!(kinds("a |& b")[1], TokenType::PipeAmp);
    }

    #[test]
    fn test_case_terminators() {
        assert_eq!(kinds(";;")[0], TokenType::DSemi);
        assert_eq!(kinds(";&")[0], TokenType::SemiAnd);
    }
}
