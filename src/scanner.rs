#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenType {
    // Single-character tokens.
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Colon,
    Question,
    Minus,
    Plus,
    Slash,
    Percent,
    Caret,
    Tilde,
    Amp,
    Pipe,

    // One or more character tokens.
    Star,
    StarStar,
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    GreaterGreater,
    Less,
    LessEqual,
    LessLess,
    AmpAmp,
    PipePipe,
    DotDotDot,

    // Literals.
    Identifier,
    String,
    Number,

    // Keywords.
    Ao,
    Async,
    Cheek,
    Da,
    Jap,
    Jing,
    Job,
    Kao,
    Karani,
    Kian,
    Klum,
    Kuun,
    Long,
    Mai,
    Ni,
    Pokati,
    Ror,
    Samrap,
    Tej,
    Tha,
    Thueng,
    Tor,
    Uen,
    Wang,
    Wonn,
    Yut,

    Newline,
    Error,
    Eof,
}

#[derive(Debug, Copy, Clone)]
pub struct Token<'a> {
    pub kind: TokenType,
    pub lexeme: &'a str,
    pub line: usize,
}

pub struct Scanner<'a> {
    code: &'a str,
    start: usize,
    current: usize,
    line: usize,
    // Bracket nesting depth; newlines inside groupings are plain whitespace.
    groups: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(code: &'a str) -> Scanner<'a> {
        Scanner {
            code,
            start: 0,
            current: 0,
            line: 1,
            groups: 0,
        }
    }

    pub fn scan_token(&mut self) -> Token<'a> {
        self.skip_whitespace();
        self.start = self.current;

        if self.is_at_end() {
            return self.make_token(TokenType::Eof);
        }

        let c = self.advance();
        match c {
            '\n' => {
                let token = self.make_token(TokenType::Newline);
                self.line += 1;
                token
            }
            '(' => {
                self.groups += 1;
                self.make_token(TokenType::LeftParen)
            }
            ')' => {
                self.groups = self.groups.saturating_sub(1);
                self.make_token(TokenType::RightParen)
            }
            '[' => {
                self.groups += 1;
                self.make_token(TokenType::LeftBracket)
            }
            ']' => {
                self.groups = self.groups.saturating_sub(1);
                self.make_token(TokenType::RightBracket)
            }
            '{' => {
                self.groups += 1;
                self.make_token(TokenType::LeftBrace)
            }
            '}' => {
                self.groups = self.groups.saturating_sub(1);
                self.make_token(TokenType::RightBrace)
            }
            ',' => self.make_token(TokenType::Comma),
            '.' => {
                if self.peek() == Some('.') && self.peek_next() == Some('.') {
                    self.advance();
                    self.advance();
                    self.make_token(TokenType::DotDotDot)
                } else {
                    self.make_token(TokenType::Dot)
                }
            }
            ':' => self.make_token(TokenType::Colon),
            '?' => self.make_token(TokenType::Question),
            '-' => self.make_token(TokenType::Minus),
            '+' => self.make_token(TokenType::Plus),
            '/' => self.make_token(TokenType::Slash),
            '%' => self.make_token(TokenType::Percent),
            '^' => self.make_token(TokenType::Caret),
            '~' => self.make_token(TokenType::Tilde),
            '*' => {
                if self.matches('*') {
                    self.make_token(TokenType::StarStar)
                } else {
                    self.make_token(TokenType::Star)
                }
            }
            '!' => {
                if self.matches('=') {
                    self.make_token(TokenType::BangEqual)
                } else {
                    self.make_token(TokenType::Bang)
                }
            }
            '=' => {
                if self.matches('=') {
                    self.make_token(TokenType::EqualEqual)
                } else {
                    self.make_token(TokenType::Equal)
                }
            }
            '<' => {
                if self.matches('=') {
                    self.make_token(TokenType::LessEqual)
                } else if self.matches('<') {
                    self.make_token(TokenType::LessLess)
                } else {
                    self.make_token(TokenType::Less)
                }
            }
            '>' => {
                if self.matches('=') {
                    self.make_token(TokenType::GreaterEqual)
                } else if self.matches('>') {
                    self.make_token(TokenType::GreaterGreater)
                } else {
                    self.make_token(TokenType::Greater)
                }
            }
            '&' => {
                if self.matches('&') {
                    self.make_token(TokenType::AmpAmp)
                } else {
                    self.make_token(TokenType::Amp)
                }
            }
            '|' => {
                if self.matches('|') {
                    self.make_token(TokenType::PipePipe)
                } else {
                    self.make_token(TokenType::Pipe)
                }
            }
            '"' => self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if is_identifier_start(c) => self.identifier(),
            _ => self.error_token("Unexpected character."),
        }
    }

    fn string(&mut self) -> Token<'a> {
        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }
            if c == '\n' {
                self.line += 1;
            }
            self.advance();
        }
        if self.is_at_end() {
            return self.error_token("Unterminated string.");
        }
        self.advance();
        self.make_token(TokenType::String)
    }

    fn number(&mut self) -> Token<'a> {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') && matches!(self.peek_next(), Some(c) if c.is_ascii_digit()) {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        self.make_token(TokenType::Number)
    }

    fn identifier(&mut self) -> Token<'a> {
        while matches!(self.peek(), Some(c) if is_identifier_part(c)) {
            self.advance();
        }
        self.make_token(self.identifier_type())
    }

    fn identifier_type(&self) -> TokenType {
        match &self.code[self.start..self.current] {
            "ao" => TokenType::Ao,
            "async" => TokenType::Async,
            "cheek" => TokenType::Cheek,
            "da" => TokenType::Da,
            "jap" => TokenType::Jap,
            "jing" => TokenType::Jing,
            "job" => TokenType::Job,
            "kao" => TokenType::Kao,
            "karani" => TokenType::Karani,
            "kian" => TokenType::Kian,
            "klum" => TokenType::Klum,
            "kuun" => TokenType::Kuun,
            "long" => TokenType::Long,
            "mai" => TokenType::Mai,
            "ni" => TokenType::Ni,
            "pokati" => TokenType::Pokati,
            "ror" => TokenType::Ror,
            "samrap" => TokenType::Samrap,
            "tej" => TokenType::Tej,
            "tha" => TokenType::Tha,
            "thueng" => TokenType::Thueng,
            "tor" => TokenType::Tor,
            "uen" => TokenType::Uen,
            "wang" => TokenType::Wang,
            "wonn" => TokenType::Wonn,
            "yut" => TokenType::Yut,
            _ => TokenType::Identifier,
        }
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\r') | Some('\t') => {
                    self.advance();
                }
                Some('\n') if self.groups > 0 => {
                    self.line += 1;
                    self.advance();
                }
                Some('/') if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.code.len()
    }

    fn advance(&mut self) -> char {
        let c = self.peek().expect("Scanned past the end of the source");
        self.current += c.len_utf8();
        c
    }

    fn peek(&self) -> Option<char> {
        self.code[self.current..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.code[self.current..].chars();
        chars.next();
        chars.next()
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn make_token(&self, kind: TokenType) -> Token<'a> {
        Token {
            kind,
            lexeme: &self.code[self.start..self.current],
            line: self.line,
        }
    }

    fn error_token(&self, message: &'static str) -> Token<'a> {
        Token {
            kind: TokenType::Error,
            lexeme: message,
            line: self.line,
        }
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || (!c.is_ascii() && c.is_alphabetic())
}

// Thai vowel and tone signs (U+0E31..U+0E4E) are combining marks rather
// than letters, but they are part of a written word.
fn is_identifier_part(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c == '_'
        || (!c.is_ascii() && (c.is_alphanumeric() || ('\u{0e31}'..='\u{0e4e}').contains(&c)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(code: &str) -> Vec<TokenType> {
        let mut scanner = Scanner::new(code);
        let mut kinds = Vec::new();
        loop {
            let token = scanner.scan_token();
            let kind = token.kind;
            kinds.push(kind);
            if kind == TokenType::Eof {
                break;
            }
        }
        kinds
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("ao x = 10"),
            vec![
                TokenType::Ao,
                TokenType::Identifier,
                TokenType::Equal,
                TokenType::Number,
                TokenType::Eof,
            ]
        );
        assert_eq!(
            kinds("kian kuun klum sang"),
            vec![
                TokenType::Kian,
                TokenType::Kuun,
                TokenType::Klum,
                TokenType::Identifier,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn thai_identifiers_scan_as_one_token() {
        let mut scanner = Scanner::new("ao ชื่อ = 1");
        assert_eq!(scanner.scan_token().kind, TokenType::Ao);
        let name = scanner.scan_token();
        assert_eq!(name.kind, TokenType::Identifier);
        assert_eq!(name.lexeme, "ชื่อ");
    }

    #[test]
    fn multi_character_operators() {
        assert_eq!(
            kinds("** && || << >> <= >= == != ..."),
            vec![
                TokenType::StarStar,
                TokenType::AmpAmp,
                TokenType::PipePipe,
                TokenType::LessLess,
                TokenType::GreaterGreater,
                TokenType::LessEqual,
                TokenType::GreaterEqual,
                TokenType::EqualEqual,
                TokenType::BangEqual,
                TokenType::DotDotDot,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn newlines_inside_groupings_are_whitespace() {
        assert_eq!(
            kinds("f(1,\n2)"),
            vec![
                TokenType::Identifier,
                TokenType::LeftParen,
                TokenType::Number,
                TokenType::Comma,
                TokenType::Number,
                TokenType::RightParen,
                TokenType::Eof,
            ]
        );
        assert!(kinds("1\n2").contains(&TokenType::Newline));
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(
            kinds("1 // kian klum\n2"),
            vec![
                TokenType::Number,
                TokenType::Newline,
                TokenType::Number,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn line_numbers_advance() {
        let mut scanner = Scanner::new("1\n2");
        assert_eq!(scanner.scan_token().line, 1);
        assert_eq!(scanner.scan_token().line, 1); // the newline itself
        assert_eq!(scanner.scan_token().line, 2);
    }
}
