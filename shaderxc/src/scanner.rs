//! Single-character-lookahead scanner turning characters into classified
//! tokens (spec §4.2).
use crate::position::{FileId, SourceArea, SourcePosition};
use crate::report::Report;
use crate::token::{keyword_from_str, AssignOpToken, BinOpToken, PunctToken, Token, TokenKind, UnaryOpToken};

pub struct Scanner<'a> {
    file: FileId,
    text: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    pub diagnostics: Vec<Report>,
}

impl<'a> Scanner<'a> {
    pub fn new(file: FileId, text: &'a str) -> Self {
        Self { file, text: text.as_bytes(), pos: 0, line: 0, column: 0, diagnostics: Vec::new() }
    }

    fn peek(&self) -> Option<u8> {
        self.text.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.text.get(self.pos + offset).copied()
    }

    fn current_position(&self) -> SourcePosition {
        SourcePosition::new(self.file, self.line, self.column)
    }

    fn advance(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn area_from(&self, start: SourcePosition) -> SourceArea {
        let length = if self.current_position().line == start.line {
            self.column.saturating_sub(start.column)
        } else {
            0
        };
        SourceArea::new(start, length)
    }

    /// Skip whitespace and comments, accumulating them into a leading-comment
    /// string for the next scanned token (used for optional source-comment
    /// preservation during code generation).
    fn skip_trivia(&mut self) -> Option<String> {
        let mut comment = String::new();
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                    self.advance();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    let start = self.pos;
                    while let Some(c) = self.peek() {
                        if c == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                    comment.push_str(std::str::from_utf8(&self.text[start..self.pos]).unwrap_or(""));
                    comment.push('\n');
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    let start = self.pos;
                    self.advance();
                    self.advance();
                    while let Some(c) = self.peek() {
                        if c == b'*' && self.peek_at(1) == Some(b'/') {
                            self.advance();
                            self.advance();
                            break;
                        }
                        self.advance();
                    }
                    comment.push_str(std::str::from_utf8(&self.text[start..self.pos]).unwrap_or(""));
                    comment.push('\n');
                }
                _ => break,
            }
        }
        if comment.is_empty() { None } else { Some(comment) }
    }

    fn spelling(&self, start: usize) -> String {
        String::from_utf8_lossy(&self.text[start..self.pos]).into_owned()
    }

    fn is_ident_start(c: u8) -> bool {
        c.is_ascii_alphabetic() || c == b'_'
    }

    fn is_ident_continue(c: u8) -> bool {
        c.is_ascii_alphanumeric() || c == b'_'
    }

    /// Scan the next token. Returns `Eof` once the buffer is exhausted.
    /// A leading `#` at the start of a line (modulo whitespace) yields a
    /// `Directive` token spanning the rest of the physical line; the
    /// preprocessor re-tokenizes the directive body itself.
    pub fn next_token(&mut self) -> Token {
        let leading_comment = self.skip_trivia();
        let start = self.current_position();
        let start_byte = self.pos;
        let mut tok = match self.peek() {
            None => Token::new(TokenKind::Eof, "", self.area_from(start)),
            Some(b'#') => self.scan_directive(start, start_byte),
            Some(c) if Self::is_ident_start(c) => self.scan_ident_or_keyword(start, start_byte),
            Some(c) if c.is_ascii_digit() => self.scan_number(start, start_byte),
            Some(b'.') if self.peek_at(1).map(|c| c.is_ascii_digit()).unwrap_or(false) => {
                self.scan_number(start, start_byte)
            }
            Some(b'"') => self.scan_string(start, start_byte),
            Some(b'\'') => self.scan_char(start, start_byte),
            Some(_) => self.scan_operator(start, start_byte),
        };
        tok.leading_comment = leading_comment;
        tok
    }

    fn scan_directive(&mut self, start: SourcePosition, start_byte: usize) -> Token {
        self.advance(); // '#'
        while let Some(c) = self.peek() {
            if c == b'\n' {
                break;
            }
            // A directive line may be continued with a trailing backslash.
            if c == b'\\' && self.peek_at(1) == Some(b'\n') {
                self.advance();
                self.advance();
                continue;
            }
            self.advance();
        }
        let spelling = self.spelling(start_byte);
        Token::new(TokenKind::Directive(spelling.clone()), spelling, self.area_from(start))
    }

    fn scan_ident_or_keyword(&mut self, start: SourcePosition, start_byte: usize) -> Token {
        while let Some(c) = self.peek() {
            if Self::is_ident_continue(c) {
                self.advance();
            } else {
                break;
            }
        }
        let spelling = self.spelling(start_byte);
        let area = self.area_from(start);
        match spelling.as_str() {
            "true" | "false" => Token::new(TokenKind::BoolLiteral, spelling, area),
            s => match keyword_from_str(s) {
                Some(kw) => Token::new(TokenKind::Keyword(kw), spelling, area),
                None => Token::new(TokenKind::Ident, spelling, area),
            },
        }
    }

    fn scan_number(&mut self, start: SourcePosition, start_byte: usize) -> Token {
        let mut is_float = false;
        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x') | Some(b'X')) {
            self.advance();
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() {
                    self.advance();
                } else {
                    break;
                }
            }
        } else {
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }
            if self.peek() == Some(b'.') {
                is_float = true;
                self.advance();
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
            if matches!(self.peek(), Some(b'e') | Some(b'E')) {
                let save = (self.pos, self.line, self.column);
                self.advance();
                if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                    self.advance();
                }
                if self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                    is_float = true;
                    while let Some(c) = self.peek() {
                        if c.is_ascii_digit() {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                } else {
                    // No exponent digit: not actually an exponent, rewind.
                    (self.pos, self.line, self.column) = save;
                }
            }
        }
        // Suffix: u, l, f, h, L (case-insensitive, one letter is enough for this grammar).
        if let Some(c) = self.peek() {
            if matches!(c, b'u' | b'U' | b'l' | b'L' | b'f' | b'F' | b'h' | b'H') {
                self.advance();
                if matches!(c, b'f' | b'F' | b'h' | b'H') {
                    is_float = true;
                }
            }
        }
        let spelling = self.spelling(start_byte);
        let area = self.area_from(start);
        if is_float {
            Token::new(TokenKind::FloatLiteral, spelling, area)
        } else {
            Token::new(TokenKind::IntLiteral, spelling, area)
        }
    }

    fn scan_string(&mut self, start: SourcePosition, start_byte: usize) -> Token {
        self.advance(); // opening quote
        let mut terminated = false;
        while let Some(c) = self.peek() {
            if c == b'"' {
                self.advance();
                terminated = true;
                break;
            }
            if c == b'\n' {
                break;
            }
            self.advance();
        }
        let area = self.area_from(start);
        if !terminated {
            self.diagnostics.push(
                Report::error("unterminated string literal").with_area(area),
            );
        }
        Token::new(TokenKind::StringLiteral, self.spelling(start_byte), area)
    }

    fn scan_char(&mut self, start: SourcePosition, start_byte: usize) -> Token {
        self.advance();
        while let Some(c) = self.peek() {
            if c == b'\'' {
                self.advance();
                break;
            }
            if c == b'\n' {
                break;
            }
            self.advance();
        }
        Token::new(TokenKind::CharLiteral, self.spelling(start_byte), self.area_from(start))
    }

    fn scan_operator(&mut self, start: SourcePosition, start_byte: usize) -> Token {
        let c = self.advance().unwrap();
        macro_rules! two {
            ($second:expr, $kind2:expr, $kind1:expr) => {{
                if self.peek() == Some($second) {
                    self.advance();
                    $kind2
                } else {
                    $kind1
                }
            }};
        }
        let kind = match c {
            b'(' => TokenKind::Punct(PunctToken::LParen),
            b')' => TokenKind::Punct(PunctToken::RParen),
            b'{' => TokenKind::Punct(PunctToken::LBrace),
            b'}' => TokenKind::Punct(PunctToken::RBrace),
            b'[' => TokenKind::Punct(PunctToken::LBracket),
            b']' => TokenKind::Punct(PunctToken::RBracket),
            b';' => TokenKind::Punct(PunctToken::Semi),
            b',' => TokenKind::BinOp(BinOpToken::Comma),
            b'.' => TokenKind::Punct(PunctToken::Dot),
            b'?' => TokenKind::Question,
            b':' => TokenKind::Colon,
            b'~' => TokenKind::UnaryOp(UnaryOpToken::BitNot),
            b'+' => {
                if self.peek() == Some(b'+') {
                    self.advance();
                    TokenKind::UnaryOp(UnaryOpToken::Inc)
                } else {
                    two!(b'=', TokenKind::AssignOp(AssignOpToken::AddAssign), TokenKind::BinOp(BinOpToken::Add))
                }
            }
            b'-' => {
                if self.peek() == Some(b'-') {
                    self.advance();
                    TokenKind::UnaryOp(UnaryOpToken::Dec)
                } else {
                    two!(b'=', TokenKind::AssignOp(AssignOpToken::SubAssign), TokenKind::BinOp(BinOpToken::Sub))
                }
            }
            b'*' => two!(b'=', TokenKind::AssignOp(AssignOpToken::MulAssign), TokenKind::BinOp(BinOpToken::Mul)),
            b'/' => two!(b'=', TokenKind::AssignOp(AssignOpToken::DivAssign), TokenKind::BinOp(BinOpToken::Div)),
            b'%' => two!(b'=', TokenKind::AssignOp(AssignOpToken::ModAssign), TokenKind::BinOp(BinOpToken::Mod)),
            b'=' => two!(b'=', TokenKind::BinOp(BinOpToken::Eq), TokenKind::AssignOp(AssignOpToken::Assign)),
            b'!' => two!(b'=', TokenKind::BinOp(BinOpToken::Ne), TokenKind::UnaryOp(UnaryOpToken::Not)),
            b'<' => {
                if self.peek() == Some(b'<') {
                    self.advance();
                    two!(b'=', TokenKind::AssignOp(AssignOpToken::ShlAssign), TokenKind::BinOp(BinOpToken::Shl))
                } else {
                    two!(b'=', TokenKind::BinOp(BinOpToken::Le), TokenKind::BinOp(BinOpToken::Lt))
                }
            }
            b'>' => {
                if self.peek() == Some(b'>') {
                    self.advance();
                    two!(b'=', TokenKind::AssignOp(AssignOpToken::ShrAssign), TokenKind::BinOp(BinOpToken::Shr))
                } else {
                    two!(b'=', TokenKind::BinOp(BinOpToken::Ge), TokenKind::BinOp(BinOpToken::Gt))
                }
            }
            b'&' => {
                if self.peek() == Some(b'&') {
                    self.advance();
                    TokenKind::BinOp(BinOpToken::LogicalAnd)
                } else {
                    two!(b'=', TokenKind::AssignOp(AssignOpToken::AndAssign), TokenKind::BinOp(BinOpToken::BitAnd))
                }
            }
            b'|' => {
                if self.peek() == Some(b'|') {
                    self.advance();
                    TokenKind::BinOp(BinOpToken::LogicalOr)
                } else {
                    two!(b'=', TokenKind::AssignOp(AssignOpToken::OrAssign), TokenKind::BinOp(BinOpToken::BitOr))
                }
            }
            b'^' => two!(b'=', TokenKind::AssignOp(AssignOpToken::XorAssign), TokenKind::BinOp(BinOpToken::BitXor)),
            other => {
                let area = self.area_from(start);
                self.diagnostics.push(
                    Report::error(format!("unexpected character '{}'", other as char)).with_area(area),
                );
                TokenKind::Eof
            }
        };
        let area = self.area_from(start);
        Token::new(kind, self.spelling(start_byte), area)
    }
}

/// Scan an entire buffer into a `Vec<Token>` including a trailing `Eof`.
pub fn scan_all(file: FileId, text: &str) -> (Vec<Token>, Vec<Report>) {
    let mut scanner = Scanner::new(file, text);
    let mut tokens = Vec::new();
    loop {
        let tok = scanner.next_token();
        let is_eof = tok.is_eof();
        tokens.push(tok);
        if is_eof {
            break;
        }
    }
    (tokens, scanner.diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        let (tokens, diagnostics) = scan_all(0, text);
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn classifies_identifiers_and_keywords() {
        let ks = kinds("float4 p");
        assert!(matches!(ks[0], TokenKind::Ident));
        assert!(matches!(ks[1], TokenKind::Ident));
    }

    #[test]
    fn classifies_numeric_literal_suffixes() {
        let ks = kinds("1 1.0 1u 1.0f");
        assert!(matches!(ks[0], TokenKind::IntLiteral));
        assert!(matches!(ks[1], TokenKind::FloatLiteral));
        assert!(matches!(ks[2], TokenKind::IntLiteral));
        assert!(matches!(ks[3], TokenKind::FloatLiteral));
    }

    #[test]
    fn scans_double_angle_bracket_as_one_shift_token() {
        // Splitting ">>" back into two ">" tokens for a closing nested
        // generic-style type argument list is the parser's job, not the
        // scanner's (see `Parser::expect_gt`).
        let (tokens, diagnostics) = scan_all(0, ">>");
        assert!(diagnostics.is_empty());
        assert!(matches!(tokens[0].kind, TokenKind::BinOp(BinOpToken::Shr)));
    }

    #[test]
    fn reports_unterminated_string() {
        let (_, diagnostics) = scan_all(0, "\"abc");
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn reports_unexpected_character() {
        let (_, diagnostics) = scan_all(0, "@");
        assert!(!diagnostics.is_empty());
    }
}
