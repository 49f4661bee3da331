//! Byte cursor over a FIG source.
//!
//! FIG files are line oriented in the header and whitespace delimited in the
//! body. Text payloads may contain arbitrary 8-bit bytes, so the cursor works
//! on `&[u8]` rather than `&str`.

/// A whitespace-delimited token and where it started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a [u8],
    pub offset: usize,
}

impl<'a> Token<'a> {
    pub fn as_str(&self) -> &'a str {
        std::str::from_utf8(self.text).unwrap_or("")
    }

    /// Token as shown in diagnostics
    pub fn display(&self) -> String {
        String::from_utf8_lossy(self.text).into_owned()
    }

    pub fn parse_int(&self) -> Option<i32> {
        self.as_str().parse().ok()
    }

    pub fn parse_float(&self) -> Option<f64> {
        self.as_str().parse().ok()
    }
}

/// A line without its terminator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub text: &'a [u8],
    pub offset: usize,
}

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self { src, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.src[self.pos.min(self.src.len())..].starts_with(prefix)
    }

    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.src.len());
    }

    pub fn next_byte(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// Next line, including empty ones
    pub fn next_line(&mut self) -> Option<Line<'a>> {
        if self.is_eof() {
            return None;
        }
        let start = self.pos;
        let rest = &self.src[start..];
        let (len, consumed) = match rest.iter().position(|&b| b == b'\n') {
            Some(n) => (n, n + 1),
            None => (rest.len(), rest.len()),
        };
        self.pos += consumed;
        let mut text = &rest[..len];
        if let Some(stripped) = text.strip_suffix(b"\r") {
            text = stripped;
        }
        Some(Line {
            text,
            offset: start,
        })
    }

    /// Next line that is not a `#` comment
    pub fn next_content_line(&mut self) -> Option<Line<'a>> {
        loop {
            let line = self.next_line()?;
            if line.text.first() != Some(&b'#') {
                return Some(line);
            }
        }
    }

    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Skip to just after the next newline
    pub fn skip_line(&mut self) {
        let _ = self.next_line();
    }

    /// Next whitespace-delimited token, or `None` at end of input
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        self.skip_whitespace();
        if self.is_eof() {
            return None;
        }
        let start = self.pos;
        while self.peek().is_some_and(|b| !b.is_ascii_whitespace()) {
            self.pos += 1;
        }
        Some(Token {
            text: &self.src[start..self.pos],
            offset: start,
        })
    }
}
