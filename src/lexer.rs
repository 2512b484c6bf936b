use core::cmp;
use core::fmt::{self, Debug, Formatter};
use core::iter::Peekable;
use core::str::CharIndices;
use std::rc::Rc;

use anyhow::{anyhow, bail, Result};

#[derive(Clone)]
struct SourceInternal {
    pub file: String,
    pub contents: String,
    pub lines: Vec<(u32, u32)>,
}

/// A declaration source file, cheap to clone and share across spans.
#[derive(Clone)]
pub struct Source {
    src: Rc<SourceInternal>,
}

impl cmp::Ord for Source {
    fn cmp(&self, other: &Source) -> cmp::Ordering {
        Rc::as_ptr(&self.src).cmp(&Rc::as_ptr(&other.src))
    }
}

impl cmp::PartialOrd for Source {
    fn partial_cmp(&self, other: &Source) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl cmp::PartialEq for Source {
    fn eq(&self, other: &Source) -> bool {
        Rc::as_ptr(&self.src) == Rc::as_ptr(&other.src)
    }
}

impl cmp::Eq for Source {}

impl Debug for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        self.src.file.fmt(f)
    }
}

impl Source {
    pub fn from_contents(file: String, contents: String) -> Result<Source> {
        let max_size = u32::MAX as usize - 2;
        if contents.len() > max_size {
            bail!("{file} exceeds maximum allowed declaration file size {max_size}");
        }
        let mut lines = vec![];
        let mut prev_ch = ' ';
        let mut prev_pos = 0u32;
        let mut start = 0u32;
        for (i, ch) in contents.char_indices() {
            if ch == '\n' {
                let end = match prev_ch {
                    '\r' => prev_pos,
                    _ => i as u32,
                };
                lines.push((start, end));
                start = i as u32 + 1;
            }
            prev_ch = ch;
            prev_pos = i as u32;
        }

        if (start as usize) < contents.len() {
            lines.push((start, contents.len() as u32));
        } else if contents.is_empty() {
            lines.push((0, 0));
        } else {
            let s = (contents.len() - 1) as u32;
            lines.push((s, s));
        }
        Ok(Self {
            src: Rc::new(SourceInternal {
                file,
                contents,
                lines,
            }),
        })
    }

    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Source> {
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => bail!("Failed to read {}. {e}", path.as_ref().display()),
        };
        Self::from_contents(path.as_ref().to_string_lossy().to_string(), contents)
    }

    pub fn file(&self) -> &String {
        &self.src.file
    }

    pub fn contents(&self) -> &String {
        &self.src.contents
    }

    pub fn line(&self, idx: u32) -> &str {
        let idx = idx as usize;
        if idx < self.src.lines.len() {
            let (start, end) = self.src.lines[idx];
            &self.src.contents[start as usize..end as usize]
        } else {
            ""
        }
    }

    pub fn message(&self, line: u32, col: u32, kind: &str, msg: &str) -> String {
        if line as usize > self.src.lines.len() {
            return format!("{}: invalid line {} specified", self.src.file, line);
        }

        let line_str = format!("{line}");
        let line_num_width = line_str.len() + 1;
        let col_spaces = col as usize - 1;

        format!(
            "\n--> {}:{}:{}\n{:<line_num_width$}|\n\
	     {:<line_num_width$}| {}\n\
	     {:<line_num_width$}| {:<col_spaces$}^\n\
	     {}: {}",
            self.src.file,
            line,
            col,
            "",
            line,
            self.line(line - 1),
            "",
            "",
            kind,
            msg
        )
    }

    pub fn error(&self, line: u32, col: u32, msg: &str) -> anyhow::Error {
        anyhow!(self.message(line, col, "error", msg))
    }
}

#[derive(Clone)]
pub struct Span {
    pub source: Source,
    pub line: u32,
    pub col: u32,
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn text(&self) -> &str {
        &self.source.contents()[self.start as usize..self.end as usize]
    }

    pub fn message(&self, kind: &str, msg: &str) -> String {
        self.source.message(self.line, self.col, kind, msg)
    }

    pub fn error(&self, msg: &str) -> anyhow::Error {
        self.source.error(self.line, self.col, msg)
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let t = self.text().escape_debug().to_string();
        let max = 32;
        let (txt, trailer) = if t.len() > max {
            (&t[0..max], "...")
        } else {
            (t.as_str(), "")
        };

        f.write_fmt(format_args!(
            "{}:{}:{}:{}, \"{}{}\"",
            self.line, self.col, self.start, self.end, txt, trailer
        ))
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenKind {
    Symbol,
    String,
    ByteString,
    Number,
    Ident,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token(pub TokenKind, pub Span);

/// Tokenizer for the domain declaration language.
///
/// Strings and byte strings carry spans over their *inner* text; use
/// [`unescape_string`] / [`unescape_bytes`] to decode them.
#[derive(Clone)]
pub struct Lexer<'source> {
    source: Source,
    iter: Peekable<CharIndices<'source>>,
    line: u32,
    col: u32,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source Source) -> Self {
        Self {
            source: source.clone(),
            iter: source.contents().char_indices().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn peek(&mut self) -> (usize, char) {
        match self.iter.peek() {
            Some((index, chr)) => (*index, *chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn peekahead(&mut self, n: usize) -> (usize, char) {
        match self.iter.clone().nth(n) {
            Some((index, chr)) => (index, chr),
            _ => (self.source.contents().len(), '\x00'),
        }
    }

    fn read_ident(&mut self) -> Result<Token> {
        let start = self.peek().0;
        let col = self.col;
        loop {
            let ch = self.peek().1;
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.iter.next();
            } else {
                break;
            }
        }
        let end = self.peek().0;
        self.col += (end - start) as u32;
        Ok(Token(
            TokenKind::Ident,
            Span {
                source: self.source.clone(),
                line: self.line,
                col,
                start: start as u32,
                end: end as u32,
            },
        ))
    }

    fn read_number(&mut self) -> Result<Token> {
        let (start, chr) = self.peek();
        let col = self.col;

        if chr == '-' {
            self.iter.next();
        }
        while self.peek().1.is_ascii_digit() {
            self.iter.next();
        }
        // Fractional part makes it a float.
        if self.peek().1 == '.' && self.peekahead(1).1.is_ascii_digit() {
            self.iter.next();
            while self.peek().1.is_ascii_digit() {
                self.iter.next();
            }
        }

        let end = self.peek().0;
        self.col += (end - start) as u32;
        if self.peek().1.is_ascii_alphabetic() {
            return Err(self
                .source
                .error(self.line, self.col, "invalid character in number"));
        }
        Ok(Token(
            TokenKind::Number,
            Span {
                source: self.source.clone(),
                line: self.line,
                col,
                start: start as u32,
                end: end as u32,
            },
        ))
    }

    fn read_string(&mut self, kind: TokenKind) -> Result<Token> {
        let line = self.line;
        let col = self.col;
        // Opening quote.
        self.iter.next();
        self.col += 1;
        let start = self.peek().0;
        loop {
            let (offset, chr) = self.peek();
            match chr {
                '"' => {
                    let end = offset;
                    self.iter.next();
                    self.col += 1;
                    return Ok(Token(
                        kind,
                        Span {
                            source: self.source.clone(),
                            line,
                            col: col + 1,
                            start: start as u32,
                            end: end as u32,
                        },
                    ));
                }
                '\\' => {
                    self.iter.next();
                    self.col += 1;
                    let escaped = self.peek().1;
                    match escaped {
                        '"' | '\\' | 'n' | 't' | 'r' | '0' => {
                            self.iter.next();
                            self.col += 1;
                        }
                        'x' if kind == TokenKind::ByteString => {
                            self.iter.next();
                            self.col += 1;
                            for _ in 0..2 {
                                if !self.peek().1.is_ascii_hexdigit() {
                                    return Err(self.source.error(
                                        self.line,
                                        self.col,
                                        "invalid \\x escape in byte string",
                                    ));
                                }
                                self.iter.next();
                                self.col += 1;
                            }
                        }
                        _ => {
                            return Err(self.source.error(
                                self.line,
                                self.col,
                                "invalid escape sequence",
                            ))
                        }
                    }
                }
                '\n' | '\x00' => {
                    return Err(self
                        .source
                        .error(self.line, self.col, "unterminated string"))
                }
                _ => {
                    self.iter.next();
                    self.col += 1;
                }
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token> {
        loop {
            let (start, chr) = self.peek();
            match chr {
                ' ' | '\t' | '\r' => {
                    self.iter.next();
                    self.col += 1;
                }
                '\n' => {
                    self.iter.next();
                    self.line += 1;
                    self.col = 1;
                }
                '#' => {
                    // Comment runs to end of line.
                    while !matches!(self.peek().1, '\n' | '\x00') {
                        self.iter.next();
                    }
                }
                '"' => return self.read_string(TokenKind::String),
                'b' if self.peekahead(1).1 == '"' => {
                    self.iter.next();
                    self.col += 1;
                    return self.read_string(TokenKind::ByteString);
                }
                '-' if self.peekahead(1).1.is_ascii_digit() => return self.read_number(),
                _ if chr.is_ascii_digit() => return self.read_number(),
                _ if chr.is_ascii_alphabetic() || chr == '_' => return self.read_ident(),
                '{' | '}' | '(' | ')' | '[' | ']' | ':' | ',' | '=' => {
                    let col = self.col;
                    self.iter.next();
                    self.col += 1;
                    return Ok(Token(
                        TokenKind::Symbol,
                        Span {
                            source: self.source.clone(),
                            line: self.line,
                            col,
                            start: start as u32,
                            end: start as u32 + 1,
                        },
                    ));
                }
                '\x00' if start == self.source.contents().len() => {
                    return Ok(Token(
                        TokenKind::Eof,
                        Span {
                            source: self.source.clone(),
                            line: self.line,
                            col: self.col,
                            start: start as u32,
                            end: start as u32,
                        },
                    ))
                }
                _ => {
                    return Err(self.source.error(
                        self.line,
                        self.col,
                        &format!("unexpected character `{chr}`"),
                    ))
                }
            }
        }
    }
}

/// Decode the inner text of a string token.
pub fn unescape_string(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            other => bail!("invalid escape sequence \\{}", other.unwrap_or(' ')),
        }
    }
    Ok(out)
}

/// Decode the inner text of a byte-string token.
pub fn unescape_bytes(text: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('"') => out.push(b'"'),
            Some('\\') => out.push(b'\\'),
            Some('n') => out.push(b'\n'),
            Some('t') => out.push(b'\t'),
            Some('r') => out.push(b'\r'),
            Some('0') => out.push(0),
            Some('x') => {
                let hi = chars.next();
                let lo = chars.next();
                match (hi.and_then(|c| c.to_digit(16)), lo.and_then(|c| c.to_digit(16))) {
                    (Some(hi), Some(lo)) => out.push((hi * 16 + lo) as u8),
                    _ => bail!("invalid \\x escape in byte string"),
                }
            }
            other => bail!("invalid escape sequence \\{}", other.unwrap_or(' ')),
        }
    }
    Ok(out)
}
