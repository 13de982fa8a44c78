//! Pull-token JSON reader.
//!
//! The reader never builds a tree. A codec asks for the next significant
//! byte with [`Reader::next_token`] and then consumes the value that starts
//! at that byte. The contract every codec follows:
//!
//! * on entry to a value decoder, [`Reader::last_token`] is the first byte
//!   of the value;
//! * on return the whole value has been consumed, and the caller calls
//!   `next_token` again to see the delimiter that follows.

use crate::error::{ReadError, ReadErrorKind};
use crate::hash::name_hash;

pub struct Reader<'a> {
    data: &'a [u8],
    x: usize,
    last: u8,
    token_start: usize,
    name_start: usize,
    name_end: usize,
    last_hash: u32,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            x: 0,
            last: 0,
            token_start: 0,
            name_start: 0,
            name_end: 0,
            last_hash: 0,
        }
    }

    /// Offset of the next unread byte.
    #[inline]
    pub fn position(&self) -> usize {
        self.x
    }

    /// Offset of the byte returned by the last `next_token` call.
    #[inline]
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    #[inline]
    pub fn last_token(&self) -> u8 {
        self.last
    }

    fn skip_whitespace(&mut self) {
        while self.x < self.data.len() {
            match self.data[self.x] {
                b' ' | b'\t' | b'\n' | b'\r' => self.x += 1,
                _ => break,
            }
        }
    }

    /// Advances to the next non-whitespace byte and consumes it.
    pub fn next_token(&mut self) -> Result<u8, ReadError> {
        self.skip_whitespace();
        match self.data.get(self.x) {
            Some(&b) => {
                self.token_start = self.x;
                self.last = b;
                self.x += 1;
                Ok(b)
            }
            None => Err(ReadError::new(self.x, ReadErrorKind::UnexpectedEnd)),
        }
    }

    /// True when only whitespace remains.
    pub fn is_end(&mut self) -> bool {
        self.skip_whitespace();
        self.x >= self.data.len()
    }

    /// Syntax error anchored at the current token.
    pub fn error(&self, message: impl Into<String>) -> ReadError {
        ReadError::syntax(self.token_start, message)
    }

    /// Consumes a `null` literal when the current token starts one.
    pub fn was_null(&mut self) -> Result<bool, ReadError> {
        if self.last != b'n' {
            return Ok(false);
        }
        self.expect_literal(b"null")?;
        Ok(true)
    }

    fn expect_literal(&mut self, literal: &[u8]) -> Result<(), ReadError> {
        let s = self.token_start;
        if self.data.get(s..s + literal.len()) == Some(literal) {
            self.x = s + literal.len();
            Ok(())
        } else if s + literal.len() > self.data.len() {
            Err(ReadError::new(self.data.len(), ReadErrorKind::UnexpectedEnd))
        } else {
            Err(self.error(format!(
                "Expecting '{}'",
                String::from_utf8_lossy(literal)
            )))
        }
    }

    pub fn read_bool(&mut self) -> Result<bool, ReadError> {
        match self.last {
            b't' => self.expect_literal(b"true").map(|_| true),
            b'f' => self.expect_literal(b"false").map(|_| false),
            _ => Err(self.error("Expecting boolean")),
        }
    }

    /// Consumes the raw text of a number token.
    pub fn read_number(&mut self) -> Result<&'a str, ReadError> {
        let data = self.data;
        let start = self.token_start;
        let mut end = start;
        while end < data.len()
            && matches!(data[end], b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E')
        {
            end += 1;
        }
        if end == start {
            return Err(self.error("Expecting number"));
        }
        self.x = end;
        std::str::from_utf8(&data[start..end])
            .map_err(|_| ReadError::new(start, ReadErrorKind::InvalidNumber(String::new())))
    }

    pub fn read_i64(&mut self) -> Result<i64, ReadError> {
        let start = self.token_start;
        let text = self.read_number()?;
        text.parse()
            .map_err(|_| ReadError::new(start, ReadErrorKind::InvalidNumber(text.to_string())))
    }

    pub fn read_f64(&mut self) -> Result<f64, ReadError> {
        let start = self.token_start;
        let text = self.read_number()?;
        text.parse()
            .map_err(|_| ReadError::new(start, ReadErrorKind::InvalidNumber(text.to_string())))
    }

    fn string_bounds(&self) -> Result<(usize, usize), ReadError> {
        if self.last != b'"' {
            return Err(self.error("Expecting '\"' for string start"));
        }
        let start = self.token_start + 1;
        let end = find_ending_quote(self.data, start)
            .ok_or_else(|| ReadError::new(self.data.len(), ReadErrorKind::UnexpectedEnd))?;
        Ok((start, end))
    }

    /// Consumes a string token and returns its unescaped content.
    pub fn read_string(&mut self) -> Result<String, ReadError> {
        let (start, end) = self.string_bounds()?;
        let s = decode_json_string(&self.data[start..end])
            .map_err(|msg| ReadError::new(start, ReadErrorKind::InvalidString(msg)))?;
        self.x = end + 1;
        Ok(s)
    }

    /// Consumes a string token and hashes its raw bytes. The bytes stay
    /// available through [`Reader::was_last_name`] and [`Reader::last_name`]
    /// until the next hashed string.
    pub fn calc_hash(&mut self) -> Result<u32, ReadError> {
        let (start, end) = self.string_bounds()?;
        self.name_start = start;
        self.name_end = end;
        self.last_hash = name_hash(&self.data[start..end]);
        self.x = end + 1;
        Ok(self.last_hash)
    }

    /// Reads a property name plus its `:` and returns the name hash.
    pub fn fill_name(&mut self) -> Result<u32, ReadError> {
        if self.last != b'"' {
            return Err(self.error("Expecting '\"' for attribute name start"));
        }
        let hash = self.calc_hash()?;
        if self.next_token()? != b':' {
            return Err(self.error("Expecting ':' after attribute name"));
        }
        Ok(hash)
    }

    #[inline]
    pub fn last_hash(&self) -> u32 {
        self.last_hash
    }

    /// Byte-exact comparison against the last hashed name.
    #[inline]
    pub fn was_last_name(&self, name: &[u8]) -> bool {
        &self.data[self.name_start..self.name_end] == name
    }

    pub fn last_name(&self) -> String {
        String::from_utf8_lossy(&self.data[self.name_start..self.name_end]).into_owned()
    }

    /// Consumes the value starting at the current token without decoding it.
    pub fn skip(&mut self) -> Result<(), ReadError> {
        match self.last {
            b'"' => {
                let (_, end) = self.string_bounds()?;
                self.x = end + 1;
                Ok(())
            }
            b'{' => {
                let mut tok = self.next_token()?;
                if tok == b'}' {
                    return Ok(());
                }
                loop {
                    if tok != b'"' {
                        return Err(self.error("Expecting '\"' for attribute name start"));
                    }
                    self.skip()?;
                    if self.next_token()? != b':' {
                        return Err(self.error("Expecting ':' after attribute name"));
                    }
                    self.next_token()?;
                    self.skip()?;
                    match self.next_token()? {
                        b',' => tok = self.next_token()?,
                        b'}' => return Ok(()),
                        _ => return Err(self.error("Expecting '}' or ','")),
                    }
                }
            }
            b'[' => {
                if self.next_token()? == b']' {
                    return Ok(());
                }
                loop {
                    self.skip()?;
                    match self.next_token()? {
                        b',' => {
                            self.next_token()?;
                        }
                        b']' => return Ok(()),
                        _ => return Err(self.error("Expecting ']' or ','")),
                    }
                }
            }
            b't' => self.expect_literal(b"true"),
            b'f' => self.expect_literal(b"false"),
            b'n' => self.expect_literal(b"null"),
            b'-' | b'0'..=b'9' => self.read_number().map(|_| ()),
            other => Err(self.error(format!("Unexpected character '{}'", other as char))),
        }
    }
}

fn find_ending_quote(data: &[u8], mut x: usize) -> Option<usize> {
    while x < data.len() {
        match data[x] {
            b'"' => return Some(x),
            b'\\' => x += 2,
            _ => x += 1,
        }
    }
    None
}

fn decode_json_string(bytes: &[u8]) -> Result<String, String> {
    // Fast path: no backslash
    if !bytes.contains(&b'\\') {
        return std::str::from_utf8(bytes)
            .map(|s| s.to_string())
            .map_err(|e| e.to_string());
    }
    let mut quoted = Vec::with_capacity(bytes.len() + 2);
    quoted.push(b'"');
    quoted.extend_from_slice(bytes);
    quoted.push(b'"');
    serde_json::from_slice::<String>(&quoted).map_err(|e| e.to_string())
}
