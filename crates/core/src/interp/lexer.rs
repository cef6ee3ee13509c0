//! Content-stream tokenizer.
//!
//! Turns the bytes of a content stream into operands and operators.
//! Arrays and dictionaries are assembled into single operands, and an
//! inline image (`BI ... ID <data> EI`) is returned as one token carrying
//! its dictionary and raw data.

use bytes::Bytes;
use smol_str::SmolStr;
use tracing::warn;

use crate::error::{PdfError, Result};
use crate::model::objects::{Dictionary, Name, Object};

/// Output of the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Operand(Object),
    Operator(SmolStr),
    /// A complete `BI ... ID ... EI` sequence.
    InlineImage { dict: Dictionary, data: Bytes },
}

impl Token {
    pub fn operator(name: &str) -> Self {
        Self::Operator(SmolStr::new(name))
    }
}

/// Lexical units before arrays and dictionaries are assembled.
#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Object(Object),
    Keyword(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
}

/// Deepest nesting of arrays and dictionaries kept by the lexer.
pub const MAX_NESTING: usize = 256;

/// Containers being assembled.
#[derive(Debug)]
enum Frame {
    Array(Vec<Object>),
    Dict(Vec<Object>),
}

/// Tokenizer over one content stream.
pub struct ContentLexer {
    data: Bytes,
    pos: usize,
    frames: Vec<Frame>,
    /// Operands collected between `BI` and `ID`.
    inline_dict: Option<Vec<Object>>,
}

impl ContentLexer {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            frames: Vec::new(),
            inline_dict: None,
        }
    }

    pub const fn position(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos + offset).copied()
    }

    fn advance_one(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'%' {
                while let Some(c) = self.advance_one() {
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                }
            } else if is_whitespace(b) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn next_lexeme(&mut self) -> Option<Result<Lexeme>> {
        self.skip_whitespace();
        let start = self.pos;
        let b = self.peek()?;
        let result = match b {
            b'/' => Ok(Lexeme::Object(self.parse_name())),
            b'(' => self.parse_string().map(Lexeme::Object),
            b'<' if self.peek_at(1) == Some(b'<') => {
                self.pos += 2;
                Ok(Lexeme::DictStart)
            }
            b'<' => self.parse_hex_string().map(Lexeme::Object),
            b'>' if self.peek_at(1) == Some(b'>') => {
                self.pos += 2;
                Ok(Lexeme::DictEnd)
            }
            b'[' | b'{' => {
                self.pos += 1;
                Ok(Lexeme::ArrayStart)
            }
            b']' | b'}' => {
                self.pos += 1;
                Ok(Lexeme::ArrayEnd)
            }
            b'+' | b'-' | b'.' | b'0'..=b'9' => self.parse_number(start).map(Lexeme::Object),
            b')' | b'>' => {
                self.pos += 1;
                Err(PdfError::TokenError {
                    pos: start,
                    msg: format!("unbalanced '{}'", char::from(b)),
                })
            }
            _ => Ok(self.parse_keyword()),
        };
        Some(result)
    }

    fn parse_name(&mut self) -> Object {
        self.pos += 1;
        let mut name = Vec::with_capacity(16);
        while let Some(b) = self.peek() {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            if b == b'#'
                && let (Some(h1), Some(h2)) = (
                    self.peek_at(1).and_then(hex_value),
                    self.peek_at(2).and_then(hex_value),
                )
            {
                self.pos += 3;
                name.push((h1 << 4) | h2);
                continue;
            }
            name.push(b);
            self.pos += 1;
        }
        Object::Name(Name::new(String::from_utf8_lossy(&name)))
    }

    fn parse_number(&mut self, start: usize) -> Result<Object> {
        let mut negative = false;
        // Repeated signs ("--5") show up in broken producers.
        while let Some(sign @ (b'+' | b'-')) = self.peek() {
            negative ^= sign == b'-';
            self.pos += 1;
        }

        let mut int_part: i64 = 0;
        let mut int_digits = 0u32;
        while let Some(b @ b'0'..=b'9') = self.peek() {
            int_part = int_part.saturating_mul(10).saturating_add(i64::from(b - b'0'));
            int_digits += 1;
            self.pos += 1;
        }

        let mut is_real = false;
        let mut frac = 0.0;
        let mut scale = 1.0;
        if self.peek() == Some(b'.') {
            is_real = true;
            self.pos += 1;
            while let Some(b @ b'0'..=b'9') = self.peek() {
                scale /= 10.0;
                frac += f64::from(b - b'0') * scale;
                self.pos += 1;
            }
        }

        if int_digits == 0 && scale == 1.0 {
            // Skip whatever follows so the caller makes progress.
            while self.peek().is_some_and(|b| !is_keyword_end(b)) {
                self.pos += 1;
            }
            return Err(PdfError::TokenError {
                pos: start,
                msg: "invalid number".into(),
            });
        }

        Ok(if is_real {
            let v = int_part as f64 + frac;
            Object::Real(if negative { -v } else { v })
        } else {
            Object::Int(if negative { -int_part } else { int_part })
        })
    }

    fn parse_string(&mut self) -> Result<Object> {
        self.pos += 1;
        let mut out = Vec::with_capacity(32);
        let mut depth = 1;
        loop {
            match self.advance_one().ok_or(PdfError::UnexpectedEof)? {
                b'(' => {
                    depth += 1;
                    out.push(b'(');
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    out.push(b')');
                }
                b'\\' => match self.advance_one().ok_or(PdfError::UnexpectedEof)? {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0c),
                    b'\r' => {
                        if self.peek() == Some(b'\n') {
                            self.pos += 1;
                        }
                    }
                    b'\n' => {}
                    c @ b'0'..=b'7' => {
                        let mut octal = u32::from(c - b'0');
                        for _ in 0..2 {
                            match self.peek() {
                                Some(d @ b'0'..=b'7') => {
                                    self.pos += 1;
                                    octal = octal * 8 + u32::from(d - b'0');
                                }
                                _ => break,
                            }
                        }
                        out.push((octal & 0xFF) as u8);
                    }
                    c => out.push(c),
                },
                c => out.push(c),
            }
        }
        Ok(Object::String(out))
    }

    fn parse_hex_string(&mut self) -> Result<Object> {
        self.pos += 1;
        let mut out = Vec::new();
        let mut pending: Option<u8> = None;
        loop {
            let c = self.advance_one().ok_or(PdfError::UnexpectedEof)?;
            if c == b'>' {
                break;
            }
            if let Some(nibble) = hex_value(c) {
                match pending.take() {
                    Some(high) => out.push((high << 4) | nibble),
                    None => pending = Some(nibble),
                }
            } else if !is_whitespace(c) {
                return Err(PdfError::TokenError {
                    pos: self.pos - 1,
                    msg: format!("invalid hex digit '{}'", char::from(c)),
                });
            }
        }
        // Odd digit count: the last digit is followed by an implied 0.
        if let Some(high) = pending {
            out.push(high << 4);
        }
        Ok(Object::String(out))
    }

    fn parse_keyword(&mut self) -> Lexeme {
        let start = self.pos;
        while self.peek().is_some_and(|b| !is_keyword_end(b)) {
            self.pos += 1;
        }
        if self.pos == start {
            // Lone delimiter we have no use for.
            self.pos += 1;
        }
        match &self.data[start..self.pos] {
            b"true" => Lexeme::Object(Object::Bool(true)),
            b"false" => Lexeme::Object(Object::Bool(false)),
            b"null" => Lexeme::Object(Object::Null),
            kw => Lexeme::Keyword(kw.to_vec()),
        }
    }

    /// Reads inline image data up to the end marker, which must be followed
    /// by whitespace or the end of the stream.
    fn read_inline_data(&mut self, marker: &[u8]) -> Bytes {
        // A single whitespace byte separates ID from the data.
        if self.peek().is_some_and(is_whitespace) {
            self.pos += 1;
        }
        let start = self.pos;
        let mut end = self.data.len();
        let mut resume = self.data.len();
        let mut i = start;
        while i + marker.len() <= self.data.len() {
            if &self.data[i..i + marker.len()] == marker {
                let after = self.data.get(i + marker.len()).copied();
                let before_ok = marker != b"EI" || i == start || is_whitespace(self.data[i - 1]);
                if before_ok && after.is_none_or(is_whitespace) {
                    end = i;
                    resume = i + marker.len();
                    break;
                }
            }
            i += 1;
        }
        let mut data_end = end;
        if marker == b"EI" {
            // Drop the whitespace that separates the data from EI.
            if data_end > start && is_whitespace(self.data[data_end - 1]) {
                data_end -= 1;
                if self.data[data_end] == b'\n' && data_end > start && self.data[data_end - 1] == b'\r' {
                    data_end -= 1;
                }
            }
        } else {
            // ASCII85 data keeps its "~>" terminator; skip to the EI keyword.
            data_end = (end + marker.len()).min(self.data.len());
            self.pos = resume;
            self.skip_whitespace();
            if self.data[self.pos..].starts_with(b"EI") {
                resume = self.pos + 2;
            }
        }
        self.pos = resume;
        self.data.slice(start..data_end)
    }

    /// Routes a finished operand to the innermost container, the inline
    /// image dictionary, or the caller.
    fn deliver(&mut self, obj: Object) -> Option<Token> {
        match self.frames.last_mut() {
            Some(Frame::Array(items) | Frame::Dict(items)) => {
                items.push(obj);
                None
            }
            None => match self.inline_dict.as_mut() {
                Some(items) => {
                    items.push(obj);
                    None
                }
                None => Some(Token::Operand(obj)),
            },
        }
    }

    /// Next token, or `None` at end of input. Errors leave the lexer past
    /// the offending bytes, so iteration can continue.
    pub fn next_token(&mut self) -> Option<Result<Token>> {
        loop {
            let lexeme = match self.next_lexeme() {
                None => {
                    return self.finish();
                }
                Some(Err(e)) => return Some(Err(e)),
                Some(Ok(l)) => l,
            };
            match lexeme {
                Lexeme::Object(obj) => {
                    if let Some(tok) = self.deliver(obj) {
                        return Some(Ok(tok));
                    }
                }
                Lexeme::ArrayStart | Lexeme::DictStart if self.frames.len() >= MAX_NESTING => {
                    let pos = self.pos;
                    self.skip_container();
                    return Some(Err(PdfError::TokenError {
                        pos,
                        msg: format!("arrays and dictionaries nested deeper than {MAX_NESTING}"),
                    }));
                }
                Lexeme::ArrayStart => self.frames.push(Frame::Array(Vec::new())),
                Lexeme::DictStart => self.frames.push(Frame::Dict(Vec::new())),
                Lexeme::ArrayEnd => match self.frames.pop() {
                    Some(Frame::Array(items)) => {
                        if let Some(tok) = self.deliver(Object::Array(items)) {
                            return Some(Ok(tok));
                        }
                    }
                    Some(other) => {
                        self.frames.push(other);
                        warn!(pos = self.pos, "']' closes a dictionary, ignored");
                    }
                    None => warn!(pos = self.pos, "']' without '[', ignored"),
                },
                Lexeme::DictEnd => match self.frames.pop() {
                    Some(Frame::Dict(items)) => {
                        if let Some(tok) = self.deliver(Object::Dict(pairs_to_dict(items))) {
                            return Some(Ok(tok));
                        }
                    }
                    Some(other) => {
                        self.frames.push(other);
                        warn!(pos = self.pos, "'>>' closes an array, ignored");
                    }
                    None => warn!(pos = self.pos, "'>>' without '<<', ignored"),
                },
                Lexeme::Keyword(kw) => {
                    if !self.frames.is_empty() {
                        // Bare keywords inside containers carry no meaning.
                        warn!(
                            pos = self.pos,
                            keyword = %String::from_utf8_lossy(&kw),
                            "keyword inside array or dictionary, ignored"
                        );
                        continue;
                    }
                    match (kw.as_slice(), self.inline_dict.is_some()) {
                        (b"BI", _) => {
                            if self.inline_dict.is_some() {
                                warn!(pos = self.pos, "BI inside an inline image dictionary");
                            }
                            self.inline_dict = Some(Vec::new());
                        }
                        (b"ID", true) => {
                            let dict = pairs_to_dict(self.inline_dict.take().unwrap_or_default());
                            let marker: &[u8] = if is_ascii85(&dict) { b"~>" } else { b"EI" };
                            let data = self.read_inline_data(marker);
                            return Some(Ok(Token::InlineImage { dict, data }));
                        }
                        (_, true) => {
                            // Keyword values inside BI ... ID are not valid;
                            // keep them as names so abbreviations still work.
                            let name = Name::new(String::from_utf8_lossy(&kw));
                            if let Some(items) = self.inline_dict.as_mut() {
                                items.push(Object::Name(name));
                            }
                        }
                        (_, false) => {
                            return Some(Ok(Token::Operator(SmolStr::new(
                                String::from_utf8_lossy(&kw),
                            ))));
                        }
                    }
                }
            }
        }
    }

    /// Skips past the close matching a container start that was just read.
    /// Enclosing containers are left open.
    fn skip_container(&mut self) {
        let mut depth = 1usize;
        while depth > 0 {
            match self.next_lexeme() {
                None | Some(Err(PdfError::UnexpectedEof)) => return,
                Some(Ok(Lexeme::ArrayStart | Lexeme::DictStart)) => depth += 1,
                Some(Ok(Lexeme::ArrayEnd | Lexeme::DictEnd)) => depth -= 1,
                Some(_) => {}
            }
        }
    }

    /// Flushes unterminated containers at end of input.
    fn finish(&mut self) -> Option<Result<Token>> {
        if self.inline_dict.take().is_some() {
            warn!("inline image dictionary not terminated by ID");
            // The caller sees a bare BI so the builder state stays coherent.
            return Some(Ok(Token::operator("BI")));
        }
        while let Some(frame) = self.frames.pop() {
            warn!("unterminated array or dictionary at end of stream");
            let obj = match frame {
                Frame::Array(items) => Object::Array(items),
                Frame::Dict(items) => Object::Dict(pairs_to_dict(items)),
            };
            if let Some(tok) = self.deliver(obj) {
                return Some(Ok(tok));
            }
        }
        None
    }
}

impl Iterator for ContentLexer {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Tokenizes a whole stream, logging and skipping malformed tokens.
pub fn tokenize(data: impl Into<Bytes>) -> Vec<Token> {
    let mut lexer = ContentLexer::new(data);
    let mut out = Vec::new();
    while let Some(item) = lexer.next_token() {
        match item {
            Ok(tok) => out.push(tok),
            Err(PdfError::UnexpectedEof) => {
                warn!("content stream ends inside a string");
                break;
            }
            Err(e) => warn!(error = %e, "skipping malformed token"),
        }
    }
    out
}

/// Tokenizes a whole stream, failing on the first malformed token.
pub fn try_tokenize(data: impl Into<Bytes>) -> Result<Vec<Token>> {
    ContentLexer::new(data).collect()
}

fn pairs_to_dict(items: Vec<Object>) -> Dictionary {
    let mut dict = Dictionary::new();
    let mut iter = items.into_iter();
    while let Some(key) = iter.next() {
        match (key, iter.next()) {
            (Object::Name(name), Some(value)) => {
                dict.insert(name, value);
            }
            (Object::Name(name), None) => {
                warn!(key = %name, "dictionary key without value");
            }
            (other, _) => {
                warn!(got = other.type_name(), "dictionary key is not a name");
            }
        }
    }
    dict
}

fn is_ascii85(dict: &Dictionary) -> bool {
    let is_a85 = |o: &Object| matches!(o.as_name(), Ok("A85" | "ASCII85Decode"));
    match dict.get("F").or_else(|| dict.get("Filter")) {
        Some(Object::Array(filters)) => filters.first().is_some_and(is_a85),
        Some(other) => is_a85(other),
        None => false,
    }
}

const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x00' | b'\x0c')
}

const fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

const fn is_keyword_end(b: u8) -> bool {
    is_whitespace(b) || is_delimiter(b)
}

const fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(name: &str) -> Token {
        Token::operator(name)
    }

    fn num(v: i64) -> Token {
        Token::Operand(Object::Int(v))
    }

    #[test]
    fn nesting_past_the_limit_is_a_token_error() {
        let depth = 20_000;
        let mut data = "[".repeat(depth);
        data.push_str(&"]".repeat(depth));
        data.push_str(" TJ");
        let mut lexer = ContentLexer::new(data.into_bytes());
        let first = lexer.next_token().expect("a token");
        assert!(matches!(first, Err(PdfError::TokenError { .. })));

        // The outer containers are still delivered, capped at the limit.
        let tokens = tokenize(format!("{}{} TJ", "[".repeat(depth), "]".repeat(depth)).into_bytes());
        assert_eq!(tokens.len(), 2);
        let mut obj = match &tokens[0] {
            Token::Operand(obj) => obj,
            other => panic!("expected an operand, got {other:?}"),
        };
        let mut levels = 0;
        while let Object::Array(items) = obj {
            levels += 1;
            match items.first() {
                Some(inner) => obj = inner,
                None => break,
            }
        }
        assert_eq!(levels, MAX_NESTING);
        assert_eq!(tokens[1], op("TJ"));
    }

    #[test]
    fn unterminated_deep_nesting_ends_the_stream() {
        let data = "<<".repeat(10_000);
        let tokens = tokenize(data.into_bytes());
        assert!(tokens.len() <= 1);
    }

    #[test]
    fn operands_precede_operators() {
        let tokens = tokenize(&b"BT 1 0 0 1 72 720 Tm ET"[..]);
        assert_eq!(
            tokens,
            vec![
                op("BT"),
                num(1),
                num(0),
                num(0),
                num(1),
                num(72),
                num(720),
                op("Tm"),
                op("ET")
            ]
        );
    }

    #[test]
    fn numbers() {
        let tokens = tokenize(&b"-.5 +3 4. --2 0.25"[..]);
        assert_eq!(
            tokens,
            vec![
                Token::Operand(Object::Real(-0.5)),
                num(3),
                Token::Operand(Object::Real(4.0)),
                num(2),
                Token::Operand(Object::Real(0.25)),
            ]
        );
    }

    #[test]
    fn names_and_strings() {
        let tokens = tokenize(&br"/A#20B (a\(b\)\101\n) <48 65 6C6C 6F> <7>"[..]);
        assert_eq!(
            tokens,
            vec![
                Token::Operand(Object::name("A B")),
                Token::Operand(Object::String(b"a(b)A\n".to_vec())),
                Token::Operand(Object::String(b"Hello".to_vec())),
                Token::Operand(Object::String(vec![0x70])),
            ]
        );
    }

    #[test]
    fn arrays_and_dictionaries_nest() {
        let tokens = tokenize(&b"[(a) -120 (b)] TJ /Span <</MCID 3 /Alt (x) /Inner [1 2]>> BDC % comment\nEMC"[..]);
        assert_eq!(tokens.len(), 6);
        assert_eq!(
            tokens[0],
            Token::Operand(Object::Array(vec![
                Object::String(b"a".to_vec()),
                Object::Int(-120),
                Object::String(b"b".to_vec()),
            ]))
        );
        let Token::Operand(Object::Dict(d)) = &tokens[3] else {
            panic!("expected a dictionary, got {:?}", tokens[3]);
        };
        assert_eq!(d.get("MCID"), Some(&Object::Int(3)));
        assert_eq!(
            d.get("Inner"),
            Some(&Object::Array(vec![Object::Int(1), Object::Int(2)]))
        );
        assert_eq!(tokens[5], op("EMC"));
    }

    #[test]
    fn inline_image_is_one_token() {
        let data = b"q BI /W 2 /H 1 /BPC 8 /CS /G ID \x00\xff\nEI Q";
        let tokens = tokenize(&data[..]);
        assert_eq!(tokens.len(), 3);
        let Token::InlineImage { dict, data } = &tokens[1] else {
            panic!("expected an inline image, got {:?}", tokens[1]);
        };
        assert_eq!(dict.get("W"), Some(&Object::Int(2)));
        assert_eq!(dict.get("CS"), Some(&Object::name("G")));
        assert_eq!(data.as_ref(), b"\x00\xff");
        assert_eq!(tokens[2], op("Q"));
    }

    #[test]
    fn inline_image_data_may_contain_ei_bytes() {
        let data = b"BI /W 3 /H 1 /BPC 8 ID aEIb EI n";
        let tokens = tokenize(&data[..]);
        let Token::InlineImage { data, .. } = &tokens[0] else {
            panic!("expected an inline image");
        };
        assert_eq!(data.as_ref(), b"aEIb");
        assert_eq!(tokens[1], op("n"));
    }

    #[test]
    fn ascii85_inline_data_ends_at_terminator() {
        let data = b"BI /W 1 /H 1 /BPC 8 /F /A85 ID 87cURD]i,\"Ebo80~> EI Q";
        let tokens = tokenize(&data[..]);
        let Token::InlineImage { data, .. } = &tokens[0] else {
            panic!("expected an inline image");
        };
        assert!(data.ends_with(b"~>"));
        assert_eq!(tokens[1], op("Q"));
    }

    #[test]
    fn strict_mode_reports_unterminated_string() {
        assert!(matches!(
            try_tokenize(&b"(never closed"[..]),
            Err(PdfError::UnexpectedEof)
        ));
        assert!(tokenize(&b"(never closed"[..]).is_empty());
    }

    #[test]
    fn malformed_tokens_are_skipped() {
        let tokens = tokenize(&b"1 ) - 2 re"[..]);
        assert_eq!(tokens, vec![num(1), num(2), op("re")]);
    }
}
