//! Pattern operands: quoted strings and hex literals

use super::command::ParseError;

/// Cursor over the unparsed remainder of a command line
#[derive(Debug)]
pub(crate) struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(line: &'a str) -> Self {
        Self { rest: line }
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    /// Next whitespace-delimited word
    pub(crate) fn next_word(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        if self.rest.is_empty() {
            return None;
        }
        let end = self.rest.find(char::is_whitespace).unwrap_or(self.rest.len());
        let (word, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(word)
    }

    /// Remaining input after leading whitespace
    pub(crate) fn remaining(&mut self) -> &'a str {
        self.skip_whitespace();
        self.rest
    }

    /// Fail if anything but whitespace is left
    pub(crate) fn expect_end(&mut self) -> Result<(), ParseError> {
        match self.remaining() {
            "" => Ok(()),
            rest => Err(ParseError::UnexpectedInput(rest.to_string())),
        }
    }

    /// Parse a pattern operand if one starts here.
    ///
    /// Returns `Ok(None)` when the next token is neither a quoted string nor a
    /// hex literal; the input is not consumed in that case.
    pub(crate) fn operand(&mut self) -> Result<Option<Vec<u8>>, ParseError> {
        let rest = self.remaining();
        if rest.starts_with('"') {
            let (bytes, rest) = parse_quoted_literal(rest)?;
            self.rest = rest;
            Ok(Some(bytes))
        } else if rest.starts_with("0x") || rest.starts_with("0X") {
            let word = self.next_word().unwrap_or_default();
            parse_hex_literal(word).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Decode a double-quoted string literal at the start of `input`.
///
/// Supports the simple character escapes `\n \t \r \0 \a \b \f \v \\ \" \' \?`.
/// Returns the decoded bytes and the input following the closing quote.
pub fn parse_quoted_literal(input: &str) -> Result<(Vec<u8>, &str), ParseError> {
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, '"')) => {}
        _ => return Err(ParseError::UnterminatedString),
    }

    let mut value = String::new();
    while let Some((index, ch)) = chars.next() {
        match ch {
            '"' => return Ok((value.into_bytes(), &input[index + 1..])),
            '\\' => {
                let (_, escaped) = chars.next().ok_or(ParseError::UnterminatedString)?;
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    'a' => '\x07',
                    'b' => '\x08',
                    'f' => '\x0c',
                    'v' => '\x0b',
                    '\\' | '"' | '\'' | '?' => escaped,
                    other => return Err(ParseError::BadEscape(other)),
                });
            }
            other => value.push(other),
        }
    }
    Err(ParseError::UnterminatedString)
}

/// Decode a hex literal such as `0xCAFE` into bytes. The digits must come in
/// pairs.
pub fn parse_hex_literal(word: &str) -> Result<Vec<u8>, ParseError> {
    let bad = || ParseError::BadHexLiteral(word.to_string());
    let digits = word
        .strip_prefix("0x")
        .or_else(|| word.strip_prefix("0X"))
        .ok_or_else(bad)?;
    if digits.is_empty() || digits.len() % 2 != 0 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(bad());
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| bad()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_literal() {
        let (bytes, rest) = parse_quoted_literal(r#""one fish, two fish" s OK"#).unwrap();
        assert_eq!(bytes, b"one fish, two fish");
        assert_eq!(rest, " s OK");
    }

    #[test]
    fn test_quoted_escapes() {
        let (bytes, rest) = parse_quoted_literal(r#""a\tb\n\"q\"\\\0""#).unwrap();
        assert_eq!(bytes, b"a\tb\n\"q\"\\\0");
        assert_eq!(rest, "");
    }

    #[test]
    fn test_quoted_errors() {
        assert!(matches!(parse_quoted_literal(r#""open"#), Err(ParseError::UnterminatedString)));
        assert!(matches!(parse_quoted_literal(r#""trailing\"#), Err(ParseError::UnterminatedString)));
        assert!(matches!(parse_quoted_literal(r#""\q""#), Err(ParseError::BadEscape('q'))));
    }

    #[test]
    fn test_hex_literal() {
        assert_eq!(parse_hex_literal("0xCAFE75").unwrap(), vec![0xCA, 0xFE, 0x75]);
        assert_eq!(parse_hex_literal("0X00ff").unwrap(), vec![0x00, 0xFF]);
        assert!(parse_hex_literal("0xABC").is_err());
        assert!(parse_hex_literal("0x").is_err());
        assert!(parse_hex_literal("0xZZ").is_err());
        assert!(parse_hex_literal("CAFE").is_err());
    }

    #[test]
    fn test_scanner_operands() {
        let mut scanner = Scanner::new(r#"  "X" 0x4142 tail"#);
        assert_eq!(scanner.operand().unwrap(), Some(b"X".to_vec()));
        assert_eq!(scanner.operand().unwrap(), Some(b"AB".to_vec()));
        assert_eq!(scanner.operand().unwrap(), None);
        assert_eq!(scanner.next_word(), Some("tail"));
        assert!(scanner.expect_end().is_ok());
    }
}
