//! The legacy serialized encoding used by stored setting values.
//!
//! Existing settings tables hold values such as
//! `a:3:{s:5:"owner";s:3:"yes";s:5:"agent";s:3:"yes";s:5:"admin";s:3:"yes";}`.
//! [`is_serialized`] decides whether a stored string is in that encoding,
//! [`unserialize`] decodes it into a [`serde_json::Value`], and [`serialize`]
//! writes values back so older readers still understand them.
//!
//! Grammar:
//!
//! ```text
//! N;                       null
//! b:0; b:1;                bool
//! i:<int>;                 integer
//! d:<float>;               float (INF, -INF, NAN decode to null)
//! s:<bytes>:"<text>";      string, length in bytes
//! a:<n>:{<key><value>...}  array, keys are i: or s: entries
//! O:<len>:"<class>":<n>:{<key><value>...}  object
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Number, Value};
use thiserror::Error;

static LENGTH_PREFIXED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[saO]:[0-9]+:").expect("valid regex"));

static SCALAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[bid]:[0-9.E+-]+;$").expect("valid regex"));

/// Deepest array or object nesting [`unserialize`] accepts.
pub const MAX_DEPTH: usize = 64;

/// Characters stripped from both ends before detection.
const TRIM_CHARS: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B'];

/// Errors from [`unserialize`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEnd(usize),

    #[error("unexpected byte '{found}' at byte {pos}, expected {expected}")]
    Unexpected {
        pos: usize,
        expected: &'static str,
        found: char,
    },

    #[error("invalid number '{text}' at byte {pos}")]
    InvalidNumber { pos: usize, text: String },

    #[error("string at byte {0} is not valid UTF-8")]
    InvalidUtf8(usize),

    #[error("unsupported type tag '{tag}' at byte {pos}")]
    UnsupportedTag { pos: usize, tag: char },

    #[error("trailing data at byte {0}")]
    TrailingData(usize),

    #[error("nesting deeper than {MAX_DEPTH} levels at byte {0}")]
    TooDeep(usize),
}

/// Whether `data` looks like a value in the serialized encoding.
///
/// Detection only checks the outer shape; a string that passes may still
/// fail to decode.
pub fn is_serialized(data: &str) -> bool {
    let data = data.trim_matches(TRIM_CHARS);

    if data == "N;" {
        return true;
    }

    let bytes = data.as_bytes();
    if bytes.len() < 4 {
        return false;
    }

    if bytes[1] != b':' {
        return false;
    }

    let last = bytes[bytes.len() - 1];
    if last != b';' && last != b'}' {
        return false;
    }

    match bytes[0] {
        b's' => bytes[bytes.len() - 2] == b'"' && LENGTH_PREFIXED.is_match(data),
        b'a' | b'O' => LENGTH_PREFIXED.is_match(data),
        b'b' | b'i' | b'd' => SCALAR.is_match(data),
        _ => false,
    }
}

/// Decode a serialized value.
pub fn unserialize(data: &str) -> Result<Value, DecodeError> {
    let mut parser = Parser {
        input: data.trim_matches(TRIM_CHARS).as_bytes(),
        pos: 0,
        depth: 0,
    };
    let value = parser.value()?;
    if parser.pos != parser.input.len() {
        return Err(DecodeError::TrailingData(parser.pos));
    }
    Ok(value)
}

/// Encode a value. Objects are written as string-keyed arrays.
pub fn serialize(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("N;"),
        Value::Bool(b) => out.push_str(if *b { "b:1;" } else { "b:0;" }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                out.push_str(&format!("i:{};", i));
            } else if let Some(u) = n.as_u64() {
                out.push_str(&format!("i:{};", u));
            } else {
                out.push_str(&format!("d:{};", n.as_f64().unwrap_or(0.0)));
            }
        }
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push_str(&format!("a:{}:{{", items.len()));
            for (index, item) in items.iter().enumerate() {
                out.push_str(&format!("i:{};", index));
                write_value(out, item);
            }
            out.push('}');
        }
        Value::Object(map) => {
            out.push_str(&format!("a:{}:{{", map.len()));
            for (key, item) in map {
                match key.parse::<i64>() {
                    Ok(index) if index.to_string() == *key => {
                        out.push_str(&format!("i:{};", index))
                    }
                    _ => write_string(out, key),
                }
                write_value(out, item);
            }
            out.push('}');
        }
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push_str(&format!("s:{}:\"{}\";", s.len(), s));
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Result<u8, DecodeError> {
        self.input
            .get(self.pos)
            .copied()
            .ok_or(DecodeError::UnexpectedEnd(self.pos))
    }

    fn expect(&mut self, byte: u8, expected: &'static str) -> Result<(), DecodeError> {
        let found = self.peek()?;
        if found != byte {
            return Err(DecodeError::Unexpected {
                pos: self.pos,
                expected,
                found: found as char,
            });
        }
        self.pos += 1;
        Ok(())
    }

    /// Read up to (not including) `end`, consuming the terminator.
    fn until(&mut self, end: u8) -> Result<&'a str, DecodeError> {
        let input = self.input;
        let start = self.pos;
        let len = input[start..]
            .iter()
            .position(|b| *b == end)
            .ok_or(DecodeError::UnexpectedEnd(input.len()))?;
        self.pos = start + len + 1;
        std::str::from_utf8(&input[start..start + len])
            .map_err(|_| DecodeError::InvalidUtf8(start))
    }

    fn integer(&mut self, end: u8) -> Result<i64, DecodeError> {
        let pos = self.pos;
        let text = self.until(end)?;
        text.parse::<i64>().map_err(|_| DecodeError::InvalidNumber {
            pos,
            text: text.to_string(),
        })
    }

    fn length(&mut self) -> Result<usize, DecodeError> {
        let pos = self.pos;
        let text = self.until(b':')?;
        text.parse::<usize>().map_err(|_| DecodeError::InvalidNumber {
            pos,
            text: text.to_string(),
        })
    }

    /// `<len>:"<bytes>"`, without the trailing terminator.
    fn quoted(&mut self) -> Result<String, DecodeError> {
        let len = self.length()?;
        self.expect(b'"', "'\"'")?;
        let start = self.pos;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.input.len())
            .ok_or(DecodeError::UnexpectedEnd(self.input.len()))?;
        let text = std::str::from_utf8(&self.input[start..end])
            .map_err(|_| DecodeError::InvalidUtf8(start))?
            .to_string();
        self.pos = end;
        self.expect(b'"', "'\"'")?;
        Ok(text)
    }

    fn value(&mut self) -> Result<Value, DecodeError> {
        let pos = self.pos;
        let tag = self.peek()?;
        self.pos += 1;

        match tag {
            b'N' => {
                self.expect(b';', "';'")?;
                Ok(Value::Null)
            }
            b'b' => {
                self.expect(b':', "':'")?;
                match self.integer(b';')? {
                    0 => Ok(Value::Bool(false)),
                    1 => Ok(Value::Bool(true)),
                    other => Err(DecodeError::InvalidNumber {
                        pos,
                        text: other.to_string(),
                    }),
                }
            }
            b'i' => {
                self.expect(b':', "':'")?;
                Ok(Value::Number(self.integer(b';')?.into()))
            }
            b'd' => {
                self.expect(b':', "':'")?;
                let start = self.pos;
                let text = self.until(b';')?;
                match text {
                    "INF" | "-INF" | "NAN" => Ok(Value::Null),
                    _ => text
                        .parse::<f64>()
                        .ok()
                        .and_then(Number::from_f64)
                        .map(Value::Number)
                        .ok_or_else(|| DecodeError::InvalidNumber {
                            pos: start,
                            text: text.to_string(),
                        }),
                }
            }
            b's' => {
                self.expect(b':', "':'")?;
                let text = self.quoted()?;
                self.expect(b';', "';'")?;
                Ok(Value::String(text))
            }
            b'a' => {
                self.expect(b':', "':'")?;
                let count = self.length()?;
                self.entries(count)
            }
            b'O' => {
                self.expect(b':', "':'")?;
                let class = self.quoted()?;
                self.expect(b':', "':'")?;
                let count = self.length()?;
                match self.entries(count)? {
                    Value::Object(map) => Ok(Value::Object(strip_visibility(map, &class))),
                    Value::Array(items) => Ok(Value::Object(
                        items
                            .into_iter()
                            .enumerate()
                            .map(|(i, v)| (i.to_string(), v))
                            .collect(),
                    )),
                    other => Ok(other),
                }
            }
            other => Err(DecodeError::UnsupportedTag {
                pos,
                tag: other as char,
            }),
        }
    }

    /// `{<key><value>...}` with `count` pairs. Returns a list when the keys
    /// are exactly `0..count` in order, otherwise an object.
    fn entries(&mut self, count: usize) -> Result<Value, DecodeError> {
        if self.depth == MAX_DEPTH {
            return Err(DecodeError::TooDeep(self.pos));
        }
        self.expect(b'{', "'{'")?;
        self.depth += 1;

        let mut pairs = Vec::with_capacity(count.min(1024));
        let mut sequential = true;

        for index in 0..count {
            let key_pos = self.pos;
            let key = match self.value()? {
                Value::Number(n) => {
                    if n.as_u64() != Some(index as u64) {
                        sequential = false;
                    }
                    n.to_string()
                }
                Value::String(s) => {
                    sequential = false;
                    s
                }
                _ => {
                    return Err(DecodeError::Unexpected {
                        pos: key_pos,
                        expected: "integer or string key",
                        found: self.input.get(key_pos).copied().unwrap_or(b'?') as char,
                    })
                }
            };
            let value = self.value()?;
            pairs.push((key, value));
        }

        self.expect(b'}', "'}'")?;
        self.depth -= 1;

        if sequential {
            Ok(Value::Array(pairs.into_iter().map(|(_, v)| v).collect()))
        } else {
            Ok(Value::Object(pairs.into_iter().collect()))
        }
    }
}

/// Drop the `\0*\0` / `\0Class\0` prefixes of protected and private
/// property names.
fn strip_visibility(map: Map<String, Value>, class: &str) -> Map<String, Value> {
    let private = format!("\0{}\0", class);
    map.into_iter()
        .map(|(key, value)| {
            let key = key
                .strip_prefix("\0*\0")
                .or_else(|| key.strip_prefix(private.as_str()))
                .map(str::to_string)
                .unwrap_or(key);
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_serialized_examples() {
        assert!(is_serialized(r#"a:2:{i:0;s:3:"yes";i:1;s:2:"no";}"#));
        assert!(is_serialized("N;"));
        assert!(!is_serialized("hello"));
    }

    #[test]
    fn test_is_serialized_scalars() {
        assert!(is_serialized("b:1;"));
        assert!(is_serialized("i:42;"));
        assert!(is_serialized("i:-42;"));
        assert!(is_serialized("d:0.5;"));
        assert!(is_serialized("d:1.0E+25;"));
        assert!(is_serialized(r#"s:3:"abc";"#));
        assert!(is_serialized(r#"O:8:"stdClass":0:{}"#));
        assert!(is_serialized("  N;\n")); // trimmed
    }

    #[test]
    fn test_is_serialized_rejects_near_misses() {
        assert!(!is_serialized(""));
        assert!(!is_serialized("N"));
        assert!(!is_serialized("i:1")); // too short
        assert!(!is_serialized("i:12")); // no terminator
        assert!(!is_serialized("i:abc;"));
        assert!(!is_serialized("b:1;x"));
        assert!(!is_serialized(r#"s:3:"abc""#)); // no terminator
        assert!(!is_serialized("s:3:abc;")); // no closing quote
        assert!(!is_serialized("a:x:{}"));
        assert!(!is_serialized("x:1:{}"));
        assert!(!is_serialized("yes;"));
        assert!(!is_serialized("#0014f4"));
    }

    #[test]
    fn test_unserialize_scalars() {
        assert_eq!(unserialize("N;").unwrap(), Value::Null);
        assert_eq!(unserialize("b:0;").unwrap(), json!(false));
        assert_eq!(unserialize("i:-7;").unwrap(), json!(-7));
        assert_eq!(unserialize("d:0.25;").unwrap(), json!(0.25));
        assert_eq!(unserialize("d:INF;").unwrap(), Value::Null);
        assert_eq!(unserialize(r#"s:5:"hello";"#).unwrap(), json!("hello"));
    }

    #[test]
    fn test_unserialize_string_length_is_bytes() {
        assert_eq!(unserialize(r#"s:6:"héllo";"#).unwrap(), json!("héllo"));
        // Embedded quotes and semicolons are covered by the length prefix.
        assert_eq!(unserialize(r#"s:4:"a";b";"#).unwrap(), json!("a\";b"));
    }

    #[test]
    fn test_unserialize_list_and_map() {
        assert_eq!(
            unserialize(r#"a:2:{i:0;s:3:"yes";i:1;s:2:"no";}"#).unwrap(),
            json!(["yes", "no"])
        );
        assert_eq!(
            unserialize(
                r#"a:3:{s:5:"owner";s:3:"yes";s:5:"agent";s:2:"no";s:5:"admin";s:3:"yes";}"#
            )
            .unwrap(),
            json!({ "owner": "yes", "agent": "no", "admin": "yes" })
        );
        // Non-sequential integer keys become an object.
        assert_eq!(
            unserialize(r#"a:2:{i:5;i:10;i:9;i:20;}"#).unwrap(),
            json!({ "5": 10, "9": 20 })
        );
        assert_eq!(
            unserialize(r#"a:1:{i:0;a:1:{i:0;b:1;}}"#).unwrap(),
            json!([[true]])
        );
    }

    #[test]
    fn test_unserialize_object() {
        let data = "O:4:\"Perm\":3:{s:5:\"owner\";s:3:\"yes\";s:8:\"\0*\0agent\";s:2:\"no\";s:11:\"\0Perm\0admin\";s:3:\"yes\";}";
        assert_eq!(
            unserialize(data).unwrap(),
            json!({ "owner": "yes", "agent": "no", "admin": "yes" })
        );
    }

    #[test]
    fn test_unserialize_errors() {
        assert!(matches!(
            unserialize("i:1;i:2;"),
            Err(DecodeError::TrailingData(4))
        ));
        assert!(matches!(
            unserialize(r#"s:10:"short";"#),
            Err(DecodeError::UnexpectedEnd(_))
        ));
        assert!(matches!(
            unserialize("b:2;"),
            Err(DecodeError::InvalidNumber { .. })
        ));
        assert!(matches!(
            unserialize("r:1;"),
            Err(DecodeError::UnsupportedTag { tag: 'r', .. })
        ));
        assert!(unserialize("a:2:{i:0;i:1;}").is_err());
        assert!(matches!(
            unserialize("a:1:{N;i:1;}"),
            Err(DecodeError::Unexpected { .. })
        ));
    }

    #[test]
    fn test_unserialize_depth_limit() {
        let nested = |depth: usize| {
            format!("{}N;{}", "a:1:{i:0;".repeat(depth), "}".repeat(depth))
        };

        assert!(unserialize(&nested(MAX_DEPTH)).is_ok());

        let too_deep = nested(200_000);
        assert!(is_serialized(&too_deep));
        assert!(matches!(
            unserialize(&too_deep),
            Err(DecodeError::TooDeep(_))
        ));
    }

    #[test]
    fn test_serialize_matches_legacy_rows() {
        assert_eq!(
            serialize(&json!({ "owner": "yes", "agent": "yes", "admin": "yes" })),
            r#"a:3:{s:5:"admin";s:3:"yes";s:5:"agent";s:3:"yes";s:5:"owner";s:3:"yes";}"#
        );
        assert_eq!(serialize(&json!([10, 25, 50])), "a:3:{i:0;i:10;i:1;i:25;i:2;i:50;}");
        assert_eq!(serialize(&json!("héllo")), r#"s:6:"héllo";"#);
        assert_eq!(serialize(&json!(null)), "N;");
        assert_eq!(serialize(&json!(true)), "b:1;");
    }
}
