use std::io::{self, Read};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    /// 1-based line number in the source.
    pub number: usize,
    pub text: String,
}

/// Reads the whole input as UTF-8 and splits it into line records.
///
/// Invalid UTF-8 surfaces as an `InvalidData` error from the reader.
pub fn read_lines<R: Read>(reader: &mut R) -> io::Result<Vec<LineRecord>> {
    let mut buffer = String::new();
    reader.read_to_string(&mut buffer)?;
    Ok(split_lines(&buffer))
}

/// Splits `text` on `\n`, `\r\n` and lone `\r`. Terminators are not part of
/// the line text.
pub fn split_lines(text: &str) -> Vec<LineRecord> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0usize;
    let mut idx = 0usize;

    while idx < bytes.len() {
        let terminator_len = match bytes[idx] {
            b'\n' => 1,
            b'\r' if bytes.get(idx + 1) == Some(&b'\n') => 2,
            b'\r' => 1,
            _ => {
                idx += 1;
                continue;
            }
        };

        lines.push(LineRecord {
            number: lines.len() + 1,
            text: text[start..idx].to_string(),
        });

        idx += terminator_len;
        start = idx;
    }

    if start < bytes.len() {
        lines.push(LineRecord {
            number: lines.len() + 1,
            text: text[start..].to_string(),
        });
    }

    lines
}
