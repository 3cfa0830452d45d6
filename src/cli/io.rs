//! Line-oriented JSON I/O
//!
//! - Input: one JSON request per line
//! - Output: one JSON response per line
//! - UTF-8 only

use std::io::{BufRead, Write};

use super::errors::CliResult;

/// Non-blank request lines from `input`
pub fn read_requests<R: BufRead>(input: R) -> impl Iterator<Item = CliResult<String>> {
    input
        .lines()
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
        .map(|line| line.map_err(Into::into))
}

/// Write one response line and flush it
pub fn write_json<W: Write>(out: &mut W, json: &str) -> CliResult<()> {
    writeln!(out, "{}", json)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_blank_lines_skipped() {
        let input = Cursor::new("{\"op\":\"flush\"}\n\n   \n{\"op\":\"search\"}\n");
        let lines: Vec<String> = read_requests(input).map(Result::unwrap).collect();
        assert_eq!(lines, vec!["{\"op\":\"flush\"}", "{\"op\":\"search\"}"]);
    }

    #[test]
    fn test_write_json_appends_newline() {
        let mut out = Vec::new();
        write_json(&mut out, "{}").unwrap();
        assert_eq!(out, b"{}\n");
    }
}
