//! Utility functions for CLI commands.

use std::fs::File;
use std::io::{BufReader, BufWriter};

use anyhow::Context as _;

/// Opens a file for buffered reading.
pub fn open_input(path: &str) -> anyhow::Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("failed to open {path}"))?;
    Ok(BufReader::new(file))
}

/// Creates a file for buffered writing.
pub fn create_output(path: &str) -> anyhow::Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("failed to create {path}"))?;
    Ok(BufWriter::new(file))
}

/// Prints a report to stdout as JSON or YAML.
pub fn output_result<T: serde::Serialize>(result: &T, as_json: bool) -> anyhow::Result<()> {
    let output = if as_json {
        serde_json::to_string_pretty(result)? + "\n"
    } else {
        serde_yaml::to_string(result)?
    };
    print!("{}", output);
    Ok(())
}

/// Fills `buf` from `reader`, stopping early only at end of input.
/// Returns the number of bytes read.
pub fn read_full<R: std::io::Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_full() {
        let mut r = Cursor::new(vec![1u8, 2, 3, 4, 5]);
        let mut buf = [0u8; 4];
        assert_eq!(read_full(&mut r, &mut buf).unwrap(), 4);
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(read_full(&mut r, &mut buf).unwrap(), 1);
        assert_eq!(read_full(&mut r, &mut buf).unwrap(), 0);
    }
}
