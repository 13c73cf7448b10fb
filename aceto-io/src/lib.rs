//! Terminal I/O adapter: implements `aceto_vm::Io` against the process's
//! real stdin/stdout, reading a single keypress without waiting for a
//! newline when stdin is a terminal, falling back to a byte-at-a-time read
//! when it's a pipe or file.

use aceto_vm::Io;
use std::io::{self, Read, Write};

/// Drives a running program against the real terminal.
pub struct StdIo {
    stdout: io::Stdout,
}

impl Default for StdIo {
    fn default() -> Self {
        StdIo { stdout: io::stdout() }
    }
}

impl StdIo {
    pub fn new() -> Self {
        Self::default()
    }

    fn flush(&mut self) {
        if let Err(e) = self.stdout.flush() {
            log::warn!("failed to flush stdout: {e}");
        }
    }
}

impl Io for StdIo {
    fn write_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        if let Err(e) = self.stdout.write_all(c.encode_utf8(&mut buf).as_bytes()) {
            log::warn!("failed to write to stdout: {e}");
        }
        self.flush();
    }

    fn write_str(&mut self, s: &str) {
        if let Err(e) = self.stdout.write_all(s.as_bytes()) {
            log::warn!("failed to write to stdout: {e}");
        }
        self.flush();
    }

    fn read_char(&mut self) -> Option<char> {
        use termion::event::Key;
        use termion::input::TermRead;
        use termion::raw::IntoRawMode;

        let stdin = io::stdin();
        if !termion::is_tty(&stdin) {
            return read_one_byte_char(&mut stdin.lock());
        }

        let raw = match io::stdout().into_raw_mode() {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("failed to enter raw terminal mode, falling back to buffered input: {e}");
                return read_one_byte_char(&mut stdin.lock());
            }
        };
        let mut keys = stdin.lock().keys();
        let result = loop {
            match keys.next() {
                Some(Ok(Key::Char(c))) => break Some(c),
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    log::warn!("failed to read a keypress: {e}");
                    break None;
                }
                None => break None,
            }
        };
        drop(raw);
        result
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => {
                if line.ends_with('\n') {
                    line.pop();
                    if line.ends_with('\r') {
                        line.pop();
                    }
                }
                Some(line)
            }
            Err(e) => {
                log::warn!("failed to read a line from stdin: {e}");
                None
            }
        }
    }
}

/// Decodes exactly one UTF-8 scalar value from `r`, byte by byte.
fn read_one_byte_char(r: &mut impl Read) -> Option<char> {
    let mut first = [0u8; 1];
    r.read_exact(&mut first).ok()?;
    let len = utf8_len(first[0]);
    let mut buf = vec![first[0]];
    for _ in 1..len {
        let mut cont = [0u8; 1];
        if r.read_exact(&mut cont).is_err() {
            break;
        }
        buf.push(cont[0]);
    }
    std::str::from_utf8(&buf).ok()?.chars().next()
}

fn utf8_len(first_byte: u8) -> usize {
    if first_byte & 0x80 == 0 {
        1
    } else if first_byte & 0xE0 == 0xC0 {
        2
    } else if first_byte & 0xF0 == 0xE0 {
        3
    } else if first_byte & 0xF8 == 0xF0 {
        4
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn utf8_len_matches_leading_byte() {
        assert_eq!(utf8_len(b'a'), 1);
        assert_eq!(utf8_len(0xC2), 2);
        assert_eq!(utf8_len(0xE2), 3);
        assert_eq!(utf8_len(0xF0), 4);
    }

    #[test]
    fn reads_one_ascii_char() {
        let mut cursor = Cursor::new(b"hello".to_vec());
        assert_eq!(read_one_byte_char(&mut cursor), Some('h'));
    }

    #[test]
    fn reads_one_multibyte_char() {
        let mut cursor = Cursor::new("€uro".as_bytes().to_vec());
        assert_eq!(read_one_byte_char(&mut cursor), Some('€'));
    }

    #[test]
    fn empty_reader_yields_none() {
        let mut cursor = Cursor::new(Vec::new());
        assert_eq!(read_one_byte_char(&mut cursor), None);
    }
}
