use std::io::{self, BufRead, ErrorKind};
use std::str;

fn utf8_width(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7f => Some(1),
        0xc2..=0xdf => Some(2),
        0xe0..=0xef => Some(3),
        0xf0..=0xf4 => Some(4),
        _ => None,
    }
}

fn invalid_utf8() -> io::Error {
    io::Error::new(ErrorKind::InvalidData, "invalid UTF-8 sequence")
}

fn peek_byte<R: BufRead + ?Sized>(reader: &mut R) -> io::Result<Option<u8>> {
    loop {
        match reader.fill_buf() {
            Ok(buf) => return Ok(buf.first().copied()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

pub trait BufReadExt: BufRead {
    /// Reads one UTF-8 encoded character, `None` at end of input.
    ///
    /// A malformed sequence is an `InvalidData` error. Only the bytes that
    /// belong to it are consumed, so reading can go on with the next one.
    fn read_char(&mut self) -> io::Result<Option<char>> {
        let lead = match peek_byte(self)? {
            Some(b) => b,
            None => return Ok(None),
        };
        self.consume(1);
        let width = utf8_width(lead).ok_or_else(invalid_utf8)?;
        let mut buf = [lead, 0, 0, 0];
        for slot in buf.iter_mut().take(width).skip(1) {
            match peek_byte(self)? {
                Some(b @ 0x80..=0xbf) => {
                    *slot = b;
                    self.consume(1);
                }
                _ => return Err(invalid_utf8()),
            }
        }
        let s = str::from_utf8(&buf[..width]).map_err(|_| invalid_utf8())?;
        Ok(s.chars().next())
    }

    /// Reads one line without its terminator, `None` at end of input.
    fn read_text_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

impl<R: BufRead> BufReadExt for R {}
