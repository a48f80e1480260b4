use std::io::{BufRead, ErrorKind};

/// A line reader which normalizes line endings before anything else looks at the input.
///
/// `\n`, `\r\n` and a lone `\r` all terminate a line, and empty lines are dropped, so the
/// consumer only ever sees non-empty lines without their terminator. The bytes of each line are
/// passed through untouched and do not need to be valid UTF-8.
pub struct NormalizedLines<R> {
    reader: R,
    eof: bool,
}

impl<R: BufRead> NormalizedLines<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, eof: false }
    }

    /// Reads the next non-empty line into `buf`, replacing its contents.
    ///
    /// Returns `Ok(false)` once the input is exhausted, in which case `buf` is left empty.
    pub fn next_line(&mut self, buf: &mut Vec<u8>) -> std::io::Result<bool> {
        loop {
            buf.clear();
            if self.eof {
                return Ok(false);
            }

            self.read_raw_line(buf)?;
            if !buf.is_empty() {
                return Ok(true);
            }
        }
    }

    // appends everything up to the next \r or \n (consuming the terminator) onto `buf`
    fn read_raw_line(&mut self, buf: &mut Vec<u8>) -> std::io::Result<()> {
        loop {
            let (done, used) = {
                let available = match self.reader.fill_buf() {
                    Ok(n) => n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                };

                if available.is_empty() {
                    self.eof = true;
                    return Ok(());
                }

                match memchr::memchr2(b'\n', b'\r', available) {
                    Some(i) => {
                        buf.extend_from_slice(&available[..i]);
                        (true, i + 1)
                    }
                    None => {
                        buf.extend_from_slice(available);
                        (false, available.len())
                    }
                }
            };

            self.reader.consume(used);

            if done {
                return Ok(());
            }
        }
    }
}

impl<R: BufRead> Iterator for NormalizedLines<R> {
    type Item = std::io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = Vec::new();
        match self.next_line(&mut buf) {
            Ok(true) => Some(Ok(buf)),
            Ok(false) => None,
            Err(e) => {
                // a failed read is terminal
                self.eof = true;
                Some(Err(e))
            }
        }
    }
}
