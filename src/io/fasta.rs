//! 流式 FASTA 解析。支持多行序列、CRLF 与行内空白。

use std::io::BufRead;

use anyhow::Result;

use super::{split_header, SeqRecord};

pub struct FastaReader<R: BufRead> {
    reader: R,
    buf: String,
    done: bool,
    pending_header: Option<String>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, buf: String::new(), done: false, pending_header: None }
    }

    fn next_line(&mut self) -> Result<bool> {
        self.buf.clear();
        Ok(self.reader.read_line(&mut self.buf)? > 0)
    }

    pub fn next_record(&mut self) -> Result<Option<SeqRecord>> {
        if self.done {
            return Ok(None);
        }

        let header = match self.pending_header.take() {
            Some(h) => h,
            None => loop {
                if !self.next_line()? {
                    self.done = true;
                    return Ok(None);
                }
                if self.buf.starts_with('>') {
                    break self.buf[1..].trim().to_string();
                }
            },
        };
        let (id, desc) = split_header(&header);

        let mut seq = Vec::new();
        loop {
            if !self.next_line()? {
                self.done = true;
                break;
            }
            if self.buf.starts_with('>') {
                self.pending_header = Some(self.buf[1..].trim().to_string());
                break;
            }
            seq.extend(
                self.buf
                    .bytes()
                    .filter(|b| !b.is_ascii_whitespace())
                    .map(|b| b.to_ascii_uppercase()),
            );
        }

        Ok(Some(SeqRecord { id, desc, seq, qual: None }))
    }
}
