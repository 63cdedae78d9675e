//! 流式 FASTQ 解析。四行一组，不支持折行序列；
//! 质量串原样保留为 Phred+33 字节。

use std::io::BufRead;

use anyhow::{anyhow, Result};

use super::{split_header, SeqRecord};

pub struct FastqReader<R: BufRead> {
    reader: R,
    buf: String,
    done: bool,
    line_no: usize,
}

impl<R: BufRead> FastqReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, buf: String::new(), done: false, line_no: 0 }
    }

    fn next_line(&mut self) -> Result<bool> {
        self.buf.clear();
        let n = self.reader.read_line(&mut self.buf)?;
        if n > 0 {
            self.line_no += 1;
        }
        Ok(n > 0)
    }

    pub fn next_record(&mut self) -> Result<Option<SeqRecord>> {
        if self.done {
            return Ok(None);
        }

        // 跳过记录间空行
        loop {
            if !self.next_line()? {
                self.done = true;
                return Ok(None);
            }
            if !self.buf.trim().is_empty() {
                break;
            }
        }
        if !self.buf.starts_with('@') {
            return Err(anyhow!("line {}: FASTQ header must start with '@'", self.line_no));
        }
        let (id, desc) = split_header(self.buf[1..].trim_end());

        if !self.next_line()? {
            return Err(anyhow!("line {}: unexpected EOF after header", self.line_no));
        }
        let seq: Vec<u8> = self.buf.trim_end().bytes().map(|b| b.to_ascii_uppercase()).collect();

        if !self.next_line()? || !self.buf.starts_with('+') {
            return Err(anyhow!("line {}: missing '+' separator", self.line_no));
        }

        if !self.next_line()? {
            return Err(anyhow!("line {}: missing quality line", self.line_no));
        }
        let qual = self.buf.trim_end().as_bytes().to_vec();
        if qual.len() != seq.len() {
            return Err(anyhow!(
                "line {}: sequence and quality differ in length ({} vs {})",
                self.line_no,
                seq.len(),
                qual.len()
            ));
        }

        Ok(Some(SeqRecord { id, desc, seq, qual: Some(qual) }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_two_records() {
        let data = b"@r0 lane1\nacgt\n+\nIIII\n@r1\nTTGG\n+r1\n!!55\n";
        let mut r = FastqReader::new(Cursor::new(&data[..]));

        let r0 = r.next_record().unwrap().unwrap();
        assert_eq!(r0.id, "r0");
        assert_eq!(r0.desc.as_deref(), Some("lane1"));
        assert_eq!(r0.seq, b"ACGT");
        assert_eq!(r0.qual.as_deref(), Some(b"IIII".as_ref()));

        let r1 = r.next_record().unwrap().unwrap();
        assert_eq!(r1.id, "r1");
        assert_eq!(r1.qual.as_deref(), Some(b"!!55".as_ref()));

        assert!(r.next_record().unwrap().is_none());
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let data = b"@r0\nACGT\n+\nII\n";
        let mut r = FastqReader::new(Cursor::new(&data[..]));
        assert!(r.next_record().is_err());
    }

    #[test]
    fn bad_header_is_an_error() {
        let data = b"ACGT\n+\nIIII\n";
        let mut r = FastqReader::new(Cursor::new(&data[..]));
        assert!(r.next_record().is_err());
    }
}
