//! Length-prefixed packet files.
//!
//! Each record is a `u16` little-endian length followed by the packet
//! bytes. A zero-length record stands for a lost packet.

use std::io::{self, Read, Write};

/// One record of a packet file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Packet(Vec<u8>),
    Lost,
}

/// Writes packet records.
pub struct PacketWriter<W: Write> {
    inner: W,
}

impl<W: Write> PacketWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Writes one packet. Empty packets are rejected since they would read
    /// back as a loss marker.
    pub fn write_packet(&mut self, packet: &[u8]) -> io::Result<()> {
        if packet.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty packet"));
        }
        let len = u16::try_from(packet.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("packet too large: {} bytes", packet.len()),
            )
        })?;
        self.inner.write_all(&len.to_le_bytes())?;
        self.inner.write_all(packet)
    }

    /// Writes a loss marker.
    pub fn write_lost(&mut self) -> io::Result<()> {
        self.inner.write_all(&0u16.to_le_bytes())
    }

    pub fn into_inner(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Reads packet records until end of input.
pub struct PacketReader<R: Read> {
    inner: R,
}

impl<R: Read> PacketReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Returns the next record, or `None` at a clean end of input.
    pub fn next_record(&mut self) -> io::Result<Option<Record>> {
        let mut header = [0u8; 2];
        let mut filled = 0;
        while filled < header.len() {
            let n = self.inner.read(&mut header[filled..])?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated record header"));
            }
            filled += n;
        }

        let len = u16::from_le_bytes(header) as usize;
        if len == 0 {
            return Ok(Some(Record::Lost));
        }
        let mut packet = vec![0u8; len];
        self.inner.read_exact(&mut packet)?;
        Ok(Some(Record::Packet(packet)))
    }
}

impl<R: Read> Iterator for PacketReader<R> {
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_write_read() {
        let mut w = PacketWriter::new(Vec::new());
        w.write_packet(&[1, 2, 3]).unwrap();
        w.write_lost().unwrap();
        w.write_packet(&[4]).unwrap();
        let buf = w.into_inner().unwrap();
        assert_eq!(buf, vec![3, 0, 1, 2, 3, 0, 0, 1, 0, 4]);

        let records: Vec<Record> = PacketReader::new(Cursor::new(buf))
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(
            records,
            vec![Record::Packet(vec![1, 2, 3]), Record::Lost, Record::Packet(vec![4])]
        );
    }

    #[test]
    fn test_empty_input() {
        let mut r = PacketReader::new(Cursor::new(Vec::new()));
        assert!(r.next_record().unwrap().is_none());
    }

    #[test]
    fn test_truncated() {
        let mut r = PacketReader::new(Cursor::new(vec![5]));
        assert_eq!(r.next_record().unwrap_err().kind(), io::ErrorKind::UnexpectedEof);

        let mut r = PacketReader::new(Cursor::new(vec![5, 0, 1, 2]));
        assert_eq!(r.next_record().unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        let mut w = PacketWriter::new(Vec::new());
        assert!(w.write_packet(&[]).is_err());
        assert!(w.write_packet(&vec![0u8; 70000]).is_err());
    }
}
