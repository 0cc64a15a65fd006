use std::fs::File;
use std::io::{self, BufReader, Read, Write};

use flate2::read::MultiGzDecoder;
use tempfile::NamedTempFile;

/// Read buffer used when streaming a staged file into the extractor.
const READ_BUFFER: usize = 64 * 1024;

/// How a staged file must be decoded before scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
}

impl Compression {
    /// Chooses the decoding from the filename suffix.
    pub fn from_filename(filename: &str) -> Self {
        if filename.to_ascii_lowercase().ends_with(".gz") {
            Compression::Gzip
        } else {
            Compression::None
        }
    }
}

/// A downloaded file held in scratch storage.
///
/// The backing temp file is deleted when this value is dropped, on every
/// exit path.
#[derive(Debug)]
pub struct StagedFile {
    filename: String,
    compression: Compression,
    file: NamedTempFile,
    size: u64,
}

impl StagedFile {
    /// Creates an empty staged file for `filename` in the system temp dir.
    pub fn create(filename: &str) -> io::Result<Self> {
        let file = tempfile::Builder::new().prefix("import_").tempfile()?;
        Ok(Self {
            filename: filename.to_string(),
            compression: Compression::from_filename(filename),
            file,
            size: 0,
        })
    }

    /// Stages the full contents of `reader`.
    pub fn from_reader(filename: &str, reader: &mut impl Read) -> io::Result<Self> {
        let mut staged = Self::create(filename)?;
        staged.size = io::copy(reader, staged.file.as_file_mut())?;
        staged.file.as_file_mut().flush()?;
        Ok(staged)
    }

    /// Appends a chunk of raw (still compressed) bytes.
    pub fn append(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.file.as_file_mut().write_all(chunk)?;
        self.size += chunk.len() as u64;
        Ok(())
    }

    pub fn finish(&mut self) -> io::Result<()> {
        self.file.as_file_mut().flush()
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Size of the staged bytes as downloaded.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Opens a fresh reader over the staged bytes, decompressing
    /// transparently when the filename calls for it.
    pub fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        let file: File = self.file.reopen()?;
        let reader = BufReader::with_capacity(READ_BUFFER, file);
        Ok(match self.compression {
            Compression::Gzip => Box::new(MultiGzDecoder::new(reader)),
            Compression::None => Box::new(reader),
        })
    }
}
