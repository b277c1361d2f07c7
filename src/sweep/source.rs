use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use crate::sweep::SweepError;
/// Something that can be opened, possibly more than once, as a capture text stream.
///
/// Each call to `open` must start from the beginning; the aggregator relies on two opens
/// producing the same lines.
pub trait CaptureSource {
    /// Name used in logs and error reports.
    fn name(&self) -> &str;
    fn open(&self) -> Result<Box<dyn BufRead + Send + '_>, SweepError>;
}
/// Capture stored on disk.
#[derive(Clone, Debug)]
pub struct FileCapture {
    path: PathBuf,
    name: String,
}
impl FileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
}
impl CaptureSource for FileCapture {
    fn name(&self) -> &str {
        &self.name
    }
    fn open(&self) -> Result<Box<dyn BufRead + Send + '_>, SweepError> {
        let file = File::open(&self.path).map_err(|e| SweepError::io(&self.name, e))?;
        Ok(Box::new(BufReader::new(file)))
    }
}
/// In-memory capture useful for tests and replaying already loaded text.
#[derive(Clone, Debug)]
pub struct MemoryCapture {
    name: String,
    text: String,
}
impl MemoryCapture {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}
impl CaptureSource for MemoryCapture {
    fn name(&self) -> &str {
        &self.name
    }
    fn open(&self) -> Result<Box<dyn BufRead + Send + '_>, SweepError> {
        Ok(Box::new(Cursor::new(self.text.as_bytes())))
    }
}
impl<T: CaptureSource + ?Sized> CaptureSource for &T {
    fn name(&self) -> &str {
        (**self).name()
    }
    fn open(&self) -> Result<Box<dyn BufRead + Send + '_>, SweepError> {
        (**self).open()
    }
}
