use thiserror::Error;
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("{file}:{line}: malformed capture line: {reason}")]
    MalformedLine {
        file: String,
        line: usize,
        reason: String,
    },
    #[error("{file}:{line}: bin {bin} expects {expected} Hz, line carries {found} Hz")]
    FrequencyMismatch {
        file: String,
        line: usize,
        bin: usize,
        expected: f64,
        found: f64,
    },
    #[error("{file}: incomplete capture, expected {expected} samples, found {found}")]
    IncompleteCapture {
        file: String,
        expected: usize,
        found: usize,
    },
    #[error("failed to read {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render plot: {0}")]
    Plot(String),
}
impl SweepError {
    pub fn io(file: impl Into<String>, source: std::io::Error) -> Self {
        SweepError::Io {
            file: file.into(),
            source,
        }
    }
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for SweepError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        SweepError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for SweepError {
    fn from(value: image::ImageError) -> Self {
        SweepError::Plot(value.to_string())
    }
}
