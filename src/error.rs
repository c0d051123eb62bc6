//! Types for error handling go here.
use std::io::Error as IOError;

quick_error! {
    /// Error type for all error variants originated by this crate.
    #[derive(Debug)]
    pub enum NiftiError {
        /// The remote end answered with a non-success status, or the
        /// transfer failed before any status was received.
        ///
        /// `status` is the HTTP status code, if a response arrived. `body`
        /// holds the response body, or the failure message otherwise.
        // fields of struct variants cannot carry docs inside `quick_error!`
        #[allow(missing_docs)]
        Network { status: Option<u16>, body: String } {
            display("network error (status {:?}): {}", status, body)
        }
        /// The byte source does not carry a NIfTI signature
        NotVolumeFile {
            display("Not a NIfTI file")
        }
        /// The header describes a volume with a non-positive dimension
        MalformedVolume(dim: [i64; 3]) {
            display("Malformed volume dimensions {:?}", dim)
        }
        /// The source only contains (or claims to contain) a header
        NoVolumeData {
            display("No volume data available")
        }
        /// The gzip stream around the volume is corrupt
        CorruptCompression(err: IOError) {
            source(err)
            display("Corrupt compressed payload: {}", err)
        }
        /// The datatype code is not one of the supported scalar types
        UnsupportedDataType(code: i16) {
            display("Unsupported data type {}", code)
        }
        /// The payload ends before every voxel could be read
        IncompletePayload(expected: usize, got: usize) {
            display("Incomplete payload: expected {} bytes, got {}", expected, got)
        }
        /// Attempted to read volume outside boundaries.
        OutOfBounds(coords: Vec<usize>) {
            display("Out of bounds access to volume: {:?}", &coords[..])
        }
        /// I/O Error
        Io(err: IOError) {
            from()
            source(err)
            display("I/O error: {}", err)
        }
    }
}

/// Coarse classification of a [`NiftiError`], matching the categories
/// surfaced to the user of the viewer.
///
/// [`NiftiError`]: ./enum.NiftiError.html
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Fetching the volume bytes failed
    Network,
    /// The bytes are not a NIfTI file
    NotVolumeFile,
    /// The volume geometry is invalid
    MalformedVolume,
    /// The payload could not be decoded
    Decode,
}

impl NiftiError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            NiftiError::Network { .. } => ErrorKind::Network,
            NiftiError::NotVolumeFile => ErrorKind::NotVolumeFile,
            NiftiError::MalformedVolume(_) | NiftiError::NoVolumeData => {
                ErrorKind::MalformedVolume
            }
            NiftiError::CorruptCompression(_)
            | NiftiError::UnsupportedDataType(_)
            | NiftiError::IncompletePayload(..)
            | NiftiError::OutOfBounds(_)
            | NiftiError::Io(_) => ErrorKind::Decode,
        }
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, NiftiError>;
