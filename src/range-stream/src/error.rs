// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Errors returned by range sources and seekable streams.
//!
//! All operations return [Error]. Applications can query the error kind with
//! the `is_*()` predicates, and examine the [source][std::error::Error::source]
//! for more details. Some sources are defined in this module, such as
//! [SeekError].

use std::error::Error as StdError;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for range sources and seekable streams.
///
/// Range sources report store-level problems (the object does not exist, the
/// caller lacks permissions, the transport failed) using the corresponding
/// constructors. The stream adds its own kinds: invalid seek targets,
/// unsupported operations, and operations on a faulted or disposed stream.
///
/// # Example
/// ```
/// use range_stream::Error;
/// match example_function() {
///     Err(e) if e.is_not_found() => println!("no such object {e}"),
///     Err(e) if e.is_faulted() => println!("the stream cannot be used {e}"),
///     Err(e) => println!("some other error {e}"),
///     Ok(_) => println!("success"),
/// }
///
/// fn example_function() -> Result<u64, Error> {
///     Err(Error::not_found("gs://my-bucket/my-object"))
/// }
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<BoxError>,
}

impl Error {
    /// Creates an error representing a missing object.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use range_stream::Error;
    /// let error = Error::not_found("my-bucket/my-object");
    /// assert!(error.is_not_found());
    /// assert!(error.source().is_some());
    /// ```
    pub fn not_found<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::NotFound, source)
    }

    /// The object (or the requested generation of the object) does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound)
    }

    /// Creates an error representing a permission problem.
    pub fn permission_denied<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::PermissionDenied, source)
    }

    /// The caller does not have access to the object.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.kind, ErrorKind::PermissionDenied)
    }

    /// Creates an error representing a transport problem.
    ///
    /// # Example
    /// ```
    /// use range_stream::Error;
    /// let error = Error::transport("connection reset");
    /// assert!(error.is_transport());
    /// ```
    pub fn transport<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::Transport, source)
    }

    /// The request could not reach the store, or the store connection failed.
    ///
    /// # Troubleshooting
    ///
    /// Retry policies belong to the [RangeSource][crate::source::RangeSource]
    /// implementation. If these errors are frequent, review the retry
    /// configuration of the store client.
    pub fn is_transport(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport)
    }

    /// Creates an error representing a problem reading the object data.
    pub fn io<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::Io, source)
    }

    /// A problem reading the data from an active range, or the data received
    /// is inconsistent with the data received earlier.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, ErrorKind::Io)
    }

    /// Creates an error representing an invalid argument.
    ///
    /// # Example
    /// ```
    /// use range_stream::{Error, error::SeekError};
    /// let error = Error::invalid_argument(SeekError::Negative(-1));
    /// assert!(error.is_invalid_argument());
    /// ```
    pub fn invalid_argument<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::InvalidArgument, source)
    }

    /// The arguments for the operation are invalid, such as a seek before the
    /// start or past the end of the object.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidArgument)
    }

    /// Creates an error for an operation the stream never supports.
    pub fn unsupported(operation: &'static str) -> Self {
        Self {
            kind: ErrorKind::Unsupported(operation),
            source: None,
        }
    }

    /// The operation is not supported, streams are read-only.
    pub fn is_unsupported(&self) -> bool {
        matches!(self.kind, ErrorKind::Unsupported(_))
    }

    /// Creates an error for operations on a stream that lost its active range.
    pub fn faulted() -> Self {
        Self {
            kind: ErrorKind::Faulted,
            source: None,
        }
    }

    /// A previous seek failed after releasing the active range.
    ///
    /// # Troubleshooting
    ///
    /// The stream cannot be used after a failed seek. Open a new stream, the
    /// error returned by the failed seek describes the root cause.
    pub fn is_faulted(&self) -> bool {
        matches!(self.kind, ErrorKind::Faulted)
    }

    /// Creates an error for operations on a disposed stream.
    pub fn disposed() -> Self {
        Self {
            kind: ErrorKind::Disposed,
            source: None,
        }
    }

    /// The stream was closed.
    pub fn is_disposed(&self) -> bool {
        matches!(self.kind, ErrorKind::Disposed)
    }

    /// Creates an error for a cancelled read.
    pub fn cancelled() -> Self {
        Self {
            kind: ErrorKind::Cancelled,
            source: None,
        }
    }

    /// The application cancelled the read before it completed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    fn new<T: Into<BoxError>>(kind: ErrorKind, source: T) -> Self {
        Self {
            kind,
            source: Some(source.into()),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.kind, &self.source) {
            (ErrorKind::NotFound, Some(e)) => write!(f, "the object was not found: {e}"),
            (ErrorKind::PermissionDenied, Some(e)) => {
                write!(f, "permission denied reading the object: {e}")
            }
            (ErrorKind::Transport, Some(e)) => {
                write!(f, "the transport reports an error fetching a range: {e}")
            }
            (ErrorKind::Io, Some(e)) => write!(f, "cannot read the object data: {e}"),
            (ErrorKind::InvalidArgument, Some(e)) => write!(f, "invalid argument: {e}"),
            (ErrorKind::Unsupported(op), _) => {
                write!(f, "`{op}` is not supported, the stream is read-only")
            }
            (ErrorKind::Faulted, _) => write!(
                f,
                "the stream has no active range after a failed seek, open a new stream"
            ),
            (ErrorKind::Disposed, _) => write!(f, "the stream is closed"),
            (ErrorKind::Cancelled, _) => write!(f, "the read was cancelled"),
            (_, None) => unreachable!("no constructor allows this"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<Error> for std::io::Error {
    fn from(value: Error) -> Self {
        use std::io::ErrorKind as K;
        let kind = match &value.kind {
            ErrorKind::NotFound => K::NotFound,
            ErrorKind::PermissionDenied => K::PermissionDenied,
            ErrorKind::InvalidArgument => K::InvalidInput,
            ErrorKind::Unsupported(_) => K::Unsupported,
            // `Interrupted` would make `read_exact()` and friends retry.
            ErrorKind::Cancelled => K::Other,
            ErrorKind::Transport | ErrorKind::Io | ErrorKind::Faulted | ErrorKind::Disposed => {
                K::Other
            }
        };
        std::io::Error::new(kind, value)
    }
}

#[derive(Debug)]
enum ErrorKind {
    NotFound,
    PermissionDenied,
    Transport,
    Io,
    InvalidArgument,
    Unsupported(&'static str),
    Faulted,
    Disposed,
    Cancelled,
}

/// Invalid seek targets and inconsistent range responses.
///
/// These errors are returned as the `source()` of an [Error].
///
/// # Example
/// ```
/// # use range_stream::{SeekableRangeStream, error::SeekError};
/// # use range_stream::memory::MemorySource;
/// # use std::sync::Arc;
/// # fn sample() -> anyhow::Result<()> {
/// use std::error::Error as _;
/// use std::io::SeekFrom;
/// let source = Arc::new(MemorySource::new());
/// source.insert("my-bucket", "my-object", "hello world");
/// let mut stream = SeekableRangeStream::builder(source, "my-bucket", "my-object").send()?;
/// match stream.seek(SeekFrom::Current(-100)) {
///     Err(e) if e.is_invalid_argument() => {
///         let details = e.source().and_then(|s| s.downcast_ref::<SeekError>());
///         println!("bad seek {details:?}");
///     }
///     r => println!("unexpected result {r:?}"),
/// }
/// # Ok(()) }
/// ```
#[derive(thiserror::Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum SeekError {
    /// The computed target is before the start of the object.
    #[error("cannot seek to negative position {0}")]
    Negative(i128),

    /// The computed target is past the end of the object.
    #[error("cannot seek to position {target}, the object has only {size} bytes")]
    PastEnd { target: i128, size: u64 },

    /// The store reported a different size when fetching a new range.
    ///
    /// # Troubleshooting
    ///
    /// The object was replaced between the initial fetch and a seek. Streams
    /// pin the object generation when the store reports one, use a store
    /// client that supports generations to avoid this problem.
    #[error("the object size changed from {want} to {got} bytes")]
    SizeChanged { want: u64, got: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Error::not_found("test-only"), "not found")]
    #[test_case(Error::permission_denied("test-only"), "permission denied")]
    #[test_case(Error::transport("test-only"), "transport")]
    #[test_case(Error::io("test-only"), "cannot read")]
    #[test_case(Error::invalid_argument("test-only"), "invalid argument")]
    fn display_with_source(error: Error, want: &str) {
        let fmt = error.to_string();
        assert!(fmt.contains(want), "{error:?} => {fmt}");
        assert!(fmt.contains("test-only"), "{error:?} => {fmt}");
        assert!(error.source().is_some(), "{error:?}");
    }

    #[test_case(Error::unsupported("write"), "`write` is not supported")]
    #[test_case(Error::faulted(), "failed seek")]
    #[test_case(Error::disposed(), "closed")]
    #[test_case(Error::cancelled(), "cancelled")]
    fn display_without_source(error: Error, want: &str) {
        let fmt = error.to_string();
        assert!(fmt.contains(want), "{error:?} => {fmt}");
        assert!(error.source().is_none(), "{error:?}");
    }

    #[test]
    fn predicates() {
        assert!(Error::not_found("a").is_not_found());
        assert!(Error::permission_denied("a").is_permission_denied());
        assert!(Error::transport("a").is_transport());
        assert!(Error::io("a").is_io());
        assert!(Error::invalid_argument("a").is_invalid_argument());
        assert!(Error::unsupported("a").is_unsupported());
        assert!(Error::faulted().is_faulted());
        assert!(Error::disposed().is_disposed());
        assert!(Error::cancelled().is_cancelled());

        let e = Error::faulted();
        assert!(!e.is_not_found(), "{e:?}");
        assert!(!e.is_transport(), "{e:?}");
        assert!(!e.is_disposed(), "{e:?}");
    }

    #[test_case(Error::not_found("a"), std::io::ErrorKind::NotFound)]
    #[test_case(Error::permission_denied("a"), std::io::ErrorKind::PermissionDenied)]
    #[test_case(Error::invalid_argument("a"), std::io::ErrorKind::InvalidInput)]
    #[test_case(Error::unsupported("a"), std::io::ErrorKind::Unsupported)]
    #[test_case(Error::transport("a"), std::io::ErrorKind::Other)]
    #[test_case(Error::faulted(), std::io::ErrorKind::Other)]
    #[test_case(Error::cancelled(), std::io::ErrorKind::Other)]
    fn to_io_error(error: Error, want: std::io::ErrorKind) {
        let got = std::io::Error::from(error);
        assert_eq!(got.kind(), want, "{got:?}");
        let inner = got.get_ref().and_then(|e| e.downcast_ref::<Error>());
        assert!(inner.is_some(), "{got:?}");
    }

    #[test]
    fn seek_error_as_source() {
        let error = Error::invalid_argument(SeekError::PastEnd {
            target: 2000,
            size: 1000,
        });
        let fmt = error.to_string();
        assert!(fmt.contains("2000"), "{fmt}");
        assert!(fmt.contains("1000"), "{fmt}");
        let details = error.source().and_then(|e| e.downcast_ref::<SeekError>());
        assert_eq!(
            details,
            Some(&SeekError::PastEnd {
                target: 2000,
                size: 1000
            })
        );
    }

    #[test]
    fn size_changed() {
        let value = SeekError::SizeChanged { want: 10, got: 20 };
        let fmt = value.to_string();
        assert!(fmt.contains("from 10 to 20"), "{value:?} => {fmt}");
    }
}
