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

//! Defines the interface to the remote object store.
//!
//! A [SeekableRangeStream][crate::SeekableRangeStream] only needs one
//! capability from the store: fetch a range of bytes from an object, returning
//! the full size of the object and a reader positioned at the start of the
//! range. Applications implement [RangeSource] to adapt their store client,
//! and [RangeReader] to adapt the response body of a range request.

use crate::Result;
use crate::model::{ObjectHighlights, ObjectRef, ReadRange};

/// The result of fetching a range from an object.
#[derive(Debug)]
#[non_exhaustive]
pub struct RangeResponse<R> {
    /// Metadata about the full object, in particular its size.
    pub highlights: ObjectHighlights,

    /// Returns the data in the range, starting at the first byte in the range.
    pub reader: R,
}

impl<R> RangeResponse<R> {
    /// Creates a new response.
    pub fn new(highlights: ObjectHighlights, reader: R) -> Self {
        Self { highlights, reader }
    }
}

/// Fetches byte ranges from objects in a remote store.
///
/// Implementations wrap a store client. Authentication, retries, connection
/// pooling, and the wire protocol are the responsibility of the
/// implementation, streams never retry failed requests.
///
/// Implementations should report missing objects with [Error::not_found],
/// permission problems with [Error::permission_denied], and any other failures
/// with [Error::transport]. If `object.generation` is set, implementations
/// must return data for that generation, or [Error::not_found] if that
/// generation does not exist.
///
/// [Error::not_found]: crate::Error::not_found
/// [Error::permission_denied]: crate::Error::permission_denied
/// [Error::transport]: crate::Error::transport
pub trait RangeSource: std::fmt::Debug + Send + Sync {
    /// The type returned to read the data in a range.
    type Reader: RangeReader;

    /// Fetches `range` from `object`, blocking until the response starts.
    ///
    /// A `None` range requests the full object.
    fn fetch(
        &self,
        object: &ObjectRef,
        range: Option<ReadRange>,
    ) -> Result<RangeResponse<Self::Reader>>;

    /// Fetches `range` from `object` without blocking the calling thread.
    ///
    /// The default implementation calls [fetch][RangeSource::fetch] when the
    /// future is first polled. Implementations backed by an asynchronous
    /// client should override it.
    fn fetch_async(
        &self,
        object: &ObjectRef,
        range: Option<ReadRange>,
    ) -> impl Future<Output = Result<RangeResponse<Self::Reader>>> + Send {
        async move { self.fetch(object, range) }
    }

    /// Releases any resources held by the store client.
    ///
    /// Streams call this function only when they own the client.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Reads the data in a fetched range, sequentially.
///
/// Readers are owned by exactly one stream, and are closed before the stream
/// replaces them or is disposed.
pub trait RangeReader: Send {
    /// Reads the next bytes in the range into `buf`.
    ///
    /// Returns the number of bytes read. Short reads are allowed, `Ok(0)`
    /// indicates the end of the range.
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Reads the next bytes in the range without blocking the calling thread.
    ///
    /// Implementations must not consume any data until the returned future is
    /// polled, and must not consume data if the future is dropped before it
    /// completes. The default implementation calls [read][RangeReader::read]
    /// when the future is first polled.
    fn read_async(
        &mut self,
        buf: &mut [u8],
    ) -> impl Future<Output = std::io::Result<usize>> + Send {
        async move { self.read(buf) }
    }

    /// Flushes any buffered state. Most readers have nothing to flush.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Releases the connection used by this range.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
