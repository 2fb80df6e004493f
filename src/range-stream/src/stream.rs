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

use crate::builder::OpenStream;
use crate::error::SeekError;
use crate::model::{ObjectHighlights, ObjectRef, ReadRange};
use crate::source::{RangeReader, RangeResponse, RangeSource};
use crate::{Error, Result};
use std::io::SeekFrom;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Determines if a stream releases the store client when it is closed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClientOwnership {
    /// The stream owns the client, and calls
    /// [RangeSource::close][crate::source::RangeSource::close] when the stream
    /// is closed.
    #[default]
    Owned,
    /// The application retains the client, the stream leaves it open.
    Borrowed,
}

/// Counters describing the cost of seeking.
///
/// Every seek on a [SeekableRangeStream] that changes the position issues a
/// new range request. These counters help applications detect access
/// patterns that defeat streaming, such as random access over large objects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct SeekStats {
    /// The number of seek calls, including calls that did not change the
    /// position.
    pub count: u64,

    /// The time blocked waiting for range requests issued by seek calls.
    pub wait: Duration,
}

/// A read-only, seekable stream over an object in a remote store.
///
/// Object stores do not offer a cursor that can be repositioned. This stream
/// emulates one: it reads sequentially from the range fetched when the stream
/// is opened, and each seek that changes the position discards the active
/// range and fetches a new range from the target position to the end of the
/// object. Seeking is therefore as expensive as a new request, use
/// [stats()][SeekableRangeStream::stats] to measure that cost.
///
/// If the initial fetch reports the object generation, all the seeks fetch
/// that same generation.
///
/// # Example
/// ```
/// # use range_stream::SeekableRangeStream;
/// # use range_stream::memory::MemorySource;
/// # use std::sync::Arc;
/// # fn sample() -> anyhow::Result<()> {
/// use std::io::SeekFrom;
/// let source = Arc::new(MemorySource::new());
/// source.insert("my-bucket", "my-object", "the quick brown fox jumps over the lazy dog");
/// let mut stream = SeekableRangeStream::builder(source, "my-bucket", "my-object").send()?;
/// stream.seek(SeekFrom::End(-3))?;
/// let mut buf = [0_u8; 3];
/// let n = stream.read(&mut buf)?;
/// assert_eq!(&buf[..n], b"dog");
/// assert_eq!(stream.position(), stream.len());
/// # Ok(()) }
/// ```
pub struct SeekableRangeStream<S>
where
    S: RangeSource,
{
    source: Arc<S>,
    object: ObjectRef,
    pinned: ObjectRef,
    highlights: ObjectHighlights,
    ownership: ClientOwnership,
    state: State<S::Reader>,
    stats: SeekStats,
}

// The position always describes the next byte returned by the reader. There
// is no "unopened" state, streams only exist after a successful fetch.
enum State<R> {
    Open(Active<R>),
    Faulted { position: u64 },
    Disposed { position: u64 },
}

struct Active<R> {
    position: u64,
    reader: R,
}

impl<S> SeekableRangeStream<S>
where
    S: RangeSource,
{
    /// Returns a builder to open a stream over `object` in `bucket`.
    ///
    /// # Example
    /// ```
    /// # use range_stream::{ClientOwnership, SeekableRangeStream};
    /// # use range_stream::memory::MemorySource;
    /// # use std::sync::Arc;
    /// # fn sample(source: Arc<MemorySource>) -> anyhow::Result<()> {
    /// let stream = SeekableRangeStream::builder(source, "my-bucket", "my-object")
    ///     .with_ownership(ClientOwnership::Borrowed)
    ///     .send()?;
    /// println!("object size={}", stream.len());
    /// # Ok(()) }
    /// ```
    pub fn builder<B, O>(source: Arc<S>, bucket: B, object: O) -> OpenStream<S>
    where
        B: Into<String>,
        O: Into<String>,
    {
        OpenStream::new(source, ObjectRef::new(bucket, object))
    }

    /// Opens a stream, blocking until the full object range is fetched.
    ///
    /// On error, the client is released (if owned) before returning.
    pub fn open(source: Arc<S>, object: ObjectRef, ownership: ClientOwnership) -> Result<Self> {
        let response = source.fetch(&object, None);
        Self::from_response(source, object, ownership, response)
    }

    /// Opens a stream without blocking the calling thread.
    ///
    /// On error, the client is released (if owned) before returning.
    pub async fn open_async(
        source: Arc<S>,
        object: ObjectRef,
        ownership: ClientOwnership,
    ) -> Result<Self> {
        let response = source.fetch_async(&object, None).await;
        Self::from_response(source, object, ownership, response)
    }

    fn from_response(
        source: Arc<S>,
        object: ObjectRef,
        ownership: ClientOwnership,
        response: Result<RangeResponse<S::Reader>>,
    ) -> Result<Self> {
        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("cannot open {object}: {e:?}");
                release_source(source.as_ref(), ownership);
                return Err(e);
            }
        };
        let RangeResponse { highlights, reader } = response;
        let pinned = match (object.generation, highlights.generation) {
            (Some(_), _) | (None, None) => object.clone(),
            (None, Some(g)) => object.clone().set_generation(g),
        };
        tracing::debug!("opened {pinned} with {} bytes", highlights.size);
        Ok(Self {
            source,
            object,
            pinned,
            highlights,
            ownership,
            state: State::Open(Active {
                position: 0,
                reader,
            }),
            stats: SeekStats::default(),
        })
    }

    /// Reads the next bytes of the object into `buf`.
    ///
    /// Returns the number of bytes read, which may be less than `buf.len()`.
    /// Returns `Ok(0)` at the end of the object. The position advances by the
    /// number of bytes read.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let active = self.active_mut()?;
        let n = active.reader.read(buf).map_err(Error::io)?;
        active.position += n as u64;
        Ok(n)
    }

    /// Reads the next bytes of the object without blocking the calling thread.
    ///
    /// Same contract as [read()][SeekableRangeStream::read].
    pub async fn read_async(&mut self, buf: &mut [u8]) -> Result<usize> {
        let active = self.active_mut()?;
        let n = active.reader.read_async(buf).await.map_err(Error::io)?;
        active.position += n as u64;
        Ok(n)
    }

    /// Reads the next bytes of the object, stopping if `cancel` is cancelled.
    ///
    /// A cancelled read returns an error satisfying
    /// [is_cancelled()][Error::is_cancelled] and does not change the position.
    /// A token cancelled before the call never reaches the reader. Cancelling
    /// a read in progress requires a [RangeReader::read_async] that consumes
    /// no data when its future is dropped before completion.
    ///
    /// # Example
    /// ```
    /// # use range_stream::SeekableRangeStream;
    /// # use range_stream::memory::MemorySource;
    /// # async fn sample(mut stream: SeekableRangeStream<MemorySource>) -> anyhow::Result<()> {
    /// use tokio_util::sync::CancellationToken;
    /// let cancel = CancellationToken::new();
    /// let mut buf = vec![0_u8; 1024];
    /// match stream.read_async_with_cancel(&mut buf, &cancel).await {
    ///     Ok(n) => println!("read {n} bytes"),
    ///     Err(e) if e.is_cancelled() => println!("cancelled"),
    ///     Err(e) => return Err(e.into()),
    /// }
    /// # Ok(()) }
    /// ```
    pub async fn read_async_with_cancel(
        &mut self,
        buf: &mut [u8],
        cancel: &CancellationToken,
    ) -> Result<usize> {
        let active = self.active_mut()?;
        if cancel.is_cancelled() {
            return Err(Error::cancelled());
        }
        let n = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::cancelled()),
            r = active.reader.read_async(buf) => r.map_err(Error::io)?,
        };
        active.position += n as u64;
        Ok(n)
    }

    /// Changes the position of the stream.
    ///
    /// Returns the new position. Seeking to the current position is free,
    /// any other target releases the active range and blocks until a new range
    /// `[target, len())` is fetched. Targets before the start or past the end
    /// of the object are rejected without any other effect.
    ///
    /// Every call that passes validation increments the seek counter. If
    /// fetching the new range fails, the stream has no active range and all
    /// further reads, seeks, and flushes fail.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let position = self.checked_position()?;
        let target = self.target(position, pos)?;
        self.stats.count += 1;
        if target == position {
            tracing::debug!("seek to current position {target} in {}", self.pinned);
            return Ok(target);
        }

        if let State::Open(mut active) =
            std::mem::replace(&mut self.state, State::Faulted { position })
        {
            close_reader(&self.pinned, &mut active.reader);
        }
        let size = self.highlights.size;
        let range = ReadRange::between(target, size);
        let start = Instant::now();
        let response = self.source.fetch(&self.pinned, Some(range));
        let elapsed = start.elapsed();
        self.stats.wait += elapsed;

        let RangeResponse {
            highlights,
            mut reader,
        } = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(
                    "cannot fetch {range} from {} after {elapsed:?}: {e:?}",
                    self.pinned
                );
                return Err(e);
            }
        };
        tracing::debug!("fetched {range} from {} in {elapsed:?}", self.pinned);
        if highlights.size != size {
            close_reader(&self.pinned, &mut reader);
            return Err(Error::io(SeekError::SizeChanged {
                want: size,
                got: highlights.size,
            }));
        }
        self.state = State::Open(Active {
            position: target,
            reader,
        });
        Ok(target)
    }

    /// The position of the next byte returned by a read.
    ///
    /// For faulted or disposed streams, this is the last valid position.
    pub fn position(&self) -> u64 {
        match &self.state {
            State::Open(a) => a.position,
            State::Faulted { position } | State::Disposed { position } => *position,
        }
    }

    /// Changes the position of the stream, same as `seek(SeekFrom::Start(v))`.
    pub fn set_position(&mut self, v: u64) -> Result<u64> {
        self.seek(SeekFrom::Start(v))
    }

    /// The size of the object, as reported when the stream was opened.
    pub fn len(&self) -> u64 {
        self.highlights.size
    }

    /// Returns `true` if the object has no data.
    pub fn is_empty(&self) -> bool {
        self.highlights.size == 0
    }

    /// Flushes the active range reader.
    pub fn flush(&mut self) -> Result<()> {
        self.active_mut()?.reader.flush()
    }

    /// Always fails, streams are read-only.
    pub fn write(&mut self, _buf: &[u8]) -> Result<usize> {
        Err(Error::unsupported("write"))
    }

    /// Always fails, streams are read-only.
    pub fn set_len(&mut self, _len: u64) -> Result<()> {
        Err(Error::unsupported("set_len"))
    }

    /// Releases the active range and, if the stream owns it, the store client.
    ///
    /// Calling this function more than once has no effect. Errors releasing
    /// the resources are logged and otherwise ignored. Dropping the stream
    /// has the same effect.
    pub fn close(&mut self) {
        let position = self.position();
        match std::mem::replace(&mut self.state, State::Disposed { position }) {
            State::Disposed { .. } => return,
            State::Open(mut active) => close_reader(&self.pinned, &mut active.reader),
            State::Faulted { .. } => {}
        }
        release_source(self.source.as_ref(), self.ownership);
    }

    /// The number of seek calls and the time spent waiting for the ranges
    /// they fetched.
    pub fn stats(&self) -> SeekStats {
        self.stats
    }

    /// The number of seek calls, including calls that did not change the
    /// position.
    pub fn seek_count(&self) -> u64 {
        self.stats.count
    }

    /// The time blocked waiting for range requests issued by seek calls.
    pub fn seek_wait(&self) -> Duration {
        self.stats.wait
    }

    /// The object as requested by the application.
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// The object metadata reported when the stream was opened.
    pub fn highlights(&self) -> &ObjectHighlights {
        &self.highlights
    }

    /// Whether the stream closes the store client.
    pub fn ownership(&self) -> ClientOwnership {
        self.ownership
    }

    /// Returns `true` if a failed seek left the stream without an active range.
    pub fn is_faulted(&self) -> bool {
        matches!(self.state, State::Faulted { .. })
    }

    /// Returns `true` if the stream is closed.
    pub fn is_disposed(&self) -> bool {
        matches!(self.state, State::Disposed { .. })
    }

    fn active_mut(&mut self) -> Result<&mut Active<S::Reader>> {
        match &mut self.state {
            State::Open(a) => Ok(a),
            State::Faulted { .. } => Err(Error::faulted()),
            State::Disposed { .. } => Err(Error::disposed()),
        }
    }

    fn checked_position(&self) -> Result<u64> {
        match &self.state {
            State::Open(a) => Ok(a.position),
            State::Faulted { .. } => Err(Error::faulted()),
            State::Disposed { .. } => Err(Error::disposed()),
        }
    }

    fn target(&self, position: u64, pos: SeekFrom) -> Result<u64> {
        let size = self.highlights.size;
        let target = match pos {
            SeekFrom::Start(o) => o as i128,
            SeekFrom::Current(o) => position as i128 + o as i128,
            SeekFrom::End(o) => size as i128 + o as i128,
        };
        if target < 0 {
            return Err(Error::invalid_argument(SeekError::Negative(target)));
        }
        if target > size as i128 {
            return Err(Error::invalid_argument(SeekError::PastEnd { target, size }));
        }
        Ok(target as u64)
    }
}

fn close_reader<R: RangeReader>(object: &ObjectRef, reader: &mut R) {
    if let Err(e) = reader.close() {
        tracing::warn!("ignoring error closing range reader for {object}: {e:?}");
    }
}

fn release_source<S: RangeSource>(source: &S, ownership: ClientOwnership) {
    if ownership == ClientOwnership::Borrowed {
        return;
    }
    if let Err(e) = source.close() {
        tracing::warn!("ignoring error closing the range source {source:?}: {e:?}");
    }
}

impl<S> Drop for SeekableRangeStream<S>
where
    S: RangeSource,
{
    fn drop(&mut self) {
        self.close();
    }
}

impl<S> std::fmt::Debug for SeekableRangeStream<S>
where
    S: RangeSource,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            State::Open(_) => "Open",
            State::Faulted { .. } => "Faulted",
            State::Disposed { .. } => "Disposed",
        };
        f.debug_struct("SeekableRangeStream")
            .field("source", &self.source)
            .field("object", &self.object)
            .field("pinned", &self.pinned)
            .field("highlights", &self.highlights)
            .field("ownership", &self.ownership)
            .field("state", &state)
            .field("position", &self.position())
            .field("stats", &self.stats)
            // skip reader, as it is not `Debug`
            .finish()
    }
}

impl<S> std::io::Read for SeekableRangeStream<S>
where
    S: RangeSource,
{
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        SeekableRangeStream::read(self, buf).map_err(std::io::Error::from)
    }
}

impl<S> std::io::Seek for SeekableRangeStream<S>
where
    S: RangeSource,
{
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        SeekableRangeStream::seek(self, pos).map_err(std::io::Error::from)
    }

    // The default implementation is `seek(SeekFrom::Current(0))`, which would
    // count as a seek.
    fn stream_position(&mut self) -> std::io::Result<u64> {
        self.checked_position().map_err(std::io::Error::from)
    }
}
