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

use crate::Result;
use crate::model::ObjectRef;
use crate::source::RangeSource;
use crate::stream::{ClientOwnership, SeekableRangeStream};
use std::sync::Arc;

/// A request builder for [SeekableRangeStream::builder].
///
/// # Example
/// ```
/// # use range_stream::{SeekableRangeStream, builder::OpenStream};
/// # use range_stream::memory::MemorySource;
/// # use std::sync::Arc;
/// async fn sample(source: Arc<MemorySource>) -> anyhow::Result<()> {
///     let builder: OpenStream<MemorySource> =
///         SeekableRangeStream::builder(source, "my-bucket", "my-object");
///     let stream = builder
///         .set_generation(123)
///         .send_async()
///         .await?;
///     println!("object size={}", stream.len());
///     // Use `stream` to read data from `my-object`.
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct OpenStream<S> {
    source: Arc<S>,
    object: ObjectRef,
    ownership: ClientOwnership,
}

impl<S> OpenStream<S>
where
    S: RangeSource,
{
    /// Fetches the full object, blocking the calling thread until the response
    /// starts.
    ///
    /// # Example
    /// ```
    /// # use range_stream::SeekableRangeStream;
    /// # use range_stream::memory::MemorySource;
    /// # use std::sync::Arc;
    /// # fn sample(source: Arc<MemorySource>) -> anyhow::Result<()> {
    /// let stream = SeekableRangeStream::builder(source, "my-bucket", "my-object").send()?;
    /// println!("object highlights={:?}", stream.highlights());
    /// # Ok(()) }
    /// ```
    pub fn send(self) -> Result<SeekableRangeStream<S>> {
        SeekableRangeStream::open(self.source, self.object, self.ownership)
    }

    /// Fetches the full object without blocking the calling thread.
    pub async fn send_async(self) -> Result<SeekableRangeStream<S>> {
        SeekableRangeStream::open_async(self.source, self.object, self.ownership).await
    }
}

impl<S> OpenStream<S> {
    pub(crate) fn new(source: Arc<S>, object: ObjectRef) -> Self {
        Self {
            source,
            object,
            ownership: ClientOwnership::default(),
        }
    }

    /// If present, selects a specific revision of this object (as
    /// opposed to the latest version, the default).
    ///
    /// # Example
    /// ```
    /// # use range_stream::SeekableRangeStream;
    /// # use range_stream::memory::MemorySource;
    /// # use std::sync::Arc;
    /// # fn sample(source: Arc<MemorySource>) -> anyhow::Result<()> {
    /// let stream = SeekableRangeStream::builder(source, "my-bucket", "my-object")
    ///     .set_generation(123456)
    ///     .send()?;
    /// # Ok(()) }
    /// ```
    pub fn set_generation<T: Into<i64>>(mut self, v: T) -> Self {
        self.object = self.object.set_generation(v);
        self
    }

    /// Configures whether the stream closes the store client.
    ///
    /// By default the stream owns the client.
    pub fn with_ownership(mut self, v: ClientOwnership) -> Self {
        self.ownership = v;
        self
    }

    /// Leaves the store client open when the stream is closed.
    ///
    /// Shorthand for `with_ownership(ClientOwnership::Borrowed)` when `v` is
    /// `true`.
    ///
    /// # Example
    /// ```
    /// # use range_stream::SeekableRangeStream;
    /// # use range_stream::memory::MemorySource;
    /// # use std::sync::Arc;
    /// # fn sample(source: Arc<MemorySource>) -> anyhow::Result<()> {
    /// let stream = SeekableRangeStream::builder(source.clone(), "my-bucket", "my-object")
    ///     .leave_open(true)
    ///     .send()?;
    /// drop(stream);
    /// assert_eq!(source.close_count(), 0);
    /// # Ok(()) }
    /// ```
    pub fn leave_open(self, v: bool) -> Self {
        match v {
            true => self.with_ownership(ClientOwnership::Borrowed),
            false => self.with_ownership(ClientOwnership::Owned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySource;
    use test_case::test_case;

    type TestResult = anyhow::Result<()>;

    fn source() -> Arc<MemorySource> {
        let source = MemorySource::new();
        source.insert("bucket", "object", "the quick brown fox jumps over the lazy dog");
        Arc::new(source)
    }

    #[test]
    fn defaults() {
        let builder = SeekableRangeStream::builder(source(), "bucket", "object");
        assert_eq!(builder.object, ObjectRef::new("bucket", "object"));
        assert_eq!(builder.ownership, ClientOwnership::Owned);
    }

    #[test]
    fn setters() {
        let builder = SeekableRangeStream::builder(source(), "bucket", "object")
            .set_generation(42)
            .with_ownership(ClientOwnership::Borrowed);
        assert_eq!(
            builder.object,
            ObjectRef::new("bucket", "object").set_generation(42)
        );
        assert_eq!(builder.ownership, ClientOwnership::Borrowed);
    }

    #[test_case(true, ClientOwnership::Borrowed)]
    #[test_case(false, ClientOwnership::Owned)]
    fn leave_open(v: bool, want: ClientOwnership) {
        let builder = SeekableRangeStream::builder(source(), "bucket", "object").leave_open(v);
        assert_eq!(builder.ownership, want);
    }

    #[test]
    fn send() -> TestResult {
        let source = source();
        let stream = SeekableRangeStream::builder(source.clone(), "bucket", "object")
            .leave_open(true)
            .send()?;
        assert_eq!(stream.len(), 43);
        assert_eq!(stream.ownership(), ClientOwnership::Borrowed);
        drop(stream);
        assert_eq!(source.close_count(), 0);
        assert_eq!(source.fetch_count(), 1);
        Ok(())
    }

    #[test]
    fn send_with_generation() -> TestResult {
        let source = source();
        let stream = SeekableRangeStream::builder(source.clone(), "bucket", "object")
            .set_generation(1)
            .send()?;
        assert_eq!(stream.object().generation, Some(1));

        let err = SeekableRangeStream::builder(source.clone(), "bucket", "object")
            .set_generation(2)
            .send()
            .unwrap_err();
        assert!(err.is_not_found(), "{err:?}");
        assert_eq!(source.close_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn send_async() -> TestResult {
        let source = source();
        let mut stream = SeekableRangeStream::builder(source.clone(), "bucket", "object")
            .send_async()
            .await?;
        let mut buf = [0_u8; 9];
        let n = stream.read_async(&mut buf).await?;
        assert_eq!(&buf[..n], b"the quick");
        stream.close();
        assert_eq!(source.close_count(), 1);
        Ok(())
    }
}
