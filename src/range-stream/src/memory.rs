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

//! An in-memory [RangeSource], useful to test code using seekable streams.

use crate::model::{ObjectHighlights, ObjectRef, ReadRange};
use crate::source::{RangeReader, RangeResponse, RangeSource};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Implements [RangeSource] over objects stored in memory.
///
/// Each object is assigned a new generation when it is inserted. The source
/// counts fetches and client closes, and records every request, so tests can
/// verify how many range requests a stream issued.
///
/// # Example
/// ```
/// # use range_stream::memory::MemorySource;
/// # use range_stream::model::{ObjectRef, ReadRange};
/// # use range_stream::source::{RangeReader, RangeSource};
/// # fn sample() -> anyhow::Result<()> {
/// let source = MemorySource::new();
/// source.insert("my-bucket", "my-object", "the quick brown fox");
/// let object = ObjectRef::new("my-bucket", "my-object");
/// let mut response = source.fetch(&object, Some(ReadRange::between(4, 9)))?;
/// assert_eq!(response.highlights.size, 19);
/// let mut buf = [0_u8; 5];
/// assert_eq!(response.reader.read(&mut buf)?, 5);
/// assert_eq!(&buf, b"quick");
/// assert_eq!(source.fetch_count(), 1);
/// # Ok(()) }
/// ```
#[derive(Debug, Default)]
pub struct MemorySource {
    state: Mutex<State>,
    chunk_size: Option<usize>,
    closes: AtomicU64,
}

#[derive(Debug, Default)]
struct State {
    objects: HashMap<(String, String), Stored>,
    last_generation: i64,
    requests: Vec<(ObjectRef, Option<ReadRange>)>,
}

#[derive(Debug)]
struct Stored {
    contents: bytes::Bytes,
    generation: i64,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the number of bytes returned by each read.
    ///
    /// Use this to simulate short reads from the network.
    pub fn with_chunk_size(mut self, v: usize) -> Self {
        self.chunk_size = Some(v.max(1));
        self
    }

    /// Creates or replaces an object, returning its new generation.
    pub fn insert<B, O, C>(&self, bucket: B, object: O, contents: C) -> i64
    where
        B: Into<String>,
        O: Into<String>,
        C: Into<bytes::Bytes>,
    {
        let mut state = self.state.lock().expect("never poisoned");
        state.last_generation += 1;
        let generation = state.last_generation;
        state.objects.insert(
            (bucket.into(), object.into()),
            Stored {
                contents: contents.into(),
                generation,
            },
        );
        generation
    }

    /// Removes an object, returning `true` if it existed.
    pub fn remove(&self, bucket: &str, object: &str) -> bool {
        let mut state = self.state.lock().expect("never poisoned");
        state
            .objects
            .remove(&(bucket.to_string(), object.to_string()))
            .is_some()
    }

    /// The number of fetch requests received, successful or not.
    pub fn fetch_count(&self) -> usize {
        self.state.lock().expect("never poisoned").requests.len()
    }

    /// The requests received, in order.
    pub fn requests(&self) -> Vec<(ObjectRef, Option<ReadRange>)> {
        self.state.lock().expect("never poisoned").requests.clone()
    }

    /// The number of times [close][RangeSource::close] was called.
    pub fn close_count(&self) -> u64 {
        self.closes.load(Ordering::SeqCst)
    }
}

impl RangeSource for MemorySource {
    type Reader = BytesReader;

    fn fetch(
        &self,
        object: &ObjectRef,
        range: Option<ReadRange>,
    ) -> Result<RangeResponse<Self::Reader>> {
        let mut state = self.state.lock().expect("never poisoned");
        state.requests.push((object.clone(), range));
        let key = (object.bucket.clone(), object.object.clone());
        let stored = state
            .objects
            .get(&key)
            .filter(|s| object.generation.is_none_or(|g| g == s.generation))
            .ok_or_else(|| Error::not_found(object.to_string()))?;
        let size = stored.contents.len() as u64;
        let bounds = ReadRange::bounds(range, size).ok_or_else(|| {
            Error::invalid_argument(format!(
                "range {range:?} not satisfiable for {object} with {size} bytes"
            ))
        })?;
        let contents = stored
            .contents
            .slice(bounds.start as usize..bounds.end as usize);
        let highlights = ObjectHighlights::new(size).set_generation(stored.generation);
        let reader = match self.chunk_size {
            None => BytesReader::new(contents),
            Some(n) => BytesReader::new(contents).with_chunk_size(n),
        };
        Ok(RangeResponse::new(highlights, reader))
    }

    fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Implements [RangeReader] for [bytes::Bytes].
///
/// # Example
/// ```
/// # use range_stream::memory::BytesReader;
/// # use range_stream::source::RangeReader;
/// # fn sample() -> std::io::Result<()> {
/// let mut reader = BytesReader::new("hello world").with_chunk_size(4);
/// let mut buf = [0_u8; 16];
/// assert_eq!(reader.read(&mut buf)?, 4);
/// assert_eq!(&buf[..4], b"hell");
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct BytesReader {
    contents: bytes::Bytes,
    chunk_size: usize,
}

impl BytesReader {
    /// Creates a reader returning `contents`.
    pub fn new<C: Into<bytes::Bytes>>(contents: C) -> Self {
        Self {
            contents: contents.into(),
            chunk_size: usize::MAX,
        }
    }

    /// Limits the number of bytes returned by each read.
    pub fn with_chunk_size(mut self, v: usize) -> Self {
        self.chunk_size = v.max(1);
        self
    }
}

impl RangeReader for BytesReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = buf.len().min(self.chunk_size).min(self.contents.len());
        let chunk = self.contents.split_to(n);
        buf[..n].copy_from_slice(&chunk);
        Ok(n)
    }
}
