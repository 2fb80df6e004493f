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

//! Types describing objects and the ranges requested from them.

/// Identifies an object in a remote store.
///
/// Objects are identified by the container (the bucket) and the object name.
/// Stores that keep multiple versions of an object may also use a generation
/// number to select a specific version.
///
/// # Example
/// ```
/// # use range_stream::model::ObjectRef;
/// let object = ObjectRef::new("my-bucket", "reports/2025/report.csv").set_generation(123456);
/// assert_eq!(object.bucket, "my-bucket");
/// assert_eq!(object.generation, Some(123456));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct ObjectRef {
    /// The name of the bucket containing the object.
    pub bucket: String,

    /// The name of the object.
    pub object: String,

    /// If present, selects a specific revision of the object. The latest
    /// revision is used otherwise.
    pub generation: Option<i64>,
}

impl ObjectRef {
    /// Creates a reference to the latest revision of `object` in `bucket`.
    pub fn new<B, O>(bucket: B, object: O) -> Self
    where
        B: Into<String>,
        O: Into<String>,
    {
        Self {
            bucket: bucket.into(),
            object: object.into(),
            generation: None,
        }
    }

    /// Selects a specific revision of the object.
    pub fn set_generation<T: Into<i64>>(mut self, v: T) -> Self {
        self.generation = Some(v.into());
        self
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.generation {
            None => write!(f, "{}/{}", self.bucket, self.object),
            Some(g) => write!(f, "{}/{}#{g}", self.bucket, self.object),
        }
    }
}

/// Select metadata about an object, returned with each fetched range.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct ObjectHighlights {
    /// The size of the *full* object in bytes, regardless of the range
    /// requested.
    pub size: u64,

    /// The content generation of the object, if the store supports versioning.
    pub generation: Option<i64>,
}

impl ObjectHighlights {
    /// Creates the highlights for an object of `size` bytes.
    pub fn new(size: u64) -> Self {
        Self {
            size,
            generation: None,
        }
    }

    /// Sets the generation reported by the store.
    pub fn set_generation<T: Into<i64>>(mut self, v: T) -> Self {
        self.generation = Some(v.into());
        self
    }
}

/// A half-open byte range `[start, end)` requested from a
/// [RangeSource][crate::source::RangeSource].
///
/// Sources receive `Option<ReadRange>`, where `None` requests the full object.
///
/// # Example
/// ```
/// # use range_stream::model::ReadRange;
/// let range = ReadRange::between(100, 150);
/// assert_eq!(ReadRange::bounds(Some(range), 1000), Some(100..150));
/// assert_eq!(ReadRange::bounds(Some(range), 120), Some(100..120));
/// assert_eq!(ReadRange::bounds(Some(range), 10), None);
/// assert_eq!(ReadRange::bounds(None, 10), Some(0..10));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadRange {
    start: u64,
    end: u64,
}

impl ReadRange {
    /// Returns the half-open range `[start, end)`.
    ///
    /// An `end` before `start` represents an empty range at `start`.
    pub fn between(start: u64, end: u64) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// The first byte in the range.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// The byte after the last byte in the range.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Resolves a requested range against an object of `size` bytes.
    ///
    /// `None` resolves to the full object. Returns the absolute byte offsets,
    /// clamped to the object size, or `None` if the range starts past the end
    /// of the object. An empty range at the end of the object is valid.
    pub fn bounds(range: Option<Self>, size: u64) -> Option<std::ops::Range<u64>> {
        let Some(range) = range else {
            return Some(0..size);
        };
        (range.start <= size).then(|| range.start..range.end.min(size))
    }
}

impl std::fmt::Display for ReadRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn object_ref() {
        let object = ObjectRef::new("bucket", "object");
        assert_eq!(object.bucket, "bucket");
        assert_eq!(object.object, "object");
        assert_eq!(object.generation, None);
        assert_eq!(object.to_string(), "bucket/object");

        let object = object.set_generation(123);
        assert_eq!(object.generation, Some(123));
        assert_eq!(object.to_string(), "bucket/object#123");
    }

    #[test]
    fn highlights() {
        let got = ObjectHighlights::new(42).set_generation(7);
        assert_eq!(got.size, 42);
        assert_eq!(got.generation, Some(7));
        assert_eq!(ObjectHighlights::default().generation, None);
    }

    #[test_case(None, 1000, Some(0..1000))]
    #[test_case(None, 0, Some(0..0))]
    #[test_case(Some(ReadRange::between(500, 1000)), 1000, Some(500..1000))]
    #[test_case(Some(ReadRange::between(500, 2000)), 1000, Some(500..1000))]
    #[test_case(Some(ReadRange::between(1000, 1000)), 1000, Some(1000..1000))]
    #[test_case(Some(ReadRange::between(1001, 2000)), 1000, None)]
    #[test_case(Some(ReadRange::between(0, 0)), 0, Some(0..0))]
    fn bounds(range: Option<ReadRange>, size: u64, want: Option<std::ops::Range<u64>>) {
        assert_eq!(ReadRange::bounds(range, size), want, "{range:?}");
    }

    #[test]
    fn between() {
        let range = ReadRange::between(10, 20);
        assert_eq!((range.start(), range.end()), (10, 20));
        assert_eq!(range.to_string(), "[10, 20)");

        let range = ReadRange::between(600, 500);
        assert_eq!((range.start(), range.end()), (600, 600));
        assert_eq!(ReadRange::bounds(Some(range), 1000), Some(600..600));
    }
}
