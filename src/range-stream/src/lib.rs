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

//! Seekable streams over objects in remote stores.
//!
//! Object stores serve byte ranges, they do not offer a cursor that can be
//! repositioned. Many libraries (parsers, archive readers, media decoders)
//! expect a [Read][std::io::Read] + [Seek][std::io::Seek] stream. This crate
//! bridges the two: [SeekableRangeStream] reads sequentially from one range
//! request, and issues a new range request each time the application seeks to
//! a different position.
//!
//! The store is abstracted by the [RangeSource][source::RangeSource] trait.
//! The [memory] module provides an in-memory implementation for tests.
//!
//! # Example
//! ```
//! use range_stream::SeekableRangeStream;
//! use range_stream::memory::MemorySource;
//! use std::io::{Read, SeekFrom};
//! use std::sync::Arc;
//! # fn sample() -> anyhow::Result<()> {
//! let source = Arc::new(MemorySource::new());
//! source.insert("my-bucket", "report.csv", "id,name\n1,alpha\n2,beta\n");
//!
//! let mut stream = SeekableRangeStream::builder(source.clone(), "my-bucket", "report.csv")
//!     .send()?;
//! let mut header = [0_u8; 7];
//! stream.read_exact(&mut header)?;
//! assert_eq!(&header, b"id,name");
//!
//! stream.seek(SeekFrom::End(-7))?;
//! let mut last = String::new();
//! stream.read_to_string(&mut last)?;
//! assert_eq!(last, "2,beta\n");
//! assert_eq!(stream.seek_count(), 1);
//! assert_eq!(source.fetch_count(), 2);
//! # Ok(()) }
//! ```

pub use error::{Error, Result};

pub mod error;
pub mod memory;
pub mod model;
pub mod source;

mod open_stream;
mod stream;

pub use stream::{ClientOwnership, SeekStats, SeekableRangeStream};

/// Request builders.
pub mod builder {
    pub use crate::open_stream::OpenStream;
}
