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

#[cfg(test)]
mod tests {
    use range_stream::model::{ObjectHighlights, ObjectRef, ReadRange};
    use range_stream::source::{RangeReader, RangeResponse, RangeSource};
    use range_stream::{ClientOwnership, Error, Result, SeekableRangeStream};
    use std::io::SeekFrom;
    use std::sync::Arc;

    mockall::mock! {
        #[derive(Debug)]
        Source {}
        impl RangeSource for Source {
            type Reader = MockReader;
            fn fetch(&self, object: &ObjectRef, range: Option<ReadRange>) -> Result<RangeResponse<MockReader>>;
            fn close(&self) -> Result<()>;
        }
    }

    mockall::mock! {
        Reader {}
        impl RangeReader for Reader {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
            fn close(&mut self) -> Result<()>;
        }
    }

    fn reader(data: &'static [u8]) -> MockReader {
        let mut remaining = data;
        let mut reader = MockReader::new();
        reader.expect_read().returning(move |buf: &mut [u8]| {
            let n = std::cmp::min(buf.len(), remaining.len());
            buf[..n].copy_from_slice(&remaining[..n]);
            remaining = &remaining[n..];
            Ok(n)
        });
        reader.expect_close().times(1).returning(|| Ok(()));
        reader
    }

    #[test]
    fn application_source() -> anyhow::Result<()> {
        const DATA: &[u8] = b"0123456789abcdefghij";
        let mut source = MockSource::new();
        let mut seq = mockall::Sequence::new();
        source
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|object, range| object.generation.is_none() && range.is_none())
            .return_once(|_, _| {
                Ok(RangeResponse::new(
                    ObjectHighlights::new(20).set_generation(7),
                    reader(DATA),
                ))
            });
        source
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|object, range| {
                object.generation == Some(7) && *range == Some(ReadRange::between(15, 20))
            })
            .return_once(|_, _| {
                Ok(RangeResponse::new(
                    ObjectHighlights::new(20).set_generation(7),
                    reader(&DATA[15..]),
                ))
            });
        source.expect_close().times(1).returning(|| Ok(()));

        let mut stream = SeekableRangeStream::builder(Arc::new(source), "bucket", "object")
            .with_ownership(ClientOwnership::Owned)
            .send()?;
        let mut buf = [0_u8; 4];
        assert_eq!(stream.read(&mut buf)?, 4);
        assert_eq!(&buf, b"0123");
        assert_eq!(stream.seek(SeekFrom::End(-5))?, 15);
        let n = stream.read(&mut buf)?;
        assert_eq!(&buf[..n], b"fghi");
        assert_eq!(stream.position(), 19);
        Ok(())
    }

    #[test]
    fn transport_error_on_seek() -> anyhow::Result<()> {
        let mut source = MockSource::new();
        let mut seq = mockall::Sequence::new();
        source
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|_, _| Ok(RangeResponse::new(ObjectHighlights::new(20), reader(b""))));
        source
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(Error::transport("connection reset")));
        source.expect_close().times(1).returning(|| Ok(()));

        let mut stream = SeekableRangeStream::builder(Arc::new(source), "bucket", "object")
            .send()?;
        let err = stream.seek(SeekFrom::Start(10)).unwrap_err();
        assert!(err.is_transport(), "{err:?}");
        assert!(stream.is_faulted(), "{stream:?}");
        assert_eq!(stream.seek_count(), 1);

        let err = std::io::Read::read(&mut stream, &mut [0_u8; 4]).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Other, "{err:?}");
        Ok(())
    }
}
