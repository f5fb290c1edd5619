use crate::client::StreamBody;
use crate::error::Result;
use bytes::{Buf, Bytes, BytesMut};
use futures::{Stream, StreamExt};
use tracing::{trace, warn};

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];

/// Incremental splitter for `multipart/x-mixed-replace` MJPEG bodies.
///
/// Part headers and boundaries are skipped; a frame is every byte run from a JPEG
/// start-of-image marker through the next end-of-image marker.
#[derive(Debug)]
pub struct MjpegParser {
    buffer: BytesMut,
    max_buffer: usize,
    frames_parsed: u64,
    bytes_discarded: u64,
}

impl MjpegParser {
    pub fn new(max_buffer: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            max_buffer,
            frames_parsed: 0,
            bytes_discarded: 0,
        }
    }

    pub fn frames_parsed(&self) -> u64 {
        self.frames_parsed
    }

    pub fn bytes_discarded(&self) -> u64 {
        self.bytes_discarded
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a body chunk and return every frame it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();

        loop {
            let Some(start) = find_marker(&self.buffer, SOI, 0) else {
                // A trailing 0xFF may be the first half of the next marker
                let keep = usize::from(self.buffer.last() == Some(&0xFF));
                self.discard(self.buffer.len() - keep);
                break;
            };

            if start > 0 {
                self.discard(start);
            }

            let Some(end) = find_marker(&self.buffer, EOI, SOI.len()) else {
                break;
            };

            let frame = self.buffer.split_to(end + EOI.len()).freeze();
            trace!("Parsed MJPEG frame of {} bytes", frame.len());
            self.frames_parsed += 1;
            frames.push(frame);
        }

        if self.buffer.len() > self.max_buffer {
            warn!(
                "Dropping {} buffered stream bytes without an end-of-image marker",
                self.buffer.len()
            );
            self.discard(self.buffer.len());
        }

        frames
    }

    fn discard(&mut self, count: usize) {
        if count > 0 {
            self.bytes_discarded += count as u64;
            self.buffer.advance(count);
        }
    }
}

fn find_marker(haystack: &[u8], marker: [u8; 2], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(2)
        .position(|window| window == marker)
        .map(|position| position + from)
}

/// Adapt a raw body into a stream of complete JPEG frames
pub fn mjpeg_frames(mut body: StreamBody, max_buffer: usize) -> impl Stream<Item = Result<Bytes>> {
    async_stream::try_stream! {
        let mut parser = MjpegParser::new(max_buffer);
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            for frame in parser.push(&chunk) {
                yield frame;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CamwatchError;
    use futures::stream;

    fn create_test_jpeg(payload: &[u8]) -> Vec<u8> {
        let mut jpeg = vec![0xFF, 0xD8];
        jpeg.extend_from_slice(payload);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }

    fn create_test_part(jpeg: &[u8]) -> Vec<u8> {
        let mut part = format!(
            "--frame\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
            jpeg.len()
        )
        .into_bytes();
        part.extend_from_slice(jpeg);
        part.extend_from_slice(b"\r\n");
        part
    }

    #[test]
    fn test_parse_single_part() {
        let jpeg = create_test_jpeg(&[1, 2, 3, 4]);
        let mut parser = MjpegParser::new(1024);

        let frames = parser.push(&create_test_part(&jpeg));

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref(), jpeg.as_slice());
        assert_eq!(parser.frames_parsed(), 1);
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let jpeg = create_test_jpeg(&[9; 64]);
        let part = create_test_part(&jpeg);
        let mut parser = MjpegParser::new(1024);
        let mut frames = Vec::new();

        // One byte at a time splits every marker at least once
        for byte in &part {
            frames.extend(parser.push(std::slice::from_ref(byte)));
        }

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), jpeg.len());
    }

    #[test]
    fn test_multiple_parts_in_one_chunk() {
        let mut body = Vec::new();
        for index in 0..3u8 {
            body.extend(create_test_part(&create_test_jpeg(&[index; 10])));
        }
        let mut parser = MjpegParser::new(4096);

        let frames = parser.push(&body);

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2][2], 2);
        assert!(parser.buffered() <= 1);
    }

    #[test]
    fn test_oversized_partial_frame_dropped() {
        let mut parser = MjpegParser::new(32);
        let mut partial = vec![0xFF, 0xD8];
        partial.extend_from_slice(&[0u8; 64]);

        assert!(parser.push(&partial).is_empty());
        assert_eq!(parser.buffered(), 0);
        assert_eq!(parser.bytes_discarded(), 66);

        // Parsing recovers on the next complete frame
        let frames = parser.push(&create_test_jpeg(&[7, 7]));
        assert_eq!(frames.len(), 1);
    }

    #[tokio::test]
    async fn test_mjpeg_frames_stream() {
        let first = create_test_part(&create_test_jpeg(&[1; 20]));
        let second = create_test_part(&create_test_jpeg(&[2; 30]));
        let (head, tail) = second.split_at(12);
        let chunks: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from(first)),
            Ok(Bytes::copy_from_slice(head)),
            Ok(Bytes::copy_from_slice(tail)),
        ];

        let frames: Vec<Bytes> = mjpeg_frames(stream::iter(chunks).boxed(), 1024)
            .map(|frame| frame.unwrap())
            .collect()
            .await;

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].len(), 34);
    }

    #[tokio::test]
    async fn test_mjpeg_frames_stops_on_error() {
        let chunks: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from(create_test_part(&create_test_jpeg(&[1; 4])))),
            Err(CamwatchError::stream("connection reset")),
            Ok(Bytes::from(create_test_part(&create_test_jpeg(&[2; 4])))),
        ];

        let results: Vec<Result<Bytes>> = mjpeg_frames(stream::iter(chunks).boxed(), 1024)
            .collect()
            .await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
