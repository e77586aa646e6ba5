//! Frame codec shared by the device and the ledger service.
//!
//! A frame is one postcard record in COBS form, so the zero byte never occurs
//! inside it and terminates it on the stream. There is no header, version or
//! length prefix beyond that.

use std::io::{BufRead, Read, Write};

use serde::{de::DeserializeOwned, Serialize};

pub const FRAME_END: u8 = 0x00;

/// Longest accepted frame, terminator included.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("connection closed by peer")]
    Closed,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed frame: {0}")]
    Codec(#[from] postcard::Error),
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, WireError> {
    Ok(postcard::to_stdvec_cobs(value)?)
}

/// Decodes a frame in place; the buffer content is destroyed.
pub fn decode<T: DeserializeOwned>(frame: &mut [u8]) -> Result<T, WireError> {
    Ok(postcard::from_bytes_cobs(frame)?)
}

/// Reads bytes up to and including the next frame terminator. A frame longer
/// than [`MAX_FRAME_LEN`] is treated like a closed connection.
pub fn read_frame<R: BufRead>(reader: &mut R) -> Result<Vec<u8>, WireError> {
    let mut frame = Vec::new();
    let len = reader
        .by_ref()
        .take(MAX_FRAME_LEN as u64)
        .read_until(FRAME_END, &mut frame)?;
    if len == 0 || frame.last() != Some(&FRAME_END) {
        return Err(WireError::Closed);
    }
    Ok(frame)
}

pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<(), WireError> {
    let frame = encode(value)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::*;

    #[test]
    fn frames_never_contain_terminator_before_end() {
        let frame = encode(&Request::StartActivityPeriod(StartActivityPeriodRequest {
            workstation_code: "WS\0".to_string(),
            num_workers: 0,
        }))
        .unwrap();

        let (last, body) = frame.split_last().unwrap();
        assert_eq!(*last, FRAME_END);
        assert!(!body.contains(&FRAME_END));
    }

    #[test]
    fn reads_consecutive_frames_from_stream() {
        let mut stream = Vec::new();
        write_frame(
            &mut stream,
            &Request::StopWork(StopWorkRequest {
                workstation_code: "WS1".to_string(),
            }),
        )
        .unwrap();
        write_frame(&mut stream, &Response::StopWork).unwrap();

        let mut reader = std::io::Cursor::new(stream);
        let mut first = read_frame(&mut reader).unwrap();
        let mut second = read_frame(&mut reader).unwrap();

        assert_eq!(
            decode::<Request>(&mut first).unwrap(),
            Request::StopWork(StopWorkRequest {
                workstation_code: "WS1".to_string()
            })
        );
        assert_eq!(decode::<Response>(&mut second).unwrap(), Response::StopWork);
        assert!(matches!(read_frame(&mut reader), Err(WireError::Closed)));
    }

    #[test]
    fn truncated_frame_is_closed_connection() {
        let frame = encode(&Response::StartWork).unwrap();
        let mut reader = std::io::Cursor::new(frame[..frame.len() - 1].to_vec());
        assert!(matches!(read_frame(&mut reader), Err(WireError::Closed)));
    }

    #[test]
    fn oversized_frame_is_closed_connection() {
        let mut stream = vec![1u8; MAX_FRAME_LEN + 8];
        stream.push(FRAME_END);
        let mut reader = std::io::Cursor::new(stream);
        assert!(matches!(read_frame(&mut reader), Err(WireError::Closed)));
    }

    #[test]
    fn unknown_request_tag_is_rejected() {
        let mut frame = encode(&(42u32, "WS1")).unwrap();
        assert!(matches!(
            decode::<Request>(&mut frame),
            Err(WireError::Codec(_))
        ));
    }

    #[test]
    fn error_response_keeps_trace() {
        let mut resp = ErrorResponse::new(ErrorKind::BatchNotFound, "batch doesn't exist");
        resp.trace.push("no batch with code CODE".to_string());
        let mut frame = encode(&Response::Error(resp.clone())).unwrap();
        assert_eq!(decode::<Response>(&mut frame).unwrap(), Response::Error(resp));
    }
}
