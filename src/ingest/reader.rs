//! Bounded consumption of the inbound request body.
//!
//! # Responsibilities
//! - Reject bodies whose declared length is already over the ceiling
//! - Accumulate streamed chunks and stop as soon as the ceiling is crossed
//! - Apply the same ceiling to bodies that arrive in one piece

use std::fmt::Display;

use axum::body::Bytes;
use futures_util::{Stream, StreamExt};
use thiserror::Error;

/// Largest accepted request body in bytes.
pub const MAX_BODY_BYTES: usize = 65_536;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("body exceeds {limit} bytes")]
    Oversize { limit: usize },

    #[error("body stream failed: {0}")]
    Interrupted(String),
}

/// Reject early on a `Content-Length` above `max`.
pub fn check_declared(declared: Option<u64>, max: usize) -> Result<(), ReadError> {
    match declared {
        Some(len) if len > max as u64 => Err(ReadError::Oversize { limit: max }),
        _ => Ok(()),
    }
}

/// Check a body that was delivered all at once.
pub fn check_whole(body: &[u8], max: usize) -> Result<(), ReadError> {
    if body.len() > max {
        return Err(ReadError::Oversize { limit: max });
    }
    Ok(())
}

/// Read a streamed body, never holding more than `max` bytes.
///
/// The chunk that pushes the total past `max` is dropped without being
/// copied, and the rest of the stream is left unread.
pub async fn read_bounded<S, E>(stream: S, max: usize) -> Result<Bytes, ReadError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let mut stream = std::pin::pin!(stream);
    let mut buf: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ReadError::Interrupted(e.to_string()))?;
        if buf.len() + chunk.len() > max {
            return Err(ReadError::Oversize { limit: max });
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(buf))
}
