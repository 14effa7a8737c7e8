//! Range GET against the door, including servers that ignore or only partly
//! honour `Range`.

use super::range::ByteRange;
use crate::config::Credentials;
use crate::error::{FsError, Result};
use crate::path::RemoteObject;
use bytes::{Bytes, BytesMut};
use reqwest::header::{CONTENT_LENGTH, RANGE};
use reqwest::{Client, Response, StatusCode};

/// Fetches `range` of `object`.
///
/// Never returns more than `range.len()` bytes. A range wholly past the end
/// of the object yields an empty buffer.
pub async fn fetch_range(
    client: &Client,
    credentials: &Credentials,
    object: &RemoteObject,
    range: ByteRange,
) -> Result<Bytes> {
    let url = object.url()?;
    tracing::debug!("GET {url} range {range}");
    let req = client.get(url).header(RANGE, range.header_value());
    let res = credentials.apply(req).send().await?;

    let status = res.status();
    if status == StatusCode::RANGE_NOT_SATISFIABLE {
        return Ok(Bytes::new());
    }
    if !status.is_success() {
        return Err(FsError::from_response(object.path(), res).await);
    }
    if status == StatusCode::PARTIAL_CONTENT {
        return Ok(res.bytes().await?);
    }

    let requested = range.len();
    match declared_length(&res) {
        Some(declared) if declared <= requested => Ok(res.bytes().await?),
        Some(declared) => Err(FsError::SizeMismatch {
            received: declared,
            requested,
        }),
        None => read_bounded(res, requested).await,
    }
}

fn declared_length(res: &Response) -> Option<u64> {
    res.headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}

/// Drains a body of unknown length, bailing out once it outgrows `limit`.
async fn read_bounded(mut res: Response, limit: u64) -> Result<Bytes> {
    let mut out = BytesMut::new();
    while let Some(chunk) = res.chunk().await? {
        out.extend_from_slice(&chunk);
        let received = out.len() as u64;
        if received > limit {
            return Err(FsError::SizeMismatch {
                received,
                requested: limit,
            });
        }
    }
    Ok(out.freeze())
}
