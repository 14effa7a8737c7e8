//! Range PUT against the door.

use super::range::ByteRange;
use crate::config::Credentials;
use crate::error::{FsError, Result};
use crate::path::RemoteObject;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::RANGE;

/// Uploads `data` as the span `range` of `object`.
///
/// The call either succeeds for the whole span or fails; callers must keep
/// the bytes until it reports success.
pub async fn upload_range(
    client: &Client,
    credentials: &Credentials,
    object: &RemoteObject,
    range: ByteRange,
    data: Bytes,
) -> Result<()> {
    if data.len() as u64 != range.len() {
        return Err(FsError::InvalidInput(format!(
            "payload of {} bytes does not match range {range}",
            data.len()
        )));
    }
    let url = object.url()?;
    tracing::debug!("PUT {url} range {range}");
    let req = client
        .put(url)
        .header(RANGE, range.header_value())
        .body(data);
    let res = credentials.apply(req).send().await?;
    if !res.status().is_success() {
        return Err(FsError::from_response(object.path(), res).await);
    }
    Ok(())
}

/// Creates (or truncates to) a zero-byte object with a plain PUT.
pub async fn create_empty(
    client: &Client,
    credentials: &Credentials,
    object: &RemoteObject,
) -> Result<()> {
    let url = object.url()?;
    tracing::debug!("PUT {url} (empty)");
    let req = client.put(url).body(Bytes::new());
    let res = credentials.apply(req).send().await?;
    if !res.status().is_success() {
        return Err(FsError::from_response(object.path(), res).await);
    }
    Ok(())
}
