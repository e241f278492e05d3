//! Framing of processor messages.
//!
//! ```text
//! "CDTM" | version u8
//! 'D' | u32 len | descriptor JSON
//! 'R' | u32 len | resource JSON
//! [ 'B' | (u32 len | bytes)* | u32 0 ]      only when a blob is attached
//! 'E'
//! ```
//!
//! All integers are big-endian. The blob is chunked so it can be streamed
//! without knowing its length up front. An empty blob is encoded as
//! `'B' 0`, distinct from an absent one.

use tokio::io::{self, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use super::Message;
use super::scratch::ScratchSpace;
use crate::config::constants::{BLOB_CHUNK_LEN, MAX_SECTION_LEN, MESSAGE_MAGIC, MESSAGE_VERSION};
use crate::descriptor::{ComponentDescriptor, Resource};
use crate::error::{Result, TransportError};

const TAG_DESCRIPTOR: u8 = b'D';
const TAG_RESOURCE: u8 = b'R';
const TAG_BLOB: u8 = b'B';
const TAG_END: u8 = b'E';

/// Write a message frame to `writer` and flush it.
pub async fn write_message<W>(
    writer: &mut W,
    descriptor: &ComponentDescriptor,
    resource: &Resource,
    blob: Option<&mut (dyn AsyncRead + Unpin + Send)>,
) -> Result<()>
where
    W: AsyncWrite + Unpin + Send + ?Sized,
{
    writer.write_all(MESSAGE_MAGIC).await?;
    writer.write_u8(MESSAGE_VERSION).await?;

    write_section(writer, TAG_DESCRIPTOR, &serde_json::to_vec(descriptor)?).await?;
    write_section(writer, TAG_RESOURCE, &serde_json::to_vec(resource)?).await?;

    if let Some(blob) = blob {
        writer.write_u8(TAG_BLOB).await?;
        let mut buf = vec![0u8; BLOB_CHUNK_LEN];
        let mut total = 0u64;
        loop {
            let n = blob.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            writer.write_u32(n as u32).await?;
            writer.write_all(&buf[..n]).await?;
            total += n as u64;
        }
        writer.write_u32(0).await?;
        debug!("Wrote blob of {} bytes for resource '{}'", total, resource.name);
    }

    writer.write_u8(TAG_END).await?;
    writer.flush().await?;
    Ok(())
}

async fn write_section<W>(writer: &mut W, tag: u8, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin + Send + ?Sized,
{
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_SECTION_LEN)
        .ok_or_else(|| {
            TransportError::malformed(format!(
                "section '{}' of {} bytes exceeds the frame limit",
                tag as char,
                payload.len()
            ))
        })?;
    writer.write_u8(tag).await?;
    writer.write_u32(len).await?;
    writer.write_all(payload).await?;
    Ok(())
}

/// Read a message frame from `reader`.
///
/// A blob, if present, is materialized into a scratch file from `scratch` and
/// returned rewound; the caller owns it and must close or drop it.
pub async fn read_message<R>(reader: &mut R, scratch: &ScratchSpace) -> Result<Message>
where
    R: AsyncRead + Unpin + Send + ?Sized,
{
    let mut magic = [0u8; 4];
    read_exact(reader, &mut magic, "header").await?;
    if &magic != MESSAGE_MAGIC {
        return Err(TransportError::malformed("missing message header"));
    }
    let version = read_u8(reader, "version").await?;
    if version != MESSAGE_VERSION {
        return Err(TransportError::malformed(format!(
            "unsupported message version {version}"
        )));
    }

    let descriptor: ComponentDescriptor =
        serde_json::from_slice(&read_section(reader, TAG_DESCRIPTOR).await?)?;
    let resource: Resource = serde_json::from_slice(&read_section(reader, TAG_RESOURCE).await?)?;

    let blob = match read_u8(reader, "section tag").await? {
        TAG_END => None,
        TAG_BLOB => {
            let mut file = scratch.create()?;
            let mut total = 0u64;
            loop {
                let len = read_len(reader, "blob chunk").await?;
                if len == 0 {
                    break;
                }
                let copied = io::copy(&mut (&mut *reader).take(u64::from(len)), &mut file).await?;
                if copied != u64::from(len) {
                    return Err(TransportError::malformed("truncated blob chunk"));
                }
                total += copied;
            }
            match read_u8(reader, "end marker").await? {
                TAG_END => {}
                other => {
                    return Err(TransportError::malformed(format!(
                        "expected end marker after blob, found {other:#04x}"
                    )));
                }
            }
            file.rewind().await?;
            debug!("Read blob of {} bytes for resource '{}'", total, resource.name);
            Some(file)
        }
        other => {
            return Err(TransportError::malformed(format!(
                "unknown section tag {other:#04x}"
            )));
        }
    };

    Ok(Message {
        descriptor,
        resource,
        blob,
    })
}

async fn read_section<R>(reader: &mut R, tag: u8) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + ?Sized,
{
    let found = read_u8(reader, "section tag").await?;
    if found != tag {
        return Err(TransportError::malformed(format!(
            "expected section '{}', found {found:#04x}",
            tag as char
        )));
    }
    let len = read_len(reader, "section length").await?;
    // Grow with the bytes actually present, not with the declared length
    let mut payload = Vec::new();
    (&mut *reader)
        .take(u64::from(len))
        .read_to_end(&mut payload)
        .await?;
    if payload.len() != len as usize {
        return Err(TransportError::malformed(format!(
            "truncated message while reading section '{}'",
            tag as char
        )));
    }
    Ok(payload)
}

async fn read_len<R>(reader: &mut R, what: &str) -> Result<u32>
where
    R: AsyncRead + Unpin + Send + ?Sized,
{
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf, what).await?;
    let len = u32::from_be_bytes(buf);
    if len > MAX_SECTION_LEN {
        return Err(TransportError::malformed(format!(
            "{what} {len} exceeds the frame limit"
        )));
    }
    Ok(len)
}

async fn read_u8<R>(reader: &mut R, what: &str) -> Result<u8>
where
    R: AsyncRead + Unpin + Send + ?Sized,
{
    let mut buf = [0u8; 1];
    read_exact(reader, &mut buf, what).await?;
    Ok(buf[0])
}

// EOF inside a frame is a framing problem, not a storage problem
async fn read_exact<R>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()>
where
    R: AsyncRead + Unpin + Send + ?Sized,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(TransportError::malformed(
            format!("truncated message while reading {what}"),
        )),
        Err(e) => Err(e.into()),
    }
}
