//! SHA-256 content digests in `sha256:<hex>` form.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::str::FromStr;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::constants::BLOB_CHUNK_LEN;

const ALGORITHM: &str = "sha256";
const HEX_LEN: usize = 64;

/// Content digest of a blob. Used both as integrity check and as storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest {
    hex: String,
}

impl Digest {
    pub fn of_bytes(data: &[u8]) -> Self {
        Self::from_hasher(Sha256::new_with_prefix(data))
    }

    /// Hash a reader to its end, returning the digest and the number of bytes read.
    pub async fn from_reader<R>(reader: &mut R) -> std::io::Result<(Self, u64)>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; BLOB_CHUNK_LEN];
        let mut size = 0u64;
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            size += n as u64;
        }
        Ok((Self::from_hasher(hasher), size))
    }

    fn from_hasher(hasher: Sha256) -> Self {
        let hex = hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        Self { hex }
    }

    pub fn algorithm(&self) -> &'static str {
        ALGORITHM
    }

    /// Lowercase hex of the hash, without the algorithm prefix
    pub fn hex(&self) -> &str {
        &self.hex
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ALGORITHM}:{}", self.hex)
    }
}

impl FromStr for Digest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (algorithm, hex) = s
            .split_once(':')
            .ok_or_else(|| format!("digest '{s}' has no algorithm prefix"))?;
        if algorithm != ALGORITHM {
            return Err(format!("unsupported digest algorithm '{algorithm}'"));
        }
        if hex.len() != HEX_LEN || !hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(format!("digest '{s}' is not {HEX_LEN} lowercase hex characters"));
        }
        Ok(Self {
            hex: hex.to_string(),
        })
    }
}

impl TryFrom<String> for Digest {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: &str = "sha256:2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_digest_of_bytes() {
        assert_eq!(Digest::of_bytes(b"hello").to_string(), HELLO);
        assert_eq!(
            Digest::of_bytes(b"").hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn test_digest_from_reader() {
        let data = vec![7u8; BLOB_CHUNK_LEN * 2 + 3];
        let (digest, size) = Digest::from_reader(&mut data.as_slice()).await.unwrap();
        assert_eq!(size, data.len() as u64);
        assert_eq!(digest, Digest::of_bytes(&data));
    }

    #[test]
    fn test_digest_parse() {
        let digest: Digest = HELLO.parse().unwrap();
        assert_eq!(digest, Digest::of_bytes(b"hello"));

        assert!("2cf24dba".parse::<Digest>().is_err());
        assert!("md5:2cf24dba".parse::<Digest>().is_err());
        assert!("sha256:XYZ".parse::<Digest>().is_err());
    }
}
