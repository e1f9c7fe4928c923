use sha1::{Digest, Sha1};

/// Lower-case hex SHA-1 digest of `data`.
pub fn sha1_hex(data: impl AsRef<[u8]>) -> String {
    let digest = Sha1::digest(data.as_ref());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}
