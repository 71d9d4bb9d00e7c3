//! Short, stable identifiers for build profiles.

use flate2::Crc;

/// CRC-32 of the sorted, comma-joined component names, rendered as lowercase hex.
///
/// Input order does not matter. This names artifacts; it is not a hash of their bytes.
pub fn fingerprint<S: AsRef<str>>(components: &[S]) -> String {
    let mut names: Vec<&str> = components.iter().map(|c| c.as_ref()).collect();
    names.sort_unstable();
    let mut crc = Crc::new();
    crc.update(names.join(",").as_bytes());
    format!("{:x}", crc.sum())
}
