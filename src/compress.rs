//! Optional per-token compression (C2). Applies compression only when the
//! result is strictly shorter than the input; the caller distinguishes the
//! two outcomes via an explicit `bool` rather than a pointer-identity trick,
//! which has no clean Rust equivalent for owned buffers.

/// Compress `bytes`. Returns `(data, true)` if `data` is the compressed form
/// and strictly shorter than `bytes`, otherwise `(bytes.to_vec(), false)`.
pub fn compress(bytes: &[u8]) -> (Vec<u8>, bool) {
    if bytes.is_empty() {
        return (Vec::new(), false);
    }
    let mut encoder = snap::raw::Encoder::new();
    match encoder.compress_vec(bytes) {
        Ok(packed) if packed.len() < bytes.len() => (packed, true),
        _ => (bytes.to_vec(), false),
    }
}

/// Decompress `bytes` previously produced by [`compress`] with `compressed = true`.
pub fn decompress(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = snap::raw::Decoder::new();
    decoder
        .decompress_vec(bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let data = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_vec();
        let (packed, compressed) = compress(&data);
        assert!(compressed);
        assert!(packed.len() < data.len());
        let back = decompress(&packed).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn incompressible_returns_original() {
        // Short random-looking input: snappy overhead makes it not worth
        // compressing, so the identity contract ("not shorter => return
        // original") must hold.
        let data = vec![1u8, 200, 3, 250, 7, 9, 128, 64, 5, 221];
        let (packed, compressed) = compress(&data);
        if compressed {
            assert!(packed.len() < data.len());
        } else {
            assert_eq!(packed, data);
        }
    }

    #[test]
    fn empty_is_not_compressed() {
        let (packed, compressed) = compress(&[]);
        assert!(!compressed);
        assert!(packed.is_empty());
    }
}
