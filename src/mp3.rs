//! Single-frame MPEG Audio header parsing, used to report a stream's bitrate
//! without decoding it. Mirrors the narrow slice of `tcolgate/mp3` the
//! original implementation actually relied on: find the first valid frame
//! header, read its bitrate index out of the fixed MPEG-1 Layer III table,
//! and stop. No VBR averaging, no resync-on-corrupt-frame heuristics.

use crate::error::{RadioError, Result};

/// bits/sec for MPEG-1 Layer III, indexed by the 4-bit bitrate field.
/// Index 0 is "free format" and index 15 is reserved; both are rejected.
const MPEG1_LAYER3_BITRATES_KBPS: [u16; 16] = [
    0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0,
];

/// bits/sec for MPEG-2/2.5 Layer III, same index layout.
const MPEG2_LAYER3_BITRATES_KBPS: [u16; 16] = [
    0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MpegVersion {
    V1,
    V2OrV25,
}

fn parse_frame_header(b: &[u8; 4]) -> Option<(MpegVersion, u16)> {
    // Sync word: 11 set bits.
    if b[0] != 0xFF || (b[1] & 0xE0) != 0xE0 {
        return None;
    }

    let version_bits = (b[1] >> 3) & 0x03;
    let layer_bits = (b[1] >> 1) & 0x03;
    // Layer III is `01`.
    if layer_bits != 0x01 {
        return None;
    }
    let version = match version_bits {
        0b11 => MpegVersion::V1,
        0b10 | 0b00 => MpegVersion::V2OrV25,
        _ => return None, // reserved
    };

    let bitrate_index = (b[2] >> 4) & 0x0F;
    if bitrate_index == 0 || bitrate_index == 0x0F {
        return None;
    }

    let kbps = match version {
        MpegVersion::V1 => MPEG1_LAYER3_BITRATES_KBPS[bitrate_index as usize],
        MpegVersion::V2OrV25 => MPEG2_LAYER3_BITRATES_KBPS[bitrate_index as usize],
    };
    if kbps == 0 {
        return None;
    }
    Some((version, kbps))
}

/// Scans `data` for the first valid MPEG Layer III frame header and returns
/// its bitrate in bits per second.
pub fn detect_bitrate(data: &[u8]) -> Result<u32> {
    if data.len() < 4 {
        return Err(RadioError::BitrateUnknown);
    }
    for window in data.windows(4) {
        let header: [u8; 4] = window.try_into().expect("windows(4) yields 4 bytes");
        if let Some((_, kbps)) = parse_frame_header(&header) {
            return Ok(kbps as u32 * 1000);
        }
    }
    Err(RadioError::BitrateUnknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mpeg1_layer3_header(bitrate_index: u8) -> [u8; 4] {
        [0xFF, 0xFB, bitrate_index << 4, 0x00]
    }

    #[test]
    fn detects_64kbps_frame() {
        let data = mpeg1_layer3_header(5); // index 5 -> 64 kbps
        assert_eq!(detect_bitrate(&data).unwrap(), 64_000);
    }

    #[test]
    fn detects_128kbps_frame() {
        let data = mpeg1_layer3_header(9); // index 9 -> 128 kbps
        assert_eq!(detect_bitrate(&data).unwrap(), 128_000);
    }

    #[test]
    fn garbage_bytes_are_bitrate_unknown() {
        let data = [0x00u8; 16];
        assert!(matches!(detect_bitrate(&data), Err(RadioError::BitrateUnknown)));
    }

    #[test]
    fn finds_header_after_leading_junk() {
        let mut data = vec![0x00, 0x01, 0x02];
        data.extend_from_slice(&mpeg1_layer3_header(9));
        assert_eq!(detect_bitrate(&data).unwrap(), 128_000);
    }

    #[test]
    fn too_short_is_bitrate_unknown() {
        assert!(matches!(detect_bitrate(&[0xFF, 0xFB]), Err(RadioError::BitrateUnknown)));
    }
}
