//! Packed pitch/bank/heading (PBH) decoding
//!
//! Bit layout of the 32-bit word, LSB first:
//!
//! | bits  | field            |
//! |-------|------------------|
//! | 0     | unused           |
//! | 1     | on ground        |
//! | 2-11  | heading (u10)    |
//! | 12-21 | bank (i10)       |
//! | 22-31 | pitch (i10)      |

use super::types::DecodedAttitude;

const PITCH_MULT: f64 = 256.0 / 90.0;
const BANK_MULT: f64 = 512.0 / 180.0;

const FIELD_MASK: u32 = 0x3FF;
const SIGN_BIT: u32 = 0x200;

/// A packed attitude word. Construction masks to 32 bits, so every value decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedAttitude(u32);

impl PackedAttitude {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Wire value after float-then-integer coercion; keeps the low 32 bits
    pub fn from_wire(raw: i64) -> Self {
        Self(raw as u32)
    }

    /// Build a word from raw field values. Out-of-range fields are masked.
    pub fn pack(pitch_raw: i16, bank_raw: i16, heading_raw: u16, on_ground: bool) -> Self {
        let pitch = (pitch_raw as u32) & FIELD_MASK;
        let bank = (bank_raw as u32) & FIELD_MASK;
        let heading = (heading_raw as u32) & FIELD_MASK;
        Self((pitch << 22) | (bank << 12) | (heading << 2) | ((on_ground as u32) << 1))
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    pub fn on_ground(&self) -> bool {
        (self.0 >> 1) & 1 == 1
    }

    pub fn heading_raw(&self) -> u16 {
        ((self.0 >> 2) & FIELD_MASK) as u16
    }

    pub fn bank_raw(&self) -> i16 {
        sign_extend_10(self.0 >> 12)
    }

    pub fn pitch_raw(&self) -> i16 {
        sign_extend_10(self.0 >> 22)
    }

    pub fn decode(&self) -> DecodedAttitude {
        let heading_deg = self.heading_raw() as f64 * 360.0 / 1024.0;
        let pitch_deg = floor_to_int(self.pitch_raw() as f64 / -PITCH_MULT);
        let bank_deg = floor_to_int(self.bank_raw() as f64 / -BANK_MULT);

        DecodedAttitude {
            packed: self.0,
            heading_deg,
            heading_deg_rounded: (heading_deg.round_ties_even() as u16) % 360,
            pitch_deg,
            bank_deg,
            on_ground: self.on_ground(),
        }
    }
}

fn sign_extend_10(field: u32) -> i16 {
    let x = field & FIELD_MASK;
    if x & SIGN_BIT != 0 {
        x as i16 - 0x400
    } else {
        x as i16
    }
}

// -0.0 collapses to 0 here
fn floor_to_int(value: f64) -> i32 {
    value.floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inverse of the decoder for whole degrees
    fn pack_degrees(pitch_deg: i32, bank_deg: i32, heading_deg: u16, on_ground: bool) -> PackedAttitude {
        let pitch_raw = (-(pitch_deg as f64 + 0.5) * PITCH_MULT).round() as i16;
        let bank_raw = (-(bank_deg as f64 + 0.5) * BANK_MULT).round() as i16;
        let heading_raw = (heading_deg as f64 * 1024.0 / 360.0).round() as u16;
        PackedAttitude::pack(pitch_raw, bank_raw, heading_raw, on_ground)
    }

    #[test]
    fn test_zero_word() {
        let att = PackedAttitude::new(0).decode();
        assert_eq!(att.heading_deg, 0.0);
        assert_eq!(att.heading_deg_rounded, 0);
        assert_eq!(att.pitch_deg, 0);
        assert_eq!(att.bank_deg, 0);
        assert!(!att.on_ground);
    }

    #[test]
    fn test_field_extraction() {
        let word = PackedAttitude::pack(-3, 511, 1023, true);
        assert_eq!(word.pitch_raw(), -3);
        assert_eq!(word.bank_raw(), 511);
        assert_eq!(word.heading_raw(), 1023);
        assert!(word.on_ground());

        let word = PackedAttitude::new(0xFFFF_FFFF);
        assert_eq!(word.pitch_raw(), -1);
        assert_eq!(word.bank_raw(), -1);
        assert_eq!(word.heading_raw(), 1023);
    }

    #[test]
    fn test_unused_bit_ignored() {
        assert!(!PackedAttitude::new(1).decode().on_ground);
        assert!(PackedAttitude::new(2).decode().on_ground);
    }

    #[test]
    fn test_floor_not_truncation() {
        // 1 / -2.84 = -0.35 floors to -1, truncation would give 0
        let att = PackedAttitude::pack(1, 1, 0, false).decode();
        assert_eq!(att.pitch_deg, -1);
        assert_eq!(att.bank_deg, -1);

        // -1 / -2.84 = 0.35 floors to 0
        let att = PackedAttitude::pack(-1, -1, 0, false).decode();
        assert_eq!(att.pitch_deg, 0);
        assert_eq!(att.bank_deg, 0);

        let att = PackedAttitude::pack(-511, 511, 0, false).decode();
        assert_eq!(att.pitch_deg, 179);
        assert_eq!(att.bank_deg, -180);
    }

    #[test]
    fn test_heading_rounding_half_to_even() {
        // raw 64 -> 22.5, raw 192 -> 67.5
        let att = PackedAttitude::pack(0, 0, 64, false).decode();
        assert_eq!(att.heading_deg, 22.5);
        assert_eq!(att.heading_deg_rounded, 22);

        let att = PackedAttitude::pack(0, 0, 192, false).decode();
        assert_eq!(att.heading_deg, 67.5);
        assert_eq!(att.heading_deg_rounded, 68);

        let att = PackedAttitude::pack(0, 0, 256, false).decode();
        assert_eq!(att.heading_deg, 90.0);
        assert_eq!(att.heading_deg_rounded, 90);
    }

    #[test]
    fn test_heading_wraps_to_zero() {
        let att = PackedAttitude::pack(0, 0, 1023, false).decode();
        assert!(att.heading_deg > 359.6 && att.heading_deg < 360.0);
        assert_eq!(att.heading_deg_rounded, 0);
    }

    #[test]
    fn test_every_heading_in_range() {
        for raw in 0..1024u16 {
            let att = PackedAttitude::pack(0, 0, raw, false).decode();
            assert!((0.0..360.0).contains(&att.heading_deg));
            assert!(att.heading_deg_rounded <= 359);
        }
    }

    #[test]
    fn test_sampled_words_never_fail() {
        let mut word: u32 = 0;
        loop {
            let att = PackedAttitude::new(word).decode();
            assert!(att.heading_deg_rounded <= 359);
            assert!((-181..=180).contains(&att.pitch_deg));
            assert!((-181..=180).contains(&att.bank_deg));
            match word.checked_add(65_537) {
                Some(next) => word = next,
                None => break,
            }
        }
        PackedAttitude::new(u32::MAX).decode();
    }

    #[test]
    fn test_from_wire_masks() {
        assert_eq!(PackedAttitude::from_wire(-1).raw(), 0xFFFF_FFFF);
        assert_eq!(PackedAttitude::from_wire(0x1_0000_0004).raw(), 4);
        assert_eq!(PackedAttitude::from_wire(4).heading_raw(), 1);
    }

    #[test]
    fn test_synthetic_words_decode_back() {
        let cases = [
            (0, 0, 0, false),
            (5, -10, 90, true),
            (-15, 25, 271, false),
            (45, -45, 180, false),
            (-90, 90, 359, true),
            (179, -180, 1, false),
        ];
        for (pitch, bank, heading, ground) in cases {
            let att = pack_degrees(pitch, bank, heading, ground).decode();
            assert_eq!(att.pitch_deg, pitch, "pitch {pitch}");
            assert_eq!(att.bank_deg, bank, "bank {bank}");
            assert_eq!(att.heading_deg_rounded, heading, "heading {heading}");
            assert_eq!(att.on_ground, ground);
        }
    }
}
