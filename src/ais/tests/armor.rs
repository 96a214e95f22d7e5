use crate::ais::armor::{armor, armor_char, dearmor, dearmor_char, fill_bits};
use crate::ais::bits::{BitReader, BitWriter};
use crate::ais::AisError;

/// Tests the character mapping at the boundaries of both armoring ranges
#[test]
fn test_armor_char_boundaries() {
    assert_eq!(armor_char(0), '0');
    assert_eq!(armor_char(39), 'W');
    assert_eq!(armor_char(40), '`');
    assert_eq!(armor_char(63), 'w');

    for value in 0..64u8 {
        assert_eq!(dearmor_char(armor_char(value)), Ok(value));
    }
    assert_eq!(dearmor_char('X'), Err(AisError::InvalidPayloadChar('X')));
    assert_eq!(dearmor_char('x'), Err(AisError::InvalidPayloadChar('x')));
}

/// Tests the armoring law:
/// - fill bits = (6 - L mod 6) mod 6 for every length
/// - C armored characters decode to exactly 6*C - fill meaningful bits
#[test]
fn test_armoring_law() {
    for len in 1..=60usize {
        let bits: Vec<bool> = (0..len).map(|i| i % 3 == 0).collect();
        let (payload, fill) = armor(&bits);

        assert_eq!(fill as usize, (6 - len % 6) % 6, "fill bits for length {}", len);
        assert_eq!(payload.len(), (len + 5) / 6);

        let decoded = dearmor(&payload, fill).expect("valid payload");
        assert_eq!(decoded.len(), 6 * payload.len() - fill as usize);
        assert_eq!(decoded, bits);
    }
    assert_eq!(fill_bits(168), 0);
    assert_eq!(fill_bits(424), 2);
}

/// Tests that fill bit counts above five are rejected
#[test]
fn test_invalid_fill_bits() {
    assert_eq!(dearmor("00", 6), Err(AisError::InvalidFillBits(6)));
}

/// Tests bit packing:
/// - Unsigned and signed fields reject values outside their width
/// - Negative values sign-extend on read
/// - Text is padded with '@' and trimmed on read
#[test]
fn test_bit_fields() {
    let mut writer = BitWriter::new();
    writer.write_uint("a", 63, 6).unwrap();
    writer.write_int("b", -1, 8).unwrap();
    writer.write_int("c", -128, 8).unwrap();
    writer.write_text("d", "ab c", 6).unwrap();
    assert_eq!(writer.len(), 6 + 8 + 8 + 36);

    assert_eq!(
        writer.write_uint("wide", 64, 6),
        Err(AisError::FieldOutOfRange { field: "wide", value: 64, width: 6 })
    );
    assert!(matches!(writer.write_int("signed", 128, 8), Err(AisError::FieldOutOfRange { .. })));
    assert!(matches!(writer.write_text("text", "caf\u{e9}", 4), Err(AisError::InvalidText { .. })));

    // Rejected writes leave the buffer untouched
    assert_eq!(writer.len(), 58);
    let mut reader = BitReader::new(writer.bits());
    assert_eq!(reader.read_uint(6).unwrap(), 63);
    assert_eq!(reader.read_int(8).unwrap(), -1);
    assert_eq!(reader.read_int(8).unwrap(), -128);
    assert_eq!(reader.read_text(6).unwrap(), "AB C");
    assert_eq!(reader.remaining(), 0);
    assert!(matches!(reader.read_uint(1), Err(AisError::NotEnoughBits { .. })));
}
