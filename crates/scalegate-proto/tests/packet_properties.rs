//! Property-based tests for the Suwol1000 frame codec.
//!
//! These verify the framing invariants for ALL valid inputs, not just
//! specific examples: request frames are always exactly [`REQUEST_LEN`]
//! bytes with STX/ETX delimiters, the relay nibble codec is a bijection on
//! bytes, and request fields survive the encode path within the documented
//! truncation/padding rules.

use proptest::prelude::*;
use scalegate_proto::{
    CommandCode, ETX, REQUEST_LEN, RequestPacket, STX, VoiceCode,
    relay::{decode_relay, encode_relay},
};

/// Strategy for generating arbitrary command codes.
fn arbitrary_command() -> impl Strategy<Value = CommandCode> {
    prop_oneof![Just(CommandCode::Display), Just(CommandCode::Print), Just(CommandCode::Temp)]
}

/// Strategy for generating arbitrary voice codes.
fn arbitrary_voice() -> impl Strategy<Value = VoiceCode> {
    (0u8..=12).prop_map(|value| VoiceCode::from_wire(value).unwrap_or(VoiceCode::None))
}

/// Strategy for generating arbitrary request packets.
fn arbitrary_request() -> impl Strategy<Value = RequestPacket> {
    (
        any::<u8>(),
        arbitrary_command(),
        any::<i32>(),
        "[A-Z0-9 ]{0,10}",
        any::<bool>(),
        any::<bool>(),
        arbitrary_voice(),
    )
        .prop_map(
            |(device_id, command_code, weight, plate, green, red, voice)| RequestPacket {
                device_id,
                command_code,
                display_weight: weight,
                display_plate: plate,
                green_blink: green,
                red_blink: red,
                voice_code: voice,
            },
        )
}

#[test]
fn prop_request_framing_invariants() {
    proptest!(|(packet in arbitrary_request())| {
        let frame = packet.encode();

        // PROPERTY: fixed length with delimiters at both ends
        prop_assert_eq!(frame.len(), REQUEST_LEN);
        prop_assert_eq!(frame[0], STX);
        prop_assert_eq!(frame[REQUEST_LEN - 1], ETX);

        // PROPERTY: everything between the delimiters is printable ASCII
        for &byte in &frame[1..REQUEST_LEN - 1] {
            prop_assert!((0x20..0x7F).contains(&byte), "unprintable byte {byte:#04x}");
        }
    });
}

#[test]
fn prop_request_fields_reach_their_slots() {
    proptest!(|(packet in arbitrary_request())| {
        let frame = packet.encode();

        prop_assert_eq!(frame[1], b'0' + packet.device_id % 10);
        prop_assert_eq!(frame[2], packet.command_code.to_wire());

        let expected_sign = if packet.display_weight < 0 { b'-' } else { b'+' };
        prop_assert_eq!(frame[3], expected_sign);

        let voice = packet.voice_code.to_wire();
        prop_assert_eq!(frame[25], b'0' + voice / 10);
        prop_assert_eq!(frame[26], b'0' + voice % 10);
    });
}

#[test]
fn prop_weight_digits_round_trip_when_short_enough() {
    proptest!(|(weight in -9_999_999i32..=9_999_999)| {
        let packet = RequestPacket { display_weight: weight, ..RequestPacket::default() };
        let frame = packet.encode();

        let text = std::str::from_utf8(&frame[4..11]).expect("digits are ASCII");
        let parsed: i32 = text.trim_start().parse().expect("magnitude parses");
        prop_assert_eq!(parsed, weight.abs());
    });
}

#[test]
fn prop_plate_is_a_suffix_right_justified() {
    proptest!(|(plate in "[A-Z0-9]{0,12}")| {
        let packet = RequestPacket { display_plate: plate.clone(), ..RequestPacket::default() };
        let frame = packet.encode();

        let slot = std::str::from_utf8(&frame[11..17]).expect("plate slot is ASCII");
        let written = slot.trim_start_matches(' ');
        prop_assert!(plate.ends_with(written));
        prop_assert_eq!(written.len(), plate.len().min(6));
    });
}

#[test]
fn prop_relay_codec_is_a_bijection() {
    proptest!(|(bits in any::<u8>())| {
        let encoded = encode_relay(bits);

        // PROPERTY: both wire bytes stay inside the nibble alphabet
        for byte in encoded {
            prop_assert!((b'0'..=b'?').contains(&byte));
        }

        prop_assert_eq!(decode_relay(encoded).expect("alphabet bytes decode"), bits);
    });
}

#[test]
fn prop_relay_rejects_bytes_outside_the_alphabet() {
    proptest!(|(hi in any::<u8>(), lo in any::<u8>())| {
        let in_alphabet = |b: u8| (b'0'..=b'?').contains(&b);
        let result = decode_relay([hi, lo]);

        if in_alphabet(hi) && in_alphabet(lo) {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(result.is_err());
        }
    });
}
