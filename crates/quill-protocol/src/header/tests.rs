//! Unit tests for header packing.

use rstest::rstest;

use super::*;

#[rstest]
fn round_trips_every_field_combination(
    #[values(Source::Host, Source::Plugin)] source: Source,
    #[values(MessageKind::Request, MessageKind::Response)] kind: MessageKind,
) {
    for action in u8::MIN..=u8::MAX {
        let header = Header::encode(source, kind, action);
        let fields = header.decode().expect("encoded header decodes");
        assert_eq!(fields.source, source);
        assert_eq!(fields.kind, kind);
        assert_eq!(fields.action, action);
    }
}

#[rstest]
fn encode_never_sets_reserved_bits(
    #[values(Source::Host, Source::Plugin)] source: Source,
    #[values(MessageKind::Request, MessageKind::Response)] kind: MessageKind,
) {
    for action in u8::MIN..=u8::MAX {
        let header = Header::encode(source, kind, action);
        assert_eq!(header.reserved_bits(), 0);
        assert_eq!(header.raw() & !FIELD_MASK, 0);
    }
}

#[rstest]
#[case(0x0001_0000)]
#[case(0x8000_0000)]
#[case(0xFFFF_0000)]
#[case(0x1234_0000)]
fn reserved_bits_are_ignored_on_decode(#[case] reserved: u32) {
    let clean = Header::encode(Source::Plugin, MessageKind::Response, Action::Suggest.code());
    let noisy = Header::from_raw(clean.raw() | reserved);

    assert_eq!(noisy.reserved_bits(), reserved);
    assert_eq!(
        noisy.decode().expect("noisy header decodes"),
        clean.decode().expect("clean header decodes")
    );
}

#[test]
fn field_positions_match_the_documented_layout() {
    let header = Header::encode(Source::Host, MessageKind::Request, Action::Spell.code());
    assert_eq!(header.raw(), 0x0000_0312);
}

#[test]
fn rejects_unknown_source_nibble() {
    let header = Header::from_raw(0x0000_0413);
    assert!(matches!(
        header.decode(),
        Err(HeaderError::UnknownSource { code: 3 })
    ));
}

#[test]
fn rejects_unknown_kind_nibble() {
    let header = Header::from_raw(0x0000_0401);
    assert!(matches!(
        header.decode(),
        Err(HeaderError::UnknownKind { code: 0 })
    ));
}

#[test]
fn action_codes_resolve_to_the_closed_set() {
    for action in Action::ALL {
        assert_eq!(Action::try_from(action.code()).ok(), Some(action));
    }
    assert!(matches!(
        Action::try_from(0),
        Err(HeaderError::UnknownAction { code: 0 })
    ));
    assert!(matches!(
        Action::try_from(200),
        Err(HeaderError::UnknownAction { code: 200 })
    ));
}

#[test]
fn fields_expose_typed_action() {
    let header = Header::encode(Source::Plugin, MessageKind::Response, 6);
    let fields = header.decode().expect("decodes");
    assert_eq!(fields.action().ok(), Some(Action::NotifyReverted));
}
