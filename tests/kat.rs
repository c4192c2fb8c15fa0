//! Known-answer tests against published vectors.
//!
//! The PDU byte strings come from agent captures; the key-derivation vectors
//! are RFC 3414 Appendix A.3. Byte-exact output is the interoperability
//! contract, so these tests compare whole encodings, not round-trips.

use bytes::Bytes;
use snmp_client::v3::auth::{self, LocalizedKey};
use snmp_client::v3::AuthProtocol;
use snmp_client::{oid, CommunityMessage, Pdu, PduType, Value, VarBind, Version};

/// GET request: version 0, community "public", request-id 16170, one null
/// varbind on 1.3.6.1.2.1.1.1.0.
const GET_REQUEST_WIRE: &[u8] = &[
    0x30, 0x27, // SEQUENCE
    0x02, 0x01, 0x00, // version 0 (v1)
    0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', // community
    0xA0, 0x1A, // GetRequest
    0x02, 0x02, 0x3F, 0x2A, // request-id 16170
    0x02, 0x01, 0x00, // error-status
    0x02, 0x01, 0x00, // error-index
    0x30, 0x0E, // varbind list
    0x30, 0x0C, // varbind
    0x06, 0x08, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00, // OID
    0x05, 0x00, // NULL
];

/// Response: version 0, community "public", request-id 9999, one varbind
/// with value "test".
const RESPONSE_WIRE: &[u8] = &[
    0x30, 0x2B, // SEQUENCE
    0x02, 0x01, 0x00, // version 0 (v1)
    0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', // community
    0xA2, 0x1E, // Response
    0x02, 0x02, 0x27, 0x0F, // request-id 9999
    0x02, 0x01, 0x00, // error-status
    0x02, 0x01, 0x00, // error-index
    0x30, 0x12, // varbind list
    0x30, 0x10, // varbind
    0x06, 0x08, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00, // OID
    0x04, 0x04, b't', b'e', b's', b't', // OCTET STRING "test"
];

#[test]
fn get_request_encodes_to_known_bytes() {
    let pdu = Pdu::build(
        PduType::Get,
        Some(16170),
        0,
        0,
        vec![VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0))],
    )
    .unwrap();
    let message = CommunityMessage::new(Version::V1, &b"public"[..], pdu);

    assert_eq!(&message.encode()[..], GET_REQUEST_WIRE);
}

#[test]
fn response_decodes_from_known_bytes() {
    let message = CommunityMessage::decode(Bytes::from_static(RESPONSE_WIRE)).unwrap();

    assert_eq!(message.version, Version::V1);
    assert_eq!(&message.community[..], b"public");
    assert_eq!(message.pdu.pdu_type, PduType::Response);
    assert_eq!(message.pdu.request_id, 9999);
    assert_eq!(message.pdu.error_status, 0);
    assert_eq!(message.pdu.varbinds.len(), 1);
    assert_eq!(message.pdu.varbinds[0].oid, oid!(1, 3, 6, 1, 2, 1, 1, 1, 0));
    assert_eq!(message.pdu.varbinds[0].value.as_str(), Some("test"));
}

#[test]
fn known_wire_roundtrips_byte_exact() {
    let decoded = CommunityMessage::decode(Bytes::from_static(RESPONSE_WIRE)).unwrap();
    // The synthetic error varbind only appears for non-zero statuses, so a
    // clean response re-encodes to the identical bytes
    assert_eq!(&decoded.encode()[..], RESPONSE_WIRE);
}

#[test]
fn error_status_mapping_vectors() {
    let expected = [
        (1, "response_too_big"),
        (2, "no_such_name"),
        (3, "bad_value"),
        (4, "read_only"),
        (5, "generic_error"),
        (6, "access_denied"),
        (7, "wrong_type"),
        (8, "wrong_length"),
        (9, "wrong_encoding"),
        (10, "wrong_value"),
        (11, "no_creation"),
        (12, "inconsistent_value"),
        (13, "resource_unavailable"),
        (14, "commit_failed"),
        (15, "undo_failed"),
        (16, "authorization_error"),
        (17, "not_writable"),
        (18, "inconsistent_name"),
    ];
    for (status, name) in expected {
        let pdu = Pdu::build(PduType::Response, Some(1), status, 0, vec![]).unwrap();
        assert_eq!(
            pdu.varbinds[0].value,
            Value::Symbol(name.into()),
            "status {status}"
        );
    }

    let pdu = Pdu::build(PduType::Response, Some(1), 1234, 0, vec![]).unwrap();
    assert_eq!(
        pdu.varbinds[0].value,
        Value::Symbol("unknown_pdu_error_1234".into())
    );
}

// RFC 3414 Appendix A.3: password "maplesyrup", engine ID 00..0002

fn rfc_engine_id() -> [u8; 12] {
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2]
}

#[test]
fn rfc3414_md5_passkey() {
    assert_eq!(
        auth::passkey(AuthProtocol::Md5, b"maplesyrup"),
        [
            0x9f, 0xaf, 0x32, 0x83, 0x88, 0x4e, 0x92, 0x83, 0x4e, 0xbc, 0x98, 0x47, 0xd8, 0xed,
            0xd9, 0x63
        ]
    );
}

#[test]
fn rfc3414_sha1_passkey() {
    assert_eq!(
        auth::passkey(AuthProtocol::Sha1, b"maplesyrup"),
        [
            0x9f, 0xb5, 0xcc, 0x03, 0x81, 0x49, 0x7b, 0x37, 0x93, 0x52, 0x89, 0x39, 0xff, 0x78,
            0x8d, 0x5d, 0x79, 0x14, 0x52, 0x11
        ]
    );
}

#[test]
fn rfc3414_md5_localized_key() {
    let key = LocalizedKey::from_password(AuthProtocol::Md5, b"maplesyrup", &rfc_engine_id());
    assert_eq!(
        key.as_bytes(),
        [
            0x52, 0x6f, 0x5e, 0xed, 0x9f, 0xcc, 0xe2, 0x6f, 0x89, 0x64, 0xc2, 0x93, 0x07, 0x87,
            0xd8, 0x2b
        ]
    );
}

#[test]
fn rfc3414_sha1_localized_key() {
    let key = LocalizedKey::from_password(AuthProtocol::Sha1, b"maplesyrup", &rfc_engine_id());
    assert_eq!(
        key.as_bytes(),
        [
            0x66, 0x95, 0xfe, 0xbc, 0x92, 0x88, 0xe3, 0x62, 0x82, 0x23, 0x5f, 0xc7, 0x15, 0x1f,
            0x12, 0x84, 0x97, 0xb3, 0x8f, 0x3f
        ]
    );
}
