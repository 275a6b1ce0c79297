//! Integration tests exercising the public TO0 client with the real
//! Ed25519/SHA-2 crypto adapter and in-memory storage.

use fdo_to0::adapters::crypto::Ed25519Crypto;
use fdo_to0::application::to0::{DispatchError, SessionPhase, To0Client};
use fdo_to0::core::cbor::{CodecError, Composite};
use fdo_to0::domain::voucher::{
    to1d_payload, TO0D_NONCE, TO0D_VOUCHER, TO0D_WAIT_SECONDS, TO0_TO0D, TO0_TO1D,
    TO1D_TO0D_HASH,
};
use fdo_to0::domain::{
    MessageError, MsgType, Nonce16, SM_BODY, SM_MSG_ID, SM_PROTOCOL_VERSION,
};
use fdo_to0::ports::crypto::{
    CryptoPort, HashAlg, KeyType, PublicKey, SIG_PAYLOAD,
};
use fdo_to0::test_support::{
    mk_accept_owner, mk_error, mk_hello_ack, mk_redirect, mk_voucher_extended,
    owner_public_body, MemStorage, TEST_PROTOCOL_VERSION,
};

fn mk_client() -> To0Client<MemStorage, Ed25519Crypto> {
    To0Client::new(MemStorage::new(mk_voucher_extended()), Ed25519Crypto)
}

fn advance_past_hello(client: &mut To0Client<MemStorage, Ed25519Crypto>) {
    client.hello_message().unwrap();
}

#[test]
fn hello_message_shape() {
    let mut client = mk_client();
    let out = client.hello_message().unwrap();
    assert!(!out.completed);
    assert_eq!(out.reply.get_uint(SM_MSG_ID).unwrap(), u64::from(MsgType::Hello));
    assert_eq!(
        out.reply.get_uint(SM_PROTOCOL_VERSION).unwrap(),
        TEST_PROTOCOL_VERSION
    );
    assert!(out.reply.get_composite(SM_BODY).unwrap().is_empty());
}

#[test]
fn hello_ack_with_zero_nonce_produces_bound_owner_sign() {
    let mut client = mk_client();
    advance_past_hello(&mut client);

    let out = client.dispatch(&mk_hello_ack(&[0u8; 16])).unwrap();
    assert!(!out.completed);
    assert_eq!(out.reply.get_uint(SM_MSG_ID).unwrap(), u64::from(MsgType::OwnerSign));

    let body = out.reply.get_composite(SM_BODY).unwrap();
    assert_eq!(body.len(), 2);

    // TO0D exactly reproduces {voucher, requested wait, nonce}.
    let to0d = body.get_composite(TO0_TO0D).unwrap();
    let voucher = mk_voucher_extended();
    assert_eq!(to0d.get_composite(TO0D_VOUCHER).unwrap(), voucher.as_composite());
    assert_eq!(to0d.get_uint(TO0D_WAIT_SECONDS).unwrap(), 3600);
    assert_eq!(to0d.get_bytes(TO0D_NONCE).unwrap(), &[0u8; 16]);

    // The signed payload is the TO1D binding the redirect to this TO0D's
    // hash; the hash algorithm follows the manufacturer key (Ed25519 →
    // SHA-256).
    let crypto = Ed25519Crypto;
    let expected_hash = crypto
        .hash(HashAlg::Sha256, &to0d.to_bytes().unwrap())
        .unwrap();
    let expected_to1d = to1d_payload(mk_redirect(), expected_hash.to_composite());

    let signed = body.get_composite(TO0_TO1D).unwrap();
    let payload = Composite::from_bytes(signed.get_bytes(SIG_PAYLOAD).unwrap()).unwrap();
    assert_eq!(payload, expected_to1d);
    assert_eq!(
        payload.get_composite(TO1D_TO0D_HASH).unwrap(),
        &expected_hash.to_composite()
    );

    // The blob verifies under the owner public key from the voucher chain.
    let owner = PublicKey {
        key_type: KeyType::Ed25519,
        body: owner_public_body().to_vec(),
    };
    crypto.verify(signed, &owner).unwrap();
}

#[test]
fn to0d_hash_binds_to_the_exact_nonce() {
    let hash_for = |nonce: [u8; 16]| {
        let mut client = mk_client();
        advance_past_hello(&mut client);
        let out = client.dispatch(&mk_hello_ack(&nonce)).unwrap();
        let body = out.reply.get_composite(SM_BODY).unwrap();
        let signed = body.get_composite(TO0_TO1D).unwrap();
        let payload = Composite::from_bytes(signed.get_bytes(SIG_PAYLOAD).unwrap()).unwrap();
        payload.get_composite(TO1D_TO0D_HASH).unwrap().clone()
    };
    assert_ne!(hash_for([0u8; 16]), hash_for([1u8; 16]));
}

#[test]
fn bad_nonce_length_fails_before_any_key_acquisition() {
    for len in [0usize, 15, 17, 32] {
        let mut client = mk_client();
        advance_past_hello(&mut client);
        let err = client.dispatch(&mk_hello_ack(&vec![0u8; len])).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Message(MessageError::LengthMismatch { expected: 16, .. })
        ));
        assert_eq!(client.phase(), SessionPhase::Failed);
        assert_eq!(client.storage().key_requests, 0);
    }
}

#[test]
fn missing_owner_key_is_a_dispatch_fault_with_no_reply() {
    let mut client = To0Client::new(
        MemStorage::new(mk_voucher_extended()).without_owner_key(),
        Ed25519Crypto,
    );
    advance_past_hello(&mut client);
    let err = client.dispatch(&mk_hello_ack(&[0u8; 16])).unwrap_err();
    assert!(matches!(err, DispatchError::KeyUnavailable));
    assert_eq!(client.phase(), SessionPhase::Failed);
    // The handler was bracketed open but never completed its leg.
    assert_eq!(
        client.storage().events,
        vec!["starting", "started", "starting"]
    );
    assert_eq!(client.storage().key_requests, 1);
}

#[test]
fn accept_owner_stores_granted_wait_and_completes() {
    let mut client = mk_client();
    advance_past_hello(&mut client);
    client.dispatch(&mk_hello_ack(&[0u8; 16])).unwrap();

    let out = client.dispatch(&mk_accept_owner(3600)).unwrap();
    assert!(out.completed);
    assert!(out.reply.is_empty());
    assert_eq!(client.phase(), SessionPhase::Done);
    assert_eq!(client.storage().response_wait, Some(3600));
}

#[test]
fn accept_owner_accepts_u32_boundary() {
    let mut client = mk_client();
    advance_past_hello(&mut client);
    client.dispatch(&mk_hello_ack(&[0u8; 16])).unwrap();
    client.dispatch(&mk_accept_owner(i64::from(u32::MAX))).unwrap();
    assert_eq!(client.storage().response_wait, Some(u32::MAX));
}

#[test]
fn accept_owner_rejects_wait_beyond_u32_without_storing() {
    let mut client = mk_client();
    advance_past_hello(&mut client);
    client.dispatch(&mk_hello_ack(&[0u8; 16])).unwrap();

    let err = client.dispatch(&mk_accept_owner(4_294_967_296)).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Message(MessageError::WaitOutOfRange { value: 4_294_967_296 })
    ));
    assert_eq!(client.storage().response_wait, None);
    assert_eq!(client.phase(), SessionPhase::Failed);
}

#[test]
fn accept_owner_rejects_extra_body_fields() {
    let mut client = mk_client();
    advance_past_hello(&mut client);
    client.dispatch(&mk_hello_ack(&[0u8; 16])).unwrap();

    let request = mk_accept_owner(60).set(
        SM_BODY,
        Composite::new_array().set(0, 60u32).set(1, 61u32),
    );
    let err = client.dispatch(&request).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Codec(CodecError::ExtraFields { max: 1, len: 2 })
    ));
    assert_eq!(client.storage().response_wait, None);
}

#[test]
fn accept_owner_rejects_empty_body() {
    let mut client = mk_client();
    advance_past_hello(&mut client);
    client.dispatch(&mk_hello_ack(&[0u8; 16])).unwrap();

    let request = mk_accept_owner(60).set(SM_BODY, Composite::new_array());
    let err = client.dispatch(&request).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Codec(CodecError::Absent { index: 0, .. })
    ));
}

#[test]
fn unknown_tag_fails_dispatch() {
    let mut client = mk_client();
    advance_past_hello(&mut client);
    let request = mk_hello_ack(&[0u8; 16]).set(SM_MSG_ID, 99u32);
    assert!(matches!(
        client.dispatch(&request),
        Err(DispatchError::Unsupported(99))
    ));
}

#[test]
fn peer_error_terminates_session() {
    let mut client = mk_client();
    advance_past_hello(&mut client);
    let out = client.dispatch(&mk_error()).unwrap();
    assert!(out.completed);
    assert!(out.reply.is_empty());
    assert_eq!(client.phase(), SessionPhase::Failed);
    assert_eq!(
        client.storage().events,
        vec!["starting", "started", "failed"]
    );
}

#[test]
fn random_nonces_drive_distinct_registrations() {
    let mut rng = rand::rngs::OsRng;
    let n1 = Nonce16::random(&mut rng);
    let n2 = Nonce16::random(&mut rng);
    assert_ne!(n1, n2);

    let mut client = mk_client();
    advance_past_hello(&mut client);
    let out = client.dispatch(&mk_hello_ack(n1.as_ref())).unwrap();
    let body = out.reply.get_composite(SM_BODY).unwrap();
    let to0d = body.get_composite(TO0_TO0D).unwrap();
    assert_eq!(to0d.get_bytes(TO0D_NONCE).unwrap(), n1.as_ref());
}

#[test]
fn byte_level_interface_runs_the_full_flow() {
    let mut client = mk_client();
    let hello = client.hello_bytes().unwrap();
    let hello = Composite::from_bytes(&hello).unwrap();
    assert_eq!(hello.get_uint(SM_MSG_ID).unwrap(), u64::from(MsgType::Hello));

    let (reply, done) = client
        .dispatch_bytes(&mk_hello_ack(&[0u8; 16]).to_bytes().unwrap())
        .unwrap();
    assert!(!done);
    let reply = Composite::from_bytes(&reply).unwrap();
    assert_eq!(reply.get_uint(SM_MSG_ID).unwrap(), u64::from(MsgType::OwnerSign));

    let (reply, done) = client
        .dispatch_bytes(&mk_accept_owner(120).to_bytes().unwrap())
        .unwrap();
    assert!(done);
    assert!(Composite::from_bytes(&reply).unwrap().is_empty());
    assert_eq!(client.storage().response_wait, Some(120));
}

#[test]
fn owner_sign_envelope_round_trips_through_bytes() {
    let mut client = mk_client();
    advance_past_hello(&mut client);
    let out = client.dispatch(&mk_hello_ack(&[9u8; 16])).unwrap();

    let bytes = out.reply.to_bytes().unwrap();
    let parsed = Composite::from_bytes(&bytes).unwrap();
    assert_eq!(parsed, out.reply);
    assert_eq!(parsed.to_bytes().unwrap(), bytes);
}
