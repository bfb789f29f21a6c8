//! Integration tests for the one-shot and streaming codecs.
//!
//! Every encrypt/decrypt pays the full scrypt cost, so property tests run a
//! small number of cases.

use std::io::Cursor;

use cbx_crypto::{CodecError, NonceSchedule, Params, NONCE_SIZE, SALT_SIZE, TAG_SIZE};
use proptest::prelude::*;
use rand::RngCore;

const STREAM_HEADER_LEN: usize = SALT_SIZE + NONCE_SIZE;

fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}

fn random_params() -> Params {
    Params::with_key(random_bytes(32)).expect("params")
}

fn stream_encrypt(params: &Params, data: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut wire = Vec::new();
    params
        .stream_encrypt(Cursor::new(data), &mut wire, chunk_size)
        .expect("stream encrypt");
    wire
}

fn stream_decrypt(
    params: &Params,
    wire: &[u8],
    chunk_size: usize,
) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    params.stream_decrypt(Cursor::new(wire), &mut out, chunk_size)?;
    Ok(out)
}

#[test]
fn one_shot_random_3200_bytes() {
    let data = random_bytes(3200);
    let params = random_params();

    let frame = params.encrypt(&data).expect("encrypt");
    let decrypted = params.decrypt(&frame).expect("decrypt");

    assert_eq!(decrypted, data, "decrypted data must match original");
}

#[test]
fn stream_random_320000_bytes_in_10k_chunks() {
    let data = random_bytes(320_000);
    let params = random_params();
    let chunk_size = 1024 * 10;

    let mut wire = Vec::new();
    let summary = params
        .stream_encrypt(Cursor::new(&data), &mut wire, chunk_size)
        .expect("stream encrypt");

    // 31 full chunks of 10240 plus one of 2560
    assert_eq!(summary.chunks, 32);
    assert_eq!(wire.len(), STREAM_HEADER_LEN + data.len() + 32 * TAG_SIZE);

    let mut decrypted = Vec::new();
    let back = params
        .stream_decrypt(Cursor::new(&wire), &mut decrypted, chunk_size)
        .expect("stream decrypt");

    assert_eq!(back.chunks, 32);
    assert_eq!(decrypted, data, "decrypted stream must match original");
}

#[test]
fn mismatched_chunk_size_fails_authentication() {
    let data = random_bytes(4096);
    let params = random_params();
    let wire = stream_encrypt(&params, &data, 1024);

    // Smaller: the first read stops mid-chunk.
    let err = stream_decrypt(&params, &wire, 512).unwrap_err();
    assert!(err.is_authentication(), "got {err:?}");

    // Larger: the first read swallows a chunk boundary.
    let err = stream_decrypt(&params, &wire, 2048).unwrap_err();
    assert!(err.is_authentication(), "got {err:?}");
}

#[test]
fn single_chunk_stream_tolerates_larger_decrypt_chunk() {
    // With one chunk on the wire there is no boundary to misalign.
    let data = random_bytes(100);
    let params = random_params();
    let wire = stream_encrypt(&params, &data, 1024);

    assert_eq!(stream_decrypt(&params, &wire, 4096).unwrap(), data);
}

#[test]
fn short_key_rejected_by_every_operation() {
    let params = Params::with_key(random_bytes(31)).expect("params");
    let is_short_key = |e: &CodecError| {
        matches!(
            e,
            CodecError::ShortKey {
                expected: 32,
                actual: 31
            }
        )
    };

    assert!(is_short_key(&params.encrypt(b"data").unwrap_err()));
    assert!(is_short_key(&params.decrypt(&[0u8; 128]).unwrap_err()));

    let mut out = Vec::new();
    let err = params
        .stream_encrypt(Cursor::new(b"data"), &mut out, 64)
        .unwrap_err();
    assert!(is_short_key(&err));
    assert!(out.is_empty());

    let err = params
        .stream_decrypt(Cursor::new(vec![0u8; 128]), &mut out, 64)
        .unwrap_err();
    assert!(is_short_key(&err));
    assert!(out.is_empty());
}

#[test]
fn custom_key_size_uses_key_prefix() {
    // Only key[..key_size] feeds the KDF, so trailing bytes do not matter.
    let long = Params::builder()
        .key_size(16)
        .key(b"0123456789abcdefTRAILING".to_vec())
        .build()
        .unwrap();
    let exact = Params::builder()
        .key_size(16)
        .key(b"0123456789abcdef".to_vec())
        .build()
        .unwrap();

    let frame = long.encrypt(b"prefix only").unwrap();
    assert_eq!(exact.decrypt(&frame).unwrap(), b"prefix only");
}

#[test]
fn truncated_one_shot_frame() {
    let params = random_params();
    let frame = params.encrypt(&random_bytes(64)).unwrap();

    for cut in [1, 16, 64, frame.len() - 4] {
        let err = params.decrypt(&frame[..frame.len() - cut]).unwrap_err();
        assert!(matches!(err, CodecError::Truncated(_)), "cut {cut}: {err:?}");
    }
}

#[test]
fn one_shot_tamper_detection_sampled() {
    let params = random_params();
    let frame = params.encrypt(b"attack at dawn").unwrap();
    let sealed_start = 4 + NONCE_SIZE + SALT_SIZE;

    for i in [sealed_start, sealed_start + 7, frame.len() - TAG_SIZE, frame.len() - 1] {
        let mut tampered = frame.clone();
        tampered[i] ^= 0x01;
        let err = params.decrypt(&tampered).unwrap_err();
        assert!(err.is_authentication(), "flip at byte {i} must fail");
    }
}

#[test]
fn stream_tamper_detection_per_chunk() {
    let params = random_params();
    let chunk_size = 256;
    let data = random_bytes(chunk_size * 3 + 10);
    let wire = stream_encrypt(&params, &data, chunk_size);

    let sealed_chunk = chunk_size + TAG_SIZE;
    for chunk in 0..4 {
        let i = STREAM_HEADER_LEN + chunk * sealed_chunk + 3;
        let mut tampered = wire.clone();
        tampered[i] ^= 0x10;
        let err = stream_decrypt(&params, &tampered, chunk_size).unwrap_err();
        assert!(err.is_authentication(), "chunk {chunk} tamper must fail");
    }
}

#[test]
fn wrong_key_indistinguishable_from_tamper() {
    let data = random_bytes(512);
    let frame = random_params().encrypt(&data).unwrap();
    let wire = stream_encrypt(&random_params(), &data, 128);

    let other = random_params();
    assert!(other.decrypt(&frame).unwrap_err().is_authentication());
    assert!(stream_decrypt(&other, &wire, 128).unwrap_err().is_authentication());
}

#[test]
fn params_shared_across_threads() {
    let params = &random_params();
    let data = &random_bytes(2048);

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..3)
            .map(|_| {
                s.spawn(move || {
                    let frame = params.encrypt(data).unwrap();
                    params.decrypt(&frame).unwrap()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(&h.join().unwrap(), data);
        }
    });
}

#[test]
fn per_chunk_schedule_roundtrip() {
    let params = Params::builder()
        .key(random_bytes(32))
        .stream_nonce(NonceSchedule::PerChunk)
        .build()
        .unwrap();
    let data = random_bytes(10_000);

    let wire = stream_encrypt(&params, &data, 1000);
    assert_eq!(wire.len(), STREAM_HEADER_LEN + 10_000 + 10 * TAG_SIZE);
    assert_eq!(stream_decrypt(&params, &wire, 1000).unwrap(), data);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(6))]

    #[test]
    fn one_shot_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..=2048)) {
        let params = Params::with_key(vec![7u8; 32]).unwrap();
        let frame = params.encrypt(&data).unwrap();
        prop_assert_eq!(frame.len(), 4 + NONCE_SIZE + SALT_SIZE + data.len() + TAG_SIZE);
        let out = params.decrypt(&frame).unwrap();
        prop_assert_eq!(out, data, "round-trip must be identical");
    }

    #[test]
    fn stream_roundtrip(
        data in proptest::collection::vec(any::<u8>(), 0..=4096),
        chunk_size in 1usize..=1500,
    ) {
        let params = Params::with_key(vec![7u8; 32]).unwrap();
        let wire = stream_encrypt(&params, &data, chunk_size);
        let chunks = data.len().div_ceil(chunk_size);
        prop_assert_eq!(wire.len(), STREAM_HEADER_LEN + data.len() + chunks * TAG_SIZE);
        let out = stream_decrypt(&params, &wire, chunk_size).unwrap();
        prop_assert_eq!(out, data, "round-trip must be identical");
    }
}
