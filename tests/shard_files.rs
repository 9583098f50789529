//! Object round-trip through persisted shard files
//!
//! Exercises the application pattern the padding region exists for: an
//! object plus an 8-byte length prefix replicated into every shard's
//! padding, shards persisted as plain headerless byte files, one file
//! destroyed, the set repaired and the object reassembled.

use reed_solomon_8::Encoder;
use std::fs;

const OBJECT_LEN: usize = 12_345;
const DATA_SHARDS: u8 = 17;
const PARITY_SHARDS: u8 = 3;

fn object_bytes() -> Vec<u8> {
    (0..OBJECT_LEN).map(|i| (i * 7 + i / 251) as u8).collect()
}

#[test]
fn length_prefix_roundtrip_through_files() {
    let object = object_bytes();
    let encoder = Encoder::new(DATA_SHARDS, PARITY_SHARDS).unwrap();
    let mut buffer = encoder.allocate_from_object_size_padded(OBJECT_LEN, 8);
    assert_eq!(buffer.padding_size(), 16);
    let payload = buffer.payload_size();
    let padding = buffer.padding_size();

    // Length prefix into every shard's padding, object bytes across the
    // data shard payload regions.
    for i in 0..encoder.shard_count() {
        buffer.shard_mut(i)[..8].copy_from_slice(&(OBJECT_LEN as u64).to_le_bytes());
    }
    for (i, chunk) in object.chunks(payload).enumerate() {
        buffer.shard_mut(i)[padding..padding + chunk.len()].copy_from_slice(chunk);
    }
    encoder.encode(&mut buffer).unwrap();
    assert!(encoder.verify(&buffer).unwrap());

    // Persist every shard as a bare byte stream.
    let dir = tempfile::tempdir().unwrap();
    for i in 0..encoder.shard_count() {
        fs::write(dir.path().join(format!("{}.shard", i)), buffer.shard(i)).unwrap();
    }

    // Reload into a fresh buffer, losing shard 3 entirely.
    let shard_size = fs::metadata(dir.path().join("0.shard")).unwrap().len() as usize;
    assert_eq!(shard_size, buffer.shard_size());
    let mut reloaded = encoder.allocate_from_shard_size_padded(shard_size, 8);
    let mut present = vec![true; encoder.shard_count()];
    for i in 0..encoder.shard_count() {
        if i == 3 {
            present[i] = false; // file destroyed; shard stays zeroed
            continue;
        }
        let bytes = fs::read(dir.path().join(format!("{}.shard", i))).unwrap();
        reloaded.shard_mut(i).copy_from_slice(&bytes);
    }
    assert!(!encoder.verify(&reloaded).unwrap());

    encoder.repair(&mut reloaded, &present).unwrap();
    assert!(encoder.verify(&reloaded).unwrap());

    // Parity covers the payload only; the repaired shard's padding is
    // application state and gets re-stamped from any surviving shard.
    let recovered_len =
        u64::from_le_bytes(reloaded.shard(0)[..8].try_into().unwrap()) as usize;
    assert_eq!(recovered_len, OBJECT_LEN);
    let stamp = (recovered_len as u64).to_le_bytes();
    reloaded.shard_mut(3)[..8].copy_from_slice(&stamp);
    for i in 0..encoder.shard_count() {
        assert_eq!(
            u64::from_le_bytes(reloaded.shard(i)[..8].try_into().unwrap()),
            OBJECT_LEN as u64,
            "length prefix in shard {}",
            i
        );
    }

    // Reassemble the object from the data shard payloads.
    let mut reassembled = Vec::with_capacity(recovered_len);
    for i in 0..encoder.data_shard_count() {
        let take = payload.min(recovered_len - reassembled.len());
        reassembled.extend_from_slice(&reloaded.shard(i)[padding..padding + take]);
        if reassembled.len() == recovered_len {
            break;
        }
    }
    assert_eq!(reassembled, object);
}

#[test]
fn persisted_shards_carry_no_framing() {
    // A shard file is exactly shard_size bytes of payload-region content;
    // nothing is prepended or appended by the coding layer.
    let encoder = Encoder::new(2, 1).unwrap();
    let mut buffer = encoder.allocate_from_object_size(64);
    buffer.shard_mut(0).fill(0x11);
    buffer.shard_mut(1).fill(0x22);
    encoder.encode(&mut buffer).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("0.shard");
    fs::write(&path, buffer.shard(0)).unwrap();
    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len(), buffer.shard_size());
    assert_eq!(bytes, buffer.shard(0));
}
