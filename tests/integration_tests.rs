//! Integration tests for keyrec
//!
//! These tests verify end-to-end stream behavior and wire compatibility.

#![cfg(all(feature = "std", feature = "protobuf"))]

use std::io::{self, Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use keyrec::*;
use proptest::prelude::*;

#[derive(Clone, PartialEq, prost::Message)]
struct User {
    #[prost(int64, tag = "1")]
    id: i64,
    #[prost(string, tag = "2")]
    name: String,
}

type UserCodec = KeyedCodec<Protobuf<User>>;

fn user(id: i64, name: &str) -> User {
    User {
        id,
        name: name.to_string(),
    }
}

/// Protobuf marshaler that counts calls
#[derive(Clone, Default)]
struct Counting {
    marshals: Arc<AtomicUsize>,
    unmarshals: Arc<AtomicUsize>,
}

impl Marshaler for Counting {
    type Value = User;

    fn marshal(&self, value: &User) -> keyrec::Result<Vec<u8>> {
        self.marshals.fetch_add(1, Ordering::SeqCst);
        Protobuf::<User>::new().marshal(value)
    }

    fn unmarshal(&self, bytes: &[u8]) -> keyrec::Result<User> {
        self.unmarshals.fetch_add(1, Ordering::SeqCst);
        Protobuf::<User>::new().unmarshal(bytes)
    }
}

fn user_stream(count: usize) -> Vec<u8> {
    let mut writer = KeyedRecordWriter::new(Vec::new(), UserCodec::protobuf());
    for i in 0..count {
        let key = format!("user:{i}");
        let name = "x".repeat(i % 300);
        writer
            .write_kv(key.as_bytes(), &user(i as i64, &name))
            .unwrap();
    }
    writer.into_inner()
}

#[test]
fn test_user_record_scenario() {
    let codec = UserCodec::protobuf();
    let value = codec.marshal_val(&user(42, "abc")).unwrap();
    let payload = codec.join_kv(b"user:42", &value);

    let (key, value_bytes) = codec.split_kv(&payload).unwrap();
    assert_eq!(key, b"user:42");
    assert_eq!(codec.unmarshal_val(value_bytes).unwrap(), user(42, "abc"));

    // Bit-exact layout: key length, key, protobuf fields 1 and 2
    assert_eq!(
        payload,
        [
            &[0x07][..],
            &b"user:42"[..],
            &[0x08, 0x2A, 0x12, 0x03][..],
            &b"abc"[..],
        ]
        .concat()
    );
}

#[test]
fn test_scan_typed_records() {
    let data = user_stream(10);
    let mut scanner = KeyedRecordScanner::new(Cursor::new(data), UserCodec::protobuf());

    let mut seen = 0;
    while scanner.advance() {
        let record = scanner.record().unwrap();
        let expected_key = format!("user:{seen}");
        assert_eq!(record.key_str().unwrap(), expected_key);
        assert_eq!(record.value().unwrap().id, seen as i64);
        seen += 1;
    }
    assert_eq!(seen, 10);
    assert!(scanner.err().is_none());
}

#[test]
fn test_passthrough_thousand_records_identical() {
    let input = user_stream(1_000);

    let counting = Counting::default();
    let codec = KeyedCodec::new(counting.clone());
    let mut scanner = KeyedRecordScanner::new(Cursor::new(&input), codec.clone());
    let mut writer = KeyedRecordWriter::new(Vec::new(), codec);

    while scanner.advance() {
        writer.write(scanner.record().unwrap()).unwrap();
    }
    assert!(scanner.err().is_none());

    assert_eq!(writer.records_written(), 1_000);
    assert_eq!(writer.passthrough_count(), 1_000);
    assert_eq!(counting.marshals.load(Ordering::SeqCst), 0);
    assert_eq!(counting.unmarshals.load(Ordering::SeqCst), 0);
    assert_eq!(writer.into_inner(), input);
}

#[test]
fn test_read_values_still_pass_through() {
    let input = user_stream(50);

    let counting = Counting::default();
    let codec = KeyedCodec::new(counting.clone());
    let mut scanner = KeyedRecordScanner::new(Cursor::new(&input), codec.clone());
    let mut writer = KeyedRecordWriter::new(Vec::new(), codec);

    while scanner.advance() {
        let record = scanner.record().unwrap();
        record.value().unwrap();
        record.value().unwrap();
        writer.write(record).unwrap();
    }

    assert_eq!(counting.unmarshals.load(Ordering::SeqCst), 50);
    assert_eq!(counting.marshals.load(Ordering::SeqCst), 0);
    assert_eq!(writer.into_inner(), input);
}

#[test]
fn test_modified_records_are_reencoded() {
    let input = user_stream(20);

    let counting = Counting::default();
    let codec = KeyedCodec::new(counting.clone());
    let mut scanner = KeyedRecordScanner::new(Cursor::new(&input), codec.clone());
    let mut writer = KeyedRecordWriter::new(Vec::new(), codec);

    while scanner.advance() {
        let record = scanner.record().unwrap();
        if record.value().unwrap().id % 2 == 0 {
            record.value_mut().unwrap().name = "renamed".to_string();
        }
        writer.write(record).unwrap();
    }
    assert_eq!(writer.passthrough_count(), 10);
    assert_eq!(counting.marshals.load(Ordering::SeqCst), 10);

    let output = writer.into_inner();
    let mut check = KeyedRecordScanner::new(Cursor::new(output), UserCodec::protobuf());
    for result in check.records() {
        let (_, value) = result.unwrap().into_parts().unwrap();
        if value.id % 2 == 0 {
            assert_eq!(value.name, "renamed");
        } else {
            assert_eq!(value.name, "x".repeat(value.id as usize));
        }
    }
}

#[test]
fn test_without_passthrough_normalizes() {
    let input = user_stream(5);
    let codec = UserCodec::protobuf().without_passthrough();
    let mut scanner = KeyedRecordScanner::new(Cursor::new(&input), codec);
    let mut writer = KeyedRecordWriter::new(Vec::new(), codec);

    while scanner.advance() {
        writer.write(scanner.record().unwrap()).unwrap();
    }
    assert_eq!(writer.passthrough_count(), 0);
    // prost output is canonical, so re-encoding reproduces the input
    assert_eq!(writer.into_inner(), input);
}

#[test]
fn test_truncated_trailing_bytes() {
    let mut data = user_stream(3);
    // Declares a 10-byte chunk but only 3 payload bytes follow
    data.extend_from_slice(&[0x0A, 0x01, b'k', 0x08]);

    let mut scanner = KeyedRecordScanner::new(Cursor::new(data), UserCodec::protobuf());
    assert!(scanner.advance());
    assert!(scanner.advance());
    assert!(scanner.advance());
    assert!(!scanner.advance());
    assert!(!scanner.advance());

    let err = scanner.err().unwrap();
    assert!(matches!(err, Error::Truncated));
    assert_eq!(err.class(), ErrorClass::Framing);
    assert!(matches!(scanner.record(), Err(Error::NoRecord)));
}

#[test]
fn test_decode_error_skippable() {
    let mut writer = ChunkWriter::new(Vec::new());
    let good = UserCodec::protobuf();
    writer
        .write(&good.join_kv(b"a", &good.marshal_val(&user(1, "a")).unwrap()))
        .unwrap();
    // Field 2 claims 50 bytes of string
    writer.write(&good.join_kv(b"bad", &[0x12, 0x32])).unwrap();
    writer
        .write(&good.join_kv(b"c", &good.marshal_val(&user(3, "c")).unwrap()))
        .unwrap();

    let mut scanner = KeyedRecordScanner::new(Cursor::new(writer.into_inner()), good);
    let mut ids = Vec::new();
    let mut skipped = Vec::new();
    while scanner.advance() {
        let record = scanner.record().unwrap();
        match record.value().map(|value| value.id) {
            Ok(id) => ids.push(id),
            Err(err) => {
                assert_eq!(err.class(), ErrorClass::Decode);
                skipped.push(record.key().unwrap().to_vec());
            }
        }
    }
    assert_eq!(ids, [1, 3]);
    assert_eq!(skipped, [b"bad".to_vec()]);
    assert!(scanner.err().is_none());
}

/// Reader that scribbles over the caller's buffer on every read
struct Scribbler {
    inner: Cursor<Vec<u8>>,
}

impl Read for Scribbler {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        buf.fill(0xEE);
        self.inner.read(buf)
    }
}

#[test]
fn test_records_independent_of_scan_buffer() {
    let mut writer = KeyedRecordWriter::new(Vec::new(), KeyedCodec::raw());
    for i in 0..8u8 {
        writer.write_kv(&[b'k', i], &vec![i; 32]).unwrap();
    }
    let data = writer.into_inner();

    let mut scanner = KeyedRecordScanner::new(
        Scribbler {
            inner: Cursor::new(data),
        },
        KeyedCodec::raw(),
    );
    let mut kept = Vec::new();
    while scanner.advance() {
        kept.push(scanner.take_record().unwrap());
    }
    assert!(scanner.err().is_none());

    for (i, record) in kept.iter_mut().enumerate() {
        let (key, value) = record.key_value().unwrap();
        assert_eq!(key, [b'k', i as u8]);
        assert_eq!(value, &vec![i as u8; 32]);
    }
}

#[cfg(feature = "lz4")]
#[test]
fn test_transcode_to_compressed_values() {
    let input = user_stream(30);
    let mut scanner = KeyedRecordScanner::new(Cursor::new(&input), UserCodec::protobuf());
    let lz4 = KeyedCodec::new(Lz4(Protobuf::<User>::new()));
    let mut writer = KeyedRecordWriter::new(Vec::new(), lz4);
    while scanner.advance() {
        writer.write_from(scanner.record().unwrap()).unwrap();
    }

    let mut back = KeyedRecordScanner::new(Cursor::new(writer.into_inner()), lz4);
    let mut n = 0;
    for result in back.records() {
        let mut record = result.unwrap();
        assert_eq!(record.value().unwrap().id, n);
        n += 1;
    }
    assert_eq!(n, 30);
}

#[test]
fn test_varint_interop_with_prost() {
    // Outer and inner prefixes match protobuf's own varint encoding
    for len in [0usize, 1, 127, 128, 300, 16_384] {
        let key = vec![b'k'; len];
        let payload = keyrec::envelope::join(&key, b"");

        let mut expected = Vec::new();
        prost::encoding::encode_varint(len as u64, &mut expected);
        assert_eq!(&payload[..expected.len()], &expected[..]);
        assert_eq!(varint::encoded_len(len as u64), expected.len());
    }
}

proptest! {
    #[test]
    fn prop_split_join_roundtrip(
        key in proptest::collection::vec(any::<u8>(), 0..512),
        value in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let codec = KeyedCodec::raw();
        let payload = codec.join_kv(&key, &value);
        let (k, v) = codec.split_kv(&payload).unwrap();
        prop_assert_eq!(k, &key[..]);
        prop_assert_eq!(v, &value[..]);
    }

    #[test]
    fn prop_truncated_payload_never_panics(
        key in proptest::collection::vec(any::<u8>(), 1..64),
        value in proptest::collection::vec(any::<u8>(), 0..64),
        cut in 0usize..64,
    ) {
        let payload = keyrec::envelope::join(&key, &value);
        let cut = cut.min(payload.len());
        if let Ok((k, v)) = keyrec::envelope::split(&payload[..cut]) {
            prop_assert!(k.len() + v.len() < payload.len());
        }
    }

    #[test]
    fn prop_stream_passthrough_identity(
        records in proptest::collection::vec(
            (proptest::collection::vec(any::<u8>(), 0..40), any::<i64>(), "[a-z]{0,40}"),
            0..40,
        ),
    ) {
        let mut writer = KeyedRecordWriter::new(Vec::new(), UserCodec::protobuf());
        for (key, id, name) in &records {
            writer.write_kv(key, &user(*id, name)).unwrap();
        }
        let input = writer.into_inner();

        let mut scanner = KeyedRecordScanner::new(Cursor::new(&input), UserCodec::protobuf());
        let mut copy = KeyedRecordWriter::new(Vec::new(), UserCodec::protobuf());
        let mut seen = 0;
        while scanner.advance() {
            let record = scanner.record().unwrap();
            prop_assert_eq!(record.key().unwrap(), &records[seen].0[..]);
            copy.write(record).unwrap();
            seen += 1;
        }
        prop_assert!(scanner.err().is_none());
        prop_assert_eq!(seen, records.len());
        prop_assert_eq!(copy.into_inner(), input);
    }
}
