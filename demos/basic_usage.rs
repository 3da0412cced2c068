//! Basic usage example for keyrec
//!
//! Run with: cargo run --example basic_usage

use std::io::Cursor;
use std::time::Instant;

use keyrec::*;

#[derive(Clone, PartialEq, prost::Message)]
struct Trade {
    #[prost(uint32, tag = "1")]
    seq: u32,
    #[prost(int64, tag = "2")]
    price: i64,
    #[prost(uint32, tag = "3")]
    quantity: u32,
    #[prost(string, optional, tag = "4")]
    symbol: Option<String>,
}

type TradeCodec = KeyedCodec<Protobuf<Trade>>;

fn main() -> Result<()> {
    println!("keyrec Basic Usage Example");
    println!("==========================");

    // Example 1: Write a few keyed records
    println!("\n1. Writing Records:");
    let stream = {
        let mut writer = KeyedRecordWriter::new(Vec::new(), TradeCodec::protobuf());
        for seq in 1..=3u32 {
            let trade = Trade {
                seq,
                price: 50_000_000 + seq as i64 * 250_000,
                quantity: 100 * seq,
                symbol: Some("AAPL".to_string()),
            };
            let size = writer.write_kv(format!("trade:{seq}").as_bytes(), &trade)?;
            println!("  trade:{} -> {} bytes", seq, size);
        }
        writer.into_inner()
    };
    println!("  Stream is {} bytes", stream.len());

    // Example 2: Scan and decode
    println!("\n2. Scanning Records:");
    {
        let mut scanner = KeyedRecordScanner::new(Cursor::new(&stream), TradeCodec::protobuf());
        while scanner.advance() {
            let record = scanner.record()?;
            let key = record.key_str()?.to_string();
            let trade = record.value()?;
            println!(
                "  {}: seq={}, price={}, qty={}, symbol={:?}",
                key, trade.seq, trade.price, trade.quantity, trade.symbol
            );
        }
        assert!(scanner.err().is_none());
    }

    // Example 3: Copy with an edit; untouched records pass through
    println!("\n3. Passthrough Copy:");
    {
        let mut scanner = KeyedRecordScanner::new(Cursor::new(&stream), TradeCodec::protobuf());
        let mut writer = KeyedRecordWriter::new(Vec::new(), TradeCodec::protobuf());
        while scanner.advance() {
            let record = scanner.record()?;
            if record.key()? == b"trade:2" {
                record.value_mut()?.quantity = 0;
            }
            writer.write(record)?;
        }
        println!(
            "  {} records written, {} passed through unchanged",
            writer.records_written(),
            writer.passthrough_count()
        );
    }

    // Example 4: Envelope layout
    println!("\n4. Envelope Layout:");
    {
        let payload = envelope::join(b"user:42", b"\x08\x2a");
        println!("  Payload: {:02X?}", payload);

        let (key, value) = envelope::split(&payload)?;
        println!(
            "  Key: {:?}, value: {:02X?}",
            std::str::from_utf8(key).unwrap_or("?"),
            value
        );

        let mut chunks = ChunkWriter::new(Vec::new());
        chunks.write(&payload)?;
        println!("  Chunk:   {:02X?}", chunks.get_ref());
    }

    // Example 5: Damaged input
    println!("\n5. Truncated Stream:");
    {
        let cut = &stream[..stream.len() - 3];
        let mut scanner = KeyedRecordScanner::new(cut, TradeCodec::protobuf());
        let mut count = 0;
        while scanner.advance() {
            count += 1;
        }
        match scanner.err() {
            Some(err) => println!("  {} records, then {:?} error: {}", count, err.class(), err),
            None => println!("  {} records, clean end", count),
        }
    }

    // Example 6: Performance test
    println!("\n6. Performance Test:");
    {
        const RECORDS: usize = 100_000;
        let mut writer = KeyedRecordWriter::new(Vec::new(), KeyedCodec::raw());
        let value = vec![0xABu8; 64];
        for i in 0..RECORDS {
            writer.write_kv(format!("k{i:06}").as_bytes(), &value)?;
        }
        let data = writer.into_inner();

        let start = Instant::now();
        let mut scanner = KeyedRecordScanner::new(Cursor::new(&data), KeyedCodec::raw());
        let mut copy = KeyedRecordWriter::new(Vec::with_capacity(data.len()), KeyedCodec::raw());
        while scanner.advance() {
            copy.write(scanner.record()?)?;
        }
        let elapsed = start.elapsed();

        let ns_per_op = elapsed.as_nanos() as f64 / RECORDS as f64;
        let ops_per_sec = 1_000_000_000.0 / ns_per_op;
        println!(
            "  Copied {} records ({} bytes) in {:?}",
            RECORDS,
            data.len(),
            elapsed
        );
        println!("  {:.0} ns/op, {:.0} ops/sec", ns_per_op, ops_per_sec);
    }

    println!("\nAll examples completed successfully!");
    Ok(())
}
