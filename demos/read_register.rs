//! Example: Reading registers, bits, and floats
//!
//! Run with: cargo run --example read_register -- 192.168.1.5
//!
//! This example demonstrates:
//! - Connecting over TCP (connection-per-call)
//! - Reading words and word blocks
//! - Reading bits and the enumerable I/O aliases
//! - Reading 32-bit floats with both word orders

use idec_maint::{Client, ClientConfig, Operand, WordOrder, DEFAULT_TCP_PORT};
use std::net::SocketAddr;

fn main() -> idec_maint::Result<()> {
    env_logger::init();

    let host = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "192.168.1.5".to_string());
    let addr: SocketAddr = format!("{host}:{DEFAULT_TCP_PORT}")
        .parse()
        .expect("valid host address");

    let config = ClientConfig::default();
    let mut plc = Client::tcp(addr, config);

    println!("=== Words ===\n");

    let value = plc.read_word(Operand::parse("D0100")?)?;
    println!("D0100 = {value} (0x{value:04X})");

    let block = plc.read_words(Operand::parse("D0100")?, 5)?;
    println!("D0100-D0104: {block:?}");

    println!("\n=== Bits ===\n");

    let bit = plc.read_bit(Operand::parse("M8070")?)?;
    println!("M8070 = {bit}");

    // Enumerable aliases: I0/Q0 map onto X0/Y0
    let input0 = plc.input("I0")?;
    println!("I0 = {input0}");

    println!("\n=== Floats ===\n");

    let temperature = plc.read_float(Operand::parse("D0200")?)?;
    println!("Temperature (D0200-D0201): {temperature:.2}");

    // Same registers, opposite word order, for devices configured that way
    let config = ClientConfig::default().with_word_order(WordOrder::HighFirst);
    let mut plc_swapped = Client::tcp(addr, config);
    let swapped = plc_swapped.read_float(Operand::parse("D0200")?)?;
    println!("Same registers, high word first: {swapped:.2}");

    println!("\n=== Timers ===\n");

    for record in plc.read_timer(0, 3)? {
        println!(
            "T{:04}: current={} preset={} status=0x{:02X}",
            record.number, record.current, record.preset, record.status
        );
    }

    println!("\nRead example completed!");
    Ok(())
}
