//! Example: PLC operating-status report (RS34)
//!
//! Run with: cargo run --example plc_status -- /dev/ttyACM0
//!
//! Reads the operating status over a serial link and prints the decoded
//! fields. Exits with code 2 if the PLC answers with a malformed-length
//! status reply.

use idec_maint::{Client, ClientConfig, MaintError};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyACM0".to_string());

    let mut plc = match Client::serial(&port, ClientConfig::default()) {
        Ok(plc) => plc,
        Err(e) => {
            eprintln!("cannot open {port}: {e}");
            return ExitCode::FAILURE;
        }
    };

    match plc.read_status() {
        Ok(status) => {
            println!("RS34 decoded:");
            println!("  PLC status:            {}", status.run_description());
            println!(
                "  Preset value changed:  {}",
                if status.preset_changed() {
                    "Changed"
                } else {
                    "Not changed"
                }
            );
            println!(
                "  User prog protection:  {}",
                status.protection_description()
            );
            println!("  CPU type:              {}", status.cpu_description());
            if !status.extra.is_empty() {
                println!("  Extra bytes:           {}", status.extra);
            }
            ExitCode::SUCCESS
        }
        Err(MaintError::UnexpectedReply { reason }) => {
            eprintln!("malformed status reply: {reason}");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("status read failed: {e}");
            ExitCode::FAILURE
        }
    }
}
