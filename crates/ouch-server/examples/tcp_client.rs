//! Interactive OUCH 4.2 client for poking at a running simulator.
//!
//!   cargo run -p ouch-server --example tcp_client
//!
//! Commands:
//!   new <token> <B|S|T|E> <qty> <symbol> <price>
//!   cancel <token> [qty]

use std::env;
use std::error::Error;
use std::io::{self, Write};
use std::time::Duration;

use ouch_core::{CancelOrder, InboundMessage, NewOrder, Side};
use ouch_protocol::{decode_output, encode_input, message_size};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let addr = env::var("OUCH_CLIENT_ADDR").unwrap_or_else(|_| "127.0.0.1:4722".to_string());

    println!("Connecting to {}...", addr);
    let mut stream = TcpStream::connect(&addr).await?;
    println!("Connected.");
    println!("  new SPY1 B 100 SPY 4500000");
    println!("  cancel SPY1");
    println!("Type 'quit' or 'exit' to leave.\n");

    let stdin = io::stdin();
    let mut pending = Vec::new();

    loop {
        print!(">> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            println!("\nEOF on stdin, exiting client.");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            break;
        }

        let msg = match parse_command(trimmed) {
            Ok(msg) => msg,
            Err(err) => {
                println!("?? {err}");
                continue;
            }
        };

        let mut out = Vec::new();
        encode_input(&msg, &mut out);
        stream.write_all(&out).await?;

        // Collect whatever arrives shortly after; a cancel may get no reply.
        let mut chunk = [0u8; 1024];
        while let Ok(read) = timeout(Duration::from_millis(200), stream.read(&mut chunk)).await {
            let n = read?;
            if n == 0 {
                println!("Server closed the connection.");
                return Ok(());
            }
            pending.extend_from_slice(&chunk[..n]);

            while let Some(size) = pending.first().and_then(|&tag| message_size(tag)) {
                if pending.len() < size {
                    break;
                }
                match decode_output(&pending) {
                    Ok((reply, used)) => {
                        println!("<< {reply:?}");
                        pending.drain(..used);
                    }
                    Err(err) => {
                        println!("!! {err}");
                        pending.clear();
                    }
                }
            }
            if pending.first().is_some_and(|&tag| message_size(tag).is_none()) {
                println!("!! unknown reply tag, dropping {} bytes", pending.len());
                pending.clear();
            }
        }
    }

    Ok(())
}

fn parse_command(line: &str) -> Result<InboundMessage, Box<dyn Error>> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    match parts.as_slice() {
        ["new", token, side, qty, symbol, px] => {
            let side = side
                .bytes()
                .next()
                .and_then(Side::from_byte)
                .ok_or("side must be one of B, S, T, E")?;
            Ok(InboundMessage::NewOrder(NewOrder::new(
                token.parse()?,
                side,
                qty.parse()?,
                symbol.parse()?,
                px.parse()?,
            )))
        }
        ["cancel", token] => Ok(InboundMessage::CancelOrder(CancelOrder {
            token: token.parse()?,
            qty: 0,
        })),
        ["cancel", token, qty] => Ok(InboundMessage::CancelOrder(CancelOrder {
            token: token.parse()?,
            qty: qty.parse()?,
        })),
        _ => Err("unknown command".into()),
    }
}
