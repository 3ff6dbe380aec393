//! Command-line tool for building, encoding, and applying array-mutation
//! frames, useful for inspecting wire bytes by hand or smoke-testing a
//! replica against a short scripted sequence.

#![expect(clippy::print_stdout, reason = "a CLI inspector's output is its product")]

use anyhow::{Context, Result, bail};
use arrsync::{Frame, Patch, Replica};
use clap::{Parser, Subcommand};

/// Inspect and apply array-mutation frames.
#[derive(Parser, Debug)]
#[command(name = "frame_inspect", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a single INSERT frame and print its wire bytes as hex.
    Insert {
        /// Target position.
        pos: u32,
        /// Payload text, encoded as UTF-8.
        payload: String,
    },
    /// Encode a single UPDATE frame and print its wire bytes as hex.
    Update {
        /// Target position.
        pos: u32,
        /// Payload text, encoded as UTF-8.
        payload: String,
    },
    /// Encode a single DELETE frame and print its wire bytes as hex.
    Delete {
        /// Target position.
        pos: u32,
    },
    /// Decode hex-encoded wire bytes and print the resulting frame.
    Decode {
        /// Wire bytes, as a hex string (e.g. `17000322` for three bytes).
        hex: String,
    },
    /// Run the worked example from the protocol notes end-to-end: encode a
    /// short scripted sequence of frames, apply each to a fresh replica,
    /// and print the replica's contents after each step.
    Demo,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Insert { pos, payload } => print_encoded(&Frame::Insert {
            pos,
            payload: payload.into_bytes(),
        }),
        Command::Update { pos, payload } => print_encoded(&Frame::Update {
            pos,
            payload: payload.into_bytes(),
        }),
        Command::Delete { pos } => print_encoded(&Frame::Delete { pos }),
        Command::Decode { hex } => decode_and_print(&hex),
        Command::Demo => run_demo(),
    }
}

fn print_encoded(frame: &Frame) -> Result<()> {
    let bytes = frame.encode().context("encode frame")?;
    tracing::info!(frame = ?frame, bytes = %hex::encode(&bytes), "encoded frame");
    println!("{}", hex::encode(bytes));
    Ok(())
}

fn decode_and_print(hex_str: &str) -> Result<()> {
    let bytes = hex::decode(hex_str.trim()).context("input is not valid hex")?;
    let frame = Frame::decode(&bytes).context("decode frame")?;
    tracing::info!(frame = ?frame, "decoded frame");
    println!("{frame:#?}");
    Ok(())
}

fn run_demo() -> Result<()> {
    let mut replica = Replica::new();
    let script: Vec<Frame> = vec![
        Frame::Insert {
            pos: 0,
            payload: b"A".to_vec(),
        },
        Frame::Update {
            pos: 5,
            payload: b"123".to_vec(),
        },
        Frame::InsertRange {
            start: 10,
            end: 12,
            payloads: vec![b"A".to_vec(), b"B".to_vec(), b"C".to_vec()],
        },
        Frame::PartialUpdateRange {
            start: 0,
            end: 4,
            patches: vec![Patch {
                pos: 2,
                payload: b"patched".to_vec(),
            }],
        },
        Frame::Delete { pos: 0 },
    ];

    for frame in &script {
        let bytes = frame.encode().context("encode scripted frame")?;
        let Ok(()) = replica.apply(&bytes) else {
            bail!("a scripted frame failed to apply: {frame:?}");
        };
        tracing::info!(frame = ?frame, replica = ?replica.as_slots(), "applied frame");
        println!("{:?} -> {:?}", frame, replica.as_slots());
    }
    Ok(())
}
