// CLI front door: disassemble or translate a flat big-endian code image.
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use xenonrec_core::translator::decoder::InstrData;
use xenonrec_core::translator::disasm;
use xenonrec_core::translator::dispatch::DispatchTables;
use xenonrec_core::translator::translate_function;

#[derive(Parser)]
#[command(name = "xenonrec")]
#[command(about = "Xenon PowerPC translation core driver")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Disassemble a flat big-endian code image
    Disasm {
        /// Path to the raw image
        #[arg(short, long)]
        image: PathBuf,

        /// Guest address of the first word
        #[arg(short, long, default_value_t = 0x8200_0000, value_parser = parse_address)]
        base: u32,
    },
    /// Translate a flat image to IR and dump the graph
    Translate {
        /// Path to the raw image
        #[arg(short, long)]
        image: PathBuf,

        /// Guest address of the first word
        #[arg(short, long, default_value_t = 0x8200_0000, value_parser = parse_address)]
        base: u32,

        /// Annotate the dump with per-instruction disassembly
        #[arg(long)]
        comments: bool,
    },
}

fn parse_address(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|e| format!("bad address {:?}: {}", s, e))
}

/// Load an image as big-endian instruction words.
fn load_words(path: &PathBuf) -> Result<Vec<u32>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    if bytes.len() % 4 != 0 {
        bail!("image size {} is not a multiple of 4", bytes.len());
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    // One-time table construction, shared by everything below.
    let tables = DispatchTables::build();

    match cli.command {
        Commands::Disasm { image, base } => {
            let words = load_words(&image)?;
            for (n, &code) in words.iter().enumerate() {
                let address = base + (n as u32) * 4;
                let mut line = format!("{:08X}  {:08X}  ", address, code);
                match tables.lookup(code) {
                    Some(entry) => {
                        disasm::disassemble(entry, &InstrData::new(address, code), &mut line)
                    }
                    None => line.push('?'),
                }
                println!("{}", line);
            }
        }
        Commands::Translate {
            image,
            base,
            comments,
        } => {
            let words = load_words(&image)?;
            let translation = translate_function(&tables, base, &words, comments);
            print!("{}", translation.builder.dump());
            if !translation.untranslatable.is_empty() {
                log::warn!(
                    "{} untranslatable instruction(s)",
                    translation.untranslatable.len()
                );
                for (address, code) in &translation.untranslatable {
                    log::warn!("  {:08X} {:08X}", address, code);
                }
            }
        }
    }
    Ok(())
}
