//! Command line driver: runs a NumNum program or translates it to Lua.
//!
//! Usage: `numnum [--run | --lua] <FILE> [-o OUT] [--show-tokens]`

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use numnum::machine;
use numnum::syntax::Lua;

/// Output file used by `--lua` when `-o` is not given.
const DEFAULT_LUA_OUTPUT: &str = "a.lua";

#[derive(Parser, Debug)]
#[command(name = "numnum", version)]
#[command(about = "Run a NumNum program or translate it to Lua")]
struct Args {
    /// Interpret the program (default)
    #[arg(long, conflicts_with = "lua")]
    run: bool,

    /// Translate the program to Lua
    #[arg(long)]
    lua: bool,

    /// Source file
    file: PathBuf,

    /// Output file for --lua
    #[arg(short = 'o')]
    output: Option<PathBuf>,

    /// Print the decoded instructions to stderr first
    #[arg(long = "show-tokens")]
    show_tokens: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(args: &Args) -> Result<()> {
    let source = File::open(&args.file)
        .with_context(|| format!("cannot open {}", args.file.display()))?;
    let mut input = BufReader::new(source);

    if args.lua && !args.run {
        let path = args
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LUA_OUTPUT));
        let out = File::create(&path)
            .with_context(|| format!("cannot create {}", path.display()))?;
        let mut lua = Lua::new(BufWriter::new(out));
        numnum::compile(&mut input, &mut lua, args.show_tokens)
            .with_context(|| format!("failed to translate {}", args.file.display()))?;
    } else {
        let mut vm = machine::with_stdio();
        numnum::compile(&mut input, &mut vm, args.show_tokens)
            .with_context(|| format!("failed to run {}", args.file.display()))?;
    }
    Ok(())
}

fn report(err: &anyhow::Error) -> String {
    format!("error: {:#}", err)
}

fn main() {
    init_logging();

    let args = Args::parse();
    if let Err(e) = execute(&args) {
        eprintln!("{}", report(&e));
        process::exit(1);
    }
}
