// Copyright (c) the blockdct authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use blockdct_cli::commands::{self, DecodeArgs, EncodeArgs, MergeArgs, SplitArgs};
use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;

#[derive(Parser)]
#[command(version, about = "8x8 block DCT image codec")]
struct Opt {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dump the R, G and B channels of a BMP file as text
    Split(SplitArgs),
    /// Build a BMP file from R, G and B channel text files
    Merge(MergeArgs),
    /// Transform and quantize a BMP file into per-channel coefficient streams
    Encode(EncodeArgs),
    /// Reconstruct a BMP file from per-channel coefficient streams
    Decode(DecodeArgs),
}

fn main() -> Result<()> {
    color_eyre::install()?;

    #[cfg(feature = "tracing-subscriber")]
    {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }

    let opt = Opt::parse();
    match &opt.command {
        Command::Split(args) => commands::split(args),
        Command::Merge(args) => commands::merge(args),
        Command::Encode(args) => commands::encode(args),
        Command::Decode(args) => commands::decode(args),
    }
}
