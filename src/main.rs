// file: src/main.rs
// description: CLI entrypoint for decoding MXFP4 block/scale dumps and verifying against golden manifests.
// author: cipher-rc5
// created: 2026-02-21
// modified: 2026-02-21

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

use oxidized_mxfp4::{
    dequantize_mxfp4_blocks_chunked, fixtures, TensorView, DEFAULT_ROWS_PER_CHUNK,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "MXFP4 block decoder")]
struct Args {
    #[arg(long, help = "Path to the raw block-byte dump")]
    blocks: PathBuf,

    #[arg(long, help = "Path to the raw scale-byte dump")]
    scales: PathBuf,

    #[arg(
        long,
        value_delimiter = ',',
        help = "Logical block shape (*prefix, G, B), comma separated; the scale shape is the same minus the last axis"
    )]
    shape: Vec<usize>,

    #[arg(long, help = "Write the decoded f32 dump here")]
    out: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_ROWS_PER_CHUNK)]
    rows_per_chunk: usize,

    #[arg(long, help = "Manifest of expected decoded values")]
    manifest: Option<PathBuf>,

    #[arg(long, requires = "manifest", help = "Manifest case to verify against")]
    case: Option<String>,

    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_target(false)
        .init();

    anyhow::ensure!(
        !args.shape.is_empty(),
        "--shape requires at least one dimension"
    );

    let block_bytes = fixtures::read_u8_dump(&args.blocks)?;
    let scale_bytes = fixtures::read_u8_dump(&args.scales)?;

    let blocks = TensorView::new(&block_bytes, &args.shape)?;
    let scales = TensorView::new(&scale_bytes, &args.shape[..args.shape.len() - 1])?;

    let decoded = dequantize_mxfp4_blocks_chunked(&blocks, &scales, args.rows_per_chunk)?;
    tracing::info!(elements = decoded.len(), "decoded");

    if let Some(out) = &args.out {
        fixtures::write_f32_dump(out, &decoded)?;
        tracing::info!(path = %out.display(), "wrote f32 dump");
    }

    if let Some(manifest_path) = &args.manifest {
        let case = args
            .case
            .as_deref()
            .context("--case is required with --manifest")?;
        let manifest = fixtures::ExpectedManifest::load(manifest_path)?;
        let expected = manifest
            .case(case)
            .with_context(|| format!("case '{case}' missing from manifest"))?;
        verify_bits(expected, &decoded)?;
        println!("{case}: OK ({} values)", decoded.len());
    }

    Ok(())
}

fn verify_bits(expected: &[f32], actual: &[f32]) -> Result<()> {
    anyhow::ensure!(
        expected.len() == actual.len(),
        "expected {} values, decoded {}",
        expected.len(),
        actual.len()
    );
    for (i, (e, a)) in expected.iter().zip(actual).enumerate() {
        anyhow::ensure!(
            e.to_bits() == a.to_bits(),
            "value {} differs: expected {} ({:#010x}), decoded {} ({:#010x})",
            i,
            e,
            e.to_bits(),
            a,
            a.to_bits()
        );
    }
    Ok(())
}
