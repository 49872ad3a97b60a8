// file: src/fixtures.rs
// description: Raw fixture dumps and golden-value manifest I/O for decode verification.
// author: cipher-rc5

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use bytemuck::try_cast_slice;
use memmap2::Mmap;
use serde::Deserialize;

/// Expected decoded values per fixture case, as published by the
/// quantization oracle next to the raw dumps (`expected_values.json`).
#[derive(Debug, Deserialize)]
pub struct ExpectedManifest(HashMap<String, Vec<f32>>);

impl ExpectedManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open manifest {}", path.display()))?;
        let manifest = serde_json::from_reader(file)
            .with_context(|| format!("failed to parse manifest {}", path.display()))?;
        Ok(manifest)
    }

    pub fn case(&self, name: &str) -> Option<&[f32]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn case_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

fn map_dump(path: &Path) -> Result<Mmap> {
    let file =
        File::open(path).with_context(|| format!("failed to open dump {}", path.display()))?;
    // SAFETY: fixture dumps are immutable while mapped, and the mapping
    // only lives as long as the returned Mmap.
    let mmap =
        unsafe { Mmap::map(&file) }.with_context(|| format!("failed to mmap {}", path.display()))?;
    Ok(mmap)
}

/// Reads a headerless byte dump (block bytes or scale bytes).
pub fn read_u8_dump(path: &Path) -> Result<Vec<u8>> {
    Ok(map_dump(path)?.to_vec())
}

/// Reads a headerless native-endian f32 dump.
pub fn read_f32_dump(path: &Path) -> Result<Vec<f32>> {
    let mmap = map_dump(path)?;
    let values: &[f32] = try_cast_slice(&mmap)
        .map_err(|e| anyhow::anyhow!("dump {} is not a flat f32 buffer: {e}", path.display()))?;
    Ok(values.to_vec())
}

/// Writes decoded values as a headerless native-endian f32 dump.
pub fn write_f32_dump(path: &Path, values: &[f32]) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("failed to create dump {}", path.display()))?;
    file.write_all(bytemuck::cast_slice(values))
        .with_context(|| format!("failed to write dump {}", path.display()))?;
    Ok(())
}
