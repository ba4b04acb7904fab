//! Single-level archive extraction

use crate::error::{MagicBucketError, Result};
use crate::model::split_extension;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::info;

/// Unpack `basename` inside `dir` when it is a `.zip` or `.gz` file.
///
/// Returns the name to process: the basename with the archive extension
/// stripped once, or the basename unchanged for any other file. Archives
/// inside the archive are left alone.
pub fn extract_in_place(dir: &Path, basename: &str) -> Result<String> {
    let (root, extension) = split_extension(basename);
    match extension {
        ".zip" => {
            info!("Unzipping {}", basename);
            unzip(dir, basename)?;
            Ok(root.to_string())
        }
        ".gz" => {
            info!("Gunzipping {}", basename);
            gunzip(dir, basename, root)?;
            Ok(root.to_string())
        }
        _ => Ok(basename.to_string()),
    }
}

fn unzip(dir: &Path, basename: &str) -> Result<()> {
    let file = File::open(dir.join(basename))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| MagicBucketError::Archive(format!("{}: {}", basename, e)))?;
    // an entry whose name would escape `dir` fails the whole archive
    archive
        .extract(dir)
        .map_err(|e| MagicBucketError::Archive(format!("{}: {}", basename, e)))?;
    Ok(())
}

/// Replaces `basename` with its decompressed contents, like `gunzip -f`
fn gunzip(dir: &Path, basename: &str, root: &str) -> Result<()> {
    let archive = dir.join(basename);
    let decoder = MultiGzDecoder::new(BufReader::new(File::open(&archive)?));
    let mut output = BufWriter::new(File::create(dir.join(root))?);
    decompress(decoder, &mut output, basename)?;
    output.flush()?;
    drop(output);
    std::fs::remove_file(&archive)?;
    Ok(())
}

/// Copy `decoder` into `output`.
///
/// Read failures mean a corrupt archive; write failures are local I/O errors.
fn decompress<R: Read, W: Write>(mut decoder: R, output: &mut W, basename: &str) -> Result<u64> {
    let mut buf = vec![0u8; 64 * 1024];
    let mut total = 0;
    loop {
        let n = decoder
            .read(&mut buf)
            .map_err(|e| MagicBucketError::Archive(format!("{}: {}", basename, e)))?;
        if n == 0 {
            return Ok(total);
        }
        output.write_all(&buf[..n])?;
        total += n as u64;
    }
}
