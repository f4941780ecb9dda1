//! Zip packing of raw archive files.
//!
//! Archives are written into a caller-supplied sink, normally an unlinked temp
//! file, so memory use does not grow with the size of a day.

use std::fs::File;
use std::io::{self, Seek, Write};
use std::path::PathBuf;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportResult;

/// Pack `files` into a zip written to `out`, one entry per file named by its
/// file name, Deflate at `level`. Returns the sink.
pub fn zip_files<W: Write + Seek>(files: &[PathBuf], level: i64, out: W) -> ExportResult<W> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(level));

    let mut zip = ZipWriter::new(out);
    for path in files {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        zip.start_file(name, options)?;
        let mut file = File::open(path)?;
        io::copy(&mut file, &mut zip)?;
    }

    Ok(zip.finish()?)
}
