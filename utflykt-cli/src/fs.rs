//! Capability-based filesystem helpers for output writing.

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8};
use std::io;

/// Create the output directory if needed and open it for writing.
pub(crate) fn open_output_dir(path: &Utf8Path) -> io::Result<fs_utf8::Dir> {
    fs_utf8::Dir::create_ambient_dir_all(path, ambient_authority())?;
    fs_utf8::Dir::open_ambient_dir(path, ambient_authority())
}
