//! Saving command output to text files
//!
//! Output is written to `{username}@{host}-{year}-{month}-{day}_{hour}_{minute}.txt`
//! in the configured output directory. Two saves for the same session within
//! the same minute overwrite each other.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Timelike};

use crate::error::PersistError;

/// Build the output file name for `username@host` at the given local time
///
/// Fields are not zero-padded and seconds are dropped.
pub fn output_file_name<T>(username: &str, host: &str, at: &T) -> String
where
    T: Datelike + Timelike,
{
    format!(
        "{}@{}-{}-{}-{}_{}_{}.txt",
        username,
        host,
        at.year(),
        at.month(),
        at.day(),
        at.hour(),
        at.minute()
    )
}

/// Create or truncate `dir/file_name` and write `data` to it
///
/// Single attempt. If the write fails after the file was created, the
/// partial file is removed.
pub fn write_output(dir: &Path, file_name: &str, data: &[u8]) -> Result<PathBuf, PersistError> {
    let path = dir.join(file_name);
    let fail = |source| PersistError::Write {
        path: path.clone(),
        source,
    };

    let mut file = fs::File::create(&path).map_err(fail)?;
    if let Err(e) = file.write_all(data).and_then(|()| file.flush()) {
        drop(file);
        let _ = fs::remove_file(&path);
        return Err(fail(e));
    }

    Ok(path)
}
