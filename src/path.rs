//! Conversions between file system paths and document key paths.
//!
//! A key path is the `/` joined list of keys leading to a value, e.g. `views/by_name/map`. The
//! leaf file holding that value lives at `views/by_name/map.js` below the document directory.

use std::path::{Component, Path};

use crate::error::{Error, Result};
use crate::CONTENT_SUFFIX;

/// Separator between the keys of a key path.
pub const KEY_SEPARATOR: char = '/';

const DESIGN_PREFIX: &str = "_design/";

/// Maps a document id to the name of the directory holding it.
///
/// `_design/indexes` is stored in `indexes`, any other id is used as is. The prefix is not
/// recovered when reading the directory back; callers pass the full id again on upload.
pub fn design_document_name(id: &str) -> &str {
    id.strip_prefix(DESIGN_PREFIX).unwrap_or(id)
}

/// [`design_document_name`], checked to stay below the database directory.
///
/// Ids like `foo/bar` keep mapping to nested directories, but every segment must be a valid key.
pub fn document_dir_name(id: &str) -> Result<&str> {
    let name = design_document_name(id);
    if name.is_empty() {
        return Err(Error::InvalidKey {
            key_path: String::new(),
            key: id.to_owned(),
        });
    }
    for segment in name.split(KEY_SEPARATOR) {
        validate_key("", segment).map_err(|_| Error::InvalidKey {
            key_path: String::new(),
            key: id.to_owned(),
        })?;
    }
    Ok(name)
}

/// Returns `full` relative to `base`.
pub fn strip_base<'a>(base: &Path, full: &'a Path) -> Result<&'a Path> {
    full.strip_prefix(base).map_err(|_| Error::OutsideBase {
        base: base.to_path_buf(),
        path: full.to_path_buf(),
    })
}

/// Turns a relative file system path into a key path.
pub fn key_path(rel: &Path) -> Result<String> {
    let mut out = String::new();
    for component in rel.components() {
        let segment = match component {
            Component::Normal(segment) => segment
                .to_str()
                .ok_or_else(|| Error::NonUtf8Path(rel.to_path_buf()))?,
            Component::CurDir => continue,
            _ => {
                return Err(Error::OutsideBase {
                    base: Path::new(".").to_path_buf(),
                    path: rel.to_path_buf(),
                })
            }
        };
        if !out.is_empty() {
            out.push(KEY_SEPARATOR);
        }
        out.push_str(segment);
    }
    Ok(out)
}

/// Appends `key` to `key_path`.
pub fn join_key(key_path: &str, key: &str) -> String {
    if key_path.is_empty() {
        key.to_owned()
    } else {
        format!("{}{}{}", key_path, KEY_SEPARATOR, key)
    }
}

/// Splits a key path into its keys. The empty key path has no keys.
pub fn split_key(key_path: &str) -> impl Iterator<Item = &str> {
    key_path
        .split(KEY_SEPARATOR)
        .filter(|segment| !segment.is_empty())
}

/// Removes [`CONTENT_SUFFIX`] from a leaf file name, leaving other names untouched.
pub fn strip_suffix(file_name: &str) -> &str {
    file_name.strip_suffix(CONTENT_SUFFIX).unwrap_or(file_name)
}

/// Checks that `key` maps to exactly one path segment below its parent directory.
pub fn validate_key(key_path: &str, key: &str) -> Result<()> {
    let escapes = key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']);
    if escapes {
        return Err(Error::InvalidKey {
            key_path: key_path.to_owned(),
            key: key.to_owned(),
        });
    }
    Ok(())
}
