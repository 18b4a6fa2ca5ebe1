use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::node::{Node, Object};
use crate::observe::{Observer, TracingObserver};
use crate::path::{join_key, strip_base, validate_key};
use crate::CONTENT_SUFFIX;

/// Writes a document below `base/rel`.
///
/// Strings become `<key>.js` files and objects become directories. `base/rel` must exist. Files
/// already present are overwritten; files absent from `doc` are left alone.
pub fn to_fs(doc: &Object, base: impl AsRef<Path>, rel: impl AsRef<Path>) -> Result<()> {
    let mut observer = TracingObserver;
    let mut serializer = Serializer::new(base.as_ref(), rel, &mut observer);
    serializer.serialize(doc)
}

pub struct Serializer<'o> {
    /// Leaf files are reported to the observer relative to this directory
    base: PathBuf,
    /// The directory this serializer is currently writing into
    path: PathBuf,
    /// Key path of `path`, relative to the document root
    key_path: String,
    observer: &'o mut dyn Observer,
}

impl<'o> Serializer<'o> {
    /// Creates a serializer writing into `base/rel`.
    pub fn new(
        base: impl Into<PathBuf>,
        rel: impl AsRef<Path>,
        observer: &'o mut dyn Observer,
    ) -> Self {
        let base = base.into();
        Self {
            path: base.join(rel),
            base,
            key_path: String::new(),
            observer,
        }
    }

    pub fn serialize(&mut self, object: &Object) -> Result<()> {
        for (key, value) in object {
            validate_key(&self.key_path, key)?;
            match value {
                Node::Leaf(content) => self.write_leaf(key, content)?,
                Node::Object(child) => {
                    // `a.js/` next to the file for leaf `a` would not read back
                    let shadows_leaf = key
                        .strip_suffix(CONTENT_SUFFIX)
                        .map_or(false, |stem| matches!(object.get(stem), Some(Node::Leaf(_))));
                    if shadows_leaf {
                        return Err(Error::Conflict {
                            key_path: join_key(&self.key_path, key),
                        });
                    }

                    self.push(key)?;
                    let result = self.serialize(child);
                    self.pop();
                    result?;
                }
            }
        }
        Ok(())
    }

    fn write_leaf(&mut self, key: &str, content: &str) -> Result<()> {
        let path = self.path.join(format!("{}{}", key, CONTENT_SUFFIX));
        fs::write(&path, content).map_err(|err| Error::io(&path, err))?;
        let file = strip_base(&self.base, &path)?;
        self.observer
            .leaf_written(file, &join_key(&self.key_path, key), content.len());
        Ok(())
    }

    /// Descends into the directory for `key`, creating it if needed.
    fn push(&mut self, key: &str) -> Result<()> {
        self.path.push(key);
        self.key_path = join_key(&self.key_path, key);

        match fs::create_dir_all(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists && self.path.is_dir() => {}
            Err(err) => return Err(Error::io(&self.path, err)),
        }
        self.observer.dir_created(&self.key_path);
        Ok(())
    }

    fn pop(&mut self) {
        self.path.pop();
        let len = self.key_path.rfind('/').unwrap_or(0);
        self.key_path.truncate(len);
    }
}

////////////////////////////////////////////////////////////////////////////////
