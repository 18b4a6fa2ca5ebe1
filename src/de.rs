use std::collections::btree_map::Entry;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::node::{Node, Object};
use crate::observe::{Observer, TracingObserver};
use crate::path::{join_key, key_path, split_key, strip_base, strip_suffix, validate_key};

/// Reads the directory tree below `base/rel` back into a document.
///
/// Every directory becomes an object (empty directories included) and every file whose name
/// matches the glob `filter` becomes a string, keyed by its name without the `.js` suffix.
/// Other files are ignored.
pub fn from_fs(base: impl AsRef<Path>, rel: impl AsRef<Path>, filter: &str) -> Result<Object> {
    let mut observer = TracingObserver;
    let mut deserializer =
        Deserializer::new(base.as_ref().join(rel.as_ref()), filter, &mut observer)?;
    deserializer.deserialize()
}

pub struct Deserializer<'o> {
    /// The directory holding the document
    root: PathBuf,
    filter: GlobMatcher,
    observer: &'o mut dyn Observer,
}

impl<'o> Deserializer<'o> {
    /// Fails if `filter` is not a valid glob.
    pub fn new(
        root: impl Into<PathBuf>,
        filter: &str,
        observer: &'o mut dyn Observer,
    ) -> Result<Self> {
        let filter = Glob::new(filter)?.compile_matcher();
        Ok(Self {
            root: root.into(),
            filter,
            observer,
        })
    }

    pub fn deserialize(&mut self) -> Result<Object> {
        let metadata = fs::metadata(&self.root).map_err(|err| Error::io(&self.root, err))?;
        if !metadata.is_dir() {
            let err = io::Error::new(io::ErrorKind::InvalidInput, "not a directory");
            return Err(Error::io(&self.root, err));
        }

        let mut doc = Object::new();
        for entry in WalkDir::new(&self.root).min_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.observer.entry_skipped(&err);
                    continue;
                }
            };
            let rel = strip_base(&self.root, entry.path())?;

            if entry.file_type().is_dir() {
                put(&key_path(rel)?, Node::Object(Object::new()), &mut doc)?;
            } else if self.filter.is_match(entry.file_name()) {
                let (key_path, content) = self.read_leaf(entry.path(), rel)?;
                put(&key_path, Node::Leaf(content), &mut doc)?;
            }
        }
        Ok(doc)
    }

    fn read_leaf(&mut self, path: &Path, rel: &Path) -> Result<(String, String)> {
        let name = rel
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::NonUtf8Path(path.to_path_buf()))?;
        let parent = key_path(rel.parent().unwrap_or_else(|| Path::new("")))?;
        let key = strip_suffix(name);
        validate_key(&parent, key)?;
        let key_path = join_key(&parent, key);

        let content = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        self.observer.leaf_read(path, &key_path, content.len());
        Ok((key_path, content))
    }
}

/// Stores `value` at `key_path` inside `root`, creating intermediate objects as needed.
///
/// A string replaces a string, while an object is merged into an existing object. Putting a
/// string where an object is (or the other way around) is an [`Error::Conflict`].
pub fn put(key_path: &str, value: Node, root: &mut Object) -> Result<()> {
    let keys: Vec<&str> = split_key(key_path).collect();
    let (last, parents) = keys.split_last().ok_or_else(|| Error::InvalidKey {
        key_path: String::new(),
        key: key_path.to_owned(),
    })?;

    let mut current = root;
    let mut walked = String::new();
    for key in parents {
        walked = join_key(&walked, key);
        let child = current
            .entry((*key).to_owned())
            .or_insert_with(|| Node::Object(Object::new()));
        current = match child {
            Node::Object(object) => object,
            Node::Leaf(_) => return Err(Error::Conflict { key_path: walked }),
        };
    }

    let key_path = join_key(&walked, last);
    match current.entry((*last).to_owned()) {
        Entry::Vacant(slot) => {
            slot.insert(value);
        }
        Entry::Occupied(mut slot) => merge(slot.get_mut(), value, &key_path)?,
    }
    Ok(())
}

fn merge(existing: &mut Node, value: Node, key_path: &str) -> Result<()> {
    match (existing, value) {
        (Node::Leaf(old), Node::Leaf(new)) => *old = new,
        (Node::Object(old), Node::Object(new)) => {
            for (key, value) in new {
                let child_path = join_key(key_path, &key);
                match old.entry(key) {
                    Entry::Vacant(slot) => {
                        slot.insert(value);
                    }
                    Entry::Occupied(mut slot) => merge(slot.get_mut(), value, &child_path)?,
                }
            }
        }
        _ => {
            return Err(Error::Conflict {
                key_path: key_path.to_owned(),
            })
        }
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::CONTENT_FILTER;

    fn setup_test(base_dir: &Path, files: Vec<(&str, &str)>) {
        for (path, content) in files {
            let path = base_dir.join(path);
            if path.to_string_lossy().ends_with('/') {
                fs::create_dir_all(&path).unwrap();
                continue;
            }
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
        }
    }

    fn leaf(s: &str) -> Node {
        Node::from(s)
    }

    fn object(entries: Vec<(&str, Node)>) -> Node {
        Node::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect(),
        )
    }

    #[test]
    fn test_document() {
        let base_dir = tempfile::tempdir().unwrap();
        setup_test(
            base_dir.path(),
            vec![
                ("app/_id.js", "_design/app"),
                ("app/views/by_name/map.js", "function(doc) {}"),
                ("app/views/by_name/reduce.js", "_count"),
                ("app/views/empty/", ""),
                ("app/README.md", "not part of the document"),
                ("app/lib/notes.txt", "ignored too"),
            ],
        );

        let doc = from_fs(base_dir.path(), "app", CONTENT_FILTER).unwrap();
        let expected = object(vec![
            ("_id", leaf("_design/app")),
            ("lib", object(vec![])),
            (
                "views",
                object(vec![
                    (
                        "by_name",
                        object(vec![
                            ("map", leaf("function(doc) {}")),
                            ("reduce", leaf("_count")),
                        ]),
                    ),
                    ("empty", object(vec![])),
                ]),
            ),
        ]);
        assert_eq!(expected, Node::Object(doc));
    }

    #[test]
    fn test_empty_root() {
        let base_dir = tempfile::tempdir().unwrap();
        let doc = from_fs(base_dir.path(), "", CONTENT_FILTER).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_missing_root() {
        let base_dir = tempfile::tempdir().unwrap();
        match from_fs(base_dir.path(), "missing", CONTENT_FILTER) {
            Err(Error::Io { path, .. }) => assert_eq!(path, base_dir.path().join("missing")),
            other => panic!("expected i/o error, got {:?}", other),
        }

        setup_test(base_dir.path(), vec![("file.js", "x")]);
        assert!(matches!(
            from_fs(base_dir.path(), "file.js", CONTENT_FILTER),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn test_malformed_filter() {
        let base_dir = tempfile::tempdir().unwrap();
        setup_test(base_dir.path(), vec![("a.js", "x")]);
        assert!(matches!(
            from_fs(base_dir.path(), "", "[*.js"),
            Err(Error::FilterPattern(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_entry_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        #[derive(Default)]
        struct Record {
            skipped: usize,
        }

        impl Observer for Record {
            fn entry_skipped(&mut self, _error: &walkdir::Error) {
                self.skipped += 1;
            }
        }

        let base_dir = tempfile::tempdir().unwrap();
        setup_test(
            base_dir.path(),
            vec![("a.js", "readable"), ("locked/b.js", "hidden")],
        );
        let locked = base_dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // permission bits do not apply to root
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let mut record = Record::default();
        let result = Deserializer::new(base_dir.path(), CONTENT_FILTER, &mut record)
            .and_then(|mut deserializer| deserializer.deserialize());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let doc = result.unwrap();
        assert!(record.skipped >= 1);
        assert_eq!(
            Node::Object(doc),
            object(vec![("a", leaf("readable")), ("locked", object(vec![]))])
        );
    }

    #[test]
    fn test_custom_filter() {
        let base_dir = tempfile::tempdir().unwrap();
        setup_test(
            base_dir.path(),
            vec![("language.js", "javascript"), ("validate.js", "fn")],
        );
        let doc = from_fs(base_dir.path(), "", "lang*").unwrap();
        assert_eq!(Node::Object(doc), object(vec![("language", leaf("javascript"))]));
    }

    #[test]
    fn test_file_dir_conflict() {
        let base_dir = tempfile::tempdir().unwrap();
        setup_test(base_dir.path(), vec![("x.js", "leaf"), ("x/y.js", "nested")]);

        match from_fs(base_dir.path(), "", CONTENT_FILTER) {
            Err(Error::Conflict { key_path }) => assert_eq!(key_path, "x"),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_key() {
        let base_dir = tempfile::tempdir().unwrap();
        setup_test(base_dir.path(), vec![("views/.js", "nameless")]);
        assert!(matches!(
            from_fs(base_dir.path(), "", CONTENT_FILTER),
            Err(Error::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_put() {
        let mut root = Object::new();
        put("views/by_name/map", leaf("m"), &mut root).unwrap();
        put("views/by_name/reduce", leaf("r"), &mut root).unwrap();
        put("language", leaf("javascript"), &mut root).unwrap();
        put("language", leaf("erlang"), &mut root).unwrap();
        // ensuring an existing object keeps its contents
        put("views", object(vec![]), &mut root).unwrap();
        put("views", object(vec![("other", leaf("o"))]), &mut root).unwrap();

        let expected = object(vec![
            ("language", leaf("erlang")),
            (
                "views",
                object(vec![
                    (
                        "by_name",
                        object(vec![("map", leaf("m")), ("reduce", leaf("r"))]),
                    ),
                    ("other", leaf("o")),
                ]),
            ),
        ]);
        assert_eq!(expected, Node::Object(root));
    }

    #[test]
    fn test_put_conflicts() {
        let mut root = Object::new();
        put("x", leaf("leaf"), &mut root).unwrap();
        match put("x/y", leaf("nested"), &mut root) {
            Err(Error::Conflict { key_path }) => assert_eq!(key_path, "x"),
            other => panic!("expected conflict, got {:?}", other),
        }
        assert!(matches!(
            put("x", object(vec![]), &mut root),
            Err(Error::Conflict { .. })
        ));
        assert_eq!(root["x"], leaf("leaf"));

        let mut root = Object::new();
        put("x/y", leaf("nested"), &mut root).unwrap();
        assert!(matches!(
            put("x", leaf("leaf"), &mut root),
            Err(Error::Conflict { .. })
        ));
        assert!(matches!(
            put("x", object(vec![("y", object(vec![]))]), &mut root),
            Err(Error::Conflict { key_path }) if key_path == "x/y"
        ));

        assert!(matches!(put("", leaf("x"), &mut root), Err(Error::InvalidKey { .. })));
    }
}
