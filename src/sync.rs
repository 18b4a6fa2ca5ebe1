use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::path::document_dir_name;
use crate::remote::{DocumentStore, StoreReceipt};
use crate::{from_fs, to_fs, CONTENT_FILTER, CONTENT_SUFFIX, ID_KEY, REV_KEY};

/// Fetches `id` and writes it to `base/database/<name>`, returning that directory.
///
/// `<name>` is the document id without its `_design/` prefix, taken from the fetched `_id`.
pub fn download(
    store: &impl DocumentStore,
    base: &Path,
    database: &str,
    id: &str,
) -> Result<PathBuf> {
    let doc = store.fetch(id)?;
    let doc_id = doc
        .get(ID_KEY)
        .and_then(|id| id.as_leaf())
        .ok_or(Error::MissingId)?;

    let database_dir = base.join(database);
    let name = document_dir_name(doc_id)?;
    let dir = database_dir.join(name);
    tracing::info!("downloading files to: {}", database_dir.display());
    fs::create_dir_all(&dir).map_err(|err| Error::io(&dir, err))?;

    to_fs(&doc, &database_dir, name)?;
    Ok(dir)
}

/// Reads `base/database/<name>` and stores it as `id`, then records the new revision in
/// `_rev.js`.
///
/// With `ignore_rev` the `_rev` read from disk is not sent, which lets a document be pushed over
/// a newer revision. The sidecar is rewritten either way.
pub fn upload(
    store: &impl DocumentStore,
    base: &Path,
    database: &str,
    id: &str,
    ignore_rev: bool,
) -> Result<StoreReceipt> {
    let dir = base.join(database).join(document_dir_name(id)?);
    tracing::info!("path to recurse: {}", dir.display());

    let mut doc = from_fs(&dir, "", CONTENT_FILTER)?;
    if ignore_rev {
        doc.remove(REV_KEY);
    }

    let receipt = store.store(id, &doc)?;
    tracing::info!(id = %receipt.id, rev = %receipt.rev, ok = receipt.ok, "stored");

    let sidecar = dir.join(format!("{}{}", REV_KEY, CONTENT_SUFFIX));
    fs::write(&sidecar, &receipt.rev).map_err(|err| Error::io(&sidecar, err))?;
    Ok(receipt)
}
