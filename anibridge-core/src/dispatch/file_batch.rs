//! File-change batch processing: link reconciliation, relocation handling,
//! and minimal host notification.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace};

use anibridge_config::LibraryFolder;
use anibridge_model::{FileId, SeriesId};

use crate::error::Result;
use crate::host::ProviderTag;
use crate::vfs::LinkResult;

use super::{ChangeReason, DispatcherInner, FileEvent};

pub(super) async fn process(
    inner: &DispatcherInner,
    file_id: FileId,
    events: Vec<FileEvent>,
) -> Result<()> {
    if inner.scan_gate.is_scanning() {
        info!(
            file_id = %file_id,
            event_count = events.len(),
            "skipped file change events because a library scan is running"
        );
        return Ok(());
    }

    info!(file_id = %file_id, event_count = events.len(), "processing file change events");
    inner.resolver.invalidate_file(file_id);

    let series_ids = series_ids_for_file(inner, file_id, &events).await?;
    let Some(last) = events.last() else {
        return Ok(());
    };

    let mut leaf_paths: Vec<PathBuf> = Vec::new();
    // Media root to one representative entry; one broad rescan per folder.
    let mut broad_rescans: HashMap<PathBuf, PathBuf> = HashMap::new();

    if last.reason != ChangeReason::Removed {
        trace!(file_id = %file_id, "processing file changed");
        for folder in covering_folders(&inner.folders, last) {
            let Some(source) = physical_source(folder, &last.relative_path) else {
                continue;
            };
            if !source.exists() {
                continue;
            }
            match &folder.virtual_root {
                // No virtual layer: the host watches the physical path.
                None => leaf_paths.push(source),
                Some(vfs_root) => {
                    reconcile(
                        inner,
                        folder,
                        vfs_root,
                        Some(source.as_path()),
                        file_id,
                        &series_ids,
                        &mut leaf_paths,
                        &mut broad_rescans,
                    )
                    .await?;
                }
            }
        }
    } else if let Some(removed) = events.iter().find(|e| e.reason == ChangeReason::Removed) {
        trace!(file_id = %file_id, "processing file removed");
        for folder in covering_folders(&inner.folders, removed) {
            match &folder.virtual_root {
                None => {
                    if let Some(source) = physical_source(folder, &removed.relative_path) {
                        leaf_paths.push(source);
                    }
                }
                Some(vfs_root) => {
                    // A surviving location for the same file id means this
                    // was a move, not a deletion: regenerate links against
                    // the new source instead of tearing everything down.
                    let survivor =
                        surviving_source(inner, folder, file_id, &removed.relative_path).await?;
                    reconcile(
                        inner,
                        folder,
                        vfs_root,
                        survivor.as_deref(),
                        file_id,
                        &series_ids,
                        &mut leaf_paths,
                        &mut broad_rescans,
                    )
                    .await?;
                }
            }
        }
    }

    if inner.scan_gate.is_scanning() {
        debug!(
            file_id = %file_id,
            change_count = leaf_paths.len(),
            "skipped notifying the host because a library scan is running"
        );
        return Ok(());
    }

    debug!(
        file_id = %file_id,
        change_count = leaf_paths.len() + broad_rescans.len(),
        "notifying the host about changes"
    );
    for path in &leaf_paths {
        inner.host.report_path_changed(path).await;
    }
    for representative in broad_rescans.values() {
        inner.host.report_path_changed(representative).await;
    }
    Ok(())
}

/// Series ids the file belongs to: preferably from the newest event that
/// carried resolved cross-references, else from a fresh fetch. Series with
/// no other local presence are dropped unless that would drop everything.
async fn series_ids_for_file(
    inner: &DispatcherInner,
    file_id: FileId,
    events: &[FileEvent],
) -> Result<Vec<SeriesId>> {
    let ids: Vec<SeriesId> = match events.iter().rev().find(|e| e.has_cross_references()) {
        Some(event) => event.series_ids(),
        None => match inner.client.get_file(file_id).await? {
            Some(file) => file.series_ids(),
            None => Vec::new(),
        },
    };

    let mut locally_present = Vec::new();
    for &series_id in &ids {
        let paths = inner.resolver.series_paths(series_id).await?;
        if !paths.paths.is_empty() {
            locally_present.push(series_id);
        }
    }
    Ok(if locally_present.is_empty() {
        ids
    } else {
        locally_present
    })
}

fn covering_folders<'a>(
    folders: &'a [LibraryFolder],
    event: &'a FileEvent,
) -> impl Iterator<Item = &'a LibraryFolder> {
    folders
        .iter()
        .filter(|folder| folder.covers(event.import_folder_id, &event.relative_path))
}

/// Physical path of a catalog-relative location under a library folder.
fn physical_source(folder: &LibraryFolder, relative_path: &str) -> Option<PathBuf> {
    let remainder = relative_path.strip_prefix(folder.import_folder_subpath.as_str())?;
    Some(folder.media_path.join(remainder.trim_start_matches('/')))
}

/// Another accessible location of the file within the same import folder
/// mapping, excluding the one that was just removed.
async fn surviving_source(
    inner: &DispatcherInner,
    folder: &LibraryFolder,
    file_id: FileId,
    removed_relative_path: &str,
) -> Result<Option<PathBuf>> {
    let Some(file) = inner.client.get_file(file_id).await? else {
        return Ok(None);
    };
    for location in &file.locations {
        if !folder.covers(location.import_folder_id, &location.relative_path)
            || location.relative_path == removed_relative_path
        {
            continue;
        }
        if let Some(source) = physical_source(folder, &location.relative_path) {
            if source.exists() {
                return Ok(Some(source));
            }
        }
    }
    Ok(None)
}

/// Bring the virtual link set for one file in line with the desired state:
/// materialize links for `source` (when present), remove host-known links
/// the new set no longer contains, and record what to tell the host.
#[allow(clippy::too_many_arguments)]
async fn reconcile(
    inner: &DispatcherInner,
    folder: &LibraryFolder,
    vfs_root: &Path,
    source: Option<&Path>,
    file_id: FileId,
    series_ids: &[SeriesId],
    leaf_paths: &mut Vec<PathBuf>,
    broad_rescans: &mut HashMap<PathBuf, PathBuf>,
) -> Result<()> {
    let mut result = LinkResult::default();
    let mut new_links: HashSet<PathBuf> = HashSet::new();
    let mut top_folders: HashSet<PathBuf> = HashSet::new();

    if let Some(source) = source {
        for &series_id in series_ids {
            let locations = inner
                .linker
                .generate_locations(folder.collection, vfs_root, source, file_id, series_id)
                .await?;
            let Some(imported_at) = locations.imported_at else {
                continue;
            };
            if locations.link_paths.is_empty() {
                continue;
            }
            result += inner
                .linker
                .materialize(source, &locations.link_paths, imported_at)
                .await?;
            for link in &locations.link_paths {
                if let Some(top) = top_folder(vfs_root, link) {
                    top_folders.insert(top);
                }
                new_links.insert(link.clone());
            }
        }
    }

    // Remove old links for the file.
    let mut removed_paths = Vec::new();
    for item in inner.host.items_tagged(ProviderTag::File(file_id), None).await {
        let Some(path) = item.path else {
            continue;
        };
        if !path.starts_with(vfs_root) || new_links.contains(&path) {
            trace!(path = %path.display(), "keeping host entry");
            continue;
        }
        trace!(path = %path.display(), "removing stale link");
        inner.linker.remove_link(&path).await?;
        result.removed += 1;
        if let Some(top) = top_folder(vfs_root, &path) {
            top_folders.insert(top);
        }
        removed_paths.push(path);
    }

    result.log_summary(&folder.media_path);

    leaf_paths.extend(removed_paths);

    // Surgical refresh only works when every touched top-level virtual
    // folder already exists as a host item; otherwise hand the host a
    // representative entry so it rescans the media folder.
    let mut all_known = true;
    for top in &top_folders {
        if inner.host.find_by_path(top).await.is_none() {
            all_known = false;
            break;
        }
    }
    if all_known {
        leaf_paths.extend(new_links);
    } else if let Some(entry) = inner.host.first_entry_under(&folder.media_path).await {
        broad_rescans
            .entry(folder.media_path.clone())
            .or_insert(entry);
    }
    Ok(())
}

/// The top-level virtual directory a link lives under.
fn top_folder(vfs_root: &Path, link: &Path) -> Option<PathBuf> {
    let first = link.strip_prefix(vfs_root).ok()?.components().next()?;
    Some(vfs_root.join(first))
}
