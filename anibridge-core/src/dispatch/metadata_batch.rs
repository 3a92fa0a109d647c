//! Metadata-change batch processing: partition changes into series, season,
//! episode, and movie scope and refresh only the affected host items.

use std::collections::HashSet;

use tracing::{debug, info};

use anibridge_model::{EpisodeId, SeriesId};

use crate::error::Result;
use crate::host::{HostItemKind, ProviderTag};
use crate::info::{SeasonInfo, ShowInfo};

use super::{ChangeReason, DispatcherInner, MetadataEvent, MetadataScope};

pub(super) async fn process(
    inner: &DispatcherInner,
    key: &str,
    events: Vec<MetadataEvent>,
) -> Result<()> {
    if inner.scan_gate.is_scanning() {
        debug!(
            uid = %key,
            event_count = events.len(),
            "skipped metadata change events because a library scan is running"
        );
        return Ok(());
    }

    if !events.iter().any(|e| e.is_addressable()) {
        debug!(uid = %key, "no addressable series or episode ids, skipping");
        return Ok(());
    }
    let Some(series_id) = events.iter().find_map(|e| e.series_id) else {
        debug!(uid = %key, "no series id to anchor the refresh on, skipping");
        return Ok(());
    };

    // The incoming change supersedes whatever we had cached for the series.
    inner.resolver.invalidate_series(series_id);

    let Some(show) = inner.resolver.resolve_show_for_series(series_id).await? else {
        debug!(uid = %key, series_id = %series_id, "no show info for series, skipping");
        return Ok(());
    };
    let Some(season) = inner.resolver.resolve_season_by_id(series_id).await? else {
        debug!(uid = %key, series_id = %series_id, "no season info for series, skipping");
        return Ok(());
    };

    info!(uid = %key, event_count = events.len(), "processing metadata change events");

    let mut updates = refresh_series_scope(inner, &show, series_id, &events).await?;
    updates += refresh_movie_scope(inner, &season, &events).await?;

    info!(
        uid = %key,
        updates,
        event_count = events.len(),
        "scheduled updates for metadata change events"
    );
    Ok(())
}

/// Refresh show/season/episode items. A series-level change or an episode
/// removal invalidates the whole hierarchy's numbering, so everything
/// tagged with the series id refreshes; otherwise only the specific
/// episodes touched do.
async fn refresh_series_scope(
    inner: &DispatcherInner,
    show: &ShowInfo,
    series_id: SeriesId,
    events: &[MetadataEvent],
) -> Result<usize> {
    let mut updates = 0;

    let broad = events.iter().any(|e| {
        e.scope == MetadataScope::Series
            || (e.scope == MetadataScope::Episode && e.reason == ChangeReason::Removed)
    });
    if broad {
        for item in inner
            .host
            .items_tagged(ProviderTag::Series(series_id), None)
            .await
        {
            info!(item_id = %item.id, series_id = %series_id, "refreshing host item");
            inner.host.refresh_item(item.id, &inner.cancel).await?;
            updates += 1;
        }
        return Ok(updates);
    }

    let changed: HashSet<EpisodeId> = events
        .iter()
        .filter(|e| e.reason != ChangeReason::Removed)
        .filter_map(|e| e.episode_id)
        .collect();
    for season in &show.seasons {
        for episode_id in season.presentable_episode_ids() {
            if !changed.contains(&episode_id) {
                continue;
            }
            for item in inner
                .host
                .items_tagged(ProviderTag::Episode(episode_id), Some(HostItemKind::Episode))
                .await
            {
                info!(item_id = %item.id, episode_id = %episode_id, "refreshing host episode");
                inner.host.refresh_item(item.id, &inner.cancel).await?;
                updates += 1;
            }
        }
    }
    Ok(updates)
}

/// Movies map episode ids onto host movie items; refresh them identically.
async fn refresh_movie_scope(
    inner: &DispatcherInner,
    season: &SeasonInfo,
    events: &[MetadataEvent],
) -> Result<usize> {
    let changed: HashSet<EpisodeId> = events
        .iter()
        .filter(|e| e.reason != ChangeReason::Removed)
        .filter_map(|e| e.episode_id)
        .collect();

    let mut updates = 0;
    for episode_id in season.presentable_episode_ids() {
        if !changed.contains(&episode_id) {
            continue;
        }
        for item in inner
            .host
            .items_tagged(ProviderTag::Episode(episode_id), Some(HostItemKind::Movie))
            .await
        {
            info!(item_id = %item.id, episode_id = %episode_id, "refreshing host movie");
            inner.host.refresh_item(item.id, &inner.cancel).await?;
            updates += 1;
        }
    }
    Ok(updates)
}
