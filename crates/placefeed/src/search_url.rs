// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Search URL construction.

use url::Url;

use crate::types::{LocationQuery, PlacefeedError, PlacefeedResult};

/// Base path of the map search endpoint.
pub const SEARCH_BASE: &str = "https://www.google.com/maps/search";

/// Build the search URL for a phrase, an optional area qualifier and a raw
/// coordinate/zoom token.
///
/// Only the phrase is percent-encoded; the token is appended verbatim after a `/`.
pub fn build_search_url(
    search_term: &str,
    area: Option<&str>,
    coordinate_zoom_token: &str,
) -> PlacefeedResult<String> {
    build_search_url_with_base(SEARCH_BASE, search_term, area, coordinate_zoom_token)
}

/// Same as [`build_search_url`] against an arbitrary absolute base path.
pub fn build_search_url_with_base(
    base: &str,
    search_term: &str,
    area: Option<&str>,
    coordinate_zoom_token: &str,
) -> PlacefeedResult<String> {
    let phrase = format!("{search_term}{}", area.unwrap_or_default());

    let mut url = Url::parse(base.trim_end_matches('/'))
        .map_err(|e| PlacefeedError::InvalidInput(format!("search base {base:?}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| PlacefeedError::InvalidInput(format!("search base {base:?} cannot hold a path")))?
        .pop_if_empty()
        .push(&phrase);

    Ok(format!("{url}/{coordinate_zoom_token}"))
}

/// Search URL for a [`LocationQuery`].
pub fn query_url(query: &LocationQuery) -> PlacefeedResult<String> {
    build_search_url(
        &query.search_term,
        query.area.as_deref(),
        &query.coordinate_zoom_token,
    )
}
