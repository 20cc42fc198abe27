// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Field parsers for the detail panel.
//!
//! The panel exposes no semantic field names; address and phone are read out
//! of item button labels and identifiers by position and colon-delimited
//! structure. Each field has exactly one function here so a markup change
//! only touches that function.

use crate::types::{NO_ADDRESS, NO_TITLE};

/// Title text, or [`NO_TITLE`] when the heading is missing or blank.
pub fn parse_title(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => NO_TITLE.to_string(),
    }
}

/// Address from the label of the first item button.
///
/// `"Address: Jl. Contoh No. 1"` yields `"Jl. Contoh No. 1"`. Everything after
/// the first colon is kept, so colons inside the address survive. A label with
/// no colon is used whole; a missing label yields [`NO_ADDRESS`].
pub fn parse_address(first_label: Option<&str>) -> String {
    let Some(label) = first_label else {
        return NO_ADDRESS.to_string();
    };
    match label.split_once(':') {
        Some((_, rest)) => rest.trim().to_string(),
        None => label.trim().to_string(),
    }
}

/// Phone number from the item button identifiers.
///
/// Picks the first identifier with at least three colon-separated segments and
/// returns segment 2 with its first hyphen removed (`"phone:tel:-0812345"`
/// yields `"0812345"`). Empty when nothing matches.
pub fn parse_phone<S: AsRef<str>>(identifiers: &[S]) -> String {
    identifiers
        .iter()
        .find_map(|id| id.as_ref().split(':').nth(2))
        .map(|segment| segment.replacen('-', "", 1))
        .unwrap_or_default()
}
