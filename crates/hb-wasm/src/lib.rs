//! WebAssembly bindings for HistoryBlock
//!
//! Exposes the pure `hb-core` strategies to the extension's JavaScript. Modes
//! are passed as their wire strings (`"domain"`, `"sha1"`, ...).

use std::sync::Once;

use hb_core::{
    entry_for, hash_for, matcher_for, EncryptionMode, HashStrategy, Matcher, MatchingMode, ParseModeError,
};
use wasm_bindgen::prelude::*;

// =============================================================================
// Logging
// =============================================================================

static LOGGER_INIT: Once = Once::new();

/// Route `log` output and panics to the browser console. Safe to call more
/// than once; later calls only change the level.
#[wasm_bindgen]
pub fn init_logging(verbose: bool) {
    LOGGER_INIT.call_once(|| {
        console_error_panic_hook::set_once();
        wasm_logger::init(wasm_logger::Config::new(log::Level::Debug));
    });
    log::set_max_level(if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    });
}

// =============================================================================
// Strategies
// =============================================================================

fn to_js(err: ParseModeError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn canonical_key_inner(url: &str, matching: &str) -> Result<Option<String>, ParseModeError> {
    let mode: MatchingMode = matching.parse()?;
    Ok(matcher_for(mode).match_url(url))
}

fn digest_inner(input: &str, encryption: &str) -> Result<String, ParseModeError> {
    let mode: EncryptionMode = encryption.parse()?;
    Ok(hash_for(mode).digest(input))
}

fn is_valid_entry_inner(entry: &str, encryption: &str) -> Result<bool, ParseModeError> {
    let mode: EncryptionMode = encryption.parse()?;
    Ok(hash_for(mode).test(entry))
}

fn is_blacklisted_inner<S: AsRef<str>>(
    url: &str,
    matching: &str,
    encryption: &str,
    entries: &[S],
) -> Result<bool, ParseModeError> {
    let matcher = matcher_for(matching.parse()?);
    let hash = hash_for(encryption.parse()?);
    Ok(match entry_for(matcher.as_ref(), hash.as_ref(), url) {
        Some(entry) => entries.iter().any(|e| e.as_ref() == entry),
        None => false,
    })
}

/// Canonical key of `url` under `matching`, or `undefined` if it has none.
#[wasm_bindgen]
pub fn canonical_key(url: &str, matching: &str) -> Result<Option<String>, JsValue> {
    canonical_key_inner(url, matching).map_err(to_js)
}

#[wasm_bindgen]
pub fn digest(input: &str, encryption: &str) -> Result<String, JsValue> {
    digest_inner(input, encryption).map_err(to_js)
}

/// Whether `entry` is a well-formed stored entry under `encryption`.
#[wasm_bindgen]
pub fn is_valid_entry(entry: &str, encryption: &str) -> Result<bool, JsValue> {
    is_valid_entry_inner(entry, encryption).map_err(to_js)
}

/// Registrable domain of `host`, or `undefined` for public suffixes.
#[wasm_bindgen]
pub fn registrable_domain(host: &str) -> Option<String> {
    hb_core::registrable_domain(host)
}

/// Check `url` against a blacklist given as an array of entry strings.
#[wasm_bindgen]
pub fn is_blacklisted(url: &str, matching: &str, encryption: &str, entries: JsValue) -> Result<bool, JsValue> {
    let entries: Vec<String> = js_sys::Array::from(&entries)
        .iter()
        .map(|value| {
            value
                .as_string()
                .ok_or_else(|| JsValue::from_str("Blacklist entries must be strings"))
        })
        .collect::<Result<_, _>>()?;

    is_blacklisted_inner(url, matching, encryption, &entries).map_err(to_js)
}
