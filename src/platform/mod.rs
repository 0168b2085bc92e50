//! Platform abstraction layer
//!
//! Entry points for hosts that talk JSON rather than Rust types. The
//! browser bindings live in `web` and only build for wasm32; everything they
//! call is plain Rust so it can be tested natively.

use crate::error::Result;
use crate::settings::EngineSettings;
use crate::sim::OutcomeSearch;

/// Plan a drop and return the outcome as JSON
///
/// `target` of `None` runs a classic search. An empty `settings_json` uses the
/// default board.
pub fn plan_drop_json(target: Option<usize>, seed: u64, settings_json: &str) -> Result<String> {
    let settings = if settings_json.trim().is_empty() {
        EngineSettings::default()
    } else {
        EngineSettings::from_json(settings_json)?
    };
    let engine = OutcomeSearch::new(&settings)?;
    let outcome = match target {
        Some(slot) => engine.search(slot, seed)?,
        None => engine.search_classic(seed)?,
    };
    Ok(outcome.to_json()?)
}

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            // Logger already installed by the host page
            return;
        }
        log::info!("Plinko drop engine loaded");
    }

    /// Plan a drop for `target` (negative for classic mode)
    #[wasm_bindgen]
    pub fn plan_drop(target: i32, seed: u64, settings_json: &str) -> Result<String, JsValue> {
        let target = usize::try_from(target).ok();
        super::plan_drop_json(target, seed, settings_json).map_err(|e| {
            log::error!("plan_drop failed: {}", e);
            JsValue::from_str(&e.to_string())
        })
    }
}
