use futures::future::join_all;

use super::assets;
use super::cookies;
use super::report::StepOutcome;
use crate::common::config::ClearerConfig;
use crate::common::errors::EnvError;
use crate::env::{AppCacheStatus, BrowserEnv, NodeId};

/// Collapse per-item errors into a step outcome
fn settle(affected: usize, attempted: usize, errors: Vec<EnvError>) -> StepOutcome {
    match errors.first() {
        None => StepOutcome::done(affected),
        Some(first) => StepOutcome::failed(format!(
            "{} of {} operations failed; first: {}",
            errors.len(),
            attempted,
            first
        )),
    }
}

/// Remove every durable entry except the version marker
pub async fn sweep_durable(env: &BrowserEnv, marker_key: &str) -> StepOutcome {
    let keys = match env.durable.keys() {
        Ok(keys) => keys,
        Err(e) => return StepOutcome::failed(e.to_string()),
    };

    let targets: Vec<String> = keys.into_iter().filter(|k| k != marker_key).collect();
    let mut removed = 0usize;
    let mut errors = Vec::new();
    for key in &targets {
        match env.durable.remove(key) {
            Ok(()) => removed += 1,
            Err(e) => errors.push(e),
        }
    }
    settle(removed, targets.len(), errors)
}

pub async fn sweep_session(env: &BrowserEnv) -> StepOutcome {
    match env.session.clear() {
        Ok(count) => StepOutcome::done(count),
        Err(e) => StepOutcome::failed(e.to_string()),
    }
}

/// Expire every script-visible cookie across all reachable scopes
pub async fn purge_cookies(env: &BrowserEnv) -> StepOutcome {
    let raw = match env.cookies.read_all() {
        Ok(raw) => raw,
        Err(e) => return StepOutcome::failed(e.to_string()),
    };

    let location = env.document.location();
    let keys = cookies::cookie_keys(&raw);
    let mut attempted = 0usize;
    let mut errors = Vec::new();
    for key in &keys {
        for write in cookies::expiry_writes(key, &location) {
            attempted += 1;
            if let Err(e) = env.cookies.write(&write) {
                errors.push(e);
            }
        }
    }
    settle(keys.len(), attempted, errors)
}

/// Push the legacy application cache into its obsolete state
pub async fn retire_app_cache(env: &BrowserEnv) -> StepOutcome {
    let Some(app_cache) = env.capabilities.app_cache() else {
        return StepOutcome::Unsupported;
    };

    match app_cache.status() {
        AppCacheStatus::Uncached | AppCacheStatus::Obsolete => return StepOutcome::done(0),
        _ => {}
    }

    if let Err(e) = app_cache.update() {
        return StepOutcome::failed(e.to_string());
    }
    match app_cache.obsolete().await {
        Ok(()) => StepOutcome::done(1),
        Err(e) => StepOutcome::failed(e.to_string()),
    }
}

/// Unregister every background worker, concurrently
pub async fn unregister_workers(env: &BrowserEnv) -> StepOutcome {
    let Some(workers) = env.capabilities.workers() else {
        return StepOutcome::Unsupported;
    };

    let registrations = match workers.registrations().await {
        Ok(regs) => regs,
        Err(e) => return StepOutcome::failed(e.to_string()),
    };

    let results = join_all(registrations.iter().map(|reg| workers.unregister(reg))).await;
    let mut removed = 0usize;
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => errors.push(e),
        }
    }
    settle(removed, registrations.len(), errors)
}

/// Delete every named response cache, concurrently
pub async fn purge_cache_storage(env: &BrowserEnv) -> StepOutcome {
    let Some(caches) = env.capabilities.cache_storage() else {
        return StepOutcome::Unsupported;
    };

    let names = match caches.keys().await {
        Ok(names) => names,
        Err(e) => return StepOutcome::failed(e.to_string()),
    };

    let results = join_all(names.iter().map(|name| caches.delete(name))).await;
    let mut deleted = 0usize;
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(true) => deleted += 1,
            Ok(false) => {}
            Err(e) => errors.push(e),
        }
    }
    settle(deleted, names.len(), errors)
}

/// Give stylesheets, scripts and visible images a fresh URL so the
/// browser refetches them instead of serving its HTTP cache.
pub async fn bust_assets(env: &BrowserEnv, config: &ClearerConfig) -> StepOutcome {
    let doc = env.document.as_ref();
    let stamp = env.clock.now_millis();
    let param = config.cache_bust_param.as_str();
    let opted_out = |node: NodeId| doc.attribute(node, &config.opt_out_attribute).is_some();

    let mut busted = 0usize;
    let mut attempted = 0usize;
    let mut errors = Vec::new();

    // Stylesheets: swap in a busted copy, drop the original once it loads
    let mut pending: Vec<(NodeId, NodeId)> = Vec::new();
    for link in doc.elements_by_tag("link") {
        let is_sheet = doc
            .attribute(link, "rel")
            .is_some_and(|rel| assets::is_stylesheet_rel(&rel));
        let Some(href) = doc.attribute(link, "href") else {
            continue;
        };
        if !is_sheet || !assets::is_bustable(&href) || opted_out(link) {
            continue;
        }
        attempted += 1;
        let replaced = doc.clone_after(link).and_then(|copy| {
            doc.set_attribute(copy, "href", &assets::bust_url(&href, param, stamp))
                .map(|()| copy)
                .or_else(|e| doc.remove(copy).and(Err(e)))
        });
        match replaced {
            Ok(copy) => pending.push((link, copy)),
            Err(e) => errors.push(e),
        }
    }

    let loads = join_all(pending.iter().map(|(_, copy)| doc.loaded(*copy))).await;
    for ((original, copy), load) in pending.into_iter().zip(loads) {
        let swap = match load {
            Ok(()) => doc.remove(original),
            Err(e) => doc.remove(copy).and(Err(e)),
        };
        match swap {
            Ok(()) => busted += 1,
            Err(e) => errors.push(e),
        }
    }

    // Scripts: a new element is needed to trigger a fetch
    for script in doc.elements_by_tag("script") {
        let Some(src) = doc.attribute(script, "src") else {
            continue;
        };
        let is_self =
            !config.self_script_marker.is_empty() && src.contains(&config.self_script_marker);
        if !assets::is_bustable(&src) || is_self || opted_out(script) {
            continue;
        }
        attempted += 1;
        // Exactly one of original and copy stays in the document
        let replaced = doc.clone_after(script).and_then(|copy| {
            doc.set_attribute(copy, "src", &assets::bust_url(&src, param, stamp))
                .and_then(|()| doc.remove(script))
                .or_else(|e| doc.remove(copy).and(Err(e)))
        });
        match replaced {
            Ok(()) => busted += 1,
            Err(e) => errors.push(e),
        }
    }

    // Images: only what is on screen right now
    let viewport = doc.viewport();
    for img in doc.elements_by_tag("img") {
        let visible = doc
            .bounding_rect(img)
            .is_some_and(|rect| assets::in_viewport(&rect, &viewport));
        let Some(src) = doc.attribute(img, "src") else {
            continue;
        };
        if !visible || !assets::is_bustable(&src) || opted_out(img) {
            continue;
        }
        attempted += 1;
        match doc.set_attribute(img, "src", &assets::bust_url(&src, param, stamp)) {
            Ok(()) => busted += 1,
            Err(e) => errors.push(e),
        }
    }

    settle(busted, attempted, errors)
}
