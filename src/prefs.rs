//! Watchlist and reporting-period preferences shared by the views.
//!
//! The store is owned by the app and handed to whoever needs it; listeners
//! register explicitly and are told about every change.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::nav::Period;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, rename = "watchlist-ids")]
    pub watchlist: BTreeSet<String>,
    #[serde(default)]
    pub period: Option<Period>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&Preferences)>;

pub struct PreferenceStore {
    prefs: Preferences,
    path: Option<PathBuf>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl PreferenceStore {
    pub fn in_memory() -> Self {
        Self::with_prefs(Preferences::default(), None)
    }

    /// Loads preferences from `path`. A missing or unreadable file starts
    /// from defaults; later changes are still written back to `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let prefs = match load(&path) {
            Ok(prefs) => prefs,
            Err(error) => {
                if path.exists() {
                    warn!(path = %path.display(), "ignoring unreadable preferences: {error:#}");
                }
                Preferences::default()
            }
        };
        Self::with_prefs(prefs, Some(path))
    }

    fn with_prefs(prefs: Preferences, path: Option<PathBuf>) -> Self {
        Self {
            prefs,
            path,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    pub fn is_watched(&self, id: &str) -> bool {
        self.prefs.watchlist.contains(id)
    }

    /// Adds or removes `id` from the watchlist. Returns whether it is now watched.
    pub fn toggle_watch(&mut self, id: &str) -> bool {
        let watched = if self.prefs.watchlist.remove(id) {
            false
        } else {
            self.prefs.watchlist.insert(id.to_owned());
            true
        };
        self.changed();
        watched
    }

    pub fn period(&self) -> Option<Period> {
        self.prefs.period
    }

    pub fn set_period(&mut self, period: Option<Period>) {
        if self.prefs.period == period {
            return;
        }
        self.prefs.period = period;
        self.changed();
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Preferences) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    fn changed(&mut self) {
        if let Some(path) = &self.path
            && let Err(error) = save(path, &self.prefs)
        {
            warn!("failed to persist preferences: {error:#}");
        }
        for (_, listener) in &mut self.listeners {
            listener(&self.prefs);
        }
    }
}

fn load(path: &Path) -> Result<Preferences> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let prefs = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    debug!(path = %path.display(), "loaded preferences");
    Ok(prefs)
}

fn save(path: &Path, prefs: &Preferences) -> Result<()> {
    let raw = serde_json::to_string_pretty(prefs)?;
    fs::write(path, raw).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("entity-map-{}-{name}.json", std::process::id()))
    }

    #[test]
    fn toggling_twice_unwatches() {
        let mut store = PreferenceStore::in_memory();
        assert!(store.toggle_watch("b-1"));
        assert!(store.is_watched("b-1"));
        assert!(!store.toggle_watch("b-1"));
        assert!(!store.is_watched("b-1"));
    }

    #[test]
    fn listeners_hear_changes_until_unsubscribed() {
        let mut store = PreferenceStore::in_memory();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = store.subscribe(move |prefs| sink.borrow_mut().push(prefs.period));

        store.set_period(Some(Period::FourWeeks));
        store.set_period(Some(Period::FourWeeks));
        assert!(store.unsubscribe(id));
        store.set_period(None);

        assert_eq!(*seen.borrow(), vec![Some(Period::FourWeeks)]);
        assert!(!store.unsubscribe(id));
    }

    #[test]
    fn persists_and_reloads() {
        let path = temp_path("persist");
        let mut store = PreferenceStore::open(&path);
        store.toggle_watch("s007");
        store.set_period(Some(Period::TwelveWeeks));

        let reopened = PreferenceStore::open(&path);
        assert!(reopened.is_watched("s007"));
        assert_eq!(reopened.period(), Some(Period::TwelveWeeks));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("watchlist-ids"));
        assert!(raw.contains("\"12w\""));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let path = temp_path("corrupt");
        fs::write(&path, "{not json").unwrap();
        let store = PreferenceStore::open(&path);
        assert_eq!(store.prefs(), &Preferences::default());
        let _ = fs::remove_file(path);
    }
}
