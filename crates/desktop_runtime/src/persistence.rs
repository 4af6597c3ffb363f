//! Durable mirror of the desktop layout.
//!
//! The record lives under one storage key as `{theme, windows, iconPositions}` JSON. Loads are
//! validated field by field: a field that fails validation is dropped (the store keeps its
//! default) and the remaining fields are still applied. A record that is not a JSON object is
//! deleted. A record with invalid fields is kept until the runtime rewrites it from the repaired
//! state. Saves never raise; failures are logged.

use std::collections::BTreeMap;
use std::rc::Rc;

use futures::future::{self, FutureExt, LocalBoxFuture};
use leptos::logging;
use platform_host::{DesktopStorage, StorageError};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{
    AppId, DesktopState, PersistedDesktop, Position, RestoredDesktop, Theme, WindowRecord,
};

const THEME_FIELD: &str = "theme";
const WINDOWS_FIELD: &str = "windows";
const ICON_POSITIONS_FIELD: &str = "iconPositions";

/// Largest coordinate or extent magnitude accepted from a stored record.
pub const MAX_STORED_COORDINATE: i32 = 1 << 20;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("desktop record encode failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("desktop record is corrupt: {0}")]
    Corrupt(String),
}

/// Result of decoding a stored record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedDesktop {
    pub restored: RestoredDesktop,
    /// Fields that were present but failed validation.
    pub invalid_fields: Vec<&'static str>,
}

impl DecodedDesktop {
    /// Whether the stored record should be rewritten from the repaired state.
    pub fn needs_rewrite(&self) -> bool {
        !self.invalid_fields.is_empty()
    }
}

/// Serializes the durable projection of `state`.
pub fn encode_desktop(state: &DesktopState) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(&PersistedDesktop::from_state(state))?)
}

/// Parses a stored record.
///
/// # Errors
///
/// [`PersistenceError::Corrupt`] when the text is not JSON or not a JSON object. Invalid
/// individual fields are reported through [`DecodedDesktop::invalid_fields`] instead.
pub fn decode_desktop(raw: &str) -> Result<DecodedDesktop, PersistenceError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| PersistenceError::Corrupt(e.to_string()))?;
    let Value::Object(mut fields) = value else {
        return Err(PersistenceError::Corrupt("record is not an object".into()));
    };

    let mut decoded = DecodedDesktop::default();
    decoded.restored.theme = take_field::<Theme>(&mut fields, THEME_FIELD, &mut decoded);
    decoded.restored.windows =
        take_field::<Vec<WindowRecord>>(&mut fields, WINDOWS_FIELD, &mut decoded)
            .and_then(|windows| {
                let valid = windows.iter().all(window_geometry_in_range);
                accept_if(valid, windows, WINDOWS_FIELD, &mut decoded)
            });
    decoded.restored.icon_positions =
        take_field::<Vec<(AppId, Position)>>(&mut fields, ICON_POSITIONS_FIELD, &mut decoded)
            .and_then(|pairs| {
                let valid = pairs.iter().all(|(_, position)| position_in_range(*position));
                accept_if(valid, pairs, ICON_POSITIONS_FIELD, &mut decoded)
            })
            .map(|pairs| pairs.into_iter().collect::<BTreeMap<_, _>>());
    Ok(decoded)
}

fn coordinate_in_range(value: i32) -> bool {
    (-MAX_STORED_COORDINATE..=MAX_STORED_COORDINATE).contains(&value)
}

fn position_in_range(position: Position) -> bool {
    coordinate_in_range(position.x) && coordinate_in_range(position.y)
}

fn window_geometry_in_range(window: &WindowRecord) -> bool {
    let extent = 1..=MAX_STORED_COORDINATE;
    position_in_range(window.position)
        && extent.contains(&window.size.width)
        && extent.contains(&window.size.height)
}

fn accept_if<T>(
    valid: bool,
    value: T,
    name: &'static str,
    decoded: &mut DecodedDesktop,
) -> Option<T> {
    if valid {
        return Some(value);
    }
    logging::warn!("persisted desktop field `{name}` ignored: geometry out of range");
    decoded.invalid_fields.push(name);
    None
}

fn take_field<T: DeserializeOwned>(
    fields: &mut Map<String, Value>,
    name: &'static str,
    decoded: &mut DecodedDesktop,
) -> Option<T> {
    let value = fields.remove(name)?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            logging::warn!("persisted desktop field `{name}` ignored: {err}");
            decoded.invalid_fields.push(name);
            None
        }
    }
}

/// Cancellable deadline for the next debounced save.
///
/// Re-arming replaces the deadline, so a burst of changes produces one write once the stream has
/// been quiet for the debounce window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveSchedule {
    debounce_ms: u64,
    due_at_ms: Option<u64>,
}

impl SaveSchedule {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            debounce_ms,
            due_at_ms: None,
        }
    }

    pub fn arm(&mut self, now_ms: u64) {
        self.due_at_ms = Some(now_ms.saturating_add(self.debounce_ms));
    }

    pub fn cancel(&mut self) {
        self.due_at_ms = None;
    }

    pub fn due_at_ms(&self) -> Option<u64> {
        self.due_at_ms
    }

    /// Clears and reports the deadline if it has passed.
    pub fn take_due(&mut self, now_ms: u64) -> bool {
        match self.due_at_ms {
            Some(due) if now_ms >= due => {
                self.due_at_ms = None;
                true
            }
            _ => false,
        }
    }
}

/// Reads and writes the desktop record through a [`DesktopStorage`] host service.
pub struct PersistenceAdapter {
    storage: Rc<dyn DesktopStorage>,
    key: Rc<str>,
    schedule: SaveSchedule,
}

impl PersistenceAdapter {
    pub fn new(storage: Rc<dyn DesktopStorage>, key: &str, debounce_ms: u64) -> Self {
        Self {
            storage,
            key: Rc::from(key),
            schedule: SaveSchedule::new(debounce_ms),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn schedule(&self) -> &SaveSchedule {
        &self.schedule
    }

    /// Arms (or re-arms) the debounced save.
    pub fn schedule_save(&mut self, now_ms: u64) {
        self.schedule.arm(now_ms);
    }

    pub fn cancel_scheduled_save(&mut self) {
        self.schedule.cancel();
    }

    /// Returns a save job for `state` if the debounce window has elapsed.
    pub fn poll(
        &mut self,
        now_ms: u64,
        state: &DesktopState,
    ) -> Option<LocalBoxFuture<'static, ()>> {
        self.schedule.take_due(now_ms).then(|| self.save_job(state))
    }

    /// Builds a detached write of `state`. The job logs failures instead of returning them.
    pub fn save_job(&self, state: &DesktopState) -> LocalBoxFuture<'static, ()> {
        let raw = match encode_desktop(state) {
            Ok(raw) => raw,
            Err(err) => {
                logging::warn!("desktop save skipped: {err}");
                return future::ready(()).boxed_local();
            }
        };
        let storage = Rc::clone(&self.storage);
        let key = Rc::clone(&self.key);
        async move {
            if let Err(err) = storage.save_entry(&key, &raw).await {
                logging::warn!("desktop save failed: {err}");
            }
        }
        .boxed_local()
    }

    /// Writes `state` and reports the outcome.
    pub async fn save_desktop(&self, state: &DesktopState) -> Result<(), PersistenceError> {
        let raw = encode_desktop(state)?;
        self.storage.save_entry(&self.key, &raw).await?;
        Ok(())
    }

    /// Loads the stored record.
    ///
    /// Returns `Ok(None)` when nothing is stored or the entry is corrupt, in which case it is
    /// deleted. A record with invalid fields is returned with those fields dropped and listed in
    /// [`DecodedDesktop::invalid_fields`]; the entry itself is left for the caller to rewrite.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Storage`] when the backend read fails.
    pub async fn load_desktop(&self) -> Result<Option<DecodedDesktop>, PersistenceError> {
        self.load_job().await
    }

    /// Detached form of [`PersistenceAdapter::load_desktop`] that does not borrow the adapter.
    pub fn load_job(
        &self,
    ) -> LocalBoxFuture<'static, Result<Option<DecodedDesktop>, PersistenceError>> {
        load_record(Rc::clone(&self.storage), Rc::clone(&self.key)).boxed_local()
    }
}

async fn load_record(
    storage: Rc<dyn DesktopStorage>,
    key: Rc<str>,
) -> Result<Option<DecodedDesktop>, PersistenceError> {
    let Some(raw) = storage.load_entry(&key).await? else {
        return Ok(None);
    };

    match decode_desktop(&raw) {
        Ok(decoded) => Ok(Some(decoded)),
        Err(err) => {
            logging::warn!("discarding stored desktop: {err}");
            discard_entry(storage.as_ref(), &key).await;
            Ok(None)
        }
    }
}

async fn discard_entry(storage: &dyn DesktopStorage, key: &str) {
    if let Err(err) = storage.delete_entry(key).await {
        logging::warn!("failed to delete corrupt desktop entry: {err}");
    }
}
