use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tessera_db::{RecordStore, keys};
use tessera_types::models::Theme;
use tracing::info;
use uuid::Uuid;

use crate::error::{Result, StoreContext, TesseraError, decode_record, encode_record};

pub struct ThemePreset {
    pub name: &'static str,
    pub description: &'static str,
}

/// Themes the rotation cycles through, in order. The first one is the default.
pub const THEME_PRESETS: &[ThemePreset] = &[
    ThemePreset {
        name: "Cozy Reading Nook",
        description: "A quiet corner to get lost in a book.",
    },
    ThemePreset {
        name: "Sunlit Kitchen",
        description: "Morning light, fresh bread and too many plants.",
    },
    ThemePreset {
        name: "Home Office",
        description: "Somewhere you would actually want to work from.",
    },
    ThemePreset {
        name: "Garden Terrace",
        description: "Bring the outside in, or the inside out.",
    },
    ThemePreset {
        name: "Retro Game Room",
        description: "Arcade cabinets, bean bags and neon.",
    },
];

/// Owns the theme records and the pointer to the one that is active.
///
/// Replacing the active theme only flips flags and moves the pointer. Designs,
/// votes and leaderboards of past themes stay where they are.
pub struct ThemeManager {
    store: Arc<dyn RecordStore>,
    duration: Duration,
}

impl ThemeManager {
    pub fn new(store: Arc<dyn RecordStore>, duration: Duration) -> Self {
        Self { store, duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Creates and activates the first preset when no theme exists yet.
    /// Returns the created theme, or `None` if there already was one.
    pub fn initialize_default_theme(&self) -> Result<Option<Theme>> {
        let existing = self
            .store
            .set_members(keys::ALL_THEMES)
            .store_context("failed to list themes")?;
        if !existing.is_empty() || self.current_theme_id()?.is_some() {
            return Ok(None);
        }

        let theme = self.theme_from_preset(&THEME_PRESETS[0], Utc::now());
        self.schedule_next_theme(theme).map(Some)
    }

    pub fn get_current_theme(&self) -> Result<Option<Theme>> {
        match self.current_theme_id()? {
            Some(id) => self.get_theme(id),
            None => Ok(None),
        }
    }

    pub fn get_theme(&self, id: Uuid) -> Result<Option<Theme>> {
        let key = keys::theme(id);
        let raw = self
            .store
            .get(&key)
            .store_context(format!("failed to load theme {}", id))?;
        raw.map(|raw| decode_record(&key, &raw)).transpose()
    }

    pub fn require_theme(&self, id: Uuid) -> Result<Theme> {
        self.get_theme(id)?.ok_or(TesseraError::ThemeNotFound(id))
    }

    /// Every theme ever scheduled, oldest first.
    pub fn list_themes(&self) -> Result<Vec<Theme>> {
        let ids = self
            .store
            .set_members(keys::ALL_THEMES)
            .store_context("failed to list themes")?;

        let mut themes = Vec::with_capacity(ids.len());
        for id in ids.iter().filter_map(|id| id.parse::<Uuid>().ok()) {
            if let Some(theme) = self.get_theme(id)? {
                themes.push(theme);
            }
        }
        themes.sort_by_key(|theme| theme.start_time);
        Ok(themes)
    }

    pub fn get_time_remaining(&self, theme: &Theme) -> Duration {
        time_remaining_at(theme, Utc::now())
    }

    /// A theme built from a preset, starting at `start` and lasting the
    /// configured duration. Not stored until scheduled.
    pub fn theme_from_preset(&self, preset: &ThemePreset, start: DateTime<Utc>) -> Theme {
        Theme {
            id: Uuid::new_v4(),
            name: preset.name.to_string(),
            description: preset.description.to_string(),
            start_time: start,
            end_time: start + self.duration,
            active: false,
        }
    }

    /// Makes `new_theme` the active theme, deactivating the previous one.
    pub fn schedule_next_theme(&self, mut new_theme: Theme) -> Result<Theme> {
        if new_theme.end_time <= new_theme.start_time {
            return Err(TesseraError::InvalidThemeWindow);
        }

        match self.current_theme_id()? {
            Some(previous) if previous != new_theme.id => self.deactivate(previous)?,
            _ => {}
        }

        new_theme.active = true;
        let key = keys::theme(new_theme.id);
        let id = new_theme.id.to_string();
        self.store
            .set(&key, &encode_record(&key, &new_theme)?)
            .store_context("failed to store theme")?;
        self.store
            .set_add(keys::ALL_THEMES, &[&id])
            .store_context("failed to index theme")?;
        self.store
            .set(keys::CURRENT_THEME, &id)
            .store_context("failed to activate theme")?;

        info!("Theme \"{}\" is now active until {}", new_theme.name, new_theme.end_time);
        Ok(new_theme)
    }

    /// Advances to the next preset once the active theme has ended. With no
    /// theme at all, installs the default. Returns the theme that was activated.
    pub fn rotate_if_expired(&self, now: DateTime<Utc>) -> Result<Option<Theme>> {
        let Some(current) = self.get_current_theme()? else {
            return self.initialize_default_theme();
        };
        if now < current.end_time {
            return Ok(None);
        }

        let position = THEME_PRESETS
            .iter()
            .position(|preset| preset.name == current.name)
            .map_or(0, |i| (i + 1) % THEME_PRESETS.len());
        let next = self.theme_from_preset(&THEME_PRESETS[position], now);
        self.schedule_next_theme(next).map(Some)
    }

    fn current_theme_id(&self) -> Result<Option<Uuid>> {
        let raw = self
            .store
            .get(keys::CURRENT_THEME)
            .store_context("failed to read current theme")?;
        raw.map(|raw| {
            raw.parse::<Uuid>()
                .map_err(anyhow::Error::from)
                .store_context(format!("corrupt record at {}", keys::CURRENT_THEME))
        })
        .transpose()
    }

    fn deactivate(&self, id: Uuid) -> Result<()> {
        self.store
            .update(&keys::theme(id), &mut |current| {
                let Some(raw) = current else {
                    return Ok(None);
                };
                let mut theme: Theme = serde_json::from_str(&raw)?;
                theme.active = false;
                Ok(Some(serde_json::to_string(&theme)?))
            })
            .store_context(format!("failed to deactivate theme {}", id))?;
        Ok(())
    }
}

/// `max(0, end_time - now)`.
pub fn time_remaining_at(theme: &Theme, now: DateTime<Utc>) -> Duration {
    (theme.end_time - now).max(Duration::zero())
}
