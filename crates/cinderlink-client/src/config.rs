//! Explicit UI context.
//!
//! Locale and theme used to be ambient module state in earlier revisions of
//! the frontend; here they are a plain value built once at process start and
//! passed into view construction. Sessions never reach for globals.

/// Supported UI locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    /// English (fallback).
    #[default]
    En,
    /// Turkish.
    Tr,
    /// German.
    De,
}

/// UI color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Light theme.
    #[default]
    Light,
    /// Dark theme.
    Dark,
}

/// Per-process view configuration.
///
/// Built once at startup and threaded through session constructors. The
/// `public_host` is the base under which share links are composed; it may
/// differ from the API endpoint the transport talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiContext {
    /// Base host for composed share links, e.g. `https://secrets.example`.
    pub public_host: String,
    /// Active locale for user-facing messages.
    pub locale: Locale,
    /// Active color theme.
    pub theme: Theme,
}

impl UiContext {
    /// Create a context with default locale and theme.
    pub fn new(public_host: impl Into<String>) -> Self {
        Self { public_host: public_host.into(), locale: Locale::default(), theme: Theme::default() }
    }

    /// Override the locale.
    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Override the theme.
    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }
}
