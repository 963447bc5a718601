use crate::config;

/// Settings plus the reason defaults were used instead, if they were.
pub struct Loaded {
    pub settings: config::Settings,
    pub fallback: Option<String>,
}

/// Load settings, apply the command-line engine address, and fall back to
/// defaults when the result is unusable. Config is optional; failures should
/// not prevent the app from starting.
pub fn load_settings(base_url: Option<&str>) -> Loaded {
    let (mut settings, mut fallback) = match config::Settings::load() {
        Ok(s) => (s, None),
        Err(e) => (
            config::Settings::default(),
            Some(format!("failed to load config, using defaults: {e}")),
        ),
    };

    if let Some(url) = base_url {
        settings.engine.base_url = url.to_string();
    }

    if let Err(msg) = settings.validate() {
        fallback = Some(format!("invalid config, using defaults: {msg}"));
        let engine = settings.engine.clone();
        settings = config::Settings::default();
        // Keep an explicit engine address if it is the part that is valid.
        if base_url.is_some() && !engine.base_url.trim().is_empty() {
            settings.engine.base_url = engine.base_url;
        }
    }

    Loaded { settings, fallback }
}
