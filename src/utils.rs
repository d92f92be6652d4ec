use chrono::{Local, TimeZone, Utc};

#[cfg(feature = "gtk")]
pub use self::runtime::{run_async_to_main, RUNTIME};

#[cfg(feature = "gtk")]
mod runtime {
    use once_cell::sync::Lazy;

    pub static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("Failed to build Tokio runtime")
    });

    /// Runs `fut` on the tokio runtime and calls `done` with its output on the
    /// GTK main loop. Aborting the returned handle skips `done`.
    pub fn run_async_to_main<T, Fut, F>(fut: Fut, done: F) -> tokio::task::AbortHandle
    where
        T: Send + 'static,
        Fut: std::future::Future<Output = T> + Send + 'static,
        F: FnOnce(T) + 'static,
    {
        let handle = RUNTIME.spawn(fut);
        let abort = handle.abort_handle();
        glib::spawn_future_local(async move {
            match handle.await {
                Ok(out) => done(out),
                Err(e) if e.is_cancelled() => log::debug!("Background task cancelled"),
                Err(e) => log::error!("Background task failed: {e}"),
            }
        });
        abort
    }
}

pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

/// `http://host` becomes `ws://host`, `https://host` becomes `wss://host`.
pub fn derive_ws_url(api_url: &str) -> String {
    let api_url = normalize_url(api_url);
    if let Some(rest) = api_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = api_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        api_url
    }
}

pub fn now_secs() -> i64 {
    Utc::now().timestamp()
}

/// Local `HH:MM` for a fractional epoch timestamp.
pub fn format_clock(timestamp: f64) -> String {
    if !timestamp.is_finite() {
        return "--:--".to_string();
    }
    let secs = timestamp.floor() as i64;
    let nanos = ((timestamp - timestamp.floor()) * 1e9) as u32;
    match Local.timestamp_opt(secs, nanos).single() {
        Some(dt) => dt.format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_scheme_and_slash() {
        assert_eq!(normalize_url(" localhost:8000/ "), "http://localhost:8000");
        assert_eq!(normalize_url("https://chat.example.com"), "https://chat.example.com");
    }

    #[test]
    fn ws_url_follows_api_scheme() {
        assert_eq!(derive_ws_url("http://localhost:8000"), "ws://localhost:8000");
        assert_eq!(derive_ws_url("https://chat.example.com/"), "wss://chat.example.com");
    }

    #[test]
    fn clock_format_shape() {
        let s = format_clock(1714000000.5);
        assert_eq!(s.len(), 5);
        assert_eq!(&s[2..3], ":");
        assert_eq!(format_clock(f64::NAN), "--:--");
    }
}
