/// User-agent navigation port. The session teardown path uses it to send the
/// user back to the login entry point.
pub(crate) trait Navigator: Send + Sync {
    fn go_to(&self, path: &str);
}

/// Full page navigation through `window.location`, which also drops any
/// in-memory UI state left over from the dead session.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct WindowNavigator;

impl Navigator for WindowNavigator {
    fn go_to(&self, path: &str) {
        if let Some(window) = web_sys::window() {
            if window.location().set_href(path).is_err() {
                tracing::warn!(path, "navigation rejected by the browser");
            }
        }
    }
}
