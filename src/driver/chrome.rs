use crate::config::BrowserConfig;
use crate::driver::PageDriver;
use crate::errors::{E2eError, Result};
use crate::locate::{self, Locator};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::Deserialize;
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

/// Watches fetch/XHR traffic so network-idle can be polled from Rust.
/// Installed once per document; re-running it is a no-op.
const NETWORK_MONITOR: &str = r#"
(function() {
    if (window.__netWatch) return true;
    const state = { inflight: 0, last: Date.now() };
    window.__netWatch = state;
    const settle = () => {
        state.inflight = Math.max(0, state.inflight - 1);
        state.last = Date.now();
    };
    const originalFetch = window.fetch;
    window.fetch = function(...args) {
        state.inflight++;
        state.last = Date.now();
        return originalFetch.apply(this, args).then(
            (response) => { settle(); return response; },
            (error) => { settle(); throw error; });
    };
    const originalOpen = XMLHttpRequest.prototype.open;
    XMLHttpRequest.prototype.open = function(...args) {
        this.addEventListener('loadend', settle);
        return originalOpen.apply(this, args);
    };
    const originalSend = XMLHttpRequest.prototype.send;
    XMLHttpRequest.prototype.send = function(...args) {
        state.inflight++;
        state.last = Date.now();
        return originalSend.apply(this, args);
    };
    return true;
})()
"#;

const NETWORK_PROBE: &str = r#"
(function() {
    const state = window.__netWatch;
    if (!state) return { inflight: 0, quiet_ms: 1000000 };
    return { inflight: state.inflight, quiet_ms: Date.now() - state.last };
})()
"#;

#[derive(Debug, Deserialize)]
struct NetProbe {
    inflight: i64,
    quiet_ms: f64,
}

/// [`PageDriver`] over a local Chrome via `headless_chrome`. Every
/// interaction is a single self-contained JS evaluation: element handles
/// cannot cross the CDP value boundary, so each script finds its target,
/// acts, and reports back a JSON value.
pub struct ChromeDriver {
    // Field is only held so the browser process outlives the tab.
    _browser: Browser,
    tab: Arc<Tab>,
    session: Uuid,
}

impl ChromeDriver {
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let window_size_arg = format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        );

        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={ua}"));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&window_size_arg),
        ];

        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }

        for arg in &config.args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .args(args)
            .idle_browser_timeout(Duration::from_millis(config.launch_timeout_ms.max(30000)))
            .build()
            .map_err(|e| E2eError::LaunchFailed(e.to_string()))?;

        let browser =
            Browser::new(launch_options).map_err(|e| E2eError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| E2eError::LaunchFailed(e.to_string()))?;

        let session = Uuid::new_v4();
        info!(%session, headless = config.headless, "chrome session started");

        Ok(Self {
            _browser: browser,
            tab,
            session,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session
    }

    fn eval(&self, script: &str) -> Result<Value> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| E2eError::JavaScriptFailed(e.to_string()))?;
        Ok(result.value.unwrap_or(Value::Null))
    }

    fn eval_action(&self, locator: &Locator, epilogue: &str) -> Result<Value> {
        self.eval(&locate::script_for(locator, epilogue))
    }

    /// Interpret `{ ok: bool }` action results, mapping a missing target
    /// to [`E2eError::ElementNotFound`].
    fn require_ok(&self, locator: &Locator, value: Value) -> Result<()> {
        let ok = value
            .get("ok")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if ok {
            Ok(())
        } else {
            Err(E2eError::ElementNotFound(locator.to_string()))
        }
    }
}

#[async_trait]
impl PageDriver for ChromeDriver {
    async fn goto(&self, url: &str) -> Result<()> {
        info!(session = %self.session, url, "navigating");
        self.tab
            .navigate_to(url)
            .map_err(|e| E2eError::NavigationFailed(e.to_string()))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| E2eError::NavigationFailed(e.to_string()))?;
        self.eval(NETWORK_MONITOR)?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.tab.get_url())
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        let value = self.eval_action(locator, "return els.length;")?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool> {
        let value = self.eval_action(locator, "return els.length > 0;")?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        debug!(session = %self.session, %locator, "click");
        let value = self.eval_action(
            locator,
            r#"if (els.length === 0) return { ok: false };
  const el = els[0];
  el.scrollIntoView({ block: 'center' });
  el.click();
  return { ok: true };"#,
        )?;
        self.require_ok(locator, value)
    }

    async fn clear_text(&self, locator: &Locator) -> Result<()> {
        // React-controlled inputs ignore direct value writes; go through
        // the native prototype setter and fire the events the framework
        // listens for.
        let value = self.eval_action(
            locator,
            r#"if (els.length === 0) return { ok: false };
  const el = els[0];
  el.focus();
  const desc = Object.getOwnPropertyDescriptor(window.HTMLInputElement.prototype, 'value');
  if (desc && desc.set && el instanceof HTMLInputElement) { desc.set.call(el, ''); } else { el.value = ''; }
  el.dispatchEvent(new Event('input', { bubbles: true }));
  el.dispatchEvent(new Event('change', { bubbles: true }));
  return { ok: true };"#,
        )?;
        self.require_ok(locator, value)
    }

    async fn type_text(&self, locator: &Locator, text: &str, key_delay: Duration) -> Result<()> {
        debug!(session = %self.session, %locator, text, "typing");
        for ch in text.chars() {
            let epilogue = format!(
                r#"if (els.length === 0) return {{ ok: false }};
  const el = els[0];
  el.focus();
  const ch = {ch};
  const next = (el.value || '') + ch;
  const desc = Object.getOwnPropertyDescriptor(window.HTMLInputElement.prototype, 'value');
  if (desc && desc.set && el instanceof HTMLInputElement) {{ desc.set.call(el, next); }} else {{ el.value = next; }}
  el.dispatchEvent(new InputEvent('input', {{ bubbles: true, data: ch, inputType: 'insertText' }}));
  return {{ ok: true }};"#,
                ch = locate::js_string(&ch.to_string()),
            );
            let value = self.eval_action(locator, &epilogue)?;
            self.require_ok(locator, value)?;
            tokio::time::sleep(key_delay).await;
        }
        Ok(())
    }

    async fn text(&self, locator: &Locator) -> Result<Option<String>> {
        let value = self.eval_action(
            locator,
            r#"if (els.length === 0) return null;
  const el = els[0];
  return (el.innerText !== undefined ? el.innerText : el.textContent) || '';"#,
        )?;
        Ok(value.as_str().map(locate::normalize))
    }

    async fn page_html(&self) -> Result<String> {
        let value = self.eval("document.documentElement.outerHTML")?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| E2eError::JavaScriptFailed("page snapshot returned no HTML".to_string()))
    }

    async fn wait_for_network_idle(&self, quiet: Duration, budget: Duration) -> Result<()> {
        let start = Instant::now();
        while start.elapsed() < budget {
            // A document swap drops the monitor; an absent monitor reads
            // as settled, which is fine after full navigations.
            let probe: NetProbe = serde_json::from_value(self.eval(NETWORK_PROBE)?)?;
            if probe.inflight <= 0 && probe.quiet_ms >= quiet.as_millis() as f64 {
                debug!(session = %self.session, elapsed_ms = start.elapsed().as_millis() as u64, "network idle");
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        Err(E2eError::timeout(
            "network idle",
            budget.as_millis() as u64,
        ))
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.tab
            .capture_screenshot(
                headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption::Png,
                None,
                None,
                true,
            )
            .map_err(|e| E2eError::ScreenshotFailed(e.to_string()))
    }
}
