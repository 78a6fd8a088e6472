//! Browser control for the admin UI.
//!
//! [`BrowserConfig`] is always available. With the `browser` feature,
//! [`CdpDriver`] drives a real Chromium over the DevTools protocol through
//! chromiumoxide and implements [`crate::PageDriver`] on top of it.

use crate::config::ProbeConfig;
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// User agent string
    pub user_agent: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            chromium_path: None,
            user_agent: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Browser settings carried by a run configuration
    #[must_use]
    pub fn from_probe_config(config: &ProbeConfig) -> Self {
        Self {
            headless: config.headless,
            chromium_path: config.chromium_path.clone(),
            ..Self::default()
        }
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Set user agent
    #[must_use]
    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Disable sandbox (for containers)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Reply of a [`lookup_script`]: `{ found: false }` when the selector or the
/// read property does not resolve, else `{ found: true, value }`
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
#[derive(Debug, PartialEq, Eq, Deserialize)]
struct Lookup {
    found: bool,
    #[serde(default)]
    value: Option<String>,
}

#[cfg_attr(not(feature = "browser"), allow(dead_code))]
impl Lookup {
    fn into_value(self, missing: impl FnOnce() -> ProbeError) -> ProbeResult<String> {
        match self {
            Self {
                found: true,
                value: Some(value),
            } => Ok(value),
            _ => Err(missing()),
        }
    }
}

#[cfg_attr(not(feature = "browser"), allow(dead_code))]
fn js_string(selector: &Selector) -> ProbeResult<String> {
    Ok(serde_json::to_string(&selector.to_css())?)
}

/// Script reading `read` (an expression over the element `e`) from the first
/// match of `selector`
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
fn lookup_script(selector: &Selector, read: &str) -> ProbeResult<String> {
    Ok(format!(
        "(() => {{ const e = document.querySelector({}); \
         if (e === null) return {{ found: false }}; \
         const v = {read}; \
         return v === null || v === undefined \
         ? {{ found: false }} : {{ found: true, value: String(v) }}; }})()",
        js_string(selector)?
    ))
}

#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::future_not_send)]
mod cdp {
    use super::{js_string, lookup_script, BrowserConfig, Lookup};
    use crate::driver::PageDriver;
    use crate::locator::Selector;
    use crate::result::{ProbeError, ProbeResult};
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::de::DeserializeOwned;
    use tokio::runtime::Runtime;

    const TEXT: &str = "e.innerText";
    const VALUE: &str = "e.value ?? ''";
    const SELECTED: &str = "e.selectedOptions && e.selectedOptions[0] \
                            ? e.selectedOptions[0].text : null";

    fn page_error(e: impl std::fmt::Display) -> ProbeError {
        ProbeError::PageError {
            message: e.to_string(),
        }
    }

    /// Blocking [`PageDriver`] over a Chromium page
    ///
    /// Owns its own tokio runtime so the step library stays synchronous.
    /// Presence is decided in page script, so only a selector that matches
    /// nothing reads as not-found; protocol failures surface as page errors.
    #[derive(Debug)]
    pub struct CdpDriver {
        config: BrowserConfig,
        runtime: Runtime,
        browser: CdpBrowser,
        page: CdpPage,
        handle: tokio::task::JoinHandle<()>,
    }

    impl CdpDriver {
        /// Launch Chromium and open a blank page
        pub fn launch(config: BrowserConfig) -> ProbeResult<Self> {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;

            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height);
            if !config.headless {
                builder = builder.with_head();
            }
            if !config.sandbox {
                builder = builder.no_sandbox();
            }
            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }
            if let Some(ref ua) = config.user_agent {
                builder = builder.arg(format!("--user-agent={ua}"));
            }
            let cdp_config = builder
                .build()
                .map_err(|message| ProbeError::BrowserLaunchError { message })?;

            let (browser, page, handle) = runtime.block_on(async {
                let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                    ProbeError::BrowserLaunchError {
                        message: e.to_string(),
                    }
                })?;

                let handle = tokio::spawn(async move {
                    while let Some(event) = handler.next().await {
                        if event.is_err() {
                            break;
                        }
                    }
                });

                let page = browser.new_page("about:blank").await.map_err(page_error)?;
                Ok::<_, ProbeError>((browser, page, handle))
            })?;

            tracing::info!(headless = config.headless, "browser launched");
            Ok(Self {
                config,
                runtime,
                browser,
                page,
                handle,
            })
        }

        /// The launch configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        fn eval<T: DeserializeOwned>(&self, script: String) -> ProbeResult<T> {
            self.runtime.block_on(async {
                self.page
                    .evaluate(script)
                    .await
                    .map_err(page_error)?
                    .into_value::<T>()
                    .map_err(page_error)
            })
        }

        fn lookup(&self, selector: &Selector, read: &str) -> ProbeResult<String> {
            self.eval::<Lookup>(lookup_script(selector, read)?)?
                .into_value(|| Self::missing(selector))
        }

        fn ensure_present(&self, selector: &Selector) -> ProbeResult<()> {
            self.lookup(selector, "''").map(|_| ())
        }

        fn missing(selector: &Selector) -> ProbeError {
            ProbeError::not_found(selector.to_css())
        }
    }

    impl PageDriver for CdpDriver {
        fn navigate(&mut self, url: &str) -> ProbeResult<()> {
            tracing::debug!("navigate {url}");
            self.runtime.block_on(async {
                self.page
                    .goto(url)
                    .await
                    .map(|_| ())
                    .map_err(|e| ProbeError::NavigationError {
                        url: url.to_string(),
                        message: e.to_string(),
                    })
            })
        }

        fn title(&self) -> ProbeResult<String> {
            self.eval("document.title".to_string())
        }

        fn text(&self, selector: &Selector) -> ProbeResult<String> {
            self.lookup(selector, TEXT)
        }

        fn texts(&self, selector: &Selector) -> ProbeResult<Vec<String>> {
            self.eval(format!(
                "Array.from(document.querySelectorAll({}), e => String(e.innerText ?? ''))",
                js_string(selector)?
            ))
        }

        fn value(&self, selector: &Selector) -> ProbeResult<String> {
            self.lookup(selector, VALUE)
        }

        fn clear(&mut self, selector: &Selector) -> ProbeResult<()> {
            let script = format!(
                "(() => {{ const e = document.querySelector({}); \
                 if (e === null) return false; \
                 e.value = ''; e.dispatchEvent(new Event('input', {{ bubbles: true }})); \
                 return true; }})()",
                js_string(selector)?
            );
            if self.eval::<bool>(script)? {
                Ok(())
            } else {
                Err(Self::missing(selector))
            }
        }

        fn send_keys(&mut self, selector: &Selector, text: &str) -> ProbeResult<()> {
            self.ensure_present(selector)?;
            let css = selector.to_css();
            self.runtime.block_on(async {
                self.page
                    .find_element(css.as_str())
                    .await
                    .map_err(page_error)?
                    .click()
                    .await
                    .map_err(page_error)?
                    .type_str(text)
                    .await
                    .map_err(page_error)?;
                Ok(())
            })
        }

        fn select_by_visible_text(&mut self, selector: &Selector, text: &str) -> ProbeResult<()> {
            let script = format!(
                "(() => {{ const e = document.querySelector({}); \
                 if (e === null) return 'missing'; \
                 if (e.tagName !== 'SELECT') return 'not-select'; \
                 const i = Array.from(e.options).findIndex(o => o.text.trim() === {}); \
                 if (i < 0) return 'no-option'; \
                 e.selectedIndex = i; e.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                 return 'ok'; }})()",
                js_string(selector)?,
                serde_json::to_string(text)?
            );
            match self.eval::<String>(script)?.as_str() {
                "ok" => Ok(()),
                "not-select" => Err(ProbeError::UnsupportedInteraction {
                    selector: selector.to_css(),
                    operation: "select".into(),
                }),
                "no-option" => Err(ProbeError::not_found(format!(
                    "{selector} option '{text}'"
                ))),
                _ => Err(Self::missing(selector)),
            }
        }

        fn selected_option_text(&self, selector: &Selector) -> ProbeResult<String> {
            self.eval::<Lookup>(lookup_script(selector, SELECTED)?)?
                .into_value(|| ProbeError::not_found(format!("{selector} selected option")))
        }

        fn click(&mut self, selector: &Selector) -> ProbeResult<()> {
            self.ensure_present(selector)?;
            let css = selector.to_css();
            self.runtime.block_on(async {
                self.page
                    .find_element(css.as_str())
                    .await
                    .map_err(page_error)?
                    .click()
                    .await
                    .map_err(page_error)?;
                Ok(())
            })
        }
    }

    impl Drop for CdpDriver {
        fn drop(&mut self) {
            let browser = &mut self.browser;
            if let Err(e) = self.runtime.block_on(browser.close()) {
                tracing::warn!("browser did not close cleanly: {e}");
            }
            self.handle.abort();
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::CdpDriver;
