pub mod interceptor;
pub mod states;

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};
use url::Url;

use crate::browser::interceptor::SamlInterceptor;
use crate::browser::states::{dispatch, CATALOG};
use crate::config::profile::ProfileConfig;
use crate::error::Error;
use crate::spinner;

/// Pause between handler runs so a transient page is not matched twice.
const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Pacing between full catalog passes; each probe is a CDP round trip.
const SCAN_INTERVAL: Duration = Duration::from_millis(100);

/// A headless browser walking the IdP's login pages until the interceptor
/// captures the SAML POST aimed at AWS.
///
/// The catalog of page states is data: the IdP decides which page comes
/// next, the engine just reacts to whichever selector currently matches.
pub struct Engine {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    interceptor: SamlInterceptor,
}

impl Engine {
    pub async fn launch() -> Result<Self, Error> {
        let config = BrowserConfig::builder().build().map_err(Error::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        let interceptor = SamlInterceptor::install(&page).await?;

        Ok(Self {
            browser,
            page,
            handler_task,
            interceptor,
        })
    }

    /// Drive one login session and return the raw base64 `SAMLResponse`.
    #[instrument(skip_all)]
    pub async fn acquire(
        &mut self,
        login_url: &Url,
        config: &ProfileConfig,
    ) -> Result<String, Error> {
        self.page.goto(login_url.as_str()).await?;

        let mut spinner = spinner::start("waiting for the identity provider");

        loop {
            for state in CATALOG {
                // The completion check must never block: the SAML POST can
                // land while any page state is being probed.
                if let Some(saml) = self.interceptor.try_take() {
                    spinner.finish_and_clear();
                    return Ok(saml);
                }

                let Ok(element) = self.page.find_element(state.selector).await else {
                    continue;
                };

                debug!(state = state.name, "matched login page");
                spinner.finish_and_clear();

                if let Err(error) = dispatch(state, &self.page, &element, config).await {
                    return Err(error);
                }

                tokio::time::sleep(SETTLE_DELAY).await;
                spinner = spinner::start("waiting for the identity provider");
            }

            tokio::time::sleep(SCAN_INTERVAL).await;
        }
    }

    /// Tear the browser down. Called on every exit path, success or failure.
    pub async fn close(mut self) {
        self.interceptor.stop();

        if let Err(error) = self.browser.close().await {
            debug!(%error, "browser did not close cleanly");
        }
        if let Err(error) = self.browser.wait().await {
            debug!(%error, "browser process did not exit cleanly");
        }

        self.handler_task.abort();
    }
}
