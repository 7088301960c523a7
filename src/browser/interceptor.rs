use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
    RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::ErrorReason;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::error::Error;
use crate::saml::AWS_SAML_ENDPOINT;

/// Broad pattern so the exact-match check below sees every AWS-bound
/// request; everything that is not the SAML endpoint passes through.
const INTERCEPT_PATTERN: &str = "https://*amazon*";

/// Hijacks the browser's request pipeline and captures the `SAMLResponse`
/// form field the IdP posts to AWS. The request itself is failed with a
/// network-disconnect so the browser never lands on the AWS console.
pub struct SamlInterceptor {
    receiver: mpsc::Receiver<String>,
    task: JoinHandle<()>,
}

impl SamlInterceptor {
    pub async fn install(page: &Page) -> Result<Self, Error> {
        page.execute(EnableParams {
            patterns: Some(vec![RequestPattern {
                url_pattern: Some(INTERCEPT_PATTERN.to_owned()),
                resource_type: None,
                request_stage: Some(RequestStage::Request),
            }]),
            handle_auth_requests: None,
        })
        .await?;

        let mut events = page.event_listener::<EventRequestPaused>().await?;

        // Capacity one: a session produces a single assertion, and a second
        // arrival is dropped on the floor.
        let (sender, receiver) = mpsc::channel(1);
        let page = page.clone();

        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.request.url == AWS_SAML_ENDPOINT {
                    let body = event.request.post_data.as_deref().unwrap_or_default();

                    match form_field(body, "SAMLResponse") {
                        Some(saml) => {
                            let _ = sender.try_send(saml);
                        }
                        None => warn!("SAML endpoint was posted without a SAMLResponse field"),
                    }

                    let fail = FailRequestParams::new(
                        event.request_id.clone(),
                        ErrorReason::InternetDisconnected,
                    );
                    if let Err(error) = page.execute(fail).await {
                        debug!(%error, "failed to abort the SAML endpoint request");
                    }
                } else {
                    let proceed = ContinueRequestParams::new(event.request_id.clone());
                    if let Err(error) = page.execute(proceed).await {
                        debug!(%error, url = %event.request.url, "failed to continue request");
                    }
                }
            }
        });

        Ok(Self { receiver, task })
    }

    /// Non-blocking completion check, polled once per page-state probe.
    pub fn try_take(&mut self) -> Option<String> {
        self.receiver.try_recv().ok()
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

fn form_field(body: &str, field: &str) -> Option<String> {
    form_urlencoded::parse(body.as_bytes())
        .find(|(key, _)| key == field)
        .map(|(_, value)| value.into_owned())
}
