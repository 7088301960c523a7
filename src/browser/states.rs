use std::time::Duration;

use chromiumoxide::{Element, Page};
use tracing::{debug, info};

use crate::config::profile::ProfileConfig;
use crate::error::Error;
use crate::prompt;

/// One recognizable IdP page. The catalog is ordered data, not a state
/// graph: the IdP chooses what to show next, the engine reacts to whichever
/// selector matches.
pub struct PageState {
    pub name: &'static str,
    pub selector: &'static str,
    pub action: Action,
}

#[derive(Clone, Copy, Debug)]
pub enum Action {
    AzureUsername,
    AzurePassword,
    OktaUsername,
    OktaPassword,
    OktaSelectPush,
    OktaSendPush,
    Totp,
}

pub const CATALOG: &[PageState] = &[
    PageState {
        name: "azure username",
        selector: r#"input[name="loginfmt"]:not(.moveOffScreen)"#,
        action: Action::AzureUsername,
    },
    PageState {
        name: "azure password",
        selector: r#"input[name="Password"]:not(.moveOffScreen),input[name="passwd"]:not(.moveOffScreen)"#,
        action: Action::AzurePassword,
    },
    PageState {
        name: "okta username",
        selector: r#"form:not(.o-form-saving) > div span.okta-form-input-field input[name="identifier"]:not([disabled])"#,
        action: Action::OktaUsername,
    },
    PageState {
        name: "okta password",
        selector: r#"div.challenge-authenticator--okta_password.mfa-verify-password input[type="password"]:not([disabled])"#,
        action: Action::OktaPassword,
    },
    PageState {
        name: "okta select push factor",
        selector: r#"div[data-se="okta_verify-push"] > a:not([disabled]):not(.link-button-disabled):not(.btn-disabled)"#,
        action: Action::OktaSelectPush,
    },
    PageState {
        name: "okta send push",
        selector: r#"a.send-push:not([disabled]):not(.link-button-disabled):not(.btn-disabled)"#,
        action: Action::OktaSendPush,
    },
    PageState {
        name: "totp",
        selector: r"div.challenge-authenticator--google_otp.mfa-verify",
        action: Action::Totp,
    },
];

const SUBMIT_SELECTOR: &str = r#"input[type="submit"],button[type="submit"]"#;
const TOTP_CODE_SELECTOR: &str = r"input[name='credentials.passcode']";

/// How long a handler waits for the page to move on after a submit.
const TRANSITION_DEADLINE: Duration = Duration::from_secs(20);
/// Outer watchdog; the handler returns control to the scan loop no matter
/// what happens inside the transition race.
const TRANSITION_WATCHDOG: Duration = Duration::from_secs(25);
const PROBE_INTERVAL: Duration = Duration::from_millis(500);
const VISIBILITY_DEADLINE: Duration = Duration::from_secs(10);

pub async fn dispatch(
    state: &PageState,
    page: &Page,
    element: &Element,
    config: &ProfileConfig,
) -> Result<(), Error> {
    match state.action {
        Action::AzureUsername => {
            text_input(
                page,
                element,
                state.selector,
                &config.azure_username,
                "Azure Username",
            )
            .await
        }
        Action::AzurePassword => {
            secret_input(page, element, state.selector, "Azure Password").await
        }
        Action::OktaUsername => {
            text_input(
                page,
                element,
                state.selector,
                &config.okta_username,
                "Okta Username",
            )
            .await
        }
        Action::OktaPassword => {
            secret_input(page, element, state.selector, "Okta Password").await
        }
        Action::OktaSelectPush | Action::OktaSendPush => push(page, element).await,
        Action::Totp => totp(page, element).await,
    }
}

/// Azure/Okta username pages: stored value or interactive prompt, then
/// submit and wait for the page to move on.
async fn text_input(
    page: &Page,
    element: &Element,
    selector: &str,
    stored: &str,
    label: &str,
) -> Result<(), Error> {
    let value = if stored.is_empty() {
        prompt::input(label)?
    } else {
        stored.to_owned()
    };

    wait_visible(element).await;
    fill(element, value.trim()).await?;
    submit(page).await?;

    await_page_transition(page, selector).await;

    Ok(())
}

/// Password pages: surface whatever the IdP is complaining about, then
/// prompt with masking. A still-matching selector after the transition race
/// means the loop will simply land here again.
async fn secret_input(
    page: &Page,
    element: &Element,
    selector: &str,
    label: &str,
) -> Result<(), Error> {
    surface_error_text(page, ".alert-error").await;
    surface_error_text(page, ".o-form-error-container").await;

    let value = prompt::secret(label)?;

    wait_visible(element).await;
    fill(element, &value).await?;
    submit(page).await?;

    await_page_transition(page, selector).await;

    Ok(())
}

/// Push-factor pages: click and return immediately. The user's phone may
/// take arbitrary time, and the assertion arrives through the interceptor.
async fn push(page: &Page, element: &Element) -> Result<(), Error> {
    surface_error_text(page, ".infobox-error").await;

    element.click().await?;

    Ok(())
}

async fn totp(page: &Page, element: &Element) -> Result<(), Error> {
    surface_error_text(page, ".infobox-error").await;

    let code = prompt::input("Authenticator Code")?;

    let input = element.find_element(TOTP_CODE_SELECTOR).await?;
    fill(&input, code.trim()).await?;
    submit(page).await?;

    tokio::time::sleep(Duration::from_millis(500)).await;

    Ok(())
}

async fn fill(element: &Element, value: &str) -> Result<(), Error> {
    element.click().await?;
    element.call_js_fn("function() { this.value = ''; }", false).await?;
    element.type_str(value).await?;

    Ok(())
}

async fn submit(page: &Page) -> Result<(), Error> {
    if let Ok(button) = page.find_element(SUBMIT_SELECTOR).await {
        button.click().await?;
    }

    Ok(())
}

/// Log the text of a visible IdP error banner, if any.
async fn surface_error_text(page: &Page, selector: &str) {
    let Ok(banner) = page.find_element(selector).await else {
        return;
    };

    if let Ok(Some(text)) = banner.inner_text().await {
        let text = text.trim();
        if !text.is_empty() {
            info!("identity provider says: {text}");
        }
    }
}

async fn wait_visible(element: &Element) {
    let deadline = tokio::time::timeout(VISIBILITY_DEADLINE, async {
        loop {
            if is_visible(element).await.unwrap_or(true) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    });

    let _ = deadline.await;
}

async fn is_visible(element: &Element) -> Result<bool, Error> {
    let returns = element
        .call_js_fn(
            "function() { return !!(this.offsetWidth || this.offsetHeight || this.getClientRects().length); }",
            false,
        )
        .await?;

    Ok(returns
        .result
        .value
        .as_ref()
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false))
}

#[derive(Debug, PartialEq, Eq)]
enum Transition {
    /// Element still present and healthy; keep waiting.
    Pending,
    /// Element left the DOM.
    Gone,
    /// Element was parked off-screen by the IdP's page script.
    Moved,
    /// Element or its form picked up an error class.
    Errored,
    /// Element is still in the DOM but no longer rendered.
    Hidden,
}

/// Wait for the page to move on after a submit: returns once the element
/// vanishes, is parked off-screen, picks up an error class, or stops being
/// rendered. Expiring the 20-second race or the 25-second watchdog is not a
/// failure either way, so control always returns to the scan loop.
async fn await_page_transition(page: &Page, selector: &str) {
    let race = async {
        loop {
            match probe_transition(page, selector).await {
                Ok(Transition::Pending) => tokio::time::sleep(PROBE_INTERVAL).await,
                Ok(transition) => {
                    debug!(?transition, "page moved on");
                    break;
                }
                // A navigation mid-probe tears the context down; that is a
                // transition too.
                Err(_) => break,
            }
        }
    };

    let _ = tokio::time::timeout(
        TRANSITION_WATCHDOG,
        tokio::time::timeout(TRANSITION_DEADLINE, race),
    )
    .await;
}

async fn probe_transition(page: &Page, selector: &str) -> Result<Transition, Error> {
    // Debug-quote the selector so embedded double quotes survive the trip
    // into the page's JS context.
    let expression = format!(
        r"(() => {{
            const el = document.querySelector({selector:?});
            if (!el) return 'gone';
            if (el.classList.contains('moveOffScreen')) return 'moved';
            if (el.className.indexOf('error') !== -1) return 'errored';
            if (el.closest('.o-form-has-errors')) return 'errored';
            const rect = el.getBoundingClientRect();
            if (rect.width === 0 || rect.height === 0) return 'hidden';
            return 'pending';
        }})()"
    );

    let result = page.evaluate(expression).await?;

    Ok(
        match result.value().and_then(serde_json::Value::as_str) {
            Some("gone") => Transition::Gone,
            Some("moved") => Transition::Moved,
            Some("errored") => Transition::Errored,
            Some("hidden") => Transition::Hidden,
            _ => Transition::Pending,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_order_matches_the_login_flow() {
        let names: Vec<&str> = CATALOG.iter().map(|state| state.name).collect();

        assert_eq!(
            names,
            vec![
                "azure username",
                "azure password",
                "okta username",
                "okta password",
                "okta select push factor",
                "okta send push",
                "totp",
            ]
        );
    }

    #[test]
    fn selectors_exclude_disabled_and_parked_elements() {
        assert!(CATALOG[0].selector.contains(":not(.moveOffScreen)"));
        assert!(CATALOG[2].selector.contains(":not([disabled])"));
        assert!(CATALOG[4].selector.contains(":not(.btn-disabled)"));
    }
}
