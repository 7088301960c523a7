use std::io::Write;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{SecondsFormat, Utc};
use flate2::write::DeflateEncoder;
use flate2::Compression;
use url::Url;
use uuid::Uuid;

use crate::error::Error;

/// Build the Azure AD login URL carrying a SAML `AuthnRequest`.
///
/// The request XML is raw-deflated (RFC 1951, no zlib wrapper), standard
/// base64 encoded and percent-encoded into the `SAMLRequest` query
/// parameter. Azure rejects anything else, so the shape here is bit-exact.
pub fn login_url(
    app_id_uri: &str,
    tenant_id: &str,
    assertion_consumer_service_url: &str,
) -> Result<Url, Error> {
    let request_id = format!("id{}", Uuid::new_v4());
    let issue_instant = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    let request = format!(
        r#"
	<samlp:AuthnRequest xmlns="urn:oasis:names:tc:SAML:2.0:metadata" ID="{request_id}" Version="2.0" IssueInstant="{issue_instant}" IsPassive="false" AssertionConsumerServiceURL="{assertion_consumer_service_url}" xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol">
		<Issuer xmlns="urn:oasis:names:tc:SAML:2.0:assertion">{app_id_uri}</Issuer>
		<samlp:NameIDPolicy Format="urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress"></samlp:NameIDPolicy>
	</samlp:AuthnRequest>
	"#
    );

    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(request.as_bytes())
        .map_err(Error::IdpRequest)?;
    let deflated = encoder.finish().map_err(Error::IdpRequest)?;

    let encoded = BASE64.encode(deflated);

    Url::parse_with_params(
        &format!("https://login.microsoftonline.com/{tenant_id}/saml2"),
        &[("SAMLRequest", encoded.as_str())],
    )
    .map_err(|e| Error::IdpRequest(std::io::Error::other(e.to_string())))
}
