use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use samuel::assertion::{Assertions, AttributeStatement};
use tracing::warn;

use crate::error::Error;

const AWS_ROLE_ATTRIBUTE: &str = "https://aws.amazon.com/SAML/Attributes/Role";

/// A decoded IdP assertion. `raw` keeps the base64 exactly as intercepted,
/// because STS wants the undecoded form back.
#[derive(Debug)]
pub struct Response {
    pub raw: String,
    parsed: samuel::response::Response,
}

impl TryFrom<String> for Response {
    type Error = Error;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        let decoded = BASE64
            .decode(&raw)
            .map_err(|e| Error::SamlParse(e.to_string()))?;

        let parsed: samuel::response::Response = String::from_utf8(decoded)
            .map_err(|e| Error::SamlParse(e.to_string()))?
            .parse()
            .map_err(|e| Error::SamlParse(format!("{e}")))?;

        Ok(Self { raw, parsed })
    }
}

impl Response {
    /// The `(role, principal)` pairs granted by the assertion, in encounter
    /// order. An assertion without the AWS Role attribute yields an empty
    /// list.
    pub fn roles(&self) -> Result<Vec<SamlRole>, Error> {
        let assertions = match &self.parsed.assertions {
            Assertions::Plaintexts(assertions) => assertions.as_slice(),
            Assertions::Encrypteds(_) => {
                warn!("encrypted SAML assertions are not supported");
                &[]
            }
            Assertions::None => &[],
        };

        assertions
            .iter()
            .flat_map(|assertion| assertion.attribute_statement.iter())
            .filter_map(|statement| match statement {
                AttributeStatement::PlaintextAttributes(attributes) => Some(attributes),
                _ => None,
            })
            .flatten()
            .filter(|attribute| attribute.name == AWS_ROLE_ATTRIBUTE)
            .flat_map(|attribute| attribute.values.iter())
            .map(|value| value.parse())
            .collect()
    }
}

/// The two ARNs AWS requires for `AssumeRoleWithSAML`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SamlRole {
    pub role_arn: String,
    pub principal_arn: String,
}

impl FromStr for SamlRole {
    type Err = Error;

    /// The IdP emits `arn,arn` with no fixed ordering; whichever side
    /// contains `:role/` is the role, the other is the principal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();

        let [first, second] = parts.as_slice() else {
            return Err(Error::SamlParse(format!(
                "expected two comma-separated ARNs in role attribute value '{s}'"
            )));
        };

        let (role, principal) = if first.contains(":role/") {
            (first, second)
        } else if second.contains(":role/") {
            (second, first)
        } else {
            return Err(Error::SamlParse(format!(
                "no role ARN found in role attribute value '{s}'"
            )));
        };

        Ok(Self {
            role_arn: role.trim().to_owned(),
            principal_arn: principal.trim().to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> Response {
        let xml = std::fs::read_to_string(format!("tests/fixtures/{name}")).unwrap();
        Response::try_from(BASE64.encode(xml)).unwrap()
    }

    #[test]
    fn parse_role_first() {
        let role: SamlRole =
            "arn:aws:iam::123456789012:role/role1,arn:aws:iam::123456789012:saml-provider/azure-ad"
                .parse()
                .unwrap();

        assert_eq!(role.role_arn, "arn:aws:iam::123456789012:role/role1");
        assert_eq!(
            role.principal_arn,
            "arn:aws:iam::123456789012:saml-provider/azure-ad"
        );
    }

    #[test]
    fn parse_provider_first() {
        let role: SamlRole =
            "arn:aws:iam::123456789012:saml-provider/azure-ad,arn:aws:iam::123456789012:role/role1"
                .parse()
                .unwrap();

        assert_eq!(role.role_arn, "arn:aws:iam::123456789012:role/role1");
        assert_eq!(
            role.principal_arn,
            "arn:aws:iam::123456789012:saml-provider/azure-ad"
        );
    }

    #[test]
    fn parse_trims_whitespace() {
        let role: SamlRole =
            " arn:aws:iam::123456789012:role/role1 , arn:aws:iam::123456789012:saml-provider/azure-ad "
                .parse()
                .unwrap();

        assert_eq!(role.role_arn, "arn:aws:iam::123456789012:role/role1");
    }

    #[test]
    fn parse_rejects_missing_role() {
        let result = "arn:aws:iam::123456789012:saml-provider/a,arn:aws:iam::123456789012:saml-provider/b"
            .parse::<SamlRole>();

        assert!(matches!(result, Err(Error::SamlParse(_))));
    }

    #[test]
    fn parse_rejects_wrong_arity() {
        assert!("arn:aws:iam::123456789012:role/role1"
            .parse::<SamlRole>()
            .is_err());
        assert!("a,b,c".parse::<SamlRole>().is_err());
    }

    #[test]
    fn invalid_base64_is_a_parse_error() {
        let result = Response::try_from(String::from("not base64!!!"));

        assert!(matches!(result, Err(Error::SamlParse(_))));
    }

    #[test]
    fn roles_from_response() {
        let response = fixture("saml_response.xml");

        let roles = response.roles().unwrap();
        assert_eq!(
            roles,
            vec![
                SamlRole {
                    role_arn: String::from("arn:aws:iam::123456789012:role/role1"),
                    principal_arn: String::from(
                        "arn:aws:iam::123456789012:saml-provider/azure-ad"
                    ),
                },
                SamlRole {
                    role_arn: String::from("arn:aws:iam::123456789012:role/role2"),
                    principal_arn: String::from(
                        "arn:aws:iam::123456789012:saml-provider/azure-ad"
                    ),
                },
            ]
        );
    }

    #[test]
    fn response_without_role_attribute_is_empty() {
        let response = fixture("saml_response_no_roles.xml");

        assert!(response.roles().unwrap().is_empty());
    }
}
