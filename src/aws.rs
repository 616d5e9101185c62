use crate::error::Error;
use crate::saml::{SamlAssertion, ROLE_ATTR_NAME};

/// A role/principal pair a principal is allowed to assume, as carried in one
/// value of the SAML Role attribute. `account_alias` starts empty and is
/// filled in once by alias resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsRole {
    pub role_arn: String,
    pub principal_arn: String,
    pub account_alias: String,
}

impl AwsRole {
    pub fn new(role_arn: String, principal_arn: String) -> Self {
        Self {
            role_arn,
            principal_arn,
            account_alias: String::new(),
        }
    }

    /// The account ID segment of the role ARN
    /// (`arn:partition:service:region:account-id:resource`). A short ARN
    /// degrades to `"unknown"` rather than failing.
    pub fn account_id(&self) -> &str {
        let mut items = self.role_arn.split(':');
        match items.nth(4) {
            Some(id) => id,
            None => "unknown",
        }
    }
}

fn parse_role(value: &str) -> Result<AwsRole, Error> {
    let items: Vec<&str> = value.split(',').map(str::trim).collect();
    match items.as_slice() {
        [role_arn, principal_arn] if !role_arn.is_empty() && !principal_arn.is_empty() => Ok(
            AwsRole::new(role_arn.to_string(), principal_arn.to_string()),
        ),
        _ => Err(Error::MalformedRole(value.to_string())),
    }
}

/// Builds the role catalog from the assertion's Role attribute, preserving
/// document order. A single malformed value fails the whole catalog: it means
/// the assertion is not in the expected shape.
pub fn parse_roles(assertion: &SamlAssertion) -> Result<Vec<AwsRole>, Error> {
    assertion
        .attribute_values(ROLE_ATTR_NAME)?
        .iter()
        .map(|value| parse_role(value))
        .collect()
}

/// Exact-match lookup of `role_arn` in the catalog. ARNs are case-sensitive;
/// no normalization. If the assertion carried duplicates the first one wins,
/// but duplicates are a defect of the assertion, not an API guarantee.
pub fn resolve_role<'a>(roles: &'a [AwsRole], role_arn: &str) -> Result<&'a AwsRole, Error> {
    roles
        .iter()
        .find(|role| {
            log::debug!("matching {} against {}", role.role_arn, role_arn);
            role.role_arn == role_arn
        })
        .ok_or_else(|| Error::RoleNotConfigured(role_arn.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saml::testutil::{encoded_response, role_attribute};

    const ROLE_A: &str = "arn:aws:iam::111111111111:role/A";
    const PROVIDER_A: &str = "arn:aws:iam::111111111111:saml-provider/P";
    const ROLE_B: &str = "arn:aws:iam::222222222222:role/B";
    const PROVIDER_B: &str = "arn:aws:iam::222222222222:saml-provider/P";

    fn assertion_with_roles(values: &[&str]) -> SamlAssertion {
        SamlAssertion::from_encoded(&encoded_response(&role_attribute(values))).unwrap()
    }

    #[test]
    fn parses_roles_preserving_input_order() {
        let assertion = assertion_with_roles(&[
            &format!("{ROLE_A},{PROVIDER_A}"),
            &format!("{ROLE_B},{PROVIDER_B}"),
        ]);
        let roles = parse_roles(&assertion).unwrap();
        assert_eq!(roles.len(), 2);
        assert_eq!(roles[0].role_arn, ROLE_A);
        assert_eq!(roles[0].principal_arn, PROVIDER_A);
        assert_eq!(roles[1].role_arn, ROLE_B);
        assert_eq!(roles[1].account_alias, "");
    }

    #[test]
    fn malformed_role_value_fails_the_whole_catalog() {
        let assertion =
            assertion_with_roles(&[&format!("{ROLE_A},{PROVIDER_A}"), "onlyonefield"]);
        match parse_roles(&assertion) {
            Err(Error::MalformedRole(value)) => assert_eq!(value, "onlyonefield"),
            other => panic!("expected MalformedRole, got {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_split_fields() {
        let assertion = assertion_with_roles(&[&format!("{ROLE_A},{PROVIDER_A}")]);
        assert!(parse_roles(&assertion).is_ok());
        assert!(matches!(parse_role(",x"), Err(Error::MalformedRole(_))));
        assert!(matches!(parse_role("x,"), Err(Error::MalformedRole(_))));
        assert!(matches!(parse_role("a,b,c"), Err(Error::MalformedRole(_))));
    }

    #[test]
    fn resolves_role_by_exact_arn() {
        let roles = vec![
            AwsRole::new(ROLE_A.to_string(), PROVIDER_A.to_string()),
            AwsRole::new(ROLE_B.to_string(), PROVIDER_B.to_string()),
        ];
        let role = resolve_role(&roles, ROLE_B).unwrap();
        assert_eq!(role.principal_arn, PROVIDER_B);
    }

    #[test]
    fn missing_role_is_not_configured() {
        let roles = vec![AwsRole::new(ROLE_A.to_string(), PROVIDER_A.to_string())];
        match resolve_role(&roles, "arn:aws:iam::333333333333:role/absent") {
            Err(Error::RoleNotConfigured(target)) => {
                assert_eq!(target, "arn:aws:iam::333333333333:role/absent")
            }
            other => panic!("expected RoleNotConfigured, got {other:?}"),
        }
    }

    #[test]
    fn resolution_is_case_sensitive() {
        let roles = vec![AwsRole::new(ROLE_A.to_string(), PROVIDER_A.to_string())];
        assert!(resolve_role(&roles, &ROLE_A.to_uppercase()).is_err());
    }

    #[test]
    fn account_id_is_the_fifth_arn_segment() {
        let role = AwsRole::new(
            "arn:aws:iam::123456789012:role/foo".to_string(),
            PROVIDER_A.to_string(),
        );
        assert_eq!(role.account_id(), "123456789012");
    }

    #[test]
    fn short_arn_degrades_to_unknown() {
        let role = AwsRole::new("arn:aws:iam".to_string(), PROVIDER_A.to_string());
        assert_eq!(role.account_id(), "unknown");
    }
}
