use crate::aws;
use crate::error::Error;
use crate::saml::{self, SamlAssertion};
use crate::sts::{CredentialExchange, TemporaryCredentials};

/// Non-interactive login path: validate the assertion, build the role
/// catalog, resolve the configured role by exact ARN match, then exchange.
/// Validation and parsing failures abort before any network call is made.
pub async fn exchange_for_role<E>(
    encoded_assertion: &str,
    role_arn: &str,
    exchange: &E,
) -> Result<TemporaryCredentials, Error>
where
    E: CredentialExchange + Sync,
{
    if !saml::validate(encoded_assertion) {
        return Err(Error::InvalidAssertion);
    }

    let assertion = SamlAssertion::from_encoded(encoded_assertion)?;
    let roles = aws::parse_roles(&assertion)?;
    let role = aws::resolve_role(&roles, role_arn)?;
    exchange.assume_role(&assertion, role).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saml::testutil::{encoded_response, encoded_response_valid_now, role_attribute};
    use crate::sts::mock::MockExchange;

    const ROLE: &str = "arn:aws:iam::111111111111:role/A";
    const PROVIDER: &str = "arn:aws:iam::111111111111:saml-provider/P";

    #[tokio::test]
    async fn empty_assertion_aborts_before_any_exchange_call() {
        let exchange = MockExchange::new();
        let err = exchange_for_role("", ROLE, &exchange).await.unwrap_err();
        assert!(matches!(err, Error::InvalidAssertion));
        assert_eq!(exchange.call_count(), 0);
    }

    #[tokio::test]
    async fn expired_assertion_aborts_before_any_exchange_call() {
        // Fixed 2024 validity window, long past by the time tests run.
        let encoded = encoded_response(&role_attribute(&[&format!("{ROLE},{PROVIDER}")]));
        let exchange = MockExchange::new();
        let err = exchange_for_role(&encoded, ROLE, &exchange)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAssertion));
        assert_eq!(exchange.call_count(), 0);
    }

    #[tokio::test]
    async fn unconfigured_role_aborts_before_any_exchange_call() {
        let encoded = encoded_response_valid_now(&role_attribute(&[&format!("{ROLE},{PROVIDER}")]));
        let exchange = MockExchange::new();
        let err = exchange_for_role(&encoded, "arn:aws:iam::222222222222:role/other", &exchange)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RoleNotConfigured(_)));
        assert_eq!(exchange.call_count(), 0);
    }

    #[tokio::test]
    async fn valid_assertion_exchanges_exactly_once() {
        let encoded = encoded_response_valid_now(&role_attribute(&[&format!("{ROLE},{PROVIDER}")]));
        let exchange = MockExchange::new();
        let credentials = exchange_for_role(&encoded, ROLE, &exchange).await.unwrap();
        assert_eq!(credentials.access_key_id, ROLE);
        assert_eq!(exchange.call_count(), 1);
    }
}
