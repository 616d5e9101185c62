use std::future::Future;

use aws_config::{BehaviorVersion, Region};
use chrono::{DateTime, Utc};
use futures::future;

use crate::aws::AwsRole;
use crate::error::Error;
use crate::saml::SamlAssertion;

/// Short-lived credentials returned by the trust exchange. The expiration is
/// carried through to persistence unchanged; enforcing it is the consumer's
/// job.
#[derive(Debug, Clone)]
pub struct TemporaryCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

/// The trust-exchange call: a validated assertion plus a role/principal pair
/// for temporary credentials. Implementations perform a single remote call
/// and no retries.
pub trait CredentialExchange {
    fn assume_role(
        &self,
        assertion: &SamlAssertion,
        role: &AwsRole,
    ) -> impl Future<Output = Result<TemporaryCredentials, Error>> + Send;
}

/// Account-alias discovery scoped by exchanged credentials.
pub trait AliasLookup {
    fn account_aliases(
        &self,
        credentials: &TemporaryCredentials,
    ) -> impl Future<Output = Result<Vec<String>, Error>> + Send;
}

/// `CredentialExchange` over STS `AssumeRoleWithSAML`. The session duration is
/// caller-configured; out-of-range values are rejected by STS, not locally.
pub struct StsExchange {
    client: aws_sdk_sts::Client,
    duration_seconds: i32,
}

impl StsExchange {
    pub async fn new(region: &str, duration_seconds: i32) -> Self {
        // AssumeRoleWithSAML is an unsigned call; no local credentials needed.
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .no_credentials()
            .load()
            .await;
        Self {
            client: aws_sdk_sts::Client::new(&config),
            duration_seconds,
        }
    }
}

impl CredentialExchange for StsExchange {
    async fn assume_role(
        &self,
        assertion: &SamlAssertion,
        role: &AwsRole,
    ) -> Result<TemporaryCredentials, Error> {
        let exchange_error = |source: Box<dyn std::error::Error + Send + Sync>| Error::Exchange {
            role_arn: role.role_arn.clone(),
            source,
        };

        let response = self
            .client
            .assume_role_with_saml()
            .duration_seconds(self.duration_seconds)
            .principal_arn(&role.principal_arn)
            .role_arn(&role.role_arn)
            .saml_assertion(assertion.encoded())
            .send()
            .await
            .map_err(|e| exchange_error(Box::new(e)))?;

        let credentials = response
            .credentials()
            .ok_or_else(|| exchange_error("STS returned no credentials".into()))?;

        let expiration = credentials.expiration();
        let expiration = DateTime::from_timestamp(expiration.secs(), expiration.subsec_nanos())
            .ok_or_else(|| exchange_error("credential expiration out of range".into()))?;

        Ok(TemporaryCredentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expiration,
        })
    }
}

/// `AliasLookup` over IAM `ListAccountAliases`, called with the credentials
/// that came back from the exchange for that role's account.
pub struct IamAliasLookup {
    region: Region,
}

impl IamAliasLookup {
    pub fn new(region: &str) -> Self {
        Self {
            region: Region::new(region.to_string()),
        }
    }
}

impl AliasLookup for IamAliasLookup {
    async fn account_aliases(
        &self,
        credentials: &TemporaryCredentials,
    ) -> Result<Vec<String>, Error> {
        let provider = aws_sdk_iam::config::Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            Some(credentials.session_token.clone()),
            None,
            "aws-saml-login",
        );
        let config = aws_sdk_iam::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(self.region.clone())
            .credentials_provider(provider)
            .build();

        let output = aws_sdk_iam::Client::from_conf(config)
            .list_account_aliases()
            .send()
            .await
            .map_err(|e| Error::AliasLookup(e.to_string()))?;

        Ok(output.account_aliases().to_vec())
    }
}

/// Fills `account_alias` for every role in the catalog, one concurrent unit
/// per role, then stable-sorts the catalog by alias so disambiguation output
/// is the same across runs.
///
/// An exchange failure aborts the whole batch (first error wins, outstanding
/// units are dropped); an alias-lookup failure or an empty alias list only
/// degrades that role's alias to its account ID. Unit `i` writes element `i`
/// alone, so the join is the only synchronization needed. Dropping the
/// returned future cancels all in-flight units.
pub async fn resolve_aliases<E, L>(
    mut roles: Vec<AwsRole>,
    assertion: &SamlAssertion,
    exchange: &E,
    lookup: &L,
) -> Result<Vec<AwsRole>, Error>
where
    E: CredentialExchange + Sync,
    L: AliasLookup + Sync,
{
    let aliases = future::try_join_all(roles.iter().map(|role| async move {
        let credentials = exchange.assume_role(assertion, role).await?;
        let alias = match lookup.account_aliases(&credentials).await {
            Ok(mut aliases) if !aliases.is_empty() => aliases.remove(0),
            Ok(_) => {
                log::debug!("no account alias for {}, fallback to account ID", role.role_arn);
                role.account_id().to_string()
            }
            Err(err) => {
                log::debug!("alias lookup failed ({err}), fallback to account ID");
                role.account_id().to_string()
            }
        };
        Ok::<_, Error>(alias)
    }))
    .await?;

    for (role, alias) in roles.iter_mut().zip(aliases) {
        role.account_alias = alias;
    }
    roles.sort_by(|a, b| a.account_alias.cmp(&b.account_alias));
    Ok(roles)
}
