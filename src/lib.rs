pub mod aws;
pub mod config;
pub mod error;
pub mod identity_provider;
pub mod login;
pub mod saml;
pub mod sts;
pub mod ui;

pub use aws::AwsRole;
pub use error::Error;
pub use saml::SamlAssertion;
pub use sts::TemporaryCredentials;
