use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use roxmltree::Document;

use crate::error::Error;

const SAML_ASSERTION_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// XML attribute name for the Role property
pub const ROLE_ATTR_NAME: &str = "https://aws.amazon.com/SAML/Attributes/Role";
/// XML attribute name for the RoleSessionName property
pub const ROLE_SESSION_NAME_ATTR_NAME: &str =
    "https://aws.amazon.com/SAML/Attributes/RoleSessionName";
/// XML attribute name for the SessionDuration property
pub const SESSION_DURATION_ATTR_NAME: &str =
    "https://aws.amazon.com/SAML/Attributes/SessionDuration";

/// A SAML response as obtained from the identity provider: the base64-encoded
/// wire form plus its decoded XML text. Parsing the XML is cheap, so lookups
/// re-parse the held text instead of keeping a document around.
pub struct SamlAssertion {
    encoded: String,
    xml: String,
}

impl SamlAssertion {
    /// Decodes a base64-encoded SAML response. Fails on anything that is not
    /// well-formed XML after decoding.
    pub fn from_encoded(encoded: &str) -> Result<Self, Error> {
        if encoded.is_empty() {
            return Err(Error::Assertion("empty assertion".to_string()));
        }
        let decoded = BASE64
            .decode(encoded.trim())
            .map_err(|e| Error::Assertion(format!("base64 decode failed: {e}")))?;
        let xml = String::from_utf8(decoded)
            .map_err(|e| Error::Assertion(format!("assertion is not valid UTF-8: {e}")))?;
        Document::parse(&xml).map_err(|e| Error::Assertion(e.to_string()))?;

        Ok(Self {
            encoded: encoded.trim().to_string(),
            xml,
        })
    }

    /// The base64 wire form, as required by `AssumeRoleWithSAML`.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    fn document(&self) -> Result<Document<'_>, Error> {
        Document::parse(&self.xml).map_err(|e| Error::Assertion(e.to_string()))
    }

    /// The `NotBefore`/`NotOnOrAfter` instants from the assertion conditions.
    pub fn validity_window(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), Error> {
        let doc = self.document()?;
        let conditions = doc
            .descendants()
            .find(|n| n.has_tag_name((SAML_ASSERTION_NS, "Conditions")))
            .ok_or_else(|| Error::Assertion("missing Conditions element".to_string()))?;

        let not_before = parse_instant(conditions.attribute("NotBefore"))?;
        let not_on_or_after = parse_instant(conditions.attribute("NotOnOrAfter"))?;
        Ok((not_before, not_on_or_after))
    }

    /// Whether `now` falls inside the validity window. The upper bound is
    /// exclusive: an assertion at exactly `NotOnOrAfter` is expired.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.validity_window() {
            Ok((not_before, not_on_or_after)) => now >= not_before && now < not_on_or_after,
            Err(_) => false,
        }
    }

    /// Ordered values of a multi-valued attribute. An absent attribute is an
    /// empty list, not an error.
    pub fn attribute_values(&self, attribute_name: &str) -> Result<Vec<String>, Error> {
        let doc = self.document()?;
        let values = doc
            .descendants()
            .filter(|n| {
                n.has_tag_name((SAML_ASSERTION_NS, "Attribute"))
                    && n.attribute("Name") == Some(attribute_name)
            })
            .flat_map(|attr| attr.children())
            .filter(|n| n.has_tag_name((SAML_ASSERTION_NS, "AttributeValue")))
            .filter_map(|n| n.text().map(|t| t.trim().to_string()))
            .collect();
        Ok(values)
    }

    pub fn role_session_name(&self) -> Result<Option<String>, Error> {
        let mut values = self.attribute_values(ROLE_SESSION_NAME_ATTR_NAME)?;
        Ok(if values.is_empty() {
            None
        } else {
            Some(values.remove(0))
        })
    }

    pub fn session_duration(&self) -> Result<Option<i32>, Error> {
        let values = self.attribute_values(SESSION_DURATION_ATTR_NAME)?;
        Ok(values.first().and_then(|v| v.parse().ok()))
    }
}

fn parse_instant(value: Option<&str>) -> Result<DateTime<Utc>, Error> {
    let value = value.ok_or_else(|| Error::Assertion("missing condition timestamp".to_string()))?;
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Assertion(format!("invalid timestamp {value:?}: {e}")))
}

/// Checks that a raw base64-encoded assertion is well-formed and currently
/// inside its validity window. A malformed or missing assertion is a normal
/// negative result, not an error.
pub fn validate(encoded: &str) -> bool {
    validate_at(encoded, Utc::now())
}

pub(crate) fn validate_at(encoded: &str, now: DateTime<Utc>) -> bool {
    match SamlAssertion::from_encoded(encoded) {
        Ok(assertion) => assertion.is_valid_at(now),
        Err(err) => {
            log::debug!("assertion rejected: {err}");
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;

    pub const NOT_BEFORE: &str = "2024-05-01T10:00:00Z";
    pub const NOT_ON_OR_AFTER: &str = "2024-05-01T11:00:00Z";

    pub fn response_xml_with_window(
        attributes: &str,
        not_before: &str,
        not_on_or_after: &str,
    ) -> String {
        format!(
            r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"
                xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion">
  <saml:Assertion>
    <saml:Conditions NotBefore="{not_before}" NotOnOrAfter="{not_on_or_after}"/>
    <saml:AttributeStatement>{attributes}</saml:AttributeStatement>
  </saml:Assertion>
</samlp:Response>"#
        )
    }

    pub fn response_xml(attributes: &str) -> String {
        response_xml_with_window(attributes, NOT_BEFORE, NOT_ON_OR_AFTER)
    }

    /// An assertion whose validity window straddles the real wall clock.
    pub fn encoded_response_valid_now(attributes: &str) -> String {
        let now = chrono::Utc::now();
        let xml = response_xml_with_window(
            attributes,
            &(now - chrono::Duration::minutes(5)).to_rfc3339(),
            &(now + chrono::Duration::hours(1)).to_rfc3339(),
        );
        BASE64.encode(xml)
    }

    pub fn role_attribute(values: &[&str]) -> String {
        let values = values
            .iter()
            .map(|v| format!("<saml:AttributeValue>{v}</saml:AttributeValue>"))
            .collect::<String>();
        format!(
            r#"<saml:Attribute Name="https://aws.amazon.com/SAML/Attributes/Role">{values}</saml:Attribute>"#
        )
    }

    pub fn encoded_response(attributes: &str) -> String {
        BASE64.encode(response_xml(attributes))
    }
}
