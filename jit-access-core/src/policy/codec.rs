//! Codec for assume-role trust policy documents.
//!
//! Only `Statement[0].Principal.AWS` is interpreted; every other key of the
//! document, including further statements, passes through untouched apart
//! from JSON formatting normalization. The `AWS` field arrives as either a
//! single string or an array of strings; it is normalized to an array at
//! decode time so the in-memory form has exactly one shape, and it is always
//! re-encoded as an array, including the singleton case.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::types::Identity;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("trust policy is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("trust policy has no statement at index 0")]
    MissingStatement,
    #[error("statement 0 has no Principal.AWS field")]
    MissingPrincipal,
    #[error("Principal.AWS is neither a string nor an array of strings")]
    UnexpectedShape,
}

/// Wire shape of `Principal.AWS`: a bare string when the role trusts exactly
/// one principal, an array otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WirePrincipal {
    Single(String),
    Many(Vec<String>),
}

/// Ordered principal ARNs from statement 0. Existing entries are carried as
/// opaque strings; only the principal being granted or revoked is held to
/// the [`Identity`] shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrincipalSet(Vec<String>);

impl PrincipalSet {
    pub fn new(members: Vec<String>) -> Self {
        Self(members)
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.0.iter().any(|member| member == identity.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl FromIterator<String> for PrincipalSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A decoded trust policy: the full document body plus the canonical
/// principal set extracted from statement 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustPolicyDocument {
    body: Value,
    principals: PrincipalSet,
}

impl TrustPolicyDocument {
    pub fn principals(&self) -> &PrincipalSet {
        &self.principals
    }

    /// Same document body with the principal set replaced.
    pub fn with_principals(&self, principals: PrincipalSet) -> Self {
        Self {
            body: self.body.clone(),
            principals,
        }
    }
}

pub fn decode(raw: &str) -> Result<TrustPolicyDocument, PolicyError> {
    let mut body: Value = serde_json::from_str(raw)?;
    let statement = body
        .pointer("/Statement/0")
        .ok_or(PolicyError::MissingStatement)?;
    let wire = statement
        .pointer("/Principal/AWS")
        .ok_or(PolicyError::MissingPrincipal)?;
    let members = match serde_json::from_value::<WirePrincipal>(wire.clone()) {
        Ok(WirePrincipal::Single(arn)) => vec![arn],
        Ok(WirePrincipal::Many(arns)) => arns,
        Err(_) => return Err(PolicyError::UnexpectedShape),
    };
    let principals = PrincipalSet::new(members);
    // Normalize the wire field in the retained body so decode/encode is an
    // involution regardless of the source cardinality.
    write_principals(&mut body, &principals)?;
    Ok(TrustPolicyDocument { body, principals })
}

/// Deterministic inverse of [`decode`]: same principal order in, same order
/// out. `Principal.AWS` is always an array.
pub fn encode(doc: &TrustPolicyDocument) -> Result<String, PolicyError> {
    let mut body = doc.body.clone();
    write_principals(&mut body, &doc.principals)?;
    Ok(serde_json::to_string(&body)?)
}

fn write_principals(body: &mut Value, principals: &PrincipalSet) -> Result<(), PolicyError> {
    let slot = body
        .pointer_mut("/Statement/0/Principal/AWS")
        .ok_or(PolicyError::MissingPrincipal)?;
    *slot = Value::Array(
        principals
            .iter()
            .map(|member| Value::String(member.to_owned()))
            .collect(),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "arn:aws:iam::123456789012:user/alice";
    const BOB: &str = "arn:aws:iam::123456789012:user/bob";

    fn policy_with_principal(principal: &str) -> String {
        format!(
            r#"{{"Version":"2012-10-17","Statement":[{{"Effect":"Allow","Principal":{{"AWS":{principal}}},"Action":"sts:AssumeRole","Condition":{{"Bool":{{"aws:MultiFactorAuthPresent":"true"}}}}}}]}}"#
        )
    }

    #[test]
    fn scalar_principal_decodes_to_singleton_set() {
        let doc = decode(&policy_with_principal(&format!("\"{ALICE}\""))).unwrap();
        assert_eq!(doc.principals().as_slice(), [ALICE.to_string()]);
    }

    #[test]
    fn array_principal_preserves_order() {
        let doc = decode(&policy_with_principal(&format!("[\"{ALICE}\",\"{BOB}\"]"))).unwrap();
        assert_eq!(
            doc.principals().as_slice(),
            [ALICE.to_string(), BOB.to_string()]
        );
    }

    #[test]
    fn missing_statement_is_rejected() {
        let err = decode(r#"{"Version":"2012-10-17","Statement":[]}"#).unwrap_err();
        assert!(matches!(err, PolicyError::MissingStatement));
    }

    #[test]
    fn missing_principal_is_rejected() {
        let raw = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Action":"sts:AssumeRole"}]}"#;
        assert!(matches!(
            decode(raw).unwrap_err(),
            PolicyError::MissingPrincipal
        ));
    }

    #[test]
    fn non_string_principal_entries_are_rejected() {
        let raw = policy_with_principal("[42]");
        assert!(matches!(
            decode(&raw).unwrap_err(),
            PolicyError::UnexpectedShape
        ));
        let raw = policy_with_principal("{\"nested\":true}");
        assert!(matches!(
            decode(&raw).unwrap_err(),
            PolicyError::UnexpectedShape
        ));
    }

    #[test]
    fn invalid_json_is_rejected() {
        assert!(matches!(
            decode("not json").unwrap_err(),
            PolicyError::InvalidJson(_)
        ));
    }

    #[test]
    fn encode_always_emits_array() {
        let doc = decode(&policy_with_principal(&format!("\"{ALICE}\""))).unwrap();
        let raw = encode(&doc).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert!(value["Statement"][0]["Principal"]["AWS"].is_array());
        assert_eq!(value["Statement"][0]["Principal"]["AWS"][0], ALICE);
    }

    #[test]
    fn round_trip_is_identity() {
        let doc = decode(&policy_with_principal(&format!("[\"{ALICE}\",\"{BOB}\"]"))).unwrap();
        let reparsed = decode(&encode(&doc).unwrap()).unwrap();
        assert_eq!(reparsed, doc);
    }

    #[test]
    fn round_trip_preserves_other_document_content() {
        let raw = format!(
            r#"{{"Version":"2012-10-17","Statement":[{{"Effect":"Allow","Principal":{{"AWS":"{ALICE}"}},"Action":"sts:AssumeRole"}},{{"Effect":"Deny","Principal":{{"Service":"lambda.amazonaws.com"}},"Action":"sts:AssumeRole"}}]}}"#
        );
        let doc = decode(&raw).unwrap();
        let value: Value = serde_json::from_str(&encode(&doc).unwrap()).unwrap();
        // Statement 1 and the non-principal keys of statement 0 are untouched.
        assert_eq!(value["Statement"][1]["Effect"], "Deny");
        assert_eq!(
            value["Statement"][1]["Principal"]["Service"],
            "lambda.amazonaws.com"
        );
        assert_eq!(value["Statement"][0]["Action"], "sts:AssumeRole");
        assert_eq!(value["Version"], "2012-10-17");
    }
}
