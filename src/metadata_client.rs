//! # Metadata API client
//!
//! Bridges the [`Deployer`] trait from `resource-bundler-core` to the platform's SOAP
//! endpoints:
//!
//! - `login` against `<login_url>/services/Soap/u/<api_version>` (partner API)
//! - `deploy` and `checkDeployStatus` against the `metadataServerUrl` returned by login
//!
//! Responses are small and flat, so fields are pulled out with regular expressions instead
//! of a full XML parser. SOAP faults are surfaced as errors carrying the `faultstring`.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use regex::Regex;

use resource_bundler_core::contract::{
    Credentials, DeployError, DeployOptions, DeployStatus, Deployer, Session,
};

pub struct MetadataClient {
    http: reqwest::Client,
}

impl MetadataClient {
    pub fn new() -> Self {
        MetadataClient {
            http: reqwest::Client::new(),
        }
    }

    async fn call(&self, url: &str, action: &str, envelope: String) -> Result<String, DeployError> {
        tracing::debug!(url, action, "Sending SOAP request");
        let response = self
            .http
            .post(url)
            .header("Content-Type", "text/xml; charset=UTF-8")
            .header("SOAPAction", action)
            .body(envelope)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, url, action, "SOAP request failed");
                e
            })?;
        let status = response.status();
        let body = response.text().await?;

        if let Some(fault) = first_value(&body, "faultstring") {
            tracing::error!(%status, action, fault = %fault, "SOAP fault");
            return Err(format!("{action}: {fault}").into());
        }
        if !status.is_success() {
            tracing::error!(%status, action, "SOAP endpoint returned error status");
            return Err(format!("{action}: HTTP {status}").into());
        }
        Ok(body)
    }
}

impl Default for MetadataClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Deployer for MetadataClient {
    async fn login(&self, credentials: &Credentials) -> Result<Session, DeployError> {
        let url = format!(
            "{}/services/Soap/u/{}",
            credentials.login_url().trim_end_matches('/'),
            credentials.api_version
        );
        tracing::info!(url = %url, username = %credentials.username, "Logging in to org");
        let body = self
            .call(&url, "login", login_envelope(credentials))
            .await?;

        let session_id = first_value(&body, "sessionId").ok_or("login: no sessionId in response")?;
        let metadata_server_url = first_value(&body, "metadataServerUrl")
            .ok_or("login: no metadataServerUrl in response")?;
        tracing::info!(metadata_server_url = %metadata_server_url, "Logged in");
        Ok(Session {
            session_id,
            metadata_server_url,
        })
    }

    async fn deploy(
        &self,
        session: &Session,
        zip_file: Vec<u8>,
        options: &DeployOptions,
    ) -> Result<String, DeployError> {
        tracing::info!(
            bytes = zip_file.len(),
            rollback_on_error = options.rollback_on_error,
            "Submitting deploy request"
        );
        let envelope = deploy_envelope(&session.session_id, &BASE64.encode(&zip_file), options);
        let body = self
            .call(&session.metadata_server_url, "deploy", envelope)
            .await?;
        let id = first_value(&body, "id").ok_or("deploy: no id in response")?;
        tracing::info!(deploy_id = %id, "Deploy request accepted");
        Ok(id)
    }

    async fn check_deploy_status(
        &self,
        session: &Session,
        id: &str,
    ) -> Result<DeployStatus, DeployError> {
        let envelope = check_status_envelope(&session.session_id, id);
        let body = self
            .call(&session.metadata_server_url, "checkDeployStatus", envelope)
            .await?;
        Ok(parse_deploy_status(&body, id))
    }
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn xml_unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Text content of every `<tag>` element, namespace prefixes ignored.
fn values(body: &str, tag: &str) -> Vec<String> {
    let pattern = format!(
        r"<(?:[A-Za-z0-9_]+:)?{tag}(?:\s[^>]*)?>([^<]*)</(?:[A-Za-z0-9_]+:)?{tag}>",
        tag = regex::escape(tag)
    );
    match Regex::new(&pattern) {
        Ok(re) => re
            .captures_iter(body)
            .map(|c| xml_unescape(c[1].trim()))
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn first_value(body: &str, tag: &str) -> Option<String> {
    values(body, tag).into_iter().next()
}

fn login_envelope(credentials: &Credentials) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:env="http://schemas.xmlsoap.org/soap/envelope/">
  <env:Body>
    <n1:login xmlns:n1="urn:partner.soap.sforce.com">
      <n1:username>{}</n1:username>
      <n1:password>{}</n1:password>
    </n1:login>
  </env:Body>
</env:Envelope>"#,
        xml_escape(&credentials.username),
        xml_escape(&credentials.password)
    )
}

fn deploy_envelope(session_id: &str, zip_base64: &str, options: &DeployOptions) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:met="http://soap.sforce.com/2006/04/metadata">
  <soapenv:Header>
    <met:SessionHeader><met:sessionId>{}</met:sessionId></met:SessionHeader>
  </soapenv:Header>
  <soapenv:Body>
    <met:deploy>
      <met:ZipFile>{}</met:ZipFile>
      <met:DeployOptions>
        <met:checkOnly>{}</met:checkOnly>
        <met:rollbackOnError>{}</met:rollbackOnError>
        <met:singlePackage>{}</met:singlePackage>
      </met:DeployOptions>
    </met:deploy>
  </soapenv:Body>
</soapenv:Envelope>"#,
        xml_escape(session_id),
        zip_base64,
        options.check_only,
        options.rollback_on_error,
        options.single_package
    )
}

fn check_status_envelope(session_id: &str, id: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:met="http://soap.sforce.com/2006/04/metadata">
  <soapenv:Header>
    <met:SessionHeader><met:sessionId>{}</met:sessionId></met:SessionHeader>
  </soapenv:Header>
  <soapenv:Body>
    <met:checkDeployStatus>
      <met:asyncProcessId>{}</met:asyncProcessId>
      <met:includeDetails>true</met:includeDetails>
    </met:checkDeployStatus>
  </soapenv:Body>
</soapenv:Envelope>"#,
        xml_escape(session_id),
        xml_escape(id)
    )
}

fn parse_deploy_status(body: &str, id: &str) -> DeployStatus {
    let flag = |tag: &str| first_value(body, tag).is_some_and(|v| v == "true");
    let count = |tag: &str| {
        first_value(body, tag)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    };

    let mut errors: Vec<String> = values(body, "problem");
    if let Some(message) = first_value(body, "errorMessage") {
        errors.push(message);
    }

    DeployStatus {
        id: first_value(body, "id").unwrap_or_else(|| id.to_string()),
        done: flag("done"),
        success: flag("success"),
        status: first_value(body, "status").unwrap_or_default(),
        components_deployed: count("numberComponentsDeployed"),
        components_total: count("numberComponentsTotal"),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_ignore_namespace_prefixes() {
        let body = "<soapenv:Body><result><sf:id>0Af1</sf:id><done>false</done></result></soapenv:Body>";
        assert_eq!(first_value(body, "id").as_deref(), Some("0Af1"));
        assert_eq!(first_value(body, "done").as_deref(), Some("false"));
        assert_eq!(first_value(body, "missing"), None);
    }

    #[test]
    fn login_envelope_escapes_credentials() {
        let creds = Credentials::new("a&b@example.com", "p<w>d");
        let xml = login_envelope(&creds);
        assert!(xml.contains("<n1:username>a&amp;b@example.com</n1:username>"));
        assert!(xml.contains("<n1:password>p&lt;w&gt;d</n1:password>"));
    }

    #[test]
    fn deploy_status_collects_component_problems() {
        let body = r#"<result>
  <done>true</done><id>0Af9</id><status>Failed</status><success>false</success>
  <numberComponentsDeployed>1</numberComponentsDeployed>
  <numberComponentsTotal>2</numberComponentsTotal>
  <details>
    <componentFailures><problem>Invalid resource &amp; stuff</problem></componentFailures>
  </details>
</result>"#;
        let status = parse_deploy_status(body, "fallback");
        assert!(status.done);
        assert!(!status.success);
        assert_eq!(status.id, "0Af9");
        assert_eq!(status.status, "Failed");
        assert_eq!(status.components_deployed, 1);
        assert_eq!(status.components_total, 2);
        assert_eq!(status.errors, vec!["Invalid resource & stuff".to_string()]);
    }
}
