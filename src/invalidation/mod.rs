//! CDN push-invalidation credential form.
//!
//! One provider is active at a time; switching providers clears the others'
//! credentials. Submissions POST the active fields form-url-encoded to the
//! invalidation service, and the response body is displayed verbatim,
//! success and failure alike.

use std::sync::Arc;

use crate::api::{AdminApi, AdminError};

/// A credential field owned by one CDN provider
#[derive(Debug, Clone, Copy)]
pub struct CredentialField {
    /// Wire name in the form body
    pub name: &'static str,
    pub label: &'static str,
    /// Masked in the UI
    pub secret: bool,
}

/// Supported CDN providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdnProvider {
    Fastly,
    Akamai,
    Cloudfront,
}

impl CdnProvider {
    pub fn all() -> &'static [CdnProvider] {
        &[
            CdnProvider::Fastly,
            CdnProvider::Akamai,
            CdnProvider::Cloudfront,
        ]
    }

    /// Wire value for the `type` form field, also accepted on the CLI
    pub fn id(&self) -> &'static str {
        match self {
            CdnProvider::Fastly => "fastly",
            CdnProvider::Akamai => "akamai",
            CdnProvider::Cloudfront => "cloudfront",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CdnProvider::Fastly => "Fastly",
            CdnProvider::Akamai => "Akamai",
            CdnProvider::Cloudfront => "CloudFront",
        }
    }

    pub fn from_id(id: &str) -> Option<CdnProvider> {
        let id = id.to_lowercase();
        CdnProvider::all().iter().copied().find(|p| p.id() == id)
    }

    /// Credential fields this provider requires
    pub fn fields(&self) -> &'static [CredentialField] {
        match self {
            CdnProvider::Fastly => &[
                CredentialField {
                    name: "serviceId",
                    label: "Service ID",
                    secret: false,
                },
                CredentialField {
                    name: "authToken",
                    label: "API token",
                    secret: true,
                },
            ],
            CdnProvider::Akamai => &[
                CredentialField {
                    name: "endpoint",
                    label: "Host",
                    secret: false,
                },
                CredentialField {
                    name: "clientToken",
                    label: "Client token",
                    secret: false,
                },
                CredentialField {
                    name: "clientSecret",
                    label: "Client secret",
                    secret: true,
                },
                CredentialField {
                    name: "accessToken",
                    label: "Access token",
                    secret: true,
                },
            ],
            CdnProvider::Cloudfront => &[
                CredentialField {
                    name: "distributionId",
                    label: "Distribution ID",
                    secret: false,
                },
                CredentialField {
                    name: "accessKeyId",
                    label: "Access key ID",
                    secret: false,
                },
                CredentialField {
                    name: "secretAccessKey",
                    label: "Secret access key",
                    secret: true,
                },
            ],
        }
    }
}

/// In-flight invalidation POST
pub struct InvalidateCall {
    api: Arc<dyn AdminApi>,
    pub body: Vec<(String, String)>,
}

impl InvalidateCall {
    pub async fn run(self) -> Result<String, AdminError> {
        self.api.invalidate(&self.body).await
    }
}

/// Credential form state
pub struct CredentialsForm {
    api: Arc<dyn AdminApi>,
    provider: CdnProvider,
    pub site_url: String,
    values: Vec<String>,
    pub results: Option<String>,
    busy: bool,
}

impl CredentialsForm {
    /// Create the form, preselecting a provider by id when one was supplied.
    /// Unknown ids are ignored.
    pub fn new(api: Arc<dyn AdminApi>, initial_provider: Option<&str>) -> Self {
        let provider = initial_provider
            .and_then(CdnProvider::from_id)
            .unwrap_or(CdnProvider::Fastly);
        Self {
            api,
            provider,
            site_url: String::new(),
            values: vec![String::new(); provider.fields().len()],
            results: None,
            busy: false,
        }
    }

    pub fn provider(&self) -> CdnProvider {
        self.provider
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Switch the active provider, clearing the previous provider's values
    pub fn select_provider(&mut self, provider: CdnProvider) {
        if provider != self.provider {
            self.provider = provider;
            self.values = vec![String::new(); provider.fields().len()];
        }
    }

    pub fn value(&self, index: usize) -> &str {
        &self.values[index]
    }

    pub fn set_value(&mut self, index: usize, value: String) {
        self.values[index] = value;
    }

    /// All required fields filled in
    pub fn is_valid(&self) -> bool {
        !self.site_url.trim().is_empty() && self.values.iter().all(|v| !v.trim().is_empty())
    }

    /// Serialized form body: provider type, site URL, then the active fields
    pub fn form_body(&self) -> Vec<(String, String)> {
        let mut body = vec![
            ("type".to_string(), self.provider.id().to_string()),
            ("url".to_string(), self.site_url.trim().to_string()),
        ];
        for (field, value) in self.provider.fields().iter().zip(&self.values) {
            body.push((field.name.to_string(), value.trim().to_string()));
        }
        body
    }

    /// Submit the form. Ignored while a request is in flight or invalid.
    pub fn begin_submit(&mut self) -> Option<InvalidateCall> {
        if self.busy || !self.is_valid() {
            return None;
        }
        self.busy = true;
        self.results = None;
        Some(InvalidateCall {
            api: self.api.clone(),
            body: self.form_body(),
        })
    }

    /// Display whatever came back; transport failures render their message
    pub fn complete_submit(&mut self, result: Result<String, AdminError>) {
        self.busy = false;
        self.results = Some(match result {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(error = %err, "invalidation request failed");
                err.to_string()
            }
        });
    }

    /// Clear credentials and results, keeping the provider and site URL
    pub fn reset(&mut self) {
        for value in &mut self.values {
            value.clear();
        }
        self.results = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    use crate::api::{LogEntry, Profile, RepoInfo};

    #[derive(Default)]
    struct MockApi {
        bodies: Mutex<Vec<Vec<(String, String)>>>,
        response: Mutex<Option<Result<String, AdminError>>>,
    }

    #[async_trait]
    impl AdminApi for MockApi {
        async fn repo_info(&self, _owner: &str, _repo: &str) -> Result<RepoInfo, AdminError> {
            unimplemented!("not used by the credential form")
        }

        async fn profile(&self, _owner: &str, _repo: &str) -> Result<Profile, AdminError> {
            unimplemented!("not used by the credential form")
        }

        async fn disconnect(&self, _owner: &str, _repo: &str) -> Result<(), AdminError> {
            unimplemented!("not used by the credential form")
        }

        async fn logs(
            &self,
            _owner: &str,
            _repo: &str,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
        ) -> Result<Vec<LogEntry>, AdminError> {
            Ok(Vec::new())
        }

        async fn invalidate(&self, fields: &[(String, String)]) -> Result<String, AdminError> {
            self.bodies.lock().unwrap().push(fields.to_vec());
            self.response
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok("accepted".to_string()))
        }
    }

    fn filled_fastly_form(api: Arc<MockApi>) -> CredentialsForm {
        let mut form = CredentialsForm::new(api, Some("fastly"));
        form.site_url = "https://www.acme.dev".to_string();
        form.set_value(0, "SVC123".to_string());
        form.set_value(1, "tok-456".to_string());
        form
    }

    #[test]
    fn test_initial_provider_from_id() {
        let api = Arc::new(MockApi::default());
        assert_eq!(
            CredentialsForm::new(api.clone(), Some("AKAMAI")).provider(),
            CdnProvider::Akamai
        );
        assert_eq!(
            CredentialsForm::new(api.clone(), Some("bogus")).provider(),
            CdnProvider::Fastly
        );
        assert_eq!(
            CredentialsForm::new(api, None).provider(),
            CdnProvider::Fastly
        );
    }

    #[test]
    fn test_switching_provider_clears_previous_values() {
        let mut form = filled_fastly_form(Arc::new(MockApi::default()));
        form.select_provider(CdnProvider::Cloudfront);
        assert_eq!(form.provider(), CdnProvider::Cloudfront);
        assert!((0..form.provider().fields().len()).all(|i| form.value(i).is_empty()));

        // Re-selecting the active provider keeps values
        form.set_value(0, "DIST1".to_string());
        form.select_provider(CdnProvider::Cloudfront);
        assert_eq!(form.value(0), "DIST1");
    }

    #[test]
    fn test_form_body_serializes_active_fields_only() {
        let form = filled_fastly_form(Arc::new(MockApi::default()));
        assert_eq!(
            form.form_body(),
            vec![
                ("type".to_string(), "fastly".to_string()),
                ("url".to_string(), "https://www.acme.dev".to_string()),
                ("serviceId".to_string(), "SVC123".to_string()),
                ("authToken".to_string(), "tok-456".to_string()),
            ]
        );
    }

    #[test]
    fn test_incomplete_form_does_not_submit() {
        let api = Arc::new(MockApi::default());
        let mut form = CredentialsForm::new(api, Some("fastly"));
        form.site_url = "https://www.acme.dev".to_string();
        form.set_value(0, "SVC123".to_string());
        // authToken missing
        assert!(form.begin_submit().is_none());
    }

    #[tokio::test]
    async fn test_submit_posts_body_and_displays_response() {
        let api = Arc::new(MockApi::default());
        let mut form = filled_fastly_form(api.clone());

        let call = form.begin_submit().unwrap();
        let result = call.run().await;
        form.complete_submit(result);

        assert_eq!(form.results.as_deref(), Some("accepted"));
        assert!(!form.is_busy());
        let bodies = api.bodies.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0][0], ("type".to_string(), "fastly".to_string()));
    }

    #[tokio::test]
    async fn test_network_failure_is_displayed_inline() {
        let api = Arc::new(MockApi::default());
        *api.response.lock().unwrap() =
            Some(Err(AdminError::network("invalidation", "connection refused")));
        let mut form = filled_fastly_form(api);

        let call = form.begin_submit().unwrap();
        let result = call.run().await;
        form.complete_submit(result);

        assert!(form.results.as_deref().unwrap().contains("connection refused"));
    }

    #[test]
    fn test_reset_keeps_provider_and_site_url() {
        let mut form = filled_fastly_form(Arc::new(MockApi::default()));
        form.results = Some("accepted".to_string());
        form.reset();
        assert_eq!(form.provider(), CdnProvider::Fastly);
        assert_eq!(form.site_url, "https://www.acme.dev");
        assert!(form.value(0).is_empty());
        assert!(form.results.is_none());
    }
}
