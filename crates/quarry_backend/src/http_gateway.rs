use crate::wire::{record_from_resource, resource_from_record};
use anyhow::{Context as _, anyhow};
use quarry_api::{OWNER_FILTER_PARAM, PreferenceCollection, PreferenceDocument};
use quarry_domain::{OwnerId, PreferenceGateway, PreferenceId, UserPreferenceRecord};
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder, Response};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON:API client for the user-preference resource.
pub struct HttpPreferenceGateway {
    client: Client,
    endpoint: Url,
    auth_token: Option<String>,
}

impl HttpPreferenceGateway {
    pub fn new(endpoint: &str, auth_token: Option<String>) -> anyhow::Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("invalid preference endpoint {endpoint:?}"))?;
        if endpoint.cannot_be_a_base() {
            return Err(anyhow!("preference endpoint {endpoint} cannot be a base url"));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            endpoint,
            auth_token,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn fetch(&self, owner_id: &OwnerId) -> anyhow::Result<Option<UserPreferenceRecord>> {
        let url = Url::parse_with_params(
            self.endpoint.as_str(),
            &[(OWNER_FILTER_PARAM, owner_id.as_str())],
        )
        .context("failed to build preference query url")?;

        let response = self
            .authorized(self.client.get(url))
            .send()
            .context("preference request failed")?;
        let collection: PreferenceCollection = ensure_success(response)?
            .json()
            .context("invalid preference collection")?;

        let mut resources = collection.data.into_iter();
        let first = resources.next();
        if resources.next().is_some() {
            tracing::warn!(owner_id = %owner_id, "multiple preference records for owner, using the first");
        }
        first.map(record_from_resource).transpose()
    }

    pub fn save(&self, record: &UserPreferenceRecord) -> anyhow::Result<UserPreferenceRecord> {
        let document = PreferenceDocument {
            data: resource_from_record(record),
        };
        let request = match &record.id {
            None => self.client.post(self.endpoint.clone()),
            Some(id) => self.client.patch(self.resource_url(id)?),
        };

        let response = self
            .authorized(request)
            .json(&document)
            .send()
            .context("preference save request failed")?;
        let saved: PreferenceDocument = ensure_success(response)?
            .json()
            .context("invalid preference save response")?;
        record_from_resource(saved.data)
    }

    fn resource_url(&self, id: &PreferenceId) -> anyhow::Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("preference endpoint cannot be a base url"))?
            .pop_if_empty()
            .push(id.as_str());
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn ensure_success(response: Response) -> anyhow::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(anyhow!(
        "preference service returned {status}: {}",
        body.trim()
    ))
}

impl PreferenceGateway for HttpPreferenceGateway {
    fn fetch_preference(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Option<UserPreferenceRecord>, String> {
        self.fetch(owner_id).map_err(|err| format!("{err:#}"))
    }

    fn save_preference(
        &self,
        record: UserPreferenceRecord,
    ) -> Result<UserPreferenceRecord, String> {
        self.save(&record).map_err(|err| format!("{err:#}"))
    }
}
