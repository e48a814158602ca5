use super::*;

#[derive(Debug, Clone, Deserialize)]
pub(super) struct DirectoryResponse {
    #[serde(default)]
    pub(super) data: Vec<ProfileStub>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ProfileStub {
    pub(super) profile_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct ProfileBody {
    #[serde(default)]
    pub(super) name: Option<String>,
    #[serde(default)]
    pub(super) description: Option<String>,
    #[serde(default)]
    pub(super) primary_url: Option<String>,
    #[serde(default)]
    pub(super) image: Option<String>,
    #[serde(default)]
    pub(super) locality: Option<String>,
    #[serde(default)]
    pub(super) profile_url: Option<String>,
    #[serde(default)]
    pub(super) knows: Vec<KnowsEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct KnowsEntry {
    #[serde(default)]
    pub(super) name: Option<String>,
    #[serde(default)]
    pub(super) url: Option<String>,
    #[serde(default, rename = "type")]
    pub(super) relation_type: Option<String>,
}

#[derive(Debug, Error)]
pub(super) enum FetchError {
    #[error("profile {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("profile {url} could not be fetched")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("profile {url} is not a valid profile document")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// The remote listing of person profiles.
pub(super) trait ProfileDirectory {
    /// Lists every profile stub. Failure here ends the run.
    fn list_profiles(&self) -> Result<Vec<ProfileStub>>;

    /// Fetches one profile. Failures are per profile and callers skip them.
    fn fetch_profile(&self, profile_url: &str) -> std::result::Result<ProfileBody, FetchError>;
}

pub(super) struct HttpProfileDirectory {
    client: reqwest::blocking::Client,
    directory_url: String,
}

impl HttpProfileDirectory {
    pub(super) fn new(directory_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            directory_url: directory_url.to_string(),
        })
    }
}

impl ProfileDirectory for HttpProfileDirectory {
    fn list_profiles(&self) -> Result<Vec<ProfileStub>> {
        let response = self
            .client
            .get(&self.directory_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .with_context(|| format!("failed to reach profile directory {}", self.directory_url))?
            .error_for_status()
            .with_context(|| format!("profile directory {} rejected the request", self.directory_url))?;

        let listing: DirectoryResponse = response
            .json()
            .with_context(|| format!("failed to parse profile directory {}", self.directory_url))?;

        Ok(listing.data)
    }

    fn fetch_profile(&self, profile_url: &str) -> std::result::Result<ProfileBody, FetchError> {
        let response = self
            .client
            .get(profile_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|source| FetchError::Transport {
                url: profile_url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: profile_url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json().map_err(|source| FetchError::Decode {
            url: profile_url.to_string(),
            source,
        })
    }
}
