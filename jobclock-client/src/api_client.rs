use jobclock_common::api::{
    AccountSummary, AddEntryRequest, AddEntryResponse, AddFavoriteRequest, ApiError, ApiSuccess,
    EmployeeSummary, HealthCheckResponse, JobSummary, LoginRequest, LoginResponse,
    RemoveFavoriteRequest, SignupRequest, StopEntryRequest, UpdateEntryRequest, UserInfo,
};
use jobclock_common::domain::{Favorite, TimeEntry};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Response, StatusCode};
use uuid::Uuid;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A network/timeout failure is kept apart from an error the server
/// reported, so the caller can deduplicate offline noise while still
/// showing validation messages verbatim.
#[derive(thiserror::Error, Debug)]
pub enum ApiClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{message}")]
    Server {
        status: StatusCode,
        message: String,
        code: Option<String>,
    },
}

impl ApiClientError {
    pub fn is_network(&self) -> bool {
        matches!(self, ApiClientError::Network(_))
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ApiClientError::Server { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

async fn handle_response_error(res: Response) -> Result<Response, ApiClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let (message, code) = match res.json::<ApiError>().await {
        Ok(body) => (body.error, body.code),
        Err(_) => (format!("Service error: status {status}"), None),
    };

    Err(ApiClientError::Server {
        status,
        message,
        code,
    })
}

pub async fn health_check(address: &str) -> Result<HealthCheckResponse, ApiClientError> {
    let url = format!("{address}/api/health");
    let res = reqwest::get(url).await?;
    let res = handle_response_error(res).await?;

    Ok(res.json::<HealthCheckResponse>().await?)
}

pub async fn signup(
    address: &str,
    emp_code: &str,
    emp_name: Option<&str>,
    password: &str,
) -> Result<UserInfo, ApiClientError> {
    let url = format!("{address}/api/users/signup");
    let res = reqwest::Client::new()
        .post(url)
        .json(&SignupRequest {
            emp_code: emp_code.to_string(),
            emp_name: emp_name.map(|v| v.to_string()),
            password: password.to_string(),
        })
        .send()
        .await?;
    let res = handle_response_error(res).await?;

    Ok(res.json::<ApiSuccess<UserInfo>>().await?.data)
}

pub async fn login(
    address: &str,
    emp_code: &str,
    password: &str,
    remember: bool,
) -> Result<LoginResponse, ApiClientError> {
    let url = format!("{address}/api/users/login");
    let res = reqwest::Client::new()
        .post(url)
        .json(&LoginRequest {
            emp_code: emp_code.to_string(),
            password: password.to_string(),
            remember,
        })
        .send()
        .await?;
    let res = handle_response_error(res).await?;

    Ok(res.json::<ApiSuccess<LoginResponse>>().await?.data)
}

pub struct AuthClient {
    client: reqwest::Client,
    address: String,
}

impl AuthClient {
    pub fn new(address: &str, session: &str) -> eyre::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {session}"))?);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("jobclock/{VERSION}"))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            address: address.trim_end_matches('/').to_string(),
        })
    }

    pub async fn validate(&self) -> Result<UserInfo, ApiClientError> {
        let url = format!("{}/api/users/validate", self.address);
        let res = self.client.get(url).send().await?;
        let res = handle_response_error(res).await?;

        Ok(res.json::<ApiSuccess<UserInfo>>().await?.data)
    }

    pub async fn logout(&self) -> Result<(), ApiClientError> {
        let url = format!("{}/api/users/logout", self.address);
        let res = self.client.post(url).send().await?;
        handle_response_error(res).await?;

        Ok(())
    }

    pub async fn active_entries(&self) -> Result<Vec<TimeEntry>, ApiClientError> {
        let url = format!("{}/api/time-entries/active", self.address);
        let res = self.client.get(url).send().await?;
        let res = handle_response_error(res).await?;

        Ok(res.json::<ApiSuccess<Vec<TimeEntry>>>().await?.data)
    }

    pub async fn entries(&self, limit: i64) -> Result<Vec<TimeEntry>, ApiClientError> {
        let url = format!("{}/api/time-entries", self.address);
        let res = self
            .client
            .get(url)
            .query(&[("limit", limit)])
            .send()
            .await?;
        let res = handle_response_error(res).await?;

        Ok(res.json::<ApiSuccess<Vec<TimeEntry>>>().await?.data)
    }

    pub async fn entry(&self, id: Uuid) -> Result<TimeEntry, ApiClientError> {
        let url = format!("{}/api/time-entries/{id}", self.address);
        let res = self.client.get(url).send().await?;
        let res = handle_response_error(res).await?;

        Ok(res.json::<ApiSuccess<TimeEntry>>().await?.data)
    }

    pub async fn create_entry(&self, req: &AddEntryRequest) -> Result<Uuid, ApiClientError> {
        let url = format!("{}/api/time-entries", self.address);
        let res = self.client.post(url).json(req).send().await?;
        let res = handle_response_error(res).await?;

        Ok(res.json::<ApiSuccess<AddEntryResponse>>().await?.data.id)
    }

    pub async fn update_entry(
        &self,
        id: Uuid,
        req: &UpdateEntryRequest,
    ) -> Result<TimeEntry, ApiClientError> {
        let url = format!("{}/api/time-entries/{id}", self.address);
        let res = self.client.put(url).json(req).send().await?;
        let res = handle_response_error(res).await?;

        Ok(res.json::<ApiSuccess<TimeEntry>>().await?.data)
    }

    pub async fn stop_entry(
        &self,
        id: Uuid,
        req: &StopEntryRequest,
    ) -> Result<TimeEntry, ApiClientError> {
        let url = format!("{}/api/time-entries/{id}/stop", self.address);
        let res = self.client.put(url).json(req).send().await?;
        let res = handle_response_error(res).await?;

        Ok(res.json::<ApiSuccess<TimeEntry>>().await?.data)
    }

    pub async fn delete_entry(&self, id: Uuid) -> Result<TimeEntry, ApiClientError> {
        let url = format!("{}/api/time-entries/{id}", self.address);
        let res = self.client.delete(url).send().await?;
        let res = handle_response_error(res).await?;

        Ok(res.json::<ApiSuccess<TimeEntry>>().await?.data)
    }

    pub async fn jobs(&self, search: Option<&str>) -> Result<Vec<JobSummary>, ApiClientError> {
        let url = format!("{}/api/jobs", self.address);
        let mut req = self.client.get(url);
        if let Some(search) = search {
            req = req.query(&[("search", search)]);
        }
        let res = req.send().await?;
        let res = handle_response_error(res).await?;

        Ok(res.json::<ApiSuccess<Vec<JobSummary>>>().await?.data)
    }

    pub async fn employees(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<EmployeeSummary>, ApiClientError> {
        let url = format!("{}/api/employees", self.address);
        let mut req = self.client.get(url);
        if let Some(search) = search {
            req = req.query(&[("search", search)]);
        }
        let res = req.send().await?;
        let res = handle_response_error(res).await?;

        Ok(res.json::<ApiSuccess<Vec<EmployeeSummary>>>().await?.data)
    }

    pub async fn job_accounts(&self, job_code: &str) -> Result<Vec<AccountSummary>, ApiClientError> {
        let url = format!("{}/api/job-costing-accounts", self.address);
        let res = self
            .client
            .get(url)
            .query(&[("jobCode", job_code)])
            .send()
            .await?;
        let res = handle_response_error(res).await?;

        Ok(res.json::<ApiSuccess<Vec<AccountSummary>>>().await?.data)
    }

    pub async fn favorites(&self, emp_code: &str) -> Result<Vec<Favorite>, ApiClientError> {
        let url = format!("{}/api/users/{emp_code}/favorites", self.address);
        let res = self.client.get(url).send().await?;
        let res = handle_response_error(res).await?;

        Ok(res.json::<ApiSuccess<Vec<Favorite>>>().await?.data)
    }

    pub async fn add_favorite(
        &self,
        req: &AddFavoriteRequest,
    ) -> Result<Vec<Favorite>, ApiClientError> {
        let url = format!("{}/api/users/favorites", self.address);
        let res = self.client.post(url).json(req).send().await?;
        let res = handle_response_error(res).await?;

        Ok(res.json::<ApiSuccess<Vec<Favorite>>>().await?.data)
    }

    pub async fn remove_favorite(&self, job_no: &str) -> Result<Vec<Favorite>, ApiClientError> {
        let url = format!("{}/api/users/favorites", self.address);
        let res = self
            .client
            .delete(url)
            .json(&RemoveFavoriteRequest {
                job_no: job_no.to_string(),
            })
            .send()
            .await?;
        let res = handle_response_error(res).await?;

        Ok(res.json::<ApiSuccess<Vec<Favorite>>>().await?.data)
    }
}
