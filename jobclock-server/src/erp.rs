use crate::settings::Settings;
use eyre::{bail, Result};
use jobclock_common::api::{AccountSummary, EmployeeSummary, JobSummary};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Hard cap on job pagination; the job list is an unbounded dataset on
/// some ERP installs and the dropdown only needs so much.
const MAX_JOB_PAGES: usize = 20;
/// Extra attempts per page on timeout/connect-class failures.
const RETRIES: u32 = 2;

#[derive(serde::Deserialize)]
struct PageEnvelope<T> {
    #[serde(default = "Vec::new")]
    records: Vec<T>,
    #[serde(default)]
    count: Option<i64>,
}

#[derive(serde::Deserialize)]
struct JobRecord {
    #[serde(alias = "jobNo", alias = "code")]
    job_no: String,
    #[serde(alias = "description")]
    name: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(serde::Deserialize)]
struct EmployeeRecord {
    #[serde(alias = "employeeNo", alias = "code")]
    employee_no: String,
    name: String,
}

#[derive(serde::Deserialize)]
struct AccountRecord {
    #[serde(alias = "accountNo", alias = "code")]
    account_no: String,
    #[serde(alias = "description")]
    name: String,
}

/// Read-only client for the Spire ERP api. Spire is the source of truth
/// for jobs, employees and cost accounts; nothing is ever written back
/// through here.
#[derive(Clone)]
pub struct SpireClient {
    client: reqwest::Client,
    address: String,
    user: String,
    password: String,
    page_size: i64,
}

impl SpireClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.spire_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            address: settings.spire_address.trim_end_matches('/').to_string(),
            user: settings.spire_user.clone(),
            password: settings.spire_password.clone(),
            page_size: settings.spire_page_size.max(1),
        })
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.address, path);
        let mut attempt = 0;

        loop {
            let res = self
                .client
                .get(&url)
                .basic_auth(&self.user, Some(&self.password))
                .query(query)
                .send()
                .await;

            match res {
                Ok(res) => {
                    let status = res.status();
                    if !status.is_success() {
                        let body = res.text().await.unwrap_or_default();
                        bail!("Spire responded {status}: {body}");
                    }
                    return Ok(res.json::<T>().await?);
                }
                Err(err) if (err.is_timeout() || err.is_connect()) && attempt < RETRIES => {
                    attempt += 1;
                    let backoff = Duration::from_millis(500) * attempt;
                    debug!("retrying spire request in {backoff:?}: {err}");
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn page_query(&self, start: i64, search: Option<&str>) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("start", start.to_string()),
            ("limit", self.page_size.to_string()),
        ];
        if let Some(s) = search {
            query.push(("search", s.to_string()));
        }
        query
    }

    /// Paginated job list. A failed page is skipped so one bad page does
    /// not empty the whole dropdown; the loop stops on a short page, on
    /// reaching the reported total, or at the page cap.
    pub async fn jobs(&self, search: Option<&str>) -> Result<Vec<JobSummary>> {
        let mut out: Vec<JobSummary> = vec![];
        let mut start: i64 = 0;

        for _ in 0..MAX_JOB_PAGES {
            match self
                .get_page::<PageEnvelope<JobRecord>>("jobs", &self.page_query(start, search))
                .await
            {
                Ok(page) => {
                    let fetched = page.records.len() as i64;
                    out.extend(page.records.into_iter().map(|r| JobSummary {
                        job_no: r.job_no,
                        job_name: r.name,
                        status: r.status,
                    }));
                    start += self.page_size;

                    let total_reached = page
                        .count
                        .map_or(false, |total| out.len() as i64 >= total);
                    if fetched < self.page_size || total_reached {
                        break;
                    }
                }
                Err(err) => {
                    warn!("spire job page at offset {start} failed, skipping: {err}");
                    start += self.page_size;
                }
            }
        }

        Ok(out)
    }

    /// Paginated employee list. Unlike jobs, any page failure aborts the
    /// whole fetch; a partial employee list silently hides people.
    pub async fn employees(&self, search: Option<&str>) -> Result<Vec<EmployeeSummary>> {
        let mut out: Vec<EmployeeSummary> = vec![];
        let mut start: i64 = 0;

        loop {
            let page = self
                .get_page::<PageEnvelope<EmployeeRecord>>(
                    "employees",
                    &self.page_query(start, search),
                )
                .await?;

            let fetched = page.records.len() as i64;
            out.extend(page.records.into_iter().map(|r| EmployeeSummary {
                employee_code: r.employee_no,
                employee_name: r.name,
            }));
            start += self.page_size;

            let total_reached = page.count.map_or(false, |total| out.len() as i64 >= total);
            if fetched < self.page_size || total_reached {
                break;
            }
        }

        Ok(out)
    }

    pub async fn job_accounts(&self, job_code: &str) -> Result<Vec<AccountSummary>> {
        let query = vec![("jobCode", job_code.to_string())];
        let page = self
            .get_page::<PageEnvelope<AccountRecord>>("job-costing-accounts", &query)
            .await?;

        Ok(page
            .records
            .into_iter()
            .map(|r| AccountSummary {
                account_no: r.account_no,
                account_name: r.name,
            })
            .collect())
    }
}
