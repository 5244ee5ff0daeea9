mod helpers;
use helpers::{login_user, spawn_app_with_spire};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn job_page(start: i64, len: i64, total: i64) -> serde_json::Value {
    let records: Vec<_> = (start..start + len)
        .map(|n| json!({"jobNo": format!("J{n:03}"), "description": format!("Job {n}"), "status": "open"}))
        .collect();
    json!({"records": records, "count": total})
}

#[tokio::test]
async fn jobs_walk_pages_and_stop_at_the_total() {
    let spire = MockServer::start().await;

    // 125 records at a page size of 50: three requests, never a fourth
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_page(0, 50, 125)))
        .expect(1)
        .mount(&spire)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("start", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_page(50, 50, 125)))
        .expect(1)
        .mount(&spire)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("start", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_page(100, 25, 125)))
        .expect(1)
        .mount(&spire)
        .await;

    let server = spawn_app_with_spire(&spire.uri()).await.unwrap();
    let client = login_user(&server, "E100").await.unwrap();

    let jobs = client.jobs(None).await.unwrap();
    assert_eq!(jobs.len(), 125);
    assert_eq!(jobs[0].job_no, "J000");
    assert_eq!(jobs[124].job_no, "J124");
}

#[tokio::test]
async fn a_failed_job_page_is_skipped_not_fatal() {
    let spire = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&spire)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("start", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_page(50, 10, 60)))
        .expect(1)
        .mount(&spire)
        .await;

    let server = spawn_app_with_spire(&spire.uri()).await.unwrap();
    let client = login_user(&server, "E100").await.unwrap();

    let jobs = client.jobs(None).await.unwrap();
    assert_eq!(jobs.len(), 10);
    assert_eq!(jobs[0].job_no, "J050");
}

#[tokio::test]
async fn a_failed_employee_page_aborts_the_fetch() {
    let spire = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/employees"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&spire)
        .await;

    let server = spawn_app_with_spire(&spire.uri()).await.unwrap();
    let client = login_user(&server, "E100").await.unwrap();

    assert!(client.employees(None).await.is_err());
}

#[tokio::test]
async fn employees_come_back_in_one_or_more_pages() {
    let spire = MockServer::start().await;

    let records: Vec<_> = (0..3)
        .map(|n| json!({"employeeNo": format!("E{n:03}"), "name": format!("Employee {n}")}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/employees"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"records": records, "count": 3})),
        )
        .expect(1)
        .mount(&spire)
        .await;

    let server = spawn_app_with_spire(&spire.uri()).await.unwrap();
    let client = login_user(&server, "E100").await.unwrap();

    let employees = client.employees(None).await.unwrap();
    assert_eq!(employees.len(), 3);
    assert_eq!(employees[0].employee_code, "E000");
}

#[tokio::test]
async fn job_accounts_pass_the_job_code_through() {
    let spire = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/job-costing-accounts"))
        .and(query_param("jobCode", "J100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{"accountNo": "40-100", "description": "Framing"}],
            "count": 1
        })))
        .expect(1)
        .mount(&spire)
        .await;

    let server = spawn_app_with_spire(&spire.uri()).await.unwrap();
    let client = login_user(&server, "E100").await.unwrap();

    let accounts = client.job_accounts("J100").await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].account_no, "40-100");
    assert_eq!(accounts[0].account_name, "Framing");
}
