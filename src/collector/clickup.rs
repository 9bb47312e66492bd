//! ClickUp REST collector.
//!
//! Walks team -> spaces -> folders -> lists -> tasks. Every list is treated
//! as a sprint named after the list, and every task yields one record per
//! assignee (or a single [`UNASSIGNED`] record).

use crate::collector::RecordSource;
use crate::error::{Result, SprintError};
use crate::models::{RawRecord, UNASSIGNED};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Connection settings for the ClickUp API, passed in at construction.
#[derive(Clone)]
pub struct CollectorConfig {
    pub api_url: String,
    pub team_id: String,
    pub api_token: String,
    pub timeout_seconds: u64,
    /// Lists whose tasks are fetched concurrently.
    pub concurrency: usize,
    pub include_closed: bool,
}

// Keeps the token out of logs.
impl std::fmt::Debug for CollectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorConfig")
            .field("api_url", &self.api_url)
            .field("team_id", &self.team_id)
            .field("api_token", &"<redacted>")
            .field("timeout_seconds", &self.timeout_seconds)
            .field("concurrency", &self.concurrency)
            .field("include_closed", &self.include_closed)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct SpacesResponse {
    spaces: Vec<Container>,
}

#[derive(Debug, Deserialize)]
struct FoldersResponse {
    folders: Vec<Container>,
}

#[derive(Debug, Deserialize)]
struct ListsResponse {
    lists: Vec<SprintList>,
}

#[derive(Debug, Deserialize)]
struct TasksResponse {
    tasks: Vec<Task>,
}

#[derive(Debug, Deserialize)]
struct Container {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SprintList {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct Task {
    id: String,
    #[serde(default)]
    name: Option<String>,
    /// Milliseconds.
    #[serde(default)]
    time_estimate: Option<f64>,
    #[serde(default)]
    status: Option<TaskStatus>,
    #[serde(default)]
    assignees: Vec<Assignee>,
}

#[derive(Debug, Deserialize)]
struct TaskStatus {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Assignee {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl Assignee {
    fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

impl Task {
    /// One record per assignee, or a single unassigned record.
    fn into_records(self, sprint_name: &str) -> Vec<RawRecord> {
        let hours = match self.time_estimate {
            Some(ms) if ms > 0.0 => ms / MILLIS_PER_HOUR,
            _ => 0.0,
        };
        let title = self.name.unwrap_or_else(|| "Untitled Task".to_string());
        let status = self
            .status
            .and_then(|s| s.status)
            .unwrap_or_else(|| "Unknown".to_string());

        let assignees: Vec<String> = if self.assignees.is_empty() {
            vec![UNASSIGNED.to_string()]
        } else {
            self.assignees.iter().map(Assignee::display_name).collect()
        };

        assignees
            .into_iter()
            .map(|assignee| RawRecord::new(sprint_name, assignee, &title, &self.id, hours, &status))
            .collect()
    }
}

/// Pulls raw records from the ClickUp v2 API.
pub struct ClickUpCollector {
    config: CollectorConfig,
    http_client: reqwest::Client,
}

impl ClickUpCollector {
    pub fn new(config: CollectorConfig) -> Result<Self> {
        if config.api_token.trim().is_empty() {
            return Err(SprintError::UpstreamUnavailable(
                "no ClickUp API token configured (set API_TOKEN)".to_string(),
            ));
        }
        if config.team_id.trim().is_empty() {
            return Err(SprintError::UpstreamUnavailable(
                "no ClickUp team id configured (set TEAM_ID)".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                SprintError::UpstreamUnavailable(format!("failed to create HTTP client: {}", e))
            })?;

        info!(
            "ClickUp collector for team {} at {}",
            config.team_id, config.api_url
        );

        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(url)
            .header(AUTHORIZATION, self.config.api_token.as_str())
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SprintError::UpstreamUnavailable(format!(
                        "request to {} timed out after {}s",
                        url, self.config.timeout_seconds
                    ))
                } else if e.is_connect() {
                    SprintError::UpstreamUnavailable(format!("cannot connect to {}", url))
                } else {
                    SprintError::UpstreamUnavailable(format!("request to {} failed: {}", url, e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SprintError::UpstreamUnavailable(format!(
                "ClickUp API error {} for {}: {}",
                status, url, body
            )));
        }

        response.json::<T>().await.map_err(|e| {
            SprintError::UpstreamUnavailable(format!("failed to decode response from {}: {}", url, e))
        })
    }

    async fn fetch_sprint_lists(&self) -> Result<Vec<SprintList>> {
        let spaces: SpacesResponse = self
            .get_json(&self.url(&format!("team/{}/space", self.config.team_id)))
            .await?;
        debug!("Found {} spaces", spaces.spaces.len());

        let mut lists = Vec::new();
        for space in &spaces.spaces {
            let folders: FoldersResponse = self
                .get_json(&self.url(&format!("space/{}/folder", space.id)))
                .await?;

            for folder in &folders.folders {
                let folder_lists: ListsResponse = self
                    .get_json(&self.url(&format!("folder/{}/list", folder.id)))
                    .await?;
                lists.extend(folder_lists.lists);
            }
        }

        Ok(lists)
    }

    async fn fetch_list_records(&self, list: &SprintList) -> Result<Vec<RawRecord>> {
        let url = self.url(&format!(
            "list/{}/task?include_closed={}&include_timl=true",
            list.id, self.config.include_closed
        ));
        let response: TasksResponse = self.get_json(&url).await?;
        debug!("List '{}': {} tasks", list.name, response.tasks.len());

        Ok(response
            .tasks
            .into_iter()
            .flat_map(|task| task.into_records(&list.name))
            .collect())
    }
}

#[async_trait]
impl RecordSource for ClickUpCollector {
    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        let lists = self.fetch_sprint_lists().await?;
        info!("Fetching tasks for {} lists", lists.len());

        // `buffered` yields in input order, keeping sprint order stable.
        let fetches: Vec<_> = lists
            .iter()
            .map(|list| self.fetch_list_records(list))
            .collect();
        let per_list: Vec<Vec<RawRecord>> = stream::iter(fetches)
            .buffered(self.config.concurrency.max(1))
            .try_collect()
            .await?;

        let records: Vec<RawRecord> = per_list.into_iter().flatten().collect();
        info!("Collected {} raw records", records.len());
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("ClickUp team {}", self.config.team_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(api_url: String) -> CollectorConfig {
        CollectorConfig {
            api_url,
            team_id: "team1".to_string(),
            api_token: "pk_test".to_string(),
            timeout_seconds: 5,
            concurrency: 2,
            include_closed: true,
        }
    }

    async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("Authorization", "pk_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mount_hierarchy(server: &MockServer) {
        mount_json(server, "/team/team1/space", json!({"spaces": [{"id": "sp1"}]})).await;
        mount_json(server, "/space/sp1/folder", json!({"folders": [{"id": "f1"}]})).await;
        mount_json(
            server,
            "/folder/f1/list",
            json!({"lists": [
                {"id": "l1", "name": "Sprint 1"},
                {"id": "l2", "name": "Sprint 2"}
            ]}),
        )
        .await;
    }

    #[tokio::test]
    async fn test_fetch_records_walks_hierarchy() {
        let server = MockServer::start().await;
        mount_hierarchy(&server).await;

        Mock::given(method("GET"))
            .and(path("/list/l1/task"))
            .and(query_param("include_closed", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tasks": [
                {
                    "id": "t1",
                    "name": "Login page",
                    "time_estimate": 7_200_000,
                    "status": {"status": "complete"},
                    "assignees": [{"username": "alice"}, {"username": "bob"}]
                },
                {
                    "id": "t2",
                    "name": "Backlog grooming",
                    "time_estimate": null,
                    "status": {"status": "open"},
                    "assignees": []
                }
            ]})))
            .mount(&server)
            .await;
        mount_json(
            &server,
            "/list/l2/task",
            json!({"tasks": [{"id": "t3", "status": {"status": "in progress"},
                              "assignees": [{"username": null, "email": "carol@example.com"}]}]}),
        )
        .await;

        let collector = ClickUpCollector::new(config(server.uri())).unwrap();
        let records = collector.fetch_records().await.unwrap();

        assert_eq!(
            records,
            vec![
                RawRecord::new("Sprint 1", "alice", "Login page", "t1", 2.0, "complete"),
                RawRecord::new("Sprint 1", "bob", "Login page", "t1", 2.0, "complete"),
                RawRecord::new("Sprint 1", UNASSIGNED, "Backlog grooming", "t2", 0.0, "open"),
                RawRecord::new(
                    "Sprint 2",
                    "carol@example.com",
                    "Untitled Task",
                    "t3",
                    0.0,
                    "in progress"
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_slow_first_list_keeps_list_order() {
        let server = MockServer::start().await;
        mount_hierarchy(&server).await;

        Mock::given(method("GET"))
            .and(path("/list/l1/task"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(200))
                    .set_body_json(json!({"tasks": [{"id": "t1", "name": "Slow",
                        "assignees": [{"username": "alice"}]}]})),
            )
            .mount(&server)
            .await;
        mount_json(
            &server,
            "/list/l2/task",
            json!({"tasks": [{"id": "t2", "name": "Fast", "assignees": [{"username": "bob"}]}]}),
        )
        .await;

        let collector = ClickUpCollector::new(config(server.uri())).unwrap();
        let records = collector.fetch_records().await.unwrap();

        let sprints: Vec<_> = records.iter().map(|r| r.sprint_name.as_str()).collect();
        assert_eq!(sprints, vec!["Sprint 1", "Sprint 2"]);
    }

    #[tokio::test]
    async fn test_http_error_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/team/team1/space"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Token invalid"))
            .mount(&server)
            .await;

        let collector = ClickUpCollector::new(config(server.uri())).unwrap();
        let err = collector.fetch_records().await.unwrap_err();

        match err {
            SprintError::UpstreamUnavailable(message) => {
                assert!(message.contains("401"));
                assert!(message.contains("Token invalid"));
            }
            other => panic!("expected UpstreamUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_task_without_id_is_rejected() {
        let server = MockServer::start().await;
        mount_hierarchy(&server).await;
        mount_json(&server, "/list/l1/task", json!({"tasks": [{"name": "no id"}]})).await;
        mount_json(&server, "/list/l2/task", json!({"tasks": []})).await;

        let collector = ClickUpCollector::new(config(server.uri())).unwrap();
        assert!(matches!(
            collector.fetch_records().await,
            Err(SprintError::UpstreamUnavailable(_))
        ));
    }

    #[test]
    fn test_missing_credentials() {
        let mut cfg = config("http://localhost".to_string());
        cfg.api_token = String::new();
        assert!(ClickUpCollector::new(cfg).is_err());

        let mut cfg = config("http://localhost".to_string());
        cfg.team_id = " ".to_string();
        assert!(ClickUpCollector::new(cfg).is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let cfg = config("http://localhost".to_string());
        let debug = format!("{:?}", cfg);
        assert!(!debug.contains("pk_test"));
        assert!(debug.contains("<redacted>"));
    }
}
