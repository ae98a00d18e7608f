//! [ContributionSource] backed by the GitHub GraphQL API.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::{
    engine::{
        calendar::ActivityDay,
        events::{ContributionEvent, ContributionKind},
    },
    errors::{FetchError, MalformedEventError},
    utils::time::DayWindow,
};

use super::ContributionSource;

const GRAPHQL_URL: &str = "https://api.github.com/graphql";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

const CALENDAR_QUERY: &str = r#"
query($userName: String!) {
  user(login: $userName) {
    contributionsCollection {
      contributionCalendar {
        weeks {
          contributionDays {
            contributionCount
            date
          }
        }
      }
    }
  }
}
"#;

const EVENTS_QUERY: &str = r#"
query($userName: String!, $from: DateTime!, $to: DateTime!) {
  user(login: $userName) {
    contributionsCollection(from: $from, to: $to) {
      commitContributionsByRepository(maxRepositories: 100) {
        repository { name }
        contributions(first: 100) {
          nodes { occurredAt commitCount }
        }
      }
      issueContributions(first: 100) {
        nodes { occurredAt issue { repository { name } } }
      }
      pullRequestContributions(first: 100) {
        nodes { occurredAt pullRequest { repository { name } } }
      }
      pullRequestReviewContributions(first: 100) {
        nodes { occurredAt pullRequestReview { repository { name } } }
      }
      repositoryContributions(first: 100) {
        nodes { occurredAt repository { name } }
      }
    }
  }
}
"#;

/// Structs for the GraphQL envelope.

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct UserData<C> {
    user: Option<UserNode<C>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserNode<C> {
    contributions_collection: C,
}

/// Structs for the contribution calendar.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarCollection {
    contribution_calendar: ContributionCalendar,
}

#[derive(Deserialize)]
struct ContributionCalendar {
    weeks: Vec<CalendarWeek>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarWeek {
    contribution_days: Vec<CalendarDay>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarDay {
    contribution_count: u32,
    date: NaiveDate,
}

/// Structs for typed contributions.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsCollection {
    commit_contributions_by_repository: Option<Vec<CommitsByRepository>>,
    issue_contributions: Option<Connection<IssueNode>>,
    pull_request_contributions: Option<Connection<PullRequestNode>>,
    pull_request_review_contributions: Option<Connection<ReviewNode>>,
    repository_contributions: Option<Connection<RepositoryNode>>,
}

#[derive(Deserialize)]
struct Connection<T> {
    nodes: Option<Vec<T>>,
}

impl<T> Connection<T> {
    fn into_nodes(connection: Option<Self>) -> impl Iterator<Item = T> {
        connection
            .and_then(|c| c.nodes)
            .unwrap_or_default()
            .into_iter()
    }
}

#[derive(Deserialize)]
struct RepositoryRef {
    name: String,
}

#[derive(Deserialize)]
struct RepositoryHolder {
    repository: Option<RepositoryRef>,
}

#[derive(Deserialize)]
struct CommitsByRepository {
    repository: Option<RepositoryRef>,
    contributions: Option<Connection<CommitNode>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitNode {
    occurred_at: String,
    commit_count: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueNode {
    occurred_at: String,
    issue: Option<RepositoryHolder>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestNode {
    occurred_at: String,
    pull_request: Option<RepositoryHolder>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewNode {
    occurred_at: String,
    pull_request_review: Option<RepositoryHolder>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    occurred_at: String,
    repository: Option<RepositoryRef>,
}

fn holder_name(holder: Option<RepositoryHolder>) -> Option<String> {
    holder.and_then(|h| h.repository).map(|r| r.name)
}

pub struct GithubSource {
    client: Client,
    token: String,
    endpoint: String,
}

impl GithubSource {
    pub fn new(token: String) -> Result<Self, FetchError> {
        Self::with_endpoint(token, GRAPHQL_URL.to_string())
    }

    pub fn with_endpoint(token: String, endpoint: String) -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            token,
            endpoint,
        })
    }

    async fn query<C: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<C, FetchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        decode_collection(&successful_body(status, body)?)
    }
}

/// A response that isn't 2xx is an error whatever its body says.
fn successful_body(status: StatusCode, body: String) -> Result<String, FetchError> {
    if status.is_success() {
        Ok(body)
    } else {
        Err(FetchError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ContributionSource for GithubSource {
    #[instrument(skip(self))]
    async fn fetch_calendar(&self, user: &str) -> Result<Vec<ActivityDay>, FetchError> {
        let collection: CalendarCollection = self
            .query(CALENDAR_QUERY, json!({ "userName": user }))
            .await?;
        let days = calendar_days(collection);
        debug!("Fetched calendar with {} days", days.len());
        Ok(days)
    }

    #[instrument(skip(self))]
    async fn fetch_events(
        &self,
        user: &str,
        window: &DayWindow,
    ) -> Result<Vec<ContributionEvent>, FetchError> {
        let variables = json!({
            "userName": user,
            "from": window.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            "to": window.end.to_rfc3339_opts(SecondsFormat::Secs, true),
        });
        let collection: EventsCollection = self.query(EVENTS_QUERY, variables).await?;
        let events = collect_events(collection);
        debug!("Fetched {} contribution events", events.len());
        Ok(events)
    }
}

/// Unwraps the GraphQL envelope down to the user's contributions collection.
fn decode_collection<C: DeserializeOwned>(body: &str) -> Result<C, FetchError> {
    let response: GraphQlResponse<UserData<C>> =
        serde_json::from_str(body).map_err(|e| FetchError::Payload(e.to_string()))?;

    if let Some(errors) = response.errors.filter(|v| !v.is_empty()) {
        let messages = errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(FetchError::Query(messages));
    }

    let data = response
        .data
        .ok_or_else(|| FetchError::Payload("Response has no data".into()))?;
    let user = data
        .user
        .ok_or_else(|| FetchError::Query("User not found".into()))?;
    Ok(user.contributions_collection)
}

fn calendar_days(collection: CalendarCollection) -> Vec<ActivityDay> {
    let mut days = collection
        .contribution_calendar
        .weeks
        .into_iter()
        .flat_map(|week| week.contribution_days)
        .map(|day| ActivityDay::new(day.date, day.contribution_count))
        .collect::<Vec<_>>();
    days.sort();
    days
}

fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, MalformedEventError> {
    DateTime::parse_from_rfc3339(raw).map_err(|source| MalformedEventError {
        raw: raw.to_string(),
        source,
    })
}

/// Flattens every contribution kind into events. A commit node stands for `commitCount` commits
/// made on the same day, so it is expanded accordingly. Events with timestamps that can't be
/// parsed are dropped.
fn collect_events(collection: EventsCollection) -> Vec<ContributionEvent> {
    let mut raw = Vec::<(String, Option<String>, ContributionKind, u32)>::new();

    for by_repository in collection
        .commit_contributions_by_repository
        .unwrap_or_default()
    {
        let name = by_repository.repository.map(|r| r.name);
        for node in Connection::into_nodes(by_repository.contributions) {
            let commits = node.commit_count.unwrap_or(1).max(1);
            raw.push((node.occurred_at, name.clone(), ContributionKind::Commit, commits));
        }
    }
    for node in Connection::into_nodes(collection.issue_contributions) {
        raw.push((node.occurred_at, holder_name(node.issue), ContributionKind::Issue, 1));
    }
    for node in Connection::into_nodes(collection.pull_request_contributions) {
        raw.push((
            node.occurred_at,
            holder_name(node.pull_request),
            ContributionKind::PullRequest,
            1,
        ));
    }
    for node in Connection::into_nodes(collection.pull_request_review_contributions) {
        raw.push((
            node.occurred_at,
            holder_name(node.pull_request_review),
            ContributionKind::Review,
            1,
        ));
    }
    for node in Connection::into_nodes(collection.repository_contributions) {
        raw.push((
            node.occurred_at,
            node.repository.map(|r| r.name),
            ContributionKind::RepositoryCreated,
            1,
        ));
    }

    let mut events = Vec::with_capacity(raw.len());
    for (occurred_at, repository_name, kind, times) in raw {
        let occurred_at = match parse_timestamp(&occurred_at) {
            Ok(v) => v,
            Err(e) => {
                warn!("Skipping {kind} contribution in {repository_name:?}: {e}");
                continue;
            }
        };
        for _ in 0..times {
            events.push(ContributionEvent {
                repository_name: repository_name.clone(),
                occurred_at,
                kind,
            });
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;
    use reqwest::StatusCode;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use crate::{
        engine::{calendar::ActivityDay, events::ContributionKind},
        errors::FetchError,
        source::ContributionSource,
    };

    use super::{
        calendar_days, collect_events, decode_collection, successful_body, CalendarCollection,
        EventsCollection, GithubSource,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_decode_calendar() -> Result<()> {
        let body = r#"{
          "data": { "user": { "contributionsCollection": { "contributionCalendar": { "weeks": [
            { "contributionDays": [
              { "contributionCount": 0, "date": "2023-12-18" },
              { "contributionCount": 3, "date": "2023-12-19" }
            ] },
            { "contributionDays": [
              { "contributionCount": 2, "date": "2023-12-17" }
            ] }
          ] } } } }
        }"#;

        let collection: CalendarCollection = decode_collection(body)?;
        let days = calendar_days(collection);

        assert_eq!(
            days,
            vec![
                ActivityDay::new(date(2023, 12, 17), 2),
                ActivityDay::new(date(2023, 12, 18), 0),
                ActivityDay::new(date(2023, 12, 19), 3),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_decode_events() -> Result<()> {
        let body = r#"{
          "data": { "user": { "contributionsCollection": {
            "commitContributionsByRepository": [
              { "repository": { "name": "api" },
                "contributions": { "nodes": [
                  { "occurredAt": "2023-12-19T08:00:00Z", "commitCount": 3 },
                  { "occurredAt": "yesterday-ish", "commitCount": 2 }
                ] } }
            ],
            "issueContributions": { "nodes": [
              { "occurredAt": "2023-12-19T09:00:00Z", "issue": { "repository": { "name": "web" } } }
            ] },
            "pullRequestContributions": { "nodes": [] },
            "pullRequestReviewContributions": { "nodes": [
              { "occurredAt": "2023-12-19T10:00:00+05:30", "pullRequestReview": null }
            ] },
            "repositoryContributions": null
          } } }
        }"#;

        let collection: EventsCollection = decode_collection(body)?;
        let events = collect_events(collection);

        assert_eq!(events.len(), 5);
        assert_eq!(
            events
                .iter()
                .filter(|e| e.kind == ContributionKind::Commit)
                .count(),
            3
        );
        assert!(events
            .iter()
            .filter(|e| e.kind == ContributionKind::Commit)
            .all(|e| e.repository_name.as_deref() == Some("api")));
        let review = events
            .iter()
            .find(|e| e.kind == ContributionKind::Review)
            .unwrap();
        assert_eq!(review.repository_name, None);
        assert_eq!(review.occurred_at.offset().local_minus_utc(), 5 * 3600 + 30 * 60);
        Ok(())
    }

    #[test]
    fn test_decode_query_errors() {
        let body = r#"{
          "data": null,
          "errors": [ { "message": "Bad credentials" }, { "message": "Rate limited" } ]
        }"#;

        match decode_collection::<CalendarCollection>(body) {
            Err(FetchError::Query(message)) => {
                assert_eq!(message, "Bad credentials; Rate limited")
            }
            _ => panic!("Expected a query error"),
        }
    }

    #[test]
    fn test_decode_missing_user() {
        let body = r#"{ "data": { "user": null } }"#;
        assert!(matches!(
            decode_collection::<EventsCollection>(body),
            Err(FetchError::Query(_))
        ));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_collection::<CalendarCollection>("<html>502</html>"),
            Err(FetchError::Payload(_))
        ));
    }

    #[test]
    fn test_successful_body() {
        assert_eq!(
            successful_body(StatusCode::OK, "{}".into()).ok(),
            Some("{}".to_string())
        );
        assert!(matches!(
            successful_body(StatusCode::UNAUTHORIZED, "Bad credentials".into()),
            Err(FetchError::Status { status: 401, body }) if body == "Bad credentials"
        ));
    }

    /// Answers a single request with `502 Bad Gateway` and returns the address to call.
    async fn bad_gateway_server() -> Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut request = Vec::new();
            let mut buffer = [0u8; 4096];
            // Read headers and body so the client isn't cut off mid request
            loop {
                let Ok(read) = socket.read(&mut buffer).await else {
                    return;
                };
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buffer[..read]);
                let text = String::from_utf8_lossy(&request).to_lowercase();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            let body = "upstream unavailable";
            let response = format!(
                "HTTP/1.1 502 Bad Gateway\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        Ok(format!("http://{address}/graphql"))
    }

    #[tokio::test]
    async fn test_fetch_calendar_bad_gateway() -> Result<()> {
        let endpoint = bad_gateway_server().await?;
        let source = GithubSource::with_endpoint("token".into(), endpoint)?;

        match source.fetch_calendar("octocat").await {
            Err(FetchError::Status { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream unavailable");
            }
            other => panic!("Expected a status error, got {other:?}"),
        }
        Ok(())
    }
}
