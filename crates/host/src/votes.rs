//! Contestation votes from the indexing service

use arbius_core::{ContestationVote, TaskId};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::HostError;

/// Source of indexed contestation votes
#[async_trait]
pub trait VoteSource: Send + Sync + 'static {
    /// Every vote recorded for `task` on the configured network
    async fn contestation_votes(&self, task: &TaskId) -> Result<Vec<ContestationVote>, HostError>;
}

/// [`VoteSource`] backed by the indexer's GraphQL endpoint.
///
/// One unpaginated query per task: the indexer returns the full vote set.
#[derive(Debug, Clone)]
pub struct GraphQlVoteReader {
    url: String,
    query: String,
    http_client: reqwest::Client,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<VotesData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VotesData {
    contestation_votes: Vec<ContestationVote>,
}

impl GraphQlVoteReader {
    /// Create a reader for `url`, scoped to `network` (e.g. `"nova"`)
    pub fn new(url: impl Into<String>, network: &str) -> Self {
        Self {
            url: url.into(),
            query: votes_query(network),
            http_client: reqwest::Client::new(),
        }
    }

    /// The GraphQL document sent for every task
    pub fn query(&self) -> &str {
        &self.query
    }
}

#[async_trait]
impl VoteSource for GraphQlVoteReader {
    async fn contestation_votes(&self, task: &TaskId) -> Result<Vec<ContestationVote>, HostError> {
        let request = json!({
            "operationName": "GetContestationVotes",
            "query": self.query,
            "variables": { "id": task.to_string() },
        });
        debug!(target: "vote_reader", %task, "Querying contestation votes");

        let body = self
            .http_client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        let votes = parse_votes_response(body)?;
        debug!(target: "vote_reader", %task, count = votes.len(), "Contestation votes resolved");
        Ok(votes)
    }
}

/// The network literal is embedded as a JSON string, which is also a valid
/// GraphQL string literal.
fn votes_query(network: &str) -> String {
    let network = Value::String(network.to_string());
    format!(
        "query GetContestationVotes($id: String!) {{ \
         contestationVotes(where: {{ taskID_eq: $id, network_eq: {network} }}) \
         {{ id address yea timestamp txHash }} }}"
    )
}

fn parse_votes_response(body: Value) -> Result<Vec<ContestationVote>, HostError> {
    let response: GraphQlResponse = serde_json::from_value(body)?;

    if !response.errors.is_empty() {
        let messages: Vec<_> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(HostError::GraphQl(messages.join("; ")));
    }

    response
        .data
        .map(|data| data.contestation_votes)
        .ok_or_else(|| HostError::GraphQl("response has no data".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_embeds_network() {
        let reader = GraphQlVoteReader::new("http://indexer.local/graphql", "nova");
        assert!(reader.query().contains(r#"network_eq: "nova""#));
        assert!(reader.query().contains("taskID_eq: $id"));
        assert!(reader.query().starts_with("query GetContestationVotes($id: String!)"));
    }

    #[test]
    fn test_query_escapes_network() {
        let query = votes_query(r#"no"va"#);
        assert!(query.contains(r#"network_eq: "no\"va""#));
    }

    #[test]
    fn test_parse_votes() {
        let body = json!({
            "data": {
                "contestationVotes": [
                    { "id": "1", "address": "0xaa", "yea": true, "timestamp": "1700000000", "txHash": "0x01" },
                    { "id": "2", "address": "0xbb", "yea": false, "timestamp": "1700000005", "txHash": "0x02" }
                ]
            }
        });
        let votes = parse_votes_response(body).unwrap();
        assert_eq!(votes.len(), 2);
        assert!(votes[0].yea);
        assert_eq!(votes[1].address, "0xbb");
    }

    #[test]
    fn test_parse_graphql_errors() {
        let body = json!({
            "data": null,
            "errors": [{ "message": "rate limited" }, { "message": "try later" }]
        });
        let err = parse_votes_response(body).unwrap_err();
        assert_eq!(err.to_string(), "indexer error: rate limited; try later");
    }

    #[test]
    fn test_parse_missing_data() {
        assert!(matches!(parse_votes_response(json!({})), Err(HostError::GraphQl(_))));
    }
}
