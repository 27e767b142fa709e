//! Document store client speaking the Firestore REST API

use super::codec::{self, Document, QueryRow};
use super::{StoreError, TaskStore};
use crate::auth::AuthSession;
use crate::config::BackendConfig;
use crate::domain::{NewTask, Task, TaskPatch};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

const TASKS: &str = "tasks";
const USERS: &str = "users";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// Firestore-backed task store
#[derive(Debug, Clone)]
pub struct FirestoreStore {
    client: Client,
    /// `{store_url}/projects/{project}/databases/(default)/documents`
    documents_url: String,
}

impl FirestoreStore {
    pub fn new(config: &BackendConfig, client: Client) -> Self {
        Self {
            client,
            documents_url: format!(
                "{}/projects/{}/databases/(default)/documents",
                config.store_url.trim_end_matches('/'),
                config.project_id
            ),
        }
    }

    fn doc_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents_url, collection, id)
    }

    fn authorized(&self, builder: RequestBuilder, session: &AuthSession) -> Result<RequestBuilder, StoreError> {
        if session.id_token.is_empty() {
            return Err(StoreError::Unauthenticated);
        }
        Ok(builder.bearer_auth(&session.id_token))
    }

    /// Turn non-2xx responses into errors; 404 becomes `NotFound(id)`
    async fn check(response: Response, id: &str) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(id.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or(body);
        Err(StoreError::Status {
            status: status.as_u16(),
            message,
        })
    }

    fn owner_query(uid: &str) -> Value {
        json!({
            "structuredQuery": {
                "from": [{ "collectionId": TASKS }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "userId" },
                        "op": "EQUAL",
                        "value": { "stringValue": uid }
                    }
                }
            }
        })
    }
}

#[async_trait]
impl TaskStore for FirestoreStore {
    async fn query_by_owner(&self, session: &AuthSession) -> Result<Vec<Task>, StoreError> {
        let url = format!("{}:runQuery", self.documents_url);
        let request = self
            .client
            .post(&url)
            .json(&Self::owner_query(&session.uid));

        let response = self.authorized(request, session)?.send().await?;
        let rows: Vec<QueryRow> = Self::check(response, TASKS).await?.json().await?;
        let tasks = codec::decode_query(&rows);

        debug!(uid = %session.uid, count = tasks.len(), "fetched tasks");
        Ok(tasks)
    }

    async fn get(&self, session: &AuthSession, id: &str) -> Result<Task, StoreError> {
        let request = self.client.get(self.doc_url(TASKS, id));
        let response = self.authorized(request, session)?.send().await?;
        let doc: Document = Self::check(response, id).await?.json().await?;

        let task = codec::decode_task(&doc)?;
        if task.owner_id != session.uid {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(task)
    }

    async fn create(&self, session: &AuthSession, task: NewTask) -> Result<Task, StoreError> {
        let url = format!("{}/{}", self.documents_url, TASKS);
        let request = self
            .client
            .post(&url)
            .json(&json!({ "fields": codec::encode_new_task(&task) }));

        let response = self.authorized(request, session)?.send().await?;
        let doc: Document = Self::check(response, TASKS).await?.json().await?;
        if doc.id().is_empty() {
            return Err(StoreError::Decode("created document has no name".to_string()));
        }

        info!(task_id = doc.id(), "task created");
        Ok(Task::from_new(doc.id().to_string(), task))
    }

    async fn update(&self, session: &AuthSession, id: &str, patch: &TaskPatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }

        let (fields, mask) = codec::encode_patch(patch);
        let mut query: Vec<(&str, &str)> = mask.iter().map(|path| ("updateMask.fieldPaths", *path)).collect();
        query.push(("currentDocument.exists", "true"));

        let request = self
            .client
            .patch(self.doc_url(TASKS, id))
            .query(&query)
            .json(&json!({ "fields": fields }));

        let response = self.authorized(request, session)?.send().await?;
        Self::check(response, id).await?;

        info!(task_id = id, fields = ?mask, "task updated");
        Ok(())
    }

    async fn delete(&self, session: &AuthSession, id: &str) -> Result<(), StoreError> {
        let request = self
            .client
            .delete(self.doc_url(TASKS, id))
            .query(&[("currentDocument.exists", "true")]);

        let response = self.authorized(request, session)?.send().await?;
        Self::check(response, id).await?;

        info!(task_id = id, "task deleted");
        Ok(())
    }

    async fn put_profile(&self, session: &AuthSession) -> Result<(), StoreError> {
        let fields = json!({
            "email": { "stringValue": session.email },
            "createdAt": { "timestampValue": codec::format_date(&Utc::now()) }
        });
        let request = self
            .client
            .patch(self.doc_url(USERS, &session.uid))
            .json(&json!({ "fields": fields }));

        let response = self.authorized(request, session)?.send().await?;
        Self::check(response, &session.uid).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, Priority};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DOCS: &str = "/projects/demo/databases/(default)/documents";

    fn store_for(server: &MockServer) -> FirestoreStore {
        let config = BackendConfig {
            project_id: "demo".to_string(),
            store_url: server.uri(),
            ..BackendConfig::default()
        };
        FirestoreStore::new(&config, Client::new())
    }

    fn session() -> AuthSession {
        AuthSession::new("u1", "ada@example.com", "id-token", "refresh-token", Utc::now())
    }

    fn task_doc(id: &str, title: &str) -> Value {
        json!({
            "name": format!("projects/demo/databases/(default)/documents/tasks/{}", id),
            "fields": {
                "userId": { "stringValue": "u1" },
                "title": { "stringValue": title },
                "priority": { "stringValue": "Low" },
                "category": { "stringValue": "Work" },
                "dueDate": { "stringValue": "2024-05-01T09:30:00.000Z" },
                "reminder": { "stringValue": "2024-05-01T09:00:00.000Z" },
                "completed": { "booleanValue": false },
                "createdAt": { "stringValue": "2024-04-30T09:00:00.000Z" }
            }
        })
    }

    #[tokio::test]
    async fn test_query_by_owner() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}:runQuery", DOCS)))
            .and(header("Authorization", "Bearer id-token"))
            .and(body_partial_json(json!({
                "structuredQuery": { "where": { "fieldFilter": { "value": { "stringValue": "u1" } } } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "document": task_doc("a", "Write report"), "readTime": "2024-05-01T00:00:00Z" },
                { "document": task_doc("b", "Send invoice"), "readTime": "2024-05-01T00:00:00Z" }
            ])))
            .mount(&server)
            .await;

        let tasks = store_for(&server).query_by_owner(&session()).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, "a");
        assert_eq!(tasks[1].title, "Send invoice");
        assert_eq!(tasks[0].category, Category::Work);
    }

    #[tokio::test]
    async fn test_query_with_no_tasks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}:runQuery", DOCS)))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{ "readTime": "2024-05-01T00:00:00Z" }])),
            )
            .mount(&server)
            .await;

        let tasks = store_for(&server).query_by_owner(&session()).await.unwrap();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_create_uses_assigned_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}/tasks", DOCS)))
            .and(body_partial_json(json!({ "fields": { "title": { "stringValue": "Write report" } } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(task_doc("srv-1", "Write report")))
            .mount(&server)
            .await;

        let due = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let mut new = NewTask::new("u1", "Write report", due);
        new.priority = Priority::High;

        let task = store_for(&server).create(&session(), new).await.unwrap();
        assert_eq!(task.id, "srv-1");
        assert_eq!(task.priority, Priority::High);
        assert!(!task.completed);
    }

    #[tokio::test]
    async fn test_update_sends_mask() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(format!("{}/tasks/a", DOCS)))
            .and(query_param("currentDocument.exists", "true"))
            .and(body_partial_json(json!({ "fields": { "completed": { "booleanValue": true } } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(task_doc("a", "Write report")))
            .expect(1)
            .mount(&server)
            .await;

        store_for(&server)
            .update(&session(), "a", &TaskPatch::completion(Utc::now()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(format!("{}/tasks/gone", DOCS)))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": 404, "message": "No document to update", "status": "NOT_FOUND" }
            })))
            .mount(&server)
            .await;

        let result = store_for(&server).delete(&session(), "gone").await;
        assert!(matches!(result, Err(StoreError::NotFound(id)) if id == "gone"));
    }

    #[tokio::test]
    async fn test_server_error_message_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/tasks/a", DOCS)))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "code": 403, "message": "Missing or insufficient permissions.", "status": "PERMISSION_DENIED" }
            })))
            .mount(&server)
            .await;

        match store_for(&server).get(&session(), "a").await {
            Err(StoreError::Status { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "Missing or insufficient permissions.");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_signed_out_session_is_rejected_locally() {
        let server = MockServer::start().await;
        let signed_out = AuthSession::new("u1", "ada@example.com", "", "", Utc::now());
        let result = store_for(&server).query_by_owner(&signed_out).await;
        assert!(matches!(result, Err(StoreError::Unauthenticated)));
    }
}
