//! Company REST API. Endpoint and field names follow the deployed service's
//! contract (`projetos`, `funcionarios`, `tarefas`).

use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use switchboard_core::config::InternalApiConfig;
use switchboard_core::errors::ServiceError;
use switchboard_core::services::{
    CreateTaskRequest, FindEmployeeRequest, FindProjectsRequest, InternalApiService, Record,
};

use crate::http::{check_response, list_from, record_from, required_setting, transport_error};

pub struct InternalApiClient {
    http: Client,
    base_url: String,
    api_key: SecretString,
}

impl InternalApiClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self { http, base_url: base_url.into().trim_end_matches('/').to_string(), api_key }
    }

    pub fn from_config(config: &InternalApiConfig, http: Client) -> Result<Self, ServiceError> {
        let base_url = required_setting(config.base_url.as_deref(), "internal_api.base_url")?;
        match Url::parse(&base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(ServiceError::Configuration(format!(
                    "internal_api.base_url `{base_url}` is not an http(s) URL"
                )))
            }
        }
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or_else(|| ServiceError::Configuration("missing internal_api.api_key".into()))?;
        Ok(Self::new(http, base_url, api_key))
    }

    async fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Value, ServiceError> {
        let response = self
            .http
            .get(format!("{}/{endpoint}", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;
        check_response(response).await
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl InternalApiService for InternalApiClient {
    async fn find_projects(
        &self,
        request: &FindProjectsRequest,
    ) -> Result<Vec<Record>, ServiceError> {
        let mut query = Vec::new();
        if let Some(status) = &request.status {
            query.push(("status", status.clone()));
        }
        if let Some(department) = &request.department {
            query.push(("departamento", department.clone()));
        }

        let body = self.get("projetos", &query).await?;
        let key = if body.get("items").is_some() { "items" } else { "data" };
        list_from(body, key)
    }

    async fn find_employee(&self, request: &FindEmployeeRequest) -> Result<Record, ServiceError> {
        let mut query = Vec::new();
        if let Some(id) = &request.id {
            query.push(("id", scalar_text(id)));
        }
        if let Some(email) = &request.email {
            query.push(("email", email.clone()));
        }
        if query.is_empty() {
            return Err(ServiceError::invalid_parameter("id", "provide an employee id or email"));
        }

        match self.get("funcionarios", &query).await? {
            Value::Array(matches) => match matches.into_iter().next() {
                Some(first) => record_from(first),
                None => Err(ServiceError::rejected("employee not found")),
            },
            other => record_from(other),
        }
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> Result<Record, ServiceError> {
        let body = json!({
            "projeto_id": request.project_id,
            "titulo": request.title,
            "descricao": request.description,
            "responsavel_id": request.assignee_id,
            "prazo": request.due_date,
        });

        let response = self
            .http
            .post(format!("{}/tarefas", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        record_from(check_response(response).await?)
    }
}
