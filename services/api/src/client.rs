use clap::Args;
use serde_json::json;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;
use store_dr::error::AppError;
use store_dr::unloadability::EvaluationRequest;
use tracing::info;

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Args, Debug)]
pub(crate) struct SubmitArgs {
    /// Request JSON written by `cabinets payload`
    #[arg(long, default_value = "payload.json")]
    pub(crate) payload: PathBuf,
    /// API base URL; the request goes to `<base>/evaluate`
    #[arg(long, default_value = "http://localhost:8000/api/v1")]
    pub(crate) base_url: String,
    /// Sent as a Bearer token when present
    #[arg(long)]
    pub(crate) api_key: Option<String>,
}

pub(crate) async fn run_submit(args: SubmitArgs) -> Result<(), AppError> {
    let SubmitArgs {
        payload,
        base_url,
        api_key,
    } = args;

    let reader = BufReader::new(File::open(&payload)?);
    let request: EvaluationRequest = serde_json::from_reader(reader)?;
    let body = submit_request(&request, &base_url, api_key.as_deref()).await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

/// POST `request` to `<base_url>/evaluate` and return the decoded reply. Non-JSON success
/// bodies are wrapped as `{ok, status_code, text}`.
pub(crate) async fn submit_request(
    request: &EvaluationRequest,
    base_url: &str,
    api_key: Option<&str>,
) -> Result<serde_json::Value, AppError> {
    let url = format!("{}/evaluate", base_url.trim_end_matches('/'));
    let failure = |message: String| AppError::Submission {
        url: url.clone(),
        message,
    };

    let client = reqwest::Client::builder()
        .timeout(SUBMIT_TIMEOUT)
        .build()
        .map_err(|err| failure(err.to_string()))?;

    let mut call = client.post(&url).json(request);
    if let Some(key) = api_key.filter(|key| !key.is_empty()) {
        call = call.bearer_auth(key);
    }

    let response = call.send().await.map_err(|err| failure(err.to_string()))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|err| failure(err.to_string()))?;

    if !status.is_success() {
        return Err(failure(format!("HTTP {status}: {text}")));
    }

    info!(%url, status = status.as_u16(), cabinets = request.cabinets.len(), "evaluation submitted");
    match serde_json::from_str(&text) {
        Ok(body) => Ok(body),
        Err(_) => Ok(json!({ "ok": true, "status_code": status.as_u16(), "text": text })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use store_dr::unloadability::{
        unloadability_router, CabinetSnapshot, CabinetType, PolicyConfig, UnloadabilityEngine,
    };

    async fn spawn_service() -> String {
        let engine = Arc::new(UnloadabilityEngine::new(PolicyConfig::standard()));
        let app = unloadability_router(engine);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener binds");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{addr}/api/v1/")
    }

    fn request(cabinets: Vec<CabinetSnapshot>) -> EvaluationRequest {
        EvaluationRequest {
            store_id: "S001".to_string(),
            timestamp: None,
            business_hours_flag: 1,
            cabinets,
        }
    }

    #[tokio::test]
    async fn submitted_request_comes_back_ranked() {
        let base = spawn_service().await;
        let mut fridge = CabinetSnapshot::new("R-01", CabinetType::Refrigerator);
        fridge.air_return_c = Some(4.0);
        let mut warm = CabinetSnapshot::new("F-01", CabinetType::Freezer);
        warm.air_return_c = Some(-10.0);

        let body = submit_request(&request(vec![warm, fridge]), &base, Some("secret"))
            .await
            .expect("submission succeeds");

        assert_eq!(body["store_id"], "S001");
        assert_eq!(body["ranked_cabinet_ids"], json!(["R-01", "F-01"]));
    }

    #[tokio::test]
    async fn rejected_request_surfaces_status_and_body() {
        let base = spawn_service().await;
        let cabinets = vec![
            CabinetSnapshot::new("R-01", CabinetType::Refrigerator),
            CabinetSnapshot::new("R-01", CabinetType::Refrigerator),
        ];

        let err = submit_request(&request(cabinets), &base, None)
            .await
            .expect_err("duplicate ids rejected");

        match err {
            AppError::Submission { url, message } => {
                assert!(url.ends_with("/api/v1/evaluate"));
                assert!(message.contains("422"));
                assert!(message.contains("R-01"));
            }
            other => panic!("expected submission error, got {other:?}"),
        }
    }
}
