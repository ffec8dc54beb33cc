//! AWS Lambda handler for running the projection engine
//!
//! Accepts an engine input snapshot either as the event itself or as a JSON
//! string in the event's `body` (Lambda Function URL / API Gateway shape) and
//! returns the engine response: all rows and the cohort expense table, or
//! `{"success": false, "message": ...}`.

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;

use ul_projection::{run_engine, EngineInput, EngineResponse};

/// Pull the engine input out of a raw or HTTP-wrapped event
fn parse_event(payload: Value) -> Result<EngineInput, String> {
    if payload.get("isBase64Encoded").and_then(Value::as_bool) == Some(true) {
        return Err("base64-encoded bodies are not supported".to_string());
    }

    let input = match payload.get("body") {
        Some(Value::String(body)) => serde_json::from_str(body),
        Some(body) if body.is_object() => serde_json::from_value(body.clone()),
        _ => serde_json::from_value(payload),
    };
    input.map_err(|e| format!("Invalid JSON: {}", e))
}

async fn handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let response = match parse_event(event.payload) {
        Ok(input) => {
            log::info!(
                "Running {} model points at {}",
                input.model_points.len(),
                input.valuation_date
            );
            // The engine is CPU bound and uses rayon internally
            tokio::task::spawn_blocking(move || run_engine(&input)).await?
        }
        Err(message) => EngineResponse::failure(message),
    };

    Ok(serde_json::to_value(&response)?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}
