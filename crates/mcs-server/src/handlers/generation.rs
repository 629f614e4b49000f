//! Generation tool handlers

use serde_json::Value;

use mcs_domain::error::Result;

use crate::args::GenerateCodeArgs;
use crate::init::AppState;

/// `generate_code`: retrieval-grounded skeleton generation
pub async fn generate_code(state: &AppState, args: GenerateCodeArgs) -> Result<Value> {
    let generated = state
        .generator
        .generate(&args.description, &args.language, args.include_tests)
        .await?;
    Ok(serde_json::to_value(generated)?)
}
