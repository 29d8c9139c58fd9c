//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document of the recipe finder API to disk, for client
//! generation without starting the server. The output path defaults to
//! `openapi.json` and may be given as the first argument.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    let spec_json = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write(&output, spec_json)?;
    println!("Wrote {} paths to {}", ApiDoc::openapi().paths.paths.len(), output);
    Ok(())
}
