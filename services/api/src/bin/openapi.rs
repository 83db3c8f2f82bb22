//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document for the reminder REST API to `openapi.json`,
//! for client generation without starting the server.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

fn write_document(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let spec_json = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write(path, spec_json)?;
    println!("OpenAPI document written to {}", path);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "openapi.json".to_string());
    write_document(&path)
}
