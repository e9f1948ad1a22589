//! Dump the OpenAPI document as JSON.
//!
//! Prints to stdout by default; `--output <path>` writes a file instead:
//!
//!   cargo run --bin export_openapi -- --output docs/openapi.json

use ledgerd::gateway::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .expect("OpenAPI document failed to serialize");

    let mut args = std::env::args().skip(1);
    let target = match args.next().as_deref() {
        Some("--output") => args.next(),
        _ => None,
    };

    if let Some(path) = target {
        std::fs::write(&path, &json).expect("could not write output file");
        eprintln!("✅ OpenAPI document written to {path}");
    } else {
        println!("{json}");
    }
}
