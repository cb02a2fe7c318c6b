//! Grocy Units
//!
//! An MCP server for Grocy quantity unit conversion.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use grocy_units::build_info;
use grocy_units::db;
use grocy_units::mcp::GrocyUnitsService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stderr only; stdout carries the MCP protocol
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("grocy_units=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let db_path = db::database_path();
    eprintln!("Database path: {}", db_path.display());

    let database = db::open(&db_path)?;

    let service = GrocyUnitsService::new(db_path, database);
    let server = service.serve((stdin(), stdout())).await?;
    server.waiting().await?;

    Ok(())
}
