//! Tabula
//!
//! Command line front end for the list-query compiler. `plan` prints the
//! compiled plan and the PostgREST request it encodes to; `query` runs the
//! request against a JSON fixture with the in-memory backend.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use tabula_provider::backends::memory::MemoryClient;
use tabula_provider::backends::postgrest::render_plan;
use tabula_provider::{DataProvider, ListParams, ProviderConfig, ResourcesConfig};
use tracing::info;

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "tabula",
    version,
    about = "Compile and run list queries for PostgREST-style backends"
)]
struct Cli {
    #[command(flatten)]
    provider: ProviderConfig,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "TABULA_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile a list request and print the plan and the PostgREST request.
    Plan(RequestArgs),

    /// Run a list request against a JSON fixture of `{table: [rows]}`.
    Query {
        #[command(flatten)]
        args: RequestArgs,

        /// Path to the fixture file.
        #[arg(long)]
        data: PathBuf,
    },
}

#[derive(Debug, Args)]
struct RequestArgs {
    /// Resource (table) name.
    #[arg(long)]
    resource: String,

    /// Path to a JSON list request: `{pagination, sort, filter}`.
    #[arg(long)]
    request: PathBuf,
}

/// Initializes the tracing subscriber. Logs go to stderr so stdout stays JSON.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("tabula={},tabula_provider={}", level, level))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Compiles a request and returns the plan with its PostgREST encoding.
fn plan(
    config: ProviderConfig,
    resources: ResourcesConfig,
    args: &RequestArgs,
) -> anyhow::Result<Value> {
    let params: ListParams = read_json(&args.request)?;
    let provider = DataProvider::new(MemoryClient::new(), resources, config);

    let plan = provider.compile_list(&args.resource, &params)?;
    let request = render_plan(&plan);
    info!(resource = %args.resource, "Compiled list request");

    Ok(json!({
        "plan": serde_json::to_value(&plan)?,
        "request": {
            "method": request.method.as_str(),
            "path": request.path_and_query(),
            "query": serde_json::to_value(&request.query)?,
            "headers": serde_json::to_value(&request.headers)?,
        },
    }))
}

/// Runs a request against fixture data and returns the list result.
async fn query(
    config: ProviderConfig,
    resources: ResourcesConfig,
    args: &RequestArgs,
    data: &Path,
) -> anyhow::Result<Value> {
    let params: ListParams = read_json(&args.request)?;
    let fixture: Value = read_json(data)?;

    let client = MemoryClient::new().with_id_field(config.id_field.clone());
    client.load_json(fixture)?;
    let provider = DataProvider::new(client, resources, config);

    let result = provider.get_list(&args.resource, params).await?;
    info!(
        resource = %args.resource,
        rows = result.data.len(),
        total = result.total,
        "List request completed"
    );
    Ok(serde_json::to_value(result)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(errors) = cli.provider.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let resources = cli.provider.load_resources()?;
    info!(
        resources = resources.len(),
        count_mode = %cli.provider.count_mode,
        "Loaded resource configuration"
    );

    let output = match cli.command {
        Command::Plan(args) => plan(cli.provider, resources, &args)?,
        Command::Query { args, data } => query(cli.provider, resources, &args, &data).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        resources: PathBuf,
        request: PathBuf,
        data: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let resources = dir.path().join("resources.json");
        let request = dir.path().join("request.json");
        let data = dir.path().join("data.json");

        std::fs::write(
            &resources,
            r#"{"people": {"fields": ["id", "name", "age_gte"], "fullTextSearchFields": ["name"]}}"#,
        )
        .unwrap();
        std::fs::write(
            &request,
            r#"{
                "pagination": {"page": 1, "perPage": 2},
                "sort": {"field": "age", "order": "DESC"},
                "filter": {"age_gte": 18, "q": "a"}
            }"#,
        )
        .unwrap();
        std::fs::write(
            &data,
            r#"{"people": [
                {"id": 1, "name": "Ada", "age": 36},
                {"id": 2, "name": "Brian", "age": 17},
                {"id": 3, "name": "Clara", "age": 52},
                {"id": 4, "name": "Dmitri", "age": 41},
                {"id": 5, "name": "Mae", "age": 29}
            ]}"#,
        )
        .unwrap();

        Fixture {
            _dir: dir,
            resources,
            request,
            data,
        }
    }

    fn config(fixture: &Fixture) -> ProviderConfig {
        ProviderConfig {
            resources: Some(fixture.resources.clone()),
            ..Default::default()
        }
    }

    #[test]
    fn test_cli_parses_query_command() {
        let cli = Cli::try_parse_from([
            "tabula",
            "--count-mode",
            "planned",
            "query",
            "--resource",
            "people",
            "--request",
            "req.json",
            "--data",
            "data.json",
        ])
        .unwrap();

        assert_eq!(cli.log_level, "info");
        assert_eq!(cli.provider.count_mode.to_string(), "planned");
        match cli.command {
            Command::Query { args, data } => {
                assert_eq!(args.resource, "people");
                assert_eq!(data, PathBuf::from("data.json"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_plan_output() {
        let fixture = fixture();
        let config = config(&fixture);
        let resources = config.load_resources().unwrap();
        let args = RequestArgs {
            resource: "people".to_string(),
            request: fixture.request.clone(),
        };

        let output = plan(config, resources, &args).unwrap();

        assert_eq!(output["plan"]["select"], json!(["id", "name", "age"]));
        assert_eq!(output["plan"]["range"], json!({"from": 0, "to": 1}));
        assert_eq!(output["request"]["method"], json!("GET"));
        let path = output["request"]["path"].as_str().unwrap();
        assert!(path.starts_with("/people?select=id%2Cname%2Cage"));
        assert!(path.contains("age=gte.18"));
    }

    #[tokio::test]
    async fn test_query_output() {
        let fixture = fixture();
        let config = config(&fixture);
        let resources = config.load_resources().unwrap();
        let args = RequestArgs {
            resource: "people".to_string(),
            request: fixture.request.clone(),
        };

        let output = query(config, resources, &args, &fixture.data).await.unwrap();

        // Ada, Clara and Mae are adults with an "a" in their name
        assert_eq!(output["total"], json!(3));
        assert_eq!(
            output["data"],
            json!([
                {"id": 3, "name": "Clara", "age": 52},
                {"id": 1, "name": "Ada", "age": 36}
            ])
        );
    }

    #[test]
    fn test_read_json_reports_path() {
        let err = read_json::<Value>(Path::new("/nonexistent/request.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/request.json"));
    }
}
