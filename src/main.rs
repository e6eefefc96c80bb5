//! entigraph CLI: inspect schema models and process statement streams.

use std::io::{BufReader, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use entigraph::aggregate::{aggregate_statements, UnknownSchemaPolicy};
use entigraph::model::Model;
use entigraph::namespace::Namespace;
use entigraph::proxy::EntityProxy;
use entigraph::statement::{io as stio, statements_from_entity, Statement};

#[derive(Parser)]
#[command(name = "entigraph", version, about = "Typed entity data model toolkit")]
struct Cli {
    /// Directory of schema YAML files; the bundled model when omitted.
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Jsonl,
    Csv,
    Compact,
}

#[derive(Subcommand)]
enum Commands {
    /// List schemata, or show one schema's properties.
    Schemata {
        /// Schema name to inspect.
        name: Option<String>,
    },

    /// Dump the resolved model as JSON.
    DumpModel,

    /// Validate entities from a JSON-lines file against their schema.
    Validate {
        /// File of entity records: {"id", "schema", "properties"}.
        file: PathBuf,
    },

    /// Aggregate a statement stream into entities (JSON lines out).
    Aggregate {
        /// Statement file.
        file: PathBuf,

        /// Input codec.
        #[arg(long, value_enum, default_value = "jsonl")]
        format: Format,

        /// Fail on statements referencing unknown schemata instead of
        /// dropping them.
        #[arg(long)]
        strict: bool,
    },

    /// Decompose entities from a JSON-lines file into statements.
    Decompose {
        /// File of entity records.
        file: PathBuf,

        /// Dataset name stamped on every statement.
        #[arg(long)]
        dataset: String,

        /// Output codec.
        #[arg(long, value_enum, default_value = "jsonl")]
        format: Format,
    },

    /// Sign an entity ID with a dataset namespace.
    Sign {
        /// Namespace name (the HMAC key).
        namespace: String,

        /// Entity ID to sign.
        id: String,

        /// Verify instead of signing.
        #[arg(long)]
        verify: bool,
    },
}

fn load_model(path: Option<&PathBuf>) -> Result<Model> {
    match path {
        Some(dir) => Ok(Model::from_dir(dir)?),
        None => Ok(Model::bundled()),
    }
}

fn read_statements(file: &PathBuf, format: Format, model: &Model) -> Result<Vec<Statement>> {
    let reader = BufReader::new(std::fs::File::open(file).into_diagnostic()?);
    let mut statements = Vec::new();
    let sink = &mut |s: Statement| {
        statements.push(s);
        Ok(())
    };
    match format {
        Format::Jsonl => stio::read_jsonl(reader, Some(model), sink)?,
        Format::Csv => stio::read_csv(reader, Some(model), sink)?,
        Format::Compact => stio::read_compact(reader, Some(model), sink)?,
    }
    Ok(statements)
}

fn write_statements(format: Format, statements: Vec<Statement>) -> Result<()> {
    let mut out = std::io::stdout().lock();
    match format {
        Format::Jsonl => stio::write_jsonl(&mut out, statements)?,
        Format::Csv => stio::write_csv(&mut out, statements)?,
        Format::Compact => stio::write_compact(&mut out, statements)?,
    }
    Ok(())
}

/// Parse one entity record line into a proxy, adding values through the
/// normal cleaning path.
fn entity_from_line<'m>(model: &'m Model, line: &str) -> Result<EntityProxy<'m>> {
    let record: serde_json::Value = serde_json::from_str(line).into_diagnostic()?;
    let schema_name = record["schema"].as_str().unwrap_or_default();
    let schema = model.schema(schema_name)?;
    let id = record["id"].as_str().unwrap_or_default();
    let mut entity = EntityProxy::new(model, schema, id);
    if let Some(props) = record["properties"].as_object() {
        for (name, values) in props {
            let values: Vec<&str> = values
                .as_array()
                .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
                .unwrap_or_default();
            entity.add(name, values)?;
        }
    }
    Ok(entity)
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .build(),
        )
    }))
    .ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let model = load_model(cli.model.as_ref())?;

    match cli.command {
        Commands::Schemata { name: Some(name) } => {
            let schema = model.schema(&name)?;
            println!("{} ({})", schema.name, schema.label);
            if !schema.extends.is_empty() {
                println!("  extends: {}", schema.extends.join(", "));
            }
            for prop in schema.sorted_properties() {
                let mut flags = Vec::new();
                if prop.stub {
                    flags.push("stub");
                }
                if prop.hidden {
                    flags.push("hidden");
                }
                let flags = if flags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", flags.join(", "))
                };
                println!("  {}: {} ({}){flags}", prop.name, prop.label, prop.ptype.name());
            }
        }

        Commands::Schemata { name: None } => {
            for schema in model.schemata() {
                let kind = if schema.is_edge() { "edge" } else { "node" };
                println!("{} ({}, {kind})", schema.name, schema.plural);
            }
        }

        Commands::DumpModel => {
            let mut out = serde_json::Map::new();
            for schema in model.schemata() {
                let props: serde_json::Map<String, serde_json::Value> = schema
                    .sorted_properties()
                    .iter()
                    .map(|p| {
                        (
                            p.name.clone(),
                            serde_json::json!({
                                "label": p.label,
                                "type": p.ptype.name(),
                                "range": p.range,
                                "stub": p.stub,
                            }),
                        )
                    })
                    .collect();
                out.insert(
                    schema.name.clone(),
                    serde_json::json!({
                        "label": schema.label,
                        "plural": schema.plural,
                        "extends": schema.extends,
                        "abstract": schema.abstract_,
                        "matchable": schema.matchable,
                        "edge": schema.is_edge(),
                        "properties": props,
                    }),
                );
            }
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &out).into_diagnostic()?;
            writeln!(stdout).into_diagnostic()?;
        }

        Commands::Validate { file } => {
            let content = std::fs::read_to_string(&file).into_diagnostic()?;
            let mut checked = 0usize;
            for line in content.lines().filter(|l| !l.trim().is_empty()) {
                let record: serde_json::Value = serde_json::from_str(line).into_diagnostic()?;
                let schema = model.schema(record["schema"].as_str().unwrap_or_default())?;
                let mut data = std::collections::BTreeMap::new();
                if let Some(props) = record["properties"].as_object() {
                    for (name, values) in props {
                        let values: Vec<String> = values
                            .as_array()
                            .map(|a| {
                                a.iter()
                                    .filter_map(|v| v.as_str().map(str::to_string))
                                    .collect()
                            })
                            .unwrap_or_default();
                        data.insert(name.clone(), values);
                    }
                }
                schema.validate(&data)?;
                checked += 1;
            }
            println!("{checked} entities valid");
        }

        Commands::Aggregate {
            file,
            format,
            strict,
        } => {
            let statements = read_statements(&file, format, &model)?;
            let policy = if strict {
                UnknownSchemaPolicy::Fail
            } else {
                UnknownSchemaPolicy::Drop
            };
            let result = aggregate_statements(&model, statements, policy)?;
            let mut out = std::io::stdout().lock();
            for entity in &result.entities {
                serde_json::to_writer(&mut out, &entity.to_dict()).into_diagnostic()?;
                writeln!(out).into_diagnostic()?;
            }
            if result.dropped > 0 {
                eprintln!("dropped {} statements with unknown schema", result.dropped);
            }
        }

        Commands::Decompose {
            file,
            dataset,
            format,
        } => {
            let content = std::fs::read_to_string(&file).into_diagnostic()?;
            let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
            let mut statements = Vec::new();
            for line in content.lines().filter(|l| !l.trim().is_empty()) {
                let entity = entity_from_line(&model, line)?;
                statements.extend(statements_from_entity(&entity, &dataset, &now, "", false, ""));
            }
            write_statements(format, statements)?;
        }

        Commands::Sign {
            namespace,
            id,
            verify,
        } => {
            let ns = Namespace::new(&namespace);
            if verify {
                if ns.verify(&id) {
                    println!("valid");
                } else {
                    println!("invalid");
                    std::process::exit(1);
                }
            } else {
                println!("{}", ns.sign(&id));
            }
        }
    }

    Ok(())
}
