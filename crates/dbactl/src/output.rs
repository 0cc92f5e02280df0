//! Output formatting for dbactl
//!
//! Every command serializes its result to a `serde_json::Value` and prints
//! it as JSON, YAML or a table.

use anyhow::{Context, Result};
use comfy_table::Table;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, clap::ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

pub fn print_output<T: Serialize>(data: T, format: OutputFormat) -> Result<()> {
    let json_value = serde_json::to_value(data).context("Failed to serialize output")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json_value)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&json_value)?);
        }
        OutputFormat::Table => {
            print_as_table(&json_value)?;
        }
    }

    Ok(())
}

fn print_as_table(value: &Value) -> Result<()> {
    match value {
        Value::Array(arr) if !arr.is_empty() => {
            let mut table = Table::new();

            // Header from the union of the first row's keys
            if let Some(Value::Object(first)) = arr.first() {
                table.set_header(first.keys().map(String::as_str).collect::<Vec<_>>());
                for row in arr {
                    if let Value::Object(obj) = row {
                        table.add_row(
                            first
                                .keys()
                                .map(|key| scalar_to_string(obj.get(key).unwrap_or(&Value::Null)))
                                .collect::<Vec<_>>(),
                        );
                    }
                }
            } else {
                table.set_header(vec!["value"]);
                for item in arr {
                    table.add_row(vec![scalar_to_string(item)]);
                }
            }

            println!("{table}");
        }
        Value::Array(_) => {
            println!("(empty)");
        }
        Value::Object(obj) => {
            let mut table = Table::new();
            table.set_header(vec!["field", "value"]);
            for (key, value) in obj {
                table.add_row(vec![key.clone(), scalar_to_string(value)]);
            }
            println!("{table}");
        }
        other => {
            println!("{}", scalar_to_string(other));
        }
    }
    Ok(())
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
