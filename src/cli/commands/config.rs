//! `longwrite config`: effective values and where they came from.

use anyhow::Result;
use serde_json::{Map, Value, json};

use longwrite_config::Config;

pub fn execute_config_command(config: &Config, json: bool) -> Result<()> {
    let effective = config.effective_config();

    if json {
        let entries: Map<String, Value> = effective
            .into_iter()
            .map(|(key, (value, source))| (key, json!({"value": value, "source": source})))
            .collect();
        println!("{}", serde_json::to_string_pretty(&Value::Object(entries))?);
        return Ok(());
    }

    println!("Effective configuration:");
    let width = effective.keys().map(String::len).max().unwrap_or(0);
    for (key, (value, source)) in &effective {
        println!("  {key:<width$} = {value}  [{source}]");
    }
    Ok(())
}
