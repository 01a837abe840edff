use ahash::AHashMap;
use serde_json::{Value, json};

use crate::{
    GraphEngineError,
    community::CommunityAlgorithm,
    engine::GraphEngine,
    export::ExportFormat,
    paths::PathOptions,
    stats::StatsOptions,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Status,
    Stats {
        betweenness: bool,
    },
    Similar {
        node: String,
        top_k: usize,
        min_similarity: f64,
    },
    Connectors {
        limit: usize,
    },
    Communities {
        algorithm: CommunityAlgorithm,
    },
    Paths {
        from: Vec<String>,
        to: Vec<String>,
        max_length: usize,
    },
    Export {
        format: ExportFormat,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommandLineConfig {
    pub database: Option<String>,
    pub config_path: Option<String>,
    pub node_limit: Option<usize>,
    pub command: Command,
}

const SWITCHES: &[&str] = &["--betweenness"];

impl CommandLineConfig {
    pub fn from_args(args: &[&str]) -> Result<Self, String> {
        let mut database = None;
        let mut config_path = None;
        let mut node_limit = None;
        let mut command: Option<String> = None;
        let mut flags: AHashMap<String, String> = AHashMap::new();
        let mut iter = args.iter().skip(1);
        while let Some(arg) = iter.next() {
            match *arg {
                "--db" | "--database" => {
                    database = Some(
                        iter.next()
                            .ok_or_else(|| "--db requires a value".to_string())?
                            .to_string(),
                    );
                }
                "--config" => {
                    config_path = Some(
                        iter.next()
                            .ok_or_else(|| "--config requires a value".to_string())?
                            .to_string(),
                    );
                }
                "--node-limit" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| "--node-limit requires a value".to_string())?;
                    node_limit = Some(parse_number("--node-limit", value)?);
                }
                switch if SWITCHES.contains(&switch) => {
                    flags.insert(switch.to_string(), String::from("true"));
                }
                flag if flag.starts_with("--") => {
                    let value = iter
                        .next()
                        .ok_or_else(|| format!("{flag} requires a value"))?;
                    flags.insert(flag.to_string(), value.to_string());
                }
                other if other.starts_with('-') => {
                    return Err(format!("unknown flag {other}"));
                }
                name => {
                    if let Some(existing) = &command {
                        return Err(format!("unexpected argument {name} after {existing}"));
                    }
                    command = Some(name.to_string());
                }
            }
        }
        let command = parse_command(command.as_deref().unwrap_or("status"), &mut flags)?;
        if let Some(flag) = flags.keys().min() {
            return Err(format!("unknown flag {flag}"));
        }
        Ok(Self {
            database,
            config_path,
            node_limit,
            command,
        })
    }

    pub fn help() -> &'static str {
        "Usage: talentgraph [--db PATH] [--config PATH] [--node-limit N] COMMAND [options]\n\
         \n\
         Commands:\n  \
           status\n  \
           stats [--betweenness]\n  \
           similar --node ID [--top-k K] [--min-similarity S]\n  \
           connectors [--limit N]\n  \
           communities [--algorithm greedy|label-propagation|louvain]\n  \
           paths --from A,B --to C,D [--max-length L]\n  \
           export [--format json|graphml]\n"
    }
}

fn parse_command(name: &str, flags: &mut AHashMap<String, String>) -> Result<Command, String> {
    let command = match name {
        "status" => Command::Status,
        "stats" => Command::Stats {
            betweenness: flags.remove("--betweenness").is_some(),
        },
        "similar" => Command::Similar {
            node: flags
                .remove("--node")
                .ok_or_else(|| "similar requires --node".to_string())?,
            top_k: optional_number(flags, "--top-k")?.unwrap_or(10),
            min_similarity: match flags.remove("--min-similarity") {
                Some(value) => value
                    .parse()
                    .map_err(|_| format!("--min-similarity expects a number, got {value}"))?,
                None => 0.0,
            },
        },
        "connectors" => Command::Connectors {
            limit: optional_number(flags, "--limit")?.unwrap_or(10),
        },
        "communities" => Command::Communities {
            algorithm: match flags.remove("--algorithm") {
                Some(value) => CommunityAlgorithm::parse(&value)
                    .ok_or_else(|| format!("unknown community algorithm {value}"))?,
                None => CommunityAlgorithm::GreedyModularity,
            },
        },
        "paths" => Command::Paths {
            from: id_list(flags, "--from")?,
            to: id_list(flags, "--to")?,
            max_length: optional_number(flags, "--max-length")?.unwrap_or(4),
        },
        "export" => Command::Export {
            format: match flags.remove("--format") {
                Some(value) => ExportFormat::parse(&value)
                    .ok_or_else(|| format!("unknown export format {value}"))?,
                None => ExportFormat::Json,
            },
        },
        other => return Err(format!("unknown command {other}")),
    };
    Ok(command)
}

fn parse_number(flag: &str, value: &str) -> Result<usize, String> {
    value
        .parse()
        .map_err(|_| format!("{flag} expects a non-negative integer, got {value}"))
}

fn optional_number(
    flags: &mut AHashMap<String, String>,
    flag: &str,
) -> Result<Option<usize>, String> {
    flags
        .remove(flag)
        .map(|value| parse_number(flag, &value))
        .transpose()
}

fn id_list(flags: &mut AHashMap<String, String>, flag: &str) -> Result<Vec<String>, String> {
    let value = flags
        .remove(flag)
        .ok_or_else(|| format!("paths requires {flag}"))?;
    let ids: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    if ids.is_empty() {
        return Err(format!("{flag} needs at least one node id"));
    }
    Ok(ids)
}

/// Result of a CLI command, ready for stdout.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandOutput {
    Json(Value),
    Text(String),
}

impl CommandOutput {
    pub fn render(&self) -> String {
        match self {
            CommandOutput::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            CommandOutput::Text(text) => text.clone(),
        }
    }
}

pub struct EngineClient<'a> {
    engine: &'a GraphEngine,
}

impl<'a> EngineClient<'a> {
    pub fn new(engine: &'a GraphEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &GraphEngine {
        self.engine
    }

    pub fn execute(&self, command: &Command) -> Result<CommandOutput, GraphEngineError> {
        let engine = self.engine;
        let value = match command {
            Command::Status => json!({
                "status": engine.status(),
                "capabilities": engine.capabilities(),
                "last_build": engine.last_build_report(),
            }),
            Command::Stats { betweenness } => to_json(&engine.stats(StatsOptions {
                include_betweenness: *betweenness,
            })?)?,
            Command::Similar {
                node,
                top_k,
                min_similarity,
            } => json!({
                "node_id": node,
                "similar": to_json(&engine.similar_people(node, *top_k, *min_similarity)?)?,
            }),
            Command::Connectors { limit } => to_json(&engine.key_connectors(*limit)?)?,
            Command::Communities { algorithm } => to_json(&engine.communities(*algorithm)?)?,
            Command::Paths {
                from,
                to,
                max_length,
            } => to_json(&engine.path_sampling(
                from.as_slice(),
                to.as_slice(),
                *max_length,
                PathOptions::default(),
            )?)?,
            Command::Export { format } => {
                let document = engine.export(*format)?;
                return Ok(CommandOutput::Text(document));
            }
        };
        Ok(CommandOutput::Json(value))
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, GraphEngineError> {
    serde_json::to_value(value).map_err(|e| GraphEngineError::invalid_input(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_global_flags_and_command_options() {
        let config = CommandLineConfig::from_args(&[
            "talentgraph",
            "--db",
            "edges.db",
            "--node-limit",
            "500",
            "paths",
            "--from",
            "a, b",
            "--to",
            "c",
            "--max-length",
            "3",
        ])
        .unwrap();
        assert_eq!(config.database.as_deref(), Some("edges.db"));
        assert_eq!(config.node_limit, Some(500));
        assert_eq!(
            config.command,
            Command::Paths {
                from: vec!["a".into(), "b".into()],
                to: vec!["c".into()],
                max_length: 3,
            }
        );
    }

    #[test]
    fn test_defaults_to_status() {
        let config = CommandLineConfig::from_args(&["talentgraph"]).unwrap();
        assert_eq!(config.command, Command::Status);
        assert!(config.database.is_none());
    }

    #[test]
    fn test_usage_errors() {
        assert!(CommandLineConfig::from_args(&["talentgraph", "similar"]).is_err());
        assert!(CommandLineConfig::from_args(&["talentgraph", "teleport"]).is_err());
        assert!(CommandLineConfig::from_args(&["talentgraph", "stats", "--bogus", "1"]).is_err());
        assert!(
            CommandLineConfig::from_args(&["talentgraph", "communities", "--algorithm", "x"])
                .is_err()
        );
        assert!(CommandLineConfig::from_args(&["talentgraph", "--node-limit", "many"]).is_err());
    }
}
