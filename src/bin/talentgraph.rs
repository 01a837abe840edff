use std::{env, fs, process};

use talentgraph::{
    EngineConfig, GraphEngine, GraphEngineError, SqliteEdgeSource,
    client::{CommandLineConfig, EngineClient},
};

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("{}", CommandLineConfig::help());
        return;
    }
    let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
    let config = match CommandLineConfig::from_args(&arg_refs) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("error: {err}");
            eprint!("{}", CommandLineConfig::help());
            process::exit(2);
        }
    };

    let engine = match open_engine(&config) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("{err}");
            process::exit(if err.is_client_error() { 2 } else { 1 });
        }
    };

    match EngineClient::new(&engine).execute(&config.command) {
        Ok(output) => println!("{}", output.render()),
        Err(err) => {
            eprintln!("command failed: {err}");
            process::exit(1);
        }
    }
}

fn open_engine(config: &CommandLineConfig) -> Result<GraphEngine, GraphEngineError> {
    let engine_config = match &config.config_path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| {
                GraphEngineError::configuration(format!("cannot read {path}: {e}"))
            })?;
            EngineConfig::from_json_str(&text)?
        }
        None => EngineConfig::default(),
    };
    let engine = GraphEngine::new(engine_config)?;
    if let Some(limit) = config.node_limit {
        engine.config().check_node_limit(limit)?;
    }
    if let Some(database) = &config.database {
        let source = SqliteEdgeSource::open(database)?;
        engine.rebuild_from(&source, config.node_limit)?;
    }
    Ok(engine)
}
