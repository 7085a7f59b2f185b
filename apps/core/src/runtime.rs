use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::{self, ConfigError};
use crate::contract::{CoreResponse, ItemDto, RefreshResponse, SearchResponse};
use crate::core_service::{CoreService, ServiceError};
use crate::logging;
use crate::model::ItemKind;
use crate::transport::handle_json;

#[derive(Debug)]
pub enum RuntimeError {
    Config(ConfigError),
    Service(ServiceError),
    Io(std::io::Error),
    Encode(String),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(error) => write!(f, "config error: {error}"),
            Self::Service(error) => write!(f, "service error: {error}"),
            Self::Io(error) => write!(f, "io error: {error}"),
            Self::Encode(error) => write!(f, "encode error: {error}"),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<ConfigError> for RuntimeError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ServiceError> for RuntimeError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<std::io::Error> for RuntimeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCommand {
    /// Answer JSON requests line by line on stdin/stdout.
    Serve,
    Search(String),
    List,
    Activate { kind: ItemKind, id: String },
    Refresh,
    CloseTab(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub config_path: Option<PathBuf>,
    pub command: RuntimeCommand,
}

pub fn parse_cli_args(args: &[String]) -> Result<RuntimeOptions, String> {
    let mut config_path = None;
    let mut positional: Vec<&str> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--config requires a path".to_string())?;
                config_path = Some(PathBuf::from(value));
            }
            flag if flag.starts_with("--config=") => {
                config_path = Some(PathBuf::from(&flag["--config=".len()..]));
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag: {flag}")),
            value => positional.push(value),
        }
    }

    let command = match positional.split_first() {
        None | Some((&"serve", [])) => RuntimeCommand::Serve,
        Some((&"search", rest)) if !rest.is_empty() => RuntimeCommand::Search(rest.join(" ")),
        Some((&"search", _)) => return Err("search requires a query".to_string()),
        Some((&"list", [])) => RuntimeCommand::List,
        Some((&"refresh", [])) => RuntimeCommand::Refresh,
        Some((&"activate", [kind, id])) => {
            let kind = ItemKind::parse(kind)
                .ok_or_else(|| format!("unknown item type '{kind}' (expected window or tab)"))?;
            RuntimeCommand::Activate {
                kind,
                id: (*id).to_string(),
            }
        }
        Some((&"activate", _)) => return Err("usage: activate <window|tab> <id>".to_string()),
        Some((&"close-tab", [id])) => RuntimeCommand::CloseTab((*id).to_string()),
        Some((&"close-tab", _)) => return Err("usage: close-tab <id>".to_string()),
        Some((other, _)) => return Err(format!("unknown command: {other}")),
    };

    Ok(RuntimeOptions {
        config_path,
        command,
    })
}

pub fn run_with_options(options: RuntimeOptions) -> Result<(), RuntimeError> {
    let config = config::load(options.config_path.as_deref())?;
    if let Err(error) = logging::init(&config.log_level) {
        eprintln!("[quickhop-core] file logging disabled: {error}");
    }
    logging::info(&format!(
        "startup config_path={} staleness_ms={} devtools={}",
        config.config_path.display(),
        config.staleness_ms,
        config.devtools_base_url(),
    ));

    let service = CoreService::new(config)?;
    match options.command {
        RuntimeCommand::Serve => serve(&service),
        RuntimeCommand::Search(query) => {
            let results = service.search(&query).into_iter().map(ItemDto::from).collect();
            print_json(&CoreResponse::Search(SearchResponse { results }))
        }
        RuntimeCommand::List => {
            let results = service.list_all().into_iter().map(ItemDto::from).collect();
            print_json(&CoreResponse::ListAll(SearchResponse { results }))
        }
        RuntimeCommand::Activate { kind, id } => {
            let activated = service.activate(kind, &id);
            println!("[quickhop-core] activate type={} id={id} activated={activated}", kind.as_str());
            Ok(())
        }
        RuntimeCommand::Refresh => {
            let outcome = RefreshResponse::from(service.force_refresh());
            print_json(&CoreResponse::Refresh(outcome))
        }
        RuntimeCommand::CloseTab(id) => {
            let closed = service.close_tab(&id);
            println!("[quickhop-core] close-tab id={id} closed={closed}");
            Ok(())
        }
    }
}

fn serve(service: &CoreService) -> Result<(), RuntimeError> {
    // Warm the cache so the first query does not pay for enumeration.
    let outcome = service.force_refresh();
    logging::info(&format!(
        "initial refresh success={} timestamp={}",
        outcome.success, outcome.timestamp_ms
    ));

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_json(service, &line);
        writeln!(stdout, "{response}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn print_json(response: &CoreResponse) -> Result<(), RuntimeError> {
    let encoded =
        serde_json::to_string_pretty(response).map_err(|e| RuntimeError::Encode(e.to_string()))?;
    println!("{encoded}");
    Ok(())
}
