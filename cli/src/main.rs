//! `configform`: operator CLI for schema-driven configuration forms.
//!
//! Connects to the config host over a websocket, fetches the option schema,
//! builds and loads the form, then renders, inspects, or edits it. The
//! `generate` subcommand runs the same form offline and prints a URL whose
//! query string carries the chosen settings.

mod report;
mod session;
mod source;

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use configform::{
    ChangeSink, Form, FormBuilder, FormSchema, MemoryStore, PersistQueue, PersistReceiver, QuerySink, RemoteStore, SchemaError,
    StoreError, Widget, WidgetError, drain_persist_queue,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::session::WsStore;
use crate::source::SchemaSource;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("no schema given; pass --schema, --schema-key, or set CONFIGFORM_SCHEMA")]
    MissingSchema,
    #[error("failed to read schema {path}: {source}")]
    SchemaFile { path: PathBuf, source: std::io::Error },
    #[error("no schema stored under `{0}`")]
    SchemaKeyMissing(String),
    #[error("{0} needs a host connection")]
    HostRequired(&'static str),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("websocket failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("frame decode failed: {0}")]
    Decode(#[from] frames::CodecError),
    #[error("timed out waiting for websocket frame")]
    Timeout,
    #[error("server returned error for {syscall}: {message}")]
    ServerError { syscall: String, message: String },
    #[error("missing expected field `{0}`")]
    MissingField(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no option named `{0}`")]
    UnknownOption(String),
    #[error("`{name}`: {source}")]
    Edit { name: String, source: WidgetError },
    #[error("`{name}` was not persisted")]
    NotPersisted { name: String },
    #[error("check failed: {placeholders} placeholder(s), {duplicates} duplicate name(s)")]
    CheckFailed { placeholders: usize, duplicates: usize },
}

#[derive(Parser, Debug)]
#[command(name = "configform", about = "Schema-driven configuration forms over the config host")]
struct Cli {
    #[arg(long, env = "CONFIGFORM_HOST_URL", default_value = "ws://127.0.0.1:8080/ws")]
    host_url: String,

    #[arg(long, env = "CONFIGFORM_SCHEMA", help = "Schema file path or http(s) URL")]
    schema: Option<String>,

    #[arg(long, help = "Read the schema JSON from this global on the host")]
    schema_key: Option<String>,

    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect to the host and print the session id.
    Ping,
    /// Build the form offline and report broken options.
    Check,
    /// Print the loaded form.
    Render {
        #[arg(long, help = "Emit HTML instead of an outline")]
        html: bool,
    },
    /// Print every bound option's current value.
    Values,
    /// Edit one option as a user would and wait for the write.
    Set { name: String, value: String },
    /// Print one option's loaded value.
    Get { name: String },
    /// Build a URL carrying the chosen settings; never contacts the host.
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long)]
    base_url: String,

    #[arg(value_parser = parse_assignment, help = "name=value edits applied in order")]
    assignments: Vec<(String, String)>,
}

/// Connection and schema settings shared by every subcommand.
#[derive(Debug, Clone)]
struct Settings {
    host_url: String,
    schema: Option<String>,
    schema_key: Option<String>,
    timeout: Duration,
}

impl Settings {
    fn source(&self) -> Result<SchemaSource, CliError> {
        SchemaSource::resolve(self.schema.as_deref(), self.schema_key.as_deref())
    }

    async fn connect(&self) -> Result<WsStore, CliError> {
        WsStore::connect(&self.host_url, self.timeout).await
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let Cli { host_url, schema, schema_key, timeout_ms, command } = Cli::parse();
    let settings = Settings { host_url, schema, schema_key, timeout: Duration::from_millis(timeout_ms) };

    match command {
        Command::Ping => run_ping(&settings).await,
        Command::Check => run_check(&settings).await,
        Command::Render { html } => run_render(&settings, html).await,
        Command::Values => run_values(&settings).await,
        Command::Set { name, value } => run_set(&settings, &name, &value).await,
        Command::Get { name } => run_get(&settings, &name).await,
        Command::Generate(args) => run_generate(&settings, args).await,
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// A form bound to the host: edits queue up until [`Session::flush`].
struct Session {
    store: WsStore,
    form: Form,
    queue: PersistQueue,
    pending: PersistReceiver,
}

impl Session {
    async fn open(settings: &Settings) -> Result<Self, CliError> {
        let store = settings.connect().await?;
        let schema = settings.source()?.load(Some(&store)).await?;
        let (queue, pending) = PersistQueue::channel();
        let form = FormBuilder::new().build(&schema, Rc::new(queue.clone()));
        form.load(&store).await;
        Ok(Self { store, form, queue, pending })
    }

    fn widget(&self, name: &str) -> Result<Rc<Widget>, CliError> {
        self.form.widget(name).ok_or_else(|| CliError::UnknownOption(name.to_owned()))
    }

    /// Write every queued edit, defaults applied during load included.
    async fn flush(self) -> (WsStore, Form) {
        let Self { store, form, queue, pending } = self;
        queue.close();
        let written = drain_persist_queue(pending, &store).await;
        info!(written, "persist queue drained");
        (store, form)
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

async fn run_ping(settings: &Settings) -> Result<(), CliError> {
    let store = settings.connect().await?;
    let globals = store.list().await?;
    println!("ok client_id={} globals={}", store.client_id().unwrap_or("-"), globals.len());
    Ok(())
}

async fn run_check(settings: &Settings) -> Result<(), CliError> {
    let source = settings.source()?;
    let schema = if source.needs_host() {
        let store = settings.connect().await?;
        source.load(Some(&store)).await?
    } else {
        source.load::<WsStore>(None).await?
    };
    let (queue, _pending) = PersistQueue::channel();
    let form = FormBuilder::new().build(&schema, Rc::new(queue));

    let report = report::check(&form);
    for line in &report.lines {
        println!("{line}");
    }
    println!(
        "{} option(s), {} rule(s), {} placeholder(s), {} duplicate(s), {} unreferenceable",
        report.options,
        form.rules().len(),
        report.placeholders,
        report.duplicates,
        report.unreferenceable
    );
    if report.is_clean() {
        Ok(())
    } else {
        Err(CliError::CheckFailed { placeholders: report.placeholders, duplicates: report.duplicates })
    }
}

async fn run_render(settings: &Settings, html: bool) -> Result<(), CliError> {
    let (_, form) = Session::open(settings).await?.flush().await;
    if html {
        println!("{}", form.render().to_html());
    } else {
        for line in report::outline(&form) {
            println!("{line}");
        }
    }
    Ok(())
}

async fn run_values(settings: &Settings) -> Result<(), CliError> {
    let (_, form) = Session::open(settings).await?.flush().await;
    for line in report::value_table(&form) {
        println!("{line}");
    }
    Ok(())
}

async fn run_get(settings: &Settings, name: &str) -> Result<(), CliError> {
    let session = Session::open(settings).await?;
    let widget = session.widget(name)?;
    session.flush().await;
    println!("{}", widget.value().to_wire());
    Ok(())
}

async fn run_set(settings: &Settings, name: &str, text: &str) -> Result<(), CliError> {
    let session = Session::open(settings).await?;
    let widget = session.widget(name)?;
    if !widget.is_visible() {
        warn!(name, "option is currently hidden");
    }
    widget.commit_text(text).map_err(|source| CliError::Edit { name: name.to_owned(), source })?;
    let (store, _) = session.flush().await;

    let expected = widget.value().to_wire();
    let stored = store.get_value(name).await?;
    if stored.as_deref() != Some(expected.as_str()) {
        return Err(CliError::NotPersisted { name: name.to_owned() });
    }
    println!("{name} = {expected}");
    Ok(())
}

async fn run_generate(settings: &Settings, args: GenerateArgs) -> Result<(), CliError> {
    let source = settings.source()?;
    if source.needs_host() {
        return Err(CliError::HostRequired("--schema-key"));
    }
    let schema = source.load::<WsStore>(None).await?;
    println!("{}", generate_url(&schema, &args.base_url, &args.assignments).await?);
    Ok(())
}

/// Run the form against an empty in-memory store, apply `assignments` as user
/// edits, and return `base_url` with the resulting query string.
async fn generate_url(schema: &FormSchema, base_url: &str, assignments: &[(String, String)]) -> Result<String, CliError> {
    let sink = Rc::new(QuerySink::from_schema(schema));
    let form = FormBuilder::new().build(schema, Rc::clone(&sink) as Rc<dyn ChangeSink>);
    form.load(&MemoryStore::new()).await;

    for (name, value) in assignments {
        let widget = form.widget(name).ok_or_else(|| CliError::UnknownOption(name.clone()))?;
        widget.commit_text(value).map_err(|source| CliError::Edit { name: name.clone(), source })?;
    }
    Ok(sink.url(base_url))
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let Some((name, value)) = raw.split_once('=') else {
        return Err(format!("expected name=value, got `{raw}`"));
    };
    if name.trim().is_empty() {
        return Err(format!("missing option name in `{raw}`"));
    }
    Ok((name.trim().to_owned(), value.to_owned()))
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
