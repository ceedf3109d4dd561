use anyhow::Result;
use clap::{Parser, Subcommand};
use gistpipe_core::{FetchRequest, PageContentProvider, PageKind, SummaryLength, SummaryOptions};
use gistpipe_local::bus::LocalBus;
use gistpipe_local::orchestrate::Orchestrator;
use gistpipe_local::page::{FetchedPage, HtmlPage};
use gistpipe_local::remote::RemoteSummarizer;
use gistpipe_local::LocalFetcher;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

mod envelope;
#[cfg(feature = "stdio")]
mod mcp;
mod ops;

#[derive(Parser, Debug)]
#[command(name = "gistpipe")]
#[command(about = "Extractive summaries of pages, selections and text", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize text locally (extractive; no network).
    Summarize(SummarizeCmd),
    /// Extract a page (URL or saved HTML) and summarize it.
    Page(PageCmd),
    /// Quick summary of a selection: its first two sentences.
    Selection(SelectionCmd),
    /// Summarize via the remote API, falling back to a demo summary.
    Remote(RemoteCmd),
    /// Run as an MCP stdio server (for MCP clients).
    #[cfg(feature = "stdio")]
    McpStdio,
    /// Diagnose configuration/launch issues (json; no secrets).
    Doctor(DoctorCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct InputArgs {
    /// Input text. Reads stdin when omitted or `-`.
    text: Option<String>,
    /// Read the input text from a file.
    #[arg(long, conflicts_with = "text")]
    file: Option<PathBuf>,
}

impl InputArgs {
    fn read(&self) -> Result<String> {
        if let Some(p) = &self.file {
            return Ok(std::fs::read_to_string(p)?);
        }
        match self.text.as_deref() {
            Some(t) if t != "-" => Ok(t.to_string()),
            _ => {
                let mut s = String::new();
                std::io::stdin().read_to_string(&mut s)?;
                Ok(s)
            }
        }
    }
}

#[derive(clap::Args, Debug)]
struct SummaryArgs {
    /// Summary length: short|medium|long (unknown values mean medium).
    #[arg(long, default_value = "medium")]
    length: String,
    /// Language tag (en, es, fr, de, it, pt, ru, ja, ko, zh).
    #[arg(long, default_value = "en")]
    language: String,
}

impl SummaryArgs {
    fn options(&self, is_video: bool) -> SummaryOptions {
        SummaryOptions {
            length: SummaryLength::parse_lenient(&self.length),
            language: self.language.trim().to_string(),
            is_video,
        }
    }
}

#[derive(clap::Args, Debug)]
struct SummarizeCmd {
    #[command(flatten)]
    input: InputArgs,
    #[command(flatten)]
    summary: SummaryArgs,
    /// Treat the text as a video transcript (adds the video prefix).
    #[arg(long)]
    video: bool,
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct PageCmd {
    /// URL to fetch and summarize.
    #[arg(long, required_unless_present = "html_file", conflicts_with = "html_file")]
    url: Option<String>,
    /// Saved HTML document to summarize instead of fetching.
    #[arg(long)]
    html_file: Option<PathBuf>,
    /// With --html-file: the page's original URL (decides webpage vs video).
    #[arg(long, requires = "html_file")]
    page_url: Option<String>,
    /// Force the page kind: webpage|video.
    #[arg(long)]
    kind: Option<String>,
    #[command(flatten)]
    summary: SummaryArgs,
    /// Fetch timeout (ms).
    #[arg(long, default_value_t = 20_000)]
    timeout_ms: u64,
    /// Max bytes read from the page body.
    #[arg(long, default_value_t = gistpipe_local::DEFAULT_MAX_PAGE_BYTES)]
    max_bytes: u64,
    /// With --url: Accept-Language sent with the fetch (e.g. "fr" or "de-DE,de;q=0.9").
    #[arg(long, requires = "url")]
    accept_language: Option<String>,
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct SelectionCmd {
    #[command(flatten)]
    input: InputArgs,
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct RemoteCmd {
    #[command(flatten)]
    input: InputArgs,
    /// Language tag sent as `lang`.
    #[arg(long, default_value = "en")]
    language: String,
    /// Base URL of the summarize API (`POST {base}/api/summarize`).
    #[arg(long, env = "GISTPIPE_API_BASE_URL")]
    api_base_url: Option<String>,
    /// Remote call timeout (ms).
    #[arg(long, env = "GISTPIPE_API_TIMEOUT_MS", default_value_t = gistpipe_local::remote::DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct DoctorCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
    /// Attempt a local stdio MCP handshake (list_tools) to prove clients can start the server.
    #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
    check_stdio: bool,
    /// Timeout for the stdio handshake (ms).
    #[arg(long, default_value_t = 3000)]
    timeout_ms: u64,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

fn has_env(k: &str) -> bool {
    std::env::var(k).ok().is_some_and(|v| !v.trim().is_empty())
}

fn parse_kind(s: &str) -> Result<PageKind> {
    match s.trim().to_ascii_lowercase().as_str() {
        "webpage" | "page" => Ok(PageKind::Webpage),
        "video" => Ok(PageKind::Video),
        other => anyhow::bail!("unknown page kind: {other} (allowed: webpage, video)"),
    }
}

/// Optional `KEY=VALUE` file; never overrides the process environment.
fn load_env_file() {
    let Some(p) = std::env::var("GISTPIPE_ENV_FILE")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    else {
        return;
    };
    let Ok(txt) = std::fs::read_to_string(&p) else {
        return;
    };
    for raw in txt.lines() {
        let s = raw.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some((k, v)) = s.split_once('=') else {
            continue;
        };
        let k = k.trim();
        let v = v.trim();
        if k.is_empty() {
            continue;
        }
        if std::env::var_os(k).is_none() {
            std::env::set_var(k, v);
        }
    }
}

/// Logs go to stderr: stdout carries JSON (and the MCP stdio transport).
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Print a payload and exit non-zero when it is `ok=false`.
fn emit(payload: &serde_json::Value, output: &str, text_field: &str) {
    let ok = payload["ok"].as_bool().unwrap_or(false);
    match output.to_ascii_lowercase().as_str() {
        "text" => {
            if ok {
                if let Some(notice) = payload["notice"].as_str() {
                    eprintln!("{notice}");
                }
                if let Some(t) = payload[text_field].as_str() {
                    println!("{t}");
                }
            } else {
                eprintln!(
                    "error: {}",
                    payload["error"]["message"].as_str().unwrap_or("unknown error")
                );
            }
        }
        _ => println!("{payload}"),
    }
    if !ok {
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env_file();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Summarize(args) => {
            let text = args.input.read()?;
            let options = args.summary.options(args.video);
            let payload = ops::summarize_text_payload(&text, &options);
            emit(&payload, &args.output, "text");
        }
        Commands::Page(args) => {
            let forced = args.kind.as_deref().map(parse_kind).transpose()?;
            let options = args.summary.options(false);
            let (page, source): (Arc<dyn PageContentProvider>, serde_json::Value) =
                if let Some(path) = &args.html_file {
                    let html = std::fs::read_to_string(path)?;
                    let mut page = HtmlPage::new(html);
                    if let Some(u) = &args.page_url {
                        page = page.with_url(u.clone());
                    }
                    if let Some(k) = forced {
                        page = page.with_kind(k);
                    }
                    let source = serde_json::json!({ "html_file": path.to_string_lossy() });
                    let page: Arc<dyn PageContentProvider> = Arc::new(page);
                    (page, source)
                } else {
                    let url = args.url.clone().unwrap_or_default();
                    let fetcher = Arc::new(LocalFetcher::new()?);
                    let mut req = FetchRequest::new(url.clone());
                    req.timeout_ms = Some(args.timeout_ms);
                    req.max_bytes = Some(args.max_bytes);
                    req.accept_language = args.accept_language.clone();
                    let source = serde_json::json!({
                        "url": url,
                        "accept_language": args.accept_language,
                    });
                    if forced.is_some() {
                        tracing::warn!("--kind only applies to --html-file; page kind follows the URL");
                    }
                    let page: Arc<dyn PageContentProvider> = Arc::new(FetchedPage::new(fetcher, req));
                    (page, source)
                };
            let bus = LocalBus::new(Orchestrator::offline()).with_page(page);
            let payload = ops::summarize_page_payload(&bus, &options, source).await;
            emit(&payload, &args.output, "text");
        }
        Commands::Selection(args) => {
            let text = args.input.read()?;
            let bus = LocalBus::new(Orchestrator::offline());
            let payload = ops::summarize_selection_payload(&bus, &text).await;
            emit(&payload, &args.output, "text");
        }
        Commands::Remote(args) => {
            let text = args.input.read()?;
            let orchestrator = match args.api_base_url.as_deref().map(str::trim) {
                Some(base) if !base.is_empty() => {
                    let client = gistpipe_local::http_client("gistpipe/0.1")?;
                    let remote =
                        RemoteSummarizer::new(client, base).with_timeout_ms(args.timeout_ms);
                    Orchestrator::with_backend(Arc::new(remote))
                }
                _ => Orchestrator::offline(),
            };
            let bus = LocalBus::new(orchestrator);
            let payload = ops::summarize_remote_payload(&bus, &text, &args.language).await;
            emit(&payload, &args.output, "summary");
        }
        #[cfg(feature = "stdio")]
        Commands::McpStdio => {
            mcp::serve_stdio()
                .await
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;
        }
        Commands::Doctor(args) => {
            let t0 = std::time::Instant::now();
            let api_configured = has_env("GISTPIPE_API_BASE_URL");
            let env_file_configured = has_env("GISTPIPE_ENV_FILE");

            let mut checks: Vec<serde_json::Value> = Vec::new();

            let http_ok = gistpipe_local::http_client("gistpipe/0.1").is_ok();
            checks.push(serde_json::json!({
                "name": "http_client",
                "ok": http_ok,
                "message": if http_ok { "http client builds" } else { "http client failed to build" },
                "hint": if http_ok { "" } else { "Check proxy environment variables (HTTPS_PROXY/ALL_PROXY)." },
            }));

            let timeout_ok = std::env::var("GISTPIPE_API_TIMEOUT_MS")
                .ok()
                .map(|v| v.trim().is_empty() || v.trim().parse::<u64>().is_ok())
                .unwrap_or(true);
            checks.push(serde_json::json!({
                "name": "api_timeout_ms",
                "ok": timeout_ok,
                "message": if timeout_ok { "GISTPIPE_API_TIMEOUT_MS is unset or numeric" } else { "GISTPIPE_API_TIMEOUT_MS is not a number" },
                "hint": if timeout_ok { "" } else { "Set GISTPIPE_API_TIMEOUT_MS to milliseconds, e.g. 15000." },
            }));

            let mut stdio_ok: Option<bool> = None;
            let mut stdio_tool_count: Option<usize> = None;
            let mut stdio_error: Option<serde_json::Value> = None;
            let mut stdio_elapsed_ms: Option<u128> = None;

            #[cfg(feature = "stdio")]
            if args.check_stdio {
                use rmcp::service::ServiceExt;
                use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};
                use tokio::process::Command;

                let exe = std::env::current_exe()
                    .unwrap_or_else(|_| std::path::PathBuf::from("gistpipe"));
                let child = TokioChildProcess::new(Command::new(exe).configure(|cmd| {
                    cmd.args(["mcp-stdio"]);
                    // The probe never calls the API.
                    cmd.env_remove("GISTPIPE_API_BASE_URL");
                    cmd.env("RUST_LOG", "error");
                }))?;

                let service = ().serve(child).await?;
                let check_t0 = std::time::Instant::now();
                let res = tokio::time::timeout(
                    std::time::Duration::from_millis(args.timeout_ms),
                    service.list_tools(Default::default()),
                )
                .await;
                stdio_elapsed_ms = Some(check_t0.elapsed().as_millis());

                match res {
                    Ok(Ok(tools)) => {
                        stdio_ok = Some(true);
                        stdio_tool_count = Some(tools.tools.len());
                    }
                    Ok(Err(e)) => {
                        stdio_ok = Some(false);
                        stdio_error = Some(serde_json::json!({
                            "code": "handshake_failed",
                            "message": e.to_string(),
                            "hint": "The child closed the stdio transport early. Check that nothing prints to stdout in mcp-stdio mode and that the client runs `gistpipe mcp-stdio`."
                        }));
                    }
                    Err(_elapsed) => {
                        stdio_ok = Some(false);
                        stdio_error = Some(serde_json::json!({
                            "code": "timeout",
                            "message": format!("stdio handshake timed out after {}ms", args.timeout_ms),
                            "hint": "The child did not respond to list_tools in time."
                        }));
                    }
                }

                let _ = service.cancel().await;
            }

            #[cfg(not(feature = "stdio"))]
            if args.check_stdio {
                stdio_ok = Some(false);
            }

            checks.push(serde_json::json!({
                "name": "mcp_stdio_handshake",
                "ok": if args.check_stdio { stdio_ok.unwrap_or(false) } else { true },
                "skipped": !args.check_stdio,
                "message": if !args.check_stdio {
                    "stdio MCP handshake skipped"
                } else if stdio_ok.unwrap_or(false) {
                    "stdio MCP handshake succeeded"
                } else {
                    "stdio MCP handshake failed"
                },
                "hint": if !args.check_stdio || stdio_ok.unwrap_or(false) {
                    ""
                } else if cfg!(feature = "stdio") {
                    "Check that the MCP client points at the correct `gistpipe` binary with args [\"mcp-stdio\"]."
                } else {
                    "`mcp-stdio` requires building with feature `stdio`."
                },
                "tool_count": stdio_tool_count,
                "elapsed_ms": stdio_elapsed_ms,
                "error": stdio_error,
            }));

            let ok = checks.iter().all(|c| c["ok"].as_bool().unwrap_or(false));
            let payload = serde_json::json!({
                "schema_version": envelope::SCHEMA_VERSION,
                "kind": "doctor",
                "ok": ok,
                "name": "gistpipe",
                "version": env!("CARGO_PKG_VERSION"),
                "platform": {
                    "os": std::env::consts::OS,
                    "arch": std::env::consts::ARCH,
                },
                "features": {
                    "stdio": cfg!(feature = "stdio"),
                },
                "elapsed_ms": t0.elapsed().as_millis(),
                "configured": {
                    "remote_api": api_configured,
                    "env_file": env_file_configured,
                    "summary_mode": if api_configured { "remote" } else { "demo" },
                },
                "checks": checks,
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => {
                    println!("gistpipe {} (ok={})", env!("CARGO_PKG_VERSION"), ok);
                    println!(
                        "remote_api: {} (summary_mode={})",
                        api_configured,
                        payload["configured"]["summary_mode"].as_str().unwrap_or("demo")
                    );
                    println!("checks:");
                    if let Some(arr) = payload["checks"].as_array() {
                        for c in arr {
                            let name = c["name"].as_str().unwrap_or("?");
                            let ok = c["ok"].as_bool().unwrap_or(false);
                            let skipped = c["skipped"].as_bool().unwrap_or(false);
                            if skipped {
                                println!("- {}: skipped", name);
                            } else {
                                println!("- {}: {}", name, if ok { "ok" } else { "fail" });
                            }
                        }
                    }
                }
                _ => println!("{payload}"),
            }
        }
        Commands::Version(args) => {
            let v = serde_json::json!({
                "schema_version": envelope::SCHEMA_VERSION,
                "kind": "version",
                "ok": true,
                "name": "gistpipe",
                "version": env!("CARGO_PKG_VERSION"),
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => println!("gistpipe {}", env!("CARGO_PKG_VERSION")),
                _ => println!("{}", v),
            }
        }
    }

    Ok(())
}
