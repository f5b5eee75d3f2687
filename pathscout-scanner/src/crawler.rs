use crate::error::{Result, ScanError};
use crate::html::{ScriptHandler, extract_scripts, html_content_to_parse_result};
use crate::result::CrawlState;
use crate::syntax::JsParser;
use crate::traverse::{ScanOptions, find_endpoint_candidates_with};
use futures::stream::{self, StreamExt};
use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderMap, HeaderValue};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, error, info, warn};
use url::Url;
use walkdir::WalkDir;

/// Called with each label as it is processed.
pub type ProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Path that stands for standard input.
pub const STDIN_PATH: &str = "-";
/// Label used for matches read from standard input.
pub const STDIN_LABEL: &str = "stdin";

const DEFAULT_USER_AGENT: &str = "pathscout/0.1 (https://github.com/trapdoorsec/pathscout)";

/// Which fetch round a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Round {
    /// URLs given by the caller. HTML responses are mined for scripts.
    Direct,
    /// Scripts referenced by round one pages. Always classified as script.
    ExternalScripts,
}

/// A successful response, body already read.
struct FetchedPage {
    final_url: Url,
    content_type: Option<String>,
    body: String,
}

/// Collects inline scripts and resolves `src` references against the page.
struct PageScripts<'a> {
    base: &'a Url,
    contents: Vec<String>,
    sources: Vec<String>,
}

impl ScriptHandler for PageScripts<'_> {
    fn on_script_source(&mut self, src: &str) {
        match self.base.join(src) {
            Ok(resolved) => self.sources.push(resolved.to_string()),
            Err(e) => debug!("Ignoring script src {:?} on {}: {}", src, self.base, e),
        }
    }

    fn on_script_content(&mut self, content: &str) {
        self.contents.push(content.to_string());
    }
}

/// Finds endpoint candidates in local files and fetched URLs.
pub struct Crawler {
    timeout: Duration,
    concurrency: usize,
    retrieve_external_scripts: bool,
    recurse: bool,
    scan_options: ScanOptions,
    user_agent: String,
    cookie: Option<String>,
    insecure: bool,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            concurrency: 10,
            retrieve_external_scripts: false,
            recurse: false,
            scan_options: ScanOptions::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cookie: None,
            insecure: false,
            progress_callback: None,
        }
    }

    /// Total time allowed for each request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Maximum number of requests in flight at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_external_scripts(mut self, retrieve: bool) -> Self {
        self.retrieve_external_scripts = retrieve;
        self
    }

    /// Descend into subdirectories of directory inputs.
    pub fn with_recurse(mut self, recurse: bool) -> Self {
        self.recurse = recurse;
        self
    }

    pub fn with_scan_options(mut self, options: ScanOptions) -> Self {
        self.scan_options = options;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Value of the `Cookie` header sent with every request.
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    /// Accept invalid TLS certificates.
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    fn build_client(&self) -> Result<Client> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &self.cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| ScanError::Other(format!("Invalid cookie value: {}", e)))?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .user_agent(self.user_agent.as_str())
            .default_headers(headers)
            .timeout(self.timeout)
            .connect_timeout(self.timeout / 2)
            .pool_max_idle_per_host(self.concurrency)
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .danger_accept_invalid_certs(self.insecure)
            .build()?;
        Ok(client)
    }

    /// Scan `files`, then fetch `urls`, then (if enabled) the external scripts
    /// those pages reference. Results and per-label failures land in `state`.
    ///
    /// Only setup problems are returned as errors. Dropping the returned
    /// future leaves everything already folded into `state` intact.
    pub async fn run(&self, state: &mut CrawlState, files: &[PathBuf], urls: &[String]) -> Result<()> {
        let mut parser = JsParser::new()?;

        self.scan_files(&mut parser, state, files).await;

        if urls.is_empty() {
            return Ok(());
        }

        let client = self.build_client()?;
        info!("Fetching {} URLs with up to {} in flight", urls.len(), self.concurrency);
        self.fetch_round(&client, &mut parser, state, urls.to_vec(), Round::Direct)
            .await;

        if !self.retrieve_external_scripts {
            return Ok(());
        }

        let pending = state.pending_external_script_urls();
        if pending.is_empty() {
            debug!("No external scripts to retrieve");
            return Ok(());
        }

        info!("Fetching {} external scripts", pending.len());
        self.fetch_round(&client, &mut parser, state, pending, Round::ExternalScripts)
            .await;
        Ok(())
    }

    /// Yields after every scanned source so a caller racing this against a
    /// shutdown signal sees the signal between files.
    async fn scan_files(&self, parser: &mut JsParser, state: &mut CrawlState, files: &[PathBuf]) {
        for path in expand_input_paths(files, self.recurse) {
            let label = input_label(&path);
            self.notify(&label);

            let content = match read_input(&path).await {
                Ok(content) => content,
                Err(e) => {
                    warn!("Cannot read {}: {}", label, e);
                    state.record_failure(label, e);
                    continue;
                }
            };

            if is_html_path(&path) {
                let scripts = html_content_to_parse_result(&content);
                for (n, script) in scripts.script_contents.iter().enumerate() {
                    let script_label = inline_script_label(&label, n + 1);
                    self.scan_source(parser, state, script_label, script);
                    tokio::task::yield_now().await;
                }
            } else {
                self.scan_source(parser, state, label, &content);
                tokio::task::yield_now().await;
            }
        }
    }

    async fn fetch_round(
        &self,
        client: &Client,
        parser: &mut JsParser,
        state: &mut CrawlState,
        urls: Vec<String>,
        round: Round,
    ) {
        let mut responses = stream::iter(urls)
            .map(|url| async move {
                let page = fetch_page(client, &url).await;
                (url, page)
            })
            .buffer_unordered(self.concurrency);

        while let Some((url, page)) = responses.next().await {
            state.mark_fetched(&url);
            self.notify(&url);

            match page {
                Ok(page) => self.process_page(parser, state, url, page, round),
                Err(e) => {
                    warn!("Skipping {}: {}", url, e);
                    state.record_failure(url, e);
                }
            }
        }
    }

    fn process_page(
        &self,
        parser: &mut JsParser,
        state: &mut CrawlState,
        url: String,
        page: FetchedPage,
        round: Round,
    ) {
        let Some(content_type) = page.content_type.as_deref() else {
            let e = ScanError::MissingContentType { url: url.clone() };
            error!("Unexpected response from {}: {}", url, e);
            state.record_failure(url, e);
            return;
        };

        let is_html = content_type.to_ascii_lowercase().starts_with("text/html");
        if round == Round::ExternalScripts || !is_html {
            if is_html {
                debug!("{} claims to be HTML, classifying it as script anyway", url);
            }
            self.scan_source(parser, state, url, &page.body);
            return;
        }

        let mut scripts = PageScripts {
            base: &page.final_url,
            contents: Vec::new(),
            sources: Vec::new(),
        };
        extract_scripts(&page.body, &mut scripts);
        debug!(
            "{}: {} inline scripts, {} script references",
            url,
            scripts.contents.len(),
            scripts.sources.len()
        );

        for source in scripts.sources {
            state.add_external_script_url(source);
        }
        for (n, script) in scripts.contents.iter().enumerate() {
            self.scan_source(parser, state, inline_script_label(&url, n + 1), script);
        }
    }

    fn scan_source(&self, parser: &mut JsParser, state: &mut CrawlState, label: String, content: &str) {
        match find_endpoint_candidates_with(parser, content, &self.scan_options) {
            Ok(matches) => {
                debug!("{}: {} endpoint candidates", label, matches.len());
                state.insert(label, matches);
            }
            Err(e) if e.is_syntax() => {
                warn!("Cannot parse {}: {}", label, e);
                state.record_failure(label, e);
            }
            Err(e) => {
                error!("Scanning {} failed: {}", label, e);
                state.record_failure(label, e);
            }
        }
    }

    fn notify(&self, label: &str) {
        if let Some(callback) = &self.progress_callback {
            callback(label.to_string());
        }
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}

async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage> {
    debug!("Fetching {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| request_error(url, e))?;

    let status = response.status();
    if !status.is_success() && !status.is_redirection() {
        return Err(ScanError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let bytes = response.bytes().await.map_err(|e| request_error(url, e))?;

    Ok(FetchedPage {
        final_url,
        content_type,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

fn request_error(url: &str, e: reqwest::Error) -> ScanError {
    if e.is_timeout() {
        ScanError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_builder() {
        ScanError::InvalidUrl(format!("{}: {}", url, e))
    } else {
        ScanError::HttpError(e)
    }
}

/// Replace directory inputs by the files inside them, sorted by name.
/// Without `recurse` only the directory's own files are taken.
pub fn expand_input_paths(paths: &[PathBuf], recurse: bool) -> Vec<PathBuf> {
    let mut expanded = Vec::new();

    for path in paths {
        if !path.is_dir() {
            expanded.push(path.clone());
            continue;
        }

        let max_depth = if recurse { usize::MAX } else { 1 };
        let walker = WalkDir::new(path)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter();
        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => expanded.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable entry under {}: {}", path.display(), e),
            }
        }
    }

    expanded
}

fn input_label(path: &Path) -> String {
    if path == Path::new(STDIN_PATH) {
        STDIN_LABEL.to_string()
    } else {
        path.display().to_string()
    }
}

fn inline_script_label(source_label: &str, n: usize) -> String {
    format!("{} script #{}", source_label, n)
}

fn is_html_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

async fn read_input(path: &Path) -> Result<String> {
    let bytes = if path == Path::new(STDIN_PATH) {
        let mut bytes = Vec::new();
        tokio::io::stdin().read_to_end(&mut bytes).await?;
        bytes
    } else {
        tokio::fs::read(path).await?
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
