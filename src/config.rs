use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::net::{SocketAddr, IpAddr, Ipv4Addr};
use std::default::Default;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use clap::Parser;

use crate::error::{self, Context};
use crate::path::{metadata, normalize};

mod shape;

pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_LISTENER: &str = "default";
pub const DEFAULT_NOTIFY_LIMIT: usize = 50;

pub trait TryDefault: Sized {
    type Error;

    fn try_default() -> Result<Self, Self::Error>;
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// a config file to load settings from. may be given multiple times
    #[arg(long)]
    config: Vec<PathBuf>
}

#[derive(Debug)]
pub struct Config {
    pub settings: Settings,
}

impl Config {
    pub fn from_args<L>(args: CliArgs, lookup: L) -> error::Result<Self>
    where
        L: Fn(&str) -> Option<String>
    {
        let cwd = std::env::current_dir()
            .context("failed to retrieve cwd for Settings")?;
        let mut settings = Settings::try_default()?;

        for config_path in args.config {
            let full = if config_path.is_absolute() {
                config_path
            } else {
                normalize(cwd.join(config_path))
            };

            tracing::debug!("loading config file \"{}\"", full.display());

            let loaded = Self::load_file(&full)?;
            let src = SrcFile::new(&full)?;
            let dot = DotPath::new(&"settings");

            settings.merge(&src, dot, loaded)?;
        }

        settings.apply_env(lookup)?;
        settings.finish()?;

        tracing::debug!(
            "root folder: {} poll: {:?} ocr: {} listeners: {:?}",
            settings.drive.root_folder,
            settings.sync.poll,
            settings.ocr.enabled,
            settings.listeners,
        );

        Ok(Config {
            settings,
        })
    }

    fn load_file(path: &PathBuf) -> error::Result<shape::Settings> {
        let ext = path.extension().context(format!(
            "failed to retrieve the file extension for config file: \"{}\"", path.display()
        ))?;

        let ext = ext.to_ascii_lowercase();
        let file = std::fs::OpenOptions::new()
            .read(true)
            .open(path)
            .context(format!("failed to open config file: \"{}\"", path.display()))?;
        let reader = std::io::BufReader::new(file);

        if ext.eq("yaml") || ext.eq("yml") {
            serde_yaml::from_reader(reader).context(format!(
                "failed to parse yaml config file: \"{}\"", path.display()
            ))
        } else if ext.eq("json") {
            serde_json::from_reader(reader).context(format!(
                "failed to parse json config file: \"{}\"", path.display()
            ))
        } else {
            Err(error::Error::config(format!(
                "unknown type of config file: \"{}\"", path.display()
            )))
        }
    }
}

pub fn get_config() -> error::Result<Config> {
    Config::from_args(CliArgs::parse(), |key| std::env::var(key).ok())
}

pub fn parse_flag(given: &str) -> bool {
    matches!(
        given.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

struct SrcFile<'a> {
    parent: &'a Path,
    src: &'a Path,
}

impl<'a> SrcFile<'a> {
    fn new(src: &'a Path) -> error::Result<Self> {
        let parent = src.parent().context(format!(
            "failed to retrieve parent path from source file \"{}\"", src.display()
        ))?;

        Ok(SrcFile {
            parent,
            src
        })
    }
}

impl<'a> Display for SrcFile<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", self.src.display())
    }
}

struct Quote<'a>(&'a dyn Display);

impl<'a> Display for Quote<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

struct DotPath<'a>(Vec<&'a dyn Display>);

impl<'a> DotPath<'a> {
    fn new(name: &'a (dyn Display)) -> Self {
        DotPath(vec![name])
    }

    fn push(&self, name: &'a (dyn Display)) -> Self {
        let mut path = self.0.clone();
        path.push(name);

        DotPath(path)
    }
}

impl<'a> Display for DotPath<'a> {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;

        for name in &self.0 {
            if first {
                write!(fmt, "{name}")?;
                first = false;
            } else {
                write!(fmt, ".{name}")?;
            }
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct Settings {
    pub assets: PathBuf,
    pub listeners: HashMap<String, Listener>,
    pub drive: Drive,
    pub sync: Sync,
    pub notify: Notify,
    pub ocr: Ocr,
    pub http: Http,
}

impl Settings {
    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, settings: shape::Settings) -> error::Result<()> {
        if let Some(assets) = settings.assets {
            self.assets = check_path(assets, src, dot.push(&"assets"), false)?;
        }

        if let Some(listeners) = settings.listeners {
            for (key, listener) in listeners {
                let mut working = self.listeners.remove(&key)
                    .unwrap_or_default();

                working.merge(src, dot.push(&"listeners").push(&Quote(&key)), listener)?;

                self.listeners.insert(key, working);
            }
        }

        if let Some(drive) = settings.drive {
            self.drive.merge(src, dot.push(&"drive"), drive)?;
        }

        if let Some(sync) = settings.sync {
            self.sync.merge(sync);
        }

        if let Some(notify) = settings.notify {
            self.notify.merge(notify);
        }

        if let Some(ocr) = settings.ocr {
            self.ocr.merge(ocr);
        }

        if let Some(http) = settings.http {
            self.http.merge(http);
        }

        Ok(())
    }

    pub fn apply_env<L>(&mut self, lookup: L) -> error::Result<()>
    where
        L: Fn(&str) -> Option<String>
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.notify.api_key = Some(key);
        }

        if let Some(folder) = get("GOOGLE_FOLDER_ID") {
            self.drive.root_folder = folder.trim().to_owned();
        }

        if let Some(seconds) = get("POLL_SECONDS") {
            let parsed = seconds.trim()
                .parse::<u64>()
                .context(format!("POLL_SECONDS is not a valid number of seconds: \"{seconds}\""))?;

            self.sync.poll = Duration::from_secs(parsed);
        }

        if let Some(credentials) = get("GOOGLE_CREDENTIALS") {
            self.drive.credentials = Some(credentials);
        }

        if let Some(token) = get("API_BEARER_TOKEN") {
            self.http.bearer_token = Some(token);
        }

        if let Some(enabled) = get("OCR_ENABLED") {
            self.ocr.enabled = parse_flag(&enabled);
        }

        if let Some(lang) = get("OCR_LANG") {
            self.ocr.lang = lang.trim().to_owned();
        }

        if let Some(port) = get("PORT") {
            let parsed = port.trim()
                .parse::<u16>()
                .context(format!("PORT is not a valid port: \"{port}\""))?;

            self.listeners.insert(DEFAULT_LISTENER.to_owned(), Listener::on_port(parsed));
        }

        Ok(())
    }

    fn finish(&mut self) -> error::Result<()> {
        if self.drive.root_folder.is_empty() {
            return Err(error::Error::config("no root folder given. set GOOGLE_FOLDER_ID or drive.root_folder"));
        }

        if self.drive.credentials.is_none() {
            return Err(error::Error::config("no drive credentials given. set GOOGLE_CREDENTIALS or drive.credentials"));
        }

        if self.sync.poll.is_zero() {
            return Err(error::Error::config("sync.poll_seconds must be greater than 0"));
        }

        if self.listeners.is_empty() {
            self.listeners.insert(DEFAULT_LISTENER.to_owned(), Listener::default());
        }

        Ok(())
    }
}

impl TryDefault for Settings {
    type Error = error::Error;

    fn try_default() -> Result<Self, Self::Error> {
        let cwd = std::env::current_dir()
            .context("failed to retrieve cwd for Settings")?;

        Ok(Settings {
            assets: cwd.join("static"),
            listeners: HashMap::new(),
            drive: Drive::default(),
            sync: Sync::default(),
            notify: Notify::default(),
            ocr: Ocr::default(),
            http: Http::default(),
        })
    }
}

#[derive(Debug)]
pub struct Listener {
    pub addr: SocketAddr,
}

impl Listener {
    pub fn on_port(port: u16) -> Self {
        Listener {
            addr: SocketAddr::from((IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)),
        }
    }

    fn merge(&mut self, src: &SrcFile<'_>, dot_path: DotPath<'_>, listener: shape::Listener) -> error::Result<()> {
        self.addr = match SocketAddr::from_str(&listener.addr) {
            Ok(valid) => valid,
            Err(_) => match IpAddr::from_str(&listener.addr) {
                Ok(valid) => SocketAddr::from((valid, DEFAULT_PORT)),
                Err(_) => {
                    return Err(error::Error::config(format!(
                        "{dot_path}.addr invalid: \"{}\" file: {src}", listener.addr
                    )));
                }
            }
        };

        Ok(())
    }
}

impl Default for Listener {
    fn default() -> Self {
        Listener::on_port(DEFAULT_PORT)
    }
}

#[derive(Debug)]
pub struct Drive {
    pub root_folder: String,
    pub credentials: Option<String>,
    pub timeout: Duration,
}

impl Drive {
    fn merge(&mut self, src: &SrcFile<'_>, dot: DotPath<'_>, drive: shape::Drive) -> error::Result<()> {
        if let Some(root_folder) = drive.root_folder {
            self.root_folder = root_folder.trim().to_owned();
        }

        if let Some(credentials) = drive.credentials {
            self.credentials = Some(credentials);
        }

        if let Some(file) = drive.credentials_file {
            let full = check_path(file, src, dot.push(&"credentials_file"), true)?;
            let contents = std::fs::read_to_string(&full).context(format!(
                "{dot}.credentials_file failed to read \"{}\"", full.display()
            ))?;

            self.credentials = Some(contents);
        }

        if let Some(secs) = drive.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }

        Ok(())
    }
}

impl Default for Drive {
    fn default() -> Self {
        Drive {
            root_folder: String::new(),
            credentials: None,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
pub struct Sync {
    pub poll: Duration,
    pub notify_limit: Option<usize>,
}

impl Sync {
    fn merge(&mut self, sync: shape::Sync) {
        if let Some(secs) = sync.poll_seconds {
            self.poll = Duration::from_secs(secs);
        }

        // 0 lifts the limit
        if let Some(limit) = sync.notify_limit {
            self.notify_limit = (limit > 0).then_some(limit);
        }
    }
}

impl Default for Sync {
    fn default() -> Self {
        Sync {
            poll: Duration::from_secs(1800),
            notify_limit: Some(DEFAULT_NOTIFY_LIMIT),
        }
    }
}

#[derive(Debug)]
pub struct Notify {
    pub endpoint: String,
    pub model: String,
    pub system_prompt: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Notify {
    fn merge(&mut self, notify: shape::Notify) {
        if let Some(endpoint) = notify.endpoint {
            self.endpoint = endpoint;
        }

        if let Some(model) = notify.model {
            self.model = model;
        }

        if let Some(system_prompt) = notify.system_prompt {
            self.system_prompt = system_prompt;
        }

        if let Some(api_key) = notify.api_key {
            self.api_key = Some(api_key);
        }

        if let Some(secs) = notify.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
    }
}

impl Default for Notify {
    fn default() -> Self {
        Notify {
            endpoint: "https://api.openai.com/v1/chat/completions".into(),
            model: "gpt-4o-mini".into(),
            system_prompt: "Drive repository update. Refresh knowledge if needed.".into(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
pub struct Ocr {
    pub enabled: bool,
    pub lang: String,
    pub tesseract: String,
    pub pdftoppm: String,
}

impl Ocr {
    fn merge(&mut self, ocr: shape::Ocr) {
        if let Some(enabled) = ocr.enabled {
            self.enabled = enabled;
        }

        if let Some(lang) = ocr.lang {
            self.lang = lang;
        }

        if let Some(tesseract) = ocr.tesseract {
            self.tesseract = tesseract;
        }

        if let Some(pdftoppm) = ocr.pdftoppm {
            self.pdftoppm = pdftoppm;
        }
    }
}

impl Default for Ocr {
    fn default() -> Self {
        Ocr {
            enabled: false,
            lang: "eng".into(),
            tesseract: "tesseract".into(),
            pdftoppm: "pdftoppm".into(),
        }
    }
}

#[derive(Debug)]
pub struct Http {
    pub bearer_token: Option<String>,
    pub timeout: Duration,
}

impl Http {
    fn merge(&mut self, http: shape::Http) {
        if let Some(token) = http.bearer_token {
            self.bearer_token = Some(token);
        }

        if let Some(secs) = http.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
    }
}

impl Default for Http {
    fn default() -> Self {
        Http {
            bearer_token: None,
            timeout: Duration::from_secs(90),
        }
    }
}

fn check_path(given: PathBuf, src: &SrcFile<'_>, dot: DotPath<'_>, is_file: bool) -> error::Result<PathBuf> {
    let full = if given.is_absolute() {
        given
    } else {
        normalize(src.parent.join(given))
    };

    tracing::debug!("{dot} {src} checking {}", full.display());

    let meta = metadata(&full).context(format!(
        "{dot} failed to retrieve metadata for: {src}"
    ))?.context(format!(
        "{dot} {src} was not found"
    ))?;

    if is_file {
        if !meta.is_file() {
            return Err(error::Error::config(format!(
                "{dot} is not a file in: {src}"
            )));
        }
    } else if !meta.is_dir() {
        return Err(error::Error::config(format!(
            "{dot} is not a directory in: {src}"
        )));
    }

    Ok(full)
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let owned: HashMap<String, String> = pairs.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        move |key| owned.get(key).cloned()
    }

    fn args(config: Vec<PathBuf>) -> CliArgs {
        CliArgs { config }
    }

    #[test]
    fn env_only() {
        let config = Config::from_args(args(vec![]), env(&[
            ("GOOGLE_FOLDER_ID", "folder123"),
            ("GOOGLE_CREDENTIALS", "{}"),
            ("OPENAI_API_KEY", "sk-test"),
            ("POLL_SECONDS", "60"),
            ("API_BEARER_TOKEN", "secret"),
            ("OCR_ENABLED", "Yes"),
            ("OCR_LANG", "deu"),
            ("PORT", "8080"),
        ])).unwrap();

        let settings = config.settings;

        assert_eq!(settings.drive.root_folder, "folder123");
        assert_eq!(settings.notify.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.sync.poll, Duration::from_secs(60));
        assert_eq!(settings.http.bearer_token.as_deref(), Some("secret"));
        assert!(settings.ocr.enabled);
        assert_eq!(settings.ocr.lang, "deu");
        assert_eq!(settings.listeners[DEFAULT_LISTENER].addr.port(), 8080);
    }

    #[test]
    fn defaults() {
        let config = Config::from_args(args(vec![]), env(&[
            ("GOOGLE_FOLDER_ID", "folder123"),
            ("GOOGLE_CREDENTIALS", "{}"),
        ])).unwrap();

        let settings = config.settings;

        assert_eq!(settings.sync.poll, Duration::from_secs(1800));
        assert_eq!(settings.sync.notify_limit, Some(DEFAULT_NOTIFY_LIMIT));
        assert!(settings.notify.api_key.is_none());
        assert_eq!(settings.notify.model, "gpt-4o-mini");
        assert!(settings.http.bearer_token.is_none());
        assert!(!settings.ocr.enabled);
        assert_eq!(settings.ocr.lang, "eng");
        assert_eq!(settings.listeners.len(), 1);
        assert_eq!(settings.listeners[DEFAULT_LISTENER].addr.port(), DEFAULT_PORT);
    }

    #[test]
    fn required_values() {
        assert!(Config::from_args(args(vec![]), env(&[
            ("GOOGLE_CREDENTIALS", "{}"),
        ])).is_err());

        assert!(Config::from_args(args(vec![]), env(&[
            ("GOOGLE_FOLDER_ID", "folder123"),
        ])).is_err());

        assert!(Config::from_args(args(vec![]), env(&[
            ("GOOGLE_FOLDER_ID", "folder123"),
            ("GOOGLE_CREDENTIALS", "{}"),
            ("POLL_SECONDS", "soon"),
        ])).is_err());

        assert!(Config::from_args(args(vec![]), env(&[
            ("GOOGLE_FOLDER_ID", "folder123"),
            ("GOOGLE_CREDENTIALS", "{}"),
            ("PORT", "99999"),
        ])).is_err());
    }

    #[test]
    fn flags() {
        for yes in ["1", "true", "TRUE", "yes", "on", " On "] {
            assert!(parse_flag(yes), "{yes}");
        }

        for no in ["0", "false", "no", "off", "", "maybe"] {
            assert!(!parse_flag(no), "{no}");
        }
    }

    #[test]
    fn yaml_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let static_dir = dir.path().join("public");
        std::fs::create_dir(&static_dir).unwrap();

        std::fs::write(dir.path().join("key.json"), r#"{"type":"service_account"}"#).unwrap();

        let config_path = dir.path().join("mirror.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        write!(file, "{}", r#"
assets: public
listeners:
  internal:
    addr: "127.0.0.1:9000"
drive:
  root_folder: from-file
  credentials_file: key.json
  timeout_secs: 15
sync:
  poll_seconds: 300
  notify_limit: 50
notify:
  model: gpt-file
ocr:
  enabled: true
"#).unwrap();

        let config = Config::from_args(args(vec![config_path]), env(&[
            ("GOOGLE_FOLDER_ID", "from-env"),
        ])).unwrap();

        let settings = config.settings;

        assert_eq!(settings.assets, static_dir);
        assert_eq!(settings.drive.root_folder, "from-env");
        assert_eq!(settings.drive.credentials.as_deref(), Some(r#"{"type":"service_account"}"#));
        assert_eq!(settings.drive.timeout, Duration::from_secs(15));
        assert_eq!(settings.sync.poll, Duration::from_secs(300));
        assert_eq!(settings.sync.notify_limit, Some(50));
        assert_eq!(settings.notify.model, "gpt-file");
        assert!(settings.ocr.enabled);
        assert_eq!(settings.listeners.len(), 1);
        assert_eq!(settings.listeners["internal"].addr, "127.0.0.1:9000".parse().unwrap());
    }

    #[test]
    fn zero_notify_limit_is_unlimited() {
        let mut sync = Sync::default();

        sync.merge(shape::Sync {
            poll_seconds: None,
            notify_limit: Some(0),
        });

        assert!(sync.notify_limit.is_none());

        sync.merge(shape::Sync {
            poll_seconds: None,
            notify_limit: Some(5),
        });

        assert_eq!(sync.notify_limit, Some(5));
    }

    #[test]
    fn missing_assets_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("mirror.json");

        std::fs::write(&config_path, r#"{"assets": "nope"}"#).unwrap();

        let result = Config::from_args(args(vec![config_path]), env(&[
            ("GOOGLE_FOLDER_ID", "folder123"),
            ("GOOGLE_CREDENTIALS", "{}"),
        ]));

        assert!(result.is_err());
    }
}
