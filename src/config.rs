mod shape;

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::fs::Metadata;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use clap::Parser;

use crate::error::{self, Context};

pub type Kdf = hkdf::Hkdf<sha3::Sha3_512>;

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// path of a settings file to load. can be given more than once and
    /// later files override earlier ones
    #[arg(long)]
    config: Vec<PathBuf>
}

pub fn get_config() -> error::Result<Config> {
    Config::from_args(CliArgs::parse())
}

/// fully merged runtime configuration along with the master key material
#[derive(Debug)]
pub struct Config {
    pub kdf: Kdf,
    pub settings: Settings,
}

impl Config {
    pub fn from_args(args: CliArgs) -> error::Result<Self> {
        let cwd = cwd()?;
        let mut settings = Settings::try_default()?;

        for config_path in args.config {
            let full = resolve(&cwd, config_path);

            tracing::debug!(file = %full.display(), "loading settings file");

            let loaded = Self::load_file(&full)?;
            let file = SettingsFile::new(&full)?;

            settings.merge(&file, DotPath::root("settings"), loaded)?;
        }

        let meta = metadata(&settings.data)
            .context("failed to retrieve metadata for settings.data")?
            .context("settings.data does not exist")?;

        if !meta.is_dir() {
            return Err(error::Error::new().message(
                "settings.data is not a directory"
            ));
        }

        tracing::debug!("loaded settings: {settings:#?}");

        let kdf = Kdf::new(None, settings.master_key.as_bytes());

        Ok(Config { kdf, settings })
    }

    fn load_file(path: &Path) -> error::Result<shape::Settings> {
        let shown = path.display();
        let ext = path.extension()
            .context(format!("failed to retrieve the file extension for config file: \"{shown}\""))?;

        let file = std::fs::File::open(path)
            .context(format!("failed to open config file: \"{shown}\""))?;
        let reader = std::io::BufReader::new(file);

        match ext.to_ascii_lowercase().to_str() {
            Some("yaml" | "yml") => serde_yaml::from_reader(reader)
                .context(format!("failed to parse yaml config file: \"{shown}\"")),
            Some("json") => serde_json::from_reader(reader)
                .context(format!("failed to parse json config file: \"{shown}\"")),
            _ => Err(error::Error::new().message(format!(
                "unknown type of config file: \"{shown}\""
            ))),
        }
    }
}

/// the settings file a merged value came from, shown quoted in errors
struct SettingsFile<'a> {
    path: &'a Path,
    parent: &'a Path,
}

impl<'a> SettingsFile<'a> {
    fn new(path: &'a Path) -> error::Result<SettingsFile<'a>> {
        let Some(parent) = path.parent() else {
            return Err(error::Error::new().message(format!(
                "failed to retrieve parent path from settings file \"{}\"", path.display()
            )));
        };

        Ok(SettingsFile { path, parent })
    }
}

impl Display for SettingsFile<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.path.display())
    }
}

/// dotted key path pointing at the field a merge error is about
struct DotPath(String);

impl DotPath {
    fn root(name: &str) -> Self {
        DotPath(name.into())
    }

    fn push(&self, name: impl Display) -> Self {
        DotPath(format!("{}.{name}", self.0))
    }
}

impl Display for DotPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// overwrites a settings field when the loaded shape gave a value
fn fill<T>(field: &mut T, given: Option<T>) {
    if let Some(value) = given {
        *field = value;
    }
}

fn fill_opt<T>(field: &mut Option<T>, given: Option<T>) {
    if given.is_some() {
        *field = given;
    }
}

#[derive(Debug)]
pub struct Settings {
    pub data: PathBuf,
    pub master_key: String,
    pub origin: Option<String>,
    pub listeners: HashMap<String, Listener>,
    pub sec: Sec,
    pub captcha: Captcha,
    pub rate_limit: RateLimit,
    pub db: Db,
}

impl Settings {
    pub fn try_default() -> error::Result<Self> {
        let cwd = cwd()?;

        Ok(Settings {
            data: cwd.join("data"),
            master_key: "tfa_master_key_secret".into(),
            origin: None,
            listeners: HashMap::new(),
            sec: Sec::default(),
            captcha: Captcha::default(),
            rate_limit: RateLimit::default(),
            db: Db::default(),
        })
    }

    fn merge(&mut self, file: &SettingsFile<'_>, dot: DotPath, settings: shape::Settings) -> error::Result<()> {
        if let Some(data) = settings.data {
            self.data = check_dir(data, file, dot.push("data"))?;
        }

        fill(&mut self.master_key, settings.master_key);
        fill_opt(&mut self.origin, settings.origin);

        if let Some(listeners) = settings.listeners {
            for (key, listener) in listeners {
                let dot_key = dot.push(format_args!("\"{key}\""));

                self.listeners.entry(key)
                    .or_default()
                    .merge(file, dot_key, listener)?;
            }
        }

        if let Some(sec) = settings.sec {
            self.sec.merge(file, dot.push("sec"), sec)?;
        }

        if let Some(captcha) = settings.captcha {
            self.captcha.merge(file, dot.push("captcha"), captcha)?;
        }

        if let Some(rate_limit) = settings.rate_limit {
            self.rate_limit.merge(file, dot.push("rate_limit"), rate_limit)?;
        }

        if let Some(db) = settings.db {
            self.db.merge(file, dot.push("db"), db)?;
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct Listener {
    pub addr: SocketAddr,
}

impl Default for Listener {
    fn default() -> Listener {
        Listener { addr: SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), DEFAULT_PORT) }
    }
}

impl Listener {
    fn merge(&mut self, file: &SettingsFile<'_>, dot: DotPath, listener: shape::Listener) -> error::Result<()> {
        if let Ok(addr) = SocketAddr::from_str(&listener.addr) {
            self.addr = addr;
        } else if let Ok(ip) = IpAddr::from_str(&listener.addr) {
            self.addr = SocketAddr::from((ip, DEFAULT_PORT));
        } else {
            return Err(error::Error::new().message(format!(
                "{dot}.addr invalid: \"{}\" file: {file}", listener.addr
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Sec {
    pub session: Session,
    pub totp: Totp,
}

impl Sec {
    fn merge(&mut self, file: &SettingsFile<'_>, dot: DotPath, sec: shape::Sec) -> error::Result<()> {
        if let Some(session) = sec.session {
            self.session.merge(file, dot.push("session"), session)?;
        }

        if let Some(totp) = sec.totp {
            self.totp.merge(file, dot.push("totp"), totp)?;
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct Session {
    pub secure: bool,
    pub domain: Option<String>,
}

impl Default for Session {
    fn default() -> Session {
        Session { secure: true, domain: None }
    }
}

impl Session {
    fn merge(&mut self, _file: &SettingsFile<'_>, _dot: DotPath, session: shape::Session) -> error::Result<()> {
        fill(&mut self.secure, session.secure);
        fill_opt(&mut self.domain, session.domain);

        Ok(())
    }
}

#[derive(Debug)]
pub struct Totp {
    pub issuer: String,
}

impl Default for Totp {
    fn default() -> Totp {
        Totp { issuer: "tfa".into() }
    }
}

impl Totp {
    fn merge(&mut self, _file: &SettingsFile<'_>, _dot: DotPath, totp: shape::Totp) -> error::Result<()> {
        fill(&mut self.issuer, totp.issuer);

        Ok(())
    }
}

#[derive(Debug)]
pub struct Captcha {
    pub secret: Option<String>,
    pub verify_url: String,
    pub timeout: u64,
}

impl Default for Captcha {
    fn default() -> Captcha {
        Captcha {
            secret: None,
            verify_url: "https://www.google.com/recaptcha/api/siteverify".into(),
            timeout: 10,
        }
    }
}

impl Captcha {
    fn merge(&mut self, _file: &SettingsFile<'_>, _dot: DotPath, captcha: shape::Captcha) -> error::Result<()> {
        fill_opt(&mut self.secret, captcha.secret);
        fill(&mut self.verify_url, captcha.verify_url);
        fill(&mut self.timeout, captcha.timeout);

        Ok(())
    }
}

#[derive(Debug)]
pub struct RateLimit {
    pub window: u64,
    pub limit: u32,
}

impl Default for RateLimit {
    fn default() -> RateLimit {
        RateLimit { window: 60, limit: 10 }
    }
}

impl RateLimit {
    fn merge(&mut self, file: &SettingsFile<'_>, dot: DotPath, rate_limit: shape::RateLimit) -> error::Result<()> {
        match rate_limit.window {
            Some(0) => return Err(error::Error::new().message(format!(
                "{dot}.window must be greater than zero. file: {file}"
            ))),
            Some(window) => self.window = window,
            None => {}
        }

        match rate_limit.limit {
            Some(0) => return Err(error::Error::new().message(format!(
                "{dot}.limit must be greater than zero. file: {file}"
            ))),
            Some(limit) => self.limit = limit,
            None => {}
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct Db {
    pub user: String,
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub password: Option<String>,
}

impl Default for Db {
    fn default() -> Db {
        Db {
            user: String::from("postgres"),
            host: String::from("localhost"),
            port: 5432,
            dbname: String::from("tfa"),
            password: None,
        }
    }
}

impl Db {
    fn merge(&mut self, _file: &SettingsFile<'_>, _dot: DotPath, db: shape::Db) -> error::Result<()> {
        fill(&mut self.user, db.user);
        fill(&mut self.host, db.host);
        fill(&mut self.port, db.port);
        fill(&mut self.dbname, db.dbname);
        fill_opt(&mut self.password, db.password);

        Ok(())
    }
}

fn cwd() -> error::Result<PathBuf> {
    std::env::current_dir().context("failed to retrieve the current directory")
}

fn resolve(base: &Path, given: PathBuf) -> PathBuf {
    if given.is_absolute() {
        given
    } else {
        normalize(base.join(given))
    }
}

fn check_dir(given: PathBuf, file: &SettingsFile<'_>, dot: DotPath) -> error::Result<PathBuf> {
    let full = resolve(file.parent, given);

    tracing::debug!("{dot} {file} checking {}", full.display());

    let meta = metadata(&full)
        .context(format!("{dot} failed to retrieve metadata for: {file}"))?
        .context(format!("{dot} {file} was not found"))?;

    if meta.is_dir() {
        Ok(full)
    } else {
        Err(error::Error::new().message(format!(
            "{dot} is not a directory in: {file}"
        )))
    }
}

fn metadata<P: AsRef<Path>>(path: P) -> Result<Option<Metadata>, std::io::Error> {
    match path.as_ref().metadata() {
        Ok(meta) => Ok(Some(meta)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

fn normalize<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut out = PathBuf::new();

    for part in path.as_ref().components() {
        match part {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            keep => out.push(keep.as_os_str()),
        }
    }

    out
}
