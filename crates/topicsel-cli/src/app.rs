//! Command handlers.
//!
//! Each handler corresponds to one view of the application. Views are entered
//! through the router, so the route guard decides whether a command may run.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use topicsel_core::api::Envelope;
use topicsel_core::auth::{FileTokenStore, SharedSession, TokenStore};
use topicsel_core::config::TokenBackend;
use topicsel_core::models::{
    ApplySelectionParams, Captcha, LoginParams, Paper, SelectionDetail, Student,
    TeamApplicationParam,
};
use topicsel_core::router::{HOME_PATH, LOGIN_PATH};
use topicsel_core::{ApiClient, Config, Navigation, Router};

use crate::{ApplySubcommand, Command, LoginArgs};

const INDIVIDUAL_SELECTION_PATH: &str = "/individual-selection";
const TEAM_SELECTION_PATH: &str = "/team-selection";
const SUCCESS_PATH: &str = "/success";

/// Outcome of entering a view through the guard.
enum Entry {
    Granted,
    /// The guard sent us somewhere else; the handler should stop.
    Diverted,
}

pub struct App {
    config: Config,
    config_path: Option<PathBuf>,
    api: ApiClient,
    router: Router,
    session: SharedSession,
    json: bool,
}

impl App {
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        api: ApiClient,
        router: Router,
        session: SharedSession,
        json: bool,
    ) -> Self {
        Self {
            config,
            config_path,
            api,
            router,
            session,
            json,
        }
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Login(args) => self.login(args).await,
            Command::Logout => self.logout(),
            Command::Captcha { out } => self.captcha(out).await,
            Command::Home => self.home().await,
            Command::Theses => self.theses().await,
            Command::Students => self.students().await,
            Command::Apply(apply) => self.apply(apply.command).await,
            Command::Status => self.status().await,
            Command::Detail => self.detail().await,
            Command::Open { path } => self.open(&path),
            Command::Routes => {
                self.routes();
                Ok(())
            }
            Command::Session => self.show_session(),
        }
    }

    /// Navigate to `path` and report where the guard sent us.
    fn enter(&self, path: &str) -> Result<Entry> {
        match self.router.navigate(path)? {
            Navigation::NotFound(path) => bail!("No view at {}", path),
            Navigation::Proceed { route, .. } if route.path == path => Ok(Entry::Granted),
            Navigation::Proceed { route, .. } => {
                debug!(requested = path, landed = route.path, "View entry diverted");
                if route.is_login() {
                    eprintln!("Not logged in. Run `topicsel login` first.");
                } else {
                    eprintln!("Already logged in. Run `topicsel logout` to switch accounts.");
                }
                Ok(Entry::Diverted)
            }
        }
    }

    async fn login(&self, args: LoginArgs) -> Result<()> {
        if let Entry::Diverted = self.enter(LOGIN_PATH)? {
            return Ok(());
        }

        let identifier = match args.identifier.or_else(|| self.config.last_identifier.clone()) {
            Some(id) => id,
            None => prompt("Identifier: ")?,
        };
        let password = match args.password {
            Some(p) => p,
            None => rpassword::prompt_password("Password: ").context("Failed to read password")?,
        };
        let (captcha_key, captcha) = match (args.captcha_key, args.captcha) {
            (Some(key), Some(code)) => (key, code),
            _ => {
                let challenge = self.api.captcha().await?.into_result()?;
                let saved = save_captcha(&challenge, &self.default_captcha_path()?)?;
                println!("CAPTCHA saved to {}", saved.display());
                (challenge.key, prompt("CAPTCHA: ")?)
            }
        };

        let params = LoginParams {
            user_type: args.user_type,
            identifier: identifier.clone(),
            password,
            captcha,
            captcha_key,
        };
        let reply = self.api.login(&params).await?;
        if !reply.is_success() || !self.session.is_authenticated()? {
            bail!("Login failed (code {}): {}", reply.code, reply.message);
        }

        self.remember_identifier(&identifier)?;
        println!("Logged in as {}", identifier);
        Ok(())
    }

    fn logout(&self) -> Result<()> {
        self.api.logout()?;
        println!("Logged out");
        Ok(())
    }

    async fn captcha(&self, out: Option<PathBuf>) -> Result<()> {
        let challenge = self.api.captcha().await?.into_result()?;
        let path = match out {
            Some(path) => path,
            None => self.default_captcha_path()?,
        };
        let saved = save_captcha(&challenge, &path)?;

        if self.json {
            return print_json(&challenge);
        }
        println!("key: {}", challenge.key);
        println!("image: {}", saved.display());
        Ok(())
    }

    async fn home(&self) -> Result<()> {
        if let Entry::Diverted = self.enter(HOME_PATH)? {
            return Ok(());
        }

        let (papers, students) =
            futures::try_join!(self.api.thesis_list(), self.api.unselected_students())?;
        let papers = papers.into_result()?;
        let students = students.into_result()?;

        if self.json {
            return print_json(&serde_json::json!({
                "theses": papers,
                "students": students,
            }));
        }
        print_papers(&papers);
        println!();
        print_students(&students);
        Ok(())
    }

    async fn theses(&self) -> Result<()> {
        if let Entry::Diverted = self.enter(HOME_PATH)? {
            return Ok(());
        }
        let papers = self.api.thesis_list().await?.into_result()?;
        if self.json {
            return print_json(&papers);
        }
        print_papers(&papers);
        Ok(())
    }

    async fn students(&self) -> Result<()> {
        if let Entry::Diverted = self.enter(HOME_PATH)? {
            return Ok(());
        }
        let students = self.api.unselected_students().await?.into_result()?;
        if self.json {
            return print_json(&students);
        }
        print_students(&students);
        Ok(())
    }

    async fn apply(&self, command: ApplySubcommand) -> Result<()> {
        let (view, params) = match command {
            ApplySubcommand::Individual {
                thesis_id,
                achievement_type,
            } => (
                INDIVIDUAL_SELECTION_PATH,
                ApplySelectionParams::individual(thesis_id, achievement_type),
            ),
            ApplySubcommand::Group {
                thesis_id,
                achievement_type,
                reason,
                members,
            } => (
                TEAM_SELECTION_PATH,
                ApplySelectionParams::group(
                    thesis_id,
                    achievement_type,
                    TeamApplicationParam { reason, members },
                ),
            ),
        };
        if let Entry::Diverted = self.enter(view)? {
            return Ok(());
        }

        let reply = self.api.apply_selection(&params).await?;
        report_failure(&reply)?;
        info!(thesis_id = params.thesis_id, "Selection submitted");
        println!("Application submitted: {}", reply.message);
        Ok(())
    }

    async fn status(&self) -> Result<()> {
        if let Entry::Diverted = self.enter(HOME_PATH)? {
            return Ok(());
        }
        let selected = self.api.selection_status().await?.into_result()?;
        if self.json {
            return print_json(&selected);
        }
        if selected {
            println!("Selection submitted. Run `topicsel detail` to view it.");
        } else {
            println!("No selection submitted yet.");
        }
        Ok(())
    }

    async fn detail(&self) -> Result<()> {
        if let Entry::Diverted = self.enter(SUCCESS_PATH)? {
            return Ok(());
        }
        let detail = self.api.selection_detail().await?.into_result()?;
        if self.json {
            return print_json(&detail);
        }
        print_detail(&detail);
        Ok(())
    }

    fn open(&self, path: &str) -> Result<()> {
        match self.router.navigate(path)? {
            Navigation::NotFound(path) => println!("{}: no such route", path),
            Navigation::Proceed {
                route,
                redirected_from: Some(from),
            } => println!("{} -> {} ({})", from, route.path, route.name),
            Navigation::Proceed { route, .. } => println!("{} ({})", route.path, route.name),
        }
        Ok(())
    }

    fn routes(&self) {
        for route in self.router.table().iter() {
            let access = if route.requires_auth { "login required" } else { "public" };
            println!("{:<24} {:<20} {}", route.path, route.name, access);
        }
    }

    fn show_session(&self) -> Result<()> {
        let authenticated = self.session.is_authenticated()?;
        println!("logged in: {}", if authenticated { "yes" } else { "no" });

        match self.config.token_backend {
            TokenBackend::Keyring => println!("storage: OS keychain"),
            TokenBackend::File => {
                let store = FileTokenStore::open(self.config.cache_dir()?)?;
                println!("storage: {}", store.path().display());
                if let Some(updated) = store.updated_at()? {
                    println!("updated: {}", updated.format("%Y-%m-%d %H:%M:%S UTC"));
                }
            }
        }
        if let Some(ref id) = self.config.last_identifier {
            println!("last identifier: {}", id);
        }
        Ok(())
    }

    fn default_captcha_path(&self) -> Result<PathBuf> {
        Ok(self.config.cache_dir()?.join("captcha.html"))
    }

    /// Persist the identifier without writing back env or flag overrides.
    fn remember_identifier(&self, identifier: &str) -> Result<()> {
        let mut stored = match self.config_path {
            Some(ref path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        if stored.last_identifier.as_deref() == Some(identifier) {
            return Ok(());
        }
        stored.last_identifier = Some(identifier.to_string());
        match self.config_path {
            Some(ref path) => stored.save_to(path),
            None => stored.save(),
        }
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Failed to read from stdin")?;
    let input = input.trim();
    if input.is_empty() {
        bail!("No input given");
    }
    Ok(input.to_string())
}

/// Write the challenge image so it can be opened in a browser. Data URLs are
/// wrapped in a minimal HTML page; anything else is written as-is.
fn save_captcha(challenge: &Captcha, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let contents = match challenge.data_url_parts() {
        Some(_) => captcha_page(&challenge.data),
        None => challenge.data.clone(),
    };
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write CAPTCHA to {}", path.display()))?;
    Ok(path.to_path_buf())
}

fn captcha_page(data_url: &str) -> String {
    format!(
        "<!doctype html>\n<html><body><img alt=\"captcha\" src=\"{}\"></body></html>\n",
        data_url.replace('"', "&quot;")
    )
}

fn report_failure<T>(reply: &Envelope<T>) -> Result<()> {
    if reply.is_success() {
        return Ok(());
    }
    bail!("Request rejected (code {}): {}", reply.code, reply.message)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_papers(papers: &[Paper]) {
    if papers.is_empty() {
        println!("No theses available.");
        return;
    }
    println!("{:>6}  {:<8}  {:<20}  Title", "ID", "Taken", "Achievements");
    for paper in papers {
        let marker = if paper.is_full() { " (full)" } else { "" };
        println!(
            "{:>6}  {:<8}  {:<20}  {}{}",
            paper.id,
            paper.display_capacity(),
            paper.achievement_types.join(","),
            paper.title,
            marker
        );
    }
}

fn print_students(students: &[Student]) {
    if students.is_empty() {
        println!("Every student has a selection.");
        return;
    }
    println!("Students without a selection:");
    for student in students {
        println!("{:>8}  {}", student.id, student.name);
    }
}

fn print_detail(detail: &SelectionDetail) {
    println!("Student:     {}", detail.student_name);
    println!("Thesis:      {}", detail.thesis_title);
    println!("Advisor:     {}", detail.advisor_name);
    println!("Achievement: {}", detail.achievement_type);
    println!(
        "Type:        {}",
        if detail.is_group { "group" } else { "individual" }
    );
    if let Some(ref team) = detail.team_info {
        println!("Reason:      {}", team.reason);
        for member in &team.members {
            println!("  - {} ({})", member.name, member.responsibility);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("topicsel-cli-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_save_captcha_wraps_data_url() {
        let challenge = Captcha {
            key: "k".to_string(),
            data: "data:image/png;base64,AAAA".to_string(),
        };
        let path = scratch_path("captcha.html");
        save_captcha(&challenge, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("src=\"data:image/png;base64,AAAA\""));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_save_captcha_writes_plain_data() {
        let challenge = Captcha {
            key: "k".to_string(),
            data: "<svg></svg>".to_string(),
        };
        let path = scratch_path("captcha.svg");
        save_captcha(&challenge, &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<svg></svg>");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_report_failure() {
        let ok: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"code":200,"message":"ok"}"#).unwrap();
        assert!(report_failure(&ok).is_ok());

        let rejected: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"code":4001,"data":null,"message":"thesis is full"}"#).unwrap();
        let err = report_failure(&rejected).unwrap_err();
        assert!(err.to_string().contains("thesis is full"));
    }
}
