// UI layer: the interactive command flows. Prompts go through the
// `Prompter` trait so the same flows run against a real terminal
// (`DialoguerPrompter`) or a list of canned answers (`ScriptedPrompter`).
//
// Command failures (missing store, unknown name, network errors) are
// printed to `out` and the flow returns `Ok`. Only a failing writer
// bubbles up as an error.

use crate::api::{write_response, ApiClient};
use crate::error::{PromptError, RunError, StoreError};
use crate::models::{ApiConfig, METHOD_CHOICES};
use crate::store::ConfigStore;
use anyhow::Result;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::VecDeque;
use std::io::Write;
use std::time::Duration;
use tracing::debug;

/// Source of user answers.
pub trait Prompter {
    /// Free text. An empty answer is allowed.
    fn prompt(&mut self, label: &str) -> Result<String, PromptError>;

    /// Pick one of `items`. `Ok(None)` means the user backed out.
    fn select(&mut self, label: &str, items: &[String]) -> Result<Option<usize>, PromptError>;
}

/// Keyboard-driven prompts on the current terminal.
#[derive(Default)]
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn prompt(&mut self, label: &str) -> Result<String, PromptError> {
        let text: String = Input::new()
            .with_prompt(label)
            .allow_empty(true)
            .interact_text()?;
        Ok(text)
    }

    fn select(&mut self, label: &str, items: &[String]) -> Result<Option<usize>, PromptError> {
        // Esc or q cancels.
        let choice = Select::new()
            .with_prompt(label)
            .items(items)
            .default(0)
            .interact_opt()?;
        Ok(choice)
    }
}

/// One canned answer for `ScriptedPrompter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    Choose(usize),
    /// Text prompts fail as interrupted, selections return `None`.
    Cancel,
}

impl Answer {
    pub fn text(s: impl Into<String>) -> Self {
        Answer::Text(s.into())
    }
}

/// Replays answers in order. Used by tests and non-interactive callers.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        ScriptedPrompter {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Labels of every prompt shown so far.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    fn next(&mut self, label: &str) -> Result<Answer, PromptError> {
        self.asked.push(label.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| PromptError::Exhausted(label.to_string()))
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&mut self, label: &str) -> Result<String, PromptError> {
        match self.next(label)? {
            Answer::Text(s) => Ok(s),
            Answer::Choose(i) => Ok(i.to_string()),
            Answer::Cancel => Err(PromptError::Io(std::io::Error::new(
                std::io::ErrorKind::Interrupted,
                "cancelled",
            ))),
        }
    }

    fn select(&mut self, label: &str, items: &[String]) -> Result<Option<usize>, PromptError> {
        match self.next(label)? {
            Answer::Choose(i) if i < items.len() => Ok(Some(i)),
            Answer::Choose(i) => Err(PromptError::InvalidChoice(i)),
            Answer::Text(s) => items
                .iter()
                .position(|item| *item == s)
                .map(Some)
                .ok_or(PromptError::UnknownItem(s)),
            Answer::Cancel => Ok(None),
        }
    }
}

/// Ask for the fields of a new API and append it to the store.
pub fn save_api(prompter: &mut dyn Prompter, store: &ConfigStore, out: &mut dyn Write) -> Result<()> {
    let name = match prompter.prompt("🔖 API Name") {
        Ok(name) => name,
        Err(e) => {
            writeln!(out, "❌ Failed to read API name: {}", e)?;
            return Ok(());
        }
    };

    let url = match prompter.prompt("🌐 API URL") {
        Ok(url) => url,
        Err(e) => {
            writeln!(out, "❌ Failed to read URL: {}", e)?;
            return Ok(());
        }
    };

    let methods: Vec<String> = METHOD_CHOICES.iter().map(|m| m.to_string()).collect();
    let method = match prompter.select("📦 HTTP Method", &methods) {
        Ok(Some(i)) => match methods.get(i) {
            Some(method) => method.clone(),
            None => {
                writeln!(out, "❌ Failed to select method: {}", PromptError::InvalidChoice(i))?;
                return Ok(());
            }
        },
        Ok(None) => {
            writeln!(out, "❌ Failed to select method: cancelled")?;
            return Ok(());
        }
        Err(e) => {
            writeln!(out, "❌ Failed to select method: {}", e)?;
            return Ok(());
        }
    };

    // Token and body are optional: a failed prompt leaves them empty.
    let token = prompter
        .prompt("🔐 Auth Token (press enter to skip)")
        .unwrap_or_default();
    let body = prompter.prompt("🧾 Request Body (optional)").unwrap_or_default();

    let cfg = ApiConfig {
        name,
        url,
        method,
        token,
        body,
    };

    match store.save(cfg) {
        Ok(report) => {
            if report.discarded_corrupt {
                writeln!(
                    out,
                    "⚠️ Existing API file could not be parsed and was replaced."
                )?;
            }
            writeln!(out, "✅ API saved successfully!")?;
        }
        Err(e) => writeln!(out, "❌ Failed to save API: {}", e)?,
    }
    Ok(())
}

/// Print every saved API as a NAME/METHOD/URL table.
pub fn list_apis(store: &ConfigStore, out: &mut dyn Write) -> Result<()> {
    let apis = match store.load_all() {
        Ok(apis) => apis,
        Err(StoreError::Parse { .. }) => {
            writeln!(out, "❌ Failed to parse API file.")?;
            return Ok(());
        }
        Err(e) => {
            debug!(error = %e, "store not readable");
            writeln!(out, "❌ No saved APIs found.")?;
            return Ok(());
        }
    };

    if apis.is_empty() {
        writeln!(out, "🕳️ No APIs saved yet.")?;
        return Ok(());
    }

    writeln!(out, "📋 Saved APIs:")?;
    let mut rows = vec![["NAME", "METHOD", "URL"]];
    rows.extend(
        apis.iter()
            .map(|a| [a.name.as_str(), a.method.as_str(), a.url.as_str()]),
    );
    write!(out, "{}", format_table(&rows, 2))?;
    Ok(())
}

/// Align columns like a tab writer: every column but the last is padded
/// to its widest cell plus `padding` spaces.
pub fn format_table<const N: usize>(rows: &[[&str; N]], padding: usize) -> String {
    let mut widths = [0usize; N];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            out.push_str(cell);
            if i + 1 < N {
                let pad = widths[i] - cell.chars().count() + padding;
                out.extend(std::iter::repeat(' ').take(pad));
            }
        }
        out.push('\n');
    }
    out
}

/// Let the user pick one saved API. `Ok(None)` when the selection was
/// cancelled.
pub fn choose_api(
    prompter: &mut dyn Prompter,
    configs: &[ApiConfig],
) -> Result<Option<ApiConfig>, PromptError> {
    let items: Vec<String> = configs.iter().map(ApiConfig::label).collect();
    let choice = prompter.select("📚 Select API to test", &items)?;
    Ok(choice.and_then(|i| configs.get(i).cloned()))
}

/// Resolve the API to test (by name, or interactively) and replay it.
pub fn api_test(
    prompter: &mut dyn Prompter,
    store: &ConfigStore,
    client: &ApiClient,
    name: Option<&str>,
    out: &mut dyn Write,
) -> Result<()> {
    let cfg = match name {
        Some(name) => match store.load_by_name(name) {
            Ok(cfg) => {
                writeln!(out, "🧪 Testing saved API: {}", cfg.name)?;
                cfg
            }
            Err(e) => {
                writeln!(out, "❌ Failed to load API config: {}", e)?;
                return Ok(());
            }
        },
        None => {
            let all = match store.load_all() {
                Ok(all) => all,
                Err(e) => {
                    writeln!(out, "❌ Failed to load saved APIs: {}", e)?;
                    return Ok(());
                }
            };
            if all.is_empty() {
                writeln!(out, "⚠️ No saved APIs found. Use `saveapi` command first.")?;
                return Ok(());
            }
            match choose_api(prompter, &all) {
                Ok(Some(cfg)) => cfg,
                Ok(None) => {
                    writeln!(out, "❌ Selection error: cancelled")?;
                    return Ok(());
                }
                Err(e) => {
                    writeln!(out, "❌ Selection error: {}", e)?;
                    return Ok(());
                }
            }
        }
    };

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("{} {}", cfg.method, cfg.url));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = client.execute(&cfg);
    spinner.finish_and_clear();

    match result {
        Ok(resp) => write_response(&resp, out)?,
        Err(e @ RunError::Transport(_)) => writeln!(out, "❌ Request failed: {}", e)?,
        Err(e) => writeln!(out, "❌ Request creation failed: {}", e)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    fn seeded_store(dir: &tempfile::TempDir, configs: &[ApiConfig]) -> ConfigStore {
        let store = ConfigStore::new(dir.path().join("apis.json"));
        for c in configs {
            store.save(c.clone()).unwrap();
        }
        store
    }

    #[test]
    fn save_flow_appends_prompted_fields() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join(".chayan").join("apis.json"));
        let mut prompter = ScriptedPrompter::new([
            Answer::text("create user"),
            Answer::text("https://api.example.com/users"),
            Answer::Choose(1),
            Answer::text("tok"),
            Answer::text(r#"{"name":"ada"}"#),
        ]);
        let mut out = Vec::new();

        save_api(&mut prompter, &store, &mut out).unwrap();

        assert_eq!(output(out), "✅ API saved successfully!\n");
        let saved = store.load_all().unwrap();
        assert_eq!(
            saved,
            vec![ApiConfig {
                name: "create user".into(),
                url: "https://api.example.com/users".into(),
                method: "POST".into(),
                token: "tok".into(),
                body: r#"{"name":"ada"}"#.into(),
            }]
        );
        assert_eq!(prompter.asked()[2], "📦 HTTP Method");
    }

    #[test]
    fn save_flow_aborts_when_method_is_cancelled() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("apis.json"));
        let mut prompter =
            ScriptedPrompter::new([Answer::text("a"), Answer::text("http://x"), Answer::Cancel]);
        let mut out = Vec::new();

        save_api(&mut prompter, &store, &mut out).unwrap();

        assert_eq!(output(out), "❌ Failed to select method: cancelled\n");
        assert!(!store.path().exists());
    }

    // Answers every selection with the same index, in range or not.
    struct FixedChoice(usize);

    impl Prompter for FixedChoice {
        fn prompt(&mut self, label: &str) -> Result<String, PromptError> {
            Ok(label.to_string())
        }

        fn select(&mut self, _label: &str, _items: &[String]) -> Result<Option<usize>, PromptError> {
            Ok(Some(self.0))
        }
    }

    #[test]
    fn save_flow_rejects_out_of_range_method_choice() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("apis.json"));
        let mut out = Vec::new();

        save_api(&mut FixedChoice(METHOD_CHOICES.len()), &store, &mut out).unwrap();

        assert_eq!(
            output(out),
            "❌ Failed to select method: choice 4 is out of range\n"
        );
        assert!(!store.path().exists());
    }

    #[test]
    fn save_flow_keeps_empty_optional_fields() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("apis.json"));
        let mut prompter = ScriptedPrompter::new([
            Answer::text("health"),
            Answer::text("http://x/health"),
            Answer::text("GET"),
            Answer::Cancel,
        ]);
        let mut out = Vec::new();

        save_api(&mut prompter, &store, &mut out).unwrap();

        let saved = store.load_by_name("health").unwrap();
        assert_eq!(saved.method, "GET");
        assert_eq!(saved.token, "");
        assert_eq!(saved.body, "");
    }

    #[test]
    fn save_flow_reports_discarded_corrupt_store() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("apis.json"));
        std::fs::write(store.path(), "[{broken").unwrap();
        let mut prompter = ScriptedPrompter::new([
            Answer::text("a"),
            Answer::text("http://x"),
            Answer::Choose(0),
            Answer::text(""),
            Answer::text(""),
        ]);
        let mut out = Vec::new();

        save_api(&mut prompter, &store, &mut out).unwrap();

        let text = output(out);
        assert!(text.contains("could not be parsed"));
        assert!(text.ends_with("✅ API saved successfully!\n"));
        assert_eq!(store.load_all().unwrap().len(), 1);
    }

    #[test]
    fn list_prints_aligned_table() {
        let dir = tempdir().unwrap();
        let store = seeded_store(
            &dir,
            &[
                ApiConfig::new("users", "GET", "http://x/users"),
                ApiConfig::new("create-order", "POST", "http://x/orders"),
            ],
        );
        let mut out = Vec::new();

        list_apis(&store, &mut out).unwrap();

        assert_eq!(
            output(out),
            "📋 Saved APIs:\n\
             NAME          METHOD  URL\n\
             users         GET     http://x/users\n\
             create-order  POST    http://x/orders\n"
        );
    }

    #[test]
    fn list_reports_missing_corrupt_and_empty_store() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("apis.json"));

        let mut out = Vec::new();
        list_apis(&store, &mut out).unwrap();
        assert_eq!(output(out), "❌ No saved APIs found.\n");

        std::fs::write(store.path(), "nope").unwrap();
        let mut out = Vec::new();
        list_apis(&store, &mut out).unwrap();
        assert_eq!(output(out), "❌ Failed to parse API file.\n");

        std::fs::write(store.path(), "[]").unwrap();
        let mut out = Vec::new();
        list_apis(&store, &mut out).unwrap();
        assert_eq!(output(out), "🕳️ No APIs saved yet.\n");
    }

    #[test]
    fn choose_api_maps_index_to_record() {
        let configs = vec![
            ApiConfig::new("a", "GET", "http://x/a"),
            ApiConfig::new("b", "DELETE", "http://x/b"),
        ];
        let mut prompter = ScriptedPrompter::new([Answer::text("b (DELETE http://x/b)")]);
        assert_eq!(choose_api(&mut prompter, &configs).unwrap(), Some(configs[1].clone()));

        let mut prompter = ScriptedPrompter::new([Answer::Cancel]);
        assert_eq!(choose_api(&mut prompter, &configs).unwrap(), None);
    }

    #[test]
    fn api_test_with_unknown_name_prints_error() {
        let dir = tempdir().unwrap();
        let store = seeded_store(&dir, &[ApiConfig::new("a", "GET", "http://x")]);
        let mut prompter = ScriptedPrompter::default();
        let mut out = Vec::new();

        api_test(&mut prompter, &store, &ApiClient::new().unwrap(), Some("zzz"), &mut out).unwrap();

        assert_eq!(
            output(out),
            "❌ Failed to load API config: API with name \"zzz\" not found\n"
        );
        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn api_test_on_empty_store_asks_nothing() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("apis.json"));
        std::fs::write(store.path(), "[]").unwrap();
        let mut prompter = ScriptedPrompter::default();
        let mut out = Vec::new();

        api_test(&mut prompter, &store, &ApiClient::new().unwrap(), None, &mut out).unwrap();

        assert!(output(out).starts_with("⚠️ No saved APIs found."));
        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn api_test_cancelled_selection_sends_nothing() {
        let mut server = mockito::Server::new();
        let mock = server.mock("GET", "/a").expect(0).create();
        let dir = tempdir().unwrap();
        let store = seeded_store(&dir, &[ApiConfig::new("a", "GET", format!("{}/a", server.url()))]);
        let mut prompter = ScriptedPrompter::new([Answer::Cancel]);
        let mut out = Vec::new();

        api_test(&mut prompter, &store, &ApiClient::new().unwrap(), None, &mut out).unwrap();

        assert_eq!(output(out), "❌ Selection error: cancelled\n");
        mock.assert();
    }

    #[test]
    fn api_test_runs_selected_entry() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/b")
            .with_status(201)
            .with_body(r#"{"id":7}"#)
            .create();
        let dir = tempdir().unwrap();
        let store = seeded_store(
            &dir,
            &[
                ApiConfig::new("a", "GET", format!("{}/a", server.url())),
                ApiConfig::new("b", "POST", format!("{}/b", server.url())),
            ],
        );
        let mut prompter = ScriptedPrompter::new([Answer::Choose(1)]);
        let mut out = Vec::new();

        api_test(&mut prompter, &store, &ApiClient::new().unwrap(), None, &mut out).unwrap();

        mock.assert();
        let text = output(out);
        assert!(text.contains("📡 Status: 201 Created"));
        assert!(text.contains("{\n  \"id\": 7\n}"));
    }

    #[test]
    fn api_test_by_name_reports_bad_method() {
        let dir = tempdir().unwrap();
        let store = seeded_store(&dir, &[ApiConfig::new("odd", "NOT VALID", "http://x")]);
        let mut out = Vec::new();

        api_test(
            &mut ScriptedPrompter::default(),
            &store,
            &ApiClient::new().unwrap(),
            Some("odd"),
            &mut out,
        )
        .unwrap();

        let text = output(out);
        assert!(text.starts_with("🧪 Testing saved API: odd\n"));
        assert!(text.contains("❌ Request creation failed: invalid HTTP method"));
    }

    #[test]
    fn table_pads_by_character_count() {
        let rows = [["ñame", "x"], ["n", "y"]];
        assert_eq!(format_table(&rows, 2), "ñame  x\nn     y\n");
    }
}
