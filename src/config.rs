use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyModifiers};
use serde::Deserialize;
use tokio::fs;

use crate::browser::{Input, ModeKind};
use crate::error::{Error, Result};
use crate::remote::DEFAULT_TIMEOUT;

/// `~/.s3nav`, home of the config file and the log
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| Error::config("Cannot determine home directory"))?;
    Ok(home.join(".s3nav"))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    keybindings: HashMap<String, OneOrMany>,

    /// Deadline for every remote call, in seconds
    #[serde(default)]
    timeout_secs: Option<u64>,

    /// Editor command line, overriding `$VISUAL` / `$EDITOR`
    #[serde(default)]
    editor: Option<String>,
}

impl ConfigFile {
    /// Missing file is `None`; a malformed one is an error.
    pub async fn load() -> Result<Option<Self>> {
        Self::load_from(&config_dir()?.join("config.json")).await
    }

    /// Only a missing file counts as "no config"; unreadable is an error.
    pub async fn load_from(path: &Path) -> Result<Option<Self>> {
        let content = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                tracing::error!("Cannot read config {}: {}", path.display(), e);
                return Err(e.into());
            }
        };
        let cfg = Self::parse(&content)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(Some(cfg))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let cfg = serde_json::from_str::<Self>(content)?;
        if cfg.timeout_secs == Some(0) {
            return Err(Error::config("timeout_secs must be positive"));
        }
        Ok(cfg)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn editor(&self) -> Option<&str> {
        self.editor.as_deref()
    }

    pub fn key_bindings(&self) -> KeyBindings {
        let mut kb = KeyBindings::default();
        kb.apply_overrides(&self.keybindings);
        kb
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    const fn ctrl(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
        }
    }
}

impl fmt::Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            write!(f, "C-")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            write!(f, "M-")?;
        }
        match self.code {
            KeyCode::Char(' ') => write!(f, "Space"),
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Enter => write!(f, "Enter"),
            KeyCode::Esc => write!(f, "Esc"),
            KeyCode::Tab => write!(f, "Tab"),
            KeyCode::Backspace => write!(f, "Backspace"),
            KeyCode::Up => write!(f, "Up"),
            KeyCode::Down => write!(f, "Down"),
            KeyCode::Left => write!(f, "Left"),
            KeyCode::Right => write!(f, "Right"),
            KeyCode::PageUp => write!(f, "PageUp"),
            KeyCode::PageDown => write!(f, "PageDown"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Status-line hints, in display order
const HINTED: [(Input, &str); 9] = [
    (Input::Activate, "select"),
    (Input::Back, "back"),
    (Input::Reload, "reload"),
    (Input::Menu, "menu"),
    (Input::Detail, "detail"),
    (Input::Download, "download"),
    (Input::Open, "open"),
    (Input::Edit, "edit"),
    (Input::Quit, "quit"),
];

/// Config-file names of each input
const ACTION_NAMES: [(&str, Input); 12] = [
    ("quit", Input::Quit),
    ("up", Input::Up),
    ("down", Input::Down),
    ("select", Input::Activate),
    ("back", Input::Back),
    ("reload", Input::Reload),
    ("menu", Input::Menu),
    ("detail", Input::Detail),
    ("download", Input::Download),
    ("open", Input::Open),
    ("edit", Input::Edit),
    ("cancel", Input::Cancel),
];

/// Lookup order per mode; earlier inputs win when keys overlap
fn mode_inputs(mode: ModeKind) -> &'static [Input] {
    match mode {
        ModeKind::List => &[
            Input::Quit,
            Input::Down,
            Input::Up,
            Input::Activate,
            Input::Back,
            Input::Reload,
            Input::Menu,
            Input::Detail,
            Input::Download,
            Input::Open,
            Input::Edit,
        ],
        ModeKind::Menu => &[Input::Cancel, Input::Quit, Input::Down, Input::Up, Input::Activate],
        ModeKind::Detail => &[Input::Cancel, Input::Quit, Input::Down, Input::Up],
    }
}

#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: HashMap<Input, Vec<KeySpec>>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut kb = Self {
            bindings: HashMap::new(),
        };

        kb.bindings.insert(
            Input::Quit,
            vec![
                KeySpec::plain(KeyCode::Char('q')),
                KeySpec::plain(KeyCode::Esc),
                KeySpec::ctrl('c'),
            ],
        );
        kb.bindings.insert(
            Input::Cancel,
            vec![
                KeySpec::plain(KeyCode::Char('q')),
                KeySpec::plain(KeyCode::Esc),
            ],
        );
        kb.bindings.insert(
            Input::Down,
            vec![
                KeySpec::plain(KeyCode::Down),
                KeySpec::plain(KeyCode::Char('j')),
                KeySpec::ctrl('n'),
            ],
        );
        kb.bindings.insert(
            Input::Up,
            vec![
                KeySpec::plain(KeyCode::Up),
                KeySpec::plain(KeyCode::Char('k')),
                KeySpec::ctrl('p'),
            ],
        );
        kb.bindings.insert(
            Input::Activate,
            vec![
                KeySpec::plain(KeyCode::Enter),
                KeySpec::plain(KeyCode::Right),
                KeySpec::plain(KeyCode::Char('l')),
            ],
        );
        kb.bindings.insert(
            Input::Back,
            vec![
                KeySpec::plain(KeyCode::Left),
                KeySpec::plain(KeyCode::Char('h')),
            ],
        );
        kb.bindings
            .insert(Input::Reload, vec![KeySpec::plain(KeyCode::Char('r'))]);
        kb.bindings
            .insert(Input::Menu, vec![KeySpec::plain(KeyCode::Char('m'))]);
        kb.bindings
            .insert(Input::Detail, vec![KeySpec::plain(KeyCode::Char('d'))]);
        kb.bindings
            .insert(Input::Download, vec![KeySpec::plain(KeyCode::Char('w'))]);
        kb.bindings
            .insert(Input::Open, vec![KeySpec::plain(KeyCode::Char('o'))]);
        kb.bindings
            .insert(Input::Edit, vec![KeySpec::plain(KeyCode::Char('e'))]);

        kb
    }
}

impl KeyBindings {
    fn apply_overrides(&mut self, overrides: &HashMap<String, OneOrMany>) {
        for (action, spec) in overrides {
            let Some(&(_, input)) = ACTION_NAMES.iter().find(|(name, _)| *name == action.as_str()) else {
                tracing::warn!("Unknown keybinding action: {}", action);
                continue;
            };
            let parsed: Vec<KeySpec> = spec
                .clone()
                .into_vec()
                .iter()
                .filter_map(|s| parse_key_spec(s))
                .collect();
            if !parsed.is_empty() {
                self.bindings.insert(input, parsed);
            }
        }
    }

    pub fn matches(&self, input: Input, code: &KeyCode, modifiers: KeyModifiers) -> bool {
        // Terminals report SHIFT alongside uppercase characters
        let modifiers = match code {
            KeyCode::Char(_) => modifiers.difference(KeyModifiers::SHIFT),
            _ => modifiers,
        };
        self.bindings
            .get(&input)
            .is_some_and(|v| v.iter().any(|k| &k.code == code && k.modifiers == modifiers))
    }

    /// First bound key of each hinted input, for the status line.
    pub fn hints(&self) -> Vec<(String, &'static str)> {
        HINTED
            .iter()
            .filter_map(|&(input, label)| {
                let key = self.bindings.get(&input)?.first()?;
                Some((key.to_string(), label))
            })
            .collect()
    }

    /// Input bound to this key in `mode`, if any.
    pub fn resolve(&self, mode: ModeKind, code: KeyCode, modifiers: KeyModifiers) -> Option<Input> {
        mode_inputs(mode)
            .iter()
            .copied()
            .find(|&input| self.matches(input, &code, modifiers))
    }
}

fn parse_key_spec(s: &str) -> Option<KeySpec> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let mut modifiers = KeyModifiers::NONE;
    let parts: Vec<&str> = s.split('+').map(|p| p.trim()).collect();
    let (mods, key_part) = if parts.len() >= 2 {
        (&parts[..parts.len() - 1], parts[parts.len() - 1])
    } else {
        (&[][..], parts[0])
    };

    for m in mods {
        match m.to_lowercase().as_str() {
            "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
            "alt" => modifiers |= KeyModifiers::ALT,
            _ => return None,
        }
    }

    let lower = key_part.to_lowercase();

    let code = match lower.as_str() {
        "enter" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "space" => KeyCode::Char(' '),
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        _ => {
            // Single-character fallback (keeps case for e.g. "R")
            if key_part.chars().count() == 1 {
                KeyCode::Char(key_part.chars().next()?)
            } else {
                return None;
            }
        }
    };

    Some(KeySpec { code, modifiers })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_spec() {
        assert_eq!(
            parse_key_spec("ctrl+n"),
            Some(KeySpec {
                code: KeyCode::Char('n'),
                modifiers: KeyModifiers::CONTROL,
            })
        );
        assert_eq!(parse_key_spec("Enter"), Some(KeySpec::plain(KeyCode::Enter)));
        assert_eq!(parse_key_spec("R"), Some(KeySpec::plain(KeyCode::Char('R'))));
        assert_eq!(parse_key_spec("hyper+x"), None);
        assert_eq!(parse_key_spec("banana"), None);
    }

    #[test]
    fn test_q_depends_on_mode() {
        let kb = KeyBindings::default();
        let q = KeyCode::Char('q');
        assert_eq!(kb.resolve(ModeKind::List, q, KeyModifiers::NONE), Some(Input::Quit));
        assert_eq!(kb.resolve(ModeKind::Menu, q, KeyModifiers::NONE), Some(Input::Cancel));
        assert_eq!(kb.resolve(ModeKind::Detail, q, KeyModifiers::NONE), Some(Input::Cancel));
        assert_eq!(
            kb.resolve(ModeKind::Menu, KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(Input::Quit)
        );
    }

    #[test]
    fn test_list_keys() {
        let kb = KeyBindings::default();
        let none = KeyModifiers::NONE;
        assert_eq!(kb.resolve(ModeKind::List, KeyCode::Char('j'), none), Some(Input::Down));
        assert_eq!(
            kb.resolve(ModeKind::List, KeyCode::Char('p'), KeyModifiers::CONTROL),
            Some(Input::Up)
        );
        assert_eq!(kb.resolve(ModeKind::List, KeyCode::Right, none), Some(Input::Activate));
        assert_eq!(kb.resolve(ModeKind::List, KeyCode::Char('w'), none), Some(Input::Download));
        assert_eq!(kb.resolve(ModeKind::List, KeyCode::Char('z'), none), None);
        // Action keys mean nothing inside the menu
        assert_eq!(kb.resolve(ModeKind::Menu, KeyCode::Char('w'), none), None);
    }

    #[test]
    fn test_config_overrides() {
        let cfg = ConfigFile::parse(
            r#"{"keybindings": {"download": ["ctrl+d", "D"], "bogus": "x"}, "timeout_secs": 5, "editor": "nano"}"#,
        )
        .unwrap();
        assert_eq!(cfg.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.editor(), Some("nano"));

        let kb = cfg.key_bindings();
        assert_eq!(
            kb.resolve(ModeKind::List, KeyCode::Char('d'), KeyModifiers::CONTROL),
            Some(Input::Download)
        );
        assert_eq!(
            kb.resolve(ModeKind::List, KeyCode::Char('D'), KeyModifiers::SHIFT),
            Some(Input::Download)
        );
        assert_eq!(
            kb.resolve(ModeKind::List, KeyCode::Char('w'), KeyModifiers::NONE),
            None
        );
    }

    #[test]
    fn test_hints_follow_overrides() {
        let hints = KeyBindings::default().hints();
        assert_eq!(hints[0], ("Enter".to_string(), "select"));
        assert!(hints.contains(&("w".to_string(), "download")));
        assert!(hints.contains(&("q".to_string(), "quit")));

        let cfg = ConfigFile::parse(r#"{"keybindings": {"download": "ctrl+d", "back": "Backspace"}}"#)
            .unwrap();
        let hints = cfg.key_bindings().hints();
        assert!(hints.contains(&("C-d".to_string(), "download")));
        assert!(hints.contains(&("Backspace".to_string(), "back")));
        assert!(!hints.contains(&("w".to_string(), "download")));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ConfigFile::load_from(&dir.path().join("config.json"))
            .await
            .unwrap();
        assert!(cfg.is_none());
    }

    #[tokio::test]
    async fn test_load_unreadable_file_is_error() {
        let dir = tempfile::tempdir().unwrap();

        // A directory in place of the file
        let as_dir = dir.path().join("config.json");
        std::fs::create_dir(&as_dir).unwrap();
        assert!(matches!(ConfigFile::load_from(&as_dir).await, Err(Error::Io(_))));

        let not_utf8 = dir.path().join("binary.json");
        std::fs::write(&not_utf8, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(ConfigFile::load_from(&not_utf8).await, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_load_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"timeout_secs": 3}"#).unwrap();
        let cfg = ConfigFile::load_from(&path).await.unwrap().unwrap();
        assert_eq!(cfg.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_config_defaults_and_errors() {
        let cfg = ConfigFile::parse("{}").unwrap();
        assert_eq!(cfg.timeout(), DEFAULT_TIMEOUT);
        assert!(cfg.editor().is_none());

        assert!(matches!(
            ConfigFile::parse(r#"{"timeout_secs": 0}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(ConfigFile::parse("{"), Err(Error::Json(_))));
    }
}
