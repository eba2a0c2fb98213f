use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono_tz::Tz;
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::filter::TaskFilter;
use crate::view::Theme;

const RC_ENV_VAR: &str = "TASKPADRC";
const RC_FILE_NAME: &str = ".taskpadrc";

const DEFAULTS: [(&str, &str); 5] = [
  ("color", "on"),
  ("theme", "light"),
  ("default.filter", "all"),
  ("confirm", "on"),
  ("timezone", "UTC")
];

/// Flat `key = value` settings from the
/// rc file plus command-line overrides.
#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub source: Option<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    Self {
      map: DEFAULTS
        .iter()
        .map(|(k, v)| {
          (k.to_string(), v.to_string())
        })
        .collect(),
      source: None
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    match rc_location(rc_override) {
      | RcLocation::File(path) => {
        info!(rc = %path.display(), "loading taskpadrc");
        cfg.read_rc(&path)?;
      }
      | RcLocation::Disabled => {
        debug!("taskpadrc disabled");
      }
      | RcLocation::Missing => {
        debug!(
          "no taskpadrc found; using \
           defaults"
        );
      }
    }

    Ok(cfg)
  }

  /// `rc.`-prefixed and bare keys are
  /// both accepted; later pairs win.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  pub fn theme(
    &self
  ) -> anyhow::Result<Theme> {
    self
      .get("theme")
      .unwrap_or_default()
      .parse()
      .context("bad `theme` setting")
  }

  pub fn default_filter(
    &self
  ) -> anyhow::Result<TaskFilter> {
    self
      .get("default.filter")
      .unwrap_or_default()
      .parse()
      .context(
        "bad `default.filter` setting"
      )
  }

  /// IANA zone that decides which
  /// calendar day "today" is.
  pub fn timezone(
    &self
  ) -> anyhow::Result<Tz> {
    let raw = self
      .get("timezone")
      .unwrap_or_default();
    raw.trim().parse::<Tz>().map_err(
      |err| {
        anyhow!(
          "bad `timezone` setting \
           {raw:?}: {err}"
        )
      }
    )
  }

  #[tracing::instrument(skip(self))]
  fn read_rc(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text = fs::read_to_string(&path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;

    for (idx, raw_line) in
      text.lines().enumerate()
    {
      let line = strip_comment(raw_line);
      if line.is_empty() {
        continue;
      }

      let Some((k, v)) =
        line.split_once('=')
      else {
        return Err(anyhow!(
          "invalid config line {}:{}: \
           {raw_line}",
          path.display(),
          idx + 1
        ));
      };

      let key = k.trim();
      let value = v.trim();
      if !DEFAULTS
        .iter()
        .any(|(known, _)| *known == key)
      {
        warn!(key, "unknown taskpadrc key");
      }
      trace!(key, value, "loaded config key");
      self
        .map
        .insert(key.to_string(), value.to_string());
    }

    self.source = Some(path);
    Ok(())
  }
}

enum RcLocation {
  File(PathBuf),
  Disabled,
  Missing
}

/// `--taskpadrc`, then `$TASKPADRC`
/// (`/dev/null` turns the file off),
/// then `~/.taskpadrc` if it exists.
fn rc_location(
  override_path: Option<&Path>
) -> RcLocation {
  if let Some(path) = override_path {
    return RcLocation::File(
      path.to_path_buf()
    );
  }

  match std::env::var(RC_ENV_VAR) {
    | Ok(raw) if raw == "/dev/null" => {
      return RcLocation::Disabled;
    }
    | Ok(raw) if !raw.trim().is_empty() => {
      return RcLocation::File(
        PathBuf::from(raw)
      );
    }
    | _ => {}
  }

  dirs::home_dir()
    .map(|home| home.join(RC_FILE_NAME))
    .filter(|candidate| candidate.exists())
    .map_or(
      RcLocation::Missing,
      RcLocation::File
    )
}

fn strip_comment(line: &str) -> &str {
  line
    .split_once('#')
    .map_or(line, |(before, _)| before)
    .trim()
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}
