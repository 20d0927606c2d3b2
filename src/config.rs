use anyhow::{ensure, Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "aquasim")]
#[command(about = "Terminal aquarium: fish swim back and forth in a tank", long_about = None)]
pub(crate) struct Args {
    /// Tank width in tank units (non-positive falls back to 640)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) width: Option<i32>,

    /// Tank height in tank units (non-positive falls back to 480)
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) height: Option<i32>,

    /// Number of fish to put in the tank
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub(crate) fish: Option<u32>,

    /// Number of simulation steps to run
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub(crate) steps: Option<u32>,

    /// Milliseconds between steps
    #[arg(long)]
    pub(crate) step_ms: Option<u64>,

    /// RNG seed; without it one is taken from the clock
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// Draw fish in white only
    #[arg(long, default_value_t = false)]
    pub(crate) no_color: bool,

    /// Start swimming without waiting for Space
    #[arg(long, default_value_t = false)]
    pub(crate) autostart: bool,

    /// Print fish positions as text instead of drawing the tank
    #[arg(long, default_value_t = false)]
    pub(crate) headless: bool,

    /// Write the merged settings back to the settings file
    #[arg(long, default_value_t = false)]
    pub(crate) save_config: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) tank_width: i32,
    pub(crate) tank_height: i32,
    pub(crate) fish_count: u32,
    pub(crate) steps: u32,
    pub(crate) step_ms: u64,
    pub(crate) seed: Option<u64>,
    pub(crate) enable_color: bool,
    pub(crate) autostart: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tank_width: 600,
            tank_height: 480,
            fish_count: 8,
            steps: 60,
            step_ms: 400,
            seed: None,
            enable_color: true,
            autostart: false,
        }
    }
}

impl Settings {
    /// Command-line values win over the file.
    pub(crate) fn apply_args(&mut self, args: &Args) {
        if let Some(w) = args.width {
            self.tank_width = w;
        }
        if let Some(h) = args.height {
            self.tank_height = h;
        }
        if let Some(n) = args.fish {
            self.fish_count = n;
        }
        if let Some(n) = args.steps {
            self.steps = n;
        }
        if let Some(ms) = args.step_ms {
            self.step_ms = ms;
        }
        if args.seed.is_some() {
            self.seed = args.seed;
        }
        if args.no_color {
            self.enable_color = false;
        }
        if args.autostart {
            self.autostart = true;
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(self.fish_count > 0, "fish count must be at least 1");
        ensure!(self.steps > 0, "step count must be at least 1");
        ensure!(self.step_ms > 0, "step interval must be at least 1 ms");
        Ok(())
    }
}

pub(crate) struct Paths {
    pub(crate) settings_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "aquasim", "Aquasim")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(Paths {
        settings_path: dir.join("settings.json"),
        log_path: dir.join("aquasim.log"),
    })
}

/// Missing or unreadable settings fall back to defaults.
pub(crate) fn load_settings(path: &Path) -> Settings {
    if let Ok(s) = fs::read_to_string(path) {
        match serde_json::from_str::<Settings>(&s) {
            Ok(v) => return v,
            Err(e) => log::warn!("ignoring {}: {e}", path.display()),
        }
    }
    Settings::default()
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // rename over an existing file fails on Windows
    if to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to).with_context(|| format!("renaming to {}", to.display()))?;
    Ok(())
}
