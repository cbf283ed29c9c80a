use std::path::PathBuf;

pub const DEFAULT_CONFIG: &str = "config.json";

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// Match one template against a screenshot
    Match { template: PathBuf },
    /// Classify the parent node in a screenshot
    Detect,
    /// Score one template, or every template in the directory
    Analyze { template: Option<PathBuf> },
    /// Report required templates that are missing
    CheckTemplates,
    /// Write the default configuration file
    InitConfig,
    /// Run the whole traversal against recorded screenshots
    DryRun,
}

#[derive(Debug, PartialEq)]
pub struct Args {
    pub mode: Mode,
    pub config_path: PathBuf,
    pub templates_dir: Option<PathBuf>,
    pub screenshots: Vec<PathBuf>,
    pub debug_mode: bool,
    pub save_debug_image: bool,
}

impl Args {
    /// Parse the process arguments. `Ok(None)` when help or version was printed.
    pub fn parse() -> Result<Option<Self>, String> {
        Self::parse_from(std::env::args().skip(1))
    }

    pub fn parse_from(args: impl IntoIterator<Item = String>) -> Result<Option<Self>, String> {
        let mut mode: Option<Mode> = None;
        let mut config_path = PathBuf::from(DEFAULT_CONFIG);
        let mut templates_dir: Option<PathBuf> = None;
        let mut screenshots: Vec<PathBuf> = Vec::new();
        let mut debug_mode: bool = false;
        let mut save_debug_image: bool = false;

        for arg in args {
            if arg == "--help" || arg == "-h" {
                print_help();
                return Ok(None);
            } else if arg == "--version" || arg == "-v" {
                println!(
                    "Spine Auto Run v{} (built {})",
                    env!("APP_VERSION_DISPLAY"),
                    env!("APP_BUILD_YEAR")
                );
                return Ok(None);
            } else if arg == "--debug" {
                debug_mode = true;
            } else if arg == "--save-debug-image" {
                save_debug_image = true;
            } else if let Some(path) = arg.strip_prefix("--match=") {
                mode = Some(Mode::Match {
                    template: PathBuf::from(path),
                });
            } else if arg == "--detect" {
                mode = Some(Mode::Detect);
            } else if arg == "--analyze" {
                mode = Some(Mode::Analyze { template: None });
            } else if let Some(path) = arg.strip_prefix("--analyze=") {
                mode = Some(Mode::Analyze {
                    template: Some(PathBuf::from(path)),
                });
            } else if arg == "--check-templates" {
                mode = Some(Mode::CheckTemplates);
            } else if arg == "--init-config" {
                mode = Some(Mode::InitConfig);
            } else if arg == "--dry-run" {
                mode = Some(Mode::DryRun);
            } else if let Some(path) = arg.strip_prefix("--config=") {
                config_path = PathBuf::from(path);
            } else if let Some(dir) = arg.strip_prefix("--templates=") {
                templates_dir = Some(PathBuf::from(dir));
            } else if arg.starts_with('-') {
                print_help();
                return Err(format!("Unknown argument: {arg}"));
            } else {
                screenshots.push(PathBuf::from(arg));
            }
        }

        let mode = mode.unwrap_or(Mode::CheckTemplates);
        let needs_screenshot = matches!(mode, Mode::Match { .. } | Mode::Detect | Mode::DryRun);
        if needs_screenshot && screenshots.is_empty() {
            return Err(format!("{mode:?} needs at least one screenshot path"));
        }

        Ok(Some(Args {
            mode,
            config_path,
            templates_dir,
            screenshots,
            debug_mode,
            save_debug_image,
        }))
    }
}

fn print_help() {
    println!("🦴 Spine Auto Run");
    println!();
    println!("USAGE:");
    println!("    spine-auto-run [FLAGS] [SCREENSHOT.png...]");
    println!();
    println!("MODES:");
    println!("    --check-templates       List required templates that are missing (default)");
    println!("    --match=<template.png>  Find a template in the screenshot");
    println!("    --detect                Classify the parent node in the screenshot");
    println!("    --analyze[=<file.png>]  Score template quality (all templates if no file)");
    println!("    --dry-run               Run the traversal against recorded screenshots");
    println!("    --init-config           Write the default config file");
    println!();
    println!("FLAGS:");
    println!("    --config=<path>         Config file (default: {DEFAULT_CONFIG})");
    println!("    --templates=<dir>       Override the template directory");
    println!("    --save-debug-image      Save the match visualization (with --match)");
    println!("    --debug                 Enable debug logging");
    println!("    --help, -h              Show this help message");
    println!("    --version, -v           Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    spine-auto-run --init-config");
    println!("    spine-auto-run --match=templates/grid_edit.png shot.png --save-debug-image");
    println!("    spine-auto-run --dry-run shot-01.png shot-02.png shot-03.png");
}
