use serde::Serialize;
use spine_auto_run::args::{Args, Mode};
use spine_auto_run::automation::{
    AutomationContext, AutomationResult, NodeStateDetector, TraversalController, TraversalState,
};
use spine_auto_run::config::AutomationConfig;
use spine_auto_run::device::{Capture, Frame, RecordingDispatcher, ReplayCapture, StaticWindow};
use spine_auto_run::template_matching::debug::save_debug_match;
use spine_auto_run::template_matching::{MatchConfig, TemplateMatcher};
use spine_auto_run::templates::{Template, TemplateStore, quality};
use std::path::Path;

fn main() {
    let args = match Args::parse() {
        Ok(Some(args)) => args,
        Ok(None) => return,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(2);
        }
    };

    let default_level = if args.debug_mode { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            log::error!("❌ {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the mode succeeded
fn run(args: &Args) -> AutomationResult<bool> {
    match &args.mode {
        Mode::InitConfig => init_config(&args.config_path),
        Mode::Match { template } => match_template(load_config(args)?, template, args),
        Mode::Detect => detect(load_config(args)?, args),
        Mode::Analyze { template } => analyze(&load_config(args)?, template.as_deref()),
        Mode::CheckTemplates => check_templates(load_config(args)?),
        Mode::DryRun => dry_run(load_config(args)?, args),
    }
}

fn load_config(args: &Args) -> AutomationResult<AutomationConfig> {
    let mut config = AutomationConfig::load(&args.config_path)?;
    if let Some(dir) = &args.templates_dir {
        config.templates_dir = dir.clone();
    }
    Ok(config)
}

fn init_config(path: &Path) -> AutomationResult<bool> {
    if path.exists() {
        log::warn!("⚠️ {:?} already exists, not overwriting", path);
        return Ok(false);
    }
    AutomationConfig::default().save(path)?;
    println!("✅ Default config written to {}", path.display());
    Ok(true)
}

fn load_frame(path: &Path) -> AutomationResult<Frame> {
    Ok(ReplayCapture::from_files(vec![path.to_path_buf()]).take(None)?)
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => log::warn!("⚠️ Failed to serialize output: {}", e),
    }
}

fn match_template(config: AutomationConfig, path: &Path, args: &Args) -> AutomationResult<bool> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let template = Template::from_file(path, None, config.base_confidence_for(name))?;
    let frame = load_frame(&args.screenshots[0])?;
    let matcher = TemplateMatcher::new(MatchConfig::from_automation(&config));

    match matcher.find(&frame, &template) {
        Some(result) => {
            println!("🎯 {}", result.describe(&template.name));
            print_json(&result);
            if args.save_debug_image
                && let Err(e) = save_debug_match(&frame, &template, &result, Path::new("."))
            {
                log::warn!("⚠️ Failed to save match visualization: {}", e);
            }
            Ok(true)
        }
        None => {
            let best = matcher
                .best_candidate(&frame, &template)
                .map(|c| c.confidence)
                .unwrap_or(0.0);
            println!(
                "👀 '{}' not found (best {:.3}, threshold {:.3})",
                template.name,
                best,
                matcher.threshold_for(&template, template.base_confidence)
            );
            Ok(false)
        }
    }
}

fn detect(config: AutomationConfig, args: &Args) -> AutomationResult<bool> {
    let context = AutomationContext::load(config)?;
    let frame = load_frame(&args.screenshots[0])?;
    let detection = NodeStateDetector::new(&context).detect(&frame);
    print_json(&detection);
    Ok(!detection.is_unknown())
}

fn analyze(config: &AutomationConfig, template: Option<&Path>) -> AutomationResult<bool> {
    let reports = match template {
        Some(path) => vec![quality::analyze(&Template::from_file(path, None, 0.0)?)],
        None => {
            let store = TemplateStore::load(config)?;
            store
                .names()
                .filter_map(|name| store.get(name))
                .map(quality::analyze)
                .collect()
        }
    };

    for report in &reports {
        println!(
            "🔬 {} ({}x{}): {} / 100, {:?}",
            report.name, report.width, report.height, report.score, report.level
        );
        for recommendation in &report.recommendations {
            println!("    - {recommendation}");
        }
        let adjustment = report.suggested_confidence_adjustment();
        if adjustment != 0.0 {
            println!("    suggested confidence adjustment: {adjustment:+.2}");
        }
        if report.suggests_wider_scale_range() {
            println!("    small template: consider a wider scale_range");
        }
    }
    Ok(true)
}

fn check_templates(config: AutomationConfig) -> AutomationResult<bool> {
    let context = AutomationContext::load(config)?;
    context.check_required_templates()?;

    let optional = context
        .config
        .chain_steps
        .iter()
        .filter(|step| step.optional)
        .map(|step| step.template.as_str())
        .chain([spine_auto_run::templates::NODE_OPEN])
        .chain(context.config.child_templates.iter().map(String::as_str));
    for name in context.templates.missing(optional) {
        log::warn!(
            "⚠️ Optional template '{}' missing ({:?})",
            name,
            context.templates.path_for(&name)
        );
    }

    println!(
        "✅ All required templates present in {}",
        context.templates.dir().display()
    );
    Ok(true)
}

fn dry_run(mut config: AutomationConfig, args: &Args) -> AutomationResult<bool> {
    let title = config
        .window_titles
        .first()
        .cloned()
        .unwrap_or_else(|| "Spine".to_string());
    // Replayed frames are static; no pacing
    config.click_delay = 0.0;
    config.operation_delay = 0.0;
    config.menu_delay = 0.0;
    let context = AutomationContext::load(config)?;

    let capture = ReplayCapture::from_files(args.screenshots.clone());
    let window = StaticWindow::new(&title, Some(capture.bounds()?));
    let mut controller =
        TraversalController::new(&context, capture, RecordingDispatcher::new(), window);
    let report = controller.run();

    for action in controller.input().actions() {
        println!("🖱️ {action:?}");
    }
    print_json(&report);
    Ok(report.final_state == TraversalState::Done && report.success)
}
