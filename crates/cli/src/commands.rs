//! Command handlers.
//!
//! Each handler writes its result to `out`; diagnostics go through
//! `tracing`. Domain errors propagate unchanged so the binary can print them.

use std::io::Write;
use std::path::Path;

use anyhow::Context as _;
use featuregate_core::{AssociationChange, RenderContext, Template};
use featuregate_domain::{FeaturableKey, Feature, FeatureState};
use featuregate_infra::scan_directory;

use crate::cli::Command;
use crate::context::AppContext;

/// Run one command against the application context.
///
/// # Errors
/// Whatever the manager, scanner or template layer reports, plus output
/// write failures.
pub async fn execute(command: Command, ctx: &AppContext, out: &mut dyn Write) -> anyhow::Result<()> {
    let manager = &ctx.manager;

    match command {
        Command::Add { feature, state } => {
            let initial = Feature::with_state(feature.as_str(), state.as_deref());
            manager.add(&feature, Some(initial.is_enabled())).await?;
            writeln!(out, "Feature `{feature}` has been added")?;
        }
        Command::Remove { feature } => {
            manager.remove(&feature).await?;
            writeln!(out, "Feature `{feature}` has been removed")?;
        }
        Command::Enable { feature } => {
            manager.enable(&feature).await?;
            writeln!(out, "Feature `{feature}` has been turned on")?;
        }
        Command::Disable { feature } => {
            manager.disable(&feature).await?;
            writeln!(out, "Feature `{feature}` has been turned off")?;
        }
        Command::Status { feature, featurable } => {
            let enabled = match &featurable {
                Some(key) => manager.is_enabled_for(&feature, key).await?,
                None => manager.is_enabled(&feature).await?,
            };
            writeln!(out, "{}", FeatureState::from(enabled))?;
        }
        Command::EnableFor { feature, featurable } => {
            let change = manager.enable_for(&feature, &featurable).await?;
            write_association(out, &feature, &featurable, change)?;
        }
        Command::DisableFor { feature, featurable } => {
            let change = manager.disable_for(&feature, &featurable).await?;
            write_association(out, &feature, &featurable, change)?;
        }
        Command::List { featurable, json } => {
            let features = match &featurable {
                Some(key) => manager.features_for(key).await?,
                None => manager.list().await?,
            };
            if json {
                serde_json::to_writer_pretty(&mut *out, &features)?;
                writeln!(out)?;
            } else {
                for feature in &features {
                    writeln!(out, "{}\t{}", feature.name(), feature.state())?;
                }
            }
        }
        Command::Scan { dir, extensions } => {
            scan(ctx, &dir, &extensions, out).await?;
        }
        Command::Render { file, bindings } => {
            let source = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read template {}", file.display()))?;
            let template = Template::parse(&source)?;

            let mut context = RenderContext::new();
            for (name, key) in &bindings {
                context.insert(name.as_str(), key);
            }

            let rendered = template.render(manager, &context).await?;
            write!(out, "{rendered}")?;
        }
    }

    Ok(())
}

fn write_association(
    out: &mut dyn Write,
    feature: &str,
    featurable: &FeaturableKey,
    change: AssociationChange,
) -> std::io::Result<()> {
    match change {
        AssociationChange::Attach => {
            writeln!(out, "Feature `{feature}` has been turned on for {featurable}")
        }
        AssociationChange::Detach => {
            writeln!(out, "Feature `{feature}` has been turned off for {featurable}")
        }
        AssociationChange::Unchanged(_) => {
            writeln!(out, "Feature `{feature}` for {featurable}: {change}")
        }
    }
}

async fn scan(
    ctx: &AppContext,
    dir: &Path,
    extensions: &[String],
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let report = scan_directory(dir, extensions)?;
    let registered = ctx.manager.list().await?;
    let unregistered = report.unregistered(&registered);

    for name in report.feature_names() {
        let marker = if unregistered.contains(&name) { "  [unregistered]" } else { "" };
        writeln!(out, "{name}{marker}")?;
        for occurrence in report.occurrences(name) {
            writeln!(out, "  {}:{}", occurrence.path.display(), occurrence.line)?;
        }
    }

    writeln!(
        out,
        "Scanned {} file(s): {} feature(s) referenced, {} unregistered",
        report.files_scanned(),
        report.feature_names().count(),
        unregistered.len()
    )?;
    Ok(())
}
