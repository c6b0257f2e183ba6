//! Saved-build commands: `save`, `update`, `delete`, `list`, `show`, `settings`.

use anyhow::Result;
use serde_json::json;

use quiver_core::build::{Build, BuildDraft};
use quiver_core::calculator::TotalMode;
use quiver_core::export::to_text;
use quiver_core::presets::find_preset;
use quiver_core::units::Grams;

use super::{parse_policy, resolve_id, Context, DraftArgs};
use crate::output::{build_row, format_foc_rated, format_grains, print_balance, print_json, print_stat, short_id};

pub fn cmd_save(ctx: &Context, name: Option<&str>, preset: Option<&str>, args: &DraftArgs) -> Result<()> {
    let build = ctx.modify(|library, principal| {
        let mut draft = match preset {
            Some(key) => find_preset(key)?.to_draft(),
            None => BuildDraft::default(),
        };
        if let Some(name) = name {
            draft.name = name.to_string();
        }
        args.apply_to(&mut draft, library.settings.default_length_in)?;

        let id = library.create_build(&draft, principal)?;
        library.get_build(&id, principal).cloned()
    })?;

    report_saved(ctx, "Saved", &build)
}

pub fn cmd_update(ctx: &Context, id: &str, name: Option<&str>, args: &DraftArgs) -> Result<()> {
    let build = ctx.modify(|library, principal| {
        let id = resolve_id(library, id, principal)?;
        let mut draft = library.get_build(&id, principal)?.to_draft();
        if let Some(name) = name {
            draft.name = name.to_string();
        }
        args.apply_to(&mut draft, library.settings.default_length_in)?;

        library.update_build(&id, &draft, principal).cloned()
    })?;

    report_saved(ctx, "Updated", &build)
}

fn report_saved(ctx: &Context, verb: &str, build: &Build) -> Result<()> {
    if ctx.json {
        return print_json(build);
    }
    println!("{} {} {}", verb, short_id(build), build.name);
    print_stat("Total", &format_grains(build.total_grains));
    print_stat("FOC", &format_foc_rated(build.foc_percent()));
    Ok(())
}

pub fn cmd_delete(ctx: &Context, id: &str) -> Result<()> {
    let removed = ctx.modify(|library, principal| {
        let id = resolve_id(library, id, principal)?;
        library.delete_build(&id, principal)
    })?;

    if ctx.json {
        return print_json(&json!({ "deleted": removed.id }));
    }
    println!("Deleted {} {}", short_id(&removed), removed.name);
    Ok(())
}

pub fn cmd_list(ctx: &Context) -> Result<()> {
    let library = ctx.load()?;
    let builds = library.list_builds(ctx.principal());

    if ctx.json {
        return print_json(&builds);
    }
    if builds.is_empty() {
        println!("No saved builds.");
        return Ok(());
    }
    println!(
        "{:<8}  {:<24} {:<6} {:>10} {:>8} {:>8}",
        "ID", "NAME", "TYPE", "TOTAL", "LENGTH", "FOC"
    );
    for build in builds {
        println!("{}", build_row(build));
    }
    Ok(())
}

pub fn cmd_show(ctx: &Context, id: &str) -> Result<()> {
    let library = ctx.load()?;
    let id = resolve_id(&library, id, ctx.principal())?;
    let build = library.get_build(&id, ctx.principal())?;
    let balance = build.balance();

    if ctx.json {
        return print_json(&json!({ "build": build, "balance": balance }));
    }

    print!("{}", to_text(build));
    let grams: Grams = build.total_weight().into();
    print_stat("Metric", &format!("{:.2} g, {:.1} cm", grams.value(), build.length().to_cm()));
    if let Some(animal) = build.target_animal {
        print_stat("Target", animal.display_name());
    }
    print_balance(&balance);
    Ok(())
}

pub fn cmd_settings(ctx: &Context, policy: Option<&str>, default_length: Option<f64>) -> Result<()> {
    let settings = if policy.is_none() && default_length.is_none() {
        ctx.load()?.settings
    } else {
        ctx.modify(|library, _| {
            let mut settings = library.settings.clone();
            if let Some(policy) = policy {
                settings.weight_policy = parse_policy(policy)?;
            }
            if let Some(length) = default_length {
                settings.default_length_in = length;
            }
            settings.validate()?;
            library.settings = settings.clone();
            library.touch();
            Ok(settings)
        })?
    };

    if ctx.json {
        return print_json(&settings);
    }
    print_stat(
        "Weight policy",
        match settings.weight_policy {
            TotalMode::Strict => "strict",
            TotalMode::Lenient => "lenient",
        },
    );
    print_stat("Default length", &format!("{:.2}\"", settings.default_length_in));
    Ok(())
}
