//! Reports over saved builds: `stats`, `compare`, `export`.

use std::path::Path;

use anyhow::{Context as _, Result};
use tracing::info;

use quiver_core::build::Build;
use quiver_core::build_type::BuildType;
use quiver_core::compare::compare_builds;
use quiver_core::component::ComponentName;
use quiver_core::export::{export_file_name, to_json, to_text};
use quiver_core::library::BuildLibrary;
use quiver_core::stats::LibraryStats;

use super::{resolve_id, Context, ExportFormat};
use crate::output::{format_foc, print_json, print_stat};

/// Width of a comparison bar at full scale
const BAR_WIDTH: f64 = 30.0;

pub fn cmd_stats(ctx: &Context) -> Result<()> {
    let library = ctx.load()?;
    let stats = LibraryStats::from_builds(&library.list_builds(ctx.principal()));

    if ctx.json {
        return print_json(&stats);
    }
    if stats.total_builds == 0 {
        println!("No saved builds.");
        return Ok(());
    }

    print_stat("Builds", &stats.total_builds.to_string());
    for build_type in BuildType::ALL {
        let spread = stats.spread(build_type);
        println!();
        println!("{}s ({})", build_type.display_name(), spread.count);
        print_stat("Average", &format!("{:.0} gr", spread.avg_grains));
        print_stat("Lightest", &format!("{:.0} gr", spread.min_grains));
        print_stat("Heaviest", &format!("{:.0} gr", spread.max_grains));
    }

    println!();
    println!("Average component weights");
    for (name, grains) in &stats.avg_component_grains {
        print_stat(name.display_name(), &format!("{:.0} gr", grains));
    }
    println!();
    print_stat("Average FOC", &format_foc(stats.avg_foc_percent));
    Ok(())
}

pub fn cmd_compare(ctx: &Context, ids: &[String]) -> Result<()> {
    let library = ctx.load()?;
    let builds = select(&library, ids, ctx.principal())?;
    let comparison = compare_builds(&builds)?;

    if ctx.json {
        return print_json(&comparison);
    }

    println!("Total weight");
    for row in &comparison.rows {
        println!(
            "  {:<20} {} {:.0} gr",
            row.name,
            bar(row.total_grains, comparison.scales.total_grains),
            row.total_grains
        );
    }

    println!();
    println!("FOC");
    for row in &comparison.rows {
        let value = row.foc_percent.unwrap_or(0.0);
        let label = row
            .foc_percent
            .map(|foc| format!("{:.1}%", foc))
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<20} {} {}", row.name, bar(value, comparison.scales.foc_percent), label);
    }

    for name in ComponentName::ALL {
        println!();
        println!("{}", name.display_name());
        let scale = comparison.scales.components.get(name);
        for row in &comparison.rows {
            let grains = row.weights.get(name);
            println!("  {:<20} {} {:.0} gr", row.name, bar(grains, scale), grains);
        }
    }
    Ok(())
}

fn bar(value: f64, scale: f64) -> String {
    let filled = ((value.max(0.0) / scale) * BAR_WIDTH).round() as usize;
    "#".repeat(filled.min(BAR_WIDTH as usize))
}

pub fn cmd_export(ctx: &Context, ids: &[String], format: ExportFormat, out: Option<&Path>) -> Result<()> {
    let library = ctx.load()?;
    let builds = if ids.is_empty() {
        library.list_builds(ctx.principal())
    } else {
        select(&library, ids, ctx.principal())?
    };

    match (format, out) {
        (ExportFormat::Json, None) => println!("{}", to_json(&builds)?),
        (ExportFormat::Text, None) => {
            for (i, build) in builds.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print!("{}", to_text(build));
            }
        }
        (ExportFormat::Json, Some(dir)) => {
            let file_name = match builds.as_slice() {
                [single] => export_file_name(single, "json"),
                _ => "quiver_builds.json".to_string(),
            };
            write_export(&dir.join(file_name), &to_json(&builds)?)?;
        }
        (ExportFormat::Text, Some(dir)) => {
            for build in &builds {
                write_export(&dir.join(export_file_name(build, "txt")), &to_text(build))?;
            }
        }
    }
    Ok(())
}

fn write_export(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "export written");
    println!("Wrote {}", path.display());
    Ok(())
}

fn select<'a>(library: &'a BuildLibrary, ids: &[String], principal: Option<&str>) -> Result<Vec<&'a Build>> {
    ids.iter()
        .map(|id| -> Result<&'a Build> {
            let id = resolve_id(library, id, principal)?;
            Ok(library.get_build(&id, principal)?)
        })
        .collect()
}
