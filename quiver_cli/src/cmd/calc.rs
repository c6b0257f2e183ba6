//! Stateless calculations: `calc`, `total`, `lengths`.

use std::io::Read;
use std::path::Path;

use anyhow::{Context as _, Result};
use serde_json::json;

use quiver_core::calculator::{self, calculate, CalcInput, TotalMode};
use quiver_core::component::RawComponent;

use super::{parse_build_type, ComponentArgs, Context};
use crate::output::{format_foc_rated, format_grains, print_json, print_stat};

pub fn cmd_calc(ctx: &Context, args: &ComponentArgs) -> Result<()> {
    let input = CalcInput {
        components: args.raw_components(),
        gpi: args.gpi,
        length_in: args.length,
        mode: TotalMode::Lenient,
    };
    let result = calculate(&input)?;

    if ctx.json {
        return print_json(&result);
    }

    for component in &result.components {
        let note = if result.shaft_derived && component.name == "shaft" {
            " (from GPI)"
        } else {
            ""
        };
        print_stat(&component.name, &format!("{}{}", format_grains(component.grains), note));
    }
    println!();
    print_stat("Total", &format_grains(result.total_grains));
    match result.balance_point_in {
        Some(point) => print_stat("Balance point", &format!("{:.2}\" from nock", point)),
        None if args.length.is_none() => print_stat("Balance point", "- (no length)"),
        None => print_stat("Balance point", "-"),
    }
    print_stat("FOC", &format_foc_rated(result.foc_percent));
    Ok(())
}

pub fn cmd_total(ctx: &Context, file: Option<&Path>, strict: bool) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            buf
        }
    };

    let components: Vec<RawComponent> =
        serde_json::from_str(&text).context("expected a JSON array of {\"name\", \"grains\"} objects")?;
    let mode = if strict { TotalMode::Strict } else { TotalMode::Lenient };
    let total = calculator::total_grains(&components, mode)?;

    if ctx.json {
        return print_json(&json!({ "total_grains": total, "mode": mode }));
    }
    println!("{}", format_grains(total));
    Ok(())
}

pub fn cmd_lengths(ctx: &Context, build_type: &str, clamp: Option<f64>) -> Result<()> {
    let build_type = parse_build_type(build_type)?;
    let range = build_type.presentation_range();
    let options = build_type.length_options();
    let clamped = clamp.map(|length| build_type.clamp_length(length));

    if ctx.json {
        return print_json(&json!({
            "build_type": build_type,
            "range": range,
            "default_length_in": build_type.default_length_in(),
            "options": options,
            "clamped": clamped,
        }));
    }

    print_stat("Type", build_type.display_name());
    print_stat(
        "Range",
        &format!("{:.2}\" - {:.2}\" in {:.2}\" steps", range.min_in, range.max_in, range.step_in.unwrap_or(0.0)),
    );
    print_stat("Default", &format!("{:.2}\"", build_type.default_length_in()));
    print_stat("Options", &options.len().to_string());
    if let (Some(length), Some(clamped)) = (clamp, clamped) {
        print_stat("Clamped", &format!("{:.2}\" -> {:.2}\"", length, clamped));
    }
    Ok(())
}
