//! Built-in reference data: `presets`, `catalog`.

use anyhow::Result;
use serde_json::json;

use quiver_core::catalog::search;
use quiver_core::component::ComponentName;
use quiver_core::errors::BuildError;
use quiver_core::presets::{all_presets, presets_for, Preset};

use super::{parse_animal, Context};
use crate::output::{format_foc, print_json};

pub fn cmd_presets(ctx: &Context, animal: Option<&str>) -> Result<()> {
    let presets: Vec<&Preset> = match animal {
        Some(animal) => presets_for(parse_animal(animal)?)?,
        None => all_presets()?.iter().collect(),
    };

    if ctx.json {
        let rows: Vec<_> = presets
            .iter()
            .map(|p| json!({ "preset": p, "balance": p.balance() }))
            .collect();
        return print_json(&rows);
    }

    for preset in presets {
        println!(
            "{:<16} {:<22} {:>6.0} gr {:>6}\"  FOC {:>7}  (target {}, KE {})",
            preset.key,
            preset.name,
            preset.total_grains(),
            preset.length_in,
            format_foc(preset.balance().foc_percent),
            preset.foc_target,
            preset.ke_target,
        );
        println!("  {}", preset.description);
    }
    Ok(())
}

pub fn cmd_catalog(ctx: &Context, category: &str, term: Option<&str>, length: Option<f64>) -> Result<()> {
    let category = ComponentName::parse(category).ok_or_else(|| BuildError::UnknownComponent {
        name: category.to_string(),
    })?;
    let entries = search(category, term.unwrap_or(""))?;

    if ctx.json {
        let rows: Vec<_> = entries
            .iter()
            .map(|e| match length {
                Some(length) => json!({ "entry": e, "grains_at_length": e.grains_at(length) }),
                None => json!({ "entry": e }),
            })
            .collect();
        return print_json(&rows);
    }

    if entries.is_empty() {
        println!("No {} entries match.", category.as_str());
        return Ok(());
    }
    for entry in entries {
        let weight = match (entry.gpi, length) {
            (Some(_), Some(length)) => format!("{} ({} gr at {}\")", entry.weight_label(), entry.grains_at(length), length),
            _ => entry.weight_label(),
        };
        println!("{:<24} {:<26} {:<14} {}", entry.name, weight, entry.brand, entry.material);
    }
    Ok(())
}
