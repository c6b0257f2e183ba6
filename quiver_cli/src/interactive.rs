//! Prompt-driven calculator. Every entry recomputes the total and FOC.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use anyhow::Result;

use quiver_core::build_type::BuildType;
use quiver_core::calculator::{calculate, CalcInput, CalcResult, TotalMode};
use quiver_core::component::{ComponentName, RawComponent};
use quiver_core::errors::BuildResult;

use crate::output::{format_foc_rated, format_grains};

/// Current calculator inputs.
#[derive(Debug, Clone)]
pub struct Session {
    pub weights: BTreeMap<ComponentName, f64>,
    pub gpi: Option<f64>,
    pub length_in: f64,
    pub build_type: BuildType,
}

impl Session {
    pub fn new() -> Self {
        Session {
            weights: BTreeMap::new(),
            gpi: None,
            length_in: BuildType::Arrow.default_length_in(),
            build_type: BuildType::Arrow,
        }
    }

    /// Switch type, resetting the length if it falls outside the new type's range
    pub fn set_build_type(&mut self, build_type: BuildType) {
        self.build_type = build_type;
        self.length_in = build_type.clamp_length(self.length_in);
    }

    pub fn result(&self) -> BuildResult<CalcResult> {
        calculate(&CalcInput {
            components: self
                .weights
                .iter()
                .map(|(name, grains)| RawComponent::new(name.as_str(), *grains))
                .collect(),
            gpi: self.gpi,
            length_in: Some(self.length_in),
            mode: TotalMode::Lenient,
        })
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

pub fn cmd_interactive() -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_session(&mut stdin.lock(), &mut stdout.lock())?;
    Ok(())
}

/// Read one line; `None` at end of input
fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Prompt for a number; blank or unparsable input keeps `default`
fn prompt_f64<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str, default: f64) -> io::Result<Option<f64>> {
    write!(output, "{} [{}]: ", prompt, default)?;
    output.flush()?;

    Ok(read_line(input)?.map(|line| line.parse().unwrap_or(default)))
}

pub fn run_session<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Session> {
    let mut session = Session::new();

    writeln!(output, "Quiver - arrow build calculator")?;
    writeln!(output, "===============================")?;
    writeln!(output, "Fields: knock, fletching, shaft, insert, tip, gpi, length, type. 'q' quits.")?;

    loop {
        write!(output, "\nfield> ")?;
        output.flush()?;

        let Some(field) = read_line(input)? else {
            break;
        };
        let field = field.to_lowercase();

        match field.as_str() {
            "" => continue,
            "q" | "quit" | "exit" => break,
            "gpi" => {
                let current = session.gpi.unwrap_or(0.0);
                let Some(gpi) = prompt_f64(input, output, "GPI", current)? else {
                    break;
                };
                session.gpi = (gpi > 0.0).then_some(gpi);
            }
            "length" => {
                let Some(length) = prompt_f64(input, output, "Length (in)", session.length_in)? else {
                    break;
                };
                let range = session.build_type.presentation_range();
                if range.contains(length) {
                    session.length_in = length;
                } else {
                    writeln!(
                        output,
                        "{} length must be {}\"-{}\"; keeping {:.2}\"",
                        session.build_type.display_name(),
                        range.min_in,
                        range.max_in,
                        session.length_in
                    )?;
                }
            }
            "type" => {
                let next = match session.build_type {
                    BuildType::Arrow => BuildType::Bolt,
                    BuildType::Bolt => BuildType::Arrow,
                };
                session.set_build_type(next);
                writeln!(output, "Type: {} ({:.2}\")", next, session.length_in)?;
            }
            other => match ComponentName::parse(other) {
                Some(name) => {
                    let current = session.weights.get(&name).copied().unwrap_or(0.0);
                    let prompt = format!("{} (gr)", name.display_name());
                    let Some(grains) = prompt_f64(input, output, &prompt, current)? else {
                        break;
                    };
                    session.weights.insert(name, grains);
                }
                None => {
                    writeln!(output, "Unknown field: {}", other)?;
                    continue;
                }
            },
        }

        print_summary(output, &session)?;
    }

    Ok(session)
}

fn print_summary<W: Write>(output: &mut W, session: &Session) -> Result<()> {
    let result = session.result()?;
    if result.shaft_derived {
        if let Some(shaft) = result.components.iter().find(|c| c.name == "shaft") {
            writeln!(output, "  Shaft:  {} (from GPI)", format_grains(shaft.grains))?;
        }
    }
    writeln!(output, "  Total:  {}", format_grains(result.total_grains))?;
    writeln!(output, "  FOC:    {}", format_foc_rated(result.foc_percent))?;
    Ok(())
}
