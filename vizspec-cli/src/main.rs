//! Spec persistence CLI: compose the built-in demo spec and save it, or load
//! a saved spec and hand it to the stdout display collaborator.

use clap::{Parser, Subcommand};
use log::error;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use vizspec_core::spec::{AxisSpec, ChartSpec, LegendSpec};
use vizspec_core::{
    add_stack, field, load_spec, props, resolve, save_spec, DataTable, MarkType, PropArg,
    PropExpr, Result, SpecBuilder, SpecDisplay, WriterDisplay,
};

#[derive(Parser)]
#[command(name = "vizspec-cli", about = "Save and load visualization specs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose the built-in demo spec and save it to a path as formatted JSON
    Save {
        path: PathBuf,
    },
    /// Load a spec from a path and display it
    Load {
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Save { path } => {
            let spec = demo_spec()?;
            save_spec(&path, &spec)?;
            println!("saved spec to {}", path.display());
            Ok(())
        }
        Commands::Load { path } => {
            let spec = load_spec(&path)?;
            WriterDisplay::new(std::io::stdout().lock()).display(&spec)
        }
    }
}

/// A stacked bar chart over a small built-in dataset.
fn demo_spec() -> Result<ChartSpec> {
    let table = DataTable::from_json(&json!([
        {"cyl": 4, "count": 1},
        {"cyl": 4, "count": 1},
        {"cyl": 6, "count": 1},
        {"cyl": 6, "count": 1},
        {"cyl": 8, "count": 1},
    ]))?;

    let mut builder = SpecBuilder::new();
    builder.add_data("mtcars", table);
    add_stack(
        &mut builder,
        PropExpr::FieldRef("count".to_string()),
        Some(PropExpr::FieldRef("cyl".to_string())),
    )?;
    builder.add_props(
        props(vec![
            PropArg::unnamed(field("cyl")),
            PropArg::unnamed(field("stack_upr_")),
            PropArg::named("y2", field("stack_lwr_")),
            PropArg::named("fill", field("cyl")),
        ])?,
        true,
    );
    builder.add_mark(MarkType::Rect)?;
    builder.add_axis(AxisSpec::new("x").with_title("Cylinders"));
    builder.add_axis(AxisSpec::new("y").with_title("Count"));
    builder.add_legend(LegendSpec::new("fill").with_title("Cylinders"));

    resolve(&builder)
}
