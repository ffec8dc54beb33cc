//! UL Projection CLI
//!
//! Runs the projection engine on an input snapshot and writes the flat rows,
//! or prints one of the financial-year reports

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use ul_projection::assumptions::loader::{apply_table_overrides, load_assumption_set};
use ul_projection::policy::load_model_points;
use ul_projection::projection::write_rows_csv;
use ul_projection::reporting::{expense_summary, ifrs17_summary, ifrs4_summary, FinancialYearFilter};
use ul_projection::{run_extraction, CohortYears, EngineInput, ExtractionResult};

#[derive(Parser, Debug)]
#[command(name = "ul-projection")]
#[command(about = "Monthly unit-linked projection with IFRS4 and IFRS17 reporting")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Project every model point and write rows CSV plus the cohort expense table
    Run {
        #[command(flatten)]
        input: InputArgs,

        /// Directory for rows.csv and cohort_expenses.json
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,
    },
    /// Project and print a financial-year report
    Report {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long, value_enum, default_value = "ifrs4")]
        view: View,

        /// Annual rate for the IFRS4 profit NPV
        #[arg(long, default_value_t = 0.08)]
        risk_discount_rate: f64,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Full engine input snapshot (JSON)
    #[arg(short, long, conflicts_with_all = ["assumptions", "model_points"])]
    input: Option<PathBuf>,

    /// Assumption set (JSON)
    #[arg(long)]
    assumptions: Option<PathBuf>,

    /// Directory of CSV rate tables overriding the JSON tables
    #[arg(long)]
    tables: Option<PathBuf>,

    /// Model-point grid (CSV)
    #[arg(long)]
    model_points: Option<PathBuf>,

    /// Valuation date, YYYY-MM-DD
    #[arg(long)]
    valuation_date: Option<String>,

    /// Five target cohort years, comma separated
    #[arg(long, value_delimiter = ',')]
    cohort_years: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum View {
    Ifrs4,
    Ifrs17,
    Expenses,
}

impl InputArgs {
    fn load(&self) -> Result<EngineInput> {
        let mut input = match &self.input {
            Some(path) => {
                let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
                serde_json::from_reader(file)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => {
                let (Some(assumptions), Some(model_points)) =
                    (&self.assumptions, &self.model_points)
                else {
                    bail!("either --input or both --assumptions and --model-points are required");
                };
                EngineInput {
                    assumptions: load_assumption_set(assumptions)?,
                    model_points: load_model_points(model_points)?,
                    valuation_date: String::new(),
                    target_cohort_years: Vec::new(),
                }
            }
        };

        if let Some(dir) = &self.tables {
            apply_table_overrides(&mut input.assumptions, dir)?;
        }
        if let Some(date) = &self.valuation_date {
            input.valuation_date = date.clone();
        }
        if !self.cohort_years.is_empty() {
            input.target_cohort_years = self.cohort_years.clone();
        }
        Ok(input)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Run { input, output_dir } => {
            let input = input.load()?;
            let result = run_extraction(&input)?;
            write_outputs(&input, &result, &output_dir)?;
        }
        Command::Report {
            input,
            view,
            risk_discount_rate,
        } => {
            let input = input.load()?;
            let result = run_extraction(&input)?;
            print_report(&input, &result, view, risk_discount_rate)?;
        }
    }

    Ok(())
}

fn write_outputs(input: &EngineInput, result: &ExtractionResult, output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)?;
    let cohort_years = CohortYears::parse(&input.target_cohort_years)?;

    let rows_path = output_dir.join("rows.csv");
    write_rows_csv(File::create(&rows_path)?, &result.rows, &cohort_years)?;

    let expenses_path = output_dir.join("cohort_expenses.json");
    serde_json::to_writer_pretty(File::create(&expenses_path)?, &result.cohort_expenses)?;

    info!("Wrote {} and {}", rows_path.display(), expenses_path.display());
    println!(
        "Projected {} model points: {} rows written to {}",
        input.model_points.len(),
        result.rows.len(),
        output_dir.display()
    );
    Ok(())
}

fn print_report(
    input: &EngineInput,
    result: &ExtractionResult,
    view: View,
    risk_discount_rate: f64,
) -> Result<()> {
    let filter = FinancialYearFilter::new(result, input)?;

    match view {
        View::Ifrs4 => {
            let s = ifrs4_summary(&filter, risk_discount_rate);
            println!(
                "{:>6} {:>16} {:>16} {:>16} {:>16} {:>16} {:>16}",
                "Year", "Premium", "Claims", "Commission", "Expenses", "ChgReserves", "Profit"
            );
            println!("{}", "-".repeat(108));
            for k in 0..s.financial_years.len() {
                println!(
                    "{:>6} {:>16.2} {:>16.2} {:>16.2} {:>16.2} {:>16.2} {:>16.2}",
                    s.financial_years[k],
                    s.premium[k],
                    s.claims[k],
                    s.commission[k],
                    s.expenses[k],
                    s.change_in_reserves[k],
                    s.profit[k]
                );
            }
            println!();
            println!("NPV @ {:.2}%: {:.2}", risk_discount_rate * 100.0, s.npv);
            match s.irr {
                Some(irr) => println!("IRR: {:.4}%", irr * 100.0),
                None => println!("IRR: n/a"),
            }
        }
        View::Ifrs17 => {
            let s = ifrs17_summary(&filter);
            println!(
                "{:>6} {:>16} {:>16} {:>16} {:>16} {:>16} {:>16}",
                "Year", "CSM Release", "RA Release", "Closing CSM", "Loss Comp", "BEL", "ISR"
            );
            println!("{}", "-".repeat(108));
            for k in 0..s.financial_years.len() {
                println!(
                    "{:>6} {:>16.2} {:>16.2} {:>16.2} {:>16.2} {:>16.2} {:>16.2}",
                    s.financial_years[k],
                    s.csm_release[k],
                    s.ra_release[k],
                    s.closing_csm[k],
                    s.closing_loss_component[k],
                    s.bel[k],
                    s.insurance_service_result[k]
                );
            }
        }
        View::Expenses => {
            let s = expense_summary(
                &result.cohort_expenses,
                filter.cohort_years(),
                &input.assumptions,
            );
            print!("{:>6}", "Year");
            for label in &s.cohort_years {
                print!(" {:>14}", label);
            }
            println!(" {:>14}", "Total");
            for k in 0..s.financial_years.len() {
                print!("{:>6}", s.financial_years[k]);
                for c in 0..s.cohort_years.len() {
                    let cohort_total =
                        s.acquisition[c][k] + s.maintenance[c][k] + s.vendor_fee[c][k];
                    print!(" {:>14.2}", cohort_total);
                }
                println!(" {:>14.2}", s.total[k]);
            }
        }
    }

    Ok(())
}
