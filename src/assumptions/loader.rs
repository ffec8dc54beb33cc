//! Assumption loading
//!
//! An assumption set is a JSON document (see [`AssumptionSet`]). Any of its
//! rate tables can be replaced by a CSV file in a tables directory, using the
//! file names below; files that are absent leave the JSON table in place.

use std::fs::File;
use std::path::Path;

use log::{debug, info};

use super::{AssumptionSet, RateTable};
use crate::error::Result;

/// CSV file name for each overridable table
pub const TABLE_FILES: [&str; 10] = [
    "lapse.csv",
    "surrender_charge_fixed.csv",
    "surrender_charge_percent.csv",
    "commission.csv",
    "allocation.csv",
    "loyalty_bonus.csv",
    "mortality.csv",
    "coi.csv",
    "reinsurance.csv",
    "vendor_commission.csv",
];

/// Load an assumption set from a JSON file
pub fn load_assumption_set(path: &Path) -> Result<AssumptionSet> {
    let file = File::open(path)?;
    let assumptions: AssumptionSet = serde_json::from_reader(file)?;
    info!("Loaded assumptions from {}", path.display());
    Ok(assumptions)
}

/// Replace tables with the CSV files found in `dir`; returns how many were loaded
pub fn apply_table_overrides(assumptions: &mut AssumptionSet, dir: &Path) -> Result<usize> {
    let mut loaded = 0;

    for file_name in TABLE_FILES {
        let path = dir.join(file_name);
        if !path.exists() {
            continue;
        }
        let table = RateTable::load_csv(&path)?;
        *table_slot(assumptions, file_name) = table;
        debug!("Loaded table {}", path.display());
        loaded += 1;
    }

    info!("Loaded {} assumption tables from {}", loaded, dir.display());
    Ok(loaded)
}

fn table_slot<'a>(assumptions: &'a mut AssumptionSet, file_name: &str) -> &'a mut RateTable {
    match file_name {
        "lapse.csv" => &mut assumptions.lapse,
        "surrender_charge_fixed.csv" => &mut assumptions.surrender_charge_fixed,
        "surrender_charge_percent.csv" => &mut assumptions.surrender_charge_percent,
        "commission.csv" => &mut assumptions.commission,
        "allocation.csv" => &mut assumptions.allocation,
        "loyalty_bonus.csv" => &mut assumptions.loyalty_bonus,
        "mortality.csv" => &mut assumptions.mortality,
        "coi.csv" => &mut assumptions.coi,
        "reinsurance.csv" => &mut assumptions.reinsurance,
        _ => &mut assumptions.vendor_commission,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "ul_projection_{}_{}",
            name,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_json_and_override_tables() {
        let dir = temp_dir("loader");

        let json_path = dir.join("assumptions.json");
        let mut json = File::create(&json_path).unwrap();
        write!(json, r#"{{"lapse": {{"1": 0.5}}, "investmentIncomeRate": 0.04}}"#).unwrap();

        let mut lapse = File::create(dir.join("lapse.csv")).unwrap();
        writeln!(lapse, "PolicyYear,Rate\n1,0.05\n2,0.07").unwrap();

        let mut assumptions = load_assumption_set(&json_path).unwrap();
        assert_eq!(assumptions.annual_lapse_rate(1), 0.5);

        let loaded = apply_table_overrides(&mut assumptions, &dir).unwrap();
        assert_eq!(loaded, 1);
        assert_eq!(assumptions.annual_lapse_rate(1), 0.05);
        assert_eq!(assumptions.annual_lapse_rate(2), 0.07);
        assert_eq!(assumptions.investment_income_rate, 0.04);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
