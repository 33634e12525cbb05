use anyhow::Result;

fn main() -> Result<()> {
    xls2csv::cli::run()
}
