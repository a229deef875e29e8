use anyhow::Context;
use clap::Parser;
use recruit_weekly::core::week::week_keys_in_month;
use recruit_weekly::week_key_for_date;

#[derive(Parser)]
#[command(name = "week-calendar")]
#[command(about = "Print Saturday-Friday report weeks for a year or a single month")]
struct Args {
    /// Calendar year
    #[arg(short, long, required_unless_present = "date")]
    year: Option<i32>,

    /// Only this month (1-12)
    #[arg(short, long)]
    month: Option<u32>,

    /// Show which report week a date (YYYY-MM-DD) belongs to
    #[arg(long)]
    date: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(date) = &args.date {
        let day = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{}'", date))?;
        let key = week_key_for_date(day)?;
        println!("{} -> {} ({})", day, key, key.label());
        return Ok(());
    }

    let year = args.year.context("--year is required without --date")?;
    let months: Vec<u32> = match args.month {
        Some(m) => vec![m],
        None => (1..=12).collect(),
    };

    for month in months {
        let keys = week_keys_in_month(year, month)
            .with_context(|| format!("cannot list weeks of {}-{:02}", year, month))?;

        println!("{}-{:02}", year, month);
        for key in keys {
            let marker = if key.is_cross_month() { "*" } else { " " };
            println!("  {} {}  {}", marker, key.report_id(), key.label());
        }
    }
    println!();
    println!("* cross-month week, counted in the previous month");
    Ok(())
}
