use clap::Parser;
use recruit_weekly::adapters::{build_sources, build_store};
use recruit_weekly::config::cli::{Command, ExportArgs, ReportArgs, SyncArgs, WeeksArgs};
use recruit_weekly::core::query::{annotate, export_csv, find_reports, ReportQuery};
use recruit_weekly::core::week::week_keys_in_month;
use recruit_weekly::domain::model::{ApplicantStatus, JobCategory, WeeklyReport};
use recruit_weekly::utils::error::ErrorSeverity;
use recruit_weekly::utils::{logger, validation::Validate};
use recruit_weekly::{CliConfig, ReportError, ReportMonth, ReportSyncPipeline, SyncConfig, SyncEngine};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌；設定檔的 logging.format 也可切換為 JSON
    let json_logs = cli.json_logs
        || cli
            .config_path()
            .and_then(|path| SyncConfig::from_file(path).ok())
            .is_some_and(|config| config.json_logs());
    if json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(cli: CliConfig) -> Result<(), ReportError> {
    match cli.command {
        Command::Sync(args) => sync(args).await,
        Command::Weeks(args) => weeks(args),
        Command::Report(args) => report(args).await,
        Command::Annotate(args) => {
            let config = load_config(&args.config.config)?;
            let store = build_store(&config);
            let report = annotate(&store, &args.id, &args.author, &args.text).await?;
            println!("📝 {} now has {} note(s)", report.id, report.annotations.len());
            Ok(())
        }
        Command::Export(args) => export(args).await,
    }
}

fn load_config(path: &str) -> Result<SyncConfig, ReportError> {
    tracing::info!("📁 Loading configuration from: {}", path);
    let config = SyncConfig::from_file(path)?;
    config.validate()?;
    tracing::debug!("✅ Configuration '{}' validated", config.report.name);
    Ok(config)
}

async fn sync(args: SyncArgs) -> Result<(), ReportError> {
    let mut config = load_config(&args.config.config)?;

    // 套用命令列覆蓋設定
    if let Some(year) = args.year {
        config.window.year = year;
    }
    if !args.month.is_empty() {
        config.window.months = args.month.clone();
    }
    config.validate()?;

    let months = config.months()?;
    let store = build_store(&config);
    display_config_summary(&config, &months, &store.describe());

    let pipeline = ReportSyncPipeline::new(build_sources(&config), store, months);
    let engine = SyncEngine::new(pipeline);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - reports will not be saved");
        let batch = engine.preview().await?;
        print_reports(&batch.reports);
        println!(
            "🔍 {} applicants read, {} skipped, {} duplicates, {} outside window",
            batch.rows_read, batch.rows_skipped, batch.duplicate_rows, batch.rows_out_of_window
        );
        return Ok(());
    }

    let summary = engine.run().await?;
    println!("✅ Sync completed: {} weekly reports saved", summary.reports_written);
    println!(
        "   {} applicants read, {} skipped, {} duplicates, {} outside window, {} notes kept",
        summary.rows_read,
        summary.rows_skipped,
        summary.duplicate_rows,
        summary.rows_out_of_window,
        summary.annotations_kept
    );
    Ok(())
}

fn weeks(args: WeeksArgs) -> Result<(), ReportError> {
    let month = ReportMonth::new(args.year, args.month)?;
    println!("📅 Weeks of {} (Saturday-Friday)", month);

    for key in week_keys_in_month(args.year, args.month)? {
        let note = if key.is_cross_month() {
            "cross-month, counted in previous month"
        } else {
            ""
        };
        println!("  {}  {}  {}", key.report_id(), key.range(), note);
    }
    Ok(())
}

fn build_query(year: i32, month: Option<u32>, weeks: &[u32], category: Option<&str>) -> Result<ReportQuery, ReportError> {
    let mut query = ReportQuery::new().year(year);
    if let Some(month) = month {
        query = query.month(month);
    }
    if !weeks.is_empty() {
        query = query.weeks(weeks.to_vec());
    }
    if let Some(category) = category {
        query = query.category(category.parse::<JobCategory>()?);
    }
    Ok(query)
}

async fn report(args: ReportArgs) -> Result<(), ReportError> {
    let config = load_config(&args.config.config)?;
    let store = build_store(&config);
    let query = build_query(args.year, args.month, &args.week, args.category.as_deref())?;

    let reports = find_reports(&store, &query).await?;
    if reports.is_empty() {
        println!("No reports stored for that selection. Run `sync` first.");
        return Ok(());
    }
    print_reports(&reports);
    Ok(())
}

async fn export(args: ExportArgs) -> Result<(), ReportError> {
    let config = load_config(&args.config.config)?;
    let store = build_store(&config);
    let query = build_query(args.year, args.month, &[], None)?;

    let reports = find_reports(&store, &query).await?;
    let csv = export_csv(&reports)?;
    tokio::fs::write(&args.out, csv).await?;
    println!("📁 Exported {} reports to {}", reports.len(), args.out);
    Ok(())
}

fn display_config_summary(config: &SyncConfig, months: &[ReportMonth], store: &str) {
    println!("📋 Configuration Summary:");
    println!("  Report: {}", config.report.name);
    println!(
        "  Months: {}",
        months.iter().map(|m| m.to_string()).collect::<Vec<_>>().join(", ")
    );
    for source in &config.sources {
        println!("  Source: {} ({})", source.name(), source.kind());
    }
    println!("  Store: {}", store);
    println!();
}

fn print_reports(reports: &[WeeklyReport]) {
    let statuses = ApplicantStatus::ALL;
    print!("{:<12} {:<23} {:>5}", "id", "week", "total");
    for status in statuses {
        print!(" {:>12}", status.as_str());
    }
    println!();

    for report in reports {
        print!("{:<12} {:<23} {:>5}", report.id, report.range().to_string(), report.total);
        for status in statuses {
            print!(" {:>12}", report.status_count(status));
        }
        println!();
        for note in &report.annotations {
            println!("             📝 {} ({}): {}", note.author, note.created_at.format("%Y-%m-%d"), note.text);
        }
    }
}
