//! `admit` - CLI for the school admission register
//!
//! This binary provides the command-line interface for recording admissions,
//! viewing dashboard counts and exporting the admission report.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use admissions::cli::{
    Cli, Command, ConfigCommand, ListCommand, OutputFormat, RegisterCommand, ReportCommand,
    StatsCommand,
};
use admissions::{
    init_logging, open_store, Config, Error, ReportFormat, ReportHeader, StudentId,
    StudentRecord, StudentService,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        // Config commands never touch the store
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
        Command::Register(command) => {
            let store = open_store(&config).context("failed to open record store")?;
            let service = StudentService::new(store);
            handle_command(&service, &config, command)
                .await
                .map_err(|e| {
                    let unavailable = e
                        .downcast_ref::<Error>()
                        .is_some_and(Error::is_backend_unavailable);
                    if unavailable {
                        e.context(format!("{} record store unavailable", config.storage.backend))
                    } else {
                        e
                    }
                })
        }
    }
}

async fn handle_command(
    service: &StudentService,
    config: &Config,
    command: RegisterCommand,
) -> Result<()> {
    match command {
        RegisterCommand::Add(cmd) => {
            let record = service.create(cmd.to_new_student()).await?;
            println!(
                "Admitted {} with serial {} (id {})",
                record.child_name, record.serial_no, record.id
            );
        }
        RegisterCommand::Show(cmd) => {
            let id = StudentId::new(cmd.id);
            let record = service
                .read(&id)
                .await?
                .ok_or_else(|| Error::not_found(id.as_str()))?;
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_record(&record);
            }
        }
        RegisterCommand::List(cmd) => handle_list(service, &cmd).await?,
        RegisterCommand::Update(cmd) => {
            let id = StudentId::new(cmd.id.clone());
            let record = service.update(&id, cmd.to_patch()).await?;
            println!("Updated {} (serial {})", record.child_name, record.serial_no);
        }
        RegisterCommand::Delete(cmd) => {
            let id = StudentId::new(cmd.id);
            match service.delete_existing(&id).await {
                Ok(record) => println!(
                    "Deleted {} (serial {})",
                    record.child_name, record.serial_no
                ),
                Err(e) if e.is_not_found() => println!("No record with id {id}; nothing deleted."),
                Err(e) => return Err(e.into()),
            }
        }
        RegisterCommand::Stats(cmd) => handle_stats(service, &cmd).await?,
        RegisterCommand::Report(cmd) => handle_report(service, config, &cmd).await?,
    }

    Ok(())
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis).map_or_else(
        || millis.to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn print_record(record: &StudentRecord) {
    println!("Serial:          {}", record.serial_no);
    println!("Id:              {}", record.id);
    println!("Child name:      {}", record.child_name);
    println!("Father's name:   {}", record.father_name);
    println!("Mother's name:   {}", record.mother_name);
    println!("Age group:       {}", record.age_group);
    println!("Gender:          {}", record.gender);
    println!("Class:           {}", record.class_level.heading());
    println!(
        "Previous school: {}",
        record.previous_school.as_deref().unwrap_or("-")
    );
    println!(
        "Coverage area:   {}",
        yes_no(record.comes_from_school_coverage_area)
    );
    println!(
        "Other schools:   {}",
        yes_no(record.comes_from_other_schools)
    );
    println!("Guardian phone:  {}", record.guardian_phone);
    println!("Notes:           {}", record.notes.as_deref().unwrap_or("-"));
    println!("Created:         {}", format_timestamp(record.created_at));
    println!("Updated:         {}", format_timestamp(record.updated_at));
}

async fn handle_list(service: &StudentService, cmd: &ListCommand) -> Result<()> {
    let records = match &cmd.search {
        Some(term) => service.search(term).await?,
        None => service.list().await?,
    };

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Plain => {
            for r in &records {
                println!(
                    "#{} {} (father: {}) {} {} {} [{}]",
                    r.serial_no,
                    r.child_name,
                    r.father_name,
                    r.age_group,
                    r.gender,
                    r.class_level.heading(),
                    r.id
                );
            }
        }
        OutputFormat::Table => {
            println!(
                "{:>6}  {:<24} {:<24} {:>4}  {:<6} {:<11} ID",
                "SERIAL", "NAME", "FATHER", "AGE", "GENDER", "CLASS"
            );
            for r in &records {
                println!(
                    "{:>6}  {:<24} {:<24} {:>4}  {:<6} {:<11} {}",
                    r.serial_no,
                    r.child_name,
                    r.father_name,
                    r.age_group.to_string(),
                    r.gender.label(),
                    r.class_level.heading(),
                    r.id
                );
            }
            println!();
            println!("{} record(s)", records.len());
        }
    }
    Ok(())
}

async fn handle_stats(service: &StudentService, cmd: &StatsCommand) -> Result<()> {
    let stats = service.dashboard().await?;
    let charts = if cmd.charts {
        Some(service.charts().await?)
    } else {
        None
    };

    if cmd.json {
        let value = serde_json::json!({
            "stats": stats,
            "charts": charts,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Admission dashboard");
    println!("-------------------");
    println!("Total students:      {}", stats.total_students);
    println!("Boys:                {}", stats.boys_count);
    println!("Girls:               {}", stats.girls_count);
    println!("From coverage area:  {}", stats.from_coverage_area);
    println!("From other schools:  {}", stats.from_other_schools);
    println!("New admissions:      {}", stats.new_admission);

    if let Some(charts) = charts {
        println!();
        println!("By age group:");
        for bucket in &charts.age_distribution {
            println!("  {:<5} {}", bucket.age_group.to_string(), bucket.count);
        }
        println!("By class:");
        for bucket in &charts.class_distribution {
            println!("  {:<11} {}", bucket.class_level.heading(), bucket.count);
        }
        println!("By source:");
        let source = charts.source_breakdown;
        println!("  Coverage area  {}", source.coverage_area);
        println!("  Other schools  {}", source.other_schools);
        println!("  New / other    {}", source.new_or_other);
    }
    Ok(())
}

async fn handle_report(
    service: &StudentService,
    config: &Config,
    cmd: &ReportCommand,
) -> Result<()> {
    let header = ReportHeader::from(&config.report);
    let format = ReportFormat::from(cmd.format);
    let table = service.cross_tab().await?;
    let rendered = format.render(&header, &table)?;

    let target: Option<PathBuf> = if cmd.save {
        let today = chrono::Local::now().date_naive();
        Some(PathBuf::from(header.file_name(today, format)))
    } else {
        cmd.output.clone()
    };

    match target {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Backend:            {}", config.storage.backend);
                println!("  Database path:      {}", config.database_path().display());
                println!(
                    "  Local store path:   {}",
                    config.local_store_path().display()
                );
                println!(
                    "  Simulated latency:  {} ms",
                    config.storage.simulated_latency_ms
                );
                println!();
                println!("[Report]");
                println!("  School name:        {}", config.report.school_name);
                println!("  Title:              {}", config.report.report_title);
                println!("  Upazila:            {}", config.report.upazila);
                println!("  School code:        {}", config.report.school_code);
                println!("  Year:               {}", config.report.year);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
