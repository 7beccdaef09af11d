//! bizperf - Business performance reports from revenue, salary and cost tables

use bizperf::{
    cli::{
        BonusCommand, Cli, Command, CostAddArgs, CostCommand, MasterCommand, ReportArgs,
        RevenueAddArgs, RevenueCommand, SalaryAddArgs, SalaryCommand, default_log_filter,
    },
    error::{BizperfError, Result},
    export::{CsvExporter, RevenueExporter},
    import::{import_revenues, load_master_file, resolve_code},
    loader::{ReportLoader, ReportRequest, Repositories},
    output::{OutputFormatter, get_formatter},
    repository::{
        BonusRateRepository, MasterDataRepository, OverheadCostRepository, RevenueRepository,
        SalaryCostRepository,
    },
    types::{
        BonusRateRecord, BonusScope, MasterKind, OverheadCostRecord, Period, RecordId,
        RevenueRecord, SalaryCostRecord,
    },
};
use bizperf_store::JsonStore;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn run_report(
    store: Arc<JsonStore>,
    args: ReportArgs,
    formatter: &dyn OutputFormatter,
    json: bool,
) -> Result<()> {
    info!("Running {} report", args.kind);

    let request = ReportRequest::new(args.kind, args.period.filter()?)
        .with_salary_percent(args.bonus_percent);
    let loader = ReportLoader::new(Repositories::from_store(store));
    let report = loader.refresh(&request).await?;

    println!("{}", formatter.format_report(&report));

    if let Some(dir) = &args.export {
        let today = chrono::Local::now().date_naive();
        let path = CsvExporter::new().write_to_dir(&report, dir, today).await?;
        if json {
            info!("Exported to {}", path.display());
        } else {
            println!("Exported to {}", path.display());
        }
    }
    Ok(())
}

async fn run_revenue(
    store: &JsonStore,
    command: RevenueCommand,
    formatter: &dyn OutputFormatter,
    json: bool,
) -> Result<()> {
    match command {
        RevenueCommand::List(period) => {
            let rows = RevenueRepository::list(store, &period.filter()?).await?;
            println!("{}", formatter.format_revenues(&rows));
        }
        RevenueCommand::Add(args) => {
            let RevenueAddArgs {
                year,
                month,
                company,
                division,
                customer,
                project,
                bmm,
                revenue,
                note,
            } = args;
            let period = Period::new(year, month)?;
            let master = store.load().await?;
            let record = RevenueRecord {
                id: RecordId::new(),
                year: period.year,
                month: period.month,
                company_id: resolve_code(&master, MasterKind::Company, company.as_deref())?,
                division_id: resolve_code(&master, MasterKind::Division, division.as_deref())?,
                customer_id: resolve_code(&master, MasterKind::Customer, customer.as_deref())?,
                project_name: project,
                quantity: bmm,
                vnd_revenue: revenue,
                note,
            };
            let created = RevenueRepository::create(store, record).await?;
            println!("Added revenue row {}", created.id);
        }
        RevenueCommand::Import { file } => {
            let show_progress = !json && is_terminal::is_terminal(std::io::stdout());
            let count = import_revenues(store, store, &file, show_progress).await?;
            println!("Imported {count} revenue rows");
        }
        RevenueCommand::Export { period, dir } => {
            let filter = period.filter()?;
            let (rows, master) = futures::try_join!(
                RevenueRepository::list(store, &filter),
                store.load(),
            )?;
            let today = chrono::Local::now().date_naive();
            let path = RevenueExporter::new(&master)
                .write_to_dir(&rows, &dir, today)
                .await?;
            println!("Exported {} revenue rows to {}", rows.len(), path.display());
        }
        RevenueCommand::Delete { id } => {
            RevenueRepository::delete(store, id).await?;
            println!("Deleted revenue row {id}");
        }
    }
    Ok(())
}

async fn run_salary(
    store: &JsonStore,
    command: SalaryCommand,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    match command {
        SalaryCommand::List(period) => {
            let rows = SalaryCostRepository::list(store, &period.filter()?).await?;
            println!("{}", formatter.format_salaries(&rows));
        }
        SalaryCommand::Add(SalaryAddArgs {
            year,
            month,
            company,
            division,
            customer,
            amount,
        }) => {
            let period = Period::new(year, month)?;
            let master = store.load().await?;
            let record = SalaryCostRecord {
                id: RecordId::new(),
                year: period.year,
                month: period.month,
                company_id: resolve_code(&master, MasterKind::Company, company.as_deref())?,
                division_id: resolve_code(&master, MasterKind::Division, division.as_deref())?,
                customer_id: resolve_code(&master, MasterKind::Customer, customer.as_deref())?,
                amount,
            };
            let created = SalaryCostRepository::create(store, record).await?;
            println!("Added salary row {}", created.id);
        }
        SalaryCommand::Delete { id } => {
            SalaryCostRepository::delete(store, id).await?;
            println!("Deleted salary row {id}");
        }
    }
    Ok(())
}

async fn run_cost(
    store: &JsonStore,
    command: CostCommand,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    match command {
        CostCommand::List(period) => {
            let rows = OverheadCostRepository::list(store, &period.filter()?).await?;
            println!("{}", formatter.format_costs(&rows));
        }
        CostCommand::Add(CostAddArgs {
            year,
            month,
            description,
            cost,
            not_cost,
        }) => {
            let period = Period::new(year, month)?;
            let record = OverheadCostRecord {
                id: RecordId::new(),
                year: period.year,
                month: period.month,
                description,
                cost,
                is_cost: !not_cost,
            };
            let created = OverheadCostRepository::create(store, record).await?;
            println!("Added cost row {}", created.id);
        }
        CostCommand::Delete { id } => {
            OverheadCostRepository::delete(store, id).await?;
            println!("Deleted cost row {id}");
        }
    }
    Ok(())
}

fn master_kind(scope: BonusScope) -> MasterKind {
    match scope {
        BonusScope::Company => MasterKind::Company,
        BonusScope::Division => MasterKind::Division,
    }
}

async fn run_bonus(store: &JsonStore, command: BonusCommand, json: bool) -> Result<()> {
    match command {
        BonusCommand::List { year, scope } => {
            let scope = BonusScope::from(scope);
            let rates = BonusRateRepository::list(store, year, scope).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rates)?);
            } else {
                let master = store.load().await?;
                let kind = master_kind(scope);
                println!("{scope} bonus rates for {year}");
                for rate in &rates {
                    println!(
                        "  {}  {:<12} {}",
                        rate.id,
                        master.code_of(kind, &rate.entity_id),
                        bizperf::output::format_money(rate.bn_bmm)
                    );
                }
            }
        }
        BonusCommand::Set {
            year,
            scope,
            code,
            rate,
        } => {
            let scope = BonusScope::from(scope);
            let kind = master_kind(scope);
            let master = store.load().await?;
            let entity_id = resolve_code(&master, kind, Some(&code))?.ok_or_else(|| {
                BizperfError::InvalidArgument("bonus code must not be empty".to_string())
            })?;
            let saved = store
                .upsert(BonusRateRecord {
                    id: RecordId::new(),
                    year,
                    scope,
                    entity_id,
                    bn_bmm: rate,
                })
                .await?;
            println!("Set {scope} bonus rate {} for {code}", saved.id);
        }
        BonusCommand::Delete { id } => {
            BonusRateRepository::delete(store, id).await?;
            println!("Deleted bonus rate {id}");
        }
    }
    Ok(())
}

async fn run_master(store: &JsonStore, command: MasterCommand, json: bool) -> Result<()> {
    match command {
        MasterCommand::Show => {
            let master = store.load().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&master)?);
            } else {
                for (title, entries) in [
                    ("Companies", &master.companies),
                    ("Divisions", &master.divisions),
                    ("Customers", &master.customers),
                ] {
                    println!("{title}");
                    for entry in entries {
                        println!("  {:<12} {:<24} {}", entry.code, entry.name, entry.id);
                    }
                }
            }
        }
        MasterCommand::Import { file } => {
            let master = load_master_file(&file).await?;
            store.save_master_data(&master).await?;
            println!(
                "Saved {} companies, {} divisions, {} customers",
                master.companies.len(),
                master.divisions.len(),
                master.customers.len()
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the built-in default
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_log_filter(cli.verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let color = !cli.no_color && is_terminal::is_terminal(std::io::stdout());
    if !color {
        colored::control::set_override(false);
    }

    let store = Arc::new(JsonStore::open(cli.data_dir.clone()).await?);
    let formatter = get_formatter(cli.json, color);

    match cli.command {
        Command::Report(args) => run_report(store, args, formatter.as_ref(), cli.json).await?,
        Command::Revenue(command) => {
            run_revenue(&store, command, formatter.as_ref(), cli.json).await?
        }
        Command::Salary(command) => run_salary(&store, command, formatter.as_ref()).await?,
        Command::Cost(command) => run_cost(&store, command, formatter.as_ref()).await?,
        Command::Bonus(command) => run_bonus(&store, command, cli.json).await?,
        Command::Master(command) => run_master(&store, command, cli.json).await?,
    }

    Ok(())
}
