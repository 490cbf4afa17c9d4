use anyhow::Context;
use clap::Parser;
use compomap::logging::{self, LogFormat};
use compomap::{
    Address, DurabilityMode, MappingRegistry, Person, SessionConfig, SessionFactory, driver,
    person_mapping,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};

/// Save one person, with a home and a billing address, in a single unit of work.
#[derive(Debug, Parser)]
#[command(name = "compomap", version, about)]
struct Cli {
    #[arg(long, default_value = "Homer")]
    name: String,

    #[arg(long, default_value = "742 Evergreen Terrace")]
    home_street: String,
    #[arg(long, default_value = "Springfield")]
    home_city: String,
    #[arg(long, default_value = "80085")]
    home_zipcode: String,

    #[arg(long, default_value = "57 Walnut Street")]
    billing_street: String,
    #[arg(long, default_value = "Springfield")]
    billing_city: String,
    #[arg(long, default_value = "80085")]
    billing_zipcode: String,

    /// Snapshot file; without it the data lives only for this run
    #[arg(long, env = "COMPOMAP_DATA_FILE")]
    data_file: Option<PathBuf>,

    /// Skip fsync when writing the snapshot
    #[arg(long)]
    no_sync: bool,

    /// Log DDL and flushed rows
    #[arg(long)]
    show_sql: bool,

    /// Print the CREATE TABLE statements and exit
    #[arg(long)]
    print_ddl: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, env = "COMPOMAP_LOG_FORMAT")]
    log_format: LogFormat,
}

impl Cli {
    fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::new().show_sql(self.show_sql);
        if let Some(path) = &self.data_file {
            config = config.data_file(path);
        }
        if self.no_sync {
            config = config.durability(DurabilityMode::Buffered);
        }
        config
    }

    fn person(&self) -> Person {
        Person::new(
            self.name.clone(),
            Address::new(&self.home_street, &self.home_city, &self.home_zipcode),
            Address::new(&self.billing_street, &self.billing_city, &self.billing_zipcode),
        )
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    debug!("building session factory");
    let registry = MappingRegistry::new().register(person_mapping());
    let factory = SessionFactory::build(cli.session_config(), registry)
        .await
        .context("failed to build session factory")?;

    if cli.print_ddl {
        for ddl in factory.schema_sql()? {
            println!("{};", ddl);
        }
        return Ok(());
    }

    let person = driver::save(&factory, cli.person())
        .await
        .context("failed to save person")?;
    info!(%person, "committed");
    println!("{}", person);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = logging::init(cli.log_format) {
        eprintln!("{:#}", err);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
