use booking_directory::{router, AppState, Database, Settings};
use clap::Parser;
use eyre::{Result, WrapErr};
use std::fs::OpenOptions;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file, with or without its extension
    #[arg(short, long, value_name = "FILE", env = "BOOKING_SETTINGS", default_value = "settings")]
    config: String,

    /// Port to listen on, overriding the settings file
    #[arg(short, long)]
    port: Option<u16>,
}

fn init_logging(settings: &Settings) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = &settings.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .wrap_err_with(|| format!("could not open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(&cli.config).wrap_err("could not load settings")?;
    if let Some(port) = cli.port {
        settings.port = port;
    }
    init_logging(&settings)?;

    let database = Database::new(settings.db_path.clone());
    let applied = database
        .migrate()
        .wrap_err_with(|| format!("could not migrate {}", database.path().display()))?;
    log::info!(
        "Using database {} ({} migrations applied)",
        database.path().display(),
        applied
    );

    let addr = settings.listen_address();
    log::info!("Listening for requests at http://{}", addr);
    gotham::start(addr, router(AppState::new(database, settings.site_name)))
        .wrap_err("server stopped")?;
    Ok(())
}
